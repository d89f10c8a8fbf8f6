pub mod config;
pub mod error;
pub mod followups;
pub mod import;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod schema;
pub mod server;

pub use error::{CrmError, Result};
