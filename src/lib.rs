//! Lead management core for the smart-film installation business.
//!
//! The library keeps responsibilities narrow: store adapters live under
//! [`smartfilm::crm::io`], the lead data model inside [`smartfilm::crm::model`],
//! the spreadsheet column layout in [`smartfilm::crm::schema`], the two-way
//! store/spreadsheet sync under [`smartfilm::crm::reconcile`] and bulk CSV
//! intake in [`smartfilm::crm::import`]. The HTTP trigger in
//! [`smartfilm::crm::server`] wraps the sync for a scheduler.

pub mod smartfilm;

pub use smartfilm::crm::{
    CrmError, Result, config, error, followups, import, io, model, pipeline, reconcile, schema,
    server,
};
