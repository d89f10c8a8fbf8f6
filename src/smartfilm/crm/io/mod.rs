//! Adapters for the two external stores the CRM talks to.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub mod json_store;
pub mod lead_store;
pub mod sheet;
pub mod xlsx;

pub use json_store::JsonLeadStore;
pub use lead_store::{FollowUpStore, LeadStore, MemoryLeadStore};
pub use sheet::{CellRef, MemorySheet, SheetStore};
pub use xlsx::XlsxSheet;

/// Sibling file a document is written to before it is renamed over `path`,
/// so readers never see a half-written file.
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
