use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, CrmError>;

/// Error type covering the failures that can occur while reading or writing
/// the lead stores, reconciling them, or importing leads.
#[derive(Debug, Error)]
pub enum CrmError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when an uploaded CSV document cannot be tokenised.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a workbook does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a status cell or column holds an unknown pipeline status.
    #[error("invalid lead status '{0}'")]
    InvalidStatus(String),

    /// Raised when a source tag is not one of the known origins.
    #[error("invalid lead source '{0}'")]
    InvalidSource(String),

    /// Raised when a reconciliation direction is not recognised.
    #[error("invalid sync direction '{0}', expected db-to-sheet, sheet-to-db or both")]
    InvalidDirection(String),

    /// Raised when a follow-up board filter is not recognised.
    #[error("invalid follow-up filter '{0}', expected all, pending, completed or overdue")]
    InvalidFollowUpFilter(String),

    /// Raised when a quote form submission breaks one of the form's rules.
    #[error("invalid quote request: {0}")]
    InvalidQuote(String),

    /// Raised when an insert would create a second lead with an existing id.
    #[error("lead {0} already exists")]
    DuplicateLead(String),

    /// Raised when an operation targets a lead that is not in the store.
    #[error("lead {0} not found")]
    UnknownLead(String),

    /// Raised when an operation targets a follow-up that is not in the store.
    #[error("follow-up {0} not found")]
    UnknownFollowUp(String),

    /// Raised when an uploaded CSV holds no header or no data rows.
    #[error("empty or invalid CSV")]
    EmptyImport,

    /// Raised when no CSV row carries a full name.
    #[error("no valid leads found in CSV")]
    NoValidLeads,

    /// Raised when the sync trigger starts without a shared secret.
    #[error("sync secret is not configured; set SYNC_SECRET or pass --secret")]
    MissingSecret,

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),

    /// Raised when the HTTP trigger cannot bind or serve.
    #[error("server error: {0}")]
    Server(String),
}
