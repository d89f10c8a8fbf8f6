use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::smartfilm::crm::error::{CrmError, Result};
use crate::smartfilm::crm::io::{JsonLeadStore, XlsxSheet};
use crate::smartfilm::crm::io::xlsx::DEFAULT_SHEET_NAME;

/// Shared secret expected in the `Authorization: Bearer` header of the sync
/// trigger. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncSecret(String);

impl SyncSecret {
    /// Rejects a missing or blank secret; there is no built-in fallback.
    pub fn new(secret: Option<String>) -> Result<Self> {
        match secret {
            Some(secret) if !secret.trim().is_empty() => Ok(Self(secret)),
            _ => Err(CrmError::MissingSecret),
        }
    }

    /// Whether an `Authorization` header value carries this secret.
    pub fn authorizes(&self, header: Option<&str>) -> bool {
        header
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| token == self.0)
    }
}

impl fmt::Debug for SyncSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SyncSecret(<redacted>)")
    }
}

/// Where the two stores live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub store: PathBuf,
    pub sheet: PathBuf,
    pub sheet_name: String,
}

impl StorePaths {
    pub fn new(store: impl Into<PathBuf>, sheet: impl Into<PathBuf>) -> Self {
        Self {
            store: store.into(),
            sheet: sheet.into(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }

    pub fn with_sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = sheet_name.into();
        self
    }

    /// Fresh handle on the lead store.
    pub fn lead_store(&self) -> JsonLeadStore {
        JsonLeadStore::new(&self.store)
    }

    /// Fresh handle on the lead worksheet.
    pub fn lead_sheet(&self) -> XlsxSheet {
        XlsxSheet::new(&self.sheet, &self.sheet_name)
    }
}

/// Settings of the HTTP trigger.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub secret: SyncSecret,
    pub paths: StorePaths,
    pub bind: SocketAddr,
}

impl ServerConfig {
    pub fn new(secret: Option<String>, paths: StorePaths, bind: SocketAddr) -> Result<Self> {
        Ok(Self {
            secret: SyncSecret::new(secret)?,
            paths,
            bind,
        })
    }
}
