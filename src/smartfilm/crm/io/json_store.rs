use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::smartfilm::crm::error::Result;
use crate::smartfilm::crm::io::lead_store::{FollowUpStore, LeadStore, MemoryLeadStore};
use crate::smartfilm::crm::io::staging_path;
use crate::smartfilm::crm::model::{FollowUp, Lead, LeadId, LeadStatus, NewFollowUp, NewLead};

/// Lead and follow-up tables persisted as one JSON document.
///
/// Each call loads the document, applies the operation and writes it back,
/// so a handle holds no state between calls. A missing file reads as an
/// empty store.
#[derive(Debug, Clone)]
pub struct JsonLeadStore {
    path: PathBuf,
}

impl JsonLeadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<MemoryLeadStore> {
        if !self.path.exists() {
            return Ok(MemoryLeadStore::new());
        }
        let source = fs::read_to_string(&self.path)?;
        if source.trim().is_empty() {
            return Ok(MemoryLeadStore::new());
        }
        Ok(serde_json::from_str(&source)?)
    }

    fn save(&self, store: &MemoryLeadStore) -> Result<()> {
        let json_string = serde_json::to_string_pretty(store)?;
        let staging = staging_path(&self.path);
        fs::write(&staging, json_string)?;
        fs::rename(&staging, &self.path)?;
        debug!(path = %self.path.display(), "lead store written");
        Ok(())
    }

    fn modify<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut MemoryLeadStore) -> Result<T>,
    {
        let mut store = self.load()?;
        let outcome = change(&mut store)?;
        self.save(&store)?;
        Ok(outcome)
    }
}

impl LeadStore for JsonLeadStore {
    fn list_leads(&self) -> Result<Vec<Lead>> {
        self.load()?.list_leads()
    }

    fn lead_statuses(&self) -> Result<HashMap<LeadId, LeadStatus>> {
        self.load()?.lead_statuses()
    }

    fn insert_leads(&mut self, drafts: Vec<NewLead>) -> Result<Vec<Lead>> {
        self.modify(|store| store.insert_leads(drafts))
    }

    fn update_status(&mut self, id: &str, status: LeadStatus) -> Result<()> {
        self.modify(|store| store.update_status(id, status))
    }

    fn delete_lead(&mut self, id: &str) -> Result<()> {
        self.modify(|store| store.delete_lead(id))
    }
}

impl FollowUpStore for JsonLeadStore {
    fn list_follow_ups(&self) -> Result<Vec<FollowUp>> {
        self.load()?.list_follow_ups()
    }

    fn insert_follow_up(&mut self, draft: NewFollowUp) -> Result<FollowUp> {
        self.modify(|store| store.insert_follow_up(draft))
    }

    fn set_follow_up_completed(&mut self, id: &str, completed: bool) -> Result<()> {
        self.modify(|store| store.set_follow_up_completed(id, completed))
    }

    fn delete_follow_up(&mut self, id: &str) -> Result<()> {
        self.modify(|store| store.delete_follow_up(id))
    }
}
