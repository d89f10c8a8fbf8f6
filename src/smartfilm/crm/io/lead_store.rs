use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::smartfilm::crm::error::{CrmError, Result};
use crate::smartfilm::crm::model::{FollowUp, Lead, LeadId, LeadStatus, NewFollowUp, NewLead};

/// Query/insert/update/delete access to the lead table.
pub trait LeadStore {
    /// All leads ordered by creation time, oldest first.
    fn list_leads(&self) -> Result<Vec<Lead>>;

    /// Inserts a batch of leads. Either every draft is stored or none is.
    ///
    /// Drafts without an id get a fresh UUID. A draft whose id is already
    /// stored, or repeated within the batch, fails the whole batch with
    /// [`CrmError::DuplicateLead`].
    fn insert_leads(&mut self, drafts: Vec<NewLead>) -> Result<Vec<Lead>>;

    /// Sets the pipeline status of one lead and bumps `updated_at`.
    fn update_status(&mut self, id: &str, status: LeadStatus) -> Result<()>;

    fn delete_lead(&mut self, id: &str) -> Result<()>;

    /// `id -> status` for every stored lead.
    fn lead_statuses(&self) -> Result<HashMap<LeadId, LeadStatus>> {
        Ok(self
            .list_leads()?
            .into_iter()
            .map(|lead| (lead.id, lead.status))
            .collect())
    }

    fn insert_lead(&mut self, draft: NewLead) -> Result<Lead> {
        let id = draft.id.clone().unwrap_or_default();
        self.insert_leads(vec![draft])?
            .pop()
            .ok_or(CrmError::UnknownLead(id))
    }
}

/// Access to the follow-up table that sits next to the leads.
pub trait FollowUpStore {
    /// All follow-ups ordered by due date, earliest first.
    fn list_follow_ups(&self) -> Result<Vec<FollowUp>>;

    /// Schedules a follow-up for an existing lead. New follow-ups start out
    /// not completed.
    fn insert_follow_up(&mut self, draft: NewFollowUp) -> Result<FollowUp>;

    fn set_follow_up_completed(&mut self, id: &str, completed: bool) -> Result<()>;

    fn delete_follow_up(&mut self, id: &str) -> Result<()>;
}

/// Lead and follow-up tables held in memory.
///
/// Also the document model of [`JsonLeadStore`](super::JsonLeadStore).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryLeadStore {
    #[serde(default)]
    leads: Vec<Lead>,
    #[serde(default)]
    follow_ups: Vec<FollowUp>,
    #[serde(skip)]
    writes: usize,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful mutating calls applied so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn get(&self, id: &str) -> Option<&Lead> {
        self.leads.iter().find(|lead| lead.id == id)
    }

    fn lead_mut(&mut self, id: &str) -> Result<&mut Lead> {
        self.leads
            .iter_mut()
            .find(|lead| lead.id == id)
            .ok_or_else(|| CrmError::UnknownLead(id.to_string()))
    }

    fn follow_up_mut(&mut self, id: &str) -> Result<&mut FollowUp> {
        self.follow_ups
            .iter_mut()
            .find(|follow_up| follow_up.id == id)
            .ok_or_else(|| CrmError::UnknownFollowUp(id.to_string()))
    }
}

impl LeadStore for MemoryLeadStore {
    fn list_leads(&self) -> Result<Vec<Lead>> {
        let mut leads = self.leads.clone();
        // Stable sort keeps insertion order for equal timestamps.
        leads.sort_by_key(|lead| lead.created_at);
        Ok(leads)
    }

    fn insert_leads(&mut self, drafts: Vec<NewLead>) -> Result<Vec<Lead>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let mut seen: HashSet<String> = self.leads.iter().map(|lead| lead.id.clone()).collect();
        let now = Utc::now();
        let mut created = Vec::with_capacity(drafts.len());

        for mut draft in drafts {
            let id = draft
                .id
                .take()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            if !seen.insert(id.clone()) {
                return Err(CrmError::DuplicateLead(id));
            }
            created.push(draft.into_lead(id, now));
        }

        self.leads.extend(created.iter().cloned());
        self.writes += 1;
        Ok(created)
    }

    fn update_status(&mut self, id: &str, status: LeadStatus) -> Result<()> {
        let lead = self.lead_mut(id)?;
        lead.status = status;
        lead.updated_at = Utc::now();
        self.writes += 1;
        Ok(())
    }

    fn delete_lead(&mut self, id: &str) -> Result<()> {
        let before = self.leads.len();
        self.leads.retain(|lead| lead.id != id);
        if self.leads.len() == before {
            return Err(CrmError::UnknownLead(id.to_string()));
        }
        self.writes += 1;
        Ok(())
    }
}

impl FollowUpStore for MemoryLeadStore {
    fn list_follow_ups(&self) -> Result<Vec<FollowUp>> {
        let mut follow_ups = self.follow_ups.clone();
        follow_ups.sort_by_key(|follow_up| follow_up.follow_up_date);
        Ok(follow_ups)
    }

    fn insert_follow_up(&mut self, draft: NewFollowUp) -> Result<FollowUp> {
        if self.get(&draft.lead_id).is_none() {
            return Err(CrmError::UnknownLead(draft.lead_id));
        }
        let follow_up = draft.into_follow_up(Uuid::new_v4().to_string(), Utc::now());
        self.follow_ups.push(follow_up.clone());
        self.writes += 1;
        Ok(follow_up)
    }

    fn set_follow_up_completed(&mut self, id: &str, completed: bool) -> Result<()> {
        self.follow_up_mut(id)?.completed = completed;
        self.writes += 1;
        Ok(())
    }

    fn delete_follow_up(&mut self, id: &str) -> Result<()> {
        let before = self.follow_ups.len();
        self.follow_ups.retain(|follow_up| follow_up.id != id);
        if self.follow_ups.len() == before {
            return Err(CrmError::UnknownFollowUp(id.to_string()));
        }
        self.writes += 1;
        Ok(())
    }
}
