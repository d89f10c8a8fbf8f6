use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::smartfilm::crm::error::{CrmError, Result};
use crate::smartfilm::crm::io::{FollowUpStore, LeadStore};
use crate::smartfilm::crm::model::{FollowUp, Lead};

/// Board tabs of the follow-up list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpFilter {
    #[default]
    All,
    Pending,
    Completed,
    Overdue,
}

impl FollowUpFilter {
    pub fn matches(self, follow_up: &FollowUp, today: NaiveDate) -> bool {
        match self {
            FollowUpFilter::All => true,
            FollowUpFilter::Pending => !follow_up.completed,
            FollowUpFilter::Completed => follow_up.completed,
            FollowUpFilter::Overdue => is_overdue(follow_up, today),
        }
    }
}

impl fmt::Display for FollowUpFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FollowUpFilter::All => "all",
            FollowUpFilter::Pending => "pending",
            FollowUpFilter::Completed => "completed",
            FollowUpFilter::Overdue => "overdue",
        };
        f.write_str(name)
    }
}

impl FromStr for FollowUpFilter {
    type Err = CrmError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "all" => Ok(FollowUpFilter::All),
            "pending" => Ok(FollowUpFilter::Pending),
            "completed" => Ok(FollowUpFilter::Completed),
            "overdue" => Ok(FollowUpFilter::Overdue),
            other => Err(CrmError::InvalidFollowUpFilter(other.to_string())),
        }
    }
}

/// Not completed and due before `today`.
pub fn is_overdue(follow_up: &FollowUp, today: NaiveDate) -> bool {
    !follow_up.completed && follow_up.follow_up_date < today
}

/// Counters shown above the follow-up board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpSummary {
    pub pending: usize,
    pub completed: usize,
    pub overdue: usize,
}

impl FollowUpSummary {
    pub fn from_follow_ups(follow_ups: &[FollowUp], today: NaiveDate) -> Self {
        follow_ups
            .iter()
            .fold(Self::default(), |mut summary, follow_up| {
                if follow_up.completed {
                    summary.completed += 1;
                } else {
                    summary.pending += 1;
                }
                if is_overdue(follow_up, today) {
                    summary.overdue += 1;
                }
                summary
            })
    }
}

/// A follow-up joined with the lead it refers to, when that lead still
/// exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowUpEntry {
    #[serde(flatten)]
    pub follow_up: FollowUp,
    pub lead: Option<Lead>,
}

/// Follow-up board: the filtered entries (earliest due first) plus the
/// summary over every follow-up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowUpBoard {
    pub summary: FollowUpSummary,
    pub entries: Vec<FollowUpEntry>,
}

pub fn follow_up_board<S>(
    store: &S,
    filter: FollowUpFilter,
    today: NaiveDate,
) -> Result<FollowUpBoard>
where
    S: LeadStore + FollowUpStore + ?Sized,
{
    let follow_ups = store.list_follow_ups()?;
    let leads: HashMap<String, Lead> = store
        .list_leads()?
        .into_iter()
        .map(|lead| (lead.id.clone(), lead))
        .collect();

    let summary = FollowUpSummary::from_follow_ups(&follow_ups, today);
    let entries = follow_ups
        .into_iter()
        .filter(|follow_up| filter.matches(follow_up, today))
        .map(|follow_up| {
            let lead = leads.get(&follow_up.lead_id).cloned();
            FollowUpEntry { follow_up, lead }
        })
        .collect();

    Ok(FollowUpBoard { summary, entries })
}
