//! Lead list filtering and the pipeline figures shown on the dashboard.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::smartfilm::crm::model::{Lead, LeadStatus};

/// Search box and status dropdown of the lead list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFilter {
    /// Case-insensitive substring matched against name, email and phone.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
}

impl LeadFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        let status_matches = self.status.is_none_or(|status| lead.status == status);
        status_matches && self.search_matches(lead)
    }

    fn search_matches(&self, lead: &Lead) -> bool {
        let needle = match self.search.as_deref().map(str::trim) {
            None | Some("") => return true,
            Some(text) => text.to_lowercase(),
        };
        let contains = |value: &str| value.to_lowercase().contains(&needle);
        contains(lead.full_name.as_str())
            || lead.email.as_deref().is_some_and(contains)
            || lead.phone.as_deref().is_some_and(contains)
    }
}

/// Leads matching the filter, newest first.
pub fn filter_leads(leads: &[Lead], filter: &LeadFilter) -> Vec<Lead> {
    let mut matching: Vec<Lead> = leads
        .iter()
        .filter(|lead| filter.matches(lead))
        .cloned()
        .collect();
    matching.sort_by(|lhs, rhs| rhs.created_at.cmp(&lhs.created_at));
    matching
}

/// Lead totals per pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub total: usize,
    pub by_status: BTreeMap<LeadStatus, usize>,
}

impl PipelineSummary {
    pub fn from_leads(leads: &[Lead]) -> Self {
        let mut by_status: BTreeMap<LeadStatus, usize> =
            LeadStatus::ALL.into_iter().map(|status| (status, 0)).collect();
        for lead in leads {
            *by_status.entry(lead.status).or_default() += 1;
        }
        Self {
            total: leads.len(),
            by_status,
        }
    }

    pub fn count(&self, status: LeadStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or_default()
    }
}

/// Leads created in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyIntake {
    /// Short label such as `Oct 26`.
    pub month: String,
    pub count: usize,
}

/// Lead counts for the `months` calendar months ending with the month of
/// `today`, oldest first. Months without leads are reported as zero.
pub fn monthly_intake(leads: &[Lead], today: NaiveDate, months: u32) -> Vec<MonthlyIntake> {
    let Some(current) = today.with_day(1) else {
        return Vec::new();
    };

    (0..months)
        .rev()
        .filter_map(|offset| current.checked_sub_months(Months::new(offset)))
        .map(|start| {
            let count = leads
                .iter()
                .map(|lead| lead.created_at.date_naive())
                .filter(|created| {
                    created.year() == start.year() && created.month() == start.month()
                })
                .count();
            MonthlyIntake {
                month: start.format("%b %y").to_string(),
                count,
            }
        })
        .collect()
}
