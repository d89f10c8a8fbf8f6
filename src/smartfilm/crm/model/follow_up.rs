use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::LeadId;

/// A scheduled reminder to get back to a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: String,
    /// Lead the reminder is about. A reference only; the lead may since have
    /// been deleted.
    pub lead_id: LeadId,
    pub note: String,
    pub follow_up_date: NaiveDate,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// A follow-up as scheduled from the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFollowUp {
    pub lead_id: LeadId,
    pub note: String,
    pub follow_up_date: NaiveDate,
}

impl NewFollowUp {
    pub fn into_follow_up(self, id: String, now: DateTime<Utc>) -> FollowUp {
        FollowUp {
            id,
            lead_id: self.lead_id,
            note: self.note,
            follow_up_date: self.follow_up_date,
            completed: false,
            created_at: now,
        }
    }
}
