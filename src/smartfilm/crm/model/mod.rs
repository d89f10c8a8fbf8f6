use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::smartfilm::crm::error::CrmError;

mod follow_up;

pub use follow_up::{FollowUp, NewFollowUp};

/// Identifier assigned to a lead. Kept as the plain string representation so
/// it survives the trip through spreadsheet cells unchanged.
pub type LeadId = String;

/// Sales pipeline stage of a lead.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Quoted,
    Won,
    Lost,
}

impl LeadStatus {
    /// Every status in pipeline order.
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Quoted,
        LeadStatus::Won,
        LeadStatus::Lost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Quoted => "quoted",
            LeadStatus::Won => "won",
            LeadStatus::Lost => "lost",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = CrmError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        LeadStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value.trim())
            .ok_or_else(|| CrmError::InvalidStatus(value.to_string()))
    }
}

/// How a lead entered the system. Set once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    QuoteForm,
    Manual,
    GoogleSheet,
}

impl LeadSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadSource::QuoteForm => "quote_form",
            LeadSource::Manual => "manual",
            LeadSource::GoogleSheet => "google_sheet",
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadSource {
    type Err = CrmError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "quote_form" => Ok(LeadSource::QuoteForm),
            "manual" => Ok(LeadSource::Manual),
            "google_sheet" => Ok(LeadSource::GoogleSheet),
            other => Err(CrmError::InvalidSource(other.to_string())),
        }
    }
}

/// A prospective customer as held by the lead store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city_state: Option<String>,
    pub project_type: Option<String>,
    pub timeline: Option<String>,
    pub glass_size: Option<String>,
    pub message: Option<String>,
    pub status: LeadStatus,
    pub source: LeadSource,
    /// 1-based spreadsheet row the lead was first read from. Only set for
    /// leads that originated in the spreadsheet.
    #[serde(default)]
    pub google_sheet_row_id: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A lead that has not been stored yet. The store assigns the identifier
/// unless one is carried over from another system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    #[serde(default)]
    pub id: Option<LeadId>,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub city_state: Option<String>,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub glass_size: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: LeadStatus,
    pub source: LeadSource,
    #[serde(default)]
    pub google_sheet_row_id: Option<u32>,
}

/// Fields collected by the public quote request form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub project_type: String,
    #[serde(default)]
    pub glass_size: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl QuoteRequest {
    /// Applies the form's field rules: name and city of at least two
    /// characters, an email address, a phone number of at least ten
    /// characters and a project type.
    pub fn validate(&self) -> Result<(), CrmError> {
        let rules = [
            (self.name.trim().chars().count() >= 2, "Name is required"),
            (is_email(&self.email), "Invalid email address"),
            (self.phone.trim().chars().count() >= 10, "Phone number required"),
            (self.city.trim().chars().count() >= 2, "City/State is required"),
            (!self.project_type.trim().is_empty(), "Please select a project type"),
        ];
        match rules.into_iter().find(|(valid, _)| !valid) {
            Some((_, message)) => Err(CrmError::InvalidQuote(message.to_string())),
            None => Ok(()),
        }
    }
}

fn is_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !value.contains(char::is_whitespace)
                && domain.split_once('.').is_some_and(|(host, tld)| {
                    !host.is_empty() && !tld.is_empty()
                })
        }
        None => false,
    }
}

impl NewLead {
    /// Creates a draft with only the name and origin set.
    pub fn new(full_name: impl Into<String>, source: LeadSource) -> Self {
        Self {
            id: None,
            full_name: full_name.into(),
            phone: None,
            email: None,
            city_state: None,
            project_type: None,
            timeline: None,
            glass_size: None,
            message: None,
            status: LeadStatus::New,
            source,
            google_sheet_row_id: None,
        }
    }

    /// Draft for a lead typed in by staff on the dashboard.
    pub fn manual(full_name: impl Into<String>) -> Self {
        Self::new(full_name, LeadSource::Manual)
    }

    /// Draft for a submission of the public quote form.
    pub fn quote_form(request: QuoteRequest) -> Self {
        Self {
            phone: non_blank(request.phone),
            email: non_blank(request.email),
            city_state: non_blank(request.city),
            project_type: non_blank(request.project_type),
            timeline: request.timeline.and_then(non_blank),
            glass_size: request.glass_size.and_then(non_blank),
            message: request.message.and_then(non_blank),
            ..Self::new(request.name.trim(), LeadSource::QuoteForm)
        }
    }

    /// Materialises the draft as a stored lead.
    pub fn into_lead(self, id: LeadId, now: DateTime<Utc>) -> Lead {
        Lead {
            id,
            full_name: self.full_name,
            phone: self.phone,
            email: self.email,
            city_state: self.city_state,
            project_type: self.project_type,
            timeline: self.timeline,
            glass_size: self.glass_size,
            message: self.message,
            status: self.status,
            source: self.source,
            google_sheet_row_id: self.google_sheet_row_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Maps blank text to `None`, trimming whatever is kept.
pub fn non_blank(value: impl AsRef<str>) -> Option<String> {
    let trimmed = value.as_ref().trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
