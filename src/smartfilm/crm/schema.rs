//! Canonical lead schema and its projection onto spreadsheet columns.
//!
//! [`SHEET_COLUMNS`] is the single declaration of the column layout. The
//! header row, the lead → row projection, the row → record parsing and the
//! status-cell address are all derived from it, so a layout change is a
//! one-line edit here.

use std::collections::BTreeMap;

use chrono::SecondsFormat;

use crate::smartfilm::crm::model::{Lead, NewLead, non_blank};

/// Canonical lead field names shared by the spreadsheet and CSV layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LeadField {
    Id,
    FullName,
    Phone,
    Email,
    CityState,
    ProjectType,
    Timeline,
    GlassSize,
    Message,
    Status,
    Source,
    CreatedAt,
    UpdatedAt,
}

/// Number of columns in the lead worksheet (`A:M`).
pub const SHEET_WIDTH: usize = 13;

/// Ordered `(field, zero-based column)` pairs of the lead worksheet.
pub const SHEET_COLUMNS: [(LeadField, u16); SHEET_WIDTH] = [
    (LeadField::Id, 0),
    (LeadField::FullName, 1),
    (LeadField::Phone, 2),
    (LeadField::Email, 3),
    (LeadField::CityState, 4),
    (LeadField::ProjectType, 5),
    (LeadField::Timeline, 6),
    (LeadField::GlassSize, 7),
    (LeadField::Message, 8),
    (LeadField::Status, 9),
    (LeadField::Source, 10),
    (LeadField::CreatedAt, 11),
    (LeadField::UpdatedAt, 12),
];

impl LeadField {
    pub fn name(self) -> &'static str {
        match self {
            LeadField::Id => "id",
            LeadField::FullName => "full_name",
            LeadField::Phone => "phone",
            LeadField::Email => "email",
            LeadField::CityState => "city_state",
            LeadField::ProjectType => "project_type",
            LeadField::Timeline => "timeline",
            LeadField::GlassSize => "glass_size",
            LeadField::Message => "message",
            LeadField::Status => "status",
            LeadField::Source => "source",
            LeadField::CreatedAt => "created_at",
            LeadField::UpdatedAt => "updated_at",
        }
    }

    /// Looks up a field by its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        SHEET_COLUMNS
            .iter()
            .map(|(field, _)| *field)
            .find(|field| field.name() == name)
    }

    /// Zero-based worksheet column holding this field.
    pub fn column(self) -> u16 {
        SHEET_COLUMNS
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, column)| *column)
            .unwrap_or_default()
    }

    /// Free-text fields a person may type in; everything else is managed by
    /// the store.
    pub fn is_descriptive(self) -> bool {
        matches!(
            self,
            LeadField::FullName
                | LeadField::Phone
                | LeadField::Email
                | LeadField::CityState
                | LeadField::ProjectType
                | LeadField::Timeline
                | LeadField::GlassSize
                | LeadField::Message
        )
    }
}

/// Header row written to an empty worksheet.
pub fn header_row() -> Vec<String> {
    SHEET_COLUMNS
        .iter()
        .map(|(field, _)| field.name().to_string())
        .collect()
}

/// Projects a lead onto a worksheet row in the canonical column order.
pub fn lead_to_row(lead: &Lead) -> Vec<String> {
    let mut row = vec![String::new(); SHEET_WIDTH];
    for (field, column) in SHEET_COLUMNS {
        row[usize::from(column)] = field_value(lead, field);
    }
    row
}

/// Text representation of one field of a stored lead.
pub fn field_value(lead: &Lead, field: LeadField) -> String {
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();
    match field {
        LeadField::Id => lead.id.clone(),
        LeadField::FullName => lead.full_name.clone(),
        LeadField::Phone => optional(&lead.phone),
        LeadField::Email => optional(&lead.email),
        LeadField::CityState => optional(&lead.city_state),
        LeadField::ProjectType => optional(&lead.project_type),
        LeadField::Timeline => optional(&lead.timeline),
        LeadField::GlassSize => optional(&lead.glass_size),
        LeadField::Message => optional(&lead.message),
        LeadField::Status => lead.status.as_str().to_string(),
        LeadField::Source => lead.source.as_str().to_string(),
        LeadField::CreatedAt => lead
            .created_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        LeadField::UpdatedAt => lead
            .updated_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Sets a descriptive field on a draft. Blank text clears optional fields.
/// Returns `false` for fields that are not descriptive.
pub fn assign_text(draft: &mut NewLead, field: LeadField, value: &str) -> bool {
    let slot = match field {
        LeadField::FullName => {
            draft.full_name = value.trim().to_string();
            return true;
        }
        LeadField::Phone => &mut draft.phone,
        LeadField::Email => &mut draft.email,
        LeadField::CityState => &mut draft.city_state,
        LeadField::ProjectType => &mut draft.project_type,
        LeadField::Timeline => &mut draft.timeline,
        LeadField::GlassSize => &mut draft.glass_size,
        LeadField::Message => &mut draft.message,
        _ => return false,
    };
    *slot = non_blank(value);
    true
}

/// A worksheet row read back through the column layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRecord {
    /// 1-based worksheet row the record was read from.
    pub row_number: u32,
    cells: BTreeMap<LeadField, String>,
}

impl SheetRecord {
    /// Reads the cells of one row; missing trailing cells read as empty.
    pub fn from_row(row_number: u32, row: &[String]) -> Self {
        let cells = SHEET_COLUMNS
            .iter()
            .map(|(field, column)| {
                let value = row.get(usize::from(*column)).cloned().unwrap_or_default();
                (*field, value)
            })
            .collect();
        Self { row_number, cells }
    }

    /// Raw cell text for a field.
    pub fn get(&self, field: LeadField) -> &str {
        self.cells.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn id(&self) -> &str {
        self.get(LeadField::Id).trim()
    }

    pub fn full_name(&self) -> &str {
        self.get(LeadField::FullName).trim()
    }

    pub fn status(&self) -> &str {
        self.get(LeadField::Status).trim()
    }
}
