//! Bulk lead import from uploaded CSV files.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, instrument};

use crate::smartfilm::crm::error::{CrmError, Result};
use crate::smartfilm::crm::io::LeadStore;
use crate::smartfilm::crm::model::{LeadSource, LeadStatus, NewLead};
use crate::smartfilm::crm::schema::{LeadField, assign_text};

/// Origin recorded on every imported lead, whatever the file says.
pub const IMPORT_SOURCE: LeadSource = LeadSource::GoogleSheet;

/// Normalised header token → canonical field name.
pub const HEADER_SYNONYMS: &[(&str, &str)] = &[
    ("name", "full_name"),
    ("fullname", "full_name"),
    ("full_name", "full_name"),
    ("email", "email"),
    ("emailaddress", "email"),
    ("phone", "phone"),
    ("phonenumber", "phone"),
    ("telephone", "phone"),
    ("city", "city_state"),
    ("citystate", "city_state"),
    ("city_state", "city_state"),
    ("location", "city_state"),
    ("project", "project_type"),
    ("projecttype", "project_type"),
    ("project_type", "project_type"),
    ("type", "project_type"),
    ("timeline", "timeline"),
    ("glasssize", "glass_size"),
    ("glass_size", "glass_size"),
    ("size", "glass_size"),
    ("message", "message"),
    ("notes", "message"),
    ("comment", "message"),
    ("status", "status"),
    ("source", "source"),
];

/// Lower-cases a raw header, drops everything but `a-z` and `_`, then maps
/// it through [`HEADER_SYNONYMS`]. Unknown tokens come back unchanged.
pub fn normalize_header(raw: &str) -> String {
    let token: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || *ch == '_')
        .collect();
    HEADER_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == token)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(token)
}

/// Parses CSV text into lead drafts ready for a batch insert.
///
/// Every line is one record, so a quote left open ends with its line. The
/// first non-blank line is the header. Rows without a full name are
/// dropped. Status falls back to `new` unless the row holds one of the known
/// statuses, and the source is always [`IMPORT_SOURCE`].
pub fn parse_csv_leads(content: &str) -> Result<Vec<NewLead>> {
    let mut records = Vec::new();
    for line in content.lines().filter(|line| !line.trim().is_empty()) {
        if let Some(record) = tokenize_line(line)? {
            records.push(record);
        }
    }

    let Some((header, rows)) = records.split_first() else {
        return Err(CrmError::EmptyImport);
    };
    if rows.is_empty() {
        return Err(CrmError::EmptyImport);
    }

    let columns: Vec<Option<LeadField>> = header
        .iter()
        .map(|raw| importable_field(&normalize_header(raw)))
        .collect();
    debug!(?columns, "CSV header mapped");

    let drafts: Vec<NewLead> = rows
        .iter()
        .filter_map(|row| draft_from_row(&columns, row))
        .collect();
    debug!(
        row_count = rows.len(),
        lead_count = drafts.len(),
        "CSV rows parsed"
    );
    Ok(drafts)
}

/// Parses CSV text and inserts every valid lead in one batch.
#[instrument(level = "info", skip_all, fields(bytes = content.len()))]
pub fn import_csv<L>(store: &mut L, content: &str) -> Result<usize>
where
    L: LeadStore + ?Sized,
{
    let drafts = parse_csv_leads(content)?;
    if drafts.is_empty() {
        return Err(CrmError::NoValidLeads);
    }
    let inserted = store.insert_leads(drafts)?.len();
    info!(lead_count = inserted, "imported leads from CSV");
    Ok(inserted)
}

/// Reads a CSV file from disk and imports it.
#[instrument(level = "info", skip(store), fields(input = %path.display()))]
pub fn import_csv_file<L>(store: &mut L, path: &Path) -> Result<usize>
where
    L: LeadStore + ?Sized,
{
    if !path.exists() {
        return Err(CrmError::MissingInput(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    import_csv(store, &content)
}

/// Fields a CSV column may populate. Ids, timestamps and the source are
/// owned by the store.
fn importable_field(name: &str) -> Option<LeadField> {
    LeadField::from_name(name)
        .filter(|field| field.is_descriptive() || *field == LeadField::Status)
}

/// Splits one line into trimmed fields. Returns `None` when every field is
/// blank.
fn tokenize_line(line: &str) -> Result<Option<StringRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    if !reader.read_record(&mut record)? {
        return Ok(None);
    }
    if record.iter().all(str::is_empty) {
        return Ok(None);
    }
    Ok(Some(record))
}

fn draft_from_row(columns: &[Option<LeadField>], row: &StringRecord) -> Option<NewLead> {
    let mut draft = NewLead::new(String::new(), IMPORT_SOURCE);

    for (column, value) in columns.iter().zip(row.iter()) {
        match column {
            Some(LeadField::Status) if !value.is_empty() => {
                draft.status = value.parse().unwrap_or(LeadStatus::New);
            }
            Some(field) if !value.is_empty() => {
                assign_text(&mut draft, *field, value);
            }
            _ => {}
        }
    }

    if draft.full_name.is_empty() {
        None
    } else {
        Some(draft)
    }
}
