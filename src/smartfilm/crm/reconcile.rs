//! Two-way reconciliation between the lead store and the lead worksheet.
//!
//! A pass is split into planning, which is pure and works on snapshots of
//! both stores, and application, which performs the writes. The store is
//! authoritative for which leads exist in the sheet and for their status;
//! rows typed straight into the sheet become new leads, and status edits made
//! in the sheet flow back when the pass runs sheet → store only. A new lead
//! whose status cell was left blank gets `new` written into that cell.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::smartfilm::crm::error::{CrmError, Result};
use crate::smartfilm::crm::io::{CellRef, LeadStore, SheetStore};
use crate::smartfilm::crm::model::{Lead, LeadId, LeadSource, LeadStatus, NewLead};
use crate::smartfilm::crm::schema::{
    LeadField, SHEET_COLUMNS, SheetRecord, assign_text, header_row, lead_to_row,
};

/// Which half (or both halves) of a pass to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    DbToSheet,
    SheetToDb,
    #[default]
    Both,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::DbToSheet => "db-to-sheet",
            Direction::SheetToDb => "sheet-to-db",
            Direction::Both => "both",
        }
    }

    pub fn pushes_to_sheet(self) -> bool {
        matches!(self, Direction::DbToSheet | Direction::Both)
    }

    pub fn pulls_from_sheet(self) -> bool {
        matches!(self, Direction::SheetToDb | Direction::Both)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CrmError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "db-to-sheet" => Ok(Direction::DbToSheet),
            "sheet-to-db" => Ok(Direction::SheetToDb),
            "both" => Ok(Direction::Both),
            other => Err(CrmError::InvalidDirection(other.to_string())),
        }
    }
}

/// Rows created in each direction by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub db_to_sheet: usize,
    pub sheet_to_db: usize,
}

/// A status cell to overwrite with the store's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCell {
    pub cell: CellRef,
    pub lead_id: LeadId,
    pub status: LeadStatus,
}

/// Writes that bring the sheet in line with the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetPlan {
    /// The sheet is empty and needs the header row first.
    pub write_header: bool,
    /// Projected rows for leads the sheet does not have yet.
    pub appends: Vec<Vec<String>>,
    pub status_cells: Vec<StatusCell>,
}

impl SheetPlan {
    pub fn is_empty(&self) -> bool {
        !self.write_header && self.appends.is_empty() && self.status_cells.is_empty()
    }
}

/// A status edit made in the sheet that the store should take over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub lead_id: LeadId,
    pub status: LeadStatus,
}

/// Writes that bring the store in line with the sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadPlan {
    pub inserts: Vec<NewLead>,
    pub status_updates: Vec<StatusUpdate>,
    /// Blank status cells of inserted rows, filled once the insert lands.
    pub status_fills: Vec<StatusCell>,
}

impl LeadPlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.status_updates.is_empty()
    }
}

/// Runs one reconciliation pass.
///
/// Store → sheet runs first. Sheet → store then re-reads the sheet, so rows
/// appended a moment ago are seen again and match their store ids. Fetch
/// failures, the header write, the batch append and status-cell writes abort
/// the pass; per-row store writes are logged and skipped.
#[instrument(level = "info", skip_all, fields(%direction))]
pub fn reconcile<L, S>(store: &mut L, sheet: &mut S, direction: Direction) -> Result<SyncReport>
where
    L: LeadStore + ?Sized,
    S: SheetStore + ?Sized,
{
    let mut report = SyncReport::default();

    if direction.pushes_to_sheet() {
        report.db_to_sheet = sync_db_to_sheet(store, sheet)?;
    }
    if direction.pulls_from_sheet() {
        report.sheet_to_db = sync_sheet_to_db(store, sheet)?;
    }

    info!(
        db_to_sheet = report.db_to_sheet,
        sheet_to_db = report.sheet_to_db,
        "reconciliation pass finished"
    );
    Ok(report)
}

/// Store → sheet half of a pass. Returns the number of appended rows.
#[instrument(level = "debug", skip_all)]
pub fn sync_db_to_sheet<L, S>(store: &L, sheet: &mut S) -> Result<usize>
where
    L: LeadStore + ?Sized,
    S: SheetStore + ?Sized,
{
    let leads = store.list_leads()?;
    let rows = sheet.read_rows()?;
    debug!(lead_count = leads.len(), row_count = rows.len(), "snapshots read");
    let plan = plan_db_to_sheet(&leads, &rows);
    if plan.is_empty() {
        debug!("sheet already matches the store");
        return Ok(0);
    }
    apply_sheet_plan(sheet, plan)
}

/// Sheet → store half of a pass. Returns the number of inserted leads.
#[instrument(level = "debug", skip_all)]
pub fn sync_sheet_to_db<L, S>(store: &mut L, sheet: &mut S) -> Result<usize>
where
    L: LeadStore + ?Sized,
    S: SheetStore + ?Sized,
{
    let rows = sheet.read_rows()?;
    let statuses = store.lead_statuses()?;
    debug!(lead_count = statuses.len(), row_count = rows.len(), "snapshots read");
    let plan = plan_sheet_to_db(&rows, &statuses);
    if plan.is_empty() {
        debug!("store already matches the sheet");
        return Ok(0);
    }
    apply_lead_plan(store, sheet, plan)
}

/// Computes the sheet writes for a store snapshot (oldest lead first) and a
/// sheet snapshot (header included).
pub fn plan_db_to_sheet(leads: &[Lead], sheet_rows: &[Vec<String>]) -> SheetPlan {
    let records = data_records(sheet_rows);
    let existing: HashSet<&str> = records.iter().map(SheetRecord::id).collect();

    let appends = leads
        .iter()
        .filter(|lead| !existing.contains(lead.id.as_str()))
        .map(lead_to_row)
        .collect();

    let by_id: HashMap<&str, &Lead> = leads.iter().map(|lead| (lead.id.as_str(), lead)).collect();
    let status_column = LeadField::Status.column();
    let status_cells = records
        .iter()
        .filter_map(|record| {
            let lead = by_id.get(record.id())?;
            if record.status() == lead.status.as_str() {
                return None;
            }
            Some(StatusCell {
                cell: CellRef::new(record.row_number, status_column),
                lead_id: lead.id.clone(),
                status: lead.status,
            })
        })
        .collect();

    SheetPlan {
        write_header: sheet_rows.is_empty(),
        appends,
        status_cells,
    }
}

/// Applies a sheet plan. Returns the number of appended rows.
pub fn apply_sheet_plan<S>(sheet: &mut S, plan: SheetPlan) -> Result<usize>
where
    S: SheetStore + ?Sized,
{
    if plan.write_header {
        sheet.update(CellRef::origin(), vec![header_row()])?;
        debug!("header row written");
    }

    let appended = plan.appends.len();
    if appended > 0 {
        sheet.append(plan.appends)?;
        info!(row_count = appended, "appended leads to sheet");
    }

    for status_cell in plan.status_cells {
        sheet.update(
            status_cell.cell,
            vec![vec![status_cell.status.as_str().to_string()]],
        )?;
        debug!(
            cell = %status_cell.cell,
            lead_id = %status_cell.lead_id,
            status = %status_cell.status,
            "sheet status overwritten"
        );
    }

    Ok(appended)
}

/// Computes the store writes for a sheet snapshot (header included) and the
/// store's `id -> status` mapping.
pub fn plan_sheet_to_db(
    sheet_rows: &[Vec<String>],
    statuses: &HashMap<LeadId, LeadStatus>,
) -> LeadPlan {
    let mut plan = LeadPlan::default();

    for record in data_records(sheet_rows) {
        if record.id().is_empty() || record.full_name().is_empty() {
            continue;
        }

        match statuses.get(record.id()) {
            None => match draft_from_record(&record) {
                Ok(draft) => {
                    if record.status().is_empty() {
                        plan.status_fills.push(StatusCell {
                            cell: CellRef::new(record.row_number, LeadField::Status.column()),
                            lead_id: record.id().to_string(),
                            status: draft.status,
                        });
                    }
                    plan.inserts.push(draft);
                }
                Err(error) => warn!(
                    row = record.row_number,
                    lead_id = record.id(),
                    %error,
                    "skipping new sheet row"
                ),
            },
            Some(current) => {
                let sheet_status = record.status();
                if sheet_status.is_empty() || sheet_status == current.as_str() {
                    continue;
                }
                match sheet_status.parse::<LeadStatus>() {
                    Ok(status) => plan.status_updates.push(StatusUpdate {
                        lead_id: record.id().to_string(),
                        status,
                    }),
                    Err(error) => warn!(
                        row = record.row_number,
                        lead_id = record.id(),
                        %error,
                        "ignoring sheet status edit"
                    ),
                }
            }
        }
    }

    plan
}

/// Applies a store plan. Failed store writes are logged and skipped; the
/// returned count covers successful inserts only. Status fills go to the
/// sheet for inserted leads and abort the pass on failure.
pub fn apply_lead_plan<L, S>(store: &mut L, sheet: &mut S, plan: LeadPlan) -> Result<usize>
where
    L: LeadStore + ?Sized,
    S: SheetStore + ?Sized,
{
    let mut inserted = HashSet::new();

    for draft in plan.inserts {
        let lead_id = draft.id.clone().unwrap_or_default();
        match store.insert_lead(draft) {
            Ok(lead) => {
                inserted.insert(lead.id);
            }
            Err(error) => warn!(%lead_id, %error, "sheet lead not inserted"),
        }
    }

    for update in plan.status_updates {
        match store.update_status(&update.lead_id, update.status) {
            Ok(()) => debug!(lead_id = %update.lead_id, status = %update.status, "store status updated"),
            Err(error) => warn!(lead_id = %update.lead_id, %error, "store status not updated"),
        }
    }

    for fill in plan.status_fills {
        if !inserted.contains(&fill.lead_id) {
            continue;
        }
        sheet.update(fill.cell, vec![vec![fill.status.as_str().to_string()]])?;
        debug!(cell = %fill.cell, lead_id = %fill.lead_id, "blank sheet status filled");
    }

    if !inserted.is_empty() {
        info!(lead_count = inserted.len(), "inserted leads from sheet");
    }
    Ok(inserted.len())
}

/// Data rows of a sheet snapshot, with their 1-based row numbers.
fn data_records(sheet_rows: &[Vec<String>]) -> Vec<SheetRecord> {
    sheet_rows
        .iter()
        .enumerate()
        .skip(1)
        .map(|(index, row)| SheetRecord::from_row(index as u32 + 1, row))
        .collect()
}

fn draft_from_record(record: &SheetRecord) -> Result<NewLead> {
    let status = match record.status() {
        "" => LeadStatus::New,
        text => text.parse()?,
    };

    let mut draft = NewLead::new(record.full_name(), LeadSource::GoogleSheet);
    for (field, _) in SHEET_COLUMNS {
        if field != LeadField::FullName {
            assign_text(&mut draft, field, record.get(field));
        }
    }
    draft.id = Some(record.id().to_string());
    draft.status = status;
    draft.google_sheet_row_id = Some(record.row_number);
    Ok(draft)
}
