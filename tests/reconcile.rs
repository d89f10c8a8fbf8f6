use std::collections::HashMap;

use smartfilm_crm::CrmError;
use smartfilm_crm::io::{CellRef, LeadStore, MemoryLeadStore, MemorySheet, SheetStore};
use smartfilm_crm::model::{Lead, LeadId, LeadSource, LeadStatus, NewLead};
use smartfilm_crm::reconcile::{
    Direction, SyncReport, apply_sheet_plan, plan_db_to_sheet, plan_sheet_to_db, reconcile,
};
use smartfilm_crm::schema::{LeadField, header_row, lead_to_row};

fn store_with(names: &[&str]) -> MemoryLeadStore {
    let mut store = MemoryLeadStore::new();
    for name in names {
        store
            .insert_lead(NewLead::manual(*name))
            .expect("lead inserted");
    }
    store
}

fn sheet_row(id: &str, full_name: &str, status: &str) -> Vec<String> {
    let mut row = vec![String::new(); header_row().len()];
    row[usize::from(LeadField::Id.column())] = id.to_string();
    row[usize::from(LeadField::FullName.column())] = full_name.to_string();
    row[usize::from(LeadField::Status.column())] = status.to_string();
    row
}

fn status_cell(row: u32) -> CellRef {
    CellRef::new(row, LeadField::Status.column())
}

#[test]
fn empty_sheet_gets_header_and_one_row_per_lead() {
    let mut store = store_with(&["Ana Ruiz", "Ben Cole"]);
    let mut sheet = MemorySheet::new();

    let report = reconcile(&mut store, &mut sheet, Direction::DbToSheet).expect("sync ran");

    assert_eq!(
        report,
        SyncReport {
            db_to_sheet: 2,
            sheet_to_db: 0
        }
    );
    let leads = store.list_leads().expect("leads listed");
    let rows = sheet.read_rows().expect("rows read");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], header_row());
    assert_eq!(rows[1], lead_to_row(&leads[0]));
    assert_eq!(rows[2], lead_to_row(&leads[1]));
    assert_eq!(rows[1][1], "Ana Ruiz");
    assert_eq!(rows[1][9], "new");
    assert_eq!(rows[1][10], "manual");
    // Header write plus a single batch append.
    assert_eq!(sheet.write_count(), 2);
}

#[test]
fn header_row_follows_column_layout() {
    assert_eq!(
        header_row(),
        vec![
            "id",
            "full_name",
            "phone",
            "email",
            "city_state",
            "project_type",
            "timeline",
            "glass_size",
            "message",
            "status",
            "source",
            "created_at",
            "updated_at",
        ]
    );
    assert_eq!(status_cell(5).to_string(), "J5");
}

#[test]
fn status_drift_rewrites_only_the_status_cell() {
    let mut store = store_with(&["Ana Ruiz"]);
    let lead = store.list_leads().expect("leads listed").remove(0);
    let row_before = lead_to_row(&lead);
    let mut sheet = MemorySheet::with_rows(vec![header_row(), row_before.clone()]);

    store
        .update_status(&lead.id, LeadStatus::Won)
        .expect("status updated");
    let report = reconcile(&mut store, &mut sheet, Direction::DbToSheet).expect("sync ran");

    assert_eq!(report.db_to_sheet, 0);
    assert_eq!(sheet.write_count(), 1);
    assert_eq!(sheet.cell(status_cell(2)), Some("won"));

    let row = &sheet.read_rows().expect("rows read")[1];
    for (column, value) in row.iter().enumerate() {
        if column == usize::from(LeadField::Status.column()) {
            continue;
        }
        assert_eq!(value, &row_before[column], "column {column} changed");
    }
}

#[test]
fn cleared_status_cell_is_rewritten_from_store() {
    let mut store = store_with(&["Ana Ruiz"]);
    let lead = store.list_leads().expect("leads listed").remove(0);
    let mut sheet = MemorySheet::with_rows(vec![header_row(), sheet_row(&lead.id, "Ana Ruiz", "")]);

    reconcile(&mut store, &mut sheet, Direction::Both).expect("sync ran");

    assert_eq!(sheet.write_count(), 1);
    assert_eq!(sheet.cell(status_cell(2)), Some("new"));
    assert_eq!(store.get(&lead.id).expect("lead kept").status, LeadStatus::New);
}

#[test]
fn sheet_only_row_becomes_lead() {
    let mut row = sheet_row("sheet-1", "Carla Diaz", "");
    row[usize::from(LeadField::Phone.column())] = "555-0100".to_string();
    row[usize::from(LeadField::Source.column())] = "manual".to_string();
    let mut sheet = MemorySheet::with_rows(vec![header_row(), row]);
    let mut store = MemoryLeadStore::new();

    let report = reconcile(&mut store, &mut sheet, Direction::SheetToDb).expect("sync ran");

    assert_eq!(report.sheet_to_db, 1);
    // The blank status cell is filled with the default once.
    assert_eq!(sheet.write_count(), 1);
    assert_eq!(sheet.cell(status_cell(2)), Some("new"));
    let lead = store.get("sheet-1").expect("lead inserted");
    assert_eq!(lead.full_name, "Carla Diaz");
    assert_eq!(lead.phone.as_deref(), Some("555-0100"));
    assert_eq!(lead.email, None);
    assert_eq!(lead.status, LeadStatus::New);
    assert_eq!(lead.source, LeadSource::GoogleSheet);
    assert_eq!(lead.google_sheet_row_id, Some(2));
}

#[test]
fn sheet_row_keeps_valid_status() {
    let mut sheet = MemorySheet::with_rows(vec![
        header_row(),
        sheet_row("sheet-1", "Carla Diaz", "quoted"),
        sheet_row("sheet-2", "Dan Ng", "Pending"),
    ]);
    let mut store = MemoryLeadStore::new();

    let report = reconcile(&mut store, &mut sheet, Direction::SheetToDb).expect("sync ran");

    assert_eq!(report.sheet_to_db, 1);
    assert_eq!(
        store.get("sheet-1").expect("lead inserted").status,
        LeadStatus::Quoted
    );
    assert!(store.get("sheet-2").is_none());
    assert_eq!(sheet.write_count(), 0);
}

#[test]
fn rows_missing_id_or_name_are_skipped() {
    let mut sheet = MemorySheet::with_rows(vec![
        header_row(),
        sheet_row("sheet-1", "", "new"),
        sheet_row("", "Nameless Id", "new"),
        sheet_row("  ", "  ", ""),
    ]);
    let mut store = MemoryLeadStore::new();

    let report = reconcile(&mut store, &mut sheet, Direction::SheetToDb).expect("sync ran");

    assert_eq!(report.sheet_to_db, 0);
    assert!(store.list_leads().expect("leads listed").is_empty());
}

#[test]
fn sheet_status_edit_flows_back_to_store() {
    let mut store = store_with(&["Ana Ruiz", "Ben Cole"]);
    let leads = store.list_leads().expect("leads listed");
    let mut sheet = MemorySheet::with_rows(vec![
        header_row(),
        sheet_row(&leads[0].id, "Ana Ruiz", "contacted"),
        sheet_row(&leads[1].id, "Ben Cole", "Won!"),
    ]);

    let report = reconcile(&mut store, &mut sheet, Direction::SheetToDb).expect("sync ran");

    assert_eq!(report.sheet_to_db, 0);
    assert_eq!(
        store.get(&leads[0].id).expect("lead kept").status,
        LeadStatus::Contacted
    );
    // Unknown statuses leave the store untouched.
    assert_eq!(
        store.get(&leads[1].id).expect("lead kept").status,
        LeadStatus::New
    );
}

#[test]
fn both_directions_let_store_status_win() {
    let mut store = store_with(&["Ana Ruiz"]);
    let lead = store.list_leads().expect("leads listed").remove(0);
    store
        .update_status(&lead.id, LeadStatus::Contacted)
        .expect("status updated");
    let mut sheet = MemorySheet::with_rows(vec![header_row(), sheet_row(&lead.id, "Ana Ruiz", "won")]);

    reconcile(&mut store, &mut sheet, Direction::Both).expect("sync ran");

    assert_eq!(sheet.cell(status_cell(2)), Some("contacted"));
    assert_eq!(
        store.get(&lead.id).expect("lead kept").status,
        LeadStatus::Contacted
    );
}

#[test]
fn appended_rows_are_not_imported_back() {
    let mut store = store_with(&["Ana Ruiz", "Ben Cole"]);
    let mut sheet = MemorySheet::new();

    let report = reconcile(&mut store, &mut sheet, Direction::Both).expect("sync ran");

    assert_eq!(report.db_to_sheet, 2);
    assert_eq!(report.sheet_to_db, 0);
    assert_eq!(store.list_leads().expect("leads listed").len(), 2);
}

#[test]
fn second_pass_without_changes_writes_nothing() {
    let mut store = store_with(&["Ana Ruiz", "Ben Cole"]);
    let leads = store.list_leads().expect("leads listed");
    store
        .update_status(&leads[1].id, LeadStatus::Quoted)
        .expect("status updated");
    let mut sheet = MemorySheet::with_rows(vec![
        header_row(),
        sheet_row(&leads[1].id, "Ben Cole", "new"),
        sheet_row("sheet-7", "Carla Diaz", ""),
        sheet_row("sheet-8", "Dan Ng", "lost"),
    ]);

    let first = reconcile(&mut store, &mut sheet, Direction::Both).expect("first pass");
    assert_eq!(first.db_to_sheet, 1);
    assert_eq!(first.sheet_to_db, 2);
    assert_eq!(sheet.cell(status_cell(3)), Some("new"));

    let sheet_writes = sheet.write_count();
    let store_writes = store.write_count();
    let second = reconcile(&mut store, &mut sheet, Direction::Both).expect("second pass");

    assert_eq!(second, SyncReport::default());
    assert_eq!(sheet.write_count(), sheet_writes);
    assert_eq!(store.write_count(), store_writes);
}

#[test]
fn overlapping_passes_can_append_duplicate_rows() {
    let store = store_with(&["Ana Ruiz"]);
    let leads = store.list_leads().expect("leads listed");
    let mut sheet = MemorySheet::with_rows(vec![header_row()]);

    // Two triggers read the same snapshots before either one writes.
    let snapshot = sheet.read_rows().expect("rows read");
    let first = plan_db_to_sheet(&leads, &snapshot);
    let second = plan_db_to_sheet(&leads, &snapshot);
    apply_sheet_plan(&mut sheet, first).expect("first plan applied");
    apply_sheet_plan(&mut sheet, second).expect("second plan applied");

    let rows = sheet.read_rows().expect("rows read");
    let copies = rows.iter().filter(|row| row[0] == leads[0].id).count();
    assert_eq!(copies, 2);
}

#[test]
fn overlapping_passes_cannot_duplicate_store_rows() {
    let sheet = MemorySheet::with_rows(vec![header_row(), sheet_row("sheet-1", "Carla Diaz", "")]);
    let mut store = MemoryLeadStore::new();
    let rows = sheet.read_rows().expect("rows read");
    let statuses: HashMap<LeadId, LeadStatus> = HashMap::new();

    let first = plan_sheet_to_db(&rows, &statuses);
    let second = plan_sheet_to_db(&rows, &statuses);
    assert_eq!(first.status_fills.len(), 1);
    let draft = first.inserts[0].clone();
    store.insert_leads(first.inserts).expect("first insert");

    let error = store
        .insert_leads(second.inserts)
        .expect_err("duplicate rejected");
    assert!(matches!(error, CrmError::DuplicateLead(id) if id == "sheet-1"));
    assert_eq!(store.list_leads().expect("leads listed").len(), 1);
    assert_eq!(draft.id.as_deref(), Some("sheet-1"));
}

struct FailingSheet {
    inner: MemorySheet,
}

impl SheetStore for FailingSheet {
    fn read_rows(&self) -> smartfilm_crm::Result<Vec<Vec<String>>> {
        self.inner.read_rows()
    }

    fn update(&mut self, start: CellRef, values: Vec<Vec<String>>) -> smartfilm_crm::Result<()> {
        self.inner.update(start, values)
    }

    fn append(&mut self, _rows: Vec<Vec<String>>) -> smartfilm_crm::Result<()> {
        Err(CrmError::InvalidWorkbook("append rejected".into()))
    }
}

#[test]
fn failed_append_aborts_the_pass() {
    let mut store = store_with(&["Ana Ruiz"]);
    let mut sheet = FailingSheet {
        inner: MemorySheet::with_rows(vec![header_row(), sheet_row("sheet-1", "Carla Diaz", "")]),
    };

    let error = reconcile(&mut store, &mut sheet, Direction::Both).expect_err("pass aborted");

    assert!(matches!(error, CrmError::InvalidWorkbook(_)));
    // The sheet → store half never ran.
    assert!(store.get("sheet-1").is_none());
}

struct RejectingStore {
    inner: MemoryLeadStore,
}

impl LeadStore for RejectingStore {
    fn list_leads(&self) -> smartfilm_crm::Result<Vec<Lead>> {
        self.inner.list_leads()
    }

    fn insert_leads(&mut self, drafts: Vec<NewLead>) -> smartfilm_crm::Result<Vec<Lead>> {
        if drafts.iter().any(|draft| draft.full_name.starts_with("Bad")) {
            return Err(CrmError::InvalidWorkbook("insert rejected".into()));
        }
        self.inner.insert_leads(drafts)
    }

    fn update_status(&mut self, id: &str, status: LeadStatus) -> smartfilm_crm::Result<()> {
        self.inner.update_status(id, status)
    }

    fn delete_lead(&mut self, id: &str) -> smartfilm_crm::Result<()> {
        self.inner.delete_lead(id)
    }
}

#[test]
fn failed_inserts_are_skipped_and_not_counted() {
    let mut store = RejectingStore {
        inner: MemoryLeadStore::new(),
    };
    let mut sheet = MemorySheet::with_rows(vec![
        header_row(),
        sheet_row("sheet-1", "Bad Row", ""),
        sheet_row("sheet-2", "Carla Diaz", ""),
    ]);

    let report = reconcile(&mut store, &mut sheet, Direction::SheetToDb).expect("sync ran");

    assert_eq!(report.sheet_to_db, 1);
    assert!(store.inner.get("sheet-1").is_none());
    assert!(store.inner.get("sheet-2").is_some());
    // Only the stored lead gets its status cell filled.
    assert_eq!(sheet.cell(status_cell(2)), Some(""));
    assert_eq!(sheet.cell(status_cell(3)), Some("new"));
}

#[test]
fn direction_parses_exact_names() {
    assert_eq!("db-to-sheet".parse::<Direction>().expect("parsed"), Direction::DbToSheet);
    assert_eq!("sheet-to-db".parse::<Direction>().expect("parsed"), Direction::SheetToDb);
    assert_eq!("both".parse::<Direction>().expect("parsed"), Direction::Both);
    assert!(matches!(
        "sideways".parse::<Direction>(),
        Err(CrmError::InvalidDirection(_))
    ));
    assert_eq!(Direction::default(), Direction::Both);
}

#[test]
fn report_serialises_in_camel_case() {
    let report = SyncReport {
        db_to_sheet: 3,
        sheet_to_db: 1,
    };
    let json = serde_json::to_value(report).expect("report serialised");
    assert_eq!(json, serde_json::json!({ "dbToSheet": 3, "sheetToDb": 1 }));
}
