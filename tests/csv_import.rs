use std::fs;

use smartfilm_crm::CrmError;
use smartfilm_crm::import::{import_csv, import_csv_file, normalize_header, parse_csv_leads};
use smartfilm_crm::io::{LeadStore, MemoryLeadStore};
use smartfilm_crm::model::{LeadSource, LeadStatus};
use tempfile::tempdir;

#[test]
fn imports_quoted_fields_and_drops_nameless_rows() {
    let content = "Name,Email,Phone,City\n\
                   Jane Doe,jane@x.com,555,\"San Antonio, TX\"\n\
                   ,nobody@x.com,,\n";
    let mut store = MemoryLeadStore::new();

    let imported = import_csv(&mut store, content).expect("CSV imported");

    assert_eq!(imported, 1);
    let leads = store.list_leads().expect("leads listed");
    assert_eq!(leads.len(), 1);
    let lead = &leads[0];
    assert_eq!(lead.full_name, "Jane Doe");
    assert_eq!(lead.email.as_deref(), Some("jane@x.com"));
    assert_eq!(lead.phone.as_deref(), Some("555"));
    assert_eq!(lead.city_state.as_deref(), Some("San Antonio, TX"));
    assert_eq!(lead.status, LeadStatus::New);
    assert_eq!(lead.source, LeadSource::GoogleSheet);
    assert_eq!(lead.google_sheet_row_id, None);
}

#[test]
fn header_synonyms_map_to_fields() {
    assert_eq!(normalize_header(" Full Name "), "full_name");
    assert_eq!(normalize_header("E-mail Address"), "email");
    assert_eq!(normalize_header("Phone Number"), "phone");
    assert_eq!(normalize_header("Location"), "city_state");
    assert_eq!(normalize_header("Type"), "project_type");
    assert_eq!(normalize_header("Size"), "glass_size");
    assert_eq!(normalize_header("Notes"), "message");
    assert_eq!(normalize_header("glass_size"), "glass_size");
    assert_eq!(normalize_header("Budget ($)"), "budget");
}

#[test]
fn status_is_kept_only_when_known() {
    let content = "name,status,notes\n\
                   Ana Ruiz,quoted,call after 5\n\
                   Ben Cole,Hot Lead,\n\
                   Carla Diaz,,\n";

    let drafts = parse_csv_leads(content).expect("CSV parsed");

    let statuses: Vec<LeadStatus> = drafts.iter().map(|draft| draft.status).collect();
    assert_eq!(
        statuses,
        vec![LeadStatus::Quoted, LeadStatus::New, LeadStatus::New]
    );
    assert_eq!(drafts[0].message.as_deref(), Some("call after 5"));
    assert_eq!(drafts[1].message, None);
}

#[test]
fn source_and_id_columns_are_ignored() {
    let content = "id,name,source,created_at\n\
                   lead-42,Ana Ruiz,quote_form,2024-01-01T00:00:00Z\n";

    let drafts = parse_csv_leads(content).expect("CSV parsed");

    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].id, None);
    assert_eq!(drafts[0].source, LeadSource::GoogleSheet);
}

#[test]
fn unknown_columns_and_short_rows_are_tolerated() {
    let content = "Name,Budget,Timeline\n\
                   Ana Ruiz,5000\n\
                   Ben Cole,,ASAP,extra\n";

    let drafts = parse_csv_leads(content).expect("CSV parsed");

    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].timeline, None);
    assert_eq!(drafts[1].timeline.as_deref(), Some("ASAP"));
}

#[test]
fn open_quote_ends_with_its_line() {
    let content = "Name,Email\n\
                   \"Jane Doe,jane@x.com\n\
                   Bob Roe,bob@x.com\n\
                   Cal Poe,cal@x.com\n";

    let drafts = parse_csv_leads(content).expect("CSV parsed");

    let names: Vec<&str> = drafts.iter().map(|draft| draft.full_name.as_str()).collect();
    assert_eq!(names.len(), 3);
    assert!(names[0].starts_with("Jane Doe"));
    assert!(!names[0].contains('\n'));
    assert_eq!(&names[1..], ["Bob Roe", "Cal Poe"]);
    assert_eq!(drafts[1].email.as_deref(), Some("bob@x.com"));
    assert_eq!(drafts[2].email.as_deref(), Some("cal@x.com"));
}

#[test]
fn doubled_quotes_inside_a_field_are_kept() {
    let content = "name,notes\r\n\
                   \"Ana \"\"Annie\"\" Ruiz\",\"prefers \"\"frosted\"\", not clear\"\r\n";

    let drafts = parse_csv_leads(content).expect("CSV parsed");

    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].full_name, "Ana \"Annie\" Ruiz");
    assert_eq!(
        drafts[0].message.as_deref(),
        Some("prefers \"frosted\", not clear")
    );
}

#[test]
fn blank_lines_are_skipped() {
    let content = "\n name , email \n\n  Ana Ruiz , ana@x.com \n\n";

    let drafts = parse_csv_leads(content).expect("CSV parsed");

    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].full_name, "Ana Ruiz");
    assert_eq!(drafts[0].email.as_deref(), Some("ana@x.com"));
}

#[test]
fn header_only_file_is_rejected() {
    let mut store = MemoryLeadStore::new();

    let error = import_csv(&mut store, "name,email\n").expect_err("import rejected");

    assert!(matches!(error, CrmError::EmptyImport));
    assert!(matches!(parse_csv_leads(""), Err(CrmError::EmptyImport)));
    assert_eq!(store.write_count(), 0);
}

#[test]
fn file_without_names_is_rejected() {
    let mut store = MemoryLeadStore::new();

    let error = import_csv(&mut store, "email,phone\na@x.com,555\n").expect_err("import rejected");

    assert!(matches!(error, CrmError::NoValidLeads));
    assert!(store.list_leads().expect("leads listed").is_empty());
}

#[test]
fn batch_is_written_once() {
    let content = "name\nAna Ruiz\nBen Cole\nCarla Diaz\n";
    let mut store = MemoryLeadStore::new();

    let imported = import_csv(&mut store, content).expect("CSV imported");

    assert_eq!(imported, 3);
    assert_eq!(store.write_count(), 1);
}

#[test]
fn imports_from_file() {
    let temp_dir = tempdir().expect("temporary directory");
    let csv_path = temp_dir.path().join("leads.csv");
    fs::write(&csv_path, "Full Name,Project Type\nAna Ruiz,Office partition\n")
        .expect("CSV written");
    let mut store = MemoryLeadStore::new();

    let imported = import_csv_file(&mut store, &csv_path).expect("CSV imported");

    assert_eq!(imported, 1);
    let lead = store.list_leads().expect("leads listed").remove(0);
    assert_eq!(lead.project_type.as_deref(), Some("Office partition"));

    let missing = temp_dir.path().join("missing.csv");
    assert!(matches!(
        import_csv_file(&mut store, &missing),
        Err(CrmError::MissingInput(_))
    ));
}
