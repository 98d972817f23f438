mod support;

use std::sync::Arc;

use crushcheck_core::reference::{
    parse_table, PathSource, ReferenceError, ReferenceSource, ReferenceStore, TableFormat,
    UploadSource,
};
use support::{xlsx_bytes, REFERENCE_CSV};

#[test]
fn loads_csv_from_path_and_drops_blank_names() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("meds.csv");
    std::fs::write(&path, REFERENCE_CSV).unwrap();

    let mut store = ReferenceStore::new();
    store.register(PathSource::new(&path));
    let table = store.load().expect("load reference");

    assert_eq!(table.names(), vec!["Paracetamol", "Aspirin EC", "Omeprazole MR"]);
    let rec = table.get("Aspirin EC").unwrap();
    assert_eq!(rec.can_be_crushed, "No");
    assert_eq!(rec.alternative_form, "Dispersible tablet");
    assert_eq!(rec.recommendation, "Do not crush; use dispersible");
    assert_eq!(store.loaded_from(), Some(path.display().to_string().as_str()));
}

#[test]
fn loads_xlsx_with_title_rows_above_header() {
    let bytes = xlsx_bytes(&[
        vec!["Crush Med Data Bank"],
        vec![],
        vec!["Drug", "Can be Crushed", "Alternative form available?", "Recommendation"],
        vec!["Paracetamol", "Yes", "None", "Safe to crush"],
        vec!["Levothyroxine 25", "Yes", "Oral solution", "Crush and disperse"],
    ]);
    let table = parse_table("book.xlsx", TableFormat::Xlsx, &bytes).expect("parse xlsx");
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("Paracetamol").unwrap().recommendation, "Safe to crush");
    assert_eq!(table.get("Levothyroxine 25").unwrap().alternative_form, "Oral solution");
}

#[test]
fn xlsx_numeric_cells_print_as_integers() {
    let bytes = xlsx_bytes(&[
        vec!["Drug", "Can be Crushed", "Alternative form available?", "Recommendation"],
        vec!["Vitamin B12", "Yes", "1000", "Crush"],
    ]);
    let table = parse_table("book.xlsx", TableFormat::Xlsx, &bytes).unwrap();
    assert_eq!(table.get("Vitamin B12").unwrap().alternative_form, "1000");
}

#[test]
fn missing_providers_fall_through_in_order() {
    let temp = tempfile::tempdir().unwrap();
    let missing_xlsx = temp.path().join("Crush_Med_Data_Bank_Clean.xlsx");
    let present_csv = temp.path().join("Crush_Med_Data_Bank_Clean.csv");
    std::fs::write(&present_csv, REFERENCE_CSV).unwrap();

    let mut store = ReferenceStore::new();
    store.register(PathSource::new(&missing_xlsx)).register(PathSource::new(&present_csv));
    let table = store.load().unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(store.loaded_from(), Some(present_csv.display().to_string().as_str()));
}

#[test]
fn upload_is_used_when_no_file_is_present() {
    let temp = tempfile::tempdir().unwrap();
    let mut store = ReferenceStore::new();
    store.register(PathSource::new(temp.path().join("absent.csv")));
    store.register(UploadSource::new("uploaded.csv", REFERENCE_CSV.as_bytes().to_vec()));

    let table = store.load().unwrap();
    assert!(table.contains("Paracetamol"));
    assert_eq!(store.loaded_from(), Some("upload:uploaded.csv"));
}

#[test]
fn empty_upload_counts_as_absent() {
    let source = UploadSource::new("empty.csv", Vec::new());
    assert!(source.fetch().unwrap().is_none());
}

#[test]
fn no_provider_with_data_is_data_unavailable() {
    let temp = tempfile::tempdir().unwrap();
    let mut store = ReferenceStore::new();
    store.register(PathSource::new(temp.path().join("a.xlsx")));
    store.register(PathSource::new(temp.path().join("a.csv")));

    match store.load() {
        Err(ReferenceError::DataUnavailable { tried }) => assert_eq!(tried.len(), 2),
        other => panic!("expected DataUnavailable, got {:?}", other.map(|t| t.len())),
    }
    assert!(store.loaded_from().is_none());
}

#[test]
fn store_without_providers_is_data_unavailable() {
    let mut store = ReferenceStore::new();
    assert!(matches!(store.load(), Err(ReferenceError::DataUnavailable { .. })));
}

#[test]
fn second_load_is_served_from_cache() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("meds.csv");
    std::fs::write(&path, REFERENCE_CSV).unwrap();

    let mut store = ReferenceStore::new();
    store.register(PathSource::new(&path));
    let first = store.load().unwrap();

    // The source is gone; a re-parse would now fail.
    std::fs::remove_file(&path).unwrap();
    let second = store.load().expect("cached table");

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn identical_input_yields_identical_tables() {
    let a = parse_table("a.csv", TableFormat::Csv, REFERENCE_CSV.as_bytes()).unwrap();
    let b = parse_table("b.csv", TableFormat::Csv, REFERENCE_CSV.as_bytes()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn explicit_source_registered_first_wins() {
    let temp = tempfile::tempdir().unwrap();
    let default_csv = temp.path().join("default.csv");
    let chosen_csv = temp.path().join("chosen.csv");
    std::fs::write(&default_csv, REFERENCE_CSV).unwrap();
    std::fs::write(
        &chosen_csv,
        "Drug,Can be Crushed,Alternative form available?,Recommendation\n\
         Metformin,Yes,Oral solution,Crush\n",
    )
    .unwrap();

    let mut store = ReferenceStore::new();
    store.register(PathSource::new(&default_csv));
    store.register_first(PathSource::new(&chosen_csv));

    assert_eq!(store.source_names()[0], chosen_csv.display().to_string());
    let table = store.load().unwrap();
    assert_eq!(table.names(), vec!["Metformin"]);
}

#[test]
fn malformed_workbook_is_an_xlsx_error() {
    let err = parse_table("broken.xlsx", TableFormat::Xlsx, b"PK\x03\x04 not really a zip")
        .unwrap_err();
    assert!(matches!(err, ReferenceError::Xlsx { .. }), "got {err}");
}
