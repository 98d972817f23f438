mod support;

use std::io::Read;

use predicates::prelude::*;
use support::init_with_reference;
use tempfile::tempdir;

fn crushcheck() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("crushcheck")
}

fn document_xml(path: &std::path::Path) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name("word/document.xml").unwrap();
    let mut xml = String::new();
    entry.read_to_string(&mut xml).unwrap();
    xml
}

#[test]
fn report_writes_both_formats_to_reports_dir() {
    let dir = tempdir().expect("tempdir");
    let layout = init_with_reference(dir.path());

    crushcheck()
        .args(["report", "--patient-name", "Jane Doe", "--dob", "1980-01-01"])
        .args(["--drug", "Paracetamol", "--root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Crushability_Review_Jane_Doe.docx"))
        .stdout(predicate::str::contains("Crushability_Review_Jane_Doe.pdf"));

    let docx = layout.reports_dir.join("Crushability_Review_Jane_Doe.docx");
    let pdf = layout.reports_dir.join("Crushability_Review_Jane_Doe.pdf");
    assert!(std::fs::read(&pdf).unwrap().starts_with(b"%PDF"));

    let xml = document_xml(&docx);
    assert!(xml.contains("Jane Doe"));
    assert!(xml.contains("01/01/1980"));
    assert!(xml.contains("Safe to crush"));
}

#[test]
fn patient_name_with_path_separators_stays_in_out_dir() {
    let dir = tempdir().expect("tempdir");
    init_with_reference(dir.path());
    let out = dir.path().join("out");

    crushcheck()
        .args(["report", "--patient-name", "Mary Smith/Jones", "--dob", "1980-01-01"])
        .args(["--drug", "Paracetamol", "--format", "docx", "--out-dir"])
        .arg(&out)
        .arg("--root")
        .arg(dir.path())
        .assert()
        .success();

    let written: Vec<_> = std::fs::read_dir(&out)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(written, vec![out.join("Crushability_Review_Mary_Smith_Jones.docx")]);
    assert!(written[0].is_file());
    assert!(document_xml(&written[0]).contains("Mary Smith/Jones"));
}

#[test]
fn report_reads_request_file_and_honours_format() {
    let dir = tempdir().expect("tempdir");
    init_with_reference(dir.path());
    let request = dir.path().join("request.yaml");
    std::fs::write(
        &request,
        "patient_name: John Smith\ndate_of_birth: 1950-06-15\nfacility: Rose Court\n\
         medications:\n  - Aspirin EC\n  - Omeprazole MR\n",
    )
    .unwrap();
    let out = dir.path().join("out");

    crushcheck()
        .args(["report", "--format", "docx", "--request"])
        .arg(&request)
        .arg("--out-dir")
        .arg(&out)
        .arg("--root")
        .arg(dir.path())
        .assert()
        .success();

    let docx = out.join("Crushability_Review_John_Smith.docx");
    assert!(docx.is_file());
    assert!(!out.join("Crushability_Review_John_Smith.pdf").exists());
    let xml = document_xml(&docx);
    assert!(xml.contains("Rose Court"));
    let aspirin = xml.find("Aspirin EC").unwrap();
    let omeprazole = xml.find("Omeprazole MR").unwrap();
    assert!(aspirin < omeprazole, "rows keep selection order");
}

#[test]
fn report_includes_session_medications() {
    let dir = tempdir().expect("tempdir");
    let layout = init_with_reference(dir.path());

    crushcheck()
        .args(["add-medication", "--name", "Zopiclone", "--crushable", "no"])
        .args(["--alternative", "None", "--recommendation", "Seek alternative", "--root"])
        .arg(dir.path())
        .assert()
        .success();

    crushcheck()
        .args(["report", "--patient-name", "Jane Doe", "--dob", "1980-01-01", "--format", "docx"])
        .args(["--drug", "Zopiclone", "--root"])
        .arg(dir.path())
        .assert()
        .success();

    let xml = document_xml(&layout.reports_dir.join("Crushability_Review_Jane_Doe.docx"));
    assert!(xml.contains("Seek alternative"));
}

#[test]
fn missing_required_fields_block_generation() {
    let dir = tempdir().expect("tempdir");
    let layout = init_with_reference(dir.path());

    crushcheck()
        .args(["report", "--patient-name", "  ", "--drug", "Paracetamol", "--root"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required fields: patient name, date of birth"));

    crushcheck()
        .args(["report", "--patient-name", "Jane Doe", "--dob", "1980-01-01", "--root"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required fields: medications"));

    assert_eq!(std::fs::read_dir(&layout.reports_dir).unwrap().count(), 0);
}

#[test]
fn unknown_medication_writes_nothing() {
    let dir = tempdir().expect("tempdir");
    let layout = init_with_reference(dir.path());

    crushcheck()
        .args(["report", "--patient-name", "Jane Doe", "--dob", "1980-01-01"])
        .args(["--drug", "Paracetamol", "--drug", "Unobtainium", "--root"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown medication: Unobtainium"));

    assert_eq!(std::fs::read_dir(&layout.reports_dir).unwrap().count(), 0);
}

#[test]
fn invalid_date_of_birth_is_rejected() {
    let dir = tempdir().expect("tempdir");
    init_with_reference(dir.path());

    crushcheck()
        .args(["report", "--patient-name", "Jane Doe", "--dob", "yesterday"])
        .args(["--drug", "Paracetamol", "--root"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date of birth 'yesterday'"));
}
