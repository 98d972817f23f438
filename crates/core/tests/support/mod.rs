#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use chrono::{NaiveDate, NaiveDateTime};
use crushcheck_core::model::{MedicationRecord, PatientContext, ReferenceTable};
use crushcheck_core::report::ReportContent;
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::write::SimpleFileOptions;

pub const REFERENCE_CSV: &str = "\
Drug,Can be Crushed,Alternative form available?,Recommendation
Paracetamol,Yes,None,Safe to crush
Aspirin EC,No,Dispersible tablet,Do not crush; use dispersible
Omeprazole MR,No,Oral suspension,Open capsule; do not crush pellets
,Yes,None,Row without a name
";

pub fn reference_table() -> ReferenceTable {
    ReferenceTable::from_records(vec![
        MedicationRecord::new("Paracetamol", "Yes", "None", "Safe to crush"),
        MedicationRecord::new(
            "Aspirin EC",
            "No",
            "Dispersible tablet",
            "Do not crush; use dispersible",
        ),
        MedicationRecord::new(
            "Omeprazole MR",
            "No",
            "Oral suspension",
            "Open capsule; do not crush pellets",
        ),
    ])
}

pub fn patient() -> PatientContext {
    PatientContext::new("Jane Doe", NaiveDate::from_ymd_opt(1980, 1, 1).unwrap())
}

pub fn generated_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(14, 30, 0).unwrap()
}

pub fn paracetamol_content() -> ReportContent {
    ReportContent::new(
        patient(),
        vec![MedicationRecord::new("Paracetamol", "Yes", "None", "Safe to crush")],
        generated_at(),
    )
}

/// Build a minimal single-sheet XLSX workbook using inline strings.
pub fn xlsx_bytes(rows: &[Vec<&str>]) -> Vec<u8> {
    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        sheet.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, value) in row.iter().enumerate() {
            let cell_ref = format!("{}{}", (b'A' + c as u8) as char, r + 1);
            if !value.is_empty() && value.parse::<f64>().is_ok() {
                sheet.push_str(&format!(r#"<c r="{cell_ref}"><v>{value}</v></c>"#));
            } else {
                let escaped = value.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
                sheet.push_str(&format!(
                    r#"<c r="{cell_ref}" t="inlineStr"><is><t>{escaped}</t></is></c>"#
                ));
            }
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");

    let parts = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#.to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
        ),
        ("xl/worksheets/sheet1.xml", sheet),
    ];

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in parts {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A small valid PNG for letterhead tests.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    image::DynamicImage::new_rgb8(width, height)
        .write_to(&mut Cursor::new(&mut out), image::ImageOutputFormat::Png)
        .unwrap();
    out
}

pub fn zip_entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(str::to_string).collect()
}

pub fn zip_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    out
}

/// Text of each `w:tr` in the Word document, cells joined with " | ".
pub fn docx_table_rows(bytes: &[u8]) -> Vec<String> {
    let xml = zip_entry(bytes, "word/document.xml");
    let mut reader = Reader::from_str(&xml);
    let mut rows = Vec::new();
    let mut cells: Vec<String> = Vec::new();
    let mut in_row = false;
    let mut in_text = false;
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) if e.name().as_ref() == b"w:tr" => {
                in_row = true;
                cells.clear();
            }
            Event::End(e) if e.name().as_ref() == b"w:tr" => {
                in_row = false;
                rows.push(cells.join(" | "));
            }
            Event::Start(e) if e.name().as_ref() == b"w:tc" => cells.push(String::new()),
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
            Event::Text(t) if in_text && in_row => {
                if let Some(cell) = cells.last_mut() {
                    cell.push_str(&t.unescape().unwrap());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    rows
}

/// Text of each body paragraph outside the table, in document order.
pub fn docx_paragraphs(bytes: &[u8]) -> Vec<String> {
    let xml = zip_entry(bytes, "word/document.xml");
    let mut reader = Reader::from_str(&xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut table_depth = 0;
    let mut in_text = false;
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) if e.name().as_ref() == b"w:tbl" => table_depth += 1,
            Event::End(e) if e.name().as_ref() == b"w:tbl" => table_depth -= 1,
            Event::Start(e) if e.name().as_ref() == b"w:p" && table_depth == 0 => current.clear(),
            Event::End(e) if e.name().as_ref() == b"w:p" && table_depth == 0 => {
                paragraphs.push(std::mem::take(&mut current));
            }
            Event::Empty(e) if e.name().as_ref() == b"w:tab" && table_depth == 0 => {
                current.push('\t')
            }
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
            Event::Text(t) if in_text && table_depth == 0 => {
                current.push_str(&t.unescape().unwrap())
            }
            Event::Eof => break,
            _ => {}
        }
    }
    paragraphs
}
