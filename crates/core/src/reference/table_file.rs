use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use super::ReferenceError;
use crate::model::{MedicationRecord, ReferenceTable};

/// Columns every reference table must carry, in record field order.
pub const REQUIRED_COLUMNS: [&str; 4] =
    ["Drug", "Can be Crushed", "Alternative form available?", "Recommendation"];

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// On-disk format of a reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    /// Pick the format from the file extension, falling back to sniffing the
    /// zip header that every XLSX workbook starts with.
    pub fn detect(file_name: &str, bytes: &[u8]) -> Self {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".xlsx") || lower.ends_with(".xlsm") {
            TableFormat::Xlsx
        } else if lower.ends_with(".csv") {
            TableFormat::Csv
        } else if bytes.starts_with(ZIP_MAGIC) {
            TableFormat::Xlsx
        } else {
            TableFormat::Csv
        }
    }
}

/// Parse raw reference bytes into a table.
pub fn parse_table(
    origin: &str,
    format: TableFormat,
    bytes: &[u8],
) -> Result<ReferenceTable, ReferenceError> {
    let records = match format {
        TableFormat::Csv => parse_csv(origin, bytes)?,
        TableFormat::Xlsx => parse_xlsx(origin, bytes)?,
    };
    Ok(ReferenceTable::from_records(records))
}

/// Positions of the required columns within a header row.
struct ColumnMap([usize; 4]);

impl ColumnMap {
    fn locate<'a>(
        origin: &str,
        headers: impl Iterator<Item = &'a str> + Clone,
    ) -> Result<Self, ReferenceError> {
        let mut positions = [0usize; 4];
        for (slot, column) in REQUIRED_COLUMNS.into_iter().enumerate() {
            positions[slot] = headers.clone().position(|h| h.trim() == column).ok_or_else(|| {
                ReferenceError::MissingColumn { origin: origin.to_string(), column }
            })?;
        }
        Ok(Self(positions))
    }

    fn record(&self, cell: impl Fn(usize) -> String) -> MedicationRecord {
        let [drug, crushed, alternative, recommendation] = self.0;
        MedicationRecord {
            drug_name: cell(drug),
            can_be_crushed: cell(crushed),
            alternative_form: cell(alternative),
            recommendation: cell(recommendation),
        }
    }
}

fn parse_csv(origin: &str, bytes: &[u8]) -> Result<Vec<MedicationRecord>, ReferenceError> {
    let csv_err = |err| ReferenceError::Csv { origin: origin.to_string(), err };
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = reader.headers().map_err(csv_err)?.clone();
    let columns = ColumnMap::locate(origin, headers.iter())?;

    let mut out = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        out.push(columns.record(|i| row.get(i).unwrap_or_default().to_string()));
    }
    Ok(out)
}

fn parse_xlsx(origin: &str, bytes: &[u8]) -> Result<Vec<MedicationRecord>, ReferenceError> {
    let xlsx_err = |err| ReferenceError::Xlsx { origin: origin.to_string(), err };
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(xlsx_err)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(xlsx_err)?,
        None => return Err(ReferenceError::EmptyWorkbook { origin: origin.to_string() }),
    };

    let mut rows = range.rows();
    // Skip any title rows above the header.
    let header = loop {
        match rows.next() {
            Some(row) if row.iter().any(|c| cell_text(c).trim() == REQUIRED_COLUMNS[0]) => {
                break row;
            }
            Some(_) => continue,
            None => return Err(ReferenceError::EmptyWorkbook { origin: origin.to_string() }),
        }
    };
    let header_text: Vec<String> = header.iter().map(cell_text).collect();
    let columns = ColumnMap::locate(origin, header_text.iter().map(String::as_str))?;

    Ok(rows.map(|row| columns.record(|i| row.get(i).map(cell_text).unwrap_or_default())).collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Whole numbers are stored as floats; print them without a fraction.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}
