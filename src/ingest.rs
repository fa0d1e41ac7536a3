use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::error::Error;
use crate::model::FieldRecord;

/// Parsed CSV: trimmed header names and one record per non-blank row.
#[derive(Clone, Debug, Default)]
pub struct CsvInput {
    pub headers: Vec<String>,
    pub records: Vec<FieldRecord>,
}

impl CsvInput {
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}

/// Read a `.csv` file. The extension check stands in for a MIME check.
pub fn read_csv_file(path: &Path, delimiter: u8) -> Result<CsvInput, Error> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(Error::InputValidation(format!(
            "{} is not a CSV file",
            path.display()
        )));
    }

    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            Error::InputValidation(format!("{}: {}", path.display(), e))
        }
        _ => Error::Io(e),
    })?;
    let text = String::from_utf8(bytes).map_err(|e| {
        Error::InputValidation(format!(
            "{} is not UTF-8 text (invalid byte at offset {})",
            path.display(),
            e.utf8_error().valid_up_to()
        ))
    })?;
    parse_csv(&text, delimiter)
}

/// Parse CSV text. The first non-blank line is the header; short rows are
/// padded with empty values, extra cells are dropped, and rows whose cells
/// are all empty are ignored like blank lines.
pub fn parse_csv(text: &str, delimiter: u8) -> Result<CsvInput, Error> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err(Error::InputValidation("CSV file is empty".into()));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(Error::InputValidation("CSV header row is empty".into()));
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let record: FieldRecord = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, h)| (h.as_str(), row.get(i).unwrap_or("")))
            .collect();
        if record.is_blank() {
            continue;
        }
        records.push(match row.position() {
            Some(pos) => record.at_line(pos.line()),
            None => record,
        });
    }

    log::debug!("Parsed CSV: {} columns, {} records", headers.len(), records.len());
    Ok(CsvInput { headers, records })
}
