use csv::{Reader, ReaderBuilder};

use crate::error::{AnalyzeError, Result};

pub const DEFAULT_DELIMITER: u8 = b',';

/// Column names from the header row, in order.
pub fn read_headers(data: &str, delimiter: u8) -> Result<Vec<String>> {
    let mut reader = reader_for(data, delimiter);
    header_names(&mut reader)
}

/// Cell values of `column` for every data row, in row order.
///
/// Rows shorter than the header read as an empty cell for the missing column.
pub fn extract_column(data: &str, delimiter: u8, column: &str) -> Result<Vec<String>> {
    let mut reader = reader_for(data, delimiter);
    let headers = header_names(&mut reader)?;
    let position = headers
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| AnalyzeError::ColumnNotFound(column.to_string()))?;
    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record?;
        cells.push(record.get(position).unwrap_or_default().to_string());
    }
    Ok(cells)
}

/// Parses a configured delimiter: one ASCII character, or `\t` spelled out.
pub fn parse_delimiter(value: &str) -> Option<u8> {
    let value = if value == "\\t" { "\t" } else { value };
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Some(*byte),
        _ => None,
    }
}

fn reader_for(data: &str, delimiter: u8) -> Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(data.as_bytes())
}

fn header_names(reader: &mut Reader<&[u8]>) -> Result<Vec<String>> {
    let headers = reader
        .headers()?
        .iter()
        .map(|cell| cell.to_string())
        .collect::<Vec<_>>();
    if headers.iter().all(|name| name.is_empty()) {
        return Err(AnalyzeError::MissingHeader);
    }
    Ok(headers)
}
