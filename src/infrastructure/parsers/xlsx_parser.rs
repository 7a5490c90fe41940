use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::{debug, error, info};

use crate::domain::{error::BackendError, models::CellValue};

/// Reads the first worksheet of a workbook into cell rows.
pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>, BackendError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor).map_err(|e| {
        error!("Failed to open workbook: {}", e);
        BackendError::Parse(e.to_string())
    })?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| BackendError::Parse("workbook has no sheets".to_string()))?;
    debug!("Reading worksheet '{}'", sheet_name);

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        error!("Failed to read worksheet '{}': {}", sheet_name, e);
        BackendError::Parse(e.to_string())
    })?;

    let rows: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(map_cell).collect())
        .collect();

    info!("Parsed {} rows from worksheet '{}'", rows.len(), sheet_name);
    Ok(rows)
}

/// Date cells pass through as raw serial numbers; the date normalizer owns
/// the epoch conversion for every source format.
fn map_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_map_onto_the_reader_model() {
        assert_eq!(map_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(map_cell(&Data::String("  ".to_string())), CellValue::Empty);
        assert_eq!(
            map_cell(&Data::String("ALPHA 63".to_string())),
            CellValue::Text("ALPHA 63".to_string())
        );
        assert_eq!(map_cell(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(map_cell(&Data::Int(45306)), CellValue::Number(45306.0));
        assert_eq!(map_cell(&Data::Bool(true)), CellValue::Text("true".to_string()));
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        assert!(matches!(
            parse_workbook(b"definitely not a workbook"),
            Err(BackendError::Parse(_))
        ));
    }
}
