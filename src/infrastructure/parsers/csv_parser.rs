use std::io::Cursor;

use csv::ReaderBuilder;
use tracing::{debug, error, info};

use crate::domain::{error::BackendError, models::CellValue};

/// Delimited text carries no cell typing: every non-blank field comes out as
/// text and numeric readings happen downstream. Headers stay in the row
/// stream; the import owns header handling.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>, BackendError> {
    debug!("Creating CSV reader");
    let cursor = Cursor::new(bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(cursor);

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            error!("Failed to read CSV record at row {}: {}", index + 1, e);
            BackendError::Parse(e.to_string())
        })?;

        let row = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    info!("Parsed {} rows from CSV", rows.len());
    Ok(rows)
}
