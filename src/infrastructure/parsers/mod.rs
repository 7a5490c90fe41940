pub mod csv_parser;
pub mod xlsx_parser;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{error::BackendError, models::CellValue, ports::TabularReader};

/// Tabular reader over uploaded file bytes, dispatching on the file type the
/// caller derived from the upload's extension.
#[derive(Default)]
pub struct FileReaderAdapter;

impl FileReaderAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TabularReader for FileReaderAdapter {
    async fn load(
        &self,
        file_bytes: &[u8],
        file_type: &str,
    ) -> Result<Vec<Vec<CellValue>>, BackendError> {
        debug!("Loading {} bytes as '{}'", file_bytes.len(), file_type);
        match file_type {
            "csv" => csv_parser::parse_csv(file_bytes),
            "xlsx" | "xlsm" | "xls" => xlsx_parser::parse_workbook(file_bytes),
            other => Err(BackendError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_file_types_are_rejected() {
        let adapter = FileReaderAdapter::new();
        let result = adapter.load(b"a,b\n", "txt").await;
        assert!(matches!(result, Err(BackendError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn csv_dispatch_produces_rows() {
        let adapter = FileReaderAdapter::new();
        let rows = adapter.load(b"a,b\n1,2\n", "csv").await.unwrap();
        assert_eq!(rows.len(), 2);
    }
}
