use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::{
    header_resolver::ColumnMap,
    machine_classifier::{MachineGroupMap, MachinePatterns},
    row_normalizer::{RowNormalizer, RowOutcome, SkipReason},
};
use crate::domain::{
    error::BackendError,
    models::{ImportSummary, ProductionStop},
    ports::{StopRepository, TabularReader},
};

/// Drives one import run: load the file, normalize row by row, commit once.
///
/// Failure handling is two-tier. Anything that goes wrong for a single row
/// is absorbed into the skipped count and the loop continues; anything that
/// goes wrong outside the row loop aborts the run and leaves the store
/// untouched.
pub struct ImportService {
    reader: Arc<dyn TabularReader>,
    repo: Arc<dyn StopRepository>,
    patterns: MachinePatterns,
}

impl ImportService {
    pub fn new(
        reader: Arc<dyn TabularReader>,
        repo: Arc<dyn StopRepository>,
        patterns: MachinePatterns,
    ) -> Self {
        Self {
            reader,
            repo,
            patterns,
        }
    }

    pub async fn import_file(
        &self,
        path: &Path,
        delete_existing: bool,
    ) -> Result<ImportSummary, BackendError> {
        let run_id = Uuid::new_v4();
        info!(
            "Starting import run {} for {} (delete_existing: {})",
            run_id,
            path.display(),
            delete_existing
        );

        // Step 1: read the uploaded file
        let file_bytes = tokio::fs::read(path).await.map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            BackendError::File(e.to_string())
        })?;
        debug!("Read {} bytes", file_bytes.len());

        // Step 2: file type from the extension
        let file_type = Self::extract_file_type(path);
        debug!("Detected file type: {}", file_type);

        // Step 3: load rows through the tabular reader
        let rows = self.reader.load(&file_bytes, &file_type).await.map_err(|e| {
            error!("Failed to load {}: {}", path.display(), e);
            e
        })?;
        info!("Loaded {} rows", rows.len());

        // Step 4: the first row is the header; resolve all columns up front
        let Some((header, data_rows)) = rows.split_first() else {
            error!("File {} contains no rows", path.display());
            return Err(BackendError::Parse("file contains no rows".to_string()));
        };
        let columns = ColumnMap::resolve(header);

        // Step 5: normalize row by row; failures skip the row, not the run
        let normalizer = RowNormalizer::new(&columns, &self.patterns);
        let mut groups = MachineGroupMap::new();
        let mut stops: Vec<ProductionStop> = Vec::new();
        let mut skipped = 0usize;

        for (index, row) in data_rows.iter().enumerate() {
            // 1-based position in the file; the header is row 1.
            let row_number = index + 2;
            let reason = match normalizer.normalize(row, &mut groups) {
                RowOutcome::Candidate(candidate) => match candidate.into_record() {
                    Some(stop) => {
                        stops.push(stop);
                        continue;
                    }
                    None => SkipReason::MissingRequiredFields,
                },
                RowOutcome::Skipped(reason) => reason,
            };
            warn!("Skipping row {}: {}", row_number, reason);
            skipped += 1;
        }

        // Step 6: one transaction for the whole run
        let processed = self
            .repo
            .replace_stops(stops, delete_existing)
            .await
            .map_err(|e| {
                error!("Import run {} failed to persist: {}", run_id, e);
                e
            })?;

        info!(
            "Import run {} finished: {} processed, {} skipped",
            run_id, processed, skipped
        );
        Ok(ImportSummary { processed, skipped })
    }

    fn extract_file_type(path: &Path) -> String {
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }
}
