use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    error::BackendError,
    models::{
        CellValue, DashboardStatistics, FilterOptions, ImportHistoryEntry, ProductionStop,
        StopFilter,
    },
};

/// Turns an uploaded file into an ordered sequence of cell rows. Row 0 is
/// the header; the caller owns header handling.
#[async_trait]
pub trait TabularReader: Send + Sync {
    async fn load(
        &self,
        file_bytes: &[u8],
        file_type: &str,
    ) -> Result<Vec<Vec<CellValue>>, BackendError>;
}

/// Persistence for production stops.
#[async_trait]
pub trait StopRepository: Send + Sync {
    /// Optional purge plus bulk insert, committed as ONE transaction.
    /// Nothing is visible to readers until the whole batch commits; on any
    /// failure the store is left exactly as it was, purge included.
    /// Returns the number of records inserted.
    async fn replace_stops(
        &self,
        stops: Vec<ProductionStop>,
        delete_existing: bool,
    ) -> Result<usize, BackendError>;

    async fn fetch_statistics(
        &self,
        filter: &StopFilter,
    ) -> Result<DashboardStatistics, BackendError>;

    async fn fetch_filter_options(&self) -> Result<FilterOptions, BackendError>;

    /// Filtered records, newest `from_date` first.
    async fn list_stops(
        &self,
        filter: &StopFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductionStop>, BackendError>;

    async fn import_history(&self) -> Result<Vec<ImportHistoryEntry>, BackendError>;

    /// Deletes records with `from_date` inside `[from, to]`; returns the
    /// number of records removed.
    async fn delete_range(&self, from: NaiveDate, to: NaiveDate) -> Result<usize, BackendError>;
}
