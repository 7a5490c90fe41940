use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::{
    error::BackendError,
    models::{
        DashboardStatistics, FilterOptions, ImportHistoryEntry, ProductionStop, StopFilter,
    },
    ports::StopRepository,
};

/// Read side of the backend: filtered aggregations over the persisted stops
/// for the dashboard, plus the import maintenance reports.
pub struct StatsService {
    repo: Arc<dyn StopRepository>,
}

impl StatsService {
    pub fn new(repo: Arc<dyn StopRepository>) -> Self {
        Self { repo }
    }

    pub async fn dashboard(
        &self,
        filter: &StopFilter,
    ) -> Result<DashboardStatistics, BackendError> {
        debug!("Computing dashboard statistics for {:?}", filter);
        self.repo.fetch_statistics(filter).await
    }

    pub async fn filter_options(&self) -> Result<FilterOptions, BackendError> {
        self.repo.fetch_filter_options().await
    }

    /// Detail listing with 1-based pages.
    pub async fn detailed(
        &self,
        filter: &StopFilter,
        per_page: i64,
        page: i64,
    ) -> Result<Vec<ProductionStop>, BackendError> {
        let per_page = per_page.max(1);
        let page = page.max(1);
        self.repo
            .list_stops(filter, per_page, (page - 1) * per_page)
            .await
    }

    pub async fn import_history(&self) -> Result<Vec<ImportHistoryEntry>, BackendError> {
        self.repo.import_history().await
    }

    pub async fn delete_imported_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<usize, BackendError> {
        if to < from {
            return Err(BackendError::InvalidRequest(format!(
                "to date {} precedes from date {}",
                to, from
            )));
        }
        let deleted = self.repo.delete_range(from, to).await?;
        info!("Deleted {} stops between {} and {}", deleted, from, to);
        Ok(deleted)
    }
}
