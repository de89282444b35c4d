//! Reservation retention background job.

use std::sync::Arc;

use chrono::Utc;
use domain::services::ReservationAllocator;

use super::scheduler::{Job, JobFrequency};

/// Purges reservations that fell out of the current and history horizons.
pub struct ReservationCleanupJob {
    allocator: Arc<ReservationAllocator>,
    interval_minutes: u64,
}

impl ReservationCleanupJob {
    pub fn new(allocator: Arc<ReservationAllocator>, interval_minutes: u64) -> Self {
        Self {
            allocator,
            interval_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for ReservationCleanupJob {
    fn name(&self) -> &'static str {
        "reservation_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        let report = self
            .allocator
            .prune_expired(Utc::now())
            .await
            .map_err(|e| format!("Failed to prune reservations: {}", e))?;
        metrics::counter!("reservations_pruned_total", "relation" => "current")
            .increment(report.current);
        metrics::counter!("reservations_pruned_total", "relation" => "history")
            .increment(report.history);
        metrics::counter!("reservations_pruned_total", "relation" => "units")
            .increment(report.units);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::RetentionPolicy;
    use domain::testing::InMemoryReservationStore;

    fn job(store: InMemoryReservationStore) -> ReservationCleanupJob {
        let allocator = ReservationAllocator::new(Arc::new(store), RetentionPolicy::default());
        ReservationCleanupJob::new(Arc::new(allocator), 15)
    }

    #[test]
    fn test_job_frequency() {
        let job = job(InMemoryReservationStore::default());
        assert_eq!(job.name(), "reservation_cleanup");
        assert_eq!(job.frequency().duration().as_secs(), 900);
        assert!(!job.run_on_start());
    }

    #[tokio::test]
    async fn test_execute_on_empty_store() {
        assert!(job(InMemoryReservationStore::default()).execute().await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_surfaces_store_outage() {
        let store = InMemoryReservationStore::default();
        store.set_unavailable(true);
        assert!(job(store).execute().await.is_err());
    }
}
