//! Periodic device reconciliation against the inventory.

use std::sync::Arc;

use domain::services::{DeviceReconciler, SyncReport};

use super::scheduler::{Job, JobFrequency};

/// Runs one reconciliation pass per tick, starting right at boot.
pub struct DeviceSyncJob {
    reconciler: Arc<DeviceReconciler>,
    interval_secs: u64,
}

impl DeviceSyncJob {
    pub fn new(reconciler: Arc<DeviceReconciler>, interval_secs: u64) -> Self {
        Self {
            reconciler,
            interval_secs,
        }
    }
}

fn record_pass_metrics(report: &SyncReport) {
    metrics::counter!("devices_changed_total").increment(report.written as u64);
    metrics::counter!("device_history_entries_total").increment(report.journaled as u64);
    metrics::counter!("device_integrity_warnings_total")
        .increment(report.integrity_warnings as u64);
    metrics::counter!("device_sync_failures_total").increment(report.failures as u64);
    metrics::gauge!("devices_fetched").set(report.fetched as f64);
}

#[async_trait::async_trait]
impl Job for DeviceSyncJob {
    fn name(&self) -> &'static str {
        "device_sync"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    fn run_on_start(&self) -> bool {
        true
    }

    async fn execute(&self) -> Result<(), String> {
        let report = self
            .reconciler
            .sync_devices()
            .await
            .map_err(|e| format!("Device sync aborted: {}", e))?;
        record_pass_metrics(&report);
        Ok(())
    }
}
