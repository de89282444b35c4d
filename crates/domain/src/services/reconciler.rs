//! Device state reconciliation.
//!
//! One pass pulls the inventory snapshot, merges it into stored device state,
//! journals every written change, records battery samples for the charging window
//! and applies the telemetry retention horizons.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use crate::errors::SyncError;
use crate::models::telemetry::group_by_device;
use crate::models::{BatteryLevelEntry, Device, HistoryEntry, TelemetryQuery};
use crate::ports::{DeviceStore, InventorySource};
use crate::services::change_detection::{decide_write, WriteDecision};
use crate::services::charging::infer_charging;

/// Tunables of a reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    /// Inventory account reported for tablets nobody is logged into.
    pub shared_device_user: String,
    pub charging_lookback: Duration,
    pub history_retention: Duration,
    pub battery_retention: Duration,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            shared_device_user: "AACHEN-VSA Device User".to_string(),
            charging_lookback: Duration::minutes(15),
            history_retention: Duration::days(30),
            battery_retention: Duration::days(7),
        }
    }
}

/// Counters describing one completed pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub skipped: usize,
    pub written: usize,
    pub journaled: usize,
    pub unchanged: usize,
    pub integrity_warnings: usize,
    pub stale: usize,
    pub failures: usize,
    pub battery_samples: u64,
    pub history_pruned: u64,
    pub battery_pruned: u64,
}

/// State threaded through a single pass.
struct PassContext {
    now: DateTime<Utc>,
    stored: HashMap<String, Device>,
    recent: BTreeMap<String, Vec<BatteryLevelEntry>>,
    samples: Vec<BatteryLevelEntry>,
    report: SyncReport,
}

pub struct DeviceReconciler {
    store: Arc<dyn DeviceStore>,
    inventory: Arc<dyn InventorySource>,
    settings: ReconcilerSettings,
}

impl DeviceReconciler {
    pub fn new(
        store: Arc<dyn DeviceStore>,
        inventory: Arc<dyn InventorySource>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            store,
            inventory,
            settings,
        }
    }

    /// Runs one reconciliation pass.
    pub async fn sync_devices(&self) -> Result<SyncReport, SyncError> {
        self.sync_devices_at(Utc::now()).await
    }

    /// Runs one reconciliation pass with `now` as the pass time.
    pub async fn sync_devices_at(&self, now: DateTime<Utc>) -> Result<SyncReport, SyncError> {
        let now = shared::time::truncate_to_second(now);

        let incoming = self.inventory.fetch_devices().await.map_err(|e| {
            error!(error = %e, "Inventory pull failed, aborting pass");
            SyncError::from(e)
        })?;

        let stored = self.store.load_devices().await.map_err(|e| {
            error!(error = %e, "Could not load stored devices, aborting pass");
            SyncError::from(e)
        })?;

        let mut ctx = PassContext {
            now,
            stored: stored.into_iter().map(|d| (d.id.clone(), d)).collect(),
            recent: self.load_charging_window(now).await,
            samples: Vec::new(),
            report: SyncReport {
                fetched: incoming.len(),
                ..SyncReport::default()
            },
        };

        for raw in &incoming {
            let observed = match raw.normalize(&self.settings.shared_device_user) {
                Ok(observed) => observed,
                Err(e) => {
                    warn!(error = %e, "Skipping inventory record");
                    ctx.report.skipped += 1;
                    continue;
                }
            };
            let stored = ctx.stored.get(&observed.device.id).cloned();
            let mut device = observed.resolve(stored.as_ref(), ctx.now);
            self.reconcile_device(&mut ctx, stored.as_ref(), &mut device).await;
        }

        self.flush_samples(&mut ctx).await;
        self.apply_retention(&mut ctx).await;

        let report = ctx.report;
        info!(
            fetched = report.fetched,
            skipped = report.skipped,
            written = report.written,
            journaled = report.journaled,
            integrity_warnings = report.integrity_warnings,
            failures = report.failures,
            history_pruned = report.history_pruned,
            battery_pruned = report.battery_pruned,
            "Device reconciliation pass completed"
        );
        Ok(report)
    }

    /// Recent samples per device, newest first. An unreadable window counts as empty.
    async fn load_charging_window(
        &self,
        now: DateTime<Utc>,
    ) -> BTreeMap<String, Vec<BatteryLevelEntry>> {
        let query = TelemetryQuery::since(now - self.settings.charging_lookback);
        match self.store.load_battery_samples(&query).await {
            Ok(samples) => group_by_device(samples, |s| s.id.as_str()),
            Err(e) => {
                warn!(error = %e, "Could not load charging window, continuing without it");
                BTreeMap::new()
            }
        }
    }

    async fn reconcile_device(
        &self,
        ctx: &mut PassContext,
        stored: Option<&Device>,
        device: &mut Device,
    ) {
        let recent = ctx
            .recent
            .get(&device.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        device.is_charging = infer_charging(stored, device.battery_level, recent);

        let decision = decide_write(stored, device);
        match decision {
            WriteDecision::Unchanged => {
                ctx.report.unchanged += 1;
                return;
            }
            WriteDecision::Inconsistent => {
                warn!(
                    device_id = %device.id,
                    modified = %device.last_modified,
                    "Device changed without a new modification time, write skipped"
                );
                ctx.report.integrity_warnings += 1;
                return;
            }
            WriteDecision::Stale => {
                warn!(
                    device_id = %device.id,
                    modified = %device.last_modified,
                    "Inventory reported an older modification time, write skipped"
                );
                ctx.report.stale += 1;
                return;
            }
            WriteDecision::New | WriteDecision::Newer | WriteDecision::TransientOnly => {}
        }

        if let Err(e) = self.store.upsert_device(device).await {
            warn!(device_id = %device.id, error = %e, "Failed to store device");
            ctx.report.failures += 1;
            return;
        }
        ctx.report.written += 1;

        let level_changed = stored.map_or(true, |s| s.battery_level != device.battery_level);
        if level_changed {
            ctx.samples
                .push(BatteryLevelEntry::from_device(device, ctx.now));
        }

        let entry = HistoryEntry::from_device(device, ctx.now);
        match self.store.append_history(&entry).await {
            Ok(true) => ctx.report.journaled += 1,
            Ok(false) => debug!(device_id = %device.id, "Modification already journaled"),
            Err(e) => {
                warn!(device_id = %device.id, error = %e, "Failed to journal device change");
                ctx.report.failures += 1;
            }
        }

        ctx.stored.insert(device.id.clone(), device.clone());
    }

    async fn flush_samples(&self, ctx: &mut PassContext) {
        if ctx.samples.is_empty() {
            return;
        }
        match self.store.append_battery_samples(&ctx.samples).await {
            Ok(count) => ctx.report.battery_samples = count,
            Err(e) => {
                warn!(count = ctx.samples.len(), error = %e, "Failed to store battery samples");
                ctx.report.failures += 1;
            }
        }
    }

    async fn apply_retention(&self, ctx: &mut PassContext) {
        let history_before = ctx.now - self.settings.history_retention;
        match self.store.prune_history(history_before).await {
            Ok(count) => ctx.report.history_pruned = count,
            Err(e) => warn!(error = %e, "Failed to prune device history"),
        }

        let battery_before = ctx.now - self.settings.battery_retention;
        match self.store.prune_battery_samples(battery_before).await {
            Ok(count) => ctx.report.battery_pruned = count,
            Err(e) => warn!(error = %e, "Failed to prune battery samples"),
        }
    }
}
