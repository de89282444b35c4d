//! Storage and upstream boundaries the engines are written against.
//!
//! Implementations convert driver errors into [`StoreError`] / [`UpstreamError`]
//! before returning, so nothing driver-specific leaks into the engines.

use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::{StoreError, UpstreamError};
use crate::models::{
    BatteryLevelEntry, Device, HistoryEntry, InventoryDevice, Reservation, ReservationDraft,
    ReservationUnit, Slot, TelemetryQuery,
};

/// Persistence of device state and telemetry.
#[async_trait::async_trait]
pub trait DeviceStore: Send + Sync {
    /// Every stored device.
    async fn load_devices(&self) -> Result<Vec<Device>, StoreError>;

    /// Battery samples matching the query, newest first.
    async fn load_battery_samples(
        &self,
        query: &TelemetryQuery,
    ) -> Result<Vec<BatteryLevelEntry>, StoreError>;

    /// Inserts or overwrites the device row keyed by id.
    async fn upsert_device(&self, device: &Device) -> Result<(), StoreError>;

    /// Appends a journal row. Returns false if `(id, modified)` was already journaled.
    async fn append_history(&self, entry: &HistoryEntry) -> Result<bool, StoreError>;

    async fn append_battery_samples(
        &self,
        samples: &[BatteryLevelEntry],
    ) -> Result<u64, StoreError>;

    /// Deletes journal rows journaled before `before`.
    async fn prune_history(&self, before: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Deletes battery samples taken before `before`.
    async fn prune_battery_samples(&self, before: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Pull API of the external device inventory.
#[async_trait::async_trait]
pub trait InventorySource: Send + Sync {
    /// Full snapshot of every known device.
    async fn fetch_devices(&self) -> Result<Vec<InventoryDevice>, UpstreamError>;
}

/// Rows removed by one reservation retention run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReservationPruneReport {
    pub current: u64,
    pub history: u64,
    pub units: u64,
}

/// Persistence used by the reservation allocator.
#[async_trait::async_trait]
pub trait ReservationStore: Send + Sync {
    /// Distinct resource groups of devices in service, ascending.
    async fn resource_groups(&self) -> Result<Vec<i32>, StoreError>;

    /// Occupancy rows of one slot.
    async fn reserved_units(&self, slot: Slot) -> Result<Vec<ReservationUnit>, StoreError>;

    async fn find_reservation(&self, id: i64) -> Result<Option<Reservation>, StoreError>;

    /// Stores the reservation and its units in one unit of work.
    ///
    /// Drafts without an id get the next value of the reservation counter. The
    /// reservation's previous units are replaced. A unit already owned by another
    /// reservation yields [`StoreError::Conflict`] and nothing is written.
    async fn commit_reservation(&self, draft: ReservationDraft)
        -> Result<Reservation, StoreError>;

    /// Removes the reservation from both horizons together with its units.
    /// Returns false if it did not exist.
    async fn delete_reservation(&self, id: i64) -> Result<bool, StoreError>;

    async fn prune_reservations(
        &self,
        current_before: DateTime<Utc>,
        history_before: DateTime<Utc>,
        units_before: NaiveDate,
    ) -> Result<ReservationPruneReport, StoreError>;
}
