//! PostgreSQL implementations of the domain storage ports.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::error::StoreResultExt;
use crate::repositories::{
    BatteryRepository, DeviceRepository, HistoryRepository, ReservationRepository,
};
use domain::errors::StoreError;
use domain::models::{
    BatteryLevelEntry, Device, HistoryEntry, Reservation, ReservationDraft, ReservationUnit,
    Slot, TelemetryQuery,
};
use domain::ports::{DeviceStore, ReservationPruneReport, ReservationStore};

/// [`DeviceStore`] backed by the `devices`, `history` and `battery` relations.
#[derive(Clone)]
pub struct PgDeviceStore {
    devices: DeviceRepository,
    history: HistoryRepository,
    battery: BatteryRepository,
}

impl PgDeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            devices: DeviceRepository::new(pool.clone()),
            history: HistoryRepository::new(pool.clone()),
            battery: BatteryRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl DeviceStore for PgDeviceStore {
    async fn load_devices(&self) -> Result<Vec<Device>, StoreError> {
        let entities = self.devices.find_all().await.store_err()?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn load_battery_samples(
        &self,
        query: &TelemetryQuery,
    ) -> Result<Vec<BatteryLevelEntry>, StoreError> {
        let entities = self.battery.find(query).await.store_err()?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn upsert_device(&self, device: &Device) -> Result<(), StoreError> {
        self.devices.upsert(device).await.store_err()
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<bool, StoreError> {
        self.history.insert(entry).await.store_err()
    }

    async fn append_battery_samples(
        &self,
        samples: &[BatteryLevelEntry],
    ) -> Result<u64, StoreError> {
        self.battery.insert_batch(samples).await.store_err()
    }

    async fn prune_history(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        self.history.delete_before(before).await.store_err()
    }

    async fn prune_battery_samples(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        self.battery.delete_before(before).await.store_err()
    }
}

/// [`ReservationStore`] backed by the reservation relations and the device table.
#[derive(Clone)]
pub struct PgReservationStore {
    devices: DeviceRepository,
    reservations: ReservationRepository,
}

impl PgReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            devices: DeviceRepository::new(pool.clone()),
            reservations: ReservationRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl ReservationStore for PgReservationStore {
    async fn resource_groups(&self) -> Result<Vec<i32>, StoreError> {
        self.devices.resource_groups().await.store_err()
    }

    async fn reserved_units(&self, slot: Slot) -> Result<Vec<ReservationUnit>, StoreError> {
        let entities = self.reservations.units_for_slot(slot).await.store_err()?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn find_reservation(&self, id: i64) -> Result<Option<Reservation>, StoreError> {
        let entity = self.reservations.find_by_id(id).await.store_err()?;
        Ok(entity.map(Into::into))
    }

    async fn commit_reservation(
        &self,
        draft: ReservationDraft,
    ) -> Result<Reservation, StoreError> {
        self.reservations.commit(&draft).await.store_err()
    }

    async fn delete_reservation(&self, id: i64) -> Result<bool, StoreError> {
        self.reservations.delete(id).await.store_err()
    }

    async fn prune_reservations(
        &self,
        current_before: DateTime<Utc>,
        history_before: DateTime<Utc>,
        units_before: NaiveDate,
    ) -> Result<ReservationPruneReport, StoreError> {
        self.reservations
            .prune(current_before, history_before, units_before)
            .await
            .store_err()
    }
}
