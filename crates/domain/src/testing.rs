//! In-memory port implementations for engine tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::{StoreError, UpstreamError};
use crate::models::{
    BatteryLevelEntry, Device, HistoryEntry, InventoryDevice, Reservation, ReservationDraft,
    ReservationUnit, Slot, TelemetryQuery, RESERVATION_COUNTER,
};
use crate::ports::{
    DeviceStore, InventorySource, ReservationPruneReport, ReservationStore,
};

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct DeviceState {
    devices: HashMap<String, Device>,
    history: Vec<HistoryEntry>,
    battery: Vec<BatteryLevelEntry>,
    fail_loads: bool,
    failing_ids: HashSet<String>,
}

/// Device store backed by plain collections.
#[derive(Default)]
pub struct InMemoryDeviceStore {
    state: Mutex<DeviceState>,
}

impl InMemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(&self, id: &str) -> Option<Device> {
        guard(&self.state).devices.get(id).cloned()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        guard(&self.state).history.clone()
    }

    pub fn battery_samples(&self) -> Vec<BatteryLevelEntry> {
        guard(&self.state).battery.clone()
    }

    pub fn seed_device(&self, device: Device) {
        guard(&self.state).devices.insert(device.id.clone(), device);
    }

    pub fn seed_history(&self, entry: HistoryEntry) {
        guard(&self.state).history.push(entry);
    }

    pub fn seed_battery_sample(&self, sample: BatteryLevelEntry) {
        guard(&self.state).battery.push(sample);
    }

    /// Makes `load_devices` fail until reset.
    pub fn fail_loads(&self, fail: bool) {
        guard(&self.state).fail_loads = fail;
    }

    /// Makes every upsert of `id` fail.
    pub fn fail_upserts_for(&self, id: &str) {
        guard(&self.state).failing_ids.insert(id.to_string());
    }
}

#[async_trait::async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn load_devices(&self) -> Result<Vec<Device>, StoreError> {
        let state = guard(&self.state);
        if state.fail_loads {
            return Err(StoreError::Unavailable("simulated outage".into()));
        }
        Ok(state.devices.values().cloned().collect())
    }

    async fn load_battery_samples(
        &self,
        query: &TelemetryQuery,
    ) -> Result<Vec<BatteryLevelEntry>, StoreError> {
        let state = guard(&self.state);
        let mut samples: Vec<BatteryLevelEntry> = state
            .battery
            .iter()
            .filter(|s| query.ids.is_empty() || query.ids.contains(&s.id))
            .filter(|s| query.since.map_or(true, |since| s.timestamp >= since))
            .cloned()
            .collect();
        samples.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(samples)
    }

    async fn upsert_device(&self, device: &Device) -> Result<(), StoreError> {
        let mut state = guard(&self.state);
        if state.failing_ids.contains(&device.id) {
            return Err(StoreError::Unavailable(format!("write of {} failed", device.id)));
        }
        state.devices.insert(device.id.clone(), device.clone());
        Ok(())
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<bool, StoreError> {
        let mut state = guard(&self.state);
        let exists = state
            .history
            .iter()
            .any(|h| h.id == entry.id && h.modified == entry.modified);
        if exists {
            return Ok(false);
        }
        state.history.push(entry.clone());
        Ok(true)
    }

    async fn append_battery_samples(
        &self,
        samples: &[BatteryLevelEntry],
    ) -> Result<u64, StoreError> {
        guard(&self.state).battery.extend_from_slice(samples);
        Ok(samples.len() as u64)
    }

    async fn prune_history(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut state = guard(&self.state);
        let len = state.history.len();
        state.history.retain(|h| h.timestamp >= before);
        Ok((len - state.history.len()) as u64)
    }

    async fn prune_battery_samples(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut state = guard(&self.state);
        let len = state.battery.len();
        state.battery.retain(|s| s.timestamp >= before);
        Ok((len - state.battery.len()) as u64)
    }
}

/// Inventory returning a fixed snapshot or a fixed error.
pub struct StaticInventory {
    snapshot: Mutex<Result<Vec<InventoryDevice>, UpstreamError>>,
}

impl StaticInventory {
    pub fn new(devices: Vec<InventoryDevice>) -> Self {
        Self {
            snapshot: Mutex::new(Ok(devices)),
        }
    }

    pub fn failing(error: UpstreamError) -> Self {
        Self {
            snapshot: Mutex::new(Err(error)),
        }
    }

    pub fn set(&self, devices: Vec<InventoryDevice>) {
        *guard(&self.snapshot) = Ok(devices);
    }
}

#[async_trait::async_trait]
impl InventorySource for StaticInventory {
    async fn fetch_devices(&self) -> Result<Vec<InventoryDevice>, UpstreamError> {
        guard(&self.snapshot).clone()
    }
}

type UnitKey = (NaiveDate, i32, i32);

#[derive(Default)]
struct ReservationState {
    groups: Vec<i32>,
    current: BTreeMap<i64, Reservation>,
    history: BTreeMap<i64, Reservation>,
    units: BTreeMap<UnitKey, ReservationUnit>,
    counters: HashMap<String, i64>,
    fail_next_commit: Option<StoreError>,
    unavailable: bool,
}

impl ReservationState {
    fn increment(&mut self, counter: &str) -> i64 {
        let value = self.counters.entry(counter.to_string()).or_insert(0);
        let id = *value;
        *value += 1;
        id
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            Err(StoreError::Unavailable("simulated outage".into()))
        } else {
            Ok(())
        }
    }
}

/// Reservation store enforcing the `(date, unit, group)` uniqueness of occupancy rows.
#[derive(Default)]
pub struct InMemoryReservationStore {
    state: Mutex<ReservationState>,
}

impl InMemoryReservationStore {
    pub fn with_groups(groups: Vec<i32>) -> Self {
        let store = Self::default();
        guard(&store.state).groups = groups;
        store
    }

    /// Occupies `group` in `slot` on behalf of another reservation.
    pub fn occupy(&self, slot: Slot, group: i32, is_pinned: bool, reservation_id: i64) {
        guard(&self.state).units.insert(
            (slot.date, slot.unit, group),
            ReservationUnit {
                date: slot.date,
                unit: slot.unit,
                ipad_group: group,
                is_pinned,
                reservation_id,
            },
        );
    }

    pub fn fail_next_commit(&self, error: StoreError) {
        guard(&self.state).fail_next_commit = Some(error);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        guard(&self.state).unavailable = unavailable;
    }

    pub fn units(&self) -> Vec<ReservationUnit> {
        guard(&self.state).units.values().cloned().collect()
    }

    pub fn current(&self) -> Vec<Reservation> {
        guard(&self.state).current.values().cloned().collect()
    }

    pub fn history(&self) -> Vec<Reservation> {
        guard(&self.state).history.values().cloned().collect()
    }

    pub fn seed_reservation(&self, reservation: Reservation, slot: Slot) {
        let mut state = guard(&self.state);
        for group in &reservation.ipad_groups {
            state.units.insert(
                (slot.date, slot.unit, *group),
                ReservationUnit {
                    date: slot.date,
                    unit: slot.unit,
                    ipad_group: *group,
                    is_pinned: reservation.is_pinned,
                    reservation_id: reservation.id,
                },
            );
        }
        state.current.insert(reservation.id, reservation.clone());
        state.history.insert(reservation.id, reservation);
    }
}

#[async_trait::async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn resource_groups(&self) -> Result<Vec<i32>, StoreError> {
        let state = guard(&self.state);
        state.check_available()?;
        Ok(state.groups.clone())
    }

    async fn reserved_units(&self, slot: Slot) -> Result<Vec<ReservationUnit>, StoreError> {
        let state = guard(&self.state);
        state.check_available()?;
        Ok(state
            .units
            .values()
            .filter(|u| u.date == slot.date && u.unit == slot.unit)
            .cloned()
            .collect())
    }

    async fn find_reservation(&self, id: i64) -> Result<Option<Reservation>, StoreError> {
        let state = guard(&self.state);
        state.check_available()?;
        Ok(state.current.get(&id).cloned())
    }

    async fn commit_reservation(
        &self,
        draft: ReservationDraft,
    ) -> Result<Reservation, StoreError> {
        let mut state = guard(&self.state);
        state.check_available()?;
        if let Some(err) = state.fail_next_commit.take() {
            return Err(err);
        }

        let slot = draft.slot;
        for group in &draft.reservation.ipad_groups {
            if let Some(unit) = state.units.get(&(slot.date, slot.unit, *group)) {
                if Some(unit.reservation_id) != draft.id {
                    return Err(StoreError::Conflict(format!(
                        "group {} already reserved for {}",
                        group, slot
                    )));
                }
            }
        }

        let id = match draft.id {
            Some(id) => id,
            None => state.increment(RESERVATION_COUNTER),
        };
        let mut reservation = draft.reservation;
        reservation.id = id;

        state.units.retain(|_, u| u.reservation_id != id);
        for group in &reservation.ipad_groups {
            state.units.insert(
                (slot.date, slot.unit, *group),
                ReservationUnit {
                    date: slot.date,
                    unit: slot.unit,
                    ipad_group: *group,
                    is_pinned: reservation.is_pinned,
                    reservation_id: id,
                },
            );
        }
        state.current.insert(id, reservation.clone());
        state.history.insert(id, reservation.clone());
        Ok(reservation)
    }

    async fn delete_reservation(&self, id: i64) -> Result<bool, StoreError> {
        let mut state = guard(&self.state);
        state.check_available()?;
        let current = state.current.remove(&id).is_some();
        let history = state.history.remove(&id).is_some();
        state.units.retain(|_, u| u.reservation_id != id);
        Ok(current || history)
    }

    async fn prune_reservations(
        &self,
        current_before: DateTime<Utc>,
        history_before: DateTime<Utc>,
        units_before: NaiveDate,
    ) -> Result<ReservationPruneReport, StoreError> {
        let mut state = guard(&self.state);
        state.check_available()?;
        let (c, h, u) = (state.current.len(), state.history.len(), state.units.len());
        state.current.retain(|_, r| r.date >= current_before);
        state.history.retain(|_, r| r.date >= history_before);
        state.units.retain(|_, unit| unit.date >= units_before);
        Ok(ReservationPruneReport {
            current: (c - state.current.len()) as u64,
            history: (h - state.history.len()) as u64,
            units: (u - state.units.len()) as u64,
        })
    }
}
