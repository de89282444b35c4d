//! Domain models for the tablet fleet.

pub mod device;
pub mod inventory;
pub mod reservation;
pub mod telemetry;

pub use device::Device;
pub use inventory::{InventoryDevice, InventoryResponse, NormalizeError, ObservedDevice};
pub use reservation::{
    AllocationOutcome, FreeGroups, Priority, RejectReason, Reservation, ReservationDraft,
    ReservationGroup, ReservationGroupRequest, ReservationHorizon, ReservationOverview,
    ReservationRequest, ReservationScope, ReservationUnit, Slot, GROUP_COUNTER,
    RESERVATION_COUNTER,
};
pub use telemetry::{BatteryLevelEntry, HistoryEntry, TelemetryQuery};
