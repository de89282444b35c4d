//! Database row mappings.

pub mod device;
pub mod reservation;
pub mod telemetry;

pub use device::DeviceEntity;
pub use reservation::{ReservationEntity, ReservationGroupEntity, ReservationUnitEntity};
pub use telemetry::{BatteryLevelEntity, HistoryEntity};
