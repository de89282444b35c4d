//! Repository implementations for database operations.

pub mod battery;
pub mod device;
pub mod history;
pub mod reservation;
pub mod reservation_group;
pub mod sequence;

pub use battery::BatteryRepository;
pub use device::DeviceRepository;
pub use history::HistoryRepository;
pub use reservation::ReservationRepository;
pub use reservation_group::ReservationGroupRepository;
