//! Background job scheduler and job implementations.

mod device_sync;
mod pool_metrics;
mod reservation_cleanup;
mod scheduler;

pub use device_sync::DeviceSyncJob;
pub use pool_metrics::PoolMetricsJob;
pub use reservation_cleanup::ReservationCleanupJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
