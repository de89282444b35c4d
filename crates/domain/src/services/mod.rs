//! Domain services for the tablet fleet.
//!
//! The pure algorithms live in their own modules so the engines stay thin
//! orchestration over the storage ports.

pub mod allocation;
pub mod allocator;
pub mod change_detection;
pub mod charging;
pub mod reconciler;

pub use allocation::{partition_groups, plan_allocation, AllocationPlan};
pub use allocator::{ReservationAllocator, RetentionPolicy};
pub use change_detection::{classify_change, decide_write, DeviceChange, WriteDecision};
pub use charging::infer_charging;
pub use reconciler::{DeviceReconciler, ReconcilerSettings, SyncReport};
