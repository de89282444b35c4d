//! HTTP route handlers.

pub mod devices;
pub mod groups;
pub mod health;
pub mod reservations;
pub mod telemetry;
