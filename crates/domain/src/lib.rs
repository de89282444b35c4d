//! Domain layer for the tablet fleet backend.
//!
//! This crate contains:
//! - Domain models (Device, HistoryEntry, Reservation, ...)
//! - The device reconciliation and reservation allocation engines
//! - The storage and inventory ports those engines are written against
//! - Domain error types

pub mod errors;
pub mod models;
pub mod ports;
pub mod services;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
