//! Persistence layer for the tablet fleet backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - PostgreSQL implementations of the domain storage ports

pub mod db;
pub mod entities;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod repositories;
pub mod stores;

pub use stores::{PgDeviceStore, PgReservationStore};
