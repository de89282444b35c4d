//! Shared utilities and common types for the tablet fleet backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Second-granularity UTC time helpers
//! - Common validation logic for identifiers exchanged with clients

pub mod time;
pub mod validation;
