//! Custom Axum extractors.

pub mod participant;

pub use participant::Participant;
