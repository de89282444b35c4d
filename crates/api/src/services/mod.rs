//! Clients for external systems.

pub mod credentials;
pub mod relution;

pub use credentials::{AcceptAllCredentials, CredentialChecker, HttpCredentialChecker};
pub use relution::RelutionClient;
