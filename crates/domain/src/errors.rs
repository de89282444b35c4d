//! Domain error types.
//!
//! Storage and upstream failures are converted into these kinds at the component
//! boundary so the engines never see driver-specific errors.

use thiserror::Error;

/// Error reported by a storage port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Connection or query failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A unique constraint rejected the write.
    #[error("store conflict: {0}")]
    Conflict(String),

    /// The addressed row does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Error reported by the device inventory source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("inventory request failed: {0}")]
    Request(String),

    #[error("inventory responded with status {0}")]
    Status(u16),

    #[error("inventory payload could not be decoded: {0}")]
    Decode(String),
}

/// Reasons a reconciliation pass is aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),
}

/// Errors surfaced by the reservation allocator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// Malformed allocation request.
    #[error("validation failure: {0}")]
    ValidationFailure(String),

    /// Another writer claimed the same slot and group first. Retryable.
    #[error("conflict: {0}")]
    ConflictFailure(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl AllocationError {
    /// Returns true if the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConflictFailure(_) | Self::StoreUnavailable(_))
    }
}

impl From<StoreError> for AllocationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            StoreError::Conflict(msg) => Self::ConflictFailure(msg),
            StoreError::NotFound(msg) => Self::NotFound(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_to_allocation_error() {
        assert_eq!(
            AllocationError::from(StoreError::Conflict("dup".into())),
            AllocationError::ConflictFailure("dup".into())
        );
        assert_eq!(
            AllocationError::from(StoreError::Unavailable("down".into())),
            AllocationError::StoreUnavailable("down".into())
        );
        assert_eq!(
            AllocationError::from(StoreError::NotFound("r 7".into())),
            AllocationError::NotFound("r 7".into())
        );
    }

    #[test]
    fn test_retryable() {
        assert!(AllocationError::ConflictFailure("x".into()).is_retryable());
        assert!(AllocationError::StoreUnavailable("x".into()).is_retryable());
        assert!(!AllocationError::ValidationFailure("x".into()).is_retryable());
        assert!(!AllocationError::NotFound("x".into()).is_retryable());
    }

    #[test]
    fn test_sync_error_from() {
        let err: SyncError = UpstreamError::Status(502).into();
        assert_eq!(
            err.to_string(),
            "upstream unavailable: inventory responded with status 502"
        );
        let err: SyncError = StoreError::Unavailable("timeout".into()).into();
        assert!(matches!(err, SyncError::StoreUnavailable(_)));
    }
}
