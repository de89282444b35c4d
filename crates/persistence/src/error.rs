//! Conversion of driver errors into the domain storage error.

use domain::errors::StoreError;

const UNIQUE_VIOLATION: &str = "23505";

/// Maps a `sqlx` error onto [`StoreError`].
///
/// Unique violations become conflicts, missing rows become not-found and everything
/// else is treated as the store being unavailable.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict(db_err.message().to_string())
        }
        _ => StoreError::Unavailable(err.to_string()),
    }
}

/// Extension to convert repository results at the port boundary.
pub trait StoreResultExt<T> {
    fn store_err(self) -> Result<T, StoreError>;
}

impl<T> StoreResultExt<T> for Result<T, sqlx::Error> {
    fn store_err(self) -> Result<T, StoreError> {
        self.map_err(map_sqlx_error)
    }
}
