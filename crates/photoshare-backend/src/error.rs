use std::sync::{Mutex, MutexGuard};

use photoshare_shared::ApiError;
use photoshare_store::{Database, StoreError};

/// Translate a store failure that the caller did not handle itself.
pub(crate) fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::Constraint(msg) => ApiError::validation(msg),
        StoreError::NotFound => ApiError::backend("row vanished during request"),
        other => {
            tracing::error!(error = %other, "store failure");
            ApiError::backend(other)
        }
    }
}

pub(crate) fn io_error(context: &str, e: std::io::Error) -> ApiError {
    tracing::error!(error = %e, context, "storage I/O failure");
    ApiError::backend(format!("{context}: {e}"))
}

/// Lock the shared connection. Never hold the guard across an `.await`.
pub(crate) fn lock_db(db: &Mutex<Database>) -> Result<MutexGuard<'_, Database>, ApiError> {
    db.lock()
        .map_err(|e| ApiError::backend(format!("Lock poisoned: {e}")))
}
