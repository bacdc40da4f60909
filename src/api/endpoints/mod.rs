//! API endpoint handlers.
//!
//! Handlers stay thin: they parse the request, call into `CoreState` on the
//! blocking pool, and map the result onto a response.

pub mod export;
pub mod health;
pub mod patients;

use crate::api::error::ApiError;

/// Run file-backed store work on the blocking thread pool.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("Blocking task failed: {e}")))?
}
