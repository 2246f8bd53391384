//! Store operation timeout helpers
//!
//! Bounds a whole transaction so a stuck lock or connection cannot hang a caller.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use super::repository::StoreError;

/// Default timeout for a transaction (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `future`, failing with [`StoreError::Timeout`] after `duration`.
///
/// The future is dropped on timeout, which rolls back any open transaction.
pub async fn with_timeout<F, T, E>(duration: Duration, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<StoreError>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(duration).into()),
    }
}
