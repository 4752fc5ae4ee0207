use std::fmt::Display;
use std::future::Future;

use tracing::warn;

/// Run `op`, log a failure, and carry on regardless of the outcome.
///
/// Returns whether the attempt succeeded so callers can record it.
pub async fn best_effort<F, T, E>(label: &str, op: F) -> bool
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match op.await {
        Ok(_) => true,
        Err(e) => {
            warn!("{label} failed (continuing): {e}");
            false
        }
    }
}
