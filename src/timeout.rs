//! Deadline for confirm functions.
//!
//! The engine never time-boxes a confirmation on its own: one that never
//! settles keeps its change marked optimistic. Wrap the confirm future with
//! [`within`] to turn a hang into an ordinary rollback.

use std::future::Future;
use std::time::Duration;

use crate::error::{BoxError, MutationError};

/// Run `confirm`, failing with [`MutationError::TimedOut`] once `limit` has
/// passed.
///
/// ```ignore
/// cell.update(draft.clone(), || timeout::within(Duration::from_secs(5), api.save(draft)));
/// ```
pub async fn within<Fut, T, E>(limit: Duration, confirm: Fut) -> Result<T, MutationError>
where
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    match tokio::time::timeout(limit, confirm).await {
        Ok(result) => result.map_err(MutationError::from_confirm),
        Err(_) => Err(MutationError::TimedOut(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::OptimisticCell;
    use std::future;

    #[tokio::test(start_paused = true)]
    async fn hanging_confirmation_rolls_back() {
        let cell = OptimisticCell::new("saved".to_string());

        let result = cell
            .update("editing".to_string(), || {
                within(
                    Duration::from_secs(5),
                    future::pending::<Result<String, String>>(),
                )
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(cell.data(), "saved");
        assert!(cell.error().unwrap().is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn fast_confirmation_passes_through() {
        let result = within(Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<_, String>(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn inner_error_is_rejected() {
        let result = within(Duration::from_secs(1), async { Err::<(), _>("denied") }).await;
        assert!(result.unwrap_err().is_rejected());
    }
}
