// Fixed-interval bounded polling shared by every resource kind.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::provider::ProvisionError;

pub const DEFAULT_ATTEMPTS: u32 = 60;

/// Poll `probe` until it yields a value or the attempt bound is exhausted.
/// Probe errors are logged and retried; exhaustion yields `NotReady` and the
/// caller decides whether that drains compensations.
pub async fn poll_until<T, F, Fut>(
    what: &str,
    attempts: u32,
    interval: Duration,
    mut probe: F,
) -> Result<T, ProvisionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, ProvisionError>>,
{
    for attempt in 1..=attempts {
        match probe().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(err) => {
                warn!(what, attempt, error = %err, "poll attempt failed, retrying");
            }
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }
    Err(ProvisionError::NotReady {
        what: what.to_string(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_value_on_first_success() {
        let result = poll_until("thing", 3, Duration::from_millis(1), || async {
            Ok(Some(42u32))
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn exhaustion_reports_not_ready_with_attempt_count() {
        let result: Result<(), _> =
            poll_until("thing", 3, Duration::from_millis(1), || async { Ok(None) }).await;
        match result {
            Err(ProvisionError::NotReady { what, attempts }) => {
                assert_eq!(what, "thing");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected NotReady, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn probe_errors_are_retried() {
        let mut calls = 0u32;
        let result = poll_until("thing", 5, Duration::from_millis(1), || {
            calls += 1;
            let this_call = calls;
            async move {
                if this_call < 3 {
                    Err(ProvisionError::api("probe", "transient"))
                } else {
                    Ok(Some(this_call))
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }
}
