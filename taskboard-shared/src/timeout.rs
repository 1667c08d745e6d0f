/// Deadline handling for upstream calls
///
/// Every call the gateway makes against the record service is wrapped in a
/// deadline. If the call does not resolve in time the future is dropped and
/// the caller receives `GatewayError::TimedOut`.
///
/// # Default Timeouts
///
/// - No timeout specified: 30 seconds
/// - Minimum timeout: 1 second
/// - Maximum timeout: 5 minutes (300 seconds)
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::timeout::CallTimeout;
///
/// # async fn example() -> taskboard_shared::error::GatewayResult<()> {
/// let deadline = CallTimeout::from_secs(Some(10));
/// let value = deadline.run("fetch_records", async { Ok(42) }).await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```

use std::future::Future;
use std::time::Duration;

use crate::error::{GatewayError, GatewayResult};

/// Default call timeout (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum allowed timeout (1 second)
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Maximum allowed timeout (5 minutes)
pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Per-call deadline for upstream requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTimeout {
    timeout: Duration,
}

impl CallTimeout {
    /// Creates a deadline with an exact duration (not clamped)
    pub fn new(timeout: Duration) -> Self {
        CallTimeout { timeout }
    }

    /// Creates a deadline from configured seconds
    ///
    /// `None` selects the default; out-of-range values are clamped.
    pub fn from_secs(timeout_secs: Option<u64>) -> Self {
        let timeout = match timeout_secs {
            Some(secs) => Duration::from_secs(secs).clamp(MIN_TIMEOUT, MAX_TIMEOUT),
            None => DEFAULT_TIMEOUT,
        };

        CallTimeout::new(timeout)
    }

    /// Gets the timeout duration
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `call` under the deadline
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::TimedOut` if the deadline expires first,
    /// otherwise whatever `call` resolves to.
    pub async fn run<T, F>(&self, operation: &str, call: F) -> GatewayResult<T>
    where
        F: Future<Output = GatewayResult<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation = operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Upstream call deadline expired"
                );
                Err(GatewayError::TimedOut(self.timeout))
            }
        }
    }
}

impl Default for CallTimeout {
    fn default() -> Self {
        CallTimeout::new(DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_secs_default() {
        assert_eq!(CallTimeout::from_secs(None).timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_from_secs_valid() {
        assert_eq!(CallTimeout::from_secs(Some(12)).timeout(), Duration::from_secs(12));
    }

    #[test]
    fn test_from_secs_too_small() {
        assert_eq!(CallTimeout::from_secs(Some(0)).timeout(), MIN_TIMEOUT);
    }

    #[test]
    fn test_from_secs_too_large() {
        assert_eq!(CallTimeout::from_secs(Some(100_000)).timeout(), MAX_TIMEOUT);
    }

    #[tokio::test]
    async fn test_run_completes_in_time() {
        let deadline = CallTimeout::new(Duration::from_millis(200));
        let result = deadline.run("quick", async { Ok::<_, GatewayError>("done") }).await;
        assert_eq!(result.unwrap(), "done");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_expires() {
        let deadline = CallTimeout::new(Duration::from_secs(2));
        let result: GatewayResult<()> = deadline
            .run("stalled", async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        assert_eq!(result, Err(GatewayError::TimedOut(Duration::from_secs(2))));
    }

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
        assert_eq!(MIN_TIMEOUT, Duration::from_secs(1));
        assert_eq!(MAX_TIMEOUT, Duration::from_secs(300));
    }
}
