/// Error types for the record gateway
///
/// Every gateway operation that can fail returns `GatewayResult<T>`. The
/// variants follow the failure classes of the upstream record service:
///
/// - `InvalidArgument`: the caller's field bag or id could not be decoded
/// - `NotFound`: a single-record fetch missed
/// - `OperationFailed`: create/update/delete was rejected, including the
///   "success but no result" envelope
/// - `Conflict`: a read-modify-write saw the record change underneath it
/// - `Upstream`: transport failures and undecodable responses
/// - `TimedOut`: the per-call deadline expired

use std::time::Duration;

/// Gateway result type alias
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Input field bag or id had the wrong shape or type
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Single-record fetch reported failure
    #[error("Not found: {0}")]
    NotFound(String),

    /// Mutation rejected by the record service
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// Record changed between snapshot and write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Transport or unexpected collaborator error
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// External call exceeded its deadline
    #[error("Upstream call timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
}

impl GatewayError {
    /// Message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            GatewayError::InvalidArgument(msg)
            | GatewayError::NotFound(msg)
            | GatewayError::OperationFailed(msg)
            | GatewayError::Conflict(msg)
            | GatewayError::Upstream(msg) => msg.clone(),
            GatewayError::TimedOut(after) => {
                format!("timed out after {}ms", after.as_millis())
            }
        }
    }

    /// Short machine-readable kind, used in logs and API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidArgument(_) => "invalid_argument",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::OperationFailed(_) => "operation_failed",
            GatewayError::Conflict(_) => "conflict",
            GatewayError::Upstream(_) => "upstream",
            GatewayError::TimedOut(_) => "timed_out",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Upstream(format!("Malformed upstream payload: {}", err))
    }
}
