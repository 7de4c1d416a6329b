use thiserror::Error;

use crate::client::ServiceError;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Which endpoint of an edge a dangling-reference error points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSide {
    Out,
    In,
}

impl std::fmt::Display for EdgeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeSide::Out => write!(f, "outbound"),
            EdgeSide::In => write!(f, "inbound"),
        }
    }
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),
    #[error("cross-tenant violation: expected tenant '{expected}', found '{found}'")]
    CrossTenantViolation { expected: String, found: String },
    #[error("unsupported property type for key '{key}': {detail}")]
    UnsupportedPropertyType { key: String, detail: String },
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{side} vertex '{local_id}' does not exist for this tenant")]
    DanglingReference { side: EdgeSide, local_id: String },
    #[error("transient service failure persisted across {attempts} attempts")]
    TransientExhausted {
        attempts: u32,
        #[source]
        source: ServiceError,
    },
    #[error(transparent)]
    Fatal(ServiceError),
    #[error("operation cancelled")]
    Cancelled,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl GraphError {
    /// True when the error is the retry wrapper reporting that it gave up,
    /// as opposed to a failure that was never eligible for retry.
    pub fn is_retry_exhaustion(&self) -> bool {
        matches!(self, GraphError::TransientExhausted { .. })
    }
}
