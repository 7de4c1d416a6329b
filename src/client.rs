//! The submit capability: everything this crate knows about the remote graph
//! service connection. Implementations own pooling, authentication, and the
//! actual wire protocol; this crate only hands them traversal text with named
//! bindings and interprets the returned rows.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::cancel::CancellationToken;

/// A failure reported by the remote graph service, before classification.
/// `status` is the HTTP-equivalent status code when the transport exposes
/// one; message-pattern classification covers transports that do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub status: Option<u16>,
    pub message: String,
}

impl ServiceError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(code) => write!(f, "graph service error (status {code}): {}", self.message),
            None => write!(f, "graph service error: {}", self.message),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Named bindings attached to a traversal. Values travel as JSON scalars;
/// deterministic iteration order keeps logs and tests stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(BTreeMap<String, JsonValue>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.to_owned(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Convenience accessor for the common case of a string binding.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(JsonValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Connection to the remote graph service. Implementations must be safe to
/// share across concurrent callers; the pooled connection is the only state
/// this crate reuses between operations.
///
/// `submit` must honor the cancellation token at its suspension points and
/// return promptly once it fires.
#[async_trait]
pub trait GraphClient: Send + Sync {
    async fn submit(
        &self,
        query: &str,
        bindings: &Bindings,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<JsonValue>, ServiceError>;
}
