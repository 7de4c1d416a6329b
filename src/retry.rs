//! Resilient execution against the remote graph service.
//!
//! The service is rate limited and occasionally unavailable; those failures
//! are worth retrying. Malformed queries, authorization failures, and the
//! like are not. Classification happens here so no call site ever decides
//! retry policy on its own.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::cancel::CancellationToken;
use crate::client::{GraphClient, ServiceError};
use crate::config::RetryConfig;
use crate::error::{GraphError, Result};
use crate::traversal::Traversal;

/// Message fragments that mark a failure as transient when the transport
/// reports no status code. "rate is large" is the rate limiter's phrasing.
const TRANSIENT_PHRASES: &[&str] = &[
    "rate is large",
    "too many requests",
    "timeout",
    "timed out",
    "temporarily unavailable",
    "service unavailable",
];

const TRANSIENT_STATUSES: &[u16] = &[408, 429, 503, 504];

pub fn is_transient(error: &ServiceError) -> bool {
    if let Some(status) = error.status {
        return TRANSIENT_STATUSES.contains(&status);
    }
    let message = error.message.to_ascii_lowercase();
    TRANSIENT_PHRASES.iter().any(|p| message.contains(p))
}

/// Wraps every call to the remote service with transient-failure retry and
/// bounded exponential backoff. Stateless between calls; each `execute` gets
/// a fresh retry budget.
#[derive(Clone)]
pub struct Executor {
    client: Arc<dyn GraphClient>,
    config: RetryConfig,
}

impl Executor {
    pub fn new(client: Arc<dyn GraphClient>, config: RetryConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Submits the traversal, retrying transient failures up to the
    /// configured budget. Cancellation is honored before each attempt and
    /// during every backoff sleep.
    pub async fn execute(
        &self,
        operation: &'static str,
        traversal: &Traversal,
        cancel: &CancellationToken,
    ) -> Result<Vec<JsonValue>> {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(GraphError::Cancelled);
            }
            let error = match self
                .client
                .submit(traversal.text, &traversal.bindings, cancel)
                .await
            {
                Ok(rows) => return Ok(rows),
                Err(error) => error,
            };
            if !is_transient(&error) {
                return Err(GraphError::Fatal(error));
            }
            attempt += 1;
            if attempt > self.config.max_retries {
                return Err(GraphError::TransientExhausted {
                    attempts: attempt,
                    source: error,
                });
            }
            let delay = self.config.delay_for(attempt);
            warn!(
                operation,
                attempt,
                max_retries = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "transient graph service failure, backing off before retry"
            );
            tokio::select! {
                _ = cancel.cancelled() => return Err(GraphError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .finish()
    }
}
