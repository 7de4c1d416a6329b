#![allow(missing_docs)]

//! Retry behavior observed through the public service surface, with a
//! scripted remote that fails on cue.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use palisade::{
    Bindings, CancellationToken, GraphClient, GraphError, GraphService, RetryConfig,
    ServiceError, TenantId,
};

struct ScriptedRemote {
    calls: AtomicUsize,
    script: Mutex<Vec<Result<Vec<Value>, ServiceError>>>,
}

impl ScriptedRemote {
    fn new(script: Vec<Result<Vec<Value>, ServiceError>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(script),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphClient for ScriptedRemote {
    async fn submit(
        &self,
        _query: &str,
        _bindings: &Bindings,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Value>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock();
        if script.is_empty() {
            return Err(ServiceError::new(Some(500), "script exhausted"));
        }
        script.remove(0)
    }
}

fn tenant() -> TenantId {
    TenantId::new("tenant-a").expect("tenant")
}

#[tokio::test]
async fn rate_limited_probe_succeeds_after_retries() {
    let remote = ScriptedRemote::new(vec![
        Err(ServiceError::new(Some(429), "Request rate is large")),
        Err(ServiceError::new(None, "upstream request timeout")),
        Ok(vec![json!(1)]),
    ]);
    let service = GraphService::new(remote.clone(), RetryConfig::no_backoff());

    let exists = service
        .vertex_exists(&tenant(), "alice", &CancellationToken::new())
        .await
        .expect("probe succeeds on third attempt");
    assert!(exists);
    assert_eq!(remote.calls(), 3);
}

#[tokio::test]
async fn fatal_remote_error_is_not_retried() {
    let remote = ScriptedRemote::new(vec![Err(ServiceError::new(
        Some(403),
        "forbidden by authorization policy",
    ))]);
    let service = GraphService::new(remote.clone(), RetryConfig::no_backoff());

    let err = service
        .vertex_exists(&tenant(), "alice", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Fatal(_)));
    assert!(!err.is_retry_exhaustion());
    assert_eq!(remote.calls(), 1);
}

#[tokio::test]
async fn retry_exhaustion_is_distinguishable_from_fatal() {
    let remote = ScriptedRemote::new(vec![
        Err(ServiceError::new(Some(503), "service unavailable")),
        Err(ServiceError::new(Some(503), "service unavailable")),
        Err(ServiceError::new(Some(503), "service unavailable")),
        Err(ServiceError::new(Some(503), "service unavailable")),
    ]);
    let service = GraphService::new(remote.clone(), RetryConfig::no_backoff());

    let err = service
        .vertex_exists(&tenant(), "alice", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_retry_exhaustion());
    assert_eq!(remote.calls(), 4, "initial attempt plus three retries");
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_backoff_stops_the_operation() {
    let remote = ScriptedRemote::new(vec![
        Err(ServiceError::new(Some(429), "Request rate is large")),
        Ok(vec![json!(1)]),
    ]);
    // Real backoff schedule; paused time means only cancellation can finish
    // the call.
    let service = Arc::new(GraphService::new(remote.clone(), RetryConfig::default()));
    let cancel = CancellationToken::new();

    let task = {
        let service = service.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            service
                .vertex_exists(&TenantId::new("tenant-a").unwrap(), "alice", &cancel)
                .await
        })
    };
    tokio::task::yield_now().await;
    cancel.cancel();

    let err = task.await.expect("task joins").unwrap_err();
    assert!(matches!(err, GraphError::Cancelled));
    assert_eq!(remote.calls(), 1, "no attempt issued after cancellation");
}
