//! Tenant-scoped mutation layer for a shared multi-tenant graph database.
//!
//! Callers hand every operation an explicit tenant and a cancellation token;
//! the crate turns logical (tenant, entity) operations into idempotent,
//! retried traversals against a remote graph service, with cross-tenant
//! isolation enforced in the query text itself.

#![forbid(unsafe_code)]

pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod ids;
pub mod logging;
pub mod model;
pub mod probe;
pub mod props;
pub mod retry;
pub mod service;
pub mod traversal;

pub use cancel::CancellationToken;
pub use client::{Bindings, GraphClient, ServiceError};
pub use config::RetryConfig;
pub use error::{EdgeSide, GraphError, Result};
pub use model::{PropertyMap, PropertyValue, TenantId, Vertex, ID_KEY, TENANT_KEY};
pub use probe::PreconditionEvaluator;
pub use retry::Executor;
pub use service::GraphService;
