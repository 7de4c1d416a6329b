//! Read-only precondition probes. These gate mutations (edge upserts,
//! property updates) and are also exposed to planning callers that need to
//! check state without writing.
//!
//! Each probe is a count-limited traversal with the tenant guard applied
//! inside the query, never as an application-side post-filter, so foreign
//! tenants cannot learn anything from timing or error differences.

use serde_json::Value as JsonValue;

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::ids;
use crate::model::{PropertyValue, TenantId};
use crate::retry::Executor;
use crate::traversal;

#[derive(Debug, Clone)]
pub struct PreconditionEvaluator {
    executor: Executor,
}

impl PreconditionEvaluator {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub async fn vertex_exists(
        &self,
        tenant: &TenantId,
        local_id: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let qualified_id = ids::encode(tenant, local_id)?;
        let probe = traversal::vertex_exists(&qualified_id, tenant);
        let rows = self.executor.execute("vertex_exists", &probe, cancel).await?;
        Ok(count_of(&rows) > 0)
    }

    pub async fn edge_exists(
        &self,
        tenant: &TenantId,
        out_local_id: &str,
        label: &str,
        in_local_id: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let out_id = ids::encode(tenant, out_local_id)?;
        let in_id = ids::encode(tenant, in_local_id)?;
        let probe = traversal::edge_exists(&out_id, tenant, label, &in_id);
        let rows = self.executor.execute("edge_exists", &probe, cancel).await?;
        Ok(count_of(&rows) > 0)
    }

    /// With `expected` unset the check is "property present with any value";
    /// with a value it is an exact match on the wire form.
    pub async fn has_property(
        &self,
        tenant: &TenantId,
        local_id: &str,
        key: &str,
        expected: Option<&PropertyValue>,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let qualified_id = ids::encode(tenant, local_id)?;
        let wire = expected.map(PropertyValue::to_wire);
        let probe = traversal::has_property(&qualified_id, tenant, key, wire.as_deref());
        let rows = self.executor.execute("has_property", &probe, cancel).await?;
        Ok(count_of(&rows) > 0)
    }
}

/// Interprets a count() result row. The service returns the count as a bare
/// number or a numeric string depending on transport; absence means zero.
fn count_of(rows: &[JsonValue]) -> u64 {
    match rows.first() {
        Some(JsonValue::Number(n)) => n.as_u64().unwrap_or(0),
        Some(JsonValue::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}
