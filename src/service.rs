//! The public mutation surface. Composes the identifier codec, property
//! sanitizer, precondition evaluator, and retry wrapper into tenant-scoped,
//! idempotent graph operations.
//!
//! Sub-steps of a multi-step operation run sequentially because later steps
//! depend on earlier ones (a property cannot be set before its vertex
//! exists). There is no multi-statement transaction underneath: when a later
//! property set fails, earlier sets stay applied. Callers needing atomicity
//! across a property set must compensate themselves.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::client::GraphClient;
use crate::config::RetryConfig;
use crate::error::{EdgeSide, GraphError, Result};
use crate::ids;
use crate::model::{PropertyMap, PropertyValue, TenantId, Vertex, ID_KEY, TENANT_KEY};
use crate::probe::PreconditionEvaluator;
use crate::props;
use crate::retry::Executor;
use crate::traversal;

pub struct GraphService {
    executor: Executor,
    probes: PreconditionEvaluator,
}

impl GraphService {
    /// The one constructor: a shared connection plus retry configuration.
    pub fn new(client: Arc<dyn GraphClient>, config: RetryConfig) -> Self {
        let executor = Executor::new(client, config);
        let probes = PreconditionEvaluator::new(executor.clone());
        Self { executor, probes }
    }

    /// Read-only probes, usable independently by planning callers.
    pub fn probes(&self) -> &PreconditionEvaluator {
        &self.probes
    }

    /// Creates the vertex if absent, then applies the sanitized properties
    /// one by one. The tenant property is re-asserted even when the vertex
    /// already existed, which self-heals any drift between the id prefix and
    /// the tenant guard.
    pub async fn upsert_vertex(
        &self,
        tenant: &TenantId,
        label: &str,
        local_id: &str,
        properties: &PropertyMap,
        cancel: &CancellationToken,
    ) -> Result<()> {
        require_non_blank(label, "label")?;
        let qualified_id = ids::encode(tenant, local_id)?;
        debug!(%tenant, label, qualified_id, "upserting vertex");

        let create = traversal::upsert_vertex(&qualified_id, tenant, label);
        self.executor.execute("upsert_vertex", &create, cancel).await?;

        for (key, value) in props::sanitize(tenant, properties) {
            let set = traversal::set_vertex_property(&qualified_id, tenant, &key, &value);
            self.executor
                .execute("set_vertex_property", &set, cancel)
                .await?;
        }
        Ok(())
    }

    /// Sets one property on an existing vertex. Fails with `NotFound` when
    /// the vertex is absent for the tenant.
    ///
    /// `tenant_override` lets trusted internal callers act for a tenant other
    /// than the ambient one (e.g. a background effects processor); the
    /// exception is always logged with both values.
    pub async fn upsert_vertex_property(
        &self,
        tenant: &TenantId,
        local_id: &str,
        key: &str,
        value: &PropertyValue,
        tenant_override: Option<&TenantId>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        require_non_blank(key, "property key")?;
        if props::is_reserved_key(key) {
            return Err(GraphError::InvalidArgument(format!(
                "property key '{key}' is reserved"
            )));
        }
        let effective = match tenant_override {
            Some(override_tenant) if override_tenant != tenant => {
                warn!(
                    ambient_tenant = %tenant,
                    override_tenant = %override_tenant,
                    local_id,
                    "tenant override in effect for property upsert"
                );
                override_tenant
            }
            Some(_) | None => tenant,
        };

        if !self.probes.vertex_exists(effective, local_id, cancel).await? {
            return Err(GraphError::NotFound("vertex"));
        }

        let qualified_id = ids::encode(effective, local_id)?;
        let set =
            traversal::set_vertex_property(&qualified_id, effective, key, &value.to_wire());
        self.executor
            .execute("upsert_vertex_property", &set, cancel)
            .await?;
        Ok(())
    }

    /// Tenant-scoped property read. Absence is a normal result, not an error.
    pub async fn get_vertex_property(
        &self,
        tenant: &TenantId,
        local_id: &str,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        let qualified_id = ids::encode(tenant, local_id)?;
        let get = traversal::get_vertex_property(&qualified_id, tenant, key);
        let rows = self
            .executor
            .execute("get_vertex_property", &get, cancel)
            .await?;
        Ok(rows.first().and_then(scalar_to_string))
    }

    /// Creates the edge if absent between the two specific vertices with this
    /// label, after proving both endpoints exist for the tenant. No write is
    /// issued when either endpoint is missing.
    pub async fn upsert_edge(
        &self,
        tenant: &TenantId,
        label: &str,
        out_local_id: &str,
        in_local_id: &str,
        properties: &PropertyMap,
        cancel: &CancellationToken,
    ) -> Result<()> {
        require_non_blank(label, "label")?;
        let out_id = ids::encode(tenant, out_local_id)?;
        let in_id = ids::encode(tenant, in_local_id)?;
        ids::assert_tenant(tenant, &out_id)?;
        ids::assert_tenant(tenant, &in_id)?;

        if !self.probes.vertex_exists(tenant, out_local_id, cancel).await? {
            return Err(GraphError::DanglingReference {
                side: EdgeSide::Out,
                local_id: out_local_id.to_owned(),
            });
        }
        if !self.probes.vertex_exists(tenant, in_local_id, cancel).await? {
            return Err(GraphError::DanglingReference {
                side: EdgeSide::In,
                local_id: in_local_id.to_owned(),
            });
        }

        debug!(%tenant, label, out_id, in_id, "upserting edge");
        let create = traversal::upsert_edge(&out_id, tenant, label, &in_id);
        self.executor.execute("upsert_edge", &create, cancel).await?;

        for (key, value) in props::sanitize(tenant, properties) {
            let set =
                traversal::set_edge_property(&out_id, tenant, label, &in_id, &key, &value);
            self.executor
                .execute("set_edge_property", &set, cancel)
                .await?;
        }
        Ok(())
    }

    /// Tenant-scoped vertex read. Returns `None` when absent, and fails
    /// closed (also `None`) when a row cannot be proven to belong to the
    /// tenant.
    pub async fn get_vertex(
        &self,
        tenant: &TenantId,
        local_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Vertex>> {
        let qualified_id = ids::encode(tenant, local_id)?;
        let get = traversal::get_vertex(&qualified_id, tenant);
        let rows = self.executor.execute("get_vertex", &get, cancel).await?;
        Ok(rows.first().and_then(|row| vertex_from_row(tenant, row)))
    }

    /// All vertices with the label under this tenant. Rows that fail the
    /// tenant agreement check are dropped, not surfaced.
    pub async fn query_vertices_by_label(
        &self,
        tenant: &TenantId,
        label: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Vertex>> {
        require_non_blank(label, "label")?;
        let query = traversal::vertices_by_label(tenant, label);
        let rows = self
            .executor
            .execute("query_vertices_by_label", &query, cancel)
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| vertex_from_row(tenant, row))
            .collect())
    }

    pub async fn delete_vertex(
        &self,
        tenant: &TenantId,
        local_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let qualified_id = ids::encode(tenant, local_id)?;
        let drop_op = traversal::delete_vertex(&qualified_id, tenant);
        self.executor.execute("delete_vertex", &drop_op, cancel).await?;
        Ok(())
    }

    pub async fn delete_edge(
        &self,
        tenant: &TenantId,
        label: &str,
        out_local_id: &str,
        in_local_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        require_non_blank(label, "label")?;
        let out_id = ids::encode(tenant, out_local_id)?;
        let in_id = ids::encode(tenant, in_local_id)?;
        let drop_op = traversal::delete_edge(&out_id, tenant, label, &in_id);
        self.executor.execute("delete_edge", &drop_op, cancel).await?;
        Ok(())
    }

    // Probe delegations, so mutation callers and planning callers share one
    // entry point.

    pub async fn vertex_exists(
        &self,
        tenant: &TenantId,
        local_id: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        self.probes.vertex_exists(tenant, local_id, cancel).await
    }

    pub async fn edge_exists(
        &self,
        tenant: &TenantId,
        out_local_id: &str,
        label: &str,
        in_local_id: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        self.probes
            .edge_exists(tenant, out_local_id, label, in_local_id, cancel)
            .await
    }

    pub async fn has_property(
        &self,
        tenant: &TenantId,
        local_id: &str,
        key: &str,
        expected: Option<&PropertyValue>,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        self.probes
            .has_property(tenant, local_id, key, expected, cancel)
            .await
    }
}

impl std::fmt::Debug for GraphService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphService")
            .field("executor", &self.executor)
            .finish()
    }
}

fn require_non_blank(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GraphError::InvalidArgument(format!(
            "{what} must not be blank"
        )));
    }
    Ok(())
}

/// Unwraps a scalar result that some transports wrap in a one-element list.
fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Array(items) => items.first().and_then(scalar_to_string),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Materializes a `valueMap(true)`-shaped row into a `Vertex`, verifying that
/// the row's id prefix and tenant property both agree with the expected
/// tenant. Any disagreement fails closed: the row is treated as not found.
fn vertex_from_row(tenant: &TenantId, row: &JsonValue) -> Option<Vertex> {
    let object = row.as_object()?;
    let qualified_id = object.get(ID_KEY).and_then(JsonValue::as_str)?.to_owned();
    let label = object
        .get("label")
        .and_then(|v| scalar_to_string(v))?;

    if ids::assert_tenant(tenant, &qualified_id).is_err() {
        return None;
    }
    let tenant_prop = object.get(TENANT_KEY).and_then(|v| scalar_to_string(v))?;
    if tenant_prop != tenant.as_str() {
        return None;
    }

    let mut properties = BTreeMap::new();
    for (key, value) in object {
        if key == ID_KEY || key == TENANT_KEY || key == "label" {
            continue;
        }
        if let Some(text) = scalar_to_string(value) {
            properties.insert(key.clone(), text);
        }
    }
    Some(Vertex {
        qualified_id,
        label,
        properties,
    })
}
