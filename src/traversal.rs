//! Traversal construction. Every query this crate sends is built here from a
//! fixed template plus named bindings; call sites never concatenate query
//! text, so the tenant guard cannot be omitted or injected around.
//!
//! The underlying query language has no upsert primitive, so idempotent
//! writes use a match-then-create shape: fold the (tenant-guarded) match into
//! a list, then coalesce between unfolding the existing element and creating
//! a new one.

use crate::client::Bindings;
use crate::model::TenantId;

/// Binding names shared by the templates below.
pub const B_ID: &str = "q_id";
pub const B_TENANT: &str = "q_tenant";
pub const B_LABEL: &str = "q_label";
pub const B_KEY: &str = "q_key";
pub const B_VALUE: &str = "q_value";
pub const B_OUT: &str = "q_out";
pub const B_IN: &str = "q_in";

pub const UPSERT_VERTEX: &str = "g.V(q_id).has('tenant_id', q_tenant).fold().coalesce(unfold(), addV(q_label).property(id, q_id).property('tenant_id', q_tenant))";

pub const SET_VERTEX_PROPERTY: &str =
    "g.V(q_id).has('tenant_id', q_tenant).property(q_key, q_value)";

pub const GET_VERTEX_PROPERTY: &str =
    "g.V(q_id).has('tenant_id', q_tenant).values(q_key).limit(1)";

pub const GET_VERTEX: &str = "g.V(q_id).has('tenant_id', q_tenant).valueMap(true).limit(1)";

pub const VERTICES_BY_LABEL: &str =
    "g.V().hasLabel(q_label).has('tenant_id', q_tenant).valueMap(true)";

pub const DELETE_VERTEX: &str = "g.V(q_id).has('tenant_id', q_tenant).drop()";

pub const VERTEX_EXISTS: &str = "g.V(q_id).has('tenant_id', q_tenant).limit(1).count()";

pub const HAS_PROPERTY: &str = "g.V(q_id).has('tenant_id', q_tenant).has(q_key).limit(1).count()";

pub const HAS_PROPERTY_VALUE: &str =
    "g.V(q_id).has('tenant_id', q_tenant).has(q_key, q_value).limit(1).count()";

pub const EDGE_EXISTS: &str = "g.V(q_out).has('tenant_id', q_tenant).outE(q_label).has('tenant_id', q_tenant).where(inV().hasId(q_in).has('tenant_id', q_tenant)).limit(1).count()";

pub const UPSERT_EDGE: &str = "g.V(q_out).has('tenant_id', q_tenant).outE(q_label).has('tenant_id', q_tenant).where(inV().hasId(q_in).has('tenant_id', q_tenant)).fold().coalesce(unfold(), g.V(q_out).addE(q_label).to(V(q_in)).property('tenant_id', q_tenant))";

pub const SET_EDGE_PROPERTY: &str = "g.V(q_out).has('tenant_id', q_tenant).outE(q_label).has('tenant_id', q_tenant).where(inV().hasId(q_in).has('tenant_id', q_tenant)).property(q_key, q_value)";

pub const DELETE_EDGE: &str = "g.V(q_out).has('tenant_id', q_tenant).outE(q_label).has('tenant_id', q_tenant).where(inV().hasId(q_in).has('tenant_id', q_tenant)).drop()";

/// A fully prepared query: template text plus its bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    pub text: &'static str,
    pub bindings: Bindings,
}

fn tenant_bindings(tenant: &TenantId) -> Bindings {
    Bindings::new().bind(B_TENANT, tenant.as_str())
}

pub fn upsert_vertex(qualified_id: &str, tenant: &TenantId, label: &str) -> Traversal {
    Traversal {
        text: UPSERT_VERTEX,
        bindings: tenant_bindings(tenant)
            .bind(B_ID, qualified_id)
            .bind(B_LABEL, label),
    }
}

pub fn set_vertex_property(
    qualified_id: &str,
    tenant: &TenantId,
    key: &str,
    value: &str,
) -> Traversal {
    Traversal {
        text: SET_VERTEX_PROPERTY,
        bindings: tenant_bindings(tenant)
            .bind(B_ID, qualified_id)
            .bind(B_KEY, key)
            .bind(B_VALUE, value),
    }
}

pub fn get_vertex_property(qualified_id: &str, tenant: &TenantId, key: &str) -> Traversal {
    Traversal {
        text: GET_VERTEX_PROPERTY,
        bindings: tenant_bindings(tenant)
            .bind(B_ID, qualified_id)
            .bind(B_KEY, key),
    }
}

pub fn get_vertex(qualified_id: &str, tenant: &TenantId) -> Traversal {
    Traversal {
        text: GET_VERTEX,
        bindings: tenant_bindings(tenant).bind(B_ID, qualified_id),
    }
}

pub fn vertices_by_label(tenant: &TenantId, label: &str) -> Traversal {
    Traversal {
        text: VERTICES_BY_LABEL,
        bindings: tenant_bindings(tenant).bind(B_LABEL, label),
    }
}

pub fn delete_vertex(qualified_id: &str, tenant: &TenantId) -> Traversal {
    Traversal {
        text: DELETE_VERTEX,
        bindings: tenant_bindings(tenant).bind(B_ID, qualified_id),
    }
}

pub fn vertex_exists(qualified_id: &str, tenant: &TenantId) -> Traversal {
    Traversal {
        text: VERTEX_EXISTS,
        bindings: tenant_bindings(tenant).bind(B_ID, qualified_id),
    }
}

pub fn has_property(
    qualified_id: &str,
    tenant: &TenantId,
    key: &str,
    expected: Option<&str>,
) -> Traversal {
    let bindings = tenant_bindings(tenant)
        .bind(B_ID, qualified_id)
        .bind(B_KEY, key);
    match expected {
        Some(value) => Traversal {
            text: HAS_PROPERTY_VALUE,
            bindings: bindings.bind(B_VALUE, value),
        },
        None => Traversal {
            text: HAS_PROPERTY,
            bindings,
        },
    }
}

fn edge_bindings(out_id: &str, tenant: &TenantId, label: &str, in_id: &str) -> Bindings {
    tenant_bindings(tenant)
        .bind(B_OUT, out_id)
        .bind(B_LABEL, label)
        .bind(B_IN, in_id)
}

pub fn edge_exists(out_id: &str, tenant: &TenantId, label: &str, in_id: &str) -> Traversal {
    Traversal {
        text: EDGE_EXISTS,
        bindings: edge_bindings(out_id, tenant, label, in_id),
    }
}

pub fn upsert_edge(out_id: &str, tenant: &TenantId, label: &str, in_id: &str) -> Traversal {
    Traversal {
        text: UPSERT_EDGE,
        bindings: edge_bindings(out_id, tenant, label, in_id),
    }
}

pub fn set_edge_property(
    out_id: &str,
    tenant: &TenantId,
    label: &str,
    in_id: &str,
    key: &str,
    value: &str,
) -> Traversal {
    Traversal {
        text: SET_EDGE_PROPERTY,
        bindings: edge_bindings(out_id, tenant, label, in_id)
            .bind(B_KEY, key)
            .bind(B_VALUE, value),
    }
}

pub fn delete_edge(out_id: &str, tenant: &TenantId, label: &str, in_id: &str) -> Traversal {
    Traversal {
        text: DELETE_EDGE,
        bindings: edge_bindings(out_id, tenant, label, in_id),
    }
}
