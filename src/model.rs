use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Reserved property key carrying the vertex identity. Callers cannot set it.
pub const ID_KEY: &str = "id";
/// Reserved property key carrying the owning tenant. Callers cannot set it.
/// Every traversal re-checks this property as the authoritative tenant guard.
pub const TENANT_KEY: &str = "tenant_id";

/// The isolation boundary. All graph data is partitioned by tenant, and the
/// tenant is supplied by the caller on every operation rather than held as
/// service state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(GraphError::InvalidArgument(
                "tenant id must not be blank".into(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed scalar variant for caller-supplied property values.
///
/// The remote graph service stores properties as strings, so every variant
/// has exactly one canonical wire form; keeping the set closed makes the
/// sanitizer's coercion rules exhaustive.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
}

impl PropertyValue {
    /// Canonical wire representation. Booleans become literal `true`/`false`,
    /// timestamps become RFC 3339 UTC (lexicographically sortable).
    pub fn to_wire(&self) -> String {
        match self {
            PropertyValue::Str(s) => s.clone(),
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Int(i) => i.to_string(),
            PropertyValue::Float(x) => x.to_string(),
            PropertyValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Str(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Str(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        PropertyValue::Timestamp(value)
    }
}

/// Caller-facing property map.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A vertex as read back from the graph service. Reserved keys are split out
/// of the open property map; remaining values are the wire-string forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub qualified_id: String,
    pub label: String,
    pub properties: BTreeMap<String, String>,
}
