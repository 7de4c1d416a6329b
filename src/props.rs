//! Property sanitization: the last gate before caller-supplied data reaches
//! the wire. Strips the reserved keys, stamps the tenant guard, and coerces
//! every scalar to its canonical string form.

use serde_json::Value as JsonValue;

use crate::error::{GraphError, Result};
use crate::model::{PropertyMap, PropertyValue, TenantId, ID_KEY, TENANT_KEY};

/// Validates and normalizes a caller property map for a write under the given
/// tenant. Caller-supplied values for the identity key and the tenant key are
/// dropped, and the tenant property is injected unconditionally so every
/// upsert re-asserts ownership even on pre-existing elements.
///
/// The returned pairs are in deterministic (sorted) key order, with the
/// tenant property first so it is applied before any open property.
pub fn sanitize(tenant: &TenantId, caller_properties: &PropertyMap) -> Vec<(String, String)> {
    let mut out = Vec::with_capacity(caller_properties.len() + 1);
    out.push((TENANT_KEY.to_owned(), tenant.as_str().to_owned()));
    for (key, value) in caller_properties {
        if key == ID_KEY || key == TENANT_KEY {
            continue;
        }
        out.push((key.clone(), value.to_wire()));
    }
    out
}

/// True when callers are not allowed to write this key directly.
pub fn is_reserved_key(key: &str) -> bool {
    key == ID_KEY || key == TENANT_KEY
}

/// Converts a JSON property bag into a typed property map, rejecting nested
/// values. The upstream tool layer hands us `serde_json` objects, so this is
/// the main ingestion path for open properties.
pub fn property_map_from_json(object: &JsonValue) -> Result<PropertyMap> {
    let entries = object.as_object().ok_or_else(|| GraphError::InvalidArgument(
        "properties payload must be a JSON object".into(),
    ))?;
    let mut map = PropertyMap::new();
    for (key, value) in entries {
        map.insert(key.clone(), property_value_from_json(key, value)?);
    }
    Ok(map)
}

fn property_value_from_json(key: &str, value: &JsonValue) -> Result<PropertyValue> {
    match value {
        JsonValue::String(s) => Ok(PropertyValue::Str(s.clone())),
        JsonValue::Bool(b) => Ok(PropertyValue::Bool(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(PropertyValue::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(PropertyValue::Float(f))
            } else {
                Err(GraphError::UnsupportedPropertyType {
                    key: key.to_owned(),
                    detail: format!("number '{n}' does not fit a 64-bit value"),
                })
            }
        }
        JsonValue::Null => Err(GraphError::UnsupportedPropertyType {
            key: key.to_owned(),
            detail: "null values are not storable".into(),
        }),
        JsonValue::Array(_) => Err(GraphError::UnsupportedPropertyType {
            key: key.to_owned(),
            detail: "nested arrays are not storable".into(),
        }),
        JsonValue::Object(_) => Err(GraphError::UnsupportedPropertyType {
            key: key.to_owned(),
            detail: "nested objects are not storable".into(),
        }),
    }
}
