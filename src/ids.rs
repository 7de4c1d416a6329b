//! Tenant-qualified vertex identifiers.
//!
//! Every component that touches the shared graph must agree on exactly one
//! canonicalization rule for vertex ids; any drift here is a tenant isolation
//! breach. The codec is pure and stateless so it can be tested exhaustively.

use crate::error::{GraphError, Result};
use crate::model::TenantId;

/// Separator between the tenant and the tenant-local part of a qualified id.
/// Neither part may contain this sequence, which keeps decoding unambiguous.
pub const SEPARATOR: &str = "::";

/// Builds the globally unique id for a tenant-local entity.
pub fn encode(tenant: &TenantId, local_id: &str) -> Result<String> {
    if local_id.trim().is_empty() {
        return Err(GraphError::MalformedIdentifier(
            "local id must not be blank".into(),
        ));
    }
    if tenant.as_str().contains(SEPARATOR) {
        return Err(GraphError::MalformedIdentifier(format!(
            "tenant id '{}' contains the reserved separator '{SEPARATOR}'",
            tenant
        )));
    }
    if local_id.contains(SEPARATOR) {
        return Err(GraphError::MalformedIdentifier(format!(
            "local id '{local_id}' contains the reserved separator '{SEPARATOR}'"
        )));
    }
    Ok(format!("{}{SEPARATOR}{local_id}", tenant.as_str()))
}

/// Splits a qualified id back into its tenant and local parts. Fails unless
/// the separator occurs exactly once with non-blank text on both sides.
pub fn decode(qualified_id: &str) -> Result<(TenantId, String)> {
    let pos = qualified_id.find(SEPARATOR).ok_or_else(|| {
        GraphError::MalformedIdentifier(format!(
            "'{qualified_id}' has no '{SEPARATOR}' separator"
        ))
    })?;
    let tenant_part = &qualified_id[..pos];
    let local_part = &qualified_id[pos + SEPARATOR.len()..];
    if local_part.contains(SEPARATOR) {
        return Err(GraphError::MalformedIdentifier(format!(
            "'{qualified_id}' contains more than one '{SEPARATOR}' separator"
        )));
    }
    if tenant_part.trim().is_empty() || local_part.trim().is_empty() {
        return Err(GraphError::MalformedIdentifier(format!(
            "'{qualified_id}' has a blank tenant or local part"
        )));
    }
    Ok((TenantId::new(tenant_part)?, local_part.to_owned()))
}

/// Decodes and verifies that the id belongs to the expected tenant.
pub fn assert_tenant(expected: &TenantId, qualified_id: &str) -> Result<()> {
    let (found, _) = decode(qualified_id)?;
    if &found != expected {
        return Err(GraphError::CrossTenantViolation {
            expected: expected.as_str().to_owned(),
            found: found.as_str().to_owned(),
        });
    }
    Ok(())
}
