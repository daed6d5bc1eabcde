//! Instance name validation.
//!
//! Names end up in filesystem paths, container names and orchestration
//! command lines, so only a whitelist is accepted: an ASCII letter followed
//! by ASCII letters, digits, `-` or `_`.

use crate::errors::{FleetError, FleetResult};
use crate::registry::Registry;
use crate::runtime::constants::naming::MAX_NAME_LEN;

/// Check the shape of a proposed name, without looking at the registry.
pub fn validate_syntax(name: &str) -> FleetResult<()> {
    if name.is_empty() {
        return Err(FleetError::InvalidName("Name is required".to_string()));
    }

    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_allowed = chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !starts_with_letter || !rest_allowed {
        return Err(FleetError::InvalidName(
            "Name must start with a letter and contain only letters, numbers, hyphens, and underscores"
                .to_string(),
        ));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(FleetError::InvalidName(format!(
            "Name must be {MAX_NAME_LEN} characters or less"
        )));
    }

    Ok(())
}

/// Check a proposed name for a new instance: shape, then uniqueness.
pub fn validate_name(name: &str, registry: &Registry) -> FleetResult<()> {
    validate_syntax(name)?;

    if registry.contains(name) {
        return Err(FleetError::InvalidName(format!(
            "Instance '{name}' already exists"
        )));
    }

    Ok(())
}
