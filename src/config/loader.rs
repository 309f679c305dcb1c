// src/config/loader.rs

use tracing::{debug, info, warn};

use crate::config::resolved::{ResolvedConfig, ResolvedField, ResolvedSection, ValueSource};
use crate::config::rules;
use crate::env::EnvSource;
use crate::errors::{DeploycfgError, Result};
use crate::schema::{ConfigField, ConfigSchema};

/// Resolve every field of `schema` from `env`.
///
/// For each field, in schema order:
///
/// - read its environment variable; empty or whitespace-only counts as
///   absent,
/// - fall back to the schema default,
/// - fail with `MissingRequiredField` if still absent and required,
/// - coerce to the declared type (`TypeMismatch` on failure),
/// - apply the field's rules (`ValidationFailed` on the first violation).
///
/// The first failure aborts the whole load; nothing partial is returned.
pub fn load<E: EnvSource + ?Sized>(schema: &ConfigSchema, env: &E) -> Result<ResolvedConfig> {
    let mut sections = Vec::with_capacity(schema.sections().len());
    for section in schema.sections() {
        let fields = section
            .fields
            .iter()
            .map(|field| resolve_field(&section.name, field, env))
            .collect::<Result<Vec<_>>>()?;
        sections.push(ResolvedSection::new(section.name.clone(), fields));
    }

    let config = ResolvedConfig::new(sections);
    info!(
        sections = config.sections().len(),
        fields = schema.len(),
        "configuration resolved"
    );
    Ok(config)
}

/// Run the same pipeline as [`load`] but report every failing field instead
/// of stopping at the first. Empty means `load` would succeed.
pub fn check<E: EnvSource + ?Sized>(schema: &ConfigSchema, env: &E) -> Vec<DeploycfgError> {
    let mut problems = Vec::new();
    for section in schema.sections() {
        for field in section.fields.iter() {
            if let Err(e) = resolve_field(&section.name, field, env) {
                warn!(error = %e, "configuration problem");
                problems.push(e);
            }
        }
    }
    problems
}

fn resolve_field<E: EnvSource + ?Sized>(
    section: &str,
    field: &ConfigField,
    env: &E,
) -> Result<ResolvedField> {
    let var = field.env_var(section);

    let (raw, source) = match env.get(&var).filter(|v| !v.trim().is_empty()) {
        Some(raw) => (Some(raw), ValueSource::Environment(var.clone())),
        None => match field.default.as_deref() {
            Some(raw) => (Some(raw), ValueSource::Default),
            None => (None, ValueSource::Unset),
        },
    };

    let Some(raw) = raw else {
        if field.required {
            return Err(DeploycfgError::MissingRequiredField {
                section: section.to_string(),
                field: field.name.clone(),
                env: var,
            });
        }
        debug!(section, field = %field.name, "optional field left unset");
        return Ok(ResolvedField::new(
            field.name.clone(),
            field.ty.clone(),
            var,
            None,
            ValueSource::Unset,
            field.secret,
        ));
    };

    let value = field
        .ty
        .coerce(raw)
        .ok_or_else(|| DeploycfgError::TypeMismatch {
            section: section.to_string(),
            field: field.name.clone(),
            expected: field.ty.to_string(),
        })?;

    if let Some(rule) = field.rules.iter().find(|r| !rules::holds(r, &value)) {
        return Err(DeploycfgError::ValidationFailed {
            section: section.to_string(),
            field: field.name.clone(),
            rule: rule.to_string(),
        });
    }

    let resolved = ResolvedField::new(
        field.name.clone(),
        field.ty.clone(),
        var,
        Some(value),
        source,
        field.secret,
    );
    debug!(
        section,
        field = %field.name,
        source = %resolved.source(),
        value = %resolved.display_value().unwrap_or_default(),
        "resolved field"
    );
    Ok(resolved)
}
