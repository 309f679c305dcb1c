// src/schema/validate.rs

use std::collections::HashSet;

use crate::config::rules;
use crate::errors::{DeploycfgError, Result};
use crate::schema::field::{ConfigField, Pattern, Rule};
use crate::schema::model::{ConfigSchema, RawSchema, SectionSchema};
use crate::types::FieldType;

impl TryFrom<RawSchema> for ConfigSchema {
    type Error = DeploycfgError;

    fn try_from(raw: RawSchema) -> std::result::Result<Self, Self::Error> {
        validate_raw_schema(&raw)?;
        Ok(ConfigSchema::new_unchecked(raw.sections))
    }
}

fn validate_raw_schema(raw: &RawSchema) -> Result<()> {
    let mut section_names = HashSet::new();
    for section in raw.sections.iter() {
        if section.name.trim().is_empty() {
            return Err(invalid("section names must not be empty".to_string()));
        }
        if !section_names.insert(section.name.as_str()) {
            return Err(invalid(format!("duplicate section '{}'", section.name)));
        }
        validate_section(section)?;
    }
    Ok(())
}

fn validate_section(section: &SectionSchema) -> Result<()> {
    let mut field_names = HashSet::new();
    for field in section.fields.iter() {
        if field.name.trim().is_empty() {
            return Err(invalid(format!(
                "section '{}' has a field with an empty name",
                section.name
            )));
        }
        if !field_names.insert(field.name.as_str()) {
            return Err(invalid(format!(
                "duplicate field '{}' in section '{}'",
                field.name, section.name
            )));
        }
        validate_field(&section.name, field)?;
    }
    Ok(())
}

fn validate_field(section: &str, field: &ConfigField) -> Result<()> {
    let path = format!("{section}.{}", field.name);

    if let FieldType::List(item) = &field.ty {
        if matches!(item.as_ref(), FieldType::List(_)) {
            return Err(invalid(format!("{path}: nested lists are not supported")));
        }
    }
    if let FieldType::Enum(variants) = &field.ty {
        if variants.is_empty() {
            return Err(invalid(format!("{path}: enum must declare at least one variant")));
        }
    }

    for rule in field.rules.iter() {
        if !rules::applies_to(rule, &field.ty) {
            return Err(invalid(format!(
                "{path}: rule '{rule}' cannot apply to type {}",
                field.ty
            )));
        }
        if let Some(pattern) = pattern_of(rule) {
            pattern
                .regex()
                .map_err(|e| invalid(format!("{path}: invalid pattern /{pattern}/: {e}")))?;
        }
    }

    // A default has to be a value the loader would accept from the
    // environment.
    if let Some(raw) = &field.default {
        let value = field.ty.coerce(raw).ok_or_else(|| {
            invalid(format!("{path}: default is not a valid {}", field.ty))
        })?;
        if let Some(rule) = field.rules.iter().find(|r| !rules::holds(r, &value)) {
            return Err(invalid(format!("{path}: default violates rule '{rule}'")));
        }
    }

    Ok(())
}

fn pattern_of(rule: &Rule) -> Option<&Pattern> {
    match rule {
        Rule::Pattern(pattern) => Some(pattern),
        Rule::Each(inner) => pattern_of(inner),
        _ => None,
    }
}

fn invalid(msg: String) -> DeploycfgError {
    DeploycfgError::InvalidSchema(msg)
}
