// src/config/resolved.rs

use std::fmt;
use std::time::Duration;

use crate::errors::{DeploycfgError, Result};
use crate::types::{FieldType, Value};

const REDACTED: &str = "********";

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Read from the named environment variable.
    Environment(String),
    /// Schema default.
    Default,
    /// Optional field with neither input nor default.
    Unset,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Environment(var) => write!(f, "env {var}"),
            ValueSource::Default => write!(f, "default"),
            ValueSource::Unset => write!(f, "unset"),
        }
    }
}

/// One field of a [`ResolvedConfig`].
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedField {
    name: String,
    ty: FieldType,
    env: String,
    value: Option<Value>,
    source: ValueSource,
    secret: bool,
}

impl ResolvedField {
    pub(crate) fn new(
        name: String,
        ty: FieldType,
        env: String,
        value: Option<Value>,
        source: ValueSource,
        secret: bool,
    ) -> Self {
        Self {
            name,
            ty,
            env,
            value,
            source,
            secret,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    /// Environment variable the field is read from.
    pub fn env_var(&self) -> &str {
        &self.env
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn source(&self) -> &ValueSource {
        &self.source
    }

    pub fn is_secret(&self) -> bool {
        self.secret
    }

    /// Value as safe to print: secrets are masked.
    pub fn display_value(&self) -> Option<String> {
        match (&self.value, self.secret) {
            (Some(_), true) => Some(REDACTED.to_string()),
            (Some(v), false) => Some(v.to_string()),
            (None, _) => None,
        }
    }
}

impl fmt::Debug for ResolvedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value: &dyn fmt::Debug = match (&self.value, self.secret) {
            (Some(_), true) => &REDACTED,
            (value, _) => value,
        };
        f.debug_struct("ResolvedField")
            .field("name", &self.name)
            .field("value", value)
            .field("source", &self.source)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSection {
    name: String,
    fields: Vec<ResolvedField>,
}

impl ResolvedSection {
    pub(crate) fn new(name: String, fields: Vec<ResolvedField>) -> Self {
        Self { name, fields }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }
}

/// Immutable, validated configuration snapshot.
///
/// Only [`crate::config::load`] constructs one, so every required field is
/// present and type-valid. Sections and fields keep schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    sections: Vec<ResolvedSection>,
}

impl ResolvedConfig {
    pub(crate) fn new(sections: Vec<ResolvedSection>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[ResolvedSection] {
        &self.sections
    }

    /// Look up a field declared in the schema.
    pub fn field(&self, section: &str, field: &str) -> Result<&ResolvedField> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .and_then(|s| s.fields.iter().find(|f| f.name == field))
            .ok_or_else(|| DeploycfgError::UnknownField {
                section: section.to_string(),
                field: field.to_string(),
            })
    }

    /// Resolved value, `None` for an unset optional field.
    pub fn get(&self, section: &str, field: &str) -> Result<Option<&Value>> {
        self.field(section, field).map(ResolvedField::value)
    }

    /// Resolved value; an unset optional field is reported as missing.
    pub fn require(&self, section: &str, field: &str) -> Result<&Value> {
        let resolved = self.field(section, field)?;
        resolved.value().ok_or_else(|| missing(section, resolved))
    }

    pub fn source(&self, section: &str, field: &str) -> Result<&ValueSource> {
        self.field(section, field).map(ResolvedField::source)
    }

    /// String or enum value.
    pub fn string(&self, section: &str, field: &str) -> Result<Option<&str>> {
        self.typed(section, field, "string", Value::as_str)
    }

    pub fn number(&self, section: &str, field: &str) -> Result<Option<i64>> {
        self.typed(section, field, "number", Value::as_number)
    }

    pub fn boolean(&self, section: &str, field: &str) -> Result<Option<bool>> {
        self.typed(section, field, "boolean", Value::as_bool)
    }

    pub fn list(&self, section: &str, field: &str) -> Result<Option<&[Value]>> {
        self.typed(section, field, "list", Value::as_list)
    }

    pub fn byte_size(&self, section: &str, field: &str) -> Result<Option<u64>> {
        self.typed(section, field, "byte size", Value::as_byte_size)
    }

    pub fn duration(&self, section: &str, field: &str) -> Result<Option<Duration>> {
        self.typed(section, field, "duration", Value::as_duration)
    }

    fn typed<'a, T>(
        &'a self,
        section: &str,
        field: &str,
        expected: &str,
        pick: impl Fn(&'a Value) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(section, field)? {
            None => Ok(None),
            Some(value) => pick(value).map(Some).ok_or_else(|| {
                DeploycfgError::TypeMismatch {
                    section: section.to_string(),
                    field: field.to_string(),
                    expected: expected.to_string(),
                }
            }),
        }
    }

    /// Error for a value the caller needs but that was left unset.
    pub(crate) fn missing(&self, section: &str, field: &str) -> DeploycfgError {
        match self.field(section, field) {
            Ok(resolved) => missing(section, resolved),
            Err(e) => e,
        }
    }

    /// Render as TOML, one table per section in schema order, secrets masked
    /// and unset fields omitted. `only` restricts output to a single section.
    pub fn render_toml(&self, only: Option<&str>) -> Result<String> {
        let mut root = toml::Table::new();
        for section in self.sections.iter() {
            if only.is_some_and(|name| name != section.name) {
                continue;
            }
            let mut table = toml::Table::new();
            for field in section.fields.iter() {
                let Some(value) = field.value() else {
                    continue;
                };
                let rendered = if field.is_secret() {
                    toml::Value::String(REDACTED.to_string())
                } else {
                    value.to_toml()
                };
                table.insert(field.name.clone(), rendered);
            }
            root.insert(section.name.clone(), toml::Value::Table(table));
        }
        Ok(toml::to_string(&root)?)
    }
}

fn missing(section: &str, field: &ResolvedField) -> DeploycfgError {
    DeploycfgError::MissingRequiredField {
        section: section.to_string(),
        field: field.name().to_string(),
        env: field.env_var().to_string(),
    }
}
