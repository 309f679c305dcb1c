// src/schema/model.rs

use crate::schema::field::ConfigField;

/// A named group of fields, e.g. `server` or `process`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSchema {
    pub name: String,
    pub fields: Vec<ConfigField>,
}

impl SectionSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: ConfigField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get(&self, field: &str) -> Option<&ConfigField> {
        self.fields.iter().find(|f| f.name == field)
    }
}

/// Schema as declared, before its invariants are checked.
///
/// Convert into a [`ConfigSchema`] with `ConfigSchema::try_from(raw)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSchema {
    pub sections: Vec<SectionSchema>,
}

impl RawSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, section: SectionSchema) -> Self {
        self.sections.push(section);
        self
    }
}

/// Validated schema: ordered sections with unique names, unique field
/// names per section, and defaults that satisfy their own rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSchema {
    sections: Vec<SectionSchema>,
}

impl ConfigSchema {
    /// Internal constructor used after validation.
    pub(crate) fn new_unchecked(sections: Vec<SectionSchema>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[SectionSchema] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&SectionSchema> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn field(&self, section: &str, field: &str) -> Option<&ConfigField> {
        self.section(section).and_then(|s| s.get(field))
    }

    /// Total number of declared fields.
    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
