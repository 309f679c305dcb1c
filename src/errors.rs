// src/errors.rs

//! Crate-wide error type and `Result` alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeploycfgError {
    #[error("missing required field {section}.{field} (set {env})")]
    MissingRequiredField {
        section: String,
        field: String,
        env: String,
    },

    #[error("type mismatch for {section}.{field}: expected {expected}")]
    TypeMismatch {
        section: String,
        field: String,
        expected: String,
    },

    #[error("validation failed for {section}.{field}: {rule}")]
    ValidationFailed {
        section: String,
        field: String,
        rule: String,
    },

    #[error("unknown field {section}.{field}")]
    UnknownField { section: String, field: String },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("invalid overrides file: {0}")]
    InvalidOverrides(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML rendering error: {0}")]
    TomlRenderError(#[from] toml::ser::Error),
}

impl DeploycfgError {
    /// `(section, field)` this error is about, if it concerns a single field.
    pub fn field(&self) -> Option<(&str, &str)> {
        match self {
            DeploycfgError::MissingRequiredField { section, field, .. }
            | DeploycfgError::TypeMismatch { section, field, .. }
            | DeploycfgError::ValidationFailed { section, field, .. }
            | DeploycfgError::UnknownField { section, field } => {
                Some((section.as_str(), field.as_str()))
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeploycfgError>;
