// src/env.rs

//! Environment input for the loader.
//!
//! The loader never reads the process environment itself. Callers hand it
//! an [`EnvSource`]: a test map, a [`ProcessEnv`] snapshot taken once at
//! startup, or a [`Layered`] combination with an overrides file.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::errors::{DeploycfgError, Result};

/// Read-only mapping of variable names to raw string values.
pub trait EnvSource: Debug {
    fn get(&self, key: &str) -> Option<&str>;
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        BTreeMap::get(self, key).map(String::as_str)
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn get(&self, key: &str) -> Option<&str> {
        (**self).get(key)
    }
}

/// Snapshot of the process environment.
///
/// Entries whose name or value is not valid UTF-8 are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessEnv {
    vars: BTreeMap<String, String>,
}

impl ProcessEnv {
    pub fn capture() -> Self {
        let vars: BTreeMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        debug!(count = vars.len(), "captured process environment");
        Self { vars }
    }
}

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// Two sources where `overrides` wins over `base`.
///
/// A blank override does not mask the base value; it is treated as if the
/// key were absent from `overrides`.
#[derive(Debug, Clone)]
pub struct Layered<O, B> {
    overrides: O,
    base: B,
}

impl<O: EnvSource, B: EnvSource> Layered<O, B> {
    pub fn new(overrides: O, base: B) -> Self {
        Self { overrides, base }
    }
}

impl<O: EnvSource, B: EnvSource> EnvSource for Layered<O, B> {
    fn get(&self, key: &str) -> Option<&str> {
        self.overrides
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.base.get(key))
    }
}

/// Scalar values accepted in an overrides file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OverrideScalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl OverrideScalar {
    fn into_raw(self) -> String {
        match self {
            OverrideScalar::Text(s) => s,
            OverrideScalar::Integer(n) => n.to_string(),
            OverrideScalar::Float(x) => x.to_string(),
            OverrideScalar::Flag(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OverrideValue {
    Scalar(OverrideScalar),
    List(Vec<OverrideScalar>),
}

/// Read an overrides file: top-level `KEY = value` pairs, e.g.
///
/// ```toml
/// PORT = 8080
/// NODE_ENV = "staging"
/// DEPLOY_HOSTS = ["web-1", "web-2"]
/// ```
///
/// Numbers and booleans are turned back into strings; arrays are joined
/// with commas, the list syntax the loader expects.
pub fn load_overrides(path: impl AsRef<Path>) -> Result<BTreeMap<String, String>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_overrides(&contents)
}

/// Parse overrides from TOML text. See [`load_overrides`].
pub fn parse_overrides(contents: &str) -> Result<BTreeMap<String, String>> {
    let table: toml::Table = toml::from_str(contents)?;

    let mut vars = BTreeMap::new();
    for (key, value) in table {
        let parsed = OverrideValue::deserialize(value).map_err(|_| {
            DeploycfgError::InvalidOverrides(format!(
                "'{key}' must be a string, number, boolean or array of those"
            ))
        })?;
        let raw = match parsed {
            OverrideValue::Scalar(s) => s.into_raw(),
            OverrideValue::List(items) => items
                .into_iter()
                .map(OverrideScalar::into_raw)
                .collect::<Vec<_>>()
                .join(","),
        };
        vars.insert(key, raw);
    }

    debug!(count = vars.len(), "parsed overrides");
    Ok(vars)
}
