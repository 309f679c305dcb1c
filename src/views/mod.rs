// src/views/mod.rs

//! Typed views over a [`ResolvedConfig`] for the two external consumers.
//!
//! - [`web::WebServerSettings`] reads `server.*` and `images.*`.
//! - [`supervisor::SupervisorSettings`] reads every `process*` and
//!   `deploy*` section.
//!
//! Views only go through the public accessors, so they work with any schema
//! that declares the fields they read.

use std::fmt;

use crate::config::ResolvedConfig;
use crate::errors::{DeploycfgError, Result};

pub mod supervisor;
pub mod web;

pub use supervisor::{
    AppSettings, DeploySettings, ExecMode, Instances, LogSettings, RestartPolicy,
    SupervisorSettings, WEB_ROLE,
};
pub use web::{ImageSettings, PublicRuntimeConfig, ServerRuntimeConfig, WebServerSettings};

/// A secret string whose `Debug` output is masked.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(********)")
    }
}

fn required<T>(cfg: &ResolvedConfig, section: &str, field: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| cfg.missing(section, field))
}

fn convert<T: TryFrom<i64>>(n: i64, section: &str, field: &str, expected: &str) -> Result<T> {
    T::try_from(n).map_err(|_| DeploycfgError::TypeMismatch {
        section: section.to_string(),
        field: field.to_string(),
        expected: expected.to_string(),
    })
}

fn string_list(cfg: &ResolvedConfig, section: &str, field: &str) -> Result<Vec<String>> {
    let items = cfg.list(section, field)?.unwrap_or_default();
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                DeploycfgError::TypeMismatch {
                    section: section.to_string(),
                    field: field.to_string(),
                    expected: "list of string".to_string(),
                }
            })
        })
        .collect()
}

fn number_list<T: TryFrom<i64>>(
    cfg: &ResolvedConfig,
    section: &str,
    field: &str,
) -> Result<Vec<T>> {
    let items = cfg.list(section, field)?.unwrap_or_default();
    items
        .iter()
        .map(|item| {
            item.as_number()
                .and_then(|n| T::try_from(n).ok())
                .ok_or_else(|| DeploycfgError::TypeMismatch {
                    section: section.to_string(),
                    field: field.to_string(),
                    expected: "list of number".to_string(),
                })
        })
        .collect()
}
