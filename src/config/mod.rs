// src/config/mod.rs

//! Resolving a schema against an environment.
//!
//! Responsibilities:
//! - Look up, default, coerce and validate each field (`loader.rs`).
//! - Evaluate validation rules (`rules.rs`).
//! - Hold the immutable result and its accessors (`resolved.rs`).

pub mod loader;
pub mod resolved;
pub mod rules;

pub use loader::{check, load};
pub use resolved::{ResolvedConfig, ResolvedField, ResolvedSection, ValueSource};
