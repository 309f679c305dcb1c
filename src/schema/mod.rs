// src/schema/mod.rs

//! Declared configuration schemas.
//!
//! - `field.rs`: single field declarations and their validation rules.
//! - `model.rs`: sections and the (raw / validated) schema.
//! - `validate.rs`: invariants checked when a `RawSchema` becomes a
//!   `ConfigSchema`.
//! - `builtin.rs`: the standard web server / supervisor schema.

pub mod builtin;
pub mod field;
pub mod model;
pub mod validate;

pub use builtin::standard_schema;
pub use field::{ConfigField, Pattern, Rule};
pub use model::{ConfigSchema, RawSchema, SectionSchema};
