#![allow(dead_code)]

use std::collections::BTreeMap;

use deploycfg::schema::{ConfigField, ConfigSchema, RawSchema, Rule, SectionSchema};
use deploycfg::types::FieldType;

/// Builder for an environment map to simplify test setup.
#[derive(Debug, Clone, Default)]
pub struct EnvBuilder {
    vars: BTreeMap<String, String>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every variable the standard schema requires, with valid values.
    pub fn standard() -> Self {
        Self::new()
            .var("API_URL", "https://api.example.com")
            .var("DB_URL", "postgres://app@db.internal:5432/app")
            .var("DB_PASSWORD", "correct-horse-battery-staple")
            .var("JWT_SECRET", "0123456789abcdef0123456789abcdef")
            .var("GITHUB_REPO", "git@github.com:example/app.git")
            .var("DEPLOY_HOSTS", "host1,host2")
    }

    pub fn var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.vars.remove(key);
        self
    }

    pub fn build(self) -> BTreeMap<String, String> {
        self.vars
    }
}

/// Builder for `ConfigSchema`.
pub struct SchemaBuilder {
    schema: RawSchema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: RawSchema::new(),
        }
    }

    pub fn with_section(mut self, name: &str, fields: Vec<ConfigField>) -> Self {
        let mut section = SectionSchema::new(name);
        section.fields = fields;
        self.schema.sections.push(section);
        self
    }

    pub fn build(self) -> ConfigSchema {
        ConfigSchema::try_from(self.schema).expect("Failed to build valid schema from builder")
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `server.port`: number, default 3000, read from `PORT`.
pub fn port_field() -> ConfigField {
    ConfigField::new("port", FieldType::Number)
        .env("PORT")
        .default_value("3000")
        .rule(Rule::port())
}

/// A small schema with one field of each kind of behaviour the loader has:
/// defaulted, required, optional, secret and list.
pub fn small_schema() -> ConfigSchema {
    SchemaBuilder::new()
        .with_section(
            "server",
            vec![
                port_field(),
                ConfigField::new("api_url", FieldType::String)
                    .env("API_URL")
                    .required()
                    .rule(Rule::Url),
                ConfigField::new("asset_prefix", FieldType::String).env("ASSET_PREFIX"),
                ConfigField::new("jwt_secret", FieldType::String)
                    .env("JWT_SECRET")
                    .required()
                    .secret(),
            ],
        )
        .with_section(
            "process",
            vec![
                ConfigField::new("max_restarts", FieldType::Number).default_value("10"),
                ConfigField::new("node_args", FieldType::list_of(FieldType::String)),
            ],
        )
        .build()
}
