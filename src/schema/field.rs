// src/schema/field.rs

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::types::FieldType;

/// Regular expression source plus its compiled form.
///
/// Compiled on first use and kept with the rule, so a schema validated once
/// never recompiles while loading.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    compiled: OnceLock<std::result::Result<Regex, regex::Error>>,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiled: OnceLock::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> std::result::Result<&Regex, &regex::Error> {
        self.compiled
            .get_or_init(|| Regex::new(&self.source))
            .as_ref()
    }

    #[cfg(test)]
    pub(crate) fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Validation rule attached to a field.
///
/// Rules run after coercion, in declaration order; the first one that does
/// not hold is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// String/enum must contain a non-whitespace character; list must have
    /// at least one item.
    NonEmpty,
    /// Inclusive numeric range. Byte sizes compare in bytes, durations in
    /// milliseconds.
    Range { min: i64, max: i64 },
    /// Minimum string length in characters.
    MinLength(usize),
    /// Absolute `http` or `https` URL with a host.
    Url,
    /// Regular expression the whole string must match (anchor it yourself).
    Pattern(Pattern),
    /// Minimum number of list items.
    MinItems(usize),
    /// Apply the inner rule to every list item.
    Each(Box<Rule>),
}

impl Rule {
    pub fn range(min: i64, max: i64) -> Self {
        Rule::Range { min, max }
    }

    pub fn port() -> Self {
        Rule::Range { min: 1, max: 65_535 }
    }

    pub fn pattern(re: impl Into<String>) -> Self {
        Rule::Pattern(Pattern::new(re))
    }

    pub fn each(rule: Rule) -> Self {
        Rule::Each(Box::new(rule))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::NonEmpty => write!(f, "must not be empty"),
            Rule::Range { min, max } => write!(f, "must be within {min}..={max}"),
            Rule::MinLength(n) => write!(f, "must be at least {n} characters long"),
            Rule::Url => write!(f, "must be an absolute http(s) URL"),
            Rule::Pattern(re) => write!(f, "must match /{re}/"),
            Rule::MinItems(n) => write!(f, "must contain at least {n} item(s)"),
            Rule::Each(inner) => write!(f, "every item {inner}"),
        }
    }
}

/// Declaration of a single configuration field.
///
/// Built with a small builder so schema declarations read top-down:
///
/// ```
/// use deploycfg::schema::{ConfigField, Rule};
/// use deploycfg::types::FieldType;
///
/// let port = ConfigField::new("port", FieldType::Number)
///     .env("PORT")
///     .default_value("3000")
///     .rule(Rule::port());
/// assert_eq!(port.env_var("server"), "PORT");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigField {
    pub name: String,
    pub ty: FieldType,
    pub required: bool,

    /// Raw default, coerced exactly like environment input.
    pub default: Option<String>,

    pub rules: Vec<Rule>,

    /// Environment variable to read. `None` means `SECTION_FIELD`.
    pub env: Option<String>,

    /// Secret values are never logged or printed.
    pub secret: bool,

    pub description: Option<String>,
}

impl ConfigField {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            default: None,
            rules: Vec::new(),
            env: None,
            secret: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, raw: impl Into<String>) -> Self {
        self.default = Some(raw.into());
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env = Some(var.into());
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Environment variable this field is read from.
    pub fn env_var(&self, section: &str) -> String {
        match &self.env {
            Some(var) => var.clone(),
            None => format!("{section}_{}", self.name).to_uppercase(),
        }
    }
}
