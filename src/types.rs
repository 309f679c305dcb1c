// src/types.rs

//! Field types and resolved values.
//!
//! Every configuration input arrives as a string. [`FieldType::coerce`] is
//! the single place where a raw string becomes a typed [`Value`].

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

static BYTE_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)\s*([kmgt]?)b?$").expect("byte size regex is valid")
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)\s*(ms|s|m|h)?$").expect("duration regex is valid")
});

/// Declared type of a configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    /// Signed integer.
    Number,
    /// `true/false`, `1/0`, `yes/no`, `on/off` (case-insensitive).
    Boolean,
    /// One of a fixed set of variants, matched case-insensitively.
    Enum(Vec<String>),
    /// Comma-separated list; each item is coerced with the inner type.
    List(Box<FieldType>),
    /// Size in bytes, e.g. `500M`, `1G`, `2048`.
    ByteSize,
    /// Duration, e.g. `5s`, `4000ms`, `10m`. A bare number is milliseconds.
    Duration,
}

impl FieldType {
    pub fn enumeration<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldType::Enum(variants.into_iter().map(Into::into).collect())
    }

    pub fn list_of(item: FieldType) -> Self {
        FieldType::List(Box::new(item))
    }

    /// Coerce a raw string into this type. `None` means the string is not a
    /// valid representation of the type.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        match self {
            FieldType::String => Some(Value::String(raw.to_string())),
            FieldType::Number => raw.trim().parse::<i64>().ok().map(Value::Number),
            FieldType::Boolean => parse_bool(raw).map(Value::Boolean),
            FieldType::Enum(variants) => {
                let wanted = raw.trim();
                variants
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(wanted))
                    .map(|v| Value::Enum(v.clone()))
            }
            FieldType::List(item) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| item.coerce(s))
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            FieldType::ByteSize => parse_byte_size(raw).map(Value::ByteSize),
            FieldType::Duration => parse_duration(raw).map(Value::Duration),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Number => write!(f, "number"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Enum(variants) => write!(f, "one of [{}]", variants.join(", ")),
            FieldType::List(item) => write!(f, "list of {item}"),
            FieldType::ByteSize => write!(f, "byte size (e.g. 512M, 1G)"),
            FieldType::Duration => write!(f, "duration (e.g. 500ms, 5s)"),
        }
    }
}

/// A resolved, typed configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Number(i64),
    Boolean(bool),
    Enum(String),
    List(Vec<Value>),
    ByteSize(u64),
    Duration(Duration),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_byte_size(&self) -> Option<u64> {
        match self {
            Value::ByteSize(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// Convert into a TOML value for printing.
    ///
    /// Byte sizes and durations keep their human-readable form.
    pub fn to_toml(&self) -> toml::Value {
        match self {
            Value::String(s) | Value::Enum(s) => toml::Value::String(s.clone()),
            Value::Number(n) => toml::Value::Integer(*n),
            Value::Boolean(b) => toml::Value::Boolean(*b),
            Value::List(items) => toml::Value::Array(items.iter().map(Value::to_toml).collect()),
            Value::ByteSize(_) | Value::Duration(_) => toml::Value::String(self.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) | Value::Enum(s) => write!(f, "{s}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::ByteSize(n) => write!(f, "{}", format_byte_size(*n)),
            Value::Duration(d) => write!(f, "{}", format_duration(*d)),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_byte_size(raw: &str) -> Option<u64> {
    let caps = BYTE_SIZE_RE.captures(raw.trim())?;
    let amount: u64 = caps[1].parse().ok()?;
    let shift = match caps[2].to_ascii_lowercase().as_str() {
        "" => 0,
        "k" => 10,
        "m" => 20,
        "g" => 30,
        "t" => 40,
        _ => return None,
    };
    amount.checked_mul(1u64 << shift)
}

fn parse_duration(raw: &str) -> Option<Duration> {
    let caps = DURATION_RE.captures(raw.trim())?;
    let amount: u64 = caps[1].parse().ok()?;
    let unit = caps.get(2).map(|m| m.as_str().to_ascii_lowercase());
    let millis = match unit.as_deref() {
        None | Some("ms") => Some(amount),
        Some("s") => amount.checked_mul(1_000),
        Some("m") => amount.checked_mul(60_000),
        Some("h") => amount.checked_mul(3_600_000),
        Some(_) => None,
    }?;
    Some(Duration::from_millis(millis))
}

fn format_byte_size(n: u64) -> String {
    const UNITS: [(u32, &str); 4] = [(40, "T"), (30, "G"), (20, "M"), (10, "K")];
    for (shift, unit) in UNITS {
        let size = 1u64 << shift;
        if n >= size && n % size == 0 {
            return format!("{}{unit}", n / size);
        }
    }
    n.to_string()
}

fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms == 0 {
        return "0ms".to_string();
    }
    if ms % 3_600_000 == 0 {
        format!("{}h", ms / 3_600_000)
    } else if ms % 60_000 == 0 {
        format!("{}m", ms / 60_000)
    } else if ms % 1_000 == 0 {
        format!("{}s", ms / 1_000)
    } else {
        format!("{ms}ms")
    }
}
