// src/config/rules.rs

//! Evaluation of [`Rule`]s against coerced values.

use url::Url;

use crate::schema::Rule;
use crate::types::{FieldType, Value};

/// Whether `value` satisfies `rule`.
///
/// A rule applied to a value of a kind it does not understand never holds;
/// schema validation rejects such combinations up front.
pub fn holds(rule: &Rule, value: &Value) -> bool {
    match rule {
        Rule::NonEmpty => match value {
            Value::String(s) | Value::Enum(s) => !s.trim().is_empty(),
            Value::List(items) => !items.is_empty(),
            _ => false,
        },
        Rule::Range { min, max } => match numeric(value) {
            Some(n) => *min <= n && n <= *max,
            None => false,
        },
        Rule::MinLength(n) => value.as_str().is_some_and(|s| s.chars().count() >= *n),
        Rule::Url => value.as_str().is_some_and(is_http_url),
        Rule::Pattern(pattern) => match (value.as_str(), pattern.regex()) {
            (Some(s), Ok(re)) => re.is_match(s),
            _ => false,
        },
        Rule::MinItems(n) => value.as_list().is_some_and(|items| items.len() >= *n),
        Rule::Each(inner) => value
            .as_list()
            .is_some_and(|items| items.iter().all(|item| holds(inner, item))),
    }
}

/// Whether `rule` can ever be evaluated against values of type `ty`.
pub fn applies_to(rule: &Rule, ty: &FieldType) -> bool {
    match rule {
        Rule::NonEmpty => matches!(
            ty,
            FieldType::String | FieldType::Enum(_) | FieldType::List(_)
        ),
        Rule::Range { .. } => matches!(
            ty,
            FieldType::Number | FieldType::ByteSize | FieldType::Duration
        ),
        Rule::MinLength(_) | Rule::Url | Rule::Pattern(_) => {
            matches!(ty, FieldType::String | FieldType::Enum(_))
        }
        Rule::MinItems(_) => matches!(ty, FieldType::List(_)),
        Rule::Each(inner) => match ty {
            FieldType::List(item) => applies_to(inner, item),
            _ => false,
        },
    }
}

fn numeric(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::ByteSize(n) => i64::try_from(*n).ok(),
        Value::Duration(d) => i64::try_from(d.as_millis()).ok(),
        _ => None,
    }
}

fn is_http_url(s: &str) -> bool {
    match Url::parse(s.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn range_covers_sizes_and_durations() {
        let rule = Rule::range(1_000, 10_000);
        assert!(holds(&rule, &Value::Number(3_000)));
        assert!(!holds(&rule, &Value::Number(10_001)));
        assert!(holds(&rule, &Value::Duration(Duration::from_secs(5))));
        assert!(!holds(&rule, &Value::ByteSize(1 << 20)));
    }

    #[test]
    fn url_requires_http_scheme_and_host() {
        let s = |v: &str| Value::String(v.to_string());
        assert!(holds(&Rule::Url, &s("https://api.example.com/v1")));
        assert!(!holds(&Rule::Url, &s("postgres://db:5432/app")));
        assert!(!holds(&Rule::Url, &s("not a url")));
    }

    #[test]
    fn each_applies_to_every_item() {
        let rule = Rule::each(Rule::range(1, 100));
        let ok = Value::List(vec![Value::Number(1), Value::Number(100)]);
        let bad = Value::List(vec![Value::Number(1), Value::Number(101)]);
        assert!(holds(&rule, &ok));
        assert!(!holds(&rule, &bad));
    }

    #[test]
    fn applicability_follows_type() {
        assert!(applies_to(&Rule::port(), &FieldType::Number));
        assert!(!applies_to(&Rule::Url, &FieldType::Number));
        assert!(applies_to(
            &Rule::each(Rule::port()),
            &FieldType::list_of(FieldType::Number)
        ));
        assert!(!applies_to(&Rule::each(Rule::port()), &FieldType::Number));
    }
}
