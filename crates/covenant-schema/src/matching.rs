//! Matching values against schemas

use crate::error::ValidationIssue;
use crate::schema::{Schema, SchemaKind, StringFormat, StringRules};
use serde_json::Value;

impl Schema {
    /// Check `value` against this schema, collecting every mismatch
    pub fn validate(&self, value: &Value) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.check("", Some(value), &mut issues);
        issues
    }

    /// `true` when `value` satisfies this schema
    pub fn matches(&self, value: &Value) -> bool {
        self.validate(value).is_empty()
    }

    fn check(&self, path: &str, value: Option<&Value>, issues: &mut Vec<ValidationIssue>) {
        let value = match value {
            None | Some(Value::Null) if self.is_optional() => return,
            None => {
                issues.push(ValidationIssue::new(path, self.type_message()));
                return;
            }
            Some(value) => value,
        };

        match self.kind() {
            SchemaKind::String(rules) => match value {
                Value::String(s) => check_string(rules, path, s, value, issues),
                _ => issues.push(mismatch(path, "should be a string", value)),
            },
            SchemaKind::Number(rules) | SchemaKind::Integer(rules) => {
                let integer = matches!(self.kind(), SchemaKind::Integer(_));
                let parsed = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) if rules.parse => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                let Some(n) = parsed.filter(|n| !integer || n.fract() == 0.0) else {
                    issues.push(mismatch(path, self.type_message(), value));
                    return;
                };
                if let Some(min) = rules.minimum {
                    if n < min {
                        issues.push(mismatch(path, format!("should be >= {}", min), value));
                    }
                }
                if let Some(max) = rules.maximum {
                    if n > max {
                        issues.push(mismatch(path, format!("should be <= {}", max), value));
                    }
                }
            }
            SchemaKind::Boolean(rules) => {
                let ok = match value {
                    Value::Bool(_) => true,
                    Value::String(s) if rules.parse => s == "true" || s == "false",
                    _ => false,
                };
                if !ok {
                    issues.push(mismatch(path, "should be a boolean", value));
                }
            }
            SchemaKind::Object(rules) => {
                let Value::Object(map) = value else {
                    issues.push(mismatch(path, "should be an object", value));
                    return;
                };
                for (key, child) in &rules.properties {
                    child.check(&join(path, key), map.get(key), issues);
                }
                if rules.strict {
                    for (key, extra) in map {
                        if !rules.properties.contains_key(key) {
                            issues.push(mismatch(&join(path, key), "should not exist", extra));
                        }
                    }
                }
            }
            SchemaKind::Array(rules) => {
                let Value::Array(items) = value else {
                    issues.push(mismatch(path, "should be an array", value));
                    return;
                };
                if let Some(min) = rules.min_items {
                    if items.len() < min {
                        issues.push(mismatch(
                            path,
                            format!("should have at least {} items", min),
                            value,
                        ));
                    }
                }
                if let Some(max) = rules.max_items {
                    if items.len() > max {
                        issues.push(mismatch(
                            path,
                            format!("should have at most {} items", max),
                            value,
                        ));
                    }
                }
                for (index, item) in items.iter().enumerate() {
                    rules
                        .items
                        .check(&format!("{}[{}]", path, index), Some(item), issues);
                }
            }
            SchemaKind::OneOf(alternatives) => {
                if !alternatives.iter().any(|alt| alt.matches(value)) {
                    issues.push(mismatch(
                        path,
                        "should match one of the expected schemas",
                        value,
                    ));
                }
            }
            SchemaKind::HashMap(values) => {
                let Value::Object(map) = value else {
                    issues.push(mismatch(path, "should be an object", value));
                    return;
                };
                for (key, entry) in map {
                    values.check(&join(path, key), Some(entry), issues);
                }
            }
            SchemaKind::Enum(rules) => {
                if !rules.values.contains(value) {
                    issues.push(mismatch(
                        path,
                        format!("should be a valid enum value ({})", rules.describe_values()),
                        value,
                    ));
                }
            }
            SchemaKind::Lazy(lazy) => lazy.resolve().check(path, Some(value), issues),
        }
    }

    fn type_message(&self) -> String {
        match self.kind() {
            SchemaKind::String(_) => "should be a string".into(),
            SchemaKind::Number(_) => "should be a number".into(),
            SchemaKind::Integer(_) => "should be an integer".into(),
            SchemaKind::Boolean(_) => "should be a boolean".into(),
            SchemaKind::Object(_) | SchemaKind::HashMap(_) => "should be an object".into(),
            SchemaKind::Array(_) => "should be an array".into(),
            SchemaKind::OneOf(_) => "should match one of the expected schemas".into(),
            SchemaKind::Enum(rules) => {
                format!("should be a valid enum value ({})", rules.describe_values())
            }
            SchemaKind::Lazy(lazy) => lazy.resolve().type_message(),
        }
    }
}

fn check_string(
    rules: &StringRules,
    path: &str,
    s: &str,
    value: &Value,
    issues: &mut Vec<ValidationIssue>,
) {
    let length = s.chars().count();
    if let Some(min) = rules.min_length {
        if length < min {
            issues.push(mismatch(
                path,
                format!("should have at least {} characters", min),
                value,
            ));
        }
    }
    if let Some(max) = rules.max_length {
        if length > max {
            issues.push(mismatch(
                path,
                format!("should have at most {} characters", max),
                value,
            ));
        }
    }

    let format_ok = match &rules.format {
        Some(StringFormat::Uuid) => ::uuid::Uuid::parse_str(s).is_ok(),
        Some(StringFormat::Iso8601) => is_iso8601(s),
        Some(StringFormat::Url) => ::url::Url::parse(s).is_ok(),
        Some(StringFormat::Custom(_)) | None => true,
    };
    if !format_ok {
        if let Some(format) = &rules.format {
            let label = match format {
                StringFormat::Iso8601 => "ISO8601 date",
                other => other.as_str(),
            };
            issues.push(mismatch(path, format!("should be a valid {}", label), value));
        }
    }

    if let Some(pattern) = &rules.pattern {
        if !pattern.is_match(s) {
            issues.push(mismatch(
                path,
                format!("should match the pattern {}", pattern.as_str()),
                value,
            ));
        }
    }
}

fn is_iso8601(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn mismatch(path: &str, message: impl Into<String>, value: &Value) -> ValidationIssue {
    ValidationIssue::with_value(path, message, value.clone())
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
