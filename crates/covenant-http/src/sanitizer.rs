//! Masking of sensitive values before they leave the process
//!
//! Keys are matched by exact name or by pattern at any depth. A key containing
//! a `.` is a path and is only followed from the root of the value.

use regex::Regex;
use serde_json::Value;

/// Replacement for masked strings
pub const MASK: &str = "********";

/// A key, key pattern or dotted path to mask
#[derive(Debug, Clone)]
pub enum SanitizeKey {
    Key(String),
    Pattern(Regex),
    Path(Vec<String>),
}

impl SanitizeKey {
    fn matches(&self, key: &str) -> bool {
        match self {
            SanitizeKey::Key(name) => name == key,
            SanitizeKey::Pattern(pattern) => pattern.is_match(key),
            SanitizeKey::Path(_) => false,
        }
    }
}

impl From<&str> for SanitizeKey {
    fn from(key: &str) -> Self {
        if key.contains('.') {
            SanitizeKey::Path(key.split('.').map(str::to_string).collect())
        } else {
            SanitizeKey::Key(key.to_string())
        }
    }
}

impl From<String> for SanitizeKey {
    fn from(key: String) -> Self {
        SanitizeKey::from(key.as_str())
    }
}

impl From<Regex> for SanitizeKey {
    fn from(pattern: Regex) -> Self {
        SanitizeKey::Pattern(pattern)
    }
}

/// Mask every matching key of `value` in place
pub fn sanitize(value: &mut Value, keys: &[SanitizeKey]) {
    if keys.is_empty() || !is_truthy(value) {
        return;
    }

    for key in keys {
        if let SanitizeKey::Path(parts) = key {
            if has_path(value, parts) {
                mask_path(value, parts);
            }
        }
    }

    sanitize_keys(value, keys);
}

/// Masked copy of `value`
pub fn sanitized(value: &Value, keys: &[SanitizeKey]) -> Value {
    let mut copy = value.clone();
    sanitize(&mut copy, keys);
    copy
}

fn sanitize_keys(value: &mut Value, keys: &[SanitizeKey]) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                visit(key, child, keys);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter_mut().enumerate() {
                visit(&index.to_string(), child, keys);
            }
        }
        _ => {}
    }
}

fn visit(key: &str, child: &mut Value, keys: &[SanitizeKey]) {
    if keys.iter().any(|k| k.matches(key)) {
        mask(child);
    } else {
        sanitize_keys(child, keys);
    }
}

fn child_mut<'a>(value: &'a mut Value, part: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

fn child<'a>(value: &'a Value, part: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn has_path(value: &Value, parts: &[String]) -> bool {
    let mut current = value;
    for part in parts {
        match child(current, part) {
            Some(next) if is_truthy(next) => current = next,
            _ => return false,
        }
    }
    true
}

fn mask_path(value: &mut Value, parts: &[String]) {
    let mut current = Some(value);
    for part in parts {
        current = current.and_then(|v| child_mut(v, part));
    }
    if let Some(target) = current {
        mask(target);
    }
}

fn mask(value: &mut Value) {
    if !is_truthy(value) {
        return;
    }
    match value {
        Value::String(s) => *s = MASK.to_string(),
        Value::Array(items) => items.iter_mut().for_each(mask),
        Value::Object(map) => map.values_mut().for_each(mask),
        _ => {}
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
