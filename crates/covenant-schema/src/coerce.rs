//! Value coercion for string-typed request parts

use crate::schema::{Schema, SchemaKind};
use serde_json::{Map, Number, Value};

impl Schema {
    /// Whether [`Schema::coerce`] can rewrite values for this tree.
    ///
    /// Alternatives and deferred nodes are ambiguous targets, so any tree
    /// containing them reports `false`.
    pub fn supports_coercion(&self) -> bool {
        match self.kind() {
            SchemaKind::OneOf(_) | SchemaKind::Lazy(_) => false,
            SchemaKind::Object(rules) => rules.properties.values().all(Schema::supports_coercion),
            SchemaKind::Array(rules) => rules.items.supports_coercion(),
            SchemaKind::HashMap(values) => values.supports_coercion(),
            _ => true,
        }
    }

    /// Convert parseable strings into the numbers and booleans the schema
    /// declares. Values that cannot be converted are returned unchanged.
    pub fn coerce(&self, value: &Value) -> Value {
        match (self.kind(), value) {
            (SchemaKind::Number(rules), Value::String(s)) if rules.parse => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| value.clone()),
            (SchemaKind::Integer(rules), Value::String(s)) if rules.parse => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64)
                .map(|n| Value::from(n as i64))
                .unwrap_or_else(|| value.clone()),
            (SchemaKind::Boolean(rules), Value::String(s)) if rules.parse => match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => value.clone(),
            },
            (SchemaKind::Object(rules), Value::Object(map)) => {
                let mut out = Map::with_capacity(map.len());
                for (key, entry) in map {
                    let coerced = match rules.properties.get(key) {
                        Some(child) => child.coerce(entry),
                        None => entry.clone(),
                    };
                    out.insert(key.clone(), coerced);
                }
                Value::Object(out)
            }
            (SchemaKind::Array(rules), Value::Array(items)) => {
                Value::Array(items.iter().map(|item| rules.items.coerce(item)).collect())
            }
            (SchemaKind::HashMap(values), Value::Object(map)) => Value::Object(
                map.iter()
                    .map(|(key, entry)| (key.clone(), values.coerce(entry)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}
