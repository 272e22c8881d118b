//! JSON-Schema projection

use crate::schema::{Schema, SchemaKind};
use serde_json::{json, Map, Value};

/// Prefix of references into the shared definitions table
pub const DEFINITIONS_PREFIX: &str = "#/components/schemas/";

/// `{"$ref": "#/components/schemas/<name>"}`
pub fn definition_ref(name: &str) -> Value {
    json!({ "$ref": format!("{}{}", DEFINITIONS_PREFIX, name) })
}

impl Schema {
    /// Project the schema into a JSON-Schema value.
    ///
    /// Names are not part of the projection. Deferred (lazy) children are
    /// emitted as references so recursive schemas stay finite.
    pub fn to_json_schema(&self) -> Value {
        self.to_json_schema_with(&mut standalone_child)
    }

    /// Project this node, delegating every direct child to `render`.
    ///
    /// The OpenAPI compiler uses this to replace named children with
    /// references while keeping a single description of each kind.
    pub fn to_json_schema_with(&self, render: &mut dyn FnMut(&Schema) -> Value) -> Value {
        let mut out = Map::new();

        match self.kind() {
            SchemaKind::String(rules) => {
                out.insert("type".into(), json!("string"));
                if let Some(format) = &rules.format {
                    out.insert("format".into(), json!(format.as_str()));
                }
                if let Some(min) = rules.min_length {
                    out.insert("minLength".into(), json!(min));
                }
                if let Some(max) = rules.max_length {
                    out.insert("maxLength".into(), json!(max));
                }
                if let Some(pattern) = &rules.pattern {
                    out.insert("pattern".into(), json!(pattern.as_str()));
                }
            }
            SchemaKind::Number(rules) | SchemaKind::Integer(rules) => {
                let ty = if matches!(self.kind(), SchemaKind::Integer(_)) {
                    "integer"
                } else {
                    "number"
                };
                out.insert("type".into(), json!(ty));
                if let Some(min) = rules.minimum {
                    out.insert("minimum".into(), number_value(min));
                }
                if let Some(max) = rules.maximum {
                    out.insert("maximum".into(), number_value(max));
                }
            }
            SchemaKind::Boolean(_) => {
                out.insert("type".into(), json!("boolean"));
            }
            SchemaKind::Object(rules) => {
                out.insert("type".into(), json!("object"));
                let properties: Map<String, Value> = rules
                    .properties
                    .iter()
                    .map(|(name, child)| (name.clone(), render(child)))
                    .collect();
                out.insert("properties".into(), Value::Object(properties));
                let required = rules.required();
                if !required.is_empty() {
                    out.insert("required".into(), json!(required));
                }
                if rules.strict {
                    out.insert("additionalProperties".into(), Value::Bool(false));
                }
            }
            SchemaKind::Array(rules) => {
                out.insert("type".into(), json!("array"));
                out.insert("items".into(), render(&rules.items));
                if let Some(min) = rules.min_items {
                    out.insert("minItems".into(), json!(min));
                }
                if let Some(max) = rules.max_items {
                    out.insert("maxItems".into(), json!(max));
                }
            }
            SchemaKind::OneOf(alternatives) => {
                out.insert(
                    "oneOf".into(),
                    Value::Array(alternatives.iter().map(|alt| render(alt)).collect()),
                );
            }
            SchemaKind::HashMap(values) => {
                out.insert("type".into(), json!("object"));
                out.insert("additionalProperties".into(), render(values));
            }
            SchemaKind::Enum(rules) => {
                out.insert("enum".into(), Value::Array(rules.values.clone()));
                if let Some(ty) = &rules.value_type {
                    out.insert("type".into(), json!(ty));
                }
            }
            SchemaKind::Lazy(lazy) => {
                let mut resolved = lazy.resolve().to_json_schema_with(render);
                if let (Some(description), Value::Object(map)) = (self.description(), &mut resolved) {
                    map.insert("description".into(), json!(description));
                }
                return resolved;
            }
        }

        if let Some(description) = self.description() {
            out.insert("description".into(), json!(description));
        }

        Value::Object(out)
    }
}

fn standalone_child(child: &Schema) -> Value {
    match (child.kind(), child.name()) {
        (SchemaKind::Lazy(_), Some(name)) => definition_ref(name),
        _ => child.to_json_schema(),
    }
}

/// Emit whole numbers without a fractional part
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}
