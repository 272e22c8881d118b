//! Built-in TypeScript emitter
//!
//! Produces the `paths`, `components` and `operations` interfaces used by
//! typed API clients. Each section is first described as a JSON schema and
//! then rendered by the same schema printer as the user schemas.

use crate::emitter::TypeEmitter;
use crate::error::TypegenResult;
use covenant_openapi::specification::{Operation, Parameter, ParameterLocation};
use covenant_openapi::OpenApiDocument;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

const HEADER: &str = "/**
 * This file was auto-generated by covenant-typegen.
 * Do not make direct changes to the file.
 */
";

static PLAIN_KEY: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^(?:[A-Za-z_$][A-Za-z0-9_$]*|[0-9]+)$").expect("valid key pattern")
});

/// Emits TypeScript interfaces for a compiled document
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptEmitter;

impl TypeScriptEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl TypeEmitter for TypeScriptEmitter {
    fn emit(&self, document: &OpenApiDocument) -> TypegenResult<String> {
        let sections = [
            ("paths", paths_shape(document)),
            ("components", components_shape(document)),
            ("operations", operations_shape(document)),
        ];

        let mut out = String::from(HEADER);
        for (name, section) in sections {
            out.push_str(&format!("\nexport interface {} {}\n", name, render_type(&section, 0)));
        }
        Ok(out)
    }
}

/// Render a JSON schema as a TypeScript type. Nested object members are
/// indented one level below `depth`.
pub fn render_type(schema: &Value, depth: usize) -> String {
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        return reference_type(reference);
    }

    let rendered = if let Some(formatted) = format_type(schema) {
        formatted
    } else if let Some(alternatives) = schema.get("oneOf").and_then(Value::as_array) {
        union(alternatives.iter().map(|alt| render_type(alt, depth)))
    } else if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        union(values.iter().map(Value::to_string))
    } else {
        match schema.get("type") {
            Some(Value::String(ty)) => typed(ty, schema, depth),
            Some(Value::Array(types)) => union(
                types
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|ty| typed(ty, schema, depth)),
            ),
            _ if schema.get("properties").is_some() => object_type(schema, depth),
            _ => "unknown".to_string(),
        }
    };

    if schema.get("nullable").and_then(Value::as_bool) == Some(true) {
        format!("({}) | null", rendered)
    } else {
        rendered
    }
}

/// Custom format mapping, applied before the structural rendering
fn format_type(schema: &Value) -> Option<String> {
    if let Some(Value::Array(types)) = schema.get("type") {
        let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
        if names == ["null", "string"] || names == ["string", "null"] {
            return Some("null | string".to_string());
        }
    }

    let format = schema.get("format")?.as_str()?;
    let mapped = match format {
        "ISO8601" | "uuid" | "url" | "salesforceId" | "time" => "string",
        "dateObject" => "Date",
        "dateObjectOrNull" => "Date | null",
        other => other,
    };
    Some(mapped.to_string())
}

fn typed(ty: &str, schema: &Value, depth: usize) -> String {
    match ty {
        "string" => "string".to_string(),
        "integer" | "number" => "number".to_string(),
        "boolean" => "boolean".to_string(),
        "null" => "null".to_string(),
        "array" => {
            let item = schema
                .get("items")
                .map(|items| render_type(items, depth))
                .unwrap_or_else(|| "unknown".to_string());
            if item.contains(" | ") && !item.starts_with('{') {
                format!("({})[]", item)
            } else {
                format!("{}[]", item)
            }
        }
        "object" => object_type(schema, depth),
        _ => "unknown".to_string(),
    }
}

fn object_type(schema: &Value, depth: usize) -> String {
    let inner = indent(depth + 1);
    let properties = schema.get("properties").and_then(Value::as_object);
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut lines = Vec::new();
    for (name, property) in properties.into_iter().flatten() {
        if let Some(comment) = doc_comment(property, &inner) {
            lines.push(comment);
        }
        let marker = if required.contains(&name.as_str()) { "" } else { "?" };
        lines.push(format!(
            "{}{}{}: {};",
            inner,
            property_key(name),
            marker,
            render_type(property, depth + 1)
        ));
    }

    let has_properties = properties.is_some_and(|p| !p.is_empty());
    match schema.get("additionalProperties") {
        Some(values @ Value::Object(_)) => lines.push(format!(
            "{}[key: string]: {};",
            inner,
            render_type(values, depth + 1)
        )),
        Some(Value::Bool(true)) => lines.push(format!("{}[key: string]: unknown;", inner)),
        None if !has_properties => lines.push(format!("{}[key: string]: unknown;", inner)),
        _ => {}
    }

    if lines.is_empty() {
        return "{}".to_string();
    }
    format!("{{\n{}\n{}}}", lines.join("\n"), indent(depth))
}

/// `#/components/schemas/itemA` -> `components["schemas"]["itemA"]`
fn reference_type(reference: &str) -> String {
    let mut segments = reference
        .trim_start_matches('#')
        .trim_start_matches('/')
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"));

    let mut rendered = segments.next().unwrap_or_default();
    for segment in segments {
        rendered.push_str(&format!("[{}]", quote(&segment)));
    }
    rendered
}

fn union(members: impl Iterator<Item = String>) -> String {
    let mut unique: Vec<String> = Vec::new();
    for member in members {
        if !unique.contains(&member) {
            unique.push(member);
        }
    }
    match unique.len() {
        0 => "never".to_string(),
        _ => unique.join(" | "),
    }
}

fn doc_comment(schema: &Value, indentation: &str) -> Option<String> {
    let mut lines: Vec<String> = schema
        .get("description")
        .and_then(Value::as_str)
        .filter(|description| !description.is_empty())
        .map(|description| description.replace("*/", "*\\/").lines().map(str::to_string).collect())
        .unwrap_or_default();
    if schema.get("deprecated").and_then(Value::as_bool) == Some(true) {
        lines.push("@deprecated".to_string());
    }

    match lines.as_slice() {
        [] => None,
        [single] => Some(format!("{}/** {} */", indentation, single)),
        many => {
            let body: Vec<String> = many
                .iter()
                .map(|line| format!("{} * {}", indentation, line))
                .collect();
            Some(format!("{}/**\n{}\n{} */", indentation, body.join("\n"), indentation))
        }
    }
}

fn property_key(name: &str) -> String {
    if PLAIN_KEY.is_match(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// Closed object whose members are all required
fn shape(properties: Map<String, Value>) -> Value {
    let required: Vec<String> = properties.keys().cloned().collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn operation_reference(operation_id: &str) -> String {
    format!(
        "#/operations/{}",
        operation_id.replace('~', "~0").replace('/', "~1")
    )
}

fn paths_shape(document: &OpenApiDocument) -> Value {
    let paths = document
        .paths
        .iter()
        .map(|(path, item)| {
            let methods = item
                .iter()
                .map(|(method, operation)| {
                    let mut entry = json!({ "$ref": operation_reference(&operation.operation_id) });
                    annotate(&mut entry, operation);
                    (method.clone(), entry)
                })
                .collect();
            (path.clone(), shape(methods))
        })
        .collect();
    shape(paths)
}

fn components_shape(document: &OpenApiDocument) -> Value {
    let schemas = document
        .components
        .schemas
        .iter()
        .map(|(name, schema)| (name.clone(), schema.clone()))
        .collect();
    let mut components = Map::new();
    components.insert("schemas".to_string(), shape(schemas));
    shape(components)
}

fn operations_shape(document: &OpenApiDocument) -> Value {
    let operations = document
        .paths
        .values()
        .flat_map(|item| item.values())
        .map(|operation| {
            let mut entry = operation_shape(operation);
            annotate(&mut entry, operation);
            (operation.operation_id.clone(), entry)
        })
        .collect();
    shape(operations)
}

fn operation_shape(operation: &Operation) -> Value {
    let mut members = Map::new();

    let mut parameters = Map::new();
    for location in [
        ParameterLocation::Path,
        ParameterLocation::Query,
        ParameterLocation::Header,
        ParameterLocation::Cookie,
    ] {
        let group: Vec<&Parameter> = operation
            .parameters
            .iter()
            .filter(|parameter| parameter.location == location)
            .collect();
        if !group.is_empty() {
            parameters.insert(location_name(location).to_string(), parameter_group(&group));
        }
    }
    if !parameters.is_empty() {
        members.insert("parameters".to_string(), shape(parameters));
    }

    if let Some(body) = &operation.request_body {
        let content = body
            .content
            .iter()
            .map(|(media, payload)| (media.clone(), payload.schema.clone()))
            .collect();
        let mut request_body = Map::new();
        request_body.insert("content".to_string(), shape(content));
        members.insert("requestBody".to_string(), shape(request_body));
    }

    let responses = operation
        .responses
        .iter()
        .map(|(status, response)| {
            if response.content.is_empty() {
                return (status.clone(), json!({}));
            }
            let content = response
                .content
                .iter()
                .map(|(media, payload)| (media.clone(), payload.schema.clone()))
                .collect();
            let mut entry = Map::new();
            entry.insert("content".to_string(), shape(content));
            (status.clone(), shape(entry))
        })
        .collect();
    members.insert("responses".to_string(), shape(responses));

    shape(members)
}

fn parameter_group(parameters: &[&Parameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for parameter in parameters {
        let mut schema = parameter.schema.clone();
        if let (Some(description), Some(object)) = (&parameter.description, schema.as_object_mut()) {
            object
                .entry("description")
                .or_insert_with(|| Value::String(description.clone()));
        }
        if parameter.required {
            required.push(parameter.name.clone());
        }
        properties.insert(parameter.name.clone(), schema);
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn location_name(location: ParameterLocation) -> &'static str {
    match location {
        ParameterLocation::Path => "path",
        ParameterLocation::Query => "query",
        ParameterLocation::Header => "header",
        ParameterLocation::Cookie => "cookie",
    }
}

/// Carry the operation summary and deprecation onto its entry
fn annotate(entry: &mut Value, operation: &Operation) {
    let Some(object) = entry.as_object_mut() else {
        return;
    };
    let text = if operation.summary.is_empty() {
        &operation.description
    } else {
        &operation.summary
    };
    if !text.is_empty() {
        object.insert("description".to_string(), json!(text));
    }
    if operation.deprecated {
        object.insert("deprecated".to_string(), json!(true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_custom_formats() {
        assert_eq!(render_type(&json!({ "type": "string", "format": "uuid" }), 0), "string");
        assert_eq!(render_type(&json!({ "type": "string", "format": "ISO8601" }), 0), "string");
        assert_eq!(render_type(&json!({ "type": "string", "format": "dateObject" }), 0), "Date");
        assert_eq!(
            render_type(&json!({ "type": "string", "format": "dateObjectOrNull" }), 0),
            "Date | null"
        );
        assert_eq!(render_type(&json!({ "type": "string", "format": "Money" }), 0), "Money");
        assert_eq!(render_type(&json!({ "type": ["string", "null"] }), 0), "null | string");
    }

    #[test]
    fn test_scalars_and_enums() {
        assert_eq!(render_type(&json!({ "type": "integer" }), 0), "number");
        assert_eq!(render_type(&json!({ "type": "boolean" }), 0), "boolean");
        assert_eq!(
            render_type(&json!({ "type": "string", "enum": ["hi", "hello"] }), 0),
            r#""hi" | "hello""#
        );
        assert_eq!(render_type(&json!({ "enum": [1, 2] }), 0), "1 | 2");
        assert_eq!(render_type(&json!({}), 0), "unknown");
        assert_eq!(render_type(&json!({ "type": "string", "nullable": true }), 0), "(string) | null");
    }

    #[test]
    fn test_arrays() {
        assert_eq!(
            render_type(&json!({ "type": "array", "items": { "type": "string" } }), 0),
            "string[]"
        );
        assert_eq!(
            render_type(
                &json!({ "type": "array", "items": { "oneOf": [{ "type": "string" }, { "type": "number" }] } }),
                0
            ),
            "(string | number)[]"
        );
    }

    #[test]
    fn test_objects() {
        let schema = json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer", "description": "The id" },
                "tags": { "type": "array", "items": { "type": "string" } },
                "content-type": { "type": "string" }
            },
            "required": ["id"],
            "additionalProperties": false
        });
        assert_eq!(
            render_type(&schema, 1),
            "{\n    /** The id */\n    id: number;\n    tags?: string[];\n    \"content-type\"?: string;\n  }"
        );

        assert_eq!(
            render_type(&json!({ "type": "object", "additionalProperties": { "type": "string" } }), 0),
            "{\n  [key: string]: string;\n}"
        );
        assert_eq!(render_type(&json!({ "type": "object" }), 0), "{\n  [key: string]: unknown;\n}");
    }

    #[test]
    fn test_references() {
        assert_eq!(
            render_type(&json!({ "$ref": "#/components/schemas/itemA" }), 0),
            r#"components["schemas"]["itemA"]"#
        );
        assert_eq!(
            reference_type(&operation_reference("/api/things/{id}/get")),
            r#"operations["/api/things/{id}/get"]"#
        );
    }

    #[test]
    fn test_doc_comments() {
        assert_eq!(doc_comment(&json!({}), ""), None);
        assert_eq!(
            doc_comment(&json!({ "description": "Old", "deprecated": true }), "  "),
            Some("  /**\n   * Old\n   * @deprecated\n   */".to_string())
        );
    }
}
