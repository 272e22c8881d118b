//! Schema-to-OpenAPI compiler
//!
//! Walks the schema trees attached to registered routes and produces an
//! OpenAPI 3.0.3 document. Named sub-schemas are collected once into
//! `components.schemas` and replaced by `$ref`s everywhere they occur.

use crate::{
    error::{OpenApiError, OpenApiResult},
    routes::{RouteDefinitions, RouteRecord},
    specification::*,
    validation,
};
use covenant_schema::{definition_ref, ObjectRules, Schema, SchemaKind};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::BTreeMap;

static PATH_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/:([a-zA-Z]*)").expect("path parameter regex"));

const JSON_CONTENT: &str = "application/json";

/// Top-level keys owned by the compiler, never taken from base properties
const RESERVED_KEYS: [&str; 6] = ["openapi", "info", "paths", "components", "tags", "security"];

/// Definitions collected during a single compilation.
///
/// A name is inserted at most once. The slot is reserved before the schema
/// is expanded, so self-referencing schemas terminate with a `$ref`.
#[derive(Debug, Default)]
pub struct DefinitionTable {
    schemas: IndexMap<String, Value>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Define `schema` under `name` unless the name is taken
    pub fn define(&mut self, name: &str, schema: &Schema) {
        if self.schemas.contains_key(name) {
            return;
        }
        self.schemas.insert(name.to_string(), Value::Null);
        let expanded = self.inline(schema);
        self.schemas.insert(name.to_string(), expanded);
    }

    /// `$ref` for named schemas (defining them on first sight), projection otherwise
    pub fn reference_or_inline(&mut self, schema: &Schema) -> Value {
        match schema.name() {
            Some(name) => {
                self.define(name, schema);
                definition_ref(name)
            }
            None => self.inline(schema),
        }
    }

    /// Project `schema` itself, promoting its named descendants
    pub fn inline(&mut self, schema: &Schema) -> Value {
        schema.to_json_schema_with(&mut |child: &Schema| self.reference_or_inline(child))
    }

    pub fn into_schemas(self) -> IndexMap<String, Value> {
        self.schemas
    }
}

/// Body descriptor produced for a request payload
#[derive(Debug, Clone, PartialEq)]
pub struct BodyParameter {
    pub name: String,
    pub schema: Value,
}

/// Main OpenAPI document generator
#[derive(Debug, Clone, Default)]
pub struct OpenApiGenerator {
    base: BaseProperties,
}

impl OpenApiGenerator {
    /// Create a generator merging `base` into every document
    pub fn new(base: BaseProperties) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &BaseProperties {
        &self.base
    }

    /// Compile the route table into a fresh document
    pub fn generate(&self, routes: &RouteDefinitions) -> OpenApiDocument {
        compile(routes, &self.base)
    }

    /// Compile and reject documents that fail structural checks
    pub fn generate_validated(&self, routes: &RouteDefinitions) -> OpenApiResult<OpenApiDocument> {
        let document = self.generate(routes);
        let issues = validation::validate(&document);
        if issues.is_empty() {
            Ok(document)
        } else {
            let messages: Vec<String> = issues.iter().map(ToString::to_string).collect();
            Err(OpenApiError::validation_error(messages.join("; ")))
        }
    }
}

/// Compile `routes` into an OpenAPI document.
///
/// Pure: every call starts from an empty definition table, so compiling the
/// same table twice yields equal documents.
pub fn compile(routes: &RouteDefinitions, base: &BaseProperties) -> OpenApiDocument {
    let mut definitions = DefinitionTable::new();
    let mut paths: IndexMap<String, PathItem> = IndexMap::new();
    let mut tags = base.tags.clone();

    for (method, route) in routes.iter() {
        let Some(schema) = &route.schema else {
            continue;
        };
        let swagger_path = to_swagger_path(&route.url);
        let request = schema.request.as_ref();

        let mut parameters = Vec::new();
        if let Some(params) = request.and_then(|r| r.params.as_ref()) {
            parameters.extend(convert_path_params(params));
        }
        if let Some(query) = request.and_then(|r| r.query.as_ref()) {
            parameters.extend(convert_query_params(query, &mut definitions));
        }
        let payload = request
            .and_then(|r| r.body.as_ref())
            .map(|body| convert_payload(body, &mut definitions));
        parameters.extend(auth_parameter(route));

        let responses = schema
            .responses
            .as_ref()
            .map(|responses| convert_responses(responses, &mut definitions))
            .unwrap_or_default();

        let operation = Operation {
            operation_id: route
                .operation_id
                .clone()
                .unwrap_or_else(|| format!("{}/{}", swagger_path, method.as_str())),
            tags: route.tags.clone(),
            summary: route.summary.clone().unwrap_or_default(),
            description: route.description.clone().unwrap_or_default(),
            deprecated: route.deprecated,
            responses,
            parameters,
            request_body: payload.as_ref().map(|body| RequestBody {
                required: true,
                content: json_content(body.schema.clone()),
            }),
            body_name: payload.map(|body| body.name),
            security: route.is_public.then(Vec::new),
        };

        paths
            .entry(swagger_path)
            .or_default()
            .insert(method.as_str().to_string(), operation);

        for tag in &route.tags {
            if !tags.iter().any(|existing| &existing.name == tag) {
                tags.push(Tag::new(tag.clone()));
            }
        }
    }

    let mut extra = base.extra.clone();
    for key in RESERVED_KEYS {
        extra.remove(key);
    }

    let document = OpenApiDocument {
        openapi: OPENAPI_VERSION.to_string(),
        info: base.info.clone(),
        paths,
        components: Components {
            schemas: definitions.into_schemas(),
            security_schemes: base
                .security_definitions
                .clone()
                .unwrap_or_else(default_security_schemes),
        },
        tags,
        security: base.security.clone().unwrap_or_else(default_security),
        extra,
    };

    tracing::debug!(
        "Compiled OpenAPI document: {} paths, {} schemas",
        document.paths.len(),
        document.components.schemas.len()
    );

    document
}

/// `/users/:id` -> `/users/{id}`
pub fn to_swagger_path(url: &str) -> String {
    PATH_PARAM.replace_all(url, "/{$1}").into_owned()
}

/// Path parameters: always required and fully inlined
pub fn convert_path_params(schema: &Schema) -> Vec<Parameter> {
    let Some(rules) = object_rules(schema) else {
        return Vec::new();
    };
    rules
        .properties
        .iter()
        .map(|(name, property)| Parameter {
            name: name.clone(),
            location: ParameterLocation::Path,
            required: true,
            description: property.description().map(str::to_string),
            schema: without_description(property.to_json_schema()),
        })
        .collect()
}

/// Query parameters with named sub-schemas promoted to definitions
pub fn convert_query_params(schema: &Schema, definitions: &mut DefinitionTable) -> Vec<Parameter> {
    if let Some(name) = schema.name() {
        definitions.define(name, schema);
    }
    let Some(rules) = object_rules(schema) else {
        return Vec::new();
    };
    let required = rules.required();
    rules
        .properties
        .iter()
        .map(|(name, property)| Parameter {
            name: name.clone(),
            location: ParameterLocation::Query,
            required: required.contains(&name.as_str()),
            description: property.description().map(str::to_string),
            schema: without_description(definitions.reference_or_inline(property)),
        })
        .collect()
}

/// The single body descriptor of a route
pub fn convert_payload(schema: &Schema, definitions: &mut DefinitionTable) -> BodyParameter {
    BodyParameter {
        name: schema.name().unwrap_or("payload").to_string(),
        schema: definitions.reference_or_inline(schema),
    }
}

/// Response objects keyed by status code
pub fn convert_responses(
    responses: &BTreeMap<u16, Schema>,
    definitions: &mut DefinitionTable,
) -> IndexMap<String, ResponseObject> {
    responses
        .iter()
        .map(|(status, schema)| {
            let response = ResponseObject {
                description: format!("{} response", status),
                content: json_content(definitions.reference_or_inline(schema)),
            };
            (status.to_string(), response)
        })
        .collect()
}

fn auth_parameter(route: &RouteRecord) -> Option<Parameter> {
    (!route.is_public).then(|| Parameter {
        name: "Cookie".to_string(),
        location: ParameterLocation::Header,
        required: true,
        description: Some("Cookie".to_string()),
        schema: json!({ "type": "string", "default": "access_token={{token}}" }),
    })
}

fn default_security_schemes() -> Value {
    json!({
        "bearerAuth": {
            "type": "http",
            "name": "Authorization",
            "in": "header",
            "scheme": "bearer",
            "bearerFormat": "JWT"
        },
        "cookieBased": {
            "type": "apiKey",
            "name": "Cookie",
            "in": "header",
            "description": "Cookie"
        }
    })
}

fn default_security() -> Vec<Value> {
    vec![json!({ "bearerAuth": [] }), json!({ "cookieBased": [] })]
}

fn json_content(schema: Value) -> IndexMap<String, MediaType> {
    let mut content = IndexMap::new();
    content.insert(JSON_CONTENT.to_string(), MediaType { schema });
    content
}

fn object_rules(schema: &Schema) -> Option<ObjectRules> {
    match schema.kind() {
        SchemaKind::Object(rules) => Some(rules.clone()),
        SchemaKind::Lazy(lazy) => object_rules(&lazy.resolve()),
        _ => None,
    }
}

fn without_description(mut schema: Value) -> Value {
    if let Value::Object(map) = &mut schema {
        map.remove("description");
    }
    schema
}
