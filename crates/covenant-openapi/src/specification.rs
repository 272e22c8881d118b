use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OpenAPI version emitted by the compiler
pub const OPENAPI_VERSION: &str = "3.0.3";

/// Compiled OpenAPI 3.0.3 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI specification version
    pub openapi: String,

    /// API metadata
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub info: Option<ApiInfo>,

    /// API paths and operations
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    /// Shared schemas and security schemes
    #[serde(default)]
    pub components: Components,

    /// Tags for grouping operations
    #[serde(default)]
    pub tags: Vec<Tag>,

    /// Global security requirements
    #[serde(default)]
    pub security: Vec<Value>,

    /// Extra base properties carried over verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OpenApiDocument {
    /// Operation registered for `path` (OpenAPI form) and lowercase `method`
    pub fn operation(&self, path: &str, method: &str) -> Option<&Operation> {
        self.paths.get(path).and_then(|item| item.get(method))
    }
}

/// API metadata information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    /// API title
    pub title: String,

    /// API version
    pub version: String,

    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiInfo {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
            extra: Map::new(),
        }
    }
}

/// Operations of one path keyed by lowercase method
pub type PathItem = IndexMap<String, Operation>;

/// HTTP operation (GET, POST, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Unique operation ID
    #[serde(rename = "operationId")]
    pub operation_id: String,

    /// Tags for grouping
    #[serde(default)]
    pub tags: Vec<String>,

    /// Short summary
    #[serde(default)]
    pub summary: String,

    /// Long description
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub deprecated: bool,

    /// Possible responses
    #[serde(default)]
    pub responses: IndexMap<String, ResponseObject>,

    /// Path, query and header parameters
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// JSON request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none", default)]
    pub request_body: Option<RequestBody>,

    /// Name of the body parameter for code generators
    #[serde(
        rename = "x-codegen-request-body-name",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub body_name: Option<String>,

    /// Per-operation security override (`[]` for public routes)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub security: Option<Vec<Value>>,
}

/// Parameter location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// Operation parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub schema: Value,
}

/// Request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: IndexMap<String, MediaType>,
}

/// Media type payload description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Value,
}

/// Response description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseObject {
    pub description: String,
    pub content: IndexMap<String, MediaType>,
}

/// Reusable components
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Value>,

    #[serde(rename = "securitySchemes", default)]
    pub security_schemes: Value,
}

/// Tag for grouping operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            extra: Map::new(),
        }
    }
}

/// Properties merged into every compiled document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseProperties {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub info: Option<ApiInfo>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    /// Replaces the default security schemes
    #[serde(
        rename = "securityDefinitions",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub security_definitions: Option<Value>,

    /// Replaces the default global security requirements
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub security: Option<Vec<Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BaseProperties {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: Some(ApiInfo::new(title, version)),
            ..Self::default()
        }
    }

    /// Add a documented tag
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Set custom security schemes
    pub fn security_definitions(mut self, schemes: Value) -> Self {
        self.security_definitions = Some(schemes);
        self
    }

    /// Set custom global security requirements
    pub fn security(mut self, requirements: Vec<Value>) -> Self {
        self.security = Some(requirements);
        self
    }

    /// Carry an arbitrary top-level property into the document
    pub fn property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_properties_from_json() {
        let base: BaseProperties = serde_json::from_value(json!({
            "info": { "title": "TEST API", "version": "x" },
            "securityDefinitions": { "type": "custom-type" },
            "servers": [{ "url": "https://api.example.com" }]
        }))
        .unwrap();

        assert_eq!(base.info, Some(ApiInfo::new("TEST API", "x")));
        assert_eq!(base.security_definitions, Some(json!({ "type": "custom-type" })));
        assert_eq!(base.extra["servers"][0]["url"], "https://api.example.com");
    }

    #[test]
    fn test_parameter_serialization() {
        let parameter = Parameter {
            name: "page".into(),
            location: ParameterLocation::Query,
            required: true,
            description: None,
            schema: json!({ "type": "integer" }),
        };
        assert_eq!(
            serde_json::to_value(&parameter).unwrap(),
            json!({ "name": "page", "in": "query", "required": true, "schema": { "type": "integer" } })
        );
    }
}
