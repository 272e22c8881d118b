//! Schema tree and builders

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A node of a validation schema tree.
///
/// Every node may carry a `name`. A named node is promoted to a shared
/// definition when the schema is compiled into an OpenAPI document, so two
/// nodes with the same name must describe the same structure.
#[derive(Debug, Clone)]
pub struct Schema {
    kind: SchemaKind,
    name: Option<String>,
    description: Option<String>,
    optional: bool,
}

/// The closed set of schema node kinds
#[derive(Debug, Clone)]
pub enum SchemaKind {
    String(StringRules),
    Number(NumberRules),
    Integer(NumberRules),
    Boolean(BooleanRules),
    Object(ObjectRules),
    Array(ArrayRules),
    OneOf(Vec<Schema>),
    HashMap(Box<Schema>),
    Enum(EnumRules),
    Lazy(LazySchema),
}

/// Constraints for string nodes
#[derive(Debug, Clone, Default)]
pub struct StringRules {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub format: Option<StringFormat>,
    pub pattern: Option<Regex>,
}

/// Well-known string formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringFormat {
    Uuid,
    Iso8601,
    Url,
    /// Documentation-only format, not checked when matching
    Custom(String),
}

impl StringFormat {
    /// Format name as written in JSON-Schema
    pub fn as_str(&self) -> &str {
        match self {
            StringFormat::Uuid => "uuid",
            StringFormat::Iso8601 => "ISO8601",
            StringFormat::Url => "url",
            StringFormat::Custom(name) => name,
        }
    }
}

/// Constraints for number and integer nodes
#[derive(Debug, Clone, Default)]
pub struct NumberRules {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// Accept numeric strings (path and query values arrive as strings)
    pub parse: bool,
}

/// Constraints for boolean nodes
#[derive(Debug, Clone, Default)]
pub struct BooleanRules {
    /// Accept `"true"` / `"false"` strings
    pub parse: bool,
}

/// Object node: ordered named properties
#[derive(Debug, Clone, Default)]
pub struct ObjectRules {
    pub properties: IndexMap<String, Schema>,
    /// Reject properties that are not declared
    pub strict: bool,
}

impl ObjectRules {
    /// Names of the properties that must be present, in declaration order
    pub fn required(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|(_, schema)| !schema.is_optional())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Array node
#[derive(Debug, Clone)]
pub struct ArrayRules {
    pub items: Box<Schema>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

/// Enumeration of literal values
#[derive(Debug, Clone, Default)]
pub struct EnumRules {
    pub values: Vec<Value>,
    /// Optional JSON-Schema `type` emitted next to `enum`
    pub value_type: Option<String>,
}

impl EnumRules {
    /// Comma separated list of the allowed values
    pub fn describe_values(&self) -> String {
        self.values
            .iter()
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Deferred schema used to build self-referencing structures.
///
/// The node is always named, so compilation emits a reference instead of
/// expanding it a second time.
#[derive(Clone)]
pub struct LazySchema {
    resolve: Arc<dyn Fn() -> Schema + Send + Sync>,
}

impl LazySchema {
    /// Build the schema this node stands for
    pub fn resolve(&self) -> Schema {
        (self.resolve)()
    }
}

impl fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazySchema")
    }
}

impl Schema {
    /// Create a node of the given kind
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            name: None,
            description: None,
            optional: false,
        }
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Promote this node to a shared definition under `name`
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a human readable description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Allow the value to be missing (or null) inside its parent object
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Lower bound: string length, numeric minimum or array length
    pub fn min(mut self, min: impl Into<f64>) -> Self {
        let min = min.into();
        match &mut self.kind {
            SchemaKind::String(rules) => rules.min_length = Some(min as usize),
            SchemaKind::Number(rules) | SchemaKind::Integer(rules) => rules.minimum = Some(min),
            SchemaKind::Array(rules) => rules.min_items = Some(min as usize),
            _ => {}
        }
        self
    }

    /// Upper bound: string length, numeric maximum or array length
    pub fn max(mut self, max: impl Into<f64>) -> Self {
        let max = max.into();
        match &mut self.kind {
            SchemaKind::String(rules) => rules.max_length = Some(max as usize),
            SchemaKind::Number(rules) | SchemaKind::Integer(rules) => rules.maximum = Some(max),
            SchemaKind::Array(rules) => rules.max_items = Some(max as usize),
            _ => {}
        }
        self
    }

    /// Accept string encodings of numbers and booleans
    pub fn parse(mut self) -> Self {
        match &mut self.kind {
            SchemaKind::Number(rules) | SchemaKind::Integer(rules) => rules.parse = true,
            SchemaKind::Boolean(rules) => rules.parse = true,
            _ => {}
        }
        self
    }

    /// Require strings to match a regular expression
    pub fn pattern(mut self, pattern: Regex) -> Self {
        if let SchemaKind::String(rules) = &mut self.kind {
            rules.pattern = Some(pattern);
        }
        self
    }

    /// Set the string format
    pub fn format(mut self, format: StringFormat) -> Self {
        if let SchemaKind::String(rules) = &mut self.kind {
            rules.format = Some(format);
        }
        self
    }

    /// Reject undeclared properties on object nodes
    pub fn strict(mut self) -> Self {
        if let SchemaKind::Object(rules) = &mut self.kind {
            rules.strict = true;
        }
        self
    }
}

pub fn string() -> Schema {
    Schema::new(SchemaKind::String(StringRules::default()))
}

pub fn uuid() -> Schema {
    string().format(StringFormat::Uuid)
}

pub fn iso_date() -> Schema {
    string().format(StringFormat::Iso8601)
}

pub fn url() -> Schema {
    string().format(StringFormat::Url)
}

pub fn number() -> Schema {
    Schema::new(SchemaKind::Number(NumberRules::default()))
}

pub fn integer() -> Schema {
    Schema::new(SchemaKind::Integer(NumberRules::default()))
}

pub fn boolean() -> Schema {
    Schema::new(SchemaKind::Boolean(BooleanRules::default()))
}

/// Object accepting extra, undeclared properties
pub fn object<K, I>(properties: I) -> Schema
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Schema)>,
{
    Schema::new(SchemaKind::Object(ObjectRules {
        properties: properties
            .into_iter()
            .map(|(name, schema)| (name.into(), schema))
            .collect(),
        strict: false,
    }))
}

/// Object rejecting undeclared properties
pub fn object_with_only<K, I>(properties: I) -> Schema
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Schema)>,
{
    object(properties).strict()
}

pub fn array(items: Schema) -> Schema {
    Schema::new(SchemaKind::Array(ArrayRules {
        items: Box::new(items),
        min_items: None,
        max_items: None,
    }))
}

pub fn one_of(alternatives: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::new(SchemaKind::OneOf(alternatives.into_iter().collect()))
}

/// Object with arbitrary keys whose values all match `values`
pub fn hashmap(values: Schema) -> Schema {
    Schema::new(SchemaKind::HashMap(Box::new(values)))
}

/// Untyped enumeration of literal values
pub fn enumeration<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Schema {
    Schema::new(SchemaKind::Enum(EnumRules {
        values: values.into_iter().map(Into::into).collect(),
        value_type: None,
    }))
}

/// Enumeration of strings, documented with `type: string`
pub fn string_enum<V: Into<String>>(values: impl IntoIterator<Item = V>) -> Schema {
    Schema::new(SchemaKind::Enum(EnumRules {
        values: values.into_iter().map(|v| Value::String(v.into())).collect(),
        value_type: Some("string".to_string()),
    }))
}

/// Name a schema so it is shared through the definitions table
pub fn named(name: impl Into<String>, schema: Schema) -> Schema {
    schema.named(name)
}

/// Named, deferred schema for recursive structures
///
/// ```
/// use covenant_schema::{array, lazy, object, string, Schema};
///
/// fn category() -> Schema {
///     object([
///         ("label", string()),
///         ("children", array(lazy("category", category))),
///     ])
///     .named("category")
/// }
///
/// let schema = category();
/// assert_eq!(schema.name(), Some("category"));
/// ```
pub fn lazy<F>(name: impl Into<String>, resolve: F) -> Schema
where
    F: Fn() -> Schema + Send + Sync + 'static,
{
    Schema::new(SchemaKind::Lazy(LazySchema {
        resolve: Arc::new(resolve),
    }))
    .named(name)
}
