//! Route definition table consumed by the compiler

use covenant_schema::Schema;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// HTTP methods a contract route can be registered for.
///
/// The declaration order is the iteration order of [`RouteDefinitions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    Options,
    Head,
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
    ];

    /// Lowercase name, as used for OpenAPI operation keys
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unsupported HTTP method: {}", s))
    }
}

/// Schemas describing the request parts of a route
#[derive(Debug, Clone, Default)]
pub struct RequestSchema {
    pub params: Option<Schema>,
    pub query: Option<Schema>,
    pub body: Option<Schema>,
}

impl RequestSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path parameter schema
    pub fn params(mut self, schema: Schema) -> Self {
        self.params = Some(schema);
        self
    }

    /// Set the query string schema
    pub fn query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    /// Set the JSON body schema
    pub fn body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_none() && self.query.is_none() && self.body.is_none()
    }
}

/// Request and response contract of a single route
#[derive(Debug, Clone, Default)]
pub struct RouteSchema {
    pub request: Option<RequestSchema>,
    pub responses: Option<BTreeMap<u16, Schema>>,
}

impl RouteSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request schema
    pub fn request(mut self, request: RequestSchema) -> Self {
        self.request = Some(request);
        self
    }

    /// Declare the body schema for a response status code
    pub fn response(mut self, status: u16, schema: Schema) -> Self {
        self.responses
            .get_or_insert_with(BTreeMap::new)
            .insert(status, schema);
        self
    }
}

/// A registered route, immutable once recorded
#[derive(Debug, Clone)]
pub struct RouteRecord {
    pub url: String,
    pub operation_id: Option<String>,
    pub schema: Option<Arc<RouteSchema>>,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
}

impl RouteRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            operation_id: None,
            schema: None,
            is_public: false,
            tags: Vec::new(),
            summary: None,
            description: None,
            deprecated: false,
        }
    }
}

/// method -> (url pattern -> record), at most one record per pair
#[derive(Debug, Clone, Default)]
pub struct RouteDefinitions {
    routes: BTreeMap<HttpMethod, IndexMap<String, RouteRecord>>,
}

impl RouteDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, method: HttpMethod, url: &str) -> bool {
        self.routes
            .get(&method)
            .map_or(false, |urls| urls.contains_key(url))
    }

    pub fn get(&self, method: HttpMethod, url: &str) -> Option<&RouteRecord> {
        self.routes.get(&method).and_then(|urls| urls.get(url))
    }

    /// Record a route, handing the record back if the pair is taken
    pub fn try_insert(&mut self, method: HttpMethod, record: RouteRecord) -> Result<(), RouteRecord> {
        if self.contains(method, &record.url) {
            return Err(record);
        }
        self.routes
            .entry(method)
            .or_default()
            .insert(record.url.clone(), record);
        Ok(())
    }

    /// Records in method order, then registration order
    pub fn iter(&self) -> impl Iterator<Item = (HttpMethod, &RouteRecord)> {
        self.routes
            .iter()
            .flat_map(|(method, urls)| urls.values().map(move |record| (*method, record)))
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
