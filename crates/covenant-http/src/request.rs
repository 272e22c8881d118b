//! Request abstraction seen by middlewares and handlers
//!
//! Path parameters, query parameters and the body are kept as JSON values so
//! validators can check and coerce them in place.

use crate::errors::ApiError;
use axum::body::Bytes;
use axum::http::{header, Extensions, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Request flowing through a route pipeline
#[derive(Debug)]
pub struct ContractRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Path parameters as an object of strings
    pub params: Value,
    /// Query parameters; repeated keys become arrays
    pub query: Value,
    /// Parsed body, `Null` until a body parser ran
    pub body: Value,
    pub raw_body: Bytes,
    pub extensions: Extensions,
    pub(crate) body_error: Option<ApiError>,
}

impl ContractRequest {
    /// Create a request, parsing the query string from `uri`
    pub fn new(method: Method, uri: Uri) -> Self {
        let query = uri.query().map(parse_query).unwrap_or_else(|| Value::Object(Map::new()));
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            params: Value::Object(Map::new()),
            query,
            body: Value::Null,
            raw_body: Bytes::new(),
            extensions: Extensions::new(),
            body_error: None,
        }
    }

    /// Set path parameters
    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = Value::Object(
            params
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
        );
        self
    }

    /// Add a header, ignoring invalid names or values
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set the raw body
    pub fn with_raw_body(mut self, body: impl Into<Bytes>) -> Self {
        self.raw_body = body.into();
        self
    }

    /// Set a JSON body, both raw and parsed
    pub fn with_json_body(mut self, body: Value) -> Self {
        self.raw_body = Bytes::from(body.to_string());
        self.body = body;
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self
    }

    /// Request path without the query string
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Path and query as received
    pub fn original_url(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    /// Get a header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Media type of the body, without parameters
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
            .and_then(|value| value.split(';').next())
            .map(str::trim)
    }

    /// Get a path parameter
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Cookies sent with the request
    pub fn cookies(&self) -> HashMap<String, String> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect()
    }

    /// Deserialize the body
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| ApiError::invalid_request(format!("Invalid payload: {}", e)))
    }

    /// Deserialize the path parameters
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.params.clone())
            .map_err(|e| ApiError::invalid_request(format!("Invalid url path parameters: {}", e)))
    }

    /// Deserialize the query parameters
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.query.clone())
            .map_err(|e| ApiError::invalid_request(format!("Invalid url query parameters: {}", e)))
    }

    /// Copy of the parts needed to describe this request in an error report
    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot {
            method: self.method.clone(),
            uri: self.uri.clone(),
            headers: self.headers.clone(),
            raw_body: self.raw_body.clone(),
        }
    }
}

/// Request details kept aside for error reporting
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub raw_body: Bytes,
}

impl RequestSnapshot {
    /// Describe the request as JSON
    pub fn to_json(&self) -> Value {
        let headers: Map<String, Value> = self
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), Value::String(v.to_string())))
            })
            .collect();

        let data = serde_json::from_slice::<Value>(&self.raw_body).unwrap_or_else(|_| {
            if self.raw_body.is_empty() {
                Value::Null
            } else {
                Value::String(String::from_utf8_lossy(&self.raw_body).into_owned())
            }
        });

        serde_json::json!({
            "method": self.method.as_str(),
            "url": self.uri.to_string(),
            "query_string": self.uri.query().unwrap_or(""),
            "headers": headers,
            "data": data,
        })
    }
}

/// Parse a query string into an object, turning repeated keys into arrays
pub fn parse_query(query: &str) -> Value {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_else(|e| {
        tracing::debug!("Ignoring malformed query string {:?}: {}", query, e);
        Vec::new()
    });

    let mut map = Map::new();
    for (key, value) in pairs {
        match map.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                map.insert(key, Value::String(value));
            }
        }
    }
    Value::Object(map)
}
