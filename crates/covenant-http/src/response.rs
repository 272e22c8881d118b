//! Response abstraction produced by handlers
//!
//! The body stays inspectable until the response leaves the router, so the
//! response validator and the network logger can read it.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

/// Response body variants
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Text(String),
    Html(String),
}

/// Response flowing back through a route pipeline
#[derive(Debug, Clone)]
pub struct ContractResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl ContractResponse {
    fn with_body(body: ResponseBody) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// JSON response with status 200
    pub fn json(body: Value) -> Self {
        Self::with_body(ResponseBody::Json(body))
    }

    /// Serialize `data` into a JSON response with status 200
    pub fn json_from<T: Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::json(serde_json::to_value(data)?))
    }

    /// JSON response with status 201
    pub fn created(body: Value) -> Self {
        Self::json(body).with_status(StatusCode::CREATED)
    }

    /// Plain text response with status 200
    pub fn text(body: impl Into<String>) -> Self {
        Self::with_body(ResponseBody::Text(body.into()))
    }

    /// HTML response with status 200
    pub fn html(body: impl Into<String>) -> Self {
        Self::with_body(ResponseBody::Html(body.into()))
    }

    /// Empty response with status 204
    pub fn no_content() -> Self {
        Self::with_body(ResponseBody::Empty).with_status(StatusCode::NO_CONTENT)
    }

    /// Set the status code
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add a header, ignoring invalid names or values
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.insert(name, value);
        }
        self
    }

    /// The JSON body, if this is a JSON response
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Body rendered for log lines
    pub fn body_for_log(&self) -> String {
        match &self.body {
            ResponseBody::Empty => String::new(),
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) | ResponseBody::Html(text) => text.clone(),
        }
    }
}

impl IntoResponse for ContractResponse {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            ResponseBody::Empty => ().into_response(),
            ResponseBody::Json(value) => Json(value).into_response(),
            ResponseBody::Text(text) => text.into_response(),
            ResponseBody::Html(html) => Html(html).into_response(),
        };
        *response.status_mut() = self.status;
        for (name, value) in self.headers.iter() {
            if name == header::CONTENT_LENGTH {
                continue;
            }
            response.headers_mut().insert(name.clone(), value.clone());
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builders() {
        let response = ContractResponse::created(json!({ "id": 1 })).header("x-request-id", "abc");
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.json_body(), Some(&json!({ "id": 1 })));
        assert_eq!(response.headers.get("x-request-id").unwrap(), "abc");
        assert_eq!(response.body_for_log(), r#"{"id":1}"#);

        assert_eq!(ContractResponse::no_content().status, StatusCode::NO_CONTENT);
        assert_eq!(ContractResponse::text("hi").json_body(), None);
    }

    #[test]
    fn test_into_response() {
        let response = ContractResponse::json(json!({ "ok": true }))
            .with_status(StatusCode::ACCEPTED)
            .header("cache-control", "no-store")
            .into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
