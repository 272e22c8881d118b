//! Body parsing middleware
//!
//! JSON bodies are parsed into [`ContractRequest::body`], `text/*` bodies
//! become a JSON string. Other media types are left for the handlers to read
//! from the raw bytes.

use super::{Middleware, Next, NextFuture};
use crate::errors::ApiError;
use crate::request::ContractRequest;
use serde_json::Value;

/// Default body limit, 100kb
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;

/// Options of the body parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonOptions {
    /// Maximum body size in bytes
    pub limit: usize,
    /// Only accept objects and arrays at the top level of JSON bodies
    pub strict: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_BODY_LIMIT,
            strict: true,
        }
    }
}

impl JsonOptions {
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Parses request bodies according to their content type
#[derive(Debug, Clone, Default)]
pub struct BodyParser {
    options: JsonOptions,
}

impl BodyParser {
    pub fn new(options: JsonOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> JsonOptions {
        self.options
    }

    fn parse(&self, request: &mut ContractRequest) -> Result<(), ApiError> {
        if let Some(error) = request.body_error.take() {
            return Err(error);
        }
        if request.raw_body.len() > self.options.limit {
            return Err(ApiError::payload_too_large("request entity too large"));
        }
        if request.raw_body.is_empty() {
            return Ok(());
        }

        let content_type = request.content_type().map(str::to_ascii_lowercase);
        match content_type.as_deref() {
            Some(media) if is_json(media) => {
                let body: Value = serde_json::from_slice(&request.raw_body).map_err(|e| {
                    ApiError::invalid_request("Invalid JSON payload").with_errors([Value::String(e.to_string())])
                })?;
                if self.options.strict && !(body.is_object() || body.is_array()) {
                    return Err(ApiError::invalid_request(
                        "Invalid JSON payload: only objects and arrays are accepted",
                    ));
                }
                request.body = body;
            }
            Some(media) if media.starts_with("text/") => {
                request.body = Value::String(String::from_utf8_lossy(&request.raw_body).into_owned());
            }
            _ => {}
        }
        Ok(())
    }
}

fn is_json(media: &str) -> bool {
    media == "application/json" || media.ends_with("+json")
}

impl Middleware for BodyParser {
    fn handle(&self, mut request: ContractRequest, next: Next) -> NextFuture<'static> {
        let parsed = self.parse(&mut request);
        Box::pin(async move {
            parsed?;
            next.run(request).await
        })
    }

    fn name(&self) -> &str {
        "BodyParser"
    }
}
