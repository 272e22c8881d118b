//! Request validation middleware
//!
//! Matches path parameters, query parameters and the body against the route's
//! [`RequestSchema`]. A mismatch fails the request with `InvalidRequest`, or
//! only logs a warning when the route asks for it.

use super::{Middleware, Next, NextFuture};
use crate::errors::ApiError;
use crate::request::ContractRequest;
use covenant_openapi::RequestSchema;
use covenant_schema::{issues_to_json, Schema, ValidationIssue};
use serde_json::Value;
use std::sync::Arc;

/// Which part of the request a schema applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestPart {
    Params,
    Query,
    Body,
}

impl RequestPart {
    fn label(&self) -> &'static str {
        match self {
            RequestPart::Params => "url path parameters",
            RequestPart::Query => "url query parameters",
            RequestPart::Body => "payload",
        }
    }

    fn value<'a>(&self, request: &'a mut ContractRequest) -> &'a mut Value {
        match self {
            RequestPart::Params => &mut request.params,
            RequestPart::Query => &mut request.query,
            RequestPart::Body => &mut request.body,
        }
    }
}

/// Validates requests against a request schema
#[derive(Clone)]
pub struct RequestValidator {
    schema: Arc<RequestSchema>,
    warn_only: bool,
    coerce: bool,
}

impl RequestValidator {
    pub fn new(schema: Arc<RequestSchema>) -> Self {
        Self {
            schema,
            warn_only: false,
            coerce: false,
        }
    }

    /// Log mismatches as warnings instead of failing the request
    pub fn warn_only(mut self, warn_only: bool) -> Self {
        self.warn_only = warn_only;
        self
    }

    /// Replace string-typed params and query values with their coerced form
    pub fn coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
    }

    fn parts(&self) -> [(RequestPart, Option<&Schema>); 3] {
        [
            (RequestPart::Params, self.schema.params.as_ref()),
            (RequestPart::Query, self.schema.query.as_ref()),
            (RequestPart::Body, self.schema.body.as_ref()),
        ]
    }

    fn validate(&self, request: &mut ContractRequest) -> Result<(), ApiError> {
        let mut failure: Option<(RequestPart, Vec<ValidationIssue>)> = None;

        for (part, schema) in self.parts() {
            let Some(schema) = schema else {
                continue;
            };

            let issues = schema.validate(part.value(request));
            if issues.is_empty() {
                if self.coerce && part != RequestPart::Body {
                    coerce_part(part, schema, request);
                }
                continue;
            }

            let details = issues_to_json(&issues);
            if self.warn_only {
                tracing::warn!("[VALIDATION WARNING] Invalid {}: {}", part.label(), details);
            } else {
                tracing::error!("Invalid {}: {}", part.label(), details);
                if failure.is_none() {
                    failure = Some((part, issues));
                }
            }
        }

        match failure {
            Some((part, issues)) => Err(ApiError::invalid_request(format!("Invalid {}", part.label()))
                .with_errors(issues.iter().map(ValidationIssue::to_json))),
            None => Ok(()),
        }
    }
}

fn coerce_part(part: RequestPart, schema: &Schema, request: &mut ContractRequest) {
    if !schema.supports_coercion() {
        tracing::warn!(
            "Schema for {} does not support coercion, leaving values untouched",
            part.label()
        );
        return;
    }
    let value = part.value(request);
    *value = schema.coerce(value);
}

impl Middleware for RequestValidator {
    fn handle(&self, mut request: ContractRequest, next: Next) -> NextFuture<'static> {
        let validated = self.validate(&mut request);
        Box::pin(async move {
            validated?;
            next.run(request).await
        })
    }

    fn name(&self) -> &str {
        "RequestValidator"
    }
}
