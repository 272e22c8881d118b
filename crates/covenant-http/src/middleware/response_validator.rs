//! Response validation middleware
//!
//! Wraps the rest of the chain and checks JSON bodies against the schema
//! declared for their status code. Statuses without a schema pass unchecked.

use super::{Middleware, Next, NextFuture};
use crate::errors::ApiError;
use crate::request::ContractRequest;
use covenant_schema::{Schema, ValidationIssue};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Message of the failure raised when a response does not match its schema
pub const RESPONSE_MISMATCH: &str = "Response body does not match the specified schema";

/// Validates handler responses against declared response schemas
#[derive(Clone)]
pub struct ResponseValidator {
    responses: Arc<BTreeMap<u16, Schema>>,
}

impl ResponseValidator {
    pub fn new(responses: Arc<BTreeMap<u16, Schema>>) -> Self {
        Self { responses }
    }
}

impl Middleware for ResponseValidator {
    fn handle(&self, request: ContractRequest, next: Next) -> NextFuture<'static> {
        let responses = self.responses.clone();
        Box::pin(async move {
            let response = next.run(request).await?;

            let schema = responses.get(&response.status.as_u16());
            if let (Some(schema), Some(body)) = (schema, response.json_body()) {
                let issues = schema.validate(body);
                if !issues.is_empty() {
                    tracing::error!(
                        "Response with status {} does not match its schema",
                        response.status.as_u16()
                    );
                    return Err(ApiError::server_error(RESPONSE_MISMATCH)
                        .with_errors(issues.iter().map(ValidationIssue::to_json)));
                }
            }
            Ok(response)
        })
    }

    fn name(&self) -> &str {
        "ResponseValidator"
    }
}
