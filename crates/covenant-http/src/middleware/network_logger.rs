//! Request/response logging middleware

use super::{Middleware, Next, NextFuture};
use crate::config::CorrelationIdExtractor;
use crate::request::ContractRequest;
use uuid::Uuid;

/// Correlation id of the current request, stored in the request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

/// Logs one line per request and one per response, tagged with a correlation id
#[derive(Clone, Default)]
pub struct NetworkLogger {
    correlation_id_extractor: Option<CorrelationIdExtractor>,
    log_responses: bool,
}

impl NetworkLogger {
    pub fn new(correlation_id_extractor: Option<CorrelationIdExtractor>, log_responses: bool) -> Self {
        Self {
            correlation_id_extractor,
            log_responses,
        }
    }

    fn correlation_id(&self, request: &ContractRequest) -> String {
        match &self.correlation_id_extractor {
            Some(extract) => extract(request),
            None => Uuid::new_v4().to_string(),
        }
    }
}

impl Middleware for NetworkLogger {
    fn handle(&self, mut request: ContractRequest, next: Next) -> NextFuture<'static> {
        let id = self.correlation_id(&request);
        let body = if request.body.is_null() {
            String::new()
        } else {
            request.body.to_string()
        };
        tracing::info!(
            "request: ({}) {} {} {}",
            id,
            request.method,
            request.original_url(),
            body
        );
        request.extensions.insert(CorrelationId(id.clone()));

        let log_responses = self.log_responses;
        Box::pin(async move {
            let result = next.run(request).await;
            let (status, body) = match &result {
                Ok(response) => (response.status, response.body_for_log()),
                Err(error) => (error.status_code(), error.response_json().to_string()),
            };
            if log_responses {
                tracing::info!("response: ({}) {}: {}", id, status.as_u16(), body);
            } else {
                tracing::info!("response: ({}) {}", id, status.as_u16());
            }
            result
        })
    }

    fn name(&self) -> &str {
        "NetworkLogger"
    }
}
