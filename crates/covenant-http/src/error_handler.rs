//! Terminal error handler
//!
//! Turns a failed chain into the JSON error envelope. Failures that are not
//! HTTP errors become server errors, and server errors are logged and handed
//! to the reporter.

use crate::config::{AppEnv, RouterConfig};
use crate::errors::{ApiError, ErrorKind};
use crate::reporter::ErrorReporter;
use crate::request::RequestSnapshot;
use crate::response::ContractResponse;
use crate::sanitizer::SanitizeKey;

/// Renders failures as JSON error envelopes
#[derive(Debug, Clone, Default)]
pub struct ErrorHandler {
    reporter: ErrorReporter,
    sanitize_keys: Vec<SanitizeKey>,
    app_env: AppEnv,
}

impl ErrorHandler {
    /// Handler reporting through the config's reporter with its sanitize keys
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            reporter: config.error_reporter.clone(),
            sanitize_keys: config.sanitize_keys.clone(),
            app_env: config.app_env,
        }
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Build the response for `error`
    pub fn handle(&self, error: ApiError, request: Option<&RequestSnapshot>) -> ContractResponse {
        match error.kind {
            ErrorKind::Unexpected => {
                tracing::error!(error = ?error.source(), "Unexpected error: {}", error.message);
            }
            ErrorKind::ServerError => {
                tracing::error!("Unexpected error: {}", error.message);
            }
            _ => {}
        }

        let error = error.into_server_error();
        self.reporter.report(&error, request, &self.sanitize_keys, self.app_env);

        ContractResponse::json(error.response_json()).with_status(error.status_code())
    }
}
