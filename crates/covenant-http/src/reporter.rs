//! Exception reporting
//!
//! Server errors are handed to an [`ExceptionSink`] once the request details
//! attached to them are sanitized. Reporting is explicit: a router reports
//! only when its config carries an active [`ErrorReporter`]. The sanitize keys
//! and the environment are read from the router's final config when the
//! error handler is installed, not when the reporter is built.

use crate::config::AppEnv;
use crate::errors::{ApiError, ErrorKind};
use crate::request::RequestSnapshot;
use crate::sanitizer::{sanitize, SanitizeKey};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// One reported failure
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub kind: ErrorKind,
    pub message: String,
    pub stack: String,
    pub ref_code: Option<String>,
    pub environment: AppEnv,
    /// Sanitized request details
    pub request: Option<Value>,
}

/// Destination of reported failures
pub trait ExceptionSink: Send + Sync {
    fn capture(&self, event: ErrorEvent);
}

/// Sink writing events to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ExceptionSink for TracingSink {
    fn capture(&self, event: ErrorEvent) {
        tracing::error!(
            kind = event.kind.name(),
            environment = %event.environment,
            ref_code = event.ref_code.as_deref().unwrap_or(""),
            request = %event.request.unwrap_or(serde_json::Value::Null),
            "Reported exception: {}",
            event.message
        );
    }
}

/// An initialized reporter
#[derive(Clone)]
pub struct ReporterHandle {
    sink: Arc<dyn ExceptionSink>,
}

/// Reporting state owned by the router config
#[derive(Clone, Default)]
pub enum ErrorReporter {
    Active(ReporterHandle),
    #[default]
    Inactive,
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorReporter::Active(_) => f.write_str("Active"),
            ErrorReporter::Inactive => f.write_str("Inactive"),
        }
    }
}

impl ErrorReporter {
    /// Build a reporter around `sink`. No sink means inactive.
    pub fn initialize(sink: Option<Arc<dyn ExceptionSink>>) -> Self {
        match sink {
            Some(sink) => {
                tracing::info!("Error reporting enabled");
                ErrorReporter::Active(ReporterHandle { sink })
            }
            None => ErrorReporter::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ErrorReporter::Active(_))
    }

    /// Report `error` if it is a server failure and reporting is active.
    /// Request details are masked with `sanitize_keys` before the sink sees them.
    pub fn report(
        &self,
        error: &ApiError,
        request: Option<&RequestSnapshot>,
        sanitize_keys: &[SanitizeKey],
        environment: AppEnv,
    ) {
        let ErrorReporter::Active(handle) = self else {
            return;
        };
        if !error.kind.is_reportable() {
            return;
        }

        let request = request.map(|snapshot| sanitized_request(snapshot, sanitize_keys));
        handle.sink.capture(ErrorEvent {
            kind: error.kind,
            message: error.message.clone(),
            stack: error.stack.clone(),
            ref_code: error.ref_code.clone(),
            environment,
            request,
        });
    }
}

fn sanitized_request(snapshot: &RequestSnapshot, keys: &[SanitizeKey]) -> Value {
    let mut request = snapshot.to_json();
    let cookies: serde_json::Map<String, Value> = snapshot
        .headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            Some((name.trim().to_string(), json!(value.trim())))
        })
        .collect();
    request["cookies"] = Value::Object(cookies);

    for part in ["cookies", "headers", "data"] {
        if let Some(value) = request.get_mut(part) {
            sanitize(value, keys);
        }
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ContractRequest;
    use axum::http::Method;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ErrorEvent>>,
    }

    impl ExceptionSink for RecordingSink {
        fn capture(&self, event: ErrorEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn snapshot() -> RequestSnapshot {
        ContractRequest::new(Method::POST, "/login".parse().unwrap())
            .with_header("authorization", "Bearer token123")
            .with_header("cookie", "session=abc; theme=dark")
            .with_json_body(json!({ "user": "jane", "password": "hunter2" }))
            .snapshot()
    }

    #[test]
    fn test_inactive_without_sink() {
        let reporter = ErrorReporter::initialize(None);
        assert!(!reporter.is_active());
        reporter.report(&ApiError::server_error("boom"), None, &[], AppEnv::Test);
    }

    #[test]
    fn test_reports_server_errors_sanitized() {
        let sink = Arc::new(RecordingSink::default());
        let keys: Vec<SanitizeKey> = vec!["password".into(), "authorization".into(), "session".into()];
        let reporter = ErrorReporter::initialize(Some(sink.clone() as Arc<dyn ExceptionSink>));

        reporter.report(
            &ApiError::server_error("boom").with_ref_code("R1"),
            Some(&snapshot()),
            &keys,
            AppEnv::Staging,
        );

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.message, "boom");
        assert_eq!(event.environment, AppEnv::Staging);
        assert_eq!(event.ref_code.as_deref(), Some("R1"));

        let request = event.request.as_ref().unwrap();
        assert_eq!(request["data"], json!({ "user": "jane", "password": "********" }));
        assert_eq!(request["headers"]["authorization"], json!("********"));
        assert_eq!(request["cookies"], json!({ "session": "********", "theme": "dark" }));
    }

    #[test]
    fn test_client_errors_are_not_reported() {
        let sink = Arc::new(RecordingSink::default());
        let reporter = ErrorReporter::initialize(Some(sink.clone() as Arc<dyn ExceptionSink>));

        for error in [
            ApiError::invalid_request("bad"),
            ApiError::not_found("gone"),
            ApiError::unexpected("oops"),
        ] {
            reporter.report(&error, None, &[], AppEnv::Production);
        }

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ErrorKind::Unexpected);
    }
}
