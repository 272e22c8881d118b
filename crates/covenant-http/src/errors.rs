//! HTTP error types
//!
//! [`ApiError`] is what handlers and middlewares fail with. Each error carries
//! its kind (which fixes the status code), a message, a list of details and an
//! optional reference code. [`RouterError`] covers failures while registering
//! routes.

use crate::ContractResponse;
use axum::http::StatusCode;
use covenant_openapi::HttpMethod;
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

/// Result type returned by handlers and middlewares
pub type HandlerResult = Result<ContractResponse, ApiError>;

/// The closed set of error kinds, each bound to one status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    PayloadTooLarge,
    UnprocessableEntity,
    ServerError,
    ServiceUnavailable,
    /// Any failure that is not one of the HTTP kinds above
    Unexpected,
}

impl ErrorKind {
    /// Get the status code for this kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error name used in stack traces and reports
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "InvalidRequestError",
            ErrorKind::Unauthorized => "UnauthorizedError",
            ErrorKind::Forbidden => "ForbiddenError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::PayloadTooLarge => "PayloadTooLargeError",
            ErrorKind::UnprocessableEntity => "UnprocessableEntityError",
            ErrorKind::ServerError => "ServerError",
            ErrorKind::ServiceUnavailable => "ServiceUnavailableError",
            ErrorKind::Unexpected => "Error",
        }
    }

    /// Whether errors of this kind are reported to the exception sink
    pub fn is_reportable(&self) -> bool {
        matches!(self, ErrorKind::ServerError | ErrorKind::Unexpected)
    }
}

/// Error raised by handlers and middlewares
#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// Details sent to the client, `[message]` unless set explicitly
    pub errors: Vec<Value>,
    pub ref_code: Option<String>,
    /// `"<KindName>: <message>"`, plus the cause chain of converted errors
    pub stack: String,
    source: Option<anyhow::Error>,
}

impl ApiError {
    /// Create an error of the given kind
    pub fn new<T: Into<String>>(kind: ErrorKind, message: T) -> Self {
        let message = message.into();
        Self {
            kind,
            errors: vec![Value::String(message.clone())],
            stack: format!("{}: {}", kind.name(), message),
            message,
            ref_code: None,
            source: None,
        }
    }

    /// Create an invalid request error (400)
    pub fn invalid_request<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    /// Create an unauthorized error (401)
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Create a forbidden error (403)
    pub fn forbidden<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a not found error (404)
    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a payload too large error (413)
    pub fn payload_too_large<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, message)
    }

    /// Create an unprocessable entity error (422)
    pub fn unprocessable_entity<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::UnprocessableEntity, message)
    }

    /// Create a server error (500)
    pub fn server_error<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }

    /// Create a service unavailable error (503)
    pub fn service_unavailable<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Create an error for a failure outside the HTTP kinds
    pub fn unexpected<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Replace the error details
    pub fn with_errors<I>(mut self, errors: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.errors = errors.into_iter().collect();
        self
    }

    /// Attach a reference code
    pub fn with_ref_code<T: Into<String>>(mut self, ref_code: T) -> Self {
        self.ref_code = Some(ref_code.into());
        self
    }

    /// Get the status code for this error
    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// The underlying failure, for errors converted from foreign error types
    pub fn source(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    /// Turn an unexpected failure into a server error, keeping the message
    pub fn into_server_error(self) -> Self {
        if self.kind != ErrorKind::Unexpected {
            return self;
        }

        let message = if self.message.is_empty() {
            "Something went wrong".to_string()
        } else {
            self.message
        };
        let mut normalized = Self::server_error(message);
        if let Some(source) = &self.source {
            normalized.stack = format!("{}\nCaused by: {:#}", normalized.stack, source);
        }
        normalized.ref_code = self.ref_code;
        normalized.source = self.source;
        normalized
    }

    /// Body sent to the client
    pub fn response_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("status".into(), json!(self.status_code().as_u16()));
        body.insert("message".into(), json!(self.message));
        body.insert("errors".into(), Value::Array(self.errors.clone()));
        if let Some(ref_code) = &self.ref_code {
            body.insert("ref_code".into(), json!(ref_code));
        }
        body.insert("stack".into(), json!(self.stack));
        Value::Object(body)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

// Any error type can be raised with `?` from a handler
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let source = err.into();
        let mut error = Self::unexpected(source.to_string());
        error.source = Some(source);
        error
    }
}

/// Errors raised while registering routes
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Route already defined: ({method}) {url}")]
    DuplicateRoute { method: String, url: String },

    #[error("Invalid route path: {path}")]
    InvalidPath { path: String },

    #[error("Failed to render OpenAPI document: {0}")]
    Document(#[from] serde_json::Error),
}

impl RouterError {
    /// Create a duplicate route error
    pub fn duplicate_route<T: Into<String>>(method: HttpMethod, url: T) -> Self {
        RouterError::DuplicateRoute {
            method: method.as_str().to_string(),
            url: url.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path<T: Into<String>>(path: T) -> Self {
        RouterError::InvalidPath { path: path.into() }
    }
}
