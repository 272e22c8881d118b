use thiserror::Error;

/// Result type for OpenAPI operations
pub type OpenApiResult<T> = Result<T, OpenApiError>;

/// Errors that can occur while exporting or checking OpenAPI documents
#[derive(Debug, Error)]
pub enum OpenApiError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl OpenApiError {
    /// Create a new validation error
    pub fn validation_error<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }
}
