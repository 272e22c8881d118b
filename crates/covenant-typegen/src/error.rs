use covenant_http::RouterError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for type generation
pub type TypegenResult<T> = Result<T, TypegenError>;

/// Errors raised while generating or publishing contract types
#[derive(Error, Debug)]
pub enum TypegenError {
    #[error("Could not mount the router: {0}")]
    Mount(#[from] RouterError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Emitter command `{command}` failed: {message}")]
    Command { command: String, message: String },

    #[error("Invalid manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("Prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),
}

impl TypegenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn command<C: Into<String>, M: Into<String>>(command: C, message: M) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn manifest<M: Into<String>>(path: impl Into<PathBuf>, message: M) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }
}
