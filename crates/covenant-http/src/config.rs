//! Router configuration
//!
//! [`RouterConfig`] is built in code with the builder methods, or read from
//! the environment with [`RouterConfig::from_env`].

use crate::middleware::Middleware;
use crate::reporter::ErrorReporter;
use crate::request::ContractRequest;
use crate::sanitizer::SanitizeKey;
use covenant_openapi::BaseProperties;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Derives the correlation id written into request/response log lines
pub type CorrelationIdExtractor = Arc<dyn Fn(&ContractRequest) -> String + Send + Sync>;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown application environment: {value}")]
    UnknownEnvironment { value: String },

    #[error("Invalid value for {field}: {value} (expected {expected})")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    Dev,
    #[default]
    Development,
    Spec,
    Test,
    Staging,
    Prod,
    Production,
}

impl AppEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnv::Dev => "dev",
            AppEnv::Development => "development",
            AppEnv::Spec => "spec",
            AppEnv::Test => "test",
            AppEnv::Staging => "staging",
            AppEnv::Prod => "prod",
            AppEnv::Production => "production",
        }
    }

    /// Request logging defaults to on only in `development`
    pub fn is_development(&self) -> bool {
        *self == AppEnv::Development
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(AppEnv::Dev),
            "development" => Ok(AppEnv::Development),
            "spec" => Ok(AppEnv::Spec),
            "test" => Ok(AppEnv::Test),
            "staging" => Ok(AppEnv::Staging),
            "prod" => Ok(AppEnv::Prod),
            "production" => Ok(AppEnv::Production),
            _ => Err(ConfigError::UnknownEnvironment {
                value: s.to_string(),
            }),
        }
    }
}

/// Router-wide settings
#[derive(Clone)]
pub struct RouterConfig {
    /// Check JSON responses against declared response schemas
    pub validate_responses: bool,
    /// Log every request; `None` means "only in development"
    pub log_requests: Option<bool>,
    /// Include response bodies in log lines; `None` means "only in development"
    pub log_responses: Option<bool>,
    pub correlation_id_extractor: Option<CorrelationIdExtractor>,
    pub app_env: AppEnv,
    /// Base properties of the served OpenAPI document
    pub swagger_base_properties: BaseProperties,
    /// Run before the documentation endpoints
    pub swagger_pre_handlers: Vec<Arc<dyn Middleware>>,
    /// Keys masked in error reports
    pub sanitize_keys: Vec<SanitizeKey>,
    pub error_reporter: ErrorReporter,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            validate_responses: false,
            log_requests: None,
            log_responses: None,
            correlation_id_extractor: None,
            app_env: AppEnv::default(),
            swagger_base_properties: BaseProperties::default(),
            swagger_pre_handlers: Vec::new(),
            sanitize_keys: Vec::new(),
            error_reporter: ErrorReporter::Inactive,
        }
    }
}

impl fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterConfig")
            .field("validate_responses", &self.validate_responses)
            .field("log_requests", &self.log_requests)
            .field("log_responses", &self.log_responses)
            .field("correlation_id_extractor", &self.correlation_id_extractor.is_some())
            .field("app_env", &self.app_env)
            .field("swagger_pre_handlers", &self.swagger_pre_handlers.len())
            .field("sanitize_keys", &self.sanitize_keys)
            .field("error_reporter", &self.error_reporter.is_active())
            .finish()
    }
}

impl RouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = match lookup("APP_ENV") {
            Some(value) => value.parse()?,
            None => AppEnv::default(),
        };

        Ok(Self {
            app_env,
            validate_responses: parse_flag(&lookup, "VALIDATE_RESPONSES")?.unwrap_or(false),
            log_requests: parse_flag(&lookup, "LOG_REQUESTS")?,
            log_responses: parse_flag(&lookup, "LOG_RESPONSES")?,
            ..Self::default()
        })
    }

    pub fn validate_responses(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    pub fn log_requests(mut self, enabled: bool) -> Self {
        self.log_requests = Some(enabled);
        self
    }

    pub fn log_responses(mut self, enabled: bool) -> Self {
        self.log_responses = Some(enabled);
        self
    }

    pub fn correlation_id_extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&ContractRequest) -> String + Send + Sync + 'static,
    {
        self.correlation_id_extractor = Some(Arc::new(extractor));
        self
    }

    pub fn app_env(mut self, app_env: AppEnv) -> Self {
        self.app_env = app_env;
        self
    }

    pub fn swagger_base_properties(mut self, base: BaseProperties) -> Self {
        self.swagger_base_properties = base;
        self
    }

    pub fn swagger_pre_handler<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.swagger_pre_handlers.push(Arc::new(middleware));
        self
    }

    pub fn sanitize_key(mut self, key: impl Into<SanitizeKey>) -> Self {
        self.sanitize_keys.push(key.into());
        self
    }

    pub fn error_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Whether routes get the network logger
    pub fn should_log_requests(&self) -> bool {
        self.log_requests.unwrap_or_else(|| self.app_env.is_development())
    }

    /// Whether the network logger includes response bodies
    pub fn should_log_responses(&self) -> bool {
        self.log_responses.unwrap_or_else(|| self.app_env.is_development())
    }
}

fn parse_flag<F>(lookup: &F, key: &str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            field: key.to_string(),
            value,
            expected: "true or false".to_string(),
        }),
    }
}
