//! Error types for the handover-core library.
//!
//! This module provides comprehensive error handling for all pipeline
//! operations, with structured error types that preserve context and enable
//! proper error propagation from file discovery through document rendering.

use std::io;
use std::num::{ParseFloatError, ParseIntError};
use std::str::Utf8Error;

use thiserror::Error;

/// Main result type for handover operations.
pub type Result<T> = std::result::Result<T, HandoverError>;

/// Comprehensive error type for all handover operations.
#[derive(Error, Debug)]
pub enum HandoverError {
    /// I/O related errors (file operations, cache reads/writes, etc.)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors (invalid schema, missing required field, etc.)
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Parsing errors (manifests, env files, AST capability results)
    #[error("Parse error in {source_kind}: {message}")]
    Parse {
        /// What was being parsed (manifest ecosystem, language, file format)
        source_kind: String,
        /// Error description
        message: String,
        /// File path where the error occurred
        file_path: Option<String>,
    },

    /// Analysis pipeline errors (coordinator / analyzer failures)
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where error occurred
        stage: String,
        /// Error description
        message: String,
        /// Number of files processed before the error, if known
        processed_count: Option<usize>,
    },

    /// Cache and on-disk round-recovery errors
    #[error("Cache error: {message}")]
    Cache {
        /// Error description
        message: String,
        /// Cache key that caused the issue
        key: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Credential resolution errors (§4.10/§7). `code` is one of
    /// `AUTH_NO_CREDENTIAL`, `AUTH_CANCELLED`, `AUTH_SESSION_EXPIRED`.
    #[error("Auth error [{code}]: {message}")]
    Auth {
        /// Stable error code
        code: &'static str,
        /// Human-readable message, including remediation steps where relevant
        message: String,
    },

    /// Provider-level structural errors (§4.9). `code` is one of the
    /// `PROVIDER_*` constants named in spec §4.9.
    #[error("Provider error [{code}]: {message}")]
    Provider {
        /// Stable error code
        code: &'static str,
        /// Human-readable message
        message: String,
    },

    /// DAG construction/execution errors (duplicate ids, missing deps, cycles)
    #[error("DAG error: {message}")]
    Dag {
        /// Error description
        message: String,
    },

    /// Document rendering errors
    #[error("Render error for document '{document}': {message}")]
    Render {
        /// Document id being rendered
        document: String,
        /// Error description
        message: String,
    },

    /// Concurrency and threading errors
    #[error("Concurrency error: {message}")]
    Concurrency {
        /// Error description
        message: String,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },

    /// Unsupported operation or feature
    #[error("Unsupported: {message}")]
    Unsupported {
        /// Error description
        message: String,
    },
}

impl HandoverError {
    /// Stable error code for variants that carry one (`Auth`, `Provider`);
    /// `None` for everything else.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Auth { code, .. } | Self::Provider { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new parse error
    pub fn parse(source_kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_kind: source_kind.into(),
            message: message.into(),
            file_path: None,
        }
    }

    /// Create a new parse error with file context
    pub fn parse_with_file(
        source_kind: impl Into<String>,
        message: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self::Parse {
            source_kind: source_kind.into(),
            message: message.into(),
            file_path: Some(file_path.into()),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
            processed_count: None,
        }
    }

    /// Create a new cache error
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
            key: None,
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new auth error with a stable error code
    pub fn auth(code: &'static str, message: impl Into<String>) -> Self {
        Self::Auth {
            code,
            message: message.into(),
        }
    }

    /// Create a new provider error with a stable error code
    pub fn provider(code: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            code,
            message: message.into(),
        }
    }

    /// Create a new DAG error
    pub fn dag(message: impl Into<String>) -> Self {
        Self::Dag {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            document: document.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Create a new unsupported error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Add context to an existing error, where the variant supports it
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Internal { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            _ => {}
        }
        self
    }
}

impl From<io::Error> for HandoverError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for HandoverError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for HandoverError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<ParseIntError> for HandoverError {
    fn from(err: ParseIntError) -> Self {
        Self::validation(format!("Invalid integer: {err}"))
    }
}

impl From<ParseFloatError> for HandoverError {
    fn from(err: ParseFloatError) -> Self {
        Self::validation(format!("Invalid float: {err}"))
    }
}

impl From<Utf8Error> for HandoverError {
    fn from(err: Utf8Error) -> Self {
        Self::parse("unknown", format!("UTF-8 encoding error: {err}"))
    }
}

/// Result extension trait for adding context to errors.
pub trait ResultExt<T> {
    /// Add context to an error result, computed lazily
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<HandoverError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = HandoverError::config("Invalid configuration");
        assert!(matches!(err, HandoverError::Config { .. }));

        let err = HandoverError::parse("npm", "Malformed package.json");
        assert!(matches!(err, HandoverError::Parse { .. }));
    }

    #[test]
    fn test_error_with_context() {
        let err = HandoverError::internal("Something went wrong").with_context("during packing");

        if let HandoverError::Internal { context, .. } = err {
            assert_eq!(context, Some("during packing".to_string()));
        } else {
            panic!("Expected Internal error");
        }
    }

    #[test]
    fn test_auth_error_code() {
        let err = HandoverError::auth("AUTH_NO_CREDENTIAL", "no credential found");
        match err {
            HandoverError::Auth { code, .. } => assert_eq!(code, "AUTH_NO_CREDENTIAL"),
            _ => panic!("Expected Auth error"),
        }
    }

    #[test]
    fn test_result_extension() {
        let result: std::result::Result<i32, std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"));

        let handover_result = result.context("Failed to read configuration file");
        assert!(handover_result.is_err());
    }
}
