//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout cyphersh.
//! Every error maps to a stable error code and to one of the failure classes
//! the shell distinguishes when deciding how far to unwind.
//!
//! # Error Categories
//! - `Usage`: Malformed command line (unknown flag, bad value, extra positional)
//! - `Config`: Structurally invalid invocation (bad queue, prompt without a tty)
//! - `Resource`: Terminal, logger or file stream could not be acquired
//! - `Connection`: Handshake, trust or authentication failure
//! - `Execution`: A directive failed while reading interactive, batch or file input
//! - `SourceDepthExceeded`: A `:source` inclusion went past the configured depth

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for cyphersh operations
#[derive(Error, Debug)]
pub enum ShellError {
    /// Command line could not be parsed
    #[error("{0}")]
    Usage(String),

    /// Invocation is well-formed but cannot be executed as given
    #[error("{0}")]
    Config(String),

    /// A process resource (terminal, logger, file) could not be acquired
    #[error("{context}: {source}")]
    Resource {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Database connection failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Server rejected the supplied credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Directive execution failed
    #[error("{0}")]
    Execution(String),

    /// Nested `:source` went deeper than allowed
    #[error("Source depth exceeded: '{}' would be inclusion level {depth} (max {max})", path.display())]
    SourceDepthExceeded { path: PathBuf, depth: u32, max: u32 },

    /// Stream I/O failure while reading or rendering
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ShellError {
    /// Convert error to a stable error code string
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Usage(_) => "USAGE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Resource { .. } => "RESOURCE_ERROR",
            Self::Connection(_) => "CONNECTION_FAILED",
            Self::Authentication(_) => "AUTHENTICATION_FAILED",
            Self::Execution(_) => "EXECUTION_FAILED",
            Self::SourceDepthExceeded { .. } => "SOURCE_DEPTH_EXCEEDED",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a resource error wrapping the underlying system error
    pub fn resource(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Resource { context: context.into(), source }
    }

    /// Create a connection failed error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}

/// Result type alias for cyphersh operations
pub type Result<T> = std::result::Result<T, ShellError>;
