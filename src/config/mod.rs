//! Session Configuration
//!
//! This module holds the settings accumulated from the command line before a
//! session starts: credentials, transport trust policy, the pipelining budget,
//! the source-inclusion depth limit, colorization and history settings.
//!
//! # Lifecycle
//! A `SessionConfig` is created once at startup, mutated only while arguments
//! are processed, and read-only afterwards. The single exception is
//! [`SessionConfig::clear_password`], which scrubs the password as soon as the
//! connection handshake has completed.
//!
//! # Default Locations
//! - History: `<data-local-dir>/cyphersh/client-history`
//! - Known hosts: `<config-dir>/cyphersh/known_hosts`

use std::fmt;
use std::path::PathBuf;

use crate::error::{Result, ShellError};

/// Default Bolt port used when an address omits one
pub const DEFAULT_PORT: u16 = 7687;

/// Default number of requests allowed in flight (user-facing value)
pub const DEFAULT_PIPELINE_MAX: u32 = 10;

/// Default depth limit for nested `:source` inclusion
pub const DEFAULT_SOURCE_MAX_DEPTH: u32 = 10;

/// File name of the interactive history under the data directory
pub const HISTORY_FILE_NAME: &str = "client-history";

/// File name of the known-hosts store under the config directory
pub const KNOWN_HOSTS_FILE_NAME: &str = "known_hosts";

const APP_DIR: &str = "cyphersh";

/// When error output is colorized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorPolicy {
    /// Always emit ANSI sequences
    Always,
    /// Never emit ANSI sequences
    Never,
    /// Emit ANSI sequences only when the stream is a terminal
    #[default]
    Auto,
}

impl ColorPolicy {
    /// Decide whether to colorize a stream with the given terminal status
    #[must_use]
    pub const fn resolve(self, stream_is_terminal: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => stream_is_terminal,
        }
    }
}

/// Username / password pair presented to the server
///
/// WARNING: `password` is sensitive. `Debug` redacts it; never format it
/// into messages.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Transport trust settings
///
/// TLS itself is handled below the connector; these values are carried
/// through so the transport can apply them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicy {
    /// Skip all verification of the remote host
    pub insecure: bool,
    /// File containing trusted certificates
    pub ca_file: Option<PathBuf>,
    /// Directory containing trusted certificates
    pub ca_directory: Option<PathBuf>,
    /// Known-hosts store consulted for host identity
    pub known_hosts: Option<PathBuf>,
    /// Whether the known-hosts store is consulted at all
    pub trust_known_hosts: bool,
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self {
            insecure: false,
            ca_file: None,
            ca_directory: None,
            known_hosts: default_known_hosts_file(),
            trust_known_hosts: true,
        }
    }
}

/// Accumulated settings for one shell session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Credentials used for the handshake
    pub credentials: Credentials,

    /// Host trust settings
    pub trust: TrustPolicy,

    /// Error stream colorization
    pub color: ColorPolicy,

    /// Whether the session prefers an interactive prompt
    pub interactive: bool,

    /// Prompt for a password through the terminal
    pub password_prompt: bool,

    /// Interactive history location (None disables history)
    pub history_file: Option<PathBuf>,

    pipeline_max: u32,
    max_pipelined_requests: u32,
    source_max_depth: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            trust: TrustPolicy::default(),
            color: ColorPolicy::Auto,
            interactive: false,
            password_prompt: false,
            history_file: default_history_file(),
            pipeline_max: DEFAULT_PIPELINE_MAX,
            max_pipelined_requests: DEFAULT_PIPELINE_MAX * 2,
            source_max_depth: DEFAULT_SOURCE_MAX_DEPTH,
        }
    }
}

impl SessionConfig {
    /// Set the in-flight request budget
    ///
    /// The transport counts a request and its acknowledgement separately, so
    /// the value handed to it is twice the user-facing one.
    pub fn set_pipeline_max(&mut self, max: u32) -> Result<()> {
        if max < 1 {
            return Err(ShellError::usage(format!("Invalid pipeline-max '{max}'")));
        }
        let doubled = max
            .checked_mul(2)
            .ok_or_else(|| ShellError::usage(format!("Invalid pipeline-max '{max}'")))?;
        self.pipeline_max = max;
        self.max_pipelined_requests = doubled;
        Ok(())
    }

    /// User-facing pipelining limit
    #[must_use]
    pub const fn pipeline_max(&self) -> u32 {
        self.pipeline_max
    }

    /// Limit passed to the transport (twice [`Self::pipeline_max`])
    #[must_use]
    pub const fn max_pipelined_requests(&self) -> u32 {
        self.max_pipelined_requests
    }

    /// Set the maximum `:source` nesting depth
    pub fn set_source_max_depth(&mut self, depth: u32) -> Result<()> {
        if depth < 1 {
            return Err(ShellError::usage(format!("Invalid source-max-depth '{depth}'")));
        }
        self.source_max_depth = depth;
        Ok(())
    }

    #[must_use]
    pub const fn source_max_depth(&self) -> u32 {
        self.source_max_depth
    }

    /// Remove any stored password
    ///
    /// Clearing an already-empty password is a no-op. Returns whether a
    /// password was present.
    pub fn clear_password(&mut self) -> bool {
        self.credentials.password.take().is_some()
    }
}

/// Default interactive history file
#[must_use]
pub fn default_history_file() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join(HISTORY_FILE_NAME))
}

/// Default known-hosts store
#[must_use]
pub fn default_known_hosts_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(KNOWN_HOSTS_FILE_NAME))
}
