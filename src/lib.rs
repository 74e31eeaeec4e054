//! cyphersh - Command-line shell for Cypher graph databases
//!
//! cyphersh connects to a graph database server and evaluates Cypher
//! statements typed at a prompt, piped through standard input, or read
//! from files named on the command line.
//!
//! # Architecture
//! The binary is a thin wrapper around [`shell::run`]. Everything the shell
//! touches (process streams, the controlling terminal, the database
//! connector) is passed in, so the whole session can be driven from tests.
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`config`] - Session configuration and defaults
//! - [`args`] - Command line parsing into a session plan
//! - [`request`] - The `--source` / `--output` queue
//! - [`guard`] - Nesting limit for `:source`
//! - [`terminal`] - Controlling terminal and operator prompts
//! - [`credentials`] - Host-trust and reauthentication callbacks
//! - [`connect`] - Addresses, connection lifecycle and the TCP transport
//! - [`render`] - Table and CSV rendering
//! - [`reader`] - Directive parsing and the batch / file / interactive readers
//! - [`session`] - The session context shared by the readers
//! - [`shell`] - Mode selection and the process lifecycle
//! - [`logging`] - Logger installation

pub mod args;
pub mod config;
pub mod connect;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod logging;
pub mod reader;
pub mod render;
pub mod request;
pub mod session;
pub mod shell;
pub mod terminal;

// Re-export commonly used types for convenience
pub use config::{ColorPolicy, Credentials, SessionConfig, TrustPolicy};
pub use connect::{Address, Connection, ConnectionHandle, Connector, TcpConnector};
pub use credentials::{CredentialCallbacks, HostDecision, Prompter};
pub use error::{Result, ShellError};
pub use reader::{LineEditor, Prompted};
pub use render::{RenderFlags, RenderFormat, ResultSet};
pub use request::{FileRequest, FileRequestQueue, RequestKind};
pub use session::{Console, Session};
pub use shell::{report_startup_error, run, select_mode, Mode};
