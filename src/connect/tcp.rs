//! Line-delimited JSON transport over TCP
//!
//! Each message is one JSON object on its own line.
//!
//! # Handshake
//! 1. `{"hello":{"user_agent":..,"max_pipelined":N}}` → `{"server":..,"fingerprint":..}`
//! 2. Host identity check against the known-hosts store (skipped when insecure)
//! 3. `{"auth":{"principal":..,"credentials":..}}` → `{"ok":true}` or `{"error":{..}}`
//!
//! # Requests
//! `{"run":{"statement":..}}` → `{"columns":[..],"rows":[[..]]}` or `{"error":{..}}`,
//! and `"goodbye"` before the socket is dropped.
//!
//! Requests are issued one at a time, so the number outstanding never
//! exceeds the pipelining budget announced in the hello.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::{Address, Connection, Connector, KnownHosts};
use crate::config::{Credentials, SessionConfig, TrustPolicy};
use crate::credentials::{AuthAttempt, CredentialCallbacks, HostDecision, HostTrustIssue, UnverifiedHost};
use crate::error::{Result, ShellError};
use crate::render::ResultSet;

/// Error code the server uses for rejected credentials
pub const UNAUTHORIZED: &str = "Unauthorized";

/// Reattempts allowed after the first rejected credentials
pub const MAX_AUTH_REATTEMPTS: u32 = 3;

/// Client → server messages
///
/// No `Debug`: the auth variant carries a password.
#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum ClientMessage<'a> {
    Hello { user_agent: &'a str, max_pipelined: u32 },
    Auth { principal: Option<&'a str>, credentials: Option<&'a str> },
    Run { statement: &'a str },
    Goodbye,
}

#[derive(Debug, Deserialize)]
struct ServerHello {
    server: String,
    fingerprint: String,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthReply {
    Failure { error: ServerError },
    Success { ok: bool },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RunReply {
    Failure { error: ServerError },
    Records(ResultSet),
}

struct Transport {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Transport {
    fn new(stream: TcpStream) -> std::io::Result<Self> {
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self { reader, writer: BufWriter::new(stream) })
    }

    fn send(&mut self, message: &ClientMessage<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, message)
            .map_err(|e| ShellError::connection(format!("Could not encode request: {e}")))?;
        self.writer.write_all(b"\n").map_err(transport_error)?;
        self.writer.flush().map_err(transport_error)
    }

    fn receive<T: DeserializeOwned>(&mut self) -> Result<T> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).map_err(transport_error)?;
        if read == 0 {
            return Err(ShellError::connection("Server closed the connection"));
        }
        trace!(reply = line.trim_end(), "received");
        serde_json::from_str(&line)
            .map_err(|e| ShellError::connection(format!("Malformed server message: {e}")))
    }
}

fn transport_error(e: std::io::Error) -> ShellError {
    ShellError::connection(format!("Transport error: {e}"))
}

/// Connector for the line-delimited JSON transport
#[derive(Debug, Clone)]
pub struct TcpConnector {
    user_agent: String,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self { user_agent: format!("cyphersh/{}", env!("CARGO_PKG_VERSION")) }
    }
}

impl Connector for TcpConnector {
    fn connect(
        &self,
        address: &Address,
        config: &SessionConfig,
        callbacks: &mut CredentialCallbacks<'_>,
    ) -> Result<Box<dyn Connection>> {
        let stream = TcpStream::connect((address.hostname.as_str(), address.port)).map_err(|e| {
            ShellError::connection(format!("Could not connect to {address}: {e}"))
        })?;
        let mut transport = Transport::new(stream).map_err(transport_error)?;

        let max_pipelined = config.max_pipelined_requests();
        transport.send(&ClientMessage::Hello { user_agent: &self.user_agent, max_pipelined })?;
        let hello: ServerHello = transport.receive()?;
        info!(server = %hello.server, "connected to {address}");

        verify_host(address, &hello.fingerprint, &config.trust, callbacks)?;
        authenticate(&mut transport, address, &config.credentials, callbacks)?;

        Ok(Box::new(TcpConnection { transport, server: hello.server, closed: false }))
    }
}

fn verify_host(
    address: &Address,
    fingerprint: &str,
    trust: &TrustPolicy,
    callbacks: &mut CredentialCallbacks<'_>,
) -> Result<()> {
    if trust.insecure {
        debug!("insecure connection, skipping host verification");
        return Ok(());
    }
    if trust.ca_file.is_some() || trust.ca_directory.is_some() {
        debug!(ca_file = ?trust.ca_file, ca_directory = ?trust.ca_directory, "trust roots configured");
    }
    let store = match (&trust.known_hosts, trust.trust_known_hosts) {
        (Some(path), true) => path,
        _ => {
            debug!("known-hosts checking disabled");
            return Ok(());
        }
    };

    let known = KnownHosts::load(store)?;
    let issue = match known.lookup(&address.hostname, address.port) {
        Some(recorded) if recorded == fingerprint => return Ok(()),
        Some(recorded) => HostTrustIssue::Mismatch { recorded: recorded.to_string() },
        None => HostTrustIssue::Unknown,
    };

    let host = UnverifiedHost {
        hostname: &address.hostname,
        port: address.port,
        fingerprint,
        issue,
    };
    match callbacks.unverified_host(&host) {
        HostDecision::Reject => {
            Err(ShellError::connection(format!("Host verification failed for {address}")))
        }
        HostDecision::AcceptOnce => Ok(()),
        HostDecision::Trust => {
            KnownHosts::record(store, &address.hostname, address.port, fingerprint)?;
            info!("added {address} to {}", store.display());
            Ok(())
        }
    }
}

fn authenticate(
    transport: &mut Transport,
    address: &Address,
    initial: &Credentials,
    callbacks: &mut CredentialCallbacks<'_>,
) -> Result<()> {
    let mut retry: Option<Credentials> = None;
    let mut attempt = 0;

    loop {
        let current = retry.as_ref().unwrap_or(initial);
        transport.send(&ClientMessage::Auth {
            principal: current.username.as_deref(),
            credentials: current.password.as_deref(),
        })?;

        let error = match transport.receive::<AuthReply>()? {
            AuthReply::Success { ok: true } => return Ok(()),
            AuthReply::Success { ok: false } => {
                return Err(ShellError::authentication("server refused the session"))
            }
            AuthReply::Failure { error } => error,
        };

        if error.code != UNAUTHORIZED || attempt >= MAX_AUTH_REATTEMPTS {
            return Err(ShellError::authentication(error.message));
        }
        attempt += 1;

        let request = AuthAttempt {
            hostname: &address.hostname,
            port: address.port,
            username: current.username.as_deref(),
            attempt,
            reason: &error.message,
        };
        match callbacks.reattempt(&request) {
            Some(credentials) => retry = Some(credentials),
            None => return Err(ShellError::authentication(error.message)),
        }
    }
}

/// Open connection over the JSON transport
struct TcpConnection {
    transport: Transport,
    server: String,
    closed: bool,
}

impl Connection for TcpConnection {
    fn server(&self) -> &str {
        &self.server
    }

    fn run(&mut self, statement: &str) -> Result<ResultSet> {
        if self.closed {
            return Err(ShellError::execution("Connection is closed"));
        }
        self.transport.send(&ClientMessage::Run { statement })?;
        match self.transport.receive::<RunReply>()? {
            RunReply::Records(result) => Ok(result),
            RunReply::Failure { error } => {
                Err(ShellError::execution(format!("{}: {}", error.code, error.message)))
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.transport.send(&ClientMessage::Goodbye)
    }
}
