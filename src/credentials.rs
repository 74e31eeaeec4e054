//! Credential Callback Bridge
//!
//! The transport needs a human decision in two situations: a remote host
//! whose identity cannot be verified automatically, and an authentication
//! failure that can be retried with new credentials. Both are answered by a
//! [`Prompter`], normally the controlling terminal.
//!
//! [`CredentialCallbacks`] is the capability handed to a connection attempt.
//! It is wired only when a prompter exists; the reauthentication handler is
//! additionally gated on password prompting being active. Calls are
//! synchronous: the connection attempt blocks until the operator answers.
//! Without a prompter, unverified hosts are rejected and no reattempt is made.

use std::fmt;

use tracing::warn;

use crate::config::Credentials;

/// Why a host identity could not be verified automatically
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostTrustIssue {
    /// No known-hosts entry exists for the host
    Unknown,
    /// The recorded fingerprint differs from the presented one
    Mismatch { recorded: String },
}

/// Identity presented by a host the transport could not verify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedHost<'a> {
    pub hostname: &'a str,
    pub port: u16,
    pub fingerprint: &'a str,
    pub issue: HostTrustIssue,
}

impl fmt::Display for UnverifiedHost<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// Operator decision about an unverified host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostDecision {
    /// Abort the connection attempt
    Reject,
    /// Continue this time without recording the fingerprint
    AcceptOnce,
    /// Continue and record the fingerprint in the known-hosts store
    Trust,
}

/// Context for an authentication reattempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthAttempt<'a> {
    pub hostname: &'a str,
    pub port: u16,
    pub username: Option<&'a str>,
    /// 1-based count of reattempts so far
    pub attempt: u32,
    /// Server's reason for rejecting the previous credentials
    pub reason: &'a str,
}

/// Something that can ask the human operator
pub trait Prompter {
    /// Ask whether to trust a host
    fn verify_host(&mut self, host: &UnverifiedHost<'_>) -> std::io::Result<HostDecision>;

    /// Ask for credentials; `None` means the operator declined
    fn credentials(
        &mut self,
        username: Option<&str>,
        reason: Option<&str>,
    ) -> std::io::Result<Option<Credentials>>;
}

/// Host-trust and reauthentication handlers supplied to a connection attempt
pub struct CredentialCallbacks<'a> {
    prompter: Option<&'a mut dyn Prompter>,
    reauthenticate: bool,
}

impl<'a> CredentialCallbacks<'a> {
    /// No handlers: unverified hosts are rejected, no reattempts are made
    #[must_use]
    pub fn none() -> Self {
        Self { prompter: None, reauthenticate: false }
    }

    /// Wire handlers for the available prompter
    ///
    /// The host handler exists whenever a prompter does; the reattempt
    /// handler only when password prompting is also active.
    #[must_use]
    pub fn wire(prompter: Option<&'a mut dyn Prompter>, password_prompt: bool) -> Self {
        let reauthenticate = prompter.is_some() && password_prompt;
        Self { prompter, reauthenticate }
    }

    #[must_use]
    pub fn has_host_handler(&self) -> bool {
        self.prompter.is_some()
    }

    #[must_use]
    pub fn has_reauth_handler(&self) -> bool {
        self.reauthenticate
    }

    /// Invoked by the transport when a host cannot be verified
    pub fn unverified_host(&mut self, host: &UnverifiedHost<'_>) -> HostDecision {
        let Some(prompter) = self.prompter.as_deref_mut() else {
            return HostDecision::Reject;
        };
        match prompter.verify_host(host) {
            Ok(decision) => decision,
            Err(e) => {
                warn!("could not prompt for host verification of {host}: {e}");
                HostDecision::Reject
            }
        }
    }

    /// Invoked by the transport when credentials were rejected
    pub fn reattempt(&mut self, attempt: &AuthAttempt<'_>) -> Option<Credentials> {
        if !self.reauthenticate {
            return None;
        }
        self.ask(attempt.username, Some(attempt.reason))
    }

    /// Credentials asked for before the first handshake when prompting is active
    pub fn initial_credentials(&mut self, username: Option<&str>) -> Option<Credentials> {
        if !self.reauthenticate {
            return None;
        }
        self.ask(username, None)
    }

    fn ask(&mut self, username: Option<&str>, reason: Option<&str>) -> Option<Credentials> {
        let prompter = self.prompter.as_deref_mut()?;
        match prompter.credentials(username, reason) {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("could not prompt for credentials: {e}");
                None
            }
        }
    }
}

impl fmt::Debug for CredentialCallbacks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCallbacks")
            .field("host_handler", &self.has_host_handler())
            .field("reauth_handler", &self.has_reauth_handler())
            .finish()
    }
}
