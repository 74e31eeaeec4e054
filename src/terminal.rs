//! Controlling Terminal
//!
//! The shell opens the controlling terminal once at startup, independent of
//! where standard input and output point, so that credential and host-trust
//! prompts reach the operator even when stdin is a pipe. A missing terminal
//! is not an error; any other open failure is.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use console::Term;
use dialoguer::{Input, Password, Select};

use crate::config::Credentials;
use crate::credentials::{HostDecision, HostTrustIssue, Prompter, UnverifiedHost};
use crate::error::{Result, ShellError};

/// Path of the controlling terminal device
pub const TTY_PATH: &str = "/dev/tty";

/// `open(2)` result when the process has no controlling terminal
#[cfg(unix)]
const ENXIO: i32 = 6;

/// Open handle on the controlling terminal
#[derive(Debug)]
pub struct Terminal {
    term: Term,
}

impl Terminal {
    /// Open the controlling terminal, or `None` if the process has none
    pub fn open() -> Result<Option<Self>> {
        Self::open_path(Path::new(TTY_PATH))
    }

    /// Open a terminal device at `path`
    pub fn open_path(path: &Path) -> Result<Option<Self>> {
        match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => Self::from_file(file)
                .map(Some)
                .map_err(|e| ShellError::resource(format!("can't open {}", path.display()), e)),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(ShellError::resource(format!("can't open {}", path.display()), e)),
        }
    }

    #[cfg(unix)]
    fn from_file(file: File) -> io::Result<Self> {
        let reader = file.try_clone()?;
        Ok(Self { term: Term::read_write_pair(reader, file) })
    }

    #[cfg(not(unix))]
    fn from_file(_file: File) -> io::Result<Self> {
        Ok(Self { term: Term::stderr() })
    }
}

fn is_absent(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound || no_controlling_terminal(err)
}

#[cfg(unix)]
fn no_controlling_terminal(err: &io::Error) -> bool {
    err.raw_os_error() == Some(ENXIO)
}

#[cfg(not(unix))]
fn no_controlling_terminal(_err: &io::Error) -> bool {
    false
}

impl Prompter for Terminal {
    fn verify_host(&mut self, host: &UnverifiedHost<'_>) -> io::Result<HostDecision> {
        match &host.issue {
            HostTrustIssue::Unknown => {
                self.term.write_line(&format!(
                    "The authenticity of host '{host}' could not be established."
                ))?;
            }
            HostTrustIssue::Mismatch { recorded } => {
                self.term.write_line(&format!(
                    "WARNING: the identity of host '{host}' has changed!"
                ))?;
                self.term.write_line(&format!("Recorded fingerprint is {recorded}."))?;
            }
        }
        self.term.write_line(&format!("Presented fingerprint is {}.", host.fingerprint))?;

        let choice = Select::new()
            .with_prompt("Would you like to trust this host")
            .items(&["no", "yes", "once"][..])
            .default(0)
            .interact_on_opt(&self.term)
            .map_err(io::Error::other)?;

        Ok(match choice {
            Some(1) => HostDecision::Trust,
            Some(2) => HostDecision::AcceptOnce,
            _ => HostDecision::Reject,
        })
    }

    fn credentials(
        &mut self,
        username: Option<&str>,
        reason: Option<&str>,
    ) -> io::Result<Option<Credentials>> {
        if let Some(reason) = reason {
            self.term.write_line(reason)?;
        }

        let mut input = Input::<String>::new().with_prompt("Username").allow_empty(true);
        if let Some(name) = username {
            input = input.with_initial_text(name);
        }
        let username = input.interact_text_on(&self.term).map_err(io::Error::other)?;
        if username.is_empty() {
            return Ok(None);
        }

        let password = Password::new()
            .with_prompt("Password")
            .allow_empty_password(true)
            .interact_on(&self.term)
            .map_err(io::Error::other)?;

        Ok(Some(Credentials::new(Some(username), Some(password))))
    }
}
