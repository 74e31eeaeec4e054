//! Known-hosts store
//!
//! Plain text, one host per line: `host:port fingerprint`. Blank lines and
//! lines starting with `#` are ignored. A later entry for the same host
//! replaces an earlier one.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{Result, ShellError};

/// Recorded host fingerprints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownHosts {
    entries: HashMap<String, String>,
}

impl KnownHosts {
    /// Load the store; a missing file is an empty store
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|e| {
            ShellError::resource(format!("Could not read known-hosts file {}", path.display()), e)
        })?;
        Ok(Self::parse(&contents))
    }

    fn parse(contents: &str) -> Self {
        let entries = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once(char::is_whitespace))
            .map(|(host, fingerprint)| (host.to_string(), fingerprint.trim().to_string()))
            .collect();
        Self { entries }
    }

    /// Fingerprint recorded for `host:port`
    #[must_use]
    pub fn lookup(&self, host: &str, port: u16) -> Option<&str> {
        self.entries.get(&key(host, port)).map(String::as_str)
    }

    /// Append a fingerprint for `host:port`, creating the file if needed
    pub fn record(path: &Path, host: &str, port: u16, fingerprint: &str) -> Result<()> {
        let context = || format!("Could not update known-hosts file {}", path.display());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ShellError::resource(context(), e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ShellError::resource(context(), e))?;
        writeln!(file, "{} {fingerprint}", key(host, port))
            .map_err(|e| ShellError::resource(context(), e))
    }
}

fn key(host: &str, port: u16) -> String {
    format!("{host}:{port}")
}
