//! File Request Queue
//!
//! `--source` and `--output` arguments are collected, in command-line order,
//! into a bounded queue that drives file-multiplexed mode.
//!
//! # Invariants
//! - At most [`MAX_FILE_REQUESTS`] entries; the next push is rejected, never
//!   truncated.
//! - Insertion order is execution order.
//! - A non-empty queue must end with a `Source` entry (an output redirection
//!   with nothing after it has nothing to redirect).

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, ShellError};

/// Maximum combined number of `--source` / `--output` arguments
pub const MAX_FILE_REQUESTS: usize = 128;

/// What a queued file request does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Read and evaluate directives from the file
    Source,
    /// Redirect subsequent rendering to the file
    Output,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// A single queued request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    kind: RequestKind,
    path: PathBuf,
}

impl FileRequest {
    #[must_use]
    pub fn source(path: impl Into<PathBuf>) -> Self {
        Self { kind: RequestKind::Source, path: path.into() }
    }

    #[must_use]
    pub fn output(path: impl Into<PathBuf>) -> Self {
        Self { kind: RequestKind::Output, path: path.into() }
    }

    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        self.kind
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Ordered, bounded sequence of file requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRequestQueue {
    requests: Vec<FileRequest>,
}

impl FileRequestQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request, rejecting it once the queue is full
    pub fn push(&mut self, request: FileRequest) -> Result<()> {
        if self.requests.len() >= MAX_FILE_REQUESTS {
            return Err(ShellError::config("Too many --source and/or --output args"));
        }
        self.requests.push(request);
        Ok(())
    }

    /// Check structural correctness before anything is opened
    pub fn validate(&self) -> Result<()> {
        match self.requests.last() {
            Some(last) if last.kind() == RequestKind::Output => {
                Err(ShellError::config("--output/-o must be followed by --source/-i"))
            }
            _ => Ok(()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRequest> {
        self.requests.iter()
    }
}

impl<'a> IntoIterator for &'a FileRequestQueue {
    type Item = &'a FileRequest;
    type IntoIter = std::slice::Iter<'a, FileRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.iter()
    }
}
