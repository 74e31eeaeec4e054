//! Recursive Source Guard
//!
//! Every read context carries a [`SourceDepth`]. Top-level contexts
//! (the interactive prompt, standard input in batch mode, and each source
//! file queued on the command line) start at depth 1; every nested
//! `:source` directive enters one level deeper. Entering past the configured
//! maximum is refused with [`ShellError::SourceDepthExceeded`], which the
//! reader reports against the including directive only.

use std::path::Path;

use crate::error::{Result, ShellError};

/// Nesting level of the active read context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDepth {
    depth: u32,
    max: u32,
}

impl SourceDepth {
    /// Depth of a top-level read context
    #[must_use]
    pub const fn top_level(max: u32) -> Self {
        Self { depth: 1, max }
    }

    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Depth for a file included from this context
    pub fn enter(&self, path: &Path) -> Result<Self> {
        let next = self.depth.saturating_add(1);
        if next > self.max {
            return Err(ShellError::SourceDepthExceeded {
                path: path.to_path_buf(),
                depth: next,
                max: self.max,
            });
        }
        Ok(Self { depth: next, max: self.max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_up_to_limit_succeeds() {
        let top = SourceDepth::top_level(3);
        let second = top.enter(Path::new("a.cypher")).unwrap();
        let third = second.enter(Path::new("b.cypher")).unwrap();
        assert_eq!(third.depth(), 3);

        let err = third.enter(Path::new("c.cypher")).unwrap_err();
        match err {
            ShellError::SourceDepthExceeded { path, depth, max } => {
                assert_eq!(path, Path::new("c.cypher"));
                assert_eq!(depth, 4);
                assert_eq!(max, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_limit_of_one_allows_no_nesting() {
        let top = SourceDepth::top_level(1);
        assert_eq!(top.depth(), 1);
        assert!(top.enter(Path::new("a.cypher")).is_err());
    }

    #[test]
    fn test_enter_does_not_mutate_parent() {
        let top = SourceDepth::top_level(5);
        let _child = top.enter(Path::new("a.cypher")).unwrap();
        assert_eq!(top.depth(), 1);
    }
}
