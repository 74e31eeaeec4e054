//! Interactive prompt with line editing and persistent history
//!
//! The prompt loop reads from a [`LineEditor`]. On a terminal that is a
//! rustyline editor; otherwise lines come from a plain stream and history
//! is not kept.

use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

use super::{step, DirectiveParser, ReadContext, ReadSummary, INTERACTIVE_NAME};
use crate::error::{Result, ShellError};
use crate::session::Session;

const PROMPT: &str = "cyphersh> ";
const CONTINUATION_PROMPT: &str = "       -> ";

/// What one prompt produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompted {
    Line(String),
    /// Ctrl-C
    Interrupted,
    /// Ctrl-D or end of stream
    Eof,
}

/// Source of interactive input lines
pub trait LineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Prompted>;

    fn add_history(&mut self, _line: &str) {}

    fn load_history(&mut self, _path: &Path) {}

    fn save_history(&mut self, _path: &Path) {}
}

/// rustyline editor on the process terminal
pub struct TerminalEditor {
    editor: DefaultEditor,
}

impl TerminalEditor {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(|e| editor_error("Could not start line editor", &e))?;
        Ok(Self { editor })
    }
}

impl LineEditor for TerminalEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Prompted> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Prompted::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(Prompted::Interrupted),
            Err(ReadlineError::Eof) => Ok(Prompted::Eof),
            Err(e) => Err(editor_error("Could not read from terminal", &e)),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }

    fn load_history(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        if let Err(e) = self.editor.load_history(path) {
            warn!("could not load history from {}: {e}", path.display());
        }
    }

    fn save_history(&mut self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("could not create history directory {}: {e}", parent.display());
                return;
            }
        }
        match self.editor.save_history(path) {
            Ok(()) => debug!(path = %path.display(), "saved history"),
            Err(e) => warn!("could not save history to {}: {e}", path.display()),
        }
    }
}

/// Lines from a buffered stream; prompts are not echoed
pub struct StreamEditor {
    input: Box<dyn BufRead>,
}

impl StreamEditor {
    pub fn new(input: Box<dyn BufRead>) -> Self {
        Self { input }
    }
}

impl LineEditor for StreamEditor {
    fn read_line(&mut self, _prompt: &str) -> Result<Prompted> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| ShellError::resource("Could not read standard input", e))?;
        if read == 0 {
            return Ok(Prompted::Eof);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Prompted::Line(line))
    }
}

/// Run the prompt until end of input or `:exit`
///
/// Ctrl-C discards the statement being typed; Ctrl-D ends the session.
pub fn interact(session: &mut Session, editor: &mut dyn LineEditor) -> Result<ReadSummary> {
    let history = session.config.history_file.clone();
    if let Some(path) = history.as_deref() {
        editor.load_history(path);
    }

    let ctx = ReadContext::top_level(INTERACTIVE_NAME, session.config.source_max_depth());
    let mut parser = DirectiveParser::new();
    let mut summary = ReadSummary::default();
    let mut line_no = 0;

    let outcome = loop {
        let prompt = if parser.is_pending() { CONTINUATION_PROMPT } else { PROMPT };
        match editor.read_line(prompt) {
            Ok(Prompted::Line(line)) => {
                line_no += 1;
                if !line.trim().is_empty() {
                    editor.add_history(&line);
                }
                for (at, directive) in parser.feed(line_no, &line) {
                    step(session, &ctx, &mut summary, at, directive);
                    if summary.exited {
                        break;
                    }
                }
                if summary.exited {
                    break Ok(());
                }
            }
            Ok(Prompted::Interrupted) => parser.reset(),
            Ok(Prompted::Eof) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    if let Some(path) = history.as_deref() {
        editor.save_history(path);
    }

    outcome.map(|()| summary)
}

fn editor_error(context: &str, e: &ReadlineError) -> ShellError {
    ShellError::resource(context, io::Error::other(e.to_string()))
}
