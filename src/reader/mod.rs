//! Directive Readers
//!
//! Readers pull directives from an input and evaluate them against the
//! [`Session`]. Three readers exist, one per way input reaches the shell:
//!
//! - [`batch`]: any buffered stream (standard input in batch mode)
//! - [`source_file`]: a file named on the command line or by `:source`
//! - [`interact`]: the prompt, fed by a [`LineEditor`]
//!
//! # Failure handling
//! A failing directive is reported on the error stream as
//! `<input>:<line>: message` and reading continues with the next one. The
//! returned [`ReadSummary`] counts failures, including those inside nested
//! `:source` files, so callers can decide the exit status. Only a failure
//! to read the input itself aborts a reader.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, ShellError};
use crate::guard::SourceDepth;
use crate::render::RenderFormat;
use crate::session::Session;

mod directive;
mod interactive;

pub use directive::{Directive, DirectiveParser};
pub use interactive::{interact, LineEditor, Prompted, StreamEditor, TerminalEditor};

/// Input name used for standard input in batch mode
pub const STDIN_NAME: &str = "<stdin>";

/// Input name used for the interactive prompt
pub const INTERACTIVE_NAME: &str = "<interactive>";

const HELP: &str = "\
Enter Cypher statements terminated by ';', or one of these commands:
  :source FILE        evaluate the directives in FILE
  :output [FILE]      render results to FILE (no FILE: standard output)
  :format table|csv   choose how results are rendered
  :help               show this help
  :exit, :quit        stop reading the current input
";

/// Where directives come from and how deep in `:source` nesting they are
#[derive(Debug, Clone)]
pub struct ReadContext {
    name: String,
    dir: Option<PathBuf>,
    depth: SourceDepth,
}

impl ReadContext {
    /// A top-level input that is not a file (standard input, the prompt)
    pub fn top_level(name: impl Into<String>, max_depth: u32) -> Self {
        Self { name: name.into(), dir: None, depth: SourceDepth::top_level(max_depth) }
    }

    /// A file input at the given nesting depth
    #[must_use]
    pub fn file(path: &Path, depth: SourceDepth) -> Self {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).map(Path::to_path_buf);
        Self { name: path.display().to_string(), dir, depth }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn depth(&self) -> SourceDepth {
        self.depth
    }

    /// Resolve a `:source` argument against this input's directory
    #[must_use]
    pub fn resolve(&self, argument: &str) -> PathBuf {
        let path = Path::new(argument);
        match &self.dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Outcome of reading one input to its end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    /// Directives that failed, nested inputs included
    pub failures: usize,
    /// Reading stopped at `:exit` / `:quit`
    pub exited: bool,
}

impl ReadSummary {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failures == 0
    }
}

/// Read and evaluate every directive in `input`
pub fn batch(session: &mut Session, input: &mut dyn BufRead, ctx: &ReadContext) -> Result<ReadSummary> {
    debug!(input = ctx.name(), depth = ctx.depth().depth(), "reading directives");

    let mut parser = DirectiveParser::new();
    let mut summary = ReadSummary::default();
    let mut line = String::new();
    let mut line_no = 0;

    loop {
        line.clear();
        let read = input.read_line(&mut line).map_err(|e| {
            ShellError::resource(format!("Could not read {}", ctx.name()), e)
        })?;
        if read == 0 {
            break;
        }
        line_no += 1;

        for (at, directive) in parser.feed(line_no, line.trim_end_matches(['\n', '\r'])) {
            step(session, ctx, &mut summary, at, directive);
            if summary.exited {
                return Ok(summary);
            }
        }
    }

    if let Some((at, directive)) = parser.finish() {
        step(session, ctx, &mut summary, at, directive);
    }
    Ok(summary)
}

/// Read and evaluate a file at the given nesting depth
pub fn source_file(session: &mut Session, path: &Path, depth: SourceDepth) -> Result<ReadSummary> {
    let file = File::open(path).map_err(|e| {
        ShellError::resource(format!("Could not open source file {}", path.display()), e)
    })?;
    let ctx = ReadContext::file(path, depth);
    batch(session, &mut BufReader::new(file), &ctx)
}

/// Evaluate one directive, reporting a failure against its line
pub(crate) fn step(
    session: &mut Session,
    ctx: &ReadContext,
    summary: &mut ReadSummary,
    line: usize,
    directive: Directive,
) {
    if let Err(e) = evaluate(session, ctx, directive, summary) {
        summary.failures += 1;
        session.errors().report_at(ctx.name(), line, &e);
    }
}

/// Evaluate a single directive in the given read context
///
/// Failures of directives inside a nested `:source` are reported there and
/// added to `summary`; the returned error covers only this directive.
pub fn evaluate(
    session: &mut Session,
    ctx: &ReadContext,
    directive: Directive,
    summary: &mut ReadSummary,
) -> Result<()> {
    let (name, argument) = match directive {
        Directive::Query(statement) => return session.run_statement(&statement),
        Directive::Command { name, argument } => (name, argument),
    };

    match name.as_str() {
        "source" => {
            let argument = require(&name, argument)?;
            let path = ctx.resolve(&argument);
            let depth = ctx.depth().enter(&path)?;
            let nested = source_file(session, &path, depth)?;
            summary.failures += nested.failures;
            Ok(())
        }
        "output" => session.redirect_output(argument.as_deref().map(Path::new)),
        "format" => {
            let argument = require(&name, argument)?;
            session.render_format = RenderFormat::from_name(&argument)
                .ok_or_else(|| ShellError::execution(format!("Unknown format '{argument}'")))?;
            Ok(())
        }
        "help" => {
            let out = session.stdout();
            out.write_all(HELP.as_bytes())?;
            out.flush()?;
            Ok(())
        }
        "exit" | "quit" => {
            summary.exited = true;
            Ok(())
        }
        _ => Err(ShellError::execution(format!("Unknown command ':{name}'"))),
    }
}

fn require(name: &str, argument: Option<String>) -> Result<String> {
    argument.ok_or_else(|| ShellError::execution(format!(":{name} requires an argument")))
}
