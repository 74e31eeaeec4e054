//! Session Context
//!
//! A [`Session`] is the explicit context value threaded through the
//! dispatcher and every reader: the finalized configuration, the live
//! connection, the current render target and the process streams.
//!
//! # Resource ownership
//! Fields holding resources are declared in reverse acquisition order, so
//! dropping a session releases the connection first, then the redirected
//! output file, then the logger, and the controlling terminal last. Every
//! exit path (success, early return, error) goes through that single drop.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::connect::{Connection, ConnectionHandle};
use crate::credentials::Prompter;
use crate::error::{Result, ShellError};
use crate::logging::LoggerGuard;
use crate::reader::{LineEditor, TerminalEditor};
use crate::render::{self, RenderFlags, RenderFormat, ResultSet};

/// Process streams and the controlling terminal
///
/// `Console::stdio` wires the real process; tests build one from buffers.
pub struct Console {
    pub stdin: Box<dyn BufRead>,
    pub stdout: Box<dyn Write>,
    pub stderr: Box<dyn Write>,
    pub stdin_is_terminal: bool,
    pub stderr_is_terminal: bool,
    /// Controlling terminal, if the process has one
    pub terminal: Option<Box<dyn Prompter>>,
    /// Line editor for the interactive prompt; `None` reads lines from `stdin`
    pub editor: Option<Box<dyn LineEditor>>,
}

impl Console {
    /// Standard streams plus the controlling terminal
    pub fn stdio() -> Result<Self> {
        use std::io::IsTerminal;

        let terminal = crate::terminal::Terminal::open()?;
        let stdin_is_terminal = io::stdin().is_terminal();
        let editor = if stdin_is_terminal {
            Some(Box::new(TerminalEditor::new()?) as Box<dyn LineEditor>)
        } else {
            None
        };
        Ok(Self {
            stdin: Box::new(io::BufReader::new(io::stdin())),
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
            stdin_is_terminal,
            stderr_is_terminal: io::stderr().is_terminal(),
            terminal: terminal.map(|t| Box::new(t) as Box<dyn Prompter>),
            editor,
        })
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("stdin_is_terminal", &self.stdin_is_terminal)
            .field("stderr_is_terminal", &self.stderr_is_terminal)
            .field("terminal", &self.terminal.is_some())
            .field("editor", &self.editor.is_some())
            .finish_non_exhaustive()
    }
}

/// Error stream with optional ANSI colorization
pub struct ErrorStream {
    writer: Box<dyn Write>,
    colorize: bool,
}

impl ErrorStream {
    pub fn new(writer: Box<dyn Write>, colorize: bool) -> Self {
        Self { writer, colorize }
    }

    /// Write one error line
    pub fn report(&mut self, message: &str) {
        let styled = console::style(message).red().force_styling(self.colorize);
        if let Err(e) = writeln!(self.writer, "{styled}").and_then(|()| self.writer.flush()) {
            warn!("could not write to error stream: {e}");
        }
    }

    /// Write an error attributed to a location in an input
    pub fn report_at(&mut self, input: &str, line: usize, error: &ShellError) {
        self.report(&format!("{input}:{line}: {error}"));
    }
}

/// Where rendered results go
enum OutputTarget {
    Stdout,
    File { path: PathBuf, writer: BufWriter<File> },
}

/// The explicit context shared by the dispatcher and the readers
pub struct Session {
    /// Finalized configuration (password already scrubbed)
    pub config: SessionConfig,

    /// Format used when rendering results
    pub render_format: RenderFormat,

    /// Rendering options
    pub render_flags: RenderFlags,

    connection: Option<ConnectionHandle>,
    output: OutputTarget,
    logger: Option<LoggerGuard>,
    terminal: Option<Box<dyn Prompter>>,

    stdout: Box<dyn Write>,
    err: ErrorStream,
}

impl Session {
    pub fn new(config: SessionConfig, stdout: Box<dyn Write>, err: ErrorStream) -> Self {
        Self {
            config,
            render_format: RenderFormat::Csv,
            render_flags: RenderFlags::default(),
            connection: None,
            output: OutputTarget::Stdout,
            logger: None,
            terminal: None,
            stdout,
            err,
        }
    }

    /// Take ownership of the controlling terminal
    pub fn attach_terminal(&mut self, terminal: Option<Box<dyn Prompter>>) {
        self.terminal = terminal;
    }

    /// Release the controlling terminal early (non-interactive sessions)
    pub fn release_terminal(&mut self) {
        if self.terminal.take().is_some() {
            debug!("released controlling terminal");
        }
    }

    #[must_use]
    pub fn has_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Install the logger guard; it lives until the session is dropped
    pub fn attach_logger(&mut self, logger: LoggerGuard) {
        self.logger = Some(logger);
    }

    /// Configuration and terminal borrowed together for the connection attempt
    pub fn connect_parts(&mut self) -> (&mut SessionConfig, Option<&mut dyn Prompter>) {
        let terminal: Option<&mut dyn Prompter> = match self.terminal.as_mut() {
            Some(t) => Some(&mut **t),
            None => None,
        };
        (&mut self.config, terminal)
    }

    pub fn attach_connection(&mut self, connection: Option<ConnectionHandle>) {
        self.connection = connection;
    }

    pub fn connection(&mut self) -> Option<&mut (dyn Connection + 'static)> {
        self.connection.as_mut().and_then(ConnectionHandle::get_mut)
    }

    /// Execute a statement and render its results to the current target
    pub fn run_statement(&mut self, statement: &str) -> Result<()> {
        let connection = self
            .connection()
            .ok_or_else(|| ShellError::execution("Not connected to a database"))?;
        let result = connection.run(statement)?;
        self.render(&result)
    }

    pub fn render(&mut self, result: &ResultSet) -> Result<()> {
        let (format, flags) = (self.render_format, self.render_flags);
        let out = self.output();
        render::render(result, out, format, flags)?;
        out.flush()?;
        Ok(())
    }

    /// Current render target
    pub fn output(&mut self) -> &mut dyn Write {
        match &mut self.output {
            OutputTarget::Stdout => &mut *self.stdout,
            OutputTarget::File { writer, .. } => writer,
        }
    }

    /// Path of the current output file, if redirected
    #[must_use]
    pub fn output_path(&self) -> Option<&Path> {
        match &self.output {
            OutputTarget::Stdout => None,
            OutputTarget::File { path, .. } => Some(path),
        }
    }

    /// Redirect rendering to `path`, or back to standard output with `None`
    ///
    /// The previous output file is flushed and closed before the new one is
    /// opened.
    pub fn redirect_output(&mut self, path: Option<&Path>) -> Result<()> {
        self.close_output()?;
        if let Some(path) = path {
            let file = File::create(path).map_err(|e| {
                ShellError::resource(format!("Could not open output file {}", path.display()), e)
            })?;
            debug!(path = %path.display(), "redirecting output");
            self.output = OutputTarget::File { path: path.to_path_buf(), writer: BufWriter::new(file) };
        }
        Ok(())
    }

    fn close_output(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.output, OutputTarget::Stdout) {
            OutputTarget::Stdout => Ok(()),
            OutputTarget::File { path, mut writer } => writer.flush().map_err(|e| {
                ShellError::resource(format!("Could not write output file {}", path.display()), e)
            }),
        }
    }

    /// Standard output, regardless of redirection
    pub fn stdout(&mut self) -> &mut dyn Write {
        &mut *self.stdout
    }

    pub fn errors(&mut self) -> &mut ErrorStream {
        &mut self.err
    }

    /// Close the connection and output now instead of at drop
    pub fn shutdown(&mut self) -> Result<()> {
        let closed = match self.connection.take() {
            Some(mut connection) => connection.close(),
            None => Ok(()),
        };
        let flushed = self.close_output();
        let _ = self.stdout.flush();
        closed.and(flushed)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // connection before output; logger and terminal follow as fields
        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.close() {
                warn!("error while closing connection: {e}");
            }
        }
        if let Err(e) = self.close_output() {
            warn!("{e}");
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("render_format", &self.render_format)
            .field("connection", &self.connection)
            .field("output", &self.output_path())
            .field("terminal", &self.terminal.is_some())
            .finish_non_exhaustive()
    }
}
