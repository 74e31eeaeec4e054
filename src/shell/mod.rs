//! Mode Dispatcher
//!
//! [`run`] is the whole life of one shell process: parse the command line,
//! finalize the configuration, open the connection and hand control to one
//! of three readers.
//!
//! # Modes
//! - Interactive: standard input is a terminal, nothing was queued with
//!   `--source`/`--output`, and `--non-interactive` was not given. Results
//!   are rendered as tables with nulls shown. Lines come from the console's
//!   line editor, or from standard input when the console has none.
//! - File-multiplexed: at least one file request was queued. Requests run in
//!   command-line order and results are rendered as CSV.
//! - Batch: everything else. Directives are read from standard input and
//!   results are rendered as CSV.
//!
//! # Teardown
//! Every resource acquired during startup lives in the [`Session`], so any
//! early return releases the connection, the output file, the logger and the
//! terminal, in that order, when the session goes out of scope.

use std::ffi::OsString;
use std::io::{BufRead, Write};

use tracing::debug;

use crate::args::{self, Invocation, Plan};
use crate::config::ColorPolicy;
use crate::connect::{self, Connector};
use crate::credentials::CredentialCallbacks;
use crate::error::{Result, ShellError};
use crate::guard::SourceDepth;
use crate::logging;
use crate::reader::{self, LineEditor, ReadContext, ReadSummary, StreamEditor, STDIN_NAME};
use crate::render::RenderFormat;
use crate::request::{FileRequestQueue, RequestKind};
use crate::session::{Console, ErrorStream, Session};

/// Process exit status for a successful run
pub const EXIT_SUCCESS: u8 = 0;

/// Process exit status for any failure
pub const EXIT_FAILURE: u8 = 1;

/// How the session reads its directives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    FileMultiplexed,
    Batch,
}

/// Choose the session mode
#[must_use]
pub const fn select_mode(stdin_is_terminal: bool, has_requests: bool, non_interactive: bool) -> Mode {
    if has_requests {
        Mode::FileMultiplexed
    } else if stdin_is_terminal && !non_interactive {
        Mode::Interactive
    } else {
        Mode::Batch
    }
}

/// Run the shell with the given arguments (program name first)
///
/// Returns the process exit status.
pub fn run<I, T>(argv: I, console: Console, connector: &dyn Connector) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let Console { stdin, mut stdout, stderr, stdin_is_terminal, stderr_is_terminal, terminal, editor } = console;

    let plan = match args::parse(argv) {
        Ok(Invocation::Run(plan)) => *plan,
        Ok(Invocation::Help(text) | Invocation::Version(text)) => {
            return match stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
                Ok(()) => EXIT_SUCCESS,
                Err(_) => EXIT_FAILURE,
            };
        }
        Err(e) => return report_startup_error(stderr, stderr_is_terminal, &e),
    };

    let Plan { config, requests, address, non_interactive, prompt_after_release, verbosity } = plan;
    let colorize = config.color.resolve(stderr_is_terminal);
    let mut session = Session::new(config, stdout, ErrorStream::new(stderr, colorize));
    session.attach_terminal(terminal);

    let launch = Launch {
        requests,
        address,
        non_interactive,
        prompt_after_release,
        verbosity,
        stdin,
        stdin_is_terminal,
        editor,
    };
    match execute(&mut session, launch, connector) {
        Ok(true) => EXIT_SUCCESS,
        Ok(false) => EXIT_FAILURE,
        Err(e) => {
            debug!(code = e.error_code(), "session failed");
            session.errors().report(&e.to_string());
            EXIT_FAILURE
        }
    }
}

/// Report an error raised before a session exists
///
/// The configured color policy is not known yet, so colorization follows
/// whether standard error is a terminal. Returns the failure status.
pub fn report_startup_error(stderr: Box<dyn Write>, stderr_is_terminal: bool, error: &ShellError) -> u8 {
    let colorize = ColorPolicy::Auto.resolve(stderr_is_terminal);
    ErrorStream::new(stderr, colorize).report(&error.to_string());
    EXIT_FAILURE
}

/// Parts of the plan consumed by dispatch
struct Launch {
    requests: FileRequestQueue,
    address: Option<String>,
    non_interactive: bool,
    prompt_after_release: bool,
    verbosity: u8,
    stdin: Box<dyn BufRead>,
    stdin_is_terminal: bool,
    editor: Option<Box<dyn LineEditor>>,
}

/// Finish setup and run the selected mode; `Ok(false)` means a directive failed
fn execute(session: &mut Session, mut launch: Launch, connector: &dyn Connector) -> Result<bool> {
    // -P needs the terminal as it stands at that point on the command line:
    // a --non-interactive given earlier has already released it
    if session.config.password_prompt && (!session.has_terminal() || launch.prompt_after_release) {
        return Err(ShellError::config("Cannot prompt for a password without a tty"));
    }
    if launch.non_interactive {
        session.release_terminal();
    }
    launch.requests.validate()?;

    session.attach_logger(logging::init(launch.verbosity));

    let mode = select_mode(launch.stdin_is_terminal, !launch.requests.is_empty(), launch.non_interactive);
    debug!(?mode, requests = launch.requests.len(), "selected mode");
    session.config.interactive = mode == Mode::Interactive;
    if session.config.interactive {
        session.config.password_prompt = true;
    }

    let connection = {
        let (config, terminal) = session.connect_parts();
        let mut callbacks = CredentialCallbacks::wire(terminal, config.password_prompt);
        connect::establish(connector, launch.address.as_deref(), config, &mut callbacks)?
    };
    session.attach_connection(connection);

    let max_depth = session.config.source_max_depth();
    let summary = match mode {
        Mode::Interactive => {
            session.render_format = RenderFormat::Table;
            session.render_flags.show_nulls = true;
            let mut editor: Box<dyn LineEditor> = match launch.editor.take() {
                Some(editor) => editor,
                None => Box::new(StreamEditor::new(launch.stdin)),
            };
            reader::interact(session, &mut *editor)?
        }
        Mode::FileMultiplexed => {
            session.render_format = RenderFormat::Csv;
            run_requests(session, &launch.requests)?
        }
        Mode::Batch => {
            session.render_format = RenderFormat::Csv;
            let ctx = ReadContext::top_level(STDIN_NAME, max_depth);
            reader::batch(session, &mut *launch.stdin, &ctx)?
        }
    };

    session.shutdown()?;
    Ok(mode == Mode::Interactive || summary.succeeded())
}

/// Process the queue in order; each source file is a top-level input
fn run_requests(session: &mut Session, requests: &FileRequestQueue) -> Result<ReadSummary> {
    let max_depth = session.config.source_max_depth();
    let mut total = ReadSummary::default();

    for request in requests {
        debug!(kind = %request.kind(), path = %request.path().display(), "processing request");
        match request.kind() {
            RequestKind::Output => session.redirect_output(Some(request.path()))?,
            RequestKind::Source => {
                let summary = reader::source_file(session, request.path(), SourceDepth::top_level(max_depth))?;
                total.failures += summary.failures;
            }
        }
    }
    Ok(total)
}
