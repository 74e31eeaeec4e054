//! Command line surface
//!
//! Arguments are declared with clap derive and folded into a
//! [`SessionConfig`] plus the queue of `--source` / `--output` requests.
//! Values are validated as they are applied, so a bad value never reaches
//! the configuration. `--help` and `--version` are not errors; they become
//! [`Invocation::Help`] and [`Invocation::Version`].

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};

use crate::config::{ColorPolicy, SessionConfig};
use crate::error::{Result, ShellError};
use crate::request::{FileRequest, FileRequestQueue};

/// cyphersh - an interactive shell and batch runner for graph databases
#[derive(Parser, Debug)]
#[command(name = "cyphersh", version)]
#[command(about = "Interactive shell and batch runner for Cypher graph databases")]
pub struct Args {
    /// Store interactive history in FILE (an empty value disables history)
    #[arg(long, value_name = "FILE")]
    history_file: Option<PathBuf>,

    /// Do not store interactive history
    #[arg(long)]
    no_history: bool,

    /// Colorize error output
    #[arg(long, visible_alias = "colourise", overrides_with = "no_colorize")]
    colorize: bool,

    /// Never colorize error output
    #[arg(long, visible_alias = "no-colourise", overrides_with = "colorize")]
    no_colorize: bool,

    /// File containing trusted certificates
    #[arg(long, value_name = "FILE")]
    ca_file: Option<PathBuf>,

    /// Directory containing trusted certificates
    #[arg(long, value_name = "DIR")]
    ca_directory: Option<PathBuf>,

    /// Do not verify the server's identity
    #[arg(long)]
    insecure: bool,

    /// Do not prompt, even when standard input is a terminal
    #[arg(long)]
    non_interactive: bool,

    /// Username to connect as
    #[arg(short, long, env = "CYPHERSH_USERNAME")]
    username: Option<String>,

    /// Password to connect with
    #[arg(short, long, env = "CYPHERSH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Prompt for a password, even when standard input is not a terminal
    #[arg(short = 'P', long = "password-prompt")]
    password_prompt: bool,

    /// Known-hosts file used to check server fingerprints
    #[arg(long, value_name = "FILE")]
    known_hosts: Option<PathBuf>,

    /// Do not check server fingerprints against the known-hosts file
    #[arg(long)]
    no_known_hosts: bool,

    /// Render results of the following --source files to FILE
    #[arg(short = 'o', long = "output", value_name = "FILE", action = ArgAction::Append)]
    output: Vec<PathBuf>,

    /// Evaluate the directives in FILE (repeatable, disables the prompt)
    #[arg(short = 'i', long = "source", value_name = "FILE", action = ArgAction::Append)]
    source: Vec<PathBuf>,

    /// Maximum nesting of :source inclusions
    #[arg(long, value_name = "N", value_parser = parse_source_max_depth)]
    source_max_depth: Option<u32>,

    /// Maximum number of requests in flight to the server
    #[arg(long, value_name = "N", value_parser = parse_pipeline_max)]
    pipeline_max: Option<u32>,

    /// Increase logging verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Server to connect to
    #[arg(value_name = "URL | host[:port]")]
    address: Option<String>,
}

/// Everything needed to start a session
#[derive(Debug)]
pub struct Plan {
    pub config: SessionConfig,
    pub requests: FileRequestQueue,
    pub address: Option<String>,
    /// `--non-interactive` was given
    pub non_interactive: bool,
    /// `--non-interactive` appeared before `-P`, so the terminal is gone when
    /// the prompt is requested
    pub prompt_after_release: bool,
    /// Number of `-v` flags
    pub verbosity: u8,
}

/// What the command line asks for
#[derive(Debug)]
pub enum Invocation {
    /// Print usage and exit successfully
    Help(String),
    /// Print the version and exit successfully
    Version(String),
    /// Start a session
    Run(Box<Plan>),
}

/// Parse the full argument list (program name first)
pub fn parse<I, T>(argv: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match Args::command().try_get_matches_from(argv) {
        Ok(matches) => matches,
        Err(e) => {
            let rendered = e.render().to_string();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    Ok(Invocation::Help(rendered))
                }
                ErrorKind::DisplayVersion => Ok(Invocation::Version(rendered)),
                _ => Err(ShellError::usage(rendered.trim_end())),
            };
        }
    };

    let requests = request_queue(&matches)?;
    let prompt_after_release = match (flag_index(&matches, "non_interactive"), flag_index(&matches, "password_prompt")) {
        (Some(release), Some(prompt)) => release < prompt,
        _ => false,
    };
    let args = Args::from_arg_matches(&matches).map_err(|e| ShellError::usage(e.to_string()))?;
    args.into_plan(requests, prompt_after_release).map(|plan| Invocation::Run(Box::new(plan)))
}

impl Args {
    fn into_plan(self, requests: FileRequestQueue, prompt_after_release: bool) -> Result<Plan> {
        let mut config = SessionConfig::default();

        if let Some(max) = self.pipeline_max {
            config.set_pipeline_max(max)?;
        }
        if let Some(depth) = self.source_max_depth {
            config.set_source_max_depth(depth)?;
        }

        if self.no_history {
            config.history_file = None;
        } else if let Some(path) = self.history_file {
            config.history_file = (!path.as_os_str().is_empty()).then_some(path);
        }

        config.color = if self.colorize {
            ColorPolicy::Always
        } else if self.no_colorize {
            ColorPolicy::Never
        } else {
            ColorPolicy::Auto
        };

        config.trust.insecure = self.insecure;
        config.trust.ca_file = self.ca_file;
        config.trust.ca_directory = self.ca_directory;
        if let Some(path) = self.known_hosts {
            config.trust.known_hosts = Some(path);
        }
        if self.no_known_hosts {
            config.trust.trust_known_hosts = false;
        }

        config.credentials.username = self.username;
        config.credentials.password = self.password;
        config.password_prompt = self.password_prompt;

        Ok(Plan {
            config,
            requests,
            address: self.address,
            non_interactive: self.non_interactive,
            prompt_after_release,
            verbosity: self.verbose,
        })
    }
}

/// Rebuild the `--source` / `--output` interleaving in command-line order
fn request_queue(matches: &ArgMatches) -> Result<FileRequestQueue> {
    let mut ordered: Vec<(usize, FileRequest)> = Vec::new();
    collect_requests(matches, "source", |p| FileRequest::source(p), &mut ordered);
    collect_requests(matches, "output", |p| FileRequest::output(p), &mut ordered);
    ordered.sort_by_key(|(index, _)| *index);

    let mut queue = FileRequestQueue::new();
    for (_, request) in ordered {
        queue.push(request)?;
    }
    Ok(queue)
}

fn collect_requests(
    matches: &ArgMatches,
    id: &str,
    make: fn(PathBuf) -> FileRequest,
    ordered: &mut Vec<(usize, FileRequest)>,
) {
    if let (Some(indices), Some(values)) = (matches.indices_of(id), matches.get_many::<PathBuf>(id)) {
        ordered.extend(indices.zip(values.cloned().map(make)));
    }
}

/// Position of a flag given on the command line
fn flag_index(matches: &ArgMatches, id: &str) -> Option<usize> {
    if matches.value_source(id) == Some(ValueSource::CommandLine) {
        matches.index_of(id)
    } else {
        None
    }
}

fn parse_pipeline_max(value: &str) -> std::result::Result<u32, String> {
    parse_positive(value).ok_or_else(|| format!("Invalid pipeline-max '{value}'"))
}

fn parse_source_max_depth(value: &str) -> std::result::Result<u32, String> {
    parse_positive(value).ok_or_else(|| format!("Invalid source-max-depth '{value}'"))
}

fn parse_positive(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|n| *n >= 1)
}
