//! cyphersh CLI Entry Point
//!
//! Wires the real process streams, the controlling terminal and the TCP
//! connector into [`cyphersh::run`]. Results go to stdout; errors and logs
//! go to stderr.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use cyphersh::{Console, TcpConnector};

fn main() -> ExitCode {
    let status = match Console::stdio() {
        Ok(console) => cyphersh::run(std::env::args_os(), console, &TcpConnector::default()),
        Err(e) => cyphersh::report_startup_error(Box::new(io::stderr()), io::stderr().is_terminal(), &e),
    };
    ExitCode::from(status)
}
