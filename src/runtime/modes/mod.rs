//! Mode routing
//!
//! One binary, two entry points: a long-running HTTP server and a local
//! admin CLI. The mode is picked from the command line before tokio spins up.

pub mod cli;
pub mod server;

pub use cli::run_cli;
pub use server::run_server;

/// Mode detection result
#[derive(Debug, PartialEq)]
pub enum Mode {
    Server,
    Cli,
}

/// Any argument beyond the binary name means CLI mode; a bare invocation
/// starts the server.
pub fn detect_mode(args: &[String]) -> Mode {
    if args.len() > 1 {
        return Mode::Cli;
    }
    Mode::Server
}
