//! Command-line interface definitions using clap
//!
//! Local operator commands against the same storage the server uses:
//! roster management, reports and settlement. Runs without the server.

pub mod commands;

use std::fmt;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::get_config;
use crate::services::{AgentService, ReportingService, SettlementService};
use crate::storage::StorageFactory;
use crate::system::event::EventBus;

/// Reftracker - marketing link attribution and commission tracking
#[derive(Parser)]
#[command(name = "reftracker")]
#[command(version)]
#[command(about = "Marketing link attribution and commission tracking", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage the agent roster
    Agent {
        #[command(subcommand)]
        action: AgentCommands,
    },

    /// Print a performance summary for a date range
    Report {
        /// Range start (YYYY-MM-DD), paired with --end
        #[arg(long)]
        start: Option<String>,

        /// Range end (YYYY-MM-DD), paired with --start
        #[arg(long)]
        end: Option<String>,

        /// Bucket width for the timeline: day or month
        #[arg(long, default_value = "day")]
        granularity: String,

        /// Keep agents without any activity in the listing
        #[arg(long)]
        full_roster: bool,
    },

    /// Preview or run a monthly settlement
    Settle {
        /// Month to settle (YYYY-MM)
        month: String,

        /// Stamp contacted conversions as settled instead of previewing
        #[arg(long)]
        execute: bool,

        /// Write the settlement as CSV to this path
        #[arg(long)]
        csv: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Agent roster commands
#[derive(Subcommand)]
pub enum AgentCommands {
    /// Register a new agent
    Add {
        /// Display name
        name: String,

        /// Explicit 6-character tracking code (generated when omitted)
        #[arg(long)]
        code: Option<String>,

        /// Fixed commission per conversion, in minor units
        #[arg(long, conflicts_with = "percentage")]
        fixed: Option<i64>,

        /// Commission as a percentage of the estimated value
        #[arg(long, conflicts_with = "fixed")]
        percentage: Option<f64>,

        /// Free-form note
        #[arg(long)]
        memo: Option<String>,

        /// Contact address
        #[arg(long)]
        contact: Option<String>,
    },

    /// List agents
    List {
        /// Include deactivated agents
        #[arg(long)]
        all: bool,
    },

    /// Deactivate an agent, keeping its click and conversion history
    Deactivate {
        /// Agent code
        code: String,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::ReftrackerError> for CliError {
    fn from(err: crate::errors::ReftrackerError) -> Self {
        use crate::errors::ReftrackerError;
        match err {
            ReftrackerError::InvalidArgument(_) | ReftrackerError::DateParse(_) => {
                CliError::ParseError(err.to_string())
            }
            _ => CliError::StorageError(err.to_string()),
        }
    }
}

/// Parse argv and run the command
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    run_cli_command(cli.command).await
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    // Config generate writes a file, no database connection needed
    if let Commands::Config { action } = cmd {
        let ConfigCommands::Generate { output_path, force } = action;
        return commands::config_generate(output_path, force).await;
    }

    // Create storage for commands that need it
    let storage = StorageFactory::create()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;

    match cmd {
        Commands::Agent { action } => {
            let events = Arc::new(EventBus::new(get_config().tracking.event_history_size));
            let service = AgentService::new(storage, events);
            match action {
                AgentCommands::Add {
                    name,
                    code,
                    fixed,
                    percentage,
                    memo,
                    contact,
                } => {
                    commands::add_agent(&service, name, code, fixed, percentage, memo, contact)
                        .await
                }
                AgentCommands::List { all } => commands::list_agents(&service, all).await,
                AgentCommands::Deactivate { code } => {
                    commands::deactivate_agent(&service, &code).await
                }
            }
        }

        Commands::Report {
            start,
            end,
            granularity,
            full_roster,
        } => {
            let service = ReportingService::new(storage);
            commands::run_report(&service, start, end, &granularity, full_roster).await
        }

        Commands::Settle {
            month,
            execute,
            csv,
        } => {
            let events = Arc::new(EventBus::new(get_config().tracking.event_history_size));
            let service = SettlementService::new(storage, events);
            commands::run_settle(&service, &month, execute, csv).await
        }

        Commands::Config { .. } => unreachable!("handled above"),
    }
}
