use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Check chat message filters and run them over recorded messages
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML config file with channel state (watching/live channels)
    #[arg(long, global = true, env = "CHAT_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// When to use colored output
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and type check a filter
    Check {
        /// Filter expression, e.g. 'author.badges contains "moderator"'
        filter: String,

        /// Print the typed expression tree
        #[arg(long)]
        debug: bool,
    },
    /// Evaluate a filter against every message of a JSON-lines file
    Eval {
        /// Filter expression
        filter: String,

        /// JSON-lines file with one message per line
        messages: PathBuf,

        /// Output format
        #[arg(short = 'F', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Show every message with its result, not only the matching ones
        #[arg(short, long)]
        all: bool,
    },
    /// List the identifiers filters can use
    Identifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
