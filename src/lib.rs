pub mod cli;
pub mod config;
pub mod display;
pub mod filter;
pub mod message;

use anyhow::{Context, bail};
use tracing_subscriber::EnvFilter;

use crate::config::ChannelState;
use crate::display::EvalRecord;
pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use filter::{ContextMap, DynValue, Filter, FilterError, Type};
pub use message::{ChatMessage, RecordedMessage, build_context_map, parse_message_file};

/// Evaluate `filter` against each message, building a fresh context per message.
pub fn evaluate_messages(
    filter: &Filter,
    messages: &[RecordedMessage],
    channels: &ChannelState,
) -> Vec<EvalRecord> {
    messages
        .iter()
        .map(|recorded| {
            let message = &recorded.message;
            let context = build_context_map(message, channels);
            EvalRecord {
                line: recorded.line,
                timestamp: message.timestamp.as_ref().map(display::format_timestamp),
                channel: message.channel.clone(),
                author: message.author.shown_name().to_string(),
                content: message.content.clone(),
                result: filter.execute(&context),
            }
        })
        .collect()
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

fn compile_filter(text: &str) -> anyhow::Result<Filter> {
    match Filter::from_string(text) {
        Ok(filter) => Ok(filter),
        Err(err) => {
            eprint!("{}", display::format_filter_error(&err.message));
            bail!("invalid filter");
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    init_tracing(cli.verbose);

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let config = config::load_config(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config");
    }

    match &cli.command {
        Commands::Check { filter, debug } => {
            let filter = compile_filter(filter)?;
            print!("{}", display::format_check_report(&filter, *debug));
        }
        Commands::Eval {
            filter,
            messages,
            format,
            all,
        } => {
            let filter = compile_filter(filter)?;
            let recorded = parse_message_file(messages).with_context(|| {
                format!("Failed to parse message file '{}'", messages.display())
            })?;

            let records = evaluate_messages(&filter, &recorded, &config.channels);

            match format {
                OutputFormat::Text => {
                    print!(
                        "{}",
                        display::format_eval_text(&records, filter.return_type(), *all)
                    );
                }
                OutputFormat::Json => {
                    let shown: Vec<EvalRecord> = records
                        .into_iter()
                        .filter(|r| *all || filter.return_type() != Type::Bool || r.is_match())
                        .collect();
                    println!("{}", display::format_eval_json(&shown)?);
                }
            }
        }
        Commands::Identifiers => {
            println!("{}", display::identifiers_table());
        }
    }

    Ok(())
}
