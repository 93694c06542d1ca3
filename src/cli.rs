use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::config::{DEFAULT_AWS_PROFILE, DEFAULT_AWS_REGION};
use crate::prompts::DEFAULT_MODEL_ALIAS;

const CLI_EXAMPLES: &str = "Examples:\n\
  scout write-config --anthropic-key sk-ant-... --aws-profile staging --aws-region eu-west-1\n\
  scout list-config\n\
  scout chat --code-base ./my-service --stage dev\n\
  scout chat -c ./my-service -s prod -m sonnet-3.5 --prompts\n\
  scout --debug chat -c ./my-service --no-stream";

#[derive(Debug, Parser)]
#[command(name = "scout")]
#[command(version)]
#[command(about = "Chat with an LLM about a deployed AWS serverless stack")]
#[command(after_long_help = CLI_EXAMPLES)]
pub struct Cli {
    /// Print everything including prompts, responses and the debug snapshot.
    #[arg(short = 'd', long, global = true, default_value_t = false)]
    pub debug: bool,

    #[arg(long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_filter: String,

    /// Config file location (defaults to ~/serverlessScout/config.json).
    #[arg(long, env = "SCOUT_CONFIG", global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Discover the stack behind a codebase and chat about it")]
    Chat {
        /// AWS profile (defaults to the configured profile).
        #[arg(short = 'p', long)]
        profile: Option<String>,
        /// AWS region (defaults to the configured region).
        #[arg(short = 'r', long)]
        region: Option<String>,
        #[arg(short = 'c', long, required = true)]
        code_base: PathBuf,
        #[arg(short = 'm', long, default_value = DEFAULT_MODEL_ALIAS)]
        model: String,
        #[arg(short = 's', long, default_value = "prod")]
        stage: String,
        /// Print only LLM prompts and their responses.
        #[arg(short = 'P', long, default_value_t = false)]
        prompts: bool,
        /// Wait for complete responses instead of streaming them.
        #[arg(long, default_value_t = false)]
        no_stream: bool,
        /// Extra gitignore-style pattern to skip while scanning (repeatable).
        #[arg(long = "ignore")]
        ignore: Vec<String>,
    },
    #[command(about = "Write the config file with credentials and AWS defaults")]
    WriteConfig {
        #[arg(short = 'a', long, required = true)]
        anthropic_key: String,
        #[arg(short = 'p', long, default_value = DEFAULT_AWS_PROFILE)]
        aws_profile: String,
        #[arg(short = 'r', long, default_value = DEFAULT_AWS_REGION)]
        aws_region: String,
    },
    #[command(about = "Print the config file with the API key redacted")]
    ListConfig {
        #[arg(long, default_value_t = false)]
        show_sensitive_config: bool,
    },
}

pub fn command_label(command: &Commands) -> &'static str {
    match command {
        Commands::Chat { .. } => "chat",
        Commands::WriteConfig { .. } => "write-config",
        Commands::ListConfig { .. } => "list-config",
    }
}

/// `--debug` and `--prompts` raise the log filter so prompt traces show up.
/// A user filter that is already at least as verbose is kept as given.
pub fn effective_log_filter(cli: &Cli) -> String {
    let floor = if cli.debug {
        Some((LevelFilter::DEBUG, "debug"))
    } else if matches!(cli.command, Commands::Chat { prompts: true, .. }) {
        Some((LevelFilter::INFO, "info"))
    } else {
        None
    };
    match floor {
        Some((level, directive)) if !filter_reaches(&cli.log_filter, level) => {
            directive.to_string()
        }
        _ => cli.log_filter.clone(),
    }
}

fn filter_reaches(filter: &str, level: LevelFilter) -> bool {
    EnvFilter::try_new(filter)
        .ok()
        .and_then(|filter| filter.max_level_hint())
        .is_some_and(|hint| hint >= level)
}
