use std::io::Write;

use anyhow::{Context, Result};

use crate::chat::{ChatOptions, DEBUG_SNAPSHOT_FILE, run_chat_command};
use crate::cli::{Cli, Commands, command_label};
use crate::config::{ConfigStore, ScoutConfig};
use crate::prompts::ModelSelection;

pub fn config_store_for(cli: &Cli) -> ConfigStore {
    match &cli.config_path {
        Some(path) => ConfigStore::new(path.clone()),
        None => ConfigStore::at_default_location(),
    }
}

pub async fn run_cli(cli: Cli) -> Result<()> {
    let store = config_store_for(&cli);
    tracing::debug!(
        command = command_label(&cli.command),
        config = %store.path().display(),
        "dispatching command"
    );

    match cli.command {
        Commands::Chat {
            profile,
            region,
            code_base,
            model,
            stage,
            prompts,
            no_stream,
            ignore,
        } => {
            let options = ChatOptions {
                code_base,
                profile,
                region,
                stage,
                models: ModelSelection::from_alias(&model)?,
                verbose: cli.debug || prompts,
                stream: !no_stream,
                debug_snapshot: cli.debug.then(|| DEBUG_SNAPSHOT_FILE.into()),
                extra_ignores: ignore,
            };
            run_chat_command(options, &store).await
        }
        Commands::WriteConfig {
            anthropic_key,
            aws_profile,
            aws_region,
        } => {
            let path = write_config(&store, anthropic_key, aws_profile, aws_region)?;
            println!("Config written to {path}");
            Ok(())
        }
        Commands::ListConfig {
            show_sensitive_config,
        } => list_config(&store, show_sensitive_config, &mut std::io::stdout()),
    }
}

/// Replaces credentials and AWS defaults. A stored conversation is kept.
pub fn write_config(
    store: &ConfigStore,
    anthropic_key: String,
    aws_profile: String,
    aws_region: String,
) -> Result<String> {
    let anthropic_key = anthropic_key.trim().to_string();
    if anthropic_key.is_empty() {
        return Err(anyhow::anyhow!("invalid value for --anthropic-key: key is empty"));
    }
    let current_chat = match store.load() {
        Ok(existing) => existing.current_chat,
        Err(_) => None,
    };
    let config = ScoutConfig {
        anthropic_key,
        aws_profile,
        aws_region,
        current_chat,
    };
    store.save(&config)?;
    Ok(store.path().display().to_string())
}

pub fn list_config<W: Write>(
    store: &ConfigStore,
    show_sensitive_config: bool,
    out: &mut W,
) -> Result<()> {
    let config = store.load()?;
    let shown = if show_sensitive_config {
        config
    } else {
        config.redacted()
    };
    let rendered =
        serde_json::to_string_pretty(&shown).context("failed to render config file")?;
    writeln!(out, "{rendered}").context("failed to write config listing")
}
