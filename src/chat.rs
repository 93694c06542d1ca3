use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde::Serialize;
use serde_json::Value;

use crate::config::{ConfigStore, ScoutConfig};
use crate::context::StackQueryContext;
use crate::error::format_cli_error;
use crate::prompts::ModelSelection;
use crate::provider::{AnthropicClient, LlmBackend};
use crate::session::{ConversationState, Transcript};
use crate::theme;
use crate::tools::aws_cli::{AwsTarget, CloudCli, ShellCloudCli};
use crate::tools::codebase::{extract_file_paths, scan_codebase};
use crate::workflow::PromptChain;

pub const EXIT_SENTINEL: &str = "exit";
pub const ANSWER_PREFIX: &str = "answer:";
pub const COMMAND_PREFIX: &str = "command:";
pub const DEBUG_SNAPSHOT_FILE: &str = "debug_data.json";

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub code_base: PathBuf,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub stage: String,
    pub models: ModelSelection,
    pub verbose: bool,
    pub stream: bool,
    pub debug_snapshot: Option<PathBuf>,
    pub extra_ignores: Vec<String>,
}

impl ChatOptions {
    /// Flags win over the config file defaults.
    pub fn target(&self, config: &ScoutConfig) -> AwsTarget {
        AwsTarget {
            profile: self
                .profile
                .clone()
                .unwrap_or_else(|| config.aws_profile.clone()),
            region: self
                .region
                .clone()
                .unwrap_or_else(|| config.aws_region.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Operator input
// ---------------------------------------------------------------------------

pub trait LineReader {
    /// `Ok(None)` means the operator closed the input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl LineReader for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
            Err(err) => Err(err).context("failed to read input from terminal"),
        }
    }
}

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseKind {
    Answer(String),
    /// `literal` is the full response; `command` is what gets executed.
    Command { literal: String, command: String },
    Plain(String),
}

pub fn classify_response(text: &str) -> ResponseKind {
    if let Some(rest) = text.strip_prefix(ANSWER_PREFIX) {
        return ResponseKind::Answer(rest.trim().to_string());
    }
    if let Some(rest) = text.strip_prefix(COMMAND_PREFIX) {
        return ResponseKind::Command {
            literal: text.to_string(),
            command: rest.trim().to_string(),
        };
    }
    ResponseKind::Plain(text.to_string())
}

// ---------------------------------------------------------------------------
// Discovery pipeline
// ---------------------------------------------------------------------------

/// Maps a listed path onto `root`. Only normal components survive, so
/// `/serverless.yml` reads `root/serverless.yml` and `..` never leaves the root.
pub fn resolve_under_root(root: &Path, entry: &str) -> Option<PathBuf> {
    let relative = Path::new(entry)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect::<PathBuf>();
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(root.join(relative))
}

/// Reads each comma-separated path under `root` and wraps it in a tag named
/// after the file. Unreadable entries are logged and left out.
pub fn gather_iac_bundle(root: &Path, listing: &str) -> String {
    let mut bundle = String::new();
    for entry in listing.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let Some(path) = resolve_under_root(root, entry) else {
            tracing::warn!(file = %entry, "skipping IaC entry with no file component");
            continue;
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let name = Path::new(entry)
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| entry.to_string());
                bundle.push_str(&format!("<{name}>{content}</{name}>\n\n"));
            }
            Err(err) => {
                tracing::warn!(file = %entry, error = %err, "skipping unreadable IaC file");
            }
        }
    }
    bundle
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSnapshot<'a> {
    pub stack_name: &'a str,
    pub stack_resources: &'a Value,
    pub timestamp: String,
}

pub fn write_debug_snapshot(path: &Path, stack_name: &str, stack_resources: &Value) -> Result<()> {
    let snapshot = DebugSnapshot {
        stack_name,
        stack_resources,
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    };
    let payload =
        serde_json::to_string_pretty(&snapshot).context("failed to serialize debug snapshot")?;
    std::fs::write(path, payload)
        .with_context(|| format!("failed to write debug snapshot '{}'", path.display()))
}

/// Runs the one-time discovery stages and returns the filled context.
pub async fn initialize(
    chain: &PromptChain<'_>,
    cloud: &dyn CloudCli,
    options: &ChatOptions,
    target: &AwsTarget,
) -> Result<StackQueryContext> {
    let root = options.code_base.as_path();
    if !root.is_dir() {
        return Err(anyhow::anyhow!(
            "codebase directory does not exist: {}",
            root.display()
        ));
    }

    theme::status("Processing codebase...");
    let tree = scan_codebase(root, &options.extra_ignores)?
        .ok_or_else(|| anyhow::anyhow!("no readable files found in codebase {}", root.display()))?;
    let context = StackQueryContext::from_layout(extract_file_paths(&tree));
    tracing::info!(files = context.project_layout.len(), "codebase scanned");

    let listing = chain
        .discover_iac_files(&context.project_layout, false)
        .await
        .context("failed to identify IaC files")?
        .into_text()
        .await?;
    let context = context.with_iac_bundle(gather_iac_bundle(root, &listing));

    let stack_name = chain
        .infer_stack_name(context.iac_bundle(), &options.stage, false)
        .await
        .context("failed to infer stack name")?
        .into_text()
        .await?
        .trim()
        .to_string();
    if stack_name.is_empty() {
        return Err(anyhow::anyhow!("stack name inference returned no text"));
    }
    let context = context.with_stack_name(stack_name.as_str());

    theme::status(&format!("Processing stack resources for {stack_name}..."));
    let resources = cloud
        .list_stack_resources(&stack_name, target)
        .await
        .with_context(|| format!("failed to list resources of stack '{stack_name}'"))?;
    if let Some(path) = &options.debug_snapshot {
        if let Err(err) = write_debug_snapshot(path, &stack_name, &resources) {
            tracing::warn!(error = %err, "debug snapshot not written");
        }
    }
    let context = context.with_stack_resources(resources);

    let resource_list = chain
        .enumerate_resources(context.iac_bundle(), &options.stage, options.stream)
        .await
        .context("failed to enumerate stack resources")?
        .into_text()
        .await?;
    Ok(context.with_resource_list(resource_list))
}

// ---------------------------------------------------------------------------
// Interactive session
// ---------------------------------------------------------------------------

pub struct ChatSession<'a> {
    chain: PromptChain<'a>,
    cloud: &'a dyn CloudCli,
    context: StackQueryContext,
    target: AwsTarget,
    stream: bool,
    transcript: Transcript,
    conversation: Option<ConversationState>,
}

impl<'a> ChatSession<'a> {
    pub fn new(
        chain: PromptChain<'a>,
        cloud: &'a dyn CloudCli,
        context: StackQueryContext,
        target: AwsTarget,
        stream: bool,
    ) -> Self {
        Self {
            chain,
            cloud,
            context,
            target,
            stream,
            transcript: Transcript::new(),
            conversation: None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn conversation(&self) -> Option<&ConversationState> {
        self.conversation.as_ref()
    }

    /// One operator turn. The user entry is recorded before any failure that
    /// happens after the backend accepted the request; the assistant entry
    /// only on success.
    pub async fn handle_turn<W: Write + Send>(&mut self, input: &str, out: &mut W) -> Result<String> {
        let reply = if self.transcript.is_empty() {
            let (envelope, state) = self
                .chain
                .generate_command(&self.context, input, &self.target, self.stream)
                .await?;
            self.conversation = Some(state);
            self.transcript
                .push_user(self.context.opening_user_message(input));
            envelope.into_text().await?
        } else {
            self.transcript.push_user(input);
            self.chain
                .continue_conversation(self.transcript.turns(), self.stream)
                .await?
                .into_text()
                .await?
        };

        let label = theme::assistant_label();
        let content = match classify_response(&reply) {
            ResponseKind::Answer(text) | ResponseKind::Plain(text) => {
                writeln!(out, "{label} {text}").context("failed to write response")?;
                text
            }
            ResponseKind::Command { literal, command } => {
                writeln!(out, "{label} {literal}").context("failed to write response")?;
                let output = self.cloud.execute(&command).await?;
                let explanation = self
                    .chain
                    .explain_output(input, &command, &output.to_prompt_text(), self.stream)
                    .await?;
                write!(out, "{label} ").context("failed to write response")?;
                explanation.render_to(out).await?
            }
        };

        self.transcript.push_assistant(content.as_str());
        Ok(content)
    }

    /// Reads operator lines until `exit` or end of input. A failing turn is
    /// reported and the loop keeps going.
    pub async fn run<R: LineReader, W: Write + Send>(
        &mut self,
        reader: &mut R,
        out: &mut W,
    ) -> Result<()> {
        loop {
            let Some(line) = reader.read_line(&theme::input_prompt())? else {
                break;
            };
            let input = line.trim();
            if input.eq_ignore_ascii_case(EXIT_SENTINEL) {
                theme::status("Exiting chat. Goodbye!");
                break;
            }

            if let Err(err) = self.handle_turn(input, out).await {
                tracing::warn!(error = %err, "chat turn failed");
                theme::failure(&format_cli_error(&err, false));
            }
        }
        Ok(())
    }
}

/// Full chat flow with injected collaborators.
pub async fn run_chat_session<R: LineReader, W: Write + Send>(
    config: &ScoutConfig,
    options: &ChatOptions,
    store: &ConfigStore,
    backend: &dyn LlmBackend,
    cloud: &dyn CloudCli,
    reader: &mut R,
    out: &mut W,
) -> Result<()> {
    if options.verbose {
        theme::status("Verbose mode enabled");
    }
    let target = options.target(config);
    let chain = PromptChain::new(backend, store, options.models.clone()).with_verbose(options.verbose);
    let context = initialize(&chain, cloud, options, &target).await?;
    theme::success("Prerequisite steps completed. Starting chat...");
    theme::print_startup_banner(context.stack_name(), chain.models().selected());

    let mut session = ChatSession::new(chain, cloud, context, target, options.stream);
    session.run(reader, out).await
}

/// Entry point of `scout chat`. The config is loaded before anything else so
/// an uninitialized install fails without touching the network.
pub async fn run_chat_command(options: ChatOptions, store: &ConfigStore) -> Result<()> {
    let config = store.load()?;
    let backend = AnthropicClient::new(config.anthropic_key.clone());
    let cloud = ShellCloudCli;
    let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
    let mut stdout = io::stdout();
    run_chat_session(
        &config,
        &options,
        store,
        &backend,
        &cloud,
        &mut editor,
        &mut stdout,
    )
    .await
}
