use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub const AWS_BINARY: &str = "aws";

/// Profile and region every generated command is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsTarget {
    pub profile: String,
    pub region: String,
}

#[derive(Debug, Error)]
pub enum CloudCliError {
    #[error("failed to launch command '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command '{command}' failed (exit code {code}): {stderr}")]
    Failed {
        command: String,
        code: String,
        stderr: String,
    },
    #[error("command '{command}' returned invalid JSON: {source}")]
    InvalidJson {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parsed stdout of a successful command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Json(Value),
    Raw(String),
}

impl CommandOutput {
    pub fn parse(stdout: &str) -> Self {
        match serde_json::from_str::<Value>(stdout) {
            Ok(value) => CommandOutput::Json(value),
            Err(_) => CommandOutput::Raw(stdout.to_string()),
        }
    }

    /// Text handed to the explanation prompt.
    pub fn to_prompt_text(&self) -> String {
        match self {
            CommandOutput::Json(value) => value.to_string(),
            CommandOutput::Raw(text) => Value::String(text.clone()).to_string(),
        }
    }
}

#[async_trait]
pub trait CloudCli: Send + Sync {
    /// Runs one shell command line. A non-zero exit or any stderr output is
    /// a failure; an empty stdout is a successful `Raw("")`.
    async fn execute(&self, command: &str) -> Result<CommandOutput>;

    async fn list_stack_resources(&self, stack_name: &str, target: &AwsTarget) -> Result<Value> {
        let command = list_stack_resources_command(stack_name, target)?;
        let output = self.execute(&command).await?;
        match output {
            CommandOutput::Json(value) => Ok(value),
            CommandOutput::Raw(text) => serde_json::from_str::<Value>(&text).map_err(|source| {
                anyhow::Error::from(CloudCliError::InvalidJson { command, source })
            }),
        }
    }
}

pub fn list_stack_resources_command(stack_name: &str, target: &AwsTarget) -> Result<String> {
    let args = [
        AWS_BINARY,
        "cloudformation",
        "list-stack-resources",
        "--stack-name",
        stack_name,
        "--profile",
        target.profile.as_str(),
        "--region",
        target.region.as_str(),
    ];
    shlex::try_join(args)
        .map_err(|err| anyhow::anyhow!("cannot quote stack resource command arguments: {err}"))
}

/// Runs commands through `sh -c` and waits for them to finish.
#[derive(Debug, Clone, Default)]
pub struct ShellCloudCli;

#[async_trait]
impl CloudCli for ShellCloudCli {
    async fn execute(&self, command: &str) -> Result<CommandOutput> {
        tracing::info!(command = %command, lifecycle = "requested", "executing cloud command");
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|source| CloudCliError::Launch {
                command: command.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        check_command_output(command, output.status.code(), &stdout, &stderr)
    }
}

pub fn check_command_output(
    command: &str,
    exit_code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<CommandOutput> {
    if exit_code != Some(0) || !stderr.is_empty() {
        tracing::info!(
            command = %command,
            lifecycle = "failed",
            exit_code = ?exit_code,
            "cloud command failed"
        );
        return Err(CloudCliError::Failed {
            command: command.to_string(),
            code: exit_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            stderr: stderr.trim().to_string(),
        }
        .into());
    }
    tracing::info!(command = %command, lifecycle = "completed", "cloud command completed");
    Ok(CommandOutput::parse(stdout))
}
