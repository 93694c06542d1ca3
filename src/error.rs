use thiserror::Error;

use crate::tools::aws_cli::CloudCliError;

/// Failures of the durable config store.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at '{path}'. Please run write-config first.")]
    NotInitialized { path: String },
    #[error("config file '{path}' is not valid JSON: {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of the prompt chain that are not transport problems.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("no current chat found. Run a chat query before continuing a conversation.")]
    NoActiveConversation,
}

/// Error reported by the Anthropic Messages API.
#[derive(Debug, Error)]
#[error("anthropic API error ({kind}): {message}")]
pub struct ProviderError {
    pub status: Option<u16>,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Provider,
    Cloud,
    Input,
    Internal,
}

impl ErrorCategory {
    pub fn code(self) -> &'static str {
        match self {
            ErrorCategory::Config => "CONFIG",
            ErrorCategory::Provider => "PROVIDER",
            ErrorCategory::Cloud => "CLOUD",
            ErrorCategory::Input => "INPUT",
            ErrorCategory::Internal => "INTERNAL",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            ErrorCategory::Config => {
                "Run scout write-config --anthropic-key <KEY> or point --config-path at an existing file."
            }
            ErrorCategory::Provider => {
                "Check the Anthropic API key in the config file and retry with --debug for request logs."
            }
            ErrorCategory::Cloud => {
                "Verify the aws CLI is installed and the selected --profile/--region can read the stack."
            }
            ErrorCategory::Input => "Run scout --help and correct command arguments.",
            ErrorCategory::Internal => {
                "Retry with RUST_LOG=debug. If it persists, capture logs and open an issue."
            }
        }
    }
}

pub fn categorize_error(err: &anyhow::Error) -> ErrorCategory {
    for cause in err.chain() {
        if cause.is::<ConfigError>() {
            return ErrorCategory::Config;
        }
        if cause.is::<ProviderError>() || cause.is::<ConversationError>() {
            return ErrorCategory::Provider;
        }
        if cause.is::<CloudCliError>() {
            return ErrorCategory::Cloud;
        }
    }

    let msg = format!("{err:#}").to_ascii_lowercase();

    if msg.contains("unknown model")
        || msg.contains("invalid value")
        || msg.contains("does not exist")
        || msg.contains("failed to read input")
    {
        return ErrorCategory::Input;
    }

    if msg.contains("anthropic") || msg.contains("api key") || msg.contains("provider") {
        return ErrorCategory::Provider;
    }

    if msg.contains("config") {
        return ErrorCategory::Config;
    }

    if msg.contains("aws") || msg.contains("cloudformation") || msg.contains("stack") {
        return ErrorCategory::Cloud;
    }

    ErrorCategory::Internal
}

pub fn format_cli_error(err: &anyhow::Error, show_sensitive_config: bool) -> String {
    let category = categorize_error(err);
    let rendered_error = render_error_message(err, show_sensitive_config);
    format!(
        "[{}] {}\nHint: {}",
        category.code(),
        rendered_error,
        category.hint()
    )
}

pub fn render_error_message(err: &anyhow::Error, show_sensitive_config: bool) -> String {
    let text = format!("{err:#}");
    if show_sensitive_config {
        text
    } else {
        redact_sensitive_text(&text)
    }
}

pub fn redact_sensitive_text(text: &str) -> String {
    redact_api_keys(text)
}

/// Masks every `sk-ant-...` token found in `text`.
pub fn redact_api_keys(text: &str) -> String {
    const KEY_PREFIX: &str = "sk-ant-";
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;

    while let Some(offset) = text[cursor..].find(KEY_PREFIX) {
        let start = cursor + offset;
        out.push_str(&text[cursor..start]);

        let remainder = &text[start..];
        let end = remainder
            .find(|ch: char| {
                ch.is_whitespace()
                    || matches!(
                        ch,
                        '"' | '\'' | '(' | ')' | '[' | ']' | '{' | '}' | ',' | ';'
                    )
            })
            .unwrap_or(remainder.len());
        out.push_str(&redact_secret(&remainder[..end]));
        cursor = start + end;
    }

    out.push_str(&text[cursor..]);
    out
}

/// Keeps a short recognizable prefix of a secret and hides the rest.
pub fn redact_secret(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let visible: String = value.chars().take(7).collect();
    if visible.len() == value.len() {
        "[REDACTED]".to_string()
    } else {
        format!("{visible}[REDACTED]")
    }
}
