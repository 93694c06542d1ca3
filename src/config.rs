use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, redact_secret};
use crate::session::ConversationState;

pub const CONFIG_DIR_NAME: &str = "serverlessScout";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_AWS_PROFILE: &str = "default";
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// On-disk configuration document shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoutConfig {
    pub anthropic_key: String,
    #[serde(default = "default_aws_profile")]
    pub aws_profile: String,
    #[serde(default = "default_aws_region")]
    pub aws_region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_chat: Option<ConversationState>,
}

fn default_aws_profile() -> String {
    DEFAULT_AWS_PROFILE.to_string()
}

fn default_aws_region() -> String {
    DEFAULT_AWS_REGION.to_string()
}

impl ScoutConfig {
    pub fn new(anthropic_key: impl Into<String>) -> Self {
        Self {
            anthropic_key: anthropic_key.into(),
            aws_profile: default_aws_profile(),
            aws_region: default_aws_region(),
            current_chat: None,
        }
    }

    /// Copy of the document with the API key masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            anthropic_key: redact_secret(&self.anthropic_key),
            ..self.clone()
        }
    }
}

pub fn default_config_path() -> PathBuf {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Whole-document JSON store. Reads and writes are not locked, so two
/// processes updating the same file concurrently can lose a write.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn at_default_location() -> Self {
        Self::new(default_config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<ScoutConfig> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotInitialized {
                    path: self.path.display().to_string(),
                }
                .into());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read config file '{}'", self.path.display())
                });
            }
        };
        let parsed = serde_json::from_str::<ScoutConfig>(&content).map_err(|source| {
            ConfigError::Invalid {
                path: self.path.display().to_string(),
                source,
            }
        })?;
        Ok(parsed)
    }

    pub fn save(&self, config: &ScoutConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create config directory '{}'", parent.display())
                })?;
            }
        }
        let payload =
            serde_json::to_string_pretty(config).context("failed to serialize config file")?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, payload)
            .with_context(|| format!("failed to write config file '{}'", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "failed to move config file into place at '{}'",
                self.path.display()
            )
        })?;
        tracing::debug!(path = %self.path.display(), "config file written");
        Ok(())
    }

    /// Replaces the stored conversation state, keeping every other field.
    pub fn save_conversation(&self, state: &ConversationState) -> Result<()> {
        let mut config = self.load()?;
        config.current_chat = Some(state.clone());
        self.save(&config)
    }

    pub fn load_conversation(&self) -> Result<Option<ConversationState>> {
        Ok(self.load()?.current_chat)
    }
}
