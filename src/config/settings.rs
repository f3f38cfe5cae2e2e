//! Configuration settings for podtext.
//!
//! Configuration is resolved with the following precedence, highest first:
//! command-line flag, environment variable, local `./.podtext/config`,
//! global `$HOME/.podtext/config`, built-in default. Flags are applied by
//! the CLI after loading; this module handles the rest.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PodtextError, Result};

/// Name of the configuration directory (under `$HOME` or the working directory).
pub const CONFIG_DIR_NAME: &str = ".podtext";
/// Name of the configuration file inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "config";
/// Name of the user-editable prompt file inside the configuration directory.
pub const PROMPTS_FILE_NAME: &str = "prompts.md";

/// Whisper model names accepted without a warning.
pub const VALID_WHISPER_MODELS: &[&str] = &["tiny", "base", "small", "medium", "large"];

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub whisper: WhisperSettings,
    pub analysis: AnalysisSettings,
    pub defaults: DefaultsSettings,
}

/// AI backend credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApiSettings {
    /// Claude API key. Empty means the environment variable is required.
    pub anthropic_key: String,
}

/// Storage locations and media retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory for downloaded media files.
    pub media_dir: String,
    /// Root directory for markdown output.
    pub output_dir: String,
    /// Delete downloaded media after successful transcription.
    pub temp_storage: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            media_dir: ".podtext/downloads/".to_string(),
            output_dir: ".podtext/output/".to_string(),
            temp_storage: false,
        }
    }
}

/// ASR backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperSettings {
    /// Whisper model size: tiny, base, small, medium, large.
    pub model: String,
}

impl Default for WhisperSettings {
    fn default() -> Self {
        Self {
            model: "base".to_string(),
        }
    }
}

/// Analysis engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Claude model identifier used for analysis calls.
    pub claude_model: String,
    /// Minimum confidence required before an ad span is excised (0..1).
    pub ad_confidence_threshold: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            claude_model: "claude-sonnet-4-20250514".to_string(),
            ad_confidence_threshold: 0.9,
        }
    }
}

/// CLI listing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsSettings {
    /// Default number of podcast search results.
    pub search_limit: usize,
    /// Default number of episodes to list.
    pub episode_limit: usize,
}

impl Default for DefaultsSettings {
    fn default() -> Self {
        Self {
            search_limit: 10,
            episode_limit: 10,
        }
    }
}

/// Default configuration written to the global config file on first run.
const DEFAULT_CONFIG_TOML: &str = r#"# podtext configuration file

[api]
# Claude API key (leave empty to use the ANTHROPIC_API_KEY environment variable)
anthropic_key = ""

[storage]
# Directory for downloaded media files
media_dir = ".podtext/downloads/"
# Directory where transcripts are written
output_dir = ".podtext/output/"
# Delete downloaded media after successful transcription
temp_storage = false

[whisper]
# Whisper model size: tiny, base, small, medium, large
model = "base"

[analysis]
# Claude model used for transcript analysis
claude_model = "claude-sonnet-4-20250514"
# Minimum confidence required before an advertisement is removed (0.0 - 1.0)
ad_confidence_threshold = 0.9

[defaults]
# Default number of search results to show
search_limit = 10
# Default number of episodes to show
episode_limit = 10
"#;

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Creates the global config file with defaults if it does not exist,
    /// then merges the local file over the global one. The
    /// `ANTHROPIC_API_KEY` environment variable overrides `api.anthropic_key`.
    pub fn load() -> Result<Self> {
        Self::ensure_global_config_exists()?;

        let global = Self::parse_file(&Self::global_config_path())?;
        let local = Self::parse_file(&Self::local_config_path())?;

        let merged = match (global, local) {
            (Some(g), Some(l)) => merge_values(g, l),
            (Some(g), None) => g,
            (None, Some(l)) => l,
            (None, None) => toml::Value::Table(toml::map::Map::new()),
        };

        let mut config: Config = merged
            .try_into()
            .map_err(|e| PodtextError::ConfigInvalid(e.to_string()))?;

        config.apply_env_key(std::env::var("ANTHROPIC_API_KEY").ok());
        Ok(config)
    }

    /// Load configuration from a single explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let value = Self::parse_file(path)?.ok_or_else(|| {
            PodtextError::ConfigInvalid(format!("config file not found: {}", path.display()))
        })?;

        let mut config: Config = value
            .try_into()
            .map_err(|e| PodtextError::ConfigInvalid(e.to_string()))?;

        config.apply_env_key(std::env::var("ANTHROPIC_API_KEY").ok());
        Ok(config)
    }

    /// Parse a config file into a TOML value. Missing file yields `None`;
    /// an unreadable or unparsable file is a configuration error.
    fn parse_file(path: &Path) -> Result<Option<toml::Value>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| PodtextError::ConfigInvalid(format!("{}: {}", path.display(), e)))?;
        let value = content
            .parse::<toml::Value>()
            .map_err(|e| PodtextError::ConfigInvalid(format!("{}: {}", path.display(), e)))?;
        Ok(Some(value))
    }

    /// Path to the global config file (`$HOME/.podtext/config`).
    pub fn global_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Path to the local config file (`./.podtext/config`).
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
    }

    /// Path to the prompt file: local if present, otherwise global.
    pub fn prompts_path() -> PathBuf {
        let local = PathBuf::from(CONFIG_DIR_NAME).join(PROMPTS_FILE_NAME);
        if local.exists() {
            return local;
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
            .join(PROMPTS_FILE_NAME)
    }

    /// Create the global config file populated with defaults if missing.
    fn ensure_global_config_exists() -> Result<()> {
        let path = Self::global_config_path();
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, DEFAULT_CONFIG_TOML)?;
        Ok(())
    }

    /// Apply the environment override for the API key.
    fn apply_env_key(&mut self, env_key: Option<String>) {
        if let Some(key) = env_key {
            if !key.is_empty() {
                self.api.anthropic_key = key;
            }
        }
    }

    /// The resolved API key, or `None` when unconfigured.
    pub fn api_key(&self) -> Option<&str> {
        if self.api.anthropic_key.is_empty() {
            None
        } else {
            Some(&self.api.anthropic_key)
        }
    }

    /// Expanded media download directory.
    pub fn media_dir(&self) -> PathBuf {
        expand_path(&self.storage.media_dir)
    }

    /// Expanded markdown output root.
    pub fn output_dir(&self) -> PathBuf {
        expand_path(&self.storage.output_dir)
    }

    /// Validate the configuration, returning human-readable warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !VALID_WHISPER_MODELS.contains(&self.whisper.model.as_str()) {
            warnings.push(format!(
                "Unknown whisper model '{}'. Valid options: {}",
                self.whisper.model,
                VALID_WHISPER_MODELS.join(", ")
            ));
        }

        if self.api_key().is_none() {
            warnings.push(
                "No Claude API key configured. Set api.anthropic_key in the config \
                 or the ANTHROPIC_API_KEY environment variable."
                    .to_string(),
            );
        }

        if !(0.0..=1.0).contains(&self.analysis.ad_confidence_threshold) {
            warnings.push(format!(
                "ad_confidence_threshold {} is outside 0.0 - 1.0",
                self.analysis.ad_confidence_threshold
            ));
        }

        warnings
    }
}

/// Expand shell variables in paths (e.g. `~`).
fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Deep-merge two TOML values, with `over` taking priority.
fn merge_values(base: toml::Value, over: toml::Value) -> toml::Value {
    match (base, over) {
        (toml::Value::Table(mut base_table), toml::Value::Table(over_table)) => {
            for (key, over_value) in over_table {
                let merged = match base_table.remove(&key) {
                    Some(base_value) => merge_values(base_value, over_value),
                    None => over_value,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, over) => over,
    }
}
