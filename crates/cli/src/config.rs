//! Configuration file loading, environment overrides and data paths.

use std::path::{Path, PathBuf};

use proto::ConfigError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{API_KEY, EnvOverride, FileStore, ORGANIZATION};

/// Default model used for every selection other than GPT-4.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Model used when the selector is on GPT-4.
pub const GPT4_MODEL: &str = "gpt-4";

/// Environment variables that override the stored credentials.
pub const CREDENTIAL_ENV_VARS: [(&str, &str); 2] = [
    (API_KEY, "POCKETGPT_API_KEY"),
    (ORGANIZATION, "POCKETGPT_ORG"),
];

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Model names behind the selector.
    #[serde(default)]
    pub models: ModelsConfig,
    /// Conversation behavior.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Where the key-value files live.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// Overrides the OpenAI base URL (proxies, compatible servers).
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Model names for the two selector entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Model for the default ("3.5") entry.
    #[serde(default = "default_model")]
    pub default: String,
    /// Model for the "4" entry.
    #[serde(default = "default_gpt4_model")]
    pub gpt4: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_gpt4_model() -> String {
    GPT4_MODEL.to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            default: default_model(),
            gpt4: default_gpt4_model(),
        }
    }
}

impl ModelsConfig {
    /// Resolves a selector key to a model name: `"4"` picks GPT-4, anything
    /// else the default.
    pub fn resolve(&self, version: &str) -> &str {
        if version == "4" {
            &self.gpt4
        } else {
            &self.default
        }
    }
}

/// Conversation behavior.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatConfig {
    /// Send earlier completed messages along with the new one.
    #[serde(default)]
    pub include_history: bool,
}

/// Storage location.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory holding `credentials.toml`, `state.toml` and `logs/`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from explicit path, fallback locations, and env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            // Look in current dir, then home dir
            let cwd = std::env::current_dir().ok()?.join("config.toml");
            if cwd.exists() {
                return Some(cwd);
            }
            let home_config = home_dir().join(".pocketgpt").join("config.toml");
            if home_config.exists() {
                return Some(home_config);
            }
            None
        });
        debug!(path = ?config_path, "Config file resolved");

        let mut config: Config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(|e| ConfigError::Toml(e.to_string()))?
        } else {
            Config::default()
        };

        // Environment variable overrides
        if let Ok(url) = std::env::var("POCKETGPT_BASE_URL")
            && !url.trim().is_empty()
        {
            config.api.base_url = Some(url);
        }
        if let Ok(dir) = std::env::var("POCKETGPT_DATA_DIR")
            && !dir.trim().is_empty()
        {
            config.storage.dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        debug!(
            default_model = %config.models.default,
            gpt4_model = %config.models.gpt4,
            base_url = ?config.api.base_url,
            include_history = config.chat.include_history,
            "Config loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("models.default", &self.models.default),
            ("models.gpt4", &self.models.gpt4),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "model name must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Directory for stores and logs: `storage.dir` or `~/.pocketgpt`.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .dir
            .clone()
            .unwrap_or_else(|| home_dir().join(".pocketgpt"))
    }

    /// Path of the credential store.
    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir().join("credentials.toml")
    }

    /// Path of the preference store.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir().join("state.toml")
    }

    /// Directory for `--debug` log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    /// Opens the credential store with environment overrides applied.
    pub fn open_credentials(&self) -> EnvOverride<FileStore> {
        EnvOverride::new(
            FileStore::open_or_empty(self.credentials_path()),
            CREDENTIAL_ENV_VARS.to_vec(),
        )
    }

    /// Opens the preference store.
    pub fn open_preferences(&self) -> FileStore {
        FileStore::open_or_empty(self.state_path())
    }
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
}
