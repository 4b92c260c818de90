//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use nexus_extractor::PipelineConfig;
use nexus_llm::gemini::{DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Generation service
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Generation pipelines
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Matrix file formats written when --formats is not given
    #[serde(default = "default_matrix_formats")]
    pub matrix_formats: String,
}

/// Generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Model name
    pub model: String,

    /// API endpoint
    pub endpoint: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// API key; prefer the environment variable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Timeout of one HTTP request (seconds)
    pub request_timeout_secs: u64,

    /// Attempts per call for transient failures
    pub max_retries: u32,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".nexus").join("config.toml"))
    }

    /// Resolve an explicit path or fall back to the default one.
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::path(),
        }
    }

    /// Load configuration from file; a missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.pipeline.validate().map_err(CliError::Config)?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }
}

impl ProviderConfig {
    /// Pick the API key: explicit value (flag or GEMINI_API_KEY), then the
    /// configured environment variable, then the config file.
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Result<String> {
        let from_env = std::env::var(&self.api_key_env).ok();
        [explicit.map(str::to_string), from_env, self.api_key.clone()]
            .into_iter()
            .flatten()
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .ok_or_else(|| {
                CliError::Config(format!(
                    "No API key: pass --api-key, set {} or add api_key to [provider]",
                    self.api_key_env
                ))
            })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            matrix_formats: default_matrix_formats(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_matrix_formats() -> String {
    "json,csv".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Table);
        assert_eq!(config.provider.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.pipeline.default_role, "Usuario");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.provider.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.provider.model = "gemini-test".to_string();
        config.pipeline.story_batch_size = 3;
        config.settings.matrix_formats = "xlsx".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.provider.model, "gemini-test");
        assert_eq!(loaded.pipeline.story_batch_size, 3);
        assert_eq!(loaded.settings.matrix_formats, "xlsx");
        assert!(loaded.provider.api_key.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[provider]\nmodel = \"gemini-pro\"\n\n[pipeline]\nsimilarity_threshold = 0.9\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.provider.model, "gemini-pro");
        assert_eq!(config.provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.pipeline.similarity_threshold, 0.9);
        assert_eq!(config.pipeline.story_fragment_size, 3000);
    }

    #[test]
    fn test_invalid_pipeline_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[pipeline]\nstory_batch_size = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(CliError::Config(_))));
    }

    #[test]
    fn test_api_key_resolution() {
        let provider = ProviderConfig {
            api_key_env: "NEXUS_TEST_UNSET_KEY_VAR".to_string(),
            api_key: Some("from-file".to_string()),
            ..ProviderConfig::default()
        };
        assert_eq!(provider.resolve_api_key(Some("from-flag")).unwrap(), "from-flag");
        assert_eq!(provider.resolve_api_key(Some("  ")).unwrap(), "from-file");
        assert_eq!(provider.resolve_api_key(None).unwrap(), "from-file");

        let empty = ProviderConfig {
            api_key_env: "NEXUS_TEST_UNSET_KEY_VAR".to_string(),
            ..ProviderConfig::default()
        };
        assert!(empty.resolve_api_key(None).is_err());
    }
}
