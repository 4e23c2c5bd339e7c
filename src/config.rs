//! Configuration management
//!
//! Generator cadence and thresholds, duplicate-detection thresholds, LLM
//! endpoint settings and data file locations. Stored as TOML in the user's
//! config directory; a handful of environment variables override it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::tracker::TrackerConfig;

const MIN_SCORE_ENV: &str = "MIN_SCORE";
const INTERVAL_ENV: &str = "GENERATION_INTERVAL";
const DATA_DIR_ENV: &str = "IDEA_ENGINE_DATA_DIR";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generation loop settings
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Duplicate detection thresholds
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// Chat completions endpoint
    #[serde(default)]
    pub llm: LlmConfig,
    /// Data file locations
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Ideas scoring below this are discarded
    #[serde(default = "default_min_score")]
    pub min_score: u8,
    /// Seconds between cycles
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Generation attempts per cycle (failures, duplicates and low scores all count)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Run pattern analysis every N iterations
    #[serde(default = "default_reflect_every")]
    pub reflect_every: u64,
}

fn default_min_score() -> u8 {
    40
}

fn default_interval() -> u64 {
    900
}

fn default_max_attempts() -> u32 {
    5
}

fn default_reflect_every() -> u64 {
    10
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            interval_secs: default_interval(),
            max_attempts: default_max_attempts(),
            reflect_every: default_reflect_every(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound on a single request, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.9
}

fn default_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the memory, history and table files
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Resolved locations of every persisted file
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub memory: PathBuf,
    pub history: PathBuf,
    pub table: PathBuf,
}

impl DataPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            memory: dir.join("system_memory.json"),
            history: dir.join("ideas_history.json"),
            table: dir.join("ideas-validadas.csv"),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from `path`, writing defaults there if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().context("Config path has no parent")?;
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Apply `MIN_SCORE`, `GENERATION_INTERVAL` and `IDEA_ENGINE_DATA_DIR`.
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(score) = lookup(MIN_SCORE_ENV).and_then(|v| v.trim().parse().ok()) {
            self.generator.min_score = score;
        }
        if let Some(secs) = lookup(INTERVAL_ENV).and_then(|v| v.trim().parse().ok()) {
            self.generator.interval_secs = secs;
        }
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Data directory from config, or the platform default
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => data_dir(),
        }
    }

    pub fn data_paths(&self) -> Result<DataPaths> {
        Ok(DataPaths::in_dir(&self.data_dir()?))
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "idea-engine", "idea-engine")
        .context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the default data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("Configuration ({})", config_path()?.display());
    println!();
    println!("Generator:");
    println!("  min_score:            {}", config.generator.min_score);
    println!("  interval_secs:        {}", config.generator.interval_secs);
    println!("  max_attempts:         {}", config.generator.max_attempts);
    println!("  reflect_every:        {}", config.generator.reflect_every);
    println!("Tracker:");
    println!("  similarity_threshold: {}", config.tracker.similarity_threshold);
    println!("  name_threshold:       {}", config.tracker.name_threshold);
    println!("LLM:");
    println!("  base_url:             {}", config.llm.base_url);
    println!("  model:                {}", config.llm.model);
    println!("  temperature:          {}", config.llm.temperature);
    println!("  timeout_secs:         {}", config.llm.timeout_secs);
    println!("Storage:");
    println!("  data_dir:             {}", config.data_dir()?.display());
    println!();
    println!(
        "API key: {}",
        if crate::security::has_api_key() { "configured" } else { "not configured" }
    );
    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    Config::default().save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    toml::to_string_pretty(&Config::default())
        .unwrap_or_else(|_| "# Default configuration\n".to_string())
}
