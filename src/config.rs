//! Configuration management for Tool Agent.
//!
//! Configuration is read from an optional YAML file and then overridden by
//! environment variables:
//! - `AGENT_CONFIG` - Optional. Path to the YAML config file.
//! - `AGENT_PROVIDER` - Optional. `openai` or `ollama`. Defaults to `openai`.
//! - `AGENT_MODEL` - Optional. Model identifier. Defaults depend on the provider.
//! - `OPENAI_API_KEY` - Required for the `openai` provider.
//! - `AGENT_API_BASE` - Optional. Base URL of the model API.
//! - `AGENT_TEMPERATURE` / `AGENT_TOP_P` / `AGENT_MAX_TOKENS` - Optional sampling settings.
//! - `MAX_STEPS` - Optional. Step budget per request. Defaults to `6`.
//! - `MEMORY_CAPACITY` - Optional. Remembered rounds. Defaults to `10`.
//! - `WORKSPACE_PATH` - Optional. Root for relative tool paths. Defaults to current directory.
//! - `STRICT_TOOL_PAIRING` - Optional. Pair `Tool:`/`Args:` lines within one block.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::{DEFAULT_MAX_STEPS, DEFAULT_MEMORY_CAPACITY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, serde_yaml::Error),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Which model backend to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI-compatible chat completions API
    #[default]
    OpenAi,
    /// Local inference through an Ollama server
    Ollama,
}

impl Provider {
    fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" | "local" => Ok(Self::Ollama),
            other => Err(format!("unknown provider: {}", other)),
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Ollama => "qwen2.5:7b-instruct",
        }
    }

    fn default_temperature(self) -> f32 {
        match self {
            Self::OpenAi => 0.2,
            Self::Ollama => 0.7,
        }
    }
}

/// Model backend configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Backend kind
    pub provider: Provider,

    /// Model identifier understood by the backend
    pub model: String,

    /// API key (OpenAI-compatible backends only)
    pub api_key: Option<String>,

    /// Override for the backend base URL
    pub api_base: Option<String>,

    pub temperature: f32,
    pub top_p: f32,

    /// Maximum tokens generated per model call
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let provider = Provider::default();
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: None,
            api_base: None,
            temperature: provider.default_temperature(),
            top_p: 0.95,
            max_tokens: 1024,
        }
    }
}

/// On-disk YAML layout. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_steps: Option<usize>,
    pub memory_capacity: Option<usize>,
    pub workspace_path: Option<PathBuf>,
    pub strict_tool_pairing: Option<bool>,
}

impl FileConfig {
    /// Read and parse a YAML config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model backend settings
    pub llm: LlmConfig,

    /// Root directory for relative paths handed to file tools
    pub workspace_path: PathBuf,

    /// Maximum model calls per request
    pub max_steps: usize,

    /// Number of past rounds kept in memory
    pub memory_capacity: usize,

    /// Only pair `Tool:` and `Args:` lines from the same block
    pub strict_tool_pairing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            workspace_path: PathBuf::from("."),
            max_steps: DEFAULT_MAX_STEPS,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            strict_tool_pairing: false,
        }
    }
}

impl Config {
    /// Load configuration from an optional YAML file plus the process environment.
    ///
    /// An explicit `path` wins over `AGENT_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, or if any
    /// value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("AGENT_CONFIG").ok().map(PathBuf::from));

        let file = match path {
            Some(p) => {
                let file = FileConfig::from_path(&p)?;
                tracing::info!("Loaded config file {}", p.display());
                file
            }
            None => FileConfig::default(),
        };

        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge a parsed file with environment overrides supplied by `env`.
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match env("AGENT_PROVIDER") {
            Some(v) => Provider::parse(&v)
                .map_err(|e| ConfigError::InvalidValue("AGENT_PROVIDER".to_string(), e))?,
            None => file.provider.unwrap_or_default(),
        };

        let model = env("AGENT_MODEL")
            .or(file.model)
            .unwrap_or_else(|| provider.default_model().to_string());

        let api_key = env("OPENAI_API_KEY").or(file.api_key);
        let api_base = env("AGENT_API_BASE").or(file.api_base);

        let temperature = parse_env(&env, "AGENT_TEMPERATURE")?
            .or(file.temperature)
            .unwrap_or_else(|| provider.default_temperature());
        let top_p = parse_env(&env, "AGENT_TOP_P")?.or(file.top_p).unwrap_or(0.95);
        let max_tokens = parse_env(&env, "AGENT_MAX_TOKENS")?
            .or(file.max_tokens)
            .unwrap_or(1024);

        let max_steps = parse_env(&env, "MAX_STEPS")?
            .or(file.max_steps)
            .unwrap_or(DEFAULT_MAX_STEPS);
        if max_steps == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_STEPS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let memory_capacity = parse_env(&env, "MEMORY_CAPACITY")?
            .or(file.memory_capacity)
            .unwrap_or(DEFAULT_MEMORY_CAPACITY);

        let workspace_path = env("WORKSPACE_PATH")
            .map(PathBuf::from)
            .or(file.workspace_path)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let strict_tool_pairing = env("STRICT_TOOL_PAIRING")
            .map(|v| {
                parse_bool(&v)
                    .map_err(|e| ConfigError::InvalidValue("STRICT_TOOL_PAIRING".to_string(), e))
            })
            .transpose()?
            .or(file.strict_tool_pairing)
            .unwrap_or(false);

        Ok(Self {
            llm: LlmConfig {
                provider,
                model,
                api_key,
                api_base,
                temperature,
                top_p,
                max_tokens,
            },
            workspace_path,
            max_steps,
            memory_capacity,
            strict_tool_pairing,
        })
    }
}

fn parse_env<F, T>(env: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidValue(key.to_string(), format!("{}", e)))
        })
        .transpose()
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}
