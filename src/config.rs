use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use crate::models::CompatibilityWeights;

/// Prefix for environment overrides, e.g. `SENTIMATCH__SERVER__PORT`
const ENV_PREFIX: &str = "SENTIMATCH";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub sentiment: SentimentSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5000 }

/// OpenAI-compatible completion endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: None,
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_llm_base_url() -> String { "https://api.openai.com".to_string() }
fn default_llm_model() -> String { "gpt-3.5-turbo".to_string() }
fn default_llm_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_profiles")]
    pub default_profiles: u32,
    #[serde(default = "default_messages_per_conversation")]
    pub messages_per_conversation: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            default_profiles: default_profiles(),
            messages_per_conversation: default_messages_per_conversation(),
        }
    }
}

fn default_profiles() -> u32 { 10 }
fn default_messages_per_conversation() -> usize { 8 }

#[derive(Debug, Clone, Deserialize)]
pub struct SentimentSettings {
    /// External lexicon replacing the embedded one
    pub lexicon_path: Option<PathBuf>,
    /// Unset means conversations of any length are analyzed
    #[serde(default)]
    pub max_messages: Option<usize>,
}

impl Default for SentimentSettings {
    fn default() -> Self {
        Self {
            lexicon_path: None,
            max_messages: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            max_matches: default_max_matches(),
        }
    }
}

fn default_max_matches() -> usize { crate::core::matcher::DEFAULT_MAX_MATCHES }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_minimum_weight")]
    pub minimum: f64,
    #[serde(default = "default_average_weight")]
    pub average: f64,
    #[serde(default = "default_trend_weight")]
    pub trend: f64,
    #[serde(default = "default_neutral_trend")]
    pub neutral_trend: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            minimum: default_minimum_weight(),
            average: default_average_weight(),
            trend: default_trend_weight(),
            neutral_trend: default_neutral_trend(),
        }
    }
}

impl From<&WeightsConfig> for CompatibilityWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            minimum: config.minimum,
            average: config.average,
            trend: config.trend,
            neutral_trend: config.neutral_trend,
        }
    }
}

fn default_minimum_weight() -> f64 { 0.4 }
fn default_average_weight() -> f64 { 0.4 }
fn default_trend_weight() -> f64 { 0.2 }
fn default_neutral_trend() -> f64 { 0.5 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with SENTIMATCH__)
    /// 5. `OPENAI_API_KEY` for the model key
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SENTIMATCH__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        apply_api_key_override(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        apply_api_key_override(settings)?.try_deserialize()
    }

    /// Parse settings from a TOML string, without environment overrides
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn compatibility_weights(&self) -> CompatibilityWeights {
        CompatibilityWeights::from(&self.scoring.weights)
    }
}

/// The conventional `OPENAI_API_KEY` variable wins over the config files
fn apply_api_key_override(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Config::builder()
            .add_source(settings)
            .set_override("llm.api_key", key)?
            .build(),
        _ => Ok(settings),
    }
}
