use crate::processing::SummaryMode;
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Supported language model backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Hosted generation API authenticated by a static key in the request URL.
    Keyed,
    /// Hosted chat-completion API authenticated by a bearer token.
    Chat,
    /// Generation service running on the local network.
    Local,
}

impl ProviderKind {
    /// Stable label used in logs and diagnostics.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Keyed => "keyed",
            Self::Chat => "chat",
            Self::Local => "local",
        }
    }

    fn default_endpoint(self) -> &'static str {
        match self {
            Self::Keyed => "https://generativelanguage.googleapis.com",
            Self::Chat => "https://api.groq.com/openai/v1",
            Self::Local => "http://127.0.0.1:11434",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Self::Keyed => "gemini-2.5-flash",
            Self::Chat => "llama-3.3-70b-versatile",
            Self::Local => "llama3.2",
        }
    }

    fn default_context_window(self) -> usize {
        match self {
            Self::Keyed => 1_000_000,
            Self::Chat => 8192,
            Self::Local => 4096,
        }
    }

    /// Vendor-specific variable consulted when `LLM_API_KEY` is absent.
    fn fallback_key_variable(self) -> Option<&'static str> {
        match self {
            Self::Keyed => Some("GEMINI_API_KEY"),
            Self::Chat => Some("GROQ_API_KEY"),
            Self::Local => None,
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyed" | "gemini" => Ok(Self::Keyed),
            "chat" | "groq" | "openai" => Ok(Self::Chat),
            "local" | "ollama" => Ok(Self::Local),
            _ => Err(()),
        }
    }
}

/// Everything a provider needs, resolved once at startup and passed into its constructor.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Which backend variant to construct.
    pub kind: ProviderKind,
    /// Static credential for hosted variants; `None` is a definite failure for them.
    pub credential: Option<String>,
    /// Base URL of the provider endpoint.
    pub endpoint: String,
    /// Model identifier passed to the provider.
    pub model: String,
    /// Default sampling temperature for narrative generation.
    pub temperature: f32,
    /// Context window budget in tokens.
    pub context_window: usize,
}

impl ProviderConfig {
    /// Provider configuration populated with the variant's defaults.
    pub fn for_kind(kind: ProviderKind) -> Self {
        Self {
            kind,
            credential: None,
            endpoint: kind.default_endpoint().to_string(),
            model: kind.default_model().to_string(),
            temperature: DEFAULT_SUMMARY_TEMPERATURE,
            context_window: kind.default_context_window(),
        }
    }

    /// Attach a credential.
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Override the endpoint base URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Whether a non-empty credential is configured.
    pub fn has_credential(&self) -> bool {
        self.credential
            .as_deref()
            .map(|value| !value.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Tunables for the summarization pipeline.
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    /// Mode selection policy.
    pub summary_mode: SummaryMode,
    /// Maximum characters per strict-extraction chunk.
    pub chunk_size: usize,
    /// Pause between consecutive chunk calls.
    pub chunk_delay: Duration,
    /// Temperature for strict extraction prompts.
    pub extraction_temperature: f32,
    /// Temperature for term explanations.
    pub explain_temperature: f32,
    /// OCR language code.
    pub ocr_language: String,
    /// Optional directory holding OCR language data.
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            summary_mode: SummaryMode::Auto,
            chunk_size: crate::processing::chunking::DEFAULT_CHUNK_SIZE,
            chunk_delay: Duration::from_millis(DEFAULT_CHUNK_DELAY_MS),
            extraction_temperature: 0.0,
            explain_temperature: DEFAULT_EXPLAIN_TEMPERATURE,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            tessdata_dir: None,
        }
    }
}

/// Runtime configuration for the Medlens services.
#[derive(Clone, Debug)]
pub struct Config {
    /// Selected provider and its connection details.
    pub provider: ProviderConfig,
    /// Pipeline tunables.
    pub pipeline: PipelineSettings,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

const DEFAULT_SUMMARY_TEMPERATURE: f32 = 0.3;
const DEFAULT_EXPLAIN_TEMPERATURE: f32 = 0.7;
const DEFAULT_CHUNK_DELAY_MS: u64 = 1000;
const DEFAULT_OCR_LANGUAGE: &str = "eng";

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let kind = match optional("LLM_PROVIDER") {
            Some(value) => value
                .parse()
                .map_err(|()| ConfigError::InvalidValue("LLM_PROVIDER".to_string()))?,
            None => ProviderKind::Local,
        };

        let mut provider = ProviderConfig::for_kind(kind);
        provider.credential = optional("LLM_API_KEY").or_else(|| {
            kind.fallback_key_variable()
                .and_then(|variable| optional(variable))
        });
        if let Some(endpoint) = optional("LLM_ENDPOINT") {
            provider.endpoint = endpoint;
        }
        if let Some(model) = optional("LLM_MODEL") {
            provider.model = model;
        }
        if let Some(window) = parse_optional::<usize>(&optional, "LLM_CONTEXT_WINDOW")? {
            provider.context_window = window;
        }
        if let Some(temperature) = parse_optional::<f32>(&optional, "SUMMARY_TEMPERATURE")? {
            provider.temperature = temperature;
        }

        let defaults = PipelineSettings::default();
        let summary_mode = match optional("SUMMARY_MODE") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SUMMARY_MODE".to_string()))?,
            None => defaults.summary_mode,
        };
        let chunk_size = parse_optional::<usize>(&optional, "CHUNK_SIZE")?
            .unwrap_or(defaults.chunk_size);
        if chunk_size == 0 {
            return Err(ConfigError::InvalidValue("CHUNK_SIZE".to_string()));
        }

        let pipeline = PipelineSettings {
            summary_mode,
            chunk_size,
            chunk_delay: parse_optional::<u64>(&optional, "CHUNK_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.chunk_delay),
            extraction_temperature: parse_optional::<f32>(&optional, "EXTRACTION_TEMPERATURE")?
                .unwrap_or(defaults.extraction_temperature),
            explain_temperature: parse_optional::<f32>(&optional, "EXPLAIN_TEMPERATURE")?
                .unwrap_or(defaults.explain_temperature),
            ocr_language: optional("OCR_LANGUAGE").unwrap_or(defaults.ocr_language),
            tessdata_dir: optional("TESSDATA_DIR").map(PathBuf::from),
        };

        Ok(Self {
            provider,
            pipeline,
            server_port: parse_optional::<u16>(&optional, "SERVER_PORT")?,
        })
    }
}

fn parse_optional<T: std::str::FromStr>(
    optional: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        provider = config.provider.kind.label(),
        model = %config.provider.model,
        endpoint = %config.provider.endpoint,
        has_credential = config.provider.has_credential(),
        summary_mode = %config.pipeline.summary_mode,
        chunk_size = config.pipeline.chunk_size,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
