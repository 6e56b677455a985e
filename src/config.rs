use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENROUTER_MODEL: &str = "meta-llama/llama-4-scout:free";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Which remote model service to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenRouter,
}

impl Provider {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Some(Provider::Gemini),
            "openrouter" => Some(Provider::OpenRouter),
            _ => None,
        }
    }

    fn api_key_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => DEFAULT_GEMINI_MODEL,
            Provider::OpenRouter => DEFAULT_OPENROUTER_MODEL,
        }
    }

    fn default_endpoint(&self) -> &'static str {
        match self {
            Provider::Gemini => DEFAULT_GEMINI_ENDPOINT,
            Provider::OpenRouter => DEFAULT_OPENROUTER_ENDPOINT,
        }
    }
}

/// Immutable analyzer settings, built once at startup.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    /// Attempts made after the first one fails
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Attach the raw model text to every result
    pub debug: bool,
    /// Whether malformed or incomplete JSON consumes a retry like a transport failure
    pub retry_malformed: bool,
}

impl AnalyzerConfig {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: provider.default_model().to_string(),
            endpoint: provider.default_endpoint().to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            debug: false,
            retry_malformed: true,
        }
    }

    /// Load settings from `.env` and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup("FOOD_LENS_PROVIDER") {
            Some(value) => Provider::from_string(&value)
                .with_context(|| format!("Unknown FOOD_LENS_PROVIDER '{}'", value))?,
            None => Provider::Gemini,
        };

        let api_key = lookup(provider.api_key_var())
            .filter(|k| !k.trim().is_empty())
            .with_context(|| format!("{} must be set in .env file", provider.api_key_var()))?;

        let mut config = Self::new(provider, api_key);

        if let Some(model) = lookup("FOOD_LENS_MODEL") {
            config.model = model;
        }
        if let Some(endpoint) = lookup("FOOD_LENS_ENDPOINT") {
            config.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("FOOD_LENS_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("Invalid FOOD_LENS_TIMEOUT_SECS '{}'", secs))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = lookup("FOOD_LENS_MAX_RETRIES") {
            config.max_retries = retries
                .parse()
                .with_context(|| format!("Invalid FOOD_LENS_MAX_RETRIES '{}'", retries))?;
        }
        if let Some(ms) = lookup("FOOD_LENS_RETRY_DELAY_MS") {
            let ms: u64 = ms
                .parse()
                .with_context(|| format!("Invalid FOOD_LENS_RETRY_DELAY_MS '{}'", ms))?;
            config.retry_delay = Duration::from_millis(ms);
        }
        if let Some(flag) = lookup("FOOD_LENS_DEBUG") {
            config.debug = parse_flag(&flag)
                .with_context(|| format!("Invalid FOOD_LENS_DEBUG '{}'", flag))?;
        }
        if let Some(flag) = lookup("FOOD_LENS_RETRY_MALFORMED") {
            config.retry_malformed = parse_flag(&flag)
                .with_context(|| format!("Invalid FOOD_LENS_RETRY_MALFORMED '{}'", flag))?;
        }

        Ok(config)
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn retry_malformed(mut self, retry: bool) -> Self {
        self.retry_malformed = retry;
        self
    }

    /// Total number of calls made before giving up.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
