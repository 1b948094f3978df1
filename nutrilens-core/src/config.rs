//! Analyzer configuration, resolved once at start-up.

use crate::error::AnalysisError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_API_KEY: &str = "NUTRILENS_API_KEY";
/// Fallback credential variable
pub const ENV_API_KEY_FALLBACK: &str = "API_KEY";
pub const ENV_PROVIDER: &str = "NUTRILENS_PROVIDER";
pub const ENV_MODEL: &str = "NUTRILENS_MODEL";
pub const ENV_API_BASE: &str = "NUTRILENS_API_BASE";
pub const ENV_TIMEOUT_SECS: &str = "NUTRILENS_TIMEOUT_SECS";
pub const ENV_TEMPERATURE: &str = "NUTRILENS_TEMPERATURE";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Which inference capability to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    /// Any OpenAI-compatible chat completions endpoint
    OpenAi,
}

impl ProviderKind {
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-3-pro-preview",
            ProviderKind::OpenAi => "gpt-4o",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(AnalysisError::configuration(format!(
                "unknown provider '{}' (expected 'gemini' or 'openai')",
                other
            ))),
        }
    }
}

/// Validated configuration for an analyzer.
#[derive(Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub provider: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub api_base: Option<String>,
    pub timeout: Duration,
    pub temperature: Option<f32>,
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl AnalyzerConfig {
    /// Configuration with defaults for the given provider
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: provider.default_model().to_string(),
            api_base: None,
            timeout: DEFAULT_TIMEOUT,
            temperature: None,
        }
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set the inference timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve from process environment
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AnalysisError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get(ENV_API_KEY)
            .or_else(|| get(ENV_API_KEY_FALLBACK))
            .ok_or_else(|| {
                AnalysisError::configuration(format!(
                    "missing credential: set {} (or {})",
                    ENV_API_KEY, ENV_API_KEY_FALLBACK
                ))
            })?;

        let provider = match get(ENV_PROVIDER) {
            Some(raw) => raw.parse()?,
            None => ProviderKind::Gemini,
        };

        let mut config = Self::new(provider, api_key);

        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        config.api_base = get(ENV_API_BASE);

        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.parse().map_err(|_| {
                AnalysisError::configuration(format!("{} must be whole seconds, got '{}'", ENV_TIMEOUT_SECS, raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = get(ENV_TEMPERATURE) {
            let temperature: f32 = raw.parse().map_err(|_| {
                AnalysisError::configuration(format!("{} must be a number, got '{}'", ENV_TEMPERATURE, raw))
            })?;
            config.temperature = Some(temperature);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants; called by [`AnalyzerConfig::from_lookup`]
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.api_key.trim().is_empty() {
            return Err(AnalysisError::configuration("API key is required"));
        }
        if self.model.trim().is_empty() {
            return Err(AnalysisError::configuration("model is required"));
        }
        if self.timeout.is_zero() {
            return Err(AnalysisError::configuration("timeout must be greater than zero"));
        }
        if let Some(api_base) = &self.api_base {
            if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
                return Err(AnalysisError::configuration(format!(
                    "API base must be an http(s) URL, got '{}'",
                    api_base
                )));
            }
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(AnalysisError::configuration(format!(
                    "temperature must be within 0.0..=2.0, got {}",
                    temperature
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = AnalyzerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Configuration);

        let err = AnalyzerConfig::from_lookup(lookup(&[(ENV_API_KEY, "  ")])).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Configuration);
    }

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::from_lookup(lookup(&[(ENV_API_KEY, "secret")])).unwrap();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.model, "gemini-3-pro-preview");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.api_base.is_none());
        assert!(config.temperature.is_none());
    }

    #[test]
    fn test_fallback_key() {
        let config = AnalyzerConfig::from_lookup(lookup(&[(ENV_API_KEY_FALLBACK, "legacy")])).unwrap();
        assert_eq!(config.api_key, "legacy");

        let config = AnalyzerConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "primary"),
            (ENV_API_KEY_FALLBACK, "legacy"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "primary");
    }

    #[test]
    fn test_openai_overrides() {
        let config = AnalyzerConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_PROVIDER, "OpenAI"),
            (ENV_API_BASE, "https://llm.internal/v1"),
            (ENV_TIMEOUT_SECS, "15"),
            (ENV_TEMPERATURE, "0.2"),
        ]))
        .unwrap();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.api_base.as_deref(), Some("https://llm.internal/v1"));
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.temperature, Some(0.2));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cases: [&[(&str, &str)]; 5] = [
            &[(ENV_API_KEY, "k"), (ENV_PROVIDER, "llama")],
            &[(ENV_API_KEY, "k"), (ENV_TIMEOUT_SECS, "soon")],
            &[(ENV_API_KEY, "k"), (ENV_TIMEOUT_SECS, "0")],
            &[(ENV_API_KEY, "k"), (ENV_API_BASE, "ftp://x")],
            &[(ENV_API_KEY, "k"), (ENV_TEMPERATURE, "7")],
        ];
        for pairs in cases {
            let err = AnalyzerConfig::from_lookup(lookup(pairs)).unwrap_err();
            assert_eq!(err.kind(), FailureKind::Configuration, "{:?}", pairs);
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AnalyzerConfig::new(ProviderKind::Gemini, "super-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
