//! Configuration loading, validation, and management for GemRelay.
//!
//! Loads configuration from `gemrelay.toml` (or the path in
//! `GEMRELAY_CONFIG`) with environment variable overrides. Validates all
//! settings at startup.

use gemrelay_core::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gemrelay.toml";

/// The root configuration structure.
///
/// Maps directly to `gemrelay.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Credential for the remote completion service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Remote model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling parameters sent with every request
    #[serde(default)]
    pub generation: GenerationConfig,

    /// HTTP server settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Remote service client settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Conversation window settings
    #[serde(default)]
    pub history: HistoryConfig,
}

fn default_model() -> String {
    "gemini-1.5-flash".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("generation", &self.generation)
            .field("gateway", &self.gateway)
            .field("provider", &self.provider)
            .field("history", &self.history)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Directory served for any path without an explicit route
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Answer CORS preflights for any origin
    #[serde(default = "default_true")]
    pub cors_allow_any: bool,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    2001
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}
fn default_true() -> bool {
    true
}
fn default_max_body_bytes() -> usize {
    1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            public_dir: default_public_dir(),
            cors_allow_any: true,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-attempt timeout for the remote call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a transient failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    1
}
fn default_retry_backoff_ms() -> u64 {
    250
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Entries kept per session (two per exchange)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Sessions kept in memory before the least recently used is dropped
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_entries() -> usize {
    gemrelay_core::DEFAULT_HISTORY_LIMIT
}
fn default_max_sessions() -> usize {
    1_000
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, then apply overrides from `env`.
    ///
    /// A missing file yields defaults. Overrides, blank values ignored:
    /// - `PORT` for the gateway port
    /// - `GEMRELAY_API_KEY`, then `GEMINI_API_KEY`, then `API_KEY`
    /// - `GEMRELAY_MODEL`
    pub fn load_with_env(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        // Blank values count as unset
        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        if let Some(port) = env("PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT must be a port number, got '{port}'"))
            })?;
        }

        // Environment credential wins over the file
        if let Some(key) = env("GEMRELAY_API_KEY")
            .or_else(|| env("GEMINI_API_KEY"))
            .or_else(|| env("API_KEY"))
        {
            self.api_key = Some(key);
        }

        if let Some(model) = env("GEMRELAY_MODEL") {
            self.model = model;
        }

        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        let generation = &self.generation;
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if generation.top_p <= 0.0 || generation.top_p > 1.0 {
            return Err(ConfigError::ValidationError(
                "generation.top_p must be in (0.0, 1.0]".into(),
            ));
        }
        if generation.max_output_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "generation.max_output_tokens must be > 0".into(),
            ));
        }

        if self.history.max_entries < 2 {
            return Err(ConfigError::ValidationError(
                "history.max_entries must hold at least one exchange (>= 2)".into(),
            ));
        }
        if self.history.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "history.max_sessions must be > 0".into(),
            ));
        }

        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// The API credential, or [`ConfigError::MissingCredential`].
    ///
    /// Commands that talk to the remote service call this before doing
    /// anything else so a bad setup fails at startup, not per request.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingCredential),
        }
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.require_api_key().is_ok()
    }

    /// Socket address string for the gateway listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            generation: GenerationConfig::default(),
            gateway: GatewayConfig::default(),
            provider: ProviderSettings::default(),
            history: HistoryConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("No API key configured; set GEMRELAY_API_KEY, GEMINI_API_KEY or API_KEY")]
    MissingCredential,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.gateway.port, 2001);
        assert_eq!(config.history.max_entries, 20);
        assert_eq!(config.provider.max_retries, 1);
        assert!(config.gateway.cors_allow_any);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.generation, config.generation);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.generation.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn history_must_hold_one_exchange() {
        let mut config = AppConfig::default();
        config.history.max_entries = 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/gemrelay.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().gateway.port, 2001);
    }

    #[test]
    fn file_values_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gemrelay.toml");
        std::fs::write(
            &path,
            r#"
model = "gemini-1.5-pro"

[gateway]
port = 8088
public_dir = "/srv/www"

[generation]
max_output_tokens = 64
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.gateway.port, 8088);
        assert_eq!(config.gateway.public_dir, PathBuf::from("/srv/www"));
        assert_eq!(config.generation.max_output_tokens, 64);
        // Untouched sections keep their defaults
        assert_eq!(config.generation.top_k, 40);
        assert_eq!(config.history.max_entries, 20);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gemrelay.toml");
        std::fs::write(&path, "model = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_port_key_and_model() {
        let config = AppConfig::load_with_env(
            Path::new("/nonexistent/gemrelay.toml"),
            env_from(&[
                ("PORT", "3000"),
                ("API_KEY", "from-api-key"),
                ("GEMRELAY_MODEL", "gemini-2.0-flash"),
            ]),
        )
        .unwrap();
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.api_key.as_deref(), Some("from-api-key"));
        assert_eq!(config.model, "gemini-2.0-flash");
    }

    #[test]
    fn credential_env_precedence() {
        let config = AppConfig::load_with_env(
            Path::new("/nonexistent/gemrelay.toml"),
            env_from(&[
                ("API_KEY", "generic"),
                ("GEMINI_API_KEY", "gemini"),
                ("GEMRELAY_API_KEY", "specific"),
            ]),
        )
        .unwrap();
        assert_eq!(config.require_api_key().unwrap(), "specific");
    }

    #[test]
    fn bad_port_env_is_rejected() {
        let result = AppConfig::load_with_env(
            Path::new("/nonexistent/gemrelay.toml"),
            env_from(&[("PORT", "not-a-port")]),
        );
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn blank_env_values_count_as_unset() {
        let config = AppConfig::load_with_env(
            Path::new("/nonexistent/gemrelay.toml"),
            env_from(&[
                ("PORT", ""),
                ("GEMRELAY_API_KEY", ""),
                ("GEMINI_API_KEY", "  "),
                ("API_KEY", "fallback-key"),
                ("GEMRELAY_MODEL", ""),
            ]),
        )
        .unwrap();
        assert_eq!(config.gateway.port, 2001);
        assert_eq!(config.require_api_key().unwrap(), "fallback-key");
        assert_eq!(config.model, "gemini-1.5-flash");
    }

    #[test]
    fn missing_or_blank_credential_fails() {
        let mut config = AppConfig::default();
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingCredential)
        ));

        config.api_key = Some("   ".into());
        assert!(!config.has_api_key());

        config.api_key = Some("k".into());
        assert_eq!(config.require_api_key().unwrap(), "k");
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("super-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini-1.5-flash"));
        assert!(toml_str.contains("2001"));
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:2001");
    }
}
