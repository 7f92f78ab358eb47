// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gateway Configuration
//
// Defines the configuration schema for the gateway process:
// - Server settings (bind address, environment tag, CORS origins)
// - Per-provider default credentials, endpoint and generation defaults
//
// Sources, later wins: built-in defaults, YAML file, environment variables.
// Configuration is read once at startup; there is no hot reload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::credentials::Credentials;
use super::provider::{Operation, ProviderKind};

pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG_PATH";

/// Top-level gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Settings per provider, keyed by provider slug
    #[serde(default)]
    pub providers: BTreeMap<ProviderKind, ProviderSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub host: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,

    /// Allowed CORS origins; "*" allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Prometheus exporter port (disabled when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    #[default]
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Some(Environment::Development),
            "staging" | "stage" => Some(Environment::Staging),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

/// Default credentials and generation defaults for one provider
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Whether this provider is served
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Default API key used when a request carries none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API endpoint URL (empty = provider default)
    #[serde(default)]
    pub base_url: String,

    /// Model used when a chat request names none
    #[serde(default)]
    pub default_model: String,

    /// Model used when an embedding request names none
    #[serde(default)]
    pub embedding_model: String,

    /// Default completion budget
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-call timeout for outbound requests
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderSettings {
    /// Built-in settings for a provider
    pub fn for_provider(kind: ProviderKind) -> Self {
        let mut settings = Self {
            enabled: true,
            api_key: None,
            base_url: String::new(),
            default_model: String::new(),
            embedding_model: String::new(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        };
        settings.fill_defaults(kind);
        settings
    }

    fn fill_defaults(&mut self, kind: ProviderKind) {
        if self.base_url.trim().is_empty() {
            self.base_url = kind.default_base_url().to_string();
        }
        if self.default_model.trim().is_empty() {
            self.default_model = kind.default_model().to_string();
        }
        if self.embedding_model.trim().is_empty() {
            self.embedding_model = kind.default_embedding_model().unwrap_or_default().to_string();
        }
        if matches!(&self.api_key, Some(k) if k.trim().is_empty()) {
            self.api_key = None;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// True when enough is configured to build a default client
    pub fn has_credentials(&self, kind: ProviderKind) -> bool {
        let key_ok = !kind.requires_api_key() || self.api_key.is_some();
        let url_ok = !kind.requires_base_url() || !self.base_url.trim().is_empty();
        key_ok && url_ok
    }

    /// Settings for a request-scoped client: override fields win, the rest
    /// is inherited. A caller-supplied endpoint never receives the
    /// configured key; it gets the caller's key or none.
    pub fn with_override(&self, credentials: &Credentials) -> Self {
        let mut settings = self.clone();
        if let Some(url) = &credentials.base_url {
            settings.base_url = url.clone();
            settings.api_key = credentials.api_key.clone();
        } else if let Some(key) = &credentials.api_key {
            settings.api_key = Some(key.clone());
        }
        settings
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("embedding_model", &self.embedding_model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_bind_address(),
            port: default_api_port(),
            environment: Environment::default(),
            cors_origins: default_cors_origins(),
            metrics_port: None,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let mut config = Self {
            server: ServerConfig::default(),
            providers: BTreeMap::new(),
        };
        config.normalize();
        config
    }
}

impl GatewayConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.normalize();
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Make sure every provider has an entry and every entry has concrete
    /// endpoint and model values.
    fn normalize(&mut self) {
        for kind in ProviderKind::ALL {
            self.providers
                .entry(kind)
                .and_modify(|settings| settings.fill_defaults(kind))
                .or_insert_with(|| ProviderSettings::for_provider(kind));
        }
    }

    /// Candidate configuration files, in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(path));
        }
        paths.push(PathBuf::from("./gateway-config.yaml"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".llm-gateway").join("config.yaml"));
        }
        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/llm-gateway/config.yaml"));
        paths
    }

    /// Discover configuration file using precedence order
    /// 1. GATEWAY_CONFIG_PATH environment variable
    /// 2. ./gateway-config.yaml (working directory)
    /// 3. ~/.llm-gateway/config.yaml (user home)
    /// 4. /etc/llm-gateway/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|p| p.exists())
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path (fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::info!("No configuration file found, using defaults and environment");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = var("GATEWAY_HOST") {
            self.server.host = host.trim().to_string();
        }
        if let Some(port) = parse_var::<u16>("GATEWAY_PORT", var("GATEWAY_PORT")) {
            self.server.port = port;
        }
        if let Some(port) = parse_var::<u16>("GATEWAY_METRICS_PORT", var("GATEWAY_METRICS_PORT")) {
            self.server.metrics_port = Some(port);
        }
        if let Some(env) = var("ENVIRONMENT") {
            match Environment::parse(&env) {
                Some(parsed) => self.server.environment = parsed,
                None => tracing::warn!(
                    "Invalid value for ENVIRONMENT: '{}'. Expected development/staging/production. Ignoring.",
                    env
                ),
            }
        }
        if let Some(origins) = var("CORS_ORIGINS") {
            self.server.cors_origins = parse_origins(&origins);
        }

        for kind in ProviderKind::ALL {
            let prefix = kind.env_prefix();
            let key = |suffix: &str| format!("{}_{}", prefix, suffix);
            let settings = self
                .providers
                .entry(kind)
                .or_insert_with(|| ProviderSettings::for_provider(kind));

            if let Some(enabled) = var(&key("ENABLED")) {
                match parse_bool(&enabled) {
                    Some(flag) => settings.enabled = flag,
                    None => tracing::warn!(
                        "Invalid value for {}: '{}'. Expected true/false. Ignoring.",
                        key("ENABLED"),
                        enabled
                    ),
                }
            }
            if let Some(api_key) = var(&key("API_KEY")) {
                settings.api_key = Some(api_key.trim().to_string());
            }
            if let Some(base_url) = var(&key("BASE_URL")) {
                settings.base_url = base_url.trim().to_string();
            }
            if let Some(model) = var(&key("DEFAULT_MODEL")) {
                settings.default_model = model.trim().to_string();
            }
            if let Some(model) = var(&key("EMBEDDING_MODEL")) {
                settings.embedding_model = model.trim().to_string();
            }
            if let Some(v) = parse_var::<u32>(&key("MAX_TOKENS"), var(&key("MAX_TOKENS"))) {
                settings.max_tokens = v;
            }
            if let Some(v) = parse_var::<f32>(&key("TEMPERATURE"), var(&key("TEMPERATURE"))) {
                settings.temperature = v;
            }
            if let Some(v) = parse_var::<u64>(&key("TIMEOUT_SECS"), var(&key("TIMEOUT_SECS"))) {
                settings.timeout_secs = v;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.host.trim().is_empty() {
            anyhow::bail!("server.host cannot be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("server.port must be non-zero");
        }
        if self.server.metrics_port == Some(self.server.port) {
            anyhow::bail!("server.metrics_port must differ from server.port");
        }

        for (kind, provider) in self.enabled_providers() {
            if provider.timeout_secs == 0 {
                anyhow::bail!("timeout_secs must be positive for provider: {}", kind);
            }
            if provider.max_tokens == 0 {
                anyhow::bail!("max_tokens must be positive for provider: {}", kind);
            }
            if !(0.0..=kind.max_temperature()).contains(&provider.temperature) {
                anyhow::bail!(
                    "temperature for provider {} must be between 0.0 and {:.1}",
                    kind,
                    kind.max_temperature()
                );
            }
            if !provider.base_url.is_empty() {
                let parsed = url::Url::parse(&provider.base_url).map_err(|e| {
                    anyhow::anyhow!("Invalid base_url for provider {}: {}", kind, e)
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    anyhow::bail!("base_url for provider {} must use http or https", kind);
                }
            }
            if kind.supports(Operation::Chat) && provider.default_model.is_empty() {
                anyhow::bail!("default_model cannot be empty for provider: {}", kind);
            }
        }

        Ok(())
    }

    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        self.providers.get(&kind)
    }

    /// Enabled providers in stable order
    pub fn enabled_providers(&self) -> impl Iterator<Item = (ProviderKind, &ProviderSettings)> {
        self.providers
            .iter()
            .filter(|(_, settings)| settings.enabled)
            .map(|(kind, settings)| (*kind, settings))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: Option<String>) -> Option<T> {
    let value = value?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Invalid value for {}: '{}'. Ignoring.", name, value);
            None
        }
    }
}

/// Accepts either a comma-separated list or a JSON array
fn parse_origins(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
            return list;
        }
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.environment, Environment::Production);
        assert_eq!(config.providers.len(), ProviderKind::ALL.len());

        let openai = config.provider(ProviderKind::OpenAI).unwrap();
        assert_eq!(openai.base_url, "https://api.openai.com/v1");
        assert_eq!(openai.default_model, "gpt-4o-mini");
        assert!(!openai.has_credentials(ProviderKind::OpenAI));

        let ollama = config.provider(ProviderKind::Ollama).unwrap();
        assert!(ollama.has_credentials(ProviderKind::Ollama));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_provider_is_filled() {
        let yaml = r#"
server:
  port: 9000
  environment: development
providers:
  anthropic:
    api_key: sk-ant-test
    max_tokens: 2048
  dolibarr:
    enabled: false
"#;
        let config = GatewayConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.environment, Environment::Development);

        let anthropic = config.provider(ProviderKind::Anthropic).unwrap();
        assert_eq!(anthropic.max_tokens, 2048);
        assert_eq!(anthropic.base_url, "https://api.anthropic.com");
        assert_eq!(anthropic.default_model, "claude-3-5-sonnet-latest");
        assert!(anthropic.has_credentials(ProviderKind::Anthropic));

        assert!(!config.provider(ProviderKind::Dolibarr).unwrap().enabled);
        assert!(config
            .enabled_providers()
            .all(|(kind, _)| kind != ProviderKind::Dolibarr));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GatewayConfig::default();
        config.apply_overrides_from(lookup(&[
            ("GATEWAY_PORT", "8081"),
            ("ENVIRONMENT", "dev"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_DEFAULT_MODEL", "gpt-4o"),
            ("OPENAI_TEMPERATURE", "0.2"),
            ("OPENAI_TIMEOUT_SECS", "600"),
            ("DOLIBARR_BASE_URL", "https://crm.example.com"),
            ("PERPLEXITY_ENABLED", "off"),
        ]));

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );

        let openai = config.provider(ProviderKind::OpenAI).unwrap();
        assert_eq!(openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(openai.default_model, "gpt-4o");
        assert_eq!(openai.temperature, 0.2);
        assert_eq!(openai.timeout(), Duration::from_secs(600));

        let dolibarr = config.provider(ProviderKind::Dolibarr).unwrap();
        assert_eq!(dolibarr.base_url, "https://crm.example.com");
        assert!(!dolibarr.has_credentials(ProviderKind::Dolibarr));

        assert!(!config.provider(ProviderKind::Perplexity).unwrap().enabled);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = GatewayConfig::default();
        config.apply_overrides_from(lookup(&[
            ("GATEWAY_PORT", "eighty"),
            ("ENVIRONMENT", "qa"),
            ("MISTRAL_MAX_TOKENS", "-5"),
            ("MISTRAL_ENABLED", "maybe"),
        ]));
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.environment, Environment::Production);
        let mistral = config.provider(ProviderKind::Mistral).unwrap();
        assert_eq!(mistral.max_tokens, 1024);
        assert!(mistral.enabled);
    }

    #[test]
    fn test_cors_origins_json_list() {
        assert_eq!(
            parse_origins(r#"["http://localhost:3000","https://app.test"]"#),
            vec!["http://localhost:3000", "https://app.test"]
        );
    }

    #[test]
    fn test_validation() {
        let mut config = GatewayConfig::default();
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());
        config.server.port = 8000;

        let anthropic = config.providers.get_mut(&ProviderKind::Anthropic).unwrap();
        anthropic.temperature = 1.5;
        assert!(config.validate().is_err());
        config
            .providers
            .get_mut(&ProviderKind::Anthropic)
            .unwrap()
            .temperature = 0.5;

        config.providers.get_mut(&ProviderKind::Ollama).unwrap().base_url =
            "ftp://localhost".into();
        assert!(config.validate().is_err());
        config.providers.get_mut(&ProviderKind::Ollama).unwrap().enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_key_override_keeps_configured_endpoint() {
        let mut settings = ProviderSettings::for_provider(ProviderKind::OpenAI);
        settings.api_key = Some("default-key".into());
        let creds = Credentials::from_parts(Some("caller-key"), None).unwrap();

        let merged = settings.with_override(&creds);
        assert_eq!(merged.api_key.as_deref(), Some("caller-key"));
        assert_eq!(merged.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_endpoint_override_drops_configured_key() {
        let mut settings = ProviderSettings::for_provider(ProviderKind::Dolibarr);
        settings.api_key = Some("default-key".into());
        let creds = Credentials::from_parts(None, Some("https://crm.example.com")).unwrap();

        let merged = settings.with_override(&creds);
        assert_eq!(merged.api_key, None);
        assert_eq!(merged.base_url, "https://crm.example.com");
        assert!(!merged.has_credentials(ProviderKind::Dolibarr));

        let creds = Credentials::from_parts(Some("caller-key"), Some("https://crm.example.com"))
            .unwrap();
        let merged = settings.with_override(&creds);
        assert_eq!(merged.api_key.as_deref(), Some("caller-key"));
        assert!(merged.has_credentials(ProviderKind::Dolibarr));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway-config.yaml");
        let mut config = GatewayConfig::default();
        config.server.port = 8123;
        config.to_yaml_file(&path).unwrap();

        let loaded = GatewayConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.server.port, 8123);
        assert_eq!(loaded.providers.len(), ProviderKind::ALL.len());
    }
}
