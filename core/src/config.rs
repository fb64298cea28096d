use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variables that override values loaded from the config file
pub const ENV_BACKEND_URL: &str = "AGENT_API_URL";
pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const ENV_API_SCOPE: &str = "AZURE_API_SCOPE";
pub const ENV_CATEGORY_OPTIONS: &str = "CATEGORY_OPTIONS";
pub const ENV_DEFAULT_CATEGORY: &str = "DEFAULT_CATEGORY_VALUE";

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub categories: CategoriesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Where the agent runtime lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Path of the agent run endpoint, relative to `base_url`
    #[serde(default = "default_agent_path")]
    pub agent_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            agent_path: default_agent_path(),
        }
    }
}

impl BackendConfig {
    /// Full URL of the agent run endpoint
    pub fn agent_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.agent_path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// How long a download may wait for response headers; bodies and chat streams are not bounded by it
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Identity provider settings used by the token provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub tenant_id: Option<String>,

    #[serde(default)]
    pub api_scope: Option<String>,

    #[serde(default = "default_authority")]
    pub authority: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            tenant_id: None,
            api_scope: None,
            authority: default_authority(),
        }
    }
}

impl IdentityConfig {
    /// True when enough is configured to talk to the identity provider
    pub fn is_configured(&self) -> bool {
        self.client_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.tenant_id.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Raw category settings. Parsing and validation happen in `category::get_category_config`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CategoriesConfig {
    /// JSON array of `{"value": ..., "label": ...}` objects
    #[serde(default)]
    pub options: Option<String>,

    #[serde(default)]
    pub default: Option<String>,
}

/// Verbosity itself comes from RUST_LOG
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log every relayed chunk (debug aid, noisy)
    #[serde(default)]
    pub log_stream_chunks: bool,
}

// Default value functions
fn default_port() -> u16 { 3000 }
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_backend_url() -> String { "http://localhost:8000".to_string() }
fn default_agent_path() -> String { "/".to_string() }
fn default_connect_timeout() -> u64 { 20 }
fn default_request_timeout() -> u64 { 120 }
fn default_authority() -> String { "https://login.microsoftonline.com".to_string() }

/// Get default config file path
/// Uses ~/.config/ragchat/config.toml for Unix-like CLI experience
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ragchat")
        .join("config.toml")
}

/// Load config from file, or return defaults if not found.
/// Environment overrides are applied on top of whichever source wins.
///
/// Loading order:
/// 1. Specified path (if provided)
/// 2. ./config.toml (if exists)
/// 3. default_config_path() (usually ~/.config/ragchat/config.toml)
pub fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = load_config_file(path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn load_config_file(path: Option<PathBuf>) -> anyhow::Result<Config> {
    if let Some(config_path) = path {
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::info!("Loaded config from specified path {:?}", config_path);
            return Ok(config);
        } else {
            anyhow::bail!("Specified config file not found: {:?}", config_path);
        }
    }

    // Try current directory config.toml
    let local_config = PathBuf::from("config.toml");
    if local_config.exists() {
        match std::fs::read_to_string(&local_config) {
            Ok(content) => {
                match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        tracing::info!("Loaded config from current directory {:?}", local_config);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse ./config.toml: {}. Falling back to default path.", e);
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to read ./config.toml: {}. Falling back to default path.", e);
            }
        }
    }

    let default_path = default_config_path();
    if default_path.exists() {
        let content = std::fs::read_to_string(&default_path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::info!("Loaded config from default path {:?}", default_path);
        Ok(config)
    } else {
        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }
}

/// Overlay environment values. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_BACKEND_URL) {
        config.backend.base_url = url;
    }
    if let Some(client_id) = get(ENV_CLIENT_ID) {
        config.identity.client_id = Some(client_id);
    }
    if let Some(tenant_id) = get(ENV_TENANT_ID) {
        config.identity.tenant_id = Some(tenant_id);
    }
    if let Some(scope) = get(ENV_API_SCOPE) {
        config.identity.api_scope = Some(scope);
    }
    if let Some(options) = get(ENV_CATEGORY_OPTIONS) {
        config.categories.options = Some(options);
    }
    if let Some(default) = get(ENV_DEFAULT_CATEGORY) {
        config.categories.default = Some(default);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert!(!config.logging.log_stream_chunks);
        assert!(!config.identity.is_configured());
    }

    #[test]
    fn parses_sections() {
        let raw = r#"
[server]
port = 8080

[backend]
base_url = "https://agent.internal/"
agent_path = "/run"

[categories]
options = '[{"value":"golf","label":"Golf"}]'
default = "golf"

[logging]
log_stream_chunks = true
"#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.backend.agent_url(), "https://agent.internal/run");
        assert_eq!(config.categories.default.as_deref(), Some("golf"));
        assert!(config.logging.log_stream_chunks);
    }

    #[test]
    fn agent_url_joins_root_path() {
        let backend = BackendConfig::default();
        assert_eq!(backend.agent_url(), "http://localhost:8000/");
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "http://agent:9000"),
            (ENV_CLIENT_ID, "client"),
            (ENV_TENANT_ID, "tenant"),
            (ENV_DEFAULT_CATEGORY, "tennis"),
            (ENV_API_SCOPE, "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.identity.api_scope = Some("api://from-file/.default".to_string());
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend.base_url, "http://agent:9000");
        assert!(config.identity.is_configured());
        assert_eq!(config.categories.default.as_deref(), Some("tennis"));
        // blank values do not clobber
        assert_eq!(config.identity.api_scope.as_deref(), Some("api://from-file/.default"));
        assert!(config.categories.options.is_none());
    }

    #[test]
    fn missing_specified_file_is_an_error() {
        let result = load_config_file(Some(PathBuf::from("/definitely/not/here.toml")));
        assert!(result.is_err());
    }
}
