//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.triptt/config.json`) and environment.
//! Secrets can be kept out of the file with the `MESSENGER_*` variables.

use crate::conversation::Templates;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verify token used when none is configured.
pub const DEFAULT_VERIFY_TOKEN: &str = "batatinha";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Messenger platform credentials and endpoint.
    #[serde(default)]
    pub messenger: MessengerConfig,

    /// Reply copy; sections left out use the built-in defaults.
    #[serde(default)]
    pub templates: Templates,
}

/// Bind address and port for the webhook server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 8080).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1"). Use "0.0.0.0" behind a public tunnel or proxy.
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Messenger settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessengerConfig {
    /// Page access token for the Send API. Overridden by MESSENGER_PAGE_ACCESS_TOKEN.
    pub page_access_token: Option<String>,
    /// App secret for X-Hub-Signature checks. Overridden by MESSENGER_APP_SECRET.
    pub app_secret: Option<String>,
    /// Token expected in the subscription handshake. Overridden by MESSENGER_VERIFY_TOKEN.
    pub verify_token: Option<String>,
    /// Graph API base URL (default https://graph.facebook.com/v2.6).
    pub graph_api_base: Option<String>,
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Env var `name` if set and non-empty, otherwise the trimmed config value.
fn env_or(name: &str, configured: Option<&String>) -> Option<String> {
    std::env::var(name)
        .ok()
        .and_then(|s| non_empty(&s))
        .or_else(|| configured.and_then(|s| non_empty(s)))
}

/// Resolve the page access token: env MESSENGER_PAGE_ACCESS_TOKEN overrides config.
pub fn resolve_page_access_token(config: &Config) -> Option<String> {
    env_or(
        "MESSENGER_PAGE_ACCESS_TOKEN",
        config.messenger.page_access_token.as_ref(),
    )
}

/// Resolve the app secret: env MESSENGER_APP_SECRET overrides config.
pub fn resolve_app_secret(config: &Config) -> Option<String> {
    env_or("MESSENGER_APP_SECRET", config.messenger.app_secret.as_ref())
}

/// Resolve the verify token: env MESSENGER_VERIFY_TOKEN, then config, then [`DEFAULT_VERIFY_TOKEN`].
pub fn resolve_verify_token(config: &Config) -> String {
    verify_token_from("MESSENGER_VERIFY_TOKEN", config)
}

fn verify_token_from(env_name: &str, config: &Config) -> String {
    env_or(env_name, config.messenger.verify_token.as_ref())
        .unwrap_or_else(|| DEFAULT_VERIFY_TOKEN.to_string())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("TRIPTT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".triptt").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Parse and validate config JSON.
pub fn parse_config(s: &str) -> Result<Config> {
    let config: Config = serde_json::from_str(s)?;
    config
        .templates
        .validate()
        .context("invalid receipt template")?;
    Ok(config)
}

/// Load config from the given path, or the default path (or TRIPTT_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        parse_config(&s).with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 8080);
        assert_eq!(g.bind, "127.0.0.1");
    }

    #[test]
    fn empty_object_is_default() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert!(config.messenger.app_secret.is_none());
        assert_eq!(config.templates, Templates::default());
    }

    #[test]
    fn camel_case_keys() {
        let config = parse_config(
            r#"{
                "gateway": { "port": 9000, "bind": "0.0.0.0" },
                "messenger": { "pageAccessToken": "EAAB", "appSecret": "s", "verifyToken": "v", "graphApiBase": "http://localhost:1" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.messenger.page_access_token.as_deref(), Some("EAAB"));
        assert_eq!(config.messenger.graph_api_base.as_deref(), Some("http://localhost:1"));
    }

    #[test]
    fn negative_receipt_price_is_rejected() {
        let mut templates = Templates::default();
        templates.receipt.line_items[0].price = -5.0;
        let json = serde_json::json!({ "templates": templates }).to_string();
        assert!(parse_config(&json).is_err());
    }

    #[test]
    fn blank_values_are_unset() {
        assert_eq!(env_or("TRIPTT_TEST_UNSET_VAR", Some(&"  ".to_string())), None);
        assert_eq!(
            env_or("TRIPTT_TEST_UNSET_VAR", Some(&" tok ".to_string())),
            Some("tok".to_string())
        );
    }

    #[test]
    fn verify_token_default() {
        let unset = format!("TRIPTT_UNSET_{}", uuid::Uuid::new_v4().simple());
        let mut config = Config::default();
        assert_eq!(verify_token_from(&unset, &config), DEFAULT_VERIFY_TOKEN);

        config.messenger.verify_token = Some("  ".to_string());
        assert_eq!(verify_token_from(&unset, &config), DEFAULT_VERIFY_TOKEN);

        config.messenger.verify_token = Some("from-config".to_string());
        assert_eq!(verify_token_from(&unset, &config), "from-config");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = std::env::temp_dir()
            .join(format!("triptt-missing-{}", uuid::Uuid::new_v4()))
            .join("config.json");
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.gateway.port, 8080);
    }
}
