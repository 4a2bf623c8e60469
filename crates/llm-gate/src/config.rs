//! Configuration loading and validation

use anyhow::{Context, Result, bail};
use gate_auth::{CookieConfig, DEFAULT_COST, MAX_COST, MIN_COST, SameSitePolicy};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Shortest accepted session signing secret, in bytes
const MIN_SESSION_SECRET_LEN: usize = 16;

/// Longest accepted session lifetime, ten years
const MAX_SESSION_TTL_HOURS: i64 = 87_600;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub cookie: CookieConfig,
    pub upstream: UpstreamConfig,
    pub gateway: GatewayConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_users_file")]
    pub users_file: String,
    #[serde(default)]
    pub session_secret: Option<String>,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default = "default_reaper_interval_secs")]
    pub reaper_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users_file: default_users_file(),
            session_secret: None,
            session_ttl_hours: default_session_ttl_hours(),
            bcrypt_cost: default_bcrypt_cost(),
            reaper_interval_secs: default_reaper_interval_secs(),
        }
    }
}

/// Upstream provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_image_size")]
    pub image_size: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            chat_model: default_chat_model(),
            max_tokens: default_max_tokens(),
            image_model: default_image_model(),
            image_size: default_image_size(),
        }
    }
}

/// Shared-secret policy for the chat routes
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub shared_secret: Option<String>,
    #[serde(default)]
    pub require_secret_on_get: bool,
    #[serde(default = "default_true")]
    pub require_secret_on_post: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            shared_secret: None,
            require_secret_on_get: false,
            require_secret_on_post: true,
        }
    }
}

/// Global rate limit window
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_max_requests")]
    pub max_requests: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
        }
    }
}

/// CORS configuration. No origins means no CORS headers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Metrics configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_users_file() -> String {
    "users.txt".to_string()
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_bcrypt_cost() -> u32 {
    DEFAULT_COST
}

fn default_reaper_interval_secs() -> u64 {
    600
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    400
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_window_secs() -> u64 {
    900 // 15 minutes
}

fn default_max_requests() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file. A missing file yields defaults.
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Check everything the server needs before it starts listening
    pub fn validate(&self) -> Result<()> {
        match self.auth.session_secret.as_deref() {
            None | Some("") => bail!("auth.session_secret is required (SESSION_SECRET)"),
            Some(secret) if secret.len() < MIN_SESSION_SECRET_LEN => bail!(
                "auth.session_secret must be at least {} bytes",
                MIN_SESSION_SECRET_LEN
            ),
            Some(_) => {}
        }

        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.auth.session_ttl_hours) {
            bail!(
                "auth.session_ttl_hours must be between 1 and {}, got {}",
                MAX_SESSION_TTL_HOURS,
                self.auth.session_ttl_hours
            );
        }

        if !(MIN_COST..=MAX_COST).contains(&self.auth.bcrypt_cost) {
            bail!(
                "auth.bcrypt_cost must be between {} and {}",
                MIN_COST,
                MAX_COST
            );
        }

        if self.upstream.api_key.as_deref().is_none_or(str::is_empty) {
            bail!("upstream.api_key is required (OPENAI_API_KEY)");
        }

        url::Url::parse(&self.upstream.base_url)
            .with_context(|| format!("Invalid upstream.base_url: {}", self.upstream.base_url))?;

        if self.upstream.max_tokens == 0 {
            bail!("upstream.max_tokens must be greater than 0");
        }

        let secret_needed =
            self.gateway.require_secret_on_get || self.gateway.require_secret_on_post;
        if secret_needed && self.gateway.shared_secret.as_deref().is_none_or(str::is_empty) {
            bail!("gateway.shared_secret is required while a secret check is enabled (API_SECRET)");
        }

        if self.cookie.same_site == SameSitePolicy::None && !self.cookie.secure {
            bail!("cookie.same_site = \"none\" requires cookie.secure = true");
        }

        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            bail!("rate_limit.window_secs and rate_limit.max_requests must be greater than 0");
        }

        Ok(())
    }
}
