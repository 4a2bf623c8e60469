//! LLM Gate - session-authenticated proxy in front of an OpenAI-compatible API

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method, header::CONTENT_TYPE};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LogFormat};
use gate_api::{AppState, RateLimiter, create_router};
use gate_auth::{AuthService, AuthServiceConfig, PasswordHasher};
use gate_core::{CompletionPolicy, CompletionService, provision_user, spawn_session_reaper};
use gate_proxy::{OpenAiClient, OpenAiClientConfig};
use gate_store::{FileCredentialStore, MemorySessionStore, SessionStore};

/// LLM Gate - session-authenticated LLM proxy
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/llm-gate.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "LLM_GATE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Credential file
    #[arg(long, env = "LLM_GATE_USERS_FILE")]
    users_file: Option<String>,

    /// Upstream provider API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Shared secret for the chat routes
    #[arg(long, env = "API_SECRET", hide_env_values = true)]
    api_secret: Option<String>,

    /// Session cookie signing secret
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    session_secret: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a user to the credential file
    AddUser { username: String, password: String },
}

impl Args {
    /// Environment and CLI values take precedence over the config file
    fn apply(&self, config: &mut Config) {
        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(users_file) = &self.users_file {
            config.auth.users_file = users_file.clone();
        }
        if let Some(key) = &self.openai_api_key {
            config.upstream.api_key = Some(key.clone());
        }
        if let Some(secret) = &self.api_secret {
            config.gateway.shared_secret = Some(secret.clone());
        }
        if let Some(secret) = &self.session_secret {
            config.auth.session_secret = Some(secret.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    args.apply(&mut config);

    init_logging(&config.logging.level, config.logging.format);

    let credentials = Arc::new(FileCredentialStore::new(&config.auth.users_file));
    let hasher = PasswordHasher::new(config.auth.bcrypt_cost);

    if let Some(Command::AddUser { username, password }) = &args.command {
        provision_user(credentials.as_ref(), &hasher, username, password)
            .await
            .with_context(|| format!("Failed to add user {}", username))?;
        info!("Added user {} to {}", username, config.auth.users_file);
        println!("User {} added", username);
        return Ok(());
    }

    config.validate().context("Invalid configuration")?;

    info!("Starting LLM Gate v{}", env!("CARGO_PKG_VERSION"));

    // Sessions
    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    spawn_session_reaper(sessions.clone(), config.auth.reaper_interval_secs);

    let auth = Arc::new(AuthService::new(
        credentials,
        sessions,
        hasher,
        AuthServiceConfig {
            session_secret: config.auth.session_secret.clone().unwrap_or_default(),
            session_ttl_hours: config.auth.session_ttl_hours,
            cookie: config.cookie.clone(),
        },
    ));

    // Upstream provider
    let provider = Arc::new(OpenAiClient::new(OpenAiClientConfig {
        base_url: config.upstream.base_url.clone(),
        api_key: config.upstream.api_key.clone().unwrap_or_default(),
        timeout_secs: config.upstream.timeout_secs,
    })?);

    let completions = Arc::new(CompletionService::new(
        provider,
        CompletionPolicy {
            chat_model: config.upstream.chat_model.clone(),
            max_tokens: config.upstream.max_tokens,
            image_model: config.upstream.image_model.clone(),
            image_size: config.upstream.image_size.clone(),
            shared_secret: config.gateway.shared_secret.clone(),
            require_secret_on_get: config.gateway.require_secret_on_get,
            require_secret_on_post: config.gateway.require_secret_on_post,
        },
    ));

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit.window_secs,
        config.rate_limit.max_requests,
    ));

    let state = AppState::new(auth, completions, rate_limiter);

    // Initialize metrics
    let metrics_handle = if config.metrics.enabled {
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics enabled at /metrics");
        Some(Arc::new(handle))
    } else {
        None
    };

    let mut app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());
    if let Some(cors) = cors_layer(&config.cors.allowed_origins) {
        app = app.layer(cors);
    }

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);
    info!("Upstream: {}", config.upstream.base_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
    }
}

/// Credentialed CORS for the configured browser origins
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE])
            .allow_credentials(true),
    )
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_config_file() {
        let args = Args::parse_from([
            "llm-gate",
            "--port",
            "8080",
            "--session-secret",
            "from-the-command-line",
            "--users-file",
            "/tmp/users.txt",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.auth.session_secret.as_deref(),
            Some("from-the-command-line")
        );
        assert_eq!(config.auth.users_file, "/tmp/users.txt");
    }

    #[test]
    fn test_add_user_subcommand() {
        let args = Args::parse_from(["llm-gate", "add-user", "alice", "wonderland"]);
        assert!(matches!(
            args.command,
            Some(Command::AddUser { ref username, .. }) if username == "alice"
        ));
    }

    #[test]
    fn test_cors_layer_skips_invalid_origins() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["bad\norigin".to_string()]).is_none());
        assert!(cors_layer(&["https://app.example".to_string()]).is_some());
    }
}
