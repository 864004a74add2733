//! Landing Engine
//!
//! Backend for a single-page marketing site:
//! - Visitor session tracking with inactivity finalization and AI summaries
//! - Chat relay that flags questions to answer on the call
//! - JSON file ledgers behind a code-protected admin API
//! - SMTP alerts for visits, section views, deferred questions and endings

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use api::{router, AppState};
use ledger::{Ledger, LedgerConfig};
use providers::{
    AnthropicClient, Completion, GeoConfig, GeoLocator, IpApiClient, LlmConfig, Mailer, SmtpConfig,
    SmtpMailer,
};
use telemetry::init_tracing_from_env;
use tracker_core::ExcludedNetworks;
use worker::{
    ChatConfig, ChatRelay, Notifier, SessionTracker, Summarizer, TrackerConfig, WorkerConfig,
    WorkerScheduler,
};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Directory of built page assets served for unmatched paths
    #[serde(default = "default_static_dir")]
    static_dir: Option<PathBuf>,

    /// Access code for the admin API; admin is disabled when unset
    #[serde(default)]
    admin_code: Option<String>,

    /// Addresses or CIDR blocks never tracked
    #[serde(default)]
    excluded_networks: Vec<String>,

    /// Take the client address from X-Forwarded-For / X-Real-IP
    #[serde(default)]
    trust_proxy: bool,

    #[serde(default)]
    ledger: LedgerConfig,

    #[serde(default)]
    llm: LlmConfig,

    #[serde(default)]
    geo: GeoConfig,

    #[serde(default)]
    smtp: SmtpConfig,

    #[serde(default)]
    tracker: TrackerConfig,

    #[serde(default)]
    chat: ChatConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> Option<PathBuf> {
    Some(PathBuf::from("public"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            admin_code: None,
            excluded_networks: Vec::new(),
            trust_proxy: false,
            ledger: LedgerConfig::default(),
            llm: LlmConfig::default(),
            geo: GeoConfig::default(),
            smtp: SmtpConfig::default(),
            tracker: TrackerConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // rustls 0.23+ requires explicit crypto provider selection
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Landing Engine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    info!(
        data_dir = %config.ledger.data_dir.display(),
        llm_configured = config.llm.is_configured(),
        smtp_configured = config.smtp.is_configured(),
        excluded_networks = config.excluded_networks.len(),
        trust_proxy = config.trust_proxy,
        "Loaded configuration"
    );

    let excluded = ExcludedNetworks::parse(&config.excluded_networks)
        .context("Invalid EXCLUDED_NETWORKS entry")?;

    // Providers
    let llm: Arc<dyn Completion> =
        Arc::new(AnthropicClient::new(config.llm.clone()).context("Failed to create LLM client")?);
    let geo: Arc<dyn GeoLocator> =
        Arc::new(IpApiClient::new(config.geo.clone()).context("Failed to create geolocation client")?);

    let mut notifier = Notifier::new();
    if config.smtp.is_configured() {
        let mailer: Arc<dyn Mailer> =
            Arc::new(SmtpMailer::new(&config.smtp).context("Failed to create SMTP transport")?);
        providers::health::check_mailer(&config.smtp, mailer.as_ref()).await;
        notifier = notifier.with_mailer(mailer);
    } else {
        warn!("SMTP not configured, alerts will only be logged");
        telemetry::health().mailer.set_unhealthy("SMTP not configured");
    }
    let notifier = Arc::new(notifier);

    providers::health::check_llm(&config.llm);
    providers::health::check_geolocation(config.geo.enabled);

    // Storage
    let ledger = Arc::new(
        Ledger::open(config.ledger.clone())
            .await
            .context("Failed to open data directory")?,
    );

    // Session lifecycle
    let tracker = Arc::new(SessionTracker::new(
        config.tracker.clone(),
        ledger.clone(),
        geo,
        Summarizer::new(llm.clone(), config.llm.analysis_max_tokens),
        notifier.clone(),
        excluded,
    ));

    if let Err(e) = tracker.restore().await {
        warn!(error = %e, "Failed to restore active sessions");
    }

    let chat = Arc::new(ChatRelay::new(
        config.chat.clone(),
        config.llm.chat_max_tokens,
        llm,
        ledger.clone(),
        tracker.clone(),
        notifier.clone(),
    ));

    // Start background workers
    let worker_config = WorkerConfig {
        sweep_interval: config.tracker.sweep_interval(),
        ..WorkerConfig::default()
    };
    let scheduler = Arc::new(WorkerScheduler::new(worker_config, tracker.clone(), notifier));
    let _worker_handles = scheduler.start();

    // Create router
    let mut state = AppState::new(tracker.clone(), chat, ledger, config.admin_code.clone())
        .with_trust_proxy(config.trust_proxy);
    if let Some(dir) = config.static_dir.clone().filter(|d| d.is_dir()) {
        info!(dir = %dir.display(), "Serving static assets");
        state = state.with_static_dir(dir);
    }
    let app = router(state);

    // Start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Shutting down...");

    // Live sessions survive the restart through the snapshot
    tracker.persist_active().await;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("LANDING")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    Ok(config)
}

/// Conventional unprefixed variables take precedence over everything else.
fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(port) = var("PORT") {
        config.port = port.parse().context("PORT must be a port number")?;
    }
    if let Some(dir) = var("DATA_DIR") {
        config.ledger.data_dir = PathBuf::from(dir);
    }
    if let Some(code) = var("ADMIN_CODE") {
        config.admin_code = Some(code);
    }
    if let Some(networks) = var("EXCLUDED_NETWORKS") {
        config.excluded_networks = networks
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(flag) = var("TRUST_PROXY") {
        config.trust_proxy = flag == "1" || flag.eq_ignore_ascii_case("true");
    }
    if let Some(markers) = var("OUT_OF_SCOPE_MARKERS") {
        config.chat.out_of_scope_markers = markers
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(key) = var("ANTHROPIC_API_KEY") {
        config.llm.api_key = Some(key);
    }

    if let Some(host) = var("SMTP_HOST") {
        config.smtp.host = Some(host);
    }
    if let Some(port) = var("SMTP_PORT") {
        config.smtp.port = port.parse().context("SMTP_PORT must be a port number")?;
    }
    if let Some(user) = var("SMTP_USER") {
        config.smtp.username = Some(user);
    }
    if let Some(pass) = var("SMTP_PASS") {
        config.smtp.password = Some(pass);
    }
    if let Some(to) = var("ALERT_EMAIL") {
        config.smtp.alert_to = Some(to);
    }

    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
