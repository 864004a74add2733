//! Structured logging setup.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One line per event, for terminals
    #[default]
    Compact,
    /// JSON lines, for log shippers
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// `EnvFilter` directives (e.g. "info,worker=debug")
    pub filter: String,
    pub format: LogFormat,
    /// Log span open/close events (request timings from `TraceLayer`)
    pub span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Compact,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Reads `RUST_LOG`, `LOG_JSON` and `LOG_SPANS` through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str| {
            var(name)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };

        Self {
            filter: var("RUST_LOG")
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            format: if flag("LOG_JSON") {
                LogFormat::Json
            } else {
                LogFormat::Compact
            },
            span_events: flag("LOG_SPANS"),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_tracing(config: TracingConfig) {
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let registry = tracing_subscriber::registry().with(config.env_filter());

    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(span_events)
                    .with_current_span(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_span_events(span_events))
            .try_init(),
    };

    if result.is_ok() {
        tracing::info!(filter = %config.filter, format = ?config.format, "Logging initialized");
    }
}

/// Initialize logging from the process environment.
pub fn init_tracing_from_env() {
    init_tracing(TracingConfig::from_vars(|name| std::env::var(name).ok()));
}
