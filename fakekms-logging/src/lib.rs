//! Logging setup for harnesses that embed the fake KMS engine
//!
//! The engine only emits `tracing` events. Whoever embeds it picks the output
//! format here, once per process.

use std::str::FromStr;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Human-readable lines
    Console,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "console" | "pretty" | "text" => Ok(LogFormat::Console),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// `RUST_LOG` wins over the default level
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber
///
/// Fails if a subscriber is already installed.
pub fn init_logging(component: &str, default_level: &str, format: LogFormat) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(env_filter(default_level));

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .try_init()?,
        LogFormat::Console => registry.with(fmt::layer().with_target(true)).try_init()?,
    }

    tracing::info!(component = component, format = ?format, "Logging initialized");
    Ok(())
}

/// Logging captured by the test harness
///
/// Safe to call from every test: only the first call installs a subscriber.
pub fn init_test_logging(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_test_writer()
        .with_target(true)
        .try_init();
}
