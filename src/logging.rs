//! # Structured Logging Module
//!
//! Environment-aware tracing initialization. Production output is JSON for
//! log aggregation; everything else gets the human-readable formatter.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize the global tracing subscriber once per process.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_env("DISPATCH_LOG")
            .unwrap_or_else(|_| EnvFilter::new(default_log_level(&environment)));

        let registry = tracing_subscriber::registry();
        let result = if environment == "production" {
            registry
                .with(fmt::layer().json().with_target(true).with_filter(filter))
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(true).with_filter(filter))
                .try_init()
        };

        // A global subscriber may already be set by the test harness
        if result.is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}

fn get_environment() -> String {
    std::env::var("DISPATCH_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn default_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}
