// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging setup and metric names.
//!
//! Metrics go through the `metrics` facade; installing an exporter is up to
//! the host process.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

pub const PASSES_TOTAL: &str = "crd_warden_passes_total";
pub const DEFINITIONS_CREATED_TOTAL: &str = "crd_warden_definitions_created_total";
pub const DEFINITIONS_FAILED_TOTAL: &str = "crd_warden_definitions_failed_total";
pub const PASS_DURATION_MS: &str = "crd_warden_pass_duration_ms";
pub const NEXT_DELAY_SECONDS: &str = "crd_warden_next_delay_seconds";

/// Build the filter: `RUST_LOG` wins over the configured directive.
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Logs go to stderr so `render` and
/// `once --json` keep stdout clean.
///
/// Returns an error if a subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = env_filter(config);
    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}
