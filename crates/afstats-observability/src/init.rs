// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Installs a console subscriber whose filter comes from the configured base
//! level plus any per-crate debug flags. `RUST_LOG`, when set, wins over both.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

fn build_filter(debug_flags: &CrateDebugFlags, base_level: &str) -> Result<EnvFilter> {
    if let Ok(directive) = std::env::var("RUST_LOG") {
        return EnvFilter::try_new(&directive)
            .with_context(|| format!("Invalid RUST_LOG directive: {}", directive));
    }
    let directive = debug_flags.to_filter_string(base_level);
    EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter directive: {}", directive))
}

/// Initialize console logging
///
/// # Arguments
/// * `debug_flags` - Per-crate debug flags
/// * `base_level` - Level for everything not raised by a flag (`logging.level`)
///
/// # Errors
///
/// Fails if the filter directive is malformed or a global subscriber is
/// already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, base_level: &str) -> Result<()> {
    let env_filter = build_filter(debug_flags, base_level)?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter);

    Registry::default()
        .with(console_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    tracing::debug!(
        "[AF-ORCH] Logging initialized (base level: {}, debug crates: {})",
        base_level,
        debug_flags.enabled_crates.len()
    );
    Ok(())
}

/// Initialize logging from process arguments and `AFSTATS_DEBUG` at info level
pub fn init_logging_default() -> Result<()> {
    init_logging(&crate::cli::parse_debug_flags(), "info")
}

/// Install logging if nothing else has; returns whether this call installed it
///
/// Meant for tests and embedders that may race to set up the subscriber.
pub fn try_init_logging(base_level: &str) -> bool {
    init_logging(&CrateDebugFlags::default(), base_level).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_flag_directives() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let flags = CrateDebugFlags::from_args(vec!["--debug-afstats-pipeline".to_string()]);
        assert!(build_filter(&flags, "warn").is_ok());
    }

    #[test]
    fn test_second_init_is_rejected() {
        let _ = try_init_logging("info");
        assert!(!try_init_logging("info"));
    }
}
