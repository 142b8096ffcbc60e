// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-afstats-pipeline` to raise a single crate
//! to debug level while the rest of the process stays at the base level.

use std::collections::HashMap;
use std::env;

use crate::KNOWN_CRATES;

/// Per-crate debug switches
///
/// # Example
/// ```rust
/// use afstats_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-afstats-pipeline".to_string()]);
/// assert!(flags.is_enabled("afstats-pipeline"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    pub enabled_crates: HashMap<String, bool>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}`.
    /// `--debug-all` enables every crate in [`KNOWN_CRATES`].
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();

        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
                continue;
            }

            if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }

        flags
    }

    /// Enable debug output for one crate
    pub fn enable(&mut self, crate_name: &str) {
        if !crate_name.is_empty() {
            self.enabled_crates.insert(crate_name.to_string(), true);
        }
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains_key(crate_name)
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// Get log level for a crate
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Build an `EnvFilter` directive string
    ///
    /// Crate names are converted to their module-path form (`afstats-pipeline`
    /// becomes `afstats_pipeline`), since tracing targets use module paths.
    /// Output is sorted so the directive is stable.
    pub fn to_filter_string(&self, base_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .keys()
            .map(|name| format!("{}=debug", name.replace('-', "_")))
            .collect();
        filters.sort();
        filters.push(base_level.to_string());
        filters.join(",")
    }
}

/// Parse debug flags from the process arguments and the `AFSTATS_DEBUG` variable
///
/// The variable takes a comma-separated crate list, or `all`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());

    if let Ok(env_var) = env::var("AFSTATS_DEBUG") {
        merge_env_value(&mut flags, &env_var);
    }

    flags
}

fn merge_env_value(flags: &mut CrateDebugFlags, value: &str) {
    if value.trim() == "all" {
        flags.enable_all();
        return;
    }
    for crate_name in value.split(',') {
        flags.enable(crate_name.trim());
    }
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  AFSTATS_DEBUG={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  AFSTATS_DEBUG=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-afstats-pipeline".to_string()]);
        assert!(flags.is_enabled("afstats-pipeline"));
        assert!(!flags.is_enabled("afstats-config"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_filter_string_uses_module_paths() {
        let flags = CrateDebugFlags::from_args(vec![
            "--debug-afstats-pipeline".to_string(),
            "--debug-afstats-config".to_string(),
        ]);
        assert_eq!(
            flags.to_filter_string("warn"),
            "afstats_config=debug,afstats_pipeline=debug,warn"
        );
    }

    #[test]
    fn test_filter_string_without_flags() {
        assert_eq!(CrateDebugFlags::default().to_filter_string("info"), "info");
    }

    #[test]
    fn test_env_value_parsing() {
        let mut flags = CrateDebugFlags::default();
        merge_env_value(&mut flags, " afstats-pipeline , ,afstats ");
        assert!(flags.is_enabled("afstats-pipeline"));
        assert!(flags.is_enabled("afstats"));
        assert_eq!(flags.enabled_crates.len(), 2);

        let mut flags = CrateDebugFlags::default();
        merge_env_value(&mut flags, "all");
        assert_eq!(flags.enabled_crates.len(), KNOWN_CRATES.len());
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-afstats-pipeline".to_string()]);
        assert_eq!(flags.log_level("afstats-pipeline"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("afstats-config"), tracing::Level::INFO);
    }
}
