// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{validate_config, AfStatsConfig, ConfigError, ConfigResult};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "afstats.toml";

/// Find the configuration file
///
/// Search order:
/// 1. `AFSTATS_CONFIG_PATH` environment variable
/// 2. Current working directory: `./afstats.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("AFSTATS_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by AFSTATS_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet AFSTATS_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, or fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<AfStatsConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: AfStatsConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    validate_config(&config)?;
    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    let lowered = value.to_lowercase();
    lowered == "true" || lowered == "1" || lowered == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `AFSTATS_MAX_PIPELINE_DELAY` -> `pipeline.max_pipeline_delay`
/// - `AFSTATS_DISABLE_AF_STATS` -> `pipeline.disable_af_stats_processing`
/// - `AFSTATS_ENABLE_EARLY_PCR` -> `pipeline.enable_early_pcr`
/// - `AFSTATS_LENS_POS` -> `focus.lens_pos`
/// - `AFSTATS_PDAF_ENABLE` -> `pdaf.enable`
/// - `AFSTATS_PDAF_HW_ENABLE` -> `pdaf.hw_enable`
/// - `AFSTATS_LCR_ENABLE` -> `pdaf.lcr_enable`
/// - `AFSTATS_MULTI_CAMERA_SYNC` -> `multi_camera.sync_enabled`
/// - `AFSTATS_AF_LIBRARY` -> `algorithm.af_library`
/// - `AFSTATS_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut AfStatsConfig) {
    let vars: HashMap<String, String> = [
        ("max_pipeline_delay", "AFSTATS_MAX_PIPELINE_DELAY"),
        ("disable_af_stats", "AFSTATS_DISABLE_AF_STATS"),
        ("enable_early_pcr", "AFSTATS_ENABLE_EARLY_PCR"),
        ("lens_pos", "AFSTATS_LENS_POS"),
        ("pdaf_enable", "AFSTATS_PDAF_ENABLE"),
        ("pdaf_hw_enable", "AFSTATS_PDAF_HW_ENABLE"),
        ("lcr_enable", "AFSTATS_LCR_ENABLE"),
        ("multi_camera_sync", "AFSTATS_MULTI_CAMERA_SYNC"),
        ("af_library", "AFSTATS_AF_LIBRARY"),
        ("log_level", "AFSTATS_LOG_LEVEL"),
    ]
    .iter()
    .filter_map(|(key, var)| env::var(var).ok().map(|value| (key.to_string(), value)))
    .collect();

    apply_overrides(config, &vars);
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"lens_pos": "300", "pdaf_enable": "false"}`)
pub fn apply_cli_overrides(config: &mut AfStatsConfig, cli_args: &HashMap<String, String>) {
    apply_overrides(config, cli_args);
}

fn apply_overrides(config: &mut AfStatsConfig, values: &HashMap<String, String>) {
    // Pipeline settings
    if let Some(value) = values.get("max_pipeline_delay") {
        if let Ok(delay) = value.parse::<u64>() {
            config.pipeline.max_pipeline_delay = delay;
        }
    }
    if let Some(value) = values.get("disable_af_stats") {
        config.pipeline.disable_af_stats_processing = parse_flag(value);
    }
    if let Some(value) = values.get("enable_early_pcr") {
        config.pipeline.enable_early_pcr = parse_flag(value);
    }

    // Focus settings
    if let Some(value) = values.get("lens_pos") {
        if let Ok(lens_pos) = value.parse::<i32>() {
            config.focus.lens_pos = lens_pos;
        }
    }

    // PDAF settings
    if let Some(value) = values.get("pdaf_enable") {
        config.pdaf.enable = parse_flag(value);
    }
    if let Some(value) = values.get("pdaf_hw_enable") {
        config.pdaf.hw_enable = parse_flag(value);
    }
    if let Some(value) = values.get("lcr_enable") {
        config.pdaf.lcr_enable = parse_flag(value);
    }

    if let Some(value) = values.get("multi_camera_sync") {
        config.multi_camera.sync_enabled = parse_flag(value);
    }
    if let Some(value) = values.get("af_library") {
        config.algorithm.af_library = value.clone();
    }
    if let Some(value) = values.get("log_level") {
        config.logging.level = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_afstats.toml");
        File::create(&config_path).unwrap();

        env::set_var("AFSTATS_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("AFSTATS_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("AFSTATS_CONFIG_PATH", "/nonexistent/afstats.toml");
        let result = find_config_file();
        env::remove_var("AFSTATS_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::remove_var("AFSTATS_MAX_PIPELINE_DELAY");
        env::remove_var("AFSTATS_LENS_POS");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[pipeline]").unwrap();
        writeln!(file, "max_pipeline_delay = 4").unwrap();
        writeln!(file, "[focus]").unwrap();
        writeln!(file, "lens_pos = 180").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.pipeline.max_pipeline_delay, 4);
        assert_eq!(config.focus.lens_pos, 180);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::remove_var("AFSTATS_MAX_PIPELINE_DELAY");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[pipeline]").unwrap();
        writeln!(file, "max_pipeline_delay = 0").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = AfStatsConfig::default();

        env::set_var("AFSTATS_PDAF_ENABLE", "false");
        env::set_var("AFSTATS_LENS_POS", "320");

        apply_environment_overrides(&mut config);

        env::remove_var("AFSTATS_PDAF_ENABLE");
        env::remove_var("AFSTATS_LENS_POS");

        assert!(!config.pdaf.enable);
        assert_eq!(config.focus.lens_pos, 320);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AfStatsConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("enable_early_pcr".to_string(), "yes".to_string());
        cli_args.insert("af_library".to_string(), "haf".to_string());
        cli_args.insert("max_pipeline_delay".to_string(), "not-a-number".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert!(config.pipeline.enable_early_pcr);
        assert_eq!(config.algorithm.af_library, "haf");
        assert_eq!(config.pipeline.max_pipeline_delay, 3);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[pipeline]").unwrap();
        writeln!(file, "max_pipeline_delay = 2").unwrap();
        writeln!(file, "[focus]").unwrap();
        writeln!(file, "lens_pos = 10").unwrap();

        env::set_var("AFSTATS_MAX_PIPELINE_DELAY", "5");
        env::set_var("AFSTATS_LENS_POS", "20");

        let mut cli_args = HashMap::new();
        cli_args.insert("lens_pos".to_string(), "30".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("AFSTATS_MAX_PIPELINE_DELAY");
        env::remove_var("AFSTATS_LENS_POS");

        // CLI wins for lens_pos, env wins for delay (no CLI override)
        assert_eq!(config.focus.lens_pos, 30);
        assert_eq!(config.pipeline.max_pipeline_delay, 5);
    }
}
