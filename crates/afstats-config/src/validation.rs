// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures values are within range and consistent with each other.

use crate::{AfStatsConfig, ConfigError, ConfigResult};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    Conflict { reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::Conflict { reason } => write!(f, "Conflicting configuration: {}", reason),
        }
    }
}

/// Minimum list capacity: skip dependencies need up to three slots plus one vendor tag.
const MIN_STATS_PROPERTIES: usize = 4;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &AfStatsConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_pipeline(config, &mut errors);
    validate_algorithm(config, &mut errors);
    validate_pdaf(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_pipeline(config: &AfStatsConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.pipeline.max_pipeline_delay == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "pipeline.max_pipeline_delay".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if config.pipeline.max_stats_properties < MIN_STATS_PROPERTIES {
        errors.push(ConfigValidationError::InvalidValue {
            field: "pipeline.max_stats_properties".to_string(),
            reason: format!("must be at least {}", MIN_STATS_PROPERTIES),
        });
    }
    if config.focus.lens_pos < 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "focus.lens_pos".to_string(),
            reason: "logical lens position cannot be negative".to_string(),
        });
    }
}

fn validate_algorithm(config: &AfStatsConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.algorithm.af_library.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "algorithm.af_library".to_string(),
        });
    }
    if config.pdaf.enable && config.algorithm.pd_library.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "algorithm.pd_library".to_string(),
        });
    }
}

fn validate_pdaf(config: &AfStatsConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.pdaf.lcr_hw_available && !config.pdaf.sparse_pd_hw_available {
        errors.push(ConfigValidationError::Conflict {
            reason: "pdaf.lcr_hw_available requires pdaf.sparse_pd_hw_available".to_string(),
        });
    }
}

fn validate_logging(config: &AfStatsConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("'{}' is not one of {}", config.logging.level, LOG_LEVELS.join(", ")),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_pipeline_delay_rejected() {
        let mut config = AfStatsConfig::default();
        config.pipeline.max_pipeline_delay = 0;

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("pipeline.max_pipeline_delay"));
    }

    #[test]
    fn test_all_errors_collected() {
        let mut config = AfStatsConfig::default();
        config.pipeline.max_stats_properties = 1;
        config.algorithm.af_library = String::new();
        config.logging.level = "loud".to_string();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("max_stats_properties"));
        assert!(message.contains("algorithm.af_library"));
        assert!(message.contains("logging.level"));
    }

    #[test]
    fn test_lcr_requires_sparse_hw() {
        let mut config = AfStatsConfig::default();
        config.pdaf.lcr_hw_available = true;
        assert!(validate_config(&config).is_err());

        config.pdaf.sparse_pd_hw_available = true;
        assert!(validate_config(&config).is_ok());
    }
}
