// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `afstats.toml`. Every section is
//! `#[serde(default)]`, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AfStatsConfig {
    pub pipeline: PipelineConfig,
    pub focus: FocusConfig,
    pub pdaf: PdafConfig,
    pub multi_camera: MultiCameraConfig,
    pub algorithm: AlgorithmConfig,
    pub logging: LoggingConfig,
}

/// Request routing and stats input configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frames of latency before a property becomes visible downstream.
    pub max_pipeline_delay: u64,
    pub disable_af_stats_processing: bool,
    /// Push tuning data and fetch defaults on the first warm-up request.
    pub enable_early_pcr: bool,
    /// Capacity of dependency and publish lists.
    pub max_stats_properties: usize,
    pub disable_bg_stats_for_af: bool,
    pub is_stats_node_available: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_pipeline_delay: 3,
            disable_af_stats_processing: false,
            enable_early_pcr: false,
            max_stats_properties: 32,
            disable_bg_stats_for_af: false,
            is_stats_node_available: true,
        }
    }
}

/// Focus behavior overrides
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Lens position used when stats processing is disabled or focus is fixed.
    pub lens_pos: i32,
    pub manual_af: bool,
    pub af_fullsweep: bool,
    pub disable_focus_indication: bool,
    pub enable_af_algo: bool,
    pub fovc_enable: bool,
    pub force_3a_locked_result: bool,
    pub spot_light_fallback: bool,
    pub lens_sag_comp: bool,
    pub record_mode: bool,
    pub kpi_debug: bool,
    pub profile_3a: bool,
    pub enable_debug_data: bool,
    pub override_haf_algo_mask: u32,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            lens_pos: 0,
            manual_af: false,
            af_fullsweep: false,
            disable_focus_indication: false,
            enable_af_algo: true,
            fovc_enable: false,
            force_3a_locked_result: false,
            spot_light_fallback: false,
            lens_sag_comp: false,
            record_mode: false,
            kpi_debug: false,
            profile_3a: false,
            enable_debug_data: false,
            override_haf_algo_mask: 0,
        }
    }
}

/// Phase-detection settings and platform availability
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PdafConfig {
    pub enable: bool,
    pub hw_enable: bool,
    pub lcr_enable: bool,
    pub dual_pd_hw_available: bool,
    pub sparse_pd_hw_available: bool,
    pub lcr_hw_available: bool,
}

impl Default for PdafConfig {
    fn default() -> Self {
        Self {
            enable: true,
            hw_enable: true,
            lcr_enable: false,
            dual_pd_hw_available: false,
            sparse_pd_hw_available: false,
            lcr_hw_available: false,
        }
    }
}

/// Multi-camera synchronization
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MultiCameraConfig {
    pub sync_enabled: bool,
}

/// Algorithm implementation selection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AlgorithmConfig {
    /// Name resolved by the algorithm factory.
    pub af_library: String,
    pub pd_library: String,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            af_library: "default".to_string(),
            pd_library: "default".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AfStatsConfig = toml::from_str(
            r#"
            [pipeline]
            enable_early_pcr = true

            [focus]
            lens_pos = 250
            "#,
        )
        .unwrap();

        assert!(config.pipeline.enable_early_pcr);
        assert_eq!(config.pipeline.max_pipeline_delay, 3);
        assert_eq!(config.focus.lens_pos, 250);
        assert!(config.focus.enable_af_algo);
        assert_eq!(config.algorithm.af_library, "default");
    }

    #[test]
    fn test_config_serializes_to_json() {
        let config = AfStatsConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["pdaf"]["enable"], serde_json::Value::Bool(true));
    }
}
