// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Algorithm-facing static settings snapshot.

use afstats_config::AfStatsConfig;
use serde::{Deserialize, Serialize};

/// Settings pushed to the algorithm with the `Settings` parameter.
///
/// The first four fields are fixed for the session; [`AfSettings::refresh`]
/// only updates the rest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AfSettings {
    pub disable_focus_indication: bool,
    pub enable_af_algo: bool,
    pub fovc_enable: bool,
    pub kpi_debug: bool,

    pub af_fullsweep: bool,
    pub lens_pos: i32,
    pub manual_af: bool,
    pub record_mode: bool,
    pub override_haf_algo_mask: u32,
    pub spot_light_fallback: bool,
    pub disable_pdaf: bool,
    pub lens_sag_comp: bool,
    pub profile_3a: bool,
    pub enable_debug_data: bool,
}

impl AfSettings {
    pub fn from_config(config: &AfStatsConfig, pdaf_enabled: bool) -> Self {
        let focus = &config.focus;
        let mut settings = Self {
            disable_focus_indication: focus.disable_focus_indication,
            enable_af_algo: focus.enable_af_algo,
            fovc_enable: focus.fovc_enable,
            kpi_debug: focus.kpi_debug,
            ..Default::default()
        };
        settings.refresh(config, pdaf_enabled);
        settings
    }

    pub fn refresh(&mut self, config: &AfStatsConfig, pdaf_enabled: bool) {
        let focus = &config.focus;
        self.af_fullsweep = focus.af_fullsweep;
        self.lens_pos = focus.lens_pos;
        self.manual_af = focus.manual_af;
        self.record_mode = focus.record_mode;
        self.override_haf_algo_mask = focus.override_haf_algo_mask;
        self.spot_light_fallback = focus.spot_light_fallback;
        self.disable_pdaf = !pdaf_enabled;
        self.lens_sag_comp = focus.lens_sag_comp;
        self.profile_3a = focus.profile_3a;
        self.enable_debug_data = focus.enable_debug_data;
    }
}
