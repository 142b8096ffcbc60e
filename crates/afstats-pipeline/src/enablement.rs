// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Hardware enablement policy for the phase-detection paths.
//!
//! Every derived flag is recomputed from the primitive inputs on each query.
//! The only cached state is the library-reported snapshot: once the PD
//! library has reported PD or LCR hardware enabled, a later report of
//! disabled is a [`AfError::HardwareConsistencyViolation`], because the
//! downstream image-size contracts were negotiated against the enabled path.

use afstats_config::PdafConfig;
use afstats_structures::{AfError, AfResult, PdHwConfig, PdPort, PdSensorType, SensorInfo};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Session facts about the PD ports and tuning that are not part of the
/// static settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdafSessionInfo {
    /// Ports wired for this usecase.
    pub enabled_ports: Vec<PdPort>,
    /// A PD data callback is registered with the sensor node.
    pub callback_present: bool,
    /// LCR enabled in the PD tuning header.
    pub lcr_tuning_enabled: bool,
}

impl PdafSessionInfo {
    pub fn has_port(&self, port: PdPort) -> bool {
        self.enabled_ports.contains(&port)
    }
}

/// What the PD library last reported about its hardware paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LibraryReport {
    pub pd_hw_enabled: bool,
    pub lcr_enabled: bool,
}

/// Derived enablement flags at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HardwareEnablementState {
    pub pdaf: bool,
    pub dual_pd_hw: bool,
    pub sparse_pd_hw: bool,
    pub pd_hw: bool,
    pub lcr_hw: bool,
    pub lcr_sw: bool,
}

/// Primitive inputs of the enablement policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdafEnablementConditions {
    setting_enabled: bool,
    sensor_mode_supports_pdaf: bool,
    port_enabled: bool,
    callback_present: bool,
    sensor_type: PdSensorType,

    dual_pd_hw_available: bool,
    dual_pd_port_enabled: bool,
    sparse_pd_hw_available: bool,
    sparse_pd_port_enabled: bool,
    hw_enable_setting: bool,

    lcr_hw_available: bool,
    lcr_port_enabled: bool,
    lcr_setting_enabled: bool,
    lcr_tuning_enabled: bool,

    library_report: Option<LibraryReport>,
}

impl PdafEnablementConditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the conditions from static settings, the sensor mode and the
    /// session port wiring.
    pub fn from_session(config: &PdafConfig, sensor: &SensorInfo, session: &PdafSessionInfo) -> Self {
        let mut conditions = Self::new();
        conditions
            .set_setting_enabled(config.enable)
            .set_sensor_mode_supports_pdaf(sensor.sensor_mode_supports_pdaf)
            .set_port_enabled(session.has_port(PdPort::DualPdHw) || session.has_port(PdPort::RdiPdaf))
            .set_callback_present(session.callback_present)
            .set_sensor_type(sensor.pd_sensor_type)
            .set_dual_pd_hw_available(config.dual_pd_hw_available)
            .set_dual_pd_port_enabled(session.has_port(PdPort::DualPdHw))
            .set_sparse_pd_hw_available(config.sparse_pd_hw_available)
            .set_sparse_pd_port_enabled(session.has_port(PdPort::RdiPdaf))
            .set_hw_enable_setting(config.hw_enable)
            .set_lcr_hw_available(config.lcr_hw_available)
            .set_lcr_port_enabled(session.has_port(PdPort::LcrHw))
            .set_lcr_setting_enabled(config.lcr_enable)
            .set_lcr_tuning_enabled(session.lcr_tuning_enabled);
        conditions
    }

    // ═══════════════════════════════════════════════════════════
    // Setters
    // ═══════════════════════════════════════════════════════════

    pub fn set_setting_enabled(&mut self, value: bool) -> &mut Self {
        self.setting_enabled = value;
        self
    }

    pub fn set_sensor_mode_supports_pdaf(&mut self, value: bool) -> &mut Self {
        self.sensor_mode_supports_pdaf = value;
        self
    }

    pub fn set_port_enabled(&mut self, value: bool) -> &mut Self {
        self.port_enabled = value;
        self
    }

    pub fn set_callback_present(&mut self, value: bool) -> &mut Self {
        self.callback_present = value;
        self
    }

    pub fn set_sensor_type(&mut self, value: PdSensorType) -> &mut Self {
        self.sensor_type = value;
        self
    }

    pub fn set_dual_pd_hw_available(&mut self, value: bool) -> &mut Self {
        self.dual_pd_hw_available = value;
        self
    }

    pub fn set_dual_pd_port_enabled(&mut self, value: bool) -> &mut Self {
        self.dual_pd_port_enabled = value;
        self
    }

    pub fn set_sparse_pd_hw_available(&mut self, value: bool) -> &mut Self {
        self.sparse_pd_hw_available = value;
        self
    }

    pub fn set_sparse_pd_port_enabled(&mut self, value: bool) -> &mut Self {
        self.sparse_pd_port_enabled = value;
        self
    }

    pub fn set_hw_enable_setting(&mut self, value: bool) -> &mut Self {
        self.hw_enable_setting = value;
        self
    }

    pub fn set_lcr_hw_available(&mut self, value: bool) -> &mut Self {
        self.lcr_hw_available = value;
        self
    }

    pub fn set_lcr_port_enabled(&mut self, value: bool) -> &mut Self {
        self.lcr_port_enabled = value;
        self
    }

    pub fn set_lcr_setting_enabled(&mut self, value: bool) -> &mut Self {
        self.lcr_setting_enabled = value;
        self
    }

    pub fn set_lcr_tuning_enabled(&mut self, value: bool) -> &mut Self {
        self.lcr_tuning_enabled = value;
        self
    }

    // ═══════════════════════════════════════════════════════════
    // Library-reported snapshot
    // ═══════════════════════════════════════════════════════════

    /// Records what the PD library reports about its hardware paths.
    ///
    /// A disable after an earlier enable leaves the snapshot untouched and
    /// returns [`AfError::HardwareConsistencyViolation`].
    pub fn set_pd_lib_hw_enabled(&mut self, pd_hw_enabled: bool, lcr_enabled: bool) -> AfResult<()> {
        if let Some(previous) = self.library_report {
            if previous.pd_hw_enabled && !pd_hw_enabled {
                error!("[AF-ENABLE] PD library disabled PD HW after enabling it");
                return Err(AfError::HardwareConsistencyViolation(
                    "PD HW reported disabled after being enabled".to_string(),
                ));
            }
            if previous.lcr_enabled && !lcr_enabled {
                error!("[AF-ENABLE] PD library disabled LCR HW after enabling it");
                return Err(AfError::HardwareConsistencyViolation(
                    "LCR HW reported disabled after being enabled".to_string(),
                ));
            }
        }

        debug!(
            "[AF-ENABLE] PD library reports pd_hw={} lcr={}",
            pd_hw_enabled, lcr_enabled
        );
        self.library_report = Some(LibraryReport {
            pd_hw_enabled,
            lcr_enabled,
        });
        Ok(())
    }

    pub fn library_report(&self) -> Option<LibraryReport> {
        self.library_report
    }

    /// Checks a per-request HW config from the PD library against the latch.
    pub fn check_pd_hw_config(&self, config: &PdHwConfig) -> AfResult<()> {
        if self.is_pd_hw_enabled() && !config.enable_pd_hw {
            error!("[AF-ENABLE] PD HW config disables PD HW while the path is enabled");
            return Err(AfError::HardwareConsistencyViolation(
                "PD HW config disables PD HW while enabled".to_string(),
            ));
        }
        if self.is_lcr_hw_enabled() && !config.lcr_enable {
            error!("[AF-ENABLE] PD HW config disables LCR while the path is enabled");
            return Err(AfError::HardwareConsistencyViolation(
                "PD HW config disables LCR while enabled".to_string(),
            ));
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════
    // Derived queries
    // ═══════════════════════════════════════════════════════════

    pub fn is_pdaf_enabled(&self) -> bool {
        self.setting_enabled && self.sensor_mode_supports_pdaf && self.port_enabled && self.callback_present
    }

    pub fn is_dual_pd_hw_enabled(&self) -> bool {
        self.is_pdaf_enabled()
            && self.dual_pd_hw_available
            && self.sensor_type == PdSensorType::DualPd
            && self.dual_pd_port_enabled
            && self.hw_enable_setting
            && self.pd_lib_reports_hw_enabled()
    }

    pub fn is_sparse_pd_hw_enabled(&self) -> bool {
        self.is_pdaf_enabled()
            && self.sparse_pd_hw_available
            && self.sensor_type.is_sparse()
            && self.sparse_pd_port_enabled
            && self.hw_enable_setting
            && self.pd_lib_reports_hw_enabled()
    }

    pub fn is_pd_hw_enabled(&self) -> bool {
        self.is_dual_pd_hw_enabled() || self.is_sparse_pd_hw_enabled()
    }

    pub fn is_lcr_hw_enabled(&self) -> bool {
        self.is_sparse_pd_hw_enabled()
            && self.lcr_hw_available
            && self.lcr_port_enabled
            && self.lcr_setting_enabled
            && self.library_report.map(|r| r.lcr_enabled).unwrap_or(false)
    }

    pub fn is_lcr_sw_enabled(&self) -> bool {
        self.is_pdaf_enabled() && !self.is_sparse_pd_hw_enabled() && self.lcr_setting_enabled && self.lcr_tuning_enabled
    }

    pub fn sensor_type(&self) -> PdSensorType {
        self.sensor_type
    }

    pub fn state(&self) -> HardwareEnablementState {
        HardwareEnablementState {
            pdaf: self.is_pdaf_enabled(),
            dual_pd_hw: self.is_dual_pd_hw_enabled(),
            sparse_pd_hw: self.is_sparse_pd_hw_enabled(),
            pd_hw: self.is_pd_hw_enabled(),
            lcr_hw: self.is_lcr_hw_enabled(),
            lcr_sw: self.is_lcr_sw_enabled(),
        }
    }

    fn pd_lib_reports_hw_enabled(&self) -> bool {
        self.library_report.map(|r| r.pd_hw_enabled).unwrap_or(false)
    }
}
