// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed payloads exchanged through the property store.

use crate::focus::*;
use crate::geometry::{Dimension, Rect, WeightedRegion, WeightedRoi};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// Sensor and session facts
// ═══════════════════════════════════════════════════════════

/// Current sensor mode as seen by the AF pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorInfo {
    /// Sensor-output (CAMIF) resolution.
    pub resolution: Dimension,
    pub active_array: Dimension,
    pub crop_first_line: u32,
    pub crop_last_line: u32,
    /// CSID line binning.
    pub is_binning_enabled: bool,
    pub pd_sensor_type: PdSensorType,
    pub sensor_mode_supports_pdaf: bool,
    pub is_fixed_focus: bool,
    pub f_number: f32,
    pub focal_length_mm: f32,
    pub pixel_size_um: f32,
    pub max_fps: f32,
}

impl SensorInfo {
    /// Usable frame height for PD line bounds.
    pub fn camif_height(&self) -> u32 {
        if self.crop_last_line == 0 {
            self.resolution.height
        } else {
            self.crop_last_line
                .saturating_sub(self.crop_first_line)
                .saturating_add(1)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CameraInfo {
    pub camera_id: u32,
    pub role: CameraRole,
    pub is_multi_camera: bool,
    pub peer_pipeline_id: Option<u32>,
}

/// BAF hardware limits pushed to the algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareCapability {
    pub kernel_mask_count: u32,
    pub fir_taps: [u32; 2],
    pub iir_a_taps: [u32; 2],
    pub iir_b_taps: [u32; 2],
    pub max_roi_count: u32,
    pub max_roi_size: Dimension,
    pub min_roi_offset: Dimension,
}

impl Default for HardwareCapability {
    fn default() -> Self {
        Self {
            kernel_mask_count: 3,
            fir_taps: [13, 0],
            iir_a_taps: [4, 4],
            iir_b_taps: [6, 6],
            max_roi_count: 180,
            max_roi_size: Dimension::new(2672, 2008),
            min_roi_offset: Dimension::new(76, 64),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Upstream inputs
// ═══════════════════════════════════════════════════════════

/// Exposure facts published by the AEC node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AecFrameInfo {
    pub lux_index: f32,
    pub real_gain: f32,
    pub exposure_time_ns: u64,
    pub brightness_value: f32,
}

/// AEC summary handed to the algorithm and the PD backend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AecInfo {
    pub lux_index: f32,
    pub current_gain: f32,
    pub exposure_time_ns: u64,
    pub current_fps: f32,
    pub brightness_value: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GyroSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub timestamp_ns: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GyroData {
    pub samples: Vec<GyroSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GravityData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub timestamp_ns: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TofData {
    pub is_valid: bool,
    pub distance_mm: i32,
    pub confidence: i32,
    pub max_distance_mm: i32,
    pub timestamp_ns: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaceRect {
    pub id: u32,
    /// Active-array coordinates.
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaceRoiInfo {
    pub request_id: u64,
    pub stabilized: Vec<FaceRect>,
    pub unstabilized: Vec<FaceRect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackerRoi {
    pub id: u32,
    /// Active-array coordinates.
    pub rect: Rect,
    pub confidence: f32,
}

// ═══════════════════════════════════════════════════════════
// Parsed statistics
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BafRoiStats {
    pub roi_id: u32,
    pub h_sharpness: u32,
    pub v_sharpness: u32,
    pub pixel_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BafStats {
    pub request_id: u64,
    pub startup_mode: StartupMode,
    pub regions: Vec<BafRoiStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BgRegionStats {
    pub r_sum: u32,
    pub g_sum: u32,
    pub b_sum: u32,
    pub pixel_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BgStats {
    pub horizontal_regions: u32,
    pub vertical_regions: u32,
    pub regions: Vec<BgRegionStats>,
}

// ═══════════════════════════════════════════════════════════
// Algorithm-derived outputs
// ═══════════════════════════════════════════════════════════

/// Lens target as produced by the algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LensMove {
    Logical(i32),
    Dac(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveLensOutput {
    pub target_lens_position: i32,
    pub use_dac_value: bool,
}

impl From<LensMove> for MoveLensOutput {
    fn from(value: LensMove) -> Self {
        match value {
            LensMove::Logical(position) => Self {
                target_lens_position: position,
                use_dac_value: false,
            },
            LensMove::Dac(position) => Self {
                target_lens_position: position,
                use_dac_value: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FocusStatus {
    pub focus_done: bool,
    pub status: AfStatus,
    pub distance_near: f32,
    pub distance_optimal: f32,
    pub distance_far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BafFloatingWindowConfig {
    pub enable: bool,
    pub h1_filter_enabled: bool,
    pub h2_filter_enabled: bool,
    pub v_filter_enabled: bool,
    pub max_roi_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BafRoiKind {
    #[default]
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BafRoi {
    pub id: u32,
    pub kind: BafRoiKind,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FovcOutput {
    pub field_of_view_compensation_factor: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PdWindowConfig {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
    pub horizontal_window_count: u32,
    pub vertical_window_count: u32,
}

/// Per-request lens and window control for downstream nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AfFrameControl {
    pub move_lens: MoveLensOutput,
    pub exposure_compensation_enable: bool,
    pub fovc: FovcOutput,
    pub pd_window: PdWindowConfig,
}

/// BAF hardware configuration for the next frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AfStatsControl {
    pub baf_config: BafFloatingWindowConfig,
    pub baf_rois: Vec<BafRoi>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AfFrameInfo {
    pub focus_status: FocusStatus,
    pub focus_value: f32,
    pub spot_light_detected: bool,
    pub crop_magnification_factor: f32,
    pub is_depth_focus: bool,
    pub fovc: FovcOutput,
    pub roi: WeightedRoi,
    pub move_lens: MoveLensOutput,
}

/// HAL-visible AF result for one request.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AfHalData {
    pub af_state: ControlAfState,
    /// `None` when the algorithm mode has no HAL counterpart.
    pub af_mode: Option<ControlAfMode>,
    pub region: WeightedRegion,
    pub lens_focus_distance: f32,
    pub trigger: ControlAfTrigger,
}

// ═══════════════════════════════════════════════════════════
// Phase detection
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PdHwConfig {
    pub enable_pd_hw: bool,
    pub lcr_enable: bool,
    pub sad_horizontal_offset: u32,
    pub sad_vertical_offset: u32,
    pub vertical_binning_line_count: u32,
    pub last_pixel_crop: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PdDefocus {
    pub defocus: Vec<i32>,
    pub confidence: Vec<i32>,
    pub phase_difference: Vec<f32>,
    pub x_window_count: u32,
    pub y_window_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PdDepthMap {
    pub horizontal_regions: u32,
    pub vertical_regions: u32,
    pub pd_map: Vec<f32>,
    pub confidence_map: Vec<i32>,
    pub defocus_map: Vec<i32>,
}

/// PD result in the form consumed by the algorithm.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PdafData {
    pub trigger: PdTrigger,
    pub defocus: PdDefocus,
    pub peripheral: PdDefocus,
    /// Only end-of-frame results carry a depth map.
    pub depth_map: Option<PdDepthMap>,
}

// ═══════════════════════════════════════════════════════════
// Multi-camera
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PeerFocusInfo {
    pub request_id: u64,
    pub is_fixed_focus: bool,
    pub lens_position: i32,
    pub focus_status: AfStatus,
    pub focus_distance: f32,
}

/// Caller-supplied multi-camera synchronization facts for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeerSyncInfo {
    pub need_sync: bool,
    pub request_delta: i64,
    pub peer_pipeline_id: u32,
    pub is_multi_request: bool,
}
