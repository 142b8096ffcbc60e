// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed property-store values.
//!
//! Each payload type maps to exactly one variant, so `From` conversions and
//! checked accessors are generated together.

use crate::focus::*;
use crate::geometry::{CropWindow, WeightedRegion};
use crate::payloads::*;
use serde::{Deserialize, Serialize};

macro_rules! property_values {
    ($($variant:ident($ty:ty) => $accessor:ident),* $(,)?) => {
        /// One value stored under a property id.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum PropertyValue {
            $($variant($ty)),*
        }

        impl PropertyValue {
            $(
                pub fn $accessor(&self) -> Option<&$ty> {
                    match self {
                        PropertyValue::$variant(value) => Some(value),
                        _ => None,
                    }
                }
            )*

            /// Variant name, for logging.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(PropertyValue::$variant(_) => stringify!($variant)),*
                }
            }
        }

        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::$variant(value)
                }
            }
        )*
    };
}

property_values! {
    U64(u64) => as_u64,
    I32(i32) => as_i32,
    F32(f32) => as_f32,
    Bool(bool) => as_bool,
    AfMode(ControlAfMode) => as_af_mode,
    AfState(ControlAfState) => as_af_state,
    AfTrigger(ControlAfTrigger) => as_af_trigger,
    SceneMode(ControlSceneMode) => as_scene_mode,
    CaptureIntent(ControlCaptureIntent) => as_capture_intent,
    Regions(Vec<WeightedRegion>) => as_regions,
    Region(WeightedRegion) => as_region,
    Crop(CropWindow) => as_crop,
    AecFrame(AecFrameInfo) => as_aec_frame,
    FaceRoi(FaceRoiInfo) => as_face_roi,
    TrackerRoi(TrackerRoi) => as_tracker_roi,
    Gyro(GyroData) => as_gyro,
    Gravity(GravityData) => as_gravity,
    Tof(TofData) => as_tof,
    BgStats(BgStats) => as_bg_stats,
    Sensor(SensorInfo) => as_sensor,
    Camera(CameraInfo) => as_camera,
    FrameControl(AfFrameControl) => as_frame_control,
    StatsControl(AfStatsControl) => as_stats_control,
    FrameInfo(AfFrameInfo) => as_frame_info,
    Pdaf(PdafData) => as_pdaf,
    PdHw(PdHwConfig) => as_pd_hw,
    PeerInfo(PeerFocusInfo) => as_peer_info,
    Fovc(FovcOutput) => as_fovc,
}
