// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Property-store identifiers.
//!
//! Reads address a [`PropertySlot`]: a property and how many frames back to
//! look. Writes always target the current request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dynamic tag id handed out by the vendor-tag registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VendorTagId(pub u32);

impl fmt::Display for VendorTagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vendor:0x{:08x}", self.0)
    }
}

/// Fixed property identifiers plus dynamically registered vendor tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyId {
    // HAL request inputs
    InputControlAfMode,
    InputControlAfTrigger,
    InputControlAfRegions,
    InputControlSceneMode,
    InputControlCaptureIntent,
    InputLensFocusDistance,
    InputScalerCropRegion,
    SensorFrameDuration,

    // Upstream node outputs
    AecFrameInfo,
    FaceRoi,
    TrackerRoi,
    GyroData,
    GravityData,
    TofData,
    ParsedBgStats,

    // Usecase (session) scope
    UsecaseSensorInfo,
    UsecaseCameraInfo,
    UsecaseAfFrameControl,
    UsecaseAfStatsControl,
    UsecaseAfFrameInfo,
    UsecasePdHwConfig,

    // Published HAL metadata
    ControlAfState,
    ControlAfMode,
    ControlAfRegions,
    ControlAfTrigger,
    LensFocusDistance,

    // Published internal properties
    AfFrameControl,
    AfStatsControl,
    AfFrameInfo,
    AfPdFrameInfo,
    PdHwConfig,
    BasePdInternal,
    AfPeerInfo,
    AfBafDependencyMet,
    FovcFrameInfo,
    CrossAfStats,

    VendorTag(VendorTagId),
}

impl PropertyId {
    /// Usecase properties live for the whole session rather than per request.
    pub fn is_usecase(&self) -> bool {
        matches!(
            self,
            PropertyId::UsecaseSensorInfo
                | PropertyId::UsecaseCameraInfo
                | PropertyId::UsecaseAfFrameControl
                | PropertyId::UsecaseAfStatsControl
                | PropertyId::UsecaseAfFrameInfo
                | PropertyId::UsecasePdHwConfig
        )
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyId::VendorTag(tag) => write!(f, "{}", tag),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A property read `offset` frames back from the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertySlot {
    pub id: PropertyId,
    pub offset: u64,
}

impl PropertySlot {
    pub const fn new(id: PropertyId, offset: u64) -> Self {
        Self { id, offset }
    }

    pub const fn current(id: PropertyId) -> Self {
        Self { id, offset: 0 }
    }

    /// Absolute request this slot resolves to, `None` before request zero.
    pub fn resolve(&self, request_id: u64) -> Option<u64> {
        request_id.checked_sub(self.offset)
    }
}

/// Vendor tag location as (section, name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VendorTagName {
    pub section: &'static str,
    pub name: &'static str,
}

impl VendorTagName {
    pub const fn new(section: &'static str, name: &'static str) -> Self {
        Self { section, name }
    }
}

pub const VENDOR_AF_FRAME_CONTROL: VendorTagName =
    VendorTagName::new("org.quic.camera2.statsconfigs", "AFFrameControl");
pub const VENDOR_FOCUS_VALUE: VendorTagName =
    VendorTagName::new("org.quic.camera.focusvalue", "FocusValue");
pub const VENDOR_FOVC_FRAME_CONTROL: VendorTagName =
    VendorTagName::new("org.quic.camera2.statsconfigs", "FOVCFrameControl");
pub const VENDOR_AF_LOCK: VendorTagName =
    VendorTagName::new("org.quic.camera2.statsconfigs", "isAFLock");
