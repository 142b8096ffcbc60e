// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! HAL-facing and algorithm-facing focus enums.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// HAL metadata values
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlAfMode {
    Off,
    Auto,
    Macro,
    ContinuousVideo,
    ContinuousPicture,
    Edof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControlAfState {
    #[default]
    Inactive,
    PassiveScan,
    PassiveFocused,
    ActiveScan,
    FocusedLocked,
    NotFocusedLocked,
    PassiveUnfocused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControlAfTrigger {
    #[default]
    Idle,
    Start,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlSceneMode {
    Disabled,
    FacePriority,
    Action,
    Portrait,
    Landscape,
    Night,
    NightPortrait,
    Theatre,
    Beach,
    Snow,
    Sunset,
    SteadyPhoto,
    Fireworks,
    Sports,
    Party,
    Candlelight,
    Barcode,
    Hdr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlCaptureIntent {
    Custom,
    Preview,
    StillCapture,
    VideoRecord,
    VideoSnapshot,
    ZeroShutterLag,
    Manual,
}

// ═══════════════════════════════════════════════════════════
// Algorithm values
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AfFocusMode {
    #[default]
    Invalid,
    Auto,
    Infinity,
    Macro,
    Manual,
    ContinuousPicture,
    ContinuousVideo,
}

impl AfFocusMode {
    pub fn is_continuous(&self) -> bool {
        matches!(self, AfFocusMode::ContinuousPicture | AfFocusMode::ContinuousVideo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AfRunMode {
    #[default]
    Preview,
    Snapshot,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AfStatus {
    #[default]
    Invalid,
    Initialized,
    Focusing,
    Focused,
    NotFocused,
}

/// Command handed to the algorithm alongside each parameter batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AfControlCommand {
    #[default]
    Idle,
    Start,
    Stop,
    Lock,
}

/// Events fed into the external AF state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AfStateTransitionEvent {
    Idle,
    Trigger,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FocusRegionType {
    #[default]
    General,
    Touch,
    Face,
}

// ═══════════════════════════════════════════════════════════
// Pipeline and session values
// ═══════════════════════════════════════════════════════════

/// Marker telling which raw buffers are expected to be valid for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PipelineStage {
    #[default]
    AddDependencies,
    /// Early-interrupt substage.
    BafStatsDependencyMet,
    /// End-of-frame substage.
    PdStatDependencyMet,
}

/// Index into the two-slot PD result cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PdTrigger {
    #[default]
    Early,
    Normal,
}

impl PdTrigger {
    pub const ALL: [PdTrigger; 2] = [PdTrigger::Early, PdTrigger::Normal];

    pub const fn index(self) -> usize {
        match self {
            PdTrigger::Early => 0,
            PdTrigger::Normal => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PdSensorType {
    #[default]
    None,
    Type1,
    Type2,
    Type3,
    DualPd,
}

impl PdSensorType {
    pub fn is_sparse(&self) -> bool {
        matches!(self, PdSensorType::Type2 | PdSensorType::Type3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraRole {
    #[default]
    Default,
    Master,
    Slave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StartupMode {
    #[default]
    Invalid,
    Valid,
}

/// Hardware ports that can carry PD data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PdPort {
    DualPdHw,
    RdiPdaf,
    LcrHw,
    RdiRaw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pd_trigger_indices_are_distinct() {
        assert_eq!(PdTrigger::Early.index(), 0);
        assert_eq!(PdTrigger::Normal.index(), 1);
    }

    #[test]
    fn test_sparse_sensor_types() {
        assert!(PdSensorType::Type2.is_sparse());
        assert!(PdSensorType::Type3.is_sparse());
        assert!(!PdSensorType::Type1.is_sparse());
        assert!(!PdSensorType::DualPd.is_sparse());
    }
}
