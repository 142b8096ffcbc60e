// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! HAL <-> algorithm enum tables.

use afstats_structures::*;

/// Base HAL focus mode to algorithm focus mode.
pub fn focus_mode_from_hal(mode: ControlAfMode) -> AfFocusMode {
    match mode {
        ControlAfMode::Off => AfFocusMode::Manual,
        ControlAfMode::Auto => AfFocusMode::Auto,
        ControlAfMode::Macro => AfFocusMode::Macro,
        ControlAfMode::ContinuousVideo => AfFocusMode::ContinuousVideo,
        ControlAfMode::ContinuousPicture => AfFocusMode::ContinuousPicture,
        ControlAfMode::Edof => AfFocusMode::Infinity,
    }
}

/// Scene modes that force a focus mode regardless of the requested one.
pub fn scene_mode_override(scene: ControlSceneMode) -> Option<AfFocusMode> {
    match scene {
        ControlSceneMode::Action | ControlSceneMode::Theatre | ControlSceneMode::Sports => Some(AfFocusMode::Auto),
        ControlSceneMode::Landscape | ControlSceneMode::Sunset => Some(AfFocusMode::Infinity),
        _ => None,
    }
}

/// Algorithm focus mode back to HAL; continuous modes use `video_caf`.
pub fn focus_mode_to_hal(mode: AfFocusMode, video_caf: bool) -> Option<ControlAfMode> {
    match mode {
        AfFocusMode::Manual => Some(ControlAfMode::Off),
        AfFocusMode::Auto => Some(ControlAfMode::Auto),
        AfFocusMode::Macro => Some(ControlAfMode::Macro),
        AfFocusMode::ContinuousPicture | AfFocusMode::ContinuousVideo => Some(if video_caf {
            ControlAfMode::ContinuousVideo
        } else {
            ControlAfMode::ContinuousPicture
        }),
        AfFocusMode::Infinity => Some(ControlAfMode::Edof),
        AfFocusMode::Invalid => None,
    }
}

/// Capture intent to run mode; a missing intent is Preview.
pub fn run_mode_from_capture_intent(intent: Option<ControlCaptureIntent>) -> AfRunMode {
    match intent {
        Some(ControlCaptureIntent::StillCapture) => AfRunMode::Snapshot,
        Some(ControlCaptureIntent::VideoRecord) | Some(ControlCaptureIntent::VideoSnapshot) => AfRunMode::Video,
        Some(ControlCaptureIntent::Custom)
        | Some(ControlCaptureIntent::Preview)
        | Some(ControlCaptureIntent::ZeroShutterLag)
        | Some(ControlCaptureIntent::Manual)
        | None => AfRunMode::Preview,
    }
}

pub fn transition_event_from_trigger(trigger: ControlAfTrigger) -> AfStateTransitionEvent {
    match trigger {
        ControlAfTrigger::Idle => AfStateTransitionEvent::Idle,
        ControlAfTrigger::Start => AfStateTransitionEvent::Trigger,
        ControlAfTrigger::Cancel => AfStateTransitionEvent::Cancel,
    }
}

/// Remembers whether the last continuous request was video, so the reverse
/// mapping is unambiguous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusModeTracker {
    video_caf: bool,
}

impl FocusModeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hal(&mut self, mode: ControlAfMode, scene: Option<ControlSceneMode>) -> AfFocusMode {
        match mode {
            ControlAfMode::ContinuousVideo => self.video_caf = true,
            ControlAfMode::ContinuousPicture => self.video_caf = false,
            _ => {}
        }
        let base = focus_mode_from_hal(mode);
        scene.and_then(scene_mode_override).unwrap_or(base)
    }

    pub fn to_hal(&self, mode: AfFocusMode) -> Option<ControlAfMode> {
        focus_mode_to_hal(mode, self.video_caf)
    }

    pub fn is_video_caf(&self) -> bool {
        self.video_caf
    }
}
