// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! HAL-visible AF state, mode, lens distance and focus value.

use crate::algorithm::AfOutputs;
use crate::io::mapping::focus_mode_to_hal;
use afstats_structures::*;

/// External AF state machine.
///
/// Its transition table is owned elsewhere; the pipeline feeds it events
/// and status updates and reads back the command and HAL state.
pub trait AfStateMachine: Send {
    fn set_focus_and_run_mode(&mut self, focus_mode: AfFocusMode, run_mode: AfRunMode);

    fn handle_af_state_transition(&mut self, event: AfStateTransitionEvent);

    fn control_command(&self) -> AfControlCommand;

    fn process_af_status_update(&mut self, status: AfStatus);

    fn control_af_state(&self) -> ControlAfState;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HalOutputContext {
    /// Mode reported when the algorithm did not output one.
    pub fallback_mode: AfFocusMode,
    pub video_caf: bool,
    pub force_locked: bool,
    pub af_lock: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HalOutput {
    pub af_state: ControlAfState,
    pub af_mode: Option<ControlAfMode>,
    pub lens_focus_distance: f32,
    pub focus_value: f32,
}

pub fn build_hal_output(
    outputs: &AfOutputs,
    context: &HalOutputContext,
    state_machine: &mut dyn AfStateMachine,
) -> HalOutput {
    if let Some(status) = outputs.status {
        state_machine.process_af_status_update(status.status);
    }

    let af_state = if context.force_locked || context.af_lock {
        ControlAfState::FocusedLocked
    } else {
        state_machine.control_af_state()
    };

    let mode = outputs.focus_mode.unwrap_or(context.fallback_mode);

    HalOutput {
        af_state,
        af_mode: focus_mode_to_hal(mode, context.video_caf),
        lens_focus_distance: outputs.status.map(|s| s.distance_optimal).unwrap_or(0.0),
        focus_value: outputs.focus_value.unwrap_or(0.0),
    }
}
