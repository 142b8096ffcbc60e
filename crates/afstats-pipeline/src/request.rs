// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-call request description.

use afstats_structures::{PdPort, PeerSyncInfo, PipelineStage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TuningModeKind {
    Default,
    Sensor,
    Usecase,
    Feature1,
    Feature2,
    Scene,
    Effect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TuningSelector {
    pub kind: TuningModeKind,
    pub value: u32,
}

/// Selects calibration data and which concrete algorithm implementation
/// answers subsequent calls.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TuningModeData {
    pub selectors: Vec<TuningSelector>,
}

impl TuningModeData {
    /// Single default selector, used at session creation.
    pub fn default_selector() -> Self {
        Self {
            selectors: vec![TuningSelector {
                kind: TuningModeKind::Default,
                value: 0,
            }],
        }
    }
}

/// Raw hardware buffers valid for the current stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsBuffers {
    pub baf: Option<Arc<[u8]>>,
    pub pd: Vec<(PdPort, Arc<[u8]>)>,
}

impl StatsBuffers {
    pub fn pd_buffer(&self, port: PdPort) -> Option<&Arc<[u8]>> {
        self.pd.iter().find(|(p, _)| *p == port).map(|(_, buf)| buf)
    }
}

/// One invocation of the AF stats node; immutable for the call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessRequest {
    pub request_id: u64,
    pub stage: PipelineStage,
    pub skip_processing: bool,
    pub tuning: Option<TuningModeData>,
    pub peer_sync: PeerSyncInfo,
    pub buffers: StatsBuffers,
}

impl ProcessRequest {
    pub fn new(request_id: u64, stage: PipelineStage) -> Self {
        Self {
            request_id,
            stage,
            tuning: Some(TuningModeData::default_selector()),
            ..Default::default()
        }
    }

    pub fn skipped(request_id: u64) -> Self {
        Self {
            skip_processing: true,
            ..Self::new(request_id, PipelineStage::AddDependencies)
        }
    }

    pub fn with_tuning(mut self, tuning: Option<TuningModeData>) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_peer_sync(mut self, peer_sync: PeerSyncInfo) -> Self {
        self.peer_sync = peer_sync;
        self
    }

    pub fn with_baf_buffer(mut self, data: impl Into<Arc<[u8]>>) -> Self {
        self.buffers.baf = Some(data.into());
        self
    }

    pub fn with_pd_buffer(mut self, port: PdPort, data: impl Into<Arc<[u8]>>) -> Self {
        self.buffers.pd.push((port, data.into()));
        self
    }
}
