// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities: recording algorithm, PD backend and state machine
//! fakes plus a session harness over the in-memory store.

#![allow(dead_code)]

use afstats_config::AfStatsConfig;
use afstats_pipeline::*;
use afstats_pipeline::algorithm::VendorTagDependency;
use afstats_structures::*;
use parking_lot::Mutex;
use std::sync::{Arc, Once};

pub const AF_LIBRARY: &str = "recording";
pub const PD_LIBRARY: &str = "recording-pd";
pub const LENS_POSITION: i32 = 321;

static LOGGING: Once = Once::new();

/// Routes tracing output to the test harness once per binary.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = afstats_observability::try_init_logging("debug");
    });
}

// ═══════════════════════════════════════════════════════════
// Recording algorithm
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct AlgorithmLog {
    pub created_with: Vec<AfCreateParams>,
    pub set_param_batches: Vec<Vec<AfSetParamKind>>,
    pub pushed: Vec<AfSetParam>,
    pub get_param_queries: Vec<AfGetParamKind>,
    pub process_inputs: Vec<Vec<AfInput>>,
    pub destroy_calls: usize,
}

impl AlgorithmLog {
    pub fn process_calls(&self) -> usize {
        self.process_inputs.len()
    }

    /// Set-param batches that carried `kind`.
    pub fn batches_with(&self, kind: AfSetParamKind) -> Vec<&Vec<AfSetParamKind>> {
        self.set_param_batches.iter().filter(|b| b.contains(&kind)).collect()
    }
}

pub type SharedLog = Arc<Mutex<AlgorithmLog>>;

#[derive(Debug, Clone, Default)]
pub struct AlgorithmBehavior {
    pub vendor_dependencies: Vec<VendorTagDependency>,
    pub publish_tags: Vec<VendorTagId>,
    pub fail_process: bool,
}

pub struct RecordingAlgorithm {
    log: SharedLog,
    behavior: AlgorithmBehavior,
}

impl AfAlgorithm for RecordingAlgorithm {
    fn set_params(&mut self, params: &[AfSetParam]) -> AlgoResult<()> {
        let mut log = self.log.lock();
        log.set_param_batches.push(params.iter().map(|p| p.kind()).collect());
        log.pushed.extend(params.iter().cloned());
        Ok(())
    }

    fn get_params(&mut self, queries: &[AfGetParamKind]) -> AlgoResult<Vec<AfGetParamOutput>> {
        self.log.lock().get_param_queries.extend_from_slice(queries);
        let outputs = queries
            .iter()
            .filter_map(|query| match query {
                AfGetParamKind::BafFloatingWindowConfig => {
                    Some(AfGetParamOutput::BafFloatingWindowConfig(BafFloatingWindowConfig {
                        enable: true,
                        max_roi_count: 1,
                        ..Default::default()
                    }))
                }
                AfGetParamKind::CurrentLensPosition => {
                    Some(AfGetParamOutput::CurrentLensPosition(LensMove::Logical(LENS_POSITION)))
                }
                AfGetParamKind::FovcInfo => Some(AfGetParamOutput::Fovc(FovcOutput {
                    field_of_view_compensation_factor: 1.0,
                })),
                AfGetParamKind::DependentVendorTags => Some(AfGetParamOutput::DependentVendorTags(
                    self.behavior.vendor_dependencies.clone(),
                )),
                AfGetParamKind::VendorTagList => {
                    Some(AfGetParamOutput::VendorTagList(self.behavior.publish_tags.clone()))
                }
                AfGetParamKind::InfoForPeer => Some(AfGetParamOutput::PeerInfo(PeerFocusInfo {
                    lens_position: LENS_POSITION,
                    focus_status: AfStatus::Focusing,
                    ..Default::default()
                })),
                _ => None,
            })
            .collect();
        Ok(outputs)
    }

    fn process(&mut self, inputs: &[AfInput], outputs: &mut AfOutputs) -> AlgoResult<()> {
        self.log.lock().process_inputs.push(inputs.to_vec());
        if self.behavior.fail_process {
            return Err(AlgoError::Failed("scripted failure".into()));
        }
        outputs.status = Some(FocusStatus {
            status: AfStatus::Focusing,
            distance_optimal: 0.8,
            ..Default::default()
        });
        outputs.move_lens = Some(LensMove::Logical(LENS_POSITION));
        outputs.focus_mode = Some(AfFocusMode::ContinuousPicture);
        outputs.focus_value = Some(42.0);
        Ok(())
    }

    fn destroy(&mut self, _params: &AfDestroyParams) {
        self.log.lock().destroy_calls += 1;
    }
}

// ═══════════════════════════════════════════════════════════
// PD backend
// ═══════════════════════════════════════════════════════════

/// Scriptable PD library; the HW config can be changed mid-session.
#[derive(Debug, Clone, Default)]
pub struct PdScript {
    pub hw_config: Arc<Mutex<PdHwConfig>>,
    pub lcr_enabled: bool,
    pub processed: Arc<Mutex<Vec<(u64, PdTrigger, StartupMode)>>>,
}

struct ScriptedPdBackend {
    script: PdScript,
}

impl PdBackend for ScriptedPdBackend {
    fn process(&mut self, inputs: &PdLibInputs) -> AlgoResult<PdLibOutputs> {
        self.script
            .processed
            .lock()
            .push((inputs.request_id, inputs.trigger, inputs.startup_mode));
        Ok(PdLibOutputs {
            defocus: PdDefocus {
                defocus: vec![12],
                confidence: vec![800],
                phase_difference: vec![0.5],
                x_window_count: 1,
                y_window_count: 1,
            },
            ..Default::default()
        })
    }

    fn get_param(&mut self, query: PdGetParam) -> AlgoResult<PdGetParamOutput> {
        Ok(match query {
            PdGetParam::HwConfig => PdGetParamOutput::HwConfig(*self.script.hw_config.lock()),
            PdGetParam::LcrEnable => PdGetParamOutput::LcrEnable(self.script.lcr_enabled),
        })
    }
}

// ═══════════════════════════════════════════════════════════
// State machine
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct SimpleStateMachine {
    last_status: Option<AfStatus>,
    triggered: bool,
}

impl AfStateMachine for SimpleStateMachine {
    fn set_focus_and_run_mode(&mut self, _focus_mode: AfFocusMode, _run_mode: AfRunMode) {}

    fn handle_af_state_transition(&mut self, event: AfStateTransitionEvent) {
        match event {
            AfStateTransitionEvent::Trigger => self.triggered = true,
            AfStateTransitionEvent::Cancel => self.triggered = false,
            AfStateTransitionEvent::Idle => {}
        }
    }

    fn control_command(&self) -> AfControlCommand {
        if self.triggered {
            AfControlCommand::Start
        } else {
            AfControlCommand::Idle
        }
    }

    fn process_af_status_update(&mut self, status: AfStatus) {
        self.last_status = Some(status);
    }

    fn control_af_state(&self) -> ControlAfState {
        match self.last_status {
            Some(AfStatus::Focused) => ControlAfState::PassiveFocused,
            Some(AfStatus::Focusing) => ControlAfState::PassiveScan,
            _ => ControlAfState::Inactive,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Session harness
// ═══════════════════════════════════════════════════════════

pub fn test_config() -> AfStatsConfig {
    let mut config = AfStatsConfig::default();
    config.pipeline.max_pipeline_delay = 3;
    config.focus.lens_pos = 150;
    config.algorithm.af_library = AF_LIBRARY.to_string();
    config.algorithm.pd_library = PD_LIBRARY.to_string();
    config
}

pub fn test_sensor() -> SensorInfo {
    SensorInfo {
        resolution: Dimension {
            width: 4000,
            height: 3000,
        },
        active_array: Dimension {
            width: 4000,
            height: 3000,
        },
        crop_last_line: 2999,
        max_fps: 30.0,
        ..Default::default()
    }
}

/// Sensor and session wiring with a sparse PD sensor and PD HW available.
pub fn pdaf_init(mut config: AfStatsConfig) -> AfInitData {
    config.pdaf.enable = true;
    config.pdaf.hw_enable = true;
    config.pdaf.sparse_pd_hw_available = true;
    let mut init = AfInitData::new(config);
    init.sensor = Some(SensorInfo {
        pd_sensor_type: PdSensorType::Type2,
        sensor_mode_supports_pdaf: true,
        ..test_sensor()
    });
    init.camera = Some(CameraInfo::default());
    init.pdaf_session = PdafSessionInfo {
        enabled_ports: vec![PdPort::RdiPdaf],
        callback_present: true,
        lcr_tuning_enabled: false,
    };
    init
}

pub fn basic_init(config: AfStatsConfig) -> AfInitData {
    let mut init = AfInitData::new(config);
    init.sensor = Some(test_sensor());
    init.camera = Some(CameraInfo::default());
    init
}

pub struct Harness {
    pub store: InMemoryPropertyStore,
    pub log: SharedLog,
    pub pd: PdScript,
    pub processor: AfStatsProcessor,
}

pub fn registry(log: &SharedLog, behavior: AlgorithmBehavior, pd: &PdScript) -> AlgorithmRegistry {
    let mut registry = AlgorithmRegistry::new();
    let af_log = Arc::clone(log);
    registry.register_af(AF_LIBRARY, move |params: &AfCreateParams| {
        af_log.lock().created_with.push(params.clone());
        Ok(Box::new(RecordingAlgorithm {
            log: Arc::clone(&af_log),
            behavior: behavior.clone(),
        }) as Box<dyn AfAlgorithm>)
    });
    let script = pd.clone();
    registry.register_pd(PD_LIBRARY, move |_sensor: &SensorInfo| {
        Ok(Box::new(ScriptedPdBackend { script: script.clone() }) as Box<dyn PdBackend>)
    });
    registry
}

pub fn start(init: AfInitData) -> Harness {
    start_with(init, AlgorithmBehavior::default(), PdScript::default()).expect("session should initialize")
}

pub fn start_with(init: AfInitData, behavior: AlgorithmBehavior, pd: PdScript) -> AfResult<Harness> {
    init_logging();
    let store = InMemoryPropertyStore::new(0);
    let log = SharedLog::default();
    let registry = registry(&log, behavior, &pd);
    let processor = AfStatsProcessor::initialize(
        init,
        AfCollaborators {
            store: Arc::new(store.clone()),
            vendor_tags: Arc::new(StaticVendorTagRegistry::default()),
            state_machine: Box::new(SimpleStateMachine::default()),
        },
        &registry,
    )?;
    Ok(Harness {
        store,
        log,
        pd,
        processor,
    })
}

/// Two BAF records of 16 bytes each.
pub fn baf_buffer() -> Vec<u8> {
    let mut raw = Vec::new();
    for (id, h, v, count) in [(0u32, 900u32, 700u32, 4096u32), (1, 300, 200, 1024)] {
        for word in [id, h, v, count] {
            raw.extend_from_slice(&word.to_le_bytes());
        }
    }
    raw
}

pub fn baf_request(request_id: u64) -> ProcessRequest {
    ProcessRequest::new(request_id, PipelineStage::BafStatsDependencyMet).with_baf_buffer(baf_buffer())
}
