// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Execution orchestrator for the AF stats node.
//!
//! Each call to [`AfStatsProcessor::execute_process_request`] takes exactly
//! one path:
//!
//! | Path                              | Condition                                         |
//! |-----------------------------------|---------------------------------------------------|
//! | [`ExecutionPath::Skip`]           | `skip_processing`                                 |
//! | [`ExecutionPath::FixedFocus`]     | stats processing disabled or fixed-focus sensor   |
//! | [`ExecutionPath::WarmUp`]         | offset from last flush <= `max_pipeline_delay`    |
//! | [`ExecutionPath::EarlySubstage`]  | stage is `BafStatsDependencyMet`                  |
//! | [`ExecutionPath::PdOnly`]         | stage is `PdStatDependencyMet`                    |
//!
//! Failures follow "first failure wins": the first error is returned, but
//! independent publishes after it are still attempted.

use crate::algorithm::*;
use crate::dependency::{DependencyResolver, SkipDependencyContext};
use crate::enablement::{HardwareEnablementState, PdafEnablementConditions, PdafSessionInfo};
use crate::hal_output::{build_hal_output, AfStateMachine, HalOutput, HalOutputContext};
use crate::io::mapping::transition_event_from_trigger;
use crate::io::{AfIoAdapter, AfIoSession, PublishList};
use crate::request::{ProcessRequest, TuningModeData};
use crate::settings::AfSettings;
use crate::store::PropertyStore;
use crate::vendor_tags::VendorTagRegistry;
use afstats_config::AfStatsConfig;
use afstats_structures::*;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// First request after a flush.
pub const FIRST_VALID_REQUEST: u64 = 1;

/// Debug buffer handed to the algorithm when debug data is enabled.
pub const DEBUG_DATA_SIZE: usize = 256 * 1024;

const DEFAULT_CONFIG_QUERIES: [AfGetParamKind; 6] = [
    AfGetParamKind::BafFloatingWindowConfig,
    AfGetParamKind::BafFloatingWindowRoiConfig,
    AfGetParamKind::CurrentLensPosition,
    AfGetParamKind::RoiDim,
    AfGetParamKind::PdafWindowConfig,
    AfGetParamKind::FovcInfo,
];

const CAMERA_CLOSE_INDICATOR: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionPath {
    Skip,
    FixedFocus,
    WarmUp,
    EarlySubstage,
    PdOnly,
    /// Dependency-gathering call after warm-up; nothing to do.
    Idle,
}

/// Session facts supplied when the node is created.
#[derive(Debug, Clone)]
pub struct AfInitData {
    pub config: AfStatsConfig,
    /// Read from the usecase pool when `None`.
    pub sensor: Option<SensorInfo>,
    /// Read from the usecase pool when `None`.
    pub camera: Option<CameraInfo>,
    pub capability: HardwareCapability,
    pub pdaf_session: PdafSessionInfo,
    pub calibration: AfCalibrationData,
    pub bps_camera: bool,
}

impl AfInitData {
    pub fn new(config: AfStatsConfig) -> Self {
        Self {
            config,
            sensor: None,
            camera: None,
            capability: HardwareCapability::default(),
            pdaf_session: PdafSessionInfo::default(),
            calibration: AfCalibrationData::default(),
            bps_camera: false,
        }
    }
}

/// External collaborators owned or shared by one session.
pub struct AfCollaborators {
    pub store: Arc<dyn PropertyStore>,
    pub vendor_tags: Arc<dyn VendorTagRegistry>,
    pub state_machine: Box<dyn AfStateMachine>,
}

/// Keeps the first failure of a call while later steps keep running.
struct ResultCollector {
    context: &'static str,
    first: Option<AfError>,
}

impl ResultCollector {
    fn new(context: &'static str) -> Self {
        Self { context, first: None }
    }

    /// Records `result`; returns whether it succeeded.
    ///
    /// Non-fatal errors are logged and never become the call's failure.
    fn record(&mut self, result: AfResult<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) if !e.is_fatal() => {
                debug!("[AF-ORCH] {} step skipped: {}", self.context, e);
                false
            }
            Err(e) => {
                warn!("[AF-ORCH] {} step failed: {}", self.context, e);
                if self.first.is_none() {
                    self.first = Some(e);
                }
                false
            }
        }
    }

    fn finish(self, path: ExecutionPath) -> AfResult<ExecutionPath> {
        match self.first {
            Some(e) => Err(e),
            None => Ok(path),
        }
    }
}

fn algorithm_handle(slot: &mut Option<Box<dyn AfAlgorithm>>) -> AfResult<&mut Box<dyn AfAlgorithm>> {
    slot.as_mut()
        .ok_or_else(|| AfError::InvalidInput("algorithm handle not created".to_string()))
}

/// One AF stats node session.
pub struct AfStatsProcessor {
    config: AfStatsConfig,
    pending_config: Option<AfStatsConfig>,
    settings: AfSettings,
    algorithm: Option<Box<dyn AfAlgorithm>>,
    pd_backend: Option<Box<dyn PdBackend>>,
    state_machine: Box<dyn AfStateMachine>,
    store: Arc<dyn PropertyStore>,
    io: AfIoAdapter,
    resolver: DependencyResolver,
    outputs: AfOutputs,
    publish_vendor_tags: Vec<VendorTagId>,
    bps_camera: bool,
    last_flush_request_id: u64,
    destroyed: bool,
}

impl AfStatsProcessor {
    // ═══════════════════════════════════════════════════════════
    // Session setup
    // ═══════════════════════════════════════════════════════════

    /// Creates the algorithm, pushes session parameters and publishes the
    /// usecase defaults.
    pub fn initialize(
        init: AfInitData,
        collaborators: AfCollaborators,
        registry: &AlgorithmRegistry,
    ) -> AfResult<Self> {
        let AfCollaborators {
            store,
            vendor_tags,
            state_machine,
        } = collaborators;
        let config = init.config;

        let sensor = init
            .sensor
            .or_else(|| {
                store
                    .read_one(0, PropertySlot::current(PropertyId::UsecaseSensorInfo))
                    .and_then(|v| v.as_sensor().cloned())
            })
            .ok_or_else(|| AfError::InvalidInput("sensor info".to_string()))?;
        let camera = init
            .camera
            .or_else(|| {
                store
                    .read_one(0, PropertySlot::current(PropertyId::UsecaseCameraInfo))
                    .and_then(|v| v.as_camera().cloned())
            })
            .ok_or_else(|| AfError::InvalidInput("camera info".to_string()))?;

        info!(
            "[AF-ORCH] Initializing AF stats node for camera {} with '{}'",
            camera.camera_id, config.algorithm.af_library
        );

        let enablement = PdafEnablementConditions::from_session(&config.pdaf, &sensor, &init.pdaf_session);
        let settings = AfSettings::from_config(&config, enablement.is_pdaf_enabled());

        let create_params = AfCreateParams {
            tuning: TuningModeData::default_selector(),
            settings: settings.clone(),
            camera_info: CameraInfo {
                role: CameraRole::Default,
                ..camera.clone()
            },
            calibration: init.calibration,
        };
        let algorithm = registry.create_af(&config.algorithm.af_library, &create_params)?;

        let io = AfIoAdapter::new(
            Arc::clone(&store),
            vendor_tags.as_ref(),
            AfIoSession {
                sensor,
                camera,
                capability: init.capability,
                enablement,
                stats_node_available: config.pipeline.is_stats_node_available,
            },
        );

        let mut processor = Self {
            resolver: DependencyResolver::new(config.pipeline.max_stats_properties),
            config,
            pending_config: None,
            settings,
            algorithm: Some(algorithm),
            pd_backend: None,
            state_machine,
            store,
            io,
            outputs: AfOutputs::default(),
            publish_vendor_tags: Vec::new(),
            bps_camera: init.bps_camera,
            last_flush_request_id: 0,
            destroyed: false,
        };

        processor.set_single_param(AfSetParam::Settings(processor.settings.clone()))?;
        processor.set_default_config(registry)?;
        processor.query_publish_vendor_tags()?;

        info!(
            "[AF-ORCH] AF stats node ready: {:?}",
            processor.io.enablement().state()
        );
        Ok(processor)
    }

    fn set_default_config(&mut self, registry: &AlgorithmRegistry) -> AfResult<()> {
        let camera = self.io.camera().clone();
        let sensor_batch = [
            AfSetParam::SensorInfo(self.io.sensor().clone()),
            AfSetParam::CameraInfo(camera.clone()),
        ];
        let capability_batch = [
            AfSetParam::HardwareCapability(self.io.hardware_capability().clone()),
            AfSetParam::CameraInfo(camera),
        ];
        {
            let algorithm = algorithm_handle(&mut self.algorithm)?;
            push_params(algorithm.as_mut(), &sensor_batch)?;
            push_params(algorithm.as_mut(), &capability_batch)?;
        }

        if self.io.enablement().is_pdaf_enabled() {
            match registry.create_pd(&self.config.algorithm.pd_library, self.io.sensor()) {
                Ok(backend) => self.pd_backend = Some(backend),
                Err(e) => {
                    warn!("[AF-PD] {}; continuing without PDAF", e);
                    self.io.enablement_mut().set_setting_enabled(false);
                    self.settings.disable_pdaf = true;
                }
            }
        }

        self.fetch_default_config()
    }

    /// Pulls the algorithm's defaults and publishes them at usecase scope.
    fn fetch_default_config(&mut self) -> AfResult<()> {
        let outputs = algorithm_handle(&mut self.algorithm)?.get_params(&DEFAULT_CONFIG_QUERIES)?;

        let pd_hw_config = match self.query_pd_library()? {
            Some((config, lcr_enabled)) => {
                self.io
                    .enablement_mut()
                    .set_pd_lib_hw_enabled(config.enable_pd_hw, lcr_enabled)?;
                self.io.enablement().is_pd_hw_enabled().then_some(config)
            }
            None => None,
        };

        self.io.publish_pre_request_output(&outputs, pd_hw_config)
    }

    /// HW config and LCR flag from the PD library, when PDAF is active.
    fn query_pd_library(&mut self) -> AfResult<Option<(PdHwConfig, bool)>> {
        if !self.io.enablement().is_pdaf_enabled() {
            return Ok(None);
        }
        let Some(backend) = self.pd_backend.as_mut() else {
            return Ok(None);
        };

        let config = match backend.get_param(PdGetParam::HwConfig)? {
            PdGetParamOutput::HwConfig(config) => config,
            other => {
                return Err(AfError::AlgorithmFailure(format!(
                    "PD library answered HwConfig with {:?}",
                    other
                )))
            }
        };
        let lcr_enabled = match backend.get_param(PdGetParam::LcrEnable) {
            Ok(PdGetParamOutput::LcrEnable(enabled)) => enabled,
            Ok(_) | Err(AlgoError::NotImplemented(_)) => false,
            Err(e) => return Err(e.into()),
        };
        Ok(Some((config, lcr_enabled)))
    }

    fn query_publish_vendor_tags(&mut self) -> AfResult<()> {
        let outputs = algorithm_handle(&mut self.algorithm)?.get_params(&[AfGetParamKind::VendorTagList])?;
        self.publish_vendor_tags = outputs
            .into_iter()
            .find_map(|output| match output {
                AfGetParamOutput::VendorTagList(tags) => Some(tags),
                _ => None,
            })
            .unwrap_or_default();
        debug!(
            "[AF-ORCH] Algorithm publishes {} vendor tags",
            self.publish_vendor_tags.len()
        );
        Ok(())
    }

    fn query_dependent_vendor_tags(&mut self) -> AfResult<Vec<VendorTagDependency>> {
        let outputs = algorithm_handle(&mut self.algorithm)?.get_params(&[AfGetParamKind::DependentVendorTags])?;
        Ok(outputs
            .into_iter()
            .find_map(|output| match output {
                AfGetParamOutput::DependentVendorTags(tags) => Some(tags),
                _ => None,
            })
            .unwrap_or_default())
    }

    /// Pushes one parameter with the peer and camera entries the algorithm
    /// expects alongside it.
    fn set_single_param(&mut self, param: AfSetParam) -> AfResult<()> {
        let batch = [
            param,
            AfSetParam::PeerInfo(None),
            AfSetParam::CameraInfo(self.io.camera().clone()),
        ];
        push_params(algorithm_handle(&mut self.algorithm)?.as_mut(), &batch)
    }

    // ═══════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════

    pub fn settings(&self) -> &AfSettings {
        &self.settings
    }

    pub fn config(&self) -> &AfStatsConfig {
        &self.config
    }

    pub fn io(&self) -> &AfIoAdapter {
        &self.io
    }

    pub fn enablement_state(&self) -> HardwareEnablementState {
        self.io.enablement().state()
    }

    pub fn last_flush_request_id(&self) -> u64 {
        self.last_flush_request_id
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Stages a new settings source; it takes effect on the next first
    /// valid request.
    pub fn update_config(&mut self, config: AfStatsConfig) {
        self.pending_config = Some(config);
    }

    fn refresh_settings(&mut self) {
        if let Some(config) = self.pending_config.take() {
            self.config = config;
        }
        let pdaf_enabled = self.io.enablement().is_pdaf_enabled();
        self.settings.refresh(&self.config, pdaf_enabled);
    }

    fn multi_camera_sync(&self) -> bool {
        self.config.multi_camera.sync_enabled && self.io.camera().is_multi_camera
    }

    fn debug_data_size(&self) -> usize {
        match self.io.camera().role {
            CameraRole::Default | CameraRole::Master if self.settings.enable_debug_data => DEBUG_DATA_SIZE,
            _ => 0,
        }
    }

    // ═══════════════════════════════════════════════════════════
    // Dependencies and publish list
    // ═══════════════════════════════════════════════════════════

    /// Slots the request still waits on.
    pub fn get_dependencies(&mut self, request: &ProcessRequest) -> AfResult<Vec<PropertySlot>> {
        let enablement = self.io.enablement();
        let context = SkipDependencyContext {
            pdaf_enabled: enablement.is_pdaf_enabled(),
            sensor_type: enablement.sensor_type(),
            role: self.io.camera().role,
        };
        let vendor = if request.skip_processing {
            Vec::new()
        } else {
            self.query_dependent_vendor_tags()?
        };
        let declared = self.resolver.declared(request, &context, &vendor)?;
        Ok(self
            .resolver
            .unmet(self.store.as_ref(), request.request_id, &declared))
    }

    pub fn is_dependencies_satisfied(&mut self, request: &ProcessRequest) -> AfResult<bool> {
        Ok(self.get_dependencies(request)?.is_empty())
    }

    pub fn get_publish_list(&self) -> AfResult<PublishList> {
        self.io
            .publish_list(&self.publish_vendor_tags, self.config.pipeline.max_stats_properties)
    }

    // ═══════════════════════════════════════════════════════════
    // Per-request execution
    // ═══════════════════════════════════════════════════════════

    pub fn execute_process_request(&mut self, request: &ProcessRequest) -> AfResult<ExecutionPath> {
        if self.destroyed {
            return Err(AfError::InvalidState("session destroyed".to_string()));
        }

        let offset = request.request_id.saturating_sub(self.last_flush_request_id);
        trace!(
            "[AF-ORCH] Request {} offset {} stage {:?}",
            request.request_id,
            offset,
            request.stage
        );

        if request.skip_processing {
            return self.run_skip(request);
        }

        if offset == FIRST_VALID_REQUEST {
            self.refresh_settings();
            self.set_single_param(AfSetParam::Settings(self.settings.clone()))?;
        }

        if self.config.pipeline.disable_af_stats_processing || self.io.sensor().is_fixed_focus {
            self.run_fixed_focus(request)
        } else if offset <= self.config.pipeline.max_pipeline_delay {
            self.run_warm_up(request, offset)
        } else {
            self.run_stage(request, offset)
        }
    }

    fn run_skip(&mut self, request: &ProcessRequest) -> AfResult<ExecutionPath> {
        let request_id = request.request_id;
        debug!("[AF-ORCH] Request {} skipped, republishing previous outputs", request_id);

        let mut collector = ResultCollector::new("skip");
        collector.record(self.io.publish_skipped_frame_output(request_id));
        collector.record(self.io.publish_peer_focus_info(request_id, PeerFocusInfo::default()));
        collector.record(self.io.publish_cross_property(request_id));
        collector.finish(ExecutionPath::Skip)
    }

    fn run_fixed_focus(&mut self, request: &ProcessRequest) -> AfResult<ExecutionPath> {
        let request_id = request.request_id;
        let lens_pos = self.settings.lens_pos;
        debug!("[AF-ORCH] Request {} fixed focus at lens position {}", request_id, lens_pos);

        self.io.refresh_reads(request_id);
        self.io.read_focus_mode();
        self.io.read_focus_regions();
        self.io.copy_input_settings();

        self.outputs.reset();
        self.outputs.move_lens = Some(LensMove::Logical(lens_pos));
        self.outputs.status = Some(FocusStatus {
            focus_done: true,
            status: AfStatus::Focused,
            ..Default::default()
        });

        let mut collector = ResultCollector::new("fixed focus");
        collector.record(self.io.publish_cross_property(request_id));

        let peer = if self.io.sensor().is_fixed_focus {
            PeerFocusInfo {
                request_id,
                is_fixed_focus: true,
                lens_position: lens_pos,
                focus_status: AfStatus::Focused,
                focus_distance: 0.0,
            }
        } else {
            PeerFocusInfo::default()
        };
        collector.record(self.io.publish_peer_focus_info(request_id, peer));

        let hal = self.build_hal();
        collector.record(self.io.publish_output(request_id, &self.outputs, &hal, None));
        collector.record(self.io.publish_fovc(request_id));
        collector.finish(ExecutionPath::FixedFocus)
    }

    fn run_warm_up(&mut self, request: &ProcessRequest, offset: u64) -> AfResult<ExecutionPath> {
        let request_id = request.request_id;
        debug!("[AF-ORCH] Request {} warm-up (offset {})", request_id, offset);

        let mut collector = ResultCollector::new("warm-up");
        if offset == FIRST_VALID_REQUEST && self.config.pipeline.enable_early_pcr {
            match &request.tuning {
                Some(tuning) => {
                    collector.record(self.set_single_param(AfSetParam::TuningData(tuning.clone())));
                    collector.record(self.fetch_default_config());
                }
                None => {
                    collector.record(Err(AfError::InvalidInput(format!(
                        "tuning data for early request {}",
                        request_id
                    ))));
                }
            }
        }

        self.io.refresh_reads(request_id);
        let primary = self.run_algorithm(request, None);
        if collector.record(primary) {
            self.io.copy_input_settings();
            let hal = self.build_hal();
            let pd_hw_config = self.current_pd_hw_config();
            collector.record(self.io.publish_output(request_id, &self.outputs, &hal, pd_hw_config));
        }

        collector.record(self.io.publish_cross_property(request_id));
        if self.multi_camera_sync() {
            collector.record(self.update_peer_focus_info(request_id));
        }
        collector.record(self.io.publish_fovc(request_id));
        collector.finish(ExecutionPath::WarmUp)
    }

    fn run_stage(&mut self, request: &ProcessRequest, offset: u64) -> AfResult<ExecutionPath> {
        let request_id = request.request_id;
        self.io.refresh_reads(request_id);

        let enablement = self.io.enablement();
        let parse_pd = enablement.is_pdaf_enabled()
            && self.io.camera().role != CameraRole::Slave
            && ((request.stage == PipelineStage::BafStatsDependencyMet
                && enablement.sensor_type() != PdSensorType::Type1)
                || request.stage == PipelineStage::PdStatDependencyMet);

        if parse_pd {
            let startup_mode = if offset > self.config.pipeline.max_pipeline_delay {
                StartupMode::Valid
            } else {
                StartupMode::Invalid
            };
            let result = match self.pd_backend.as_deref_mut() {
                Some(backend) => self.io.parse_pd_stats(request, backend, startup_mode),
                None => Err(AfError::InvalidState("PD backend not created".to_string())),
            };
            if let Err(e) = result {
                error!("[AF-PD] PD parse failed for request {}: {}", request_id, e);
                return Err(e);
            }
        }

        match request.stage {
            PipelineStage::BafStatsDependencyMet => {
                debug!("[AF-ORCH] Request {} early substage", request_id);
                let mut collector = ResultCollector::new("early substage");

                let primary = self
                    .io
                    .parse_baf_stats(request)
                    .and_then(|baf| self.run_algorithm(request, Some(baf)));
                let processed = collector.record(primary);
                collector.record(self.io.publish_cross_property(request_id));

                if processed {
                    let hal = self.build_hal();
                    let pd_hw_config = self.current_pd_hw_config();
                    let published =
                        collector.record(self.io.publish_output(request_id, &self.outputs, &hal, pd_hw_config));
                    if published && self.multi_camera_sync() {
                        collector.record(self.update_peer_focus_info(request_id));
                    }
                }

                collector.record(self.io.publish_fovc(request_id));
                collector.record(self.io.publish_baf_dependency_met(request_id));
                collector.finish(ExecutionPath::EarlySubstage)
            }
            PipelineStage::PdStatDependencyMet => {
                if !self.io.is_baf_dependency_met(request_id) {
                    self.io.publish_baf_dependency_met(request_id)?;
                }
                Ok(ExecutionPath::PdOnly)
            }
            PipelineStage::AddDependencies => Ok(ExecutionPath::Idle),
        }
    }

    /// Pushes the parameter batch and runs the algorithm once.
    ///
    /// Without BAF stats an empty, startup-invalid set is passed so the
    /// algorithm still produces a provisional state.
    fn run_algorithm(&mut self, request: &ProcessRequest, baf: Option<BafStats>) -> AfResult<()> {
        let tuning = request
            .tuning
            .as_ref()
            .ok_or_else(|| AfError::InvalidInput(format!("tuning data for request {}", request.request_id)))?;

        let params = self.collect_set_params(request, tuning);
        let inputs = self.collect_inputs(request, baf)?;

        let algorithm = algorithm_handle(&mut self.algorithm)?;
        push_params(algorithm.as_mut(), &params)?;
        self.outputs.reset();
        algorithm.process(&inputs, &mut self.outputs)?;
        Ok(())
    }

    /// Parameter batch in push order; tuning data always comes first.
    fn collect_set_params(&mut self, request: &ProcessRequest, tuning: &TuningModeData) -> Vec<AfSetParam> {
        let request_id = request.request_id;
        let mut params = Vec::with_capacity(24);

        params.push(AfSetParam::TuningData(tuning.clone()));
        params.push(AfSetParam::SensorInfo(self.io.sensor().clone()));
        params.push(AfSetParam::HardwareCapability(self.io.hardware_capability().clone()));

        let focus_mode = self.io.read_focus_mode();
        params.push(AfSetParam::FocusMode(focus_mode));
        params.push(AfSetParam::ManualLensMove(self.io.read_focus_distance()));
        params.push(AfSetParam::Roi(self.io.read_focus_regions()));

        match self.io.read_faces() {
            Ok((stabilized, unstabilized)) => {
                params.push(AfSetParam::FaceRoi(stabilized));
                params.push(AfSetParam::UnstabilizedFaceRoi(unstabilized));
            }
            Err(e) => trace!("[AF-ORCH] {}", e),
        }
        match self.io.read_tracker(request_id) {
            Ok(tracker) => params.push(AfSetParam::TrackerRoi(tracker)),
            Err(e) => trace!("[AF-ORCH] {}", e),
        }
        if let Ok(bg) = self.io.read_bg_stats() {
            params.push(AfSetParam::BgStats(bg));
        }
        if let Ok(gyro) = self.io.read_gyro() {
            params.push(AfSetParam::Gyro(gyro));
        }
        if let Ok(gravity) = self.io.read_gravity() {
            params.push(AfSetParam::Gravity(gravity));
        }

        let run_mode = self.io.read_run_mode();
        params.push(AfSetParam::RunMode(run_mode));
        params.push(AfSetParam::ControlCommand(self.control_command(focus_mode, run_mode)));

        if let Ok(tof) = self.io.read_tof() {
            params.push(AfSetParam::Tof(tof));
        }
        if self.io.stats_node_available() {
            if let Ok(aec) = self.io.read_aec_info() {
                params.push(AfSetParam::AecInfo(aec));
            }
        }
        if self.io.enablement().is_pdaf_enabled() {
            params.push(AfSetParam::PdafData(self.io.read_pdaf_inputs(request_id)));
        }

        let peer = if self.multi_camera_sync() && request.peer_sync.is_multi_request {
            self.io.peer_info(request)
        } else {
            None
        };
        params.push(AfSetParam::PeerInfo(peer));
        params.push(AfSetParam::CameraInfo(self.io.camera().clone()));
        params.push(AfSetParam::CropWindow(self.io.crop_window()));
        params.push(AfSetParam::BpsCamera(self.bps_camera));
        params
    }

    /// AF-lock wins over the state machine; otherwise the trigger is fed
    /// through it.
    fn control_command(&mut self, focus_mode: AfFocusMode, run_mode: AfRunMode) -> AfControlCommand {
        if self.io.is_af_lock() {
            return AfControlCommand::Lock;
        }
        self.state_machine.set_focus_and_run_mode(focus_mode, run_mode);
        self.state_machine
            .handle_af_state_transition(transition_event_from_trigger(self.io.read_trigger()));
        self.state_machine.control_command()
    }

    fn collect_inputs(&mut self, request: &ProcessRequest, baf: Option<BafStats>) -> AfResult<Vec<AfInput>> {
        let request_id = request.request_id;
        let mut inputs = Vec::with_capacity(6);

        inputs.push(AfInput::BafStats(baf.unwrap_or_else(|| BafStats {
            request_id,
            startup_mode: StartupMode::Invalid,
            regions: Vec::new(),
        })));

        if !self.config.pipeline.disable_bg_stats_for_af && self.io.stats_node_available() {
            if let Ok(bg) = self.io.read_bg_stats() {
                inputs.push(AfInput::BgStats(bg));
            }
        }

        let dependencies = self.query_dependent_vendor_tags()?;
        let vendor_values = self.io.read_vendor_tag_inputs(request_id, &dependencies);
        if !vendor_values.is_empty() {
            inputs.push(AfInput::VendorTags(vendor_values));
        }

        inputs.push(AfInput::RequestId(request_id));
        inputs.push(AfInput::DebugData(self.debug_data_size()));
        inputs.push(AfInput::CameraInfo(self.io.camera().clone()));
        Ok(inputs)
    }

    fn build_hal(&mut self) -> HalOutput {
        let context = HalOutputContext {
            fallback_mode: self.io.focus_mode(),
            video_caf: self.io.is_video_caf(),
            force_locked: self.config.focus.force_3a_locked_result,
            af_lock: self.io.is_af_lock(),
        };
        build_hal_output(&self.outputs, &context, self.state_machine.as_mut())
    }

    /// Per-request PD HW config, only while PD HW is enabled.
    fn current_pd_hw_config(&mut self) -> Option<PdHwConfig> {
        if !self.io.enablement().is_pd_hw_enabled() {
            return None;
        }
        let backend = self.pd_backend.as_mut()?;
        match backend.get_param(PdGetParam::HwConfig) {
            Ok(PdGetParamOutput::HwConfig(config)) => Some(config),
            Ok(other) => {
                warn!("[AF-PD] Unexpected HW config answer {:?}", other);
                None
            }
            Err(e) => {
                warn!("[AF-PD] HW config query failed: {}", e);
                None
            }
        }
    }

    fn update_peer_focus_info(&mut self, request_id: u64) -> AfResult<()> {
        let outputs = algorithm_handle(&mut self.algorithm)?.get_params(&[AfGetParamKind::InfoForPeer])?;
        let info = outputs.into_iter().find_map(|output| match output {
            AfGetParamOutput::PeerInfo(info) => Some(info),
            _ => None,
        });
        match info {
            Some(info) => self.io.publish_peer_focus_info(
                request_id,
                PeerFocusInfo {
                    request_id,
                    ..info
                },
            ),
            None => Ok(()),
        }
    }

    // ═══════════════════════════════════════════════════════════
    // Flush and teardown
    // ═══════════════════════════════════════════════════════════

    /// Restarts offset counting; the following requests warm up again.
    pub fn flush(&mut self, last_flush_request_id: u64) {
        info!("[AF-ORCH] Flush at request {}", last_flush_request_id);
        self.last_flush_request_id = last_flush_request_id;
    }

    /// Destroys the algorithm and releases the PD backend. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(mut algorithm) = self.algorithm.take() {
            algorithm.destroy(&AfDestroyParams {
                camera_id: self.io.camera().camera_id,
                camera_close_indicator: CAMERA_CLOSE_INDICATOR,
            });
        }
        self.pd_backend = None;
        self.destroyed = true;
        info!("[AF-ORCH] AF stats node destroyed");
    }
}

impl Drop for AfStatsProcessor {
    fn drop(&mut self) {
        self.destroy();
    }
}
