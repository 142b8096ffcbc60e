// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Batched property-store I/O for the AF node.
//!
//! All request inputs are fetched with one `read_batch` per call
//! ([`AfIoAdapter::refresh_reads`]) and every publish is a single
//! `write_batch`. The adapter owns the per-request output structures and
//! overwrites them on each call.

use super::mapping::{run_mode_from_capture_intent, FocusModeTracker};
use crate::algorithm::{
    AfGetParamOutput, AfOutputs, AfRoiInfo, PdBackend, PdLibInputs, PdafInputs, RoiList,
    VendorTagDependency, VendorTagValue,
};
use crate::dependency::DependencyListBuilder;
use crate::enablement::PdafEnablementConditions;
use crate::hal_output::HalOutput;
use crate::normalizer;
use crate::pd_cache::PdResultCache;
use crate::request::ProcessRequest;
use crate::store::PropertyStore;
use crate::vendor_tags::VendorTagRegistry;
use afstats_structures::*;
use ahash::AHashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Inputs fetched once per call, current request unless noted.
const AF_READ_PROPERTIES: &[PropertySlot] = &[
    PropertySlot::current(PropertyId::InputControlAfMode),
    PropertySlot::current(PropertyId::InputControlAfTrigger),
    PropertySlot::current(PropertyId::InputControlAfRegions),
    PropertySlot::current(PropertyId::InputControlSceneMode),
    PropertySlot::current(PropertyId::InputControlCaptureIntent),
    PropertySlot::current(PropertyId::InputLensFocusDistance),
    PropertySlot::current(PropertyId::InputScalerCropRegion),
    PropertySlot::new(PropertyId::SensorFrameDuration, 1),
    PropertySlot::new(PropertyId::AecFrameInfo, 1),
    PropertySlot::current(PropertyId::FaceRoi),
    PropertySlot::current(PropertyId::TrackerRoi),
    PropertySlot::current(PropertyId::GyroData),
    PropertySlot::current(PropertyId::GravityData),
    PropertySlot::current(PropertyId::TofData),
    PropertySlot::current(PropertyId::ParsedBgStats),
];

/// Previous-frame outputs republished on skipped frames.
const SKIPPED_FRAME_PROPERTIES: [PropertyId; 5] = [
    PropertyId::AfFrameControl,
    PropertyId::AfFrameInfo,
    PropertyId::AfStatsControl,
    PropertyId::PdHwConfig,
    PropertyId::AfPdFrameInfo,
];

/// Properties the node can publish for every request.
pub const FIXED_PUBLISH_PROPERTIES: [PropertyId; 15] = [
    PropertyId::ControlAfState,
    PropertyId::ControlAfMode,
    PropertyId::ControlAfRegions,
    PropertyId::ControlAfTrigger,
    PropertyId::LensFocusDistance,
    PropertyId::AfFrameControl,
    PropertyId::AfStatsControl,
    PropertyId::AfFrameInfo,
    PropertyId::AfPdFrameInfo,
    PropertyId::PdHwConfig,
    PropertyId::BasePdInternal,
    PropertyId::AfPeerInfo,
    PropertyId::AfBafDependencyMet,
    PropertyId::FovcFrameInfo,
    PropertyId::CrossAfStats,
];

/// Leading publish entries that may be reported as partial metadata.
pub const PARTIAL_METADATA_COUNT: usize = 4;

/// Ordered publish list returned to the pipeline at session setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishList {
    pub properties: Vec<PropertyId>,
    pub partial_count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct ResolvedVendorTags {
    af_frame_control: Option<VendorTagId>,
    focus_value: Option<VendorTagId>,
    fovc_frame_control: Option<VendorTagId>,
    af_lock: Option<VendorTagId>,
}

impl ResolvedVendorTags {
    fn resolve(registry: &dyn VendorTagRegistry) -> Self {
        let lookup = |name: VendorTagName| match registry.query_location(&name) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("[AF-IO] {}", e);
                None
            }
        };
        Self {
            af_frame_control: lookup(VENDOR_AF_FRAME_CONTROL),
            focus_value: lookup(VENDOR_FOCUS_VALUE),
            fovc_frame_control: lookup(VENDOR_FOVC_FRAME_CONTROL),
            af_lock: lookup(VENDOR_AF_LOCK),
        }
    }
}

/// Session-constant facts the adapter needs.
#[derive(Debug, Clone)]
pub struct AfIoSession {
    pub sensor: SensorInfo,
    pub camera: CameraInfo,
    pub capability: HardwareCapability,
    pub enablement: PdafEnablementConditions,
    pub stats_node_available: bool,
}

pub struct AfIoAdapter {
    store: Arc<dyn PropertyStore>,
    sensor: SensorInfo,
    camera: CameraInfo,
    capability: HardwareCapability,
    ratios: ScaleRatios,
    enablement: PdafEnablementConditions,
    stats_node_available: bool,
    tags: ResolvedVendorTags,

    reads: AHashMap<PropertyId, PropertyValue>,
    focus_modes: FocusModeTracker,
    focus_mode: AfFocusMode,
    input_roi: AfRoiInfo,

    frame_control: AfFrameControl,
    stats_control: AfStatsControl,
    frame_info: AfFrameInfo,
    hal_data: AfHalData,
    output_roi: WeightedRoi,
    pd_cache: PdResultCache,
}

impl AfIoAdapter {
    pub fn new(store: Arc<dyn PropertyStore>, vendor_tags: &dyn VendorTagRegistry, session: AfIoSession) -> Self {
        let ratios = ScaleRatios::new(session.sensor.resolution, session.sensor.active_array).unwrap_or_else(|| {
            warn!("[AF-IO] Sensor dimensions incomplete, using unit scale ratios");
            ScaleRatios::default()
        });

        Self {
            store,
            sensor: session.sensor,
            camera: session.camera,
            capability: session.capability,
            ratios,
            enablement: session.enablement,
            stats_node_available: session.stats_node_available,
            tags: ResolvedVendorTags::resolve(vendor_tags),
            reads: AHashMap::new(),
            focus_modes: FocusModeTracker::new(),
            focus_mode: AfFocusMode::Invalid,
            input_roi: AfRoiInfo::default(),
            frame_control: AfFrameControl::default(),
            stats_control: AfStatsControl::default(),
            frame_info: AfFrameInfo::default(),
            hal_data: AfHalData::default(),
            output_roi: WeightedRoi::default(),
            pd_cache: PdResultCache::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════

    pub fn sensor(&self) -> &SensorInfo {
        &self.sensor
    }

    pub fn camera(&self) -> &CameraInfo {
        &self.camera
    }

    pub fn hardware_capability(&self) -> &HardwareCapability {
        &self.capability
    }

    pub fn ratios(&self) -> ScaleRatios {
        self.ratios
    }

    pub fn enablement(&self) -> &PdafEnablementConditions {
        &self.enablement
    }

    pub fn enablement_mut(&mut self) -> &mut PdafEnablementConditions {
        &mut self.enablement
    }

    pub fn stats_node_available(&self) -> bool {
        self.stats_node_available
    }

    pub fn frame_control(&self) -> &AfFrameControl {
        &self.frame_control
    }

    pub fn stats_control(&self) -> &AfStatsControl {
        &self.stats_control
    }

    pub fn frame_info(&self) -> &AfFrameInfo {
        &self.frame_info
    }

    pub fn hal_data(&self) -> &AfHalData {
        &self.hal_data
    }

    pub fn pd_cache(&self) -> &PdResultCache {
        &self.pd_cache
    }

    pub fn focus_mode(&self) -> AfFocusMode {
        self.focus_mode
    }

    pub fn is_video_caf(&self) -> bool {
        self.focus_modes.is_video_caf()
    }

    // ═══════════════════════════════════════════════════════════
    // Request inputs
    // ═══════════════════════════════════════════════════════════

    /// Fetches every request input in one batch.
    pub fn refresh_reads(&mut self, request_id: u64) {
        let mut slots: Vec<PropertySlot> = AF_READ_PROPERTIES.to_vec();
        if let Some(lock) = self.tags.af_lock {
            slots.push(PropertySlot::current(PropertyId::VendorTag(lock)));
        }

        let values = self.store.read_batch(request_id, &slots);
        self.reads.clear();
        for (slot, value) in slots.iter().zip(values) {
            if let Some(value) = value {
                self.reads.insert(slot.id, value);
            }
        }
        trace!(
            "[AF-IO] Request {}: {} of {} inputs present",
            request_id,
            self.reads.len(),
            slots.len()
        );
    }

    fn input(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.reads.get(&id)
    }

    /// Algorithm focus mode for this request, scene overrides applied.
    pub fn read_focus_mode(&mut self) -> AfFocusMode {
        let hal_mode = self
            .input(PropertyId::InputControlAfMode)
            .and_then(|v| v.as_af_mode())
            .copied()
            .unwrap_or(ControlAfMode::Auto);
        let scene = self
            .input(PropertyId::InputControlSceneMode)
            .and_then(|v| v.as_scene_mode())
            .copied();
        self.focus_mode = self.focus_modes.from_hal(hal_mode, scene);
        self.focus_mode
    }

    pub fn read_run_mode(&self) -> AfRunMode {
        let intent = self
            .input(PropertyId::InputControlCaptureIntent)
            .and_then(|v| v.as_capture_intent())
            .copied();
        run_mode_from_capture_intent(intent)
    }

    pub fn read_trigger(&self) -> ControlAfTrigger {
        self.input(PropertyId::InputControlAfTrigger)
            .and_then(|v| v.as_af_trigger())
            .copied()
            .unwrap_or_default()
    }

    /// Manual focus distance in diopters.
    pub fn read_focus_distance(&self) -> f32 {
        self.input(PropertyId::InputLensFocusDistance)
            .and_then(|v| v.as_f32())
            .copied()
            .unwrap_or(0.0)
    }

    fn read_crop(&self) -> Option<CropWindow> {
        self.input(PropertyId::InputScalerCropRegion)
            .and_then(|v| v.as_crop())
            .copied()
    }

    /// HAL AF region in sensor-output space.
    pub fn read_focus_regions(&mut self) -> AfRoiInfo {
        let region = self
            .input(PropertyId::InputControlAfRegions)
            .and_then(|v| v.as_regions())
            .and_then(|regions| regions.first())
            .copied();
        let crop = self.read_crop().unwrap_or_default();
        self.input_roi =
            normalizer::retrieve_focus_region(region.as_ref(), &crop, self.sensor.active_array, self.ratios);
        self.input_roi
    }

    pub fn crop_window(&self) -> Rect {
        normalizer::crop_window_info(self.read_crop().as_ref(), self.ratios, self.sensor.active_array)
    }

    /// Stabilized and unstabilized face ROIs.
    pub fn read_faces(&self) -> AfResult<(RoiList, RoiList)> {
        let faces = self
            .input(PropertyId::FaceRoi)
            .and_then(|v| v.as_face_roi())
            .ok_or(AfError::OptionalDataAbsent("face roi"))?;
        Ok(normalizer::faces_to_sensor(faces, self.ratios))
    }

    pub fn read_tracker(&self, request_id: u64) -> AfResult<RoiList> {
        let tracker = self
            .input(PropertyId::TrackerRoi)
            .and_then(|v| v.as_tracker_roi())
            .ok_or(AfError::OptionalDataAbsent("tracker roi"))?;
        Ok(normalizer::tracker_to_sensor(tracker, request_id, self.ratios))
    }

    pub fn read_bg_stats(&self) -> AfResult<BgStats> {
        self.input(PropertyId::ParsedBgStats)
            .and_then(|v| v.as_bg_stats())
            .cloned()
            .ok_or(AfError::OptionalDataAbsent("bg stats"))
    }

    pub fn read_gyro(&self) -> AfResult<GyroData> {
        self.input(PropertyId::GyroData)
            .and_then(|v| v.as_gyro())
            .cloned()
            .ok_or(AfError::OptionalDataAbsent("gyro"))
    }

    pub fn read_gravity(&self) -> AfResult<GravityData> {
        self.input(PropertyId::GravityData)
            .and_then(|v| v.as_gravity())
            .copied()
            .ok_or(AfError::OptionalDataAbsent("gravity"))
    }

    /// TOF sample; an invalid sample counts as absent.
    pub fn read_tof(&self) -> AfResult<TofData> {
        self.input(PropertyId::TofData)
            .and_then(|v| v.as_tof())
            .copied()
            .filter(|tof| tof.is_valid)
            .ok_or(AfError::OptionalDataAbsent("tof"))
    }

    /// Previous-frame exposure summary.
    pub fn read_aec_info(&self) -> AfResult<AecInfo> {
        let frame = self
            .input(PropertyId::AecFrameInfo)
            .and_then(|v| v.as_aec_frame())
            .ok_or(AfError::OptionalDataAbsent("aec"))?;
        let duration = self
            .input(PropertyId::SensorFrameDuration)
            .and_then(|v| v.as_u64())
            .copied();
        Ok(normalizer::aec_info(frame, duration))
    }

    pub fn is_af_lock(&self) -> bool {
        self.tags
            .af_lock
            .and_then(|id| self.input(PropertyId::VendorTag(id)))
            .and_then(|v| v.as_bool())
            .copied()
            .unwrap_or(false)
    }

    /// Values of the algorithm's declared dependency tags that are present.
    pub fn read_vendor_tag_inputs(&self, request_id: u64, dependencies: &[VendorTagDependency]) -> Vec<VendorTagValue> {
        let slots: Vec<PropertySlot> = dependencies
            .iter()
            .map(|d| PropertySlot::new(PropertyId::VendorTag(d.id), d.applied_delay))
            .collect();
        dependencies
            .iter()
            .zip(self.store.read_batch(request_id, &slots))
            .filter_map(|(d, value)| value.map(|value| VendorTagValue { id: d.id, value }))
            .collect()
    }

    /// Early slot from the cache, end-of-frame slot from the previous frame.
    pub fn read_pdaf_inputs(&self, request_id: u64) -> PdafInputs {
        let normal = self
            .store
            .read_one(request_id, PropertySlot::new(PropertyId::AfPdFrameInfo, 1))
            .and_then(|v| v.as_pdaf().cloned())
            .unwrap_or_else(|| PdafData {
                trigger: PdTrigger::Normal,
                ..Default::default()
            });
        PdafInputs {
            early: self.pd_cache.get(PdTrigger::Early).clone(),
            normal,
        }
    }

    /// Peer camera focus info, only when sync is requested with a non-zero delta.
    pub fn peer_info(&self, request: &ProcessRequest) -> Option<PeerFocusInfo> {
        let sync = &request.peer_sync;
        if !sync.need_sync || sync.request_delta == 0 {
            return None;
        }
        // Negative when the peer runs ahead; the store reads forward then.
        let delta = sync.request_delta;
        let info = self
            .store
            .read_peer(sync.peer_pipeline_id, request.request_id, PropertyId::AfPeerInfo, delta)
            .and_then(|v| v.as_peer_info().copied());
        if info.is_none() {
            debug!(
                "[AF-IO] No peer info from pipeline {} at delta {}",
                sync.peer_pipeline_id, delta
            );
        }
        info
    }

    // ═══════════════════════════════════════════════════════════
    // Stats parsing
    // ═══════════════════════════════════════════════════════════

    pub fn parse_baf_stats(&self, request: &ProcessRequest) -> AfResult<BafStats> {
        let raw = request
            .buffers
            .baf
            .as_ref()
            .ok_or_else(|| AfError::InvalidInput(format!("BAF buffer for request {}", request.request_id)))?;
        normalizer::parse_baf_stats(raw, request.request_id, StartupMode::Valid)
    }

    fn max_primary_bottom(&self) -> u32 {
        normalizer::primary_region_bounds(&self.stats_control.baf_rois)
            .map(|r| r.bottom())
            .unwrap_or(0)
    }

    /// Runs the PD backend for the stage's trigger and publishes its result.
    pub fn parse_pd_stats(
        &mut self,
        request: &ProcessRequest,
        backend: &mut dyn PdBackend,
        startup_mode: StartupMode,
    ) -> AfResult<()> {
        let trigger = match request.stage {
            PipelineStage::BafStatsDependencyMet => PdTrigger::Early,
            PipelineStage::PdStatDependencyMet => PdTrigger::Normal,
            PipelineStage::AddDependencies => return Ok(()),
        };

        let buffers = &request.buffers;
        if buffers.pd_buffer(PdPort::DualPdHw).is_none() && buffers.pd_buffer(PdPort::RdiPdaf).is_none() {
            warn!("[AF-PD] Request {} has no PD buffer", request.request_id);
            return Err(AfError::InvalidInput(format!(
                "PD buffer for request {}",
                request.request_id
            )));
        }

        let frame_height = self.sensor.camif_height();
        let binning = self.sensor.is_binning_enabled;
        let written_lines = match trigger {
            PdTrigger::Early => normalizer::pd_early_lines(self.max_primary_bottom(), frame_height, binning),
            PdTrigger::Normal => normalizer::pd_normal_lines(frame_height, binning),
        };

        let aec = self.read_aec_info().unwrap_or_default();
        let inputs = PdLibInputs {
            request_id: request.request_id,
            trigger,
            written_lines,
            buffers: buffers.pd.clone(),
            current_fps: aec.current_fps,
            analog_gain: aec.current_gain,
            integration_time_ns: aec.exposure_time_ns,
            window_config: self.frame_control.pd_window,
            lens_position: self.frame_control.move_lens.target_lens_position,
            camera_info: self.camera.clone(),
            startup_mode,
        };

        debug!(
            "[AF-PD] Request {} {:?} pass over {} lines",
            request.request_id, trigger, written_lines
        );
        let outputs = backend.process(&inputs)?;
        self.publish_pd_lib_output(request.request_id, outputs.into_pdaf_data(trigger))
    }

    fn publish_pd_lib_output(&mut self, request_id: u64, data: PdafData) -> AfResult<()> {
        let mut entries = vec![(
            PropertyId::BasePdInternal,
            PropertyValue::Bool(data.trigger == PdTrigger::Early),
        )];
        if data.trigger == PdTrigger::Normal {
            entries.push((PropertyId::AfPdFrameInfo, PropertyValue::Pdaf(data.clone())));
        }
        self.pd_cache.store(data);
        self.store.write_batch(request_id, entries)
    }

    // ═══════════════════════════════════════════════════════════
    // Output population
    // ═══════════════════════════════════════════════════════════

    /// Folds get-param answers into the output structures.
    pub fn apply_get_param_outputs(&mut self, outputs: &[AfGetParamOutput]) {
        for output in outputs {
            match output {
                AfGetParamOutput::BafFloatingWindowConfig(config) => self.stats_control.baf_config = *config,
                AfGetParamOutput::BafRois(rois) => self.stats_control.baf_rois = rois.clone(),
                AfGetParamOutput::CurrentLensPosition(lens) => {
                    self.frame_control.move_lens = (*lens).into();
                    self.frame_info.move_lens = (*lens).into();
                }
                AfGetParamOutput::RoiDim(roi) => {
                    self.output_roi = *roi;
                    self.frame_info.roi = *roi;
                }
                AfGetParamOutput::PdafWindowConfig(window) => self.frame_control.pd_window = *window,
                AfGetParamOutput::Fovc(fovc) => {
                    self.frame_control.fovc = *fovc;
                    self.frame_info.fovc = *fovc;
                }
                AfGetParamOutput::DependentVendorTags(_)
                | AfGetParamOutput::VendorTagList(_)
                | AfGetParamOutput::PeerInfo(_) => {}
            }
        }
    }

    fn apply_process_outputs(&mut self, outputs: &AfOutputs) {
        if let Some(lens) = outputs.move_lens {
            self.frame_control.move_lens = lens.into();
            self.frame_info.move_lens = lens.into();
        }
        if let Some(enable) = outputs.exposure_compensation {
            self.frame_control.exposure_compensation_enable = enable;
        }
        if let Some(fovc) = outputs.fovc {
            self.frame_control.fovc = fovc;
            self.frame_info.fovc = fovc;
        }
        if let Some(window) = outputs.pdaf_window {
            self.frame_control.pd_window = window;
        }
        if let Some(config) = outputs.baf_config {
            self.stats_control.baf_config = config;
        }
        if let Some(rois) = &outputs.baf_rois {
            self.stats_control.baf_rois = rois.clone();
        }
        if let Some(status) = outputs.status {
            self.frame_info.focus_status = status;
        }
        if let Some(value) = outputs.focus_value {
            self.frame_info.focus_value = value;
        }
        if let Some(detected) = outputs.spot_light_detected {
            self.frame_info.spot_light_detected = detected;
        }
        if let Some(factor) = outputs.crop_magnification_factor {
            self.frame_info.crop_magnification_factor = factor;
        }
        if let Some(depth) = outputs.is_depth_focus {
            self.frame_info.is_depth_focus = depth;
        }
        if let Some(roi) = outputs.roi_dim {
            self.output_roi = roi;
        }
        self.frame_info.roi = self.output_roi;
    }

    /// Carries the request's focus region into the output ROI.
    pub fn copy_input_settings(&mut self) {
        self.output_roi = self.input_roi.roi;
        self.frame_info.roi = self.output_roi;
    }

    // ═══════════════════════════════════════════════════════════
    // Publishing
    // ═══════════════════════════════════════════════════════════

    /// Session-scope defaults written before the first request.
    pub fn publish_pre_request_output(
        &mut self,
        outputs: &[AfGetParamOutput],
        pd_hw_config: Option<PdHwConfig>,
    ) -> AfResult<()> {
        self.apply_get_param_outputs(outputs);

        let mut entries = vec![
            (
                PropertyId::UsecaseAfFrameControl,
                PropertyValue::FrameControl(self.frame_control.clone()),
            ),
            (
                PropertyId::UsecaseAfStatsControl,
                PropertyValue::StatsControl(self.stats_control.clone()),
            ),
            (
                PropertyId::UsecaseAfFrameInfo,
                PropertyValue::FrameInfo(self.frame_info.clone()),
            ),
        ];
        if let Some(config) = pd_hw_config {
            entries.push((PropertyId::UsecasePdHwConfig, PropertyValue::PdHw(config)));
        }
        debug!("[AF-IO] Publishing {} usecase defaults", entries.len());
        self.store.write_batch(0, entries)
    }

    /// Primary per-request publish.
    ///
    /// When PD HW is enabled, `pd_hw_config` is checked against the
    /// enablement latch first. A violation is returned after the remaining
    /// outputs have been written.
    pub fn publish_output(
        &mut self,
        request_id: u64,
        outputs: &AfOutputs,
        hal: &HalOutput,
        pd_hw_config: Option<PdHwConfig>,
    ) -> AfResult<()> {
        self.apply_process_outputs(outputs);

        self.hal_data = AfHalData {
            af_state: hal.af_state,
            af_mode: hal.af_mode,
            region: normalizer::inverse_scale_roi(&self.output_roi, self.ratios),
            lens_focus_distance: hal.lens_focus_distance,
            trigger: self.read_trigger(),
        };

        let mut entries = vec![(
            PropertyId::AfFrameControl,
            PropertyValue::FrameControl(self.frame_control.clone()),
        )];
        if let Some(tag) = self.tags.af_frame_control {
            entries.push((
                PropertyId::VendorTag(tag),
                PropertyValue::FrameControl(self.frame_control.clone()),
            ));
        }
        entries.push((
            PropertyId::AfStatsControl,
            PropertyValue::StatsControl(self.stats_control.clone()),
        ));
        entries.push((PropertyId::AfFrameInfo, PropertyValue::FrameInfo(self.frame_info.clone())));

        entries.push((PropertyId::ControlAfState, PropertyValue::AfState(self.hal_data.af_state)));
        if let Some(mode) = self.hal_data.af_mode {
            entries.push((PropertyId::ControlAfMode, PropertyValue::AfMode(mode)));
        }
        entries.push((PropertyId::ControlAfRegions, PropertyValue::Region(self.hal_data.region)));
        entries.push((PropertyId::ControlAfTrigger, PropertyValue::AfTrigger(self.hal_data.trigger)));
        entries.push((
            PropertyId::LensFocusDistance,
            PropertyValue::F32(self.hal_data.lens_focus_distance),
        ));
        if let Some(tag) = self.tags.focus_value {
            entries.push((PropertyId::VendorTag(tag), PropertyValue::F32(hal.focus_value)));
        }

        for tag in &outputs.vendor_tags {
            entries.push((PropertyId::VendorTag(tag.id), tag.value.clone()));
        }

        let mut violation = None;
        if self.enablement.is_pd_hw_enabled() {
            match pd_hw_config {
                Some(config) => match self.enablement.check_pd_hw_config(&config) {
                    Ok(()) => entries.push((PropertyId::PdHwConfig, PropertyValue::PdHw(config))),
                    Err(e) => violation = Some(e),
                },
                None => warn!("[AF-PD] PD HW enabled but no HW config for request {}", request_id),
            }
        }

        if let Some(size) = outputs.debug_data {
            trace!("[AF-IO] Request {} produced {} bytes of debug data", request_id, size);
        }

        self.store.write_batch(request_id, entries)?;
        match violation {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Republishes the previous request's outputs for a skipped frame.
    pub fn publish_skipped_frame_output(&mut self, request_id: u64) -> AfResult<()> {
        let slots: Vec<PropertySlot> = SKIPPED_FRAME_PROPERTIES
            .iter()
            .map(|id| PropertySlot::new(*id, 1))
            .collect();
        let values = self.store.read_batch(request_id, &slots);

        let mut entries = Vec::with_capacity(SKIPPED_FRAME_PROPERTIES.len());
        for (index, (id, value)) in SKIPPED_FRAME_PROPERTIES.iter().zip(values).enumerate() {
            match value {
                Some(value) => {
                    if index < 3 || self.enablement.is_pdaf_enabled() {
                        entries.push((*id, value));
                    }
                }
                None if index < 3 => {
                    warn!("[AF-IO] Skipped request {} has no previous {}", request_id, id);
                    return Err(AfError::InvalidState(format!(
                        "previous {} missing for skipped request {}",
                        id, request_id
                    )));
                }
                None => {}
            }
        }
        self.store.write_batch(request_id, entries)
    }

    pub fn publish_fovc(&self, request_id: u64) -> AfResult<()> {
        let mut entries = vec![(PropertyId::FovcFrameInfo, PropertyValue::Fovc(self.frame_info.fovc))];
        if let Some(tag) = self.tags.fovc_frame_control {
            entries.push((PropertyId::VendorTag(tag), PropertyValue::Fovc(self.frame_control.fovc)));
        }
        self.store.write_batch(request_id, entries)
    }

    pub fn publish_cross_property(&self, request_id: u64) -> AfResult<()> {
        self.store
            .write_batch(request_id, vec![(PropertyId::CrossAfStats, PropertyValue::U64(request_id))])
    }

    pub fn publish_baf_dependency_met(&self, request_id: u64) -> AfResult<()> {
        self.store.write_batch(
            request_id,
            vec![(PropertyId::AfBafDependencyMet, PropertyValue::U64(request_id))],
        )
    }

    pub fn is_baf_dependency_met(&self, request_id: u64) -> bool {
        self.store
            .read_one(request_id, PropertySlot::current(PropertyId::AfBafDependencyMet))
            .is_some()
    }

    pub fn publish_peer_focus_info(&self, request_id: u64, info: PeerFocusInfo) -> AfResult<()> {
        self.store
            .write_batch(request_id, vec![(PropertyId::AfPeerInfo, PropertyValue::PeerInfo(info))])
    }

    /// Everything the node may publish, fixed properties first.
    pub fn publish_list(&self, algorithm_tags: &[VendorTagId], capacity: usize) -> AfResult<PublishList> {
        let mut builder = DependencyListBuilder::new(capacity);
        let vendor = [
            self.tags.af_frame_control,
            self.tags.focus_value,
            self.tags.fovc_frame_control,
        ];
        let ids = FIXED_PUBLISH_PROPERTIES
            .iter()
            .copied()
            .chain(vendor.into_iter().flatten().map(PropertyId::VendorTag))
            .chain(algorithm_tags.iter().copied().map(PropertyId::VendorTag));
        for id in ids {
            builder.push(PropertySlot::current(id))?;
        }
        Ok(PublishList {
            properties: builder.build().into_iter().map(|slot| slot.id).collect(),
            partial_count: PARTIAL_METADATA_COUNT,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPropertyStore;
    use crate::vendor_tags::StaticVendorTagRegistry;

    fn adapter(store: &InMemoryPropertyStore) -> AfIoAdapter {
        let sensor = SensorInfo {
            resolution: Dimension {
                width: 4000,
                height: 3000,
            },
            active_array: Dimension {
                width: 4000,
                height: 3000,
            },
            ..Default::default()
        };
        AfIoAdapter::new(
            Arc::new(store.clone()),
            &StaticVendorTagRegistry::default(),
            AfIoSession {
                sensor,
                camera: CameraInfo::default(),
                capability: HardwareCapability::default(),
                enablement: PdafEnablementConditions::new(),
                stats_node_available: true,
            },
        )
    }

    #[test]
    fn test_skipped_frame_requires_previous_outputs() {
        let store = InMemoryPropertyStore::new(0);
        let mut io = adapter(&store);
        let err = io.publish_skipped_frame_output(7).unwrap_err();
        assert!(matches!(err, AfError::InvalidState(_)));
        assert!(store.snapshot(7).is_empty());
    }

    #[test]
    fn test_skipped_frame_republishes_previous() {
        let store = InMemoryPropertyStore::new(0);
        store.insert(6, PropertyId::AfFrameControl, AfFrameControl::default());
        store.insert(6, PropertyId::AfFrameInfo, AfFrameInfo::default());
        store.insert(6, PropertyId::AfStatsControl, AfStatsControl::default());
        store.insert(6, PropertyId::PdHwConfig, PdHwConfig::default());

        let mut io = adapter(&store);
        io.publish_skipped_frame_output(7).unwrap();

        assert!(store.get(7, PropertyId::AfFrameControl).is_some());
        assert!(store.get(7, PropertyId::AfStatsControl).is_some());
        // PDAF is off for this session, so PD outputs are not carried over.
        assert!(store.get(7, PropertyId::PdHwConfig).is_none());
    }

    #[test]
    fn test_missing_focus_mode_defaults_to_auto() {
        let store = InMemoryPropertyStore::new(0);
        let mut io = adapter(&store);
        io.refresh_reads(1);
        assert_eq!(io.read_focus_mode(), AfFocusMode::Auto);

        store.insert(2, PropertyId::InputControlAfMode, ControlAfMode::ContinuousVideo);
        io.refresh_reads(2);
        assert_eq!(io.read_focus_mode(), AfFocusMode::ContinuousVideo);
        assert!(io.is_video_caf());
    }

    #[test]
    fn test_af_lock_vendor_tag() {
        let store = InMemoryPropertyStore::new(0);
        let lock = StaticVendorTagRegistry::default()
            .query_location(&VENDOR_AF_LOCK)
            .unwrap();
        store.insert(3, PropertyId::VendorTag(lock), true);

        let mut io = adapter(&store);
        io.refresh_reads(3);
        assert!(io.is_af_lock());
        io.refresh_reads(4);
        assert!(!io.is_af_lock());
    }

    #[test]
    fn test_publish_list_order_and_capacity() {
        let store = InMemoryPropertyStore::new(0);
        let io = adapter(&store);

        let list = io.publish_list(&[VendorTagId(0x9000_0000)], 32).unwrap();
        assert_eq!(list.properties.len(), FIXED_PUBLISH_PROPERTIES.len() + 4);
        assert_eq!(&list.properties[..FIXED_PUBLISH_PROPERTIES.len()], &FIXED_PUBLISH_PROPERTIES[..]);
        assert_eq!(
            list.properties.last(),
            Some(&PropertyId::VendorTag(VendorTagId(0x9000_0000)))
        );
        assert_eq!(list.partial_count, PARTIAL_METADATA_COUNT);

        let err = io
            .publish_list(&[VendorTagId(0x9000_0000)], FIXED_PUBLISH_PROPERTIES.len() + 3)
            .unwrap_err();
        assert!(matches!(err, AfError::DependencyOverflow { .. }));
    }

    #[test]
    fn test_publish_output_writes_hal_fields() {
        let store = InMemoryPropertyStore::new(0);
        let mut io = adapter(&store);
        io.refresh_reads(5);
        io.read_focus_mode();

        let outputs = AfOutputs {
            move_lens: Some(LensMove::Logical(120)),
            ..Default::default()
        };
        let hal = HalOutput {
            af_state: ControlAfState::PassiveFocused,
            af_mode: Some(ControlAfMode::Auto),
            lens_focus_distance: 2.5,
            focus_value: 10.0,
        };
        io.publish_output(5, &outputs, &hal, None).unwrap();

        assert_eq!(
            store.get(5, PropertyId::ControlAfState),
            Some(PropertyValue::AfState(ControlAfState::PassiveFocused))
        );
        assert_eq!(
            store.get(5, PropertyId::LensFocusDistance),
            Some(PropertyValue::F32(2.5))
        );
        assert_eq!(store.write_count(5, PropertyId::AfFrameControl), 1);
        assert_eq!(io.frame_control().move_lens.target_lens_position, 120);
    }

    fn peer_request(request_id: u64, need_sync: bool, request_delta: i64) -> ProcessRequest {
        ProcessRequest::new(request_id, PipelineStage::BafStatsDependencyMet).with_peer_sync(PeerSyncInfo {
            need_sync,
            request_delta,
            peer_pipeline_id: 1,
            is_multi_request: true,
        })
    }

    fn seed_peer(store: &InMemoryPropertyStore, request_id: u64, lens_position: i32) {
        store.view(1).insert(
            request_id,
            PropertyId::AfPeerInfo,
            PeerFocusInfo {
                request_id,
                lens_position,
                ..Default::default()
            },
        );
    }

    #[test]
    fn test_peer_info_requires_sync_and_delta() {
        let store = InMemoryPropertyStore::new(0);
        seed_peer(&store, 4, 7);
        seed_peer(&store, 5, 8);
        let io = adapter(&store);

        assert!(io.peer_info(&peer_request(5, false, 1)).is_none());
        assert!(io.peer_info(&peer_request(5, true, 0)).is_none());
    }

    #[test]
    fn test_peer_info_follows_delta_sign() {
        let store = InMemoryPropertyStore::new(0);
        seed_peer(&store, 3, 7);
        seed_peer(&store, 5, 9);
        let io = adapter(&store);

        // Peer behind: read backwards.
        let behind = io.peer_info(&peer_request(4, true, 1)).map(|p| p.lens_position);
        assert_eq!(behind, Some(7));

        // Peer ahead: read forwards.
        let ahead = io.peer_info(&peer_request(4, true, -1)).map(|p| p.lens_position);
        assert_eq!(ahead, Some(9));
    }
}
