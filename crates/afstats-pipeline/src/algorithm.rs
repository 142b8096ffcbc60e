// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Collaborator interfaces for the AF algorithm and the PD backend.
//!
//! Parameter, query, input and output entries are ordered collections of
//! tagged variants. Presence of an optional output is expressed with
//! `Option`, so there are no size fields to zero between calls; callers
//! still [`AfOutputs::reset`] before each `process`.

use crate::request::TuningModeData;
use crate::settings::AfSettings;
use afstats_structures::*;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Errors reported by algorithm and PD plugins.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlgoError {
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Algorithm failed: {0}")]
    Failed(String),
}

pub type AlgoResult<T> = Result<T, AlgoError>;

impl From<AlgoError> for AfError {
    fn from(err: AlgoError) -> Self {
        AfError::AlgorithmFailure(err.to_string())
    }
}

// ═══════════════════════════════════════════════════════════
// Algorithm-facing region structures
// ═══════════════════════════════════════════════════════════

/// HAL AF region converted into sensor-output space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AfRoiInfo {
    pub roi_type: FocusRegionType,
    pub count: u32,
    pub roi: WeightedRoi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdentifiedRoi {
    pub id: u32,
    pub roi: WeightedRoi,
}

/// Face or tracker rectangles in sensor-output space.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoiList {
    pub request_id: u64,
    pub rois: Vec<IdentifiedRoi>,
}

impl RoiList {
    pub fn count(&self) -> usize {
        self.rois.len()
    }
}

/// Early and end-of-frame PD results handed to the algorithm together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PdafInputs {
    pub early: PdafData,
    pub normal: PdafData,
}

/// One entry of the algorithm's vendor-tag dependency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorTagDependency {
    pub id: VendorTagId,
    /// Frames between the producer writing the tag and the AF node reading it.
    pub applied_delay: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorTagValue {
    pub id: VendorTagId,
    pub value: PropertyValue,
}

/// Lens calibration read from the module OTP.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AfCalibrationData {
    pub macro_dac: i32,
    pub infinity_dac: i32,
    pub start_current: i32,
    pub rated_current: i32,
}

// ═══════════════════════════════════════════════════════════
// Set-param, get-param, process entries
// ═══════════════════════════════════════════════════════════

macro_rules! set_params {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// One parameter pushed with [`AfAlgorithm::set_params`].
        #[derive(Debug, Clone, PartialEq)]
        pub enum AfSetParam {
            $($variant($ty)),*
        }

        /// Payload-free tag of an [`AfSetParam`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum AfSetParamKind {
            $($variant),*
        }

        impl AfSetParam {
            pub fn kind(&self) -> AfSetParamKind {
                match self {
                    $(AfSetParam::$variant(_) => AfSetParamKind::$variant),*
                }
            }
        }
    };
}

set_params! {
    TuningData(TuningModeData),
    Settings(AfSettings),
    SensorInfo(SensorInfo),
    HardwareCapability(HardwareCapability),
    FocusMode(AfFocusMode),
    ManualLensMove(f32),
    Roi(AfRoiInfo),
    FaceRoi(RoiList),
    UnstabilizedFaceRoi(RoiList),
    TrackerRoi(RoiList),
    BgStats(BgStats),
    Gyro(GyroData),
    Gravity(GravityData),
    RunMode(AfRunMode),
    ControlCommand(AfControlCommand),
    Tof(TofData),
    AecInfo(AecInfo),
    PdafData(PdafInputs),
    PeerInfo(Option<PeerFocusInfo>),
    CameraInfo(CameraInfo),
    CropWindow(Rect),
    BpsCamera(bool),
}

impl fmt::Display for AfSetParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Queries accepted by [`AfAlgorithm::get_params`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AfGetParamKind {
    BafFloatingWindowConfig,
    BafFloatingWindowRoiConfig,
    CurrentLensPosition,
    RoiDim,
    PdafWindowConfig,
    FovcInfo,
    DependentVendorTags,
    VendorTagList,
    InfoForPeer,
}

/// Answers from [`AfAlgorithm::get_params`]; queries the algorithm cannot
/// answer are simply absent.
#[derive(Debug, Clone, PartialEq)]
pub enum AfGetParamOutput {
    BafFloatingWindowConfig(BafFloatingWindowConfig),
    BafRois(Vec<BafRoi>),
    CurrentLensPosition(LensMove),
    RoiDim(WeightedRoi),
    PdafWindowConfig(PdWindowConfig),
    Fovc(FovcOutput),
    DependentVendorTags(Vec<VendorTagDependency>),
    VendorTagList(Vec<VendorTagId>),
    PeerInfo(PeerFocusInfo),
}

/// Inputs handed to [`AfAlgorithm::process`].
#[derive(Debug, Clone, PartialEq)]
pub enum AfInput {
    BafStats(BafStats),
    BgStats(BgStats),
    VendorTags(Vec<VendorTagValue>),
    RequestId(u64),
    /// Debug buffer size in bytes; zero disables debug output.
    DebugData(usize),
    CameraInfo(CameraInfo),
}

/// Raw algorithm output for one `process` call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AfOutputs {
    pub status: Option<FocusStatus>,
    pub move_lens: Option<LensMove>,
    pub focus_mode: Option<AfFocusMode>,
    pub focus_value: Option<f32>,
    pub roi_dim: Option<WeightedRoi>,
    pub baf_config: Option<BafFloatingWindowConfig>,
    pub baf_rois: Option<Vec<BafRoi>>,
    pub exposure_compensation: Option<bool>,
    pub fovc: Option<FovcOutput>,
    pub pdaf_window: Option<PdWindowConfig>,
    pub spot_light_detected: Option<bool>,
    pub crop_magnification_factor: Option<f32>,
    pub is_depth_focus: Option<bool>,
    /// Bytes of debug data written into the single debug slot.
    pub debug_data: Option<usize>,
    pub vendor_tags: Vec<VendorTagValue>,
}

impl AfOutputs {
    /// Clears every output so nothing carries over into the next call.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AfCreateParams {
    pub tuning: TuningModeData,
    pub settings: AfSettings,
    pub camera_info: CameraInfo,
    pub calibration: AfCalibrationData,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AfDestroyParams {
    pub camera_id: u32,
    pub camera_close_indicator: u32,
}

/// Autofocus algorithm plugin.
pub trait AfAlgorithm: Send {
    fn set_params(&mut self, params: &[AfSetParam]) -> AlgoResult<()>;

    fn get_params(&mut self, queries: &[AfGetParamKind]) -> AlgoResult<Vec<AfGetParamOutput>>;

    fn process(&mut self, inputs: &[AfInput], outputs: &mut AfOutputs) -> AlgoResult<()>;

    fn destroy(&mut self, params: &AfDestroyParams);
}

// ═══════════════════════════════════════════════════════════
// PD backend
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct PdLibInputs {
    pub request_id: u64,
    pub trigger: PdTrigger,
    /// Sensor lines already readable for this trigger.
    pub written_lines: u32,
    pub buffers: Vec<(PdPort, Arc<[u8]>)>,
    pub current_fps: f32,
    pub analog_gain: f32,
    pub integration_time_ns: u64,
    pub window_config: PdWindowConfig,
    pub lens_position: i32,
    pub camera_info: CameraInfo,
    pub startup_mode: StartupMode,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdLibOutputs {
    pub defocus: PdDefocus,
    pub peripheral: PdDefocus,
    pub depth_map: PdDepthMap,
}

impl PdLibOutputs {
    /// Algorithm-facing form; only end-of-frame results keep the depth map.
    pub fn into_pdaf_data(self, trigger: PdTrigger) -> PdafData {
        PdafData {
            trigger,
            defocus: self.defocus,
            peripheral: self.peripheral,
            depth_map: match trigger {
                PdTrigger::Normal => Some(self.depth_map),
                PdTrigger::Early => None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdGetParam {
    HwConfig,
    LcrEnable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdGetParamOutput {
    HwConfig(PdHwConfig),
    LcrEnable(bool),
}

/// Phase-detection library.
pub trait PdBackend: Send {
    fn process(&mut self, inputs: &PdLibInputs) -> AlgoResult<PdLibOutputs>;

    fn get_param(&mut self, query: PdGetParam) -> AlgoResult<PdGetParamOutput>;
}

// ═══════════════════════════════════════════════════════════
// Factory
// ═══════════════════════════════════════════════════════════

pub type AfAlgorithmConstructor =
    Box<dyn Fn(&AfCreateParams) -> AlgoResult<Box<dyn AfAlgorithm>> + Send + Sync>;
pub type PdBackendConstructor = Box<dyn Fn(&SensorInfo) -> AlgoResult<Box<dyn PdBackend>> + Send + Sync>;

/// Name-keyed constructors for algorithm and PD implementations.
///
/// The configured library names select the entries, so swapping an
/// implementation never touches the orchestrator.
#[derive(Default)]
pub struct AlgorithmRegistry {
    af: AHashMap<String, AfAlgorithmConstructor>,
    pd: AHashMap<String, PdBackendConstructor>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_af<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&AfCreateParams) -> AlgoResult<Box<dyn AfAlgorithm>> + Send + Sync + 'static,
    {
        let name = name.into();
        info!("[AF-ORCH] Registered AF algorithm '{}'", name);
        self.af.insert(name, Box::new(constructor));
    }

    pub fn register_pd<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&SensorInfo) -> AlgoResult<Box<dyn PdBackend>> + Send + Sync + 'static,
    {
        let name = name.into();
        info!("[AF-PD] Registered PD backend '{}'", name);
        self.pd.insert(name, Box::new(constructor));
    }

    pub fn create_af(&self, name: &str, params: &AfCreateParams) -> AfResult<Box<dyn AfAlgorithm>> {
        let constructor = self
            .af
            .get(name)
            .ok_or_else(|| AfError::ResourceUnavailable(format!("AF algorithm '{}' not registered", name)))?;
        constructor(params).map_err(|e| {
            warn!("[AF-ORCH] AF algorithm '{}' failed to create: {}", name, e);
            AfError::ResourceUnavailable(format!("AF algorithm '{}': {}", name, e))
        })
    }

    pub fn create_pd(&self, name: &str, sensor: &SensorInfo) -> AfResult<Box<dyn PdBackend>> {
        let constructor = self
            .pd
            .get(name)
            .ok_or_else(|| AfError::ResourceUnavailable(format!("PD backend '{}' not registered", name)))?;
        constructor(sensor).map_err(|e| AfError::ResourceUnavailable(format!("PD backend '{}': {}", name, e)))
    }

    pub fn has_af(&self, name: &str) -> bool {
        self.af.contains_key(name)
    }
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut af: Vec<_> = self.af.keys().collect();
        let mut pd: Vec<_> = self.pd.keys().collect();
        af.sort();
        pd.sort();
        f.debug_struct("AlgorithmRegistry").field("af", &af).field("pd", &pd).finish()
    }
}

/// Pushes `params`, treating `NotImplemented` as success.
pub(crate) fn push_params(algorithm: &mut dyn AfAlgorithm, params: &[AfSetParam]) -> AfResult<()> {
    match algorithm.set_params(params) {
        Ok(()) | Err(AlgoError::NotImplemented(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert;

    impl AfAlgorithm for Inert {
        fn set_params(&mut self, params: &[AfSetParam]) -> AlgoResult<()> {
            if params.iter().any(|p| p.kind() == AfSetParamKind::Gyro) {
                return Err(AlgoError::NotImplemented("gyro".into()));
            }
            if params.iter().any(|p| p.kind() == AfSetParamKind::Tof) {
                return Err(AlgoError::Failed("tof".into()));
            }
            Ok(())
        }

        fn get_params(&mut self, _queries: &[AfGetParamKind]) -> AlgoResult<Vec<AfGetParamOutput>> {
            Ok(Vec::new())
        }

        fn process(&mut self, _inputs: &[AfInput], _outputs: &mut AfOutputs) -> AlgoResult<()> {
            Ok(())
        }

        fn destroy(&mut self, _params: &AfDestroyParams) {}
    }

    #[test]
    fn test_not_implemented_counts_as_success() {
        let mut algo = Inert;
        assert!(push_params(&mut algo, &[AfSetParam::Gyro(GyroData::default())]).is_ok());
        let err = push_params(&mut algo, &[AfSetParam::Tof(TofData::default())]).unwrap_err();
        assert!(matches!(err, AfError::AlgorithmFailure(_)));
    }

    #[test]
    fn test_outputs_reset_clears_everything() {
        let mut outputs = AfOutputs {
            focus_value: Some(3.0),
            debug_data: Some(128),
            vendor_tags: vec![VendorTagValue {
                id: VendorTagId(1),
                value: PropertyValue::Bool(true),
            }],
            ..Default::default()
        };
        outputs.reset();
        assert_eq!(outputs, AfOutputs::default());
    }

    #[test]
    fn test_registry_unknown_name_is_resource_unavailable() {
        let mut registry = AlgorithmRegistry::new();
        registry.register_af("inert", |_| Ok(Box::new(Inert) as Box<dyn AfAlgorithm>));
        assert!(registry.has_af("inert"));
        assert!(registry.create_af("inert", &AfCreateParams::default()).is_ok());
        assert!(matches!(
            registry.create_af("missing", &AfCreateParams::default()),
            Err(AfError::ResourceUnavailable(_))
        ));
    }

    #[test]
    fn test_set_param_kind() {
        let param = AfSetParam::BpsCamera(false);
        assert_eq!(param.kind(), AfSetParamKind::BpsCamera);
        assert_eq!(param.kind().to_string(), "BpsCamera");
    }
}
