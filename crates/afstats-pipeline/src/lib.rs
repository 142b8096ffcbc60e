// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # afstats-pipeline
//!
//! Per-request orchestration of the autofocus statistics node.
//!
//! ## Architecture
//!
//! ```text
//! ProcessRequest
//!      │
//!      ▼
//! AfStatsProcessor ──► DependencyResolver ──► PropertyStore (unmet slots)
//!      │
//!      ├──► AfIoAdapter ──► normalizer (ROI / stats conversion)
//!      │        │
//!      │        └──► PropertyStore (reads, publishes)
//!      │
//!      ├──► AfAlgorithm (set_params → process → get_params)
//!      ├──► PdBackend (early / normal PD passes)
//!      └──► AfStateMachine (HAL AF state)
//! ```
//!
//! Hardware enablement (PDAF, dual/sparse PD, LCR) is decided once per
//! session by [`enablement::PdafEnablementConditions`] and latched against
//! the PD library's report.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod algorithm;
pub mod dependency;
pub mod enablement;
pub mod hal_output;
pub mod io;
pub mod normalizer;
pub mod orchestrator;
pub mod pd_cache;
pub mod request;
pub mod settings;
pub mod store;
pub mod vendor_tags;

pub use algorithm::{
    AfAlgorithm, AfCreateParams, AfDestroyParams, AfGetParamKind, AfGetParamOutput, AfInput, AfOutputs,
    AfSetParam, AfSetParamKind, AlgoError, AlgoResult, AlgorithmRegistry, PdBackend, PdGetParam,
    PdGetParamOutput, PdLibInputs, PdLibOutputs,
};
pub use dependency::{DependencyListBuilder, DependencyResolver, SkipDependencyContext};
pub use enablement::{HardwareEnablementState, PdafEnablementConditions, PdafSessionInfo};
pub use hal_output::{AfStateMachine, HalOutput, HalOutputContext};
pub use io::{AfIoAdapter, AfIoSession, PublishList};
pub use orchestrator::{AfCollaborators, AfInitData, AfStatsProcessor, ExecutionPath};
pub use request::{ProcessRequest, StatsBuffers, TuningModeData, TuningSelector};
pub use settings::AfSettings;
pub use store::{InMemoryPropertyStore, PropertyStore};
pub use vendor_tags::{StaticVendorTagRegistry, VendorTagRegistry};
