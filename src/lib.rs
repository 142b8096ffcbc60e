// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # afstats - Autofocus Statistics Orchestration
//!
//! Per-request processing for the autofocus stats node of a camera
//! pipeline: hardware enablement, stats normalization, algorithm and PD
//! library sequencing, property publication and HAL result generation.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! afstats = "0.1"  # Default: includes observability
//! ```
//!
//! ## Feature Flags
//!
//! - **`observability`** (default): `tracing-subscriber` setup and
//!   per-crate debug flags
//!
//! ## Usage
//!
//! ```rust,ignore
//! use afstats::prelude::*;
//! use std::sync::Arc;
//!
//! let config = afstats::config::load_config(None, None)?;
//! let mut registry = AlgorithmRegistry::new();
//! registry.register_af("vendor-af", |params| create_vendor_af(params));
//!
//! let mut processor = AfStatsProcessor::initialize(
//!     AfInitData::new(config),
//!     AfCollaborators {
//!         store: Arc::new(InMemoryPropertyStore::new(0)),
//!         vendor_tags: Arc::new(StaticVendorTagRegistry::default()),
//!         state_machine: Box::new(MyStateMachine::default()),
//!     },
//!     &registry,
//! )?;
//!
//! let path = processor.execute_process_request(&request)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: afstats-structures, afstats-config         │
//! │  (Properties, payloads, errors, static settings)        │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Processing: afstats-pipeline                           │
//! │  (Orchestrator, I/O adapter, PD enablement, HAL output) │
//! └─────────────────────────────────────────────────────────┘
//!                         ↑
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: afstats-observability                  │
//! │  (Logging, debug flags)                                 │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export foundation
pub use afstats_config as config;
pub use afstats_structures as structures;

// Re-export processing
pub use afstats_pipeline as pipeline;

// Re-export infrastructure
#[cfg(feature = "observability")]
pub use afstats_observability as observability;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::AfStatsConfig;
    pub use crate::structures::*;

    pub use crate::pipeline::{
        AfAlgorithm, AfCollaborators, AfInitData, AfStateMachine, AfStatsProcessor, AlgorithmRegistry,
        ExecutionPath, InMemoryPropertyStore, PdBackend, ProcessRequest, PropertyStore,
        StaticVendorTagRegistry, VendorTagRegistry,
    };

    #[cfg(feature = "observability")]
    pub use crate::observability::try_init_logging;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_facade_imports() {
        assert!(!super::VERSION.is_empty());

        let config = AfStatsConfig::default();
        let init = AfInitData::new(config);
        assert!(init.sensor.is_none());

        let registry = AlgorithmRegistry::new();
        drop(registry);

        let request = ProcessRequest::skipped(3);
        assert_eq!(request.request_id, 3);
    }
}
