// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # afstats-structures
//!
//! Shared data model of the autofocus statistics pipeline.
//!
//! Everything that crosses a component boundary lives here: the error
//! taxonomy, rectangle and region geometry, property-store identifiers,
//! HAL and algorithm enums, and the typed payloads the pipeline reads
//! from and publishes to the request-indexed property store.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod focus;
pub mod geometry;
pub mod payloads;
pub mod property;
pub mod value;

pub use error::{AfError, AfResult};
pub use focus::*;
pub use geometry::*;
pub use payloads::*;
pub use property::*;
pub use value::PropertyValue;
