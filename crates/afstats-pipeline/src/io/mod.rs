// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Property-store I/O and HAL enum mapping.

pub mod adapter;
pub mod mapping;

pub use adapter::{AfIoAdapter, AfIoSession, PublishList, FIXED_PUBLISH_PROPERTIES, PARTIAL_METADATA_COUNT};
pub use mapping::FocusModeTracker;
