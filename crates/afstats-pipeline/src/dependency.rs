// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Dependency resolution.
//!
//! The node never blocks. The caller asks for unmet dependencies, waits for
//! them to be published, and re-invokes; an empty set means the request
//! is ready.

use crate::algorithm::VendorTagDependency;
use crate::request::ProcessRequest;
use crate::store::PropertyStore;
use afstats_structures::*;
use tracing::{debug, warn};

/// Ordered, bounded list of property slots.
#[derive(Debug, Clone)]
pub struct DependencyListBuilder {
    capacity: usize,
    slots: Vec<PropertySlot>,
}

impl DependencyListBuilder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Appends `slot`, failing instead of truncating past capacity.
    pub fn push(&mut self, slot: PropertySlot) -> AfResult<()> {
        if self.slots.len() >= self.capacity {
            warn!(
                "[AF-DEPS] Dependency list full ({}), cannot add {}",
                self.capacity, slot.id
            );
            return Err(AfError::DependencyOverflow {
                what: slot.id.to_string(),
                capacity: self.capacity,
            });
        }
        self.slots.push(slot);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn build(self) -> Vec<PropertySlot> {
        self.slots
    }
}

/// Session facts that decide the skip-path dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkipDependencyContext {
    pub pdaf_enabled: bool,
    pub sensor_type: PdSensorType,
    pub role: CameraRole,
}

impl SkipDependencyContext {
    /// Type-1 sensors cannot guarantee PD interrupt ordering, so skipped
    /// frames wait for the previous PD output explicitly.
    fn needs_pd_sequencing(&self) -> bool {
        self.pdaf_enabled && self.sensor_type == PdSensorType::Type1 && self.role != CameraRole::Slave
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver {
    capacity: usize,
}

impl DependencyResolver {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Every slot this request depends on.
    pub fn declared(
        &self,
        request: &ProcessRequest,
        context: &SkipDependencyContext,
        vendor_dependencies: &[VendorTagDependency],
    ) -> AfResult<Vec<PropertySlot>> {
        let mut builder = DependencyListBuilder::new(self.capacity);

        if request.skip_processing {
            builder.push(PropertySlot::new(PropertyId::AfFrameControl, 1))?;
            builder.push(PropertySlot::new(PropertyId::AfStatsControl, 1))?;
            if context.needs_pd_sequencing() {
                builder.push(PropertySlot::new(PropertyId::AfPdFrameInfo, 1))?;
            }
        } else {
            for dependency in vendor_dependencies {
                builder.push(PropertySlot::new(
                    PropertyId::VendorTag(dependency.id),
                    dependency.applied_delay,
                ))?;
            }
        }

        Ok(builder.build())
    }

    /// The subset of `declared` not yet present in the store.
    ///
    /// Slots that resolve before request zero can never be produced and are
    /// treated as met.
    pub fn unmet(&self, store: &dyn PropertyStore, request_id: u64, declared: &[PropertySlot]) -> Vec<PropertySlot> {
        let values = store.read_batch(request_id, declared);
        let unmet: Vec<PropertySlot> = declared
            .iter()
            .zip(values)
            .filter(|(slot, value)| value.is_none() && slot.resolve(request_id).is_some())
            .map(|(slot, _)| *slot)
            .collect();

        if !unmet.is_empty() {
            debug!(
                "[AF-DEPS] Request {} waiting on {} of {} dependencies",
                request_id,
                unmet.len(),
                declared.len()
            );
        }
        unmet
    }
}
