// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Vendor-tag location lookup.

use afstats_structures::{
    AfError, AfResult, VendorTagId, VendorTagName, VENDOR_AF_FRAME_CONTROL, VENDOR_AF_LOCK,
    VENDOR_FOCUS_VALUE, VENDOR_FOVC_FRAME_CONTROL,
};
use ahash::AHashMap;

/// Resolves (section, name) pairs to tag ids.
pub trait VendorTagRegistry: Send + Sync {
    fn query_location(&self, name: &VendorTagName) -> AfResult<VendorTagId>;
}

const FIRST_VENDOR_TAG: u32 = 0x8000_0000;

/// Fixed table of vendor tags, assigned sequential ids on registration.
#[derive(Debug, Clone)]
pub struct StaticVendorTagRegistry {
    tags: AHashMap<VendorTagName, VendorTagId>,
    next_id: u32,
}

impl StaticVendorTagRegistry {
    pub fn new() -> Self {
        Self {
            tags: AHashMap::new(),
            next_id: FIRST_VENDOR_TAG,
        }
    }

    /// Registry pre-populated with the tags the AF node publishes or reads.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for name in [
            VENDOR_AF_FRAME_CONTROL,
            VENDOR_FOCUS_VALUE,
            VENDOR_FOVC_FRAME_CONTROL,
            VENDOR_AF_LOCK,
        ] {
            registry.register(name);
        }
        registry
    }

    /// Registers `name`, returning the existing id if already known.
    pub fn register(&mut self, name: VendorTagName) -> VendorTagId {
        if let Some(id) = self.tags.get(&name) {
            return *id;
        }
        let id = VendorTagId(self.next_id);
        self.next_id += 1;
        self.tags.insert(name, id);
        id
    }
}

impl Default for StaticVendorTagRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl VendorTagRegistry for StaticVendorTagRegistry {
    fn query_location(&self, name: &VendorTagName) -> AfResult<VendorTagId> {
        self.tags
            .get(name)
            .copied()
            .ok_or_else(|| AfError::ResourceUnavailable(format!("vendor tag {}/{}", name.section, name.name)))
    }
}
