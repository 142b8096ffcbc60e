// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Two-slot PD result cache keyed by trigger.
//!
//! `Early` holds the current request's partial early-interrupt read and
//! `Normal` the previous request's end-of-frame read. Slots are overwritten
//! independently. Nothing guards against reading a slot written for a
//! different request; callers rely on early-before-normal ordering.

use afstats_structures::{PdTrigger, PdafData};

#[derive(Debug, Clone, PartialEq)]
pub struct PdResultCache {
    slots: [PdafData; 2],
}

impl PdResultCache {
    pub fn new() -> Self {
        let mut cache = Self {
            slots: [PdafData::default(), PdafData::default()],
        };
        cache.reset();
        cache
    }

    /// Stores `data` in the slot of its own trigger.
    pub fn store(&mut self, data: PdafData) {
        let index = data.trigger.index();
        self.slots[index] = data;
    }

    pub fn get(&self, trigger: PdTrigger) -> &PdafData {
        &self.slots[trigger.index()]
    }

    pub fn reset(&mut self) {
        for trigger in PdTrigger::ALL {
            self.slots[trigger.index()] = PdafData {
                trigger,
                ..Default::default()
            };
        }
    }
}

impl Default for PdResultCache {
    fn default() -> Self {
        Self::new()
    }
}
