// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Request-indexed property store.
//!
//! The store itself belongs to the camera pipeline; this module defines the
//! batch interface the AF node consumes and an in-memory implementation
//! used by tests and embedders.
//!
//! Invariants:
//! - A write batch becomes visible to readers only once `write_batch`
//!   returns (one write lock for the whole batch).
//! - Usecase properties ignore the request index.

use afstats_structures::{AfResult, PropertyId, PropertySlot, PropertyValue};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

/// Batch interface over the shared property store.
pub trait PropertyStore: Send + Sync {
    /// Pipeline this view reads from and writes to.
    fn pipeline_id(&self) -> u32;

    /// Reads each slot relative to `request_id`; absent entries are `None`.
    fn read_batch(&self, request_id: u64, slots: &[PropertySlot]) -> Vec<Option<PropertyValue>>;

    /// Writes every entry for `request_id` as one atomic batch.
    fn write_batch(&self, request_id: u64, entries: Vec<(PropertyId, PropertyValue)>) -> AfResult<()>;

    /// Reads a property published by another pipeline.
    ///
    /// `delta` is the signed request distance between the pipelines.
    fn read_peer(&self, peer_pipeline_id: u32, request_id: u64, id: PropertyId, delta: i64) -> Option<PropertyValue>;

    fn read_one(&self, request_id: u64, slot: PropertySlot) -> Option<PropertyValue> {
        self.read_batch(request_id, &[slot]).pop().flatten()
    }
}

type EntryKey = (u32, PropertyId, u64);

/// Request index used for usecase-scope entries.
const USECASE_REQUEST: u64 = u64::MAX;

#[derive(Debug, Default)]
struct StoreState {
    entries: AHashMap<EntryKey, PropertyValue>,
    write_counts: AHashMap<EntryKey, usize>,
}

/// In-memory store shared by any number of pipeline views.
///
/// Views created with [`InMemoryPropertyStore::view`] share one backing map,
/// which is how peer reads across pipelines are served.
#[derive(Debug, Clone)]
pub struct InMemoryPropertyStore {
    pipeline_id: u32,
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryPropertyStore {
    pub fn new(pipeline_id: u32) -> Self {
        Self {
            pipeline_id,
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }

    /// Another pipeline's view of the same backing data.
    pub fn view(&self, pipeline_id: u32) -> Self {
        Self {
            pipeline_id,
            state: Arc::clone(&self.state),
        }
    }

    fn key(&self, id: PropertyId, request_id: u64) -> EntryKey {
        let request = if id.is_usecase() { USECASE_REQUEST } else { request_id };
        (self.pipeline_id, id, request)
    }

    /// Seeds a value as if an upstream node had published it.
    pub fn insert(&self, request_id: u64, id: PropertyId, value: impl Into<PropertyValue>) {
        let key = self.key(id, request_id);
        self.state.write().entries.insert(key, value.into());
    }

    pub fn get(&self, request_id: u64, id: PropertyId) -> Option<PropertyValue> {
        let key = self.key(id, request_id);
        self.state.read().entries.get(&key).cloned()
    }

    /// Number of `write_batch` writes to `id` for `request_id`.
    pub fn write_count(&self, request_id: u64, id: PropertyId) -> usize {
        let key = self.key(id, request_id);
        self.state.read().write_counts.get(&key).copied().unwrap_or(0)
    }

    /// Every value written for `request_id` by this pipeline.
    pub fn snapshot(&self, request_id: u64) -> Vec<(PropertyId, PropertyValue)> {
        let state = self.state.read();
        let mut values: Vec<_> = state
            .entries
            .iter()
            .filter(|((pipeline, _, request), _)| *pipeline == self.pipeline_id && *request == request_id)
            .map(|((_, id, _), value)| (*id, value.clone()))
            .collect();
        values.sort_by_key(|(id, _)| id.to_string());
        values
    }
}

impl PropertyStore for InMemoryPropertyStore {
    fn pipeline_id(&self) -> u32 {
        self.pipeline_id
    }

    fn read_batch(&self, request_id: u64, slots: &[PropertySlot]) -> Vec<Option<PropertyValue>> {
        let state = self.state.read();
        slots
            .iter()
            .map(|slot| {
                let request = if slot.id.is_usecase() {
                    Some(request_id)
                } else {
                    slot.resolve(request_id)
                }?;
                state.entries.get(&self.key(slot.id, request)).cloned()
            })
            .collect()
    }

    fn write_batch(&self, request_id: u64, entries: Vec<(PropertyId, PropertyValue)>) -> AfResult<()> {
        let mut state = self.state.write();
        for (id, value) in entries {
            trace!("[AF-IO] write {} ({}) for request {}", id, value.kind(), request_id);
            let key = self.key(id, request_id);
            *state.write_counts.entry(key).or_insert(0) += 1;
            state.entries.insert(key, value);
        }
        Ok(())
    }

    fn read_peer(&self, peer_pipeline_id: u32, request_id: u64, id: PropertyId, delta: i64) -> Option<PropertyValue> {
        let request = if delta >= 0 {
            request_id.checked_sub(delta as u64)?
        } else {
            request_id.checked_add(delta.unsigned_abs())?
        };
        let state = self.state.read();
        state.entries.get(&(peer_pipeline_id, id, request)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_with_offset() {
        let store = InMemoryPropertyStore::new(0);
        store.insert(4, PropertyId::AfFrameInfo, PropertyValue::U64(4));
        let values = store.read_batch(
            5,
            &[
                PropertySlot::new(PropertyId::AfFrameInfo, 1),
                PropertySlot::current(PropertyId::AfFrameInfo),
                PropertySlot::new(PropertyId::AfFrameInfo, 9),
            ],
        );
        assert_eq!(values, vec![Some(PropertyValue::U64(4)), None, None]);
    }

    #[test]
    fn test_usecase_ignores_request() {
        let store = InMemoryPropertyStore::new(0);
        store
            .write_batch(0, vec![(PropertyId::UsecaseAfFrameControl, PropertyValue::Bool(true))])
            .unwrap();
        let slot = PropertySlot::current(PropertyId::UsecaseAfFrameControl);
        assert_eq!(store.read_one(77, slot), Some(PropertyValue::Bool(true)));
    }

    #[test]
    fn test_write_counts_per_slot() {
        let store = InMemoryPropertyStore::new(0);
        store
            .write_batch(3, vec![(PropertyId::CrossAfStats, PropertyValue::U64(3))])
            .unwrap();
        store
            .write_batch(3, vec![(PropertyId::CrossAfStats, PropertyValue::U64(3))])
            .unwrap();
        assert_eq!(store.write_count(3, PropertyId::CrossAfStats), 2);
        assert_eq!(store.write_count(4, PropertyId::CrossAfStats), 0);
    }

    #[test]
    fn test_peer_views_share_data() {
        let main = InMemoryPropertyStore::new(0);
        let peer = main.view(1);
        peer.write_batch(8, vec![(PropertyId::AfPeerInfo, PropertyValue::U64(8))])
            .unwrap();

        assert_eq!(main.read_peer(1, 10, PropertyId::AfPeerInfo, 2), Some(PropertyValue::U64(8)));
        assert_eq!(main.read_peer(1, 6, PropertyId::AfPeerInfo, -2), Some(PropertyValue::U64(8)));
        assert!(main.get(8, PropertyId::AfPeerInfo).is_none());
    }
}
