//! Instance registry: the durable catalog of instances plus port-offset
//! bookkeeping.
//!
//! The whole [`Registry`] is loaded for every operation and rewritten in full
//! on every mutation. Persistence lives behind [`RegistryStore`].
//!
//! Offset invariants maintained by the methods here:
//! - `available_offsets` is ascending, duplicate-free, and below
//!   `next_port_offset`
//! - an offset in use by a registered instance is never in `available_offsets`

mod store;

pub use store::{JsonRegistryStore, MemoryRegistryStore, RegistryStore};

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ports;
use crate::runtime::types::Instance;

/// The single persisted aggregate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    #[serde(default)]
    pub instances: BTreeMap<String, Instance>,

    /// Next never-used offset.
    #[serde(default)]
    pub next_port_offset: u32,

    /// Reclaimed offsets, reused lowest first. Absent on legacy documents.
    #[serde(default)]
    pub available_offsets: Vec<u32>,
}

impl Registry {
    pub fn contains(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.instances.get(name)
    }

    pub fn insert(&mut self, instance: Instance) {
        self.instances.insert(instance.name.clone(), instance);
    }

    pub fn remove(&mut self, name: &str) -> Option<Instance> {
        self.instances.remove(name)
    }

    /// Consume a candidate offset: the smallest reclaimed one not in `skip`,
    /// otherwise the watermark (which then advances).
    pub fn take_offset(&mut self, skip: &BTreeSet<u32>) -> u32 {
        if let Some(pos) = self
            .available_offsets
            .iter()
            .position(|offset| !skip.contains(offset))
        {
            return self.available_offsets.remove(pos);
        }

        let offset = self.next_port_offset;
        self.next_port_offset = self.next_port_offset.saturating_add(1);
        offset
    }

    /// Return an offset to the pool, keeping it sorted and duplicate-free.
    ///
    /// Offsets at or above the watermark were never handed out and are
    /// ignored. Returns whether the pool changed.
    pub fn reclaim(&mut self, offset: u32) -> bool {
        if offset >= self.next_port_offset {
            tracing::warn!(
                offset,
                watermark = self.next_port_offset,
                "Ignoring reclaim of unissued offset"
            );
            return false;
        }

        match self.available_offsets.binary_search(&offset) {
            Ok(_) => false,
            Err(pos) => {
                self.available_offsets.insert(pos, offset);
                true
            }
        }
    }

    /// Offset held by a registered instance, if its gateway port lies on the
    /// allocator grid.
    pub fn offset_of(&self, instance: &Instance) -> Option<u32> {
        ports::offset_for_gateway(instance.gateway_port)
    }

    /// Whether any registered instance other than `except` sits on `offset`.
    pub fn offset_in_use(&self, offset: u32, except: Option<&str>) -> bool {
        self.instances
            .values()
            .filter(|i| Some(i.name.as_str()) != except)
            .any(|i| self.offset_of(i) == Some(offset))
    }

    /// Registered instance whose gateway or bridge port equals `port`.
    pub fn holder_of_port(&self, port: u16) -> Option<&Instance> {
        self.instances.values().find(|i| i.ports().contains(port))
    }

    /// Registered instance whose derived-port window overlaps the window
    /// starting at `gateway_port`.
    pub fn footprint_overlap(&self, gateway_port: u16) -> Option<&Instance> {
        self.instances
            .values()
            .find(|i| ports::footprints_overlap(i.gateway_port, gateway_port))
    }

    /// Restore the offset invariants after a load or an explicit-port insert.
    ///
    /// Returns true if anything had to change.
    pub fn normalize(&mut self) -> bool {
        let before = (self.next_port_offset, self.available_offsets.clone());
        let live: BTreeSet<u32> = self
            .instances
            .values()
            .filter_map(|i| self.offset_of(i))
            .collect();

        // Offsets skipped over by an explicit on-grid port stay reusable.
        if let Some(&highest) = live.last()
            && highest >= self.next_port_offset
        {
            let skipped = (self.next_port_offset..highest).filter(|o| !live.contains(o));
            self.available_offsets.extend(skipped);
            self.next_port_offset = highest + 1;
        }

        let watermark = self.next_port_offset;
        self.available_offsets
            .retain(|offset| *offset < watermark && !live.contains(offset));
        self.available_offsets.sort_unstable();
        self.available_offsets.dedup();

        before != (self.next_port_offset, self.available_offsets.clone())
    }
}
