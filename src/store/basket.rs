// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of OpenEthereum.

// OpenEthereum is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// OpenEthereum is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with OpenEthereum.  If not, see <http://www.gnu.org/licenses/>.

//! Waste basket: bounded FIFO of disposed items (spec.md §3, §4.5).
//!
//! `linked_hash_map` gives O(1) FIFO eviction (`pop_front`) plus O(1) keyed removal, which is
//! exactly the access pattern the teacher reaches for this shape with (see
//! `ethcore-miner`'s `LocalTransactionsList`, also a `LinkedHashMap`-backed bounded set).

use crate::item::Item;
use ethereum_types::H256;
use linked_hash_map::LinkedHashMap;

/// Bounded FIFO of recently disposed items, keyed by id (spec.md §3 "Waste basket").
#[derive(Debug)]
pub struct WasteBasket {
    entries: LinkedHashMap<H256, Item>,
    capacity: usize,
}

impl WasteBasket {
    /// Creates an empty waste basket with the given capacity.
    pub fn new(capacity: usize) -> Self {
        WasteBasket {
            entries: LinkedHashMap::new(),
            capacity,
        }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the basket holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `true` if an item with this id is currently in the basket.
    pub fn contains(&self, id: &H256) -> bool {
        self.entries.contains_key(id)
    }

    /// Borrows the entry for `id`, if present.
    pub fn get(&self, id: &H256) -> Option<&Item> {
        self.entries.get(id)
    }

    /// Inserts (or updates in place) an entry, evicting the oldest entry if the basket is now
    /// over capacity (spec.md §4.1 `dispose`).
    pub fn push(&mut self, item: Item) -> Option<Item> {
        self.entries.insert(item.id, item);
        if self.entries.len() > self.capacity {
            self.entries.pop_front().map(|(_, item)| item)
        } else {
            None
        }
    }

    /// Removes and returns an entry, for resurrection on re-`add` (spec.md §4.5).
    pub fn remove(&mut self, id: &H256) -> Option<Item> {
        self.entries.remove(id)
    }

    /// Drops every entry, returning how many were dropped (spec.md §4.1 `flushRejects`).
    pub fn flush(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    /// Updates the capacity; does not immediately evict if the basket is already over the new
    /// capacity (the next `push` will catch up, matching the teacher's lazy-eviction style in
    /// `RecentlyRejected::insert`).
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    /// Iterates all entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (&H256, &Item)> {
        self.entries.iter()
    }
}
