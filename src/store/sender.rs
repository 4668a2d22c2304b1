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

//! Per-sender ordered mapping nonce -> item (spec.md §3 "Sender bucket").

use crate::item::Status;
use ethereum_types::{H256, U256};
use std::collections::BTreeMap;

/// A single sender's live items, ordered by nonce, with a running count per lifecycle bucket.
#[derive(Debug, Clone, Default)]
pub struct SenderBucket {
    nonces: BTreeMap<U256, H256>,
    counts: [usize; 3],
}

impl SenderBucket {
    /// Lowest live nonce for this sender, if any.
    pub fn first_nonce(&self) -> Option<U256> {
        self.nonces.keys().next().copied()
    }

    /// Highest live nonce for this sender, if any.
    pub fn last_nonce(&self) -> Option<U256> {
        self.nonces.keys().next_back().copied()
    }

    /// `true` if this sender currently has no live items.
    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }

    /// Number of live items from this sender.
    pub fn len(&self) -> usize {
        self.nonces.len()
    }

    /// Id of the item at `nonce`, if present.
    pub fn id_at(&self, nonce: U256) -> Option<H256> {
        self.nonces.get(&nonce).copied()
    }

    /// Items from this sender in ascending nonce order, as `(nonce, id)` pairs.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (U256, H256)> + '_ {
        self.nonces.iter().map(|(n, id)| (*n, *id))
    }

    /// Count of live items currently in `status`.
    pub fn count(&self, status: Status) -> usize {
        self.counts[status as usize]
    }

    pub(crate) fn insert(&mut self, nonce: U256, id: H256, status: Status) {
        self.nonces.insert(nonce, id);
        self.counts[status as usize] += 1;
    }

    pub(crate) fn remove(&mut self, nonce: U256, status: Status) -> Option<H256> {
        let id = self.nonces.remove(&nonce)?;
        self.counts[status as usize] = self.counts[status as usize].saturating_sub(1);
        Some(id)
    }

    pub(crate) fn recount(&mut self, old: Status, new: Status) {
        self.counts[old as usize] = self.counts[old as usize].saturating_sub(1);
        self.counts[new as usize] += 1;
    }
}
