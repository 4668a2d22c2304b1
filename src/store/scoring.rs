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

//! Rank index ordering (spec.md §3 "Rank index", §4.1 "Tie-breaks").
//!
//! Grounded on the generic pool crate's `ScoreWithRef<T, Score>` (see
//! `examples/other_examples/.../paritytech-parity-common__transaction-pool-src-pool.rs`): a
//! small `Ord` newtype stored in a `BTreeSet` rather than recomputing a score on every
//! comparison.

use ethereum_types::{Address, H256, U256};
use std::cmp::Ordering;

/// A single entry in the rank index: effective tip plus the tie-break key from spec.md §4.1
/// ("sender lexicographic, nonce ascending") and the item id as a last-resort distinguisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankKey {
    /// Effective tip at the rank index's current base-fee snapshot.
    pub tip: U256,
    /// Sender address (tie-break #1).
    pub sender: Address,
    /// Transaction nonce (tie-break #2).
    pub nonce: U256,
    /// Item id (final, total-order tie-break).
    pub id: H256,
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tip
            .cmp(&other.tip)
            .then_with(|| self.sender.cmp(&other.sender))
            .then_with(|| self.nonce.cmp(&other.nonce))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
