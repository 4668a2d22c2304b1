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

//! The pool's unit record (spec.md §3 "Item").

use crate::tx::Transaction;
use ethereum_types::{Address, H256, U256};

/// Lifecycle bucket an item currently occupies (spec.md §3, §9 "Status enum with per-bucket
/// index").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    /// Not (yet) eligible for inclusion: unknown sender, nonce gap, insufficient balance, or
    /// tip below `minTip`.
    Pending,
    /// Nonce-contiguous, balance-covered, tip-eligible; a candidate for the packer.
    Staged,
    /// Confirmed by the packer's EVM dry-run to fit in the next block.
    Packed,
}

impl Status {
    /// All three buckets, in the engine's walk/promotion order.
    pub const ALL: [Status; 3] = [Status::Pending, Status::Staged, Status::Packed];
}

/// Why an item was moved from the live store into the waste basket (spec.md §3, §4.1, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Explicitly disposed by a caller (`disposeItems`).
    User,
    /// Lost a `supersede` race to a higher-tipped same-(sender, nonce) transaction.
    Replaced,
    /// Disposed as an implied eviction: a lower-nonce sibling was removed first (spec.md §4.1
    /// `disposeSenderFrom`, GLOSSARY "Implied eviction").
    NonceGap,
    /// Nonce is below the sender's on-chain nonce.
    NonceTooLow,
    /// Exceeded `lifeTime` while eligible for zombification (GLOSSARY "Zombify").
    Expired,
    /// The packer's EVM dry-run failed for a reason other than running out of block space.
    VmExecError,
    /// Evicted to make room in a full live store (SPEC_FULL.md "Supplemented features").
    PoolFull,
}

/// Whether an item came from a locally configured account (spec.md §3 `local`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Regular, externally received transaction.
    Regular,
    /// From a locally configured account, or submitted over a trusted local channel.
    Local,
}

impl Priority {
    /// `true` for [`Priority::Local`].
    pub fn is_local(self) -> bool {
        matches!(self, Priority::Local)
    }
}

/// The pool's unit record: a transaction plus derived, mutable metadata (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Content-addressed id; equal to `tx.hash`.
    pub id: H256,
    /// The validated transaction.
    pub tx: Transaction,
    /// Sender address, recovered at insert time.
    pub sender: Address,
    /// Wall-clock milliseconds at acceptance; reset on resurrection.
    pub time_stamp: u64,
    /// Current lifecycle bucket.
    pub status: Status,
    /// Opaque producer-supplied string (tests/logs).
    pub info: String,
    /// Rejection kind; only meaningful while the item sits in the waste basket.
    pub reject: Option<RejectReason>,
    /// `true` if from a configured local account.
    pub local: bool,
    /// Monotonic insertion id, used as a scoring tie-break and for replay-stable traversal
    /// (spec.md §3 "Id index", §4.1 "Tie-breaks").
    pub insertion_id: u64,
}

impl Item {
    /// Transaction nonce, forwarded for convenience.
    pub fn nonce(&self) -> U256 {
        self.tx.nonce
    }

    /// Effective tip at the given base fee (GLOSSARY "Effective tip").
    pub fn effective_tip(&self, base_fee: Option<U256>) -> U256 {
        self.tx.effective_priority_fee(base_fee)
    }

    /// `true` if this item came from a locally configured account.
    pub fn priority(&self) -> Priority {
        if self.local {
            Priority::Local
        } else {
            Priority::Regular
        }
    }
}
