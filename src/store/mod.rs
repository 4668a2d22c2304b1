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

//! The multi-indexed transaction store ("txDB", spec.md §4.1).
//!
//! Canonical storage plus secondary indexes, updated atomically inside a single `&mut self`
//! call so no public operation can ever observe (or leave behind) a partially updated set of
//! indexes. Grounded on the generic pool crate's `Pool<T, S, L>` (`by_hash` + per-sender
//! `Transactions` + `best_transactions`/`worst_transactions` `BTreeSet`s — see
//! `examples/other_examples/.../transaction-pool-src-pool.rs.rs`), extended with the explicit
//! lifecycle-status index spec.md asks for (§9 "Status enum with per-bucket index").

pub mod basket;
pub mod scoring;
pub mod sender;

use crate::error::{Error, Result};
use crate::item::{Item, RejectReason, Status};
use basket::WasteBasket;
use ethereum_types::{Address, H256, U256};
use linked_hash_map::LinkedHashMap;
use log::{debug, trace};
use scoring::RankKey;
use sender::SenderBucket;
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap, HashSet};

/// The multi-indexed live store plus its waste basket (spec.md §3 "Data Model").
#[derive(Debug)]
pub struct MultiIndexStore {
    /// Id index: insertion-ordered canonical storage (spec.md §3 "Id index").
    by_id: LinkedHashMap<H256, Item>,
    /// Sender bucket index (spec.md §3 "Sender bucket").
    by_sender: HashMap<Address, SenderBucket>,
    /// Rank index (spec.md §3 "Rank index").
    rank: BTreeSet<RankKey>,
    /// Status index (spec.md §3 "Status index").
    by_status: HashMap<Status, HashSet<H256>>,
    /// Waste basket (spec.md §3 "Waste basket", §4.5).
    basket: WasteBasket,
    /// Base fee the rank index is currently keyed against.
    base_fee: Option<U256>,
    /// Monotonic insertion id counter (spec.md §3 "Id index", §4.1 "Tie-breaks").
    next_insertion_id: u64,
}

/// Outcome of a successful `insert`: the accepted item's id, plus whatever got pushed out of
/// the live store along the way (spec.md §4.1 `supersede`, "Supplemented features" #1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inserted {
    /// Id of the newly live item.
    pub id: H256,
    /// Ids disposed to make room: the superseded/evicted item first, cascade dependents after.
    pub disposed: Vec<H256>,
}

impl MultiIndexStore {
    /// Creates an empty store with the given waste-basket capacity.
    pub fn new(max_rejects: usize) -> Self {
        MultiIndexStore {
            by_id: LinkedHashMap::new(),
            by_sender: HashMap::new(),
            rank: BTreeSet::new(),
            by_status: Status::ALL.iter().map(|s| (*s, HashSet::new())).collect(),
            basket: WasteBasket::new(max_rejects),
            base_fee: None,
            next_insertion_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_insertion_id;
        self.next_insertion_id += 1;
        id
    }

    // --- reads -------------------------------------------------------------------------------

    /// Borrows a live item by id.
    pub fn get(&self, id: &H256) -> Option<&Item> {
        self.by_id.get(id)
    }

    /// `true` if `id` is live (present in the store, not the basket).
    pub fn contains(&self, id: &H256) -> bool {
        self.by_id.contains_key(id)
    }

    /// Total number of live items (spec.md §4.6 `nItems.total`).
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// `true` if the store holds no live items.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Number of live items currently in `status`.
    pub fn count(&self, status: Status) -> usize {
        self.by_status[&status].len()
    }

    /// Ids of every live item currently in `status`, insertion order.
    pub fn ids_in_status<'a>(&'a self, status: Status) -> impl Iterator<Item = &'a H256> + 'a {
        let set = &self.by_status[&status];
        self.by_id.keys().filter(move |id| set.contains(*id))
    }

    /// Live items currently in `status`, insertion order.
    pub fn items_in_status<'a>(&'a self, status: Status) -> impl Iterator<Item = &'a Item> + 'a {
        self.ids_in_status(status).map(move |id| &self.by_id[id])
    }

    /// All live items, insertion order (spec.md §3 "Id index").
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.by_id.values()
    }

    /// The sender's bucket, if they have any live items.
    pub fn sender_bucket(&self, sender: &Address) -> Option<&SenderBucket> {
        self.by_sender.get(sender)
    }

    /// Every sender with at least one live item.
    pub fn senders(&self) -> impl Iterator<Item = &Address> {
        self.by_sender.keys()
    }

    /// Items ordered by ascending effective tip (ties broken per spec.md §4.1).
    pub fn rank_ascending(&self) -> impl DoubleEndedIterator<Item = &Item> {
        self.rank.iter().map(move |k| &self.by_id[&k.id])
    }

    /// Items ordered by descending effective tip (highest tip first).
    pub fn rank_descending(&self) -> impl Iterator<Item = &Item> {
        self.rank.iter().rev().map(move |k| &self.by_id[&k.id])
    }

    /// The waste basket.
    pub fn basket(&self) -> &WasteBasket {
        &self.basket
    }

    /// The base-fee snapshot the rank index is currently keyed against (spec.md §4.1).
    pub fn base_fee(&self) -> Option<U256> {
        self.base_fee
    }

    /// Next valid nonce for `sender`, if they have any live items
    /// (SPEC_FULL.md "Supplemented features").
    pub fn next_nonce(&self, sender: &Address) -> Option<U256> {
        self.by_sender
            .get(sender)
            .and_then(|b| b.last_nonce())
            .map(|n| n.saturating_add(U256::one()))
    }

    // --- base fee / rank reindex ---------------------------------------------------------------

    /// Updates the base-fee snapshot the rank index is keyed against, rebuilding it in full.
    ///
    /// The teacher clears its cached pending set and swaps scoring wholesale on a base-fee
    /// change (`TransactionQueue::update_scoring`) rather than patching a `BTreeSet` in place;
    /// we do the same.
    pub fn set_base_fee(&mut self, base_fee: Option<U256>) {
        if self.base_fee == base_fee {
            return;
        }
        self.base_fee = base_fee;
        self.rank.clear();
        for item in self.by_id.values() {
            self.rank.insert(Self::rank_key(item, base_fee));
        }
    }

    fn rank_key(item: &Item, base_fee: Option<U256>) -> RankKey {
        RankKey {
            tip: item.effective_tip(base_fee),
            sender: item.sender,
            nonce: item.nonce(),
            id: item.id,
        }
    }

    // --- mutation ------------------------------------------------------------------------------

    /// Inserts `item`. `onchain_nonce` validates a brand-new sender's first nonce;
    /// `price_bump` is the percent threshold a same-`(sender, nonce)` replacement must clear
    /// (spec.md §4.1 `insert`, `supersede`).
    pub fn insert(&mut self, mut item: Item, onchain_nonce: U256, price_bump: u8) -> Result<Inserted> {
        if self.by_id.contains_key(&item.id) {
            return Err(Error::Duplicate(item.id));
        }

        let sender = item.sender;
        let nonce = item.nonce();
        let existing_at_nonce = self.by_sender.get(&sender).and_then(|b| b.id_at(nonce));

        let mut disposed = Vec::new();
        if let Some(existing_id) = existing_at_nonce {
            disposed = self.supersede(&item, existing_id, price_bump)?;
        } else {
            self.check_gap(&item, sender, nonce, onchain_nonce)?;
        }

        item.status = Status::Pending;
        item.insertion_id = self.next_id();
        let id = item.id;
        self.link(item);
        trace!(target: "txpool", "[{id:?}] inserted");
        Ok(Inserted { id, disposed })
    }

    fn check_gap(&self, item: &Item, sender: Address, nonce: U256, onchain_nonce: U256) -> Result<()> {
        let bucket = self.by_sender.get(&sender);
        match bucket.filter(|b| !b.is_empty()) {
            None => {
                if nonce < onchain_nonce {
                    Err(Error::NonceTooLow {
                        hash: item.id,
                        got: nonce,
                        expected: onchain_nonce,
                    })
                } else {
                    Ok(())
                }
            }
            Some(bucket) => {
                let first = bucket.first_nonce().expect("non-empty bucket has a first nonce");
                let last = bucket.last_nonce().expect("non-empty bucket has a last nonce");
                if nonce == last.saturating_add(U256::one()) {
                    Ok(())
                } else if first > U256::zero() && nonce == first - U256::one() {
                    Ok(())
                } else if nonce > last {
                    Err(Error::NonceGap {
                        hash: item.id,
                        got: nonce,
                        expected: last.saturating_add(U256::one()),
                    })
                } else {
                    Err(Error::NonceGap {
                        hash: item.id,
                        got: nonce,
                        expected: first.saturating_sub(U256::one()),
                    })
                }
            }
        }
    }

    /// Supersede-by-price (spec.md §4.1 `supersede`): `item`'s `(sender, nonce)` collides with
    /// `existing_id`. Returns the ids disposed (the superseded item first, cascade dependents
    /// after) so the caller can surface them, e.g. to metrics.
    fn supersede(&mut self, item: &Item, existing_id: H256, price_bump: u8) -> Result<Vec<H256>> {
        let existing = self.by_id.get(&existing_id).expect("existing_at_nonce is live");
        let old_tip = existing.effective_tip(self.base_fee);
        let new_tip = item.effective_tip(self.base_fee);
        let threshold = old_tip.saturating_mul(U256::from(100 + price_bump as u64));
        if new_tip.saturating_mul(U256::from(100u64)) < threshold {
            return Err(Error::Underpriced {
                old: existing_id,
                new: item.id,
            });
        }
        let sender = existing.sender;
        let cascade_from = existing.nonce().saturating_add(U256::one());
        let mut disposed = vec![existing_id];
        self.dispose(existing_id, RejectReason::Replaced);
        disposed.extend(self.dispose_sender_from(sender, cascade_from, RejectReason::NonceGap));
        Ok(disposed)
    }

    fn link(&mut self, item: Item) {
        let id = item.id;
        let sender = item.sender;
        let nonce = item.nonce();
        let status = item.status;
        self.rank.insert(Self::rank_key(&item, self.base_fee));
        self.by_status.get_mut(&status).expect("all statuses present").insert(id);
        self.by_sender.entry(sender).or_default().insert(nonce, id, status);
        self.by_id.insert(id, item);
    }

    fn unlink(&mut self, id: H256) -> Option<Item> {
        let item = self.by_id.remove(&id)?;
        self.rank.remove(&Self::rank_key(&item, self.base_fee));
        self.by_status.get_mut(&item.status).expect("all statuses present").remove(&id);
        if let Some(bucket) = self.by_sender.get_mut(&item.sender) {
            bucket.remove(item.nonce(), item.status);
            if bucket.is_empty() {
                self.by_sender.remove(&item.sender);
            }
        }
        Some(item)
    }

    /// Moves a live item from `by_id`/the live indexes into the waste basket
    /// (spec.md §4.1 `dispose`).
    pub fn dispose(&mut self, id: H256, reason: RejectReason) -> Option<H256> {
        let mut item = self.unlink(id)?;
        item.reject = Some(reason);
        debug!(target: "txpool", "[{id:?}] disposed: {reason:?}");
        if let Some(bumped) = self.basket.push(item) {
            trace!(target: "txpool", "[{:?}] pushed out of the waste basket", bumped.id);
        }
        Some(id)
    }

    /// Disposes every live item of `sender` with nonce `>= nonce`, in descending nonce order,
    /// tagging each with `reason` (spec.md §4.1 `disposeSenderFrom`, §9 "implied eviction").
    pub fn dispose_sender_from(&mut self, sender: Address, nonce: U256, reason: RejectReason) -> Vec<H256> {
        let ids: SmallVec<[H256; 8]> = self
            .by_sender
            .get(&sender)
            .map(|b| b.iter().filter(|(n, _)| *n >= nonce).map(|(_, id)| id).collect())
            .unwrap_or_default();
        let mut disposed = Vec::with_capacity(ids.len());
        for id in ids.into_iter().rev() {
            if self.dispose(id, reason).is_some() {
                disposed.push(id);
            }
        }
        disposed
    }

    /// Moves a live item between lifecycle buckets without re-validating eligibility
    /// (spec.md §4.1 `reassign`; eligibility is the classifier's job, not the store's).
    pub fn reassign(&mut self, id: H256, new_status: Status) -> Result<()> {
        let old_status = {
            let item = self.by_id.get(&id).ok_or(Error::NotFound(id))?;
            item.status
        };
        if old_status == new_status {
            return Ok(());
        }
        {
            let item = self.by_id.get_mut(&id).expect("checked above");
            item.status = new_status;
        }
        self.by_status.get_mut(&old_status).expect("all statuses present").remove(&id);
        self.by_status.get_mut(&new_status).expect("all statuses present").insert(id);
        let item = self.by_id.get(&id).expect("checked above");
        if let Some(bucket) = self.by_sender.get_mut(&item.sender) {
            bucket.recount(old_status, new_status);
        }
        trace!(target: "txpool", "[{id:?}] reassigned {old_status:?} -> {new_status:?}");
        Ok(())
    }

    /// Resurrects an item previously disposed into the waste basket: removes it from the
    /// basket and clears its reject reason so the caller can re-`insert` it (spec.md §4.5).
    pub fn take_from_basket(&mut self, id: &H256) -> Option<Item> {
        self.basket.remove(id).map(|mut item| {
            item.reject = None;
            item
        })
    }

    /// Drops every waste-basket entry, returning how many were dropped
    /// (spec.md §4.1 `flushRejects`).
    pub fn flush_rejects(&mut self) -> usize {
        self.basket.flush()
    }

    /// Updates the waste basket's capacity (spec.md §6 `maxRejects=`).
    pub fn set_max_rejects(&mut self, capacity: usize) {
        self.basket.set_capacity(capacity);
    }

    // --- invariants ----------------------------------------------------------------------------

    /// Re-checks the universal invariants from spec.md §3 after a public operation. Intended
    /// for tests and debug builds (spec.md §8 "debug verifier"), not the hot path.
    #[cfg(any(test, debug_assertions))]
    pub fn verify(&self) {
        // 1: every live item appears in exactly one status bucket.
        for (status, ids) in &self.by_status {
            for id in ids {
                let item = self.by_id.get(id).unwrap_or_else(|| panic!("status index dangling ref {id:?}"));
                assert_eq!(item.status, *status, "status index / item.status mismatch for {id:?}");
            }
        }
        let total_in_status: usize = self.by_status.values().map(HashSet::len).sum();
        assert_eq!(total_in_status, self.by_id.len(), "status index does not partition the live set");

        // 2: rank index contains exactly the live ids, no duplicates, no dangling entries.
        assert_eq!(self.rank.len(), self.by_id.len(), "rank index size mismatch");
        for key in &self.rank {
            assert!(self.by_id.contains_key(&key.id), "rank index dangling ref {:?}", key.id);
        }

        // 3: each sender's live nonces are contiguous with no duplicates.
        for (sender, bucket) in &self.by_sender {
            assert!(!bucket.is_empty(), "empty sender bucket left behind for {sender:?}");
            let nonces: Vec<U256> = bucket.iter().map(|(n, _)| n).collect();
            for w in nonces.windows(2) {
                assert_eq!(w[1], w[0] + U256::one(), "nonce gap in live sender bucket {sender:?}");
            }
            for (nonce, id) in bucket.iter() {
                let item = self.by_id.get(&id).unwrap_or_else(|| panic!("sender index dangling ref {id:?}"));
                assert_eq!(item.nonce(), nonce, "sender index / item.nonce mismatch for {id:?}");
                assert_eq!(item.sender, *sender, "sender index / item.sender mismatch for {id:?}");
            }
        }

        // 4: live set and waste basket are disjoint.
        for id in self.by_id.keys() {
            assert!(!self.basket.contains(id), "{id:?} live in both the store and the waste basket");
        }

        // 5: waste basket never exceeds its capacity (checked structurally by `WasteBasket`
        // itself on every `push`; re-affirm here that it hasn't silently grown past it).
        assert!(self.basket.len() <= self.basket.capacity(), "waste basket over capacity");
    }
}
