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

//! Packer: greedy highest-tip-first block filler (spec.md §4.4).
//!
//! Walks the `Staged` set one sender-front at a time — the lowest live nonce a sender has
//! `Staged` is the only transaction of theirs eligible to pack next, since packing out of
//! nonce order would produce an invalid block. A max-heap keyed by effective tip (ties broken
//! by earliest arrival, i.e. lowest `insertion_id`) always dry-runs the globally best available
//! candidate next, the same greedy shape as the teacher's `Pool::pending`/`PendingIterator`
//! picks the next-best transaction per sender on every step rather than sorting up front.

use crate::client::{EvmExecutor, ExecOutcome};
use crate::config::Options;
use crate::item::{RejectReason, Status};
use crate::store::MultiIndexStore;
use ethereum_types::{Address, H256, U256};
use log::{debug, trace};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use trace_time::trace_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    tip: U256,
    insertion_id: u64,
    sender: Address,
    id: H256,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tip
            .cmp(&other.tip)
            .then_with(|| other.insertion_id.cmp(&self.insertion_id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of a single packer pass (spec.md §4.4, §6 "Block assembler output").
#[derive(Debug, Clone, Default)]
pub struct PackResult {
    /// Ids packed this pass, in inclusion order.
    pub packed: Vec<H256>,
    /// Total gas consumed by `packed`.
    pub gas_used: u64,
    /// `Σ effectiveTip × gasUsed` over `packed` (GLOSSARY "Effective tip", spec.md §4.4).
    pub profitability: U256,
}

/// Runs one packing pass over the store's current `Staged` set, dry-running candidates through
/// `evm` at `head` until the gas target (or limit) is reached or no sender has a fitting
/// front left.
pub fn run<E: EvmExecutor>(
    store: &mut MultiIndexStore,
    evm: &mut E,
    head: H256,
    base_fee: Option<U256>,
    options: &Options,
) -> PackResult {
    trace_time!("packer::run");
    let gas_target = if options.flags.pack_items_max_gas_limit {
        options.max_gas_limit
    } else {
        options.trg_gas_limit
    };

    let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
    let mut blocked: HashSet<Address> = HashSet::new();
    for sender in store.senders().copied().collect::<Vec<_>>() {
        if let Some(candidate) = sender_front(store, &sender, base_fee) {
            heap.push(candidate);
        }
    }

    let mut result = PackResult::default();
    while let Some(candidate) = heap.pop() {
        if blocked.contains(&candidate.sender) {
            continue;
        }
        let Some(item) = store.get(&candidate.id) else { continue };
        if item.status != Status::Staged {
            continue;
        }
        let gas_remaining = gas_target.saturating_sub(result.gas_used);
        if gas_remaining == 0 {
            break;
        }
        let tx = item.tx.clone();
        match evm.dry_run(&tx, head, gas_remaining) {
            ExecOutcome::Applied(gas_used) => {
                let _ = store.reassign(candidate.id, Status::Packed);
                result.packed.push(candidate.id);
                result.gas_used = result.gas_used.saturating_add(gas_used);
                result.profitability = result
                    .profitability
                    .saturating_add(candidate.tip.saturating_mul(U256::from(gas_used)));
                trace!(target: "txpool", "[{:?}] packed, gas_used={gas_used}", candidate.id);
                if let Some(next) = sender_front(store, &candidate.sender, base_fee) {
                    heap.push(next);
                }
            }
            ExecOutcome::OutOfGas => {
                debug!(target: "txpool", "[{:?}] out of gas at {gas_remaining} remaining", candidate.id);
                blocked.insert(candidate.sender);
                if !options.flags.pack_items_try_harder {
                    break;
                }
            }
            ExecOutcome::Error(reason) => {
                debug!(target: "txpool", "[{:?}] execution error: {reason}", candidate.id);
                store.dispose(candidate.id, RejectReason::VmExecError);
                if let Some(next) = sender_front(store, &candidate.sender, base_fee) {
                    heap.push(next);
                }
            }
        }
    }
    result
}

fn sender_front(store: &MultiIndexStore, sender: &Address, base_fee: Option<U256>) -> Option<Candidate> {
    let bucket = store.sender_bucket(sender)?;
    let (_, id) = bucket.iter().next()?;
    let item = store.get(&id)?;
    if item.status != Status::Staged {
        return None;
    }
    Some(Candidate {
        tip: item.effective_tip(base_fee),
        insertion_id: item.insertion_id,
        sender: *sender,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::tx::{Transaction, TxType};

    struct TestEvm {
        budget: u64,
    }

    impl EvmExecutor for TestEvm {
        fn dry_run(&mut self, tx: &Transaction, _head: H256, gas_remaining: u64) -> ExecOutcome {
            let needed = tx.gas_limit.as_u64();
            if needed > gas_remaining {
                ExecOutcome::OutOfGas
            } else if needed > self.budget {
                ExecOutcome::OutOfGas
            } else {
                self.budget -= needed;
                ExecOutcome::Applied(needed)
            }
        }
    }

    struct FailingEvm {
        fails: H256,
    }

    impl EvmExecutor for FailingEvm {
        fn dry_run(&mut self, tx: &Transaction, _head: H256, _gas_remaining: u64) -> ExecOutcome {
            if tx.hash == self.fails {
                ExecOutcome::Error("reverted".to_string())
            } else {
                ExecOutcome::Applied(tx.gas_limit.as_u64())
            }
        }
    }

    fn addr(byte: u8) -> Address {
        Address::from_low_u64_be(byte as u64)
    }

    fn id(byte: u8) -> H256 {
        H256::from_low_u64_be(byte as u64)
    }

    fn staged_item(sender: Address, nonce: u64, gas_price: u64, hash_seed: u8) -> Item {
        Item {
            id: id(hash_seed),
            tx: Transaction {
                hash: id(hash_seed),
                nonce: U256::from(nonce),
                gas_limit: U256::from(21_000u64),
                gas_price: U256::from(gas_price),
                max_fee_per_gas: U256::zero(),
                max_priority_fee_per_gas: U256::zero(),
                to: Some(addr(0xff)),
                value: U256::zero(),
                data: Vec::new(),
                kind: TxType::Legacy,
            },
            sender,
            time_stamp: 0,
            status: Status::Staged,
            info: String::new(),
            reject: None,
            local: false,
            insertion_id: hash_seed as u64,
        }
    }

    fn insert_staged(store: &mut MultiIndexStore, item: Item) {
        let id = item.id;
        store.insert(item, U256::zero(), 10).unwrap();
        store.reassign(id, Status::Staged).unwrap();
    }

    #[test]
    fn packs_highest_tip_first() {
        let mut store = MultiIndexStore::new(16);
        insert_staged(&mut store, staged_item(addr(1), 0, 10, 1));
        insert_staged(&mut store, staged_item(addr(2), 0, 50, 2));

        let options = Options::default();
        let mut evm = TestEvm { budget: 1_000_000 };
        let result = run(&mut store, &mut evm, H256::zero(), None, &options);

        assert_eq!(result.packed, vec![id(2), id(1)]);
        assert_eq!(store.get(&id(2)).unwrap().status, Status::Packed);
        let expected_profitability = U256::from(50u64) * U256::from(21_000u64)
            + U256::from(10u64) * U256::from(21_000u64);
        assert_eq!(result.profitability, expected_profitability);
        store.verify();
    }

    #[test]
    fn respects_nonce_order_per_sender() {
        let mut store = MultiIndexStore::new(16);
        insert_staged(&mut store, staged_item(addr(1), 0, 10, 1));
        insert_staged(&mut store, staged_item(addr(1), 1, 100, 2));

        let options = Options::default();
        let mut evm = TestEvm { budget: 1_000_000 };
        let result = run(&mut store, &mut evm, H256::zero(), None, &options);

        assert_eq!(result.packed, vec![id(1), id(2)]);
        store.verify();
    }

    #[test]
    fn out_of_gas_stops_the_pass_without_try_harder() {
        let mut store = MultiIndexStore::new(16);
        insert_staged(&mut store, staged_item(addr(1), 0, 100, 1));
        insert_staged(&mut store, staged_item(addr(2), 0, 10, 2));

        let options = Options::default();
        let mut evm = TestEvm { budget: 21_000 };
        let result = run(&mut store, &mut evm, H256::zero(), None, &options);

        assert_eq!(result.packed, vec![id(1)]);
        assert_eq!(store.get(&id(2)).unwrap().status, Status::Staged);
        store.verify();
    }

    #[test]
    fn vm_exec_error_disposes_only_the_failing_item_and_advances_the_sender() {
        let mut store = MultiIndexStore::new(16);
        insert_staged(&mut store, staged_item(addr(1), 0, 10, 1));
        insert_staged(&mut store, staged_item(addr(1), 1, 10, 2));
        insert_staged(&mut store, staged_item(addr(1), 2, 10, 3));

        let options = Options::default();
        let mut evm = FailingEvm { fails: id(1) };
        let result = run(&mut store, &mut evm, H256::zero(), None, &options);

        assert_eq!(result.packed, vec![id(2), id(3)]);
        assert_eq!(store.basket().get(&id(1)).unwrap().reject, Some(RejectReason::VmExecError));
        assert!(!store.contains(&id(1)));
        assert_eq!(store.get(&id(2)).unwrap().status, Status::Packed);
        assert_eq!(store.get(&id(3)).unwrap().status, Status::Packed);
        store.verify();
    }
}
