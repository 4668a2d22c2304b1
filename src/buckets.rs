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

//! Buckets engine: the per-sender promotion walk (spec.md §4.3).
//!
//! Triggered after every `add`, `smartHead` and `triggerReorg`. For each sender with live
//! items: zombify first, then walk the sender's nonces in ascending order maintaining a
//! simulated `running_nonce`/`running_balance`, promoting/demoting/disposing as the walk
//! dictates. The walk only ever places items in [`Status::Pending`] or [`Status::Staged`];
//! [`Status::Packed`] is set exclusively by `packer.rs` after its own pass, so a full
//! buckets-then-packer cycle always starts from a clean, re-verified `Staged` set.

use crate::classifier;
use crate::client::{ChainContext, StateOracle};
use crate::clock::Clock;
use crate::config::Options;
use crate::item::{RejectReason, Status};
use crate::store::MultiIndexStore;
use ethereum_types::{Address, H256, U256};
use log::trace;
use smallvec::SmallVec;
use trace_time::trace_time;

/// Runs one full pass over every sender with live items.
pub fn run<O, C>(store: &mut MultiIndexStore, oracle: &O, chain: &C, clock: &dyn Clock, options: &Options)
where
    O: StateOracle,
    C: ChainContext,
{
    trace_time!("buckets::run");
    let head = chain.head();
    let is_london = chain.is_london(head);
    let senders: Vec<Address> = store.senders().copied().collect();
    let now = clock.now_millis();
    for sender in senders {
        zombify_sender(store, &sender, now, options);
        walk_sender(store, oracle, &sender, head, is_london, options);
    }
}

fn zombify_sender(store: &mut MultiIndexStore, sender: &Address, now: u64, options: &Options) {
    let ids: SmallVec<[H256; 8]> = store
        .sender_bucket(sender)
        .map(|b| b.iter().map(|(_, id)| id).collect())
        .unwrap_or_default();
    for id in ids {
        let Some(item) = store.get(&id) else { continue };
        let eligible = match item.status {
            Status::Packed => options.flags.auto_zombify_packed,
            Status::Pending | Status::Staged => options.flags.auto_zombify_unpacked,
        };
        if eligible && classifier::is_expired(item, now, options) {
            trace!(target: "txpool", "[{id:?}] zombified after exceeding lifeTime");
            store.dispose(id, RejectReason::Expired);
        }
    }
}

fn walk_sender<O: StateOracle>(
    store: &mut MultiIndexStore,
    oracle: &O,
    sender: &Address,
    head: H256,
    is_london: bool,
    options: &Options,
) {
    let Some(mut running_nonce) = oracle.account_nonce(sender, head) else {
        return;
    };
    let Some(mut running_balance) = oracle.account_balance(sender, head) else {
        return;
    };
    let base_fee = oracle.base_fee(head);

    let ids: SmallVec<[H256; 8]> = store
        .sender_bucket(sender)
        .map(|b| b.iter().map(|(_, id)| id).collect())
        .unwrap_or_default();

    let mut stalled = false;
    for id in ids {
        let Some(item) = store.get(&id).cloned() else { continue };

        if item.nonce() < running_nonce {
            trace!(target: "txpool", "[{id:?}] disposed: nonce already included on chain");
            store.dispose(id, RejectReason::NonceTooLow);
            continue;
        }

        if stalled || item.nonce() > running_nonce {
            stalled = true;
            if item.status != Status::Pending {
                let _ = store.reassign(id, Status::Pending);
            }
            continue;
        }

        let cost = item.tx.cost();
        let eligible = cost <= running_balance && classifier::meets_min_tip(&item, base_fee, options, is_london);
        if eligible {
            if item.status != Status::Staged {
                let _ = store.reassign(id, Status::Staged);
            }
            running_balance = running_balance.saturating_sub(cost);
            running_nonce = running_nonce.saturating_add(U256::one());
        } else {
            stalled = true;
            if item.status != Status::Pending {
                let _ = store.reassign(id, Status::Pending);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::item::Item;
    use crate::tx::{Transaction, TxType};
    use std::collections::HashMap;

    struct TestOracle {
        nonces: HashMap<Address, U256>,
        balances: HashMap<Address, U256>,
        base_fee: Option<U256>,
    }

    impl StateOracle for TestOracle {
        fn account_nonce(&self, addr: &Address, _head: H256) -> Option<U256> {
            self.nonces.get(addr).copied()
        }
        fn account_balance(&self, addr: &Address, _head: H256) -> Option<U256> {
            self.balances.get(addr).copied()
        }
        fn base_fee(&self, _head: H256) -> Option<U256> {
            self.base_fee
        }
    }

    struct TestChain;
    impl ChainContext for TestChain {
        fn head(&self) -> H256 {
            H256::zero()
        }
        fn is_london(&self, _head: H256) -> bool {
            false
        }
        fn chain_id(&self) -> u64 {
            1
        }
    }

    fn addr(byte: u8) -> Address {
        Address::from_low_u64_be(byte as u64)
    }

    fn id(byte: u8) -> H256 {
        H256::from_low_u64_be(byte as u64)
    }

    fn item(sender: Address, nonce: u64, gas_price: u64, hash_seed: u8) -> Item {
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
            status: Status::Pending,
            info: String::new(),
            reject: None,
            local: false,
            insertion_id: 0,
        }
    }

    #[test]
    fn contiguous_affordable_items_are_staged() {
        let mut store = MultiIndexStore::new(16);
        let a = addr(1);
        store.insert(item(a, 0, 10, 1), U256::zero(), 10).unwrap();
        store.insert(item(a, 1, 10, 2), U256::zero(), 10).unwrap();

        let oracle = TestOracle {
            nonces: HashMap::from([(a, U256::zero())]),
            balances: HashMap::from([(a, U256::from(10_000_000u64))]),
            base_fee: None,
        };
        let clock = ManualClock::new(0);
        run(&mut store, &oracle, &TestChain, &clock, &Options::default());

        assert_eq!(store.get(&id(1)).unwrap().status, Status::Staged);
        assert_eq!(store.get(&id(2)).unwrap().status, Status::Staged);
        store.verify();
    }

    #[test]
    fn insufficient_balance_stalls_the_walk() {
        let mut store = MultiIndexStore::new(16);
        let a = addr(1);
        store.insert(item(a, 0, 10, 1), U256::zero(), 10).unwrap();
        store.insert(item(a, 1, 10, 2), U256::zero(), 10).unwrap();

        let oracle = TestOracle {
            nonces: HashMap::from([(a, U256::zero())]),
            balances: HashMap::from([(a, U256::from(21_000u64 * 10))]),
            base_fee: None,
        };
        let clock = ManualClock::new(0);
        run(&mut store, &oracle, &TestChain, &clock, &Options::default());

        assert_eq!(store.get(&id(1)).unwrap().status, Status::Staged);
        assert_eq!(store.get(&id(2)).unwrap().status, Status::Pending);
        store.verify();
    }

    #[test]
    fn on_chain_nonce_advance_disposes_stale_items() {
        let mut store = MultiIndexStore::new(16);
        let a = addr(1);
        store.insert(item(a, 0, 10, 1), U256::zero(), 10).unwrap();
        store.insert(item(a, 1, 10, 2), U256::zero(), 10).unwrap();

        let oracle = TestOracle {
            nonces: HashMap::from([(a, U256::from(2u64))]),
            balances: HashMap::from([(a, U256::from(10_000_000u64))]),
            base_fee: None,
        };
        let clock = ManualClock::new(0);
        run(&mut store, &oracle, &TestChain, &clock, &Options::default());

        assert!(store.is_empty());
        assert_eq!(store.basket().len(), 2);
        store.verify();
    }

    #[test]
    fn expired_pending_items_are_zombified() {
        let mut store = MultiIndexStore::new(16);
        let a = addr(1);
        store.insert(item(a, 5, 10, 1), U256::zero(), 10).unwrap();

        let oracle = TestOracle {
            nonces: HashMap::from([(a, U256::zero())]),
            balances: HashMap::from([(a, U256::from(10_000_000u64))]),
            base_fee: None,
        };
        let mut options = Options::default();
        options.life_time_millis = 1_000;
        options.flags.auto_zombify_unpacked = true;
        let clock = ManualClock::new(10_000);

        run(&mut store, &oracle, &TestChain, &clock, &options);

        assert!(store.is_empty());
        assert_eq!(store.basket().get(&id(1)).unwrap().reject, Some(RejectReason::Expired));
    }
}
