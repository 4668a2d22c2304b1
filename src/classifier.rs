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

//! Eligibility predicates for lifecycle transitions (spec.md §4.2).
//!
//! Kept as small pure functions, the way the teacher's `pool::verifier` keeps its individual
//! checks (`has_zero_gas_price`, `effective_priority_fee`, ...) as free functions/methods on
//! `Transaction` rather than one monolithic `fn classify`.

use crate::config::Options;
use crate::item::Item;
use ethereum_types::U256;

/// `true` if `item`'s tip clears `minTip` at `base_fee` (spec.md §4.2 classifier table).
///
/// Local items bypass this clause (SPEC_FULL.md "Supplemented features" #2); they are never
/// exempt from the balance or nonce-contiguity checks.
pub fn meets_min_tip(item: &Item, base_fee: Option<U256>, options: &Options, is_london: bool) -> bool {
    item.local || item.effective_tip(base_fee) >= options.min_tip(is_london)
}

/// `true` if `item` has aged past `lifeTime` as of `now_millis` (GLOSSARY "Zombify").
pub fn is_expired(item: &Item, now_millis: u64, options: &Options) -> bool {
    now_millis.saturating_sub(item.time_stamp) >= options.life_time_millis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Item, Status};
    use crate::tx::{Transaction, TxType};
    use ethereum_types::{Address, H256};

    fn item(local: bool, gas_price: u64, time_stamp: u64) -> Item {
        Item {
            id: H256::zero(),
            tx: Transaction {
                hash: H256::zero(),
                nonce: U256::zero(),
                gas_limit: U256::from(21_000u64),
                gas_price: U256::from(gas_price),
                max_fee_per_gas: U256::zero(),
                max_priority_fee_per_gas: U256::zero(),
                to: None,
                value: U256::zero(),
                data: Vec::new(),
                kind: TxType::Legacy,
            },
            sender: Address::zero(),
            time_stamp,
            status: Status::Pending,
            info: String::new(),
            reject: None,
            local,
            insertion_id: 0,
        }
    }

    #[test]
    fn local_items_bypass_min_tip() {
        let mut options = Options::default();
        options.min_pre_london_gas_price = U256::from(1_000u64);
        let regular = item(false, 1, 0);
        let local = item(true, 1, 0);
        assert!(!meets_min_tip(&regular, None, &options, false));
        assert!(meets_min_tip(&local, None, &options, false));
    }

    #[test]
    fn expiry_is_relative_to_life_time() {
        let mut options = Options::default();
        options.life_time_millis = 1_000;
        let fresh = item(false, 1, 5_000);
        let stale = item(false, 1, 3_000);
        assert!(!is_expired(&fresh, 5_500, &options));
        assert!(is_expired(&stale, 5_500, &options));
    }
}
