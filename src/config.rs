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

//! Pool configuration (spec.md §6 "Configuration").
//!
//! Shaped the way the teacher shapes `pool::verifier::Options` /
//! `txpool::Options`: a plain struct with a hand-written `Default`, plus
//! `serde` derives so an (out-of-scope) configuration loader can deserialize
//! it directly.

use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Feature flags controlling optional pool behaviour (spec.md §6 `flags`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags {
    /// Zombify packed items once they exceed `lifeTime`.
    pub auto_zombify_packed: bool,
    /// Zombify pending/staged items once they exceed `lifeTime`.
    pub auto_zombify_unpacked: bool,
    /// Let the packer fill up to `max_gas_limit` instead of `trg_gas_limit`.
    pub pack_items_max_gas_limit: bool,
    /// Ask the packer to keep trying other senders after an `OutOfGas` stall
    /// instead of stopping at the first one (see packer.rs).
    pub pack_items_try_harder: bool,
}

/// Pool-wide tunables (spec.md §6 "Configuration").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Minimum percent price increase required for a same-(sender, nonce) replacement to
    /// succeed (spec.md §4.1 `supersede`). Default 10.
    pub price_bump: u8,
    /// Age, in milliseconds, after which a live item becomes eligible for zombification.
    pub life_time_millis: u64,
    /// Maximum number of entries retained in the waste basket.
    pub max_rejects: usize,
    /// Maximum number of items retained in the live store.
    pub max_count: usize,
    /// Pre-London minimal gas price.
    pub min_pre_london_gas_price: U256,
    /// Post-London minimal priority fee.
    pub min_priority_fee: U256,
    /// Target gas limit the packer fills to by default.
    pub trg_gas_limit: u64,
    /// Hard gas limit the packer may fill to when `pack_items_max_gas_limit` is set.
    pub max_gas_limit: u64,
    /// Behavioural flags.
    pub flags: Flags,
    /// Accounts treated as local (bypass the `minTip` classifier clause; see SPEC_FULL.md
    /// "Supplemented features").
    pub local_accounts: HashSet<Address>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            price_bump: 10,
            life_time_millis: 3 * 60 * 60 * 1000,
            max_rejects: 2048,
            max_count: 8192,
            min_pre_london_gas_price: U256::zero(),
            min_priority_fee: U256::zero(),
            trg_gas_limit: 15_000_000,
            max_gas_limit: 30_000_000,
            flags: Flags::default(),
            local_accounts: HashSet::new(),
        }
    }
}

impl Options {
    /// `minTip` per spec.md §4.2: pre-London minimal gas price before the London fork
    /// activates at the current head, otherwise the minimal priority fee.
    pub fn min_tip(&self, is_london: bool) -> U256 {
        if is_london {
            self.min_priority_fee
        } else {
            self.min_pre_london_gas_price
        }
    }
}
