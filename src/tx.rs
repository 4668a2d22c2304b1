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

//! The transaction envelope carried inside an [`crate::item::Item`] (spec.md §3 "Item" /
//! GLOSSARY "Effective tip").
//!
//! Signature recovery, RLP/SSZ wire decoding and full EVM validity are external collaborators
//! (spec.md §1); this module only carries the already-decoded numeric fields the store, the
//! classifier and the packer need, plus the effective-tip/effective-gas-price arithmetic that
//! appears throughout the teacher's `pool::verifier`/`pool::queue` (`effective_gas_price`,
//! `effective_priority_fee`, `max_priority_fee_per_gas`).

use ethereum_types::{Address, H256, U256};

/// Transaction type tag (EIP-2718 envelope discriminant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxType {
    /// Legacy, pre-EIP-1559 transaction: a single `gas_price`.
    Legacy,
    /// EIP-1559 transaction: `max_fee_per_gas` + `max_priority_fee_per_gas`.
    Eip1559,
}

/// A validated candidate transaction.
///
/// Values are already range-checked by the (external) verifier; this crate only ever reads
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Content-addressed hash; doubles as the pool's `Item` id (spec.md §3).
    pub hash: H256,
    /// Sender nonce.
    pub nonce: U256,
    /// Gas limit.
    pub gas_limit: U256,
    /// For [`TxType::Legacy`]: the gas price. For [`TxType::Eip1559`]: ignored (use
    /// `max_fee_per_gas` instead), kept at zero.
    pub gas_price: U256,
    /// EIP-1559 max fee per gas (ignored for legacy transactions).
    pub max_fee_per_gas: U256,
    /// EIP-1559 max priority fee per gas (ignored for legacy transactions).
    pub max_priority_fee_per_gas: U256,
    /// Recipient, `None` for contract creation.
    pub to: Option<Address>,
    /// Value transferred.
    pub value: U256,
    /// Call/init payload.
    pub data: Vec<u8>,
    /// Envelope type.
    pub kind: TxType,
}

impl Transaction {
    /// Maximum fee per gas the sender is willing to pay (`gas_price` pre-1559, `max_fee_per_gas`
    /// otherwise).
    pub fn max_fee_per_gas(&self) -> U256 {
        match self.kind {
            TxType::Legacy => self.gas_price,
            TxType::Eip1559 => self.max_fee_per_gas,
        }
    }

    /// Maximum priority fee the sender is willing to pay the block producer.
    pub fn max_priority_fee_per_gas(&self) -> U256 {
        match self.kind {
            TxType::Legacy => self.gas_price,
            TxType::Eip1559 => self.max_priority_fee_per_gas,
        }
    }

    /// Effective gas price paid at the given base fee (GLOSSARY "Effective tip").
    pub fn effective_gas_price(&self, base_fee: Option<U256>) -> U256 {
        match (self.kind, base_fee) {
            (TxType::Legacy, _) => self.gas_price,
            (TxType::Eip1559, None) => self.max_fee_per_gas,
            (TxType::Eip1559, Some(base_fee)) => {
                let priority = self.effective_priority_fee(Some(base_fee));
                base_fee.saturating_add(priority)
            }
        }
    }

    /// Effective tip: `min(maxPriorityFee, maxFee - baseFee)` post-London, `gasPrice`
    /// otherwise (GLOSSARY "Effective tip").
    pub fn effective_priority_fee(&self, base_fee: Option<U256>) -> U256 {
        match (self.kind, base_fee) {
            (TxType::Legacy, None) => self.gas_price,
            (TxType::Legacy, Some(base_fee)) => self.gas_price.saturating_sub(base_fee),
            (TxType::Eip1559, None) => self.max_priority_fee_per_gas,
            (TxType::Eip1559, Some(base_fee)) => {
                let headroom = self.max_fee_per_gas.saturating_sub(base_fee);
                std::cmp::min(self.max_priority_fee_per_gas, headroom)
            }
        }
    }

    /// Maximum possible cost of the transaction: `gasLimit * maxFeePerGas + value`.
    pub fn cost(&self) -> U256 {
        self.max_fee_per_gas()
            .saturating_mul(self.gas_limit)
            .saturating_add(self.value)
    }

    /// `true` if the sender offered a zero gas price/fee (service transactions in the
    /// teacher's terms).
    pub fn has_zero_gas_price(&self) -> bool {
        self.max_fee_per_gas().is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hex::FromHex;

    fn legacy(gas_price: u64) -> Transaction {
        Transaction {
            hash: H256::zero(),
            nonce: U256::zero(),
            gas_limit: U256::from(21_000u64),
            gas_price: U256::from(gas_price),
            max_fee_per_gas: U256::zero(),
            max_priority_fee_per_gas: U256::zero(),
            to: Some(Address::from_low_u64_be(1)),
            value: U256::zero(),
            data: Vec::new(),
            kind: TxType::Legacy,
        }
    }

    fn eip1559(max_fee: u64, max_priority: u64) -> Transaction {
        Transaction {
            hash: H256::zero(),
            nonce: U256::zero(),
            gas_limit: U256::from(100_000u64),
            gas_price: U256::zero(),
            max_fee_per_gas: U256::from(max_fee),
            max_priority_fee_per_gas: U256::from(max_priority),
            to: Some(Address::from_low_u64_be(2)),
            value: U256::zero(),
            data: "a9059cbb".from_hex().unwrap(),
            kind: TxType::Eip1559,
        }
    }

    #[test]
    fn legacy_effective_tip_is_gas_price_pre_london() {
        let _ = ::env_logger::try_init();
        let tx = legacy(50);
        assert_eq!(tx.effective_priority_fee(None), U256::from(50u64));
        assert_eq!(tx.effective_gas_price(None), U256::from(50u64));
    }

    #[test]
    fn legacy_effective_tip_is_gas_price_minus_base_fee_post_london() {
        let tx = legacy(50);
        assert_eq!(tx.effective_priority_fee(Some(U256::from(30u64))), U256::from(20u64));
    }

    #[test]
    fn eip1559_effective_tip_is_capped_by_fee_headroom() {
        let tx = eip1559(100, 40);
        // base fee leaves only 20 of headroom, below the 40 priority fee requested.
        assert_eq!(tx.effective_priority_fee(Some(U256::from(80u64))), U256::from(20u64));
        // plenty of headroom: priority fee itself is the binding constraint.
        assert_eq!(tx.effective_priority_fee(Some(U256::from(10u64))), U256::from(40u64));
    }

    #[test]
    fn eip1559_effective_gas_price_is_base_fee_plus_tip() {
        let tx = eip1559(100, 40);
        assert_eq!(tx.effective_gas_price(Some(U256::from(10u64))), U256::from(50u64));
    }

    #[test]
    fn cost_includes_value_and_uses_max_fee() {
        let mut tx = eip1559(100, 40);
        tx.value = U256::from(1_000u64);
        assert_eq!(tx.cost(), U256::from(100u64) * U256::from(100_000u64) + U256::from(1_000u64));
    }

    #[test]
    fn zero_max_fee_is_detected() {
        let tx = legacy(0);
        assert!(tx.has_zero_gas_price());
        assert!(!eip1559(1, 1).has_zero_gas_price());
    }
}
