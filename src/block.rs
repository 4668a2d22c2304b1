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

//! The packer's output shape (spec.md §6 "Block assembler output").

use ethereum_types::{Address, H256, U256};

/// Minimal block header the façade stamps onto an assembled block.
///
/// Only the fields the packer itself can answer for are populated; everything else (state
/// root, receipts root, difficulty, ...) is the external block-builder's responsibility
/// (spec.md §1 "Out of scope").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Hash of the head this block extends.
    pub parent_hash: H256,
    /// Base fee the packed set was selected against (`None` pre-London).
    pub base_fee: Option<U256>,
    /// `Σ gasUsed` across every dry-run the packer committed (spec.md §6).
    pub gas_used: u64,
    /// Gas target (or limit, if `packItemsMaxGasLimit` was set) the packer filled to.
    pub gas_limit: u64,
}

/// A single post-merge withdrawal (EIP-4895). This crate never produces these itself -- the
/// field exists so a caller assembling a post-merge block has somewhere to attach them; see
/// spec.md §6 "Block assembler output" (`withdrawals?`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    /// Monotonically increasing withdrawal index.
    pub index: u64,
    /// Index of the validator the withdrawal corresponds to.
    pub validator_index: u64,
    /// Recipient.
    pub address: Address,
    /// Amount, in Gwei.
    pub amount_gwei: u64,
}

/// The ordered set of transactions the packer has confirmed fit the next block, plus the
/// header fields it can compute (spec.md §6 "Block assembler output").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block header.
    pub header: BlockHeader,
    /// Packed transaction ids, in inclusion order.
    pub txs: Vec<H256>,
    /// Always `None`: this crate has no withdrawal source of its own.
    pub withdrawals: Option<Vec<Withdrawal>>,
}
