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

//! External collaborator traits (spec.md §1 "Out of scope", §6 "External interfaces").
//!
//! Signature recovery, EVM execution, block-chain head storage and the gas estimator live
//! outside this crate. The pool only ever consumes them through these read-only traits, the
//! same way the teacher's `pool::queue`/`pool::verifier` are generic over a `client::Client`
//! (`+ NonceClient + BalanceClient`) rather than owning a concrete blockchain client.

use crate::tx::Transaction;
use ethereum_types::{Address, H256, U256};

/// Read-only view of account state at a given head (spec.md §6 "State oracle").
pub trait StateOracle {
    /// Account nonce at `head`, or `None` if the head (or account) is unknown.
    fn account_nonce(&self, addr: &Address, head: H256) -> Option<U256>;
    /// Account balance at `head`, or `None` if the head is unknown.
    fn account_balance(&self, addr: &Address, head: H256) -> Option<U256>;
    /// Base fee at `head` (`None` before the London-equivalent fork activates).
    fn base_fee(&self, head: H256) -> Option<U256>;
}

/// Chain parameters the classifier and buckets engine need beyond raw account state
/// (spec.md §4.2).
pub trait ChainContext {
    /// Currently accepted head.
    fn head(&self) -> H256;
    /// `true` once the London-equivalent (EIP-1559) fork is active at `head`.
    fn is_london(&self, head: H256) -> bool;
    /// Chain id, consumed by signature verification upstream of this crate; exposed here so
    /// callers assembling a block can stamp it on the header.
    fn chain_id(&self) -> u64;
}

/// Recovers the sender of a transaction from its signature (spec.md §6 "Signature verifier").
pub trait SignatureVerifier {
    /// Recovers `tx`'s sender, or `None` if the signature does not verify.
    fn recover(&self, tx: &Transaction) -> Option<Address>;
}

/// Computes intrinsic gas and dry-runs a transaction against EVM state (spec.md §6 "EVM
/// executor", §4.4 "Packer").
pub trait GasEstimator {
    /// Minimal gas a transaction of this shape requires before even entering the EVM
    /// (spec.md §7 `GasLimitTooLow`).
    fn intrinsic_gas(&self, tx: &Transaction) -> U256;
}

/// Outcome of a single packer dry-run (spec.md §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Transaction applied cleanly; carries gas actually used.
    Applied(u64),
    /// Transaction ran out of gas relative to the remaining block space.
    OutOfGas,
    /// Any other execution failure (reverted, invalid opcode, ...).
    Error(String),
}

/// Copy-on-write EVM sandbox the packer dry-runs candidate transactions against
/// (spec.md §5 "Shared resources").
pub trait EvmExecutor {
    /// Dry-runs `tx` against `head`'s post-state plus whatever has already been committed in
    /// this packer pass, given `gas_remaining` room in the block.
    fn dry_run(&mut self, tx: &Transaction, head: H256, gas_remaining: u64) -> ExecOutcome;
}
