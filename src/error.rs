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

//! Transaction pool error kinds.

use ethereum_types::{H256, U256};
use std::{error, fmt, result};

/// Transaction pool result.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can be returned from pool operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A transaction with this id is already present in the live store.
    Duplicate(H256),
    /// Replacing an existing `(sender, nonce)` entry failed the price-bump threshold.
    Underpriced {
        /// Hash of the transaction already occupying the slot.
        old: H256,
        /// Hash of the transaction that failed to replace it.
        new: H256,
    },
    /// Transaction's nonce is below the sender's lowest live nonce or on-chain nonce.
    NonceTooLow {
        /// The transaction hash.
        hash: H256,
        /// The nonce that was rejected.
        got: U256,
        /// The minimal acceptable nonce.
        expected: U256,
    },
    /// Transaction's nonce leaves a gap in the sender's live nonce sequence.
    NonceGap {
        /// The transaction hash.
        hash: H256,
        /// The nonce that was rejected.
        got: U256,
        /// The next contiguous nonce that would have been accepted.
        expected: U256,
    },
    /// Signature recovery failed; the sender of the transaction is unknown.
    SenderUnknown(H256),
    /// Sender's balance cannot cover `gasLimit * gasPrice + value`.
    InsufficientFunds {
        /// The transaction hash.
        hash: H256,
        /// Maximal cost of the transaction.
        cost: U256,
        /// Sender's balance at the current head.
        balance: U256,
    },
    /// Transaction's gas limit is below the intrinsic gas required to run it.
    GasLimitTooLow {
        /// The transaction hash.
        hash: H256,
        /// Minimal required gas.
        minimal: U256,
        /// Gas limit supplied by the transaction.
        got: U256,
    },
    /// Transaction type is not recognised or not allowed under the active fork rules.
    InvalidType(H256),
    /// The state oracle could not resolve the requested head.
    HeadUnknown(H256),
    /// Packer's EVM dry-run failed for a reason other than running out of block space.
    VmExecError {
        /// The transaction hash.
        hash: H256,
        /// Opaque reason reported by the EVM executor.
        reason: String,
    },
    /// The live store is at capacity and the incoming transaction did not outrank the worst
    /// transaction currently held (see SPEC_FULL.md, "Supplemented features").
    PoolFull(H256),
    /// No live item with this id exists.
    NotFound(H256),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Duplicate(h) => write!(f, "[{h:?}] already imported"),
            Error::Underpriced { old, new } => {
                write!(f, "[{new:?}] too cheap to replace [{old:?}]")
            }
            Error::NonceTooLow {
                hash,
                got,
                expected,
            } => write!(f, "[{hash:?}] nonce too low: {got} < {expected}"),
            Error::NonceGap {
                hash,
                got,
                expected,
            } => write!(f, "[{hash:?}] nonce gap: {got} != {expected}"),
            Error::SenderUnknown(h) => write!(f, "[{h:?}] sender could not be recovered"),
            Error::InsufficientFunds {
                hash,
                cost,
                balance,
            } => write!(f, "[{hash:?}] insufficient funds: {balance} < {cost}"),
            Error::GasLimitTooLow {
                hash,
                minimal,
                got,
            } => write!(f, "[{hash:?}] gas limit too low: {got} < {minimal}"),
            Error::InvalidType(h) => write!(f, "[{h:?}] invalid transaction type"),
            Error::HeadUnknown(h) => write!(f, "head {h:?} is unknown to the state oracle"),
            Error::VmExecError { hash, reason } => write!(f, "[{hash:?}] execution error: {reason}"),
            Error::PoolFull(h) => write!(f, "[{h:?}] pool is full"),
            Error::NotFound(h) => write!(f, "[{h:?}] no such live item"),
        }
    }
}

impl error::Error for Error {}
