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

//! Multi-indexed transaction pool core for an Ethereum-style execution client.
//!
//! A live store ([`store::MultiIndexStore`]) keyed simultaneously by id, sender+nonce, rank and
//! lifecycle status, a per-sender buckets engine that promotes/demotes/disposes items as chain
//! state and configuration change, a greedy highest-tip-first block packer, and a single-writer
//! façade ([`pool::TxPool`]) tying all three together behind one lock. State access, signature
//! recovery, gas estimation and EVM execution are external collaborators, consumed through the
//! traits in [`client`].

#![deny(missing_docs)]

pub mod block;
pub mod buckets;
pub mod classifier;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod item;
pub mod metrics;
pub mod packer;
pub mod pool;
pub mod store;
pub mod tx;

pub use block::{Block, BlockHeader, Withdrawal};
pub use client::{ChainContext, EvmExecutor, ExecOutcome, GasEstimator, SignatureVerifier, StateOracle};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Flags, Options};
pub use error::{Error, Result};
pub use item::{Item, Priority, RejectReason, Status};
pub use metrics::{Metrics, PrometheusMetrics};
pub use packer::PackResult;
pub use pool::{GasTotals, NItems, TxPool};
pub use store::{Inserted, MultiIndexStore};
pub use tx::{Transaction, TxType};
