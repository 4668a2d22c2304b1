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

//! The public façade (spec.md §4.6 "TxPool Façade").
//!
//! A single `RwLock<Inner>` serializes every mutating operation (spec.md §5 "single-writer,
//! multiple-reader"), the same shape as the teacher's `TransactionQueue` wrapping its `Pool` in
//! a `parking_lot::RwLock`. External collaborators (state oracle, chain context, signature
//! verifier, gas estimator, EVM executor) are taken as generic parameters on each call rather
//! than stored on the struct, mirroring `TransactionQueue::import<C: client::Client + ...>`,
//! which takes its `client` the same way. The wall clock is the one dependency held for the
//! façade's lifetime (spec.md §9 "Clock injection").

use crate::block::{Block, BlockHeader};
use crate::buckets;
use crate::client::{ChainContext, EvmExecutor, GasEstimator, SignatureVerifier, StateOracle};
use crate::clock::Clock;
use crate::config::{Flags, Options};
use crate::error::{Error, Result};
use crate::item::{Item, RejectReason, Status};
use crate::metrics::{Metrics, PrometheusMetrics};
use crate::packer::{self, PackResult};
use crate::store::MultiIndexStore;
use crate::tx::{Transaction, TxType};
use ethereum_types::{Address, H256, U256};
use log::{debug, info, trace};
use prometheus::Registry;
use std::collections::HashSet;
use std::sync::Arc;
use trace_time::trace_time;

/// Live bucket occupancy plus waste-basket size (spec.md §4.6 `nItems`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NItems {
    /// Items in [`Status::Pending`].
    pub pending: usize,
    /// Items in [`Status::Staged`].
    pub staged: usize,
    /// Items in [`Status::Packed`].
    pub packed: usize,
    /// `pending + staged + packed` (spec.md §3 invariant 5).
    pub total: usize,
    /// Waste-basket size (spec.md §3 invariant 7).
    pub disposed: usize,
}

/// Aggregate gas figures (spec.md §4.6 `gasTotals`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GasTotals {
    /// `Σ gasLimit` over the current `Staged` set.
    pub staged_gas_limit: U256,
    /// Gas actually consumed by the most recent packer pass.
    pub packed_gas_used: u64,
}

struct Inner {
    store: MultiIndexStore,
    options: Options,
    metrics: Metrics,
    head: Option<H256>,
    last_pack: PackResult,
}

/// The transaction pool façade (spec.md §4.6).
pub struct TxPool {
    clock: Arc<dyn Clock>,
    inner: parking_lot::RwLock<Inner>,
}

impl TxPool {
    /// Creates an empty pool with the given configuration and clock source.
    pub fn new(options: Options, clock: Arc<dyn Clock>) -> Self {
        let store = MultiIndexStore::new(options.max_rejects);
        TxPool {
            clock,
            inner: parking_lot::RwLock::new(Inner {
                store,
                options,
                metrics: Metrics::new(),
                head: None,
                last_pack: PackResult::default(),
            }),
        }
    }

    /// Current configuration snapshot.
    pub fn options(&self) -> Options {
        self.inner.read().options.clone()
    }

    /// Registers the accumulated counters into a caller-owned registry (spec.md §2 item 8).
    pub fn prometheus_metrics(&self, prefix: &str, registry: &Registry) {
        self.inner.read().metrics.prometheus_metrics(prefix, registry);
    }

    // --- mutating operations ------------------------------------------------------------------

    /// Imports a batch of candidate transactions (spec.md §4.6 `add`).
    ///
    /// An empty `txs` is the idiomatic way to force a maintenance pass (spec.md §4.3): the
    /// buckets engine and packer still run once even if nothing is imported. `info` is shared by
    /// every item in the batch, matching the façade's single optional `info` parameter.
    ///
    /// The outer `Result` is the batch-level precondition (spec.md §7: "batch-level
    /// preconditions... abort the batch with no state change") -- currently only `HeadUnknown`
    /// when `smartHead` has never been called. The inner `Vec` carries one outcome per
    /// transaction, in order; a per-item failure never aborts the rest of the batch.
    pub fn add<O, C, V, G, E>(
        &self,
        oracle: &O,
        chain: &C,
        verifier: &V,
        gas: &G,
        evm: &mut E,
        txs: Vec<Transaction>,
        info: Option<&str>,
    ) -> Result<Vec<Result<H256>>>
    where
        O: StateOracle,
        C: ChainContext,
        V: SignatureVerifier,
        G: GasEstimator,
        E: EvmExecutor,
    {
        trace_time!("pool::add");
        let mut inner = self.inner.write();
        let head = inner.head.ok_or(Error::HeadUnknown(H256::zero()))?;
        let is_london = chain.is_london(head);
        let base_fee = oracle.base_fee(head);
        inner.store.set_base_fee(base_fee);
        let now = self.clock.now_millis();

        let mut results = Vec::with_capacity(txs.len());
        for tx in &txs {
            results.push(add_one(&mut inner, oracle, verifier, gas, head, is_london, now, tx, info));
        }

        let outcome = reconcile(&mut inner, oracle, chain, self.clock.as_ref(), evm);
        debug!(
            target: "txpool",
            "add: {} submitted, packed={} gas_used={}",
            txs.len(),
            outcome.packed.len(),
            outcome.gas_used
        );
        Ok(results)
    }

    /// Disposes the given ids, tagging each with [`RejectReason::User`]
    /// (spec.md §4.6 `disposeItems`). Returns how many were actually live.
    pub fn dispose_items<O, C, E>(&self, oracle: &O, chain: &C, evm: &mut E, ids: &[H256]) -> usize
    where
        O: StateOracle,
        C: ChainContext,
        E: EvmExecutor,
    {
        let mut inner = self.inner.write();
        let mut disposed = 0;
        for id in ids {
            if inner.store.dispose(*id, RejectReason::User).is_some() {
                inner.metrics.inc_reject(RejectReason::User);
                disposed += 1;
            }
        }
        if disposed > 0 {
            reconcile(&mut inner, oracle, chain, self.clock.as_ref(), evm);
        }
        disposed
    }

    /// Drops every waste-basket entry (spec.md §4.6 `flushRejects`).
    pub fn flush_rejects(&self) -> usize {
        self.inner.write().store.flush_rejects()
    }

    /// Moves a live item between lifecycle buckets without re-validating eligibility
    /// (spec.md §4.6 `reassign`). Does not itself trigger a buckets/packer pass: it is an
    /// explicit admin override, not one of the §4.3 triggers.
    pub fn reassign(&self, id: H256, new_status: Status) -> Result<()> {
        self.inner.write().store.reassign(id, new_status)
    }

    /// Accepts a new chain head (spec.md §4.6 `smartHead`): refreshes the base-fee snapshot and
    /// runs one full buckets-engine + packer pass. Returns `true` if the head actually changed
    /// (a repeated call with the same head is a no-op, matching the resolved Open Question in
    /// SPEC_FULL.md: this never replays retracted-block transactions back into the pool).
    pub fn smart_head<O, C, E>(&self, oracle: &O, chain: &C, evm: &mut E) -> bool
    where
        O: StateOracle,
        C: ChainContext,
        E: EvmExecutor,
    {
        let mut inner = self.inner.write();
        let head = chain.head();
        if inner.head == Some(head) {
            return false;
        }
        inner.head = Some(head);
        inner.store.set_base_fee(oracle.base_fee(head));
        let outcome = reconcile(&mut inner, oracle, chain, self.clock.as_ref(), evm);
        info!(target: "txpool", "accepted head {head:?}: packed={} gas_used={}", outcome.packed.len(), outcome.gas_used);
        true
    }

    /// Forces a buckets-engine + packer pass without changing the head (spec.md §4.6
    /// `triggerReorg`).
    pub fn trigger_reorg<O, C, E>(&self, oracle: &O, chain: &C, evm: &mut E) -> Result<()>
    where
        O: StateOracle,
        C: ChainContext,
        E: EvmExecutor,
    {
        let mut inner = self.inner.write();
        if inner.head.is_none() {
            return Err(Error::HeadUnknown(H256::zero()));
        }
        reconcile(&mut inner, oracle, chain, self.clock.as_ref(), evm);
        Ok(())
    }

    // --- read-only operations ------------------------------------------------------------------

    /// Looks up a live item by id (spec.md §4.6 `getItem`).
    pub fn get_item(&self, id: &H256) -> Result<Item> {
        self.inner.read().store.get(id).cloned().ok_or(Error::NotFound(*id))
    }

    /// All live items, optionally filtered to one lifecycle bucket (spec.md §4.6 `toItems`).
    pub fn to_items(&self, status: Option<Status>) -> Vec<Item> {
        let inner = self.inner.read();
        match status {
            Some(status) => inner.store.items_in_status(status).cloned().collect(),
            None => inner.store.iter().cloned().collect(),
        }
    }

    /// Per-bucket and waste-basket occupancy (spec.md §4.6 `nItems`, §3 invariants 5 & 7).
    pub fn n_items(&self) -> NItems {
        let inner = self.inner.read();
        NItems {
            pending: inner.store.count(Status::Pending),
            staged: inner.store.count(Status::Staged),
            packed: inner.store.count(Status::Packed),
            total: inner.store.len(),
            disposed: inner.store.basket().len(),
        }
    }

    /// Aggregate gas figures (spec.md §4.6 `gasTotals`).
    pub fn gas_totals(&self) -> GasTotals {
        let inner = self.inner.read();
        let staged_gas_limit = inner
            .store
            .items_in_status(Status::Staged)
            .fold(U256::zero(), |acc, item| acc.saturating_add(item.tx.gas_limit));
        GasTotals {
            staged_gas_limit,
            packed_gas_used: inner.last_pack.gas_used,
        }
    }

    /// `Σ effectiveTip × gasUsed` over the most recent packer pass (spec.md §4.6
    /// `profitability`, §4.4).
    pub fn profitability(&self) -> U256 {
        self.inner.read().last_pack.profitability
    }

    /// Total live item count (spec.md §4.6 `nItems.total`, kept as a cheap standalone query
    /// alongside the fuller [`TxPool::n_items`]).
    pub fn n_total(&self) -> usize {
        self.inner.read().store.len()
    }

    /// Next valid nonce for `sender`, if they have any live items
    /// (SPEC_FULL.md "Supplemented features").
    pub fn next_nonce(&self, sender: &Address) -> Option<U256> {
        self.inner.read().store.next_nonce(sender)
    }

    /// Assembles a block from the current `Packed` set (spec.md §4.6 `assembleBlock`, §6 "Block
    /// assembler output"). Does not itself run the packer -- call [`TxPool::smart_head`] or
    /// [`TxPool::trigger_reorg`] first to make sure the packed set is current.
    pub fn assemble_block(&self) -> Result<Block> {
        let inner = self.inner.read();
        let head = inner.head.ok_or(Error::HeadUnknown(H256::zero()))?;
        let txs: Vec<H256> = inner.store.items_in_status(Status::Packed).map(|item| item.id).collect();
        let gas_limit = if inner.options.flags.pack_items_max_gas_limit {
            inner.options.max_gas_limit
        } else {
            inner.options.trg_gas_limit
        };
        Ok(Block {
            header: BlockHeader {
                parent_hash: head,
                base_fee: inner.store.base_fee(),
                gas_used: inner.last_pack.gas_used,
                gas_limit,
            },
            txs,
            withdrawals: None,
        })
    }

    // --- setters (spec.md §6 "Configuration") ---------------------------------------------------

    /// Sets the base-fee snapshot used for rank ordering and classification, and invalidates any
    /// already-packed items (spec.md §4.4 "Re-pack"). Does not itself run the buckets engine or
    /// packer -- per spec.md §4.3, follow with `add(&[])` or `triggerReorg` to force the full
    /// reconciliation pass, since both require a `StateOracle`/`EvmExecutor` this setter does not
    /// take.
    pub fn set_base_fee(&self, base_fee: Option<U256>) {
        let mut inner = self.inner.write();
        inner.store.set_base_fee(base_fee);
        invalidate_packed(&mut inner.store);
        trace!(target: "txpool", "base fee set to {base_fee:?}");
    }

    /// Sets the minimum percent price increase required for a same-`(sender, nonce)`
    /// replacement to succeed (spec.md §6 `priceBump`).
    pub fn set_price_bump(&self, price_bump: u8) {
        self.inner.write().options.price_bump = price_bump;
    }

    /// Sets the zombification age threshold, in milliseconds (spec.md §6 `lifeTime`).
    pub fn set_life_time_millis(&self, life_time_millis: u64) {
        self.inner.write().options.life_time_millis = life_time_millis;
    }

    /// Sets the waste-basket capacity (spec.md §6 `maxRejects`).
    pub fn set_max_rejects(&self, max_rejects: usize) {
        let mut inner = self.inner.write();
        inner.options.max_rejects = max_rejects;
        inner.store.set_max_rejects(max_rejects);
    }

    /// Sets the pre-London minimal gas price (spec.md §6 `minPreLondonGasPrice`).
    pub fn set_min_pre_london_gas_price(&self, value: U256) {
        self.inner.write().options.min_pre_london_gas_price = value;
    }

    /// Sets the post-London minimal priority fee (spec.md §6 `minPriorityFee`).
    pub fn set_min_priority_fee(&self, value: U256) {
        self.inner.write().options.min_priority_fee = value;
    }

    /// Sets the packer's default gas target (spec.md §6 `trgGasLimit`).
    pub fn set_trg_gas_limit(&self, value: u64) {
        self.inner.write().options.trg_gas_limit = value;
    }

    /// Sets the packer's hard gas ceiling, used when `packItemsMaxGasLimit` is set
    /// (spec.md §6 `maxGasLimit`).
    pub fn set_max_gas_limit(&self, value: u64) {
        self.inner.write().options.max_gas_limit = value;
    }

    /// Replaces the behavioural flag set (spec.md §6 `flags`).
    pub fn set_flags(&self, flags: Flags) {
        self.inner.write().options.flags = flags;
    }

    /// Replaces the set of accounts treated as local (spec.md §6 `localAccounts`).
    pub fn set_local_accounts(&self, accounts: HashSet<Address>) {
        self.inner.write().options.local_accounts = accounts;
    }
}

#[allow(clippy::too_many_arguments)]
fn add_one<O, V, G>(
    inner: &mut Inner,
    oracle: &O,
    verifier: &V,
    gas: &G,
    head: H256,
    is_london: bool,
    now: u64,
    tx: &Transaction,
    info: Option<&str>,
) -> Result<H256>
where
    O: StateOracle,
    V: SignatureVerifier,
    G: GasEstimator,
{
    let hash = tx.hash;
    if inner.store.contains(&hash) {
        return Err(Error::Duplicate(hash));
    }
    if !is_london && tx.kind == TxType::Eip1559 {
        return Err(Error::InvalidType(hash));
    }

    let sender = verifier.recover(tx).ok_or(Error::SenderUnknown(hash))?;

    let intrinsic = gas.intrinsic_gas(tx);
    if tx.gas_limit < intrinsic {
        return Err(Error::GasLimitTooLow {
            hash,
            minimal: intrinsic,
            got: tx.gas_limit,
        });
    }

    let balance = oracle.account_balance(&sender, head).ok_or(Error::HeadUnknown(head))?;
    let cost = tx.cost();
    if balance < cost {
        return Err(Error::InsufficientFunds { hash, cost, balance });
    }

    // Peek (don't yet remove) a waste-basket entry for resurrection: the basket entry must stay
    // in place until `insert` below actually succeeds, or a same-(sender, nonce) collision would
    // strip the old item out of the basket and then drop it on the floor when `?` propagates
    // (spec.md §3 invariant 1, "every Item appears in exactly one of {live store, waste basket}").
    let resurrected_info = inner.store.basket().get(&hash).map(|old| old.info.clone());
    let info = resurrected_info
        .clone()
        .unwrap_or_else(|| info.unwrap_or_default().to_string());
    let local = inner.options.local_accounts.contains(&sender);

    let item = Item {
        id: hash,
        tx: tx.clone(),
        sender,
        time_stamp: now,
        status: Status::Pending,
        info,
        reject: None,
        local,
        insertion_id: 0,
    };

    let is_replace = inner
        .store
        .sender_bucket(&sender)
        .and_then(|bucket| bucket.id_at(tx.nonce))
        .is_some();
    if !is_replace && inner.store.len() >= inner.options.max_count {
        make_room(inner, &item)?;
    }

    let is_new_sender = inner.store.sender_bucket(&sender).is_none();
    let onchain_nonce = if is_new_sender {
        oracle.account_nonce(&sender, head).ok_or(Error::HeadUnknown(head))?
    } else {
        U256::zero()
    };

    let price_bump = inner.options.price_bump;
    let inserted = inner.store.insert(item, onchain_nonce, price_bump)?;
    if resurrected_info.is_some() {
        inner.store.take_from_basket(&hash);
    }
    if !inserted.disposed.is_empty() {
        inner.metrics.inc_supersede();
        for disposed_id in &inserted.disposed {
            if let Some(reason) = inner.store.basket().get(disposed_id).and_then(|item| item.reject) {
                inner.metrics.inc_reject(reason);
            }
        }
    }
    Ok(inserted.id)
}

/// Pool-capacity limit on the live store (SPEC_FULL.md "Supplemented features" #1): when full,
/// the lowest-ranked item is compared against `incoming` using the supersede threshold; it is
/// evicted as `PoolFull` if it loses, else `incoming` itself is rejected as `PoolFull`.
fn make_room(inner: &mut Inner, incoming: &Item) -> Result<()> {
    let base_fee = inner.store.base_fee();
    let new_tip = incoming.effective_tip(base_fee);
    let worst = inner
        .store
        .rank_ascending()
        .next()
        .map(|worst| (worst.id, worst.effective_tip(base_fee)));
    match worst {
        Some((worst_id, worst_tip)) => {
            let threshold = worst_tip.saturating_mul(U256::from(100 + inner.options.price_bump as u64));
            if new_tip.saturating_mul(U256::from(100u64)) >= threshold {
                inner.store.dispose(worst_id, RejectReason::PoolFull);
                inner.metrics.inc_reject(RejectReason::PoolFull);
                Ok(())
            } else {
                Err(Error::PoolFull(incoming.id))
            }
        }
        None => Err(Error::PoolFull(incoming.id)),
    }
}

/// One buckets-engine pass followed by one packer pass (spec.md §4.3, §4.4). The packed set is
/// always cleared back to `Staged` first, which gives both idempotence (spec.md §8 "Packer
/// idempotence") and cancellation (spec.md §5: a prior pass's partial `packed` additions are
/// rolled back before a new one proceeds) for free, since every mutating façade call runs this
/// function to completion before returning.
fn reconcile<O, C, E>(inner: &mut Inner, oracle: &O, chain: &C, clock: &dyn Clock, evm: &mut E) -> PackResult
where
    O: StateOracle,
    C: ChainContext,
    E: EvmExecutor,
{
    trace_time!("pool::reconcile");
    let before: HashSet<H256> = inner.store.basket().iter().map(|(id, _)| *id).collect();

    buckets::run(&mut inner.store, oracle, chain, clock, &inner.options);
    invalidate_packed(&mut inner.store);

    let head = chain.head();
    let base_fee = inner.store.base_fee();
    let result = packer::run(&mut inner.store, evm, head, base_fee, &inner.options);

    for (id, item) in inner.store.basket().iter() {
        if before.contains(id) {
            continue;
        }
        if let Some(reason) = item.reject {
            inner.metrics.inc_reject(reason);
            if reason == RejectReason::Expired {
                inner.metrics.inc_zombify();
            }
        }
    }

    inner.metrics.inc_repack();
    inner.last_pack = result.clone();
    result
}

fn invalidate_packed(store: &mut MultiIndexStore) {
    let packed: Vec<H256> = store.items_in_status(Status::Packed).map(|item| item.id).collect();
    for id in packed {
        let _ = store.reassign(id, Status::Staged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ExecOutcome;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct TestOracle {
        nonces: Mutex<HashMap<Address, U256>>,
        balances: HashMap<Address, U256>,
        base_fee: Option<U256>,
    }

    impl StateOracle for TestOracle {
        fn account_nonce(&self, addr: &Address, _head: H256) -> Option<U256> {
            self.nonces.lock().unwrap().get(addr).copied()
        }
        fn account_balance(&self, addr: &Address, _head: H256) -> Option<U256> {
            self.balances.get(addr).copied()
        }
        fn base_fee(&self, _head: H256) -> Option<U256> {
            self.base_fee
        }
    }

    struct TestChain {
        head: H256,
        london: bool,
    }

    impl ChainContext for TestChain {
        fn head(&self) -> H256 {
            self.head
        }
        fn is_london(&self, _head: H256) -> bool {
            self.london
        }
        fn chain_id(&self) -> u64 {
            1
        }
    }

    struct TestVerifier {
        senders: HashMap<H256, Address>,
    }

    impl SignatureVerifier for TestVerifier {
        fn recover(&self, tx: &Transaction) -> Option<Address> {
            self.senders.get(&tx.hash).copied()
        }
    }

    struct TestGas;

    impl GasEstimator for TestGas {
        fn intrinsic_gas(&self, _tx: &Transaction) -> U256 {
            U256::from(21_000u64)
        }
    }

    struct TestEvm {
        budget: u64,
    }

    impl EvmExecutor for TestEvm {
        fn dry_run(&mut self, tx: &Transaction, _head: H256, gas_remaining: u64) -> ExecOutcome {
            let needed = tx.gas_limit.as_u64();
            if needed > gas_remaining || needed > self.budget {
                ExecOutcome::OutOfGas
            } else {
                self.budget -= needed;
                ExecOutcome::Applied(needed)
            }
        }
    }

    fn addr(byte: u8) -> Address {
        Address::from_low_u64_be(byte as u64)
    }

    fn id(byte: u8) -> H256 {
        H256::from_low_u64_be(byte as u64)
    }

    fn tx(sender_byte: u8, nonce: u64, gas_price: u64, hash_seed: u8) -> (Transaction, Address) {
        let sender = addr(sender_byte);
        (
            Transaction {
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
        )
    }

    struct Harness {
        pool: TxPool,
        clock: Arc<crate::clock::ManualClock>,
        oracle: TestOracle,
        chain: TestChain,
        verifier: TestVerifier,
        gas: TestGas,
        evm: TestEvm,
    }

    impl Harness {
        fn new() -> Self {
            let clock = Arc::new(crate::clock::ManualClock::new(0));
            Harness {
                pool: TxPool::new(Options::default(), clock.clone()),
                clock,
                oracle: TestOracle {
                    nonces: Mutex::new(HashMap::new()),
                    balances: HashMap::new(),
                    base_fee: None,
                },
                chain: TestChain {
                    head: id(1),
                    london: false,
                },
                verifier: TestVerifier { senders: HashMap::new() },
                gas: TestGas,
                evm: TestEvm { budget: 10_000_000 },
            }
        }

        fn fund(&mut self, sender: Address, nonce: u64, balance: u64) {
            self.oracle.nonces.lock().unwrap().insert(sender, U256::from(nonce));
            self.oracle.balances.insert(sender, U256::from(balance));
        }

        fn register(&mut self, hash: H256, sender: Address) {
            self.verifier.senders.insert(hash, sender);
        }

        fn add(&mut self, txs: Vec<Transaction>) -> Result<Vec<Result<H256>>> {
            self.pool
                .add(&self.oracle, &self.chain, &self.verifier, &self.gas, &mut self.evm, txs, None)
        }
    }

    #[test]
    fn accepts_then_stages_and_packs_a_transaction() {
        let mut h = Harness::new();
        let a = addr(1);
        h.fund(a, 0, 10_000_000);
        let (t, sender) = tx(1, 0, 10, 1);
        h.register(t.hash, sender);

        assert!(h.pool.smart_head(&h.oracle, &h.chain, &mut h.evm));
        let results = h.add(vec![t]).unwrap();
        assert!(results[0].is_ok());

        assert_eq!(h.pool.n_items().total, 1);
        assert_eq!(h.pool.n_items().packed, 1);
        let items = h.pool.to_items(Some(Status::Packed));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, id(1));
    }

    #[test]
    fn insufficient_balance_is_rejected_at_add_time() {
        let mut h = Harness::new();
        let a = addr(1);
        h.fund(a, 0, 100);
        let (t, sender) = tx(1, 0, 10, 1);
        h.register(t.hash, sender);

        assert!(h.pool.smart_head(&h.oracle, &h.chain, &mut h.evm));
        let results = h.add(vec![t]).unwrap();
        assert!(matches!(results[0], Err(Error::InsufficientFunds { .. })));
        assert_eq!(h.pool.n_items().total, 0);
    }

    #[test]
    fn underpriced_replacement_is_rejected_without_state_change() {
        let mut h = Harness::new();
        let a = addr(1);
        h.fund(a, 0, 10_000_000);
        h.chain.head = id(1);

        let (low, sender) = tx(1, 0, 100, 1);
        h.register(low.hash, sender);
        assert!(h.pool.smart_head(&h.oracle, &h.chain, &mut h.evm));
        h.add(vec![low]).unwrap();

        let (weak_bump, sender2) = tx(1, 0, 105, 2);
        h.register(weak_bump.hash, sender2);
        let results = h.add(vec![weak_bump]).unwrap();
        assert!(matches!(results[0], Err(Error::Underpriced { .. })));

        assert!(h.pool.get_item(&id(1)).is_ok());
        assert!(h.pool.get_item(&id(2)).is_err());
    }

    #[test]
    fn a_price_bumped_replacement_cascades_higher_nonces() {
        let mut h = Harness::new();
        let a = addr(1);
        h.fund(a, 0, 10_000_000);
        h.chain.head = id(1);
        assert!(h.pool.smart_head(&h.oracle, &h.chain, &mut h.evm));

        let (t0, s0) = tx(1, 0, 100, 1);
        h.register(t0.hash, s0);
        let (t1, s1) = tx(1, 1, 100, 2);
        h.register(t1.hash, s1);
        h.add(vec![t0, t1]).unwrap();

        let (replacement, s2) = tx(1, 0, 200, 3);
        h.register(replacement.hash, s2);
        let results = h.add(vec![replacement]).unwrap();
        assert!(results[0].is_ok());

        assert!(h.pool.get_item(&id(1)).is_err());
        assert!(h.pool.get_item(&id(2)).is_err());
        assert!(h.pool.get_item(&id(3)).is_ok());
        assert_eq!(h.pool.n_items().total, 1);
    }

    #[test]
    fn zombifies_stale_pending_items_on_an_empty_add() {
        let mut h = Harness::new();
        let a = addr(1);
        // on-chain nonce 0, balance plentiful: the tx below (nonce 5) is funded fine but stays
        // `Pending` on the nonce gap alone, not on an (unrelated) balance shortfall.
        h.fund(a, 0, 10_000_000);
        h.chain.head = id(1);
        assert!(h.pool.smart_head(&h.oracle, &h.chain, &mut h.evm));

        let (t, sender) = tx(1, 5, 10, 1);
        h.register(t.hash, sender);
        h.add(vec![t]).unwrap();
        assert_eq!(h.pool.to_items(Some(Status::Pending)).len(), 1);

        h.pool.set_life_time_millis(1_000);
        h.pool.set_flags(Flags {
            auto_zombify_unpacked: true,
            ..Flags::default()
        });

        assert_eq!(h.pool.n_items().total, 1);
        h.clock.advance(2_000);
        h.add(Vec::new()).unwrap();
        assert_eq!(h.pool.n_items().total, 0);
        assert_eq!(h.pool.n_items().disposed, 1);
    }

    #[test]
    fn next_nonce_reflects_the_highest_live_item() {
        let mut h = Harness::new();
        let a = addr(1);
        h.fund(a, 0, 10_000_000);
        h.chain.head = id(1);
        assert!(h.pool.smart_head(&h.oracle, &h.chain, &mut h.evm));

        let (t0, s0) = tx(1, 0, 10, 1);
        h.register(t0.hash, s0);
        let (t1, s1) = tx(1, 1, 10, 2);
        h.register(t1.hash, s1);
        h.add(vec![t0, t1]).unwrap();

        assert_eq!(h.pool.next_nonce(&a), Some(U256::from(2u64)));
    }

    #[test]
    fn assemble_block_reflects_the_packed_set() {
        let mut h = Harness::new();
        let a = addr(1);
        h.fund(a, 0, 10_000_000);
        h.chain.head = id(7);
        assert!(h.pool.smart_head(&h.oracle, &h.chain, &mut h.evm));

        let (t, sender) = tx(1, 0, 10, 1);
        h.register(t.hash, sender);
        h.add(vec![t]).unwrap();

        let block = h.pool.assemble_block().unwrap();
        assert_eq!(block.header.parent_hash, id(7));
        assert_eq!(block.txs, vec![id(1)]);
        assert!(block.withdrawals.is_none());
    }
}
