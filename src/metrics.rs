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

//! Counters for spec.md §2 item 8 ("Metrics & Verify").
//!
//! This crate has no HTTP surface of its own (the metrics-server/RPC surface is out of scope
//! per spec.md §1), so it exposes a `PrometheusMetrics` trait for a caller (e.g. the node's own
//! metrics endpoint) to invoke, the same shape `ethcore`/`sync` implement against the teacher's
//! `parity-util-stats` crate -- built here directly against `prometheus` since that internal
//! crate is not a published dependency.

use crate::item::RejectReason;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::atomic::{AtomicU64, Ordering};

/// Registers this type's counters into a caller-owned `prometheus::Registry`
/// (mirrors the teacher's `stats::PrometheusMetrics`).
pub trait PrometheusMetrics {
    /// Registers this type's counters into `registry`, under `prefix`.
    fn prometheus_metrics(&self, prefix: &str, registry: &Registry);
}

/// Pool-wide counters, updated as a side effect of store/buckets/packer operations
/// (spec.md §2 item 8).
#[derive(Debug, Default)]
pub struct Metrics {
    supersede: AtomicU64,
    zombify: AtomicU64,
    repack: AtomicU64,
    reject_user: AtomicU64,
    reject_replaced: AtomicU64,
    reject_nonce_gap: AtomicU64,
    reject_nonce_too_low: AtomicU64,
    reject_expired: AtomicU64,
    reject_vm_exec_error: AtomicU64,
    reject_pool_full: AtomicU64,
}

impl Metrics {
    /// Creates a zeroed counter set.
    pub fn new() -> Self {
        Metrics::default()
    }

    /// Records one `supersede` acceptance (spec.md §4.1).
    pub fn inc_supersede(&self) {
        self.supersede.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one zombification (GLOSSARY "Zombify").
    pub fn inc_zombify(&self) {
        self.zombify.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one packer re-pack pass (spec.md §4.4 "Re-pack").
    pub fn inc_repack(&self) {
        self.repack.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one disposal, bucketed by reason.
    pub fn inc_reject(&self, reason: RejectReason) {
        let counter = match reason {
            RejectReason::User => &self.reject_user,
            RejectReason::Replaced => &self.reject_replaced,
            RejectReason::NonceGap => &self.reject_nonce_gap,
            RejectReason::NonceTooLow => &self.reject_nonce_too_low,
            RejectReason::Expired => &self.reject_expired,
            RejectReason::VmExecError => &self.reject_vm_exec_error,
            RejectReason::PoolFull => &self.reject_pool_full,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn reject_total(&self) -> u64 {
        self.reject_user.load(Ordering::Relaxed)
            + self.reject_replaced.load(Ordering::Relaxed)
            + self.reject_nonce_gap.load(Ordering::Relaxed)
            + self.reject_nonce_too_low.load(Ordering::Relaxed)
            + self.reject_expired.load(Ordering::Relaxed)
            + self.reject_vm_exec_error.load(Ordering::Relaxed)
            + self.reject_pool_full.load(Ordering::Relaxed)
    }
}

impl PrometheusMetrics for Metrics {
    fn prometheus_metrics(&self, prefix: &str, registry: &Registry) {
        let supersede = IntCounter::with_opts(
            Opts::new(format!("{prefix}_supersede_total"), "accepted same-nonce replacements"),
        )
        .expect("metric name and help are non-empty");
        supersede.inc_by(self.supersede.load(Ordering::Relaxed));
        let _ = registry.register(Box::new(supersede));

        let zombify = IntCounter::with_opts(Opts::new(
            format!("{prefix}_zombify_total"),
            "items moved to the waste basket for exceeding lifeTime",
        ))
        .expect("metric name and help are non-empty");
        zombify.inc_by(self.zombify.load(Ordering::Relaxed));
        let _ = registry.register(Box::new(zombify));

        let repack = IntCounter::with_opts(Opts::new(
            format!("{prefix}_repack_total"),
            "packer passes run",
        ))
        .expect("metric name and help are non-empty");
        repack.inc_by(self.repack.load(Ordering::Relaxed));
        let _ = registry.register(Box::new(repack));

        let rejects = IntCounterVec::new(
            Opts::new(format!("{prefix}_reject_total"), "disposals by reason"),
            &["reason"],
        )
        .expect("metric name and help are non-empty");
        rejects.with_label_values(&["user"]).inc_by(self.reject_user.load(Ordering::Relaxed));
        rejects
            .with_label_values(&["replaced"])
            .inc_by(self.reject_replaced.load(Ordering::Relaxed));
        rejects
            .with_label_values(&["nonce_gap"])
            .inc_by(self.reject_nonce_gap.load(Ordering::Relaxed));
        rejects
            .with_label_values(&["nonce_too_low"])
            .inc_by(self.reject_nonce_too_low.load(Ordering::Relaxed));
        rejects
            .with_label_values(&["expired"])
            .inc_by(self.reject_expired.load(Ordering::Relaxed));
        rejects
            .with_label_values(&["vm_exec_error"])
            .inc_by(self.reject_vm_exec_error.load(Ordering::Relaxed));
        rejects
            .with_label_values(&["pool_full"])
            .inc_by(self.reject_pool_full.load(Ordering::Relaxed));
        let _ = registry.register(Box::new(rejects));
    }
}
