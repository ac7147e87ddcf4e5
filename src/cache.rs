//! Memoization of basket analyses keyed by a content fingerprint

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use log::debug;
use sha2::{Digest, Sha256};

use crate::analysis::{run_basket_analysis, BasketAnalysis};
use crate::config::BasketParams;
use crate::data::TransactionRecord;
use crate::error::DashboardError;

type Outcome = Result<Arc<BasketAnalysis>, DashboardError>;

/// Cache of basket analyses, one entry per (dataset content, parameters).
///
/// Each key owns a `OnceLock` slot. The map lock is only held while the slot
/// is looked up, so distinct keys compute concurrently while callers asking
/// for the same key wait for the single in-flight computation. A slot is
/// either empty or holds a finished outcome.
///
/// Successful analyses are kept for the lifetime of the cache, one per
/// distinct (records, parameters) pair. A failed analysis is handed to every
/// caller that was already waiting on it, then evicted so the next request
/// computes again.
#[derive(Debug, Default)]
pub struct BasketCache {
    slots: Mutex<HashMap<String, Arc<OnceLock<Outcome>>>>,
    computations: AtomicUsize,
}

impl BasketCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached analysis for this input, computing it at most once
    pub fn get_or_compute(
        &self,
        records: &[TransactionRecord],
        params: &BasketParams,
    ) -> Outcome {
        let key = fingerprint(records, params);

        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        if slot.get().is_some() {
            debug!("Basket analysis cache hit for {}", &key[..12]);
        }

        let outcome = slot
            .get_or_init(|| {
                self.computations.fetch_add(1, Ordering::SeqCst);
                debug!("Basket analysis cache miss for {}", &key[..12]);
                run_basket_analysis(records, params).map(Arc::new)
            })
            .clone();

        if outcome.is_err() {
            self.evict(&key, &slot);
        }
        outcome
    }

    /// Drop `slot` from the table unless a newer slot already replaced it
    fn evict(&self, key: &str, slot: &Arc<OnceLock<Outcome>>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            slots.remove(key);
            debug!("Evicted failed basket analysis {}", &key[..12]);
        }
    }

    /// Number of analyses actually run since creation
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }
}

/// SHA-256 over the fields the analysis reads plus its parameters, hex encoded.
///
/// Strings are length-prefixed so field boundaries cannot collide.
pub fn fingerprint(records: &[TransactionRecord], params: &BasketParams) -> String {
    let mut hasher = Sha256::new();

    update_str(&mut hasher, &params.country);
    hasher.update(params.min_support.to_bits().to_le_bytes());
    hasher.update(params.min_lift.to_bits().to_le_bytes());

    hasher.update((records.len() as u64).to_le_bytes());
    for record in records {
        update_str(&mut hasher, &record.invoice);
        update_str(&mut hasher, &record.description);
        hasher.update(record.quantity.to_bits().to_le_bytes());
        update_str(&mut hasher, &record.country);
    }

    hex::encode(hasher.finalize())
}

fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}
