//! Bounded in-memory store of data derived from the consensus chain.
//!
//! Entries are keyed by epoch and evicted in least-recently-used order. Nothing is persisted.

use core::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use nonzero_ext::nonzero;
use parking_lot::Mutex;
use prometheus_metrics::Metrics;
use types::{
    config::Config,
    misc,
    phase0::primitives::{Epoch, Slot, ValidatorIndex},
};

pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = nonzero!(4096_usize);

/// Proposers of every slot in an epoch, ordered by slot.
pub type ProposerDuties = Arc<[ValidatorIndex]>;

pub struct ConsensusDataCache {
    // Lookups update recency, so even reads need exclusive access.
    proposer_duties: Mutex<LruCache<Epoch, ProposerDuties>>,
    metrics: Option<Arc<Metrics>>,
}

impl Default for ConsensusDataCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, None)
    }
}

impl ConsensusDataCache {
    #[must_use]
    pub fn new(capacity: NonZeroUsize, metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            proposer_duties: Mutex::new(LruCache::new(capacity)),
            metrics,
        }
    }

    /// Returns the proposers of `epoch` if they are cached.
    ///
    /// Every call counts as either a hit or a miss.
    #[must_use]
    pub fn proposer_duties(&self, epoch: Epoch) -> Option<ProposerDuties> {
        let duties = self.proposer_duties.lock().get(&epoch).cloned();

        if let Some(metrics) = self.metrics.as_ref() {
            if duties.is_some() {
                metrics.consensus_data_cache_hit.inc();
            } else {
                metrics.consensus_data_cache_miss.inc();
            }
        }

        duties
    }

    /// Stores the proposers of `epoch`, replacing any earlier entry for it.
    ///
    /// If the cache is full, the least recently used entry is evicted.
    pub fn insert_proposer_duties(&self, epoch: Epoch, duties: impl Into<ProposerDuties>) {
        self.proposer_duties.lock().put(epoch, duties.into());
    }

    /// Returns the proposer of `slot` if the duties of its epoch are cached.
    #[must_use]
    pub fn proposer_at_slot(&self, config: &Config, slot: Slot) -> Option<ValidatorIndex> {
        let epoch = misc::compute_epoch_at_slot(config, slot);
        let index = usize::try_from(misc::slot_index_in_epoch(config, slot)).ok()?;

        self.proposer_duties(epoch)?.get(index).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.proposer_duties.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proposer_duties.lock().is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> NonZeroUsize {
        self.proposer_duties.lock().cap()
    }
}
