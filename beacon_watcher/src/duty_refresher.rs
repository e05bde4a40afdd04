use core::pin::pin;
use std::sync::Arc;

use anyhow::{ensure, Result};
use beacon_api::{BeaconApi, NodeResponse};
use consensus_cache::ConsensusDataCache;
use futures::stream::{Stream, StreamExt as _};
use logging::{debug_with_head, info_with_head, warn_with_head, HEAD_LOG_METRICS};
use prometheus_metrics::Metrics;
use strum::AsRefStr;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use types::{
    api::ProposerDutiesResponse,
    config::Config as ChainConfig,
    misc,
    phase0::primitives::{Epoch, ValidatorIndex},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RefreshOutcome {
    Stored,
    Syncing,
    Failed,
    Rejected,
}

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
enum DutyError {
    #[error("expected {expected} proposer duties for epoch {epoch}, received {actual}")]
    WrongCount {
        epoch: Epoch,
        expected: u64,
        actual: usize,
    },
    #[error("proposer duties for epoch {epoch} do not cover each of its slots exactly once")]
    SlotsDoNotMatchEpoch { epoch: Epoch },
}

/// Keeps the proposer duties of the current epoch in the cache.
pub struct DutyRefresher {
    api: Arc<BeaconApi>,
    cache: Arc<ConsensusDataCache>,
    chain_config: ChainConfig,
    metrics: Option<Arc<Metrics>>,
}

impl DutyRefresher {
    #[must_use]
    pub const fn new(
        api: Arc<BeaconApi>,
        cache: Arc<ConsensusDataCache>,
        chain_config: ChainConfig,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            api,
            cache,
            chain_config,
            metrics,
        }
    }

    /// Refreshes duties for every epoch produced by `epochs`.
    ///
    /// Returns `Ok` when cancelled or when `epochs` ends. Errors from `epochs` are returned.
    pub async fn run(
        &self,
        epochs: impl Stream<Item = Result<Epoch>>,
        token: &CancellationToken,
    ) -> Result<()> {
        let mut epochs = pin!(epochs);

        loop {
            let epoch = tokio::select! {
                biased;

                () = token.cancelled() => return Ok(()),
                epoch = epochs.next() => epoch,
            };

            let Some(epoch) = epoch.transpose()? else {
                return Ok(());
            };

            HEAD_LOG_METRICS.set_current_epoch(epoch);

            debug_with_head!("refreshing proposer duties for epoch {epoch}");

            tokio::select! {
                biased;

                () = token.cancelled() => return Ok(()),
                _ = self.refresh(epoch) => {}
            }
        }
    }

    /// Fetches the proposer duties of `epoch` and stores them if they are complete.
    ///
    /// Failures are logged and leave the cache untouched.
    pub async fn refresh(&self, epoch: Epoch) -> RefreshOutcome {
        let outcome = match self.api.proposer_duties(epoch).await {
            Ok(NodeResponse::Ready(response)) => match self.store(epoch, &response) {
                Ok(()) => RefreshOutcome::Stored,
                Err(error) => {
                    warn_with_head!("rejected proposer duties for epoch {epoch}: {error}");
                    RefreshOutcome::Rejected
                }
            },
            Ok(NodeResponse::Syncing) => {
                warn_with_head!("beacon node is syncing, skipping duties of epoch {epoch}");
                RefreshOutcome::Syncing
            }
            Err(error) => {
                warn_with_head!("unable to fetch proposer duties for epoch {epoch}: {error:?}");
                RefreshOutcome::Failed
            }
        };

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.register_proposer_duty_refresh(outcome.as_ref());
        }

        outcome
    }

    fn store(&self, epoch: Epoch, response: &ProposerDutiesResponse) -> Result<()> {
        let proposers = validate_duties(&self.chain_config, epoch, response)?;

        // Duties are not compared across dependent roots. A reorg that changes them is only picked
        // up at the next epoch.
        info_with_head!(
            "stored proposer duties for epoch {epoch} \
             (dependent root: {:?}, execution optimistic: {})",
            response.dependent_root,
            response.execution_optimistic,
        );

        self.cache.insert_proposer_duties(epoch, proposers);

        Ok(())
    }
}

/// Returns proposers ordered by slot if `response` assigns exactly one to every slot of `epoch`.
fn validate_duties(
    config: &ChainConfig,
    epoch: Epoch,
    response: &ProposerDutiesResponse,
) -> Result<Vec<ValidatorIndex>> {
    let mut duties = response.data.iter().collect::<Vec<_>>();

    ensure!(
        u64::try_from(duties.len()) == Ok(config.slots_per_epoch.get()),
        DutyError::WrongCount {
            epoch,
            expected: config.slots_per_epoch.get(),
            actual: duties.len(),
        },
    );

    duties.sort_unstable_by_key(|duty| duty.slot);

    ensure!(
        duties
            .iter()
            .map(|duty| duty.slot)
            .eq(misc::slots_in_epoch(config, epoch)),
        DutyError::SlotsDoNotMatchEpoch { epoch },
    );

    Ok(duties.into_iter().map(|duty| duty.validator_index).collect())
}
