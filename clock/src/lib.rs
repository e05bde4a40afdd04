//! A [`Stream`]-based epoch timer aligned to the genesis time of a consensus network.
//!
//! # Implementation
//!
//! The stream computes the start of the next epoch from wall time and sleeps until then.
//! Some subtleties to keep in mind:
//!
//! - Timers in [`tokio::time`] use [`Instant`]s, which cannot be converted from Unix time.
//!   Sleeping for a precomputed [`Duration`] would drift if the system clock is adjusted, so waits
//!   are capped at one slot and wall time is read again after every wake-up. A clock that jumps
//!   forward is noticed within a slot.
//!
//! - A clock that moves backward never causes an epoch to be produced twice. The stream remembers
//!   the next epoch it will produce and waits for wall time to catch up to it.
//!
//! - If wall time skips past several epoch boundaries, the missed epochs are produced in order
//!   without any delay between them.
//!
//! [`Instant`]: tokio::time::Instant

use core::time::Duration;
use std::{sync::Arc, time::SystemTime};

use anyhow::Result;
use futures::stream::{self, Stream};
use thiserror::Error;
use types::{
    config::Config,
    phase0::{
        consts::GENESIS_EPOCH,
        primitives::{Epoch, UnixSeconds},
    },
};

#[cfg(test)]
mod fake_time;

/// Source of Unix time.
pub trait WallClock: Send + Sync + 'static {
    fn since_unix_epoch(&self) -> Result<Duration>;
}

impl<C: WallClock + ?Sized> WallClock for Arc<C> {
    fn since_unix_epoch(&self) -> Result<Duration> {
        C::since_unix_epoch(self)
    }
}

#[derive(Clone, Copy, Default, Debug)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn since_unix_epoch(&self) -> Result<Duration> {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(Into::into)
    }
}

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum ClockError {
    #[error("start of epoch {epoch} overflowed")]
    EpochStartOverflow { epoch: Epoch },
    #[error("ran out of epochs")]
    RanOutOfEpochs,
}

/// Returns `None` if `since_unix_epoch` is before genesis.
#[must_use]
pub fn epoch_at_time(
    config: &Config,
    genesis_time: UnixSeconds,
    since_unix_epoch: Duration,
) -> Option<Epoch> {
    let seconds_since_genesis = since_unix_epoch
        .checked_sub(Duration::from_secs(genesis_time))?
        .as_secs();

    // Dividing twice gives the same result as dividing by the epoch duration without overflowing.
    let slots_since_genesis = seconds_since_genesis / config.seconds_per_slot;

    Some(slots_since_genesis / config.slots_per_epoch)
}

/// Returns the time at which `epoch` starts as a [`Duration`] after the Unix epoch.
pub fn epoch_start(config: &Config, genesis_time: UnixSeconds, epoch: Epoch) -> Result<Duration> {
    let seconds = epoch
        .checked_mul(config.slots_per_epoch.get())
        .and_then(|slots| slots.checked_mul(config.seconds_per_slot.get()))
        .and_then(|seconds| seconds.checked_add(genesis_time))
        .ok_or(ClockError::EpochStartOverflow { epoch })?;

    Ok(Duration::from_secs(seconds))
}

/// Produces epochs at their start according to the system clock.
///
/// See [`epochs_with_clock`].
pub fn epochs(
    config: Config,
    genesis_time: UnixSeconds,
) -> impl Stream<Item = Result<Epoch>> + Send {
    epochs_with_clock(config, genesis_time, SystemClock)
}

/// Produces epochs at their start according to `wall_clock`.
///
/// If the stream is created after genesis, the current epoch is produced immediately.
/// Otherwise the first item is [`GENESIS_EPOCH`] at genesis. The stream ends after the first error.
pub fn epochs_with_clock(
    config: Config,
    genesis_time: UnixSeconds,
    wall_clock: impl WallClock,
) -> impl Stream<Item = Result<Epoch>> + Send {
    let state = EpochTimer {
        config,
        genesis_time,
        wall_clock,
        next_epoch: None,
    };

    stream::try_unfold(state, |mut timer| async move {
        let epoch = timer.wait_for_next_epoch().await?;
        Ok(Some((epoch, timer)))
    })
}

struct EpochTimer<C> {
    config: Config,
    genesis_time: UnixSeconds,
    wall_clock: C,
    next_epoch: Option<Epoch>,
}

impl<C: WallClock> EpochTimer<C> {
    async fn wait_for_next_epoch(&mut self) -> Result<Epoch> {
        let epoch = match self.next_epoch {
            Some(epoch) => epoch,
            None => {
                let now = self.wall_clock.since_unix_epoch()?;
                epoch_at_time(&self.config, self.genesis_time, now).unwrap_or(GENESIS_EPOCH)
            }
        };

        let start = epoch_start(&self.config, self.genesis_time, epoch)?;

        loop {
            let now = self.wall_clock.since_unix_epoch()?;

            let Some(remaining) = start.checked_sub(now).filter(|remaining| !remaining.is_zero())
            else {
                break;
            };

            tokio::time::sleep(remaining.min(self.config.slot_duration())).await;
        }

        self.next_epoch = Some(epoch.checked_add(1).ok_or(ClockError::RanOutOfEpochs)?);

        Ok(epoch)
    }
}
