use core::{num::NonZeroU64, time::Duration};

use crate::phase0::consts::{
    MAINNET_SECONDS_PER_SLOT, MAINNET_SLOTS_PER_EPOCH, MINIMAL_SECONDS_PER_SLOT,
    MINIMAL_SLOTS_PER_EPOCH,
};

/// Timing parameters of the consensus network being monitored.
///
/// Genesis time is deliberately not part of this. It is passed separately to everything that
/// needs it, the same way it would be obtained from a beacon node at runtime.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Config {
    pub seconds_per_slot: NonZeroU64,
    pub slots_per_epoch: NonZeroU64,
}

impl Default for Config {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl Config {
    #[must_use]
    pub const fn mainnet() -> Self {
        Self {
            seconds_per_slot: MAINNET_SECONDS_PER_SLOT,
            slots_per_epoch: MAINNET_SLOTS_PER_EPOCH,
        }
    }

    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            seconds_per_slot: MINIMAL_SECONDS_PER_SLOT,
            slots_per_epoch: MINIMAL_SLOTS_PER_EPOCH,
        }
    }

    #[must_use]
    pub const fn slot_duration(&self) -> Duration {
        Duration::from_secs(self.seconds_per_slot.get())
    }
}
