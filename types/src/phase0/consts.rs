use core::num::NonZeroU64;

use nonzero_ext::nonzero;

use crate::phase0::primitives::Epoch;

pub const GENESIS_EPOCH: Epoch = 0;

pub const MAINNET_SECONDS_PER_SLOT: NonZeroU64 = nonzero!(12_u64);
pub const MAINNET_SLOTS_PER_EPOCH: NonZeroU64 = nonzero!(32_u64);

pub const MINIMAL_SECONDS_PER_SLOT: NonZeroU64 = nonzero!(6_u64);
pub const MINIMAL_SLOTS_PER_EPOCH: NonZeroU64 = nonzero!(8_u64);
