use core::ops::Range;

use crate::{
    config::Config,
    phase0::primitives::{Epoch, Slot},
};

#[must_use]
pub const fn compute_epoch_at_slot(config: &Config, slot: Slot) -> Epoch {
    slot / config.slots_per_epoch.get()
}

#[must_use]
pub const fn compute_start_slot_at_epoch(config: &Config, epoch: Epoch) -> Option<Slot> {
    epoch.checked_mul(config.slots_per_epoch.get())
}

/// Position of `slot` within its epoch.
#[must_use]
pub const fn slot_index_in_epoch(config: &Config, slot: Slot) -> u64 {
    slot % config.slots_per_epoch.get()
}

/// Returns an empty range if the slots of `epoch` cannot be represented.
#[must_use]
pub fn slots_in_epoch(config: &Config, epoch: Epoch) -> Range<Slot> {
    let Some(start_slot) = compute_start_slot_at_epoch(config, epoch) else {
        return 0..0;
    };

    let end_slot = start_slot.saturating_add(config.slots_per_epoch.get());

    start_slot..end_slot
}
