use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::phase0::primitives::{Slot, ValidatorIndex, H256};

// Only the parts of a block the monitor inspects are modeled. Unknown fields are skipped when
// deserializing, so the body of a pre-merge block is left out entirely.

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct SignedBeaconBlock {
    pub message: BeaconBlock,
}

#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct BeaconBlock {
    #[serde_as(as = "DisplayFromStr")]
    pub slot: Slot,
    #[serde_as(as = "DisplayFromStr")]
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
}
