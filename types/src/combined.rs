use serde::{Deserialize, Serialize};

use crate::{
    bellatrix::containers::SignedBeaconBlock as BellatrixSignedBeaconBlock,
    nonstandard::Phase,
    phase0::{
        containers::SignedBeaconBlock as Phase0SignedBeaconBlock,
        primitives::{ExecutionBlockHash, Slot, ValidatorIndex},
    },
};

/// A signed block as returned by `/eth/v2/beacon/blocks/{block_id}`.
///
/// Blocks of later phases are decoded with the Bellatrix containers because the monitor only reads
/// fields that have not changed since the merge.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", tag = "version", content = "data")]
pub enum SignedBeaconBlock {
    Phase0(Phase0SignedBeaconBlock),
    Altair(Phase0SignedBeaconBlock),
    Bellatrix(BellatrixSignedBeaconBlock),
    Capella(BellatrixSignedBeaconBlock),
    Deneb(BellatrixSignedBeaconBlock),
    Electra(BellatrixSignedBeaconBlock),
    Fulu(BellatrixSignedBeaconBlock),
}

impl SignedBeaconBlock {
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Phase0(_) => Phase::Phase0,
            Self::Altair(_) => Phase::Altair,
            Self::Bellatrix(_) => Phase::Bellatrix,
            Self::Capella(_) => Phase::Capella,
            Self::Deneb(_) => Phase::Deneb,
            Self::Electra(_) => Phase::Electra,
            Self::Fulu(_) => Phase::Fulu,
        }
    }

    #[must_use]
    pub const fn slot(&self) -> Slot {
        match self {
            Self::Phase0(block) | Self::Altair(block) => block.message.slot,
            Self::Bellatrix(block)
            | Self::Capella(block)
            | Self::Deneb(block)
            | Self::Electra(block)
            | Self::Fulu(block) => block.message.slot,
        }
    }

    #[must_use]
    pub const fn proposer_index(&self) -> ValidatorIndex {
        match self {
            Self::Phase0(block) | Self::Altair(block) => block.message.proposer_index,
            Self::Bellatrix(block)
            | Self::Capella(block)
            | Self::Deneb(block)
            | Self::Electra(block)
            | Self::Fulu(block) => block.message.proposer_index,
        }
    }

    /// Returns `None` for blocks from before the merge.
    #[must_use]
    pub const fn execution_block_hash(&self) -> Option<ExecutionBlockHash> {
        match self {
            Self::Phase0(_) | Self::Altair(_) => None,
            Self::Bellatrix(block)
            | Self::Capella(block)
            | Self::Deneb(block)
            | Self::Electra(block)
            | Self::Fulu(block) => Some(block.message.body.execution_payload.block_hash),
        }
    }
}
