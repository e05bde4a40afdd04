use strum::{AsRefStr, Display};
use types::{
    nonstandard::{Coordinate, Phase},
    phase0::primitives::{ExecutionBlockHash, Slot, ValidatorIndex, H256},
};

#[derive(Clone, PartialEq, Eq, Debug, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MevEvent {
    HeadObservation(HeadObservation),
    RelayEvent(RelayEvent),
}

impl MevEvent {
    /// Label used in logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.as_ref()
    }

    #[must_use]
    pub const fn slot(&self) -> Slot {
        match self {
            Self::HeadObservation(observation) => observation.coordinate.slot,
            Self::RelayEvent(event) => event.slot,
        }
    }
}

/// A beacon head resolved to the execution block it carries.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct HeadObservation {
    pub coordinate: Coordinate,
    pub execution_block_hash: ExecutionBlockHash,
    pub phase: Phase,
    pub proposer_index: ValidatorIndex,
}

impl HeadObservation {
    #[must_use]
    pub const fn slot(&self) -> Slot {
        self.coordinate.slot
    }

    #[must_use]
    pub const fn root(&self) -> H256 {
        self.coordinate.root
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RelayEventKind {
    Bid,
    Payload,
    Registration,
}

/// Something a relay reported or was reported to have done.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RelayEvent {
    pub relay: String,
    pub kind: RelayEventKind,
    pub slot: Slot,
    pub block_hash: Option<ExecutionBlockHash>,
}
