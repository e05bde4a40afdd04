//! Payloads of the beacon node APIs the monitor consumes.
//!
//! See <https://ethereum.github.io/beacon-APIs/>.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{
    nonstandard::Coordinate,
    phase0::primitives::{PublicKeyBytes, Slot, ValidatorIndex, H256},
};

/// Payload of the `head` topic of `/eth/v1/events`.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct HeadEvent {
    #[serde_as(as = "DisplayFromStr")]
    pub slot: Slot,
    pub block: H256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<H256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch_transition: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_duty_dependent_root: Option<H256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_duty_dependent_root: Option<H256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_optimistic: Option<bool>,
}

impl HeadEvent {
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate {
            slot: self.slot,
            root: self.block,
        }
    }
}

#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct ProposerDuty {
    pub pubkey: PublicKeyBytes,
    #[serde_as(as = "DisplayFromStr")]
    pub validator_index: ValidatorIndex,
    #[serde_as(as = "DisplayFromStr")]
    pub slot: Slot,
}

/// Response of `/eth/v1/validator/duties/proposer/{epoch}`.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct ProposerDutiesResponse {
    pub dependent_root: H256,
    #[serde(default)]
    pub execution_optimistic: bool,
    pub data: Vec<ProposerDuty>,
}
