use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::phase0::primitives::{
    ExecutionAddress, ExecutionBlockHash, ExecutionBlockNumber, Slot, ValidatorIndex, H256,
};

// The execution payload layout changed in later phases, but the fields below are present in all
// of them. The same containers are used to decode every post-merge block.

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
    pub body: BeaconBlockBody,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct BeaconBlockBody {
    pub execution_payload: ExecutionPayload,
}

#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct ExecutionPayload {
    pub parent_hash: ExecutionBlockHash,
    pub fee_recipient: ExecutionAddress,
    #[serde_as(as = "DisplayFromStr")]
    pub block_number: ExecutionBlockNumber,
    pub block_hash: ExecutionBlockHash,
}
