use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{AsRefStr, Display, EnumString};

use crate::phase0::primitives::{Slot, H256};

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Sequence,
    AsRefStr,
    Display,
    EnumString,
    DeserializeFromStr,
    SerializeDisplay,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Phase {
    Phase0,
    Altair,
    Bellatrix,
    Capella,
    Deneb,
    Electra,
    Fulu,
}

/// A beacon head as seen at a particular slot.
///
/// The same slot may be observed with several roots over time (reorgs, late blocks).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Deserialize, Serialize)]
pub struct Coordinate {
    pub slot: Slot,
    pub root: H256,
}
