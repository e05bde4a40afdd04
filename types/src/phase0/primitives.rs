use derive_more::derive::AsRef;
use fixed_hash::construct_fixed_hash;
use impl_serde::impl_fixed_hash_serde;

pub use ethereum_types::{H160, H256};

pub type Epoch = u64;
pub type ExecutionAddress = H160;
pub type ExecutionBlockHash = H256;
pub type ExecutionBlockNumber = u64;
pub type Slot = u64;
pub type UnixSeconds = u64;
pub type ValidatorIndex = u64;

pub const PUBLIC_KEY_COMPRESSED_SIZE: usize = 48;

// The monitor never verifies signatures, so public keys are kept in their compressed form.
construct_fixed_hash! {
    #[derive(AsRef)]
    pub struct PublicKeyBytes(PUBLIC_KEY_COMPRESSED_SIZE);
}

impl_fixed_hash_serde!(PublicKeyBytes, PUBLIC_KEY_COMPRESSED_SIZE);
