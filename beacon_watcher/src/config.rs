use core::{
    num::{NonZeroU64, NonZeroUsize},
    time::Duration,
};

use anyhow::{ensure, Result};
use consensus_cache::DEFAULT_CACHE_CAPACITY;
use reqwest::Url;
use thiserror::Error;
use types::{
    config::Config as ChainConfig,
    phase0::{
        consts::{MAINNET_SECONDS_PER_SLOT, MAINNET_SLOTS_PER_EPOCH},
        primitives::UnixSeconds,
    },
};

pub const DEFAULT_SECONDS_PER_SLOT: NonZeroU64 = MAINNET_SECONDS_PER_SLOT;
pub const DEFAULT_SLOTS_PER_EPOCH: NonZeroU64 = MAINNET_SLOTS_PER_EPOCH;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(12);
pub const DEFAULT_MAX_IDLE_CONNS_PER_HOST: usize = 128;

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum ConfigError {
    #[error("beacon node endpoint must be an HTTP or HTTPS URL: {endpoint}")]
    UnsupportedEndpoint { endpoint: Url },
    #[error("HTTP timeout must be greater than zero")]
    ZeroHttpTimeout,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub beacon_endpoint: Url,
    pub genesis_time: UnixSeconds,
    pub seconds_per_slot: NonZeroU64,
    pub slots_per_epoch: NonZeroU64,
    pub cache_capacity: NonZeroUsize,
    pub http_timeout: Duration,
    pub max_idle_conns_per_host: usize,
}

impl Config {
    /// Creates a configuration for a network with mainnet timing.
    #[must_use]
    pub const fn new(beacon_endpoint: Url, genesis_time: UnixSeconds) -> Self {
        Self {
            beacon_endpoint,
            genesis_time,
            seconds_per_slot: DEFAULT_SECONDS_PER_SLOT,
            slots_per_epoch: DEFAULT_SLOTS_PER_EPOCH,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            max_idle_conns_per_host: DEFAULT_MAX_IDLE_CONNS_PER_HOST,
        }
    }

    #[must_use]
    pub const fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            seconds_per_slot: self.seconds_per_slot,
            slots_per_epoch: self.slots_per_epoch,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            matches!(self.beacon_endpoint.scheme(), "http" | "https")
                && !self.beacon_endpoint.cannot_be_a_base(),
            ConfigError::UnsupportedEndpoint {
                endpoint: self.beacon_endpoint.clone(),
            },
        );

        ensure!(!self.http_timeout.is_zero(), ConfigError::ZeroHttpTimeout);

        Ok(())
    }
}
