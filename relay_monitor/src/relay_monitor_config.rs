use core::{
    num::{NonZeroU64, NonZeroUsize},
    time::Duration,
};
use std::path::Path;

use anyhow::{Context as _, Result};
use beacon_watcher::{
    Config as WatcherConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_HTTP_TIMEOUT,
    DEFAULT_MAX_IDLE_CONNS_PER_HOST, DEFAULT_SECONDS_PER_SLOT, DEFAULT_SLOTS_PER_EPOCH,
};
use logging::info_with_head;
use processor::DEFAULT_FEED_CAPACITY;
use serde::Deserialize;
use thiserror::Error;
use types::phase0::primitives::UnixSeconds;
use url::Url;

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum ConfigFileError {
    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },
}

/// Contents of the configuration file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayMonitorConfig {
    pub beacon_endpoint: Url,
    pub genesis_time: UnixSeconds,
    #[serde(default = "default_slot_duration_seconds")]
    pub slot_duration_seconds: u64,
    #[serde(default = "default_slots_per_epoch")]
    pub slots_per_epoch: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
    #[serde(default = "default_max_idle_conns_per_host")]
    pub max_idle_conns_per_host: usize,
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
}

impl RelayMonitorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = fs_err::read_to_string(path)?;

        serde_yaml::from_str(&yaml)
            .with_context(|| format!("unable to parse configuration file {}", path.display()))
    }

    /// Splits the file into the configuration of the beacon watcher and the feed capacity.
    pub fn try_into_parts(self) -> Result<(WatcherConfig, NonZeroUsize)> {
        let Self {
            beacon_endpoint,
            genesis_time,
            slot_duration_seconds,
            slots_per_epoch,
            cache_capacity,
            http_timeout_seconds,
            max_idle_conns_per_host,
            feed_capacity,
        } = self;

        let watcher_config = WatcherConfig {
            beacon_endpoint,
            genesis_time,
            seconds_per_slot: non_zero_u64("slot_duration_seconds", slot_duration_seconds)?,
            slots_per_epoch: non_zero_u64("slots_per_epoch", slots_per_epoch)?,
            cache_capacity: non_zero_usize("cache_capacity", cache_capacity)?,
            http_timeout: Duration::from_secs(
                non_zero_u64("http_timeout_seconds", http_timeout_seconds)?.get(),
            ),
            max_idle_conns_per_host,
        };

        watcher_config.validate()?;

        let feed_capacity = non_zero_usize("feed_capacity", feed_capacity)?;

        Ok((watcher_config, feed_capacity))
    }

    pub fn report(&self) {
        let Self {
            beacon_endpoint,
            genesis_time,
            slot_duration_seconds,
            slots_per_epoch,
            cache_capacity,
            http_timeout_seconds,
            max_idle_conns_per_host,
            feed_capacity,
        } = self;

        info_with_head!("beacon node endpoint: {beacon_endpoint}");
        info_with_head!("genesis time: {genesis_time}");
        info_with_head!("slot duration: {slot_duration_seconds} s");
        info_with_head!("slots per epoch: {slots_per_epoch}");
        info_with_head!("consensus data cache capacity: {cache_capacity} epochs");
        info_with_head!(
            "HTTP timeout: {http_timeout_seconds} s, \
             idle connections per host: {max_idle_conns_per_host}",
        );
        info_with_head!("event feed capacity: {feed_capacity}");
    }
}

const fn default_slot_duration_seconds() -> u64 {
    DEFAULT_SECONDS_PER_SLOT.get()
}

const fn default_slots_per_epoch() -> u64 {
    DEFAULT_SLOTS_PER_EPOCH.get()
}

const fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY.get()
}

const fn default_http_timeout_seconds() -> u64 {
    DEFAULT_HTTP_TIMEOUT.as_secs()
}

const fn default_max_idle_conns_per_host() -> usize {
    DEFAULT_MAX_IDLE_CONNS_PER_HOST
}

const fn default_feed_capacity() -> usize {
    DEFAULT_FEED_CAPACITY.get()
}

fn non_zero_u64(field: &'static str, value: u64) -> Result<NonZeroU64> {
    NonZeroU64::new(value)
        .ok_or(ConfigFileError::ZeroValue { field })
        .map_err(Into::into)
}

fn non_zero_usize(field: &'static str, value: usize) -> Result<NonZeroUsize> {
    NonZeroUsize::new(value)
        .ok_or(ConfigFileError::ZeroValue { field })
        .map_err(Into::into)
}
