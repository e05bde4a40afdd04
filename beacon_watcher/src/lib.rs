pub use consensus_cache::DEFAULT_CACHE_CAPACITY;

pub use crate::{
    beacon_watcher::BeaconWatcher,
    config::{
        Config, ConfigError, DEFAULT_HTTP_TIMEOUT, DEFAULT_MAX_IDLE_CONNS_PER_HOST,
        DEFAULT_SECONDS_PER_SLOT, DEFAULT_SLOTS_PER_EPOCH,
    },
    duty_refresher::RefreshOutcome,
};

mod backoff;
mod beacon_watcher;
mod block_fetcher;
mod config;
mod duty_refresher;
mod head_subscriber;
