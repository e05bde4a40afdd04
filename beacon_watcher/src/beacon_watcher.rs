use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use beacon_api::BeaconApi;
use consensus_cache::ConsensusDataCache;
use logging::{error_with_head, info_with_head};
use processor::{DataProvider, MevEvent};
use prometheus_metrics::Metrics;
use reqwest::Client;
use tokio::{
    sync::{mpsc::Sender, watch},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;

use crate::{
    block_fetcher::BlockFetcher, config::Config, duty_refresher::DutyRefresher,
    head_subscriber::HeadSubscriber,
};

/// Observes the consensus chain through a beacon node.
///
/// Publishes a [`MevEvent::HeadObservation`] for every post-merge head and keeps the proposer
/// duties of the current epoch in a [`ConsensusDataCache`].
pub struct BeaconWatcher {
    config: Config,
    api: Arc<BeaconApi>,
    cache: Arc<ConsensusDataCache>,
    metrics: Option<Arc<Metrics>>,
}

impl BeaconWatcher {
    pub fn new(config: Config, metrics: Option<Arc<Metrics>>) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .pool_max_idle_per_host(config.max_idle_conns_per_host)
            .user_agent(relay_monitor_version::version_with_platform())
            .build()?;

        let api = BeaconApi::new(
            client,
            config.beacon_endpoint.clone(),
            config.http_timeout,
            metrics.clone(),
        );

        let cache = ConsensusDataCache::new(config.cache_capacity, metrics.clone());

        Ok(Self {
            config,
            api: Arc::new(api),
            cache: Arc::new(cache),
            metrics,
        })
    }

    /// The cache populated by this watcher. Other components may read it concurrently.
    #[must_use]
    pub const fn cache(&self) -> &Arc<ConsensusDataCache> {
        &self.cache
    }

    /// Runs until `token` is cancelled or `feed` is closed.
    ///
    /// Returns only after every task started by this method has finished. An error is returned if
    /// the epoch clock fails.
    pub async fn start(&self, feed: Sender<MevEvent>, token: CancellationToken) -> Result<()> {
        let token = token.child_token();
        let (heads_tx, heads_rx) = watch::channel(None);
        let mut tasks = JoinSet::new();

        info_with_head!(
            "watching beacon node at {} (genesis time: {})",
            self.config.beacon_endpoint,
            self.config.genesis_time,
        );

        let subscriber = HeadSubscriber::new(Arc::clone(&self.api), heads_tx, self.metrics.clone());

        let fetcher = BlockFetcher::new(
            Arc::clone(&self.api),
            heads_rx,
            feed.clone(),
            self.metrics.clone(),
        );

        let refresher = DutyRefresher::new(
            Arc::clone(&self.api),
            Arc::clone(&self.cache),
            self.config.chain_config(),
            self.metrics.clone(),
        );

        tasks.spawn(subscriber.run(token.clone()));
        tasks.spawn(fetcher.run(token.clone()));

        let epochs = clock::epochs(self.config.chain_config(), self.config.genesis_time);

        let result = tokio::select! {
            result = refresher.run(epochs, &token) => result,
            () = feed.closed() => {
                info_with_head!("event feed closed, stopping beacon watcher");
                Ok(())
            }
        };

        token.cancel();

        while let Some(joined) = tasks.join_next().await {
            if let Err(error) = joined {
                error_with_head!("beacon watcher task failed: {error:?}");
            }
        }

        result
    }
}

#[async_trait]
impl DataProvider for BeaconWatcher {
    fn name(&self) -> &'static str {
        "beacon_watcher"
    }

    async fn subscribe(&self, feed: Sender<MevEvent>, token: CancellationToken) -> Result<()> {
        self.start(feed, token).await
    }
}
