use std::sync::Arc;

use anyhow::Result;
use beacon_api::BeaconApi;
use logging::{debug_with_head, info_with_head, warn_with_head};
use processor::{HeadObservation, MevEvent};
use prometheus_metrics::Metrics;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use types::nonstandard::Coordinate;

/// Resolves published heads to the execution blocks they carry.
///
/// A coordinate is requested once. Failed requests are not retried because a newer head usually
/// arrives within a slot.
pub struct BlockFetcher {
    api: Arc<BeaconApi>,
    heads: watch::Receiver<Option<Coordinate>>,
    feed: mpsc::Sender<MevEvent>,
    metrics: Option<Arc<Metrics>>,
}

impl BlockFetcher {
    #[must_use]
    pub const fn new(
        api: Arc<BeaconApi>,
        heads: watch::Receiver<Option<Coordinate>>,
        feed: mpsc::Sender<MevEvent>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            api,
            heads,
            feed,
            metrics,
        }
    }

    /// Returns when cancelled, when the head publisher is dropped or when the feed is closed.
    pub async fn run(mut self, token: CancellationToken) {
        loop {
            let changed = tokio::select! {
                biased;

                () = token.cancelled() => return,
                changed = self.heads.changed() => changed,
            };

            if changed.is_err() {
                debug_with_head!("head publisher stopped");
                return;
            }

            let Some(coordinate) = *self.heads.borrow_and_update() else {
                continue;
            };

            let result = tokio::select! {
                biased;

                () = token.cancelled() => return,
                result = self.observe(coordinate) => result,
            };

            let observation = match result {
                Ok(Some(observation)) => observation,
                Ok(None) => continue,
                Err(error) => {
                    warn_with_head!("unable to fetch block at slot {}: {error:?}", coordinate.slot);
                    continue;
                }
            };

            let sent = tokio::select! {
                biased;

                () = token.cancelled() => return,
                result = self.feed.send(MevEvent::HeadObservation(observation)) => result,
            };

            if sent.is_err() {
                info_with_head!("event feed closed, stopping block fetcher");
                return;
            }

            if let Some(metrics) = self.metrics.as_ref() {
                metrics.head_observations_published.inc();
            }
        }
    }

    /// Returns `None` for coordinates that do not resolve to a post-merge block.
    async fn observe(&self, coordinate: Coordinate) -> Result<Option<HeadObservation>> {
        let Coordinate { slot, root } = coordinate;

        let Some(block) = self.api.block(slot).await? else {
            info_with_head!("beacon node has no block at slot {slot} (head root: {root:?})");
            return Ok(None);
        };

        if block.slot() != slot {
            warn_with_head!(
                "beacon node returned block at slot {} when asked for slot {slot}",
                block.slot(),
            );
            return Ok(None);
        }

        let Some(execution_block_hash) = block.execution_block_hash() else {
            debug_with_head!(
                "block at slot {slot} is from {} and has no execution payload",
                block.phase(),
            );
            return Ok(None);
        };

        Ok(Some(HeadObservation {
            coordinate,
            execution_block_hash,
            phase: block.phase(),
            proposer_index: block.proposer_index(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use beacon_api::DEFAULT_REQUEST_TIMEOUT;
    use httpmock::{Method, MockServer};
    use reqwest::Client;
    use serde_json::json;
    use types::{
        nonstandard::Phase,
        phase0::primitives::{ExecutionBlockHash, Slot, H256},
    };

    use super::*;

    const ROOT_BYTE: u8 = 0xab;

    fn hex(byte: u8, length: usize) -> String {
        format!("0x{}", format!("{byte:02x}").repeat(length))
    }

    fn block_json(version: &str, slot: Slot) -> String {
        let mut message = json!({
            "slot": slot.to_string(),
            "proposer_index": "1234",
            "parent_root": hex(0x01, 32),
            "state_root": hex(0x02, 32),
        });

        if version != "phase0" && version != "altair" {
            message["body"] = json!({
                "execution_payload": {
                    "parent_hash": hex(0x03, 32),
                    "fee_recipient": hex(0x04, 20),
                    "block_number": "15537394",
                    "block_hash": hex(0xcd, 32),
                },
            });
        }

        json!({
            "version": version,
            "execution_optimistic": false,
            "finalized": false,
            "data": {
                "message": message,
                "signature": hex(0x00, 96),
            },
        })
        .to_string()
    }

    fn coordinate(slot: Slot) -> Coordinate {
        Coordinate {
            slot,
            root: H256::repeat_byte(ROOT_BYTE),
        }
    }

    fn fetcher(
        server: &MockServer,
        feed_capacity: usize,
    ) -> Result<(
        BlockFetcher,
        watch::Sender<Option<Coordinate>>,
        mpsc::Receiver<MevEvent>,
    )> {
        let api = BeaconApi::new(
            Client::new(),
            server.url("/").parse()?,
            DEFAULT_REQUEST_TIMEOUT,
            None,
        );

        let (heads_tx, heads_rx) = watch::channel(None);
        let (feed_tx, feed_rx) = mpsc::channel(feed_capacity);
        let fetcher = BlockFetcher::new(Arc::new(api), heads_rx, feed_tx, None);

        Ok((fetcher, heads_tx, feed_rx))
    }

    fn mock_block(server: &MockServer, slot: Slot, status: u16, body: String) {
        server.mock(|when, then| {
            when.method(Method::GET)
                .path(format!("/eth/v2/beacon/blocks/{slot}"));
            then.status(status)
                .header("content-type", "application/json")
                .body(body);
        });
    }

    #[tokio::test]
    async fn post_merge_block_is_observed() -> Result<()> {
        let server = MockServer::start();
        mock_block(&server, 4_500_000, 200, block_json("capella", 4_500_000));

        let (fetcher, _heads_tx, _feed_rx) = fetcher(&server, 1)?;

        assert_eq!(
            fetcher.observe(coordinate(4_500_000)).await?,
            Some(HeadObservation {
                coordinate: coordinate(4_500_000),
                execution_block_hash: ExecutionBlockHash::repeat_byte(0xcd),
                phase: Phase::Capella,
                proposer_index: 1234,
            }),
        );

        Ok(())
    }

    #[tokio::test]
    async fn pre_merge_block_is_skipped() -> Result<()> {
        let server = MockServer::start();
        mock_block(&server, 100, 200, block_json("altair", 100));

        let (fetcher, _heads_tx, _feed_rx) = fetcher(&server, 1)?;

        assert_eq!(fetcher.observe(coordinate(100)).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn missing_block_is_skipped() -> Result<()> {
        let server = MockServer::start();
        mock_block(
            &server,
            100,
            404,
            json!({"code": 404, "message": "NOT_FOUND"}).to_string(),
        );

        let (fetcher, _heads_tx, _feed_rx) = fetcher(&server, 1)?;

        assert_eq!(fetcher.observe(coordinate(100)).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn block_from_another_slot_is_skipped() -> Result<()> {
        let server = MockServer::start();
        mock_block(&server, 100, 200, block_json("deneb", 99));

        let (fetcher, _heads_tx, _feed_rx) = fetcher(&server, 1)?;

        assert_eq!(fetcher.observe(coordinate(100)).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn server_error_is_reported() -> Result<()> {
        let server = MockServer::start();
        mock_block(&server, 100, 500, "oops".to_owned());

        let (fetcher, _heads_tx, _feed_rx) = fetcher(&server, 1)?;

        fetcher
            .observe(coordinate(100))
            .await
            .expect_err("server error should be reported");

        Ok(())
    }

    #[tokio::test]
    async fn observations_are_published_to_feed() -> Result<()> {
        let server = MockServer::start();
        mock_block(&server, 4_500_000, 200, block_json("bellatrix", 4_500_000));

        let (fetcher, heads_tx, mut feed_rx) = fetcher(&server, 1)?;
        let token = CancellationToken::new();
        let task = tokio::spawn(fetcher.run(token.clone()));

        heads_tx.send_replace(Some(coordinate(4_500_000)));

        let event = tokio::time::timeout(Duration::from_secs(5), feed_rx.recv())
            .await?
            .expect("feed should stay open");

        assert_eq!(event.slot(), 4_500_000);
        assert_eq!(event.kind(), "head_observation");

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), task).await??;

        Ok(())
    }

    #[tokio::test]
    async fn fetcher_stops_when_feed_is_closed() -> Result<()> {
        let server = MockServer::start();
        mock_block(&server, 7, 200, block_json("deneb", 7));

        let (fetcher, heads_tx, feed_rx) = fetcher(&server, 1)?;

        drop(feed_rx);

        let task = tokio::spawn(fetcher.run(CancellationToken::new()));

        heads_tx.send_replace(Some(coordinate(7)));

        tokio::time::timeout(Duration::from_secs(5), task).await??;

        Ok(())
    }

    #[tokio::test]
    async fn fetcher_stops_when_head_publisher_is_dropped() -> Result<()> {
        let server = MockServer::start();
        let (fetcher, heads_tx, _feed_rx) = fetcher(&server, 1)?;

        drop(heads_tx);

        let run = fetcher.run(CancellationToken::new());

        tokio::time::timeout(Duration::from_secs(1), run).await?;

        Ok(())
    }
}
