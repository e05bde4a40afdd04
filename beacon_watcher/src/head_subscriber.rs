use std::sync::Arc;

use anyhow::Result;
use beacon_api::{BeaconApi, Topic};
use futures::stream::TryStreamExt as _;
use logging::{debug_with_head, info_with_head, trace_with_head, warn_with_head, HEAD_LOG_METRICS};
use prometheus_metrics::Metrics;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use types::{api::HeadEvent, nonstandard::Coordinate};

use crate::backoff::Backoff;

/// Follows the `head` topic of the beacon node and publishes the latest head.
///
/// Heads are published to a `watch` channel, so a head that has not been picked up yet is
/// replaced by a newer one.
pub struct HeadSubscriber {
    api: Arc<BeaconApi>,
    heads: watch::Sender<Option<Coordinate>>,
    metrics: Option<Arc<Metrics>>,
}

impl HeadSubscriber {
    #[must_use]
    pub const fn new(
        api: Arc<BeaconApi>,
        heads: watch::Sender<Option<Coordinate>>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            api,
            heads,
            metrics,
        }
    }

    /// Reconnects with backoff whenever the stream ends or fails. Returns only when cancelled.
    pub async fn run(self, token: CancellationToken) {
        let mut backoff = Backoff::default();

        loop {
            let mut delivered = 0;

            let result = tokio::select! {
                biased;

                () = token.cancelled() => return,
                result = self.follow_stream(&mut delivered) => result,
            };

            match result {
                Ok(()) => info_with_head!(
                    "beacon node closed event stream after {delivered} head events",
                ),
                Err(error) => warn_with_head!(
                    "event stream failed after {delivered} head events: {error:?}",
                ),
            }

            if delivered > 0 {
                backoff.reset();
            }

            let delay = backoff.next_delay(&mut rand::thread_rng());

            if let Some(metrics) = self.metrics.as_ref() {
                metrics.event_stream_reconnects.inc();
            }

            debug_with_head!("reconnecting to event stream in {delay:?}");

            tokio::select! {
                biased;

                () = token.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn follow_stream(&self, delivered: &mut u64) -> Result<()> {
        let mut events = self.api.events(&[Topic::Head]).await?;

        info_with_head!("subscribed to head events at {}", self.api.endpoint());

        while let Some(event) = events.try_next().await? {
            if event.event.is_some() && !event.is(Topic::Head.as_ref()) {
                trace_with_head!("ignoring event of unexpected type: {event:?}");
                continue;
            }

            if self.handle_head_event(&event.data) {
                *delivered += 1;
            }
        }

        Ok(())
    }

    /// Returns `false` if `data` could not be decoded.
    fn handle_head_event(&self, data: &str) -> bool {
        if let Some(metrics) = self.metrics.as_ref() {
            metrics.head_events_received.inc();
        }

        match serde_json::from_str::<HeadEvent>(data) {
            Ok(head_event) => {
                let coordinate = head_event.coordinate();

                HEAD_LOG_METRICS.set_head_slot(coordinate.slot);

                debug_with_head!("received head event: {head_event:?}");

                self.heads.send_replace(Some(coordinate));

                true
            }
            Err(error) => {
                if let Some(metrics) = self.metrics.as_ref() {
                    metrics.head_event_decode_errors.inc();
                }

                warn_with_head!("unable to decode head event (data: {data}): {error}");

                false
            }
        }
    }
}
