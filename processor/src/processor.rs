use core::num::NonZeroUsize;
use std::sync::Arc;

use logging::{debug_with_head, error_with_head, warn_with_head};
use nonzero_ext::nonzero;
use prometheus_metrics::Metrics;
use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{events::MevEvent, handler::EventHandler, provider::DataProvider};

pub const DEFAULT_FEED_CAPACITY: NonZeroUsize = nonzero!(100_usize);

pub struct Processor<H> {
    providers: Vec<Arc<dyn DataProvider>>,
    handler: H,
    feed_capacity: NonZeroUsize,
    metrics: Option<Arc<Metrics>>,
}

impl<H: EventHandler> Processor<H> {
    #[must_use]
    pub fn new(
        providers: Vec<Arc<dyn DataProvider>>,
        handler: H,
        feed_capacity: NonZeroUsize,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            providers,
            handler,
            feed_capacity,
            metrics,
        }
    }

    /// Subscribes to every provider and handles events until `token` is cancelled or every
    /// provider has stopped.
    ///
    /// Returns after all provider tasks have finished. Events from different providers are
    /// handled in no particular order. Events from the same provider are handled in the order they
    /// were sent.
    pub async fn run(self, token: CancellationToken) {
        let Self {
            providers,
            mut handler,
            feed_capacity,
            metrics,
        } = self;

        let (feed_tx, mut feed_rx) = mpsc::channel(feed_capacity.get());
        let mut provider_tasks = JoinSet::new();

        for provider in providers {
            let feed_tx = feed_tx.clone();
            let token = token.clone();

            provider_tasks.spawn(async move {
                let name = provider.name();
                debug_with_head!("subscribing to data provider {name}");
                (name, provider.subscribe(feed_tx, token).await)
            });
        }

        // Only providers hold senders from now on, so the feed closes once all of them stop.
        drop(feed_tx);

        loop {
            let event = tokio::select! {
                biased;

                () = token.cancelled() => break,
                event = feed_rx.recv() => event,
            };

            let Some(event) = event else {
                break;
            };

            if let Some(metrics) = metrics.as_ref() {
                metrics.register_mev_event(event.kind());
            }

            handler.handle(event);
        }

        // Providers blocked on a full feed see their sends fail and stop.
        feed_rx.close();

        while let Some(result) = provider_tasks.join_next().await {
            match result {
                Ok((name, Ok(()))) => debug_with_head!("data provider {name} stopped"),
                Ok((name, Err(error))) => {
                    warn_with_head!("data provider {name} failed: {error:?}")
                }
                Err(error) => error_with_head!("data provider task failed: {error:?}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use tokio::sync::mpsc::Sender;
    use types::{
        nonstandard::{Coordinate, Phase},
        phase0::primitives::{ExecutionBlockHash, Slot, H256},
    };

    use crate::{
        events::{HeadObservation, RelayEvent, RelayEventKind},
        handler::LoggingHandler,
    };

    use super::*;

    fn head_observation(slot: Slot) -> MevEvent {
        MevEvent::HeadObservation(HeadObservation {
            coordinate: Coordinate {
                slot,
                root: H256::repeat_byte(0xab),
            },
            execution_block_hash: ExecutionBlockHash::repeat_byte(0xcd),
            phase: Phase::Capella,
            proposer_index: 0,
        })
    }

    fn relay_event(slot: Slot) -> MevEvent {
        MevEvent::RelayEvent(RelayEvent {
            relay: "relay".to_owned(),
            kind: RelayEventKind::Payload,
            slot,
            block_hash: None,
        })
    }

    struct FiniteProvider {
        events: Vec<MevEvent>,
    }

    #[async_trait]
    impl DataProvider for FiniteProvider {
        fn name(&self) -> &'static str {
            "finite"
        }

        async fn subscribe(
            &self,
            feed: Sender<MevEvent>,
            _token: CancellationToken,
        ) -> Result<()> {
            for event in self.events.iter().cloned() {
                if feed.send(event).await.is_err() {
                    break;
                }
            }

            Ok(())
        }
    }

    struct EndlessProvider;

    #[async_trait]
    impl DataProvider for EndlessProvider {
        fn name(&self) -> &'static str {
            "endless"
        }

        async fn subscribe(&self, feed: Sender<MevEvent>, token: CancellationToken) -> Result<()> {
            let mut slot = 0;

            loop {
                tokio::select! {
                    () = token.cancelled() => return Ok(()),
                    result = feed.send(relay_event(slot)) => {
                        if result.is_err() {
                            return Ok(());
                        }
                    }
                }

                slot += 1;
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl DataProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn subscribe(
            &self,
            _feed: Sender<MevEvent>,
            _token: CancellationToken,
        ) -> Result<()> {
            bail!("unable to connect")
        }
    }

    #[tokio::test]
    async fn events_from_each_provider_are_handled_in_order() -> Result<()> {
        let metrics = Arc::new(Metrics::new()?);
        let mut handled = vec![];

        let providers: Vec<Arc<dyn DataProvider>> = vec![
            Arc::new(FiniteProvider {
                events: (0..50).map(head_observation).collect(),
            }),
            Arc::new(FiniteProvider {
                events: (0..50).map(relay_event).collect(),
            }),
            Arc::new(FailingProvider),
        ];

        Processor::new(
            providers,
            |event: MevEvent| handled.push(event),
            nonzero!(1_usize),
            Some(Arc::clone(&metrics)),
        )
        .run(CancellationToken::new())
        .await;

        let head_slots = handled
            .iter()
            .filter(|event| matches!(event, MevEvent::HeadObservation(_)))
            .map(MevEvent::slot)
            .collect::<Vec<_>>();

        let relay_slots = handled
            .iter()
            .filter(|event| matches!(event, MevEvent::RelayEvent(_)))
            .map(MevEvent::slot)
            .collect::<Vec<_>>();

        assert_eq!(head_slots, (0..50).collect::<Vec<_>>());
        assert_eq!(relay_slots, (0..50).collect::<Vec<_>>());
        assert_eq!(metrics.mev_event_count("head_observation"), 50);
        assert_eq!(metrics.mev_event_count("relay_event"), 50);

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn run_returns_after_cancellation() {
        let token = CancellationToken::new();
        let mut handled = 0;

        let processor = Processor::new(
            vec![Arc::new(EndlessProvider) as Arc<dyn DataProvider>],
            |_: MevEvent| handled += 1,
            DEFAULT_FEED_CAPACITY,
            None,
        );

        let cancel_later = {
            let token = token.clone();

            async move {
                tokio::time::sleep(Duration::from_millis(10_500)).await;
                token.cancel();
            }
        };

        tokio::time::timeout(Duration::from_secs(60), async {
            tokio::join!(processor.run(token), cancel_later);
        })
        .await
        .expect("processor should stop after cancellation");

        assert_eq!(handled, 11);
    }

    #[tokio::test]
    async fn run_returns_when_there_are_no_providers() {
        Processor::new(vec![], LoggingHandler, DEFAULT_FEED_CAPACITY, None)
            .run(CancellationToken::new())
            .await;
    }
}
