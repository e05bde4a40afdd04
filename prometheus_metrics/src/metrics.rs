use anyhow::Result;
use prometheus::{histogram_opts, opts, HistogramVec, IntCounter, IntCounterVec};
use tracing::warn;

#[derive(Debug)]
pub struct Metrics {
    // Consensus data cache
    pub consensus_data_cache_hit: IntCounter,
    pub consensus_data_cache_miss: IntCounter,

    // Beacon API
    pub beacon_api_request_times: HistogramVec,

    // Head events
    pub head_events_received: IntCounter,
    pub head_event_decode_errors: IntCounter,
    pub event_stream_reconnects: IntCounter,
    pub head_observations_published: IntCounter,

    // Proposer duties
    proposer_duty_refreshes: IntCounterVec,

    // Processor
    mev_events_processed: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // Consensus data cache
            consensus_data_cache_hit: IntCounter::new(
                "consensus_data_cache_hit",
                "Number of consensus data cache lookups that found an entry",
            )?,

            consensus_data_cache_miss: IntCounter::new(
                "consensus_data_cache_miss",
                "Number of consensus data cache lookups that found nothing",
            )?,

            // Beacon API
            beacon_api_request_times: HistogramVec::new(
                histogram_opts!(
                    "beacon_api_request_times",
                    "Beacon node API request times",
                ),
                &["endpoint"],
            )?,

            // Head events
            head_events_received: IntCounter::new(
                "head_events_received",
                "Number of head events received from the beacon node",
            )?,

            head_event_decode_errors: IntCounter::new(
                "head_event_decode_errors",
                "Number of head events that could not be decoded",
            )?,

            event_stream_reconnects: IntCounter::new(
                "event_stream_reconnects",
                "Number of times the beacon node event stream was reconnected",
            )?,

            head_observations_published: IntCounter::new(
                "head_observations_published",
                "Number of head observations published to the processor",
            )?,

            // Proposer duties
            proposer_duty_refreshes: IntCounterVec::new(
                opts!(
                    "proposer_duty_refreshes",
                    "Number of proposer duty refreshes by outcome",
                ),
                &["outcome"],
            )?,

            // Processor
            mev_events_processed: IntCounterVec::new(
                opts!("mev_events_processed", "Number of processed events by kind"),
                &["kind"],
            )?,
        })
    }

    pub fn register_with_default_metrics(&self) -> Result<()> {
        let default_registry = prometheus::default_registry();

        default_registry.register(Box::new(self.consensus_data_cache_hit.clone()))?;
        default_registry.register(Box::new(self.consensus_data_cache_miss.clone()))?;
        default_registry.register(Box::new(self.beacon_api_request_times.clone()))?;
        default_registry.register(Box::new(self.head_events_received.clone()))?;
        default_registry.register(Box::new(self.head_event_decode_errors.clone()))?;
        default_registry.register(Box::new(self.event_stream_reconnects.clone()))?;
        default_registry.register(Box::new(self.head_observations_published.clone()))?;
        default_registry.register(Box::new(self.proposer_duty_refreshes.clone()))?;
        default_registry.register(Box::new(self.mev_events_processed.clone()))?;

        Ok(())
    }

    // Proposer duties
    pub fn register_proposer_duty_refresh(&self, outcome: &str) {
        match self
            .proposer_duty_refreshes
            .get_metric_with_label_values(&[outcome])
        {
            Ok(counter) => counter.inc(),
            Err(error) => warn!("unable to track proposer duty refresh ({outcome}): {error:?}"),
        }
    }

    #[must_use]
    pub fn proposer_duty_refresh_count(&self, outcome: &str) -> u64 {
        self.proposer_duty_refreshes
            .get_metric_with_label_values(&[outcome])
            .map(|counter| counter.get())
            .unwrap_or_default()
    }

    // Processor
    pub fn register_mev_event(&self, kind: &str) {
        match self.mev_events_processed.get_metric_with_label_values(&[kind]) {
            Ok(counter) => counter.inc(),
            Err(error) => warn!("unable to track processed event ({kind}): {error:?}"),
        }
    }

    #[must_use]
    pub fn mev_event_count(&self, kind: &str) -> u64 {
        self.mev_events_processed
            .get_metric_with_label_values(&[kind])
            .map(|counter| counter.get())
            .unwrap_or_default()
    }
}
