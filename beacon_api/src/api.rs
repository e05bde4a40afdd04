use core::time::Duration;
use std::sync::Arc;

use anyhow::{bail, ensure, Result};
use futures::stream::{BoxStream, StreamExt as _};
use itertools::Itertools as _;
use logging::debug_with_head;
use mime::{APPLICATION_JSON, TEXT_EVENT_STREAM};
use prometheus_metrics::Metrics;
use reqwest::{
    header::{HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Response, StatusCode, Url,
};
use serde::de::DeserializeOwned;
use strum::{AsRefStr, Display};
use thiserror::Error;
use types::{
    api::ProposerDutiesResponse,
    combined::SignedBeaconBlock,
    phase0::primitives::{Epoch, Slot},
};

use crate::sse::{self, ServerSentEvent};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum BeaconApiError {
    #[error("bad request to beacon node API (status: {status}, response: {message})")]
    BadRequest { status: StatusCode, message: String },
    #[error("beacon node internal error (status: {status}, response: {message})")]
    BeaconNodeInternalError { status: StatusCode, message: String },
    #[error("received event stream with unsupported content-type: {content_type:?}")]
    UnsupportedContentType { content_type: Option<HeaderValue> },
}

/// Topics of `/eth/v1/events`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Topic {
    Head,
    Block,
    ChainReorg,
    FinalizedCheckpoint,
}

/// Distinguishes a beacon node that is still syncing from other failures.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum NodeResponse<T> {
    Ready(T),
    Syncing,
}

pub struct Api {
    client: Client,
    endpoint: Url,
    request_timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl Api {
    #[must_use]
    pub const fn new(
        client: Client,
        endpoint: Url,
        request_timeout: Duration,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            client,
            endpoint,
            request_timeout,
            metrics,
        }
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetches the block proposed in `slot`.
    ///
    /// Returns `None` if the beacon node does not have a block for that slot.
    pub async fn block(&self, slot: Slot) -> Result<Option<SignedBeaconBlock>> {
        let _timer = self.start_timer("block");

        let url = self.url(&format!("eth/v2/beacon/blocks/{slot}"))?;

        debug_with_head!("getting block from {url}");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, APPLICATION_JSON.as_ref())
            .timeout(self.request_timeout)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = handle_error(response).await?;

        Ok(Some(parse_json(response).await?))
    }

    /// Fetches the proposers of every slot in `epoch`.
    pub async fn proposer_duties(
        &self,
        epoch: Epoch,
    ) -> Result<NodeResponse<ProposerDutiesResponse>> {
        let _timer = self.start_timer("proposer_duties");

        let url = self.url(&format!("eth/v1/validator/duties/proposer/{epoch}"))?;

        debug_with_head!("getting proposer duties from {url}");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, APPLICATION_JSON.as_ref())
            .timeout(self.request_timeout)
            .send()
            .await?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(NodeResponse::Syncing);
        }

        let response = handle_error(response).await?;

        Ok(NodeResponse::Ready(parse_json(response).await?))
    }

    /// Subscribes to `topics` and returns the decoded event stream.
    ///
    /// The stream has no deadline. It ends when the beacon node closes the connection.
    pub async fn events(
        &self,
        topics: &[Topic],
    ) -> Result<BoxStream<'static, Result<ServerSentEvent>>> {
        let mut url = self.url("eth/v1/events")?;

        url.query_pairs_mut()
            .append_pair("topics", &topics.iter().join(","));

        debug_with_head!("subscribing to events at {url}");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, TEXT_EVENT_STREAM.as_ref())
            .send()
            .await?;

        let response = handle_error(response).await?;
        let content_type = response.headers().get(CONTENT_TYPE);

        let is_event_stream = content_type
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(TEXT_EVENT_STREAM.essence_str()));

        ensure!(
            is_event_stream,
            BeaconApiError::UnsupportedContentType {
                content_type: content_type.cloned(),
            },
        );

        Ok(sse::decode(response.bytes_stream()).boxed())
    }

    // `path` must be relative. It is appended to the path of the endpoint, if any.
    fn url(&self, path: &str) -> Result<Url> {
        let mut base = self.endpoint.clone();

        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        base.join(path).map_err(Into::into)
    }

    fn start_timer(&self, endpoint: &str) -> Option<prometheus::HistogramTimer> {
        self.metrics.as_ref().and_then(|metrics| {
            prometheus_metrics::start_timer_vec(&metrics.beacon_api_request_times, endpoint)
        })
    }
}

async fn handle_error(response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_client_error() {
        let message = response.text().await?;
        bail!(BeaconApiError::BadRequest { status, message });
    }

    if status.is_server_error() {
        let message = response.text().await?;
        bail!(BeaconApiError::BeaconNodeInternalError { status, message });
    }

    Ok(response)
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    response.json().await.map_err(Into::into)
}
