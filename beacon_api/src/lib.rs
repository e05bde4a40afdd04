pub use crate::{
    api::{Api as BeaconApi, BeaconApiError, NodeResponse, Topic, DEFAULT_REQUEST_TIMEOUT},
    sse::{EventDecoder, EventStreamError, ServerSentEvent},
};

pub mod sse;

mod api;
