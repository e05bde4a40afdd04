//! Uniform intake of everything the monitor observes.
//!
//! Sources of data implement [`DataProvider`] and push [`MevEvent`]s into a feed owned by the
//! [`Processor`], which hands them to an [`EventHandler`] one at a time.

pub use crate::{
    events::{HeadObservation, MevEvent, RelayEvent, RelayEventKind},
    handler::{EventHandler, LoggingHandler},
    processor::{Processor, DEFAULT_FEED_CAPACITY},
    provider::DataProvider,
};

mod events;
mod handler;
mod processor;
mod provider;
