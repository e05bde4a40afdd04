use logging::info_with_head;

use crate::events::MevEvent;

pub trait EventHandler: Send {
    fn handle(&mut self, event: MevEvent);
}

impl<F: FnMut(MevEvent) + Send> EventHandler for F {
    fn handle(&mut self, event: MevEvent) {
        self(event)
    }
}

/// Logs every event. Used until fault detection policies consume the feed.
#[derive(Clone, Copy, Default, Debug)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&mut self, event: MevEvent) {
        match event {
            MevEvent::HeadObservation(observation) => info_with_head!(
                "observed head (slot: {}, root: {:?}, execution block hash: {:?}, \
                 phase: {}, proposer index: {})",
                observation.slot(),
                observation.root(),
                observation.execution_block_hash,
                observation.phase,
                observation.proposer_index,
            ),
            MevEvent::RelayEvent(event) => info_with_head!(
                "received relay event (relay: {}, kind: {}, slot: {}, block hash: {:?})",
                event.relay,
                event.kind,
                event.slot,
                event.block_hash,
            ),
        }
    }
}
