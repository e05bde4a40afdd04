//! Decoder for `text/event-stream` response bodies.
//!
//! See <https://html.spec.whatwg.org/multipage/server-sent-events.html#event-stream-interpretation>.
//! Lines may end with `\n` or `\r\n`. Lines ending with a lone `\r` are not supported.
//! The `retry` field is ignored.

use core::mem;

use anyhow::{bail, Error as AnyhowError, Result};
use futures::stream::{self, Stream, StreamExt as _};
use thiserror::Error;

/// Head events are a few hundred bytes. Anything near this size is not a well-behaved stream.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1 << 20;

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum EventStreamError {
    #[error("event stream line exceeds {max_line_length} bytes")]
    LineTooLong { max_line_length: usize },
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct ServerSentEvent {
    /// Value of the last `event` field. `None` means the default event type (`message`).
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl ServerSentEvent {
    #[must_use]
    pub fn is(&self, event: &str) -> bool {
        self.event.as_deref() == Some(event)
    }
}

pub struct EventDecoder {
    line: Vec<u8>,
    max_line_length: usize,
    event: Option<String>,
    data: String,
    has_data: bool,
    id: Option<String>,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl EventDecoder {
    #[must_use]
    pub const fn new(max_line_length: usize) -> Self {
        Self {
            line: vec![],
            max_line_length,
            event: None,
            data: String::new(),
            has_data: false,
            id: None,
        }
    }

    /// Consumes a chunk of the body and returns the events completed by it.
    ///
    /// Chunks may split lines (and UTF-8 sequences) at arbitrary positions.
    /// Fails if a line grows past the maximum length. The decoder must not be reused after that.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<ServerSentEvent>> {
        let mut events = vec![];

        for byte in chunk.iter().copied() {
            if byte == b'\n' {
                let mut line = mem::take(&mut self.line);

                if line.last() == Some(&b'\r') {
                    line.pop();
                }

                if let Some(event) = self.process_line(&String::from_utf8_lossy(&line)) {
                    events.push(event);
                }
            } else {
                // One extra byte leaves room for the `\r` of a `\r\n` line ending.
                if self.line.len() > self.max_line_length {
                    let max_line_length = self.max_line_length;
                    self.line.clear();
                    bail!(EventStreamError::LineTooLong { max_line_length });
                }

                self.line.push(byte);
            }
        }

        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Option<ServerSentEvent> {
        if line.is_empty() {
            return self.dispatch();
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_owned()),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }

                self.data.push_str(value);
                self.has_data = true;
            }
            "id" => self.id = Some(value.to_owned()),
            _ => {}
        }

        None
    }

    fn dispatch(&mut self) -> Option<ServerSentEvent> {
        let event = self.event.take();
        let data = mem::take(&mut self.data);
        let has_data = mem::take(&mut self.has_data);

        // The last event ID persists across events.
        has_data.then(|| ServerSentEvent {
            event,
            data,
            id: self.id.clone(),
        })
    }
}

/// Decodes a stream of body chunks into events.
///
/// Transport errors and overlong lines are passed through as errors.
/// An incomplete event at the end of the body is discarded.
pub fn decode<B, E>(
    chunks: impl Stream<Item = Result<B, E>>,
) -> impl Stream<Item = Result<ServerSentEvent>>
where
    B: AsRef<[u8]>,
    E: Into<AnyhowError>,
{
    let mut decoder = EventDecoder::default();

    chunks
        .map(move |chunk| match chunk {
            Ok(bytes) => match decoder.feed(bytes.as_ref()) {
                Ok(events) => events.into_iter().map(Ok).collect(),
                Err(error) => vec![Err(error)],
            },
            Err(error) => vec![Err(error.into())],
        })
        .flat_map(stream::iter)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use futures::stream::TryStreamExt as _;

    use super::*;

    fn event(event: Option<&str>, data: &str) -> ServerSentEvent {
        ServerSentEvent {
            event: event.map(ToOwned::to_owned),
            data: data.to_owned(),
            id: None,
        }
    }

    #[test]
    fn events_are_dispatched_on_blank_lines() -> Result<()> {
        let mut decoder = EventDecoder::default();

        let events = decoder.feed(b"event: head\ndata: {\"slot\":\"1\"}\n\nevent: head\ndata: 2\n")?;

        assert_eq!(events, [event(Some("head"), "{\"slot\":\"1\"}")]);
        assert_eq!(decoder.feed(b"\n")?, [event(Some("head"), "2")]);

        Ok(())
    }

    #[test]
    fn lines_split_across_chunks_are_reassembled() -> Result<()> {
        let mut decoder = EventDecoder::default();

        assert!(decoder.feed(b"eve")?.is_empty());
        assert!(decoder.feed(b"nt:head\r\nda")?.is_empty());
        assert!(decoder.feed(b"ta: abc\r\n\r")?.is_empty());
        assert_eq!(decoder.feed(b"\n")?, [event(Some("head"), "abc")]);

        Ok(())
    }

    #[test]
    fn comments_and_unknown_fields_are_ignored() -> Result<()> {
        let mut decoder = EventDecoder::default();

        let events = decoder.feed(b": keep-alive\nretry: 1000\nfoo: bar\ndata\n\n:\n\n")?;

        assert_eq!(events, [event(None, "")]);

        Ok(())
    }

    #[test]
    fn multiple_data_lines_are_joined_with_newlines() -> Result<()> {
        let mut decoder = EventDecoder::default();

        let events = decoder.feed(b"data: first\ndata:second\nid: 7\n\n")?;

        assert_eq!(
            events,
            [ServerSentEvent {
                event: None,
                data: "first\nsecond".to_owned(),
                id: Some("7".to_owned()),
            }],
        );

        Ok(())
    }

    #[test]
    fn event_type_without_data_is_discarded() -> Result<()> {
        let mut decoder = EventDecoder::default();

        assert_eq!(decoder.feed(b"event: head\n\ndata: x\n\n")?, [event(None, "x")]);

        Ok(())
    }

    #[test]
    fn lines_up_to_maximum_length_are_accepted() -> Result<()> {
        let mut decoder = EventDecoder::new(8);

        assert_eq!(decoder.feed(b"data: 12\r\n\n")?, [event(None, "12")]);

        Ok(())
    }

    #[test]
    fn line_without_line_break_fails_once_it_exceeds_maximum_length() -> Result<()> {
        let mut decoder = EventDecoder::new(8);

        assert!(decoder.feed(b"data: ")?.is_empty());

        let error = decoder
            .feed(b"0123456789")
            .expect_err("overlong line should be rejected");

        assert_eq!(
            error.downcast_ref(),
            Some(&EventStreamError::LineTooLong { max_line_length: 8 }),
        );

        Ok(())
    }

    #[tokio::test]
    async fn decode_fails_on_stream_without_line_breaks() {
        let chunks = stream::iter(
            core::iter::repeat(vec![b'x'; 1024])
                .take(DEFAULT_MAX_LINE_LENGTH / 1024 + 2)
                .map(Ok::<_, AnyhowError>),
        );

        let mut events = core::pin::pin!(decode(chunks));

        let error = events
            .try_next()
            .await
            .expect_err("overlong line should end the stream with an error");

        assert!(matches!(
            error.downcast_ref(),
            Some(EventStreamError::LineTooLong { .. }),
        ));
    }

    #[tokio::test]
    async fn decode_passes_through_transport_errors() {
        let chunks = stream::iter([
            Ok(b"event: head\ndata: 1\n\n".to_vec()),
            Err(anyhow!("connection reset")),
        ]);

        let mut events = core::pin::pin!(decode(chunks));

        let first = events.try_next().await.expect("first event should be decoded");

        assert_eq!(first, Some(event(Some("head"), "1")));

        events
            .try_next()
            .await
            .expect_err("transport error should be passed through");
    }
}
