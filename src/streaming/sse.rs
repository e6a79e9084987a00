use std::collections::VecDeque;

use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};

use crate::constants::{SSE_DATA_PREFIX, SSE_DONE_MESSAGE, SSE_MESSAGE_BOUNDARY};
use crate::error::RelayError;
use crate::providers::{Fragment, FragmentStream};
use crate::streaming::chunks::parse_chunk;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Data(String),
    Done,
}

/// Reassembles server-sent events from arbitrarily split network chunks.
///
/// Buffering happens on raw bytes, so a multi-byte character cut in half by
/// the transport is only decoded once the whole event has arrived.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Bytes before this offset are known not to start a boundary.
    scanned: usize,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, RelayError> {
        self.buffer
            .extend(chunk.iter().copied().filter(|&byte| byte != b'\r'));

        let mut events = Vec::new();
        while let Some(boundary_pos) = find_boundary(&self.buffer, self.scanned) {
            let message: Vec<u8> = self
                .buffer
                .drain(..boundary_pos + SSE_MESSAGE_BOUNDARY.len())
                .take(boundary_pos)
                .collect();
            self.scanned = 0;
            if let Some(event) = decode_message(&message)? {
                events.push(event);
            }
        }
        self.scanned = self
            .buffer
            .len()
            .saturating_sub(SSE_MESSAGE_BOUNDARY.len() - 1);
        Ok(events)
    }

    /// Flushes a trailing event the server did not terminate with a blank line.
    pub fn finish(&mut self) -> Result<Vec<SseEvent>, RelayError> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        Ok(decode_message(&rest)?.into_iter().collect())
    }
}

fn find_boundary(buffer: &[u8], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(SSE_MESSAGE_BOUNDARY.len())
        .position(|window| window == SSE_MESSAGE_BOUNDARY)
        .map(|pos| from + pos)
}

fn decode_message(message: &[u8]) -> Result<Option<SseEvent>, RelayError> {
    let text = std::str::from_utf8(message)
        .map_err(|_| RelayError::provider_response("invalid UTF-8 in stream".to_string()))?;

    let mut data_lines = Vec::new();
    for line in text.lines() {
        if let Some(data) = line.strip_prefix(SSE_DATA_PREFIX) {
            data_lines.push(data.strip_prefix(' ').unwrap_or(data));
        } else if !line.trim().is_empty() && !line.starts_with(':') {
            log::debug!("SSE format: ignoring field line: {}", line);
        }
    }

    if data_lines.is_empty() {
        return Ok(None);
    }

    let data = data_lines.join("\n");
    if data.trim() == SSE_DONE_MESSAGE {
        Ok(Some(SseEvent::Done))
    } else if data.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(SseEvent::Data(data)))
    }
}

struct FragmentSource {
    body: BoxStream<'static, Result<Bytes, RelayError>>,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    body_finished: bool,
}

impl FragmentSource {
    /// Stops the source after a failure so nothing buffered leaks out after it.
    fn fail(mut self, err: RelayError) -> Option<(Result<Fragment, RelayError>, Self)> {
        self.pending.clear();
        self.body_finished = true;
        Some((Err(err), self))
    }
}

/// Lazily turns an SSE byte stream into chat fragments.
///
/// Nothing is read from `body` until the returned stream is polled, and
/// dropping the returned stream drops `body` (closing the upstream
/// connection). The stream ends at `[DONE]`, at end of body, or right after
/// yielding its first error.
pub fn fragment_stream<S>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<Bytes, RelayError>> + Send + 'static,
{
    let source = FragmentSource {
        body: body.boxed(),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        body_finished: false,
    };

    futures_util::stream::unfold(source, |mut source| async move {
        loop {
            if let Some(event) = source.pending.pop_front() {
                match event {
                    SseEvent::Done => return None,
                    SseEvent::Data(data) => {
                        return match parse_chunk(&data) {
                            Ok(fragment) => Some((Ok(fragment), source)),
                            Err(e) => source.fail(e),
                        };
                    }
                }
            }

            if source.body_finished {
                return None;
            }

            match source.body.next().await {
                Some(Ok(bytes_chunk)) => match source.decoder.push(&bytes_chunk) {
                    Ok(events) => source.pending.extend(events),
                    Err(e) => return source.fail(e),
                },
                Some(Err(e)) => return source.fail(e),
                None => {
                    source.body_finished = true;
                    match source.decoder.finish() {
                        Ok(events) => {
                            if !events.contains(&SseEvent::Done) {
                                log::warn!("stream ended without [DONE]");
                            }
                            source.pending.extend(events);
                        }
                        Err(e) => return source.fail(e),
                    }
                }
            }
        }
    })
    .boxed()
}
