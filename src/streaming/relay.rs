use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::constants::{LOG_PREFIX_CONN, LOG_PREFIX_ERROR, LOG_PREFIX_WARNING};
use crate::error::RelayError;
use crate::logging::log_timed;
use crate::providers::FragmentStream;
use crate::streaming::response::create_streaming_response;

static STREAM_COUNTER: AtomicU64 = AtomicU64::new(0);

pub type OutputItem = Result<Bytes, std::io::Error>;

/// Producing half of a chat stream's output.
///
/// The output ends when the sink goes away, and `close` takes the sink by
/// value, so every relay closes its output exactly once whichever way it
/// exits.
#[derive(Debug)]
pub struct OutputSink {
    tx: mpsc::UnboundedSender<OutputItem>,
}

impl OutputSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutputItem>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Returns false once the consumer has hung up.
    pub fn send_text(&self, text: &str) -> bool {
        self.tx
            .send(Ok(Bytes::copy_from_slice(text.as_bytes())))
            .is_ok()
    }

    /// Resolves when the consumer has dropped its receiving half.
    pub async fn disconnected(&self) {
        self.tx.closed().await
    }

    pub fn close(self, outcome: &RelayOutcome) {
        let error = match outcome {
            RelayOutcome::Failed(err) => Some(err.clone()),
            RelayOutcome::Cancelled => Some(RelayError::request_cancelled()),
            RelayOutcome::Completed | RelayOutcome::Disconnected => None,
        };
        if let Some(err) = error {
            let _ = self.tx.send(Err(err.into()));
        }
    }
}

#[derive(Debug, Clone)]
pub enum RelayOutcome {
    /// Upstream finished normally.
    Completed,
    /// Upstream failed or went idle past the stream timeout.
    Failed(RelayError),
    /// The caller went away.
    Disconnected,
    /// Server shutdown.
    Cancelled,
}

#[derive(Debug)]
pub struct RelayReport {
    pub outcome: RelayOutcome,
    pub fragments_sent: u64,
}

/// Copies every non-empty fragment into `sink`, in arrival order, until the
/// upstream ends, fails, stalls, or the caller disconnects.
///
/// The upstream stream is dropped before the output is closed, so a caller
/// disconnect also stops further upstream reads.
pub async fn pump_fragments(
    mut fragments: FragmentStream,
    sink: OutputSink,
    cancellation_token: CancellationToken,
    idle_timeout: Duration,
) -> RelayReport {
    let mut fragments_sent = 0u64;

    let outcome = loop {
        tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => break RelayOutcome::Cancelled,
            _ = sink.disconnected() => break RelayOutcome::Disconnected,
            next = timeout(idle_timeout, fragments.next()) => {
                match next {
                    Ok(Some(Ok(fragment))) => {
                        if let Some(text) = fragment.text() {
                            if !sink.send_text(text) {
                                break RelayOutcome::Disconnected;
                            }
                            fragments_sent += 1;
                        }
                    }
                    Ok(Some(Err(e))) => break RelayOutcome::Failed(e),
                    Ok(None) => break RelayOutcome::Completed,
                    Err(_) => break RelayOutcome::Failed(RelayError::provider_timeout()),
                }
            }
        }
    };

    drop(fragments);
    sink.close(&outcome);

    RelayReport {
        outcome,
        fragments_sent,
    }
}

/// Starts relaying `fragments` on a background task and returns the
/// response whose body streams them.
pub fn relay_fragments(
    fragments: FragmentStream,
    cancellation_token: CancellationToken,
    idle_timeout: Duration,
) -> Result<warp::reply::Response, RelayError> {
    let (sink, rx) = OutputSink::channel();
    let stream_id = STREAM_COUNTER.fetch_add(1, Ordering::Relaxed) % 1_000_000;
    let start_time = Instant::now();

    tokio::spawn(async move {
        let report = pump_fragments(fragments, sink, cancellation_token, idle_timeout).await;

        match &report.outcome {
            RelayOutcome::Completed => log_timed(
                LOG_PREFIX_CONN,
                &format!(
                    "stream [{}] completed | {} fragments",
                    stream_id, report.fragments_sent
                ),
                start_time,
            ),
            RelayOutcome::Failed(err) => log_timed(
                LOG_PREFIX_ERROR,
                &format!(
                    "stream [{}] aborted after {} fragments: {}",
                    stream_id, report.fragments_sent, err.message
                ),
                start_time,
            ),
            RelayOutcome::Disconnected => log_timed(
                LOG_PREFIX_WARNING,
                &format!(
                    "stream [{}] client disconnected after {} fragments",
                    stream_id, report.fragments_sent
                ),
                start_time,
            ),
            RelayOutcome::Cancelled => log_timed(
                LOG_PREFIX_WARNING,
                &format!("stream [{}] cancelled by shutdown", stream_id),
                start_time,
            ),
        }
    });

    create_streaming_response(rx)
}
