//! Streaming reply support.
//!
//! A [`DeltaStream`] owns one in-flight transfer: the response body and the
//! cancellation token bound to it. It reads the body chunk by chunk, runs the
//! chunks through a [`FrameDecoder`] and hands out deltas in stream order.
//!
//! States:
//! ```text
//! Reading --[done marker | end of body]--> Finished
//! Reading --[read error | cancelled]-----> Errored
//! ```
//! Leaving `Reading` (or dropping the stream early) releases the transfer
//! exactly once: the body is dropped and the token cancelled.

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::VecDeque;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::ClientError;
use crate::sse::FrameDecoder;

/// Body of a streaming response.
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Reading,
    Finished,
    Errored,
}

enum Read {
    Cancelled,
    Chunk(Option<Result<Bytes, ClientError>>),
}

/// Lazy, finite sequence of deltas decoded from one streaming response.
///
/// Each call owns its own stream; nothing is shared between calls. The
/// token is cancelled when the stream completes, so callers that want to
/// keep a token alive should pass a [`CancellationToken::child_token`].
///
/// # Example
/// ```no_run
/// use chatmem::ChatClient;
///
/// # async fn run(client: ChatClient) -> Result<(), chatmem::ClientError> {
/// let mut deltas = client.stream_message("conversation-1", "Tell me a joke").await?;
/// while let Some(delta) = deltas.next_delta().await {
///     print!("{}", delta?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct DeltaStream {
    body: Option<ByteStream>,
    token: CancellationToken,
    decoder: FrameDecoder,
    ready: VecDeque<String>,
    state: StreamState,
}

impl DeltaStream {
    pub fn new(body: ByteStream, token: CancellationToken) -> Self {
        Self {
            body: Some(body),
            token,
            decoder: FrameDecoder::new(),
            ready: VecDeque::new(),
            state: StreamState::Reading,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The token bound to this transfer.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Abort the transfer. The next read yields
    /// [`ClientError::StreamCancelled`]; a no-op once the stream is over.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the next delta.
    ///
    /// Returns `None` once the stream is finished or has failed. A failure
    /// is reported once, as `Some(Err(..))`.
    pub async fn next_delta(&mut self) -> Option<Result<String, ClientError>> {
        loop {
            if let Some(delta) = self.ready.pop_front() {
                return Some(Ok(delta));
            }

            if self.state != StreamState::Reading {
                return None;
            }

            let Some(body) = self.body.as_mut() else {
                self.state = StreamState::Finished;
                return None;
            };

            let read = tokio::select! {
                biased;
                _ = self.token.cancelled() => Read::Cancelled,
                chunk = body.next() => Read::Chunk(chunk),
            };

            match read {
                Read::Cancelled => {
                    debug!("stream cancelled");
                    self.close(StreamState::Errored);
                    return Some(Err(ClientError::StreamCancelled));
                }
                Read::Chunk(Some(Ok(chunk))) => {
                    self.ready.extend(self.decoder.feed(&chunk));
                    if self.decoder.is_finished() {
                        debug!("done marker received");
                        self.close(StreamState::Finished);
                    }
                }
                Read::Chunk(Some(Err(e))) => {
                    warn!(error = %e, "stream read failed");
                    self.close(StreamState::Errored);
                    return Some(Err(e));
                }
                Read::Chunk(None) => {
                    let rest = self.decoder.finish();
                    if !rest.trim().is_empty() {
                        debug!(bytes = rest.len(), "discarding unterminated trailing frame");
                    }
                    debug!("stream ended without done marker");
                    self.close(StreamState::Finished);
                }
            }
        }
    }

    /// Drive the stream to completion, calling `on_delta` for every delta
    /// in order.
    pub async fn for_each_delta<F>(mut self, mut on_delta: F) -> Result<(), ClientError>
    where
        F: FnMut(&str),
    {
        while let Some(delta) = self.next_delta().await {
            on_delta(&delta?);
        }
        Ok(())
    }

    /// Adapt into a [`futures::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<String, ClientError>> + Send {
        stream::unfold(self, |mut deltas| async move {
            let item = deltas.next_delta().await?;
            Some((item, deltas))
        })
    }

    fn close(&mut self, state: StreamState) {
        self.state = state;
        self.release();
    }

    fn release(&mut self) {
        if let Some(body) = self.body.take() {
            drop(body);
            self.token.cancel();
            debug!(state = ?self.state, "transfer released");
        }
    }
}

impl Drop for DeltaStream {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for DeltaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaStream")
            .field("state", &self.state)
            .field("ready", &self.ready.len())
            .field("buffered", &self.decoder.buffered().len())
            .finish()
    }
}

/// Extension trait for `reqwest::Response` to decode the body as a stream
/// of deltas.
pub trait SSEResponseExt {
    fn deltas(self, token: CancellationToken) -> DeltaStream;
}

impl SSEResponseExt for reqwest::Response {
    fn deltas(self, token: CancellationToken) -> DeltaStream {
        let body = self
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from))
            .boxed();
        DeltaStream::new(body, token)
    }
}
