// Pull-based stream controller for /responses SSE sessions
//
// One ResponseStream owns everything for one call: the byte stream, the
// frame decoder and the assembler. Dropping it (or calling close) drops
// the byte stream, which releases the HTTP connection; there is no
// background task to wind down.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::assembler::ResponseAssembler;
use crate::error::{Error, Result};
use crate::event::StreamEvent;
use crate::response::Response;
use crate::sse::SseFrameBuffer;

/// Legacy gateways terminate SSE sessions with this sentinel
const DONE_MARKER: &str = "[DONE]";

/// A live response stream
///
/// Yields normalized [`StreamEvent`]s via [`futures::Stream`] or
/// [`next_event`](Self::next_event). Exactly one of three things ends it:
/// a terminal event, an explicit [`close`](Self::close) (or drop), or a
/// failure — in every case the underlying connection is released. After a
/// terminal event the stream is fused and yields None forever.
pub struct ResponseStream {
    events: Option<Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>>,
    assembler: ResponseAssembler,
    done: bool,
}

impl ResponseStream {
    /// Wrap a raw SSE byte stream
    ///
    /// Normally obtained from `Responder::respond_stream`; any byte source
    /// works, which is also how the decode pipeline is tested.
    pub fn new<S, E>(bytes: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Into<Error> + Send + 'static,
    {
        Self {
            events: Some(decode_events(bytes)),
            assembler: ResponseAssembler::new(),
            done: false,
        }
    }

    /// Next normalized event, or None once the stream has ended
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent>> {
        self.next().await
    }

    /// Stop consuming and release the connection immediately
    ///
    /// Partial state accumulated so far is discarded. Closing an already
    /// finished stream is a no-op.
    pub fn close(&mut self) {
        self.release();
    }

    /// Drain remaining events and return the assembled response
    ///
    /// The output array is assembled from deltas in arrival order; id,
    /// status and usage come verbatim from the terminal event. Fails with
    /// [`Error::StreamClosed`] if the wire ended without a terminal event.
    pub async fn finish(mut self) -> Result<Response> {
        while let Some(event) = self.next_event().await {
            event?;
        }
        self.assembler.finish().ok_or(Error::StreamClosed)
    }

    fn release(&mut self) {
        self.events = None;
        self.done = true;
    }
}

impl Stream for ResponseStream {
    type Item = Result<StreamEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        let Some(events) = this.events.as_mut() else {
            this.done = true;
            return Poll::Ready(None);
        };

        match events.as_mut().poll_next(cx) {
            Poll::Pending => Poll::Pending,

            // Wire ended without completed/failed
            Poll::Ready(None) => {
                this.release();
                Poll::Ready(Some(Err(Error::StreamClosed)))
            }

            Poll::Ready(Some(Err(e))) => {
                this.release();
                Poll::Ready(Some(Err(e)))
            }

            Poll::Ready(Some(Ok(event))) => {
                this.assembler.apply(&event);
                match event {
                    StreamEvent::Failed { code, message } => {
                        this.release();
                        Poll::Ready(Some(Err(Error::Api { code, message })))
                    }
                    event => {
                        if event.is_terminal() {
                            this.release();
                        }
                        Poll::Ready(Some(Ok(event)))
                    }
                }
            }
        }
    }
}

fn decode_events<S, E>(bytes: S) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut chunks = Box::pin(bytes);
        let mut buffer = SseFrameBuffer::with_capacity(8192);

        'read: while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    buffer.extend(&bytes);

                    while let Some(frame) = buffer.next_frame() {
                        if frame.data == DONE_MARKER {
                            break 'read;
                        }
                        if let Some(event) = StreamEvent::from_frame(&frame) {
                            let terminal = event.is_terminal();
                            yield Ok(event);
                            if terminal {
                                break 'read;
                            }
                        }
                    }
                }
                Err(e) => {
                    yield Err(e.into());
                    break 'read;
                }
            }
        }
    })
}
