use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use ivy_chat_protocol::{
    BackendError, ChatBackend, ChatRequest, EventStream, StreamEvent,
};
use tracing::Instrument;

type SendMessageResult = Result<(), Box<dyn BackendError>>;
type BoxedSendMessageFuture =
    Pin<Box<dyn Future<Output = SendMessageResult> + Send>>;
type EventCallback = Box<dyn Fn(StreamEvent) + Send + 'static>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ChatRequest, EventCallback) -> BoxedSendMessageFuture + Send + Sync
>;

/// A wrapper around a chat backend that provides a type-erased interface
/// for the controller.
#[derive(Clone)]
pub struct BackendClient {
    handler_fn: HandlerFn,
}

impl BackendClient {
    #[inline]
    pub fn new<B: ChatBackend + 'static>(backend: B) -> Self {
        // We have to erase the type `B`, since the controller doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(
            move |req: ChatRequest,
                  on_event: EventCallback|
                  -> BoxedSendMessageFuture {
                let fut = backend.send_message(&req);
                Box::pin(
                    async move {
                        trace!("sent a request: {:?}", req);
                        let stream_or_err = fut.await;
                        handle_stream::<B>(stream_or_err, on_event).await
                    }
                    .instrument(trace_span!("backend req")),
                )
            },
        );
        Self { handler_fn }
    }

    /// Sends a user message and forwards every event of the response to
    /// `on_event`, in arrival order.
    ///
    /// Resolves with an error if the request was not accepted, or if the
    /// transport broke while the response was streaming.
    #[inline]
    pub async fn send_message(
        &self,
        req: ChatRequest,
        on_event: impl Fn(StreamEvent) + Send + 'static,
    ) -> SendMessageResult {
        (self.handler_fn)(req, Box::new(on_event)).await
    }
}

async fn handle_stream<B: ChatBackend + 'static>(
    stream_or_err: Result<B::Stream, B::Error>,
    on_event: EventCallback,
) -> SendMessageResult {
    let stream = match stream_or_err {
        Ok(stream) => stream,
        Err(err) => {
            warn!("request failed: {err}");
            return Err(Box::new(err));
        }
    };

    trace!("start receiving events");

    let mut pinned_stream = pin!(stream);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_stream.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                warn!("stream broke: {err}");
                return Err(Box::new(err));
            }
        };
        trace!("got an event: {event:?}");
        on_event(event);
    }

    trace!("finished a request");
    Ok(())
}
