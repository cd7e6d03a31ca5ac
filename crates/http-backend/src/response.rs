use std::pin::Pin;
use std::task::{Context, Poll, ready};

use ivy_chat_protocol::{ErrorKind, EventStream, StreamEvent};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::EventReader;

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = (Result<Option<StreamEvent>, Error>, EventReader);

pin_project! {
    /// The event stream of one HTTP response.
    pub struct HttpEventStream {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl HttpEventStream {
    #[inline]
    pub(crate) fn from_reader(reader: EventReader) -> Self {
        Self {
            next_event_fut: Some(Box::pin(next_event(reader))),
        }
    }
}

impl EventStream for HttpEventStream {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<StreamEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (result, reader) = ready!(next_event_fut.as_mut().poll(cx));
        match result {
            Ok(Some(event)) => {
                // The reader may still have more data to pull, create a new
                // future for the next event.
                *this.next_event_fut = Some(Box::pin(next_event(reader)));
                Poll::Ready(Ok(Some(event)))
            }
            Ok(None) => {
                *this.next_event_fut = None;
                Poll::Ready(Ok(None))
            }
            Err(err) => {
                *this.next_event_fut = None;
                Poll::Ready(Err(err))
            }
        }
    }
}

async fn next_event(mut reader: EventReader) -> NextEvent {
    let result = reader
        .next_event()
        .await
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::Network));
    if let Ok(Some(event)) = &result {
        trace!("decoded event: {event:?}");
    }
    (result, reader)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use ivy_chat_protocol::{Action, BackendError};

    use super::*;
    use crate::io::Chunks;

    #[tokio::test]
    async fn test_poll_events() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"data: {\"type\":\"content\",\"content\":\"Sure, let\"}\n"),
                Bytes::from_static(b"data: {\"type\":\"special\",\"action\":\"BOOK_MEETING\"}\n"),
            ]
            .into(),
        );
        let mut stream = pin!(HttpEventStream::from_reader(EventReader::new(chunks)));
        let mut events = vec![];
        while let Some(event) =
            poll_fn(|cx| stream.as_mut().poll_next_event(cx)).await.unwrap()
        {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                StreamEvent::Content("Sure, let".to_owned()),
                StreamEvent::Action(Action::Booking),
                StreamEvent::End,
            ]
        );

        // Polling after completion keeps returning `None`.
        let event = poll_fn(|cx| stream.as_mut().poll_next_event(cx)).await;
        assert!(matches!(event, Ok(None)));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let chunks = Chunks::broken_after(VecDeque::new());
        let mut stream = pin!(HttpEventStream::from_reader(EventReader::new(chunks)));
        let err = poll_fn(|cx| stream.as_mut().poll_next_event(cx))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        let event = poll_fn(|cx| stream.as_mut().poll_next_event(cx)).await;
        assert!(matches!(event, Ok(None)));
    }
}
