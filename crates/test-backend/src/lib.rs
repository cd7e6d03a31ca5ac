//! A local scripted chat backend for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use ivy_chat_protocol::{
    Action, BackendError, ChatBackend, ChatRequest, ErrorKind, EventStream,
    StreamEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    #[allow(dead_code)]
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl BackendError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestEventStream {
    events: VecDeque<PresetEvent>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
    ended: bool,
}

impl EventStream for TestEventStream {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<StreamEvent>, Self::Error>> {
        let this = self.get_mut();
        if this.ended {
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }

        let delay = this.delay;
        let timer = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(timer.as_mut().poll(cx));
        this.sleep = None;

        let event = match this.events.pop_front() {
            Some(PresetEvent::Content(text)) => StreamEvent::Content(text),
            Some(PresetEvent::Booking) => StreamEvent::Action(Action::Booking),
            Some(PresetEvent::Error(text)) => StreamEvent::Error(text),
            Some(PresetEvent::Disconnect) => {
                this.ended = true;
                return Poll::Ready(Err(Error {
                    message: "connection reset",
                    kind: ErrorKind::Network,
                }));
            }
            None => {
                this.ended = true;
                StreamEvent::End
            }
        };
        Poll::Ready(Ok(Some(event)))
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<PresetResponse>,
    requests: Vec<ChatRequest>,
}

/// A local scripted backend for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// backend should respond to each request, in order. If there are no enough
/// responses in the script, the request fails.
///
/// Clones share the same script, so a test can keep one clone to inspect
/// the requests it received.
#[derive(Clone, Default)]
pub struct TestBackend {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestBackend {
    #[inline]
    pub fn add_response(&self, preset: PresetResponse) {
        self.script().responses.push_back(preset);
    }

    /// Sets the delay before each event is delivered.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the requests received so far.
    #[inline]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.script().requests.clone()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChatBackend for TestBackend {
    type Error = crate::Error;
    type Stream = TestEventStream;

    fn send_message(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Stream, Self::Error>> + Send + 'static
    {
        let result = 'blk: {
            let mut script = self.script();
            script.requests.push(req.clone());

            let Some(response) = script.responses.pop_front() else {
                break 'blk Err(Error {
                    message: "no enough responses",
                    kind: ErrorKind::Other,
                });
            };
            if response.rejected {
                break 'blk Err(Error {
                    message: "rejected",
                    kind: ErrorKind::Status,
                });
            }

            Ok(TestEventStream {
                events: response.events.into(),
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
                ended: false,
            })
        };
        ready(result)
    }
}
