use std::sync::{Arc, Mutex};
use std::time::Duration;

use ivy_chat_test_backend::{PresetEvent, PresetResponse, TestBackend};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use crate::transcript::Message;
use crate::{
    DEFAULT_BOOKING_URL, FAILURE_NOTICE, Snapshot, TranscriptController,
    TranscriptControllerBuilder,
};

struct Harness {
    controller: TranscriptController,
    idle_rx: mpsc::UnboundedReceiver<()>,
    snapshots: Arc<Mutex<Vec<Snapshot>>>,
}

impl Harness {
    fn new(backend: TestBackend) -> Self {
        let (idle_tx, idle_rx) = mpsc::unbounded_channel();
        let snapshots = Arc::new(Mutex::new(vec![]));
        let controller = TranscriptControllerBuilder::with_backend(backend)
            .on_idle(move || {
                idle_tx.send(()).unwrap();
            })
            .on_snapshot({
                let snapshots = Arc::clone(&snapshots);
                move |snapshot| snapshots.lock().unwrap().push(snapshot.clone())
            })
            .build();
        Self {
            controller,
            idle_rx,
            snapshots,
        }
    }

    async fn wait_idle(&mut self) -> Snapshot {
        timeout(Duration::from_millis(500), self.idle_rx.recv())
            .await
            .unwrap()
            .unwrap();
        self.controller.snapshot()
    }
}

fn content(text: &str) -> PresetEvent {
    PresetEvent::Content(text.to_owned())
}

#[tokio::test]
async fn test_simple_message() {
    let backend = TestBackend::default();
    backend.add_response(PresetResponse::with_events([
        content("Hi"),
        content(" there"),
    ]));
    let mut harness = Harness::new(backend);

    harness.controller.submit("hello");
    let snapshot = harness.wait_idle().await;
    assert_eq!(
        snapshot.transcript.messages(),
        &[Message::user("hello"), Message::bot("Hi there")]
    );
    assert!(!snapshot.streaming);
    assert!(!snapshot.show_booking);

    // The bubble grows while streaming, one snapshot per fragment.
    let snapshots = harness.snapshots.lock().unwrap();
    let tails: Vec<_> = snapshots
        .iter()
        .map(|s| (s.transcript.last().cloned(), s.streaming))
        .collect();
    assert_eq!(
        tails,
        vec![
            (Some(Message::user("hello")), true),
            (Some(Message::bot("Hi")), true),
            (Some(Message::bot("Hi there")), true),
            (Some(Message::bot("Hi there")), false),
        ]
    );
}

#[tokio::test]
async fn test_submit_is_visible_immediately() {
    let mut backend = TestBackend::default();
    backend.set_delay(Duration::from_millis(20));
    backend.add_response(PresetResponse::with_events([content("Hi")]));
    let mut harness = Harness::new(backend);

    assert!(harness.controller.submit("hello"));
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.transcript.messages(), &[Message::user("hello")]);
    assert!(snapshot.streaming);
    assert!(harness.controller.subscribe().borrow().streaming);

    let snapshot = harness.wait_idle().await;
    assert_eq!(
        snapshot.transcript.messages(),
        &[Message::user("hello"), Message::bot("Hi")]
    );
}

#[tokio::test]
async fn test_booking_handoff() {
    let backend = TestBackend::default();
    backend.add_response(PresetResponse::with_events([
        content("Sure, let"),
        PresetEvent::Booking,
        content(" me check"),
        PresetEvent::Booking,
    ]));
    let mut harness = Harness::new(backend);

    harness.controller.submit("book a call");
    let snapshot = harness.wait_idle().await;
    assert_eq!(
        snapshot.transcript.messages(),
        &[Message::user("book a call")]
    );
    assert!(snapshot.show_booking);
    assert!(!snapshot.streaming);
    assert_eq!(harness.controller.booking_url(), DEFAULT_BOOKING_URL);
}

#[tokio::test]
async fn test_rejected_request() {
    let backend = TestBackend::default();
    backend.add_response(PresetResponse::rejected());
    let mut harness = Harness::new(backend);

    harness.controller.submit("hello");
    let snapshot = harness.wait_idle().await;
    assert_eq!(
        snapshot.transcript.messages(),
        &[Message::user("hello"), Message::bot(FAILURE_NOTICE)]
    );
    assert!(!snapshot.streaming);
}

#[tokio::test]
async fn test_disconnect_mid_stream() {
    let backend = TestBackend::default();
    backend.add_response(PresetResponse::with_events([
        content("Hi"),
        PresetEvent::Disconnect,
    ]));
    let mut harness = Harness::new(backend);

    harness.controller.submit("hello");
    let snapshot = harness.wait_idle().await;
    assert_eq!(
        snapshot.transcript.messages(),
        &[
            Message::user("hello"),
            Message::bot("Hi"),
            Message::bot(FAILURE_NOTICE),
        ]
    );
    assert!(!snapshot.streaming);
}

#[tokio::test]
async fn test_server_error() {
    let backend = TestBackend::default();
    backend.add_response(PresetResponse::with_events([
        PresetEvent::Error("The assistant is unavailable.".to_owned()),
        content("ignored"),
        PresetEvent::Disconnect,
    ]));
    let mut harness = Harness::new(backend);

    harness.controller.submit("hello");
    let snapshot = harness.wait_idle().await;
    assert_eq!(
        snapshot.transcript.messages(),
        &[
            Message::user("hello"),
            Message::bot("The assistant is unavailable."),
        ]
    );
}

#[tokio::test]
async fn test_submit_while_streaming() {
    let mut backend = TestBackend::default();
    backend.set_delay(Duration::from_millis(20));
    backend.add_response(PresetResponse::with_events([content("Hi")]));
    backend.add_response(PresetResponse::with_events([content("again")]));
    let mut harness = Harness::new(backend.clone());

    assert!(harness.controller.submit("first"));
    assert!(!harness.controller.submit("second"));
    sleep(Duration::from_millis(10)).await;
    assert!(!harness.controller.submit("third"));

    let snapshot = harness.wait_idle().await;
    assert_eq!(
        snapshot.transcript.messages(),
        &[Message::user("first"), Message::bot("Hi")]
    );
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_blank_input_ignored() {
    let backend = TestBackend::default();
    backend.add_response(PresetResponse::with_events([content("Hi")]));
    let mut harness = Harness::new(backend.clone());

    assert!(!harness.controller.submit("   \n"));
    assert!(harness.controller.submit("  hello  "));
    let snapshot = harness.wait_idle().await;
    assert_eq!(
        snapshot.transcript.messages(),
        &[Message::user("hello"), Message::bot("Hi")]
    );
    assert_eq!(backend.requests()[0].message, "hello");
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_consecutive_turns() {
    let backend = TestBackend::default();
    backend.add_response(PresetResponse::with_events([content("Hi")]));
    backend.add_response(PresetResponse::rejected());
    backend.add_response(PresetResponse::with_events([content("Back again")]));
    let mut harness = Harness::new(backend);

    harness.controller.submit("hello");
    harness.wait_idle().await;
    harness.controller.submit("are you there?");
    harness.wait_idle().await;
    harness.controller.submit("hello?");
    let snapshot = harness.wait_idle().await;

    // Each turn gets its own bubble; nothing folds into an earlier one.
    assert_eq!(
        snapshot.transcript.messages(),
        &[
            Message::user("hello"),
            Message::bot("Hi"),
            Message::user("are you there?"),
            Message::bot(FAILURE_NOTICE),
            Message::user("hello?"),
            Message::bot("Back again"),
        ]
    );
}

#[tokio::test]
async fn test_subscribe() {
    let backend = TestBackend::default();
    backend.add_response(PresetResponse::with_events([content("Hi")]));
    let harness = Harness::new(backend);
    let mut snapshot_rx = harness.controller.subscribe();

    harness.controller.submit("hello");
    let snapshot = timeout(
        Duration::from_millis(500),
        snapshot_rx.wait_for(|s| !s.streaming && !s.transcript.is_empty()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(snapshot.transcript.len(), 2);
}
