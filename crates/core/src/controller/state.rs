use std::sync::Arc;

use ivy_chat_protocol::{ChatRequest, StreamEvent};
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

use super::Snapshot;
use super::fold::TurnState;
use crate::backend_client::BackendClient;

#[derive(Debug)]
pub enum Command {
    // The handle has already published `snapshot` with the user message.
    StartTurn { input: String, snapshot: Snapshot },
    Event { turn_id: u64, event: StreamEvent },
    Failed { turn_id: u64 },
    TurnEnded { turn_id: u64 },
}

pub struct ControllerState {
    backend_client: BackendClient,
    // Shared with the handles. While a turn is in flight only this task
    // writes to it.
    snapshot_tx: Arc<watch::Sender<Snapshot>>,
    turn: Option<(u64, TurnState)>,
    next_turn_id: u64,

    on_snapshot: Option<Box<dyn Fn(&Snapshot) + Send + Sync>>,
    on_idle: Option<Box<dyn Fn() + Send + Sync>>,
}

impl ControllerState {
    pub fn new(
        backend_client: BackendClient,
        snapshot_tx: Arc<watch::Sender<Snapshot>>,
        on_snapshot: Option<Box<dyn Fn(&Snapshot) + Send + Sync>>,
        on_idle: Option<Box<dyn Fn() + Send + Sync>>,
    ) -> Self {
        Self {
            backend_client,
            snapshot_tx,
            turn: None,
            next_turn_id: 1,
            on_snapshot,
            on_idle,
        }
    }

    fn start_turn(
        &mut self,
        input: String,
        snapshot: Snapshot,
        cmd_tx: &mpsc::WeakUnboundedSender<Command>,
    ) {
        if self.turn.is_some() {
            error!("a turn was started while another one is in flight");
            return;
        }
        self.notify(&snapshot);

        let Some(cmd_tx) = cmd_tx.upgrade() else {
            // Every handle has been dropped, nobody would see the result.
            return;
        };

        let turn_id = self.next_turn_id;
        self.next_turn_id += 1;
        self.turn = Some((turn_id, TurnState::default()));

        let backend_client = self.backend_client.clone();
        tokio::spawn(
            async move {
                let guard = TurnGuard {
                    turn_id,
                    cmd_tx: cmd_tx.clone(),
                    succeeded: false,
                };
                let result = backend_client
                    .send_message(ChatRequest::new(input), move |event| {
                        cmd_tx.send(Command::Event { turn_id, event }).ok();
                    })
                    .await;
                match result {
                    Ok(()) => guard.succeed(),
                    Err(err) => {
                        warn!("turn failed: {err}");
                        drop(guard);
                    }
                }
            }
            .instrument(debug_span!("turn", id = turn_id)),
        );
    }

    fn fold(&mut self, turn_id: u64, event: StreamEvent) {
        let Some((current_id, turn)) = &mut self.turn else {
            warn!("got an event with no turn in flight");
            return;
        };
        if *current_id != turn_id {
            warn!("got an event of stale turn {turn_id}");
            return;
        }
        let published = update_snapshot(&self.snapshot_tx, |snapshot| {
            turn.apply(snapshot, event)
        });
        if let Some(snapshot) = published {
            self.notify(&snapshot);
        }
    }

    fn fail(&mut self, turn_id: u64) {
        let Some((current_id, turn)) = &mut self.turn else {
            return;
        };
        if *current_id != turn_id {
            return;
        }
        let published =
            update_snapshot(&self.snapshot_tx, |snapshot| turn.fail(snapshot));
        if let Some(snapshot) = published {
            self.notify(&snapshot);
        }
    }

    fn end_turn(&mut self, turn_id: u64) {
        if !matches!(&self.turn, Some((current_id, _)) if *current_id == turn_id)
        {
            warn!("turn {turn_id} is not in flight");
            return;
        }
        self.turn = None;
        let published = update_snapshot(&self.snapshot_tx, |snapshot| {
            snapshot.streaming = false;
            true
        });
        if let Some(snapshot) = published {
            self.notify(&snapshot);
        }

        if let Some(on_idle) = &self.on_idle {
            on_idle();
        }
    }

    fn notify(&self, snapshot: &Snapshot) {
        if let Some(on_snapshot) = &self.on_snapshot {
            on_snapshot(snapshot);
        }
    }
}

/// Applies `f` to the published snapshot, and returns a copy of the result
/// if `f` reports a change.
///
/// The copy is taken under the channel's lock, so callbacks observe exactly
/// the value that was published even if a handle writes right after.
pub fn update_snapshot(
    snapshot_tx: &watch::Sender<Snapshot>,
    f: impl FnOnce(&mut Snapshot) -> bool,
) -> Option<Snapshot> {
    let mut published = None;
    snapshot_tx.send_if_modified(|snapshot| {
        let modified = f(snapshot);
        if modified {
            published = Some(snapshot.clone());
        }
        modified
    });
    published
}

/// Reports the end of a turn to the controller when dropped, so the
/// streaming flag is cleared on every exit path, panics included.
struct TurnGuard {
    turn_id: u64,
    cmd_tx: mpsc::UnboundedSender<Command>,
    succeeded: bool,
}

impl TurnGuard {
    #[inline]
    fn succeed(mut self) {
        self.succeeded = true;
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        let turn_id = self.turn_id;
        if !self.succeeded {
            self.cmd_tx.send(Command::Failed { turn_id }).ok();
        }
        self.cmd_tx.send(Command::TurnEnded { turn_id }).ok();
    }
}

pub async fn run_controller(
    mut state: ControllerState,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    cmd_tx: mpsc::WeakUnboundedSender<Command>,
) {
    debug!("started");
    while let Some(cmd) = cmd_rx.recv().await {
        trace!("received command: {cmd:?}");
        match cmd {
            Command::StartTurn { input, snapshot } => {
                state.start_turn(input, snapshot, &cmd_tx)
            }
            Command::Event { turn_id, event } => state.fold(turn_id, event),
            Command::Failed { turn_id } => state.fail(turn_id),
            Command::TurnEnded { turn_id } => state.end_turn(turn_id),
        }
    }
    debug!("will terminate");
}
