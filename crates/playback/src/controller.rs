//! Per-slide playback controller.
//!
//! Each controller is one tokio task that exclusively owns the authoritative
//! position of its slide. It waits in `Idle` until the slide's activation
//! signal turns on, then plays every move of its sequence with a fixed pause
//! after each one, publishing a snapshot after every move. When the sequence
//! runs out the position is reset to the initial one and the task goes back to
//! `Idle`. Runs are cancellable: teardown always cancels, deactivation cancels
//! under [`DeactivationPolicy::CancelRun`].

use std::sync::Arc;

use chess_core::{NotationParseError, RulesEngine};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn, Instrument};

use crate::config::{DeactivationPolicy, PlaybackConfig};
use crate::error::PlaybackError;
use crate::event::{IgnoredReason, PlaybackEvent, RunOutcome};
use crate::extractor::MoveSequence;

/// Externally visible controller state. `Playing` is the playback flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing { run: u64 },
}

/// Snapshot handed to the board renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPosition {
    pub fen: String,
    /// Plies applied to reach this position; 0 for the initial position.
    pub ply: usize,
    /// Run that published it, `None` outside of runs.
    pub run: Option<u64>,
}

/// Interaction policy for boards driven by a controller: every drop is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockedBoard;

impl LockedBoard {
    pub fn on_piece_drop(&self, _source: &str, _target: &str) -> bool {
        false
    }
}

enum Command<M> {
    Replace(Option<MoveSequence<M>>),
}

/// Spawn a controller with its own shutdown token.
pub fn spawn<E: RulesEngine>(
    engine: Arc<E>,
    sequence: Result<MoveSequence<E::Move>, NotationParseError>,
    activation: watch::Receiver<bool>,
    config: PlaybackConfig,
) -> PlaybackHandle<E> {
    spawn_with_token(
        engine,
        sequence,
        activation,
        config,
        "slide".to_string(),
        CancellationToken::new(),
    )
}

/// Spawn a controller whose teardown is tied to `shutdown` (usually a child of
/// a feed-wide token). Must be called inside a tokio runtime.
pub fn spawn_with_token<E: RulesEngine>(
    engine: Arc<E>,
    sequence: Result<MoveSequence<E::Move>, NotationParseError>,
    activation: watch::Receiver<bool>,
    config: PlaybackConfig,
    label: String,
    shutdown: CancellationToken,
) -> PlaybackHandle<E> {
    let initial = engine.initial_position();
    let (published_tx, published_rx) = watch::channel(PublishedPosition {
        fen: engine.serialize(&initial),
        ply: 0,
        run: None,
    });
    let (state_tx, state_rx) = watch::channel(PlaybackState::Idle);
    let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let sequence = match sequence {
        Ok(seq) => Some(seq),
        Err(e) => {
            debug!(slide = %label, error = %e, "Slide notation is unplayable, board stays idle");
            None
        }
    };

    let controller = Controller {
        engine,
        config,
        sequence,
        position: initial,
        activation,
        activation_open: true,
        commands: command_rx,
        shutdown: shutdown.clone(),
        published: published_tx,
        state: state_tx,
        events: events_tx.clone(),
        runs: 0,
    };

    let span = tracing::info_span!("playback", slide = %label);
    let task = tokio::spawn(controller.run().instrument(span));

    PlaybackHandle {
        position: published_rx,
        state: state_rx,
        events: events_tx,
        commands: command_tx,
        shutdown: shutdown.clone(),
        _guard: shutdown.drop_guard(),
        task,
    }
}

/// Owner-side handle of a running controller. Dropping it tears the
/// controller down.
pub struct PlaybackHandle<E: RulesEngine> {
    position: watch::Receiver<PublishedPosition>,
    state: watch::Receiver<PlaybackState>,
    events: broadcast::Sender<PlaybackEvent>,
    commands: mpsc::UnboundedSender<Command<E::Move>>,
    shutdown: CancellationToken,
    _guard: DropGuard,
    task: JoinHandle<()>,
}

impl<E: RulesEngine> PlaybackHandle<E> {
    /// Latest published position.
    pub fn position(&self) -> PublishedPosition {
        self.position.borrow().clone()
    }

    pub fn subscribe_position(&self) -> watch::Receiver<PublishedPosition> {
        self.position.clone()
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state(), PlaybackState::Playing { .. })
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    pub fn interaction(&self) -> LockedBoard {
        LockedBoard
    }

    /// Install a new sequence after the notation changed. Any run in flight is
    /// cancelled and the initial position is published.
    pub fn replace_sequence(
        &self,
        sequence: Result<MoveSequence<E::Move>, NotationParseError>,
    ) -> Result<(), PlaybackError> {
        let sequence = match sequence {
            Ok(seq) => Some(seq),
            Err(e) => {
                warn!(error = %e, "Replacement notation is unplayable, board stays idle");
                None
            }
        };
        self.commands
            .send(Command::Replace(sequence))
            .map_err(|_| PlaybackError::ControllerGone)
    }

    /// Wait until no run is in flight.
    pub async fn wait_idle(&self) -> Result<(), PlaybackError> {
        let mut state = self.state.clone();
        state
            .wait_for(|s| *s == PlaybackState::Idle)
            .await
            .map(|_| ())
            .map_err(|_| PlaybackError::ControllerGone)
    }

    /// Cancel any run in flight and wait for the task to stop.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Playback task ended abnormally");
        }
    }
}

enum Phase<M> {
    Idle,
    Playing(Run<M>),
}

struct Run<M> {
    id: u64,
    sequence: MoveSequence<M>,
    next: usize,
    cancel: CancellationToken,
}

struct Controller<E: RulesEngine> {
    engine: Arc<E>,
    config: PlaybackConfig,
    sequence: Option<MoveSequence<E::Move>>, // None when the notation was unplayable
    position: E::Position,
    activation: watch::Receiver<bool>,
    activation_open: bool,
    commands: mpsc::UnboundedReceiver<Command<E::Move>>,
    shutdown: CancellationToken,
    published: watch::Sender<PublishedPosition>,
    state: watch::Sender<PlaybackState>,
    events: broadcast::Sender<PlaybackEvent>,
    runs: u64,
}

impl<E: RulesEngine> Controller<E> {
    async fn run(mut self) {
        // A slide that is already active when mounted starts right away.
        let mut phase = if *self.activation.borrow_and_update() {
            self.start()
        } else {
            Phase::Idle
        };

        loop {
            phase = match phase {
                Phase::Idle => match self.idle().await {
                    Some(next) => next,
                    None => break,
                },
                Phase::Playing(run) => self.step(run).await,
            };
        }

        debug!("Playback controller stopped");
    }

    /// Wait for a trigger while idle. `None` once the controller is torn down.
    async fn idle(&mut self) -> Option<Phase<E::Move>> {
        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => return None,

                Some(cmd) = self.commands.recv() => self.handle_command(cmd),

                changed = self.activation.changed(), if self.activation_open => {
                    if changed.is_err() {
                        self.activation_open = false;
                        continue;
                    }
                    if *self.activation.borrow_and_update() {
                        return Some(self.start());
                    }
                }
            }
        }
    }

    fn start(&mut self) -> Phase<E::Move> {
        let Some(sequence) = self.sequence.clone() else {
            debug!("Activation ignored, slide is unplayable");
            self.emit(PlaybackEvent::ActivationIgnored {
                reason: IgnoredReason::Unplayable,
            });
            return Phase::Idle;
        };

        self.runs += 1;
        let id = self.runs;
        self.position = self.engine.initial_position();
        self.state.send_replace(PlaybackState::Playing { run: id });
        self.emit(PlaybackEvent::RunStarted {
            run: id,
            plies: sequence.len(),
        });
        info!(run = id, plies = sequence.len(), "Playback started");

        Phase::Playing(Run {
            id,
            sequence,
            next: 0,
            cancel: self.shutdown.child_token(),
        })
    }

    /// Apply the next move of `run`, publish it, then wait out the move delay.
    async fn step(&mut self, mut run: Run<E::Move>) -> Phase<E::Move> {
        if run.cancel.is_cancelled() {
            return self.finish(run, RunOutcome::Cancelled);
        }

        let Some(mv) = run.sequence.get(run.next) else {
            return self.finish(run, RunOutcome::Completed);
        };

        match self.engine.apply(&self.position, mv) {
            Ok(next) => self.position = next,
            Err(e) => {
                error!(run = run.id, ply = run.next + 1, error = %e, "Move application failed, aborting run");
                return self.finish(run, RunOutcome::Failed(e));
            }
        }
        run.next += 1;

        let fen = self.engine.serialize(&self.position);
        self.published.send_replace(PublishedPosition {
            fen: fen.clone(),
            ply: run.next,
            run: Some(run.id),
        });
        self.emit(PlaybackEvent::MovePlayed {
            run: run.id,
            ply: run.next,
            san: self.engine.describe(mv),
            fen,
        });

        let deadline = Instant::now() + self.config.move_delay;
        let sleep = tokio::time::sleep_until(deadline);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => break,

                _ = run.cancel.cancelled() => break,

                Some(cmd) = self.commands.recv() => {
                    self.handle_command(cmd);
                    run.cancel.cancel();
                }

                changed = self.activation.changed(), if self.activation_open => {
                    if changed.is_err() {
                        self.activation_open = false;
                        continue;
                    }
                    self.on_activation_during_run(&run);
                }
            }
        }

        Phase::Playing(run)
    }

    fn on_activation_during_run(&mut self, run: &Run<E::Move>) {
        if *self.activation.borrow_and_update() {
            debug!(run = run.id, "Activation ignored, run already in flight");
            self.emit(PlaybackEvent::ActivationIgnored {
                reason: IgnoredReason::Busy,
            });
        } else if self.config.deactivation == DeactivationPolicy::CancelRun {
            debug!(run = run.id, "Slide deactivated, cancelling run");
            run.cancel.cancel();
        }
    }

    fn finish(&mut self, run: Run<E::Move>, outcome: RunOutcome) -> Phase<E::Move> {
        self.position = self.engine.initial_position();

        if self.config.publish_reset || matches!(outcome, RunOutcome::Failed(_)) {
            self.publish_initial();
        }

        self.state.send_replace(PlaybackState::Idle);
        info!(run = run.id, plies = run.next, outcome = ?outcome, "Playback finished");
        self.emit(PlaybackEvent::RunFinished {
            run: run.id,
            outcome,
        });

        Phase::Idle
    }

    fn handle_command(&mut self, cmd: Command<E::Move>) {
        match cmd {
            Command::Replace(sequence) => {
                debug!(plies = ?sequence.as_ref().map(|s| s.len()), "Move sequence replaced");
                self.sequence = sequence;
                self.position = self.engine.initial_position();
                self.publish_initial();
            }
        }
    }

    fn publish_initial(&self) {
        self.published.send_replace(PublishedPosition {
            fen: self.engine.serialize(&self.position),
            ply: 0,
            run: None,
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
