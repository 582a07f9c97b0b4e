//! Async playback service
//!
//! Runs a `PlaybackManager` on a tokio task. A single control loop owns the
//! manager and serializes everything that touches it:
//!
//! - engine events (pushed through an `EngineEventSender`)
//! - UI requests (sent through a cloneable `PlaybackHandle`)
//! - outcomes of dispatched engine commands
//! - the display frame interval driving the position clock
//! - the earliest pending timer deadline
//!
//! Engine commands are executed by a separate dispatcher task, one at a
//! time in issue order, so a slow engine never blocks the control loop.

use crate::engine::{AudioEngine, CommandOutcome, EngineCommand, EngineEvent};
use crate::error::{PlaybackError, Result};
use crate::events::{PlaybackSnapshot, PlayerEvent};
use crate::manager::PlaybackManager;
use crate::types::{RepeatMode, ShuffleMode};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

const REQUEST_CAPACITY: usize = 64;
const ENGINE_EVENT_CAPACITY: usize = 256;
const PLAYER_EVENT_CAPACITY: usize = 256;

/// Requests from the UI to the control loop
#[derive(Debug)]
enum PlaybackRequest {
    Seek(f64),
    Toggle,
    Next,
    Previous,
    CycleShuffle(oneshot::Sender<ShuffleMode>),
    CycleRepeat(oneshot::Sender<RepeatMode>),
    PlayIndex(usize, oneshot::Sender<Result<()>>),
    Enqueue(PathBuf, oneshot::Sender<Result<()>>),
    EnqueueNext(PathBuf, oneshot::Sender<Result<()>>),
    ClearQueue,
    SetVolume(u8),
    ToggleMute,
    Stop,
    Shutdown,
}

/// Sender for events coming from the native engine
#[derive(Debug, Clone)]
pub struct EngineEventSender {
    tx: mpsc::Sender<EngineEvent>,
}

impl EngineEventSender {
    /// Forward an engine event, waiting for room in the channel
    pub async fn send(&self, event: EngineEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| PlaybackError::ServiceClosed)
    }

    /// Forward an engine event from a non-async context (e.g. an engine callback thread)
    pub fn try_send(&self, event: EngineEvent) -> Result<()> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(event) => {
                warn!(?event, "Engine event channel full, dropping event");
                PlaybackError::EventChannelFull
            }
            mpsc::error::TrySendError::Closed(_) => PlaybackError::ServiceClosed,
        })
    }
}

/// Cloneable UI-facing handle to the running service
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    requests: mpsc::Sender<PlaybackRequest>,
    engine_events: EngineEventSender,
    snapshot: watch::Receiver<PlaybackSnapshot>,
    events: broadcast::Sender<PlayerEvent>,
}

impl PlaybackHandle {
    async fn send(&self, request: PlaybackRequest) -> Result<()> {
        self.requests
            .send(request)
            .await
            .map_err(|_| PlaybackError::ServiceClosed)
    }

    async fn ask<T>(
        &self,
        request: impl FnOnce(oneshot::Sender<T>) -> PlaybackRequest,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(request(tx)).await?;
        rx.await.map_err(|_| PlaybackError::ServiceClosed)
    }

    /// Seek to a fraction (0.0-1.0) of the current track
    pub async fn request_seek(&self, fraction: f64) -> Result<()> {
        self.send(PlaybackRequest::Seek(fraction)).await
    }

    /// Play/pause toggle
    pub async fn request_toggle(&self) -> Result<()> {
        self.send(PlaybackRequest::Toggle).await
    }

    pub async fn request_next(&self) -> Result<()> {
        self.send(PlaybackRequest::Next).await
    }

    pub async fn request_previous(&self) -> Result<()> {
        self.send(PlaybackRequest::Previous).await
    }

    pub async fn cycle_shuffle(&self) -> Result<ShuffleMode> {
        self.ask(PlaybackRequest::CycleShuffle).await
    }

    pub async fn cycle_repeat(&self) -> Result<RepeatMode> {
        self.ask(PlaybackRequest::CycleRepeat).await
    }

    /// Play the catalog entry at `index`
    pub async fn play_index(&self, index: usize) -> Result<()> {
        self.ask(|tx| PlaybackRequest::PlayIndex(index, tx)).await?
    }

    /// Append a catalog track to the queue
    pub async fn enqueue(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        self.ask(|tx| PlaybackRequest::Enqueue(path, tx)).await?
    }

    /// Queue a catalog track to play right after the current one
    pub async fn enqueue_next(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        self.ask(|tx| PlaybackRequest::EnqueueNext(path, tx)).await?
    }

    pub async fn clear_queue(&self) -> Result<()> {
        self.send(PlaybackRequest::ClearQueue).await
    }

    /// Set volume level (0-100)
    pub async fn set_volume(&self, level: u8) -> Result<()> {
        self.send(PlaybackRequest::SetVolume(level)).await
    }

    pub async fn toggle_mute(&self) -> Result<()> {
        self.send(PlaybackRequest::ToggleMute).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(PlaybackRequest::Stop).await
    }

    /// Ask the control loop to exit
    pub async fn shutdown(&self) -> Result<()> {
        self.send(PlaybackRequest::Shutdown).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified on every snapshot change
    pub fn watch_snapshot(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.clone()
    }

    pub fn displayed_position(&self) -> f64 {
        self.snapshot.borrow().position
    }

    pub fn duration(&self) -> f64 {
        self.snapshot.borrow().duration
    }

    pub fn is_playing(&self) -> bool {
        self.snapshot.borrow().is_playing
    }

    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.snapshot.borrow().shuffle
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.snapshot.borrow().repeat
    }

    /// Subscribe to player events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Sender the engine bridge uses to push events
    pub fn engine_events(&self) -> EngineEventSender {
        self.engine_events.clone()
    }
}

/// Running playback service
#[derive(Debug)]
pub struct PlaybackService {
    handle: PlaybackHandle,
    control: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl PlaybackService {
    /// Spawn the control loop and command dispatcher on the current runtime
    pub fn spawn(mut manager: PlaybackManager, engine: Arc<dyn AudioEngine>) -> Self {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_CAPACITY);
        let (engine_tx, engine_rx) = mpsc::channel(ENGINE_EVENT_CAPACITY);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(PLAYER_EVENT_CAPACITY);

        manager.sync_engine();
        let (snapshot_tx, snapshot_rx) = watch::channel(manager.snapshot());

        let dispatcher = tokio::spawn(dispatch_commands(engine, command_rx, outcome_tx));

        let control = ControlLoop {
            manager,
            requests: request_rx,
            engine_events: engine_rx,
            outcomes: outcome_rx,
            commands: command_tx,
            events: events_tx.clone(),
            snapshot: snapshot_tx,
        };
        let control = tokio::spawn(control.run());

        info!("Playback service started");
        Self {
            handle: PlaybackHandle {
                requests: request_tx,
                engine_events: EngineEventSender { tx: engine_tx },
                snapshot: snapshot_rx,
                events: events_tx,
            },
            control,
            dispatcher,
        }
    }

    pub fn handle(&self) -> PlaybackHandle {
        self.handle.clone()
    }

    /// Shut the control loop down and wait for both tasks
    pub async fn shutdown(self) {
        // Already gone if every request sender dropped
        let _ = self.handle.shutdown().await;
        drop(self.handle);

        if let Err(e) = self.control.await {
            error!("Control loop panicked: {e}");
        }
        if let Err(e) = self.dispatcher.await {
            error!("Command dispatcher panicked: {e}");
        }
        info!("Playback service stopped");
    }
}

/// Execute engine commands one at a time, in issue order
async fn dispatch_commands(
    engine: Arc<dyn AudioEngine>,
    mut commands: mpsc::UnboundedReceiver<EngineCommand>,
    outcomes: mpsc::UnboundedSender<CommandOutcome>,
) {
    while let Some(command) = commands.recv().await {
        trace!(%command, "Dispatching engine command");
        let result = engine.execute(&command).await;
        if outcomes.send(CommandOutcome { command, result }).is_err() {
            break;
        }
    }
    debug!("Command dispatcher exiting");
}

struct ControlLoop {
    manager: PlaybackManager,
    requests: mpsc::Receiver<PlaybackRequest>,
    engine_events: mpsc::Receiver<EngineEvent>,
    outcomes: mpsc::UnboundedReceiver<CommandOutcome>,
    commands: mpsc::UnboundedSender<EngineCommand>,
    events: broadcast::Sender<PlayerEvent>,
    snapshot: watch::Sender<PlaybackSnapshot>,
}

impl ControlLoop {
    async fn run(mut self) {
        let mut frames = time::interval(self.manager.config().frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut engine_open = true;

        // Flush the startup volume
        self.flush();

        loop {
            let deadline = self.manager.next_deadline();

            tokio::select! {
                event = self.engine_events.recv(), if engine_open => match event {
                    Some(event) => self.manager.handle_engine_event(event, Instant::now()),
                    None => {
                        warn!("Engine event channel closed");
                        engine_open = false;
                    }
                },
                request = self.requests.recv() => match request {
                    Some(PlaybackRequest::Shutdown) | None => break,
                    Some(request) => self.handle_request(request),
                },
                Some(outcome) = self.outcomes.recv() => {
                    self.manager.on_command_outcome(outcome);
                }
                () = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.manager.poll_timers(Instant::now());
                }
                _ = frames.tick() => {
                    self.manager.tick(Instant::now());
                }
            }

            self.flush();
        }

        debug!("Control loop exiting");
    }

    fn handle_request(&mut self, request: PlaybackRequest) {
        let now = Instant::now();
        let manager = &mut self.manager;

        match request {
            PlaybackRequest::Seek(fraction) => {
                if let Err(e) = manager.request_seek(fraction, now) {
                    debug!("Seek ignored: {e}");
                }
            }
            PlaybackRequest::Toggle => {
                manager.request_toggle(now);
            }
            PlaybackRequest::Next => {
                manager.request_next();
            }
            PlaybackRequest::Previous => {
                if let Err(e) = manager.request_previous(now) {
                    debug!("Previous ignored: {e}");
                }
            }
            PlaybackRequest::CycleShuffle(reply) => {
                let _ = reply.send(manager.cycle_shuffle());
            }
            PlaybackRequest::CycleRepeat(reply) => {
                let _ = reply.send(manager.cycle_repeat());
            }
            PlaybackRequest::PlayIndex(index, reply) => {
                let _ = reply.send(manager.play_index(index));
            }
            PlaybackRequest::Enqueue(path, reply) => {
                let _ = reply.send(manager.enqueue(&path));
            }
            PlaybackRequest::EnqueueNext(path, reply) => {
                let _ = reply.send(manager.enqueue_next(&path));
            }
            PlaybackRequest::ClearQueue => manager.clear_queue(),
            PlaybackRequest::SetVolume(level) => manager.set_volume(level),
            PlaybackRequest::ToggleMute => manager.toggle_mute(),
            PlaybackRequest::Stop => manager.stop(),
            PlaybackRequest::Shutdown => {}
        }
    }

    /// Forward queued commands and events, publish the snapshot
    fn flush(&mut self) {
        for command in self.manager.drain_commands() {
            if self.commands.send(command).is_err() {
                error!("Command dispatcher is gone");
            }
        }

        for event in self.manager.drain_events() {
            // No subscribers is fine
            let _ = self.events.send(event);
        }

        let snapshot = self.manager.snapshot();
        self.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
