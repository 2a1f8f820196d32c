//! Outer event loop.
//!
//! The compositor's main loop learns about three kinds of things that the
//! input layer must react to: the input library's fd became readable, the
//! session manager switched the session on or off, and outputs came or went.
//! Each is sent here as a [`LoopSignal`]; the loop task turns it into a
//! synchronous [`SessionController`] call.
//!
//! ```text
//!  fd watcher ──┐
//!  logind ──────┼──► mpsc::Sender<LoopSignal> ──► run() ──► SessionController
//!  outputs ─────┘
//! ```
//!
//! The controller is owned by the loop task, so no locking is needed around
//! seat state.

use seat_core::{Leds, Output, OutputGeometry, OutputId};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::application::session::{DispatchStats, SessionController};

/// Capacity of the signal channel.
pub const SIGNAL_QUEUE_DEPTH: usize = 64;

/// Something the loop must hand to the controller.
#[derive(Debug, Clone)]
pub enum LoopSignal {
    /// The input library's fd is readable.
    Readable,
    /// The session became active (`true`) or inactive (`false`).
    SessionActive(bool),
    OutputCreated(Output),
    OutputDestroyed(OutputId),
    OutputChanged(OutputId, OutputGeometry),
    LedUpdate { seat: String, leds: Leds },
    /// Tear everything down and end the loop.
    Shutdown,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoopError {
    #[error("input event loop has stopped")]
    Closed,
}

/// Sending side of a running loop.
#[derive(Debug, Clone)]
pub struct EventLoopHandle {
    tx: mpsc::Sender<LoopSignal>,
}

impl EventLoopHandle {
    /// Queues `signal` for the loop.
    ///
    /// # Errors
    ///
    /// [`LoopError::Closed`] if the loop has already ended.
    pub async fn send(&self, signal: LoopSignal) -> Result<(), LoopError> {
        self.tx.send(signal).await.map_err(|_| LoopError::Closed)
    }

    pub async fn readable(&self) -> Result<(), LoopError> {
        self.send(LoopSignal::Readable).await
    }

    pub async fn shutdown(&self) -> Result<(), LoopError> {
        self.send(LoopSignal::Shutdown).await
    }
}

/// Starts the controller and processes signals until [`LoopSignal::Shutdown`]
/// or until every sender is dropped.  Returns the controller, still holding
/// its seats.
pub async fn run(
    mut controller: SessionController,
    mut signals: mpsc::Receiver<LoopSignal>,
) -> SessionController {
    let found = controller.start();
    info!("input event loop started ({found} initial event(s))");

    while let Some(signal) = signals.recv().await {
        match signal {
            LoopSignal::Readable => {
                controller.on_readable();
            }
            LoopSignal::SessionActive(active) => {
                if let Err(e) = controller.set_session_active(active) {
                    error!("{e}");
                }
            }
            LoopSignal::OutputCreated(output) => controller.output_created(output),
            LoopSignal::OutputDestroyed(id) => controller.output_destroyed(id),
            LoopSignal::OutputChanged(id, geometry) => controller.output_changed(id, geometry),
            LoopSignal::LedUpdate { seat, leds } => controller.led_update(&seat, leds),
            LoopSignal::Shutdown => break,
        }
    }

    info!("input event loop stopped");
    controller
}

/// Spawns [`run`] on the current tokio runtime.
///
/// The task shuts the controller down when the loop ends and yields its
/// final statistics.
pub fn spawn(controller: SessionController) -> (EventLoopHandle, JoinHandle<DispatchStats>) {
    let (tx, rx) = mpsc::channel(SIGNAL_QUEUE_DEPTH);
    let task = tokio::spawn(async move { run(controller, rx).await.shutdown() });
    (EventLoopHandle { tx }, task)
}
