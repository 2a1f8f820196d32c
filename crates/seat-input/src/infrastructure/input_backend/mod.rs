//! Input library boundary.
//!
//! The compositor does not read evdev nodes itself.  A device-enumeration
//! library owns the fds, turns kernel events into [`HardwareEvent`]s and
//! keeps them in an internal queue.  This module describes what the session
//! layer needs from that library, as the [`InputBackend`] trait.
//!
//! # How the queue is consumed (for beginners)
//!
//! ```text
//!  kernel fds ──► library ──(dispatch)──► queue ──(next_event)──► session
//!                    ▲                                               │
//!                    └──── suspend / resume / led_update ◄───────────┘
//! ```
//!
//! `dispatch` only moves data from the fds into the queue; `next_event`
//! pops one entry.  The session always drains the queue completely before
//! returning to the event loop.
//!
//! # Testability
//!
//! [`mock::MockInputBackend`] is an in-memory queue with the same suspend
//! semantics, so the session and registry can be tested without hardware.

use seat_core::{DeviceHandle, HardwareEvent, Leds};
use thiserror::Error;

pub mod mock;

/// Errors reported by the input library.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("failed to dispatch input events: {0}")]
    Dispatch(String),

    #[error("failed to re-enable hardware access: {0}")]
    Resume(String),

    #[error("failed to attach {device}: {reason}")]
    Watch { device: DeviceHandle, reason: String },

    #[error("failed to read key state of {device}: {reason}")]
    KeyState { device: DeviceHandle, reason: String },
}

/// The event-producing input library, as seen by the session.
pub trait InputBackend: Send {
    /// Reads whatever is pending on the library's fds into its queue.
    fn dispatch(&mut self) -> Result<(), BackendError>;

    /// Pops the next queued event, or `None` when the queue is empty.
    fn next_event(&mut self) -> Option<HardwareEvent>;

    /// Releases hardware access.  Already-queued events stay queued.
    fn suspend(&mut self);

    /// Re-acquires hardware access after [`suspend`](Self::suspend).
    fn resume(&mut self) -> Result<(), BackendError>;

    /// Registers per-device callbacks for a device the session accepted.
    fn watch_device(&mut self, device: DeviceHandle) -> Result<(), BackendError>;

    /// Unregisters a device's callbacks.  Unknown handles are ignored.
    fn unwatch_device(&mut self, device: DeviceHandle);

    /// Keys currently held down on `device`, as evdev key codes.
    fn pressed_keys(&self, device: DeviceHandle) -> Result<Vec<u32>, BackendError>;

    /// Pushes a keyboard LED state to `device`.
    fn led_update(&mut self, device: DeviceHandle, leds: Leds);
}
