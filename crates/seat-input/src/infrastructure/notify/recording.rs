//! A [`NotificationSink`] that records every call.

use std::sync::Mutex;

use seat_core::{Axis, ButtonState, CapabilitySet, GlobalSlot, KeyState, TouchPhase};

use super::NotificationSink;

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Key {
        seat: String,
        time: u32,
        key: u32,
        state: KeyState,
    },
    Motion {
        seat: String,
        time: u32,
        dx: f64,
        dy: f64,
    },
    MotionAbsolute {
        seat: String,
        time: u32,
        x: f64,
        y: f64,
    },
    Button {
        seat: String,
        time: u32,
        button: u32,
        state: ButtonState,
    },
    Axis {
        seat: String,
        time: u32,
        axis: Axis,
        value: f64,
    },
    Touch {
        seat: String,
        time: u32,
        slot: GlobalSlot,
        x: f64,
        y: f64,
        phase: TouchPhase,
    },
    KeyboardFocusIn {
        seat: String,
        pressed_keys: Vec<u32>,
    },
    KeyboardFocusOut {
        seat: String,
    },
    Capabilities {
        seat: String,
        capabilities: CapabilitySet,
    },
}

/// Records notifications in call order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    log: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, notification: Notification) {
        self.log.lock().expect("lock poisoned").push(notification);
    }

    /// A copy of everything recorded so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.log.lock().expect("lock poisoned").clone()
    }

    /// Returns and clears everything recorded so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.log.lock().expect("lock poisoned"))
    }

    /// Number of focus-out notifications sent to `seat`.
    pub fn focus_out_count(&self, seat: &str) -> usize {
        self.notifications()
            .iter()
            .filter(|n| matches!(n, Notification::KeyboardFocusOut { seat: s } if s == seat))
            .count()
    }

    /// The recorded touch notifications, in order.
    pub fn touches(&self) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|n| matches!(n, Notification::Touch { .. }))
            .collect()
    }

    /// The most recent capability set announced for `seat`.
    pub fn last_capabilities(&self, seat: &str) -> Option<CapabilitySet> {
        self.notifications().iter().rev().find_map(|n| match n {
            Notification::Capabilities {
                seat: s,
                capabilities,
            } if s == seat => Some(*capabilities),
            _ => None,
        })
    }
}

impl NotificationSink for RecordingSink {
    fn notify_key(&self, seat: &str, time: u32, key: u32, state: KeyState) {
        self.push(Notification::Key {
            seat: seat.to_string(),
            time,
            key,
            state,
        });
    }

    fn notify_motion(&self, seat: &str, time: u32, dx: f64, dy: f64) {
        self.push(Notification::Motion {
            seat: seat.to_string(),
            time,
            dx,
            dy,
        });
    }

    fn notify_motion_absolute(&self, seat: &str, time: u32, x: f64, y: f64) {
        self.push(Notification::MotionAbsolute {
            seat: seat.to_string(),
            time,
            x,
            y,
        });
    }

    fn notify_button(&self, seat: &str, time: u32, button: u32, state: ButtonState) {
        self.push(Notification::Button {
            seat: seat.to_string(),
            time,
            button,
            state,
        });
    }

    fn notify_axis(&self, seat: &str, time: u32, axis: Axis, value: f64) {
        self.push(Notification::Axis {
            seat: seat.to_string(),
            time,
            axis,
            value,
        });
    }

    fn notify_touch(
        &self,
        seat: &str,
        time: u32,
        slot: GlobalSlot,
        x: f64,
        y: f64,
        phase: TouchPhase,
    ) {
        self.push(Notification::Touch {
            seat: seat.to_string(),
            time,
            slot,
            x,
            y,
            phase,
        });
    }

    fn notify_keyboard_focus_in(&self, seat: &str, pressed_keys: &[u32]) {
        self.push(Notification::KeyboardFocusIn {
            seat: seat.to_string(),
            pressed_keys: pressed_keys.to_vec(),
        });
    }

    fn notify_keyboard_focus_out(&self, seat: &str) {
        self.push(Notification::KeyboardFocusOut {
            seat: seat.to_string(),
        });
    }

    fn seat_capabilities_changed(&self, seat: &str, capabilities: CapabilitySet) {
        self.push(Notification::Capabilities {
            seat: seat.to_string(),
            capabilities,
        });
    }
}
