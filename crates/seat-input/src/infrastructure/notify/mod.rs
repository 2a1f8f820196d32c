//! Outbound notifications to the compositor core.
//!
//! Everything the input layer tells the rest of the compositor goes through
//! [`NotificationSink`]: routed input, keyboard focus changes and seat
//! capability changes.  Coordinates handed to the sink are already in global
//! compositor space, and touch slots are already seat-global.
//!
//! [`recording::RecordingSink`] captures every call in order, for tests.

use seat_core::{Axis, ButtonState, CapabilitySet, GlobalSlot, KeyState, TouchPhase};

pub mod recording;

/// Receiver of routed input for all seats.
pub trait NotificationSink: Send + Sync {
    fn notify_key(&self, seat: &str, time: u32, key: u32, state: KeyState);

    /// Relative pointer motion, untransformed.
    fn notify_motion(&self, seat: &str, time: u32, dx: f64, dy: f64);

    /// Absolute pointer position in global compositor space.
    fn notify_motion_absolute(&self, seat: &str, time: u32, x: f64, y: f64);

    fn notify_button(&self, seat: &str, time: u32, button: u32, state: ButtonState);

    fn notify_axis(&self, seat: &str, time: u32, axis: Axis, value: f64);

    /// Touch contact on a seat-global slot, in global compositor space.
    fn notify_touch(
        &self,
        seat: &str,
        time: u32,
        slot: GlobalSlot,
        x: f64,
        y: f64,
        phase: TouchPhase,
    );

    /// Keyboard focus entered with `pressed_keys` already held down.
    fn notify_keyboard_focus_in(&self, seat: &str, pressed_keys: &[u32]);

    fn notify_keyboard_focus_out(&self, seat: &str);

    /// The set of logical devices exposed by `seat` changed.
    fn seat_capabilities_changed(&self, seat: &str, capabilities: CapabilitySet);
}
