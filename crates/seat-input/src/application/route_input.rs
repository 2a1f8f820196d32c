//! InputRouter: forwards device input to the owning seat's listeners.
//!
//! Every [`InputEvent`] names the device that produced it.  The router finds
//! the device's seat, then:
//!
//! - keyboard, relative motion, button and axis events go out unchanged;
//! - absolute motion is mapped through the device's output transform;
//! - touch contacts get a seat-global slot (allocated on down, looked up on
//!   motion, released on up) and their coordinates are transformed.
//!
//! Per-event problems never fail the drain loop.  Each one is logged and
//! reported as a [`RouteOutcome`] so the session can count it.

use std::sync::Arc;

use seat_core::{DeviceHandle, GlobalSlot, InputEvent, OutputLayout, SlotError, TouchPhase};
use tracing::{debug, trace, warn};

use crate::application::seat_registry::SeatRegistry;
use crate::infrastructure::notify::NotificationSink;

/// What happened to one routed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Delivered,
    /// The device is not attached to any seat.
    UnknownDevice,
    /// Absolute event from a device that has never had an output.
    NoOutput,
    /// Touch-down with every global slot in use; the contact is dropped.
    SlotsExhausted,
    /// Touch on a local slot the device cannot have.
    SlotOutOfRange,
    /// Touch motion/up for a contact whose down was never mapped.
    UnmappedSlot,
}

/// Routes input events from attached devices.
pub struct InputRouter {
    sink: Arc<dyn NotificationSink>,
}

impl InputRouter {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Routes one event.
    pub fn route(
        &self,
        seats: &mut SeatRegistry,
        outputs: &OutputLayout,
        event: InputEvent,
    ) -> RouteOutcome {
        let device = event.device();
        let Some(seat) = seats.seat_for_device_mut(device) else {
            debug!("dropping event from unknown {device}");
            return RouteOutcome::UnknownDevice;
        };
        let seat_name = seat.name().to_string();

        match event {
            InputEvent::KeyboardKey {
                time, key, state, ..
            } => {
                trace!("{seat_name}: key {key} {state:?}");
                self.sink.notify_key(&seat_name, time, key, state);
                RouteOutcome::Delivered
            }
            InputEvent::PointerMotion { time, dx, dy, .. } => {
                self.sink.notify_motion(&seat_name, time, dx, dy);
                RouteOutcome::Delivered
            }
            InputEvent::PointerMotionAbsolute { time, x, y, .. } => {
                let mapped = seat
                    .device(device)
                    .and_then(|d| d.transform(outputs, x, y));
                let Some((gx, gy)) = mapped else {
                    debug!("{seat_name}: {device} has no output, dropping absolute motion");
                    return RouteOutcome::NoOutput;
                };
                seat.set_pointer_position(gx, gy);
                self.sink.notify_motion_absolute(&seat_name, time, gx, gy);
                RouteOutcome::Delivered
            }
            InputEvent::PointerButton {
                time,
                button,
                state,
                ..
            } => {
                self.sink.notify_button(&seat_name, time, button, state);
                RouteOutcome::Delivered
            }
            InputEvent::PointerAxis {
                time, axis, value, ..
            } => {
                self.sink.notify_axis(&seat_name, time, axis, value);
                RouteOutcome::Delivered
            }
            InputEvent::Touch {
                time,
                slot,
                x,
                y,
                phase,
                ..
            } => {
                let Some(geometry) = seat.device(device).and_then(|d| d.target_geometry(outputs))
                else {
                    debug!("{seat_name}: {device} has no output, dropping touch");
                    return RouteOutcome::NoOutput;
                };
                let result = match phase {
                    TouchPhase::Down => seat.touch_down(device, slot),
                    TouchPhase::Motion => seat.touch_lookup(device, slot),
                    TouchPhase::Up => seat.touch_up(device, slot),
                };
                let global = match result {
                    Some(Ok(global)) => global,
                    Some(Err(e)) => return self.touch_failed(&seat_name, device, phase, e),
                    None => return RouteOutcome::UnknownDevice,
                };
                let (gx, gy) = geometry.transform_point(x, y);
                self.emit_touch(&seat_name, time, global, gx, gy, phase);
                RouteOutcome::Delivered
            }
        }
    }

    fn emit_touch(
        &self,
        seat: &str,
        time: u32,
        slot: GlobalSlot,
        x: f64,
        y: f64,
        phase: TouchPhase,
    ) {
        trace!("{seat}: touch {phase:?} slot {} at ({x}, {y})", slot.0);
        self.sink.notify_touch(seat, time, slot, x, y, phase);
    }

    fn touch_failed(
        &self,
        seat: &str,
        device: DeviceHandle,
        phase: TouchPhase,
        err: SlotError,
    ) -> RouteOutcome {
        match err {
            SlotError::Exhausted => {
                warn!("{seat}: {err}, dropping touch {phase:?} from {device}");
                RouteOutcome::SlotsExhausted
            }
            SlotError::OutOfRange(_) => {
                warn!("{seat}: {err}, dropping touch {phase:?} from {device}");
                RouteOutcome::SlotOutOfRange
            }
            SlotError::Unmapped(_) => {
                debug!("{seat}: {err}, ignoring touch {phase:?} from {device}");
                RouteOutcome::UnmappedSlot
            }
        }
    }
}
