//! Hardware event stream types.
//!
//! The input library hands events over one at a time from its queue.  Each
//! one is either a device lifecycle change (added / removed) or an input
//! event produced by a device that is already attached.  Event kinds this
//! crate does not understand are surfaced as [`HardwareEvent::Unknown`] so a
//! richer library version never breaks dispatch.

use crate::domain::capability::CapabilitySet;
use crate::domain::device::DeviceHandle;

/// Everything the input library reports about a device when it appears.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    pub handle: DeviceHandle,
    /// Kernel name of the event node, e.g. `"event4"`.
    pub sysname: String,
    /// Human-readable product name.
    pub name: String,
    /// Seat the device is assigned to; `None` means the configured default.
    pub seat_name: Option<String>,
    /// Capabilities declared by the hardware.  Fixed for the device lifetime.
    pub capabilities: CapabilitySet,
    /// Output the device is physically attached to (e.g. a touchscreen panel).
    pub output_name: Option<String>,
}

/// Key or button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Released,
    Pressed,
}

/// Pointer button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Released,
    Pressed,
}

/// Scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Phase of a touch contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Motion,
    Up,
}

/// An input event from an attached device.
///
/// `time` is the library's millisecond timestamp.  Absolute coordinates are
/// in the bound output's mode pixels; relative deltas are unaccelerated
/// device units already processed by the library.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyboardKey {
        device: DeviceHandle,
        time: u32,
        key: u32,
        state: KeyState,
    },
    PointerMotion {
        device: DeviceHandle,
        time: u32,
        dx: f64,
        dy: f64,
    },
    PointerMotionAbsolute {
        device: DeviceHandle,
        time: u32,
        x: f64,
        y: f64,
    },
    PointerButton {
        device: DeviceHandle,
        time: u32,
        button: u32,
        state: ButtonState,
    },
    PointerAxis {
        device: DeviceHandle,
        time: u32,
        axis: Axis,
        value: f64,
    },
    Touch {
        device: DeviceHandle,
        time: u32,
        /// Device-local slot; never forwarded as-is.
        slot: u32,
        x: f64,
        y: f64,
        phase: TouchPhase,
    },
}

impl InputEvent {
    /// The device that produced this event.
    pub fn device(&self) -> DeviceHandle {
        match self {
            InputEvent::KeyboardKey { device, .. }
            | InputEvent::PointerMotion { device, .. }
            | InputEvent::PointerMotionAbsolute { device, .. }
            | InputEvent::PointerButton { device, .. }
            | InputEvent::PointerAxis { device, .. }
            | InputEvent::Touch { device, .. } => *device,
        }
    }
}

/// One entry drained from the input library's event queue.
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareEvent {
    DeviceAdded(DeviceDescriptor),
    DeviceRemoved { device: DeviceHandle },
    Input(InputEvent),
    /// An event kind this crate does not handle.  `kind` is the library's
    /// raw type code, kept for diagnostics.
    Unknown {
        device: Option<DeviceHandle>,
        kind: u32,
    },
}
