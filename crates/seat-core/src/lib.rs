//! # seat-core
//!
//! Domain layer for compositor input seats: capability aggregation, device
//! records, output binding and multitouch slot remapping.
//!
//! This crate has zero dependencies on OS APIs, the input library, or the
//! compositor.  It is driven by the `seat-input` crate.
//!
//! # Overview (for beginners)
//!
//! A *seat* is one user's logical input identity: one keyboard, one pointer,
//! one touch surface as far as applications are concerned.  Behind it sit
//! any number of physical devices that come and go while the session runs.
//!
//! - **`domain`** – the seat, device, capability, output and slot types.
//!
//! - **`event`** – the tagged event type drained from the input library.

pub mod domain;
pub mod event;

pub use domain::capability::{
    Capability, CapabilityAggregator, CapabilityChange, CapabilitySet, Leds, SeatKeyboard,
    SeatPointer, SeatTouch,
};
pub use domain::device::{DeviceHandle, DeviceRecord};
pub use domain::output::{Output, OutputGeometry, OutputId, OutputLayout, OutputTransform};
pub use domain::seat::{DeviceTeardown, Seat, SeatError};
pub use domain::slot::{
    GlobalSlot, SlotAllocator, SlotBitmap, SlotError, SlotTable, DEVICE_SLOT_COUNT,
    GLOBAL_SLOT_CAPACITY,
};
pub use event::hardware::{
    Axis, ButtonState, DeviceDescriptor, HardwareEvent, InputEvent, KeyState, TouchPhase,
};
