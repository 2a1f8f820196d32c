//! Domain entities for seat input bookkeeping.
//!
//! This module contains pure logic with no I/O: nothing here opens a device
//! node, reads an fd, or talks to the compositor.  The application layer in
//! `seat-input` drives these types and turns their return values into
//! notifications.
//!
//! # Layering (for beginners)
//!
//! ```text
//!   capability  ── ref-counted keyboard/pointer/touch per seat
//!   slot        ── local → global multitouch ids
//!   output      ── display geometry and the absolute-coordinate transform
//!   device      ── one physical device: seat, output binding, slot table
//!   seat        ── owns devices, the aggregator and the slot bitmap
//! ```
//!
//! Each layer only depends on the ones above it in this list.

pub mod capability;
pub mod device;
pub mod output;
pub mod seat;
pub mod slot;
