//! Events consumed from the input library.
//!
//! See [`hardware::HardwareEvent`] for the tagged event type drained by the
//! session controller.

pub mod hardware;
