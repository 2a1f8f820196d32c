//! Seat registry: name → seat lookup and device hotplug.
//!
//! The registry owns every [`Seat`] of the session.  Seats are created on
//! demand, the first time a device names them, and live until
//! [`SeatRegistry::destroy`] is called at session teardown; a seat whose
//! last device went away stays registered.
//!
//! # Device lifecycle (for beginners)
//!
//! ```text
//!  DeviceAdded ──► add_device ──► seat.attach ──► capability edges ─► sink
//!                      │
//!                      └─► backend.watch_device
//!
//!  DeviceRemoved ─► remove_device ─► seat.detach ─► focus-out? ─► sink
//!                      │                 └─ slots freed silently
//!                      └─► backend.unwatch_device
//! ```
//!
//! Output hotplug is broadcast to every device of every seat: creation
//! binds devices whose hint names the new output (and unhinted devices that
//! have no target), destruction unbinds the devices that were bound to it.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use seat_core::{
    Capability, CapabilityChange, DeviceDescriptor, DeviceHandle, DeviceRecord, DeviceTeardown,
    Leds, Output, OutputId, OutputLayout, Seat, SeatError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::input_backend::InputBackend;
use crate::infrastructure::notify::NotificationSink;
use crate::infrastructure::storage::config::OutputHint;

/// Errors from registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Resources for the device could not be set up.  The device is
    /// skipped; the seat and all other devices are unaffected.
    #[error("failed to create {device} on seat '{seat}': {reason}")]
    AllocationFailed {
        seat: String,
        device: DeviceHandle,
        reason: String,
    },

    #[error("{device} is already attached to seat '{seat}'")]
    DuplicateDevice { seat: String, device: DeviceHandle },
}

impl From<SeatError> for RegistryError {
    fn from(err: SeatError) -> Self {
        match err {
            SeatError::AllocationFailed { seat, device } => RegistryError::AllocationFailed {
                seat,
                device,
                reason: "device list allocation failed".to_string(),
            },
            SeatError::DuplicateDevice { seat, device } => {
                RegistryError::DuplicateDevice { seat, device }
            }
        }
    }
}

/// All seats of one compositor session.
pub struct SeatRegistry {
    seats: Vec<Seat>,
    device_seats: HashMap<DeviceHandle, String>,
    default_seat: String,
    output_hints: Vec<OutputHint>,
    sink: Arc<dyn NotificationSink>,
}

impl SeatRegistry {
    /// Creates an empty registry.
    ///
    /// Devices whose descriptor names no seat join `default_seat`.
    pub fn new(default_seat: impl Into<String>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            seats: Vec::new(),
            device_seats: HashMap::new(),
            default_seat: default_seat.into(),
            output_hints: Vec::new(),
            sink,
        }
    }

    /// Static output hints for devices whose hardware reports none.
    pub fn with_output_hints(mut self, hints: Vec<OutputHint>) -> Self {
        self.output_hints = hints;
        self
    }

    pub fn sink(&self) -> &Arc<dyn NotificationSink> {
        &self.sink
    }

    // ── Seat lookup ───────────────────────────────────────────────────────────

    /// Returns the seat called `name`, creating it if it does not exist.
    ///
    /// Names are compared exactly.  A linear scan is used; a session has a
    /// handful of seats at most.
    pub fn get_or_create(&mut self, name: &str) -> &mut Seat {
        let pos = match self.seats.iter().position(|s| s.name() == name) {
            Some(pos) => pos,
            None => {
                info!("created seat '{name}'");
                self.seats.push(Seat::new(name));
                self.seats.len() - 1
            }
        };
        &mut self.seats[pos]
    }

    pub fn seat(&self, name: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.name() == name)
    }

    pub fn seat_mut(&mut self, name: &str) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.name() == name)
    }

    /// Seats in creation order.
    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter()
    }

    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    /// Total number of attached devices across all seats.
    pub fn device_count(&self) -> usize {
        self.seats.iter().map(Seat::device_count).sum()
    }

    /// Name of the seat `device` belongs to.
    pub fn seat_of(&self, device: DeviceHandle) -> Option<&str> {
        self.device_seats.get(&device).map(String::as_str)
    }

    /// The seat owning `device`.
    pub fn seat_for_device_mut(&mut self, device: DeviceHandle) -> Option<&mut Seat> {
        let name = self.device_seats.get(&device)?;
        self.seats.iter_mut().find(|s| s.name() == name)
    }

    pub fn device(&self, device: DeviceHandle) -> Option<&DeviceRecord> {
        let name = self.device_seats.get(&device)?;
        self.seat(name)?.device(device)
    }

    // ── Device hotplug ────────────────────────────────────────────────────────

    /// Creates a device record and attaches it to its seat.
    ///
    /// The seat is created if needed.  The device binds to the output named
    /// by its hint (from the hardware, else from the config) or to the first
    /// output.
    ///
    /// # Errors
    ///
    /// [`RegistryError::AllocationFailed`] if the backend cannot watch the
    /// device or the seat cannot grow; [`RegistryError::DuplicateDevice`] if
    /// the handle is already attached.  Nothing is changed on error.
    pub fn add_device(
        &mut self,
        mut descriptor: DeviceDescriptor,
        outputs: &OutputLayout,
        backend: &mut dyn InputBackend,
    ) -> Result<DeviceHandle, RegistryError> {
        let handle = descriptor.handle;
        let seat_name = descriptor
            .seat_name
            .clone()
            .unwrap_or_else(|| self.default_seat.clone());

        if let Some(existing) = self.device_seats.get(&handle) {
            return Err(RegistryError::DuplicateDevice {
                seat: existing.clone(),
                device: handle,
            });
        }

        if descriptor.output_name.is_none() {
            descriptor.output_name =
                OutputHint::lookup(&self.output_hints, &descriptor.name, &descriptor.sysname)
                    .map(str::to_string);
        }

        backend
            .watch_device(handle)
            .map_err(|e| RegistryError::AllocationFailed {
                seat: seat_name.clone(),
                device: handle,
                reason: e.to_string(),
            })?;

        let record = DeviceRecord::new(descriptor, &seat_name, outputs);
        let (name, sysname, output) = (
            record.name().to_string(),
            record.sysname().to_string(),
            record.output(),
        );

        let seat = self.get_or_create(&seat_name);
        let changes = match seat.attach(record) {
            Ok(changes) => changes,
            Err(e) => {
                backend.unwatch_device(handle);
                return Err(e.into());
            }
        };
        self.device_seats.insert(handle, seat_name.clone());

        match output {
            Some(id) => info!("input device '{name}' ({sysname}) added to seat '{seat_name}', bound to {id}"),
            None => info!("input device '{name}' ({sysname}) added to seat '{seat_name}', no output"),
        }
        self.publish_changes(&seat_name, &changes);
        Ok(handle)
    }

    /// Detaches and destroys a device.
    ///
    /// Returns `false` if the handle is unknown, e.g. because its creation
    /// failed earlier.
    pub fn remove_device(&mut self, device: DeviceHandle, backend: &mut dyn InputBackend) -> bool {
        let Some(seat_name) = self.device_seats.remove(&device) else {
            warn!("removal reported for unknown {device}");
            return false;
        };
        let Some(teardown) = self
            .seats
            .iter_mut()
            .find(|s| s.name() == seat_name)
            .and_then(|seat| seat.detach(device))
        else {
            warn!("{device} missing from seat '{seat_name}'");
            return false;
        };

        backend.unwatch_device(device);
        self.finish_teardown(&seat_name, teardown);
        true
    }

    /// Destroys every device on `seat_name`, newest first.  The seat stays.
    pub fn remove_all_devices(&mut self, seat_name: &str, backend: &mut dyn InputBackend) {
        let Some(seat) = self.seats.iter_mut().find(|s| s.name() == seat_name) else {
            return;
        };
        let teardowns = seat.detach_all();
        for teardown in teardowns {
            let device = teardown.record.handle();
            self.device_seats.remove(&device);
            backend.unwatch_device(device);
            self.finish_teardown(seat_name, teardown);
        }
    }

    /// Destroys the seat: all its devices, a forced focus-out if a keyboard
    /// is somehow still bound, then the seat itself.
    ///
    /// Seats are destroyed once, at teardown.  Destroying an unknown seat
    /// is a lifecycle bug upstream: it asserts in debug builds and returns
    /// `false` otherwise.
    pub fn destroy(&mut self, seat_name: &str, backend: &mut dyn InputBackend) -> bool {
        if self.seat(seat_name).is_none() {
            debug_assert!(false, "seat '{seat_name}' destroyed twice or never created");
            warn!("destroy requested for unknown seat '{seat_name}'; ignoring");
            return false;
        }
        self.remove_all_devices(seat_name, backend);

        let Some(pos) = self.seats.iter().position(|s| s.name() == seat_name) else {
            return false;
        };
        let seat = self.seats.remove(pos);
        if seat.capabilities().has(Capability::Keyboard) {
            self.sink.notify_keyboard_focus_out(seat_name);
        }
        info!("destroyed seat '{seat_name}'");
        true
    }

    /// Destroys every seat, newest first.
    pub fn destroy_all(&mut self, backend: &mut dyn InputBackend) {
        let names: Vec<String> = self.seats.iter().rev().map(|s| s.name().to_string()).collect();
        for name in names {
            self.destroy(&name, backend);
        }
    }

    fn finish_teardown(&self, seat_name: &str, teardown: DeviceTeardown) {
        let DeviceTeardown {
            record,
            changes,
            released_slots,
        } = teardown;
        if !released_slots.is_empty() {
            debug!(
                "released {} touch slot(s) held by {}",
                released_slots.len(),
                record.handle()
            );
        }
        info!(
            "input device '{}' ({}) removed from seat '{seat_name}'",
            record.name(),
            record.sysname()
        );
        self.publish_changes(seat_name, &changes);
    }

    /// Sends focus-out (if any) then the new capability set.
    fn publish_changes(&self, seat_name: &str, changes: &[CapabilityChange]) {
        if changes.is_empty() {
            return;
        }
        let focus_out = changes
            .iter()
            .any(|c| matches!(c, CapabilityChange::Removed { focus_out: true, .. }));
        if focus_out {
            self.sink.notify_keyboard_focus_out(seat_name);
        }
        if let Some(seat) = self.seat(seat_name) {
            let caps = seat.capabilities().exposed();
            debug!("seat '{seat_name}' capabilities now {caps}");
            self.sink.seat_capabilities_changed(seat_name, caps);
        }
    }

    // ── Output broadcast ──────────────────────────────────────────────────────

    /// Binds every device whose hint names `output`, and every unhinted
    /// device that is not bound to a live output.
    pub fn output_created(&mut self, output: &Output) {
        for seat in &mut self.seats {
            for device in seat.devices_mut() {
                if device.on_output_created(output) {
                    info!(
                        "input device '{}' bound to output '{}'",
                        device.name(),
                        output.name
                    );
                }
            }
        }
    }

    /// Unbinds every device bound to `destroyed`.
    ///
    /// `outputs` must already exclude the destroyed output.
    pub fn output_destroyed(&mut self, destroyed: OutputId, outputs: &OutputLayout) {
        for seat in &mut self.seats {
            for device in seat.devices_mut().filter(|d| d.output() == Some(destroyed)) {
                device.on_output_destroyed(outputs);
                match device.output() {
                    Some(id) => debug!("input device '{}' rebound to {id}", device.name()),
                    None => debug!("input device '{}' waiting for its output", device.name()),
                }
            }
        }
    }

    // ── Keyboard state ────────────────────────────────────────────────────────

    /// Forwards `leds` to every device on `seat_name` and remembers them.
    pub fn led_update(&mut self, seat_name: &str, leds: Leds, backend: &mut dyn InputBackend) {
        let Some(seat) = self.seat_mut(seat_name) else {
            return;
        };
        seat.set_leds(leds);
        for device in seat.devices() {
            backend.led_update(device.handle(), leds);
        }
    }

    /// Records whether `seat_name`'s keyboard holds focus.
    ///
    /// Returns `false` if the seat does not exist or has no keyboard.
    pub fn set_keyboard_focus(&mut self, seat_name: &str, focused: bool) -> bool {
        self.seat_mut(seat_name)
            .map(|seat| seat.set_keyboard_focused(focused))
            .unwrap_or(false)
    }

    /// Gives keyboard focus to every seat with a keyboard, reporting the
    /// keys already held down on any of its devices.
    pub fn focus_in_keyboards(&mut self, backend: &dyn InputBackend) {
        for seat in &mut self.seats {
            if !seat.capabilities().has(Capability::Keyboard) {
                continue;
            }
            let mut pressed = BTreeSet::new();
            for device in seat.devices() {
                match backend.pressed_keys(device.handle()) {
                    Ok(keys) => pressed.extend(keys),
                    Err(e) => warn!("skipping key state of '{}': {e}", device.name()),
                }
            }
            let keys: Vec<u32> = pressed.into_iter().collect();
            seat.set_keyboard_focused(true);
            self.sink.notify_keyboard_focus_in(seat.name(), &keys);
        }
    }

    /// Mode size of the output `device` maps absolute axes onto.
    pub fn screen_dimensions(
        &self,
        device: DeviceHandle,
        outputs: &OutputLayout,
    ) -> Option<(u32, u32)> {
        self.device(device)?.screen_dimensions(outputs)
    }
}
