//! The seat entity: one user's combined keyboard/pointer/touch identity.
//!
//! A [`Seat`] owns its member [`DeviceRecord`]s, its
//! [`CapabilityAggregator`] and its global touch [`SlotBitmap`].  All
//! mutation of the aggregator and the bitmap goes through the methods here,
//! which is what keeps the two seat invariants in one place:
//!
//! - the logical keyboard/pointer/touch exists iff its ref-count is nonzero;
//! - bit *i* of the bitmap is set iff some member device maps a live contact
//!   to global slot *i*.
//!
//! A seat is never dropped because its device list became empty; only the
//! owner (the registry) destroys seats, at session teardown.

use thiserror::Error;

use crate::domain::capability::{CapabilityAggregator, CapabilityChange, Leds};
use crate::domain::device::{DeviceHandle, DeviceRecord};
use crate::domain::slot::{GlobalSlot, SlotAllocator, SlotBitmap, SlotError};

/// Errors from seat membership changes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeatError {
    /// Growing the device list failed.
    #[error("could not allocate a device entry on seat '{seat}' for {device}")]
    AllocationFailed { seat: String, device: DeviceHandle },

    /// A device with the same handle is already attached.
    #[error("{device} is already attached to seat '{seat}'")]
    DuplicateDevice { seat: String, device: DeviceHandle },
}

/// What detaching a device did to its seat.
#[derive(Debug)]
pub struct DeviceTeardown {
    /// The detached record; dropping it ends the device's life.
    pub record: DeviceRecord,
    /// 0↔1 capability edges caused by the removal.
    pub changes: Vec<CapabilityChange>,
    /// Global slots the device still held.
    pub released_slots: Vec<GlobalSlot>,
}

/// A named seat.
#[derive(Debug)]
pub struct Seat {
    name: String,
    devices: Vec<DeviceRecord>,
    capabilities: CapabilityAggregator,
    slots: SlotBitmap,
}

impl Seat {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            devices: Vec::new(),
            capabilities: CapabilityAggregator::new(),
            slots: SlotBitmap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member devices in arrival order.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.devices.iter()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn device(&self, handle: DeviceHandle) -> Option<&DeviceRecord> {
        self.devices.iter().find(|d| d.handle() == handle)
    }

    pub fn device_mut(&mut self, handle: DeviceHandle) -> Option<&mut DeviceRecord> {
        self.devices.iter_mut().find(|d| d.handle() == handle)
    }

    pub fn devices_mut(&mut self) -> impl Iterator<Item = &mut DeviceRecord> {
        self.devices.iter_mut()
    }

    pub fn capabilities(&self) -> &CapabilityAggregator {
        &self.capabilities
    }

    pub fn slot_bitmap(&self) -> SlotBitmap {
        self.slots
    }

    /// Appends `record` and registers each of its capabilities.
    ///
    /// # Errors
    ///
    /// [`SeatError::AllocationFailed`] if the device list cannot grow,
    /// [`SeatError::DuplicateDevice`] if the handle is already a member.
    /// The seat is unchanged on error.
    pub fn attach(&mut self, record: DeviceRecord) -> Result<Vec<CapabilityChange>, SeatError> {
        if self.device(record.handle()).is_some() {
            return Err(SeatError::DuplicateDevice {
                seat: self.name.clone(),
                device: record.handle(),
            });
        }
        self.devices
            .try_reserve(1)
            .map_err(|_| SeatError::AllocationFailed {
                seat: self.name.clone(),
                device: record.handle(),
            })?;

        let changes = record
            .capabilities()
            .iter()
            .filter_map(|cap| self.capabilities.add(cap))
            .collect();
        self.devices.push(record);
        Ok(changes)
    }

    /// Removes the device, unregisters its capabilities and frees its slots.
    ///
    /// Returns `None` if `handle` is not a member.
    pub fn detach(&mut self, handle: DeviceHandle) -> Option<DeviceTeardown> {
        let pos = self.devices.iter().position(|d| d.handle() == handle)?;
        let mut record = self.devices.remove(pos);

        let released_slots = SlotAllocator::new(&mut self.slots, &mut record.slots).release_all();
        if let Some(touch) = self.capabilities.touch_mut() {
            touch.active_contacts = self.slots.count();
        }

        let changes = record
            .capabilities()
            .iter()
            .filter_map(|cap| self.capabilities.remove(cap))
            .collect();

        Some(DeviceTeardown {
            record,
            changes,
            released_slots,
        })
    }

    /// Removes every member device, newest first.
    pub fn detach_all(&mut self) -> Vec<DeviceTeardown> {
        let handles: Vec<DeviceHandle> = self.devices.iter().rev().map(|d| d.handle()).collect();
        handles
            .into_iter()
            .filter_map(|handle| self.detach(handle))
            .collect()
    }

    // ── Touch slots ───────────────────────────────────────────────────────────

    /// Allocates a global slot for a new contact on `handle`'s `local` slot.
    ///
    /// Returns `None` if the device is not a member.
    pub fn touch_down(
        &mut self,
        handle: DeviceHandle,
        local: u32,
    ) -> Option<Result<GlobalSlot, SlotError>> {
        let device = self.devices.iter_mut().find(|d| d.handle() == handle)?;
        let result = SlotAllocator::new(&mut self.slots, &mut device.slots).allocate(local);
        if result.is_ok() {
            if let Some(touch) = self.capabilities.touch_mut() {
                touch.active_contacts = self.slots.count();
            }
        }
        Some(result)
    }

    /// Looks up the global slot of an in-progress contact.
    pub fn touch_lookup(
        &self,
        handle: DeviceHandle,
        local: u32,
    ) -> Option<Result<GlobalSlot, SlotError>> {
        let device = self.devices.iter().find(|d| d.handle() == handle)?;
        Some(device.slots().lookup(local))
    }

    /// Releases the global slot of a lifted contact.
    pub fn touch_up(
        &mut self,
        handle: DeviceHandle,
        local: u32,
    ) -> Option<Result<GlobalSlot, SlotError>> {
        let device = self.devices.iter_mut().find(|d| d.handle() == handle)?;
        let result = SlotAllocator::new(&mut self.slots, &mut device.slots).release(local);
        if result.is_ok() {
            if let Some(touch) = self.capabilities.touch_mut() {
                touch.active_contacts = self.slots.count();
            }
        }
        Some(result)
    }

    // ── Keyboard state ────────────────────────────────────────────────────────

    /// Records whether the seat's keyboard holds focus.
    ///
    /// Returns `false` if the seat has no keyboard.
    pub fn set_keyboard_focused(&mut self, focused: bool) -> bool {
        match self.capabilities.keyboard_mut() {
            Some(keyboard) => {
                keyboard.focused = focused;
                true
            }
            None => false,
        }
    }

    /// Remembers the LED state on the logical keyboard, if any.
    pub fn set_leds(&mut self, leds: Leds) {
        if let Some(keyboard) = self.capabilities.keyboard_mut() {
            keyboard.leds = leds;
        }
    }

    /// Records the last absolute pointer position.
    pub fn set_pointer_position(&mut self, x: f64, y: f64) {
        if let Some(pointer) = self.capabilities.pointer_mut() {
            pointer.last_absolute = Some((x, y));
        }
    }
}
