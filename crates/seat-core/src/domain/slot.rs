//! Multitouch slot allocation: device-local contact ids → seat-global ids.
//!
//! # Why remap slots? (for beginners)
//!
//! A touchscreen numbers the fingers currently on its surface 0, 1, 2, …
//! and reuses a number as soon as that finger lifts.  Two touchscreens on
//! the same seat therefore both report "slot 0" for their first finger.
//! Clients of the compositor see one flat numbering per seat, so every
//! contact must be given a seat-wide id that no other live contact shares.
//!
//! The seat owns a fixed-width [`SlotBitmap`]: bit *i* is set while some
//! contact is using global slot *i*.  Each device owns a [`SlotTable`]
//! mapping its local slot numbers to the global ids it was handed.
//!
//! ```text
//!   device A local 0 ──► global 0      bitmap: 0b0000_0111
//!   device B local 0 ──► global 1
//!   device A local 1 ──► global 2
//! ```
//!
//! Allocation always picks the **lowest** clear bit, so numbering is
//! deterministic and freed ids are reused before higher ones.

use std::fmt;

use thiserror::Error;

/// Number of contacts a single device can track (local slots `0..16`).
pub const DEVICE_SLOT_COUNT: usize = 16;

/// Number of concurrent contacts a seat can expose (width of [`SlotBitmap`]).
///
/// A 65th simultaneous contact on one seat is dropped with
/// [`SlotError::Exhausted`].
pub const GLOBAL_SLOT_CAPACITY: u32 = u64::BITS;

/// Seat-wide multitouch contact id; the only touch identity consumers see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalSlot(pub u32);

impl fmt::Display for GlobalSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors reported by the slot allocator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    /// Every bit of the seat bitmap is set.
    #[error("all 64 global touch slots are in use")]
    Exhausted,

    /// The local slot has no recorded global mapping.
    #[error("local touch slot {0} has no global mapping")]
    Unmapped(u32),

    /// The device reported a slot outside its table.
    #[error("local touch slot {0} is outside the device slot table (0..16)")]
    OutOfRange(u32),
}

/// Fixed-width bitmap of in-use global slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotBitmap {
    bits: u64,
}

impl SlotBitmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets and returns the lowest clear bit.
    pub fn acquire_lowest(&mut self) -> Result<GlobalSlot, SlotError> {
        let free = !self.bits;
        if free == 0 {
            return Err(SlotError::Exhausted);
        }
        let index = free.trailing_zeros();
        self.bits |= 1 << index;
        Ok(GlobalSlot(index))
    }

    /// Clears the bit for `slot`.
    pub fn clear(&mut self, slot: GlobalSlot) {
        if slot.0 < GLOBAL_SLOT_CAPACITY {
            self.bits &= !(1u64 << slot.0);
        }
    }

    pub fn is_set(&self, slot: GlobalSlot) -> bool {
        slot.0 < GLOBAL_SLOT_CAPACITY && self.bits & (1u64 << slot.0) != 0
    }

    /// Number of global slots currently in use.
    pub fn count(&self) -> u32 {
        self.bits.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Raw bitmap value, bit *i* = global slot *i*.
    pub fn bits(&self) -> u64 {
        self.bits
    }
}

/// Per-device mapping of local slot → global slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotTable {
    entries: [Option<GlobalSlot>; DEVICE_SLOT_COUNT],
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(local: u32) -> Result<usize, SlotError> {
        let idx = local as usize;
        if idx < DEVICE_SLOT_COUNT {
            Ok(idx)
        } else {
            Err(SlotError::OutOfRange(local))
        }
    }

    /// Global slots this device currently holds.
    pub fn live(&self) -> impl Iterator<Item = GlobalSlot> + '_ {
        self.entries.iter().flatten().copied()
    }

    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Global slot mapped to `local`, without touching any bitmap.
    ///
    /// # Errors
    ///
    /// [`SlotError::OutOfRange`] or [`SlotError::Unmapped`].
    pub fn lookup(&self, local: u32) -> Result<GlobalSlot, SlotError> {
        let idx = Self::index(local)?;
        self.entries[idx].ok_or(SlotError::Unmapped(local))
    }
}

/// Allocator view over one seat bitmap and one device table.
///
/// Borrowing both together keeps the `slot_bitmap` ⇔ slot-table invariant
/// in a single place: a bit is set iff some table maps a live contact to it.
pub struct SlotAllocator<'a> {
    bitmap: &'a mut SlotBitmap,
    table: &'a mut SlotTable,
}

impl<'a> SlotAllocator<'a> {
    pub fn new(bitmap: &'a mut SlotBitmap, table: &'a mut SlotTable) -> Self {
        Self { bitmap, table }
    }

    /// Assigns the lowest free global slot to `local` (touch down).
    ///
    /// If `local` is still mapped from a contact whose up event was lost,
    /// the stale global slot is released first so it cannot leak.
    ///
    /// # Errors
    ///
    /// [`SlotError::OutOfRange`] for a local slot beyond the table,
    /// [`SlotError::Exhausted`] when the seat bitmap is full.  In both cases
    /// nothing is modified.
    pub fn allocate(&mut self, local: u32) -> Result<GlobalSlot, SlotError> {
        let idx = SlotTable::index(local)?;
        if let Some(stale) = self.table.entries[idx].take() {
            tracing::debug!("local slot {local} re-used before release; freeing global slot {stale}");
            self.bitmap.clear(stale);
        }
        let global = self.bitmap.acquire_lowest()?;
        self.table.entries[idx] = Some(global);
        Ok(global)
    }

    /// Releases the global slot mapped to `local` (touch up).
    ///
    /// # Errors
    ///
    /// [`SlotError::Unmapped`] if no contact is live on `local`.
    pub fn release(&mut self, local: u32) -> Result<GlobalSlot, SlotError> {
        let idx = SlotTable::index(local)?;
        let global = self.table.entries[idx]
            .take()
            .ok_or(SlotError::Unmapped(local))?;
        self.bitmap.clear(global);
        Ok(global)
    }

    /// Reads the mapping for an in-progress contact (touch motion).
    pub fn lookup(&self, local: u32) -> Result<GlobalSlot, SlotError> {
        self.table.lookup(local)
    }

    /// Releases every live contact held by the table; used on device destroy.
    pub fn release_all(&mut self) -> Vec<GlobalSlot> {
        let mut released = Vec::new();
        for entry in self.table.entries.iter_mut() {
            if let Some(global) = entry.take() {
                self.bitmap.clear(global);
                released.push(global);
            }
        }
        released
    }
}
