//! Input capabilities and the per-seat capability aggregator.
//!
//! A physical device declares a fixed subset of {keyboard, pointer, touch}
//! when it is plugged in.  A seat exposes the *union* of its member devices'
//! capabilities: "this seat has a keyboard" is a boolean from the outside,
//! even when three keyboards are attached.
//!
//! # Reference counting (for beginners)
//!
//! The [`CapabilityAggregator`] keeps one counter per capability.  Every
//! device that declares the capability adds one when it is attached and
//! subtracts one when it is removed.  Only the *edges* matter:
//!
//! ```text
//!   count 0 ──add──► 1      logical object created   (CapabilityChange::Added)
//!   count 1 ──add──► 2      nothing visible happens
//!   count 2 ──rem──► 1      nothing visible happens
//!   count 1 ──rem──► 0      logical object destroyed (CapabilityChange::Removed)
//! ```
//!
//! The aggregator is pure bookkeeping.  It never talks to the compositor
//! directly; it returns a [`CapabilityChange`] describing the edge and the
//! application layer turns that into notifications.

use std::fmt;

/// One class of input a device can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Keyboard,
    Pointer,
    Touch,
}

impl Capability {
    /// All capabilities in a fixed order (keyboard, pointer, touch).
    pub const ALL: [Capability; 3] = [Capability::Keyboard, Capability::Pointer, Capability::Touch];

    fn bit(self) -> u8 {
        match self {
            Capability::Pointer => CapabilitySet::POINTER,
            Capability::Keyboard => CapabilitySet::KEYBOARD,
            Capability::Touch => CapabilitySet::TOUCH,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Keyboard => "keyboard",
            Capability::Pointer => "pointer",
            Capability::Touch => "touch",
        };
        f.write_str(name)
    }
}

/// A bitset of [`Capability`] values.
///
/// Bit layout mirrors the one used by evdev-based backends:
///
/// | Bit | Capability |
/// |-----|------------|
/// | 0   | pointer    |
/// | 1   | keyboard   |
/// | 2   | touch      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(pub u8);

impl CapabilitySet {
    pub const POINTER: u8 = 1 << 0;
    pub const KEYBOARD: u8 = 1 << 1;
    pub const TOUCH: u8 = 1 << 2;

    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds a set from a list of capabilities.
    pub fn from_caps(caps: &[Capability]) -> Self {
        caps.iter().fold(Self::empty(), |set, cap| set.with(*cap))
    }

    /// Returns a copy of this set with `cap` added.
    pub fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }

    pub fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 & (Self::POINTER | Self::KEYBOARD | Self::TOUCH) == 0
    }

    /// Iterates over the capabilities in the set in [`Capability::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |cap| self.contains(*cap))
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        f.write_str(&names.join("+"))
    }
}

/// Keyboard LED state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Leds(pub u8);

impl Leds {
    pub const NUM_LOCK: u8 = 1 << 0;
    pub const CAPS_LOCK: u8 = 1 << 1;
    pub const SCROLL_LOCK: u8 = 1 << 2;

    pub fn contains(self, led: u8) -> bool {
        self.0 & led != 0
    }
}

// ── Logical seat objects ──────────────────────────────────────────────────────

/// The seat's logical keyboard.  Exists iff at least one member device
/// declares [`Capability::Keyboard`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeatKeyboard {
    /// Whether the compositor currently considers this keyboard focused.
    pub focused: bool,
    /// Last LED state pushed to the seat's devices.
    pub leds: Leds,
}

/// The seat's logical pointer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeatPointer {
    /// Last absolute position delivered, in global compositor coordinates.
    pub last_absolute: Option<(f64, f64)>,
}

/// The seat's logical touch object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeatTouch {
    /// Number of contacts currently down across all devices.
    pub active_contacts: u32,
}

/// A 0↔1 edge reported by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityChange {
    /// The seat gained the logical object for this capability.
    Added(Capability),
    /// The seat lost the logical object for `capability`.
    ///
    /// `focus_out` is `true` only for a keyboard that held focus at the time
    /// it was torn down; the caller must emit exactly one focus-out for it.
    Removed {
        capability: Capability,
        focus_out: bool,
    },
}

/// Per-seat reference counts and the logical objects they gate.
///
/// Invariant: `keyboard.is_some() == (keyboard_count > 0)`, and likewise for
/// pointer and touch.
#[derive(Debug, Default)]
pub struct CapabilityAggregator {
    keyboard_count: u32,
    pointer_count: u32,
    touch_count: u32,
    keyboard: Option<SeatKeyboard>,
    pointer: Option<SeatPointer>,
    touch: Option<SeatTouch>,
}

impl CapabilityAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the count for `cap`, instantiating the logical object on 0→1.
    pub fn add(&mut self, cap: Capability) -> Option<CapabilityChange> {
        let count = self.count_mut(cap);
        *count += 1;
        if *count != 1 {
            return None;
        }
        match cap {
            Capability::Keyboard => self.keyboard = Some(SeatKeyboard::default()),
            Capability::Pointer => self.pointer = Some(SeatPointer::default()),
            Capability::Touch => self.touch = Some(SeatTouch::default()),
        }
        Some(CapabilityChange::Added(cap))
    }

    /// Decrements the count for `cap`, tearing down the logical object on 1→0.
    ///
    /// Removing a capability whose count is already zero is a bookkeeping bug
    /// upstream; it is logged and ignored so the count never goes negative.
    pub fn remove(&mut self, cap: Capability) -> Option<CapabilityChange> {
        let count = self.count_mut(cap);
        if *count == 0 {
            debug_assert!(false, "capability {cap} removed more times than added");
            tracing::warn!("capability {cap} removed with a zero reference count; ignoring");
            return None;
        }
        *count -= 1;
        if *count != 0 {
            return None;
        }
        let focus_out = match cap {
            Capability::Keyboard => self.keyboard.take().map(|k| k.focused).unwrap_or(false),
            Capability::Pointer => {
                self.pointer = None;
                false
            }
            Capability::Touch => {
                self.touch = None;
                false
            }
        };
        Some(CapabilityChange::Removed {
            capability: cap,
            focus_out,
        })
    }

    /// Returns the reference count for `cap`.
    pub fn count(&self, cap: Capability) -> u32 {
        match cap {
            Capability::Keyboard => self.keyboard_count,
            Capability::Pointer => self.pointer_count,
            Capability::Touch => self.touch_count,
        }
    }

    /// The union of capabilities currently exposed.
    pub fn exposed(&self) -> CapabilitySet {
        Capability::ALL
            .into_iter()
            .filter(|cap| self.count(*cap) > 0)
            .fold(CapabilitySet::empty(), CapabilitySet::with)
    }

    pub fn has(&self, cap: Capability) -> bool {
        self.count(cap) > 0
    }

    pub fn keyboard(&self) -> Option<&SeatKeyboard> {
        self.keyboard.as_ref()
    }

    pub fn keyboard_mut(&mut self) -> Option<&mut SeatKeyboard> {
        self.keyboard.as_mut()
    }

    pub fn pointer(&self) -> Option<&SeatPointer> {
        self.pointer.as_ref()
    }

    pub fn pointer_mut(&mut self) -> Option<&mut SeatPointer> {
        self.pointer.as_mut()
    }

    pub fn touch(&self) -> Option<&SeatTouch> {
        self.touch.as_ref()
    }

    pub fn touch_mut(&mut self) -> Option<&mut SeatTouch> {
        self.touch.as_mut()
    }

    fn count_mut(&mut self, cap: Capability) -> &mut u32 {
        match cap {
            Capability::Keyboard => &mut self.keyboard_count,
            Capability::Pointer => &mut self.pointer_count,
            Capability::Touch => &mut self.touch_count,
        }
    }
}
