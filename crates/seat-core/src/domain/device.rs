//! Per-physical-device record.
//!
//! A [`DeviceRecord`] is created when the input library reports a device
//! and dropped when it reports the device gone.  It remembers:
//!
//! - which seat owns it (fixed for its whole life),
//! - which output its absolute coordinates are mapped through,
//! - an optional output-name hint that survives the output going away,
//! - the local → global touch slot table,
//! - the capabilities the hardware declared.
//!
//! # Output binding
//!
//! ```text
//!   create ──► first output (or the hinted one if it exists)
//!   output destroyed ─┬─ hint present ──► unbound until that name returns
//!                     └─ no hint      ──► rebind to first output
//!   output created ──── hint matches  ──► bind
//! ```
//!
//! While unbound, absolute coordinates go through the geometry snapshot of
//! the last output the device was bound to.  A device that has never been
//! bound cannot transform anything and its absolute events are dropped.

use std::fmt;

use crate::domain::capability::CapabilitySet;
use crate::domain::output::{Output, OutputGeometry, OutputId, OutputLayout};
use crate::domain::slot::SlotTable;
use crate::event::hardware::DeviceDescriptor;

/// Opaque device handle from the input library.
///
/// Stable for as long as the device stays attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(pub u64);

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// State kept for one attached physical device.
#[derive(Debug)]
pub struct DeviceRecord {
    handle: DeviceHandle,
    sysname: String,
    name: String,
    seat_name: String,
    capabilities: CapabilitySet,
    output: Option<OutputId>,
    output_name: Option<String>,
    last_geometry: Option<OutputGeometry>,
    pub(crate) slots: SlotTable,
}

impl DeviceRecord {
    /// Builds the record for a newly attached device owned by `seat_name`.
    ///
    /// Binds to the output named by the descriptor's hint if it is present in
    /// `outputs`, otherwise to the first available output.
    pub fn new(descriptor: DeviceDescriptor, seat_name: &str, outputs: &OutputLayout) -> Self {
        let mut record = Self {
            handle: descriptor.handle,
            sysname: descriptor.sysname,
            name: descriptor.name,
            seat_name: seat_name.to_string(),
            capabilities: descriptor.capabilities,
            output: None,
            output_name: descriptor.output_name,
            last_geometry: None,
            slots: SlotTable::new(),
        };

        if let Some(first) = outputs.first() {
            record.set_output(first);
        }
        let hinted = record
            .output_name
            .as_deref()
            .and_then(|name| outputs.find_by_name(name));
        if let Some(output) = hinted {
            record.set_output(output);
        }
        record
    }

    pub fn handle(&self) -> DeviceHandle {
        self.handle
    }

    pub fn sysname(&self) -> &str {
        &self.sysname
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seat_name(&self) -> &str {
        &self.seat_name
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    /// The output currently bound, if any.
    pub fn output(&self) -> Option<OutputId> {
        self.output
    }

    pub fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    /// Sets the output-name hint without changing the current binding.
    pub fn set_output_name(&mut self, name: Option<String>) {
        self.output_name = name;
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// Binds the device's coordinate transform to `output`.
    ///
    /// Storing the id is what subscribes the device to that output's
    /// destruction: [`on_output_destroyed`](Self::on_output_destroyed) is
    /// called for every device whose binding matches the destroyed id.
    pub fn set_output(&mut self, output: &Output) {
        self.output = Some(output.id);
        self.last_geometry = Some(output.geometry);
    }

    /// Reacts to the bound output being torn down.
    ///
    /// `outputs` must no longer contain the destroyed output.
    pub fn on_output_destroyed(&mut self, outputs: &OutputLayout) {
        self.output = None;
        if self.output_name.is_some() {
            return;
        }
        if let Some(first) = outputs.first() {
            self.set_output(first);
        }
    }

    /// Binds to `output` if it matches the device's hint, or if the device
    /// has no hint and no live binding.
    ///
    /// Returns `true` when the binding changed.
    pub fn on_output_created(&mut self, output: &Output) -> bool {
        let bind = match self.output_name.as_deref() {
            Some(hint) => hint == output.name,
            None => self.output.is_none(),
        };
        if bind {
            self.set_output(output);
        }
        bind
    }

    /// The geometry absolute events should currently be mapped through.
    ///
    /// The live bound output wins; otherwise the snapshot of the last bound
    /// output is used.  `None` only if the device was never bound.
    pub fn target_geometry(&self, outputs: &OutputLayout) -> Option<OutputGeometry> {
        let live = self.output.and_then(|id| outputs.get(id)).map(|o| o.geometry);
        live.or(self.last_geometry)
    }

    /// Maps an absolute device coordinate into global compositor space.
    pub fn transform(&self, outputs: &OutputLayout, x: f64, y: f64) -> Option<(f64, f64)> {
        self.target_geometry(outputs)
            .map(|geo| geo.transform_point(x, y))
    }

    /// Current mode size of the bound output, for the library's axis scaling.
    pub fn screen_dimensions(&self, outputs: &OutputLayout) -> Option<(u32, u32)> {
        self.target_geometry(outputs)
            .map(|geo| (geo.mode_width, geo.mode_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capability::Capability;

    fn descriptor(handle: u64, hint: Option<&str>) -> DeviceDescriptor {
        DeviceDescriptor {
            handle: DeviceHandle(handle),
            sysname: format!("event{handle}"),
            name: "Test Touchscreen".to_string(),
            seat_name: None,
            capabilities: CapabilitySet::from_caps(&[Capability::Touch]),
            output_name: hint.map(str::to_string),
        }
    }

    fn output(id: u32, name: &str, x: i32) -> Output {
        Output {
            id: OutputId(id),
            name: name.to_string(),
            geometry: OutputGeometry::new(x, 0, 1920, 1080),
        }
    }

    fn two_outputs() -> OutputLayout {
        let mut layout = OutputLayout::new();
        layout.insert(output(1, "eDP-1", 0));
        layout.insert(output(2, "HDMI-A-1", 1920));
        layout
    }

    #[test]
    fn test_new_device_binds_first_output() {
        let record = DeviceRecord::new(descriptor(1, None), "seat0", &two_outputs());
        assert_eq!(record.output(), Some(OutputId(1)));
        assert_eq!(record.seat_name(), "seat0");
    }

    #[test]
    fn test_new_device_prefers_hinted_output() {
        let record = DeviceRecord::new(descriptor(1, Some("HDMI-A-1")), "seat0", &two_outputs());
        assert_eq!(record.output(), Some(OutputId(2)));
    }

    #[test]
    fn test_new_device_with_missing_hint_falls_back_to_first_output() {
        let record = DeviceRecord::new(descriptor(1, Some("DP-9")), "seat0", &two_outputs());
        assert_eq!(record.output(), Some(OutputId(1)));
    }

    #[test]
    fn test_new_device_without_outputs_is_unbound() {
        let record = DeviceRecord::new(descriptor(1, None), "seat0", &OutputLayout::new());
        assert_eq!(record.output(), None);
        assert_eq!(record.transform(&OutputLayout::new(), 1.0, 1.0), None);
    }

    #[test]
    fn test_output_destroyed_without_hint_rebinds_to_first() {
        // Arrange
        let mut layout = two_outputs();
        let mut record = DeviceRecord::new(descriptor(1, None), "seat0", &layout);

        // Act
        layout.remove(OutputId(1));
        record.on_output_destroyed(&layout);

        // Assert
        assert_eq!(record.output(), Some(OutputId(2)));
        assert_eq!(record.transform(&layout, 10.0, 10.0), Some((1930.0, 10.0)));
    }

    #[test]
    fn test_output_destroyed_with_hint_stays_unbound_until_name_returns() {
        // Arrange
        let mut layout = two_outputs();
        let mut record = DeviceRecord::new(descriptor(1, Some("HDMI-A-1")), "seat0", &layout);

        // Act – hinted output goes away
        layout.remove(OutputId(2));
        record.on_output_destroyed(&layout);

        // Assert – unbound, but the last geometry still maps coordinates
        assert_eq!(record.output(), None);
        assert_eq!(record.transform(&layout, 10.0, 10.0), Some((1930.0, 10.0)));

        // Act – a different output appears, then the hinted one
        assert!(!record.on_output_created(&output(3, "DP-1", 4000)));
        let returned = output(4, "HDMI-A-1", 3840);
        layout.insert(returned.clone());
        assert!(record.on_output_created(&returned));

        // Assert
        assert_eq!(record.output(), Some(OutputId(4)));
        assert_eq!(record.transform(&layout, 0.0, 0.0), Some((3840.0, 0.0)));
    }

    #[test]
    fn test_unhinted_device_binds_first_output_created_after_it() {
        // Arrange – enumerated before any output existed
        let mut layout = OutputLayout::new();
        let mut record = DeviceRecord::new(descriptor(1, None), "seat0", &layout);
        assert_eq!(record.output(), None);

        // Act
        let first = output(1, "eDP-1", 0);
        layout.insert(first.clone());
        let bound = record.on_output_created(&first);

        // Assert – a later output does not steal the binding
        assert!(bound);
        assert_eq!(record.output(), Some(OutputId(1)));
        assert!(!record.on_output_created(&output(2, "HDMI-A-1", 1920)));
        assert_eq!(record.screen_dimensions(&layout), Some((1920, 1080)));
    }

    #[test]
    fn test_unhinted_device_orphaned_by_last_output_rebinds_to_next_one() {
        // Arrange
        let mut layout = OutputLayout::new();
        layout.insert(output(1, "eDP-1", 0));
        let mut record = DeviceRecord::new(descriptor(1, None), "seat0", &layout);
        layout.remove(OutputId(1));
        record.on_output_destroyed(&layout);
        assert_eq!(record.output(), None);

        // Act
        let next = output(2, "DP-1", 2560);
        layout.insert(next.clone());

        // Assert – the live output replaces the old snapshot
        assert!(record.on_output_created(&next));
        assert_eq!(record.transform(&layout, 0.0, 0.0), Some((2560.0, 0.0)));
    }

    #[test]
    fn test_transform_uses_live_geometry_after_mode_change() {
        let mut layout = two_outputs();
        let record = DeviceRecord::new(descriptor(1, None), "seat0", &layout);

        layout.update_geometry(OutputId(1), OutputGeometry::new(0, 0, 1280, 720));

        assert_eq!(record.screen_dimensions(&layout), Some((1280, 720)));
    }
}
