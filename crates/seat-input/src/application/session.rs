//! SessionController: suspend/resume and the event drain loop.
//!
//! The controller owns the input backend, the seat registry and the output
//! layout, and is the only thing that pulls events out of the backend.
//!
//! # States
//!
//! ```text
//!            suspend: backend.suspend → drain → Suspended
//!   Active ───────────────────────────────────────────────► Suspended
//!          ◄───────────────────────────────────────────────
//!            resume: backend.resume → Active → drain → focus-in scan
//! ```
//!
//! Draining during suspend flushes events that were already queued, so
//! nothing stale is delivered after the session comes back.  Seats, devices
//! and slot tables are untouched by either transition.
//!
//! Readiness wake-ups that arrive while suspended are ignored.

use std::sync::Arc;

use seat_core::{
    DeviceHandle, HardwareEvent, Leds, Output, OutputGeometry, OutputId, OutputLayout,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::route_input::{InputRouter, RouteOutcome};
use crate::application::seat_registry::SeatRegistry;
use crate::infrastructure::input_backend::{BackendError, InputBackend};
use crate::infrastructure::notify::NotificationSink;
use crate::infrastructure::storage::config::InputConfig;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Hardware access could not be re-acquired; the session stays
    /// suspended.
    #[error("failed to resume input: {0}")]
    ResumeFailed(#[source] BackendError),
}

/// Whether hardware events are being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Suspended,
}

/// Counters for everything the drain loop has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events pulled from the backend queue.
    pub processed: u64,
    /// Input events forwarded to the sink.
    pub delivered: u64,
    pub devices_added: u64,
    pub devices_removed: u64,
    /// Devices that could not be set up and were skipped.
    pub failed_creations: u64,
    /// Event kinds the backend reported but this crate does not handle.
    pub unknown_events: u64,
    /// Events or removals naming a device that is not attached.
    pub unknown_devices: u64,
    /// Absolute events from devices that never had an output.
    pub dropped_no_output: u64,
    /// Touch-downs dropped because every global slot was taken.
    pub dropped_contacts: u64,
    /// Touch events on a local slot outside the device table.
    pub out_of_range_slots: u64,
    /// Touch motion/up for contacts with no mapping.
    pub unmapped_slots: u64,
    /// Start or resume scans that found no device on any seat.
    pub empty_scans: u64,
}

impl DispatchStats {
    fn record(&mut self, outcome: RouteOutcome) {
        match outcome {
            RouteOutcome::Delivered => self.delivered += 1,
            RouteOutcome::UnknownDevice => self.unknown_devices += 1,
            RouteOutcome::NoOutput => self.dropped_no_output += 1,
            RouteOutcome::SlotsExhausted => self.dropped_contacts += 1,
            RouteOutcome::SlotOutOfRange => self.out_of_range_slots += 1,
            RouteOutcome::UnmappedSlot => self.unmapped_slots += 1,
        }
    }
}

/// Owns the input side of one compositor session.
pub struct SessionController {
    state: SessionState,
    backend: Box<dyn InputBackend>,
    registry: SeatRegistry,
    outputs: OutputLayout,
    router: InputRouter,
    stats: DispatchStats,
    warn_on_no_devices: bool,
}

impl SessionController {
    /// Creates an active controller with no seats.
    ///
    /// Call [`start`](Self::start) to pick up the devices present at startup.
    pub fn new(
        backend: Box<dyn InputBackend>,
        sink: Arc<dyn NotificationSink>,
        config: &InputConfig,
    ) -> Self {
        let registry = SeatRegistry::new(config.seat.default_name.clone(), Arc::clone(&sink))
            .with_output_hints(config.output_hints.clone());
        Self {
            state: SessionState::Active,
            backend,
            registry,
            outputs: OutputLayout::new(),
            router: InputRouter::new(sink),
            stats: DispatchStats::default(),
            warn_on_no_devices: config.seat.warn_on_no_devices,
        }
    }

    /// Seeds the output layout, e.g. with the outputs present at startup.
    pub fn with_outputs(mut self, outputs: OutputLayout) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn registry(&self) -> &SeatRegistry {
        &self.registry
    }

    pub fn outputs(&self) -> &OutputLayout {
        &self.outputs
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    // ── Session lifecycle ─────────────────────────────────────────────────────

    /// Processes the initial device enumeration, then gives keyboards focus.
    ///
    /// Returns the number of events processed.
    pub fn start(&mut self) -> usize {
        let processed = self.dispatch_and_drain();
        self.scan_seats();
        processed
    }

    /// Stops hardware delivery and discards nothing: events already queued
    /// are drained and routed before the state flips.
    ///
    /// No-op when already suspended.
    pub fn suspend(&mut self) {
        if self.state == SessionState::Suspended {
            return;
        }
        self.backend.suspend();
        let flushed = self.drain();
        self.state = SessionState::Suspended;
        info!("input suspended ({flushed} queued event(s) flushed)");
    }

    /// Restarts hardware delivery, drains what accumulated, then gives every
    /// keyboard focus with its currently pressed keys.
    ///
    /// No-op when already active.
    ///
    /// # Errors
    ///
    /// [`SessionError::ResumeFailed`] if the backend cannot re-acquire the
    /// devices; the controller then stays suspended.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Active {
            return Ok(());
        }
        self.backend.resume().map_err(|e| {
            warn!("input resume failed: {e}");
            SessionError::ResumeFailed(e)
        })?;
        self.state = SessionState::Active;
        let processed = self.drain();
        info!("input resumed ({processed} event(s) processed)");
        self.scan_seats();
        Ok(())
    }

    /// Maps the session manager's active flag onto suspend/resume.
    ///
    /// # Errors
    ///
    /// See [`resume`](Self::resume).
    pub fn set_session_active(&mut self, active: bool) -> Result<(), SessionError> {
        if active {
            self.resume()
        } else {
            self.suspend();
            Ok(())
        }
    }

    /// Handles readability of the backend's fd.
    ///
    /// Returns the number of events processed; always `0` while suspended.
    pub fn on_readable(&mut self) -> usize {
        if self.state == SessionState::Suspended {
            debug!("ignoring input readiness while suspended");
            return 0;
        }
        self.dispatch_and_drain()
    }

    /// Destroys every seat and device.  Consumes the controller.
    pub fn shutdown(mut self) -> DispatchStats {
        self.registry.destroy_all(self.backend.as_mut());
        info!("input session shut down");
        self.stats
    }

    fn dispatch_and_drain(&mut self) -> usize {
        if let Err(e) = self.backend.dispatch() {
            warn!("input dispatch failed: {e}");
        }
        self.drain()
    }

    /// Pops and processes queued events until the backend queue is empty.
    fn drain(&mut self) -> usize {
        let mut processed = 0;
        while let Some(event) = self.backend.next_event() {
            self.process_event(event);
            processed += 1;
        }
        processed
    }

    fn process_event(&mut self, event: HardwareEvent) {
        self.stats.processed += 1;
        match event {
            HardwareEvent::DeviceAdded(descriptor) => {
                match self
                    .registry
                    .add_device(descriptor, &self.outputs, self.backend.as_mut())
                {
                    Ok(_) => self.stats.devices_added += 1,
                    Err(e) => {
                        warn!("skipping input device: {e}");
                        self.stats.failed_creations += 1;
                    }
                }
            }
            HardwareEvent::DeviceRemoved { device } => {
                if self.registry.remove_device(device, self.backend.as_mut()) {
                    self.stats.devices_removed += 1;
                } else {
                    self.stats.unknown_devices += 1;
                }
            }
            HardwareEvent::Input(input) => {
                let outcome = self.router.route(&mut self.registry, &self.outputs, input);
                self.stats.record(outcome);
            }
            HardwareEvent::Unknown { device, kind } => {
                match device {
                    Some(device) => warn!("unknown input event type {kind} from {device}"),
                    None => warn!("unknown input event type {kind}"),
                }
                self.stats.unknown_events += 1;
            }
        }
    }

    /// Focus-in for every keyboard, then the zero-devices diagnostic.
    fn scan_seats(&mut self) {
        self.registry.focus_in_keyboards(self.backend.as_ref());
        if self.registry.device_count() != 0 {
            return;
        }
        self.stats.empty_scans += 1;
        if self.warn_on_no_devices {
            warn!(
                "no input devices found on any seat; check that the compositor \
                 can open /dev/input/event* (input group membership or a session manager)"
            );
        }
    }

    // ── Outputs ───────────────────────────────────────────────────────────────

    /// Registers a new output and binds devices waiting for it.
    pub fn output_created(&mut self, output: Output) {
        info!("output '{}' created as {}", output.name, output.id);
        self.registry.output_created(&output);
        self.outputs.insert(output);
    }

    /// Forgets an output and moves its devices elsewhere (or nowhere).
    pub fn output_destroyed(&mut self, id: OutputId) {
        if self.outputs.remove(id).is_none() {
            debug!("destroy for unknown {id}");
            return;
        }
        info!("{id} destroyed");
        self.registry.output_destroyed(id, &self.outputs);
    }

    /// Updates an output's mode, position, scale or transform.
    pub fn output_changed(&mut self, id: OutputId, geometry: OutputGeometry) {
        if !self.outputs.update_geometry(id, geometry) {
            debug!("geometry change for unknown {id}");
        }
    }

    // ── Compositor requests ───────────────────────────────────────────────────

    pub fn led_update(&mut self, seat: &str, leds: Leds) {
        self.registry.led_update(seat, leds, self.backend.as_mut());
    }

    pub fn set_keyboard_focus(&mut self, seat: &str, focused: bool) -> bool {
        self.registry.set_keyboard_focus(seat, focused)
    }

    pub fn screen_dimensions(&self, device: DeviceHandle) -> Option<(u32, u32)> {
        self.registry.screen_dimensions(device, &self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::input_backend::mock::MockInputBackend;
    use crate::infrastructure::notify::recording::{Notification, RecordingSink};
    use mockall::mock;
    use mockall::predicate::always;
    use seat_core::{
        Capability, CapabilitySet, DeviceDescriptor, InputEvent, KeyState, TouchPhase,
    };

    mock! {
        Backend {}

        impl InputBackend for Backend {
            fn dispatch(&mut self) -> Result<(), BackendError>;
            fn next_event(&mut self) -> Option<HardwareEvent>;
            fn suspend(&mut self);
            fn resume(&mut self) -> Result<(), BackendError>;
            fn watch_device(&mut self, device: DeviceHandle) -> Result<(), BackendError>;
            fn unwatch_device(&mut self, device: DeviceHandle);
            fn pressed_keys(&self, device: DeviceHandle) -> Result<Vec<u32>, BackendError>;
            fn led_update(&mut self, device: DeviceHandle, leds: Leds);
        }
    }

    fn descriptor(handle: u64, caps: &[Capability]) -> DeviceDescriptor {
        DeviceDescriptor {
            handle: DeviceHandle(handle),
            sysname: format!("event{handle}"),
            name: format!("Test {handle}"),
            seat_name: None,
            capabilities: CapabilitySet::from_caps(caps),
            output_name: None,
        }
    }

    fn key(device: u64, time: u32) -> InputEvent {
        InputEvent::KeyboardKey {
            device: DeviceHandle(device),
            time,
            key: 30,
            state: KeyState::Pressed,
        }
    }

    fn controller(backend: MockInputBackend) -> (SessionController, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let mut outputs = OutputLayout::new();
        outputs.insert(Output {
            id: OutputId(1),
            name: "eDP-1".into(),
            geometry: OutputGeometry::new(0, 0, 1920, 1080),
        });
        let controller =
            SessionController::new(Box::new(backend), sink.clone(), &InputConfig::default())
                .with_outputs(outputs);
        (controller, sink)
    }

    // ── Start / drain ─────────────────────────────────────────────────────────

    #[test]
    fn test_start_attaches_enumerated_devices_and_focuses_keyboard() {
        // Arrange
        let backend = MockInputBackend::new();
        backend.plug(descriptor(1, &[Capability::Keyboard]));
        backend.set_pressed_keys(DeviceHandle(1), vec![56]);
        let (mut controller, sink) = controller(backend);

        // Act
        let processed = controller.start();

        // Assert
        assert_eq!(processed, 1);
        assert_eq!(controller.registry().device_count(), 1);
        assert!(sink.notifications().contains(&Notification::KeyboardFocusIn {
            seat: "seat0".into(),
            pressed_keys: vec![56]
        }));
    }

    #[test]
    fn test_on_readable_drains_queue_completely() {
        let backend = MockInputBackend::new();
        backend.plug(descriptor(1, &[Capability::Keyboard]));
        for t in 0..5 {
            backend.inject(key(1, t));
        }
        let (mut controller, _sink) = controller(backend.clone());

        assert_eq!(controller.on_readable(), 6);
        assert_eq!(backend.queued_len(), 0);
        assert_eq!(controller.stats().delivered, 5);
    }

    #[test]
    fn test_unknown_events_are_counted_and_skipped() {
        // Arrange
        let backend = MockInputBackend::new();
        backend.queue(HardwareEvent::Unknown {
            device: None,
            kind: 900,
        });
        backend.plug(descriptor(1, &[Capability::Pointer]));
        let (mut controller, _sink) = controller(backend);

        // Act
        controller.on_readable();

        // Assert
        let stats = controller.stats();
        assert_eq!(stats.unknown_events, 1);
        assert_eq!(stats.devices_added, 1);
        assert_eq!(stats.processed, 2);
    }

    #[test]
    fn test_removal_of_unknown_device_is_counted() {
        let backend = MockInputBackend::new();
        backend.unplug(DeviceHandle(4));
        let (mut controller, _sink) = controller(backend);

        controller.on_readable();

        assert_eq!(controller.stats().unknown_devices, 1);
    }

    #[test]
    fn test_failed_creation_is_counted_and_other_devices_survive() {
        let backend = MockInputBackend::new();
        backend.fail_watch(DeviceHandle(2));
        backend.plug(descriptor(1, &[Capability::Pointer]));
        backend.plug(descriptor(2, &[Capability::Touch]));
        let (mut controller, _sink) = controller(backend);

        controller.on_readable();

        assert_eq!(controller.stats().failed_creations, 1);
        assert_eq!(controller.registry().device_count(), 1);
    }

    // ── Suspend / resume ──────────────────────────────────────────────────────

    #[test]
    fn test_suspend_flushes_queued_events_before_state_change() {
        // Arrange
        let backend = MockInputBackend::new();
        backend.plug(descriptor(1, &[Capability::Keyboard]));
        let (mut controller, sink) = controller(backend.clone());
        controller.start();
        sink.take();
        backend.queue(HardwareEvent::Input(key(1, 1)));
        backend.queue(HardwareEvent::Input(key(1, 2)));

        // Act
        controller.suspend();

        // Assert
        assert_eq!(controller.state(), SessionState::Suspended);
        assert!(backend.is_suspended());
        assert_eq!(backend.queued_len(), 0);
        assert_eq!(sink.take().len(), 2);
        assert_eq!(controller.registry().device_count(), 1);
    }

    #[test]
    fn test_readiness_while_suspended_is_ignored() {
        let backend = MockInputBackend::new();
        let (mut controller, _sink) = controller(backend.clone());
        controller.suspend();
        let dispatches = backend.dispatch_calls();

        assert_eq!(controller.on_readable(), 0);
        assert_eq!(backend.dispatch_calls(), dispatches);
    }

    #[test]
    fn test_suspend_and_resume_are_idempotent() {
        let backend = MockInputBackend::new();
        let (mut controller, _sink) = controller(backend.clone());

        controller.resume().unwrap();
        controller.suspend();
        controller.suspend();
        controller.resume().unwrap();

        assert_eq!(backend.suspend_calls(), 1);
        assert_eq!(backend.resume_calls(), 1);
        assert_eq!(controller.state(), SessionState::Active);
    }

    #[test]
    fn test_resume_keeps_touch_slots_and_focuses_keyboards() {
        // Arrange
        let backend = MockInputBackend::new();
        backend.plug(descriptor(1, &[Capability::Keyboard, Capability::Touch]));
        backend.inject(InputEvent::Touch {
            device: DeviceHandle(1),
            time: 0,
            slot: 2,
            x: 1.0,
            y: 1.0,
            phase: TouchPhase::Down,
        });
        let (mut controller, sink) = controller(backend.clone());
        controller.start();
        controller.set_session_active(false).unwrap();
        sink.take();
        backend.set_pressed_keys(DeviceHandle(1), vec![29]);

        // Act
        controller.set_session_active(true).unwrap();

        // Assert
        assert_eq!(controller.state(), SessionState::Active);
        let seat = controller.registry().seat("seat0").unwrap();
        assert_eq!(seat.slot_bitmap().bits(), 1);
        assert_eq!(
            sink.take(),
            vec![Notification::KeyboardFocusIn {
                seat: "seat0".into(),
                pressed_keys: vec![29]
            }]
        );
    }

    #[test]
    fn test_resume_failure_leaves_session_suspended() {
        // Arrange
        let mut backend = MockBackend::new();
        backend.expect_suspend().times(1).return_const(());
        backend.expect_next_event().returning(|| None);
        backend
            .expect_resume()
            .times(1)
            .returning(|| Err(BackendError::Resume("device revoked".into())));
        backend.expect_dispatch().never();
        backend.expect_pressed_keys().with(always()).never();
        let sink = Arc::new(RecordingSink::new());
        let mut controller =
            SessionController::new(Box::new(backend), sink.clone(), &InputConfig::default());
        controller.suspend();

        // Act
        let result = controller.resume();

        // Assert
        assert!(matches!(
            result,
            Err(SessionError::ResumeFailed(BackendError::Resume(_)))
        ));
        assert_eq!(controller.state(), SessionState::Suspended);
        assert_eq!(controller.on_readable(), 0);
        assert!(sink.notifications().is_empty());
    }

    #[test]
    fn test_dispatch_failure_still_drains_queued_events() {
        let backend = MockInputBackend::new();
        backend.queue(HardwareEvent::DeviceAdded(descriptor(1, &[Capability::Pointer])));
        backend.fail_dispatch(Some("EIO"));
        let (mut controller, _sink) = controller(backend);

        assert_eq!(controller.on_readable(), 1);
        assert_eq!(controller.registry().device_count(), 1);
    }

    // ── Device scan ───────────────────────────────────────────────────────────

    #[test]
    fn test_start_and_resume_without_devices_count_empty_scans() {
        // Arrange
        let backend = MockInputBackend::new();
        let (mut controller, _sink) = controller(backend.clone());

        // Act
        controller.start();
        controller.suspend();
        controller.resume().unwrap();

        // Assert
        assert_eq!(controller.stats().empty_scans, 2);

        // Act – a device shows up, the next resume scan finds it
        backend.plug(descriptor(1, &[Capability::Pointer]));
        controller.on_readable();
        controller.suspend();
        controller.resume().unwrap();

        // Assert
        assert_eq!(controller.stats().empty_scans, 2);
    }

    #[test]
    fn test_empty_scan_is_counted_with_warning_disabled() {
        let mut config = InputConfig::default();
        config.seat.warn_on_no_devices = false;
        let sink = Arc::new(RecordingSink::new());
        let mut controller =
            SessionController::new(Box::new(MockInputBackend::new()), sink.clone(), &config);

        controller.start();

        assert_eq!(controller.stats().empty_scans, 1);
        assert!(sink.notifications().is_empty());
    }

    // ── Outputs and shutdown ──────────────────────────────────────────────────

    #[test]
    fn test_output_lifecycle_updates_device_binding_and_dimensions() {
        // Arrange
        let backend = MockInputBackend::new();
        backend.plug(descriptor(1, &[Capability::Touch]));
        let (mut controller, _sink) = controller(backend);
        controller.start();

        // Act / Assert
        controller.output_changed(OutputId(1), OutputGeometry::new(0, 0, 2560, 1440));
        assert_eq!(controller.screen_dimensions(DeviceHandle(1)), Some((2560, 1440)));

        controller.output_created(Output {
            id: OutputId(2),
            name: "DP-1".into(),
            geometry: OutputGeometry::new(2560, 0, 1920, 1080),
        });
        controller.output_destroyed(OutputId(1));
        let device = controller.registry().device(DeviceHandle(1)).unwrap();
        assert_eq!(device.output(), Some(OutputId(2)));
        assert_eq!(controller.screen_dimensions(DeviceHandle(1)), Some((1920, 1080)));
    }

    #[test]
    fn test_shutdown_destroys_seats_and_unwatches_devices() {
        let backend = MockInputBackend::new();
        backend.plug(descriptor(1, &[Capability::Keyboard]));
        let (mut controller, sink) = controller(backend.clone());
        controller.start();

        let stats = controller.shutdown();

        assert_eq!(stats.devices_added, 1);
        assert!(!backend.is_watched(DeviceHandle(1)));
        assert_eq!(sink.focus_out_count("seat0"), 1);
    }
}
