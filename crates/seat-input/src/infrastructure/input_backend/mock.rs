//! Mock input backend for unit and integration testing.
//!
//! Tests keep a clone of the [`MockInputBackend`] after handing the original
//! to the session, so they can plug devices and inject events while the
//! session owns the backend.  Clones share state.
//!
//! Events go through two stages, like the real library:
//!
//! - [`plug`](MockInputBackend::plug) / [`inject`](MockInputBackend::inject)
//!   put events on the "kernel" side; they reach the queue only on the next
//!   non-suspended `dispatch`.
//! - [`queue`](MockInputBackend::queue) puts an event straight into the
//!   library's queue, as if it had been read before a suspend.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use seat_core::{DeviceDescriptor, DeviceHandle, HardwareEvent, InputEvent, Leds};

use super::{BackendError, InputBackend};

#[derive(Debug, Default)]
struct MockState {
    pending: VecDeque<HardwareEvent>,
    ready: VecDeque<HardwareEvent>,
    suspended: bool,
    watched: HashSet<DeviceHandle>,
    pressed: HashMap<DeviceHandle, Vec<u32>>,
    leds: HashMap<DeviceHandle, Leds>,
    fail_watch: HashSet<DeviceHandle>,
    fail_resume: Option<String>,
    fail_dispatch: Option<String>,
    dispatch_calls: u32,
    suspend_calls: u32,
    resume_calls: u32,
}

/// A shared, in-memory [`InputBackend`].
#[derive(Debug, Clone, Default)]
pub struct MockInputBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockInputBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut guard = self.state.lock().expect("lock poisoned");
        f(&mut guard)
    }

    /// Announces a new device on the next dispatch.
    pub fn plug(&self, descriptor: DeviceDescriptor) {
        self.with_state(|s| s.pending.push_back(HardwareEvent::DeviceAdded(descriptor)));
    }

    /// Announces removal of `device` on the next dispatch.
    pub fn unplug(&self, device: DeviceHandle) {
        self.with_state(|s| s.pending.push_back(HardwareEvent::DeviceRemoved { device }));
    }

    /// Delivers an input event on the next dispatch.
    pub fn inject(&self, event: InputEvent) {
        self.with_state(|s| s.pending.push_back(HardwareEvent::Input(event)));
    }

    /// Puts `event` directly into the library queue, bypassing dispatch.
    pub fn queue(&self, event: HardwareEvent) {
        self.with_state(|s| s.ready.push_back(event));
    }

    /// Sets the keys reported as held down on `device`.
    pub fn set_pressed_keys(&self, device: DeviceHandle, keys: Vec<u32>) {
        self.with_state(|s| {
            s.pressed.insert(device, keys);
        });
    }

    /// Makes `watch_device` fail for `device`.
    pub fn fail_watch(&self, device: DeviceHandle) {
        self.with_state(|s| {
            s.fail_watch.insert(device);
        });
    }

    /// Makes the next `resume` calls fail with `reason` (`None` to clear).
    pub fn fail_resume(&self, reason: Option<&str>) {
        self.with_state(|s| s.fail_resume = reason.map(str::to_string));
    }

    /// Makes the next `dispatch` calls fail with `reason` (`None` to clear).
    pub fn fail_dispatch(&self, reason: Option<&str>) {
        self.with_state(|s| s.fail_dispatch = reason.map(str::to_string));
    }

    pub fn is_suspended(&self) -> bool {
        self.with_state(|s| s.suspended)
    }

    pub fn is_watched(&self, device: DeviceHandle) -> bool {
        self.with_state(|s| s.watched.contains(&device))
    }

    pub fn leds(&self, device: DeviceHandle) -> Option<Leds> {
        self.with_state(|s| s.leds.get(&device).copied())
    }

    /// Events still in the library queue.
    pub fn queued_len(&self) -> usize {
        self.with_state(|s| s.ready.len())
    }

    pub fn dispatch_calls(&self) -> u32 {
        self.with_state(|s| s.dispatch_calls)
    }

    pub fn suspend_calls(&self) -> u32 {
        self.with_state(|s| s.suspend_calls)
    }

    pub fn resume_calls(&self) -> u32 {
        self.with_state(|s| s.resume_calls)
    }
}

impl InputBackend for MockInputBackend {
    fn dispatch(&mut self) -> Result<(), BackendError> {
        self.with_state(|s| {
            s.dispatch_calls += 1;
            if let Some(reason) = &s.fail_dispatch {
                return Err(BackendError::Dispatch(reason.clone()));
            }
            if !s.suspended {
                let pending = std::mem::take(&mut s.pending);
                s.ready.extend(pending);
            }
            Ok(())
        })
    }

    fn next_event(&mut self) -> Option<HardwareEvent> {
        self.with_state(|s| s.ready.pop_front())
    }

    fn suspend(&mut self) {
        self.with_state(|s| {
            s.suspend_calls += 1;
            s.suspended = true;
        });
    }

    fn resume(&mut self) -> Result<(), BackendError> {
        self.with_state(|s| {
            s.resume_calls += 1;
            if let Some(reason) = &s.fail_resume {
                return Err(BackendError::Resume(reason.clone()));
            }
            s.suspended = false;
            let pending = std::mem::take(&mut s.pending);
            s.ready.extend(pending);
            Ok(())
        })
    }

    fn watch_device(&mut self, device: DeviceHandle) -> Result<(), BackendError> {
        self.with_state(|s| {
            if s.fail_watch.contains(&device) {
                return Err(BackendError::Watch {
                    device,
                    reason: "injected failure".to_string(),
                });
            }
            s.watched.insert(device);
            Ok(())
        })
    }

    fn unwatch_device(&mut self, device: DeviceHandle) {
        self.with_state(|s| {
            s.watched.remove(&device);
        });
    }

    fn pressed_keys(&self, device: DeviceHandle) -> Result<Vec<u32>, BackendError> {
        Ok(self.with_state(|s| s.pressed.get(&device).cloned().unwrap_or_default()))
    }

    fn led_update(&mut self, device: DeviceHandle, leds: Leds) {
        self.with_state(|s| {
            s.leds.insert(device, leds);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seat_core::{KeyState, TouchPhase};

    fn key(device: u64) -> InputEvent {
        InputEvent::KeyboardKey {
            device: DeviceHandle(device),
            time: 0,
            key: 30,
            state: KeyState::Pressed,
        }
    }

    #[test]
    fn test_injected_events_reach_queue_only_after_dispatch() {
        // Arrange
        let mut backend = MockInputBackend::new();
        backend.inject(key(1));

        // Act / Assert
        assert!(backend.next_event().is_none());
        backend.dispatch().unwrap();
        assert_eq!(backend.next_event(), Some(HardwareEvent::Input(key(1))));
        assert!(backend.next_event().is_none());
    }

    #[test]
    fn test_dispatch_while_suspended_leaves_events_pending() {
        let mut backend = MockInputBackend::new();
        backend.suspend();
        backend.inject(key(1));

        backend.dispatch().unwrap();

        assert_eq!(backend.queued_len(), 0);
        assert!(backend.is_suspended());
    }

    #[test]
    fn test_resume_moves_pending_events_into_queue() {
        let mut backend = MockInputBackend::new();
        backend.suspend();
        backend.inject(key(1));

        backend.resume().unwrap();

        assert!(!backend.is_suspended());
        assert_eq!(backend.queued_len(), 1);
    }

    #[test]
    fn test_injected_resume_failure_keeps_backend_suspended() {
        let mut backend = MockInputBackend::new();
        backend.suspend();
        backend.fail_resume(Some("seat revoked"));

        let err = backend.resume().unwrap_err();

        assert_eq!(err, BackendError::Resume("seat revoked".to_string()));
        assert!(backend.is_suspended());
    }

    #[test]
    fn test_clones_share_state() {
        // Arrange
        let handle = MockInputBackend::new();
        let mut owned: Box<dyn InputBackend> = Box::new(handle.clone());

        // Act
        handle.queue(HardwareEvent::Input(InputEvent::Touch {
            device: DeviceHandle(2),
            time: 5,
            slot: 0,
            x: 1.0,
            y: 2.0,
            phase: TouchPhase::Down,
        }));
        owned.watch_device(DeviceHandle(2)).unwrap();

        // Assert
        assert!(owned.next_event().is_some());
        assert!(handle.is_watched(DeviceHandle(2)));
    }

    #[test]
    fn test_watch_failure_is_reported_per_device() {
        let mut backend = MockInputBackend::new();
        backend.fail_watch(DeviceHandle(3));

        assert!(backend.watch_device(DeviceHandle(3)).is_err());
        assert!(backend.watch_device(DeviceHandle(4)).is_ok());
        assert!(!backend.is_watched(DeviceHandle(3)));
    }
}
