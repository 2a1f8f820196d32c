//! seat-input library entry point.
//!
//! Groups input devices into seats and forwards their events to the
//! compositor.  The domain types live in `seat_core`; this crate holds the
//! use cases and the adapters around them.

pub mod application;
pub mod infrastructure;

pub use application::seat_registry::{RegistryError, SeatRegistry};
pub use application::session::{DispatchStats, SessionController, SessionError, SessionState};
pub use infrastructure::input_backend::{BackendError, InputBackend};
pub use infrastructure::notify::NotificationSink;
