//! Application layer use cases for the input seat service.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules in `seat_core`) and the infrastructure (the input
//! library, the compositor's notification layer, config files).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects: seats, device records, slot tables.
//! - **Depend on abstractions** (`InputBackend`, `NotificationSink`) rather
//!   than concrete implementations, so tests run without hardware.
//! - **Contain no OS calls**.
//!
//! # Sub-modules
//!
//! - **`seat_registry`** – Seat lookup by name, device hotplug, output
//!   hotplug broadcast, LED and focus requests.
//! - **`route_input`** – Forwards each input event to its seat, with touch
//!   slot translation and output coordinate mapping.  Runs on every event.
//! - **`session`** – Suspend/resume and the loop that drains the input
//!   library's queue.

pub mod route_input;
pub mod seat_registry;
pub mod session;
