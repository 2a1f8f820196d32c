//! Infrastructure layer of the input seat service.
//!
//! Contains the adapters at the edges: the input library boundary and its
//! mock, the outbound notification sink, the tokio event loop,
//! configuration storage and logging setup.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `seat_core`; the domain crate never depends on it.

pub mod event_loop;
pub mod input_backend;
pub mod logging;
pub mod notify;
pub mod storage;
