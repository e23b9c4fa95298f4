//! In-process job lifecycle event bus.
//!
//! Handlers publish a [`JobEvent`] whenever a runner job changes state;
//! interested parties (log taps, future push channels) subscribe through
//! the shared [`EventBus`].

pub mod bus;

pub use bus::{EventBus, JobEvent};
