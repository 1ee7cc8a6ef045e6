//! Change events and their distribution.
//!
//! Reducers emit typed events; the application wraps each applied event in an
//! [`EventEnvelope`] and publishes it on an [`EventBus`] so views can re-render.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
