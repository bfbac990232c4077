//! Real-time event distribution
//!
//! - [`EventHub`] - room-routed, per-observer bounded fan-out
//!
//! Event and frame types live in [`shared::message`].

mod hub;

pub use hub::{DEFAULT_OBSERVER_CAPACITY, EventHub, ObserverId, Subscription};
