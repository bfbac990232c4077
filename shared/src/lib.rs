//! Shared types for the shop-floor tracker
//!
//! Entity models, real-time event and WebSocket frame types, and the
//! unified error/response structures used by floor-server and its clients.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use message::{FloorEvent, ObserverCommand, ServerMessage};
