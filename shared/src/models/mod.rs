//! Data models
//!
//! Shared between floor-server and its clients (via API and WebSocket).
//! All IDs are `i64`, timestamps are Unix millis, and every stored entity
//! carries a store-managed `version`.

pub mod dashboard;
pub mod downtime;
pub mod order;
pub mod work_order;

// Re-exports
pub use dashboard::*;
pub use downtime::*;
pub use order::*;
pub use work_order::*;
