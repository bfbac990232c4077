//! Shop-floor work-order tracker
//!
//! Planners create customer orders and the work orders that make them;
//! operators move work orders through `pending → in_progress → completed`;
//! anyone can raise a machine downtime. Dashboards and station terminals
//! watch it all live over a WebSocket.
//!
//! ```text
//! floor-server
//! ├── api/         axum routes, body extraction, observer socket
//! ├── core/        Config, ServerState, Server, FloorError
//! ├── store/       versioned tables (memory arena, redb)
//! ├── workorders/  transition table + service
//! ├── planning     customer orders
//! ├── downtime/    incident reporting and resolution
//! ├── dashboard/   on-demand KPIs
//! ├── message/     EventHub fan-out
//! ├── seed         demo data
//! └── utils/       logging, business-day time helpers
//! ```

pub mod api;
pub mod core;
pub mod dashboard;
pub mod downtime;
pub mod message;
pub mod planning;
pub mod seed;
pub mod store;
pub mod utils;
pub mod workorders;

pub use crate::core::{Config, Server, ServerState};
