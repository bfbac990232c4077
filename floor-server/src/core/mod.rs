//! Core: configuration, state, errors and the HTTP server
//!
//! - [`Config`] - environment-driven settings
//! - [`ServerState`] - services shared by all handlers
//! - [`Server`] - listener and graceful shutdown
//! - [`FloorError`] - domain error type

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::{Config, StoreBackend};
pub use error::{FloorError, FloorResult};
pub use server::Server;
pub use state::ServerState;
