//! Utilities
//!
//! - [`AppError`] / [`AppResult`] - HTTP-edge error types (from shared::error)
//! - logging and business time zone helpers

pub mod logger;
pub mod time;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
