//! Unified error system for the shop-floor tracker
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Error envelope returned over HTTP
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Planning errors (orders, work orders)
//! - 5xxx: Downtime errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::WorkOrderNotFound).with_detail("id", 42);
//! let response = ApiResponse::error(&err);
//! assert_eq!(response.code, 4101);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
