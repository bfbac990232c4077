//! Unified error codes for the shop-floor tracker
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Planning errors (orders, work orders)
//! - 5xxx: Downtime errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so that dashboards and
/// operator terminals can switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Entity was modified concurrently (stale version)
    VersionConflict = 9,

    // ==================== 4xxx: Planning ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Work order not found
    WorkOrderNotFound = 4101,
    /// Requested status is not reachable from the current one
    InvalidTransition = 4102,

    // ==================== 5xxx: Downtime ====================
    /// Downtime log not found
    DowntimeNotFound = 5001,
    /// Machine already has an active downtime incident
    DowntimeAlreadyActive = 5002,

    // ==================== 9xxx: System ====================
    /// Persistent store error
    StoreError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::VersionConflict => "Resource was modified concurrently",

            // Planning
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::WorkOrderNotFound => "Work order not found",
            ErrorCode::InvalidTransition => "Status transition is not allowed",

            // Downtime
            ErrorCode::DowntimeNotFound => "Downtime log not found",
            ErrorCode::DowntimeAlreadyActive => "Machine already has an active downtime",

            // System
            ErrorCode::StoreError => "Store error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            9 => Ok(ErrorCode::VersionConflict),

            // Planning
            4001 => Ok(ErrorCode::OrderNotFound),
            4101 => Ok(ErrorCode::WorkOrderNotFound),
            4102 => Ok(ErrorCode::InvalidTransition),

            // Downtime
            5001 => Ok(ErrorCode::DowntimeNotFound),
            5002 => Ok(ErrorCode::DowntimeAlreadyActive),

            // System
            9002 => Ok(ErrorCode::StoreError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
