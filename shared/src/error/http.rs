//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::WorkOrderNotFound
            | Self::DowntimeNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::VersionConflict
            | Self::InvalidTransition
            | Self::DowntimeAlreadyActive => StatusCode::CONFLICT,

            // 500 Internal Server Error
            Self::StoreError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request
            Self::ValidationFailed | Self::InvalidRequest => StatusCode::BAD_REQUEST,
        }
    }
}
