//! Domain errors
//!
//! Services return [`FloorError`]; handlers convert it into
//! [`AppError`](shared::error::AppError) at the HTTP edge.

use shared::error::{AppError, ErrorCode};
use shared::models::WorkOrderStatus;
use thiserror::Error;

use crate::store::StoreError;

/// Floor service errors
#[derive(Debug, Error)]
pub enum FloorError {
    #[error("{0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Work order not found: {0}")]
    WorkOrderNotFound(i64),

    #[error("Downtime log not found: {0}")]
    DowntimeNotFound(i64),

    #[error("Cannot move work order from {from} to {to}")]
    InvalidTransition {
        from: WorkOrderStatus,
        to: WorkOrderStatus,
    },

    #[error("{kind} {id} was modified concurrently (expected version {expected}, found {actual})")]
    Conflict {
        kind: &'static str,
        id: i64,
        expected: u64,
        actual: u64,
    },

    #[error("Machine {machine} already has an active downtime ({active_id})")]
    DowntimeAlreadyActive { machine: String, active_id: i64 },

    #[error("Store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for FloorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict {
                kind,
                id,
                expected,
                actual,
            } => FloorError::Conflict {
                kind,
                id,
                expected,
                actual,
            },
            other => FloorError::Store(other),
        }
    }
}

impl FloorError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type FloorResult<T> = Result<T, FloorError>;

impl From<FloorError> for AppError {
    fn from(err: FloorError) -> Self {
        match err {
            FloorError::Validation(msg) => AppError::validation(msg),
            FloorError::OrderNotFound(id) => {
                AppError::new(ErrorCode::OrderNotFound).with_detail("id", id)
            }
            FloorError::WorkOrderNotFound(id) => {
                AppError::new(ErrorCode::WorkOrderNotFound).with_detail("id", id)
            }
            FloorError::DowntimeNotFound(id) => {
                AppError::new(ErrorCode::DowntimeNotFound).with_detail("id", id)
            }
            FloorError::InvalidTransition { from, to } => {
                AppError::invalid_transition(from.as_str(), to.as_str())
            }
            FloorError::Conflict {
                kind,
                id,
                expected,
                actual,
            } => AppError::version_conflict(format!("{} {} was modified concurrently", kind, id))
            .with_detail("id", id)
            .with_detail("expected_version", expected)
            .with_detail("actual_version", actual),
            FloorError::DowntimeAlreadyActive { machine, active_id } => AppError::with_message(
                ErrorCode::DowntimeAlreadyActive,
                format!("Machine {} already has an active downtime", machine),
            )
            .with_detail("machine", machine)
            .with_detail("active_id", active_id),
            FloorError::Store(e) => AppError::store(e.to_string()),
        }
    }
}
