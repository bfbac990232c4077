//! Work order state machine
//!
//! Pure rules, no I/O. The allowed moves are an explicit table:
//!
//! | current \ requested | pending | in_progress | completed |
//! |---------------------|---------|-------------|-----------|
//! | pending             | ok (progress 0) | ok  | rejected  |
//! | in_progress         | rejected | ok         | ok        |
//! | completed           | rejected | rejected   | ok (stays 100) |

use shared::models::{WorkOrder, WorkOrderStatus};

use crate::core::{FloorError, FloorResult};

use shared::models::WorkOrderStatus::{Completed, InProgress, Pending};

const ALLOWED: &[(WorkOrderStatus, WorkOrderStatus)] = &[
    (Pending, Pending),
    (Pending, InProgress),
    (InProgress, InProgress),
    (InProgress, Completed),
    (Completed, Completed),
];

/// Whether `from -> to` is in the transition table
pub fn is_allowed(from: WorkOrderStatus, to: WorkOrderStatus) -> bool {
    ALLOWED.contains(&(from, to))
}

/// Clamp a requested progress into 0..=100
pub fn clamp_progress(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

/// An operator's requested move
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionRequest {
    /// None keeps the current status
    pub status: Option<WorkOrderStatus>,
    pub progress: Option<i64>,
    pub operator_id: Option<i64>,
}

/// Validate `request` against `current` and produce the next row state.
///
/// `now` stamps `updated_at` and the first entry into `in_progress` /
/// `completed`. Id and version are left to the store.
pub fn apply(current: &WorkOrder, request: &TransitionRequest, now: i64) -> FloorResult<WorkOrder> {
    let from = current.status;
    let to = request.status.unwrap_or(from);

    if !is_allowed(from, to) {
        return Err(FloorError::InvalidTransition { from, to });
    }

    let requested = request.progress.map(clamp_progress);
    let progress = match to {
        Pending => {
            if let Some(p) = requested
                && p != 0
            {
                return Err(FloorError::validation(format!(
                    "progress must be 0 while pending (got {})",
                    p
                )));
            }
            0
        }
        // Lower requests keep the stored value
        InProgress => requested.map_or(current.progress, |p| p.max(current.progress)),
        Completed => 100,
    };

    let mut next = current.clone();
    next.status = to;
    next.progress = progress;
    next.updated_at = now;
    if let Some(operator_id) = request.operator_id {
        next.operator_id = Some(operator_id);
    }
    if to == InProgress && next.started_at.is_none() {
        next.started_at = Some(now);
    }
    if to == Completed && next.completed_at.is_none() {
        next.completed_at = Some(now);
    }
    Ok(next)
}
