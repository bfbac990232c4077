//! Work orders
//!
//! | Route | Method | |
//! |-------|--------|-|
//! | /api/work-orders | GET | newest-updated first, with parent order |
//! | /api/work-orders | POST | create (pending, progress 0) |
//! | /api/work-orders/{id} | GET | one work order |
//! | /api/work-orders/{id}/status | PUT | operator transition |

use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};
use shared::models::{WorkOrderCreate, WorkOrderStatusUpdate, WorkOrderView};

use super::extract::{PathParam, Payload, validate};
use crate::core::ServerState;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/work-orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id))
        .route("/{id}/status", put(update_status))
}

async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<WorkOrderView>>> {
    Ok(Json(state.work_orders.list().await?))
}

async fn get_by_id(
    State(state): State<ServerState>,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<WorkOrderView>> {
    Ok(Json(state.work_orders.get(id).await?))
}

async fn create(
    State(state): State<ServerState>,
    Payload(payload): Payload<WorkOrderCreate>,
) -> AppResult<Json<WorkOrderView>> {
    validate(&payload)?;
    Ok(Json(state.work_orders.create(payload).await?))
}

async fn update_status(
    State(state): State<ServerState>,
    PathParam(id): PathParam<i64>,
    Payload(payload): Payload<WorkOrderStatusUpdate>,
) -> AppResult<Json<WorkOrderView>> {
    Ok(Json(state.work_orders.transition(id, payload).await?))
}
