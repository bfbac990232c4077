//! Customer orders

use axum::{Json, Router, extract::State, routing::get};
use shared::models::{Order, OrderCreate};

use super::extract::{PathParam, Payload, validate};
use crate::core::ServerState;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id))
}

/// GET /api/orders - all orders, id ascending
async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list().await?))
}

async fn get_by_id(
    State(state): State<ServerState>,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.get(id).await?))
}

/// POST /api/orders
async fn create(
    State(state): State<ServerState>,
    Payload(payload): Payload<OrderCreate>,
) -> AppResult<Json<Order>> {
    validate(&payload)?;
    Ok(Json(state.orders.create(payload).await?))
}
