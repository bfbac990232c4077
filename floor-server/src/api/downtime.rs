//! Downtime incidents

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, put},
};
use serde::Deserialize;
use shared::models::{DowntimeCreate, DowntimeLog};

use super::extract::{PathParam, Payload, validate};
use crate::core::ServerState;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/downtime", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list).post(report))
        .route("/{id}/resolve", put(resolve))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Only unresolved incidents
    #[serde(default)]
    pub active: bool,
}

/// GET /api/downtime?active=true - newest first
async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<DowntimeLog>>> {
    Ok(Json(state.downtime.list(query.active).await?))
}

async fn report(
    State(state): State<ServerState>,
    Payload(payload): Payload<DowntimeCreate>,
) -> AppResult<Json<DowntimeLog>> {
    validate(&payload)?;
    Ok(Json(state.downtime.report(payload).await?))
}

async fn resolve(
    State(state): State<ServerState>,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<DowntimeLog>> {
    Ok(Json(state.downtime.resolve(id).await?))
}
