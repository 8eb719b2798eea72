use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use log::info;
use serde::Serialize;
use uuid::Uuid;

use super::{error::AppError, AppState};
use crate::db::models::{Fast, FastInfo, FastStats, NewFast, StartTimer, Timer, TimerPatch};

type ApiResult<T> = Result<T, AppError>;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/timer/:user_id
pub async fn get_timer(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Option<Timer>>> {
    Ok(Json(state.db.get_timer(&user_id).await?))
}

/// POST /api/timer/:user_id
pub async fn start_timer(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(body): Json<StartTimer>,
) -> ApiResult<(StatusCode, Json<Timer>)> {
    let now = Utc::now();
    let timer = Timer {
        owner_id: user_id,
        start_time: body.start_time,
        is_paused: false,
        paused_at: None,
        notes: body.notes,
        created_at: now,
        updated_at: now,
    };

    if !state.db.insert_timer(&timer).await? {
        return Err(AppError::Conflict(format!(
            "user {} already has an active timer",
            timer.owner_id
        )));
    }

    info!("Started timer for {} at {}", timer.owner_id, timer.start_time);
    Ok((StatusCode::CREATED, Json(timer)))
}

/// PATCH /api/timer/:user_id
pub async fn update_timer(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(patch): Json<TimerPatch>,
) -> ApiResult<Json<Timer>> {
    if patch.is_empty() {
        return Err(AppError::BadRequest("empty timer update".into()));
    }

    state
        .db
        .update_timer(&user_id, patch, Utc::now())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no active timer for user {user_id}")))
}

/// DELETE /api/timer/:user_id
pub async fn delete_timer(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.db.delete_timer(&user_id).await? {
        return Err(AppError::NotFound(format!("no active timer for user {user_id}")));
    }

    info!("Deleted timer for {user_id}");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/fasts/:user_id
pub async fn list_fasts(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<FastInfo>>> {
    let fasts = state.db.list_fasts(&user_id).await?;
    Ok(Json(fasts.into_iter().map(FastInfo::from).collect()))
}

/// POST /api/fasts/:user_id
pub async fn add_fast(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(body): Json<NewFast>,
) -> ApiResult<(StatusCode, Json<FastInfo>)> {
    if !body.is_valid() {
        return Err(AppError::BadRequest("fast must end after it starts".into()));
    }

    let fast = Fast {
        id: Uuid::new_v4().to_string(),
        owner_id: user_id,
        start_time: body.start_time,
        end_time: body.end_time,
        notes: body.notes,
        created_at: Utc::now(),
    };
    state.db.insert_fast(&fast).await?;

    info!(
        "Recorded fast {} for {} ({}s)",
        fast.id,
        fast.owner_id,
        (fast.end_time - fast.start_time).num_seconds()
    );
    Ok((StatusCode::CREATED, Json(FastInfo::from(fast))))
}

/// DELETE /api/fasts/:user_id/:fast_id
pub async fn delete_fast(
    State(state): State<Arc<AppState>>,
    Path((user_id, fast_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    if !state.db.delete_fast(&user_id, &fast_id).await? {
        return Err(AppError::NotFound(format!("no fast {fast_id} for user {user_id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/fasts/:user_id/stats
pub async fn fast_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<FastStats>> {
    let fasts = state.db.list_fasts(&user_id).await?;
    Ok(Json(FastStats::from_fasts(&fasts)))
}
