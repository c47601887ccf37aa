use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    state::AppState,
    weight::{
        dto::{CreateWeightRequest, WeightStats},
        repo,
        repo::WeightRecord,
    },
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/weight/stats", get(stats))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/weight", post(create))
        .route("/weight/:id", delete(remove))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateWeightRequest>,
) -> Result<Json<WeightRecord>, ApiError> {
    if payload.weight <= 0.0 {
        warn!(user_id = %user_id, weight = payload.weight, "invalid weight value");
        return Err(ApiError::Validation("Weight must be positive".into()));
    }

    let record = repo::insert(&state.db, user_id, payload.weight, payload.created_at).await?;
    info!(user_id = %user_id, record_id = %record.id, "weight recorded");
    Ok(Json(record))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(record_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let owner = repo::record_owner(&state.db, record_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Weight record not found".into()))?;
    if owner != user_id {
        warn!(user_id = %user_id, record_id = %record_id, "weight record owned by another user");
        return Err(ApiError::Forbidden(
            "Weight record belongs to another user".into(),
        ));
    }

    if !repo::delete(&state.db, user_id, record_id).await? {
        return Err(ApiError::NotFound("Weight record not found".into()));
    }

    info!(user_id = %user_id, record_id = %record_id, "weight record deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<WeightStats>, ApiError> {
    let height = repo::user_height(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let history = repo::history_desc(&state.db, user_id).await?;
    Ok(Json(WeightStats::from_history(height, history)))
}
