use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    friends::repo,
    friends::repo::{FriendEntry, Friendship},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/friends", get(list))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/friends/request/:user_id", post(request))
        .route("/friends/accept/:id", post(accept))
        .route("/friends/reject/:id", post(reject))
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<FriendEntry>>, ApiError> {
    let friends = repo::list_for_user(&state.db, user_id).await?;
    Ok(Json(friends))
}

#[instrument(skip(state))]
pub async fn request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(friend_id): Path<i64>,
) -> Result<Json<Friendship>, ApiError> {
    if friend_id == user_id {
        return Err(ApiError::Validation(
            "Cannot send a friend request to yourself".into(),
        ));
    }

    if !repo::user_exists(&state.db, friend_id).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }

    if repo::live_link_exists(&state.db, user_id, friend_id).await? {
        warn!(user_id = %user_id, friend_id = %friend_id, "duplicate friend request");
        return Err(ApiError::Conflict("Friend request already exists".into()));
    }

    // A previously rejected link is revived instead of duplicated
    let friendship = match repo::revive_rejected(&state.db, user_id, friend_id).await? {
        Some(f) => f,
        None => repo::insert_pending(&state.db, user_id, friend_id).await?,
    };

    info!(
        user_id = %user_id,
        friend_id = %friend_id,
        friendship_id = %friendship.id,
        "friend request sent"
    );
    Ok(Json(friendship))
}

#[instrument(skip(state))]
pub async fn accept(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(friendship_id): Path<i64>,
) -> Result<Json<Friendship>, ApiError> {
    let friendship = repo::find(&state.db, friendship_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Friend request not found".into()))?;
    friendship.ensure_acceptable_by(user_id)?;

    let updated = repo::accept(&state.db, friendship_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Friend request already processed".into()))?;

    info!(user_id = %user_id, friendship_id = %friendship_id, "friend request accepted");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn reject(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(friendship_id): Path<i64>,
) -> Result<Json<Friendship>, ApiError> {
    let friendship = repo::find(&state.db, friendship_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Friend request not found".into()))?;
    friendship.ensure_rejectable_by(user_id)?;

    let updated = repo::reject(&state.db, friendship_id)
        .await?
        .ok_or_else(|| ApiError::Validation("Friend request cannot be rejected".into()))?;

    info!(user_id = %user_id, friendship_id = %friendship_id, "friend request rejected");
    Ok(Json(updated))
}
