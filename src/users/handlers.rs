use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    state::AppState,
    users::{
        dto::{UpdateProfileRequest, VisibilityRequest},
        repo,
        repo::{DiscoverableUser, Profile},
    },
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/user/settings", get(get_settings))
        .route("/users", get(list_discoverable))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/user/settings", put(put_settings))
        .route("/user/visibility", put(put_visibility))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state))]
pub async fn get_settings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Profile>, ApiError> {
    let profile = repo::fetch_profile(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(profile))
}

#[instrument(skip(state, payload))]
pub async fn put_settings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(mut payload): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    if let Some(email) = payload.email.as_mut() {
        *email = email.trim().to_lowercase();
        if !email.is_empty() && !is_valid_email(email) {
            warn!(user_id = %user_id, "invalid email");
            return Err(ApiError::Validation("Invalid email".into()));
        }
    }
    if let Some(age) = payload.age {
        if age <= 0 {
            return Err(ApiError::Validation("Age must be positive".into()));
        }
    }
    if let Some(height) = payload.height {
        if height <= 0.0 {
            return Err(ApiError::Validation("Height must be positive".into()));
        }
    }
    if let Some(target) = payload.target_weight {
        if target <= 0.0 {
            return Err(ApiError::Validation("Target weight must be positive".into()));
        }
    }

    repo::update_profile(&state.db, user_id, &payload).await?;

    let profile = repo::fetch_profile(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(user_id = %user_id, "profile updated");
    Ok(Json(profile))
}

#[instrument(skip(state, payload))]
pub async fn put_visibility(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<VisibilityRequest>,
) -> Result<StatusCode, ApiError> {
    repo::set_visibility(&state.db, user_id, payload.is_visible).await?;
    info!(user_id = %user_id, visible = payload.is_visible, "visibility updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_discoverable(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<DiscoverableUser>>, ApiError> {
    let users = repo::discoverable(&state.db, user_id).await?;
    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("someone@example.com"));
        assert!(is_valid_email("a.b+c@mail.co"));
    }

    #[test]
    fn rejects_junk() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("spaces in@example.com"));
    }
}
