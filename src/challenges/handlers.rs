use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    challenges::{
        dto::{ChallengeResults, CreateChallengeRequest, ParticipantResult},
        repo,
        repo::{Challenge, ChallengeListRow},
    },
    error::ApiError,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/challenges", get(list))
        .route("/challenges/:id/results", get(results))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/challenges", post(create))
        .route("/challenges/:id/accept", put(accept))
        .route("/challenges/:id/reject", put(reject))
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ChallengeListRow>>, ApiError> {
    let challenges = repo::list_for_user(&state.db, user_id).await?;
    Ok(Json(challenges))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateChallengeRequest>,
) -> Result<Json<Challenge>, ApiError> {
    if payload.opponent_id == user_id {
        return Err(ApiError::Validation("Cannot challenge yourself".into()));
    }
    if payload.end_date < payload.start_date {
        return Err(ApiError::Validation("endDate is before startDate".into()));
    }

    if !repo::are_friends(&state.db, user_id, payload.opponent_id).await? {
        warn!(user_id = %user_id, opponent_id = %payload.opponent_id, "challenge to non-friend");
        return Err(ApiError::Conflict(
            "Challenges can only be sent to accepted friends".into(),
        ));
    }

    let challenge = repo::create_with_snapshot(
        &state.db,
        user_id,
        payload.opponent_id,
        payload.start_date,
        payload.end_date,
    )
    .await?;

    info!(
        user_id = %user_id,
        opponent_id = %payload.opponent_id,
        challenge_id = %challenge.id,
        "challenge created"
    );
    Ok(Json(challenge))
}

#[instrument(skip(state))]
pub async fn accept(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(challenge_id): Path<i64>,
) -> Result<Json<Challenge>, ApiError> {
    let challenge = repo::find(&state.db, challenge_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Challenge not found".into()))?;
    challenge.ensure_acceptable_by(user_id)?;

    let updated = repo::accept_with_snapshot(&state.db, challenge_id, user_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Challenge already processed".into()))?;

    info!(user_id = %user_id, challenge_id = %challenge_id, "challenge accepted");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn reject(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(challenge_id): Path<i64>,
) -> Result<Json<Challenge>, ApiError> {
    let updated = repo::reject(&state.db, challenge_id, user_id)
        .await?
        .ok_or_else(|| ApiError::Validation("Challenge cannot be rejected".into()))?;

    info!(user_id = %user_id, challenge_id = %challenge_id, "challenge rejected");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn results(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(challenge_id): Path<i64>,
) -> Result<Json<ChallengeResults>, ApiError> {
    // Outsiders get a 404, not a 403: the row is simply not theirs to see
    let challenge = repo::find_for_participant(&state.db, challenge_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Challenge not found".into()))?;

    let weights = repo::participant_weights(&state.db, &challenge).await?;
    let results: Vec<ParticipantResult> =
        weights.into_iter().map(ParticipantResult::from).collect();

    Ok(Json(ChallengeResults { challenge, results }))
}
