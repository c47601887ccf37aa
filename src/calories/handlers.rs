use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    calories::{
        dto::{
            ActivityEntryRequest, CalorieNeeds, CalorieSettingsRequest, CalorieStatsResponse,
            DailyBreakdown, DailyLogResponse, FoodEntryRequest, IntakeAnalysis, LogQuery,
            RangeAverages, StatsQuery,
        },
        metabolic,
        repo,
        repo::{ActivityEntry, CalorieSettings, FoodEntry},
    },
    error::ApiError,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/calories/settings", get(get_settings))
        .route("/calories/needs", get(needs))
        .route("/calories/log", get(daily_log))
        .route("/calories/stats", get(stats))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/calories/settings", put(put_settings))
        .route("/calories/food", post(add_food))
        .route("/calories/food/:id", delete(remove_food))
        .route("/calories/activity", post(add_activity))
        .route("/calories/activity/:id", delete(remove_activity))
}

#[instrument(skip(state))]
pub async fn get_settings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CalorieSettings>, ApiError> {
    let settings = repo::get_settings(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Calorie settings not configured".into()))?;
    Ok(Json(settings))
}

#[instrument(skip(state, payload))]
pub async fn put_settings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CalorieSettingsRequest>,
) -> Result<Json<CalorieSettings>, ApiError> {
    if payload.age <= 0 {
        warn!(user_id = %user_id, age = payload.age, "invalid age");
        return Err(ApiError::Validation("Age must be positive".into()));
    }

    let settings = repo::upsert_settings(
        &state.db,
        user_id,
        payload.gender,
        payload.age,
        payload.activity_level,
        payload.goal,
    )
    .await?;

    info!(user_id = %user_id, "calorie settings saved");
    Ok(Json(settings))
}

/// Needs are derived from the newest weight record, the profile height
/// and the stored calorie settings.
#[instrument(skip(state))]
pub async fn needs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CalorieNeeds>, ApiError> {
    let settings = repo::get_settings(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Calorie settings not configured".into()))?;

    let (weight, height) = repo::latest_weight_and_height(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No weight records yet".into()))?;

    let bmr = metabolic::bmr(weight, height, settings.age, settings.gender);
    let maintenance = metabolic::maintenance_calories(bmr, settings.activity_level);

    Ok(Json(CalorieNeeds::build(
        bmr,
        maintenance,
        settings.goal,
        settings.activity_level,
    )))
}

#[instrument(skip(state))]
pub async fn daily_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<LogQuery>,
) -> Result<Json<DailyLogResponse>, ApiError> {
    let date = query
        .date
        .unwrap_or_else(|| OffsetDateTime::now_utc().date());

    let log = repo::fetch_or_create_log(&state.db, user_id, date).await?;
    let food_entries = repo::food_entries_for_log(&state.db, log.id).await?;
    let activity_entries = repo::activity_entries_for_log(&state.db, log.id).await?;

    Ok(Json(DailyLogResponse {
        log,
        food_entries,
        activity_entries,
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(mut payload): Json<FoodEntryRequest>,
) -> Result<Json<FoodEntry>, ApiError> {
    payload.name = payload.name.trim().to_string();
    if payload.name.is_empty() {
        return Err(ApiError::Validation("Name is required".into()));
    }
    if payload.calories <= 0.0 {
        warn!(user_id = %user_id, calories = payload.calories, "invalid food calories");
        return Err(ApiError::Validation("Calories must be positive".into()));
    }

    let entry =
        repo::add_food_entry(&state.db, user_id, &payload, OffsetDateTime::now_utc()).await?;

    info!(user_id = %user_id, entry_id = %entry.id, "food entry added");
    Ok(Json(entry))
}

/// Removals report NotFound for missing and foreign entries alike, and
/// for the loser of a concurrent duplicate delete.
fn ensure_entry_removed(removed: bool, kind: &str) -> Result<(), ApiError> {
    if removed {
        return Ok(());
    }
    Err(ApiError::NotFound(format!("{kind} entry not found")))
}

#[instrument(skip(state))]
pub async fn remove_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(entry_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let removed = repo::delete_food_entry(&state.db, user_id, entry_id).await?;
    ensure_entry_removed(removed, "Food")?;

    info!(user_id = %user_id, entry_id = %entry_id, "food entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn add_activity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(mut payload): Json<ActivityEntryRequest>,
) -> Result<Json<ActivityEntry>, ApiError> {
    payload.name = payload.name.trim().to_string();
    if payload.name.is_empty() {
        return Err(ApiError::Validation("Name is required".into()));
    }
    if payload.calories <= 0.0 {
        warn!(user_id = %user_id, calories = payload.calories, "invalid activity calories");
        return Err(ApiError::Validation("Calories must be positive".into()));
    }

    let time = payload.time.unwrap_or_else(OffsetDateTime::now_utc);
    let entry = repo::add_activity_entry(&state.db, user_id, &payload, time).await?;

    info!(user_id = %user_id, entry_id = %entry.id, "activity entry added");
    Ok(Json(entry))
}

#[instrument(skip(state))]
pub async fn remove_activity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(entry_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let removed = repo::delete_activity_entry(&state.db, user_id, entry_id).await?;
    ensure_entry_removed(removed, "Activity")?;

    info!(user_id = %user_id, entry_id = %entry_id, "activity entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<CalorieStatsResponse>, ApiError> {
    let settings = repo::get_settings(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Calorie settings not configured".into()))?;

    let (weight, height) = repo::latest_weight_and_height(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No weight records yet".into()))?;

    let today = OffsetDateTime::now_utc().date();
    let end = query.end_date.unwrap_or(today);
    let start = query.start_date.unwrap_or_else(|| end - Duration::days(30));
    if start > end {
        return Err(ApiError::Validation("startDate is after endDate".into()));
    }

    let logs = repo::logs_in_range(&state.db, user_id, start, end).await?;
    let daily: Vec<DailyBreakdown> = logs.iter().map(DailyBreakdown::from).collect();

    let bmr = metabolic::bmr(weight, height, settings.age, settings.gender);
    let maintenance = metabolic::maintenance_calories(bmr, settings.activity_level);
    // The analysis classifies against the unrounded target
    let target = settings.goal.daily_target(maintenance);
    let needs = CalorieNeeds::build(bmr, maintenance, settings.goal, settings.activity_level);

    let averages = RangeAverages::from_days(&daily);
    let intake_analysis = IntakeAnalysis::build(&daily, today, target, settings.goal);

    Ok(Json(CalorieStatsResponse {
        start_date: start,
        end_date: end,
        bmr: needs.bmr,
        daily_needs: needs.daily_needs,
        macronutrients: needs.macronutrients,
        target_calories: needs.target_calories,
        daily,
        averages,
        intake_analysis,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_removal_maps_to_not_found() {
        assert!(ensure_entry_removed(true, "Food").is_ok());

        let err = ensure_entry_removed(false, "Activity").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "Activity entry not found"));
    }
}
