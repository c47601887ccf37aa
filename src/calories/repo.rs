use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};

use crate::calories::dto::{ActivityEntryRequest, FoodEntryRequest};
use crate::calories::metabolic::{ActivityLevel, Gender, Goal};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CalorieSettings {
    pub id: i64,
    pub user_id: i64,
    pub gender: Gender,
    pub age: i32,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: i64,
    pub user_id: i64,
    pub date: Date,
    pub food_kcal: f64,
    pub activity_kcal: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: i64,
    pub log_id: i64,
    pub user_id: i64,
    pub name: String,
    pub calories: f64,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub meal_type: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: i64,
    pub log_id: i64,
    pub user_id: i64,
    pub name: String,
    pub calories: f64,
    pub duration_min: Option<i32>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

pub async fn get_settings(db: &PgPool, user_id: i64) -> anyhow::Result<Option<CalorieSettings>> {
    let row = sqlx::query_as::<_, CalorieSettings>(
        r#"
        SELECT id, user_id, gender, age, activity_level, goal
        FROM calorie_settings
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn upsert_settings(
    db: &PgPool,
    user_id: i64,
    gender: Gender,
    age: i32,
    activity_level: ActivityLevel,
    goal: Goal,
) -> anyhow::Result<CalorieSettings> {
    let row = sqlx::query_as::<_, CalorieSettings>(
        r#"
        INSERT INTO calorie_settings (user_id, gender, age, activity_level, goal)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE
        SET gender = EXCLUDED.gender,
            age = EXCLUDED.age,
            activity_level = EXCLUDED.activity_level,
            goal = EXCLUDED.goal,
            updated_at = now()
        RETURNING id, user_id, gender, age, activity_level, goal
        "#,
    )
    .bind(user_id)
    .bind(gender)
    .bind(age)
    .bind(activity_level)
    .bind(goal)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Newest weight record joined with the profile height.
pub async fn latest_weight_and_height(
    db: &PgPool,
    user_id: i64,
) -> anyhow::Result<Option<(f64, f64)>> {
    let row = sqlx::query_as::<_, (f64, f64)>(
        r#"
        SELECT w.weight, u.height
        FROM weight_records w
        JOIN users u ON u.id = w.user_id
        WHERE w.user_id = $1
        ORDER BY w.created_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Get the log row for a day, creating an empty one on first access.
pub async fn fetch_or_create_log(
    db: &PgPool,
    user_id: i64,
    date: Date,
) -> anyhow::Result<DailyLog> {
    sqlx::query(
        r#"
        INSERT INTO daily_calorie_logs (user_id, date)
        VALUES ($1, $2)
        ON CONFLICT (user_id, date) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(date)
    .execute(db)
    .await?;

    let log = sqlx::query_as::<_, DailyLog>(
        r#"
        SELECT id, user_id, date, food_kcal, activity_kcal, notes
        FROM daily_calorie_logs
        WHERE user_id = $1 AND date = $2
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_one(db)
    .await?;
    Ok(log)
}

pub async fn logs_in_range(
    db: &PgPool,
    user_id: i64,
    start: Date,
    end: Date,
) -> anyhow::Result<Vec<DailyLog>> {
    let rows = sqlx::query_as::<_, DailyLog>(
        r#"
        SELECT id, user_id, date, food_kcal, activity_kcal, notes
        FROM daily_calorie_logs
        WHERE user_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn food_entries_for_log(db: &PgPool, log_id: i64) -> anyhow::Result<Vec<FoodEntry>> {
    let rows = sqlx::query_as::<_, FoodEntry>(
        r#"
        SELECT id, log_id, user_id, name, calories, protein, carbs, fat, meal_type, notes, time
        FROM food_entries
        WHERE log_id = $1
        ORDER BY time ASC
        "#,
    )
    .bind(log_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn activity_entries_for_log(
    db: &PgPool,
    log_id: i64,
) -> anyhow::Result<Vec<ActivityEntry>> {
    let rows = sqlx::query_as::<_, ActivityEntry>(
        r#"
        SELECT id, log_id, user_id, name, calories, duration_min, notes, time
        FROM activity_entries
        WHERE log_id = $1
        ORDER BY time ASC
        "#,
    )
    .bind(log_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Insert a food entry and bump the day's food total in one transaction.
/// The log row for the entry's day is created on demand.
pub async fn add_food_entry(
    db: &PgPool,
    user_id: i64,
    payload: &FoodEntryRequest,
    time: OffsetDateTime,
) -> anyhow::Result<FoodEntry> {
    let mut tx = db.begin().await?;

    let log_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO daily_calorie_logs (user_id, date, food_kcal)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, date) DO UPDATE
        SET food_kcal = daily_calorie_logs.food_kcal + EXCLUDED.food_kcal,
            updated_at = now()
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(time.date())
    .bind(payload.calories)
    .fetch_one(&mut *tx)
    .await?;

    let entry = sqlx::query_as::<_, FoodEntry>(
        r#"
        INSERT INTO food_entries
            (log_id, user_id, name, calories, protein, carbs, fat, meal_type, notes, time)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, log_id, user_id, name, calories, protein, carbs, fat, meal_type, notes, time
        "#,
    )
    .bind(log_id)
    .bind(user_id)
    .bind(&payload.name)
    .bind(payload.calories)
    .bind(payload.protein)
    .bind(payload.carbs)
    .bind(payload.fat)
    .bind(&payload.meal_type)
    .bind(&payload.notes)
    .bind(time)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(entry)
}

/// Same as `add_food_entry` but for burned calories.
pub async fn add_activity_entry(
    db: &PgPool,
    user_id: i64,
    payload: &ActivityEntryRequest,
    time: OffsetDateTime,
) -> anyhow::Result<ActivityEntry> {
    let mut tx = db.begin().await?;

    let log_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO daily_calorie_logs (user_id, date, activity_kcal)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, date) DO UPDATE
        SET activity_kcal = daily_calorie_logs.activity_kcal + EXCLUDED.activity_kcal,
            updated_at = now()
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(time.date())
    .bind(payload.calories)
    .fetch_one(&mut *tx)
    .await?;

    let entry = sqlx::query_as::<_, ActivityEntry>(
        r#"
        INSERT INTO activity_entries (log_id, user_id, name, calories, duration_min, notes, time)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, log_id, user_id, name, calories, duration_min, notes, time
        "#,
    )
    .bind(log_id)
    .bind(user_id)
    .bind(&payload.name)
    .bind(payload.calories)
    .bind(payload.duration_min)
    .bind(&payload.notes)
    .bind(time)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(entry)
}

/// Delete an owned food entry and pull its calories back out of the day
/// total, in one transaction. The decrement runs only when the delete
/// matched a row, so false covers missing and foreign entries as well as
/// a concurrent delete that got there first.
pub async fn delete_food_entry(db: &PgPool, user_id: i64, entry_id: i64) -> anyhow::Result<bool> {
    let mut tx = db.begin().await?;

    let removed = sqlx::query_as::<_, (i64, f64)>(
        r#"
        DELETE FROM food_entries
        WHERE id = $1 AND user_id = $2
        RETURNING log_id, calories
        "#,
    )
    .bind(entry_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((log_id, calories)) = removed else {
        return Ok(false);
    };

    sqlx::query(
        "UPDATE daily_calorie_logs SET food_kcal = food_kcal - $1, updated_at = now() WHERE id = $2",
    )
    .bind(calories)
    .bind(log_id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(true)
}

pub async fn delete_activity_entry(
    db: &PgPool,
    user_id: i64,
    entry_id: i64,
) -> anyhow::Result<bool> {
    let mut tx = db.begin().await?;

    let removed = sqlx::query_as::<_, (i64, f64)>(
        r#"
        DELETE FROM activity_entries
        WHERE id = $1 AND user_id = $2
        RETURNING log_id, calories
        "#,
    )
    .bind(entry_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((log_id, calories)) = removed else {
        return Ok(false);
    };

    sqlx::query(
        "UPDATE daily_calorie_logs SET activity_kcal = activity_kcal - $1, updated_at = now() WHERE id = $2",
    )
    .bind(calories)
    .bind(log_id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(true)
}
