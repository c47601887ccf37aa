use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::calories::metabolic::Gender;
use crate::users::dto::UpdateProfileRequest;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub height: f64,
    pub target_weight: Option<f64>,
    pub is_visible: bool,
}

/// A user open to friend discovery, with their all-time progress.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverableUser {
    pub id: i64,
    pub username: String,
    pub height: f64,
    pub progress: f64,
}

pub async fn fetch_profile(db: &PgPool, user_id: i64) -> anyhow::Result<Option<Profile>> {
    let row = sqlx::query_as::<_, Profile>(
        r#"
        SELECT u.id, u.username, u.first_name, u.last_name, u.email, u.age,
               u.gender, u.height, u.target_weight,
               COALESCE(us.is_visible, FALSE) AS is_visible
        FROM users u
        LEFT JOIN user_settings us ON us.user_id = u.id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Replace the mutable profile fields. A missing height keeps the stored
/// one; the column is NOT NULL and zero would corrupt the BMI math.
pub async fn update_profile(
    db: &PgPool,
    user_id: i64,
    update: &UpdateProfileRequest,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET first_name = $1,
            last_name = $2,
            email = $3,
            age = $4,
            gender = $5,
            height = COALESCE($6, height),
            target_weight = $7,
            updated_at = now()
        WHERE id = $8
        "#,
    )
    .bind(&update.first_name)
    .bind(&update.last_name)
    .bind(&update.email)
    .bind(update.age)
    .bind(update.gender)
    .bind(update.height)
    .bind(update.target_weight)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn set_visibility(db: &PgPool, user_id: i64, visible: bool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_settings (user_id, is_visible)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE
        SET is_visible = EXCLUDED.is_visible,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(visible)
    .execute(db)
    .await?;
    Ok(())
}

/// Users who opted into discovery, excluding the viewer and anyone
/// already linked to them by a pending or accepted friendship.
pub async fn discoverable(db: &PgPool, viewer_id: i64) -> anyhow::Result<Vec<DiscoverableUser>> {
    let rows = sqlx::query_as::<_, DiscoverableUser>(
        r#"
        SELECT u.id,
               u.username,
               u.height,
               COALESCE((w.first_weight - w.last_weight) / NULLIF(w.first_weight, 0) * 100, 0)
                   AS progress
        FROM users u
        JOIN user_settings us ON us.user_id = u.id
        LEFT JOIN LATERAL (
            SELECT (SELECT weight FROM weight_records
                    WHERE user_id = u.id ORDER BY created_at ASC LIMIT 1) AS first_weight,
                   (SELECT weight FROM weight_records
                    WHERE user_id = u.id ORDER BY created_at DESC LIMIT 1) AS last_weight
        ) w ON TRUE
        WHERE us.is_visible = TRUE
          AND u.id <> $1
          AND NOT EXISTS (
              SELECT 1 FROM friendships f
              WHERE ((f.requester_id = $1 AND f.addressee_id = u.id)
                  OR (f.requester_id = u.id AND f.addressee_id = $1))
                AND f.status IN ('pending', 'accepted')
          )
        ORDER BY u.username
        "#,
    )
    .bind(viewer_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
