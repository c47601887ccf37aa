use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WeightRecord {
    pub id: i64,
    pub user_id: i64,
    pub weight: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    user_id: i64,
    weight: f64,
    created_at: Option<OffsetDateTime>,
) -> anyhow::Result<WeightRecord> {
    let row = sqlx::query_as::<_, WeightRecord>(
        r#"
        INSERT INTO weight_records (user_id, weight, created_at)
        VALUES ($1, $2, COALESCE($3, now()))
        RETURNING id, user_id, weight, created_at
        "#,
    )
    .bind(user_id)
    .bind(weight)
    .bind(created_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn record_owner(db: &PgPool, record_id: i64) -> anyhow::Result<Option<i64>> {
    let owner = sqlx::query_scalar::<_, i64>("SELECT user_id FROM weight_records WHERE id = $1")
        .bind(record_id)
        .fetch_optional(db)
        .await?;
    Ok(owner)
}

pub async fn delete(db: &PgPool, user_id: i64, record_id: i64) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM weight_records WHERE id = $1 AND user_id = $2")
        .bind(record_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Full history, newest first.
pub async fn history_desc(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<WeightRecord>> {
    let rows = sqlx::query_as::<_, WeightRecord>(
        r#"
        SELECT id, user_id, weight, created_at
        FROM weight_records
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn user_height(db: &PgPool, user_id: i64) -> anyhow::Result<Option<f64>> {
    let height = sqlx::query_scalar::<_, f64>("SELECT height FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(height)
}
