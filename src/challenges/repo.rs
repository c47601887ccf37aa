use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Pending,
    Active,
    Completed,
    Rejected,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: i64,
    pub creator_id: i64,
    pub opponent_id: i64,
    pub start_date: Date,
    pub end_date: Date,
    pub status: ChallengeStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Challenge {
    /// Accepting is reserved for the challenged user while the challenge
    /// is still pending.
    pub fn ensure_acceptable_by(&self, user_id: i64) -> Result<(), ApiError> {
        if self.opponent_id != user_id {
            return Err(ApiError::Forbidden(
                "Only the challenged user can accept".into(),
            ));
        }
        if self.status != ChallengeStatus::Pending {
            return Err(ApiError::Conflict("Challenge already processed".into()));
        }
        Ok(())
    }
}

/// Challenge list row with both participants' usernames resolved.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeListRow {
    pub id: i64,
    pub creator_id: i64,
    pub opponent_id: i64,
    pub start_date: Date,
    pub end_date: Date,
    pub status: ChallengeStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub creator_name: String,
    pub opponent_name: String,
}

/// Snapshot pair for one participant: earliest and latest weight up to
/// the challenge end. Zero stands for "no measurement".
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantWeights {
    pub user_id: i64,
    pub username: String,
    pub initial_weight: f64,
    pub final_weight: f64,
}

/// True when an accepted friendship links the two users.
pub async fn are_friends(db: &PgPool, a: i64, b: i64) -> anyhow::Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM friendships
            WHERE ((requester_id = $1 AND addressee_id = $2)
                OR (requester_id = $2 AND addressee_id = $1))
              AND status = 'accepted'
        )
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

pub async fn find(db: &PgPool, id: i64) -> anyhow::Result<Option<Challenge>> {
    let row = sqlx::query_as::<_, Challenge>(
        r#"
        SELECT id, creator_id, opponent_id, start_date, end_date, status, created_at
        FROM challenges
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_for_participant(
    db: &PgPool,
    id: i64,
    user_id: i64,
) -> anyhow::Result<Option<Challenge>> {
    let row = sqlx::query_as::<_, Challenge>(
        r#"
        SELECT id, creator_id, opponent_id, start_date, end_date, status, created_at
        FROM challenges
        WHERE id = $1 AND (creator_id = $2 OR opponent_id = $2)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Insert a pending challenge and snapshot the creator's newest weight
/// in the same transaction. The snapshot INSERT...SELECT inserts nothing
/// when the creator has no weight records yet.
pub async fn create_with_snapshot(
    db: &PgPool,
    creator_id: i64,
    opponent_id: i64,
    start_date: Date,
    end_date: Date,
) -> anyhow::Result<Challenge> {
    let mut tx = db.begin().await?;

    let challenge = sqlx::query_as::<_, Challenge>(
        r#"
        INSERT INTO challenges (creator_id, opponent_id, start_date, end_date, status)
        VALUES ($1, $2, $3, $4, 'pending')
        RETURNING id, creator_id, opponent_id, start_date, end_date, status, created_at
        "#,
    )
    .bind(creator_id)
    .bind(opponent_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO challenge_results (challenge_id, user_id, initial_weight)
        SELECT $1, $2, w.weight
        FROM weight_records w
        WHERE w.user_id = $2
        ORDER BY w.created_at DESC
        LIMIT 1
        "#,
    )
    .bind(challenge.id)
    .bind(creator_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(challenge)
}

/// Guarded pending -> active flip plus the opponent's weight snapshot,
/// atomically. None means the challenge was no longer pending.
pub async fn accept_with_snapshot(
    db: &PgPool,
    id: i64,
    opponent_id: i64,
) -> anyhow::Result<Option<Challenge>> {
    let mut tx = db.begin().await?;

    let updated = sqlx::query_as::<_, Challenge>(
        r#"
        UPDATE challenges
        SET status = 'active', updated_at = now()
        WHERE id = $1 AND status = 'pending'
        RETURNING id, creator_id, opponent_id, start_date, end_date, status, created_at
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(challenge) = updated else {
        tx.rollback().await?;
        return Ok(None);
    };

    sqlx::query(
        r#"
        INSERT INTO challenge_results (challenge_id, user_id, initial_weight)
        SELECT $1, $2, w.weight
        FROM weight_records w
        WHERE w.user_id = $2
        ORDER BY w.created_at DESC
        LIMIT 1
        "#,
    )
    .bind(id)
    .bind(opponent_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(challenge))
}

/// Guarded rejection: only the challenged user, only while pending.
pub async fn reject(db: &PgPool, id: i64, opponent_id: i64) -> anyhow::Result<Option<Challenge>> {
    let row = sqlx::query_as::<_, Challenge>(
        r#"
        UPDATE challenges
        SET status = 'rejected', updated_at = now()
        WHERE id = $1 AND opponent_id = $2 AND status = 'pending'
        RETURNING id, creator_id, opponent_id, start_date, end_date, status, created_at
        "#,
    )
    .bind(id)
    .bind(opponent_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn list_for_user(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<ChallengeListRow>> {
    let rows = sqlx::query_as::<_, ChallengeListRow>(
        r#"
        SELECT c.id, c.creator_id, c.opponent_id, c.start_date, c.end_date,
               c.status, c.created_at,
               cu.username AS creator_name,
               ou.username AS opponent_name
        FROM challenges c
        JOIN users cu ON cu.id = c.creator_id
        JOIN users ou ON ou.id = c.opponent_id
        WHERE c.creator_id = $1 OR c.opponent_id = $1
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Earliest and latest weight up to the challenge end for both
/// participants, creator first. Weight comparisons against `end_date`
/// treat the date as midnight, matching how snapshots were cut.
pub async fn participant_weights(
    db: &PgPool,
    challenge: &Challenge,
) -> anyhow::Result<Vec<ParticipantWeights>> {
    let rows = sqlx::query_as::<_, ParticipantWeights>(
        r#"
        SELECT u.id AS user_id,
               u.username,
               COALESCE((SELECT w.weight FROM weight_records w
                         WHERE w.user_id = u.id AND w.created_at <= $1
                         ORDER BY w.created_at ASC LIMIT 1), 0) AS initial_weight,
               COALESCE((SELECT w.weight FROM weight_records w
                         WHERE w.user_id = u.id AND w.created_at <= $1
                         ORDER BY w.created_at DESC LIMIT 1), 0) AS final_weight
        FROM users u
        WHERE u.id IN ($2, $3)
        ORDER BY CASE WHEN u.id = $2 THEN 0 ELSE 1 END
        "#,
    )
    .bind(challenge.end_date)
    .bind(challenge.creator_id)
    .bind(challenge.opponent_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn challenge(creator: i64, opponent: i64, status: ChallengeStatus) -> Challenge {
        Challenge {
            id: 9,
            creator_id: creator,
            opponent_id: opponent,
            start_date: date!(2025 - 07 - 01),
            end_date: date!(2025 - 07 - 31),
            status,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn opponent_can_accept_pending_challenge() {
        let c = challenge(1, 2, ChallengeStatus::Pending);
        assert!(c.ensure_acceptable_by(2).is_ok());
    }

    #[test]
    fn creator_cannot_accept_own_challenge() {
        let c = challenge(1, 2, ChallengeStatus::Pending);
        let err = c.ensure_acceptable_by(1).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn bystander_cannot_accept() {
        let c = challenge(1, 2, ChallengeStatus::Pending);
        let err = c.ensure_acceptable_by(5).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn active_challenge_cannot_be_accepted_again() {
        let c = challenge(1, 2, ChallengeStatus::Active);
        let err = c.ensure_acceptable_by(2).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn rejected_challenge_cannot_be_accepted() {
        let c = challenge(1, 2, ChallengeStatus::Rejected);
        let err = c.ensure_acceptable_by(2).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }
}
