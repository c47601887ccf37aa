use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: i64,
    pub requester_id: i64,
    pub addressee_id: i64,
    pub status: FriendshipStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Friendship {
    /// Accepting is reserved for the addressee of a pending request.
    pub fn ensure_acceptable_by(&self, user_id: i64) -> Result<(), ApiError> {
        if self.addressee_id != user_id {
            return Err(ApiError::Forbidden(
                "Only the addressee can accept a friend request".into(),
            ));
        }
        if self.status != FriendshipStatus::Pending {
            return Err(ApiError::Conflict(
                "Friend request already processed".into(),
            ));
        }
        Ok(())
    }

    /// Same rule as accepting: addressee only, pending only.
    pub fn ensure_rejectable_by(&self, user_id: i64) -> Result<(), ApiError> {
        if self.addressee_id != user_id {
            return Err(ApiError::Forbidden(
                "Only the addressee can reject a friend request".into(),
            ));
        }
        if self.status != FriendshipStatus::Pending {
            return Err(ApiError::Conflict(
                "Friend request already processed".into(),
            ));
        }
        Ok(())
    }
}

/// A friend (or pending counterpart) as shown in the friend list, with
/// their all-time weight progress.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FriendEntry {
    pub friendship_id: i64,
    pub user_id: i64,
    pub username: String,
    pub height: f64,
    pub status: FriendshipStatus,
    pub requester_id: i64,
    pub progress: f64,
}

pub async fn find(db: &PgPool, id: i64) -> anyhow::Result<Option<Friendship>> {
    let row = sqlx::query_as::<_, Friendship>(
        r#"
        SELECT id, requester_id, addressee_id, status, created_at, updated_at
        FROM friendships
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn user_exists(db: &PgPool, id: i64) -> anyhow::Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(exists)
}

/// True when a pending or accepted friendship links the two users in
/// either direction.
pub async fn live_link_exists(db: &PgPool, a: i64, b: i64) -> anyhow::Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM friendships
            WHERE ((requester_id = $1 AND addressee_id = $2)
                OR (requester_id = $2 AND addressee_id = $1))
              AND status IN ('pending', 'accepted')
        )
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

/// Flip a rejected link between the two users back to pending, with the
/// requesting side moved onto the new requester. Returns None when there
/// is no rejected row to revive.
pub async fn revive_rejected(
    db: &PgPool,
    requester_id: i64,
    addressee_id: i64,
) -> anyhow::Result<Option<Friendship>> {
    let row = sqlx::query_as::<_, Friendship>(
        r#"
        UPDATE friendships
        SET status = 'pending', requester_id = $1, addressee_id = $2, updated_at = now()
        WHERE ((requester_id = $1 AND addressee_id = $2)
            OR (requester_id = $2 AND addressee_id = $1))
          AND status = 'rejected'
        RETURNING id, requester_id, addressee_id, status, created_at, updated_at
        "#,
    )
    .bind(requester_id)
    .bind(addressee_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert_pending(
    db: &PgPool,
    requester_id: i64,
    addressee_id: i64,
) -> anyhow::Result<Friendship> {
    let row = sqlx::query_as::<_, Friendship>(
        r#"
        INSERT INTO friendships (requester_id, addressee_id, status)
        VALUES ($1, $2, 'pending')
        RETURNING id, requester_id, addressee_id, status, created_at, updated_at
        "#,
    )
    .bind(requester_id)
    .bind(addressee_id)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Guarded transition to accepted. None means the row was no longer
/// pending, i.e. a concurrent transition won.
pub async fn accept(db: &PgPool, id: i64) -> anyhow::Result<Option<Friendship>> {
    let row = sqlx::query_as::<_, Friendship>(
        r#"
        UPDATE friendships
        SET status = 'accepted', updated_at = now()
        WHERE id = $1 AND status = 'pending'
        RETURNING id, requester_id, addressee_id, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn reject(db: &PgPool, id: i64) -> anyhow::Result<Option<Friendship>> {
    let row = sqlx::query_as::<_, Friendship>(
        r#"
        UPDATE friendships
        SET status = 'rejected', updated_at = now()
        WHERE id = $1 AND status = 'pending'
        RETURNING id, requester_id, addressee_id, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Every friendship involving the user, any status, with the counterpart's
/// progress. Progress is the all-time loss share, zero when they have no
/// records.
pub async fn list_for_user(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<FriendEntry>> {
    let rows = sqlx::query_as::<_, FriendEntry>(
        r#"
        SELECT f.id AS friendship_id,
               u.id AS user_id,
               u.username,
               u.height,
               f.status,
               f.requester_id,
               COALESCE((w.first_weight - w.last_weight) / NULLIF(w.first_weight, 0) * 100, 0)
                   AS progress
        FROM friendships f
        JOIN users u
          ON u.id = CASE WHEN f.requester_id = $1 THEN f.addressee_id ELSE f.requester_id END
        LEFT JOIN LATERAL (
            SELECT (SELECT weight FROM weight_records
                    WHERE user_id = u.id ORDER BY created_at ASC LIMIT 1) AS first_weight,
                   (SELECT weight FROM weight_records
                    WHERE user_id = u.id ORDER BY created_at DESC LIMIT 1) AS last_weight
        ) w ON TRUE
        WHERE f.requester_id = $1 OR f.addressee_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn friendship(requester: i64, addressee: i64, status: FriendshipStatus) -> Friendship {
        let now = OffsetDateTime::now_utc();
        Friendship {
            id: 1,
            requester_id: requester,
            addressee_id: addressee,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn addressee_can_accept_pending_request() {
        let f = friendship(1, 2, FriendshipStatus::Pending);
        assert!(f.ensure_acceptable_by(2).is_ok());
    }

    #[test]
    fn requester_cannot_accept_own_request() {
        let f = friendship(1, 2, FriendshipStatus::Pending);
        let err = f.ensure_acceptable_by(1).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn bystander_cannot_reject() {
        let f = friendship(1, 2, FriendshipStatus::Pending);
        let err = f.ensure_rejectable_by(3).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn accepted_request_cannot_be_accepted_again() {
        let f = friendship(1, 2, FriendshipStatus::Accepted);
        let err = f.ensure_acceptable_by(2).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn rejected_request_cannot_be_rejected_again() {
        let f = friendship(1, 2, FriendshipStatus::Rejected);
        let err = f.ensure_rejectable_by(2).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn list_entries_carry_any_status() {
        let worded = [
            (FriendshipStatus::Pending, "pending"),
            (FriendshipStatus::Accepted, "accepted"),
            (FriendshipStatus::Rejected, "rejected"),
        ];

        for (status, wire) in worded {
            let entry = FriendEntry {
                friendship_id: 9,
                user_id: 2,
                username: "maren".into(),
                height: 171.0,
                status,
                requester_id: 2,
                progress: 0.0,
            };
            let json = serde_json::to_value(&entry).unwrap();
            assert_eq!(json["status"], wire);
            assert_eq!(json["friendshipId"], 9);
            assert_eq!(json["requesterId"], 2);
        }
    }
}
