use serde::{Deserialize, Serialize};
use time::Date;

use crate::challenges::repo::{Challenge, ParticipantWeights};
use crate::weight::progress::progress;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChallengeRequest {
    pub opponent_id: i64,
    pub start_date: Date,
    pub end_date: Date,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResult {
    pub user_id: i64,
    pub username: String,
    pub initial_weight: f64,
    pub final_weight: f64,
    pub progress: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResults {
    pub challenge: Challenge,
    pub results: Vec<ParticipantResult>,
}

/// Loss share between the two snapshots. A participant with a missing
/// measurement on either end scores 0 rather than a misleading number.
pub fn result_progress(initial: f64, final_weight: f64) -> f64 {
    if initial > 0.0 && final_weight > 0.0 {
        progress(initial, final_weight)
    } else {
        0.0
    }
}

impl From<ParticipantWeights> for ParticipantResult {
    fn from(w: ParticipantWeights) -> Self {
        let progress = result_progress(w.initial_weight, w.final_weight);
        Self {
            user_id: w.user_id,
            username: w.username,
            initial_weight: w.initial_weight,
            final_weight: w.final_weight,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_needs_both_measurements() {
        assert_eq!(result_progress(0.0, 80.0), 0.0);
        assert_eq!(result_progress(90.0, 0.0), 0.0);
        assert_eq!(result_progress(0.0, 0.0), 0.0);
    }

    #[test]
    fn progress_for_complete_pair() {
        assert_eq!(result_progress(100.0, 95.0), 5.0);
        assert!(result_progress(80.0, 84.0) < 0.0);
    }

    #[test]
    fn participant_result_carries_weights_through() {
        let result = ParticipantResult::from(ParticipantWeights {
            user_id: 3,
            username: "mira".into(),
            initial_weight: 92.0,
            final_weight: 85.0,
        });
        assert_eq!(result.user_id, 3);
        assert!((result.progress - (7.0 / 92.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn challenge_json_uses_camel_case_dates() {
        use crate::challenges::repo::ChallengeStatus;
        use time::macros::{date, datetime};

        let challenge = Challenge {
            id: 4,
            creator_id: 1,
            opponent_id: 2,
            start_date: date!(2025 - 07 - 01),
            end_date: date!(2025 - 07 - 31),
            status: ChallengeStatus::Pending,
            created_at: datetime!(2025-06-30 10:00 UTC),
        };

        let json = serde_json::to_value(&challenge).unwrap();
        assert_eq!(json["startDate"], "2025-07-01");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["creatorId"], 1);
    }
}
