use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::weight::progress::{bmi, progress};
use crate::weight::repo::WeightRecord;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWeightRequest {
    pub weight: f64,
    /// Backdated measurements carry their own timestamp; absent means now.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightStats {
    pub current_weight: f64,
    pub initial_weight: f64,
    pub previous_weight: f64,
    pub total_progress: f64,
    pub daily_progress: f64,
    pub bmi: f64,
    pub height: f64,
    pub history: Vec<WeightRecord>,
}

impl WeightStats {
    /// Build the stats block from a newest-first history. Missing entries
    /// (no records yet, or a single one) degrade to zeros.
    pub fn from_history(height: f64, history: Vec<WeightRecord>) -> Self {
        let current = history.first().map(|r| r.weight).unwrap_or(0.0);
        let initial = history.last().map(|r| r.weight).unwrap_or(0.0);
        let previous = history.get(1).map(|r| r.weight).unwrap_or(0.0);

        Self {
            current_weight: current,
            initial_weight: initial,
            previous_weight: previous,
            total_progress: progress(initial, current),
            daily_progress: progress(previous, current),
            bmi: bmi(current, height),
            height,
            history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn record(id: i64, weight: f64) -> WeightRecord {
        WeightRecord {
            id,
            user_id: 1,
            weight,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn stats_from_newest_first_history() {
        // 75 kg now, started at 80 kg
        let stats = WeightStats::from_history(180.0, vec![record(2, 75.0), record(1, 80.0)]);
        assert_eq!(stats.current_weight, 75.0);
        assert_eq!(stats.initial_weight, 80.0);
        assert_eq!(stats.previous_weight, 80.0);
        assert!((stats.total_progress - 6.25).abs() < 1e-9);
        assert!((stats.bmi - 23.148148148148145).abs() < 1e-9);
    }

    #[test]
    fn daily_progress_uses_second_newest() {
        let stats = WeightStats::from_history(
            170.0,
            vec![record(3, 78.0), record(2, 80.0), record(1, 85.0)],
        );
        assert!((stats.daily_progress - 2.5).abs() < 1e-9);
        assert!((stats.total_progress - (7.0 / 85.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn stats_from_empty_history_are_zeros() {
        let stats = WeightStats::from_history(180.0, vec![]);
        assert_eq!(stats.current_weight, 0.0);
        assert_eq!(stats.initial_weight, 0.0);
        assert_eq!(stats.total_progress, 0.0);
        assert_eq!(stats.bmi, 0.0);
        assert!(stats.history.is_empty());
    }

    #[test]
    fn single_record_has_no_progress() {
        let stats = WeightStats::from_history(180.0, vec![record(1, 90.0)]);
        assert_eq!(stats.current_weight, 90.0);
        assert_eq!(stats.initial_weight, 90.0);
        assert_eq!(stats.previous_weight, 0.0);
        assert_eq!(stats.total_progress, 0.0);
        assert_eq!(stats.daily_progress, 0.0);
    }
}
