use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::calories::metabolic::{
    intake_status, macro_split, ActivityLevel, Gender, Goal, IntakeStatus, MacroSplit,
};
use crate::calories::repo::{ActivityEntry, DailyLog, FoodEntry};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieSettingsRequest {
    pub gender: Gender,
    pub age: i32,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntryRequest {
    pub name: String,
    pub calories: f64,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub meal_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntryRequest {
    pub name: String,
    pub calories: f64,
    pub duration_min: Option<i32>,
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub time: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    pub date: Option<Date>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogResponse {
    pub log: DailyLog,
    pub food_entries: Vec<FoodEntry>,
    pub activity_entries: Vec<ActivityEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyNeeds {
    pub maintenance: f64,
    pub weight_loss: f64,
    pub weight_gain: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Macronutrients {
    pub maintenance: MacroSplit,
    pub weight_loss: MacroSplit,
    pub weight_gain: MacroSplit,
}

/// Computed daily needs for all three goals plus the target for the
/// user's own goal. Calorie values are rounded to whole numbers for
/// display; macros are split before rounding.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieNeeds {
    pub bmr: f64,
    pub daily_needs: DailyNeeds,
    pub macronutrients: Macronutrients,
    pub target_calories: f64,
    pub goal: Goal,
    pub activity_level: ActivityLevel,
}

impl CalorieNeeds {
    pub fn build(bmr: f64, maintenance: f64, goal: Goal, level: ActivityLevel) -> Self {
        let weight_loss = Goal::Lose.daily_target(maintenance);
        let weight_gain = Goal::Gain.daily_target(maintenance);
        let target = goal.daily_target(maintenance);

        Self {
            bmr: bmr.round(),
            daily_needs: DailyNeeds {
                maintenance: maintenance.round(),
                weight_loss: weight_loss.round(),
                weight_gain: weight_gain.round(),
            },
            macronutrients: Macronutrients {
                maintenance: macro_split(maintenance),
                weight_loss: macro_split(weight_loss),
                weight_gain: macro_split(weight_gain),
            },
            target_calories: target.round(),
            goal,
            activity_level: level,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBreakdown {
    pub date: Date,
    pub food_kcal: f64,
    pub activity_kcal: f64,
    pub net_kcal: f64,
}

impl From<&DailyLog> for DailyBreakdown {
    fn from(log: &DailyLog) -> Self {
        Self {
            date: log.date,
            food_kcal: log.food_kcal,
            activity_kcal: log.activity_kcal,
            net_kcal: log.food_kcal - log.activity_kcal,
        }
    }
}

fn has_entries(day: &DailyBreakdown) -> bool {
    day.food_kcal > 0.0 || day.activity_kcal > 0.0
}

/// Per-kind averages across days that actually saw any intake or
/// activity. Days the user never touched do not dilute the average.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RangeAverages {
    pub food_kcal: f64,
    pub activity_kcal: f64,
    pub net_kcal: f64,
}

impl RangeAverages {
    pub fn from_days(days: &[DailyBreakdown]) -> Self {
        let counted: Vec<&DailyBreakdown> = days.iter().filter(|d| has_entries(d)).collect();
        if counted.is_empty() {
            return Self {
                food_kcal: 0.0,
                activity_kcal: 0.0,
                net_kcal: 0.0,
            };
        }

        let n = counted.len() as f64;
        Self {
            food_kcal: (counted.iter().map(|d| d.food_kcal).sum::<f64>() / n).round(),
            activity_kcal: (counted.iter().map(|d| d.activity_kcal).sum::<f64>() / n).round(),
            net_kcal: (counted.iter().map(|d| d.net_kcal).sum::<f64>() / n).round(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeAnalysis {
    pub average_daily_intake: f64,
    pub total_daily_intake: f64,
    pub total_current_day_intake: f64,
    pub target_calories: f64,
    pub calorie_deficit: f64,
    pub status: IntakeStatus,
}

impl IntakeAnalysis {
    /// Compare the averaged net intake against the daily target. The
    /// status is classified before rounding; rounding is display only.
    pub fn build(days: &[DailyBreakdown], today: Date, target: f64, goal: Goal) -> Self {
        let counted: Vec<&DailyBreakdown> = days.iter().filter(|d| has_entries(d)).collect();
        let total: f64 = counted.iter().map(|d| d.net_kcal).sum();
        let average = if counted.is_empty() {
            0.0
        } else {
            total / counted.len() as f64
        };
        let current_day = days
            .iter()
            .find(|d| d.date == today)
            .map(|d| d.food_kcal)
            .unwrap_or(0.0);

        let deficit = if target > 0.0 { average - target } else { 0.0 };
        let status = intake_status(deficit, goal);

        Self {
            average_daily_intake: average.round(),
            total_daily_intake: total.round(),
            total_current_day_intake: current_day.round(),
            target_calories: target.round(),
            calorie_deficit: deficit.round(),
            status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieStatsResponse {
    pub start_date: Date,
    pub end_date: Date,
    pub bmr: f64,
    pub daily_needs: DailyNeeds,
    pub macronutrients: Macronutrients,
    pub target_calories: f64,
    pub daily: Vec<DailyBreakdown>,
    pub averages: RangeAverages,
    pub intake_analysis: IntakeAnalysis,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn day(date: Date, food: f64, activity: f64) -> DailyBreakdown {
        DailyBreakdown {
            date,
            food_kcal: food,
            activity_kcal: activity,
            net_kcal: food - activity,
        }
    }

    #[test]
    fn averages_skip_untouched_days() {
        let days = vec![
            day(date!(2025 - 06 - 01), 2000.0, 500.0),
            day(date!(2025 - 06 - 02), 0.0, 0.0),
            day(date!(2025 - 06 - 03), 1000.0, 0.0),
        ];
        let avg = RangeAverages::from_days(&days);
        assert_eq!(avg.food_kcal, 1500.0);
        assert_eq!(avg.activity_kcal, 250.0);
        assert_eq!(avg.net_kcal, 1250.0);
    }

    #[test]
    fn averages_over_no_days_are_zero() {
        assert_eq!(
            RangeAverages::from_days(&[]),
            RangeAverages {
                food_kcal: 0.0,
                activity_kcal: 0.0,
                net_kcal: 0.0,
            }
        );
    }

    #[test]
    fn activity_only_days_still_count() {
        let days = vec![
            day(date!(2025 - 06 - 01), 0.0, 400.0),
            day(date!(2025 - 06 - 02), 2000.0, 0.0),
        ];
        let avg = RangeAverages::from_days(&days);
        assert_eq!(avg.food_kcal, 1000.0);
        assert_eq!(avg.net_kcal, 800.0);
    }

    #[test]
    fn intake_analysis_against_target() {
        let today = date!(2025 - 06 - 03);
        let days = vec![
            day(date!(2025 - 06 - 01), 2100.0, 100.0),
            day(date!(2025 - 06 - 02), 0.0, 0.0),
            day(today, 1800.0, 200.0),
        ];
        // counted: net 2000 and net 1600, average 1800
        let analysis = IntakeAnalysis::build(&days, today, 1700.0, Goal::Lose);
        assert_eq!(analysis.average_daily_intake, 1800.0);
        assert_eq!(analysis.total_daily_intake, 3600.0);
        assert_eq!(analysis.total_current_day_intake, 1800.0);
        assert_eq!(analysis.calorie_deficit, 100.0);
        assert_eq!(analysis.status, IntakeStatus::OverTarget);
    }

    #[test]
    fn current_day_outside_range_is_zero() {
        let days = vec![day(date!(2025 - 06 - 01), 1500.0, 0.0)];
        let analysis =
            IntakeAnalysis::build(&days, date!(2025 - 06 - 10), 1500.0, Goal::Maintain);
        assert_eq!(analysis.total_current_day_intake, 0.0);
        assert_eq!(analysis.status, IntakeStatus::OnTarget);
    }

    #[test]
    fn needs_are_rounded_for_display() {
        let needs = CalorieNeeds::build(1780.4, 2136.6, Goal::Lose, ActivityLevel::Sedentary);
        assert_eq!(needs.bmr, 1780.0);
        assert_eq!(needs.daily_needs.maintenance, 2137.0);
        assert_eq!(needs.daily_needs.weight_loss, 1709.0);
        assert_eq!(needs.daily_needs.weight_gain, 2564.0);
        // The target tracks the user's own goal
        assert_eq!(needs.target_calories, needs.daily_needs.weight_loss);
    }

    #[test]
    fn needs_split_macros_per_goal() {
        let needs = CalorieNeeds::build(1780.0, 2000.0, Goal::Gain, ActivityLevel::Moderate);
        assert_eq!(needs.macronutrients.maintenance.protein, 150.0);
        assert_eq!(needs.macronutrients.weight_loss.protein, 120.0);
        assert_eq!(needs.macronutrients.weight_gain.protein, 180.0);
        assert_eq!(needs.target_calories, 2400.0);
    }
}
