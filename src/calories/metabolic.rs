use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Goal {
    Maintain,
    Lose,
    Gain,
}

/// How the averaged intake over a period relates to the daily target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IntakeStatus {
    #[serde(rename = "over target")]
    OverTarget,
    #[serde(rename = "under target")]
    UnderTarget,
    #[serde(rename = "on target")]
    OnTarget,
}

/// Basal metabolic rate by Mifflin-St Jeor.
pub fn bmr(weight_kg: f64, height_cm: f64, age: i32, gender: Gender) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64;
    match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    }
}

impl ActivityLevel {
    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

/// Maintenance calories: BMR scaled by the activity multiplier.
pub fn maintenance_calories(bmr: f64, level: ActivityLevel) -> f64 {
    bmr * level.multiplier()
}

impl Goal {
    /// Daily calorie target as a share of maintenance: 20% down to lose,
    /// 20% up to gain.
    pub fn daily_target(self, maintenance: f64) -> f64 {
        match self {
            Goal::Lose => maintenance * 0.8,
            Goal::Gain => maintenance * 1.2,
            Goal::Maintain => maintenance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroSplit {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Grams of protein, carbs and fat for a calorie budget, split 30/40/30.
/// Protein and carbs carry 4 kcal per gram, fat 9.
pub fn macro_split(calories: f64) -> MacroSplit {
    MacroSplit {
        protein: (calories * 0.30 / 4.0).round(),
        carbs: (calories * 0.40 / 4.0).round(),
        fat: (calories * 0.30 / 9.0).round(),
    }
}

/// Classify the signed deficit (average intake minus target) for a goal.
/// Maintaining tolerates a 100 kcal band around the target.
pub fn intake_status(deficit: f64, goal: Goal) -> IntakeStatus {
    match goal {
        Goal::Lose | Goal::Gain => {
            if deficit >= 0.0 {
                IntakeStatus::OverTarget
            } else {
                IntakeStatus::UnderTarget
            }
        }
        Goal::Maintain => {
            if deficit.abs() <= 100.0 {
                IntakeStatus::OnTarget
            } else if deficit > 0.0 {
                IntakeStatus::OverTarget
            } else {
                IntakeStatus::UnderTarget
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmr_male_known_case() {
        // 80 kg, 180 cm, 30 years
        assert_eq!(bmr(80.0, 180.0, 30, Gender::Male), 1780.0);
    }

    #[test]
    fn bmr_female_known_case() {
        assert_eq!(bmr(80.0, 180.0, 30, Gender::Female), 1614.0);
    }

    #[test]
    fn activity_multipliers() {
        assert_eq!(ActivityLevel::Sedentary.multiplier(), 1.2);
        assert_eq!(ActivityLevel::Light.multiplier(), 1.375);
        assert_eq!(ActivityLevel::Moderate.multiplier(), 1.55);
        assert_eq!(ActivityLevel::Active.multiplier(), 1.725);
        assert_eq!(ActivityLevel::VeryActive.multiplier(), 1.9);
    }

    #[test]
    fn maintenance_scales_bmr() {
        let b = bmr(80.0, 180.0, 30, Gender::Male);
        assert_eq!(maintenance_calories(b, ActivityLevel::Sedentary), 2136.0);
    }

    #[test]
    fn goal_targets_are_proportional() {
        assert_eq!(Goal::Lose.daily_target(2000.0), 1600.0);
        assert_eq!(Goal::Gain.daily_target(2000.0), 2400.0);
        assert_eq!(Goal::Maintain.daily_target(2000.0), 2000.0);
    }

    #[test]
    fn macro_split_for_2000_kcal() {
        let m = macro_split(2000.0);
        assert_eq!(m.protein, 150.0);
        assert_eq!(m.carbs, 200.0);
        assert_eq!(m.fat, 67.0);
    }

    #[test]
    fn losing_counts_any_surplus_as_over() {
        assert_eq!(intake_status(0.0, Goal::Lose), IntakeStatus::OverTarget);
        assert_eq!(intake_status(250.0, Goal::Lose), IntakeStatus::OverTarget);
        assert_eq!(intake_status(-1.0, Goal::Lose), IntakeStatus::UnderTarget);
    }

    #[test]
    fn gaining_uses_the_same_split_as_losing() {
        assert_eq!(intake_status(10.0, Goal::Gain), IntakeStatus::OverTarget);
        assert_eq!(intake_status(-200.0, Goal::Gain), IntakeStatus::UnderTarget);
    }

    #[test]
    fn maintaining_tolerates_100_kcal_either_way() {
        assert_eq!(intake_status(100.0, Goal::Maintain), IntakeStatus::OnTarget);
        assert_eq!(intake_status(-100.0, Goal::Maintain), IntakeStatus::OnTarget);
        assert_eq!(intake_status(100.1, Goal::Maintain), IntakeStatus::OverTarget);
        assert_eq!(intake_status(-150.0, Goal::Maintain), IntakeStatus::UnderTarget);
    }

    #[test]
    fn enums_use_snake_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&ActivityLevel::VeryActive).unwrap(),
            "\"very_active\""
        );
        let parsed: ActivityLevel = serde_json::from_str("\"very_active\"").unwrap();
        assert_eq!(parsed, ActivityLevel::VeryActive);

        assert_eq!(
            serde_json::to_string(&IntakeStatus::OnTarget).unwrap(),
            "\"on target\""
        );
        assert_eq!(serde_json::to_string(&Goal::Lose).unwrap(), "\"lose\"");
    }

    #[test]
    fn unknown_activity_level_is_rejected() {
        assert!(serde_json::from_str::<ActivityLevel>("\"extreme\"").is_err());
    }
}
