//! Aggregates derived from [`AppState`] on read. Nothing here is persisted.

use std::fmt;

use chrono::{Days, Duration, NaiveDate};
use serde::Serialize;

use crate::models::{AppState, DailyLog, Meal};

pub const LBS_PER_KG: f64 = 2.20462;

/// Longest window [`history`] will build, about ten years.
pub const MAX_HISTORY_DAYS: u32 = 3650;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DayTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl DayTotals {
    #[must_use]
    pub fn of(log: Option<&DailyLog>) -> Self {
        log.map_or_else(Self::default, |log| {
            log.meals.iter().fold(Self::default(), |acc, m| Self {
                calories: acc.calories + m.total_calories(),
                protein: acc.protein + m.total_protein(),
                carbs: acc.carbs + m.total_carbs(),
                fat: acc.fat + m.total_fat(),
            })
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub meals: Vec<Meal>,
    pub totals: DayTotals,
    pub calorie_goal: f64,
    /// Goal minus eaten; negative when over the goal.
    pub calories_left: f64,
    pub protein_left: f64,
    pub carbs_left: f64,
    pub fat_left: f64,
    pub water_intake_oz: f64,
    pub calories_burned: f64,
}

impl DaySummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }
}

#[must_use]
pub fn day_summary(state: &AppState, date: NaiveDate) -> DaySummary {
    let log = state.log(date);
    let totals = DayTotals::of(log);
    let p = &state.profile;

    DaySummary {
        date,
        meals: log.map(|l| l.meals.clone()).unwrap_or_default(),
        totals,
        calorie_goal: p.calorie_goal,
        calories_left: p.calorie_goal - totals.calories,
        protein_left: p.protein_goal - totals.protein,
        carbs_left: p.carbs_goal - totals.carbs,
        fat_left: p.fat_goal - totals.fat,
        water_intake_oz: log.map_or(0.0, |l| l.water_intake_oz),
        calories_burned: log.map_or(0.0, |l| l.calories_burned),
    }
}

/// One summary per day for the `days` days ending at `end`, newest first.
///
/// At most [`MAX_HISTORY_DAYS`] days, and never before the earliest representable date.
#[must_use]
pub fn history(state: &AppState, end: NaiveDate, days: u32) -> Vec<DaySummary> {
    (0..days.min(MAX_HISTORY_DAYS))
        .map_while(|i| end.checked_sub_days(Days::new(u64::from(i))))
        .map(|date| day_summary(state, date))
        .collect()
}

/// Consecutive days with at least one logged meal, counting back from `today`
/// (or from yesterday when nothing is logged yet today).
#[must_use]
pub fn logging_streak(state: &AppState, today: NaiveDate) -> u32 {
    let logged = |date: NaiveDate| state.log(date).is_some_and(|l| !l.meals.is_empty());

    let yesterday = today - Duration::days(1);
    let start = if logged(today) {
        today
    } else if logged(yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    while logged(start - Duration::days(i64::from(streak))) {
        streak += 1;
    }
    streak
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BmiCategory::Underweight => write!(f, "Underweight"),
            BmiCategory::Normal => write!(f, "Normal"),
            BmiCategory::Overweight => write!(f, "Overweight"),
            BmiCategory::Obese => write!(f, "Obese"),
        }
    }
}

#[must_use]
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if height_cm <= 0.0 || weight_kg <= 0.0 {
        return None;
    }
    let m = height_cm / 100.0;
    Some(weight_kg / (m * m))
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub weight_kg: f64,
    pub weight_lb: f64,
    pub goal_weight_kg: f64,
    pub goal_weight_lb: f64,
    /// Positive when weight still has to come down to reach the goal.
    pub to_goal_kg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi_category: Option<BmiCategory>,
    pub logging_streak: u32,
    pub average_calories: f64,
}

/// Progress page data. `average_calories` covers the `days` days ending at
/// `today`, counting only days with meals.
#[must_use]
pub fn progress_report(state: &AppState, today: NaiveDate, days: u32) -> ProgressReport {
    let p = &state.profile;
    let bmi = bmi(p.weight_kg, p.height_cm);

    let logged: Vec<f64> = history(state, today, days)
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.totals.calories)
        .collect();
    #[allow(clippy::cast_precision_loss)]
    let average_calories = if logged.is_empty() {
        0.0
    } else {
        logged.iter().sum::<f64>() / logged.len() as f64
    };

    ProgressReport {
        weight_kg: p.weight_kg,
        weight_lb: p.weight_kg * LBS_PER_KG,
        goal_weight_kg: p.goal_weight_kg,
        goal_weight_lb: p.goal_weight_kg * LBS_PER_KG,
        to_goal_kg: p.weight_kg - p.goal_weight_kg,
        bmi,
        bmi_category: bmi.map(BmiCategory::from_bmi),
        logging_streak: logging_streak(state, today),
        average_calories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodItem, ProfileUpdate};
    use crate::store::{Action, reduce};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn add(state: AppState, date: NaiveDate, calories: f64) -> AppState {
        let meal = Meal::from_items(
            format!("{date}-{calories}"),
            "2024-01-01T12:00:00Z",
            vec![FoodItem::new("food", calories, 10.0, 20.0, 5.0)],
            None,
        );
        reduce(state, Action::AddMeal { date, meal })
    }

    #[test]
    fn test_day_totals_sum_meal_totals() {
        let state = add(add(AppState::default(), day(1), 300.0), day(1), 450.0);
        let totals = DayTotals::of(state.log(day(1)));
        assert!((totals.calories - 750.0).abs() < f64::EPSILON);
        assert!((totals.protein - 20.0).abs() < f64::EPSILON);
        assert!((totals.carbs - 40.0).abs() < f64::EPSILON);
        assert!((totals.fat - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_day_totals_missing_log() {
        assert_eq!(DayTotals::of(None), DayTotals::default());
    }

    #[test]
    fn test_day_summary_remaining() {
        let state = add(AppState::default(), day(1), 700.0);
        let state = reduce(
            state,
            Action::SetWater {
                date: day(1),
                amount: 20.0,
            },
        );
        let s = day_summary(&state, day(1));
        assert_eq!(s.meals.len(), 1);
        assert!((s.calories_left - 1500.0).abs() < f64::EPSILON);
        assert!((s.protein_left - 130.0).abs() < f64::EPSILON);
        assert!((s.water_intake_oz - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_day_summary_over_goal_is_negative() {
        let state = add(AppState::default(), day(1), 2500.0);
        let s = day_summary(&state, day(1));
        assert!((s.calories_left + 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_history_includes_empty_days_newest_first() {
        let state = add(AppState::default(), day(3), 500.0);
        let h = history(&state, day(5), 4);
        let dates: Vec<NaiveDate> = h.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(5), day(4), day(3), day(2)]);
        assert!(h[0].is_empty());
        assert!((h[2].totals.calories - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_history_is_capped() {
        let h = history(&AppState::default(), day(5), u32::MAX);
        assert_eq!(h.len(), MAX_HISTORY_DAYS as usize);
        assert_eq!(h[0].date, day(5));

        let h = history(&AppState::default(), NaiveDate::MIN, 3);
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].date, NaiveDate::MIN);
    }

    #[test]
    fn test_logging_streak() {
        let mut state = AppState::default();
        for d in [1, 3, 4, 5] {
            state = add(state, day(d), 100.0);
        }
        assert_eq!(logging_streak(&state, day(5)), 3);
        // Nothing logged yet today: streak still counts from yesterday.
        assert_eq!(logging_streak(&state, day(6)), 3);
        assert_eq!(logging_streak(&state, day(7)), 0);
        assert_eq!(logging_streak(&state, day(1)), 1);
    }

    #[test]
    fn test_logging_streak_ignores_water_only_days() {
        let state = reduce(
            AppState::default(),
            Action::SetWater {
                date: day(2),
                amount: 8.0,
            },
        );
        assert_eq!(logging_streak(&state, day(2)), 0);
    }

    #[test]
    fn test_bmi() {
        let v = bmi(80.0, 175.0).unwrap();
        assert!((v - 26.12).abs() < 0.01);
        assert!(bmi(80.0, 0.0).is_none());
        assert!(bmi(0.0, 175.0).is_none());
    }

    #[test]
    fn test_bmi_category_boundaries() {
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(24.9), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
        assert_eq!(BmiCategory::Overweight.to_string(), "Overweight");
    }

    #[test]
    fn test_progress_report() {
        let state = add(add(AppState::default(), day(4), 1800.0), day(5), 2200.0);
        let state = reduce(
            state,
            Action::UpdateProfile(ProfileUpdate {
                weight_kg: Some(70.0),
                height_cm: Some(180.0),
                ..ProfileUpdate::default()
            }),
        );
        let r = progress_report(&state, day(5), 7);
        assert!((r.weight_lb - 70.0 * LBS_PER_KG).abs() < 1e-9);
        assert!((r.to_goal_kg + 5.0).abs() < f64::EPSILON);
        assert_eq!(r.bmi_category, Some(BmiCategory::Normal));
        assert_eq!(r.logging_streak, 2);
        assert!((r.average_calories - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_report_no_height() {
        let state = reduce(
            AppState::default(),
            Action::UpdateProfile(ProfileUpdate {
                height_cm: Some(0.0),
                ..ProfileUpdate::default()
            }),
        );
        let r = progress_report(&state, day(1), 7);
        assert!(r.bmi.is_none());
        assert!(r.bmi_category.is_none());
        assert!(r.average_calories.abs() < f64::EPSILON);
    }
}
