use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Name used for a meal whose analysis recognized no food items.
pub const DEFAULT_MEAL_NAME: &str = "Scanned Meal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub goal_weight_kg: f64,
    pub calorie_goal: f64,
    pub protein_goal: f64,
    pub carbs_goal: f64,
    pub fat_goal: f64,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Jupli".to_string(),
            age: 28,
            weight_kg: 80.0,
            height_cm: 175.0,
            goal_weight_kg: 75.0,
            calorie_goal: 2200.0,
            protein_goal: 140.0,
            carbs_goal: 250.0,
            fat_goal: 70.0,
        }
    }
}

impl UserProfile {
    /// Shallow merge: every field present in `update` replaces the current value.
    /// Non-finite numbers are ignored.
    pub fn merge(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name.clone_from(name);
        }
        if let Some(age) = update.age {
            self.age = age;
        }
        if let Some(v) = update.weight_kg.filter(|v| v.is_finite()) {
            self.weight_kg = v;
        }
        if let Some(v) = update.height_cm.filter(|v| v.is_finite()) {
            self.height_cm = v;
        }
        if let Some(v) = update.goal_weight_kg.filter(|v| v.is_finite()) {
            self.goal_weight_kg = v;
        }
        if let Some(v) = update.calorie_goal.filter(|v| v.is_finite()) {
            self.calorie_goal = v;
        }
        if let Some(v) = update.protein_goal.filter(|v| v.is_finite()) {
            self.protein_goal = v;
        }
        if let Some(v) = update.carbs_goal.filter(|v| v.is_finite()) {
            self.carbs_goal = v;
        }
        if let Some(v) = update.fat_goal.filter(|v| v.is_finite()) {
            self.fat_goal = v;
        }
    }
}

/// Partial profile payload for `Action::UpdateProfile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calorie_goal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_goal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs_goal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_goal: Option<f64>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl FoodItem {
    pub fn new(name: impl Into<String>, calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            name: name.into(),
            calories,
            protein,
            carbs,
            fat,
        }
    }

    /// Same item with NaN or infinite nutrient values replaced by 0.
    #[must_use]
    pub fn finite(self) -> Self {
        Self {
            calories: finite_or_zero(self.calories),
            protein: finite_or_zero(self.protein),
            carbs: finite_or_zero(self.carbs),
            fat: finite_or_zero(self.fat),
            ..self
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

// Items are finite, so the sum can only overflow to an infinity, never NaN.
fn saturating_sum(values: impl Iterator<Item = f64>) -> f64 {
    values.sum::<f64>().clamp(f64::MIN, f64::MAX)
}

/// A logged eating event.
///
/// Fields are private so totals can only come from [`Meal::from_items`] and
/// never drift away from `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    id: String,
    name: String,
    timestamp: String,
    items: Vec<FoodItem>,
    total_calories: f64,
    total_protein: f64,
    total_carbs: f64,
    total_fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

impl Meal {
    /// Build a meal whose totals are the field-wise sums of `items`.
    ///
    /// The name is the item names joined by `", "`, or [`DEFAULT_MEAL_NAME`]
    /// when there are no items.
    pub fn from_items(
        id: impl Into<String>,
        timestamp: impl Into<String>,
        items: Vec<FoodItem>,
        image_url: Option<String>,
    ) -> Self {
        let items: Vec<FoodItem> = items.into_iter().map(FoodItem::finite).collect();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        let name = if names.is_empty() {
            DEFAULT_MEAL_NAME.to_string()
        } else {
            names.join(", ")
        };

        Self {
            id: id.into(),
            name,
            timestamp: timestamp.into(),
            total_calories: saturating_sum(items.iter().map(|i| i.calories)),
            total_protein: saturating_sum(items.iter().map(|i| i.protein)),
            total_carbs: saturating_sum(items.iter().map(|i| i.carbs)),
            total_fat: saturating_sum(items.iter().map(|i| i.fat)),
            items,
            image_url,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    #[must_use]
    pub fn total_calories(&self) -> f64 {
        self.total_calories
    }

    #[must_use]
    pub fn total_protein(&self) -> f64 {
        self.total_protein
    }

    #[must_use]
    pub fn total_carbs(&self) -> f64 {
        self.total_carbs
    }

    #[must_use]
    pub fn total_fat(&self) -> f64 {
        self.total_fat
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub date: NaiveDate,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub water_intake_oz: f64,
    #[serde(default)]
    pub calories_burned: f64,
}

impl DailyLog {
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            meals: Vec::new(),
            water_intake_oz: 0.0,
            calories_burned: 0.0,
        }
    }

    #[must_use]
    pub fn contains_meal(&self, id: &str) -> bool {
        self.meals.iter().any(|m| m.id() == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub profile: UserProfile,
    #[serde(default)]
    pub daily_logs: BTreeMap<NaiveDate, DailyLog>,
}

impl AppState {
    #[must_use]
    pub fn log(&self, date: NaiveDate) -> Option<&DailyLog> {
        self.daily_logs.get(&date)
    }
}

/// Top-level pages of the app. The CLI maps its subcommands onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Splash,
    Home,
    Progress,
    Settings,
    AddMeal,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Splash,
        Page::Home,
        Page::Progress,
        Page::Settings,
        Page::AddMeal,
    ];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Page::Splash => "snapcal",
            Page::Home => "Today",
            Page::Progress => "Progress",
            Page::Settings => "Settings",
            Page::AddMeal => "Scanner",
        }
    }

    /// The bottom navigation is hidden while splashing and while scanning.
    #[must_use]
    pub fn shows_nav(self) -> bool {
        !matches!(self, Page::Splash | Page::AddMeal)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Page::Splash => "splash",
            Page::Home => "home",
            Page::Progress => "progress",
            Page::Settings => "settings",
            Page::AddMeal => "add-meal",
        };
        f.write_str(s)
    }
}

impl FromStr for Page {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|p| p.to_string() == s.to_lowercase())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid page '{s}'. Must be one of: splash, home, progress, settings, add-meal"
                )
            })
    }
}
