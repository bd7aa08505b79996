use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use snapcal_core::models::{Meal, Page};
use snapcal_core::store::Store;
use snapcal_core::summary::{DaySummary, day_summary, history, logging_streak};

use super::helpers::{no_neg_zero, parse_date, print_header, print_nav};

const OZ_PER_CUP: f64 = 8.0;

/// Local wall-clock time of a meal, or the raw timestamp if it doesn't parse.
fn meal_time(meal: &Meal) -> String {
    DateTime::parse_from_rfc3339(meal.timestamp()).map_or_else(
        |_| meal.timestamp().to_string(),
        |t| t.with_timezone(&Local).format("%H:%M").to_string(),
    )
}

fn left_or_over(left: f64, unit: &str) -> String {
    if left >= 0.0 {
        format!("{:.0}{unit} left", no_neg_zero(left))
    } else {
        format!("{:.0}{unit} over", -left)
    }
}

pub(crate) fn cmd_home(store: &Store, date: Option<String>, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct HomeView<'a> {
        #[serde(flatten)]
        summary: &'a DaySummary,
        streak: u32,
    }

    let date = parse_date(date)?;
    let summary = day_summary(store.state(), date);
    let streak = logging_streak(store.state(), Local::now().date_naive());

    if json {
        let view = HomeView {
            summary: &summary,
            streak,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    print_header(Page::Home);
    let name = &store.state().profile.name;
    println!("  {name}  ·  {date}  ·  streak: {streak} day(s)\n");

    let left = summary.calories_left;
    let eaten = no_neg_zero(summary.totals.calories);
    let goal = summary.calorie_goal;
    println!("  CALORIES: {}  ({eaten:.0} / {goal:.0} kcal)", left_or_over(left, " kcal"));
    println!(
        "  PROTEIN: {}  CARBS: {}  FAT: {}",
        left_or_over(summary.protein_left, "g"),
        left_or_over(summary.carbs_left, "g"),
        left_or_over(summary.fat_left, "g"),
    );
    let water = summary.water_intake_oz;
    let cups = water / OZ_PER_CUP;
    let burned = summary.calories_burned;
    println!("  WATER: {water:.0} fl oz ({cups:.1} cups)  BURNED: {burned:.0} kcal\n");

    if summary.is_empty() {
        println!("  No meals yet. Run `snapcal scan <photo>` to add your first meal of the day.");
    } else {
        println!("  MEALS");
        for meal in &summary.meals {
            let time = meal_time(meal);
            let name = meal.name();
            let cal = meal.total_calories();
            let p = meal.total_protein();
            let c = meal.total_carbs();
            let f = meal.total_fat();
            println!("    {time}  {name} — {cal:.0} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g");
        }
    }

    print_nav(Page::Home);
    Ok(())
}

pub(crate) fn cmd_history(store: &Store, days: u32, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Meals")]
        meals: usize,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Left")]
        left: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Water")]
        water: String,
    }

    let today = Local::now().date_naive();
    let summaries = history(store.state(), today, days);

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.iter().all(DaySummary::is_empty) {
        eprintln!("No meals in the last {days} days");
        process::exit(2);
    }

    let rows: Vec<HistoryRow> = summaries
        .iter()
        .map(|s| {
            let cal = no_neg_zero(s.totals.calories);
            let left = no_neg_zero(s.calories_left);
            let p = no_neg_zero(s.totals.protein);
            let c = no_neg_zero(s.totals.carbs);
            let f = no_neg_zero(s.totals.fat);
            let w = no_neg_zero(s.water_intake_oz);
            HistoryRow {
                date: s.date.to_string(),
                meals: s.meals.len(),
                calories: format!("{cal:.0}"),
                left: format!("{left:.0}"),
                protein: format!("{p:.0}g"),
                carbs: format!("{c:.0}g"),
                fat: format!("{f:.0}g"),
                water: format!("{w:.0} oz"),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapcal_core::models::FoodItem;

    #[test]
    fn test_left_or_over() {
        assert_eq!(left_or_over(150.4, " kcal"), "150 kcal left");
        assert_eq!(left_or_over(-0.0, "g"), "0g left");
        assert_eq!(left_or_over(-20.0, "g"), "20g over");
    }

    #[test]
    fn test_meal_time_falls_back_to_raw() {
        let meal = Meal::from_items("x", "lunchtime", vec![FoodItem::new("a", 1.0, 0.0, 0.0, 0.0)], None);
        assert_eq!(meal_time(&meal), "lunchtime");

        let meal = Meal::from_items("y", "2024-01-01T12:30:00.000Z", vec![], None);
        assert_eq!(meal_time(&meal).len(), 5);
    }
}
