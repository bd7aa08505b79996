use anyhow::{Result, bail};
use chrono::Local;

use snapcal_core::models::Page;
use snapcal_core::store::Store;
use snapcal_core::summary::progress_report;

use super::helpers::{print_header, print_nav};

pub(crate) fn cmd_progress(store: &Store, days: u32, json: bool) -> Result<()> {
    if days == 0 {
        bail!("Days must be at least 1");
    }

    let today = Local::now().date_naive();
    let report = progress_report(store.state(), today, days);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_header(Page::Progress);

    let kg = report.weight_kg;
    let lb = report.weight_lb;
    println!("  WEIGHT: {kg:.1} kg ({lb:.1} lb)");
    let goal_kg = report.goal_weight_kg;
    let goal_lb = report.goal_weight_lb;
    let to_goal = report.to_goal_kg;
    if to_goal.abs() < 0.05 {
        println!("  GOAL:   {goal_kg:.1} kg ({goal_lb:.1} lb), reached");
    } else if to_goal > 0.0 {
        println!("  GOAL:   {goal_kg:.1} kg ({goal_lb:.1} lb), {to_goal:.1} kg to lose");
    } else {
        let gain = -to_goal;
        println!("  GOAL:   {goal_kg:.1} kg ({goal_lb:.1} lb), {gain:.1} kg to gain");
    }

    match (report.bmi, report.bmi_category) {
        (Some(bmi), Some(category)) => println!("  BMI:    {bmi:.1} ({category})"),
        _ => println!("  BMI:    - (set a height in settings)"),
    }

    let streak = report.logging_streak;
    println!("  STREAK: {streak} day(s)");
    let avg = report.average_calories;
    if avg > 0.0 {
        println!("  AVERAGE: {avg:.0} kcal/day over logged days in the last {days} day(s)");
    } else {
        println!("  AVERAGE: no meals logged in the last {days} day(s)");
    }

    print_nav(Page::Progress);
    Ok(())
}
