use anyhow::{Context, Result, bail};
use chrono::Local;
use std::path::Path;
use std::process;

use snapcal_core::models::Page;
use snapcal_core::scan::{ScanFlow, ScanState};
use snapcal_core::store::Store;

use crate::config::Config;
use crate::gemini::GeminiClient;

use super::helpers::{json_error, mime_for_path, print_food_table, print_header, prompt_yes_no};

pub(crate) async fn cmd_scan(
    store: &mut Store,
    config: &Config,
    image: &Path,
    name: Option<&str>,
    yes: bool,
    json: bool,
) -> Result<()> {
    let client = GeminiClient::from_config(config)?;
    let bytes =
        std::fs::read(image).with_context(|| format!("Failed to read image: {}", image.display()))?;
    if bytes.is_empty() {
        bail!("Image file is empty: {}", image.display());
    }
    let mime_type = mime_for_path(image);

    let mut flow = ScanFlow::new();
    let ticket = flow.select_image(image.display().to_string())?;
    if !json {
        print_header(Page::AddMeal);
        eprintln!("Analyzing {}...", image.display());
    }

    let result = client.analyze(&bytes, mime_type, config.failure_mode).await;
    flow.complete(ticket, result);

    if let ScanState::Error { message, cause, .. } = flow.state() {
        if json {
            println!("{}", json_error(message));
            process::exit(1);
        }
        bail!("{message} ({cause})");
    }

    let items = flow.items().unwrap_or_default();
    let flagged = flow.has_placeholder();
    if !json {
        if items.is_empty() {
            eprintln!("No food items detected.");
        } else {
            print_food_table(items);
        }
        if flagged {
            eprintln!("Warning: the image could not be analyzed; the result is a placeholder.");
        }
    }

    // Placeholder or empty results are logged only when asked for explicitly.
    let accept = yes || prompt_yes_no("Log this meal?", !flagged && !items.is_empty())?;
    if !accept {
        flow.reset();
        if json {
            println!("{}", json_error("Meal discarded"));
        } else {
            eprintln!("Discarded.");
        }
        process::exit(2);
    }

    let now = Local::now();
    let meal = flow.confirm_named(store, now, name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        let meal_name = meal.name();
        let cal = meal.total_calories();
        let p = meal.total_protein();
        let c = meal.total_carbs();
        let f = meal.total_fat();
        let date = now.date_naive();
        println!("Logged {meal_name} for {date} — {cal:.0} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g");
    }
    Ok(())
}
