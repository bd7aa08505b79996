use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use snapcal_core::models::{DATE_FORMAT, FoodItem, Page};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, DATE_FORMAT).with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// MIME type for an image path, by extension. Unknown extensions are sent as JPEG.
pub(crate) fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        _ => "image/jpeg",
    }
}

/// Ask a yes/no question on stderr. Empty input takes `default`.
pub(crate) fn prompt_yes_no(question: &str, default: bool) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    eprint!("{question} {hint} ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    parse_yes_no(&line, default)
}

fn parse_yes_no(answer: &str, default: bool) -> Result<bool> {
    match answer.trim().to_lowercase().as_str() {
        "" => Ok(default),
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        other => bail!("Expected y or n, got '{other}'"),
    }
}

pub(crate) fn print_header(page: Page) {
    let title = page.title().to_uppercase();
    println!("=== {title} ===\n");
}

/// Text stand-in for the bottom navigation bar, with the current page bracketed.
pub(crate) fn nav_bar(current: Page) -> Option<String> {
    if !current.shows_nav() {
        return None;
    }
    let tabs: Vec<String> = [Page::Home, Page::Progress, Page::Settings]
        .into_iter()
        .map(|p| {
            if p == current {
                format!("[{}]", p.title())
            } else {
                p.title().to_string()
            }
        })
        .collect();
    Some(format!("{}   (+) snapcal scan <photo>", tabs.join("  ")))
}

pub(crate) fn print_nav(current: Page) {
    if let Some(bar) = nav_bar(current) {
        println!("\n{bar}");
    }
}

pub(crate) fn print_food_table(items: &[FoodItem]) {
    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
    }

    let rows: Vec<ItemRow> = items
        .iter()
        .enumerate()
        .map(|(i, f)| ItemRow {
            idx: i + 1,
            name: truncate(&f.name, 35),
            calories: format!("{:.0}", no_neg_zero(f.calories)),
            protein: format!("{:.1}g", no_neg_zero(f.protein)),
            carbs: format!("{:.1}g", no_neg_zero(f.carbs)),
            fat: format!("{:.1}g", no_neg_zero(f.fat)),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max.saturating_sub(3)).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
        assert!(parse_date(Some("2024-13-01".to_string())).is_err());
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("lunch.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("lunch.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("lunch.jpg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("lunch")), "image/jpeg");
    }

    #[test]
    fn test_parse_yes_no() {
        assert!(parse_yes_no("", true).unwrap());
        assert!(!parse_yes_no("", false).unwrap());
        assert!(parse_yes_no(" Y ", false).unwrap());
        assert!(!parse_yes_no("no", true).unwrap());
        assert!(parse_yes_no("maybe", true).is_err());
    }

    #[test]
    fn test_nav_bar() {
        assert_eq!(
            nav_bar(Page::Progress).unwrap(),
            "Today  [Progress]  Settings   (+) snapcal scan <photo>"
        );
        assert!(nav_bar(Page::AddMeal).is_none());
        assert!(nav_bar(Page::Splash).is_none());
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("boom"), r#"{"error":"boom"}"#);
        assert_eq!(json_error("say \"hi\""), r#"{"error":"say \"hi\""}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_tiny_max() {
        assert_eq!(truncate("hello", 2), "...");
        assert_eq!(truncate("hello", 0), "...");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("日清カップヌードル", 8), "日清カップ...");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert!((no_neg_zero(-3.0) + 3.0).abs() < f64::EPSILON);
    }
}
