use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;

use snapcal_core::models::DailyLog;
use snapcal_core::store::{Action, Store};

use super::helpers::parse_date;

/// Per-day numeric fields that are set directly rather than built from meals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Counter {
    Water,
    CaloriesBurned,
}

impl Counter {
    fn read(self, log: Option<&DailyLog>) -> f64 {
        log.map_or(0.0, |l| match self {
            Counter::Water => l.water_intake_oz,
            Counter::CaloriesBurned => l.calories_burned,
        })
    }

    fn action(self, date: NaiveDate, amount: f64) -> Action {
        match self {
            Counter::Water => Action::SetWater { date, amount },
            Counter::CaloriesBurned => Action::SetCaloriesBurned { date, amount },
        }
    }

    fn label(self) -> &'static str {
        match self {
            Counter::Water => "Water",
            Counter::CaloriesBurned => "Calories burned",
        }
    }

    fn unit(self) -> &'static str {
        match self {
            Counter::Water => "fl oz",
            Counter::CaloriesBurned => "kcal",
        }
    }
}

/// Set (or with `add`, shift) a day's counter. The stored value never goes below 0.
pub(crate) fn cmd_adjust(
    store: &mut Store,
    counter: Counter,
    amount: f64,
    add: bool,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    #[derive(Serialize)]
    struct Adjusted {
        date: NaiveDate,
        previous: f64,
        value: f64,
    }

    if !amount.is_finite() {
        bail!("Amount must be a number");
    }
    let date = parse_date(date)?;
    let previous = counter.read(store.state().log(date));
    let target = if add { previous + amount } else { amount };
    if !target.is_finite() {
        bail!("{} would be out of range", counter.label());
    }

    store.dispatch(counter.action(date, target));
    let value = counter.read(store.state().log(date));

    if json {
        let out = Adjusted {
            date,
            previous,
            value,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let label = counter.label();
        let unit = counter.unit();
        println!("{label} for {date}: {value:.0} {unit} (was {previous:.0})");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> Option<String> {
        Some("2024-01-01".to_string())
    }

    fn water(store: &Store) -> f64 {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Counter::Water.read(store.state().log(date))
    }

    #[test]
    fn test_set_and_add_water() {
        let mut store = Store::default();
        cmd_adjust(&mut store, Counter::Water, 16.0, false, day(), true).unwrap();
        assert!((water(&store) - 16.0).abs() < f64::EPSILON);

        cmd_adjust(&mut store, Counter::Water, 8.0, true, day(), true).unwrap();
        assert!((water(&store) - 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_amounts_clamp_to_zero() {
        let mut store = Store::default();
        cmd_adjust(&mut store, Counter::Water, 8.0, false, day(), true).unwrap();
        cmd_adjust(&mut store, Counter::Water, -20.0, true, day(), true).unwrap();
        assert!(water(&store).abs() < f64::EPSILON);

        cmd_adjust(&mut store, Counter::Water, -5.0, false, day(), true).unwrap();
        assert!(water(&store).abs() < f64::EPSILON);
    }

    #[test]
    fn test_burned_is_independent_of_water() {
        let mut store = Store::default();
        cmd_adjust(&mut store, Counter::Water, 8.0, false, day(), true).unwrap();
        cmd_adjust(&mut store, Counter::CaloriesBurned, 300.0, false, day(), true).unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let log = store.state().log(date).unwrap();
        assert!((log.calories_burned - 300.0).abs() < f64::EPSILON);
        assert!((log.water_intake_oz - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_overflowing_add() {
        let mut store = Store::default();
        cmd_adjust(&mut store, Counter::Water, 1e308, false, day(), true).unwrap();
        let err = cmd_adjust(&mut store, Counter::Water, 1e308, true, day(), true).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!((water(&store) - 1e308).abs() < f64::EPSILON);

        let raw = snapcal_core::persist::encode_snapshot(store.state()).unwrap();
        assert_eq!(snapcal_core::persist::decode_snapshot(&raw).unwrap(), *store.state());
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut store = Store::default();
        assert!(cmd_adjust(&mut store, Counter::Water, f64::NAN, false, day(), true).is_err());
        assert!(store.state().daily_logs.is_empty());
    }
}
