//! Add-meal flow: pick an image, analyze it, review the items, then log them.
//!
//! ```text
//! Idle -> Analyzing -> ResultReady -> Committed
//!              \            |
//!               -> Error    v
//!                    \---> Idle (reset)
//! ```

use anyhow::{Result, bail};
use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};

use crate::analysis::is_placeholder;
use crate::models::{DailyLog, FoodItem, Meal};
use crate::store::{Action, Store};

/// Text shown to the user when analysis fails.
pub const ANALYSIS_ERROR_MESSAGE: &str = "Failed to analyze the image. Please try again.";

/// Identifies one analysis request. Only the most recently issued ticket is honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    Idle,
    Analyzing {
        image: String,
        ticket: AnalysisTicket,
    },
    ResultReady {
        image: String,
        items: Vec<FoodItem>,
    },
    Error {
        image: String,
        message: String,
        cause: String,
    },
    Committed {
        date: NaiveDate,
        meal: Meal,
    },
}

pub struct ScanFlow {
    state: ScanState,
    issued: u64,
}

impl Default for ScanFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanFlow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ScanState::Idle,
            issued: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Start analyzing `image`, discarding any previous result or error.
    ///
    /// A result still in flight for an earlier ticket will be ignored.
    pub fn select_image(&mut self, image: impl Into<String>) -> Result<AnalysisTicket> {
        if matches!(self.state, ScanState::Committed { .. }) {
            bail!("Meal already logged; start a new scan");
        }
        self.issued += 1;
        let ticket = AnalysisTicket(self.issued);
        self.state = ScanState::Analyzing {
            image: image.into(),
            ticket,
        };
        Ok(ticket)
    }

    /// Deliver the outcome of the analysis started with `ticket`.
    ///
    /// Returns false when the result was stale and ignored.
    pub fn complete(&mut self, ticket: AnalysisTicket, result: Result<Vec<FoodItem>>) -> bool {
        let image = match &self.state {
            ScanState::Analyzing { image, ticket: t } if *t == ticket => image.clone(),
            _ => {
                tracing::debug!("Ignoring stale analysis result {ticket:?}");
                return false;
            }
        };

        self.state = match result {
            Ok(items) => ScanState::ResultReady { image, items },
            Err(e) => ScanState::Error {
                image,
                message: ANALYSIS_ERROR_MESSAGE.to_string(),
                cause: format!("{e:#}"),
            },
        };
        true
    }

    /// Back to Idle, dropping the image and any result. No effect once committed.
    pub fn reset(&mut self) {
        if !matches!(self.state, ScanState::Committed { .. }) {
            self.state = ScanState::Idle;
        }
    }

    #[must_use]
    pub fn items(&self) -> Option<&[FoodItem]> {
        match &self.state {
            ScanState::ResultReady { items, .. } => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ScanState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// True when the ready result contains the analysis-failure stand-in item.
    #[must_use]
    pub fn has_placeholder(&self) -> bool {
        self.items()
            .is_some_and(|items| items.iter().any(is_placeholder))
    }

    /// Log the reviewed items as a meal on `now`'s calendar date.
    pub fn confirm(&mut self, store: &mut Store, now: DateTime<Local>) -> Result<Meal> {
        self.confirm_named(store, now, None)
    }

    /// Like [`ScanFlow::confirm`], overriding the meal name derived from the items.
    pub fn confirm_named(
        &mut self,
        store: &mut Store,
        now: DateTime<Local>,
        name: Option<&str>,
    ) -> Result<Meal> {
        let ScanState::ResultReady { image, items } = &self.state else {
            bail!("Nothing to log: no analysis result is ready");
        };

        let date = now.date_naive();
        let timestamp = now
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let id = unique_meal_id(store.state().log(date), &timestamp);
        let mut meal = Meal::from_items(id, timestamp, items.clone(), Some(image.clone()));
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            meal = meal.with_name(name);
        }

        store.dispatch(Action::AddMeal {
            date,
            meal: meal.clone(),
        });
        self.state = ScanState::Committed {
            date,
            meal: meal.clone(),
        };
        Ok(meal)
    }
}

fn unique_meal_id(log: Option<&DailyLog>, base: &str) -> String {
    let Some(log) = log else {
        return base.to_string();
    };
    if !log.contains_meal(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|id| !log.contains_meal(id))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisFailureMode, placeholder_item, settle};
    use anyhow::anyhow;
    use chrono::TimeZone;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap()
    }

    fn egg() -> FoodItem {
        FoodItem::new("egg", 70.0, 6.0, 1.0, 5.0)
    }

    #[test]
    fn test_happy_path_commits_meal() {
        let mut store = Store::default();
        let mut flow = ScanFlow::new();

        let ticket = flow.select_image("breakfast.jpg").unwrap();
        assert!(matches!(flow.state(), ScanState::Analyzing { .. }));
        assert!(flow.complete(ticket, Ok(vec![egg(), egg()])));
        assert_eq!(flow.items().unwrap().len(), 2);

        let meal = flow.confirm(&mut store, now()).unwrap();
        assert_eq!(meal.name(), "egg, egg");
        assert!((meal.total_calories() - 140.0).abs() < f64::EPSILON);
        assert_eq!(meal.image_url(), Some("breakfast.jpg"));

        let date = now().date_naive();
        let log = store.state().log(date).unwrap();
        assert_eq!(log.meals.len(), 1);
        assert_eq!(log.meals[0], meal);
        assert!(matches!(flow.state(), ScanState::Committed { .. }));
    }

    #[test]
    fn test_confirm_named_overrides_name() {
        let mut store = Store::default();
        let mut flow = ScanFlow::new();
        let ticket = flow.select_image("a.jpg").unwrap();
        flow.complete(ticket, Ok(vec![egg(), egg()]));
        let meal = flow
            .confirm_named(&mut store, now(), Some(" Breakfast "))
            .unwrap();
        assert_eq!(meal.name(), "Breakfast");
        assert!((meal.total_calories() - 140.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_timestamp_is_utc_iso() {
        let mut store = Store::default();
        let mut flow = ScanFlow::new();
        let ticket = flow.select_image("a.jpg").unwrap();
        flow.complete(ticket, Ok(vec![egg()]));
        let meal = flow.confirm(&mut store, now()).unwrap();

        let expected = now()
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        assert_eq!(meal.timestamp(), expected);
        assert_eq!(meal.id(), expected);
        assert!(meal.timestamp().ends_with('Z'));
    }

    #[test]
    fn test_analysis_error_blocks_commit() {
        let mut store = Store::default();
        let mut flow = ScanFlow::new();

        let ticket = flow.select_image("blurry.jpg").unwrap();
        let result = settle(Err(anyhow!("timeout")), AnalysisFailureMode::Surface);
        assert!(flow.complete(ticket, result));

        assert_eq!(flow.error_message(), Some(ANALYSIS_ERROR_MESSAGE));
        assert!(flow.items().is_none());
        match flow.state() {
            ScanState::Error { cause, .. } => assert!(cause.contains("timeout")),
            other => panic!("expected Error, got {other:?}"),
        }

        assert!(flow.confirm(&mut store, now()).is_err());
        assert!(store.state().daily_logs.is_empty());
    }

    #[test]
    fn test_placeholder_result_is_ready_but_flagged() {
        let mut store = Store::default();
        let mut flow = ScanFlow::new();

        let ticket = flow.select_image("blurry.jpg").unwrap();
        let result = settle(Err(anyhow!("timeout")), AnalysisFailureMode::Placeholder);
        flow.complete(ticket, result);

        assert!(flow.has_placeholder());
        assert!(flow.error_message().is_none());
        let meal = flow.confirm(&mut store, now()).unwrap();
        assert_eq!(meal.items(), &[placeholder_item()]);
        assert!(meal.total_calories().abs() < f64::EPSILON);
    }

    #[test]
    fn test_stale_result_is_ignored() {
        let mut flow = ScanFlow::new();
        let first = flow.select_image("first.jpg").unwrap();
        let second = flow.select_image("second.jpg").unwrap();

        assert!(!flow.complete(first, Ok(vec![egg()])));
        assert!(matches!(flow.state(), ScanState::Analyzing { .. }));

        assert!(flow.complete(second, Ok(vec![])));
        match flow.state() {
            ScanState::ResultReady { image, items } => {
                assert_eq!(image, "second.jpg");
                assert!(items.is_empty());
            }
            other => panic!("expected ResultReady, got {other:?}"),
        }
    }

    #[test]
    fn test_result_after_reset_is_ignored() {
        let mut flow = ScanFlow::new();
        let ticket = flow.select_image("a.jpg").unwrap();
        flow.reset();
        assert!(!flow.complete(ticket, Ok(vec![egg()])));
        assert_eq!(*flow.state(), ScanState::Idle);
    }

    #[test]
    fn test_reset_clears_result_and_error() {
        let mut flow = ScanFlow::new();
        let ticket = flow.select_image("a.jpg").unwrap();
        flow.complete(ticket, Ok(vec![egg()]));
        flow.reset();
        assert_eq!(*flow.state(), ScanState::Idle);

        let ticket = flow.select_image("b.jpg").unwrap();
        flow.complete(ticket, Err(anyhow!("boom")));
        flow.reset();
        assert_eq!(*flow.state(), ScanState::Idle);
    }

    #[test]
    fn test_new_image_clears_previous_result() {
        let mut flow = ScanFlow::new();
        let ticket = flow.select_image("a.jpg").unwrap();
        flow.complete(ticket, Ok(vec![egg()]));
        flow.select_image("b.jpg").unwrap();
        assert!(flow.items().is_none());
    }

    #[test]
    fn test_confirm_requires_result() {
        let mut store = Store::default();
        let mut flow = ScanFlow::new();
        assert!(flow.confirm(&mut store, now()).is_err());
        flow.select_image("a.jpg").unwrap();
        assert!(flow.confirm(&mut store, now()).is_err());
        assert!(store.state().daily_logs.is_empty());
    }

    #[test]
    fn test_committed_flow_is_terminal() {
        let mut store = Store::default();
        let mut flow = ScanFlow::new();
        let ticket = flow.select_image("a.jpg").unwrap();
        flow.complete(ticket, Ok(vec![egg()]));
        flow.confirm(&mut store, now()).unwrap();

        assert!(flow.select_image("b.jpg").is_err());
        assert!(flow.confirm(&mut store, now()).is_err());
        flow.reset();
        assert!(matches!(flow.state(), ScanState::Committed { .. }));
        assert_eq!(store.state().log(now().date_naive()).unwrap().meals.len(), 1);
    }

    #[test]
    fn test_same_instant_gets_unique_ids() {
        let mut store = Store::default();
        for _ in 0..3 {
            let mut flow = ScanFlow::new();
            let ticket = flow.select_image("a.jpg").unwrap();
            flow.complete(ticket, Ok(vec![egg()]));
            flow.confirm(&mut store, now()).unwrap();
        }

        let log = store.state().log(now().date_naive()).unwrap();
        let ids: Vec<&str> = log.meals.iter().map(Meal::id).collect();
        assert_eq!(ids.len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert!(ids[1].ends_with("-2"));
        assert!(ids[2].ends_with("-3"));
    }
}
