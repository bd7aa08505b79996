//! Reducer-backed state store.
//!
//! All mutations go through [`Store::dispatch`], which runs the pure
//! [`reduce`] function and then notifies observers in subscription order.

use chrono::NaiveDate;

use crate::models::{AppState, DailyLog, Meal, ProfileUpdate};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddMeal { date: NaiveDate, meal: Meal },
    SetWater { date: NaiveDate, amount: f64 },
    SetCaloriesBurned { date: NaiveDate, amount: f64 },
    UpdateProfile(ProfileUpdate),
    LoadState(AppState),
}

/// Apply `action` to `state`. Pure and total: never fails, never reads the clock.
#[must_use]
pub fn reduce(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::AddMeal { date, meal } => {
            log_entry(&mut state, date).meals.push(meal);
        }
        Action::SetWater { date, amount } => {
            log_entry(&mut state, date).water_intake_oz = clamp_non_negative(amount);
        }
        Action::SetCaloriesBurned { date, amount } => {
            log_entry(&mut state, date).calories_burned = clamp_non_negative(amount);
        }
        Action::UpdateProfile(update) => state.profile.merge(&update),
        Action::LoadState(snapshot) => return snapshot,
    }
    state
}

fn log_entry(state: &mut AppState, date: NaiveDate) -> &mut DailyLog {
    state
        .daily_logs
        .entry(date)
        .or_insert_with(|| DailyLog::empty(date))
}

// NaN and infinities clamp to zero as well; JSON has no encoding for them.
fn clamp_non_negative(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

/// Something that wants to hear about every state transition.
pub trait StateObserver {
    fn on_change(&mut self, state: &AppState);
}

impl<F> StateObserver for F
where
    F: FnMut(&AppState),
{
    fn on_change(&mut self, state: &AppState) {
        self(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Store {
    state: AppState,
    observers: Vec<(SubscriptionId, Box<dyn StateObserver>)>,
    next_id: u64,
}

impl Store {
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            observers: Vec::new(),
            next_id: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
        for (_, observer) in &mut self.observers {
            observer.on_change(&self.state);
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn StateObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}
