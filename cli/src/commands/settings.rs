use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use snapcal_core::db::Database;
use snapcal_core::models::{Page, ProfileUpdate, UserProfile};
use snapcal_core::persist::STATE_KEY;
use snapcal_core::store::{Action, Store};

use super::helpers::{print_header, print_nav};

#[derive(Args, Debug, Default)]
pub(crate) struct ProfileArgs {
    /// Display name
    #[arg(long)]
    name: Option<String>,
    /// Age in years
    #[arg(long)]
    age: Option<u32>,
    /// Current weight in kg
    #[arg(long = "weight")]
    weight_kg: Option<f64>,
    /// Height in cm
    #[arg(long = "height")]
    height_cm: Option<f64>,
    /// Goal weight in kg
    #[arg(long = "goal-weight")]
    goal_weight_kg: Option<f64>,
    /// Daily calorie goal (kcal)
    #[arg(long)]
    calories: Option<f64>,
    /// Daily protein goal (g)
    #[arg(long)]
    protein: Option<f64>,
    /// Daily carbs goal (g)
    #[arg(long)]
    carbs: Option<f64>,
    /// Daily fat goal (g)
    #[arg(long)]
    fat: Option<f64>,
}

fn positive(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => bail!("{field} must be greater than 0"),
        other => Ok(other),
    }
}

fn non_negative(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => bail!("{field} must not be negative"),
        other => Ok(other),
    }
}

impl ProfileArgs {
    fn to_update(&self) -> Result<ProfileUpdate> {
        let name = match self.name.as_deref().map(str::trim) {
            Some("") => bail!("Name must not be empty"),
            other => other.map(str::to_string),
        };
        if self.age == Some(0) {
            bail!("Age must be greater than 0");
        }

        let update = ProfileUpdate {
            name,
            age: self.age,
            weight_kg: positive("Weight", self.weight_kg)?,
            height_cm: positive("Height", self.height_cm)?,
            goal_weight_kg: positive("Goal weight", self.goal_weight_kg)?,
            calorie_goal: positive("Calorie goal", self.calories)?,
            protein_goal: non_negative("Protein goal", self.protein)?,
            carbs_goal: non_negative("Carbs goal", self.carbs)?,
            fat_goal: non_negative("Fat goal", self.fat)?,
        };
        if update.is_empty() {
            bail!("Nothing to update. Pass at least one of --name, --age, --weight, --height, --goal-weight, --calories, --protein, --carbs, --fat");
        }
        Ok(update)
    }
}

fn print_profile(profile: &UserProfile) {
    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Setting")]
        field: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows = vec![
        Row {
            field: "Name",
            value: profile.name.clone(),
        },
        Row {
            field: "Age",
            value: profile.age.to_string(),
        },
        Row {
            field: "Weight",
            value: format!("{:.1} kg", profile.weight_kg),
        },
        Row {
            field: "Height",
            value: format!("{:.0} cm", profile.height_cm),
        },
        Row {
            field: "Goal weight",
            value: format!("{:.1} kg", profile.goal_weight_kg),
        },
        Row {
            field: "Calories",
            value: format!("{:.0} kcal", profile.calorie_goal),
        },
        Row {
            field: "Protein",
            value: format!("{:.0}g", profile.protein_goal),
        },
        Row {
            field: "Carbs",
            value: format!("{:.0}g", profile.carbs_goal),
        },
        Row {
            field: "Fat",
            value: format!("{:.0}g", profile.fat_goal),
        },
    ];

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn cmd_settings_show(store: &Store, db: &Database, json: bool) -> Result<()> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct SettingsView<'a> {
        profile: &'a UserProfile,
        last_saved: Option<String>,
    }

    let profile = &store.state().profile;
    let last_saved = db.updated_at(STATE_KEY)?;

    if json {
        let view = SettingsView {
            profile,
            last_saved,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    print_header(Page::Settings);
    print_profile(profile);
    match last_saved {
        Some(at) => println!("  Last saved: {at}"),
        None => println!("  Not saved yet (using defaults)"),
    }
    print_nav(Page::Settings);
    Ok(())
}

pub(crate) fn cmd_settings_set(store: &mut Store, args: &ProfileArgs, json: bool) -> Result<()> {
    let update = args.to_update()?;
    store.dispatch(Action::UpdateProfile(update));
    let profile = &store.state().profile;

    if json {
        println!("{}", serde_json::to_string_pretty(profile)?);
    } else {
        println!("Profile updated.\n");
        print_profile(profile);
    }
    Ok(())
}
