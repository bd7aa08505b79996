mod export;
mod helpers;
mod progress;
mod scan;
mod settings;
mod summary;
mod water;

pub(crate) use export::cmd_export;
pub(crate) use progress::cmd_progress;
pub(crate) use scan::cmd_scan;
pub(crate) use settings::{ProfileArgs, cmd_settings_set, cmd_settings_show};
pub(crate) use summary::{cmd_history, cmd_home};
pub(crate) use water::{Counter, cmd_adjust};
