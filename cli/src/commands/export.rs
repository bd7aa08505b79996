use anyhow::{Context, Result};
use std::path::Path;

use snapcal_core::persist::export_snapshot;
use snapcal_core::store::Store;

/// Write the current snapshot as pretty JSON, to `output` or stdout.
pub(crate) fn cmd_export(store: &Store, output: Option<&Path>) -> Result<()> {
    let json = export_snapshot(store.state())?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            let days = store.state().daily_logs.len();
            eprintln!("Exported {days} day(s) to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
