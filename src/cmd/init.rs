use crate::data::{AppSettings, Persistable, TripData};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

pub fn run() -> Result<()> {
    let dir = crate::data::persistence::get_data_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create dir {}", dir.display()))?;
    run_in_dir(&dir)?;
    info!(dir = %dir.display(), "data directory initialised");
    println!("Data files initialized successfully.");
    Ok(())
}

/// Writes the default config and an empty trip file into `dir`.
/// Existing trips are kept.
pub(crate) fn run_in_dir(dir: &Path) -> Result<()> {
    AppSettings::default().save_to(dir)?;
    if !dir.join(TripData::filename()).exists() {
        TripData::default().save_to(dir)?;
    }
    Ok(())
}
