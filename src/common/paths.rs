use anyhow::{Context, Result};
use std::path::PathBuf;

/// Centralized path management for the narrator

const APP_DIR: &str = "steps-narrator";

/// Get the narrator config directory
pub fn narrator_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join(APP_DIR);

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory at {}", config_dir.display()))?;

    Ok(config_dir)
}

/// Scratch space for narration clips, silence and intermediate videos
pub fn narrator_work_dir(project: &str) -> Result<PathBuf> {
    let work_dir = dirs::cache_dir()
        .context("Unable to determine cache directory for narration work files")?
        .join(APP_DIR)
        .join(project);

    std::fs::create_dir_all(&work_dir)
        .with_context(|| format!("creating work directory at {}", work_dir.display()))?;

    Ok(work_dir)
}
