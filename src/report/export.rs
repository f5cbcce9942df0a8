//! Step-by-step instruction export: a JSON list of steps plus the cropped
//! screenshot for each step written next to it.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::timeline::{Step, Timeline};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub step: usize,
    /// File name of the screenshot relative to the export directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imgsrc: Option<String>,
    pub description: String,
}

pub fn screenshot_file_name(step: &Step) -> Option<String> {
    step.screenshot
        .as_ref()
        .map(|shot| format!("screenshot{}.{}", step.index, shot.extension()))
}

pub fn instructions(timeline: &Timeline) -> Vec<Instruction> {
    timeline
        .steps
        .iter()
        .map(|step| Instruction {
            step: step.index,
            imgsrc: screenshot_file_name(step),
            description: step.narrative.text().to_string(),
        })
        .collect()
}

/// Writes every step screenshot into `dir`, returning the written paths.
pub fn write_screenshots(timeline: &Timeline, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating screenshot directory {}", dir.display()))?;

    let mut written = Vec::new();
    for step in &timeline.steps {
        let (Some(shot), Some(name)) = (&step.screenshot, screenshot_file_name(step)) else {
            continue;
        };
        let path = dir.join(name);
        fs::write(&path, &shot.bytes)
            .with_context(|| format!("writing screenshot {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Writes `instructions.json` and the screenshots it references.
pub fn export_instructions(timeline: &Timeline, dir: &Path) -> Result<PathBuf> {
    write_screenshots(timeline, dir)?;
    let path = dir.join("instructions.json");
    let json = serde_json::to_string_pretty(&instructions(timeline))
        .context("serializing instructions")?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
