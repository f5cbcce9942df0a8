use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::paths;

use super::planner::PlannerSettings;

/// (field, description) in the order they are written to disk.
const FIELD_DOCS: &[(&str, &str)] = &[
    (
        "lead_in_seconds",
        "Seconds into the trimmed video where the first subtitle appears",
    ),
    (
        "intro_silence_seconds",
        "Silence before the first narration clip",
    ),
    (
        "trim_lead_seconds",
        "Seconds of recording kept before the first step",
    ),
    (
        "trim_tail_seconds",
        "Seconds subtracted from the last step offset for the trim length",
    ),
    (
        "cue_tail_seconds",
        "Seconds a subtitle stays up after its narration ends",
    ),
    (
        "narration_concurrency",
        "How many narration clips are synthesized at once",
    ),
    ("video_width", "Width the final video is scaled to"),
    (
        "tts_command",
        "Text-to-speech command; {text} and {output} are substituted",
    ),
];

const EXAMPLE_TTS_COMMAND: &str = "espeak-ng -w {output} {text}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarratorConfig {
    pub lead_in_seconds: i64,
    pub intro_silence_seconds: f64,
    pub trim_lead_seconds: i64,
    pub trim_tail_seconds: i64,
    pub cue_tail_seconds: f64,
    pub narration_concurrency: usize,
    pub video_width: u32,
    pub tts_command: Option<String>,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        let planner = PlannerSettings::default();
        Self {
            lead_in_seconds: planner.lead_in_seconds,
            intro_silence_seconds: planner.intro_silence_seconds,
            trim_lead_seconds: planner.trim_lead_seconds,
            trim_tail_seconds: planner.trim_tail_seconds,
            cue_tail_seconds: planner.cue_tail_seconds,
            narration_concurrency: Self::DEFAULT_CONCURRENCY,
            video_width: Self::DEFAULT_VIDEO_WIDTH,
            tts_command: None,
        }
    }
}

impl NarratorConfig {
    pub const DEFAULT_CONCURRENCY: usize = 4;
    pub const DEFAULT_VIDEO_WIDTH: u32 = 720;

    pub fn load() -> Result<Self> {
        Self::load_from_path(narrator_config_path()?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            config.save_to_path(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading narrator config from {}", path.display()))?;
        let config: Self = toml::from_str(&contents).context("parsing narrator config")?;
        Ok(config.sanitized())
    }

    /// Writes every field with its description; an unset command is written
    /// commented out with an example value.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("creating narrator config directory {}", parent.display())
            })?;
        }

        let value = toml::Value::try_from(self).context("serializing narrator config")?;
        let table = value
            .as_table()
            .context("narrator config did not serialize to a table")?;

        let mut output = String::new();
        for (name, description) in FIELD_DOCS {
            match table.get(*name) {
                Some(value) => {
                    let _ = writeln!(output, "{name} = {value}  # {description}");
                }
                None => {
                    let example = toml::Value::String(EXAMPLE_TTS_COMMAND.to_string());
                    let _ = writeln!(output, "# {name} = {example}  # {description}");
                }
            }
        }

        fs::write(path, output)
            .with_context(|| format!("writing narrator config to {}", path.display()))?;
        Ok(())
    }

    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            lead_in_seconds: self.lead_in_seconds,
            intro_silence_seconds: self.intro_silence_seconds,
            trim_lead_seconds: self.trim_lead_seconds,
            trim_tail_seconds: self.trim_tail_seconds,
            cue_tail_seconds: self.cue_tail_seconds,
        }
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.intro_silence_seconds.is_finite() || self.intro_silence_seconds < 0.0 {
            self.intro_silence_seconds = defaults.intro_silence_seconds;
        }
        if !self.cue_tail_seconds.is_finite() || self.cue_tail_seconds < 0.0 {
            self.cue_tail_seconds = defaults.cue_tail_seconds;
        }
        if self.lead_in_seconds < 0 {
            self.lead_in_seconds = defaults.lead_in_seconds;
        }
        if self.narration_concurrency == 0 {
            self.narration_concurrency = 1;
        }
        if self.video_width == 0 {
            self.video_width = defaults.video_width;
        }
        if self
            .tts_command
            .as_deref()
            .is_some_and(|command| command.trim().is_empty())
        {
            self.tts_command = None;
        }
        self
    }
}

pub fn narrator_config_path() -> Result<PathBuf> {
    Ok(paths::narrator_config_dir()?.join("narrator.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("narrator.toml");

        let config = NarratorConfig::load_from_path(&path).expect("load");
        assert_eq!(config, NarratorConfig::default());

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("lead_in_seconds = 2  # "));
        assert!(written.contains("# tts_command = \"espeak-ng -w {output} {text}\""));

        let reloaded = NarratorConfig::load_from_path(&path).expect("reload");
        assert_eq!(reloaded, config);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrator.toml");
        fs::write(
            &path,
            "cue_tail_seconds = -3.0\nnarration_concurrency = 0\ntts_command = \"  \"\ntrim_lead_seconds = 6\n",
        )
        .unwrap();

        let config = NarratorConfig::load_from_path(&path).expect("load");
        assert_eq!(config.cue_tail_seconds, 1.0);
        assert_eq!(config.narration_concurrency, 1);
        assert_eq!(config.tts_command, None);
        assert_eq!(config.planner_settings().trim_lead_seconds, 6);
    }

    #[test]
    fn configured_command_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrator.toml");
        let config = NarratorConfig {
            tts_command: Some("say -o {output} {text}".to_string()),
            ..NarratorConfig::default()
        };
        config.save_to_path(&path).unwrap();
        assert_eq!(NarratorConfig::load_from_path(&path).unwrap(), config);
    }
}
