//! Narration synthesis.
//!
//! Each step's sentence is handed to a text-to-speech backend. Steps are
//! independent, so clips are synthesized concurrently; results come back in
//! timeline order for the planner.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt, stream};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ui::prelude::{Level, emit};

use super::ffmpeg::media_duration_seconds;
use super::planner::NarrationClip;
use super::timeline::Timeline;

const TEXT_PLACEHOLDER: &str = "{text}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Trait for text-to-speech backends
#[async_trait]
pub trait NarrationSynthesizer: Send + Sync {
    /// Speak `text` into `output` and report the clip length
    async fn synthesize(&self, text: &str, output: &Path) -> Result<NarrationClip>;

    /// Human-readable name of the backend for logging
    fn name(&self) -> &'static str;
}

/// Runs an external command such as `espeak-ng -w {output} {text}` and
/// measures the produced file with ffprobe.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    template: Vec<String>,
}

impl CommandSynthesizer {
    pub fn new(template: &str) -> Result<Self> {
        let template = shell_words::split(template)
            .with_context(|| format!("Invalid text-to-speech command '{template}'"))?;
        if template.is_empty() {
            bail!("Text-to-speech command is empty");
        }
        if !template.iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER)) {
            bail!("Text-to-speech command must contain {OUTPUT_PLACEHOLDER}");
        }
        Ok(Self { template })
    }

    pub fn command_line(&self, text: &str, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        self.template
            .iter()
            .map(|arg| {
                arg.replace(OUTPUT_PLACEHOLDER, &output)
                    .replace(TEXT_PLACEHOLDER, text)
            })
            .collect()
    }
}

#[async_trait]
impl NarrationSynthesizer for CommandSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<NarrationClip> {
        let mut args = self.command_line(text, output);
        let program = args.remove(0);
        let output = output.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<NarrationClip> {
            duct::cmd(program.as_str(), &args)
                .stdout_null()
                .run()
                .with_context(|| format!("Failed to run {program} for {}", output.display()))?;
            let duration_seconds = media_duration_seconds(&output)?;
            Ok(NarrationClip {
                path: output,
                duration_seconds,
            })
        })
        .await
        .context("Narration task panicked")?
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

pub fn clip_path(work_dir: &Path, index: usize) -> PathBuf {
    work_dir.join(format!("voice{index}.wav"))
}

/// Synthesizes one clip per step, at most `concurrency` at a time.
///
/// Steps without any text get no clip. The first failure aborts the batch.
pub async fn synthesize_timeline(
    synthesizer: Arc<dyn NarrationSynthesizer>,
    timeline: &Timeline,
    work_dir: &Path,
    concurrency: usize,
) -> Result<Vec<Option<NarrationClip>>> {
    let jobs: Vec<(usize, String, PathBuf)> = timeline
        .steps
        .iter()
        .map(|step| {
            (
                step.index,
                step.narrative.text().trim().to_string(),
                clip_path(work_dir, step.index),
            )
        })
        .collect();

    emit(
        Level::Info,
        "report.narration.start",
        &format!(
            "Synthesizing {} narration clips with the {} backend...",
            jobs.len(),
            synthesizer.name()
        ),
        None,
    );

    stream::iter(jobs)
        .map(|(index, text, output)| {
            let synthesizer = Arc::clone(&synthesizer);
            async move {
                if text.is_empty() {
                    return Ok::<_, anyhow::Error>(None);
                }
                let clip = synthesizer
                    .synthesize(&text, &output)
                    .await
                    .with_context(|| format!("Failed to narrate step {index}"))?;
                emit(
                    Level::Debug,
                    "report.narration.clip",
                    &format!("Step {index}: {:.2}s narration", clip.duration_seconds),
                    None,
                );
                Ok(Some(clip))
            }
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}
