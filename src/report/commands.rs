use anyhow::{Context, Result, bail};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::common::paths::narrator_work_dir;
use crate::ui::prelude::*;

use super::assemble::Assembly;
use super::cli::{
    BuildArgs, ExportArgs, InspectArgs, KeyScriptFormat, KeysArgs, ReportArgs, ReportCommands,
    ScreenshotsArgs, SubtitlesArgs,
};
use super::config::{NarratorConfig, narrator_config_path};
use super::export::{export_instructions, write_screenshots};
use super::ffmpeg::Ffmpeg;
use super::keyscript::{build_key_script, render_kbml};
use super::narration::{
    CommandSynthesizer, NarrationSynthesizer, clip_path, synthesize_timeline,
};
use super::{parse_all_steps, parse_report};
use super::planner::{NarrationClip, plan_media};
use super::source::{LoadedReport, load_report};
use super::srt::render_srt;
use super::styling::tidy;
use super::timeline::Timeline;

pub async fn handle_report_command(command: ReportCommands) -> Result<()> {
    match command {
        ReportCommands::Inspect(args) => handle_inspect(args).await,
        ReportCommands::Subtitles(args) => handle_subtitles(args).await,
        ReportCommands::Screenshots(args) => handle_screenshots(args).await,
        ReportCommands::Export(args) => handle_export(args).await,
        ReportCommands::Keys(args) => handle_keys(args).await,
        ReportCommands::Build(args) => handle_build(args).await,
        ReportCommands::Config => handle_config(),
    }
}

/// Loads and parses the report, then applies removal and tidying.
async fn prepare(args: &ReportArgs) -> Result<(LoadedReport, Timeline)> {
    let report = load_report(&args.report).await?;
    emit(
        Level::Debug,
        "report.parse.start",
        &format!("Parsing {} ({} bytes)", report.origin, report.text.len()),
        None,
    );

    let mut timeline = parse_report(&report.text)
        .with_context(|| format!("Failed to parse report {}", report.origin))?;

    if !args.remove.is_empty() {
        let removed: BTreeSet<usize> = args.remove.iter().copied().collect();
        timeline = timeline.without_steps(&removed);
    }
    if args.tidy {
        timeline = tidy(timeline);
    }

    if timeline.is_empty() {
        emit(
            Level::Warn,
            "report.parse.empty",
            &format!("{} contains no steps", report.origin),
            None,
        );
    }
    emit(
        Level::Debug,
        "report.parse.done",
        &format!("{} steps over {}s", timeline.len(), timeline.session.duration_seconds),
        None,
    );
    Ok((report, timeline))
}

async fn handle_inspect(args: InspectArgs) -> Result<()> {
    let (report, timeline) = prepare(&args.common).await?;

    match get_output_format() {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&timeline).context("serializing timeline")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "Step", "Offset", "Duration", "Screenshot", "Narration"]);
            for step in &timeline.steps {
                table.add_row(vec![
                    step.index.to_string(),
                    step.step_number.to_string(),
                    format!("{}s", step.offset_seconds),
                    format!("{}s", step.duration_seconds),
                    step.screenshot
                        .as_ref()
                        .map(|shot| shot.extension().to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    step.narrative.text().to_string(),
                ]);
            }
            println!("{}", report.origin);
            println!(
                "Session {} - {} ({}s)",
                timeline.session.start_time, timeline.session.stop_time,
                timeline.session.duration_seconds
            );
            println!("{table}");
        }
    }
    Ok(())
}

async fn handle_subtitles(args: SubtitlesArgs) -> Result<()> {
    let (_, timeline) = prepare(&args.common).await?;
    let config = NarratorConfig::load()?;

    let narration = match &args.durations {
        Some(path) => read_durations(path)?,
        None => vec![None; timeline.len()],
    };
    let plan = plan_media(&timeline, narration, &config.planner_settings())
        .context("Failed to plan subtitles")?;

    write_output(args.out_file.as_deref(), &render_srt(&plan.cues))
}

/// Reads a JSON array of narration lengths, one entry per step.
fn read_durations(path: &Path) -> Result<Vec<Option<NarrationClip>>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read durations from {}", path.display()))?;
    let durations: Vec<Option<f64>> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of numbers", path.display()))?;

    durations
        .into_iter()
        .enumerate()
        .map(|(position, duration)| {
            let Some(duration_seconds) = duration else {
                return Ok(None);
            };
            if !duration_seconds.is_finite() || duration_seconds < 0.0 {
                bail!(
                    "{}: entry {} is {duration_seconds}, expected a non-negative number of seconds",
                    path.display(),
                    position + 1
                );
            }
            Ok(Some(NarrationClip {
                path: clip_path(Path::new(""), position + 1),
                duration_seconds,
            }))
        })
        .collect()
}

async fn handle_screenshots(args: ScreenshotsArgs) -> Result<()> {
    let (_, timeline) = prepare(&args.common).await?;
    let written = write_screenshots(&timeline, &args.out_dir)?;
    emit(
        Level::Success,
        "report.screenshots.done",
        &format!(
            "Wrote {} screenshots to {}",
            written.len(),
            args.out_dir.display()
        ),
        Some(serde_json::json!({ "files": written })),
    );
    Ok(())
}

async fn handle_export(args: ExportArgs) -> Result<()> {
    let (_, timeline) = prepare(&args.common).await?;
    let path = export_instructions(&timeline, &args.out_dir)?;
    emit(
        Level::Success,
        "report.export.done",
        &format!("Exported {} steps to {}", timeline.len(), path.display()),
        Some(serde_json::json!({ "path": path, "steps": timeline.len() })),
    );
    Ok(())
}

async fn handle_keys(args: KeysArgs) -> Result<()> {
    let report = load_report(&args.report).await?;
    let parsed = parse_all_steps(&report.text)
        .with_context(|| format!("Failed to parse report {}", report.origin))?;
    let script = build_key_script(parsed.steps.iter().map(|step| &step.narrative));
    let rendered = match args.format {
        KeyScriptFormat::Json => {
            serde_json::to_string_pretty(&script).context("serializing key script")? + "\n"
        }
        KeyScriptFormat::Kbml => render_kbml(&script),
    };
    write_output(args.out_file.as_deref(), &rendered)
}

async fn handle_build(args: BuildArgs) -> Result<()> {
    let config = NarratorConfig::load()?;
    let (report, timeline) = prepare(&args.common).await?;

    if !args.dry_run && !args.video.exists() {
        bail!("Recording not found: {}", args.video.display());
    }

    let work_dir = match &args.work_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating work directory {}", dir.display()))?;
            dir.clone()
        }
        None => narrator_work_dir(&report.project_name())?,
    };
    let destination = args
        .out_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_narrated.mp4", report.project_name())));

    let narration = if args.dry_run {
        emit(
            Level::Warn,
            "report.build.dry_run",
            "Dry run: narration is not synthesized, steps are planned as silence",
            None,
        );
        vec![None; timeline.len()]
    } else {
        let Some(command) = config.tts_command.as_deref() else {
            bail!(
                "No text-to-speech command configured; set tts_command in {}",
                narrator_config_path()?.display()
            );
        };
        let synthesizer: Arc<dyn NarrationSynthesizer> = Arc::new(CommandSynthesizer::new(command)?);
        synthesize_timeline(
            synthesizer,
            &timeline,
            &work_dir,
            config.narration_concurrency,
        )
        .await?
    };

    let plan = plan_media(&timeline, narration, &config.planner_settings())
        .context("Failed to plan narrated video")?;
    emit(
        Level::Debug,
        "report.build.plan",
        &format!(
            "{} audio segments, {:.1}s of audio, {} cues",
            plan.segments.len(),
            plan.audio_seconds(),
            plan.cues.len()
        ),
        None,
    );

    Assembly {
        plan: &plan,
        source_video: &args.video,
        destination: &destination,
        work_dir: &work_dir,
        video_width: config.video_width,
    }
    .run(Ffmpeg::new(args.dry_run))?;

    if !args.dry_run {
        emit(
            Level::Success,
            "report.build.done",
            &format!("Narrated video written to {}", destination.display()),
            Some(serde_json::json!({ "path": destination })),
        );
    }
    Ok(())
}

fn handle_config() -> Result<()> {
    let path = narrator_config_path()?;
    let config = NarratorConfig::load_from_path(&path)?;

    match get_output_format() {
        OutputFormat::Json => {
            let json = serde_json::json!({ "path": path, "config": config });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).context("serializing config")?
            );
        }
        OutputFormat::Text => {
            println!("{}", path.display());
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            print!("{contents}");
        }
    }
    Ok(())
}

fn write_output(out_file: Option<&Path>, contents: &str) -> Result<()> {
    match out_file {
        Some(path) => {
            fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
            emit(
                Level::Success,
                "report.output.written",
                &format!("Wrote {}", path.display()),
                None,
            );
        }
        None => print!("{contents}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_file_maps_to_clips_by_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("durations.json");
        fs::write(&path, "[2.5, null, 4]").unwrap();

        let clips = read_durations(&path).expect("durations");
        assert_eq!(clips.len(), 3);
        assert_eq!(clips[0].as_ref().unwrap().duration_seconds, 2.5);
        assert!(clips[1].is_none());
        assert_eq!(clips[2].as_ref().unwrap().path, PathBuf::from("voice3.wav"));
    }

    #[test]
    fn durations_file_rejects_negative_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("durations.json");
        fs::write(&path, "[1.0, -10]").unwrap();

        let err = read_durations(&path).unwrap_err();
        assert!(err.to_string().contains("entry 2"), "{err}");
    }

    #[test]
    fn durations_file_must_be_an_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("durations.json");
        fs::write(&path, "{\"a\": 1}").unwrap();
        assert!(read_durations(&path).is_err());
    }
}
