use anyhow::{Context, Result, bail};
use duct::cmd;
use std::ffi::OsString;
use std::path::Path;

use crate::ui::prelude::{Level, emit};

use super::planner::TrimWindow;

const SILENCE_SAMPLE_RATE: &str = "anullsrc=r=22050:cl=mono";

/// Length of a media file in seconds, as reported by ffprobe.
pub fn media_duration_seconds(path: &Path) -> Result<f64> {
    let output = cmd(
        "ffprobe",
        [
            OsString::from("-v"),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "default=noprint_wrappers=1:nokey=1".into(),
            path.into(),
        ],
    )
    .stdout_capture()
    .stderr_capture()
    .unchecked()
    .run()
    .with_context(|| format!("Failed to run ffprobe for {}", path.display()))?;

    if !output.status.success() {
        bail!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    parse_duration(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("Unexpected ffprobe output for {}", path.display()))
}

fn parse_duration(output: &str) -> Result<f64> {
    let trimmed = output.trim();
    let seconds: f64 = trimmed
        .parse()
        .with_context(|| format!("'{trimmed}' is not a number of seconds"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("'{trimmed}' is not a valid media length");
    }
    Ok(seconds)
}

/// Runs ffmpeg, or only prints what it would run.
#[derive(Debug, Clone, Copy)]
pub struct Ffmpeg {
    pub dry_run: bool,
}

impl Ffmpeg {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    fn run(&self, code: &str, args: Vec<OsString>) -> Result<()> {
        let rendered = std::iter::once("ffmpeg".to_string())
            .chain(args.iter().map(|arg| arg.to_string_lossy().into_owned()))
            .collect::<Vec<_>>();
        let rendered = shell_words::join(rendered);

        if self.dry_run {
            println!("{rendered}");
            return Ok(());
        }

        emit(Level::Debug, code, &rendered, None);
        cmd("ffmpeg", args)
            .stdout_null()
            .stderr_capture()
            .run()
            .with_context(|| format!("ffmpeg failed: {rendered}"))?;
        Ok(())
    }

    pub fn render_silence(&self, output: &Path, seconds: f64) -> Result<()> {
        self.run(
            "report.ffmpeg.silence",
            vec![
                "-y".into(),
                "-f".into(),
                "lavfi".into(),
                "-i".into(),
                SILENCE_SAMPLE_RATE.into(),
                "-t".into(),
                format!("{seconds:.3}").into(),
                output.into(),
            ],
        )
    }

    /// Concatenates the files listed in an ffmpeg concat list.
    pub fn concat_audio(&self, list_file: &Path, output: &Path) -> Result<()> {
        self.run(
            "report.ffmpeg.concat",
            vec![
                "-y".into(),
                "-f".into(),
                "concat".into(),
                "-safe".into(),
                "0".into(),
                "-i".into(),
                list_file.into(),
                "-ac".into(),
                "2".into(),
                "-ar".into(),
                "22050".into(),
                output.into(),
            ],
        )
    }

    pub fn trim_video(&self, source: &Path, output: &Path, trim: TrimWindow) -> Result<()> {
        self.run(
            "report.ffmpeg.trim",
            vec![
                "-y".into(),
                "-i".into(),
                source.into(),
                "-ss".into(),
                trim.start_hms().into(),
                "-t".into(),
                trim.duration_hms().into(),
                "-async".into(),
                "1".into(),
                output.into(),
            ],
        )
    }

    pub fn add_audio_track(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        self.run(
            "report.ffmpeg.mux",
            vec![
                "-y".into(),
                "-i".into(),
                video.into(),
                "-i".into(),
                audio.into(),
                "-map".into(),
                "0:v:0".into(),
                "-map".into(),
                "1:a:0".into(),
                "-c:v".into(),
                "copy".into(),
                "-shortest".into(),
                output.into(),
            ],
        )
    }

    pub fn scale_video(&self, source: &Path, output: &Path, width: u32) -> Result<()> {
        self.run(
            "report.ffmpeg.scale",
            vec![
                "-y".into(),
                "-i".into(),
                source.into(),
                "-vf".into(),
                format!("scale={width}:-2").into(),
                output.into(),
            ],
        )
    }

    pub fn embed_subtitles(&self, source: &Path, subtitles: &Path, output: &Path) -> Result<()> {
        self.run(
            "report.ffmpeg.subtitles",
            vec![
                "-y".into(),
                "-i".into(),
                source.into(),
                "-i".into(),
                subtitles.into(),
                "-c".into(),
                "copy".into(),
                "-c:s".into(),
                "mov_text".into(),
                output.into(),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration_line() {
        assert_eq!(parse_duration("3.240000\n").unwrap(), 3.24);
    }

    #[test]
    fn rejects_unusable_duration_output() {
        assert!(parse_duration("N/A\n").is_err());
        assert!(parse_duration("-1.5").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn missing_media_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(media_duration_seconds(&dir.path().join("missing.wav")).is_err());
    }
}
