//! Turns a media plan into a narrated, subtitled video with ffmpeg.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ui::prelude::{Level, emit};

use super::ffmpeg::Ffmpeg;
use super::planner::{MediaPlan, MediaSegment};
use super::srt::render_srt;

/// One file of the concatenated audio track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEntry {
    pub path: PathBuf,
    /// Set when the file is silence that still has to be rendered.
    pub silence_seconds: Option<f64>,
}

/// Files making up the audio track, in playback order. Zero-length silence
/// is dropped since it contributes nothing.
pub fn track_entries(plan: &MediaPlan, work_dir: &Path) -> Vec<TrackEntry> {
    plan.segments
        .iter()
        .filter(|segment| segment.seconds() > 0.0)
        .map(|segment| match segment {
            MediaSegment::LeadIn { seconds } => TrackEntry {
                path: work_dir.join("intro.wav"),
                silence_seconds: Some(*seconds),
            },
            MediaSegment::Narration { path, .. } => TrackEntry {
                path: path.clone(),
                silence_seconds: None,
            },
            MediaSegment::Silence { step, seconds } => TrackEntry {
                path: work_dir.join(format!("silence{step}.wav")),
                silence_seconds: Some(*seconds),
            },
        })
        .collect()
}

/// ffmpeg concat demuxer list; single quotes in paths are escaped.
pub fn concat_list(entries: &[TrackEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let path = entry.path.to_string_lossy().replace('\'', r"'\''");
            format!("file '{path}'\n")
        })
        .collect()
}

pub struct Assembly<'a> {
    pub plan: &'a MediaPlan,
    pub source_video: &'a Path,
    pub destination: &'a Path,
    pub work_dir: &'a Path,
    pub video_width: u32,
}

impl Assembly<'_> {
    pub fn run(&self, ffmpeg: Ffmpeg) -> Result<()> {
        let entries = track_entries(self.plan, self.work_dir);
        for entry in &entries {
            if let Some(seconds) = entry.silence_seconds {
                ffmpeg.render_silence(&entry.path, seconds)?;
            }
        }

        let list_file = self.work_dir.join("audio.txt");
        write_file(&list_file, &concat_list(&entries))?;
        let audio = self.work_dir.join("audio.wav");
        log_stage("audio", &format!("Concatenating {} audio segments", entries.len()));
        ffmpeg.concat_audio(&list_file, &audio)?;

        let trimmed = self.work_dir.join("trimmed.mp4");
        log_stage(
            "trim",
            &format!(
                "Trimming recording from {} for {}",
                self.plan.trim.start_hms(),
                self.plan.trim.duration_hms()
            ),
        );
        ffmpeg.trim_video(self.source_video, &trimmed, self.plan.trim)?;

        let narrated = self.work_dir.join("narrated.mp4");
        log_stage("mux", "Adding narration track");
        ffmpeg.add_audio_track(&trimmed, &audio, &narrated)?;

        let scaled = self.work_dir.join("scaled.mp4");
        log_stage("scale", &format!("Scaling to {}px wide", self.video_width));
        ffmpeg.scale_video(&narrated, &scaled, self.video_width)?;

        let subtitles = self.work_dir.join("subtitles.srt");
        write_file(&subtitles, &render_srt(&self.plan.cues))?;
        log_stage("subtitles", "Embedding subtitles");
        ffmpeg.embed_subtitles(&scaled, &subtitles, self.destination)?;

        Ok(())
    }
}

fn log_stage(stage: &str, message: &str) {
    emit(Level::Info, &format!("report.build.{stage}"), message, None);
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::planner::TrimWindow;

    fn plan(segments: Vec<MediaSegment>) -> MediaPlan {
        MediaPlan {
            steps: Vec::new(),
            segments,
            cues: Vec::new(),
            trim: TrimWindow {
                start_seconds: 0,
                duration_seconds: 0,
            },
        }
    }

    #[test]
    fn track_lists_narration_and_rendered_silence() {
        let plan = plan(vec![
            MediaSegment::LeadIn { seconds: 1.0 },
            MediaSegment::Narration {
                step: 1,
                path: PathBuf::from("/work/voice1.wav"),
                seconds: 2.5,
            },
            MediaSegment::Silence {
                step: 1,
                seconds: 0.0,
            },
            MediaSegment::Silence {
                step: 2,
                seconds: 4.0,
            },
        ]);

        let entries = track_entries(&plan, Path::new("/work"));
        assert_eq!(
            entries,
            vec![
                TrackEntry {
                    path: PathBuf::from("/work/intro.wav"),
                    silence_seconds: Some(1.0)
                },
                TrackEntry {
                    path: PathBuf::from("/work/voice1.wav"),
                    silence_seconds: None
                },
                TrackEntry {
                    path: PathBuf::from("/work/silence2.wav"),
                    silence_seconds: Some(4.0)
                },
            ]
        );
    }

    #[test]
    fn concat_list_escapes_quotes() {
        let entries = vec![
            TrackEntry {
                path: PathBuf::from("/work/intro.wav"),
                silence_seconds: Some(1.0),
            },
            TrackEntry {
                path: PathBuf::from("/work/it's.wav"),
                silence_seconds: None,
            },
        ];
        assert_eq!(
            concat_list(&entries),
            "file '/work/intro.wav'\nfile '/work/it'\\''s.wav'\n"
        );
    }

    #[test]
    fn dry_run_writes_lists_without_running_ffmpeg() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan(vec![MediaSegment::LeadIn { seconds: 1.0 }]);
        let assembly = Assembly {
            plan: &plan,
            source_video: Path::new("capture.mp4"),
            destination: &dir.path().join("out.mp4"),
            work_dir: dir.path(),
            video_width: 720,
        };
        assembly.run(Ffmpeg::new(true)).expect("dry run");

        let list = fs::read_to_string(dir.path().join("audio.txt")).unwrap();
        assert!(list.contains("intro.wav"));
        assert!(dir.path().join("subtitles.srt").exists());
        assert!(!dir.path().join("out.mp4").exists());
    }
}
