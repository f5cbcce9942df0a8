//! Media timeline planning.
//!
//! Runs after narration has been synthesized for every step. Produces the
//! audio segment order, the subtitle cues and the video trim window. Nothing
//! here touches the filesystem or spawns a process.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::{ReportError, ReportResult};
use super::srt::SrtCue;
use super::time::format_hms;
use super::timeline::{Step, Timeline};

/// A synthesized narration file and its measured length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrationClip {
    pub path: PathBuf,
    pub duration_seconds: f64,
}

/// A canonical step enriched with its narration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarratedStep {
    pub step: Step,
    pub narration: Option<NarrationClip>,
    /// Silence needed after the narration to fill the step; only known once
    /// the narration length is.
    pub silence_padding_seconds: Option<f64>,
}

impl NarratedStep {
    pub fn new(step: Step, narration: Option<NarrationClip>) -> Self {
        let silence_padding_seconds = narration
            .as_ref()
            .map(|clip| (step.duration_seconds as f64 - clip.duration_seconds).max(0.0));
        Self {
            step,
            narration,
            silence_padding_seconds,
        }
    }

    pub fn audio_duration_seconds(&self) -> Option<f64> {
        self.narration.as_ref().map(|clip| clip.duration_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaSegment {
    LeadIn {
        seconds: f64,
    },
    Narration {
        step: usize,
        path: PathBuf,
        seconds: f64,
    },
    Silence {
        step: usize,
        seconds: f64,
    },
}

impl MediaSegment {
    pub fn seconds(&self) -> f64 {
        match self {
            MediaSegment::LeadIn { seconds }
            | MediaSegment::Narration { seconds, .. }
            | MediaSegment::Silence { seconds, .. } => *seconds,
        }
    }
}

/// Portion of the screen recording to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrimWindow {
    pub start_seconds: u64,
    /// Handed to the trimmer as the length measured from `start_seconds`.
    pub duration_seconds: u64,
}

impl TrimWindow {
    pub fn start_hms(&self) -> String {
        format_hms(self.start_seconds)
    }

    pub fn duration_hms(&self) -> String {
        format_hms(self.duration_seconds)
    }
}

/// Fixed margins used when lining narration up with the recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannerSettings {
    /// Where the first subtitle cue lands in the trimmed video.
    pub lead_in_seconds: i64,
    /// Silence before the first narration clip.
    pub intro_silence_seconds: f64,
    /// Kept before the first recorded action.
    pub trim_lead_seconds: i64,
    /// Dropped from the last recorded action when computing the trim length.
    pub trim_tail_seconds: i64,
    /// Subtitle hold time after narration ends.
    pub cue_tail_seconds: f64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            lead_in_seconds: 2,
            intro_silence_seconds: 1.0,
            trim_lead_seconds: 4,
            trim_tail_seconds: 2,
            cue_tail_seconds: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaPlan {
    pub steps: Vec<NarratedStep>,
    pub segments: Vec<MediaSegment>,
    pub cues: Vec<SrtCue>,
    pub trim: TrimWindow,
}

impl MediaPlan {
    pub fn audio_seconds(&self) -> f64 {
        self.segments.iter().map(MediaSegment::seconds).sum()
    }
}

/// Plans narration audio, subtitles and trimming for `timeline`.
///
/// `narration` holds one slot per step in timeline order; `None` marks a step
/// whose narration is unavailable, which is then covered by silence.
pub fn plan_media(
    timeline: &Timeline,
    narration: Vec<Option<NarrationClip>>,
    settings: &PlannerSettings,
) -> ReportResult<MediaPlan> {
    if narration.len() != timeline.len() {
        return Err(ReportError::NarrationMismatch {
            expected: timeline.len(),
            actual: narration.len(),
        });
    }
    let (Some(first), Some(last)) = (timeline.steps.first(), timeline.steps.last()) else {
        return Err(ReportError::EmptyTimeline);
    };

    let trim = TrimWindow {
        start_seconds: (first.offset_seconds - settings.trim_lead_seconds).max(0) as u64,
        duration_seconds: (last.offset_seconds - settings.trim_tail_seconds).max(0) as u64,
    };

    for (step, clip) in timeline.steps.iter().zip(&narration) {
        if let Some(clip) = clip {
            if !clip.duration_seconds.is_finite() || clip.duration_seconds < 0.0 {
                return Err(ReportError::InvalidNarrationLength {
                    index: step.index,
                    seconds: clip.duration_seconds,
                });
            }
        }
    }

    let steps: Vec<NarratedStep> = timeline
        .steps
        .iter()
        .cloned()
        .zip(narration)
        .map(|(step, clip)| NarratedStep::new(step, clip))
        .collect();

    let segments = plan_segments(&steps, settings);
    let cues = plan_cues(&steps, first.offset_seconds, settings)?;

    Ok(MediaPlan {
        steps,
        segments,
        cues,
        trim,
    })
}

fn plan_segments(steps: &[NarratedStep], settings: &PlannerSettings) -> Vec<MediaSegment> {
    let mut segments = Vec::with_capacity(steps.len() * 2 + 1);
    segments.push(MediaSegment::LeadIn {
        seconds: settings.intro_silence_seconds,
    });

    for narrated in steps {
        let index = narrated.step.index;
        match (&narrated.narration, narrated.silence_padding_seconds) {
            (Some(clip), Some(padding)) => {
                segments.push(MediaSegment::Narration {
                    step: index,
                    path: clip.path.clone(),
                    seconds: clip.duration_seconds,
                });
                segments.push(MediaSegment::Silence {
                    step: index,
                    seconds: padding,
                });
            }
            _ => segments.push(MediaSegment::Silence {
                step: index,
                seconds: narrated.step.duration_seconds as f64,
            }),
        }
    }

    segments
}

fn plan_cues(
    steps: &[NarratedStep],
    first_offset: i64,
    settings: &PlannerSettings,
) -> ReportResult<Vec<SrtCue>> {
    let correction = settings.lead_in_seconds - first_offset;

    let starts = steps
        .iter()
        .map(|narrated| {
            let seconds = (narrated.step.offset_seconds + correction) as f64;
            if seconds < 0.0 {
                Err(ReportError::NegativeCueTime {
                    index: narrated.step.index,
                    seconds,
                })
            } else {
                Ok(seconds)
            }
        })
        .collect::<ReportResult<Vec<f64>>>()?;

    let cues = steps
        .iter()
        .zip(&starts)
        .enumerate()
        .map(|(position, (narrated, &start))| {
            let next_start = starts.get(position + 1).copied();
            let end = match (narrated.audio_duration_seconds(), next_start) {
                (Some(audio), Some(next)) => {
                    (start + audio + settings.cue_tail_seconds).min(next)
                }
                (Some(audio), None) => start + audio + settings.cue_tail_seconds,
                (None, Some(next)) => next,
                (None, None) => start + narrated.step.duration_seconds as f64,
            };

            let index = narrated.step.index;
            let end = end.max(start);
            Ok(SrtCue {
                index,
                start: cue_time(index, start)?,
                end: cue_time(index, end)?,
                text: narrated.step.narrative.text().to_string(),
            })
        })
        .collect::<ReportResult<Vec<_>>>()?;

    Ok(cues)
}

fn cue_time(index: usize, seconds: f64) -> ReportResult<Duration> {
    Duration::try_from_secs_f64(seconds).map_err(|_| ReportError::CueOutOfRange { index, seconds })
}
