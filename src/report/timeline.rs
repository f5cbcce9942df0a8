use serde::Serialize;
use std::collections::BTreeSet;

use super::actions::Session;
use super::correlate::CorrelatedStep;
use super::error::{ReportError, ReportResult};
use super::screenshot::Screenshot;
use super::steps::StepNarrative;

/// A step on the canonical timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// 1-based position after filtering and removal.
    pub index: usize,
    /// Number the recorder gave this step.
    pub step_number: u32,
    pub offset_seconds: i64,
    pub duration_seconds: i64,
    pub narrative: StepNarrative,
    #[serde(skip)]
    pub screenshot: Option<Screenshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub session: Session,
    pub steps: Vec<Step>,
}

/// Commented steps win: when the user annotated anything, only the annotated
/// steps are narrated. Relative order is preserved.
pub fn select_canonical(steps: Vec<CorrelatedStep>) -> Vec<CorrelatedStep> {
    if steps.iter().any(|step| step.narrative.is_comment()) {
        steps
            .into_iter()
            .filter(|step| step.narrative.is_comment())
            .collect()
    } else {
        steps
    }
}

pub fn build_timeline(steps: Vec<CorrelatedStep>, session: Session) -> ReportResult<Timeline> {
    let selected = select_canonical(steps);

    let next_offsets: Vec<i64> = selected
        .iter()
        .skip(1)
        .map(|step| step.offset_seconds)
        .chain(std::iter::once(session.duration_seconds))
        .collect();

    let steps = selected
        .into_iter()
        .zip(next_offsets)
        .enumerate()
        .map(|(position, (step, next_offset))| {
            let duration_seconds = next_offset - step.offset_seconds;
            if duration_seconds < 0 {
                return Err(ReportError::NonMonotonicTimeline {
                    step: step.step_number,
                    offset: step.offset_seconds,
                    next_offset,
                });
            }
            Ok(Step {
                index: position + 1,
                step_number: step.step_number,
                offset_seconds: step.offset_seconds,
                duration_seconds,
                narrative: step.narrative,
                screenshot: step.screenshot,
            })
        })
        .collect::<ReportResult<Vec<_>>>()?;

    Ok(Timeline { session, steps })
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Drops the steps at the given canonical indices and renumbers the rest.
    ///
    /// Offsets and durations of the remaining steps are left as they were, so
    /// pruning a step leaves a gap rather than stretching its neighbour.
    pub fn without_steps(mut self, indices: &BTreeSet<usize>) -> Self {
        self.steps.retain(|step| !indices.contains(&step.index));
        for (position, step) in self.steps.iter_mut().enumerate() {
            step.index = position + 1;
        }
        self
    }

    /// Replaces each step's narrative, keeping timing untouched.
    pub fn map_narratives<F>(mut self, mut rewrite: F) -> Self
    where
        F: FnMut(StepNarrative) -> StepNarrative,
    {
        for step in &mut self.steps {
            let narrative = std::mem::replace(
                &mut step.narrative,
                StepNarrative::Comment {
                    text: String::new(),
                },
            );
            step.narrative = rewrite(narrative);
        }
        self
    }
}
