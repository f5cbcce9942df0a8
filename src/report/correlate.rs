use super::actions::{ActionLog, ActionRecord};
use super::error::{ReportError, ReportResult};
use super::screenshot::Screenshot;
use super::steps::{StepBlock, StepNarrative};

/// A narrative block joined with its logged action, not yet placed on the
/// canonical timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatedStep {
    pub step_number: u32,
    pub offset_seconds: i64,
    pub narrative: StepNarrative,
    pub screenshot: Option<Screenshot>,
}

/// Joins every block to the action with the same number, in block order.
///
/// `screenshot_for` is called once per joined action; it is usually
/// [`super::screenshot::extract_screenshot`] bound to the raw report text.
pub fn correlate_steps<F>(
    blocks: Vec<StepBlock>,
    log: &ActionLog,
    mut screenshot_for: F,
) -> ReportResult<Vec<CorrelatedStep>>
where
    F: FnMut(&ActionRecord) -> ReportResult<Option<Screenshot>>,
{
    blocks
        .into_iter()
        .map(|block| {
            let action = log
                .find(block.step_number)
                .ok_or(ReportError::UnresolvedStep {
                    step: block.step_number,
                })?;

            Ok(CorrelatedStep {
                step_number: block.step_number,
                offset_seconds: log.session.offset_of(action.timestamp),
                narrative: block.narrative,
                screenshot: screenshot_for(action)?,
            })
        })
        .collect()
}
