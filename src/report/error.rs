use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Malformed report: {0}")]
    MalformedReport(String),

    #[error("Step {step} could not be parsed: {reason}")]
    MalformedStepBlock { step: u32, reason: String },

    #[error("Screenshot '{reference}' for action {action} has no embedded payload")]
    ScreenshotNotFound { action: u32, reference: String },

    #[error("Step {step} has no matching action record")]
    UnresolvedStep { step: u32 },

    #[error(
        "Step {step} at {offset}s is followed by a timestamp at {next_offset}s; timeline is not monotonic"
    )]
    NonMonotonicTimeline {
        step: u32,
        offset: i64,
        next_offset: i64,
    },

    #[error("Subtitle cue {index} would start at {seconds}s; lead-in exceeds the first step offset")]
    NegativeCueTime { index: usize, seconds: f64 },

    #[error("Expected narration for {expected} steps but received {actual}")]
    NarrationMismatch { expected: usize, actual: usize },

    #[error("Narration for step {index} is {seconds}s long; lengths must be finite and non-negative")]
    InvalidNarrationLength { index: usize, seconds: f64 },

    #[error("Subtitle cue {index} would end at {seconds}s, which is out of range")]
    CueOutOfRange { index: usize, seconds: f64 },

    #[error("Report contains no steps to plan")]
    EmptyTimeline,

    #[error("Highlight {width}x{height} for action {action} is too small to crop")]
    InvalidHighlight { action: u32, width: i32, height: i32 },

    #[error("Failed to process screenshot for action {action}: {message}")]
    ImageProcessing { action: u32, message: String },
}

impl ReportError {
    pub fn malformed(message: impl Into<String>) -> Self {
        ReportError::MalformedReport(message.into())
    }

    pub fn step_block(step: u32, reason: impl Into<String>) -> Self {
        ReportError::MalformedStepBlock {
            step,
            reason: reason.into(),
        }
    }
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
