//! Steps Recorder report parsing and narration planning.
//!
//! A report is one MHTML document. Its HTML body lists the recorded steps as
//! text, an embedded `<Report>` XML document logs when each action happened,
//! and base64 MIME parts after the body hold the screenshots. Parsing joins
//! the three into a [`timeline::Timeline`]; everything downstream (subtitles,
//! narration, video assembly) works from that timeline.

pub mod actions;
pub mod assemble;
pub mod cli;
pub mod commands;
pub mod config;
pub mod correlate;
pub mod error;
pub mod export;
pub mod ffmpeg;
pub mod keyscript;
pub mod narration;
pub mod planner;
pub mod screenshot;
pub mod source;
pub mod srt;
pub mod steps;
pub mod styling;
pub mod time;
pub mod timeline;

pub use cli::ReportCommands;
pub use commands::handle_report_command;

use actions::{Session, parse_action_log};
use correlate::{CorrelatedStep, correlate_steps};
use error::ReportResult;
use screenshot::extract_screenshot;
use steps::parse_step_blocks;
use timeline::{Timeline, build_timeline};

/// Every recorded step joined with its action, before comment filtering.
#[derive(Debug, Clone)]
pub struct ParsedReport {
    pub session: Session,
    pub steps: Vec<CorrelatedStep>,
}

impl ParsedReport {
    pub fn into_timeline(self) -> ReportResult<Timeline> {
        build_timeline(self.steps, self.session)
    }
}

pub fn parse_all_steps(raw: &str) -> ReportResult<ParsedReport> {
    let log = parse_action_log(raw)?;
    let blocks = parse_step_blocks(raw)?;
    let steps = correlate_steps(blocks, &log, |action| extract_screenshot(raw, action))?;
    Ok(ParsedReport {
        session: log.session,
        steps,
    })
}

/// Parses raw report text into the canonical step timeline.
pub fn parse_report(raw: &str) -> ReportResult<Timeline> {
    parse_all_steps(raw)?.into_timeline()
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::ReportError;
    use keyscript::{KeyAction, KeyChord, build_key_script};

    fn report(steps: &str, actions: &[(u32, &str)]) -> String {
        let actions: String = actions
            .iter()
            .map(|(number, time)| {
                format!("<EachAction ActionNumber=\"{number}\" Time=\"{time}\"></EachAction>\n")
            })
            .collect();
        format!(
            "<html><body><div>Recording Session: 1/2/2019 9:00:00 - 9:00:30 {steps}</div>\n\
<Report><UserActionData><RecordSession StartTime=\"09:00:00\" StopTime=\"09:00:30\">\n\
{actions}</RecordSession></UserActionData></Report></body></html>"
        )
    }

    const COMMENT_AND_SAVE: &str = "Step 1: User Comment: &quot;Save the file&quot;<br />\
Step 2: User keyboard input in &quot;Notepad&quot; [Ctrl-S]<br />Program: Notepad<br />UI Elements: Text Editor<br />";

    #[test]
    fn canonical_timeline_keeps_only_comments() {
        let raw = report(COMMENT_AND_SAVE, &[(1, "09:00:02"), (2, "09:00:10")]);
        let timeline = parse_report(&raw).expect("parse");
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.steps[0].duration_seconds, 28);
    }

    #[test]
    fn key_script_covers_steps_hidden_by_comments() {
        let raw = report(COMMENT_AND_SAVE, &[(1, "09:00:02"), (2, "09:00:10")]);
        let parsed = parse_all_steps(&raw).expect("parse");
        assert_eq!(parsed.steps.len(), 2);

        let script = build_key_script(parsed.steps.iter().map(|step| &step.narrative));
        assert_eq!(
            script.actions,
            vec![
                KeyAction::Comment {
                    text: "Save the file".to_string()
                },
                KeyAction::Sleep,
                KeyAction::Press {
                    chord: KeyChord::parse("Ctrl-S").unwrap()
                },
                KeyAction::Sleep,
            ]
        );
    }

    #[test]
    fn step_without_logged_action_is_unresolved() {
        let steps = "Step 1: User left click on OK<br />Program: Dialog<br />UI Elements: OK<br />\
Step 4: User left click on Close<br />Program: Dialog<br />UI Elements: Close<br />";
        let raw = report(steps, &[(1, "09:00:02"), (2, "09:00:10")]);
        let err = parse_report(&raw).unwrap_err();
        assert!(matches!(err, ReportError::UnresolvedStep { step: 4 }));
    }
}
