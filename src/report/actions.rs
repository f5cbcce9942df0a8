//! Action log extraction.
//!
//! The recorder embeds a machine-generated `<Report>` document inside the
//! report text. It carries the session window on `RecordSession` and one
//! `EachAction` element per logged interaction:
//!
//! ```text
//! <Report><UserActionData><RecordSession StartTime="09:00:00" StopTime="09:00:30">
//!   <EachAction ActionNumber="1" Time="09:00:02">
//!     <HighlightXYWH>10,10,50,50</HighlightXYWH>
//!     <ScreenshotFileName>screenshot0001.JPEG</ScreenshotFileName>
//!   </EachAction>
//! </RecordSession></UserActionData></Report>
//! ```

use chrono::NaiveTime;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use super::error::{ReportError, ReportResult};
use super::time::{parse_clock, seconds_between};

const REPORT_OPEN: &str = "<Report>";
const REPORT_CLOSE: &str = "</Report>";

lazy_static! {
    static ref RECORD_SESSION: Regex =
        Regex::new(r"<RecordSession\b([^>]*)>").expect("valid session pattern");
    static ref EACH_ACTION: Regex =
        Regex::new(r"(?s)<EachAction\b([^>]*)>(.*?)</EachAction>").expect("valid action pattern");
    static ref ATTRIBUTE: Regex =
        Regex::new(r#"([A-Za-z_][\w.-]*)\s*=\s*"([^"]*)""#).expect("valid attribute pattern");
    static ref HIGHLIGHT: Regex =
        Regex::new(r"<HighlightXYWH>([^<]*)</HighlightXYWH>").expect("valid highlight pattern");
    static ref SCREENSHOT_FILE: Regex =
        Regex::new(r"<ScreenshotFileName>([^<]*)</ScreenshotFileName>")
            .expect("valid screenshot pattern");
}

/// Pixel rectangle of the UI element the recorder outlined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Highlight and screenshot reference always travel together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotAnchor {
    pub rect: HighlightRect,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub action_number: u32,
    pub timestamp: NaiveTime,
    pub anchor: Option<ScreenshotAnchor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Session {
    pub start_time: NaiveTime,
    pub stop_time: NaiveTime,
    pub duration_seconds: i64,
}

impl Session {
    pub fn new(start_time: NaiveTime, stop_time: NaiveTime) -> Self {
        Self {
            start_time,
            stop_time,
            duration_seconds: seconds_between(start_time, stop_time),
        }
    }

    /// Elapsed whole seconds from session start to `time`.
    pub fn offset_of(&self, time: NaiveTime) -> i64 {
        seconds_between(self.start_time, time)
    }
}

#[derive(Debug, Clone)]
pub struct ActionLog {
    pub session: Session,
    pub actions: Vec<ActionRecord>,
}

impl ActionLog {
    pub fn find(&self, action_number: u32) -> Option<&ActionRecord> {
        self.actions
            .iter()
            .find(|action| action.action_number == action_number)
    }
}

/// Returns the embedded `<Report>` document, markers included.
pub fn report_segment(raw: &str) -> ReportResult<&str> {
    let start = raw
        .find(REPORT_OPEN)
        .ok_or_else(|| ReportError::malformed("missing <Report> marker"))?;
    let end = raw
        .rfind(REPORT_CLOSE)
        .filter(|end| *end > start)
        .ok_or_else(|| ReportError::malformed("missing </Report> marker"))?;
    Ok(&raw[start..end + REPORT_CLOSE.len()])
}

pub fn parse_action_log(raw: &str) -> ReportResult<ActionLog> {
    let segment = report_segment(raw)?;

    let session_attrs = RECORD_SESSION
        .captures(segment)
        .map(|caps| attributes(caps.get(1).map_or("", |m| m.as_str())))
        .ok_or_else(|| ReportError::malformed("report has no RecordSession element"))?;
    let start_time = session_clock(&session_attrs, "StartTime")?;
    let stop_time = session_clock(&session_attrs, "StopTime")?;
    let session = Session::new(start_time, stop_time);
    if session.duration_seconds < 0 {
        return Err(ReportError::malformed(format!(
            "session StopTime {stop_time} is before StartTime {start_time}"
        )));
    }

    let mut actions = Vec::new();
    for (position, caps) in EACH_ACTION.captures_iter(segment).enumerate() {
        let attrs = attributes(caps.get(1).map_or("", |m| m.as_str()));
        let body = caps.get(2).map_or("", |m| m.as_str());
        let action = parse_action(position, &attrs, body)?;
        if session.offset_of(action.timestamp) < 0 {
            return Err(ReportError::malformed(format!(
                "action {} is logged at {}, before the session start {start_time}",
                action.action_number, action.timestamp
            )));
        }
        actions.push(action);
    }

    Ok(ActionLog { session, actions })
}

fn parse_action(
    position: usize,
    attrs: &HashMap<String, String>,
    body: &str,
) -> ReportResult<ActionRecord> {
    // Older recorder builds omit ActionNumber; source order is action order.
    let action_number = match attrs.get("ActionNumber") {
        Some(value) => value.trim().parse::<u32>().map_err(|_| {
            ReportError::malformed(format!("action {} has ActionNumber '{value}'", position + 1))
        })?,
        None => position as u32 + 1,
    };

    let timestamp = attrs
        .get("Time")
        .and_then(|value| parse_clock(value))
        .ok_or_else(|| {
            ReportError::malformed(format!(
                "action {action_number} has a missing or invalid Time attribute"
            ))
        })?;

    let rect = element_text(&HIGHLIGHT, body)
        .map(|text| parse_rect(action_number, text))
        .transpose()?;
    let reference = element_text(&SCREENSHOT_FILE, body).map(str::to_string);

    let anchor = match (rect, reference) {
        (Some(rect), Some(reference)) => Some(ScreenshotAnchor { rect, reference }),
        (None, None) => None,
        (Some(_), None) => {
            return Err(ReportError::malformed(format!(
                "action {action_number} has a highlight but no screenshot file"
            )));
        }
        (None, Some(_)) => {
            return Err(ReportError::malformed(format!(
                "action {action_number} has a screenshot file but no highlight"
            )));
        }
    };

    Ok(ActionRecord {
        action_number,
        timestamp,
        anchor,
    })
}

fn session_clock(attrs: &HashMap<String, String>, name: &str) -> ReportResult<NaiveTime> {
    let value = attrs
        .get(name)
        .ok_or_else(|| ReportError::malformed(format!("RecordSession is missing {name}")))?;
    parse_clock(value).ok_or_else(|| {
        ReportError::malformed(format!("RecordSession {name} '{value}' is not HH:MM:SS"))
    })
}

fn attributes(source: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(source)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

fn element_text<'a>(pattern: &Regex, body: &'a str) -> Option<&'a str> {
    pattern
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|text| !text.is_empty())
}

fn parse_rect(action_number: u32, text: &str) -> ReportResult<HighlightRect> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| {
            ReportError::malformed(format!(
                "action {action_number} has HighlightXYWH '{text}'"
            ))
        })?;

    match values.as_slice() {
        [x, y, width, height] => Ok(HighlightRect {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
        }),
        _ => Err(ReportError::malformed(format!(
            "action {action_number} has HighlightXYWH '{text}', expected four values"
        ))),
    }
}
