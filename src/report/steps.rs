//! Narrative step extraction.
//!
//! The human-readable log starts at the `Recording Session` heading and runs
//! until the next markup element other than `<br />`. It holds one `Step N:`
//! heading per action with `<br />` between the fields of a step:
//!
//! ```text
//! Recording Session: 1/2/2019 9:00:00 - 9:00:30 Step 1: User left click on &quot;OK&quot; (button) [Ctrl]<br />
//! Program: Dialog Host<br />UI Elements: OK, Dialog<br />Step 2: User Comment: &quot;Save it&quot;<br /></div>
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::error::{ReportError, ReportResult};

const SECTION_HEADING: &str = "Recording Session";
const COMMENT_MARKER: &str = "User Comment:";
const PROGRAM_PREFIX: &str = "Program:";
const UI_ELEMENTS_PREFIX: &str = "UI Elements:";
const KEY_ELISION: &str = "...";

lazy_static! {
    static ref STEP_HEADING: Regex = Regex::new(r"Step (\d+):").expect("valid heading pattern");
    static ref SECTION_END: Regex = Regex::new(r"<(?:[^bB]|[bB][^rR])").expect("valid section end pattern");
    static ref LINE_BREAK: Regex = Regex::new(r"(?i)<br\s*/?>").expect("valid break pattern");
    static ref KEY_HINT: Regex = Regex::new(r"\s*\[([^\[\]]*)\]\s*$").expect("valid key hint pattern");
    static ref ASIDE: Regex = Regex::new(r"\s*\([^()]*\)").expect("valid aside pattern");
    static ref ELEMENT_SEPARATOR: Regex = Regex::new(r",\s*").expect("valid separator pattern");
}

/// What the recorder wrote for one step: either the user's own annotation or
/// its generated description of the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepNarrative {
    Comment {
        text: String,
    },
    Structured {
        description: String,
        key_sequence: Vec<String>,
        program: String,
        ui_elements: Vec<String>,
    },
}

impl StepNarrative {
    /// The sentence to narrate and subtitle.
    pub fn text(&self) -> &str {
        match self {
            StepNarrative::Comment { text } => text,
            StepNarrative::Structured { description, .. } => description,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, StepNarrative::Comment { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepBlock {
    pub step_number: u32,
    pub narrative: StepNarrative,
}

/// Returns the narrative section, from its heading up to the first markup
/// element that is not a line break.
pub fn narrative_section(raw: &str) -> ReportResult<&str> {
    let start = raw
        .find(SECTION_HEADING)
        .ok_or_else(|| ReportError::malformed("missing 'Recording Session' heading"))?;
    let rest = &raw[start..];
    Ok(match SECTION_END.find(rest) {
        Some(end) => &rest[..end.start()],
        None => rest,
    })
}

pub fn parse_step_blocks(raw: &str) -> ReportResult<Vec<StepBlock>> {
    let section = narrative_section(raw)?;

    let headings: Vec<(usize, usize, &str)> = STEP_HEADING
        .captures_iter(section)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?;
            Some((whole.start(), whole.end(), number.as_str()))
        })
        .collect();

    let mut blocks = Vec::with_capacity(headings.len());
    for (i, (_, body_start, number)) in headings.iter().enumerate() {
        let body_end = headings
            .get(i + 1)
            .map_or(section.len(), |(next_start, _, _)| *next_start);
        let step_number = number
            .parse::<u32>()
            .map_err(|_| ReportError::malformed(format!("step number '{number}' out of range")))?;

        if let Some(block) = parse_block(step_number, &section[*body_start..body_end])? {
            blocks.push(block);
        }
    }

    Ok(blocks)
}

fn parse_block(step_number: u32, body: &str) -> ReportResult<Option<StepBlock>> {
    let parts: Vec<&str> = LINE_BREAK.split(body).map(str::trim).collect();
    if parts.iter().all(|part| part.is_empty()) {
        return Ok(None);
    }

    let heading_line = parts[0];
    if let Some((_, comment)) = heading_line.split_once(COMMENT_MARKER) {
        return Ok(Some(StepBlock {
            step_number,
            narrative: StepNarrative::Comment {
                text: unquote(&decode_entities(comment.trim())).to_string(),
            },
        }));
    }

    let description = clean_description(heading_line);
    if description.is_empty() {
        return Err(ReportError::step_block(step_number, "missing description"));
    }

    let key_sequence = KEY_HINT
        .captures(heading_line)
        .and_then(|caps| caps.get(1))
        .map(|hint| parse_key_sequence(hint.as_str()))
        .unwrap_or_default();

    let program = prefixed_field(&parts, 1, PROGRAM_PREFIX)
        .ok_or_else(|| ReportError::step_block(step_number, "missing 'Program:' line"))?;
    let ui_elements = prefixed_field(&parts, 2, UI_ELEMENTS_PREFIX)
        .ok_or_else(|| ReportError::step_block(step_number, "missing 'UI Elements:' line"))?;

    Ok(Some(StepBlock {
        step_number,
        narrative: StepNarrative::Structured {
            description,
            key_sequence,
            program,
            ui_elements: ELEMENT_SEPARATOR
                .split(&ui_elements)
                .map(str::trim)
                .filter(|element| !element.is_empty())
                .map(str::to_string)
                .collect(),
        },
    }))
}

fn clean_description(heading_line: &str) -> String {
    let without_hint = KEY_HINT.replace(heading_line, "");
    let without_asides = ASIDE.replace_all(&without_hint, "");
    decode_entities(without_asides.trim())
}

/// Key chords are whitespace separated; `Ctrl-Alt-Del` is one chord.
pub fn parse_key_sequence(hint: &str) -> Vec<String> {
    hint.replace(KEY_ELISION, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn prefixed_field(parts: &[&str], position: usize, prefix: &str) -> Option<String> {
    parts
        .get(position)
        .and_then(|part| part.strip_prefix(prefix))
        .map(|value| decode_entities(value.trim()))
}

pub fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(steps: &str) -> String {
        format!(
            "<html><body><div>Recording Session: 1/2/2019 9:00:00 - 9:00:30 {steps}</div></body></html>\r\n<Report></Report>"
        )
    }

    #[test]
    fn parses_structured_step() {
        let raw = report(
            "Step 1: User left click &quot;OK&quot; in &quot;Dialog&quot; [Ctrl]<br />Program: Dialog Host<br />UI Elements: OK, Dialog<br />",
        );
        let blocks = parse_step_blocks(&raw).expect("parse");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].step_number, 1);
        assert_eq!(
            blocks[0].narrative,
            StepNarrative::Structured {
                description: r#"User left click "OK" in "Dialog""#.to_string(),
                key_sequence: vec!["Ctrl".to_string()],
                program: "Dialog Host".to_string(),
                ui_elements: vec!["OK".to_string(), "Dialog".to_string()],
            }
        );
    }

    #[test]
    fn parses_comment_step_and_skips_summary() {
        let raw = report(
            "Step 1: User Comment: &quot;Fish &amp; chips&quot;<br />Step 2: User keyboard input in &quot;Notepad&quot; (edit) [... Ctrl-A Ctrl-Alt-Del]<br />Program: Notepad<br />UI Elements: Text Editor<br />",
        );
        let blocks = parse_step_blocks(&raw).expect("parse");
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0].narrative,
            StepNarrative::Comment {
                text: "Fish & chips".to_string()
            }
        );
        let StepNarrative::Structured {
            description,
            key_sequence,
            ..
        } = &blocks[1].narrative
        else {
            panic!("expected structured step");
        };
        assert_eq!(description, r#"User keyboard input in "Notepad""#);
        assert_eq!(key_sequence, &vec!["Ctrl-A".to_string(), "Ctrl-Alt-Del".to_string()]);
    }

    #[test]
    fn empty_trailing_block_is_discarded() {
        let raw = report(
            "Step 1: User Comment: go<br />Step 2: <br /> ",
        );
        let blocks = parse_step_blocks(&raw).expect("parse");
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn missing_program_line_is_malformed() {
        let raw = report("Step 3: User left click on &quot;OK&quot;<br />UI Elements: OK<br />");
        let err = parse_step_blocks(&raw).unwrap_err();
        assert!(matches!(err, ReportError::MalformedStepBlock { step: 3, .. }));
    }

    #[test]
    fn missing_ui_elements_line_is_malformed() {
        let raw = report("Step 1: User left click on OK<br />Program: Dialog<br />");
        let err = parse_step_blocks(&raw).unwrap_err();
        let ReportError::MalformedStepBlock { step, reason } = &err else {
            panic!("expected malformed step block, got {err:?}");
        };
        assert_eq!(*step, 1);
        assert!(reason.contains("UI Elements"), "{reason}");
    }

    #[test]
    fn description_of_only_asides_is_malformed() {
        let raw = report("Step 2: (button) [Enter]<br />Program: Dialog<br />UI Elements: OK<br />");
        let err = parse_step_blocks(&raw).unwrap_err();
        let ReportError::MalformedStepBlock { step, reason } = &err else {
            panic!("expected malformed step block, got {err:?}");
        };
        assert_eq!(*step, 2);
        assert_eq!(reason, "missing description");
    }

    #[test]
    fn structured_step_without_field_lines_is_malformed() {
        let raw = report("Step 1: User left click on OK Step 2: User Comment: done<br />");
        let err = parse_step_blocks(&raw).unwrap_err();
        let ReportError::MalformedStepBlock { step, reason } = &err else {
            panic!("expected malformed step block, got {err:?}");
        };
        assert_eq!(*step, 1);
        assert!(reason.contains("Program"), "{reason}");
    }

    #[test]
    fn missing_heading_is_malformed_report() {
        let err = parse_step_blocks("<Report></Report>").unwrap_err();
        assert!(matches!(err, ReportError::MalformedReport(_)));
    }

    #[test]
    fn narrative_text_prefers_comment_or_description() {
        let comment = StepNarrative::Comment {
            text: "hello".to_string(),
        };
        assert_eq!(comment.text(), "hello");
        assert!(comment.is_comment());
    }
}
