//! Optional rewriting of generated descriptions into something pleasant to
//! listen to. Timing is never affected.

use lazy_static::lazy_static;
use regex::Regex;

use super::steps::StepNarrative;
use super::timeline::Timeline;

const LEFT_CLICK: &str = "User left click";
const LEFT_CLICK_ON: &str = "User left click on";

lazy_static! {
    static ref ASIDE: Regex = Regex::new(r"\s*\([^()]*\)").expect("valid aside pattern");
    static ref WINDOW_SUFFIX: Regex = Regex::new(r#" in "\w+"$"#).expect("valid suffix pattern");
    static ref USER_ACCOUNT: Regex =
        Regex::new(r#""User account for [^"]+""#).expect("valid account pattern");
}

/// Shortens runs of repeated left clicks: the first is spelled out, later
/// ones get terser until a different kind of step breaks the run.
#[derive(Debug, Default)]
pub struct NarrativeStyler {
    click_run: usize,
}

impl NarrativeStyler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restyle(&mut self, narrative: StepNarrative) -> StepNarrative {
        match narrative {
            StepNarrative::Structured {
                description,
                key_sequence,
                program,
                ui_elements,
            } => StepNarrative::Structured {
                description: self.restyle_description(&description),
                key_sequence,
                program,
                ui_elements,
            },
            comment => {
                self.click_run = 0;
                comment
            }
        }
    }

    fn restyle_description(&mut self, description: &str) -> String {
        let text = ASIDE.replace_all(description, "");
        let text = WINDOW_SUFFIX.replace(&text, "");
        let text = USER_ACCOUNT
            .replace(&text, "the User account icon.")
            .into_owned();

        if !text.contains(LEFT_CLICK) {
            self.click_run = 0;
            return text;
        }

        let rewritten = match self.click_run {
            0 => text.replacen(LEFT_CLICK, "Using the mouse, left click", 1),
            1 => text.replacen(LEFT_CLICK, "Left click", 1),
            2 => text.replacen(LEFT_CLICK, "Click", 1),
            _ => text.replacen(LEFT_CLICK_ON, "Select", 1),
        };
        self.click_run = (self.click_run + 1).min(3);
        rewritten
    }
}

pub fn tidy(timeline: Timeline) -> Timeline {
    let mut styler = NarrativeStyler::new();
    timeline.map_narratives(|narrative| styler.restyle(narrative))
}
