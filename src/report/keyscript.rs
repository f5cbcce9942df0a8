//! Keyboard macro derived from all recorded steps.
//!
//! Comment steps become a comment, a `type` for every `*quoted*` fragment and
//! a pause. Structured steps replay their key chords followed by a pause.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt::Write;

use super::steps::StepNarrative;

lazy_static! {
    static ref TYPED_FRAGMENT: Regex = Regex::new(r"\*([^*]+)\*").expect("valid typed pattern");
}

/// One chord such as `Ctrl-Alt-Del`: every part but the last is a modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyChord {
    pub modifiers: Vec<String>,
    pub key: String,
}

impl KeyChord {
    pub fn parse(chord: &str) -> Option<Self> {
        let mut parts: Vec<String> = chord
            .split('-')
            .map(|part| part.trim().to_lowercase())
            .filter(|part| !part.is_empty())
            .collect();
        let key = parts.pop()?;
        Some(Self {
            modifiers: parts,
            key,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum KeyAction {
    Comment { text: String },
    Type { text: String },
    Press { chord: KeyChord },
    Sleep,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyScript {
    pub actions: Vec<KeyAction>,
}

/// Builds the macro from every recorded step, commented or not.
pub fn build_key_script<'a, I>(narratives: I) -> KeyScript
where
    I: IntoIterator<Item = &'a StepNarrative>,
{
    let mut actions = Vec::new();

    for narrative in narratives {
        match narrative {
            StepNarrative::Comment { text } => {
                actions.push(KeyAction::Comment { text: text.clone() });
                actions.extend(TYPED_FRAGMENT.captures_iter(text).map(|caps| KeyAction::Type {
                    text: caps[1].to_string(),
                }));
            }
            StepNarrative::Structured { key_sequence, .. } => {
                actions.extend(
                    key_sequence
                        .iter()
                        .filter_map(|chord| KeyChord::parse(chord))
                        .map(|chord| KeyAction::Press { chord }),
                );
            }
        }
        actions.push(KeyAction::Sleep);
    }

    KeyScript { actions }
}

/// Renders the script in the kbml dialect read by keyboard macro players.
pub fn render_kbml(script: &KeyScript) -> String {
    let mut out = String::from("<kbml>\n");
    for action in &script.actions {
        let _ = match action {
            KeyAction::Comment { text } => {
                writeln!(out, "  <!-- {} -->", text.replace("--", "- -"))
            }
            KeyAction::Type { text } => writeln!(out, "  <type>{}</type>", escape_xml(text)),
            KeyAction::Press { chord } => match chord.modifiers.split_last() {
                // The player nests modifiers: the innermost one carries the key.
                Some((innermost, outer)) => {
                    let mut line = String::from("  ");
                    for modifier in outer {
                        line.push_str(&key_element(modifier, None, false));
                    }
                    line.push_str(&key_element(innermost, Some(&chord.key), true));
                    for modifier in outer.iter().rev() {
                        let _ = write!(line, "</{}>", element_name(modifier));
                    }
                    writeln!(out, "{line}")
                }
                None => writeln!(out, "  {}", key_element(&chord.key, None, true)),
            },
            KeyAction::Sleep => writeln!(out, "  <sleep/>"),
        };
    }
    out.push_str("</kbml>\n");
    out
}

/// Key names become element names; ones XML cannot carry (`1`, `+`) fall
/// back to a generic element holding the name as an attribute.
fn key_element(name: &str, key: Option<&str>, empty: bool) -> String {
    let mut tag = format!("<{}", element_name(name));
    if !is_xml_name(name) {
        let _ = write!(tag, " name=\"{}\"", escape_xml(name));
    }
    if let Some(key) = key {
        let _ = write!(tag, " key=\"{}\"", escape_xml(key));
    }
    tag.push_str(if empty { "/>" } else { ">" });
    tag
}

fn element_name(name: &str) -> &str {
    if is_xml_name(name) { name } else { "key" }
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chords() {
        assert_eq!(
            KeyChord::parse("Ctrl-Alt-Del"),
            Some(KeyChord {
                modifiers: vec!["ctrl".to_string(), "alt".to_string()],
                key: "del".to_string()
            })
        );
        assert_eq!(KeyChord::parse("Enter").unwrap().modifiers.len(), 0);
        assert_eq!(KeyChord::parse(""), None);
    }

    #[test]
    fn builds_actions_for_both_narrative_forms() {
        let narratives = vec![
            StepNarrative::Comment {
                text: "Type *hello* then *world*".to_string(),
            },
            StepNarrative::Structured {
                description: "User keyboard input".to_string(),
                key_sequence: vec!["Ctrl-S".to_string(), "Enter".to_string()],
                program: "Notepad".to_string(),
                ui_elements: Vec::new(),
            },
        ];
        let script = build_key_script(&narratives);

        assert_eq!(
            script.actions,
            vec![
                KeyAction::Comment {
                    text: "Type *hello* then *world*".to_string()
                },
                KeyAction::Type {
                    text: "hello".to_string()
                },
                KeyAction::Type {
                    text: "world".to_string()
                },
                KeyAction::Sleep,
                KeyAction::Press {
                    chord: KeyChord::parse("Ctrl-S").unwrap()
                },
                KeyAction::Press {
                    chord: KeyChord::parse("Enter").unwrap()
                },
                KeyAction::Sleep,
            ]
        );
    }

    #[test]
    fn renders_kbml() {
        let script = KeyScript {
            actions: vec![
                KeyAction::Type {
                    text: "a<b".to_string(),
                },
                KeyAction::Press {
                    chord: KeyChord::parse("Ctrl-Alt-Del").unwrap(),
                },
                KeyAction::Press {
                    chord: KeyChord::parse("Ctrl-C").unwrap(),
                },
                KeyAction::Sleep,
            ],
        };
        assert_eq!(
            render_kbml(&script),
            "<kbml>\n  <type>a&lt;b</type>\n  <ctrl><alt key=\"del\"/></ctrl>\n  <ctrl key=\"c\"/>\n  <sleep/>\n</kbml>\n"
        );
    }

    #[test]
    fn key_names_that_are_not_element_names_use_key_element() {
        let script = KeyScript {
            actions: vec![
                KeyAction::Press {
                    chord: KeyChord::parse("1").unwrap(),
                },
                KeyAction::Press {
                    chord: KeyChord::parse("Ctrl-+").unwrap(),
                },
                KeyAction::Press {
                    chord: KeyChord::parse("Shift-<").unwrap(),
                },
                KeyAction::Press {
                    chord: KeyChord::parse("F1").unwrap(),
                },
            ],
        };
        assert_eq!(
            render_kbml(&script),
            "<kbml>\n  <key name=\"1\"/>\n  <ctrl key=\"+\"/>\n  <shift key=\"&lt;\"/>\n  <f1/>\n</kbml>\n"
        );
    }

    #[test]
    fn odd_modifier_names_keep_nesting() {
        let script = KeyScript {
            actions: vec![KeyAction::Press {
                chord: KeyChord::parse("3-Alt-X").unwrap(),
            }],
        };
        assert_eq!(
            render_kbml(&script),
            "<kbml>\n  <key name=\"3\"><alt key=\"x\"/></key>\n</kbml>\n"
        );
    }
}
