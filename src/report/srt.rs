use serde::Serialize;
use std::fmt::Write;
use std::time::Duration;

use super::time::format_srt_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SrtCue {
    /// 1-based cue number as written in the file.
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// Renders cues as a SubRip document: number, time range, text, blank line.
pub fn render_srt(cues: &[SrtCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        // Cue text must not contain blank lines or players split the cue.
        let text = cue
            .text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            format_srt_timestamp(cue.start),
            format_srt_timestamp(cue.end),
            text
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_numbered_blocks() {
        let cues = vec![
            SrtCue {
                index: 1,
                start: Duration::from_secs(2),
                end: Duration::from_millis(5_250),
                text: "Open the dialog".to_string(),
            },
            SrtCue {
                index: 2,
                start: Duration::from_secs(10),
                end: Duration::from_secs(13),
                text: "Click OK\n\nthen wait".to_string(),
            },
        ];

        assert_eq!(
            render_srt(&cues),
            "1\n00:00:02,000 --> 00:00:05,250\nOpen the dialog\n\n2\n00:00:10,000 --> 00:00:13,000\nClick OK\nthen wait\n\n"
        );
    }

    #[test]
    fn empty_cue_list_renders_nothing() {
        assert!(render_srt(&[]).is_empty());
    }
}
