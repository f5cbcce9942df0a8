use chrono::{NaiveTime, Timelike};
use std::time::Duration;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Parses a wall-clock `HH:MM:SS` field as written by the recorder.
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M:%S").ok()
}

/// Whole seconds from `start` to `end`, negative when `end` comes first.
///
/// The recorder only logs time of day, so a session that runs past midnight
/// produces an `end` that reads as more than half a day before `start`; that
/// case wraps into the next day.
pub fn seconds_between(start: NaiveTime, end: NaiveTime) -> i64 {
    let delta =
        i64::from(end.num_seconds_from_midnight()) - i64::from(start.num_seconds_from_midnight());
    if delta < -SECONDS_PER_DAY / 2 {
        delta + SECONDS_PER_DAY
    } else {
        delta
    }
}

/// `HH:MM:SS`, as accepted by ffmpeg's `-ss`/`-t`.
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// `HH:MM:SS,mmm`, the SubRip timestamp layout.
pub fn format_srt_timestamp(value: Duration) -> String {
    let total_millis = value.as_millis();
    let millis = total_millis % 1000;
    let total_seconds = (total_millis / 1000) as u64;
    format!("{},{millis:03}", format_hms(total_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recorder_clock() {
        let time = parse_clock(" 09:00:02 ").expect("clock");
        assert_eq!(time.num_seconds_from_midnight(), 9 * 3600 + 2);
        assert!(parse_clock("9 o'clock").is_none());
        assert!(parse_clock("").is_none());
    }

    #[test]
    fn wraps_across_midnight() {
        let start = parse_clock("23:59:50").unwrap();
        let end = parse_clock("00:00:05").unwrap();
        assert_eq!(seconds_between(start, end), 15);
        assert_eq!(seconds_between(end, end), 0);
    }

    #[test]
    fn earlier_clock_on_the_same_day_is_negative() {
        let start = parse_clock("09:00:00").unwrap();
        assert_eq!(seconds_between(start, parse_clock("08:59:59").unwrap()), -1);
        assert_eq!(seconds_between(start, parse_clock("00:00:01").unwrap()), -32399);
        assert_eq!(
            seconds_between(parse_clock("22:00:00").unwrap(), parse_clock("01:00:00").unwrap()),
            3 * 3600
        );
    }

    #[test]
    fn formats_timestamps() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(3725), "01:02:05");
        assert_eq!(
            format_srt_timestamp(Duration::from_millis(62_500)),
            "00:01:02,500"
        );
        assert_eq!(format_srt_timestamp(Duration::from_secs(2)), "00:00:02,000");
    }
}
