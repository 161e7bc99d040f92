//! Time and text formatting shared by the status view and the watch header.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;

/// Offset used when `--tz` is neither a zone name nor a valid hour offset.
const FALLBACK_OFFSET_SECS: i32 = 3 * 3600;

/// Commit messages longer than this are cut to `MESSAGE_LIMIT - 3` chars plus `...`.
pub const MESSAGE_LIMIT: usize = 70;

/// `42s`, `5m`, `1h 5m`, `2d 3h`. Minutes are dropped once the age reaches a day.
pub fn human_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        return format!("{secs}s");
    }

    let days = secs / 86_400;
    let hours = secs / 3600 % 24;
    let minutes = secs / 60 % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if days == 0 && minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.join(" ")
}

/// Age of `since` at `now`; timestamps from the future count as zero.
pub fn age(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or_default()
}

/// Display timezone selected with `--tz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Zone {
    /// IANA name (`Europe/Berlin`), else a whole-hour offset in `-12..=14`
    /// (`+3`, `-5`), else UTC+3.
    pub fn parse(spec: &str) -> Self {
        if let Ok(tz) = spec.parse::<Tz>() {
            return Zone::Named(tz);
        }
        spec.trim()
            .parse::<i32>()
            .ok()
            .filter(|hours| (-12..=14).contains(hours))
            .and_then(|hours| FixedOffset::east_opt(hours * 3600))
            .map(Zone::Fixed)
            .unwrap_or_else(Zone::fallback)
    }

    fn fallback() -> Self {
        Zone::Fixed(FixedOffset::east_opt(FALLBACK_OFFSET_SECS).unwrap_or_else(|| Utc.fix()))
    }

    pub fn localize(&self, t: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Zone::Named(tz) => t.with_timezone(tz).fixed_offset(),
            Zone::Fixed(offset) => t.with_timezone(offset),
        }
    }
}

/// `UTC+3`, `UTC-5`, `UTC+5:30`.
pub fn utc_offset_label(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let hours = secs / 3600;
    let minutes = (secs % 3600 / 60).abs();
    if minutes == 0 {
        format!("UTC{hours:+}")
    } else {
        format!("UTC{hours:+}:{minutes:02}")
    }
}

pub fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MESSAGE_LIMIT {
        return message.to_string();
    }
    let kept: String = message.chars().take(MESSAGE_LIMIT - 3).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_human_duration() {
        let cases = [
            (0, "0s"),
            (59, "59s"),
            (60, "1m"),
            (65 * 60, "1h 5m"),
            (3600, "1h"),
            (86_400, "1d"),
            (2 * 86_400 + 3 * 3600 + 59 * 60, "2d 3h"),
            (86_400 + 30 * 60, "1d"),
        ];
        for (secs, expected) in cases {
            assert_eq!(human_duration(Duration::from_secs(secs)), expected, "{secs}s");
        }
    }

    #[test]
    fn test_future_timestamp_has_zero_age() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 3, 1, 10, 5, 0).unwrap();
        assert_eq!(age(later, now), Duration::ZERO);
        assert_eq!(age(now, later), Duration::from_secs(300));
    }

    #[test]
    fn test_zone_parsing() {
        assert_eq!(Zone::parse("Europe/Berlin"), Zone::Named(chrono_tz::Europe::Berlin));
        assert_eq!(
            Zone::parse(" +5 "),
            Zone::Fixed(FixedOffset::east_opt(5 * 3600).unwrap())
        );
        assert_eq!(
            Zone::parse("-12"),
            Zone::Fixed(FixedOffset::west_opt(12 * 3600).unwrap())
        );
        for junk in ["Mars/Olympus", "15", "-13", ""] {
            assert_eq!(
                Zone::parse(junk),
                Zone::Fixed(FixedOffset::east_opt(3 * 3600).unwrap()),
                "{junk:?}"
            );
        }
    }

    #[test]
    fn test_named_zone_follows_dst() {
        let zone = Zone::parse("Europe/Berlin");
        let winter = zone.localize(Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap());
        let summer = zone.localize(Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap());
        assert_eq!(utc_offset_label(*winter.offset()), "UTC+1");
        assert_eq!(utc_offset_label(*summer.offset()), "UTC+2");
    }

    #[test]
    fn test_offset_label() {
        assert_eq!(utc_offset_label(FixedOffset::east_opt(3 * 3600).unwrap()), "UTC+3");
        assert_eq!(utc_offset_label(FixedOffset::west_opt(5 * 3600).unwrap()), "UTC-5");
        assert_eq!(utc_offset_label(FixedOffset::east_opt(19_800).unwrap()), "UTC+5:30");
        assert_eq!(utc_offset_label(FixedOffset::east_opt(0).unwrap()), "UTC+0");
    }

    #[test]
    fn test_truncate_message() {
        assert_eq!(truncate_message("short"), "short");
        let exact = "x".repeat(70);
        assert_eq!(truncate_message(&exact), exact);
        let long = "y".repeat(71);
        let cut = truncate_message(&long);
        assert_eq!(cut.len(), 70);
        assert!(cut.ends_with("..."));

        let cyrillic = "ы".repeat(80);
        assert_eq!(truncate_message(&cyrillic).chars().count(), 70);
    }
}
