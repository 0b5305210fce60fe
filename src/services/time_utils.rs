use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Minutes since midnight used when a clock string cannot be read (9:00 AM).
pub const DEFAULT_START_MINUTES: u32 = 9 * 60;
/// Duration used when a duration string carries no usable hours or minutes.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

// ASCII digits only; other scripts' digits never count as a match.
static CLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([0-9]+):([0-9]+)\s*(AM|PM)?").expect("clock pattern is valid")
});
static HOURS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([0-9]+)\s*h").expect("hours pattern is valid"));
static MINUTES_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([0-9]+)\s*m").expect("minutes pattern is valid"));

/// Why a free-text time could not be read. Never surfaced to callers; the
/// public parsers swap it for their documented default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftFailure {
    NoMatch,
    Overflow,
    Zero,
}

/// Minutes since midnight for the first `H:MM [AM|PM]` found in `text`.
pub fn parse_clock_time(text: &str) -> u32 {
    try_parse_clock_time(text).unwrap_or_else(|reason| {
        debug!(target: "app::timing", input = text, ?reason, "clock time fallback");
        DEFAULT_START_MINUTES
    })
}

pub fn try_parse_clock_time(text: &str) -> Result<u32, SoftFailure> {
    let captures = CLOCK_PATTERN.captures(text).ok_or(SoftFailure::NoMatch)?;
    let mut hours: u32 = captures[1].parse().map_err(|_| SoftFailure::Overflow)?;
    let minutes: u32 = captures[2].parse().map_err(|_| SoftFailure::Overflow)?;

    match captures.get(3).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(ref period) if period == "PM" && hours < 12 => hours += 12,
        Some(ref period) if period == "AM" && hours == 12 => hours = 0,
        _ => {}
    }

    hours
        .checked_mul(60)
        .and_then(|total| total.checked_add(minutes))
        .ok_or(SoftFailure::Overflow)
}

/// Total minutes described by text like `"2h 30m"`, `"45m"` or `"1 h"`.
pub fn parse_duration(text: &str) -> u32 {
    try_parse_duration(text).unwrap_or_else(|reason| {
        debug!(target: "app::timing", input = text, ?reason, "duration fallback");
        DEFAULT_DURATION_MINUTES
    })
}

pub fn try_parse_duration(text: &str) -> Result<u32, SoftFailure> {
    let hours = capture_number(&HOURS_PATTERN, text)?;
    let minutes = capture_number(&MINUTES_PATTERN, text)?;
    if hours.is_none() && minutes.is_none() {
        return Err(SoftFailure::NoMatch);
    }

    let total = hours
        .unwrap_or(0)
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes.unwrap_or(0)))
        .ok_or(SoftFailure::Overflow)?;

    if total == 0 {
        Err(SoftFailure::Zero)
    } else {
        Ok(total)
    }
}

fn capture_number(pattern: &Regex, text: &str) -> Result<Option<u32>, SoftFailure> {
    match pattern.captures(text) {
        Some(captures) => captures[1]
            .parse()
            .map(Some)
            .map_err(|_| SoftFailure::Overflow),
        None => Ok(None),
    }
}

/// Renders minutes since midnight as `H:MM AM|PM`. Values past midnight wrap
/// on the 12-hour dial rather than rolling into a new day.
pub fn format_clock_time(total_minutes: u32) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    let period = if hours >= 12 { "PM" } else { "AM" };
    let display_hours = match hours % 12 {
        0 => 12,
        h => h,
    };
    format!("{display_hours}:{minutes:02} {period}")
}
