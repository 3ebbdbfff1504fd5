//! Natural-language time expressions: relative durations ("in 10 minutes"),
//! clock times ("at 7:30pm"), reminder message extraction, and schedule
//! cadences ("daily at 9am", "every 2 hours").

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

static HOURS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*h(?:ours?|rs?)?\b").unwrap());
static MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*m(?:in(?:ute)?s?)?\b").unwrap());
static SECONDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*s(?:ec(?:ond)?s?)?\b").unwrap());
static HALF_HOUR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"half\s+(?:an\s+)?hour").unwrap());

static MERIDIEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").unwrap());
static CLOCK_24H_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2}):(\d{2})\b").unwrap());
static OCLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2})\s*o'?clock").unwrap());

static MESSAGE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:remind\s+me\s+(?:to\s+)?|set\s+(?:a\s+)?reminder\s+(?:to\s+)?|don'?t\s+(?:let\s+me\s+)?forget\s+(?:to\s+)?)").unwrap()
});
static MESSAGE_TAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+(?:in\s+(?:half\s+(?:an\s+)?hour|\d+.*)|at\s+\d+.*|at\s+(?:noon|midnight|morning|afternoon|evening|night).*|tomorrow.*|daily.*|every\s+day.*)$").unwrap()
});

/// Sum of the duration fragments in `text`, or None when none are present.
pub fn parse_relative(text: &str) -> Option<Duration> {
    let mut total = Duration::zero();
    let mut matched = false;

    if let Some(caps) = HOURS_RE.captures(text) {
        if let Ok(h) = caps[1].parse::<i64>() {
            total = total + Duration::hours(h);
            matched = true;
        }
    }
    if let Some(caps) = MINUTES_RE.captures(text) {
        if let Ok(m) = caps[1].parse::<i64>() {
            total = total + Duration::minutes(m);
            matched = true;
        }
    }
    if let Some(caps) = SECONDS_RE.captures(text) {
        if let Ok(s) = caps[1].parse::<i64>() {
            total = total + Duration::seconds(s);
            matched = true;
        }
    }
    if HALF_HOUR_RE.is_match(text) {
        total = total + Duration::minutes(30);
        matched = true;
    }

    if matched && total > Duration::zero() {
        Some(total)
    } else {
        None
    }
}

/// Clock time mentioned in `text` as (hour, minute), 24-hour.
///
/// The 12-hour form is tried before the bare `H:MM` form so "7:30pm"
/// resolves to 19:30 rather than 7:30.
pub fn parse_clock(text: &str) -> Option<(u32, u32)> {
    if let Some(caps) = MERIDIEM_RE.captures(text) {
        let mut hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        if hour > 12 || minute > 59 {
            return None;
        }
        hour %= 12;
        if &caps[3] == "pm" {
            hour += 12;
        }
        return Some((hour, minute));
    }

    if let Some(caps) = CLOCK_24H_RE.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        if hour <= 23 && minute <= 59 {
            return Some((hour, minute));
        }
        return None;
    }

    if let Some(caps) = OCLOCK_RE.captures(text) {
        let mut hour: u32 = caps[1].parse().ok()?;
        if hour == 0 || hour > 12 {
            return None;
        }
        // Bare "3 o'clock" means the upcoming afternoon hour.
        if hour <= 6 {
            hour += 12;
        }
        return Some((hour, 0));
    }

    if text.contains("noon") {
        return Some((12, 0));
    }
    if text.contains("midnight") {
        return Some((0, 0));
    }
    if text.contains("morning") {
        return Some((9, 0));
    }
    if text.contains("afternoon") {
        return Some((14, 0));
    }
    if text.contains("evening") {
        return Some((18, 0));
    }
    if text.contains("night") {
        return Some((21, 0));
    }

    None
}

/// `hour:minute` on the given date, in local time.
pub fn clock_on(date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Local>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    Local.from_local_datetime(&naive).earliest()
}

/// Next occurrence of `hour:minute`: today if still ahead, else tomorrow.
pub fn next_clock(now: DateTime<Local>, hour: u32, minute: u32) -> Option<DateTime<Local>> {
    let today = clock_on(now.date_naive(), hour, minute)?;
    if today > now {
        Some(today)
    } else {
        clock_on(now.date_naive() + Duration::days(1), hour, minute)
    }
}

/// Strict `HH:MM` used by stored schedules.
pub fn parse_hhmm(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    let hour: u32 = h.trim().parse().ok()?;
    let minute: u32 = m.trim().parse().ok()?;
    if hour <= 23 && minute <= 59 {
        Some((hour, minute))
    } else {
        None
    }
}

/// Trigger time for a reminder phrase: a relative duration wins over an
/// absolute clock time.
pub fn parse_trigger(text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    if let Some(delta) = parse_relative(text) {
        return Some(now + delta);
    }
    let (hour, minute) = parse_clock(text)?;
    next_clock(now, hour, minute)
}

/// Reminder message with the command prefix and time expression removed.
pub fn extract_message(text: &str) -> String {
    let stripped = MESSAGE_PREFIX_RE.replace(text.trim(), "");
    let stripped = MESSAGE_TAIL_RE.replace(&stripped, "");
    let message = stripped.trim().trim_start_matches("to ").trim();
    if message.is_empty() {
        "Reminder".to_string()
    } else {
        message.to_string()
    }
}

/// How often a schedule repeats.
#[derive(Debug, Clone, PartialEq)]
pub enum CadenceSpec {
    Daily { hour: u32, minute: u32 },
    Interval { minutes: u32 },
    Weekly { days: Vec<u32>, hour: u32, minute: u32 },
}

static CADENCE_DAILY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:daily|every\s+day)\s+at\s+(.+)$").unwrap());
static CADENCE_HOURS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"every\s+(\d+)\s+hours?").unwrap());
static CADENCE_MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"every\s+(\d+)\s+min(?:ute)?s?").unwrap());
static CADENCE_WEEKDAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"every\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\s+at\s+(.+)$")
        .unwrap()
});
static CADENCE_WEEKDAYS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:on\s+)?weekdays\s+at\s+(.+)$").unwrap());
static CADENCE_BARE_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:at\s+)?\d{1,2}(?::\d{2})?\s*(?:am|pm)\s*$").unwrap());

fn weekday_index(name: &str) -> u32 {
    match name {
        "monday" => 0,
        "tuesday" => 1,
        "wednesday" => 2,
        "thursday" => 3,
        "friday" => 4,
        "saturday" => 5,
        _ => 6,
    }
}

/// Cadence mentioned in `text`, plus the byte offset where the cadence
/// phrase starts so the caller can slice the task name off the front.
pub fn parse_cadence(text: &str) -> Option<(CadenceSpec, usize)> {
    if let Some(caps) = CADENCE_DAILY_RE.captures(text) {
        let whole = caps.get(0)?;
        let (hour, minute) = parse_clock(&caps[1])?;
        return Some((CadenceSpec::Daily { hour, minute }, whole.start()));
    }
    if let Some(caps) = CADENCE_HOURS_RE.captures(text) {
        let whole = caps.get(0)?;
        let hours: u32 = caps[1].parse().ok()?;
        return Some((CadenceSpec::Interval { minutes: hours.max(1) * 60 }, whole.start()));
    }
    if let Some(caps) = CADENCE_MINUTES_RE.captures(text) {
        let whole = caps.get(0)?;
        let minutes: u32 = caps[1].parse().ok()?;
        return Some((CadenceSpec::Interval { minutes: minutes.max(1) }, whole.start()));
    }
    if let Some(caps) = CADENCE_WEEKDAY_RE.captures(text) {
        let whole = caps.get(0)?;
        let (hour, minute) = parse_clock(&caps[2])?;
        let days = vec![weekday_index(&caps[1])];
        return Some((CadenceSpec::Weekly { days, hour, minute }, whole.start()));
    }
    if let Some(caps) = CADENCE_WEEKDAYS_RE.captures(text) {
        let whole = caps.get(0)?;
        let (hour, minute) = parse_clock(&caps[1])?;
        return Some((
            CadenceSpec::Weekly { days: vec![0, 1, 2, 3, 4], hour, minute },
            whole.start(),
        ));
    }
    if let Some(m) = CADENCE_BARE_TIME_RE.find(text) {
        let (hour, minute) = parse_clock(m.as_str())?;
        return Some((CadenceSpec::Daily { hour, minute }, m.start()));
    }
    None
}

/// `HH:MM` rendered for people, "07:00" becomes "7:00 AM".
pub fn friendly_clock(hour: u32, minute: u32) -> String {
    let meridiem = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, minute, meridiem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        clock_on(date, h, m).unwrap()
    }

    #[test]
    fn relative_durations_sum() {
        assert_eq!(parse_relative("in 5 minutes"), Some(Duration::minutes(5)));
        assert_eq!(
            parse_relative("in 2 hours 30 minutes"),
            Some(Duration::minutes(150))
        );
        assert_eq!(parse_relative("in 90 seconds"), Some(Duration::seconds(90)));
        assert_eq!(parse_relative("in half an hour"), Some(Duration::minutes(30)));
        assert_eq!(parse_relative("at 5pm"), None);
    }

    #[test]
    fn clock_prefers_meridiem_over_24h() {
        assert_eq!(parse_clock("at 7:30pm"), Some((19, 30)));
        assert_eq!(parse_clock("at 7:30"), Some((7, 30)));
        assert_eq!(parse_clock("at 12am"), Some((0, 0)));
        assert_eq!(parse_clock("at 12pm"), Some((12, 0)));
        assert_eq!(parse_clock("at 3 o'clock"), Some((15, 0)));
        assert_eq!(parse_clock("at 9 o'clock"), Some((9, 0)));
        assert_eq!(parse_clock("at noon"), Some((12, 0)));
        assert_eq!(parse_clock("tonight at midnight"), Some((0, 0)));
        assert_eq!(parse_clock("at 25:00"), None);
    }

    #[test]
    fn past_clock_rolls_to_tomorrow() {
        let now = at(18, 0);
        let trigger = parse_trigger("at 5pm", now).unwrap();
        assert_eq!(trigger - now, Duration::hours(23));
    }

    #[test]
    fn trigger_prefers_relative() {
        let now = at(10, 0);
        let trigger = parse_trigger("in 5 minutes", now).unwrap();
        assert_eq!(trigger, now + Duration::minutes(5));
    }

    #[test]
    fn message_extraction() {
        assert_eq!(extract_message("remind me to call mom at 5pm"), "call mom");
        assert_eq!(
            extract_message("don't forget to submit the report in 2 hours"),
            "submit the report"
        );
        assert_eq!(extract_message("set a reminder in 10 minutes"), "Reminder");
    }

    #[test]
    fn cadence_forms() {
        let (spec, start) = parse_cadence("backup daily at 9am").unwrap();
        assert_eq!(spec, CadenceSpec::Daily { hour: 9, minute: 0 });
        assert_eq!("backup daily at 9am"[..start].trim(), "backup");

        let (spec, _) = parse_cadence("cleanup every 2 hours").unwrap();
        assert_eq!(spec, CadenceSpec::Interval { minutes: 120 });

        let (spec, _) = parse_cadence("standup every monday at 9:30am").unwrap();
        assert_eq!(
            spec,
            CadenceSpec::Weekly { days: vec![0], hour: 9, minute: 30 }
        );

        let (spec, _) = parse_cadence("focus mode weekdays at 2pm").unwrap();
        assert_eq!(
            spec,
            CadenceSpec::Weekly { days: vec![0, 1, 2, 3, 4], hour: 14, minute: 0 }
        );

        let (spec, _) = parse_cadence("morning routine at 7am").unwrap();
        assert_eq!(spec, CadenceSpec::Daily { hour: 7, minute: 0 });
    }

    #[test]
    fn hhmm_validation() {
        assert_eq!(parse_hhmm("09:30"), Some((9, 30)));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("bogus"), None);
    }

    #[test]
    fn friendly_clock_formats() {
        assert_eq!(friendly_clock(7, 0), "7:00 AM");
        assert_eq!(friendly_clock(19, 30), "7:30 PM");
        assert_eq!(friendly_clock(0, 5), "12:05 AM");
        assert_eq!(friendly_clock(12, 0), "12:00 PM");
    }
}
