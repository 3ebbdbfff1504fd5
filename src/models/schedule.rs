use chrono::{DateTime, Datelike, Duration, Local, Timelike};
use serde::{Deserialize, Serialize};

use crate::parser::timeparse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Once,
    Daily,
    Hourly,
    Weekly,
    Interval,
}

/// Binds a task to a recurrence rule. `next_run` is recomputed right after
/// every execution; `once` schedules disable themselves instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub task_id: String,
    pub task_name: String,
    #[serde(rename = "schedule_type")]
    pub cadence: Cadence,
    #[serde(default)]
    pub time: Option<String>,
    /// Days of week, 0 = Monday.
    #[serde(default)]
    pub days: Vec<u32>,
    #[serde(default)]
    pub interval_minutes: u32,
    pub enabled: bool,
    #[serde(default)]
    pub next_run: Option<DateTime<Local>>,
    #[serde(default)]
    pub last_run: Option<DateTime<Local>>,
    #[serde(default)]
    pub run_count: u32,
    pub created_at: DateTime<Local>,
    #[serde(default)]
    pub description: String,
}

impl Schedule {
    fn base(task_id: &str, task_name: &str, cadence: Cadence) -> Self {
        Self {
            id: super::short_id(),
            task_id: task_id.to_string(),
            task_name: task_name.to_string(),
            cadence,
            time: None,
            days: Vec::new(),
            interval_minutes: 0,
            enabled: true,
            next_run: None,
            last_run: None,
            run_count: 0,
            created_at: Local::now(),
            description: String::new(),
        }
    }

    pub fn daily(task_id: &str, task_name: &str, hour: u32, minute: u32) -> Self {
        let mut s = Self::base(task_id, task_name, Cadence::Daily);
        s.time = Some(format!("{:02}:{:02}", hour, minute));
        s
    }

    pub fn interval(task_id: &str, task_name: &str, minutes: u32) -> Self {
        let mut s = Self::base(task_id, task_name, Cadence::Interval);
        s.interval_minutes = minutes;
        s
    }

    pub fn weekly(task_id: &str, task_name: &str, days: Vec<u32>, hour: u32, minute: u32) -> Self {
        let mut s = Self::base(task_id, task_name, Cadence::Weekly);
        s.time = Some(format!("{:02}:{:02}", hour, minute));
        s.days = days;
        s
    }

    pub fn once(task_id: &str, task_name: &str, run_at: DateTime<Local>) -> Self {
        let mut s = Self::base(task_id, task_name, Cadence::Once);
        s.next_run = Some(run_at);
        s
    }

    /// Next run time strictly derived from `now`; `None` means the rule can
    /// never fire again (or is misconfigured).
    pub fn next_occurrence(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        match self.cadence {
            Cadence::Once => self.next_run,
            Cadence::Daily => {
                let (hour, minute) = timeparse::parse_hhmm(self.time.as_deref()?)?;
                timeparse::next_clock(now, hour, minute)
            }
            Cadence::Hourly => {
                let hours = if self.interval_minutes >= 60 {
                    (self.interval_minutes / 60) as i64
                } else {
                    1
                };
                truncate_seconds(now + Duration::hours(hours))
            }
            Cadence::Weekly => {
                let (hour, minute) = timeparse::parse_hhmm(self.time.as_deref()?)?;
                if self.days.is_empty() {
                    return None;
                }
                // Check today plus the next 7 days.
                for i in 0..8 {
                    let date = (now + Duration::days(i)).date_naive();
                    if !self.days.contains(&date.weekday().num_days_from_monday()) {
                        continue;
                    }
                    if let Some(when) = timeparse::clock_on(date, hour, minute) {
                        if when > now {
                            return Some(when);
                        }
                    }
                }
                None
            }
            Cadence::Interval => {
                if self.interval_minutes == 0 {
                    return None;
                }
                truncate_seconds(now + Duration::minutes(self.interval_minutes as i64))
            }
        }
    }

    pub fn is_due(&self, now: DateTime<Local>) -> bool {
        self.enabled && self.next_run.map_or(false, |t| now >= t)
    }

    pub fn describe(&self) -> String {
        match self.cadence {
            Cadence::Once => match self.next_run {
                Some(t) => format!("Once at {}", t.format("%b %d, %I:%M %p")),
                None => "Once".to_string(),
            },
            Cadence::Daily => format!("Daily at {}", self.time.as_deref().unwrap_or("??:??")),
            Cadence::Hourly => {
                let hours = if self.interval_minutes >= 60 {
                    self.interval_minutes / 60
                } else {
                    1
                };
                format!("Every {} hour{}", hours, if hours != 1 { "s" } else { "" })
            }
            Cadence::Weekly => {
                const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
                let mut days: Vec<u32> = self.days.clone();
                days.sort_unstable();
                let names: Vec<&str> = days
                    .iter()
                    .filter_map(|d| DAY_NAMES.get(*d as usize).copied())
                    .collect();
                format!(
                    "Every {} at {}",
                    names.join(", "),
                    self.time.as_deref().unwrap_or("??:??")
                )
            }
            Cadence::Interval => {
                if self.interval_minutes >= 60 {
                    let hours = self.interval_minutes / 60;
                    let mins = self.interval_minutes % 60;
                    if mins > 0 {
                        format!("Every {}h {}m", hours, mins)
                    } else {
                        format!("Every {} hour{}", hours, if hours != 1 { "s" } else { "" })
                    }
                } else {
                    format!(
                        "Every {} minute{}",
                        self.interval_minutes,
                        if self.interval_minutes != 1 { "s" } else { "" }
                    )
                }
            }
        }
    }
}

fn truncate_seconds(t: DateTime<Local>) -> Option<DateTime<Local>> {
    t.with_second(0).and_then(|t| t.with_nanosecond(0))
}

/// One entry of the in-memory execution log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRun {
    pub schedule_id: String,
    pub task_id: String,
    pub executed_at: DateTime<Local>,
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_rolls_to_tomorrow_when_past() {
        let now = Local::now();
        let past = now - Duration::minutes(10);
        let s = Schedule::daily("t", "T", past.hour(), past.minute());
        let next = s.next_occurrence(now).unwrap();
        assert!(next > now);
        assert_eq!(next.hour(), past.hour());
        assert_eq!(next.minute(), past.minute());
        assert!(next - now < Duration::days(1) + Duration::minutes(1));
    }

    #[test]
    fn weekly_picks_requested_weekday() {
        let now = Local::now();
        // Two days from now, some fixed time.
        let target = (now + Duration::days(2)).date_naive();
        let day = target.weekday().num_days_from_monday();
        let s = Schedule::weekly("t", "T", vec![day], 10, 30);
        let next = s.next_occurrence(now).unwrap();
        assert_eq!(next.date_naive().weekday().num_days_from_monday(), day);
        assert_eq!((next.hour(), next.minute()), (10, 30));
    }

    #[test]
    fn interval_and_hourly_advance() {
        let now = Local::now();
        let s = Schedule::interval("t", "T", 30);
        let next = s.next_occurrence(now).unwrap();
        assert!(next > now);
        assert!(next - now <= Duration::minutes(30));

        let mut h = Schedule::base("t", "T", Cadence::Hourly);
        h.interval_minutes = 120;
        let next = h.next_occurrence(now).unwrap();
        assert!(next - now > Duration::minutes(115));
    }

    #[test]
    fn misconfigured_rules_yield_none() {
        let now = Local::now();
        let s = Schedule::interval("t", "T", 0);
        assert!(s.next_occurrence(now).is_none());
        let w = Schedule::weekly("t", "T", vec![], 9, 0);
        assert!(w.next_occurrence(now).is_none());
    }
}
