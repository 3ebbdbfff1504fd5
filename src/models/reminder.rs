use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Reminder,
    Alarm,
    Timer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Active,
    Triggered,
}

/// A reminder, alarm, or countdown timer. Each item carries exactly one
/// trigger time; recurrence is handled by spawning a sibling for the next
/// day when this one fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub message: String,
    pub trigger_time: DateTime<Local>,
    #[serde(rename = "reminder_type")]
    pub kind: ReminderKind,
    pub status: ReminderStatus,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub recurring_time: Option<String>,
    pub created_at: DateTime<Local>,
}

impl Reminder {
    pub fn new(message: impl Into<String>, trigger_time: DateTime<Local>, kind: ReminderKind) -> Self {
        Self {
            id: super::short_id(),
            message: message.into(),
            trigger_time,
            kind,
            status: ReminderStatus::Active,
            recurring: false,
            recurring_time: None,
            created_at: Local::now(),
        }
    }

    pub fn is_due(&self, now: DateTime<Local>) -> bool {
        self.status == ReminderStatus::Active && now >= self.trigger_time
    }

    /// Human-readable delay until the trigger time ("45 seconds", "2h 15m").
    pub fn time_until(&self, now: DateTime<Local>) -> String {
        let total_seconds = (self.trigger_time - now).num_seconds();
        if total_seconds < 0 {
            return "now".to_string();
        }
        if total_seconds < 60 {
            format!("{} seconds", total_seconds)
        } else if total_seconds < 3600 {
            let minutes = total_seconds / 60;
            format!("{} minute{}", minutes, if minutes != 1 { "s" } else { "" })
        } else if total_seconds < 86_400 {
            let hours = total_seconds / 3600;
            let minutes = (total_seconds % 3600) / 60;
            if minutes > 0 {
                format!("{}h {}m", hours, minutes)
            } else {
                format!("{} hour{}", hours, if hours != 1 { "s" } else { "" })
            }
        } else {
            let days = total_seconds / 86_400;
            format!("{} day{}", days, if days != 1 { "s" } else { "" })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn time_until_buckets() {
        let now = Local::now();
        let r = Reminder::new("x", now + Duration::seconds(45), ReminderKind::Timer);
        assert_eq!(r.time_until(now), "45 seconds");

        let r = Reminder::new("x", now + Duration::minutes(5), ReminderKind::Timer);
        assert_eq!(r.time_until(now), "5 minutes");

        let r = Reminder::new("x", now + Duration::minutes(135), ReminderKind::Timer);
        assert_eq!(r.time_until(now), "2h 15m");

        let r = Reminder::new("x", now - Duration::seconds(10), ReminderKind::Timer);
        assert_eq!(r.time_until(now), "now");
    }

    #[test]
    fn due_only_while_active() {
        let now = Local::now();
        let mut r = Reminder::new("x", now - Duration::seconds(1), ReminderKind::Reminder);
        assert!(r.is_due(now));
        r.status = ReminderStatus::Triggered;
        assert!(!r.is_due(now));
    }
}
