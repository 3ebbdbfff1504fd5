//! Reminders, alarms, and countdown timers: JSON-backed list, 1-second
//! poller, natural-language command handling.

use crate::models::{CommandKind, ParsedCommand, Reminder, ReminderKind, ReminderStatus};
use crate::parser::timeparse;
use crate::store::JsonStore;
use chrono::{DateTime, Duration, Local};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct ReminderManager {
    store: JsonStore,
    items: Vec<Reminder>,
    triggered_queue: Vec<Reminder>,
}

impl ReminderManager {
    pub fn new(store: JsonStore) -> Self {
        let mut items: Vec<Reminder> = store.load();
        // Triggered history from a previous run is not carried over.
        items.retain(|r| r.status == ReminderStatus::Active);
        log::info!("reminder system loaded ({} active)", items.len());
        Self {
            store,
            items,
            triggered_queue: Vec::new(),
        }
    }

    fn save(&self) {
        if let Err(e) = self.store.save(&self.items) {
            log::warn!("could not save reminders: {}", e);
        }
    }

    pub fn add(
        &mut self,
        message: impl Into<String>,
        trigger_time: DateTime<Local>,
        kind: ReminderKind,
        recurring: bool,
        recurring_time: Option<String>,
    ) -> Reminder {
        let mut reminder = Reminder::new(message, trigger_time, kind);
        reminder.recurring = recurring;
        reminder.recurring_time = recurring_time;
        self.items.push(reminder.clone());
        self.save();
        reminder
    }

    pub fn add_relative(
        &mut self,
        message: impl Into<String>,
        now: DateTime<Local>,
        delta: Duration,
        kind: ReminderKind,
    ) -> Reminder {
        self.add(message, now + delta, kind, false, None)
    }

    /// Reminder at the next occurrence of `hour:minute`; rolls to tomorrow
    /// when the time already passed today.
    pub fn add_at_time(
        &mut self,
        message: impl Into<String>,
        now: DateTime<Local>,
        hour: u32,
        minute: u32,
        kind: ReminderKind,
        recurring: bool,
    ) -> Option<Reminder> {
        let trigger = timeparse::next_clock(now, hour, minute)?;
        let recurring_time = recurring.then(|| format!("{:02}:{:02}", hour, minute));
        Some(self.add(message, trigger, kind, recurring, recurring_time))
    }

    pub fn set_timer(&mut self, now: DateTime<Local>, delta: Duration) -> Reminder {
        let minutes = delta.num_seconds() / 60;
        let message = if minutes > 0 {
            format!("Timer: {} minute{}", minutes, if minutes != 1 { "s" } else { "" })
        } else {
            format!("Timer: {} seconds", delta.num_seconds())
        };
        self.add_relative(message, now, delta, ReminderKind::Timer)
    }

    pub fn set_alarm(
        &mut self,
        now: DateTime<Local>,
        hour: u32,
        minute: u32,
        recurring: bool,
    ) -> Option<Reminder> {
        let message = format!("Alarm: {:02}:{:02}", hour, minute);
        self.add_at_time(message, now, hour, minute, ReminderKind::Alarm, recurring)
    }

    pub fn active(&self) -> Vec<&Reminder> {
        self.items
            .iter()
            .filter(|r| r.status == ReminderStatus::Active)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Reminder> {
        self.items.iter().find(|r| r.id == id)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|r| r.id != id);
        let removed = self.items.len() != before;
        if removed {
            self.save();
        }
        removed
    }

    /// 1-based index into the active list sorted by trigger time, the same
    /// numbering `format_list` shows.
    pub fn delete_by_index(&mut self, index: usize) -> bool {
        let mut active: Vec<&Reminder> = self.active();
        active.sort_by_key(|r| r.trigger_time);
        match active.get(index.wrapping_sub(1)) {
            Some(r) => {
                let id = r.id.clone();
                self.delete(&id)
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        self.triggered_queue.clear();
        self.save();
        count
    }

    pub fn snooze(&mut self, id: &str, now: DateTime<Local>, minutes: i64) -> bool {
        let Some(reminder) = self.items.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        reminder.trigger_time = now + Duration::minutes(minutes);
        reminder.status = ReminderStatus::Active;
        self.save();
        true
    }

    /// Fire everything due: mark triggered, queue for pickup, and spawn
    /// tomorrow's sibling for recurring items.
    pub fn check_due(&mut self, now: DateTime<Local>) -> Vec<Reminder> {
        let mut fired = Vec::new();
        let mut siblings = Vec::new();

        for reminder in &mut self.items {
            if !reminder.is_due(now) {
                continue;
            }
            reminder.status = ReminderStatus::Triggered;
            fired.push(reminder.clone());
            if reminder.recurring {
                if let Some((hour, minute)) = reminder
                    .recurring_time
                    .as_deref()
                    .and_then(timeparse::parse_hhmm)
                {
                    if let Some(today) = timeparse::clock_on(now.date_naive(), hour, minute) {
                        siblings.push((
                            reminder.message.clone(),
                            today + Duration::days(1),
                            reminder.kind,
                            reminder.recurring_time.clone(),
                        ));
                    }
                }
            }
        }

        if fired.is_empty() {
            return fired;
        }
        self.triggered_queue.extend(fired.iter().cloned());
        for (message, trigger, kind, recurring_time) in siblings {
            let mut sibling = Reminder::new(message, trigger, kind);
            sibling.recurring = true;
            sibling.recurring_time = recurring_time;
            self.items.push(sibling);
        }
        self.save();
        fired
    }

    /// Drain the queue of reminders that fired since the last call.
    pub fn take_triggered(&mut self) -> Vec<Reminder> {
        std::mem::take(&mut self.triggered_queue)
    }

    pub fn format_list(&self, now: DateTime<Local>) -> String {
        let mut active: Vec<&Reminder> = self.active();
        active.sort_by_key(|r| r.trigger_time);

        if active.is_empty() {
            return "No active reminders.".to_string();
        }

        let mut lines = vec![format!(
            "You have {} reminder{}:",
            active.len(),
            if active.len() != 1 { "s" } else { "" }
        )];
        for (i, r) in active.iter().enumerate() {
            let date_str = if r.trigger_time.date_naive() == now.date_naive() {
                "Today".to_string()
            } else if r.trigger_time.date_naive() == (now + Duration::days(1)).date_naive() {
                "Tomorrow".to_string()
            } else {
                r.trigger_time.format("%b %d").to_string()
            };
            let recurring = if r.recurring { " (daily)" } else { "" };
            lines.push(format!("{}. {}{}", i + 1, r.message, recurring));
            lines.push(format!(
                "   {} at {} (in {})",
                date_str,
                r.trigger_time.format("%I:%M %p"),
                r.time_until(now)
            ));
        }
        lines.join("\n")
    }

    /// Natural-language entry point used by the dispatcher.
    pub fn handle_command(
        &mut self,
        cmd: &ParsedCommand,
        now: DateTime<Local>,
    ) -> Result<String, String> {
        let text = cmd.original_text.as_str();
        match cmd.kind {
            CommandKind::ListReminders => Ok(self.format_list(now)),
            CommandKind::ClearReminders => {
                let count = self.clear_all();
                Ok(format!("Cleared {} reminders.", count))
            }
            CommandKind::DeleteReminder => {
                let index: usize = cmd
                    .param("index")
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| {
                        "Specify which reminder (e.g., 'delete reminder 1').".to_string()
                    })?;
                if self.delete_by_index(index) {
                    Ok(format!("Deleted reminder {}.", index))
                } else {
                    Err(format!("Reminder {} not found.", index))
                }
            }
            CommandKind::SetTimer => {
                let delta = timeparse::parse_relative(text).ok_or_else(|| {
                    "Specify duration (e.g., 'set timer for 10 minutes').".to_string()
                })?;
                let r = self.set_timer(now, delta);
                Ok(format!("Timer set for {}!", r.time_until(now)))
            }
            CommandKind::SetAlarm => {
                let (hour, minute) = timeparse::parse_clock(text)
                    .ok_or_else(|| "Specify time (e.g., 'set alarm for 7am').".to_string())?;
                let recurring = text.contains("daily") || text.contains("every");
                let r = self
                    .set_alarm(now, hour, minute, recurring)
                    .ok_or_else(|| "That time does not exist today.".to_string())?;
                let rec = if recurring { " (daily)" } else { "" };
                Ok(format!(
                    "Alarm set for {}{}!",
                    r.trigger_time.format("%I:%M %p"),
                    rec
                ))
            }
            CommandKind::SetReminder => {
                let message = timeparse::extract_message(text);
                if let Some(delta) = timeparse::parse_relative(text) {
                    let r = self.add_relative(&message, now, delta, ReminderKind::Reminder);
                    return Ok(format!(
                        "Reminder set: '{}' in {}.",
                        message,
                        r.time_until(now)
                    ));
                }
                if let Some((hour, minute)) = timeparse::parse_clock(text) {
                    let recurring = text.contains("daily") || text.contains("every");
                    let r = self
                        .add_at_time(&message, now, hour, minute, ReminderKind::Reminder, recurring)
                        .ok_or_else(|| "That time does not exist today.".to_string())?;
                    let date_str = if r.trigger_time.date_naive() == now.date_naive() {
                        "today"
                    } else {
                        "tomorrow"
                    };
                    let rec = if recurring { " (daily)" } else { "" };
                    return Ok(format!(
                        "Reminder: '{}' at {} {}{}.",
                        message,
                        r.trigger_time.format("%I:%M %p"),
                        date_str,
                        rec
                    ));
                }
                Err("Specify when (e.g., 'in 30 minutes' or 'at 5pm').".to_string())
            }
            CommandKind::Snooze => {
                let minutes: i64 = cmd
                    .param("minutes")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5);
                let triggered = self.take_triggered();
                let Some(last) = triggered.last() else {
                    return Err("No reminder to snooze.".to_string());
                };
                self.snooze(&last.id, now, minutes);
                Ok(format!("Snoozed for {} minutes.", minutes))
            }
            _ => Err("Not a reminder command.".to_string()),
        }
    }
}

/// Background loop firing due reminders every `interval_secs`.
pub fn spawn_poller(
    manager: Arc<Mutex<ReminderManager>>,
    interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let fired = match manager.lock() {
                        Ok(mut guard) => guard.check_due(Local::now()),
                        Err(_) => {
                            log::error!("reminder manager lock poisoned, stopping poller");
                            break;
                        }
                    };
                    for reminder in fired {
                        log::info!("reminder due: {}", reminder.message);
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn manager() -> (tempfile::TempDir, ReminderManager) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("reminders.json"));
        (dir, ReminderManager::new(store))
    }

    fn command(kind: CommandKind, text: &str) -> ParsedCommand {
        ParsedCommand {
            kind,
            params: HashMap::new(),
            original_text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn timer_command_sets_relative_trigger() {
        let (_dir, mut m) = manager();
        let now = Local::now();
        let reply = m
            .handle_command(&command(CommandKind::SetTimer, "set timer for 5 minutes"), now)
            .unwrap();
        assert!(reply.starts_with("Timer set for"));
        let active = m.active();
        assert_eq!(active.len(), 1);
        let delta = active[0].trigger_time - now;
        assert_eq!(delta.num_seconds(), 300);
    }

    #[test]
    fn timer_without_duration_fails() {
        let (_dir, mut m) = manager();
        let err = m
            .handle_command(&command(CommandKind::SetTimer, "set a timer"), Local::now())
            .unwrap_err();
        assert!(err.contains("Specify duration"));
    }

    #[test]
    fn reminder_message_and_clock_time() {
        let (_dir, mut m) = manager();
        let now = Local::now();
        let reply = m
            .handle_command(
                &command(CommandKind::SetReminder, "remind me to call mom at 5pm"),
                now,
            )
            .unwrap();
        assert!(reply.contains("'call mom'"));
        let active = m.active();
        assert_eq!(active[0].message, "call mom");
        assert_eq!(active[0].trigger_time.format("%H:%M").to_string(), "17:00");
    }

    #[test]
    fn round_trips_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        let now = Local::now();
        let trigger;
        {
            let mut m = ReminderManager::new(JsonStore::new(&path));
            let r = m.add_relative("water the plants", now, Duration::minutes(90), ReminderKind::Reminder);
            trigger = r.trigger_time;
        }
        let m = ReminderManager::new(JsonStore::new(&path));
        let active = m.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "water the plants");
        assert_eq!(
            active[0].trigger_time.timestamp(),
            trigger.timestamp()
        );
    }

    #[test]
    fn clear_all_is_idempotent() {
        let (_dir, mut m) = manager();
        let now = Local::now();
        m.set_timer(now, Duration::minutes(1));
        m.set_timer(now, Duration::minutes(2));
        assert_eq!(m.clear_all(), 2);
        assert_eq!(m.clear_all(), 0);
    }

    #[test]
    fn due_reminders_fire_once_and_recur_daily() {
        let (_dir, mut m) = manager();
        let now = Local::now();
        m.add(
            "stand up",
            now - Duration::seconds(1),
            ReminderKind::Reminder,
            true,
            Some(now.format("%H:%M").to_string()),
        );
        let fired = m.check_due(now);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].status, ReminderStatus::Triggered);

        // A sibling for tomorrow exists, the original stays as history.
        assert_eq!(m.items.len(), 2);
        assert_eq!(m.active().len(), 1);
        assert!(m.active()[0].trigger_time > now);

        // Second pass fires nothing new.
        assert!(m.check_due(now).is_empty());
        let drained = m.take_triggered();
        assert_eq!(drained.len(), 1);
        assert!(m.take_triggered().is_empty());
    }

    #[test]
    fn snooze_reactivates_the_last_triggered() {
        let (_dir, mut m) = manager();
        let now = Local::now();
        m.add_relative("break time", now, Duration::seconds(0), ReminderKind::Reminder);
        m.items[0].trigger_time = now - Duration::seconds(1);
        m.check_due(now);

        let reply = m
            .handle_command(&command(CommandKind::Snooze, "snooze"), now)
            .unwrap();
        assert_eq!(reply, "Snoozed for 5 minutes.");
        assert_eq!(m.active().len(), 1);
        assert!(m.active()[0].trigger_time > now);

        let err = m
            .handle_command(&command(CommandKind::Snooze, "snooze"), now)
            .unwrap_err();
        assert_eq!(err, "No reminder to snooze.");
    }
}
