//! Recurring task schedules: JSON-backed rules, a 30-second poller that
//! executes due tasks, and a capped in-memory run log.

use crate::models::{Cadence, Schedule, ScheduleRun};
use crate::parser::timeparse::CadenceSpec;
use crate::services::DesktopControl;
use crate::store::JsonStore;
use crate::tasks::{self, TaskManager};
use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const RUN_LOG_CAP: usize = 100;

pub struct Scheduler {
    store: JsonStore,
    schedules: Vec<Schedule>,
    run_log: Vec<ScheduleRun>,
}

impl Scheduler {
    pub fn new(store: JsonStore) -> Self {
        let mut schedules: Vec<Schedule> = store.load();
        // Stored next_run values may be stale after downtime.
        let now = Local::now();
        for schedule in &mut schedules {
            if schedule.enabled && schedule.cadence != Cadence::Once {
                schedule.next_run = schedule.next_occurrence(now);
            }
        }
        log::info!("scheduler loaded ({} schedules)", schedules.len());
        Self {
            store,
            schedules,
            run_log: Vec::new(),
        }
    }

    fn save(&self) {
        if let Err(e) = self.store.save(&self.schedules) {
            log::warn!("could not save schedules: {}", e);
        }
    }

    pub fn all(&self) -> &[Schedule] {
        &self.schedules
    }

    pub fn get(&self, id: &str) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.id == id)
    }

    pub fn add(&mut self, mut schedule: Schedule) -> Schedule {
        let now = Local::now();
        if schedule.next_run.is_none() {
            schedule.next_run = schedule.next_occurrence(now);
        }
        let copy = schedule.clone();
        self.schedules.push(schedule);
        self.save();
        copy
    }

    /// Build a schedule from a parsed cadence phrase.
    pub fn add_from_spec(&mut self, task_id: &str, task_name: &str, spec: &CadenceSpec) -> Schedule {
        let schedule = match spec {
            CadenceSpec::Daily { hour, minute } => {
                Schedule::daily(task_id, task_name, *hour, *minute)
            }
            CadenceSpec::Interval { minutes } if minutes % 60 == 0 => {
                let mut s = Schedule::interval(task_id, task_name, *minutes);
                s.cadence = Cadence::Hourly;
                s
            }
            CadenceSpec::Interval { minutes } => Schedule::interval(task_id, task_name, *minutes),
            CadenceSpec::Weekly { days, hour, minute } => {
                Schedule::weekly(task_id, task_name, days.clone(), *hour, *minute)
            }
        };
        self.add(schedule)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.schedules.len();
        self.schedules.retain(|s| s.id != id);
        let removed = self.schedules.len() != before;
        if removed {
            self.save();
        }
        removed
    }

    /// 1-based index into the list as `format_list` shows it.
    pub fn delete_by_index(&mut self, index: usize) -> bool {
        match self.schedules.get(index.wrapping_sub(1)) {
            Some(s) => {
                let id = s.id.clone();
                self.delete(&id)
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self) -> usize {
        let count = self.schedules.len();
        self.schedules.clear();
        self.save();
        count
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        let now = Local::now();
        let Some(schedule) = self.schedules.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        schedule.enabled = enabled;
        if enabled {
            schedule.next_run = schedule.next_occurrence(now);
        }
        self.save();
        true
    }

    /// Ids of everything due, collected under the lock so execution can
    /// happen outside it.
    pub fn due_entries(&self, now: DateTime<Local>) -> Vec<(String, String)> {
        self.schedules
            .iter()
            .filter(|s| s.is_due(now))
            .map(|s| (s.id.clone(), s.task_id.clone()))
            .collect()
    }

    /// Bookkeeping after an execution attempt. Counters and the next run
    /// advance whether the task succeeded or not; `once` schedules disable
    /// themselves.
    pub fn record_run(
        &mut self,
        schedule_id: &str,
        now: DateTime<Local>,
        status: &str,
        message: &str,
    ) {
        let Some(schedule) = self.schedules.iter_mut().find(|s| s.id == schedule_id) else {
            return;
        };
        schedule.last_run = Some(now);
        schedule.run_count += 1;
        if schedule.cadence == Cadence::Once {
            schedule.enabled = false;
            schedule.next_run = None;
        } else {
            schedule.next_run = schedule.next_occurrence(now);
        }
        self.run_log.push(ScheduleRun {
            schedule_id: schedule_id.to_string(),
            task_id: schedule.task_id.clone(),
            executed_at: now,
            status: status.to_string(),
            message: message.to_string(),
        });
        if self.run_log.len() > RUN_LOG_CAP {
            let excess = self.run_log.len() - RUN_LOG_CAP;
            self.run_log.drain(..excess);
        }
        self.save();
    }

    pub fn run_log(&self) -> &[ScheduleRun] {
        &self.run_log
    }

    pub fn format_list(&self) -> String {
        if self.schedules.is_empty() {
            return "No schedules set.".to_string();
        }
        let mut lines = vec![format!(
            "You have {} schedule{}:",
            self.schedules.len(),
            if self.schedules.len() != 1 { "s" } else { "" }
        )];
        for (i, s) in self.schedules.iter().enumerate() {
            let state = if s.enabled { "" } else { " (disabled)" };
            lines.push(format!("{}. {} - {}{}", i + 1, s.task_name, s.describe(), state));
            if let Some(next) = s.next_run {
                lines.push(format!("   next run {}", next.format("%b %d, %I:%M %p")));
            }
        }
        lines.join("\n")
    }
}

/// Background loop executing due schedules every `interval_secs`. The
/// schedule lock is released while the task runs.
pub fn spawn_poller(
    scheduler: Arc<Mutex<Scheduler>>,
    task_manager: Arc<Mutex<TaskManager>>,
    desktop: Arc<dyn DesktopControl>,
    interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Local::now();
                    let due = match scheduler.lock() {
                        Ok(guard) => guard.due_entries(now),
                        Err(_) => {
                            log::error!("scheduler lock poisoned, stopping poller");
                            break;
                        }
                    };
                    for (schedule_id, task_id) in due {
                        run_one(&scheduler, &task_manager, desktop.clone(), &schedule_id, &task_id).await;
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

async fn run_one(
    scheduler: &Arc<Mutex<Scheduler>>,
    task_manager: &Arc<Mutex<TaskManager>>,
    desktop: Arc<dyn DesktopControl>,
    schedule_id: &str,
    task_id: &str,
) {
    let task = match task_manager.lock() {
        Ok(guard) => guard.get(task_id).cloned(),
        Err(_) => None,
    };

    let (status, message) = match task {
        Some(task) => {
            let task_name = task.name.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                tasks::execute_task(&task, desktop.as_ref())
            })
            .await;
            match outcome {
                Ok(result) => {
                    if let Ok(mut guard) = task_manager.lock() {
                        guard.record_run(task_id);
                    }
                    log::info!("schedule ran task {}: {}", task_name, result.message);
                    ("completed".to_string(), result.message)
                }
                Err(e) => ("failed".to_string(), format!("task panicked: {}", e)),
            }
        }
        None => (
            "failed".to_string(),
            format!("task {} no longer exists", task_id),
        ),
    };

    if let Ok(mut guard) = scheduler.lock() {
        guard.record_run(schedule_id, Local::now(), &status, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn scheduler() -> (tempfile::TempDir, Scheduler) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("schedules.json"));
        (dir, Scheduler::new(store))
    }

    #[test]
    fn once_schedule_disables_after_running() {
        let (_dir, mut s) = scheduler();
        let now = Local::now();
        let added = s.add(Schedule::once("t1", "Test", now - Duration::seconds(1)));

        let due = s.due_entries(now);
        assert_eq!(due.len(), 1);
        s.record_run(&added.id, now, "completed", "ok");

        let stored = s.get(&added.id).unwrap();
        assert!(!stored.enabled);
        assert!(stored.next_run.is_none());
        assert_eq!(stored.run_count, 1);
        assert!(s.due_entries(now).is_empty());
    }

    #[test]
    fn failures_still_advance_bookkeeping() {
        let (_dir, mut s) = scheduler();
        let now = Local::now();
        let added = s.add(Schedule::interval("t1", "Test", 15));
        s.record_run(&added.id, now, "failed", "task exploded");

        let stored = s.get(&added.id).unwrap();
        assert_eq!(stored.run_count, 1);
        assert!(stored.last_run.is_some());
        assert!(stored.next_run.unwrap() > now);
        assert_eq!(s.run_log().len(), 1);
        assert_eq!(s.run_log()[0].status, "failed");
    }

    #[test]
    fn cadence_specs_map_to_schedule_types() {
        let (_dir, mut s) = scheduler();
        let daily = s.add_from_spec("t1", "Test", &CadenceSpec::Daily { hour: 9, minute: 0 });
        assert_eq!(daily.cadence, Cadence::Daily);
        assert_eq!(daily.time.as_deref(), Some("09:00"));

        let hourly = s.add_from_spec("t1", "Test", &CadenceSpec::Interval { minutes: 120 });
        assert_eq!(hourly.cadence, Cadence::Hourly);

        let interval = s.add_from_spec("t1", "Test", &CadenceSpec::Interval { minutes: 45 });
        assert_eq!(interval.cadence, Cadence::Interval);

        let weekly = s.add_from_spec(
            "t1",
            "Test",
            &CadenceSpec::Weekly { days: vec![0, 1, 2, 3, 4], hour: 8, minute: 0 },
        );
        assert_eq!(weekly.cadence, Cadence::Weekly);
        assert_eq!(weekly.days, vec![0, 1, 2, 3, 4]);
        assert!(weekly.next_run.is_some());
    }

    #[test]
    fn disabled_schedules_are_never_due() {
        let (_dir, mut s) = scheduler();
        let now = Local::now();
        let added = s.add(Schedule::once("t1", "Test", now - Duration::seconds(1)));
        assert!(s.set_enabled(&added.id, false));
        assert!(s.due_entries(now).is_empty());
    }

    #[test]
    fn run_log_is_capped() {
        let (_dir, mut s) = scheduler();
        let now = Local::now();
        let added = s.add(Schedule::interval("t1", "Test", 15));
        for _ in 0..(RUN_LOG_CAP + 20) {
            s.record_run(&added.id, now, "completed", "ok");
        }
        assert_eq!(s.run_log().len(), RUN_LOG_CAP);
    }
}
