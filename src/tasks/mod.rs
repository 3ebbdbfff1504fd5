//! Named multi-step tasks: a JSON-backed catalog seeded with defaults and a
//! best-effort executor. Individual action failures are recorded, never
//! fatal, so a half-working desktop still completes the rest of the task.

use crate::models::{ActionOutcome, Task, TaskAction, TaskResult};
use crate::services::{DesktopAction, DesktopControl};
use crate::store::JsonStore;
use chrono::Local;

pub struct TaskManager {
    store: JsonStore,
    tasks: Vec<Task>,
}

impl TaskManager {
    pub fn new(store: JsonStore) -> Self {
        let mut tasks: Vec<Task> = store.load();
        if tasks.is_empty() {
            tasks = default_catalog();
            if let Err(e) = store.save(&tasks) {
                log::warn!("could not save default tasks: {}", e);
            }
        }
        log::info!("task catalog loaded ({} tasks)", tasks.len());
        Self { store, tasks }
    }

    fn save(&self) {
        if let Err(e) = self.store.save(&self.tasks) {
            log::warn!("could not save tasks: {}", e);
        }
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Exact name match first, then substring against name or id.
    pub fn get_by_name(&self, name: &str) -> Option<&Task> {
        let lowered = name.trim().to_lowercase();
        if let Some(task) = self
            .tasks
            .iter()
            .find(|t| t.name.to_lowercase() == lowered)
        {
            return Some(task);
        }
        self.tasks.iter().find(|t| {
            t.name.to_lowercase().contains(&lowered) || t.id.to_lowercase().contains(&lowered)
        })
    }

    pub fn add(&mut self, task: Task) -> bool {
        if self.tasks.iter().any(|t| t.id == task.id) {
            return false;
        }
        self.tasks.push(task);
        self.save();
        true
    }

    pub fn delete(&mut self, task_id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != task_id);
        let removed = self.tasks.len() != before;
        if removed {
            self.save();
        }
        removed
    }

    pub fn record_run(&mut self, task_id: &str) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            task.last_run = Some(Local::now());
            task.run_count += 1;
            self.save();
        }
    }

    pub fn format_list(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks defined.".to_string();
        }
        let mut lines = vec![format!("Available tasks ({}):", self.tasks.len())];
        for (i, task) in self.tasks.iter().enumerate() {
            lines.push(format!("{}. {} - {}", i + 1, task.name, task.description));
        }
        lines.join("\n")
    }
}

/// Run every action of `task`. Blocking (waits sleep the thread); async
/// callers wrap this in `spawn_blocking`.
pub fn execute_task(task: &Task, desktop: &dyn DesktopControl) -> TaskResult {
    log::info!("running task: {}", task.name);
    let started_at = Local::now();
    let mut action_results = Vec::new();
    let mut speak_messages = Vec::new();

    for action in &task.actions {
        let outcome = match run_action(action, desktop) {
            Ok(message) => {
                if let TaskAction::Speak { text } = action {
                    speak_messages.push(text.clone());
                }
                ActionOutcome {
                    action: action.label().to_string(),
                    success: true,
                    message,
                }
            }
            Err(error) => {
                log::warn!("action {} failed: {}", action.label(), error);
                ActionOutcome {
                    action: action.label().to_string(),
                    success: false,
                    message: error,
                }
            }
        };
        action_results.push(outcome);
    }

    TaskResult {
        task_id: task.id.clone(),
        task_name: task.name.clone(),
        status: "completed".to_string(),
        message: format!("Completed {} actions", task.actions.len()),
        started_at,
        completed_at: Some(Local::now()),
        action_results,
        speak_text: if speak_messages.is_empty() {
            None
        } else {
            Some(speak_messages.join(" "))
        },
    }
}

fn run_action(action: &TaskAction, desktop: &dyn DesktopControl) -> Result<String, String> {
    match action {
        TaskAction::OpenApp { app } => desktop.perform(DesktopAction::OpenApp(app)),
        TaskAction::CloseApp { app } => desktop.perform(DesktopAction::CloseApp(app)),
        TaskAction::OpenWebsite { url } => desktop.perform(DesktopAction::OpenWebsite(url)),
        TaskAction::OpenFolder { folder } => desktop.perform(DesktopAction::OpenFolder(folder)),
        TaskAction::RunCommand { command } => desktop.perform(DesktopAction::RunCommand(command)),
        TaskAction::TypeText { text } => desktop.perform(DesktopAction::TypeText(text)),
        TaskAction::Hotkey { keys } => {
            let combo = keys.join("+");
            desktop.perform(DesktopAction::PressKey(&combo))
        }
        TaskAction::Wait { seconds } => {
            std::thread::sleep(std::time::Duration::from_secs(*seconds));
            Ok(format!("Waited {}s", seconds))
        }
        TaskAction::Notify { message } => desktop.perform(DesktopAction::Notify(message)),
        TaskAction::Speak { text } => Ok(text.clone()),
        TaskAction::Screenshot => desktop.perform(DesktopAction::Screenshot),
        TaskAction::Volume { level } => {
            let action = match level.as_str() {
                "up" => DesktopAction::VolumeUp,
                "down" => DesktopAction::VolumeDown,
                "mute" => DesktopAction::Mute,
                "unmute" => DesktopAction::Unmute,
                other => return Err(format!("Unknown volume level: {}", other)),
            };
            desktop.perform(action)
        }
        TaskAction::MinimizeAll => desktop.perform(DesktopAction::MinimizeAll),
    }
}

fn default_catalog() -> Vec<Task> {
    let lock_command = if cfg!(target_os = "windows") {
        "rundll32.exe user32.dll,LockWorkStation"
    } else if cfg!(target_os = "macos") {
        "pmset displaysleepnow"
    } else {
        "loginctl lock-session"
    };

    vec![
        Task::new(
            "morning_routine",
            "Morning Routine",
            "Start your workday - opens browser, email, and work apps",
            "routine",
            "🌅",
            vec![
                TaskAction::Speak {
                    text: "Good morning! Starting your morning routine.".to_string(),
                },
                TaskAction::OpenApp { app: "chrome".to_string() },
                TaskAction::Wait { seconds: 2 },
                TaskAction::OpenWebsite { url: "https://mail.google.com".to_string() },
                TaskAction::Wait { seconds: 1 },
                TaskAction::OpenApp { app: "vscode".to_string() },
                TaskAction::Speak {
                    text: "Morning routine complete. Have a productive day!".to_string(),
                },
            ],
        ),
        Task::new(
            "work_apps",
            "Open Work Apps",
            "Opens all your work applications",
            "work",
            "💼",
            vec![
                TaskAction::OpenApp { app: "chrome".to_string() },
                TaskAction::Wait { seconds: 1 },
                TaskAction::OpenApp { app: "vscode".to_string() },
                TaskAction::Wait { seconds: 1 },
                TaskAction::OpenApp { app: "outlook".to_string() },
                TaskAction::Notify { message: "Work apps ready!".to_string() },
            ],
        ),
        Task::new(
            "close_work_apps",
            "Close Work Apps",
            "Closes work applications",
            "work",
            "🚪",
            vec![
                TaskAction::Speak { text: "Closing work applications".to_string() },
                TaskAction::CloseApp { app: "chrome".to_string() },
                TaskAction::CloseApp { app: "vscode".to_string() },
                TaskAction::CloseApp { app: "outlook".to_string() },
                TaskAction::Speak { text: "Work apps closed!".to_string() },
            ],
        ),
        Task::new(
            "take_screenshot",
            "Take Screenshot",
            "Captures current screen",
            "utility",
            "📸",
            vec![
                TaskAction::Screenshot,
                TaskAction::Notify { message: "Screenshot saved!".to_string() },
            ],
        ),
        Task::new(
            "lock_pc",
            "Lock Computer",
            "Locks your computer",
            "system",
            "🔒",
            vec![
                TaskAction::Speak { text: "Locking computer".to_string() },
                TaskAction::Wait { seconds: 1 },
                TaskAction::RunCommand { command: lock_command.to_string() },
            ],
        ),
        Task::new(
            "break_reminder",
            "Break Reminder",
            "Reminds you to take a break",
            "health",
            "☕",
            vec![
                TaskAction::Notify {
                    message: "Time for a break! Stand up and stretch.".to_string(),
                },
                TaskAction::Speak {
                    text: "Hey! Time for a break. Stand up and stretch!".to_string(),
                },
            ],
        ),
        Task::new(
            "end_of_day",
            "End of Day",
            "Wraps up your workday",
            "routine",
            "🌙",
            vec![
                TaskAction::Speak { text: "Wrapping up for the day".to_string() },
                TaskAction::Screenshot,
                TaskAction::CloseApp { app: "chrome".to_string() },
                TaskAction::CloseApp { app: "vscode".to_string() },
                TaskAction::Wait { seconds: 2 },
                TaskAction::Speak { text: "All done! Have a great evening!".to_string() },
            ],
        ),
        Task::new(
            "focus_mode",
            "Focus Mode",
            "Minimizes distractions",
            "productivity",
            "🎯",
            vec![
                TaskAction::Speak { text: "Entering focus mode".to_string() },
                TaskAction::CloseApp { app: "discord".to_string() },
                TaskAction::CloseApp { app: "telegram".to_string() },
                TaskAction::CloseApp { app: "whatsapp".to_string() },
                TaskAction::Volume { level: "mute".to_string() },
                TaskAction::Notify { message: "Focus mode active!".to_string() },
            ],
        ),
        Task::new(
            "show_desktop",
            "Show Desktop",
            "Minimizes all windows",
            "utility",
            "🖥️",
            vec![TaskAction::MinimizeAll],
        ),
        Task::new(
            "check_email",
            "Check Email",
            "Opens Gmail",
            "communication",
            "📧",
            vec![
                TaskAction::OpenApp { app: "chrome".to_string() },
                TaskAction::Wait { seconds: 2 },
                TaskAction::OpenWebsite { url: "https://mail.google.com".to_string() },
            ],
        ),
        Task::new(
            "open_youtube",
            "Open YouTube",
            "Opens YouTube",
            "entertainment",
            "▶️",
            vec![
                TaskAction::OpenApp { app: "chrome".to_string() },
                TaskAction::Wait { seconds: 2 },
                TaskAction::OpenWebsite { url: "https://youtube.com".to_string() },
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::DisabledDesktop;

    fn manager() -> (tempfile::TempDir, TaskManager) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("tasks.json"));
        (dir, TaskManager::new(store))
    }

    #[test]
    fn defaults_are_seeded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let count = TaskManager::new(JsonStore::new(&path)).all().len();
        assert!(count > 0);
        // Second load reads the stored catalog instead of reseeding.
        let again = TaskManager::new(JsonStore::new(&path));
        assert_eq!(again.all().len(), count);
    }

    #[test]
    fn lookup_by_name_is_fuzzy() {
        let (_dir, m) = manager();
        assert_eq!(m.get_by_name("Morning Routine").unwrap().id, "morning_routine");
        assert_eq!(m.get_by_name("morning").unwrap().id, "morning_routine");
        assert_eq!(m.get_by_name("focus").unwrap().id, "focus_mode");
        assert!(m.get_by_name("no such thing").is_none());
    }

    #[test]
    fn execution_is_best_effort_and_collects_speech() {
        let (_dir, m) = manager();
        let task = m.get("break_reminder").unwrap();
        let result = execute_task(task, &DisabledDesktop);

        // Notify fails against the disabled desktop, speak still works.
        assert_eq!(result.status, "completed");
        assert_eq!(result.action_results.len(), 2);
        assert!(!result.action_results[0].success);
        assert!(result.action_results[1].success);
        assert!(result.speak_text.unwrap().contains("Time for a break"));
    }

    #[test]
    fn run_counters_advance() {
        let (_dir, mut m) = manager();
        m.record_run("show_desktop");
        m.record_run("show_desktop");
        let task = m.get("show_desktop").unwrap();
        assert_eq!(task.run_count, 2);
        assert!(task.last_run.is_some());
    }
}
