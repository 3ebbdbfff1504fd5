//! Routes parsed commands to their handlers and falls back to the LLM for
//! anything the pattern table does not recognize. Every path ends in a
//! `CommandResult`; handler errors become `{success: false}`, never panics.

use crate::models::{CommandKind, CommandResult, ParsedCommand, Task};
use crate::parser::{timeparse, CommandParser};
use crate::reminders::ReminderManager;
use crate::scheduler::Scheduler;
use crate::services::{info, ConversationMemory, DesktopAction, DesktopControl, LlmClient, LlmError};
use crate::tasks::{self, TaskManager};
use chrono::{Local, Timelike};
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub const SOURCE_DESKTOP: &str = "desktop";
pub const SOURCE_INFO: &str = "info";
pub const SOURCE_REMINDERS: &str = "reminders";
pub const SOURCE_TASKS: &str = "tasks";
pub const SOURCE_SCHEDULER: &str = "scheduler";
pub const SOURCE_PATTERN: &str = "pattern";
pub const SOURCE_AI: &str = "ai";
pub const SOURCE_FALLBACK: &str = "fallback";

type Reply = Result<(String, Option<Value>), String>;

pub struct Dispatcher {
    parser: CommandParser,
    desktop: Arc<dyn DesktopControl>,
    llm: Option<LlmClient>,
    memory: Option<Arc<ConversationMemory>>,
    reminders: Arc<Mutex<ReminderManager>>,
    scheduler: Arc<Mutex<Scheduler>>,
    tasks: Arc<Mutex<TaskManager>>,
}

impl Dispatcher {
    pub fn new(
        desktop: Arc<dyn DesktopControl>,
        llm: Option<LlmClient>,
        memory: Option<Arc<ConversationMemory>>,
        reminders: Arc<Mutex<ReminderManager>>,
        scheduler: Arc<Mutex<Scheduler>>,
        tasks: Arc<Mutex<TaskManager>>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            parser: CommandParser::new()?,
            desktop,
            llm,
            memory,
            reminders,
            scheduler,
            tasks,
        })
    }

    pub async fn dispatch(&self, text: &str) -> CommandResult {
        let cmd = self.parser.parse(text);
        log::debug!("parsed '{}' as {}", text, cmd.kind.as_str());

        if cmd.kind == CommandKind::Unknown {
            return self.converse(text).await;
        }

        let action = cmd.kind.as_str();
        let (reply, source) = self.handle(&cmd).await;
        match reply {
            Ok((response, data)) => {
                let result = CommandResult::new(true, action, response, source);
                match data {
                    Some(data) => result.with_data(data),
                    None => result,
                }
            }
            Err(message) => CommandResult::new(false, action, message, source),
        }
    }

    async fn handle(&self, cmd: &ParsedCommand) -> (Reply, &'static str) {
        use CommandKind::*;
        match cmd.kind {
            OpenApp | CloseApp | SearchGoogle | SearchYoutube | OpenWebsite | OpenFolder
            | TakeScreenshot | MinimizeWindow | MaximizeWindow | CloseWindow | MinimizeAll
            | SwitchWindow | LockComputer | Shutdown | Restart | Sleep | VolumeUp
            | VolumeDown | Mute | Unmute | PlayPause | NextTrack | PreviousTrack | StopMedia
            | TypeText | PressKey | Copy | Paste | Undo | Redo | SelectAll | Save => {
                (self.handle_desktop(cmd), SOURCE_DESKTOP)
            }
            GetTime | GetDate | GetBattery | GetSystemInfo | ListRunningApps => {
                (self.handle_info(cmd), SOURCE_INFO)
            }
            SetReminder | SetTimer | SetAlarm | ListReminders | DeleteReminder
            | ClearReminders | Snooze => (self.handle_reminder(cmd), SOURCE_REMINDERS),
            RunTask | ListTasks => (self.handle_task(cmd).await, SOURCE_TASKS),
            ScheduleTask | ListSchedules | DeleteSchedule | ClearSchedules => {
                (self.handle_schedule(cmd), SOURCE_SCHEDULER)
            }
            Greeting | Help | Stop => (self.handle_conversational(cmd), SOURCE_PATTERN),
            Unknown => (Err("unreachable".to_string()), SOURCE_FALLBACK),
        }
    }

    fn handle_desktop(&self, cmd: &ParsedCommand) -> Reply {
        use CommandKind::*;

        // Shutdown and restart never act directly.
        match cmd.kind {
            Shutdown => {
                return Ok((
                    "I won't shut down without confirmation. Say 'confirm shutdown' to proceed."
                        .to_string(),
                    None,
                ))
            }
            Restart => {
                return Ok((
                    "I won't restart without confirmation. Say 'confirm restart' to proceed."
                        .to_string(),
                    None,
                ))
            }
            _ => {}
        }

        let missing = |what: &str| format!("I didn't catch the {}.", what);
        let action = match cmd.kind {
            OpenApp => DesktopAction::OpenApp(cmd.param("app_name").ok_or_else(|| missing("app name"))?),
            CloseApp => DesktopAction::CloseApp(cmd.param("app_name").ok_or_else(|| missing("app name"))?),
            SearchGoogle => DesktopAction::SearchGoogle(cmd.param("query").ok_or_else(|| missing("search query"))?),
            SearchYoutube => DesktopAction::SearchYoutube(cmd.param("query").ok_or_else(|| missing("search query"))?),
            OpenWebsite => DesktopAction::OpenWebsite(cmd.param("url").ok_or_else(|| missing("website"))?),
            OpenFolder => DesktopAction::OpenFolder(cmd.param("folder_name").ok_or_else(|| missing("folder name"))?),
            TakeScreenshot => DesktopAction::Screenshot,
            MinimizeWindow => DesktopAction::MinimizeWindow,
            MaximizeWindow => DesktopAction::MaximizeWindow,
            CloseWindow => DesktopAction::CloseWindow,
            MinimizeAll => DesktopAction::MinimizeAll,
            SwitchWindow => DesktopAction::SwitchWindow,
            LockComputer => DesktopAction::LockComputer,
            Sleep => DesktopAction::Sleep,
            VolumeUp => DesktopAction::VolumeUp,
            VolumeDown => DesktopAction::VolumeDown,
            Mute => DesktopAction::Mute,
            Unmute => DesktopAction::Unmute,
            PlayPause => DesktopAction::PlayPause,
            NextTrack => DesktopAction::NextTrack,
            PreviousTrack => DesktopAction::PreviousTrack,
            StopMedia => DesktopAction::StopMedia,
            TypeText => DesktopAction::TypeText(cmd.param("text").ok_or_else(|| missing("text"))?),
            PressKey => DesktopAction::PressKey(cmd.param("key").ok_or_else(|| missing("key"))?),
            Copy => DesktopAction::Copy,
            Paste => DesktopAction::Paste,
            Undo => DesktopAction::Undo,
            Redo => DesktopAction::Redo,
            SelectAll => DesktopAction::SelectAll,
            Save => DesktopAction::Save,
            _ => return Err("Command not implemented yet.".to_string()),
        };
        self.desktop.perform(action).map(|msg| (msg, None))
    }

    fn handle_info(&self, cmd: &ParsedCommand) -> Reply {
        match cmd.kind {
            CommandKind::GetTime => Ok((
                format!("The current time is {}", info::current_time()),
                None,
            )),
            CommandKind::GetDate => Ok((format!("Today is {}", info::current_date()), None)),
            CommandKind::GetBattery => Ok((info::battery_status(), None)),
            CommandKind::GetSystemInfo => {
                let (message, data) = info::system_info();
                Ok((message, Some(data)))
            }
            CommandKind::ListRunningApps => {
                let apps = info::running_apps();
                if apps.is_empty() {
                    Ok(("Could not get running apps.".to_string(), None))
                } else {
                    let shown: Vec<&str> = apps.iter().take(10).map(|s| s.as_str()).collect();
                    let suffix = if apps.len() > 10 { "..." } else { "" };
                    Ok((
                        format!("Running apps: {}{}", shown.join(", "), suffix),
                        Some(Value::from(apps)),
                    ))
                }
            }
            _ => Err("Command not implemented yet.".to_string()),
        }
    }

    fn handle_reminder(&self, cmd: &ParsedCommand) -> Reply {
        let mut reminders = self
            .reminders
            .lock()
            .map_err(|_| "Reminders are unavailable right now.".to_string())?;
        reminders
            .handle_command(cmd, Local::now())
            .map(|msg| (msg, None))
    }

    async fn handle_task(&self, cmd: &ParsedCommand) -> Reply {
        match cmd.kind {
            CommandKind::ListTasks => {
                let tasks = self
                    .tasks
                    .lock()
                    .map_err(|_| "Tasks are unavailable right now.".to_string())?;
                Ok((tasks.format_list(), None))
            }
            CommandKind::RunTask => {
                let name = cmd
                    .param("task")
                    .ok_or_else(|| "Which task should I run?".to_string())?;
                self.run_task_by_name(name).await
            }
            _ => Err("Command not implemented yet.".to_string()),
        }
    }

    pub async fn run_task_by_name(&self, name: &str) -> Reply {
        let task = {
            let tasks = self
                .tasks
                .lock()
                .map_err(|_| "Tasks are unavailable right now.".to_string())?;
            tasks.get_by_name(name).cloned()
        };
        let task = task.ok_or_else(|| format!("I don't know a task called '{}'.", name))?;
        self.execute(task).await
    }

    pub async fn run_task_by_id(&self, task_id: &str) -> Reply {
        let task = {
            let tasks = self
                .tasks
                .lock()
                .map_err(|_| "Tasks are unavailable right now.".to_string())?;
            tasks.get(task_id).cloned()
        };
        let task = task.ok_or_else(|| format!("No task with id '{}'.", task_id))?;
        self.execute(task).await
    }

    async fn execute(&self, task: Task) -> Reply {
        let desktop = self.desktop.clone();
        let task_id = task.id.clone();
        let task_name = task.name.clone();
        let result = tokio::task::spawn_blocking(move || tasks::execute_task(&task, desktop.as_ref()))
            .await
            .map_err(|e| format!("Task '{}' crashed: {}", task_name, e))?;

        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.record_run(&task_id);
        }

        let response = match &result.speak_text {
            Some(speech) => speech.clone(),
            None => format!("Task '{}' finished. {}", result.task_name, result.message),
        };
        let data = serde_json::to_value(&result).ok();
        Ok((response, data))
    }

    fn handle_schedule(&self, cmd: &ParsedCommand) -> Reply {
        let mut scheduler = self
            .scheduler
            .lock()
            .map_err(|_| "Schedules are unavailable right now.".to_string())?;
        match cmd.kind {
            CommandKind::ListSchedules => Ok((scheduler.format_list(), None)),
            CommandKind::ClearSchedules => {
                let count = scheduler.clear_all();
                Ok((format!("Cleared {} schedules.", count), None))
            }
            CommandKind::DeleteSchedule => {
                let index: usize = cmd
                    .param("index")
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| {
                        "Specify which schedule (e.g., 'delete schedule 1').".to_string()
                    })?;
                if scheduler.delete_by_index(index) {
                    Ok((format!("Deleted schedule {}.", index), None))
                } else {
                    Err(format!("Schedule {} not found.", index))
                }
            }
            CommandKind::ScheduleTask => {
                let spec = cmd
                    .param("spec")
                    .ok_or_else(|| "Tell me what to schedule.".to_string())?;
                let (cadence, offset) = timeparse::parse_cadence(spec).ok_or_else(|| {
                    "Tell me when to run it (e.g., 'schedule backup daily at 9am').".to_string()
                })?;
                let name = spec[..offset].trim().trim_end_matches("to run").trim();
                if name.is_empty() {
                    return Err("Tell me which task to schedule.".to_string());
                }
                let task = {
                    let tasks = self
                        .tasks
                        .lock()
                        .map_err(|_| "Tasks are unavailable right now.".to_string())?;
                    tasks.get_by_name(name).cloned()
                };
                let task =
                    task.ok_or_else(|| format!("I don't know a task called '{}'.", name))?;
                let schedule = scheduler.add_from_spec(&task.id, &task.name, &cadence);
                Ok((
                    format!("Scheduled '{}' - {}.", task.name, schedule.describe()),
                    None,
                ))
            }
            _ => Err("Command not implemented yet.".to_string()),
        }
    }

    fn handle_conversational(&self, cmd: &ParsedCommand) -> Reply {
        match cmd.kind {
            CommandKind::Greeting => {
                let hour = Local::now().hour();
                let greeting = if hour < 12 {
                    "Good morning"
                } else if hour < 18 {
                    "Good afternoon"
                } else {
                    "Good evening"
                };
                Ok((format!("{}! How can I help you?", greeting), None))
            }
            CommandKind::Help => Ok((help_message(), None)),
            CommandKind::Stop => Ok(("STOP_LISTENING".to_string(), None)),
            _ => Err("Command not implemented yet.".to_string()),
        }
    }

    /// LLM fallback for unmatched text: a cheap classification pass first
    /// (the model may recognize a task invocation), then open-ended chat.
    async fn converse(&self, text: &str) -> CommandResult {
        let Some(llm) = &self.llm else {
            return self.fallback(text);
        };

        if let Some(memory) = &self.memory {
            memory.learn_from(text);
        }

        let verdict = llm.classify_intent(text).await;
        if verdict.intent == "RUN_TASK" {
            if let Some(task_name) = verdict.task.as_deref().filter(|t| !t.is_empty()) {
                let known = {
                    match self.tasks.lock() {
                        Ok(tasks) => tasks.get_by_name(task_name).is_some(),
                        Err(_) => false,
                    }
                };
                if known {
                    return match self.run_task_by_name(task_name).await {
                        Ok((response, data)) => {
                            let result =
                                CommandResult::new(true, "run_task", response, SOURCE_AI);
                            match data {
                                Some(data) => result.with_data(data),
                                None => result,
                            }
                        }
                        Err(message) => {
                            CommandResult::new(false, "run_task", message, SOURCE_AI)
                        }
                    };
                }
            }
        }

        let context = self
            .memory
            .as_ref()
            .map(|m| m.build_context())
            .unwrap_or_default();
        match llm.chat(text, &context).await {
            Ok(reply) => {
                if let Some(memory) = &self.memory {
                    if let Err(e) = memory.record_exchange(text, &reply) {
                        log::warn!("could not record exchange: {}", e);
                    }
                }
                CommandResult::new(true, "chat", reply, SOURCE_AI)
            }
            Err(LlmError::Timeout) => CommandResult::new(
                false,
                "chat",
                "Sorry, I'm taking a bit longer than usual. Please try again.",
                SOURCE_AI,
            ),
            Err(LlmError::Connection) => self.fallback(text),
            Err(LlmError::Other(e)) => {
                log::warn!("llm error: {}", e);
                CommandResult::new(
                    false,
                    "chat",
                    "Something went wrong. Please try again.",
                    SOURCE_AI,
                )
            }
        }
    }

    fn fallback(&self, text: &str) -> CommandResult {
        CommandResult::new(
            false,
            "unknown",
            format!(
                "I heard: '{}'. Try asking for 'help' to see what I can do.",
                text
            ),
            SOURCE_FALLBACK,
        )
    }
}

pub(crate) fn help_message() -> String {
    [
        "Here's what I can do:",
        "",
        "APPS: \"Open Chrome\", \"Close Notepad\"",
        "SEARCH: \"Search Google for Rust\", \"YouTube cat videos\"",
        "WEB: \"Open github.com\"",
        "FILES: \"Show my downloads folder\"",
        "SCREENSHOT: \"Take a screenshot\"",
        "WINDOWS: \"Minimize window\", \"Switch window\"",
        "VOLUME: \"Volume up\", \"Mute\"",
        "MEDIA: \"Play\", \"Next track\"",
        "TYPE: \"Type hello world\"",
        "INFO: \"What time is it\", \"Battery level\", \"System info\"",
        "REMINDERS: \"Remind me to stretch in 30 minutes\", \"Set timer for 5 minutes\"",
        "TASKS: \"Run the morning routine task\", \"List my tasks\"",
        "SCHEDULES: \"Schedule backup daily at 9am\", \"Show my schedules\"",
        "",
        "Or just talk to me and I'll do my best to help.",
    ]
    .join("\n")
}
