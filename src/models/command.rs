use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything the parser can recognize. `Unknown` is not an error: it routes
/// the text to the conversational fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    // Application control
    OpenApp,
    CloseApp,
    // Web
    SearchGoogle,
    SearchYoutube,
    OpenWebsite,
    // Files
    OpenFolder,
    TakeScreenshot,
    // Window control
    MinimizeWindow,
    MaximizeWindow,
    CloseWindow,
    MinimizeAll,
    SwitchWindow,
    // System control
    LockComputer,
    Shutdown,
    Restart,
    Sleep,
    // Volume
    VolumeUp,
    VolumeDown,
    Mute,
    Unmute,
    // Media
    PlayPause,
    NextTrack,
    PreviousTrack,
    StopMedia,
    // Keyboard
    TypeText,
    PressKey,
    Copy,
    Paste,
    Undo,
    Redo,
    SelectAll,
    Save,
    // Information
    GetTime,
    GetDate,
    GetBattery,
    GetSystemInfo,
    ListRunningApps,
    // Reminders
    SetReminder,
    SetTimer,
    SetAlarm,
    ListReminders,
    DeleteReminder,
    ClearReminders,
    Snooze,
    // Tasks and schedules
    RunTask,
    ListTasks,
    ScheduleTask,
    ListSchedules,
    DeleteSchedule,
    ClearSchedules,
    // Conversation
    Greeting,
    Help,
    Stop,
    Unknown,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::OpenApp => "open_app",
            CommandKind::CloseApp => "close_app",
            CommandKind::SearchGoogle => "search_google",
            CommandKind::SearchYoutube => "search_youtube",
            CommandKind::OpenWebsite => "open_website",
            CommandKind::OpenFolder => "open_folder",
            CommandKind::TakeScreenshot => "take_screenshot",
            CommandKind::MinimizeWindow => "minimize_window",
            CommandKind::MaximizeWindow => "maximize_window",
            CommandKind::CloseWindow => "close_window",
            CommandKind::MinimizeAll => "minimize_all",
            CommandKind::SwitchWindow => "switch_window",
            CommandKind::LockComputer => "lock_computer",
            CommandKind::Shutdown => "shutdown",
            CommandKind::Restart => "restart",
            CommandKind::Sleep => "sleep",
            CommandKind::VolumeUp => "volume_up",
            CommandKind::VolumeDown => "volume_down",
            CommandKind::Mute => "mute",
            CommandKind::Unmute => "unmute",
            CommandKind::PlayPause => "play_pause",
            CommandKind::NextTrack => "next_track",
            CommandKind::PreviousTrack => "previous_track",
            CommandKind::StopMedia => "stop_media",
            CommandKind::TypeText => "type_text",
            CommandKind::PressKey => "press_key",
            CommandKind::Copy => "copy",
            CommandKind::Paste => "paste",
            CommandKind::Undo => "undo",
            CommandKind::Redo => "redo",
            CommandKind::SelectAll => "select_all",
            CommandKind::Save => "save",
            CommandKind::GetTime => "get_time",
            CommandKind::GetDate => "get_date",
            CommandKind::GetBattery => "get_battery",
            CommandKind::GetSystemInfo => "get_system_info",
            CommandKind::ListRunningApps => "list_running_apps",
            CommandKind::SetReminder => "set_reminder",
            CommandKind::SetTimer => "set_timer",
            CommandKind::SetAlarm => "set_alarm",
            CommandKind::ListReminders => "list_reminders",
            CommandKind::DeleteReminder => "delete_reminder",
            CommandKind::ClearReminders => "clear_reminders",
            CommandKind::Snooze => "snooze",
            CommandKind::RunTask => "run_task",
            CommandKind::ListTasks => "list_tasks",
            CommandKind::ScheduleTask => "schedule_task",
            CommandKind::ListSchedules => "list_schedules",
            CommandKind::DeleteSchedule => "delete_schedule",
            CommandKind::ClearSchedules => "clear_schedules",
            CommandKind::Greeting => "greeting",
            CommandKind::Help => "help",
            CommandKind::Stop => "stop",
            CommandKind::Unknown => "unknown",
        }
    }
}

/// Output of the parser: the matched kind plus any captured parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub kind: CommandKind,
    pub params: HashMap<String, String>,
    pub original_text: String,
    pub confidence: f32,
}

impl ParsedCommand {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }
}

/// Uniform result returned by the dispatcher for every command, whatever
/// handled it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub action: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub source: String,
    pub timestamp: String,
}

impl CommandResult {
    pub fn new(
        success: bool,
        action: impl Into<String>,
        response: impl Into<String>,
        source: &str,
    ) -> Self {
        Self {
            success,
            action: action.into(),
            response: response.into(),
            data: None,
            source: source.to_string(),
            timestamp: Local::now().to_rfc3339(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
