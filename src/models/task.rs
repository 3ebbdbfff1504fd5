use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One step of a task. Tagged so the stored JSON stays readable:
/// `{"action": "open_app", "app": "chrome"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TaskAction {
    OpenApp { app: String },
    CloseApp { app: String },
    OpenWebsite { url: String },
    OpenFolder { folder: String },
    RunCommand { command: String },
    TypeText { text: String },
    Hotkey { keys: Vec<String> },
    Wait { seconds: u64 },
    Notify { message: String },
    Speak { text: String },
    Screenshot,
    Volume { level: String },
    MinimizeAll,
}

impl TaskAction {
    pub fn label(&self) -> &'static str {
        match self {
            TaskAction::OpenApp { .. } => "open_app",
            TaskAction::CloseApp { .. } => "close_app",
            TaskAction::OpenWebsite { .. } => "open_website",
            TaskAction::OpenFolder { .. } => "open_folder",
            TaskAction::RunCommand { .. } => "run_command",
            TaskAction::TypeText { .. } => "type_text",
            TaskAction::Hotkey { .. } => "hotkey",
            TaskAction::Wait { .. } => "wait",
            TaskAction::Notify { .. } => "notify",
            TaskAction::Speak { .. } => "speak",
            TaskAction::Screenshot => "screenshot",
            TaskAction::Volume { .. } => "volume",
            TaskAction::MinimizeAll => "minimize_all",
        }
    }
}

/// A named multi-step workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub actions: Vec<TaskAction>,
    pub enabled: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub icon: String,
    pub created_at: DateTime<Local>,
    #[serde(default)]
    pub last_run: Option<DateTime<Local>>,
    #[serde(default)]
    pub run_count: u32,
}

impl Task {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        category: &str,
        icon: &str,
        actions: Vec<TaskAction>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            actions,
            enabled: true,
            category: category.to_string(),
            icon: icon.to_string(),
            created_at: Local::now(),
            last_run: None,
            run_count: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: String,
    pub success: bool,
    pub message: String,
}

/// Result of one task execution; actions run best-effort, so individual
/// failures live in `action_results` while the task still completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub task_name: String,
    pub status: String,
    pub message: String,
    pub started_at: DateTime<Local>,
    pub completed_at: Option<DateTime<Local>>,
    pub action_results: Vec<ActionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speak_text: Option<String>,
}
