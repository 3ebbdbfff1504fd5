pub mod command;
pub mod reminder;
pub mod schedule;
pub mod settings;
pub mod task;

pub use command::{CommandKind, CommandResult, ParsedCommand};
pub use reminder::{Reminder, ReminderKind, ReminderStatus};
pub use schedule::{Cadence, Schedule, ScheduleRun};
pub use settings::{
    DesktopSettings, LlmSettings, MemorySettings, PollingSettings, ServerSettings, Settings,
    VoiceSettings,
};
pub use task::{ActionOutcome, Task, TaskAction, TaskResult};

/// Opaque 8-char token, enough to address items by voice ("delete reminder
/// 1b9f02c4" never happens; the index paths exist for that).
pub fn short_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

#[cfg(test)]
mod tests {
    #[test]
    fn short_ids_are_eight_hex_chars() {
        let id = super::short_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, super::short_id());
    }
}
