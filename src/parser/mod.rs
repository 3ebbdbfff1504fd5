//! Regex-cascade command classification: first pattern that matches wins,
//! so the table order in [`lexicon`] is load-bearing.

pub mod lexicon;
pub mod timeparse;

use crate::models::{CommandKind, ParsedCommand};
use regex::Regex;
use std::collections::HashMap;

pub struct CommandParser {
    patterns: Vec<(Regex, CommandKind, Option<&'static str>)>,
    fillers: Regex,
}

impl CommandParser {
    pub fn new() -> Result<Self, regex::Error> {
        let mut patterns = Vec::with_capacity(lexicon::PATTERNS.len());
        for (pattern, kind, param) in lexicon::PATTERNS {
            patterns.push((Regex::new(pattern)?, *kind, *param));
        }
        let fillers = Regex::new(
            r"\b(?:i want you to|i need you to|could you|would you|can you|you know|please|um|uh|like)\b",
        )?;
        Ok(Self { patterns, fillers })
    }

    /// Lowercase, strip filler phrases, collapse whitespace.
    fn normalize(&self, text: &str) -> String {
        let lowered = text.trim().to_lowercase();
        let stripped = self.fillers.replace_all(&lowered, " ");
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn parse(&self, text: &str) -> ParsedCommand {
        let cleaned = self.normalize(text);
        for (regex, kind, param) in &self.patterns {
            let Some(caps) = regex.captures(&cleaned) else {
                continue;
            };
            let mut params = HashMap::new();
            if let Some(name) = param {
                if let Some(m) = caps.get(1) {
                    let raw = m.as_str();
                    let value = match *name {
                        "app_name" => lexicon::correct_app_name(raw),
                        "folder_name" => lexicon::correct_folder_name(raw),
                        "query" => lexicon::clean_query(raw),
                        _ => raw.trim().to_string(),
                    };
                    if !value.is_empty() {
                        params.insert((*name).to_string(), value);
                    }
                }
            }
            return ParsedCommand {
                kind: *kind,
                params,
                original_text: cleaned,
                confidence: 0.9,
            };
        }
        ParsedCommand {
            kind: CommandKind::Unknown,
            params: HashMap::new(),
            original_text: cleaned,
            confidence: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CommandParser {
        CommandParser::new().unwrap()
    }

    fn kind_of(text: &str) -> CommandKind {
        parser().parse(text).kind
    }

    #[test]
    fn open_app_with_alias_correction() {
        let cmd = parser().parse("open vs code");
        assert_eq!(cmd.kind, CommandKind::OpenApp);
        assert_eq!(cmd.param("app_name"), Some("vscode"));
    }

    #[test]
    fn compound_open_keeps_app_via_partial_alias() {
        let cmd = parser().parse("open chrome and tell me the time");
        assert_eq!(cmd.kind, CommandKind::OpenApp);
        assert_eq!(cmd.param("app_name"), Some("chrome"));
    }

    #[test]
    fn filler_phrases_are_stripped() {
        let cmd = parser().parse("could you please open chrome");
        assert_eq!(cmd.kind, CommandKind::OpenApp);
        assert_eq!(cmd.param("app_name"), Some("chrome"));
        assert_eq!(cmd.original_text, "open chrome");
    }

    #[test]
    fn reminder_phrasings_beat_the_open_wildcard() {
        assert_eq!(kind_of("set a reminder to stretch"), CommandKind::SetReminder);
        assert_eq!(kind_of("set timer for 5 minutes"), CommandKind::SetTimer);
        assert_eq!(kind_of("wake me up at 7am"), CommandKind::SetAlarm);
        assert_eq!(kind_of("show my reminders"), CommandKind::ListReminders);
        assert_eq!(kind_of("clear all reminders"), CommandKind::ClearReminders);
    }

    #[test]
    fn task_phrasings_beat_the_open_wildcard() {
        assert_eq!(kind_of("run the morning routine task"), CommandKind::RunTask);
        assert_eq!(kind_of("start task backup"), CommandKind::RunTask);
        assert_eq!(kind_of("schedule backup daily at 9am"), CommandKind::ScheduleTask);
        assert_eq!(kind_of("list my tasks"), CommandKind::ListTasks);
        assert_eq!(kind_of("what's scheduled"), CommandKind::ListSchedules);
    }

    #[test]
    fn run_task_captures_the_name() {
        let cmd = parser().parse("run the morning routine task");
        assert_eq!(cmd.param("task"), Some("morning routine"));
    }

    #[test]
    fn desktop_patterns() {
        assert_eq!(kind_of("take a screenshot"), CommandKind::TakeScreenshot);
        assert_eq!(kind_of("volume up"), CommandKind::VolumeUp);
        assert_eq!(kind_of("mute"), CommandKind::Mute);
        assert_eq!(kind_of("next song"), CommandKind::NextTrack);
        assert_eq!(kind_of("minimize all"), CommandKind::MinimizeAll);
        assert_eq!(kind_of("lock the computer"), CommandKind::LockComputer);
        assert_eq!(kind_of("shut down the pc"), CommandKind::Shutdown);
    }

    // The table order is part of the contract: the earlier wildcard wins
    // even when a later pattern would describe the phrase better.
    #[test]
    fn table_order_resolves_overlaps() {
        // "stop" is a close-app verb, so the close wildcard claims the
        // phrase and the alias table maps "music" to spotify.
        let cmd = parser().parse("stop the music");
        assert_eq!(cmd.kind, CommandKind::CloseApp);
        assert_eq!(cmd.param("app_name"), Some("spotify"));

        // The mute pattern finds its substring inside "unmute".
        assert_eq!(kind_of("unmute the sound"), CommandKind::Mute);

        // "show desktop" hits the folder pattern before minimize-all.
        let cmd = parser().parse("show desktop");
        assert_eq!(cmd.kind, CommandKind::OpenFolder);
        assert_eq!(cmd.param("folder_name"), Some("desktop"));
    }

    #[test]
    fn folder_and_web() {
        let cmd = parser().parse("show my download folder");
        assert_eq!(cmd.kind, CommandKind::OpenFolder);
        assert_eq!(cmd.param("folder_name"), Some("downloads"));

        let cmd = parser().parse("go to github.com");
        assert_eq!(cmd.kind, CommandKind::OpenWebsite);
        assert_eq!(cmd.param("url"), Some("github.com"));

        let cmd = parser().parse("search for rust tutorials");
        assert_eq!(cmd.kind, CommandKind::SearchGoogle);
        assert_eq!(cmd.param("query"), Some("rust tutorials"));
    }

    #[test]
    fn info_queries() {
        assert_eq!(kind_of("what time is it"), CommandKind::GetTime);
        assert_eq!(kind_of("what's the date today"), CommandKind::GetDate);
        assert_eq!(kind_of("battery level"), CommandKind::GetBattery);
        assert_eq!(kind_of("system info"), CommandKind::GetSystemInfo);
        assert_eq!(kind_of("what apps are running"), CommandKind::ListRunningApps);
    }

    #[test]
    fn greeting_is_anchored() {
        assert_eq!(kind_of("hello"), CommandKind::Greeting);
        assert_eq!(kind_of("good morning"), CommandKind::Greeting);
        // "hello" embedded in a longer sentence is not a greeting.
        assert_ne!(kind_of("say hello to everyone"), CommandKind::Greeting);
    }

    #[test]
    fn stop_and_help() {
        assert_eq!(kind_of("stop"), CommandKind::Stop);
        assert_eq!(kind_of("goodbye"), CommandKind::Stop);
        assert_eq!(kind_of("what can you do"), CommandKind::Help);
    }

    #[test]
    fn unmatched_text_is_unknown() {
        let cmd = parser().parse("xyzzy plugh");
        assert_eq!(cmd.kind, CommandKind::Unknown);
        assert_eq!(cmd.confidence, 0.0);
    }
}
