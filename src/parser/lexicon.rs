//! The ordered pattern table and the alias-correction tables.
//!
//! The table is scanned top to bottom and the first match wins, so the order
//! is part of the contract: reminder and task phrasings come before the
//! broad open/close wildcards that would otherwise swallow them, desktop
//! actions come before informational queries, and the anchored greeting /
//! help / stop patterns close the table.

use crate::models::CommandKind;

pub(crate) type PatternSpec = (&'static str, CommandKind, Option<&'static str>);

pub(crate) const PATTERNS: &[PatternSpec] = &[
    // ── Reminders / timers / alarms ──
    (
        r"(?:show|list)\s+(?:me\s+)?(?:my\s+|all\s+)?reminders?",
        CommandKind::ListReminders,
        None,
    ),
    (r"what\s+reminders?", CommandKind::ListReminders, None),
    (
        r"(?:delete|cancel|remove|clear)\s+all\s+(?:my\s+)?reminders?",
        CommandKind::ClearReminders,
        None,
    ),
    (r"clear\s+(?:my\s+)?reminders?", CommandKind::ClearReminders, None),
    (
        r"(?:delete|cancel|remove)\s+reminder\s*(\d*)",
        CommandKind::DeleteReminder,
        Some("index"),
    ),
    (
        r"snooze(?:\s+(?:for\s+)?(\d+)\s*min(?:ute)?s?)?",
        CommandKind::Snooze,
        Some("minutes"),
    ),
    (r"\btimer\b", CommandKind::SetTimer, None),
    (r"\balarm\b|wake\s+me\s+up", CommandKind::SetAlarm, None),
    (
        r"remind\s+me|set\s+(?:a\s+)?reminder|don'?t\s+(?:let\s+me\s+)?forget",
        CommandKind::SetReminder,
        None,
    ),
    // ── Tasks and schedules ──
    (
        r"(?:show|list)\s+(?:me\s+)?(?:my\s+|all\s+)?tasks?\b",
        CommandKind::ListTasks,
        None,
    ),
    (
        r"what\s+tasks?\s+(?:do\s+you\s+know|are\s+there|can\s+you\s+run)",
        CommandKind::ListTasks,
        None,
    ),
    (
        r"(?:show|list)\s+(?:me\s+)?(?:my\s+|all\s+)?(?:schedules?|scheduled\s+tasks?)\b",
        CommandKind::ListSchedules,
        None,
    ),
    (r"what(?:'s|\s+is)\s+scheduled", CommandKind::ListSchedules, None),
    (
        r"(?:delete|cancel|remove|clear)\s+all\s+(?:my\s+)?schedules?",
        CommandKind::ClearSchedules,
        None,
    ),
    (r"clear\s+(?:my\s+)?schedules?", CommandKind::ClearSchedules, None),
    (
        r"(?:delete|cancel|remove)\s+schedule\s*(\d*)",
        CommandKind::DeleteSchedule,
        Some("index"),
    ),
    (
        r"(?:run|execute|start)\s+(?:the\s+)?task\s+(.+)$",
        CommandKind::RunTask,
        Some("task"),
    ),
    (
        r"run\s+(?:the\s+|my\s+)?(.+?)\s+(?:task|routine)$",
        CommandKind::RunTask,
        Some("task"),
    ),
    (r"^schedule\s+(?:task\s+)?(.+)$", CommandKind::ScheduleTask, Some("spec")),
    // ── Desktop: apps ──
    (
        r"(?:open|launch|start|run)\s+(?:the\s+)?(.+?)(?:\s+app(?:lication)?)?$",
        CommandKind::OpenApp,
        Some("app_name"),
    ),
    (
        r"(?:close|quit|exit|kill|stop|end)\s+(?:the\s+)?(.+?)(?:\s+app(?:lication)?)?$",
        CommandKind::CloseApp,
        Some("app_name"),
    ),
    // ── Desktop: web ──
    (
        r"(?:search|google|look\s+up|find)\s+(?:for\s+|google\s+for\s+|on\s+google\s+)?(.+)$",
        CommandKind::SearchGoogle,
        Some("query"),
    ),
    (r"google\s+(.+)$", CommandKind::SearchGoogle, Some("query")),
    (
        r"(?:search|find|play|look\s+for)\s+(?:on\s+)?youtube\s+(?:for\s+)?(.+)$",
        CommandKind::SearchYoutube,
        Some("query"),
    ),
    (
        r"youtube\s+(?:search\s+)?(?:for\s+)?(.+)$",
        CommandKind::SearchYoutube,
        Some("query"),
    ),
    (
        r"(?:open|go\s+to|visit|navigate\s+to)\s+(?:the\s+)?(?:website\s+)?(?:www\.)?(\S+\.(?:com|org|net|io|co|in|edu|gov)\S*)$",
        CommandKind::OpenWebsite,
        Some("url"),
    ),
    (
        r"(?:open|go\s+to)\s+(\S+\.(?:com|org|net|io|co|in))\s*$",
        CommandKind::OpenWebsite,
        Some("url"),
    ),
    // ── Desktop: folders ──
    (
        r"(?:open|show|go\s+to)\s+(?:my\s+)?(?:the\s+)?(desktop|documents?|downloads?|pictures?|music|videos?|home|files?)\s*(?:folder)?$",
        CommandKind::OpenFolder,
        Some("folder_name"),
    ),
    (
        r"(?:open|show)\s+(?:the\s+)?folder\s+(.+)$",
        CommandKind::OpenFolder,
        Some("folder_name"),
    ),
    // ── Desktop: screenshot ──
    (
        r"(?:take|capture|grab|get)\s+(?:a\s+)?screenshot",
        CommandKind::TakeScreenshot,
        None,
    ),
    (r"screenshot", CommandKind::TakeScreenshot, None),
    // ── Desktop: windows ──
    (
        r"minimize\s+(?:this\s+|current\s+)?(?:all\s+)?window(?:s)?",
        CommandKind::MinimizeWindow,
        None,
    ),
    (r"minimize\s+all(?:\s+windows)?", CommandKind::MinimizeAll, None),
    (r"show\s+(?:the\s+)?desktop", CommandKind::MinimizeAll, None),
    (
        r"maximize\s+(?:this\s+|current\s+)?window",
        CommandKind::MaximizeWindow,
        None,
    ),
    (
        r"(?:close|exit)\s+(?:this\s+|current\s+)?window",
        CommandKind::CloseWindow,
        None,
    ),
    (r"switch\s+(?:to\s+)?(?:next\s+)?window", CommandKind::SwitchWindow, None),
    (r"alt\s*tab", CommandKind::SwitchWindow, None),
    (r"next\s+window", CommandKind::SwitchWindow, None),
    // ── Desktop: system ──
    (
        r"lock\s+(?:the\s+)?(?:computer|pc|screen|system)",
        CommandKind::LockComputer,
        None,
    ),
    (r"lock\s+(?:it)?$", CommandKind::LockComputer, None),
    (
        r"(?:shut\s*down|shutdown|power\s+off|turn\s+off)\s+(?:the\s+)?(?:computer|pc|system)?",
        CommandKind::Shutdown,
        None,
    ),
    (r"restart\s+(?:the\s+)?(?:computer|pc|system)?", CommandKind::Restart, None),
    (r"(?:sleep|hibernate)\s+(?:the\s+)?(?:computer|pc)?", CommandKind::Sleep, None),
    // ── Desktop: volume ──
    (
        r"(?:turn\s+)?(?:volume\s+)?\bup\b(?:\s+volume)?",
        CommandKind::VolumeUp,
        None,
    ),
    (r"(?:increase|raise)\s+(?:the\s+)?volume", CommandKind::VolumeUp, None),
    (r"louder", CommandKind::VolumeUp, None),
    (
        r"(?:turn\s+)?(?:volume\s+)?\bdown\b(?:\s+volume)?",
        CommandKind::VolumeDown,
        None,
    ),
    (
        r"(?:decrease|lower|reduce)\s+(?:the\s+)?volume",
        CommandKind::VolumeDown,
        None,
    ),
    (r"quieter", CommandKind::VolumeDown, None),
    (
        r"mute(?:\s+(?:the\s+)?(?:volume|sound|audio))?",
        CommandKind::Mute,
        None,
    ),
    (
        r"unmute(?:\s+(?:the\s+)?(?:volume|sound|audio))?",
        CommandKind::Unmute,
        None,
    ),
    (r"(?:turn\s+)?(?:sound|audio)\s+(?:on|off)", CommandKind::Mute, None),
    // ── Desktop: media ──
    (
        r"(?:play|pause|resume)(?:\s+(?:the\s+)?music)?",
        CommandKind::PlayPause,
        None,
    ),
    (r"(?:next|skip)\s+(?:track|song)", CommandKind::NextTrack, None),
    (r"(?:previous|last|back)\s+(?:track|song)", CommandKind::PreviousTrack, None),
    (
        r"stop\s+(?:the\s+)?(?:music|playing|media)",
        CommandKind::StopMedia,
        None,
    ),
    // ── Desktop: keyboard ──
    (r"(?:type|write|enter)\s+(.+)$", CommandKind::TypeText, Some("text")),
    (r"copy(?:\s+(?:this|that|it))?", CommandKind::Copy, None),
    (r"paste(?:\s+(?:this|that|it))?", CommandKind::Paste, None),
    (r"undo", CommandKind::Undo, None),
    (r"redo", CommandKind::Redo, None),
    (r"select\s+all", CommandKind::SelectAll, None),
    (r"save(?:\s+(?:this|file|document))?", CommandKind::Save, None),
    (r"press\s+(?:the\s+)?(.+)\s+key", CommandKind::PressKey, Some("key")),
    // ── Information ──
    (
        r"(?:what(?:'s|\s+is)\s+)?(?:the\s+)?(?:current\s+)?\btime\b(?:\s+(?:is\s+it|now))?",
        CommandKind::GetTime,
        None,
    ),
    (
        r"(?:what(?:'s|\s+is)\s+)?(?:the\s+)?(?:today(?:'s)?\s+)?\bdate\b(?:\s+(?:is\s+it|today))?",
        CommandKind::GetDate,
        None,
    ),
    (
        r"(?:what(?:'s|\s+is)\s+)?(?:the\s+)?(?:my\s+)?\bbattery\b(?:\s+(?:status|level|percentage))?",
        CommandKind::GetBattery,
        None,
    ),
    (
        r"(?:how\s+much\s+)?\bbattery\b(?:\s+(?:do\s+i\s+have|left|remaining))?",
        CommandKind::GetBattery,
        None,
    ),
    (
        r"(?:system|computer)\s+(?:info|information|status)",
        CommandKind::GetSystemInfo,
        None,
    ),
    (
        r"(?:what(?:'s|\s+is)|show(?:\s+me)?|list)\s+(?:all\s+)?(?:the\s+)?(?:running|open)\s+(?:apps?|applications?|programs?)",
        CommandKind::ListRunningApps,
        None,
    ),
    (
        r"what\s+(?:apps?|applications?)\s+(?:are|is)\s+(?:running|open)",
        CommandKind::ListRunningApps,
        None,
    ),
    // ── Conversation ──
    (
        r"^(?:hi|hello|hey|good\s+(?:morning|afternoon|evening))(?:\s+(?:pilot|deskpilot))?$",
        CommandKind::Greeting,
        None,
    ),
    (
        r"help|what\s+can\s+you\s+do|commands?|capabilities",
        CommandKind::Help,
        None,
    ),
    (
        r"(?:stop|quit|exit|bye|goodbye|shut\s*up)(?:\s+(?:pilot|listening))?$",
        CommandKind::Stop,
        None,
    ),
];

/// Speech-recognition aliases for app names; first entry that matches wins.
const APP_CORRECTIONS: &[(&str, &str)] = &[
    // Chrome
    ("chrome", "chrome"),
    ("krom", "chrome"),
    ("crome", "chrome"),
    ("browser", "chrome"),
    ("google chrome", "chrome"),
    ("google", "chrome"),
    // VS Code
    ("vs code", "vscode"),
    ("visual studio code", "vscode"),
    ("code", "vscode"),
    ("vscode", "vscode"),
    ("vs", "vscode"),
    ("visual studio", "vscode"),
    // Editors
    ("notepad", "notepad"),
    ("note pad", "notepad"),
    ("text editor", "notepad"),
    ("notepad plus plus", "notepad++"),
    ("notepad++", "notepad++"),
    // File manager
    ("file explorer", "explorer"),
    ("explorer", "explorer"),
    ("files", "explorer"),
    ("my computer", "explorer"),
    ("this pc", "explorer"),
    ("folder", "explorer"),
    // Calculator
    ("calculator", "calculator"),
    ("calc", "calculator"),
    ("calculate", "calculator"),
    // Shells
    ("cmd", "cmd"),
    ("command prompt", "cmd"),
    ("terminal", "cmd"),
    ("command line", "cmd"),
    ("powershell", "powershell"),
    // Office
    ("word", "word"),
    ("microsoft word", "word"),
    ("ms word", "word"),
    ("excel", "excel"),
    ("microsoft excel", "excel"),
    ("spreadsheet", "excel"),
    ("powerpoint", "powerpoint"),
    ("ppt", "powerpoint"),
    ("presentation", "powerpoint"),
    ("outlook", "outlook"),
    ("email", "outlook"),
    // Media
    ("spotify", "spotify"),
    ("music", "spotify"),
    ("vlc", "vlc"),
    ("media player", "vlc"),
    ("video player", "vlc"),
    // Communication
    ("discord", "discord"),
    ("telegram", "telegram"),
    ("whatsapp", "whatsapp"),
    ("teams", "teams"),
    ("microsoft teams", "teams"),
    ("zoom", "zoom"),
    // Development
    ("git bash", "git bash"),
    ("bash", "git bash"),
    // Utilities
    ("paint", "paint"),
    ("task manager", "task manager"),
    ("control panel", "control panel"),
    ("settings", "settings"),
    ("snipping tool", "snipping tool"),
];

const FOLDER_CORRECTIONS: &[(&str, &str)] = &[
    ("desktop", "desktop"),
    ("document", "documents"),
    ("documents", "documents"),
    ("docs", "documents"),
    ("download", "downloads"),
    ("downloads", "downloads"),
    ("picture", "pictures"),
    ("pictures", "pictures"),
    ("photos", "pictures"),
    ("music", "music"),
    ("songs", "music"),
    ("video", "videos"),
    ("videos", "videos"),
    ("movies", "videos"),
    ("home", "home"),
    ("user", "home"),
];

pub fn correct_app_name(raw: &str) -> String {
    let name = raw.trim().to_lowercase();
    for (key, value) in APP_CORRECTIONS {
        if *key == name {
            return (*value).to_string();
        }
    }
    // Partial match catches captures with trailing words
    // ("chrome and tell me the time").
    for (key, value) in APP_CORRECTIONS {
        if name.contains(key) || key.contains(name.as_str()) {
            return (*value).to_string();
        }
    }
    name
}

pub fn correct_folder_name(raw: &str) -> String {
    let name = raw.trim().to_lowercase();
    for (key, value) in FOLDER_CORRECTIONS {
        if *key == name {
            return (*value).to_string();
        }
    }
    name
}

pub fn clean_query(raw: &str) -> String {
    raw.trim().strip_prefix("for ").unwrap_or(raw.trim()).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_corrections_exact_and_partial() {
        assert_eq!(correct_app_name("vs code"), "vscode");
        assert_eq!(correct_app_name("google"), "chrome");
        assert_eq!(correct_app_name("chrome and tell me the time"), "chrome");
        assert_eq!(correct_app_name("blender"), "blender");
    }

    #[test]
    fn folder_corrections() {
        assert_eq!(correct_folder_name("docs"), "documents");
        assert_eq!(correct_folder_name("photos"), "pictures");
        assert_eq!(correct_folder_name("projects"), "projects");
    }

    #[test]
    fn query_cleanup_strips_leading_for() {
        assert_eq!(clean_query("for rust tutorials"), "rust tutorials");
        assert_eq!(clean_query("rust tutorials"), "rust tutorials");
    }
}
