use crate::store::JsonStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub version: String,
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub desktop: DesktopSettings,
    pub voice: VoiceSettings,
    pub polling: PollingSettings,
    pub memory: MemorySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            server: ServerSettings::default(),
            llm: LlmSettings::default(),
            desktop: DesktopSettings::default(),
            voice: VoiceSettings::default(),
            polling: PollingSettings::default(),
            memory: MemorySettings::default(),
        }
    }
}

impl Settings {
    /// Read `settings.json` from the data directory; a missing or broken
    /// file falls back to defaults with a warning.
    pub fn load(data_dir: &Path) -> Self {
        JsonStore::new(data_dir.join("settings.json")).load()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub num_ctx: u32,
    pub top_p: f32,
    pub classify_timeout_secs: u64,
    pub chat_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.3,
            num_ctx: 2048,
            top_p: 0.9,
            classify_timeout_secs: 20,
            chat_timeout_secs: 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopSettings {
    pub enabled: bool,
}

impl Default for DesktopSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// External speech-to-text command. `{file}` is replaced with the audio
    /// path; without the placeholder the path is appended.
    pub transcriber_command: Option<String>,
    pub language: String,
    pub vad_filter: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            transcriber_command: None,
            language: "en".to_string(),
            vad_filter: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub reminder_interval_secs: u64,
    pub schedule_interval_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            reminder_interval_secs: 1,
            schedule_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    pub enabled: bool,
    pub context_exchanges: u32,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            context_exchanges: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fill_with_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.llm.chat_timeout_secs, 40);
        assert_eq!(settings.polling.reminder_interval_secs, 1);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path());
        assert!(settings.desktop.enabled);
        assert_eq!(settings.memory.context_exchanges, 6);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{not json").unwrap();
        let settings = Settings::load(dir.path());
        assert_eq!(settings.server.port, 8765);
        assert!(settings.llm.enabled);
    }
}
