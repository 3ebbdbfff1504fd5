//! Speech-to-text via an external transcriber command configured in
//! settings. The audio bytes land in a temp file, the command prints the
//! transcript on stdout.

use crate::models::settings::VoiceSettings;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("no transcriber command is configured")]
    NotConfigured,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transcriber failed: {0}")]
    Failed(String),
}

#[derive(Clone)]
pub struct Transcriber {
    settings: VoiceSettings,
}

impl Transcriber {
    pub fn new(settings: VoiceSettings) -> Self {
        Self { settings }
    }

    pub fn is_configured(&self) -> bool {
        self.settings.transcriber_command.is_some()
    }

    /// Blocking; callers on the async side wrap this in `spawn_blocking`.
    pub fn transcribe(&self, audio: &[u8]) -> Result<String, TranscribeError> {
        let template = self
            .settings
            .transcriber_command
            .as_deref()
            .ok_or(TranscribeError::NotConfigured)?;

        let audio_path = temp_audio_path();
        std::fs::write(&audio_path, audio)?;
        let result = self.run_command(template, &audio_path);
        if let Err(e) = std::fs::remove_file(&audio_path) {
            log::warn!("could not remove {}: {}", audio_path.display(), e);
        }
        result
    }

    fn run_command(&self, template: &str, audio_path: &PathBuf) -> Result<String, TranscribeError> {
        let file = audio_path.to_string_lossy();
        let mut parts: Vec<String> = template
            .split_whitespace()
            .map(|part| {
                part.replace("{file}", &file)
                    .replace("{lang}", &self.settings.language)
            })
            .collect();
        if parts.is_empty() {
            return Err(TranscribeError::NotConfigured);
        }
        if !template.contains("{file}") {
            parts.push(file.to_string());
        }
        if self.settings.vad_filter {
            parts.push("--vad".to_string());
        }

        let output = Command::new(&parts[0]).args(&parts[1..]).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(TranscribeError::Failed(if stderr.is_empty() {
                format!("exit status {}", output.status)
            } else {
                stderr
            }));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn temp_audio_path() -> PathBuf {
    std::env::temp_dir().join(format!("deskpilot_audio_{}.wav", crate::models::short_id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_transcriber_errors() {
        let transcriber = Transcriber::new(VoiceSettings::default());
        assert!(!transcriber.is_configured());
        let err = transcriber.transcribe(b"RIFF").unwrap_err();
        assert!(matches!(err, TranscribeError::NotConfigured));
    }

    #[test]
    fn command_output_becomes_transcript() {
        let settings = VoiceSettings {
            transcriber_command: Some("echo hello world".to_string()),
            language: "en".to_string(),
            vad_filter: false,
        };
        let transcriber = Transcriber::new(settings);
        let text = transcriber.transcribe(b"RIFF").unwrap();
        assert!(text.starts_with("hello world"));
    }
}
