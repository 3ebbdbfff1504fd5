//! Composition root. Builds every collaborator from settings, wires them
//! into the dispatcher, and owns the background poller handles so shutdown
//! can tear everything down in order.

use crate::dispatch::Dispatcher;
use crate::models::Settings;
use crate::reminders::{self, ReminderManager};
use crate::scheduler::{self, Scheduler};
use crate::services::{
    ConversationMemory, DesktopControl, DisabledDesktop, LlmClient, SystemDesktop, Transcriber,
};
use crate::store::JsonStore;
use crate::tasks::TaskManager;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Data directory, `~/.deskpilot` unless `DESKPILOT_DATA_DIR` points
/// somewhere else.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DESKPILOT_DATA_DIR") {
        let dir = dir.trim();
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".deskpilot")
}

/// Environment variables win over `settings.json`.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

fn apply_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var("DESKPILOT_LLM_URL") {
        if !url.trim().is_empty() {
            settings.llm.base_url = url.trim().trim_end_matches('/').to_string();
        }
    }
    if let Some(model) = var("DESKPILOT_LLM_MODEL") {
        if !model.trim().is_empty() {
            settings.llm.model = model.trim().to_string();
        }
    }
    if let Some(port) = var("DESKPILOT_PORT") {
        match port.trim().parse() {
            Ok(port) => settings.server.port = port,
            Err(_) => log::warn!("ignoring invalid DESKPILOT_PORT '{}'", port),
        }
    }
    if let Some(cmd) = var("DESKPILOT_TRANSCRIBER") {
        if !cmd.trim().is_empty() {
            settings.voice.transcriber_command = Some(cmd.trim().to_string());
        }
    }
}

pub struct Registry {
    pub settings: Settings,
    pub data_dir: PathBuf,
    pub dispatcher: Dispatcher,
    pub desktop: Arc<dyn DesktopControl>,
    pub reminders: Arc<Mutex<ReminderManager>>,
    pub scheduler: Arc<Mutex<Scheduler>>,
    pub tasks: Arc<Mutex<TaskManager>>,
    pub transcriber: Transcriber,
    shutdown_tx: watch::Sender<bool>,
    pollers: Mutex<Vec<JoinHandle<()>>>,
}

impl Registry {
    pub fn build(data_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("creating data dir {}", data_dir.display()))?;

        let mut settings = Settings::load(data_dir);
        apply_env_overrides(&mut settings);
        Self::build_with(data_dir.to_path_buf(), settings)
    }

    pub fn build_with(data_dir: PathBuf, settings: Settings) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data dir {}", data_dir.display()))?;

        let reminders = Arc::new(Mutex::new(ReminderManager::new(JsonStore::new(
            data_dir.join("reminders.json"),
        ))));
        let tasks = Arc::new(Mutex::new(TaskManager::new(JsonStore::new(
            data_dir.join("tasks.json"),
        ))));
        let scheduler = Arc::new(Mutex::new(Scheduler::new(JsonStore::new(
            data_dir.join("schedules.json"),
        ))));

        let desktop: Arc<dyn DesktopControl> = if settings.desktop.enabled {
            Arc::new(SystemDesktop)
        } else {
            log::info!("desktop control disabled in settings");
            Arc::new(DisabledDesktop)
        };

        let llm = if settings.llm.enabled {
            Some(LlmClient::new(settings.llm.clone()))
        } else {
            log::info!("llm fallback disabled in settings");
            None
        };

        let memory = if settings.memory.enabled {
            match ConversationMemory::open(
                &data_dir.join("memory.db"),
                settings.memory.context_exchanges,
            ) {
                Ok(memory) => Some(Arc::new(memory)),
                Err(e) => {
                    log::warn!("conversation memory unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let transcriber = Transcriber::new(settings.voice.clone());

        let dispatcher = Dispatcher::new(
            desktop.clone(),
            llm,
            memory,
            reminders.clone(),
            scheduler.clone(),
            tasks.clone(),
        )
        .context("building command parser")?;

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            settings,
            data_dir,
            dispatcher,
            desktop,
            reminders,
            scheduler,
            tasks,
            transcriber,
            shutdown_tx,
            pollers: Mutex::new(Vec::new()),
        })
    }

    /// Spawn the reminder and schedule pollers. Idempotence is not needed;
    /// `main` calls this once.
    pub fn start_pollers(&self) {
        let handles = vec![
            reminders::spawn_poller(
                self.reminders.clone(),
                self.settings.polling.reminder_interval_secs,
                self.shutdown_tx.subscribe(),
            ),
            scheduler::spawn_poller(
                self.scheduler.clone(),
                self.tasks.clone(),
                self.desktop.clone(),
                self.settings.polling.schedule_interval_secs,
                self.shutdown_tx.subscribe(),
            ),
        ];
        match self.pollers.lock() {
            Ok(mut pollers) => pollers.extend(handles),
            Err(_) => log::error!("poller handle list poisoned"),
        }
        log::info!("background pollers started");
    }

    /// Signal the pollers and wait for them to wind down.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handles = match self.pollers.lock() {
            Ok(mut pollers) => std::mem::take(&mut *pollers),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            if let Err(e) = handle.await {
                log::warn!("poller did not stop cleanly: {}", e);
            }
        }
        log::info!("background pollers stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DesktopSettings;

    fn test_settings() -> Settings {
        Settings {
            desktop: DesktopSettings { enabled: false },
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn registry_builds_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = test_settings();
        settings.llm.enabled = false;
        let registry = Registry::build_with(dir.path().to_path_buf(), settings).unwrap();

        registry.start_pollers();
        let result = registry.dispatcher.dispatch("what time is it").await;
        assert!(result.success);
        registry.shutdown().await;
    }

    #[test]
    fn disabled_desktop_is_wired_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let registry =
            Registry::build_with(dir.path().to_path_buf(), test_settings()).unwrap();
        assert!(!registry.desktop.is_enabled());
    }

    #[test]
    fn env_overrides_take_precedence() {
        let mut settings = Settings::default();
        apply_overrides(&mut settings, |key| match key {
            "DESKPILOT_LLM_MODEL" => Some("mistral".to_string()),
            "DESKPILOT_PORT" => Some("9100".to_string()),
            _ => None,
        });
        assert_eq!(settings.llm.model, "mistral");
        assert_eq!(settings.server.port, 9100);
    }

    #[test]
    fn blank_and_invalid_overrides_are_ignored() {
        let mut settings = Settings::default();
        apply_overrides(&mut settings, |key| match key {
            "DESKPILOT_LLM_URL" => Some("  ".to_string()),
            "DESKPILOT_PORT" => Some("not-a-port".to_string()),
            _ => None,
        });
        assert_eq!(settings.llm.base_url, "http://localhost:11434");
        assert_eq!(settings.server.port, 8765);
    }
}
