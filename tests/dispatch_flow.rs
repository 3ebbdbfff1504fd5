//! End-to-end command flow through a registry with desktop control disabled
//! and no reachable LLM, the way the dispatcher degrades on a headless box.

use chrono::{Local, Timelike};
use deskpilot::models::{DesktopSettings, LlmSettings, Settings};
use deskpilot::registry::Registry;
use std::path::Path;

fn headless_settings(llm_enabled: bool) -> Settings {
    let mut settings = Settings {
        desktop: DesktopSettings { enabled: false },
        ..Settings::default()
    };
    settings.llm = LlmSettings {
        enabled: llm_enabled,
        base_url: "http://127.0.0.1:1".to_string(),
        classify_timeout_secs: 2,
        chat_timeout_secs: 2,
        ..LlmSettings::default()
    };
    settings
}

fn registry(dir: &Path, llm_enabled: bool) -> Registry {
    Registry::build_with(dir.to_path_buf(), headless_settings(llm_enabled)).unwrap()
}

#[tokio::test]
async fn compound_phrase_resolves_to_first_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path(), false);
    let result = registry
        .dispatcher
        .dispatch("open chrome and tell me the time")
        .await;
    // The app pattern wins; the trailing clause rides along as noise.
    assert_eq!(result.action, "open_app");
    assert!(!result.success);
    assert!(result.response.contains("disabled"));
}

#[tokio::test]
async fn timer_lands_about_five_minutes_out() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path(), false);
    let before = Local::now();
    let result = registry.dispatcher.dispatch("set timer for 5 minutes").await;
    assert!(result.success);

    let reminders = registry.reminders.lock().unwrap();
    let active = reminders.active();
    assert_eq!(active.len(), 1);
    let delta = (active[0].trigger_time - before).num_seconds();
    assert!((299..=301).contains(&delta), "timer was {}s out", delta);
}

#[tokio::test]
async fn evening_reminder_parses_message_and_clock() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path(), false);
    let result = registry
        .dispatcher
        .dispatch("remind me to call mom at 5pm")
        .await;
    assert!(result.success);
    assert!(result.response.contains("call mom"));

    let reminders = registry.reminders.lock().unwrap();
    let active = reminders.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].message, "call mom");
    assert_eq!(active[0].trigger_time.hour(), 17);
    assert_eq!(active[0].trigger_time.minute(), 0);
    assert!(active[0].trigger_time > Local::now());
}

#[tokio::test]
async fn reminders_survive_a_registry_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let original = {
        let registry = registry(dir.path(), false);
        registry
            .dispatcher
            .dispatch("remind me to water the plants in 2 hours")
            .await;
        let guard = registry.reminders.lock().unwrap();
        guard.active()[0].clone()
    };

    let reopened = registry(dir.path(), false);
    let guard = reopened.reminders.lock().unwrap();
    let active = guard.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, original.id);
    assert_eq!(active[0].message, original.message);
    assert_eq!(
        active[0].trigger_time.timestamp(),
        original.trigger_time.timestamp()
    );
}

#[tokio::test]
async fn clear_all_twice_reports_zero_the_second_time() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path(), false);
    registry.dispatcher.dispatch("set timer for 1 minute").await;
    registry
        .dispatcher
        .dispatch("remind me to stretch in 10 minutes")
        .await;

    let first = registry.dispatcher.dispatch("clear all reminders").await;
    assert!(first.response.contains("2"));
    let second = registry.dispatcher.dispatch("clear all reminders").await;
    assert!(second.response.contains("0"));
}

#[tokio::test]
async fn unmatched_text_with_dead_llm_echoes_the_input() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path(), true);
    let result = registry.dispatcher.dispatch("xyzzy plugh").await;
    assert!(!result.success);
    assert_eq!(result.source, "fallback");
    assert!(result.response.contains("xyzzy plugh"));
}

#[tokio::test]
async fn task_run_is_best_effort_on_disabled_desktop() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path(), false);
    let result = registry
        .dispatcher
        .dispatch("run the break reminder task")
        .await;
    assert!(result.success);
    assert!(result.response.contains("Time for a break"));

    let data = result.data.expect("task result attached");
    let outcomes = data["action_results"].as_array().unwrap();
    assert!(outcomes.iter().any(|o| o["success"] == false));
    assert!(outcomes.iter().any(|o| o["success"] == true));

    let tasks = registry.tasks.lock().unwrap();
    let task = tasks.get_by_name("break reminder").unwrap();
    assert_eq!(task.run_count, 1);
    assert!(task.last_run.is_some());
}

#[tokio::test]
async fn schedule_created_from_speech_shows_in_list() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path(), false);
    let result = registry
        .dispatcher
        .dispatch("schedule break reminder daily at 9am")
        .await;
    assert!(result.success, "{}", result.response);

    let scheduler = registry.scheduler.lock().unwrap();
    assert_eq!(scheduler.all().len(), 1);
    let schedule = &scheduler.all()[0];
    assert_eq!(schedule.time.as_deref(), Some("09:00"));
    assert!(schedule.next_run.is_some());
}

#[tokio::test]
async fn dispatcher_absorbs_every_handler_error() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path(), false);
    // A sweep across handler families; none of these may panic.
    for text in [
        "volume up",
        "take a screenshot",
        "lock the computer",
        "delete reminder 99",
        "delete schedule 99",
        "run the nonexistent task",
        "what time is it",
        "battery level",
        "hello",
        "help",
        "stop",
        "",
    ] {
        let result = registry.dispatcher.dispatch(text).await;
        assert!(!result.response.is_empty(), "empty response for '{}'", text);
    }
}
