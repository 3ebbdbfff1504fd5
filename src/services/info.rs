//! Read-only host queries: clock, battery, resource usage, process list.

use chrono::Local;
use serde_json::{json, Value};
use sysinfo::System;

pub fn current_time() -> String {
    Local::now().format("%I:%M %p").to_string()
}

pub fn current_date() -> String {
    Local::now().format("%A, %B %d, %Y").to_string()
}

pub fn battery_status() -> String {
    if let Some((percent, charging)) = read_battery() {
        let plugged = if charging { "charging" } else { "not charging" };
        format!("Battery is at {}% and {}.", percent, plugged)
    } else {
        "No battery detected. This might be a desktop computer.".to_string()
    }
}

#[cfg(target_os = "linux")]
fn read_battery() -> Option<(u32, bool)> {
    let entries = std::fs::read_dir("/sys/class/power_supply").ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        let capacity = path.join("capacity");
        if !capacity.exists() {
            continue;
        }
        let percent: u32 = std::fs::read_to_string(&capacity).ok()?.trim().parse().ok()?;
        let charging = std::fs::read_to_string(path.join("status"))
            .map(|s| s.trim() == "Charging")
            .unwrap_or(false);
        return Some((percent, charging));
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn read_battery() -> Option<(u32, bool)> {
    None
}

/// Human summary plus the raw numbers for API consumers.
pub fn system_info() -> (String, Value) {
    let mut sys = System::new_all();
    // Two refreshes with a pause in between, otherwise CPU usage reads zero.
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_all();

    let cpu_percent = sys.global_cpu_usage();
    let memory_percent = if sys.total_memory() > 0 {
        sys.used_memory() as f64 / sys.total_memory() as f64 * 100.0
    } else {
        0.0
    };
    let os = System::name().unwrap_or_else(|| "Unknown".to_string());

    let message = format!(
        "System: {}\nCPU: {:.0}% used\nMemory: {:.0}% used",
        os, cpu_percent, memory_percent
    );
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let data = json!({
        "user": user,
        "os": os,
        "os_version": System::os_version(),
        "hostname": System::host_name(),
        "uptime_secs": System::uptime(),
        "cpu_percent": cpu_percent,
        "memory_percent": memory_percent,
        "memory_used": sys.used_memory(),
        "memory_total": sys.total_memory(),
    });
    (message, data)
}

/// Distinct process names, sorted, leading-underscore names dropped.
pub fn running_apps() -> Vec<String> {
    let mut sys = System::new_all();
    sys.refresh_all();

    let mut names: Vec<String> = sys
        .processes()
        .values()
        .map(|p| p.name().to_string_lossy().to_string())
        .filter(|name| !name.is_empty() && !name.starts_with('_'))
        .map(|name| name.trim_end_matches(".exe").to_string())
        .collect();
    names.sort();
    names.dedup();
    names
}
