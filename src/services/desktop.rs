//! Desktop automation behind a trait so the dispatcher can run against a
//! stub when control of the host is disabled.

use std::path::PathBuf;
use std::process::{Command, Stdio};

/// One concrete thing to do to the host desktop.
#[derive(Debug, Clone)]
pub enum DesktopAction<'a> {
    OpenApp(&'a str),
    CloseApp(&'a str),
    SearchGoogle(&'a str),
    SearchYoutube(&'a str),
    OpenWebsite(&'a str),
    OpenFolder(&'a str),
    Screenshot,
    MinimizeWindow,
    MaximizeWindow,
    CloseWindow,
    MinimizeAll,
    SwitchWindow,
    LockComputer,
    Sleep,
    VolumeUp,
    VolumeDown,
    Mute,
    Unmute,
    PlayPause,
    NextTrack,
    PreviousTrack,
    StopMedia,
    TypeText(&'a str),
    PressKey(&'a str),
    Copy,
    Paste,
    Undo,
    Redo,
    SelectAll,
    Save,
    RunCommand(&'a str),
    Notify(&'a str),
}

pub trait DesktopControl: Send + Sync {
    fn perform(&self, action: DesktopAction) -> Result<String, String>;

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Stand-in used when desktop control is switched off in settings or the
/// process has no display. Every action fails with the same message.
pub struct DisabledDesktop;

impl DesktopControl for DisabledDesktop {
    fn perform(&self, _action: DesktopAction) -> Result<String, String> {
        Err("Desktop control is disabled on this system.".to_string())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Real implementation driving the host through platform tools: `open` /
/// `start` / direct spawn for apps, xdotool + wmctrl + pactl + playerctl on
/// Linux, osascript on macOS.
pub struct SystemDesktop;

impl SystemDesktop {
    fn spawn(program: &str, args: &[&str]) -> Result<(), String> {
        Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| format!("could not run {}: {}", program, e))
    }

    fn run(program: &str, args: &[&str]) -> Result<(), String> {
        let status = Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| format!("could not run {}: {}", program, e))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("{} exited with {}", program, status))
        }
    }

    fn open_url(url: &str) -> Result<(), String> {
        open::that(url).map_err(|e| format!("could not open {}: {}", url, e))
    }

    fn open_app(app: &str) -> Result<String, String> {
        if cfg!(target_os = "windows") {
            Self::spawn("cmd", &["/C", "start", "", app])?;
        } else if cfg!(target_os = "macos") {
            Self::run("open", &["-a", app])?;
        } else {
            Self::spawn(app, &[])?;
        }
        Ok(format!("Opened {}.", app))
    }

    fn close_app(app: &str) -> Result<String, String> {
        if cfg!(target_os = "windows") {
            Self::run("taskkill", &["/IM", &format!("{}.exe", app), "/F"])?;
        } else {
            Self::run("pkill", &["-i", app])
                .map_err(|_| format!("No running instance of {} found.", app))?;
        }
        Ok(format!("Closed {}.", app))
    }

    fn open_folder(folder: &str) -> Result<String, String> {
        let path = Self::folder_path(folder)
            .ok_or_else(|| format!("I don't know where the {} folder is.", folder))?;
        open::that(&path).map_err(|e| format!("could not open {}: {}", path.display(), e))?;
        Ok(format!("Opened your {} folder.", folder))
    }

    fn folder_path(folder: &str) -> Option<PathBuf> {
        match folder {
            "desktop" => dirs::desktop_dir(),
            "documents" => dirs::document_dir(),
            "downloads" => dirs::download_dir(),
            "pictures" => dirs::picture_dir(),
            "music" => dirs::audio_dir(),
            "videos" => dirs::video_dir(),
            "home" | "files" | "file" => dirs::home_dir(),
            other => dirs::home_dir().map(|h| h.join(other)),
        }
    }

    fn screenshot() -> Result<String, String> {
        let dir = dirs::picture_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| "no place to store the screenshot".to_string())?;
        let file = dir.join(format!(
            "screenshot_{}.png",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ));
        let path = file.to_string_lossy().to_string();
        if cfg!(target_os = "windows") {
            // PowerShell fallback, no extra tooling required on Windows
            let script = format!(
                "Add-Type -AssemblyName System.Windows.Forms;\
                 $b = [System.Windows.Forms.SystemInformation]::VirtualScreen;\
                 $bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height;\
                 $g = [System.Drawing.Graphics]::FromImage($bmp);\
                 $g.CopyFromScreen($b.Location, [System.Drawing.Point]::Empty, $b.Size);\
                 $bmp.Save('{}')",
                path
            );
            Self::run("powershell", &["-NoProfile", "-Command", &script])?;
        } else if cfg!(target_os = "macos") {
            Self::run("screencapture", &["-x", &path])?;
        } else {
            Self::run("gnome-screenshot", &["-f", &path])
                .or_else(|_| Self::run("scrot", &[&path]))?;
        }
        Ok(format!("Screenshot saved to {}.", path))
    }

    fn key(combo: &str) -> Result<(), String> {
        if cfg!(target_os = "macos") {
            // osascript key codes are awkward; keystroke covers the combos
            // the dispatcher sends.
            let script = format!("tell application \"System Events\" to keystroke {}", combo);
            Self::run("osascript", &["-e", &script])
        } else if cfg!(target_os = "windows") {
            let script = format!(
                "$w = New-Object -ComObject WScript.Shell; $w.SendKeys('{}')",
                combo
            );
            Self::run("powershell", &["-NoProfile", "-Command", &script])
        } else {
            Self::run("xdotool", &["key", combo])
        }
    }

    fn volume(op: &str) -> Result<(), String> {
        if cfg!(target_os = "macos") {
            let script = match op {
                "up" => "set volume output volume ((output volume of (get volume settings)) + 10)",
                "down" => "set volume output volume ((output volume of (get volume settings)) - 10)",
                "mute" => "set volume output muted true",
                _ => "set volume output muted false",
            };
            Self::run("osascript", &["-e", script])
        } else if cfg!(target_os = "windows") {
            let keys = match op {
                "up" => "[char]175",
                "down" => "[char]174",
                _ => "[char]173",
            };
            let script = format!(
                "$w = New-Object -ComObject WScript.Shell; $w.SendKeys({})",
                keys
            );
            Self::run("powershell", &["-NoProfile", "-Command", &script])
        } else {
            let args: [&str; 3] = match op {
                "up" => ["set-sink-volume", "@DEFAULT_SINK@", "+5%"],
                "down" => ["set-sink-volume", "@DEFAULT_SINK@", "-5%"],
                "mute" => ["set-sink-mute", "@DEFAULT_SINK@", "1"],
                _ => ["set-sink-mute", "@DEFAULT_SINK@", "0"],
            };
            Self::run("pactl", &args)
        }
    }

    fn media(player_cmd: &str) -> Result<(), String> {
        if cfg!(target_os = "linux") {
            Self::run("playerctl", &[player_cmd])
        } else {
            Err("media keys need playerctl".to_string())
        }
    }
}

impl DesktopControl for SystemDesktop {
    fn perform(&self, action: DesktopAction) -> Result<String, String> {
        match action {
            DesktopAction::OpenApp(app) => Self::open_app(app),
            DesktopAction::CloseApp(app) => Self::close_app(app),
            DesktopAction::SearchGoogle(query) => {
                let url = format!(
                    "https://www.google.com/search?q={}",
                    urlencode(query)
                );
                Self::open_url(&url)?;
                Ok(format!("Searching Google for {}.", query))
            }
            DesktopAction::SearchYoutube(query) => {
                let url = format!(
                    "https://www.youtube.com/results?search_query={}",
                    urlencode(query)
                );
                Self::open_url(&url)?;
                Ok(format!("Searching YouTube for {}.", query))
            }
            DesktopAction::OpenWebsite(site) => {
                let url = if site.starts_with("http") {
                    site.to_string()
                } else {
                    format!("https://{}", site)
                };
                Self::open_url(&url)?;
                Ok(format!("Opening {}.", site))
            }
            DesktopAction::OpenFolder(folder) => Self::open_folder(folder),
            DesktopAction::Screenshot => Self::screenshot(),
            DesktopAction::MinimizeWindow => {
                if cfg!(target_os = "linux") {
                    Self::run("xdotool", &["getactivewindow", "windowminimize"])?;
                } else {
                    Self::key("super+Down")?;
                }
                Ok("Window minimized.".to_string())
            }
            DesktopAction::MaximizeWindow => {
                if cfg!(target_os = "linux") {
                    Self::run(
                        "wmctrl",
                        &["-r", ":ACTIVE:", "-b", "add,maximized_vert,maximized_horz"],
                    )?;
                } else {
                    Self::key("super+Up")?;
                }
                Ok("Window maximized.".to_string())
            }
            DesktopAction::CloseWindow => {
                if cfg!(target_os = "linux") {
                    Self::run("wmctrl", &["-c", ":ACTIVE:"])?;
                } else {
                    Self::key("alt+F4")?;
                }
                Ok("Window closed.".to_string())
            }
            DesktopAction::MinimizeAll => {
                if cfg!(target_os = "linux") {
                    Self::run("wmctrl", &["-k", "on"])?;
                } else {
                    Self::key("super+d")?;
                }
                Ok("Showing the desktop.".to_string())
            }
            DesktopAction::SwitchWindow => {
                Self::key("alt+Tab")?;
                Ok("Switched window.".to_string())
            }
            DesktopAction::LockComputer => {
                if cfg!(target_os = "windows") {
                    Self::run("rundll32.exe", &["user32.dll,LockWorkStation"])?;
                } else if cfg!(target_os = "macos") {
                    Self::run("pmset", &["displaysleepnow"])?;
                } else {
                    Self::run("loginctl", &["lock-session"])?;
                }
                Ok("Computer locked.".to_string())
            }
            DesktopAction::Sleep => {
                if cfg!(target_os = "windows") {
                    Self::run(
                        "rundll32.exe",
                        &["powrprof.dll,SetSuspendState", "0,1,0"],
                    )?;
                } else if cfg!(target_os = "macos") {
                    Self::run("pmset", &["sleepnow"])?;
                } else {
                    Self::run("systemctl", &["suspend"])?;
                }
                Ok("Going to sleep.".to_string())
            }
            DesktopAction::VolumeUp => {
                Self::volume("up")?;
                Ok("Volume increased.".to_string())
            }
            DesktopAction::VolumeDown => {
                Self::volume("down")?;
                Ok("Volume decreased.".to_string())
            }
            DesktopAction::Mute => {
                Self::volume("mute")?;
                Ok("Muted.".to_string())
            }
            DesktopAction::Unmute => {
                Self::volume("unmute")?;
                Ok("Unmuted.".to_string())
            }
            DesktopAction::PlayPause => {
                Self::media("play-pause")?;
                Ok("Toggled playback.".to_string())
            }
            DesktopAction::NextTrack => {
                Self::media("next")?;
                Ok("Next track.".to_string())
            }
            DesktopAction::PreviousTrack => {
                Self::media("previous")?;
                Ok("Previous track.".to_string())
            }
            DesktopAction::StopMedia => {
                Self::media("stop")?;
                Ok("Stopped playback.".to_string())
            }
            DesktopAction::TypeText(text) => {
                if cfg!(target_os = "linux") {
                    Self::run("xdotool", &["type", "--delay", "30", text])?;
                    Ok(format!("Typed: {}", text))
                } else {
                    Err("typing text needs xdotool".to_string())
                }
            }
            DesktopAction::PressKey(key) => {
                let combo = normalize_key(key);
                Self::key(&combo)?;
                Ok(format!("Pressed {}.", key))
            }
            DesktopAction::Copy => {
                Self::key("ctrl+c")?;
                Ok("Copied.".to_string())
            }
            DesktopAction::Paste => {
                Self::key("ctrl+v")?;
                Ok("Pasted.".to_string())
            }
            DesktopAction::Undo => {
                Self::key("ctrl+z")?;
                Ok("Undone.".to_string())
            }
            DesktopAction::Redo => {
                Self::key("ctrl+y")?;
                Ok("Redone.".to_string())
            }
            DesktopAction::SelectAll => {
                Self::key("ctrl+a")?;
                Ok("Selected all.".to_string())
            }
            DesktopAction::Save => {
                Self::key("ctrl+s")?;
                Ok("Saved.".to_string())
            }
            DesktopAction::RunCommand(command) => {
                if cfg!(target_os = "windows") {
                    Self::run("cmd", &["/C", command])?;
                } else {
                    Self::run("sh", &["-c", command])?;
                }
                Ok(format!("Ran: {}", command))
            }
            DesktopAction::Notify(message) => {
                if cfg!(target_os = "linux") {
                    Self::run("notify-send", &["DeskPilot", message])?;
                } else if cfg!(target_os = "macos") {
                    let script = format!(
                        "display notification \"{}\" with title \"DeskPilot\"",
                        message.replace('"', "'")
                    );
                    Self::run("osascript", &["-e", &script])?;
                } else {
                    log::info!("notification: {}", message);
                }
                Ok(message.to_string())
            }
        }
    }
}

fn normalize_key(key: &str) -> String {
    match key.trim() {
        "enter" | "return" => "Return".to_string(),
        "escape" | "esc" => "Escape".to_string(),
        "tab" => "Tab".to_string(),
        "space" | "spacebar" => "space".to_string(),
        "backspace" => "BackSpace".to_string(),
        "delete" => "Delete".to_string(),
        "up" => "Up".to_string(),
        "down" => "Down".to_string(),
        "left" => "Left".to_string(),
        "right" => "Right".to_string(),
        other => other.replace(' ', "+"),
    }
}

// Query-string form: spaces as `+` rather than `%20`.
fn urlencode(text: &str) -> String {
    urlencoding::encode(text).replace("%20", "+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_desktop_rejects_everything() {
        let desktop = DisabledDesktop;
        assert!(!desktop.is_enabled());
        let err = desktop.perform(DesktopAction::VolumeUp).unwrap_err();
        assert!(err.contains("disabled"));
    }

    #[test]
    fn url_encoding() {
        assert_eq!(urlencode("rust tutorials"), "rust+tutorials");
        assert_eq!(urlencode("a&b"), "a%26b");
        assert_eq!(urlencode("c++ 101?"), "c%2B%2B+101%3F");
        assert_eq!(urlencode("plain-text_1.0~ok"), "plain-text_1.0~ok");
    }

    #[test]
    fn key_names_normalize() {
        assert_eq!(normalize_key("enter"), "Return");
        assert_eq!(normalize_key("ctrl shift t"), "ctrl+shift+t");
    }
}
