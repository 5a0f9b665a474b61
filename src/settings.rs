use anyhow::Context;
use serde::Deserialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Video played by every jumpscare. Relative paths resolve against the
    /// directory holding the executable.
    #[serde(default = "default_video_path")]
    pub video_path: String,
    /// Period of the trigger scheduler in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Upper bound of the per-tick roll. A roll of `1` fires.
    #[serde(default = "default_roll_max")]
    pub roll_max: u32,
    /// Minimum green channel value for a pixel to be keyed out.
    #[serde(default = "default_green_min")]
    pub green_min: u8,
    /// How far green must exceed both red and blue to be keyed out.
    #[serde(default = "default_green_diff")]
    pub green_diff: u8,
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Global hotkey forcing a jumpscare. Only registered when a console is
    /// attached. `None` disables it.
    #[serde(default = "default_hotkey")]
    pub hotkey: Option<String>,
    /// When enabled the logger runs at debug level and honours `RUST_LOG`.
    #[serde(default = "default_debug_logging")]
    pub debug_logging: bool,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_register_startup")]
    pub register_startup: bool,
    #[serde(default = "default_startup_script_name")]
    pub startup_script_name: String,
    /// Directory containing `ffmpeg` and `ffprobe`. Falls back to the
    /// executable directory and then `PATH`.
    #[serde(default)]
    pub ffmpeg_dir: Option<PathBuf>,
    #[serde(default = "default_open_timeout_ms")]
    pub open_timeout_ms: u64,
    #[serde(default = "default_frame_stall_timeout_ms")]
    pub frame_stall_timeout_ms: u64,
    /// Position the idle window is parked at so it stays off every monitor.
    #[serde(default = "default_offscreen_pos")]
    pub offscreen_pos: (i32, i32),
}

fn default_video_path() -> String {
    "assets/jump.mp4".into()
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_roll_max() -> u32 {
    10_000
}

fn default_green_min() -> u8 {
    80
}

fn default_green_diff() -> u8 {
    30
}

fn default_volume() -> f32 {
    1.0
}

fn default_hotkey() -> Option<String> {
    Some("Ctrl+Alt+Shift+J".into())
}

fn default_debug_logging() -> bool {
    cfg!(debug_assertions)
}

fn default_log_file() -> String {
    "jumpscare_log.txt".into()
}

fn default_register_startup() -> bool {
    true
}

fn default_startup_script_name() -> String {
    "FoxyJumpscare.vbs".into()
}

fn default_open_timeout_ms() -> u64 {
    5000
}

fn default_frame_stall_timeout_ms() -> u64 {
    2000
}

fn default_offscreen_pos() -> (i32, i32) {
    (-10000, -10000)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            video_path: default_video_path(),
            tick_interval_ms: default_tick_interval_ms(),
            roll_max: default_roll_max(),
            green_min: default_green_min(),
            green_diff: default_green_diff(),
            volume: default_volume(),
            hotkey: default_hotkey(),
            debug_logging: default_debug_logging(),
            log_file: default_log_file(),
            register_startup: default_register_startup(),
            startup_script_name: default_startup_script_name(),
            ffmpeg_dir: None,
            open_timeout_ms: default_open_timeout_ms(),
            frame_stall_timeout_ms: default_frame_stall_timeout_ms(),
            offscreen_pos: default_offscreen_pos(),
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing or empty file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        Ok(settings.normalized())
    }

    /// Clamp values that would otherwise break the scheduler or the mixer.
    pub fn normalized(mut self) -> Self {
        self.roll_max = self.roll_max.max(1);
        self.tick_interval_ms = self.tick_interval_ms.max(1);
        self.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            default_volume()
        };
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    pub fn frame_stall_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_stall_timeout_ms)
    }
}

/// Process-wide configuration, resolved once at startup and passed down by
/// reference.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub base_dir: PathBuf,
    pub exe_path: PathBuf,
    pub settings: Settings,
    pub log_path: PathBuf,
    pub video_path: PathBuf,
    pub is_console: bool,
}

impl AppContext {
    pub fn new(exe_path: PathBuf, settings: Settings, is_console: bool) -> Self {
        let base_dir = exe_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let log_path = base_dir.join(&settings.log_file);
        let video_path = resolve_against(&base_dir, &settings.video_path);
        Self {
            base_dir,
            exe_path,
            settings,
            log_path,
            video_path,
            is_console,
        }
    }

    /// Build the context for the running executable, reading `settings.json`
    /// from beside it.
    pub fn discover() -> anyhow::Result<Self> {
        let exe_path = std::env::current_exe().context("cannot locate the running executable")?;
        let base_dir = exe_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let settings = Settings::load(base_dir.join(SETTINGS_FILE))?;
        Ok(Self::new(exe_path, settings, console_attached()))
    }
}

pub fn resolve_against(base: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Whether stdout is an interactive terminal.
pub fn console_attached() -> bool {
    std::io::stdout().is_terminal()
}
