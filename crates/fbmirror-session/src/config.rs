//! Session configuration loaded from TOML.

use std::path::PathBuf;
use std::time::Duration;

use fbmirror_types::HardwareButton;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub buttons: ButtonConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Key code injected for `button`, honouring `[buttons]` overrides.
    pub fn key_code(&self, button: HardwareButton) -> u16 {
        self.buttons.code(button)
    }
}

/// How frames reach the paint surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Background capture worker woken on every refresh tick.
    #[default]
    Async,
    /// Capture and convert inside the expose handler.
    Sync,
}

/// Framebuffer device and refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_fb_device")]
    pub device: PathBuf,
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
    #[serde(default)]
    pub mode: RenderMode,
}

impl DisplayConfig {
    /// Refresh tick period. Zero is bumped to one millisecond.
    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms.max(1))
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            device: default_fb_device(),
            refresh_ms: default_refresh_ms(),
            mode: RenderMode::default(),
        }
    }
}

/// Input device settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_input_device")]
    pub device: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device: default_input_device(),
        }
    }
}

/// Optional per-button key code overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ButtonConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_up: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_down: Option<u16>,
}

impl ButtonConfig {
    pub fn code(&self, button: HardwareButton) -> u16 {
        let over = match button {
            HardwareButton::Back => self.back,
            HardwareButton::Home => self.home,
            HardwareButton::Menu => self.menu,
            HardwareButton::Search => self.search,
            HardwareButton::Power => self.power,
            HardwareButton::VolumeUp => self.volume_up,
            HardwareButton::VolumeDown => self.volume_down,
        };
        over.unwrap_or_else(|| button.default_code())
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_fb_device() -> PathBuf {
    PathBuf::from("/dev/fb0")
}

fn default_input_device() -> PathBuf {
    PathBuf::from("/dev/input/event2")
}

fn default_refresh_ms() -> u64 {
    33
}

fn default_log_level() -> String {
    "info".to_string()
}
