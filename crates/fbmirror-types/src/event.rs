//! Injected input events.
//!
//! Every interaction on the displayed image becomes a short, fixed-order
//! sequence of these records, written straight to the guest's input node.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::axis::Axis;

/// evdev `BTN_TOUCH`.
pub const BTN_TOUCH: u16 = 0x14a;

const EV_SYN: u16 = 0x00;
const EV_KEY: u16 = 0x01;
const EV_ABS: u16 = 0x03;
const SYN_REPORT: u16 = 0;

/// One evdev-style record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedEvent {
    /// Key or button state change.
    Key { code: u16, pressed: bool },

    /// Absolute axis value, already in device coordinates.
    Absolute { axis: Axis, value: i32 },

    /// End of a report.
    Sync,
}

impl InjectedEvent {
    #[must_use]
    pub fn key(code: u16, pressed: bool) -> Self {
        Self::Key { code, pressed }
    }

    #[must_use]
    pub fn absolute(axis: Axis, value: i32) -> Self {
        Self::Absolute { axis, value }
    }

    /// The `(type, code, value)` triple written to the device.
    #[must_use]
    pub fn to_raw(self) -> (u16, u16, i32) {
        match self {
            Self::Key { code, pressed } => (EV_KEY, code, i32::from(pressed)),
            Self::Absolute { axis, value } => (EV_ABS, axis.code(), value),
            Self::Sync => (EV_SYN, SYN_REPORT, 0),
        }
    }
}

/// Phase of a single-pointer touch interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
}

/// Emulated hardware buttons of the guest device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HardwareButton {
    Back,
    Home,
    Menu,
    Search,
    Power,
    VolumeUp,
    VolumeDown,
}

impl HardwareButton {
    pub const ALL: [Self; 7] = [
        Self::Back,
        Self::Home,
        Self::Menu,
        Self::Search,
        Self::Power,
        Self::VolumeUp,
        Self::VolumeDown,
    ];

    /// The evdev key code sent unless the configuration overrides it.
    #[must_use]
    pub fn default_code(self) -> u16 {
        match self {
            Self::Back => 158,       // KEY_BACK
            Self::Home => 172,       // KEY_HOMEPAGE
            Self::Menu => 139,       // KEY_MENU
            Self::Search => 217,     // KEY_SEARCH
            Self::Power => 116,      // KEY_POWER
            Self::VolumeUp => 115,   // KEY_VOLUMEUP
            Self::VolumeDown => 114, // KEY_VOLUMEDOWN
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Back => "back",
            Self::Home => "home",
            Self::Menu => "menu",
            Self::Search => "search",
            Self::Power => "power",
            Self::VolumeUp => "volume-up",
            Self::VolumeDown => "volume-down",
        }
    }
}

impl fmt::Display for HardwareButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown button: {0}")]
pub struct ParseButtonError(pub String);

impl FromStr for HardwareButton {
    type Err = ParseButtonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|b| b.name() == wanted)
            .ok_or_else(|| ParseButtonError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_triples() {
        assert_eq!(InjectedEvent::key(BTN_TOUCH, true).to_raw(), (1, 0x14a, 1));
        assert_eq!(InjectedEvent::key(158, false).to_raw(), (1, 158, 0));
        assert_eq!(InjectedEvent::absolute(Axis::Y, 77).to_raw(), (3, 1, 77));
        assert_eq!(InjectedEvent::Sync.to_raw(), (0, 0, 0));
    }

    #[test]
    fn button_names_parse() {
        assert_eq!("Back".parse::<HardwareButton>(), Ok(HardwareButton::Back));
        assert_eq!(
            "volume_up".parse::<HardwareButton>(),
            Ok(HardwareButton::VolumeUp)
        );
        assert!("joystick".parse::<HardwareButton>().is_err());
        for button in HardwareButton::ALL {
            assert_eq!(button.to_string().parse::<HardwareButton>(), Ok(button));
        }
    }

    #[test]
    fn default_key_codes() {
        assert_eq!(HardwareButton::Back.default_code(), 158);
        assert_eq!(HardwareButton::Home.default_code(), 172);
        assert_eq!(HardwareButton::Menu.default_code(), 139);
    }

    #[test]
    fn button_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            button: HardwareButton,
        }
        let parsed: Wrapper = toml::from_str("button = \"volume-down\"").unwrap();
        assert_eq!(parsed.button, HardwareButton::VolumeDown);
    }
}
