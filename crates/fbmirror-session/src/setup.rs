//! Config loading and device startup.
//!
//! Startup order matters: the framebuffer is opened first because its
//! visible resolution is the host extent the input mapper scales against.
//! Any failure here is fatal.

use std::path::PathBuf;

use fbmirror_display::FrameSource;
use fbmirror_input::{CoordinateMapper, EventSink, InputInjector};
use fbmirror_types::AxisRanges;
use tracing::info;

use crate::config::Config;
use crate::error::SessionError;
use crate::scheduler::{PaintSurface, Renderer};
use crate::session::Session;

/// Load configuration from the given path, or the default location.
pub fn load_config(path: Option<&str>) -> Result<Config, SessionError> {
    let config_path = match path {
        Some(p) => PathBuf::from(p),
        None => default_config_path(),
    };

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| SessionError::Config(format!("failed to read config: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| SessionError::Config(format!("failed to parse config: {e}")))?;
        info!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else if path.is_some() {
        Err(SessionError::Config(format!(
            "config file {} does not exist",
            config_path.display()
        )))
    } else {
        info!("no config file found, using defaults");
        Ok(Config::default())
    }
}

/// Get the default config directory path.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("fbmirror")
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Build a session from already opened devices.
pub fn assemble_session(
    config: &Config,
    source: Box<dyn FrameSource>,
    sink: Box<dyn EventSink>,
    ranges: AxisRanges,
    surface: Box<dyn PaintSurface>,
) -> Result<Session, SessionError> {
    let geometry = source.geometry();
    let injector = InputInjector::new(sink, CoordinateMapper::new(ranges, &geometry));
    let renderer = Renderer::start(config.display.mode, source)?;
    Ok(Session::new(config, renderer, injector, surface))
}

#[cfg(feature = "linux")]
pub use self::linux::{open_framebuffer, open_injector, open_session};

#[cfg(feature = "linux")]
mod linux {
    use fbmirror_display::linux::LinuxFramebuffer;
    use fbmirror_input::linux::EvdevSink;
    use fbmirror_input::{CoordinateMapper, InputInjector};
    use fbmirror_types::DisplayGeometry;

    use super::assemble_session;
    use crate::config::{Config, DisplayConfig, InputConfig};
    use crate::error::SessionError;
    use crate::scheduler::PaintSurface;
    use crate::session::Session;

    /// Open, query and map the configured framebuffer.
    pub fn open_framebuffer(config: &DisplayConfig) -> Result<LinuxFramebuffer, SessionError> {
        Ok(LinuxFramebuffer::open(&config.device)?)
    }

    /// Open the configured input node and scale against `geometry`.
    pub fn open_injector(
        config: &InputConfig,
        geometry: &DisplayGeometry,
    ) -> Result<InputInjector, SessionError> {
        let sink = EvdevSink::open(&config.device)?;
        let ranges = sink.axis_ranges()?;
        Ok(InputInjector::new(
            Box::new(sink),
            CoordinateMapper::new(ranges, geometry),
        ))
    }

    /// Open both devices and build a session painting to `surface`.
    pub fn open_session(
        config: &Config,
        surface: Box<dyn PaintSurface>,
    ) -> Result<Session, SessionError> {
        let framebuffer = open_framebuffer(&config.display)?;
        let sink = EvdevSink::open(&config.input.device)?;
        let ranges = sink.axis_ranges()?;
        assemble_session(config, Box::new(framebuffer), Box::new(sink), ranges, surface)
    }
}
