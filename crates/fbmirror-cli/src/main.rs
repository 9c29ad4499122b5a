//! fbmirror CLI: mirror a guest framebuffer and drive its touchscreen.

#[cfg(feature = "linux")]
mod commands;
#[cfg_attr(not(feature = "linux"), allow(dead_code))]
mod script;
#[cfg_attr(not(feature = "linux"), allow(dead_code))]
mod surface;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fbmirror_session::config::{Config, RenderMode};
use fbmirror_types::{HardwareButton, Region};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fbmirror",
    about = "Mirror a guest framebuffer and inject touch and key input",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Framebuffer device, overriding the configuration.
    #[arg(long, global = true)]
    fb_device: Option<PathBuf>,

    /// Input event device, overriding the configuration.
    #[arg(long, global = true)]
    input_device: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show framebuffer geometry and touchscreen axis ranges.
    Info,

    /// Capture one frame to a file.
    Capture {
        /// Output file.
        #[arg(short, long)]
        output: PathBuf,

        /// Write raw RGB565 bytes instead of a PPM image.
        #[arg(long)]
        raw: bool,

        /// Only capture X,Y,WIDTH,HEIGHT of the visible window.
        #[arg(long, value_parser = parse_region)]
        region: Option<Region>,
    },

    /// Tap a hardware button (back, home, menu, search, power, volume-up, volume-down).
    Tap { button: HardwareButton },

    /// Touch and release at a point of the displayed image.
    Touch { x: i32, y: i32 },

    /// Mirror the display, reading pointer commands from stdin.
    Run {
        /// Write every painted frame to this PPM file.
        #[arg(long)]
        dump: Option<PathBuf>,

        /// Capture inside the paint handler instead of on a worker thread.
        #[arg(long)]
        sync: bool,
    },
}

fn parse_region(s: &str) -> Result<Region, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<u32>().map_err(|e| format!("`{p}`: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match parts[..] {
        [x, y, width, height] => Ok(Region::new(x, y, width, height)),
        _ => Err("expected X,Y,WIDTH,HEIGHT".to_string()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = fbmirror_session::setup::load_config(cli.config.as_deref())?;
    if let Some(device) = cli.fb_device {
        config.display.device = device;
    }
    if let Some(device) = cli.input_device {
        config.input.device = device;
    }
    if let Commands::Run { sync: true, .. } = cli.command {
        config.display.mode = RenderMode::Sync;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    dispatch(cli.command, &config)
}

#[cfg(feature = "linux")]
fn dispatch(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Info => commands::info(config),
        Commands::Capture {
            output,
            raw,
            region,
        } => commands::capture(config, &output, raw, region),
        Commands::Tap { button } => commands::tap(config, button),
        Commands::Touch { x, y } => commands::touch(config, x, y),
        Commands::Run { dump, .. } => commands::run(config, dump),
    }
}

#[cfg(not(feature = "linux"))]
fn dispatch(_command: Commands, _config: &Config) -> anyhow::Result<()> {
    anyhow::bail!("fbmirror was built without device support (enable the `linux` feature)")
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_region() {
        assert_eq!(parse_region("1,2,30,40"), Ok(Region::new(1, 2, 30, 40)));
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("a,2,3,4").is_err());
    }

    #[test]
    fn parses_tap_button() {
        let cli = Cli::try_parse_from(["fbmirror", "tap", "volume-down"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Tap {
                button: HardwareButton::VolumeDown
            }
        ));
        assert!(Cli::try_parse_from(["fbmirror", "tap", "jump"]).is_err());
    }

    #[test]
    fn global_device_overrides() {
        let cli = Cli::try_parse_from([
            "fbmirror",
            "run",
            "--fb-device",
            "/dev/fb1",
            "--sync",
        ])
        .unwrap();
        assert_eq!(cli.fb_device, Some(PathBuf::from("/dev/fb1")));
        assert!(matches!(cli.command, Commands::Run { sync: true, .. }));
    }
}
