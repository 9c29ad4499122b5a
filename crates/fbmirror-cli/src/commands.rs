//! Subcommands that touch real devices.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use fbmirror_display::linux::FramebufferDevice;
use fbmirror_display::{convert, FrameSource};
use fbmirror_input::linux::EvdevSink;
use fbmirror_input::InjectionReport;
use fbmirror_session::config::Config;
use fbmirror_session::{setup, UiEvent};
use fbmirror_types::{Frame, HardwareButton, Region, TouchPhase};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::script;
use crate::surface::DumpSurface;

pub fn info(config: &Config) -> anyhow::Result<()> {
    let geometry = FramebufferDevice::open(&config.display.device)?.geometry();
    println!("Framebuffer: {}", config.display.device.display());
    println!("  visible:  {}x{}", geometry.width, geometry.height);
    println!(
        "  virtual:  {}x{}",
        geometry.virtual_width, geometry.virtual_height
    );
    println!("  offset:   {},{}", geometry.x_offset, geometry.y_offset);
    println!("  stride:   {} px", geometry.stride_pixels);
    println!("  depth:    {} bpp", geometry.bytes_per_pixel * 8);

    let sink = EvdevSink::open(&config.input.device)?;
    let ranges = sink.axis_ranges()?;
    println!("Touchscreen: {}", config.input.device.display());
    for (name, range) in [("x", ranges.x), ("y", ranges.y)] {
        if range.is_passthrough() {
            println!("  {name}: no maximum, coordinates passed through");
        } else {
            println!("  {name}: {}..={}", range.minimum, range.maximum);
        }
    }
    Ok(())
}

pub fn capture(
    config: &Config,
    output: &Path,
    raw: bool,
    region: Option<Region>,
) -> anyhow::Result<()> {
    let mut framebuffer = setup::open_framebuffer(&config.display)?;
    let geometry = framebuffer.geometry();
    let region = geometry.clamp(region.unwrap_or_else(|| geometry.visible()));

    let bytes = if raw {
        framebuffer.snapshot(region)?
    } else {
        let mut frame = Frame::new(region.width, region.height);
        let pixels = framebuffer.pixels()?;
        convert::convert_region(pixels, &geometry, region, frame.data_mut())?;
        frame.to_ppm()
    };
    std::fs::write(output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Captured {}x{} at {},{} to {}",
        region.width,
        region.height,
        region.x,
        region.y,
        output.display()
    );
    Ok(())
}

pub fn tap(config: &Config, button: HardwareButton) -> anyhow::Result<()> {
    let geometry = FramebufferDevice::open(&config.display.device)?.geometry();
    let mut injector = setup::open_injector(&config.input, &geometry)?;
    let code = config.key_code(button);
    info!(%button, code, "tapping button");
    check(injector.tap_key(code))
}

pub fn touch(config: &Config, x: i32, y: i32) -> anyhow::Result<()> {
    let geometry = FramebufferDevice::open(&config.display.device)?.geometry();
    let mut injector = setup::open_injector(&config.input, &geometry)?;
    let (dx, dy) = injector.mapper().map(x, y);
    info!(x, y, device_x = dx, device_y = dy, "touching");
    check(injector.touch(TouchPhase::Down, x, y))?;
    check(injector.touch(TouchPhase::Up, x, y))
}

fn check(report: InjectionReport) -> anyhow::Result<()> {
    if !report.is_complete() {
        bail!(
            "{} of {} event writes failed",
            report.failed,
            report.attempted
        );
    }
    Ok(())
}

pub fn run(config: &Config, dump: Option<PathBuf>) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_session(config, dump));
    // The stdin reader may still be parked in a blocking read.
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn run_session(config: &Config, dump: Option<PathBuf>) -> anyhow::Result<()> {
    let mut session = setup::open_session(config, Box::new(DumpSurface::new(dump)))?;

    tokio::spawn(feed_stdin(session.event_sender()));
    let interrupt = session.event_sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted");
            let _ = interrupt.send(UiEvent::Shutdown).await;
        }
    });

    session.run().await?;
    Ok(())
}

async fn feed_stdin(events: mpsc::Sender<UiEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match script::parse_line(&line) {
                Ok(Some(event)) => {
                    let quit = event == UiEvent::Shutdown;
                    if events.send(event).await.is_err() || quit {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, line = %line, "ignoring command"),
            },
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                break;
            }
        }
    }
    let _ = events.send(UiEvent::Shutdown).await;
}
