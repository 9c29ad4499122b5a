//! Writing injected events to a `/dev/input/event*` node.

use std::path::{Path, PathBuf};

use evdev::{AbsoluteAxisCode, Device};
use fbmirror_types::{AxisRange, AxisRanges, InjectedEvent};
use tracing::{info, warn};

use super::keymap;
use crate::error::InputError;
use crate::EventSink;

/// The guest's virtual touchscreen/keyboard node, opened read/write.
pub struct EvdevSink {
    path: PathBuf,
    device: Device,
}

impl EvdevSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref().to_path_buf();
        let device = Device::open(&path)
            .map_err(|e| InputError::DeviceOpen(format!("{}: {e}", path.display())))?;
        info!(
            path = %path.display(),
            name = device.name().unwrap_or("Unknown Device"),
            "opened input device"
        );
        Ok(Self { path, device })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Query the declared X/Y ranges.
    ///
    /// An axis the device does not advertise reads as `{0, 0}`, which puts
    /// that axis in pass-through (emulator) mode.
    pub fn axis_ranges(&self) -> Result<AxisRanges, InputError> {
        let mut ranges = AxisRanges::default();
        let absinfo = self
            .device
            .get_absinfo()
            .map_err(|e| InputError::Query(format!("{}: {e}", self.path.display())))?;
        for (code, info) in absinfo {
            let range = AxisRange::new(info.minimum(), info.maximum());
            if code == AbsoluteAxisCode::ABS_X {
                ranges.x = range;
            } else if code == AbsoluteAxisCode::ABS_Y {
                ranges.y = range;
            }
        }

        for (name, range) in [("x", ranges.x), ("y", ranges.y)] {
            if range.is_passthrough() {
                warn!(axis = name, "touchscreen declares no maximum, using emulator mode");
            } else {
                info!(
                    axis = name,
                    min = range.minimum,
                    max = range.maximum,
                    "touchscreen axis range"
                );
            }
        }
        Ok(ranges)
    }
}

impl EventSink for EvdevSink {
    fn write_event(&mut self, event: InjectedEvent) -> Result<(), InputError> {
        self.device
            .send_events(&[keymap::to_evdev(event)])
            .map_err(|e| InputError::Write(e.to_string()))
    }
}
