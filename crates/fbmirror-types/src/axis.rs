//! Absolute-axis ranges published by the guest's virtual input device.

use serde::{Deserialize, Serialize};

/// An absolute axis the injector writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// The evdev `ABS_*` code for this axis.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::X => 0x00,
            Self::Y => 0x01,
        }
    }
}

/// Declared minimum/maximum of one axis.
///
/// A `maximum` of zero is a sentinel: the device declared no range and
/// coordinates are passed through unscaled ("emulator mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisRange {
    pub minimum: i32,
    pub maximum: i32,
}

impl AxisRange {
    #[must_use]
    pub fn new(minimum: i32, maximum: i32) -> Self {
        Self { minimum, maximum }
    }

    /// Whether this axis passes coordinates through unscaled.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.maximum == 0
    }
}

/// The ranges of both axes, queried once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisRanges {
    pub x: AxisRange,
    pub y: AxisRange,
}

impl AxisRanges {
    #[must_use]
    pub fn new(x: AxisRange, y: AxisRange) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn get(&self, axis: Axis) -> AxisRange {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}
