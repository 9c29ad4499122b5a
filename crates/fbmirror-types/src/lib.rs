//! Shared types for fbmirror.
//!
//! This crate contains the plain data passed between the display pipeline,
//! the input injector and the session: framebuffer geometry, converted
//! frames, absolute-axis ranges and the typed events written to the guest's
//! virtual input device.

pub mod axis;
pub mod event;
pub mod frame;
pub mod geometry;

pub use axis::{Axis, AxisRange, AxisRanges};
pub use event::{HardwareButton, InjectedEvent, ParseButtonError, TouchPhase, BTN_TOUCH};
pub use frame::{Frame, RGB_BYTES};
pub use geometry::{DisplayGeometry, GeometryError, Region};
