//! Touch and key injection into the guest's virtual input device.
//!
//! Pointer coordinates from the displayed image are scaled into the device's
//! declared axis ranges by [`CoordinateMapper`], then [`InputInjector`]
//! writes the fixed evdev sequence for each interaction to an
//! [`EventSink`]. The evdev sink lives behind the `linux` feature; a
//! recording sink for tests behind `mock`.

use fbmirror_types::InjectedEvent;

pub mod error;
pub mod injector;
#[cfg(feature = "linux")]
pub mod linux;
pub mod mapper;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::InputError;
pub use injector::{InjectionReport, InputInjector};
pub use mapper::CoordinateMapper;

/// Destination for injected records, normally a `/dev/input/event*` node.
pub trait EventSink: Send + 'static {
    /// Write one timestamped record.
    fn write_event(&mut self, event: InjectedEvent) -> Result<(), InputError>;
}
