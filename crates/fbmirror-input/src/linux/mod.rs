//! evdev backend for Linux.

mod device;
pub mod keymap;

pub use device::EvdevSink;
