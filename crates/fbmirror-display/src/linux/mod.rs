//! Linux fbdev backend.

mod fbdev;

pub use fbdev::{FramebufferDevice, LinuxFramebuffer};
