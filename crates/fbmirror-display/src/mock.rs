//! In-memory framebuffer for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use fbmirror_types::DisplayGeometry;

use crate::error::DisplayError;
use crate::FrameSource;

#[derive(Debug, Default)]
struct MockState {
    pixels: Mutex<Vec<u8>>,
    failing: AtomicBool,
    held: Mutex<bool>,
    released: Condvar,
    reads: AtomicUsize,
}

/// Mock framebuffer backed by a plain byte vector.
///
/// Tests drive it through a [`MockFramebufferHandle`]: replace the pixel
/// contents, make reads fail, or hold reads at a gate to simulate a slow
/// capture pass.
pub struct MockFramebuffer {
    geometry: DisplayGeometry,
    state: Arc<MockState>,
    local: Vec<u8>,
}

impl MockFramebuffer {
    /// Create a zero-filled framebuffer and a handle for controlling it.
    pub fn new(geometry: DisplayGeometry) -> (Self, MockFramebufferHandle) {
        let state = Arc::new(MockState::default());
        *state.pixels.lock().unwrap() = vec![0; geometry.required_len()];
        let source = Self {
            geometry,
            state: Arc::clone(&state),
            local: Vec::new(),
        };
        (source, MockFramebufferHandle { geometry, state })
    }
}

impl FrameSource for MockFramebuffer {
    fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    fn pixels(&mut self) -> Result<&[u8], DisplayError> {
        self.state.reads.fetch_add(1, Ordering::SeqCst);
        {
            let mut held = self.state.held.lock().unwrap();
            while *held {
                held = self.state.released.wait(held).unwrap();
            }
        }
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(DisplayError::Read("mock framebuffer unavailable".to_string()));
        }
        self.local.clone_from(&self.state.pixels.lock().unwrap());
        Ok(&self.local)
    }
}

/// Clonable control handle for [`MockFramebuffer`].
#[derive(Clone)]
pub struct MockFramebufferHandle {
    geometry: DisplayGeometry,
    state: Arc<MockState>,
}

impl MockFramebufferHandle {
    /// Replace the raw surface contents.
    pub fn set_pixels(&self, pixels: Vec<u8>) {
        *self.state.pixels.lock().unwrap() = pixels;
    }

    /// Fill every pixel slot with one RGB565 value.
    pub fn fill(&self, value: u16) {
        let bytes = value.to_le_bytes();
        let len = self.geometry.required_len();
        let pixels = bytes.iter().copied().cycle().take(len).collect();
        self.set_pixels(pixels);
    }

    /// Make every subsequent read fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Block readers until [`release`](Self::release) is called.
    pub fn hold(&self) {
        *self.state.held.lock().unwrap() = true;
    }

    pub fn release(&self) {
        *self.state.held.lock().unwrap() = false;
        self.state.released.notify_all();
    }

    /// Number of reads started so far.
    pub fn read_count(&self) -> usize {
        self.state.reads.load(Ordering::SeqCst)
    }
}
