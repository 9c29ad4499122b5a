//! Paint surface for headless runs.

use std::path::PathBuf;

use fbmirror_session::PaintSurface;
use fbmirror_types::Frame;
use tracing::{debug, info, warn};

/// Logs every blit and, with a dump path, writes the frame as PPM.
pub struct DumpSurface {
    path: Option<PathBuf>,
    blits: u64,
}

impl DumpSurface {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path, blits: 0 }
    }
}

impl PaintSurface for DumpSurface {
    fn blit(&mut self, frame: &Frame) {
        self.blits += 1;
        let Some(path) = &self.path else {
            info!(
                width = frame.width(),
                height = frame.height(),
                blit = self.blits,
                "frame painted"
            );
            return;
        };
        match std::fs::write(path, frame.to_ppm()) {
            Ok(()) => debug!(path = %path.display(), blit = self.blits, "frame dumped"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to dump frame"),
        }
    }
}
