//! Frame rendering.
//!
//! Two models are offered. [`RenderScheduler`] owns the frame source on a
//! dedicated `fb-capture` thread and converts into a back buffer whenever a
//! refresh tick wakes it; the finished frame is swapped into the shared
//! surface under a lock, so painting never sees a half-written frame. At most
//! one capture pass is ever in flight: a tick that arrives while the worker
//! is busy is dropped, not queued. [`SyncRenderer`] does the whole capture
//! inline when asked to paint.
//!
//! In both models a failed pass leaves the last good frame in place.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use fbmirror_display::{capture_frame, FrameSource};
use fbmirror_types::{DisplayGeometry, Frame};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::config::RenderMode;
use crate::error::SessionError;

/// Where converted frames are shown. Stands in for the window's drawing area.
pub trait PaintSurface: Send + 'static {
    fn blit(&mut self, frame: &Frame);
}

/// Render counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Successful capture passes.
    pub frames_rendered: u64,
    /// Capture passes that failed and left the previous frame in place.
    pub capture_failures: u64,
    /// Wake ticks dropped because a pass was already running.
    pub ticks_skipped: u64,
}

/// Result of one refresh tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeOutcome {
    /// The worker was idle and has been handed a pass.
    Dispatched,
    /// A pass is still running; this tick was dropped.
    Skipped,
    /// The worker has been shut down.
    Stopped,
}

#[derive(Debug, Default)]
struct Counters {
    frames: AtomicU64,
    failures: AtomicU64,
    skipped: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> FrameStats {
        FrameStats {
            frames_rendered: self.frames.load(Ordering::SeqCst),
            capture_failures: self.failures.load(Ordering::SeqCst),
            ticks_skipped: self.skipped.load(Ordering::SeqCst),
        }
    }
}

struct Shared {
    busy: AtomicBool,
    surface: Mutex<Frame>,
    counters: Counters,
}

fn lock_surface(surface: &Mutex<Frame>) -> MutexGuard<'_, Frame> {
    // A frame is plain bytes; a panic mid-blit cannot leave it inconsistent.
    surface.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Background capture with a double-buffered surface.
pub struct RenderScheduler {
    geometry: DisplayGeometry,
    shared: Arc<Shared>,
    wake_tx: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<Box<dyn FrameSource>>>,
}

impl RenderScheduler {
    /// Spawn the capture worker. The surface starts out black.
    pub fn start(source: Box<dyn FrameSource>) -> Result<Self, SessionError> {
        let geometry = source.geometry();
        let shared = Arc::new(Shared {
            busy: AtomicBool::new(false),
            surface: Mutex::new(Frame::new(geometry.width, geometry.height)),
            counters: Counters::default(),
        });
        // Capacity 1: the busy flag already guarantees a single wake in flight.
        let (wake_tx, wake_rx) = mpsc::channel(1);

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("fb-capture".to_string())
            .spawn(move || capture_worker(source, wake_rx, &worker_shared))
            .map_err(|e| SessionError::Worker(format!("failed to spawn capture thread: {e}")))?;

        info!(
            width = geometry.width,
            height = geometry.height,
            "capture worker started"
        );
        Ok(Self {
            geometry,
            shared,
            wake_tx: Some(wake_tx),
            worker: Some(worker),
        })
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    /// Request a capture pass unless one is already running.
    pub fn wake(&self) -> WakeOutcome {
        let Some(wake_tx) = &self.wake_tx else {
            return WakeOutcome::Stopped;
        };
        if self
            .shared
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.shared.counters.skipped.fetch_add(1, Ordering::SeqCst);
            trace!("capture pass still running, tick skipped");
            return WakeOutcome::Skipped;
        }

        match wake_tx.try_send(()) {
            Ok(()) => WakeOutcome::Dispatched,
            Err(mpsc::error::TrySendError::Full(())) => {
                // Only reachable if the worker has not drained a previous
                // wake yet; treat like a busy worker.
                self.shared.busy.store(false, Ordering::Release);
                self.shared.counters.skipped.fetch_add(1, Ordering::SeqCst);
                WakeOutcome::Skipped
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                self.shared.busy.store(false, Ordering::Release);
                warn!("capture worker is gone");
                WakeOutcome::Stopped
            }
        }
    }

    /// Whether a capture pass is in flight.
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    /// Run `f` against the current frame, holding the surface lock.
    ///
    /// The worker cannot swap in a new frame until `f` returns.
    pub fn with_frame<R>(&self, f: impl FnOnce(&Frame) -> R) -> R {
        let frame = lock_surface(&self.shared.surface);
        f(&frame)
    }

    pub fn stats(&self) -> FrameStats {
        self.shared.counters.snapshot()
    }

    /// Stop accepting wakes, wait for the worker to finish its current pass
    /// and release the frame source. Idempotent.
    pub fn shutdown(&mut self) -> Result<(), SessionError> {
        // Dropping the sender ends the worker's receive loop.
        drop(self.wake_tx.take());
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        match worker.join() {
            Ok(source) => {
                drop(source);
                info!("capture worker stopped, framebuffer released");
                Ok(())
            }
            Err(_) => Err(SessionError::Worker("capture worker panicked".to_string())),
        }
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "capture worker did not stop cleanly");
        }
    }
}

fn capture_worker(
    mut source: Box<dyn FrameSource>,
    mut wake_rx: mpsc::Receiver<()>,
    shared: &Shared,
) -> Box<dyn FrameSource> {
    let geometry = source.geometry();
    let mut back = Frame::new(geometry.width, geometry.height);

    while wake_rx.blocking_recv().is_some() {
        match capture_frame(source.as_mut(), &mut back) {
            Ok(()) => {
                std::mem::swap(&mut *lock_surface(&shared.surface), &mut back);
                shared.counters.frames.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                shared.counters.failures.fetch_add(1, Ordering::SeqCst);
                warn!(error = %e, "capture pass failed, keeping previous frame");
            }
        }
        shared.busy.store(false, Ordering::Release);
    }

    debug!("wake channel closed");
    source
}

/// Capture, convert and paint in one call, on the caller's thread.
pub struct SyncRenderer {
    source: Option<Box<dyn FrameSource>>,
    geometry: DisplayGeometry,
    front: Frame,
    back: Frame,
    stats: FrameStats,
}

impl SyncRenderer {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        let geometry = source.geometry();
        Self {
            source: Some(source),
            geometry,
            front: Frame::new(geometry.width, geometry.height),
            back: Frame::new(geometry.width, geometry.height),
            stats: FrameStats::default(),
        }
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    /// Capture a fresh frame and blit it. On failure the previous frame is
    /// blitted instead.
    pub fn paint(&mut self, surface: &mut dyn PaintSurface) {
        if let Some(source) = self.source.as_mut() {
            match capture_frame(source.as_mut(), &mut self.back) {
                Ok(()) => {
                    std::mem::swap(&mut self.front, &mut self.back);
                    self.stats.frames_rendered += 1;
                }
                Err(e) => {
                    self.stats.capture_failures += 1;
                    warn!(error = %e, "capture failed, repainting previous frame");
                }
            }
        }
        surface.blit(&self.front);
    }

    pub fn frame(&self) -> &Frame {
        &self.front
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Release the frame source. Later paints repeat the last frame.
    pub fn shutdown(&mut self) {
        if self.source.take().is_some() {
            info!("framebuffer released");
        }
    }
}

/// The render model selected by configuration.
pub enum Renderer {
    Async(RenderScheduler),
    Sync(SyncRenderer),
}

impl Renderer {
    pub fn start(mode: RenderMode, source: Box<dyn FrameSource>) -> Result<Self, SessionError> {
        match mode {
            RenderMode::Async => Ok(Self::Async(RenderScheduler::start(source)?)),
            RenderMode::Sync => Ok(Self::Sync(SyncRenderer::new(source))),
        }
    }

    pub fn mode(&self) -> RenderMode {
        match self {
            Self::Async(_) => RenderMode::Async,
            Self::Sync(_) => RenderMode::Sync,
        }
    }

    pub fn geometry(&self) -> DisplayGeometry {
        match self {
            Self::Async(scheduler) => scheduler.geometry(),
            Self::Sync(renderer) => renderer.geometry(),
        }
    }

    /// Whether refresh ticks drive captures.
    pub fn tick_driven(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    /// Refresh tick. The synchronous model has no worker to wake.
    pub fn tick(&self) -> Option<WakeOutcome> {
        match self {
            Self::Async(scheduler) => Some(scheduler.wake()),
            Self::Sync(_) => None,
        }
    }

    /// Handle an expose request.
    pub fn paint(&mut self, surface: &mut dyn PaintSurface) {
        match self {
            Self::Async(scheduler) => scheduler.with_frame(|frame| surface.blit(frame)),
            Self::Sync(renderer) => renderer.paint(surface),
        }
    }

    pub fn stats(&self) -> FrameStats {
        match self {
            Self::Async(scheduler) => scheduler.stats(),
            Self::Sync(renderer) => renderer.stats(),
        }
    }

    pub fn shutdown(&mut self) -> Result<(), SessionError> {
        match self {
            Self::Async(scheduler) => scheduler.shutdown(),
            Self::Sync(renderer) => {
                renderer.shutdown();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use fbmirror_display::mock::{MockFramebuffer, MockFramebufferHandle};

    use super::*;

    const RED: u16 = 0x001F;
    const GREEN: u16 = 0x07E0;

    fn wait_until(cond: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        cond()
    }

    fn scheduler() -> (RenderScheduler, MockFramebufferHandle) {
        let (source, handle) = MockFramebuffer::new(DisplayGeometry::packed(4, 2, 2));
        (RenderScheduler::start(Box::new(source)).unwrap(), handle)
    }

    #[derive(Default)]
    struct LastFrame(Option<Frame>);

    impl PaintSurface for LastFrame {
        fn blit(&mut self, frame: &Frame) {
            self.0 = Some(frame.clone());
        }
    }

    #[test]
    fn surface_starts_black() {
        let (scheduler, _handle) = scheduler();
        scheduler.with_frame(|frame| {
            assert_eq!((frame.width(), frame.height()), (4, 2));
            assert!(frame.data().iter().all(|&b| b == 0));
        });
    }

    #[test]
    fn wake_runs_one_pass() {
        let (scheduler, handle) = scheduler();
        handle.fill(RED);
        assert_eq!(scheduler.wake(), WakeOutcome::Dispatched);
        assert!(wait_until(|| scheduler.stats().frames_rendered == 1));
        assert!(wait_until(|| !scheduler.is_busy()));
        scheduler.with_frame(|frame| assert_eq!(frame.pixel(3, 1), Some([248, 0, 0])));
    }

    #[test]
    fn at_most_one_pass_in_flight() {
        let (scheduler, handle) = scheduler();
        handle.hold();
        assert_eq!(scheduler.wake(), WakeOutcome::Dispatched);
        assert!(wait_until(|| handle.read_count() == 1));

        for _ in 0..10 {
            assert_eq!(scheduler.wake(), WakeOutcome::Skipped);
        }
        assert!(scheduler.is_busy());
        assert_eq!(scheduler.stats().ticks_skipped, 10);

        handle.release();
        assert!(wait_until(|| !scheduler.is_busy()));
        let stats = scheduler.stats();
        assert_eq!(stats.frames_rendered, 1);
        assert_eq!(handle.read_count(), 1);

        // Skipped ticks were dropped, not queued.
        thread::sleep(Duration::from_millis(20));
        assert_eq!(handle.read_count(), 1);

        assert_eq!(scheduler.wake(), WakeOutcome::Dispatched);
        assert!(wait_until(|| scheduler.stats().frames_rendered == 2));
    }

    #[test]
    fn failed_pass_keeps_previous_frame() {
        let (scheduler, handle) = scheduler();
        handle.fill(RED);
        scheduler.wake();
        assert!(wait_until(|| !scheduler.is_busy() && scheduler.stats().frames_rendered == 1));
        let before = scheduler.with_frame(Clone::clone);

        handle.fill(GREEN);
        handle.set_failing(true);
        assert_eq!(scheduler.wake(), WakeOutcome::Dispatched);
        assert!(wait_until(|| scheduler.stats().capture_failures == 1));
        assert!(wait_until(|| !scheduler.is_busy()));

        let after = scheduler.with_frame(Clone::clone);
        assert_eq!(before, after);
        assert_eq!(scheduler.stats().frames_rendered, 1);

        handle.set_failing(false);
        scheduler.wake();
        assert!(wait_until(|| scheduler.stats().frames_rendered == 2));
        scheduler.with_frame(|frame| assert_eq!(frame.pixel(0, 0), Some([0, 252, 0])));
    }

    #[test]
    fn wake_after_shutdown_is_stopped() {
        let (mut scheduler, handle) = scheduler();
        scheduler.shutdown().unwrap();
        assert_eq!(scheduler.wake(), WakeOutcome::Stopped);
        assert_eq!(handle.read_count(), 0);
        // Second shutdown is a no-op.
        scheduler.shutdown().unwrap();
    }

    #[test]
    fn shutdown_waits_for_running_pass() {
        let (mut scheduler, handle) = scheduler();
        handle.hold();
        scheduler.wake();
        assert!(wait_until(|| handle.read_count() == 1));

        let releaser = {
            let handle = handle.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                handle.release();
            })
        };
        scheduler.shutdown().unwrap();
        assert_eq!(scheduler.stats().frames_rendered, 1);
        releaser.join().unwrap();
    }

    #[test]
    fn sync_renderer_captures_on_paint() {
        let (source, handle) = MockFramebuffer::new(DisplayGeometry::packed(4, 2, 2));
        let mut renderer = SyncRenderer::new(Box::new(source));
        let mut surface = LastFrame::default();

        handle.fill(RED);
        renderer.paint(&mut surface);
        assert_eq!(handle.read_count(), 1);
        assert_eq!(surface.0.as_ref().unwrap().pixel(1, 1), Some([248, 0, 0]));

        handle.fill(GREEN);
        handle.set_failing(true);
        renderer.paint(&mut surface);
        assert_eq!(surface.0.as_ref().unwrap().pixel(1, 1), Some([248, 0, 0]));
        assert_eq!(
            renderer.stats(),
            FrameStats {
                frames_rendered: 1,
                capture_failures: 1,
                ticks_skipped: 0,
            }
        );
    }

    #[test]
    fn renderer_tick_only_wakes_async() {
        let (source, handle) = MockFramebuffer::new(DisplayGeometry::packed(4, 2, 2));
        let mut renderer = Renderer::start(RenderMode::Sync, Box::new(source)).unwrap();
        assert_eq!(renderer.tick(), None);
        assert_eq!(handle.read_count(), 0);
        renderer.shutdown().unwrap();

        let (source, _handle) = MockFramebuffer::new(DisplayGeometry::packed(4, 2, 2));
        let mut renderer = Renderer::start(RenderMode::Async, Box::new(source)).unwrap();
        assert_eq!(renderer.mode(), RenderMode::Async);
        assert_eq!(renderer.tick(), Some(WakeOutcome::Dispatched));
        renderer.shutdown().unwrap();
    }
}
