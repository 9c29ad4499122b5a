//! The UI-facing event loop.

use std::time::Duration;

use fbmirror_input::InputInjector;
use fbmirror_types::HardwareButton;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::{ButtonConfig, Config};
use crate::error::SessionError;
use crate::scheduler::{PaintSurface, Renderer, WakeOutcome};
use crate::state::PointerState;

/// Events processed by the session's main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Primary button pressed at a window position.
    PointerDown { x: i32, y: i32 },
    /// Pointer moved; `held` is the primary button state.
    PointerMove { x: i32, y: i32, held: bool },
    /// Primary button released.
    PointerUp { x: i32, y: i32 },
    /// A hardware button was activated.
    Button(HardwareButton),
    /// Tap an arbitrary key code.
    Key(u16),
    /// The window needs repainting.
    Expose,
    /// Shutdown signal.
    Shutdown,
}

/// Observable session status, published over a watch channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub frames_rendered: u64,
    pub capture_failures: u64,
    pub ticks_skipped: u64,
    pub injection_failures: u64,
    pub exposes: u64,
    pub touch_down: bool,
}

/// Ties a renderer, an input injector and a paint surface together.
pub struct Session {
    renderer: Renderer,
    injector: InputInjector,
    surface: Box<dyn PaintSurface>,
    buttons: ButtonConfig,
    refresh: Duration,
    pointer: PointerState,
    exposes: u64,
    event_tx: mpsc::Sender<UiEvent>,
    event_rx: mpsc::Receiver<UiEvent>,
    status_tx: watch::Sender<SessionStatus>,
}

impl Session {
    pub fn new(
        config: &Config,
        renderer: Renderer,
        injector: InputInjector,
        surface: Box<dyn PaintSurface>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (status_tx, _) = watch::channel(SessionStatus::default());
        Self {
            renderer,
            injector,
            surface,
            buttons: config.buttons.clone(),
            refresh: config.display.refresh(),
            pointer: PointerState::default(),
            exposes: 0,
            event_tx,
            event_rx,
            status_tx,
        }
    }

    /// Get a clone of the event sender for feeding UI events into the session.
    pub fn event_sender(&self) -> mpsc::Sender<UiEvent> {
        self.event_tx.clone()
    }

    /// Subscribe to status updates.
    pub fn status_receiver(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Run until [`UiEvent::Shutdown`], then stop the renderer.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        let mut ticker = tokio::time::interval(self.refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let wakes_worker = self.renderer.tick_driven();

        info!(
            mode = ?self.renderer.mode(),
            refresh = ?self.refresh,
            "session running"
        );

        loop {
            tokio::select! {
                _ = ticker.tick(), if wakes_worker => {
                    if self.renderer.tick() == Some(WakeOutcome::Stopped) {
                        debug!("renderer stopped, ignoring tick");
                    }
                }
                event = self.event_rx.recv() => {
                    match event {
                        Some(UiEvent::Shutdown) | None => {
                            info!("shutting down");
                            break;
                        }
                        Some(event) => self.handle_event(event),
                    }
                }
            }
            self.publish_status();
        }

        let result = self.renderer.shutdown();
        self.publish_status();
        result
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::PointerDown { x, y } => {
                let phase = self.pointer.press(x, y);
                self.injector.touch(phase, x, y);
            }
            UiEvent::PointerMove { x, y, held } => {
                if let Some(phase) = self.pointer.motion(x, y, held) {
                    self.injector.touch(phase, x, y);
                }
            }
            UiEvent::PointerUp { x, y } => {
                let phase = self.pointer.release(x, y);
                self.injector.touch(phase, x, y);
            }
            UiEvent::Button(button) => {
                let code = self.buttons.code(button);
                debug!(%button, code, "hardware button");
                self.injector.tap_key(code);
            }
            UiEvent::Key(code) => {
                self.injector.tap_key(code);
            }
            UiEvent::Expose => {
                self.renderer.paint(self.surface.as_mut());
                self.exposes += 1;
            }
            UiEvent::Shutdown => {}
        }
    }

    fn publish_status(&self) {
        let stats = self.renderer.stats();
        let status = SessionStatus {
            frames_rendered: stats.frames_rendered,
            capture_failures: stats.capture_failures,
            ticks_skipped: stats.ticks_skipped,
            injection_failures: self.injector.failures(),
            exposes: self.exposes,
            touch_down: self.pointer.is_down(),
        };
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}
