//! Session orchestration for fbmirror.
//!
//! Wires the framebuffer source and the input injector together behind a
//! single event loop: periodic ticks drive the background capture worker,
//! UI events (pointer, buttons, expose requests) arrive over a channel and
//! are turned into injected sequences or blits of the current frame.

pub mod config;
pub mod error;
pub mod scheduler;
pub mod session;
pub mod setup;
pub mod state;

pub use config::{Config, RenderMode};
pub use error::SessionError;
pub use scheduler::{FrameStats, PaintSurface, RenderScheduler, Renderer, SyncRenderer, WakeOutcome};
pub use session::{Session, SessionStatus, UiEvent};
pub use state::PointerState;
