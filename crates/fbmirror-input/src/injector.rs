//! Serialises touch and key interactions into evdev sequences.
//!
//! The order of every sequence is fixed by the consuming device: button
//! state first, then X, then Y, sync last. Each record is written on its
//! own; a failed write is logged and the rest of the sequence is still
//! attempted. No compensating events are sent after a partial sequence.

use fbmirror_types::{Axis, InjectedEvent, TouchPhase, BTN_TOUCH};
use tracing::{debug, warn};

use crate::mapper::CoordinateMapper;
use crate::EventSink;

/// The records for one touch phase, in device coordinates.
pub fn touch_sequence(phase: TouchPhase, x: i32, y: i32) -> Vec<InjectedEvent> {
    let mut events = Vec::with_capacity(4);
    match phase {
        TouchPhase::Down => events.push(InjectedEvent::key(BTN_TOUCH, true)),
        TouchPhase::Up => events.push(InjectedEvent::key(BTN_TOUCH, false)),
        TouchPhase::Move => {}
    }
    events.push(InjectedEvent::absolute(Axis::X, x));
    events.push(InjectedEvent::absolute(Axis::Y, y));
    events.push(InjectedEvent::Sync);
    events
}

/// A synthetic press immediately followed by a release.
pub fn tap_sequence(code: u16) -> [InjectedEvent; 2] {
    [InjectedEvent::key(code, true), InjectedEvent::key(code, false)]
}

/// Outcome of writing one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InjectionReport {
    pub attempted: usize,
    pub failed: usize,
}

impl InjectionReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Writes pointer and key interactions to an [`EventSink`].
pub struct InputInjector {
    sink: Box<dyn EventSink>,
    mapper: CoordinateMapper,
    failures: u64,
}

impl InputInjector {
    pub fn new(sink: Box<dyn EventSink>, mapper: CoordinateMapper) -> Self {
        Self {
            sink,
            mapper,
            failures: 0,
        }
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Total failed writes since creation.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Inject one touch phase at host position (`x`, `y`).
    pub fn touch(&mut self, phase: TouchPhase, x: i32, y: i32) -> InjectionReport {
        let (dx, dy) = self.mapper.map(x, y);
        let report = self.emit(&touch_sequence(phase, dx, dy));
        debug!(?phase, x = dx, y = dy, failed = report.failed, "injected touch");
        report
    }

    /// Inject a press/release tap of `code`.
    pub fn tap_key(&mut self, code: u16) -> InjectionReport {
        let report = self.emit(&tap_sequence(code));
        debug!(code, failed = report.failed, "injected key tap");
        report
    }

    fn emit(&mut self, events: &[InjectedEvent]) -> InjectionReport {
        let mut report = InjectionReport::default();
        for &event in events {
            report.attempted += 1;
            if let Err(e) = self.sink.write_event(event) {
                warn!(?event, error = %e, "write event failed");
                report.failed += 1;
                self.failures += 1;
            }
        }
        report
    }
}
