//! Recording event sink for testing.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use fbmirror_types::InjectedEvent;

use crate::error::InputError;
use crate::EventSink;

/// Shared state for observing what `MockSink` did.
#[derive(Debug, Default)]
struct MockSinkState {
    written: Vec<InjectedEvent>,
    attempts: usize,
    fail_at: HashSet<usize>,
    fail_all: bool,
}

/// Mock sink that records every successfully written event.
pub struct MockSink {
    state: Arc<Mutex<MockSinkState>>,
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockSinkState::default())),
        }
    }

    /// Get a clonable handle for observing the sink from tests.
    pub fn handle(&self) -> MockSinkHandle {
        MockSinkHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl EventSink for MockSink {
    fn write_event(&mut self, event: InjectedEvent) -> Result<(), InputError> {
        let mut state = self.state.lock().unwrap();
        let attempt = state.attempts;
        state.attempts += 1;
        if state.fail_all || state.fail_at.contains(&attempt) {
            return Err(InputError::Write(format!("mock failure at write {attempt}")));
        }
        state.written.push(event);
        Ok(())
    }
}

/// Clonable observer handle for `MockSink`.
#[derive(Clone)]
pub struct MockSinkHandle {
    state: Arc<Mutex<MockSinkState>>,
}

impl MockSinkHandle {
    /// Events that reached the sink, in order.
    pub fn written(&self) -> Vec<InjectedEvent> {
        self.state.lock().unwrap().written.clone()
    }

    /// Write attempts so far, failed ones included.
    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }

    /// Fail the writes with these zero-based attempt numbers.
    pub fn fail_writes(&self, attempts: &[usize]) {
        self.state
            .lock()
            .unwrap()
            .fail_at
            .extend(attempts.iter().copied());
    }

    /// Fail every write from now on (or stop failing).
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().fail_all = failing;
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().written.clear();
    }
}
