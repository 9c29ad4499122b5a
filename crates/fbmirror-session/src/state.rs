//! Pointer state machine.
//!
//! The window reports presses, releases and motion with a "button held"
//! flag. Presses and releases can be lost (focus changes, grabs), so motion
//! is reconciled against the last known touch state before anything is
//! injected.

use fbmirror_types::TouchPhase;

/// Last known touch contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerState {
    down: bool,
    x: i32,
    y: i32,
}

impl PointerState {
    pub fn is_down(&self) -> bool {
        self.down
    }

    /// Last position seen, in host coordinates.
    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Primary button pressed.
    pub fn press(&mut self, x: i32, y: i32) -> TouchPhase {
        self.set_position(x, y);
        self.down = true;
        TouchPhase::Down
    }

    /// Pointer moved, with the primary button held or not.
    ///
    /// Returns the phase to inject, or `None` for hover motion.
    pub fn motion(&mut self, x: i32, y: i32, held: bool) -> Option<TouchPhase> {
        self.set_position(x, y);
        match (self.down, held) {
            (false, false) => None,
            (false, true) => {
                self.down = true;
                Some(TouchPhase::Down)
            }
            (true, true) => Some(TouchPhase::Move),
            (true, false) => {
                self.down = false;
                Some(TouchPhase::Up)
            }
        }
    }

    /// Primary button released. Always produces a release, even when no
    /// press was seen, so the guest never keeps a stuck contact.
    pub fn release(&mut self, x: i32, y: i32) -> TouchPhase {
        self.set_position(x, y);
        self.down = false;
        TouchPhase::Up
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_move_release() {
        let mut state = PointerState::default();
        assert_eq!(state.press(1, 2), TouchPhase::Down);
        assert!(state.is_down());
        assert_eq!(state.motion(3, 4, true), Some(TouchPhase::Move));
        assert_eq!(state.release(5, 6), TouchPhase::Up);
        assert!(!state.is_down());
        assert_eq!(state.position(), (5, 6));
    }

    #[test]
    fn hover_is_ignored() {
        let mut state = PointerState::default();
        assert_eq!(state.motion(10, 10, false), None);
        assert!(!state.is_down());
        assert_eq!(state.position(), (10, 10));
    }

    #[test]
    fn held_motion_without_press_starts_touch() {
        let mut state = PointerState::default();
        assert_eq!(state.motion(7, 8, true), Some(TouchPhase::Down));
        assert!(state.is_down());
        assert_eq!(state.motion(9, 8, true), Some(TouchPhase::Move));
    }

    #[test]
    fn released_motion_while_down_ends_touch() {
        let mut state = PointerState::default();
        state.press(0, 0);
        assert_eq!(state.motion(1, 1, false), Some(TouchPhase::Up));
        assert!(!state.is_down());
        assert_eq!(state.motion(2, 2, false), None);
    }

    #[test]
    fn release_without_press_still_releases() {
        let mut state = PointerState::default();
        assert_eq!(state.release(3, 3), TouchPhase::Up);
        assert!(!state.is_down());
    }
}
