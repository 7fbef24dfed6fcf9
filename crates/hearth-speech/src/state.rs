//! Voice capture states.
//!
//! A capture is one-shot, so the machine has exactly two states:
//! - Idle -> Listening (start)
//! - Listening -> Idle (result, error or stop)

use std::fmt;

/// Operational state of a speech input controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CaptureState {
    /// Not capturing. Ready to start.
    #[default]
    Idle,
    /// Microphone open, waiting for an utterance.
    Listening,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureState::Idle => write!(f, "Idle"),
            CaptureState::Listening => write!(f, "Listening"),
        }
    }
}

impl CaptureState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &CaptureState) -> bool {
        matches!(
            (self, target),
            (CaptureState::Idle, CaptureState::Listening)
                | (CaptureState::Listening, CaptureState::Idle)
        )
    }

    pub fn from_listening(listening: bool) -> Self {
        if listening {
            CaptureState::Listening
        } else {
            CaptureState::Idle
        }
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, CaptureState::Listening)
    }
}
