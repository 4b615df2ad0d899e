use crate::channel::{InboundUpdate, PlayerState};
use std::time::Duration;

/// Why a session completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// Early-stop threshold reached and playback paused
    EarlyStop,
    /// The embed reported the ended state
    EndedSignal,
    /// Wall-clock fallback expired without an ended signal
    Timeout,
}

/// Treats an explicit ended state and a wall-clock timeout as equivalent
/// completion triggers. Only engaged for sessions that auto-advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionDetector {
    timeout: Duration,
}

impl CompletionDetector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Signal path: state `0` from either inbound shape
    pub fn is_ended_signal(&self, update: &InboundUpdate) -> bool {
        update.player_state == Some(PlayerState::Ended)
    }
}

/// Monotonic completed flag shared by every completion trigger of a session
#[derive(Debug, Clone, Default)]
pub struct CompletionLatch {
    reason: Option<CompletionReason>,
}

impl CompletionLatch {
    /// Check-and-set. Only the first caller gets `true`.
    pub fn try_complete(&mut self, reason: CompletionReason) -> bool {
        if self.reason.is_some() {
            return false;
        }
        self.reason = Some(reason);
        true
    }

    pub fn is_completed(&self) -> bool {
        self.reason.is_some()
    }

    pub fn reason(&self) -> Option<CompletionReason> {
        self.reason
    }
}
