//! Recording phase transitions
//!
//! Normal path: `Idle -> Recording -> Idle`. Error path:
//! `Recording -> Cancelling -> Idle`. Recovery path:
//! `Recording -> Restarting -> Recording`. Invalid transitions are no-ops
//! that return false, so repeated start/stop commands are harmless.

use std::sync::Mutex;

/// Phase of the recording lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RecordingPhase {
    Idle,
    Recording,
    Cancelling,
    Restarting,
}

/// Thread-safe tracker of the current recording phase
#[derive(Debug)]
pub struct RecordingState {
    phase: Mutex<RecordingPhase>,
}

impl RecordingState {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(RecordingPhase::Idle),
        }
    }

    pub fn phase(&self) -> RecordingPhase {
        *self.phase.lock().expect("recording phase lock poisoned")
    }

    fn transition(&self, from: RecordingPhase, to: RecordingPhase) -> bool {
        let mut phase = self.phase.lock().expect("recording phase lock poisoned");
        if *phase == from {
            *phase = to;
            true
        } else {
            log::debug!(
                "recording transition {:?} -> {:?} ignored in phase {:?}",
                from,
                to,
                *phase
            );
            false
        }
    }

    /// `Idle -> Recording`; false when already recording (start is a no-op)
    pub fn begin_recording(&self) -> bool {
        self.transition(RecordingPhase::Idle, RecordingPhase::Recording)
    }

    /// `Recording -> Idle`; false when not recording (stop is a no-op)
    pub fn finish_recording(&self) -> bool {
        self.transition(RecordingPhase::Recording, RecordingPhase::Idle)
    }

    /// `Recording -> Cancelling`
    pub fn begin_cancel(&self) -> bool {
        self.transition(RecordingPhase::Recording, RecordingPhase::Cancelling)
    }

    /// `Cancelling -> Idle`
    pub fn finish_cancel(&self) -> bool {
        self.transition(RecordingPhase::Cancelling, RecordingPhase::Idle)
    }

    /// `Recording -> Restarting`
    pub fn begin_restart(&self) -> bool {
        self.transition(RecordingPhase::Recording, RecordingPhase::Restarting)
    }

    /// `Restarting -> Recording`
    pub fn finish_restart(&self) -> bool {
        self.transition(RecordingPhase::Restarting, RecordingPhase::Recording)
    }

    pub fn is_recording(&self) -> bool {
        self.phase() == RecordingPhase::Recording
    }
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_path() {
        let state = RecordingState::new();
        assert_eq!(state.phase(), RecordingPhase::Idle);
        assert!(state.begin_recording());
        assert!(state.is_recording());
        assert!(state.finish_recording());
        assert_eq!(state.phase(), RecordingPhase::Idle);
    }

    #[test]
    fn test_start_while_recording_is_noop() {
        let state = RecordingState::new();
        assert!(state.begin_recording());
        assert!(!state.begin_recording());
        assert!(state.is_recording());
    }

    #[test]
    fn test_stop_while_idle_is_noop() {
        let state = RecordingState::new();
        assert!(!state.finish_recording());
        assert_eq!(state.phase(), RecordingPhase::Idle);
    }

    #[test]
    fn test_cancel_path() {
        let state = RecordingState::new();
        state.begin_recording();
        assert!(state.begin_cancel());
        assert_eq!(state.phase(), RecordingPhase::Cancelling);
        assert!(state.finish_cancel());
        assert_eq!(state.phase(), RecordingPhase::Idle);
    }

    #[test]
    fn test_restart_path() {
        let state = RecordingState::new();
        state.begin_recording();
        assert!(state.begin_restart());
        assert!(state.finish_restart());
        assert!(state.is_recording());
    }

    #[test]
    fn test_cancel_requires_recording() {
        let state = RecordingState::new();
        assert!(!state.begin_cancel());
        assert!(!state.begin_restart());
    }
}
