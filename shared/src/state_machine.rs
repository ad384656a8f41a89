//! Run State Machine
//!
//! Tracks whether a peer is attached and whether frames should flow.
//! Transitions come only from connection lifecycle events and peer
//! commands, never from sensor data.

use std::fmt;

/// Streaming mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    /// No peer connected
    #[default]
    WaitingForClient,
    /// Peer connected, streaming gated off
    Stopped,
    /// Peer connected, averaged frames transmitted
    Running,
}

impl RunState {
    /// Whether frames may be transmitted in this state
    pub fn is_streaming(self) -> bool {
        self == RunState::Running
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::WaitingForClient => write!(f, "waiting for client"),
            RunState::Stopped => write!(f, "stopped"),
            RunState::Running => write!(f, "running"),
        }
    }
}

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    /// A peer connection was accepted
    PeerConnected,
    /// The active session closed
    PeerDisconnected,
    /// `R` command received
    RunCommand,
    /// `S` command received
    StopCommand,
}

/// Result of a state transition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// State changed
    Changed { from: RunState, to: RunState },
    /// Transition was valid but the state was already the target
    Unchanged(RunState),
    /// Transition was invalid from current state
    Invalid { from: RunState, event: RunEvent },
}

/// The run-state machine
#[derive(Debug, Default)]
pub struct RunStateMachine {
    current_state: RunState,
}

impl RunStateMachine {
    /// Create a new state machine waiting for a client
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> RunState {
        self.current_state
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: RunEvent) -> TransitionResult {
        let from = self.current_state;
        match Self::next_state(from, event) {
            Some(to) if to == from => TransitionResult::Unchanged(to),
            Some(to) => {
                self.current_state = to;
                TransitionResult::Changed { from, to }
            }
            None => TransitionResult::Invalid { from, event },
        }
    }

    /// Get the next state for a given event, if the transition is valid
    fn next_state(from: RunState, event: RunEvent) -> Option<RunState> {
        use RunEvent::*;
        use RunState::*;

        match (from, event) {
            (_, PeerDisconnected) => Some(WaitingForClient),
            (WaitingForClient, PeerConnected) => Some(Stopped),
            (Stopped | Running, RunCommand) => Some(Running),
            (Stopped | Running, StopCommand) => Some(Stopped),
            _ => None,
        }
    }
}
