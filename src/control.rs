//! Run state and session configuration shared across tasks

use edroid_shared::{RunEvent, RunState, RunStateMachine, SessionConfig, TransitionResult};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Mode and parameters that gate and shape the outbound stream
///
/// Configuration is only changed through the command interpreter. Run-state
/// events come from the interpreter and the connection lifecycle.
#[derive(Debug)]
pub struct StreamControl {
    fsm: RwLock<RunStateMachine>,
    config: RwLock<SessionConfig>,
}

impl StreamControl {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            fsm: RwLock::new(RunStateMachine::new()),
            config: RwLock::new(config),
        }
    }

    /// Current run state
    pub async fn run_state(&self) -> RunState {
        self.fsm.read().await.state()
    }

    /// Snapshot of the session configuration
    pub async fn config(&self) -> SessionConfig {
        *self.config.read().await
    }

    /// Feed an event to the run-state machine
    pub async fn apply(&self, event: RunEvent) -> TransitionResult {
        let result = self.fsm.write().await.process_event(event);
        match result {
            TransitionResult::Changed { from, to } => info!("[STATE] {} -> {}", from, to),
            TransitionResult::Unchanged(state) => debug!("[STATE] {:?} keeps {}", event, state),
            TransitionResult::Invalid { from, event } => {
                debug!("[STATE] Ignored {:?} while {}", event, from)
            }
        }
        result
    }

    pub(crate) async fn update_config(&self, update: impl FnOnce(&mut SessionConfig)) -> SessionConfig {
        let mut config = self.config.write().await;
        update(&mut config);
        *config
    }
}

impl Default for StreamControl {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
