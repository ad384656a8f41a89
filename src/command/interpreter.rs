//! Command interpreter - applies inbound command bytes

use crate::control::StreamControl;
use crate::status::StatusReporter;
use edroid_shared::{Command, RunEvent, TransitionResult};
use std::sync::Arc;
use tracing::{debug, info};

/// Applies peer commands to the run state and session configuration
pub struct CommandInterpreter {
    control: Arc<StreamControl>,
    reporter: Arc<dyn StatusReporter>,
}

impl CommandInterpreter {
    /// Create a new command interpreter
    pub fn new(control: Arc<StreamControl>, reporter: Arc<dyn StatusReporter>) -> Self {
        Self { control, reporter }
    }

    /// Execute every command in a chunk, in order
    ///
    /// NUL bytes are skipped and unsupported bytes are reported; neither
    /// stops the rest of the chunk from being applied.
    pub async fn execute(&self, bytes: &[u8]) -> Vec<Command> {
        let commands = Command::parse_all(bytes);
        for command in &commands {
            self.apply(*command).await;
        }
        commands
    }

    async fn apply(&self, command: Command) {
        match command {
            Command::Run => self.transition(RunEvent::RunCommand, "Started").await,
            Command::Stop => self.transition(RunEvent::StopCommand, "Stopped").await,
            Command::Window { .. } => {
                let Some(samples) = command.window_samples() else {
                    return;
                };
                self.control
                    .update_config(|c| c.average_samples_amount = samples)
                    .await;
                info!("[CMD] Averaging window set to {}", samples);
                self.reporter
                    .report_status(&format!("Averaging {} samples", samples));
            }
            Command::Rate(rate) => {
                self.control
                    .update_config(|c| c.samples_per_second = rate)
                    .await;
                info!("[CMD] Output rate set to {}", rate);
                self.reporter.report_status(&format!("Rate {}", rate));
            }
            Command::Nul => {}
            Command::Unsupported(byte) => {
                debug!("[CMD] Unsupported byte 0x{:02x}", byte);
                self.reporter
                    .report_status(&format!("Unsupported: '{}'", byte as char));
            }
        }
    }

    async fn transition(&self, event: RunEvent, status: &str) {
        match self.control.apply(event).await {
            TransitionResult::Invalid { from, .. } => {
                debug!("[CMD] {:?} ignored while {}", event, from);
            }
            _ => self.reporter.report_status(status),
        }
    }
}
