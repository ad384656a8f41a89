//! eDroid Shared Protocol Types
//!
//! This crate provides the frame codec, the command vocabulary and the
//! run-state machine shared by the streaming device and its peer.

pub mod codec;
pub mod command;
pub mod state_machine;

pub use codec::{CodecError, Frame, FrameDecoder, FrameFields, FRAME_SIZE};
pub use command::{Command, SampleRate};
pub use state_machine::{RunEvent, RunState, RunStateMachine, TransitionResult};

/// Service identity agreed with the peer out of band
pub mod service {
    /// Service record name advertised with the RFCOMM profile
    pub const SERVICE_NAME: &str = "copterland";

    /// Serial Port Profile UUID `00001101-0000-1000-8000-00805F9B34FB`
    pub const SERVICE_UUID: u128 = 0x0000_1101_0000_1000_8000_0080_5F9B_34FB;

    /// Default RFCOMM channel
    pub const DEFAULT_CHANNEL: u8 = 1;
}

/// Protocol sizing parameters
pub mod limits {
    /// Inbound command bytes read per transport read
    pub const COMMAND_CHUNK_SIZE: usize = 8;

    /// Largest averaging window (2^7)
    pub const MAX_WINDOW: usize = 128;

    /// Largest window exponent a command can select
    pub const MAX_WINDOW_EXPONENT: u32 = 7;
}

/// Mutable streaming parameters controlled by the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Number of raw samples combined into one averaged frame
    pub average_samples_amount: usize,
    /// Outbound frame cadence
    pub samples_per_second: SampleRate,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            average_samples_amount: 8,
            samples_per_second: SampleRate::Hz25,
        }
    }
}
