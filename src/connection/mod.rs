//! Peer connection management
//!
//! This module handles:
//! - Accepting exactly one inbound peer at a time
//! - The duplex session over the accepted stream
//! - Restarting the listener once a session has fully closed

mod acceptor;
mod lifecycle;
pub(crate) mod session;

pub use lifecycle::{ActiveSession, Lifecycle, RestartPolicy};
