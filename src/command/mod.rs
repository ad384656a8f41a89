//! Command handling for the peer link
//!
//! This module handles:
//! - Turning inbound command bytes into run-state events
//! - Applying window and rate changes to the session configuration
//! - Reporting each outcome to the status sink

mod interpreter;

pub use interpreter::CommandInterpreter;
