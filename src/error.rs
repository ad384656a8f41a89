//! Transport error taxonomy

use std::io;
use thiserror::Error;

/// Failures on the peer link
///
/// None of these are fatal to the process: read and write failures close
/// the affected session and the device returns to waiting for a client.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Listen failed: {0}")]
    Listen(String),

    #[error("Accept failed: {0}")]
    Accept(String),

    #[error("Read error: {0}")]
    Read(#[source] io::Error),

    #[error("Write error: {0}")]
    Write(#[source] io::Error),

    #[error("Session closed")]
    Closed,

    #[error("Acceptor is no longer listening")]
    NotListening,
}
