//! Transport trait abstraction for pluggable link backends

use crate::error::TransportError;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// A connected byte stream to the peer
pub trait TransportStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {
    /// Human-readable peer identity for logs
    fn peer_label(&self) -> String;
}

/// An open listening endpoint
///
/// Dropping the listener releases the endpoint.
#[async_trait]
pub trait ConnectionListener: Send {
    /// The stream type this listener produces
    type Stream: TransportStream;

    /// Wait for one inbound connection
    async fn accept(&mut self) -> Result<Self::Stream, TransportError>;
}

/// Factory for opening listening endpoints
#[async_trait]
pub trait ListenerFactory: Send + Sync {
    /// The listener type this factory produces
    type Listener: ConnectionListener;

    /// Open a fresh listening endpoint
    async fn listen(&self) -> Result<Self::Listener, TransportError>;

    /// Human-readable name for this transport
    fn name(&self) -> &'static str;
}
