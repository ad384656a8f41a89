//! TCP transport implementation for Bluetooth-less development

use crate::error::TransportError;
use crate::transport::traits::{ConnectionListener, ListenerFactory, TransportStream};
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tracing::info;

/// TCP stream wrapper implementing TransportStream
pub struct TcpTransportStream {
    inner: TcpStream,
    peer_addr: SocketAddr,
}

impl TcpTransportStream {
    pub fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self {
            inner: stream,
            peer_addr,
        }
    }
}

impl AsyncRead for TcpTransportStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for TcpTransportStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl TransportStream for TcpTransportStream {
    fn peer_label(&self) -> String {
        self.peer_addr.to_string()
    }
}

/// Opens TCP listeners standing in for the RFCOMM service
pub struct TcpListenerFactory {
    address: String,
}

impl TcpListenerFactory {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

/// A bound TCP listener; the socket closes when dropped
pub struct TcpSimListener {
    inner: TcpListener,
}

impl TcpSimListener {
    /// Address the listener is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

#[async_trait]
impl ListenerFactory for TcpListenerFactory {
    type Listener = TcpSimListener;

    async fn listen(&self) -> Result<Self::Listener, TransportError> {
        let inner = TcpListener::bind(&self.address)
            .await
            .map_err(|e| TransportError::Listen(format!("{}: {}", self.address, e)))?;
        info!("[TCP] Listening on {}", self.address);
        Ok(TcpSimListener { inner })
    }

    fn name(&self) -> &'static str {
        "TCP simulation"
    }
}

#[async_trait]
impl ConnectionListener for TcpSimListener {
    type Stream = TcpTransportStream;

    async fn accept(&mut self) -> Result<Self::Stream, TransportError> {
        let (stream, peer_addr) = self
            .inner
            .accept()
            .await
            .map_err(|e| TransportError::Accept(e.to_string()))?;
        info!("[TCP] Accepted connection from {}", peer_addr);
        Ok(TcpTransportStream::new(stream, peer_addr))
    }
}
