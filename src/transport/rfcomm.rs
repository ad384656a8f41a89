//! RFCOMM transport implementation for Bluetooth connections

use crate::error::TransportError;
use crate::transport::traits::{ConnectionListener, ListenerFactory, TransportStream};
use async_trait::async_trait;
use bluer::rfcomm::{Profile, ProfileHandle, Role, Stream as RfcommStream};
use bluer::{Address, Uuid};
use edroid_shared::service::{DEFAULT_CHANNEL, SERVICE_NAME, SERVICE_UUID};
use futures::StreamExt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::info;

/// RFCOMM stream wrapper implementing TransportStream
pub struct RfcommTransportStream {
    inner: RfcommStream,
    peer_addr: Address,
}

impl RfcommTransportStream {
    /// Create a new RFCOMM transport stream
    pub fn new(stream: RfcommStream, peer_addr: Address) -> Self {
        Self {
            inner: stream,
            peer_addr,
        }
    }
}

impl AsyncRead for RfcommTransportStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for RfcommTransportStream {
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

impl TransportStream for RfcommTransportStream {
    fn peer_label(&self) -> String {
        self.peer_addr.to_string()
    }
}

/// Configuration for the RFCOMM service record
#[derive(Debug, Clone)]
pub struct RfcommConfig {
    /// Service name advertised to the peer
    pub service_name: String,
    /// Service UUID agreed with the peer
    pub service_uuid: Uuid,
    /// RFCOMM channel number
    pub channel: u8,
}

impl Default for RfcommConfig {
    fn default() -> Self {
        Self {
            service_name: SERVICE_NAME.into(),
            service_uuid: Uuid::from_u128(SERVICE_UUID),
            channel: DEFAULT_CHANNEL,
        }
    }
}

impl RfcommConfig {
    fn profile(&self) -> Profile {
        Profile {
            uuid: self.service_uuid,
            name: Some(self.service_name.clone()),
            channel: Some(self.channel.into()),
            role: Some(Role::Server),
            require_authentication: Some(false),
            require_authorization: Some(false),
            ..Default::default()
        }
    }
}

/// Opens RFCOMM server profiles through BlueZ
pub struct RfcommListenerFactory {
    config: RfcommConfig,
}

impl RfcommListenerFactory {
    pub fn new(config: RfcommConfig) -> Self {
        Self { config }
    }
}

/// A registered RFCOMM server profile
///
/// The profile is unregistered when this value is dropped.
pub struct RfcommListener {
    _session: bluer::Session,
    handle: ProfileHandle,
}

#[async_trait]
impl ListenerFactory for RfcommListenerFactory {
    type Listener = RfcommListener;

    async fn listen(&self) -> Result<Self::Listener, TransportError> {
        let session = bluer::Session::new()
            .await
            .map_err(|e| TransportError::Listen(e.to_string()))?;
        let adapter = session
            .default_adapter()
            .await
            .map_err(|e| TransportError::Listen(e.to_string()))?;
        adapter
            .set_powered(true)
            .await
            .map_err(|e| TransportError::Listen(e.to_string()))?;

        let handle = session
            .register_profile(self.config.profile())
            .await
            .map_err(|e| TransportError::Listen(format!("profile registration: {}", e)))?;

        info!(
            "[BT] Listening as '{}' ({}) on {} channel {}",
            self.config.service_name,
            self.config.service_uuid,
            adapter.name(),
            self.config.channel
        );

        Ok(RfcommListener {
            _session: session,
            handle,
        })
    }

    fn name(&self) -> &'static str {
        "Bluetooth"
    }
}

#[async_trait]
impl ConnectionListener for RfcommListener {
    type Stream = RfcommTransportStream;

    async fn accept(&mut self) -> Result<Self::Stream, TransportError> {
        let request = self
            .handle
            .next()
            .await
            .ok_or_else(|| TransportError::Accept("profile unregistered".into()))?;

        let peer_addr = request.device();
        let stream = request
            .accept()
            .map_err(|e| TransportError::Accept(e.to_string()))?;

        info!("[BT] Accepted connection from {}", peer_addr);
        Ok(RfcommTransportStream::new(stream, peer_addr))
    }
}
