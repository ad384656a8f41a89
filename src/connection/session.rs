//! Duplex session over one accepted peer stream

use crate::command::CommandInterpreter;
use crate::error::TransportError;
use crate::transport::TransportStream;
use edroid_shared::limits::COMMAND_CHUNK_SIZE;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

struct SessionInner {
    peer: String,
    writer: Mutex<Option<BoxedWriter>>,
    cancel: CancellationToken,
    closed: AtomicBool,
}

/// Handle to write to the session and to close it
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl SessionHandle {
    /// Peer identity for logs
    pub fn peer(&self) -> &str {
        &self.inner.peer
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Send exactly these bytes to the peer
    ///
    /// A transport failure closes the session before the error is returned.
    pub async fn write(&self, bytes: &[u8]) -> Result<(), TransportError> {
        let result = {
            let mut guard = self.inner.writer.lock().await;
            let writer = match guard.as_mut() {
                Some(writer) if !self.is_closed() => writer,
                _ => return Err(TransportError::Closed),
            };
            tokio::select! {
                _ = self.inner.cancel.cancelled() => Err(TransportError::Closed),
                written = async {
                    writer.write_all(bytes).await?;
                    writer.flush().await
                } => written.map_err(TransportError::Write),
            }
        };

        if let Err(TransportError::Write(e)) = &result {
            warn!("[SESSION] Write to {} failed: {}", self.peer(), e);
            self.close().await;
        }
        result
    }

    /// Tear the session down
    ///
    /// Only the first call has any effect and returns `true`. It unblocks
    /// the read loop and shuts the writer down. The closed signal follows
    /// once the read loop has released its half of the stream.
    pub async fn close(&self) -> bool {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.cancel.cancel();

        // An in-flight write observes the cancellation and releases the lock.
        let mut writer = self.inner.writer.lock().await;
        if let Some(mut half) = writer.take() {
            if let Err(e) = half.shutdown().await {
                debug!("[SESSION] Shutdown of {} failed: {}", self.peer(), e);
            }
        }
        drop(writer);

        info!("[SESSION] Closing connection to {}", self.peer());
        true
    }
}

/// Signal fired once both halves of the stream have been released
pub type SessionClosed = oneshot::Receiver<()>;

/// Owns one peer connection for its lifetime
pub struct Session;

impl Session {
    /// Split the stream and start the read loop
    ///
    /// Returns a handle for the write path and the closed signal.
    pub fn start<S: TransportStream>(
        stream: S,
        interpreter: Arc<CommandInterpreter>,
    ) -> (SessionHandle, SessionClosed) {
        let peer = stream.peer_label();
        let (reader, writer) = tokio::io::split(stream);
        let (closed_tx, closed_rx) = oneshot::channel();

        let handle = SessionHandle {
            inner: Arc::new(SessionInner {
                peer,
                writer: Mutex::new(Some(Box::new(writer))),
                cancel: CancellationToken::new(),
                closed: AtomicBool::new(false),
            }),
        };

        info!("[SESSION] Started with {}", handle.peer());
        tokio::spawn(read_loop(reader, handle.clone(), interpreter, closed_tx));

        (handle, closed_rx)
    }
}

async fn read_loop<R>(
    mut reader: R,
    handle: SessionHandle,
    interpreter: Arc<CommandInterpreter>,
    closed_tx: oneshot::Sender<()>,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; COMMAND_CHUNK_SIZE];

    loop {
        let read = tokio::select! {
            _ = handle.inner.cancel.cancelled() => break,
            read = reader.read(&mut buf) => read,
        };

        match read {
            Ok(0) => {
                info!("[SESSION] {} closed the connection", handle.peer());
                break;
            }
            Ok(n) => {
                debug!("[SESSION] {} command bytes from {}", n, handle.peer());
                interpreter.execute(&buf[..n]).await;
            }
            Err(e) => {
                warn!("[SESSION] {} from {}", TransportError::Read(e), handle.peer());
                break;
            }
        }
    }

    drop(reader);
    handle.close().await;

    // A close() racing this one may still hold the writer
    drop(handle.inner.writer.lock().await.take());

    info!("[SESSION] Closed connection to {}", handle.peer());
    let _ = closed_tx.send(());
}
