//! In-memory transport doubles

use crate::error::TransportError;
use crate::transport::traits::{ConnectionListener, ListenerFactory, TransportStream};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};

/// Stream used by tests: a real in-memory pipe or one that always fails
pub enum TestStream {
    Duplex(DuplexStream),
    Failing,
    /// Reads never complete, writes fail; counts its own drop
    Stalled(DropCounter),
}

/// Increments a shared counter when dropped
pub struct DropCounter(Arc<AtomicUsize>);

impl DropCounter {
    pub fn new(drops: Arc<AtomicUsize>) -> Self {
        Self(drops)
    }
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl TestStream {
    /// Connected pair; the second half plays the peer
    pub fn pair() -> (TestStream, DuplexStream) {
        let (local, remote) = tokio::io::duplex(256);
        (TestStream::Duplex(local), remote)
    }
}

fn broken() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "link lost")
}

impl AsyncRead for TestStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TestStream::Duplex(inner) => Pin::new(inner).poll_read(cx, buf),
            TestStream::Failing => Poll::Ready(Err(broken())),
            TestStream::Stalled(_) => Poll::Pending,
        }
    }
}

impl AsyncWrite for TestStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            TestStream::Duplex(inner) => Pin::new(inner).poll_write(cx, buf),
            TestStream::Failing | TestStream::Stalled(_) => Poll::Ready(Err(broken())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TestStream::Duplex(inner) => Pin::new(inner).poll_flush(cx),
            TestStream::Failing | TestStream::Stalled(_) => Poll::Ready(Err(broken())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TestStream::Duplex(inner) => Pin::new(inner).poll_shutdown(cx),
            TestStream::Failing | TestStream::Stalled(_) => Poll::Ready(Ok(())),
        }
    }
}

impl TransportStream for TestStream {
    fn peer_label(&self) -> String {
        match self {
            TestStream::Duplex(_) => "memory".into(),
            TestStream::Failing => "failing".into(),
            TestStream::Stalled(_) => "stalled".into(),
        }
    }
}

/// What the next listener will do when accepted on
pub enum ListenPlan {
    Accept(TestStream),
    FailAccept,
}

/// Counters shared between a factory and its listeners
#[derive(Debug, Default)]
pub struct ListenCounters {
    pub listens: AtomicUsize,
    pub accepts: AtomicUsize,
    pub closed: AtomicUsize,
}

/// Factory that hands out scripted listeners in order
pub struct ScriptedFactory {
    plans: Mutex<VecDeque<ListenPlan>>,
    pub counters: Arc<ListenCounters>,
}

impl ScriptedFactory {
    pub fn new(plans: Vec<ListenPlan>) -> Self {
        Self {
            plans: Mutex::new(plans.into()),
            counters: Arc::new(ListenCounters::default()),
        }
    }
}

pub struct ScriptedListener {
    plan: Option<ListenPlan>,
    counters: Arc<ListenCounters>,
}

impl ScriptedListener {
    pub fn new(plan: ListenPlan, counters: Arc<ListenCounters>) -> Self {
        Self {
            plan: Some(plan),
            counters,
        }
    }
}

impl Drop for ScriptedListener {
    fn drop(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ListenerFactory for ScriptedFactory {
    type Listener = ScriptedListener;

    async fn listen(&self) -> Result<Self::Listener, TransportError> {
        self.counters.listens.fetch_add(1, Ordering::SeqCst);
        let plan = self
            .plans
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Listen("no more plans".into()))?;
        Ok(ScriptedListener::new(plan, self.counters.clone()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[async_trait]
impl ConnectionListener for ScriptedListener {
    type Stream = TestStream;

    async fn accept(&mut self) -> Result<Self::Stream, TransportError> {
        self.counters.accepts.fetch_add(1, Ordering::SeqCst);
        match self.plan.take() {
            Some(ListenPlan::Accept(stream)) => Ok(stream),
            Some(ListenPlan::FailAccept) => Err(TransportError::Accept("scripted failure".into())),
            None => Err(TransportError::Accept("listener already used".into())),
        }
    }
}
