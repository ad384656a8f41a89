//! Single-peer connection acceptor

use crate::error::TransportError;
use crate::transport::ConnectionListener;
use tracing::{debug, warn};

/// Acceptor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptorState {
    /// Waiting for the one peer
    Listening,
    /// A peer was accepted and the listener released
    Bound,
    /// Accept failed; this acceptor is finished
    Closed,
}

/// Accepts exactly one connection from a listener
///
/// The listener is released as soon as `accept` returns, whatever the
/// outcome. A new acceptor is needed to listen again.
pub struct Acceptor<L: ConnectionListener> {
    listener: Option<L>,
    state: AcceptorState,
}

impl<L: ConnectionListener> Acceptor<L> {
    pub fn new(listener: L) -> Self {
        Self {
            listener: Some(listener),
            state: AcceptorState::Listening,
        }
    }

    pub fn state(&self) -> AcceptorState {
        self.state
    }

    /// Block until a peer connects
    pub async fn accept(&mut self) -> Result<L::Stream, TransportError> {
        let listener = self.listener.as_mut().ok_or(TransportError::NotListening)?;
        let result = listener.accept().await;
        self.listener = None;

        match result {
            Ok(stream) => {
                debug!("[ACCEPT] Bound, listener released");
                self.state = AcceptorState::Bound;
                Ok(stream)
            }
            Err(e) => {
                warn!("[ACCEPT] {}", e);
                self.state = AcceptorState::Closed;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::{ListenCounters, ListenPlan, ScriptedListener, TestStream};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_accept_binds_and_releases_listener() {
        let counters = Arc::new(ListenCounters::default());
        let (stream, _peer) = TestStream::pair();
        let listener = ScriptedListener::new(ListenPlan::Accept(stream), counters.clone());
        let mut acceptor = Acceptor::new(listener);
        assert_eq!(acceptor.state(), AcceptorState::Listening);

        assert!(acceptor.accept().await.is_ok());
        assert_eq!(acceptor.state(), AcceptorState::Bound);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_second_accept_after_bound() {
        let counters = Arc::new(ListenCounters::default());
        let (stream, _peer) = TestStream::pair();
        let listener = ScriptedListener::new(ListenPlan::Accept(stream), counters.clone());
        let mut acceptor = Acceptor::new(listener);

        acceptor.accept().await.expect("first accept");
        let second = acceptor.accept().await;

        assert!(matches!(second, Err(TransportError::NotListening)));
        assert_eq!(counters.accepts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_accept_failure_closes_without_retry() {
        let counters = Arc::new(ListenCounters::default());
        let listener = ScriptedListener::new(ListenPlan::FailAccept, counters.clone());
        let mut acceptor = Acceptor::new(listener);

        assert!(matches!(acceptor.accept().await, Err(TransportError::Accept(_))));
        assert_eq!(acceptor.state(), AcceptorState::Closed);
        assert!(matches!(acceptor.accept().await, Err(TransportError::NotListening)));
        assert_eq!(counters.accepts.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }
}
