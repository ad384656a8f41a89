//! Listen, serve one peer, listen again

use super::acceptor::Acceptor;
use super::session::{Session, SessionHandle};
use crate::command::CommandInterpreter;
use crate::control::StreamControl;
use crate::error::TransportError;
use crate::status::StatusReporter;
use crate::transport::ListenerFactory;
use edroid_shared::RunEvent;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// What to do once a session has closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartPolicy {
    /// Listen for the next peer straight away
    #[default]
    AfterSession,
    /// Serve a single peer and return
    Once,
}

/// Session the emitter writes to, if any. Only the lifecycle writes it.
pub type ActiveSession = Arc<RwLock<Option<SessionHandle>>>;

/// Connection lifecycle supervisor
pub struct Lifecycle<F: ListenerFactory> {
    factory: F,
    control: Arc<StreamControl>,
    interpreter: Arc<CommandInterpreter>,
    reporter: Arc<dyn StatusReporter>,
    active: ActiveSession,
    policy: RestartPolicy,
}

impl<F: ListenerFactory> Lifecycle<F> {
    pub fn new(
        factory: F,
        control: Arc<StreamControl>,
        interpreter: Arc<CommandInterpreter>,
        reporter: Arc<dyn StatusReporter>,
        policy: RestartPolicy,
    ) -> Self {
        Self {
            factory,
            control,
            interpreter,
            reporter,
            active: Arc::new(RwLock::new(None)),
            policy,
        }
    }

    /// Shared slot holding the current session
    pub fn active_session(&self) -> ActiveSession {
        self.active.clone()
    }

    /// Serve peers until `shutdown` completes
    ///
    /// A listen or accept failure is reported and the device stays waiting
    /// for a client without listening again. Under `RestartPolicy::Once` this
    /// returns as soon as the lifecycle ends.
    pub async fn run_until<S>(&self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tokio::select! {
            served = self.run() => {
                if let Err(e) = served {
                    warn!("[LIFECYCLE] No longer listening: {}", e);
                    if self.policy == RestartPolicy::AfterSession {
                        shutdown.await;
                    }
                }
            }
            _ = &mut shutdown => info!("[LIFECYCLE] Shutdown requested"),
        }
    }

    /// Serve peers one after another until a listen or accept fails
    pub async fn run(&self) -> Result<(), TransportError> {
        loop {
            self.serve_one().await?;

            if self.policy == RestartPolicy::Once {
                info!("[LIFECYCLE] Single session finished");
                return Ok(());
            }
        }
    }

    async fn serve_one(&self) -> Result<(), TransportError> {
        self.reporter.report_status("Wait for client...");

        let listener = self.factory.listen().await.map_err(|e| {
            error!("[LIFECYCLE] {} listen failed: {}", self.factory.name(), e);
            self.reporter.report_status(&e.to_string());
            e
        })?;

        let mut acceptor = Acceptor::new(listener);
        let stream = acceptor.accept().await.map_err(|e| {
            error!("[LIFECYCLE] Acceptor {:?}: {}", acceptor.state(), e);
            self.reporter.report_status(&e.to_string());
            e
        })?;

        self.control.apply(RunEvent::PeerConnected).await;
        self.reporter.report_status("Connected");
        self.reporter.on_peer_connected();

        let (handle, closed) = Session::start(stream, self.interpreter.clone());
        *self.active.write().await = Some(handle.clone());

        match closed.await {
            Ok(()) => debug!("[LIFECYCLE] {} released", handle.peer()),
            Err(_) => warn!("[LIFECYCLE] Read loop for {} ended without signalling", handle.peer()),
        }

        *self.active.write().await = None;
        self.control.apply(RunEvent::PeerDisconnected).await;
        self.reporter.on_peer_disconnected();
        self.reporter.report_status("Disconnected");
        info!("[LIFECYCLE] Session with {} ended", handle.peer());

        Ok(())
    }
}
