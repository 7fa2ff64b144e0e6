//! Accept loop of the protocol service.
//!
//! # Responsibilities
//! - Accept connections until shutdown
//! - Spawn one session task per connection, inside a `connection` span
//! - Drain open connections within the grace period, then release the port

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::config::FleetConfig;
use crate::dispatch::Dispatcher;
use crate::lifecycle::ShutdownSignal;
use crate::store::StoreGateway;

use super::connection::ConnectionTracker;
use super::listener::Listener;
use super::session::{Session, SessionSettings};

/// Pause after a failed accept, so a persistent error (e.g. EMFILE) does not
/// spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The TCP protocol service.
pub struct ProtocolServer {
    dispatcher: Dispatcher,
    settings: Arc<SessionSettings>,
    shutdown_grace: Duration,
    tracker: ConnectionTracker,
}

impl ProtocolServer {
    /// Create a server over an injected store.
    pub fn new(config: &FleetConfig, store: Arc<dyn StoreGateway>) -> Self {
        Self {
            dispatcher: Dispatcher::new(store),
            settings: Arc::new(SessionSettings::from_config(config)),
            shutdown_grace: Duration::from_secs(config.timeouts.shutdown_grace_secs),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Connection tracker, for observing open connections.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Serve until `shutdown` fires, then drain and drop the listener.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownSignal) {
        tracing::info!(
            address = %listener.local_addr(),
            idle_timeout_secs = self.settings.idle_timeout.as_secs(),
            "Protocol server accepting connections"
        );

        loop {
            let (stream, peer_addr) = tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
            };

            let guard = self.tracker.track();
            let span = tracing::info_span!(
                "connection",
                connection_id = %guard.id(),
                peer_addr = %peer_addr,
            );
            let session = Session::new(
                guard.id(),
                stream,
                self.dispatcher.clone(),
                Arc::clone(&self.settings),
            );
            let signal = shutdown.clone();

            tokio::spawn(
                async move {
                    tracing::debug!("Connection opened");
                    session.run(signal).await;
                    drop(guard);
                }
                .instrument(span),
            );
        }

        tracing::info!(
            active_connections = self.tracker.active_count(),
            grace_secs = self.shutdown_grace.as_secs(),
            "Shutdown requested, draining connections"
        );
        let remaining = self.tracker.wait_for_idle(self.shutdown_grace).await;
        if remaining > 0 {
            tracing::warn!(remaining, "Grace period elapsed with connections still open");
        }

        drop(listener);
        tracing::info!("Protocol server stopped");
    }
}
