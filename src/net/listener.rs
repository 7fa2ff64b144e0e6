//! TCP listener for the protocol service.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Report bind and accept failures distinctly
//!
//! There is deliberately no connection limit here; admission control is the
//! store's pool.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to accept connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] std::io::Error),
}

/// The protocol service's listening socket.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let bind_error = |source| ListenerError::Bind {
            address: config.bind_address.clone(),
            source,
        };

        let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
            bind_error(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;
        let inner = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = inner.local_addr().map_err(bind_error)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    /// Accept the next connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let (stream, peer_addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(peer_addr = %peer_addr, error = %e, "Failed to set TCP_NODELAY");
        }
        tracing::debug!(peer_addr = %peer_addr, "Connection accepted");
        Ok((stream, peer_addr))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let listener = Listener::bind(&ListenerConfig {
            bind_address: "127.0.0.1:0".to_string(),
        })
        .await
        .unwrap();
        assert_ne!(listener.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn rejects_unparseable_address() {
        let error = Listener::bind(&ListenerConfig {
            bind_address: "not-an-address".to_string(),
        })
        .await
        .unwrap_err();
        assert!(matches!(error, ListenerError::Bind { .. }));
    }

    #[tokio::test]
    async fn port_in_use_is_bind_error() {
        let first = Listener::bind(&ListenerConfig {
            bind_address: "127.0.0.1:0".to_string(),
        })
        .await
        .unwrap();
        let error = Listener::bind(&ListenerConfig {
            bind_address: first.local_addr().to_string(),
        })
        .await
        .unwrap_err();
        assert!(error.to_string().contains("failed to bind"));
    }
}
