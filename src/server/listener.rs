//! Timing server listener
//!
//! Handles the TCP accept loop and spawns one session task per appliance
//! connection, so simultaneous connections (or a reconnect racing the old
//! session's teardown) never block each other.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::{watch, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::server::config::ServerConfig;
use crate::server::session::TimingSession;
use crate::service::RaceDisplayService;

/// Timing feed server
pub struct TimingServer {
    config: ServerConfig,
    service: Arc<RaceDisplayService>,
    next_session_id: AtomicU64,
    started: AtomicBool,
    cancel: CancellationToken,
    connection_semaphore: Option<Arc<Semaphore>>,
    bound_tx: watch::Sender<Option<SocketAddr>>,
}

impl TimingServer {
    /// Create a new server sharing the given service state
    pub fn new(config: ServerConfig, service: Arc<RaceDisplayService>) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };
        let (bound_tx, _) = watch::channel(None);

        Self {
            config,
            service,
            next_session_id: AtomicU64::new(1),
            started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            connection_semaphore,
            bound_tx,
        }
    }

    /// Get a reference to the shared service state
    pub fn service(&self) -> &Arc<RaceDisplayService> {
        &self.service
    }

    /// Address the listener actually bound to, once bound
    ///
    /// Useful with a port-0 config; resolves after `run`/`start` has bound.
    pub async fn wait_bound(&self) -> Option<SocketAddr> {
        let mut rx = self.bound_tx.subscribe();
        loop {
            if let Some(addr) = *rx.borrow() {
                return Some(addr);
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }

    /// Start the accept loop on the current runtime
    ///
    /// Idempotent: the first call spawns the listener and returns `true`;
    /// any later call is a successful no-op returning `false`. Repeated
    /// start requests from the surrounding system must not stack listeners
    /// on the same port.
    pub fn start(self: &Arc<Self>) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Timing server already running, start ignored");
            return false;
        }

        let server = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                tracing::error!(error = %e, "Timing server stopped with error");
            }
        });
        true
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind_listener()?;
        let addr = listener.local_addr()?;
        self.bound_tx.send_replace(Some(addr));
        tracing::info!(addr = %addr, "Timing server listening");

        tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    /// Run the server until the given future completes
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown => {
                self.shutdown();
                Ok(())
            }
            result = self.run() => result,
        }
    }

    /// Stop the accept loop and all in-flight sessions
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Bind with SO_REUSEADDR so a restart after a crash does not trip over
    /// the old socket lingering in TIME_WAIT
    fn bind_listener(&self) -> Result<TcpListener> {
        let addr = self.config.bind_addr;
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        Ok(socket.listen(128)?)
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match Arc::clone(sem).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::warn!(session_id = session_id, error = %e, "Failed to set TCP_NODELAY");
            }
        }

        let config = self.config.clone();
        let service = Arc::clone(&self.service);
        let cancel = self.cancel.child_token();

        tokio::spawn(async move {
            let _permit = permit;
            let mut session =
                TimingSession::new(session_id, socket, peer_addr, config, service, cancel);

            // A failed session must never take the acceptor or its sibling
            // sessions with it.
            if let Err(e) = session.run().await {
                tracing::warn!(session_id = session_id, error = %e, "Session ended with error");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ephemeral_config() -> ServerConfig {
        ServerConfig::with_addr("127.0.0.1:0".parse().unwrap())
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let config = ephemeral_config();
        let service = RaceDisplayService::new(&config);
        let server = Arc::new(TimingServer::new(config, service));

        assert!(server.start());
        assert!(!server.start());
        assert!(!server.start());

        server.wait_bound().await.unwrap();
        server.shutdown();
    }

    #[tokio::test]
    async fn test_binds_ephemeral_port() {
        let config = ephemeral_config();
        let service = RaceDisplayService::new(&config);
        let server = Arc::new(TimingServer::new(config, service));

        server.start();
        let addr = server.wait_bound().await.unwrap();
        assert_ne!(addr.port(), 0);

        server.shutdown();
    }

    #[tokio::test]
    async fn test_connection_limit_rejects_excess() {
        let config = ephemeral_config().max_connections(1);
        let service = RaceDisplayService::new(&config);
        let server = Arc::new(TimingServer::new(config, service));
        server.start();
        let addr = server.wait_bound().await.unwrap();

        // First connection is served: the negotiation arrives
        let first = TcpStream::connect(addr).await.unwrap();
        {
            use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
            let (read_half, mut write_half) = first.into_split();
            write_half.write_all(b"greeting\r\n").await.unwrap();

            let mut reader = BufReader::new(read_half);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            assert!(line.starts_with("RaceDisplay~"));

            // Second connection is dropped without negotiation
            let second = TcpStream::connect(addr).await.unwrap();
            let mut rejected = BufReader::new(second);
            let mut nothing = String::new();
            let n = rejected.read_line(&mut nothing).await.unwrap();
            assert_eq!(n, 0);
        }

        server.shutdown();
    }
}
