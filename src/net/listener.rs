//! Connection server: bind, readiness, accept loop and shutdown.
//!
//! # Responsibilities
//! - Resolve the configured host/port and bind exactly one listener
//! - Publish readiness so `get_address` callers wake without polling
//! - Accept connections and hand each one to its own task
//! - Close the listener on `shutdown`, ending the accept loop
//!
//! # Design Decisions
//! - Every state transition happens while the listener mutex is held
//! - A closed listener ends `start` with [`ServerError::ListenerClosed`],
//!   which callers can tell apart from a real accept failure
//! - No retries: bind and accept failures are terminal

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex, OwnedSemaphorePermit, Semaphore};

use crate::config::{validate_config, ConfigError, ServerConfig};
use crate::net::connection::{handle_connection, ConnectionGuard};

/// Error type for server lifecycle operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Address could not be resolved or bound.
    #[error("failed to bind: {0}")]
    Bind(#[source] io::Error),

    /// Accepting a connection failed for a reason other than shutdown.
    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),

    /// The listener was closed by `shutdown`.
    #[error("use of closed listener")]
    ListenerClosed,

    /// No listener was ever bound.
    #[error("server not started")]
    NotStarted,

    /// `start` was called on a server that is already listening.
    #[error("server already started")]
    AlreadyStarted,
}

impl ServerError {
    /// True for the expected termination signal produced by `shutdown`.
    pub fn is_listener_closed(&self) -> bool {
        matches!(self, ServerError::ListenerClosed)
    }
}

/// Lifecycle state of a [`Server`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Unbound,
    Listening(SocketAddr),
    /// Terminal. `bound` keeps the address if a listener was ever bound.
    Closed { bound: Option<SocketAddr> },
}

impl ServerState {
    pub fn is_closed(&self) -> bool {
        matches!(self, ServerState::Closed { .. })
    }

    fn bound_addr(&self) -> Option<SocketAddr> {
        match *self {
            ServerState::Unbound => None,
            ServerState::Listening(addr) => Some(addr),
            ServerState::Closed { bound } => bound,
        }
    }
}

/// A TCP server that answers every connection with a fixed reply.
///
/// Share it behind an `Arc` to call `get_address` or `shutdown` while
/// another task is blocked in `start`.
pub struct Server {
    config: ServerConfig,
    /// The bound listener. Binding and shutdown only mutate it under this lock.
    listener: Mutex<Option<Arc<TcpListener>>>,
    /// Readiness and closure signal.
    state: watch::Sender<ServerState>,
    connection_limit: Option<Arc<Semaphore>>,
}

impl Server {
    /// Create an uncapped server for `host` and `port`.
    ///
    /// The address is not checked until `start`.
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self::build(ServerConfig::new(host, port))
    }

    /// Create a server from validated settings.
    pub fn with_config(config: ServerConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(Self::build(config))
    }

    fn build(config: ServerConfig) -> Self {
        let (state, _) = watch::channel(ServerState::Unbound);
        Self {
            connection_limit: config
                .max_connections
                .map(|max| Arc::new(Semaphore::new(max))),
            config,
            listener: Mutex::new(None),
            state,
        }
    }

    /// Get the settings this server was built with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Snapshot of the current lifecycle state.
    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Bind and run the accept loop.
    ///
    /// Only returns on failure. After `shutdown` the error is
    /// [`ServerError::ListenerClosed`].
    pub async fn start(&self) -> Result<Infallible, ServerError> {
        let listener = self.bind().await?;
        self.accept_loop(listener).await
    }

    /// Wait until the server has bound, then return the bound address.
    ///
    /// Returns [`ServerError::NotStarted`] if the server closed without
    /// ever binding.
    pub async fn get_address(&self) -> Result<SocketAddr, ServerError> {
        let mut state = self.state.subscribe();
        let current = *state
            .wait_for(|s| !matches!(s, ServerState::Unbound))
            .await
            .map_err(|_| ServerError::NotStarted)?;

        current.bound_addr().ok_or(ServerError::NotStarted)
    }

    /// Close the listener if one is bound. Safe to call any number of times.
    ///
    /// Connections already handed to their tasks are not interrupted.
    pub async fn shutdown(&self) {
        let mut slot = self.listener.lock().await;
        let listener = slot.take();
        let previous = self.state();
        if previous.is_closed() {
            return;
        }

        self.state.send_replace(ServerState::Closed {
            bound: previous.bound_addr(),
        });

        match (listener, previous.bound_addr()) {
            (Some(listener), Some(addr)) => {
                drop(listener);
                tracing::info!(address = %addr, "Listener closed");
            }
            _ => tracing::debug!("Shutdown before bind, server closed"),
        }
    }

    async fn bind(&self) -> Result<Arc<TcpListener>, ServerError> {
        let mut slot = self.listener.lock().await;
        match self.state() {
            ServerState::Unbound => {}
            ServerState::Listening(_) => return Err(ServerError::AlreadyStarted),
            ServerState::Closed { .. } => return Err(ServerError::ListenerClosed),
        }

        let addr = join_host_port(&self.config.host, &self.config.port);
        let bound = match TcpListener::bind(addr.as_str()).await {
            Ok(listener) => listener.local_addr().map(|local| (listener, local)),
            Err(e) => Err(e),
        };

        let (listener, local_addr) = match bound {
            Ok(bound) => bound,
            Err(e) => {
                self.state.send_replace(ServerState::Closed { bound: None });
                tracing::error!(address = %addr, error = %e, "Failed to bind");
                return Err(ServerError::Bind(e));
            }
        };

        let listener = Arc::new(listener);
        *slot = Some(Arc::clone(&listener));
        self.state.send_replace(ServerState::Listening(local_addr));

        tracing::info!(
            address = %local_addr,
            max_connections = ?self.config.max_connections,
            "Listener bound"
        );

        Ok(listener)
    }

    async fn accept_loop(&self, listener: Arc<TcpListener>) -> Result<Infallible, ServerError> {
        let mut state = self.state.subscribe();

        loop {
            // Backpressure first, so a capped server stops accepting when full.
            let permit = match &self.connection_limit {
                Some(limit) => tokio::select! {
                    biased;
                    _ = wait_closed(&mut state) => return Err(ServerError::ListenerClosed),
                    permit = Arc::clone(limit).acquire_owned() => {
                        Some(permit.map_err(|_| ServerError::ListenerClosed)?)
                    }
                },
                None => None,
            };

            tokio::select! {
                biased;
                _ = wait_closed(&mut state) => return Err(ServerError::ListenerClosed),
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => self.dispatch(stream, peer_addr, permit),
                    Err(_) if self.state().is_closed() => return Err(ServerError::ListenerClosed),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to accept connection");
                        return Err(ServerError::Accept(e));
                    }
                },
            }
        }
    }

    fn dispatch(&self, stream: TcpStream, peer_addr: SocketAddr, permit: Option<OwnedSemaphorePermit>) {
        let guard = ConnectionGuard::new(permit);
        let read_buffer_size = self.config.read_buffer_size;

        tracing::debug!(
            connection_id = %guard.id(),
            peer_addr = %peer_addr,
            "Connection accepted"
        );

        tokio::spawn(async move {
            handle_connection(stream, guard.id(), read_buffer_size).await;
            drop(guard);
        });
    }
}

async fn wait_closed(state: &mut watch::Receiver<ServerState>) {
    // The sender lives in the server, so this only fails if it is gone.
    let _ = state.wait_for(ServerState::is_closed).await;
}

/// Join host and port into `host:port`, bracketing IPv6 literals.
///
/// An empty host means every IPv4 interface. Ports must be numeric.
fn join_host_port(host: &str, port: &str) -> String {
    if host.is_empty() {
        format!("0.0.0.0:{}", port)
    } else if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
