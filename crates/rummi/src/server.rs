//! `RummiServer` builder and server loop.
//!
//! This is the entry point for hosting a game. It ties together all the
//! layers: transport → protocol → session → engine.

use std::net::SocketAddr;
use std::sync::Arc;

use rummi_engine::Game;
use rummi_protocol::{Codec, JsonCodec};
use rummi_transport::{TcpTransport, Transport};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::RummiError;
use crate::dispatcher::Dispatcher;
use crate::handler::handle_connection;
use crate::session::{SessionHandle, spawn_session};

/// Port the game has always listened on.
pub const DEFAULT_PORT: u16 = 48410;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Tunables for one hosted game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_addr: String,

    /// Messages queued per connection before new ones are dropped.
    pub outbound_capacity: usize,

    /// Commands queued for the session before handlers have to wait.
    pub command_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            outbound_capacity: 256,
            command_capacity: 64,
        }
    }
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) session: SessionHandle,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a Rummi server.
///
/// # Example
///
/// ```rust,no_run
/// use rummi::prelude::*;
///
/// # async fn host() -> Result<(), RummiError> {
/// let server = RummiServer::builder()
///     .bind("0.0.0.0:48410")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RummiServerBuilder {
    config: ServerConfig,
    game: Option<Game>,
}

impl RummiServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            game: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.config.outbound_capacity = capacity.max(1);
        self
    }

    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.config.command_capacity = capacity.max(1);
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Hosts this game instead of a fresh one. Mostly for seeded tests.
    pub fn game(mut self, game: Game) -> Self {
        self.game = Some(game);
        self
    }

    /// Binds the listener and spawns the session.
    ///
    /// Uses `JsonCodec` over newline-delimited TCP.
    pub async fn build(self) -> Result<RummiServer<JsonCodec>, RummiError> {
        let mut config = self.config;
        // Tokio channels cannot have zero capacity.
        config.outbound_capacity = config.outbound_capacity.max(1);
        config.command_capacity = config.command_capacity.max(1);

        let transport = TcpTransport::bind(&config.bind_addr).await?;
        let dispatcher = Dispatcher::with_game(self.game.unwrap_or_default());
        let (session, stopped) = spawn_session(dispatcher, config.command_capacity);

        let state = Arc::new(ServerState {
            session,
            codec: JsonCodec,
            config,
        });

        Ok(RummiServer {
            transport,
            state,
            stopped,
        })
    }
}

impl Default for RummiServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A bound Rummi server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RummiServer<C: Codec> {
    transport: TcpTransport,
    state: Arc<ServerState<C>>,
    stopped: watch::Receiver<bool>,
}

impl RummiServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> RummiServerBuilder {
        RummiServerBuilder::new()
    }
}

impl<C: Codec> RummiServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, RummiError> {
        Ok(self.transport.local_addr()?)
    }

    /// A handle to the session, e.g. to shut it down from outside.
    pub fn session(&self) -> SessionHandle {
        self.state.session.clone()
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task for every connection. Returns once the
    /// session has stopped: the host left, a running game lost too many
    /// players, or [`SessionHandle::shutdown`] was called.
    pub async fn run(mut self) -> Result<(), RummiError> {
        tracing::info!(addr = %self.local_addr()?, "Rummi server running");

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                changed = self.stopped.changed() => {
                    if changed.is_err() || *self.stopped.borrow() {
                        break;
                    }
                }
            }
        }

        self.transport.shutdown().await?;
        tracing::info!("Rummi server stopped");
        Ok(())
    }
}
