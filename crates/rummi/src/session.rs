//! Session actor: the one task that owns the game and the seat table.
//!
//! Connection handlers never touch the [`Game`](rummi_engine::Game)
//! directly. They send commands through a [`SessionHandle`]; the actor
//! applies them one at a time, so every request is serialized against the
//! engine and the messages it produces are queued before the next request
//! is looked at.

use rummi_engine::SeatId;
use rummi_protocol::{GameInfo, Recipient, Request};
use rummi_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot, watch};

use crate::SessionError;
use crate::dispatcher::Dispatcher;
use crate::seats::{SeatHandle, SeatSender, SeatTable};

/// Commands sent to the session actor through its channel.
pub(crate) enum SessionCommand {
    /// Seat a new connection.
    Connect {
        conn_id: ConnectionId,
        outbound: SeatSender,
        closed: oneshot::Sender<()>,
        reply: oneshot::Sender<Result<SeatId, SessionError>>,
    },

    /// Apply a request from a seated connection.
    Request {
        seat: SeatId,
        conn_id: ConnectionId,
        request: Request,
    },

    /// The connection's reader stopped.
    Disconnect { seat: SeatId, conn_id: ConnectionId },

    /// Close every seat and stop.
    Shutdown,
}

/// Handle to the running session actor.
///
/// Cheap to clone; every connection handler holds one.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Asks for a seat. `outbound` receives every message for that seat;
    /// `closed` is dropped when the session lets go of the seat.
    pub async fn connect(
        &self,
        conn_id: ConnectionId,
        outbound: SeatSender,
        closed: oneshot::Sender<()>,
    ) -> Result<SeatId, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Connect {
                conn_id,
                outbound,
                closed,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Unavailable)?;
        reply_rx.await.map_err(|_| SessionError::Unavailable)?
    }

    /// Forwards a request (fire-and-forget).
    pub async fn request(
        &self,
        seat: SeatId,
        conn_id: ConnectionId,
        request: Request,
    ) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Request {
                seat,
                conn_id,
                request,
            })
            .await
            .map_err(|_| SessionError::Unavailable)
    }

    /// Reports that a connection went away.
    pub async fn disconnect(&self, seat: SeatId, conn_id: ConnectionId) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Disconnect { seat, conn_id })
            .await
            .map_err(|_| SessionError::Unavailable)
    }

    /// Tells the session to close every seat and stop.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::Unavailable)
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct SessionActor {
    dispatcher: Dispatcher,
    seats: SeatTable,
    receiver: mpsc::Receiver<SessionCommand>,
    stopped: watch::Sender<bool>,
}

impl SessionActor {
    async fn run(mut self) {
        tracing::info!("session started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SessionCommand::Connect {
                    conn_id,
                    outbound,
                    closed,
                    reply,
                } => {
                    let result = self.seats.insert(SeatHandle::new(conn_id, outbound, closed));
                    match &result {
                        Ok(seat) => {
                            tracing::info!(%conn_id, %seat, clients = self.seats.len(), "client seated")
                        }
                        Err(e) => tracing::info!(%conn_id, error = %e, "client rejected"),
                    }
                    let _ = reply.send(result);
                }
                SessionCommand::Request {
                    seat,
                    conn_id,
                    request,
                } => {
                    if self.seats.get(seat).map(SeatHandle::conn_id) != Some(conn_id) {
                        tracing::warn!(%seat, %conn_id, "request from unseated connection, ignoring");
                        continue;
                    }
                    let msgs = self.dispatcher.apply_request(seat, request);
                    if !self.deliver(msgs) {
                        break;
                    }
                }
                SessionCommand::Disconnect { seat, conn_id } => {
                    let Some(msgs) = self.leave(seat, conn_id) else {
                        break;
                    };
                    if !self.deliver(msgs) {
                        break;
                    }
                }
                SessionCommand::Shutdown => {
                    tracing::info!("session shutting down");
                    break;
                }
            }
        }

        let closed = self.seats.clear();
        let _ = self.stopped.send(true);
        tracing::info!(closed, "session stopped");
    }

    /// Frees `seat` and returns what the remaining seats should see, or
    /// `None` if its departure ends the session.
    fn leave(&mut self, seat: SeatId, conn_id: ConnectionId) -> Option<Vec<(Recipient, GameInfo)>> {
        if self.seats.get(seat).map(SeatHandle::conn_id) != Some(conn_id) {
            return Some(Vec::new());
        }
        if self.dispatcher.ends_session(seat) {
            tracing::info!(%seat, "seat left, closing session");
            return None;
        }
        self.seats.remove(seat, conn_id);
        Some(self.dispatcher.remove_player(seat))
    }

    /// Routes `msgs`. A seat whose queue overflowed has missed state and is
    /// freed as if it had disconnected. Returns `false` once that ends the
    /// session.
    fn deliver(&mut self, msgs: Vec<(Recipient, GameInfo)>) -> bool {
        let mut pending = msgs;
        while !pending.is_empty() {
            let mut next = Vec::new();
            for (seat, conn_id) in self.seats.dispatch(pending) {
                tracing::warn!(%seat, %conn_id, "client is not reading, freeing seat");
                match self.leave(seat, conn_id) {
                    Some(msgs) => next.extend(msgs),
                    None => return false,
                }
            }
            pending = next;
        }
        true
    }
}

/// Spawns the session actor and returns a handle to it together with a
/// receiver that flips to `true` once the session has stopped.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub fn spawn_session(
    dispatcher: Dispatcher,
    channel_size: usize,
) -> (SessionHandle, watch::Receiver<bool>) {
    let (tx, rx) = mpsc::channel(channel_size);
    let (stopped_tx, stopped_rx) = watch::channel(false);

    let actor = SessionActor {
        dispatcher,
        seats: SeatTable::new(),
        receiver: rx,
        stopped: stopped_tx,
    };
    tokio::spawn(actor.run());

    (SessionHandle { sender: tx }, stopped_rx)
}
