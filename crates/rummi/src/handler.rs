//! Per-connection handler: seat, reader loop and writer task.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Ask the session for a seat (or send `TOO_MANY_CLIENTS` and close)
//!   2. Spawn the writer: drain the seat's queue, encode, send
//!   3. Loop: receive lines → decode → forward to the session
//!   4. Tell the session the connection is gone, wait for the writer

use std::sync::Arc;

use rummi_engine::SeatId;
use rummi_protocol::{Codec, GameInfo, Request};
use rummi_transport::{Connection, TcpConnection};
use tokio::sync::{mpsc, oneshot};

use crate::server::ServerState;
use crate::{RummiError, SessionError};

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: TcpConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), RummiError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (out_tx, out_rx) = mpsc::channel(state.config.outbound_capacity);
    let (closed_tx, closed_rx) = oneshot::channel();

    let seat = match state.session.connect(conn_id, out_tx, closed_tx).await {
        Ok(seat) => seat,
        Err(SessionError::TooManyClients(_)) => {
            reject(conn.as_ref(), &state.codec).await?;
            return Ok(());
        }
        Err(e) => {
            conn.close().await?;
            return Err(e.into());
        }
    };

    let writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), out_rx));

    let report_disconnect = tokio::select! {
        // The session dropped our seat (teardown or shutdown).
        _ = closed_rx => false,
        () = read_loop(conn.as_ref(), &state, seat) => true,
    };

    if report_disconnect {
        // An unavailable session already let go of every seat.
        let _ = state.session.disconnect(seat, conn_id).await;
    }

    match writer.await {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "writer task failed");
            Ok(())
        }
    }
}

/// Sends `TOO_MANY_CLIENTS` and closes.
async fn reject<C: Codec>(conn: &TcpConnection, codec: &C) -> Result<(), RummiError> {
    tracing::info!(conn_id = %conn.id(), "rejecting client, table is full");
    let bytes = codec.encode(&GameInfo::TooManyClients)?;
    conn.send(&bytes).await?;
    conn.close().await?;
    Ok(())
}

/// Reads requests until the peer goes away or sends something unreadable.
async fn read_loop<C: Codec>(conn: &TcpConnection, state: &ServerState<C>, seat: SeatId) {
    let conn_id = conn.id();
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, %seat, "connection closed cleanly");
                return;
            }
            Err(e) => {
                tracing::debug!(%conn_id, %seat, error = %e, "recv error");
                return;
            }
        };

        let request: Request = match state.codec.decode(&data) {
            Ok(request) => request,
            Err(e) => {
                tracing::info!(%conn_id, %seat, error = %e, "malformed request, dropping connection");
                return;
            }
        };

        if let Err(e) = state.session.request(seat, conn_id, request).await {
            tracing::debug!(%conn_id, %seat, error = %e, "session gone");
            return;
        }
    }
}

/// Drains the seat's queue onto the wire, then closes the sending side.
///
/// Ends when the session drops the seat's sender, after every queued
/// message has been written.
async fn write_loop<C: Codec>(
    conn: Arc<TcpConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::Receiver<GameInfo>,
) -> Result<(), RummiError> {
    let conn_id = conn.id();
    while let Some(info) = rx.recv().await {
        let bytes = state.codec.encode(&info)?;
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            return Err(e.into());
        }
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
    Ok(())
}
