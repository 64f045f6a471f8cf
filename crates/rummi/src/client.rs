//! Client stub: sends requests, hands server messages to a [`Presenter`].
//!
//! The stub owns no game state. Everything the server says is decoded and
//! forwarded, in arrival order, to the presenter from a background task.

use std::sync::Arc;

use rummi_engine::{Coordinate, Grid};
use rummi_protocol::{Codec, GameInfo, JsonCodec, MoveCoords, ProtocolError, RankEntry, Request};
use rummi_transport::{Connection, TcpConnection};
use tokio::net::ToSocketAddrs;
use tokio::task::JoinHandle;

use crate::RummiError;

/// Receives everything the server sends, one callback per message kind.
///
/// Callbacks run on the client's listener task, so they should hand work
/// off rather than block.
pub trait Presenter: Send + 'static {
    fn set_table(&mut self, table: Grid);
    fn set_hand(&mut self, hand: Grid);
    fn set_bag_size(&mut self, size: usize);
    /// Rack sizes, the receiving player first.
    fn set_hand_sizes(&mut self, sizes: Vec<usize>);
    /// Player names, the receiving player first.
    fn set_player_names(&mut self, names: Vec<String>);
    /// Someone else is on turn, `offset` seats clockwise from us.
    fn notify_current_player(&mut self, offset: usize);
    fn show_error(&mut self, message: String);
    fn notify_turn(&mut self);
    fn notify_game_start(&mut self);
    /// Final standings, best first.
    fn show_rank(&mut self, rank: Vec<RankEntry>);
    fn notify_too_many_clients(&mut self);
    /// The connection ended from the server's side.
    fn server_closed(&mut self);
}

/// Routes one message to the matching presenter callback.
///
/// # Errors
/// [`ProtocolError::InvalidMessage`] if a grid payload does not describe
/// valid tiles; the presenter is not called.
pub fn present<P: Presenter + ?Sized>(presenter: &mut P, info: GameInfo) -> Result<(), ProtocolError> {
    match info {
        GameInfo::Table { grid } => presenter.set_table(grid.to_grid()?),
        GameInfo::Hand { grid } => presenter.set_hand(grid.to_grid()?),
        GameInfo::Bag { size } => presenter.set_bag_size(size),
        GameInfo::HandSizes { sizes } => presenter.set_hand_sizes(sizes),
        GameInfo::PlayerNames { names } => presenter.set_player_names(names),
        GameInfo::CurrentPlayer { offset } => presenter.notify_current_player(offset),
        GameInfo::Error { message } => presenter.show_error(message),
        GameInfo::YourTurn => presenter.notify_turn(),
        GameInfo::GameStart => presenter.notify_game_start(),
        GameInfo::Rank { entries } => presenter.show_rank(entries),
        GameInfo::TooManyClients => presenter.notify_too_many_clients(),
    }
    Ok(())
}

/// A connection to a Rummi server.
pub struct RummiClient {
    conn: Arc<TcpConnection>,
    codec: JsonCodec,
    listener: JoinHandle<()>,
}

impl RummiClient {
    /// Connects and starts forwarding server messages to `presenter`.
    pub async fn connect<P: Presenter>(
        addr: impl ToSocketAddrs,
        presenter: P,
    ) -> Result<Self, RummiError> {
        let conn = Arc::new(TcpConnection::connect(addr).await?);
        let codec = JsonCodec;
        let listener = tokio::spawn(listen(Arc::clone(&conn), codec, presenter));
        Ok(Self {
            conn,
            codec,
            listener,
        })
    }

    /// Sends any request.
    pub async fn send(&self, request: &Request) -> Result<(), RummiError> {
        tracing::debug!(conn_id = %self.conn.id(), request = request.kind(), "sending");
        let bytes = self.codec.encode(request)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    pub async fn start(&self) -> Result<(), RummiError> {
        self.send(&Request::Start).await
    }

    pub async fn join(&self, name: impl Into<String>, age: u32) -> Result<(), RummiError> {
        self.send(&Request::Join {
            name: name.into(),
            age,
        })
        .await
    }

    pub async fn draw(&self) -> Result<(), RummiError> {
        self.send(&Request::Draw).await
    }

    pub async fn confirm_move(&self) -> Result<(), RummiError> {
        self.send(&Request::ConfirmMove).await
    }

    pub async fn reset(&self) -> Result<(), RummiError> {
        self.send(&Request::Reset).await
    }

    pub async fn undo(&self) -> Result<(), RummiError> {
        self.send(&Request::Undo).await
    }

    pub async fn time_out(&self) -> Result<(), RummiError> {
        self.send(&Request::TimeOut).await
    }

    pub async fn sort_hand_by_group(&self) -> Result<(), RummiError> {
        self.send(&Request::SortHandByGroup).await
    }

    pub async fn sort_hand_by_run(&self) -> Result<(), RummiError> {
        self.send(&Request::SortHandByRun).await
    }

    pub async fn update_players(&self) -> Result<(), RummiError> {
        self.send(&Request::UpdatePlayers).await
    }

    // -- moves ---------------------------------------------------------------

    pub async fn hand_move(&self, src: Coordinate, dst: Coordinate) -> Result<(), RummiError> {
        self.send(&Request::HandMove(MoveCoords::new(src, dst))).await
    }

    pub async fn table_move(&self, src: Coordinate, dst: Coordinate) -> Result<(), RummiError> {
        self.send(&Request::TableMove(MoveCoords::new(src, dst))).await
    }

    pub async fn put_stone(&self, src: Coordinate, dst: Coordinate) -> Result<(), RummiError> {
        self.send(&Request::PutStone(MoveCoords::new(src, dst))).await
    }

    pub async fn hand_set_move(&self, src: Coordinate, dst: Coordinate) -> Result<(), RummiError> {
        self.send(&Request::HandSetMove(MoveCoords::new(src, dst))).await
    }

    pub async fn table_set_move(&self, src: Coordinate, dst: Coordinate) -> Result<(), RummiError> {
        self.send(&Request::TableSetMove(MoveCoords::new(src, dst))).await
    }

    pub async fn put_set(&self, src: Coordinate, dst: Coordinate) -> Result<(), RummiError> {
        self.send(&Request::PutSet(MoveCoords::new(src, dst))).await
    }

    /// Leaves the game. The presenter gets no further callbacks.
    pub async fn disconnect(self) -> Result<(), RummiError> {
        self.listener.abort();
        self.conn.close().await?;
        tracing::debug!(conn_id = %self.conn.id(), "disconnected");
        Ok(())
    }
}

async fn listen<P: Presenter>(conn: Arc<TcpConnection>, codec: JsonCodec, mut presenter: P) {
    let conn_id = conn.id();
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };
        let presented = codec
            .decode::<GameInfo>(&data)
            .and_then(|info| present(&mut presenter, info));
        if let Err(e) = presented {
            tracing::warn!(%conn_id, error = %e, "skipping unreadable game info");
        }
    }
    tracing::info!(%conn_id, "server closed the connection");
    presenter.server_closed();
}
