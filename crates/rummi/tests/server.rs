//! End-to-end tests: a real server on an OS-assigned port, driven by raw
//! line connections and by the client stub.

use std::net::SocketAddr;
use std::time::Duration;

use rummi::prelude::*;
use rummi::protocol::{Codec, JsonCodec};
use rummi::transport::{Connection, TcpConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

// =========================================================================
// Helpers
// =========================================================================

async fn start_server() -> (SocketAddr, JoinHandle<Result<(), RummiError>>) {
    let server = RummiServer::builder()
        .bind("127.0.0.1:0")
        .game(Game::with_seed(42))
        .build()
        .await
        .expect("server should bind");
    let addr = server.local_addr().unwrap();
    let running = tokio::spawn(server.run());
    (addr, running)
}

/// A client speaking the wire protocol directly.
struct Peer {
    conn: TcpConnection,
}

impl Peer {
    async fn connect(addr: SocketAddr) -> Self {
        Self {
            conn: TcpConnection::connect(addr).await.expect("should connect"),
        }
    }

    /// Connects and joins, waiting until the server has seated us.
    async fn joined(addr: SocketAddr, name: &str, age: u32) -> Self {
        let peer = Self::connect(addr).await;
        peer.send(Request::Join { name: name.into(), age }).await;
        let names = peer.recv_kind("PLAYER_NAMES").await;
        assert!(matches!(names, GameInfo::PlayerNames { names } if names[0] == name));
        peer
    }

    async fn send(&self, request: Request) {
        let bytes = JsonCodec.encode(&request).unwrap();
        self.conn.send(&bytes).await.unwrap();
    }

    async fn send_raw(&self, line: &[u8]) {
        self.conn.send(line).await.unwrap();
    }

    async fn next(&self) -> Option<GameInfo> {
        let line = timeout(WAIT, self.conn.recv())
            .await
            .expect("server went quiet")
            .ok()??;
        Some(JsonCodec.decode(&line).expect("server sent valid JSON"))
    }

    async fn recv(&self) -> GameInfo {
        self.next().await.expect("connection closed early")
    }

    async fn recv_kind(&self, kind: &str) -> GameInfo {
        loop {
            let info = self.recv().await;
            if info.kind() == kind {
                return info;
            }
        }
    }

    /// Skips messages until the server closes the connection.
    async fn closed(&self) {
        while self.next().await.is_some() {}
    }

    async fn kinds(&self, n: usize) -> Vec<&'static str> {
        let mut kinds = Vec::with_capacity(n);
        for _ in 0..n {
            kinds.push(self.recv().await.kind());
        }
        kinds
    }
}

/// Host Cedrik (25) and guest Hyunsung (21), both seated and caught up.
async fn lobby(addr: SocketAddr) -> (Peer, Peer) {
    let host = Peer::joined(addr, "Cedrik", 25).await;
    let guest = Peer::joined(addr, "Hyunsung", 21).await;
    assert_eq!(
        host.recv().await,
        GameInfo::PlayerNames { names: vec!["Cedrik".into(), "Hyunsung".into()] }
    );
    (host, guest)
}

// =========================================================================
// Lobby and start
// =========================================================================

#[tokio::test]
async fn test_join_names_are_rotated_per_client() {
    let (addr, _running) = start_server().await;
    let host = Peer::joined(addr, "Cedrik", 25).await;
    let guest = Peer::connect(addr).await;
    guest.send(Request::Join { name: "Hyunsung".into(), age: 21 }).await;

    assert_eq!(
        guest.recv().await,
        GameInfo::PlayerNames { names: vec!["Hyunsung".into(), "Cedrik".into()] }
    );
    assert_eq!(
        host.recv().await,
        GameInfo::PlayerNames { names: vec!["Cedrik".into(), "Hyunsung".into()] }
    );
}

#[tokio::test]
async fn test_start_fan_out_reaches_both_clients_in_order() {
    let (addr, _running) = start_server().await;
    let (host, guest) = lobby(addr).await;

    host.send(Request::Start).await;

    assert_eq!(
        host.kinds(7).await,
        ["GAME_START", "TABLE", "HAND", "PLAYER_NAMES", "HAND_SIZES", "BAG", "CURRENT_PLAYER"]
    );
    assert_eq!(guest.recv().await, GameInfo::GameStart);
    assert!(matches!(guest.recv().await, GameInfo::Table { grid } if grid.tile_count() == 0));
    assert!(matches!(guest.recv().await, GameInfo::Hand { grid } if grid.tile_count() == 14));
    assert_eq!(
        guest.recv().await,
        GameInfo::PlayerNames { names: vec!["Hyunsung".into(), "Cedrik".into()] }
    );
    assert_eq!(guest.recv().await, GameInfo::HandSizes { sizes: vec![14, 14] });
    assert_eq!(guest.recv().await, GameInfo::Bag { size: 78 });
    assert_eq!(guest.recv().await, GameInfo::YourTurn);
}

#[tokio::test]
async fn test_guest_cannot_start() {
    let (addr, _running) = start_server().await;
    let (_host, guest) = lobby(addr).await;

    guest.send(Request::Start).await;
    assert_eq!(guest.recv().await, GameInfo::error(GameError::NotHost.to_string()));
}

#[tokio::test]
async fn test_fifth_client_gets_too_many_clients_and_is_closed() {
    let (addr, _running) = start_server().await;
    let _seated = [
        Peer::joined(addr, "A", 30).await,
        Peer::joined(addr, "B", 31).await,
        Peer::joined(addr, "C", 32).await,
        Peer::joined(addr, "D", 33).await,
    ];

    let extra = Peer::connect(addr).await;
    assert_eq!(extra.recv().await, GameInfo::TooManyClients);
    assert_eq!(extra.next().await, None);
}

// =========================================================================
// Turns
// =========================================================================

#[tokio::test]
async fn test_errors_go_only_to_the_requester() {
    let (addr, _running) = start_server().await;
    let (host, guest) = lobby(addr).await;
    host.send(Request::Start).await;
    host.recv_kind("CURRENT_PLAYER").await;
    guest.recv_kind("YOUR_TURN").await;

    host.send(Request::Draw).await;
    assert_eq!(host.recv().await, GameInfo::error(GameError::NotYourTurn.to_string()));

    // The next thing the guest sees is the names refresh, not the error.
    host.send(Request::UpdatePlayers).await;
    assert_eq!(guest.recv().await.kind(), "PLAYER_NAMES");
}

#[tokio::test]
async fn test_draw_passes_the_turn() {
    let (addr, _running) = start_server().await;
    let (host, guest) = lobby(addr).await;
    host.send(Request::Start).await;
    host.recv_kind("CURRENT_PLAYER").await;
    guest.recv_kind("YOUR_TURN").await;

    guest.send(Request::Draw).await;

    assert!(matches!(guest.recv().await, GameInfo::Hand { grid } if grid.tile_count() == 15));
    assert_eq!(host.recv_kind("HAND_SIZES").await, GameInfo::HandSizes { sizes: vec![14, 15] });
    assert_eq!(host.recv().await, GameInfo::Bag { size: 77 });
    assert_eq!(host.recv().await, GameInfo::YourTurn);
    assert_eq!(guest.recv_kind("CURRENT_PLAYER").await, GameInfo::CurrentPlayer { offset: 1 });
}

// =========================================================================
// Leaving
// =========================================================================

#[tokio::test]
async fn test_guest_leaving_lobby_updates_names() {
    let (addr, _running) = start_server().await;
    let (host, guest) = lobby(addr).await;
    let third = Peer::joined(addr, "Mara", 40).await;
    host.recv_kind("PLAYER_NAMES").await;

    guest.conn.close().await.unwrap();
    assert_eq!(
        host.recv().await,
        GameInfo::PlayerNames { names: vec!["Cedrik".into(), "Mara".into()] }
    );
    assert_eq!(
        third.recv_kind("PLAYER_NAMES").await,
        GameInfo::PlayerNames { names: vec!["Mara".into(), "Cedrik".into()] }
    );
}

#[tokio::test]
async fn test_malformed_line_drops_only_that_client() {
    let (addr, running) = start_server().await;
    let (host, _guest) = lobby(addr).await;
    let third = Peer::joined(addr, "Mara", 40).await;
    host.recv_kind("PLAYER_NAMES").await;

    third.send_raw(b"{not json").await;
    third.closed().await;

    assert_eq!(
        host.recv().await,
        GameInfo::PlayerNames { names: vec!["Cedrik".into(), "Hyunsung".into()] }
    );
    assert!(!running.is_finished());
}

#[tokio::test]
async fn test_host_leaving_shuts_everything_down() {
    let (addr, running) = start_server().await;
    let (host, guest) = lobby(addr).await;

    host.conn.close().await.unwrap();
    guest.closed().await;

    let result = timeout(WAIT, running).await.expect("server should stop");
    assert!(result.unwrap().is_ok());
}

#[tokio::test]
async fn test_guest_leaving_two_player_game_shuts_everything_down() {
    let (addr, running) = start_server().await;
    let (host, guest) = lobby(addr).await;
    host.send(Request::Start).await;
    guest.recv_kind("YOUR_TURN").await;

    guest.conn.close().await.unwrap();
    host.closed().await;
    assert!(timeout(WAIT, running).await.is_ok());
}

// =========================================================================
// Client stub
// =========================================================================

#[derive(Debug, PartialEq)]
enum Event {
    Names(Vec<String>),
    Start,
    Table(usize),
    Hand(usize),
    Bag(usize),
    Sizes(Vec<usize>),
    Current(usize),
    Turn,
    Error(String),
    Rank(usize),
    Full,
    Closed,
}

struct Forward(mpsc::UnboundedSender<Event>);

impl Forward {
    fn emit(&self, event: Event) {
        let _ = self.0.send(event);
    }
}

impl Presenter for Forward {
    fn set_table(&mut self, table: Grid) {
        self.emit(Event::Table(table.len()));
    }
    fn set_hand(&mut self, hand: Grid) {
        self.emit(Event::Hand(hand.len()));
    }
    fn set_bag_size(&mut self, size: usize) {
        self.emit(Event::Bag(size));
    }
    fn set_hand_sizes(&mut self, sizes: Vec<usize>) {
        self.emit(Event::Sizes(sizes));
    }
    fn set_player_names(&mut self, names: Vec<String>) {
        self.emit(Event::Names(names));
    }
    fn notify_current_player(&mut self, offset: usize) {
        self.emit(Event::Current(offset));
    }
    fn show_error(&mut self, message: String) {
        self.emit(Event::Error(message));
    }
    fn notify_turn(&mut self) {
        self.emit(Event::Turn);
    }
    fn notify_game_start(&mut self) {
        self.emit(Event::Start);
    }
    fn show_rank(&mut self, rank: Vec<RankEntry>) {
        self.emit(Event::Rank(rank.len()));
    }
    fn notify_too_many_clients(&mut self) {
        self.emit(Event::Full);
    }
    fn server_closed(&mut self) {
        self.emit(Event::Closed);
    }
}

async fn event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(WAIT, rx.recv())
        .await
        .expect("presenter went quiet")
        .expect("presenter channel closed")
}

#[tokio::test]
async fn test_client_stub_drives_a_game_start() {
    let (addr, _running) = start_server().await;
    let host = Peer::joined(addr, "Cedrik", 25).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = RummiClient::connect(addr, Forward(tx)).await.unwrap();
    client.join("Hyunsung", 21).await.unwrap();
    assert_eq!(event(&mut rx).await, Event::Names(vec!["Hyunsung".into(), "Cedrik".into()]));
    host.recv_kind("PLAYER_NAMES").await;

    client.start().await.unwrap();
    assert_eq!(event(&mut rx).await, Event::Error(GameError::NotHost.to_string()));

    host.send(Request::Start).await;
    assert_eq!(event(&mut rx).await, Event::Start);
    assert_eq!(event(&mut rx).await, Event::Table(0));
    assert_eq!(event(&mut rx).await, Event::Hand(14));
    assert_eq!(event(&mut rx).await, Event::Names(vec!["Hyunsung".into(), "Cedrik".into()]));
    assert_eq!(event(&mut rx).await, Event::Sizes(vec![14, 14]));
    assert_eq!(event(&mut rx).await, Event::Bag(78));
    assert_eq!(event(&mut rx).await, Event::Turn);

    client.sort_hand_by_run().await.unwrap();
    assert_eq!(event(&mut rx).await, Event::Hand(14));

    client.draw().await.unwrap();
    assert_eq!(event(&mut rx).await, Event::Hand(15));
    assert_eq!(event(&mut rx).await, Event::Table(0));
    assert_eq!(event(&mut rx).await, Event::Sizes(vec![15, 14]));
    assert_eq!(event(&mut rx).await, Event::Bag(77));
    assert_eq!(event(&mut rx).await, Event::Current(1));
}

#[tokio::test]
async fn test_client_stub_reports_server_close() {
    let (addr, _running) = start_server().await;
    let host = Peer::joined(addr, "Cedrik", 25).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = RummiClient::connect(addr, Forward(tx)).await.unwrap();
    client.update_players().await.unwrap();
    assert_eq!(event(&mut rx).await, Event::Names(vec!["Cedrik".into()]));

    host.conn.close().await.unwrap();
    assert_eq!(event(&mut rx).await, Event::Closed);
}

#[tokio::test]
async fn test_client_stub_sees_too_many_clients() {
    let (addr, _running) = start_server().await;
    let _seated = [
        Peer::joined(addr, "A", 30).await,
        Peer::joined(addr, "B", 31).await,
        Peer::joined(addr, "C", 32).await,
        Peer::joined(addr, "D", 33).await,
    ];

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _client = RummiClient::connect(addr, Forward(tx)).await.unwrap();
    assert_eq!(event(&mut rx).await, Event::Full);
    assert_eq!(event(&mut rx).await, Event::Closed);
}
