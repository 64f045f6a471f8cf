//! Fixed four-slot table of live connections, indexed by seat.

use rummi_engine::SeatId;
use rummi_engine::rules::MAX_PLAYERS;
use rummi_protocol::{GameInfo, Recipient};
use rummi_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::SessionError;

/// Channel sender for delivering outbound messages to one connection.
pub type SeatSender = mpsc::Sender<GameInfo>;

/// Everything the session holds for one connected seat.
///
/// Dropping the handle closes the outbound queue, so the writer task
/// drains what is left and exits, and fires `closed`, which stops the
/// reader task.
#[derive(Debug)]
pub struct SeatHandle {
    conn_id: ConnectionId,
    outbound: SeatSender,
    _closed: oneshot::Sender<()>,
}

impl SeatHandle {
    pub fn new(conn_id: ConnectionId, outbound: SeatSender, closed: oneshot::Sender<()>) -> Self {
        Self {
            conn_id,
            outbound,
            _closed: closed,
        }
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }
}

/// Seat table owned by the session actor.
///
/// New connections take the lowest free seat, so the first one becomes
/// the host.
#[derive(Debug, Default)]
pub struct SeatTable {
    slots: [Option<SeatHandle>; MAX_PLAYERS],
}

impl SeatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats a connection.
    ///
    /// # Errors
    /// [`SessionError::TooManyClients`] when every slot is taken; the
    /// handle is dropped.
    pub fn insert(&mut self, handle: SeatHandle) -> Result<SeatId, SessionError> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(SessionError::TooManyClients(MAX_PLAYERS))?;
        self.slots[index] = Some(handle);
        Ok(seat_at(index))
    }

    /// Frees `seat` if it still belongs to `conn_id`.
    pub fn remove(&mut self, seat: SeatId, conn_id: ConnectionId) -> Option<SeatHandle> {
        let slot = self.slots.get_mut(seat.index())?;
        if slot.as_ref().is_some_and(|h| h.conn_id == conn_id) {
            slot.take()
        } else {
            None
        }
    }

    /// Frees every seat.
    pub fn clear(&mut self) -> usize {
        self.slots.iter_mut().filter_map(Option::take).count()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, seat: SeatId) -> Option<&SeatHandle> {
        self.slots.get(seat.index())?.as_ref()
    }

    /// Occupied seats in ascending order.
    pub fn occupied(&self) -> Vec<SeatId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| seat_at(i))
            .collect()
    }

    /// Routes dispatcher output to the matching connections.
    ///
    /// Returns the seats whose queue was full. Nothing more is queued for
    /// them in this batch; the caller is expected to free them.
    pub fn dispatch(&self, msgs: Vec<(Recipient, GameInfo)>) -> Vec<(SeatId, ConnectionId)> {
        let mut lagging: Vec<(SeatId, ConnectionId)> = Vec::new();
        let mut deliver = |seat: SeatId, info: GameInfo| {
            if lagging.iter().any(|(s, _)| *s == seat) {
                return;
            }
            if !self.send_to(seat, info) {
                if let Some(handle) = self.get(seat) {
                    lagging.push((seat, handle.conn_id));
                }
            }
        };
        for (recipient, info) in msgs {
            match recipient {
                Recipient::All => {
                    for seat in self.occupied() {
                        deliver(seat, info.clone());
                    }
                }
                Recipient::Seat(seat) => deliver(seat, info),
            }
        }
        lagging
    }

    /// Queues one message without waiting.
    ///
    /// Returns `false` if the seat's queue is full, i.e. the client stopped
    /// reading. The message is dropped in that case.
    pub fn send_to(&self, seat: SeatId, info: GameInfo) -> bool {
        let Some(handle) = self.get(seat) else {
            return true;
        };
        match handle.outbound.try_send(info) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(info)) => {
                tracing::warn!(
                    %seat,
                    conn_id = %handle.conn_id,
                    info = info.kind(),
                    "outbound queue full"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(%seat, conn_id = %handle.conn_id, "writer gone");
                true
            }
        }
    }
}

/// Slot indices are below `MAX_PLAYERS` and always fit a `u8`.
fn seat_at(index: usize) -> SeatId {
    SeatId(index as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: u64, capacity: usize) -> (SeatHandle, mpsc::Receiver<GameInfo>, oneshot::Receiver<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let (closed_tx, closed_rx) = oneshot::channel();
        (SeatHandle::new(ConnectionId::new(id), tx, closed_tx), rx, closed_rx)
    }

    #[test]
    fn test_insert_takes_lowest_free_seat() {
        let mut table = SeatTable::new();
        let (a, _ra, _ca) = handle(1, 4);
        let (b, _rb, _cb) = handle(2, 4);
        let (c, _rc, _cc) = handle(3, 4);

        assert_eq!(table.insert(a).unwrap(), SeatId(0));
        assert_eq!(table.insert(b).unwrap(), SeatId(1));
        table.remove(SeatId(0), ConnectionId::new(1)).unwrap();
        assert_eq!(table.insert(c).unwrap(), SeatId(0));
        assert_eq!(table.occupied(), vec![SeatId(0), SeatId(1)]);
    }

    #[test]
    fn test_fifth_connection_is_refused() {
        let mut table = SeatTable::new();
        let mut keep = Vec::new();
        for id in 0..4 {
            let (h, rx, closed) = handle(id, 4);
            table.insert(h).unwrap();
            keep.push((rx, closed));
        }
        let (extra, _rx, _closed) = handle(9, 4);
        assert!(matches!(table.insert(extra), Err(SessionError::TooManyClients(4))));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_remove_ignores_stale_connection() {
        let mut table = SeatTable::new();
        let (h, _rx, _closed) = handle(5, 4);
        let seat = table.insert(h).unwrap();

        assert!(table.remove(seat, ConnectionId::new(6)).is_none());
        assert!(table.get(seat).is_some());
        assert!(table.remove(seat, ConnectionId::new(5)).is_some());
        assert!(table.is_empty());
    }

    #[test]
    fn test_dropping_handle_closes_both_channels() {
        let mut table = SeatTable::new();
        let (h, mut rx, mut closed) = handle(1, 4);
        let seat = table.insert(h).unwrap();
        table.send_to(seat, GameInfo::YourTurn);

        drop(table.remove(seat, ConnectionId::new(1)));
        assert_eq!(rx.try_recv().unwrap(), GameInfo::YourTurn);
        assert_eq!(rx.try_recv(), Err(mpsc::error::TryRecvError::Disconnected));
        assert_eq!(closed.try_recv(), Err(oneshot::error::TryRecvError::Closed));
    }

    #[test]
    fn test_dispatch_routes_all_and_seat() {
        let mut table = SeatTable::new();
        let (a, mut ra, _ca) = handle(1, 4);
        let (b, mut rb, _cb) = handle(2, 4);
        table.insert(a).unwrap();
        table.insert(b).unwrap();

        let lagging = table.dispatch(vec![
            (Recipient::All, GameInfo::Bag { size: 3 }),
            (Recipient::Seat(SeatId(1)), GameInfo::YourTurn),
            (Recipient::Seat(SeatId(3)), GameInfo::GameStart),
        ]);

        assert_eq!(ra.try_recv().unwrap(), GameInfo::Bag { size: 3 });
        assert!(ra.try_recv().is_err());
        assert_eq!(rb.try_recv().unwrap(), GameInfo::Bag { size: 3 });
        assert_eq!(rb.try_recv().unwrap(), GameInfo::YourTurn);
        assert!(lagging.is_empty());
    }

    #[test]
    fn test_full_queue_reports_the_lagging_seat() {
        let mut table = SeatTable::new();
        let (a, mut ra, _ca) = handle(1, 4);
        let (b, mut rb, _cb) = handle(2, 1);
        table.insert(a).unwrap();
        let slow = table.insert(b).unwrap();

        let lagging = table.dispatch(vec![
            (Recipient::All, GameInfo::Bag { size: 3 }),
            (Recipient::All, GameInfo::YourTurn),
            (Recipient::All, GameInfo::GameStart),
        ]);

        assert_eq!(lagging, vec![(slow, ConnectionId::new(2))]);
        assert_eq!(rb.try_recv().unwrap(), GameInfo::Bag { size: 3 });
        assert!(rb.try_recv().is_err());
        // The other seat is unaffected.
        assert_eq!(ra.try_recv().unwrap(), GameInfo::Bag { size: 3 });
        assert_eq!(ra.try_recv().unwrap(), GameInfo::YourTurn);
        assert_eq!(ra.try_recv().unwrap(), GameInfo::GameStart);
    }

    #[test]
    fn test_send_to_full_queue_returns_false() {
        let mut table = SeatTable::new();
        let (h, mut rx, _closed) = handle(1, 1);
        let seat = table.insert(h).unwrap();

        assert!(table.send_to(seat, GameInfo::YourTurn));
        assert!(!table.send_to(seat, GameInfo::GameStart));
        assert_eq!(rx.try_recv().unwrap(), GameInfo::YourTurn);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clear_frees_every_seat() {
        let mut table = SeatTable::new();
        let (a, _ra, _ca) = handle(1, 4);
        let (b, _rb, _cb) = handle(2, 4);
        table.insert(a).unwrap();
        table.insert(b).unwrap();
        assert_eq!(table.clear(), 2);
        assert!(table.is_empty());
    }
}
