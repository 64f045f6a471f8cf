//! Request dispatcher: turns one client request into engine calls and the
//! messages every seat should see afterwards.
//!
//! The dispatcher is synchronous and does no I/O. It returns
//! `(Recipient, GameInfo)` pairs; the session actor routes them. Because
//! the pairs are built right after the mutation, inside the same actor
//! step, no client ever observes a half-applied move.
//!
//! Rules errors never escape: they become an `ERROR` for the requester.

use rummi_engine::rules::{HOST_SEAT, MIN_PLAYERS};
use rummi_engine::{Game, GameError, SeatId};
use rummi_protocol::{GameInfo, GridView, MoveCoords, RankEntry, Recipient, Request};

/// Shown when a set move is refused because the target span is blocked.
pub const SET_MOVE_REJECTED: &str = "You are not allowed to move stones like that!";

type Outbox = Vec<(Recipient, GameInfo)>;

/// Owns the single [`Game`] of a server session.
pub struct Dispatcher {
    game: Game,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_game(Game::new())
    }

    /// Wraps an existing game, e.g. one with a seeded pile.
    pub fn with_game(game: Game) -> Self {
        Self { game }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Applies `request` on behalf of `seat` and returns what to send.
    pub fn apply_request(&mut self, seat: SeatId, request: Request) -> Outbox {
        tracing::debug!(%seat, request = request.kind(), "applying request");
        let mut out = Outbox::new();

        match request {
            Request::Start => self.start(seat, &mut out),
            Request::Join { name, age } => match self.game.join(seat, name, age) {
                Ok(()) => {
                    tracing::info!(%seat, players = self.game.player_count(), "player joined");
                    self.push_names(Some(seat), &mut out);
                }
                Err(e) => push_error(seat, &e, &mut out),
            },
            Request::UpdatePlayers => self.push_names(Some(seat), &mut out),

            Request::HandMove(coords) => {
                if let Err(e) = self.game.move_stone_on_hand(seat, coords.src(), coords.dst()) {
                    push_error(seat, &e, &mut out);
                }
                self.push_hand(seat, &mut out);
            }
            Request::HandSetMove(coords) => {
                let moved = self.game.move_set_on_hand(seat, coords.src(), coords.dst());
                push_set_move_outcome(seat, moved, &mut out);
                self.push_hand(seat, &mut out);
            }

            Request::TableMove(coords) => {
                if self.is_current(seat) {
                    if let Err(e) = self.game.move_stone_on_table(coords.src(), coords.dst()) {
                        push_error(seat, &e, &mut out);
                    }
                }
                self.push_table(&mut out);
            }
            Request::TableSetMove(coords) => {
                if self.is_current(seat) {
                    let moved = self.game.move_set_on_table(coords.src(), coords.dst());
                    push_set_move_outcome(seat, moved, &mut out);
                }
                self.push_table(&mut out);
            }

            Request::PutStone(coords) => self.put(seat, coords, false, &mut out),
            Request::PutSet(coords) => self.put(seat, coords, true, &mut out),

            Request::Draw => self.draw(seat, &mut out),
            Request::ConfirmMove => self.confirm(seat, &mut out),
            Request::TimeOut => self.time_out(seat, &mut out),

            Request::Reset => {
                if self.is_current(seat) {
                    self.game.reset();
                    self.push_table(&mut out);
                    self.push_hand(seat, &mut out);
                    self.push_hand_sizes(&mut out);
                }
            }
            Request::Undo => {
                if self.is_current(seat) {
                    self.game.undo();
                    self.push_table(&mut out);
                    self.push_hand(seat, &mut out);
                }
            }

            Request::SortHandByGroup => {
                if let Err(e) = self.game.sort_hand_by_group(seat) {
                    push_error(seat, &e, &mut out);
                }
                self.push_hand(seat, &mut out);
            }
            Request::SortHandByRun => {
                if let Err(e) = self.game.sort_hand_by_run(seat) {
                    push_error(seat, &e, &mut out);
                }
                self.push_hand(seat, &mut out);
            }
        }

        out
    }

    /// `true` if losing `seat` ends the whole session: the host left, or
    /// a running game would drop below the minimum player count.
    pub fn ends_session(&self, seat: SeatId) -> bool {
        if seat == SeatId(HOST_SEAT) {
            return true;
        }
        self.game.is_game_on()
            && self.game.player_by_seat(seat).is_some()
            && self.game.player_count() <= MIN_PLAYERS
    }

    /// Frees `seat` and returns the updates the remaining seats need.
    pub fn remove_player(&mut self, seat: SeatId) -> Outbox {
        let mut out = Outbox::new();
        self.game.remove_player(seat);
        tracing::info!(%seat, players = self.game.player_count(), "player removed");

        if self.game.is_game_on() {
            // The leaver's pending moves may have been rolled back.
            self.push_table(&mut out);
            self.push_bag(&mut out);
            self.push_hand_sizes(&mut out);
            self.push_turn(&mut out);
        }
        self.push_names(None, &mut out);
        out
    }

    // -- request handlers ----------------------------------------------------

    fn start(&mut self, seat: SeatId, out: &mut Outbox) {
        if seat != SeatId(HOST_SEAT) {
            push_error(seat, &GameError::NotHost, out);
            return;
        }
        if let Err(e) = self.game.start() {
            push_error(seat, &e, out);
            return;
        }
        tracing::info!(
            players = self.game.player_count(),
            first = %self.game.current_seat(),
            "game started"
        );

        out.push((Recipient::All, GameInfo::GameStart));
        self.push_table(out);
        for player in self.game.seats() {
            self.push_hand(player, out);
        }
        self.push_names(Some(seat), out);
        self.push_hand_sizes(out);
        self.push_bag(out);
        self.push_turn(out);
    }

    fn put(&mut self, seat: SeatId, coords: MoveCoords, whole_set: bool, out: &mut Outbox) {
        if self.is_current(seat) {
            if whole_set {
                let moved = self.game.put_set(coords.src(), coords.dst());
                push_set_move_outcome(seat, moved, out);
            } else if let Err(e) = self.game.put_stone(coords.src(), coords.dst()) {
                push_error(seat, &e, out);
            }
            self.push_hand_sizes(out);
        }
        self.push_table(out);
        self.push_hand(seat, out);
    }

    fn draw(&mut self, seat: SeatId, out: &mut Outbox) {
        let current = self.game.current_seat();
        let had_pending = !self.game.history().is_empty();

        if let Err(e) = self.game.draw(seat) {
            self.push_failed_draw(seat, &e, current, had_pending, out);
            return;
        }
        self.push_turn_end(seat, true, out);
    }

    fn confirm(&mut self, seat: SeatId, out: &mut Outbox) {
        if let Err(e) = self.game.confirm_move(seat) {
            push_error(seat, &e, out);
            return;
        }
        if self.game.has_winner() {
            let entries = self
                .game
                .final_rank()
                .into_iter()
                .map(|(name, score)| RankEntry { name, score })
                .collect();
            tracing::info!(winner = %seat, "game finished");
            self.push_table(out);
            out.push((Recipient::All, GameInfo::Rank { entries }));
            return;
        }
        self.push_turn_end(seat, false, out);
    }

    fn time_out(&mut self, seat: SeatId, out: &mut Outbox) {
        if !self.game.is_game_on() {
            return;
        }
        let current = self.game.current_seat();
        let had_pending = !self.game.history().is_empty();

        if let Err(e) = self.game.time_out(seat) {
            self.push_failed_draw(seat, &e, current, had_pending, out);
            return;
        }
        self.push_turn_end(seat, true, out);
    }

    /// A refused draw still rolls back the current player's moves, so the
    /// board and that player's rack are resent when there were any.
    fn push_failed_draw(
        &self,
        seat: SeatId,
        error: &GameError,
        current: SeatId,
        had_pending: bool,
        out: &mut Outbox,
    ) {
        push_error(seat, error, out);
        if had_pending {
            self.push_table(out);
            self.push_hand(current, out);
        }
    }

    // -- outbound builders ---------------------------------------------------

    fn is_current(&self, seat: SeatId) -> bool {
        self.game.is_game_on() && self.game.current_seat() == seat
    }

    /// What everyone needs after `seat` finished a turn.
    fn push_turn_end(&self, seat: SeatId, with_bag: bool, out: &mut Outbox) {
        self.push_hand(seat, out);
        self.push_table(out);
        self.push_hand_sizes(out);
        if with_bag {
            self.push_bag(out);
        }
        self.push_turn(out);
    }

    fn push_table(&self, out: &mut Outbox) {
        let grid = GridView::from_grid(self.game.board());
        out.push((Recipient::All, GameInfo::Table { grid }));
    }

    fn push_hand(&self, seat: SeatId, out: &mut Outbox) {
        if let Some(rack) = self.game.rack(seat) {
            let grid = GridView::from_grid(rack);
            out.push((Recipient::Seat(seat), GameInfo::Hand { grid }));
        }
    }

    fn push_bag(&self, out: &mut Outbox) {
        let size = self.game.bag_size();
        out.push((Recipient::All, GameInfo::Bag { size }));
    }

    fn push_hand_sizes(&self, out: &mut Outbox) {
        let seats = self.game.seats();
        let sizes = self.game.hand_sizes();
        for seat in &seats {
            let sizes = rotated(&sizes, &seats, *seat);
            out.push((Recipient::Seat(*seat), GameInfo::HandSizes { sizes }));
        }
    }

    /// Names go to every seated player, rotated. A requester that has not
    /// joined gets the plain seat-order list.
    fn push_names(&self, requester: Option<SeatId>, out: &mut Outbox) {
        let seats = self.game.seats();
        let names = self.game.player_names();
        for seat in &seats {
            let names = rotated(&names, &seats, *seat);
            out.push((Recipient::Seat(*seat), GameInfo::PlayerNames { names }));
        }
        if let Some(requester) = requester.filter(|r| !seats.contains(r)) {
            out.push((Recipient::Seat(requester), GameInfo::PlayerNames { names }));
        }
    }

    /// `YOUR_TURN` to the current player, the relative offset to the rest.
    fn push_turn(&self, out: &mut Outbox) {
        let seats = self.game.seats();
        let current = self.game.current_seat();
        for seat in &seats {
            let info = if *seat == current {
                GameInfo::YourTurn
            } else {
                GameInfo::CurrentPlayer {
                    offset: relative_offset(&seats, *seat, current),
                }
            };
            out.push((Recipient::Seat(*seat), info));
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn push_error(seat: SeatId, error: &GameError, out: &mut Outbox) {
    tracing::debug!(%seat, error = %error, "request refused");
    out.push((Recipient::Seat(seat), GameInfo::error(error.to_string())));
}

fn push_set_move_outcome(seat: SeatId, moved: Result<bool, GameError>, out: &mut Outbox) {
    match moved {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(%seat, "set move blocked");
            out.push((Recipient::Seat(seat), GameInfo::error(SET_MOVE_REJECTED)));
        }
        Err(e) => push_error(seat, &e, out),
    }
}

/// Rotates a seat-ordered list so the recipient's own entry comes first.
fn rotated<T: Clone>(items: &[T], seats: &[SeatId], recipient: SeatId) -> Vec<T> {
    let mut items = items.to_vec();
    if let Some(pos) = seats.iter().position(|s| *s == recipient) {
        items.rotate_left(pos);
    }
    items
}

/// Clockwise distance, in occupied seats, from `recipient` to `current`.
fn relative_offset(seats: &[SeatId], recipient: SeatId, current: SeatId) -> usize {
    let n = seats.len();
    let pos = |seat: SeatId| seats.iter().position(|s| *s == seat).unwrap_or(0);
    if n == 0 {
        return 0;
    }
    (pos(current) + n - pos(recipient)) % n
}
