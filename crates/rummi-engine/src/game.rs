//! The rules engine: one authoritative game of Rummikub.
//!
//! [`Game`] owns the board, the seated players, the draw pile and the
//! undo history of the player whose turn it is. Every public operation
//! either succeeds or returns a [`GameError`] with the invariants below
//! intact:
//!
//! - the pile, every rack and the board together always hold 106 tiles;
//! - while the game is started the current seat is occupied;
//! - the history only holds moves made since the turn began.

use std::collections::BTreeMap;
use std::fmt;

use crate::mover::plan_set_move;
use crate::rules::{FIRST_TILES, MAX_PLAYERS, MIN_FIRST_MOVE_POINTS, MIN_PLAYERS};
use crate::validator;
use crate::{Coordinate, DrawPile, GameError, Grid, Player, SeatId, Tile};

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// Lifecycle of a game.
///
/// ```text
/// NotStarted → Started → Finished
///                 ↑          │
///                 └──────────┘  (start again)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    #[default]
    NotStarted,
    Started,
    Finished,
}

impl GamePhase {
    /// Returns `true` while moves are accepted.
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }

    /// Returns `true` if players may still join.
    pub fn is_joinable(&self) -> bool {
        !self.is_started()
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NotStarted"),
            Self::Started => write!(f, "Started"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Trace
// ---------------------------------------------------------------------------

/// What an undoable step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    /// A tile was moved (or swapped) between two board cells.
    MoveOnBoard,
    /// A tile went from the current player's rack onto the board.
    MoveFromRack,
}

/// One undoable step of the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trace {
    pub kind: TraceKind,
    pub source: Coordinate,
    pub target: Coordinate,
}

impl Trace {
    pub fn new(kind: TraceKind, source: Coordinate, target: Coordinate) -> Self {
        Self {
            kind,
            source,
            target,
        }
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// A single game: board, players, pile and turn state.
#[derive(Debug, Clone)]
pub struct Game {
    board: Grid,
    players: BTreeMap<SeatId, Player>,
    pile: DrawPile,
    history: Vec<Trace>,
    phase: GamePhase,
    current: SeatId,
    /// Points on the board as of the last confirmed turn.
    table_points: i32,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// An empty table with a full, OS-seeded pile.
    pub fn new() -> Self {
        Self::with_pile(DrawPile::full())
    }

    /// An empty game whose draws are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_pile(DrawPile::with_seed(seed))
    }

    fn with_pile(pile: DrawPile) -> Self {
        Self {
            board: Grid::board(),
            players: BTreeMap::new(),
            pile,
            history: Vec::new(),
            phase: GamePhase::NotStarted,
            current: SeatId(0),
            table_points: 0,
        }
    }

    // -- lobby ---------------------------------------------------------------

    /// Seats a player. Joining an occupied seat replaces its player.
    ///
    /// # Errors
    /// [`GameError::AlreadyStarted`] while a game is running,
    /// [`GameError::GameFull`] when every seat is taken.
    pub fn join(&mut self, seat: SeatId, name: impl Into<String>, age: u32) -> Result<(), GameError> {
        if !self.phase.is_joinable() {
            return Err(GameError::AlreadyStarted);
        }
        let full = self.players.len() >= MAX_PLAYERS && !self.players.contains_key(&seat);
        if full || seat.index() >= MAX_PLAYERS {
            return Err(GameError::GameFull);
        }
        self.players.insert(seat, Player::new(name, age));
        Ok(())
    }

    /// Deals a fresh game: new pile, empty board, 14 tiles per player
    /// round-robin in seat order. The youngest player moves first; equal
    /// ages go to the lower seat.
    ///
    /// # Errors
    /// [`GameError::AlreadyStarted`], [`GameError::NotEnoughPlayers`] below
    /// two players, [`GameError::GameFull`] with four.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.phase.is_started() {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::GameFull);
        }

        self.pile.refill();
        self.board.clear();
        self.history.clear();
        self.table_points = 0;
        for player in self.players.values_mut() {
            // The pile was refilled, so old rack tiles are simply dropped.
            player.reset_for_new_game();
        }

        let seats = self.seats();
        for _ in 0..FIRST_TILES {
            for seat in &seats {
                self.give_tile(*seat)?;
            }
        }

        if let Some((seat, _)) = self.players.iter().min_by_key(|(_, p)| p.age()) {
            self.current = *seat;
        }
        self.phase = GamePhase::Started;
        tracing::debug!(current = %self.current, players = self.players.len(), "game dealt");
        Ok(())
    }

    /// Removes a player.
    ///
    /// Before the game starts this just frees the seat. Mid-game the
    /// player's pending moves are rolled back if it was their turn, their
    /// rack goes back into the pile, and the game ends if fewer than two
    /// players remain. Otherwise the turn moves on if they were current.
    pub fn remove_player(&mut self, seat: SeatId) {
        if !self.phase.is_started() {
            self.players.remove(&seat);
            return;
        }

        let was_current = seat == self.current;
        if was_current {
            self.reset();
        }
        let Some(mut player) = self.players.remove(&seat) else {
            return;
        };
        self.pile.add_tiles(player.rack_mut().drain());

        if self.players.len() < MIN_PLAYERS {
            self.phase = GamePhase::Finished;
            tracing::debug!(%seat, "too few players left, game over");
            return;
        }
        if was_current {
            self.advance_turn();
        }
    }

    // -- turn ----------------------------------------------------------------

    /// Draws one tile for `seat` and passes the turn.
    ///
    /// Pending moves of the current player are rolled back first, also
    /// when `seat` is not the current player.
    ///
    /// # Errors
    /// [`GameError::NotYourTurn`], [`GameError::HandFull`],
    /// [`GameError::BagEmpty`].
    pub fn draw(&mut self, seat: SeatId) -> Result<(), GameError> {
        self.ensure_started()?;
        self.reset();
        if seat != self.current {
            return Err(GameError::NotYourTurn);
        }
        self.give_tile(seat)?;
        self.advance_turn();
        Ok(())
    }

    /// Ends the turn of `seat` because their time ran out: pending moves
    /// are rolled back and a tile is drawn. If no tile can be drawn the
    /// turn still passes. Does nothing unless a game is running.
    pub fn time_out(&mut self, seat: SeatId) -> Result<(), GameError> {
        if !self.phase.is_started() {
            return Ok(());
        }
        match self.draw(seat) {
            Err(GameError::BagEmpty | GameError::HandFull) => {
                self.advance_turn();
                Ok(())
            }
            other => other,
        }
    }

    /// Accepts the current board as the end of `seat`'s turn.
    ///
    /// # Errors
    /// [`GameError::NotYourTurn`], [`GameError::TableInconsistent`] if any
    /// run on the board is not a valid set, [`GameError::NotEnoughPoints`]
    /// if nothing was played or an opening play is worth less than 30.
    pub fn confirm_move(&mut self, seat: SeatId) -> Result<(), GameError> {
        self.ensure_started()?;
        if seat != self.current {
            return Err(GameError::NotYourTurn);
        }
        let board_points =
            validator::board_points(&self.board).ok_or(GameError::TableInconsistent)?;
        let played = board_points - self.table_points;

        let player = self.player(seat)?;
        if played == 0 || (!player.has_played_first_move() && played < MIN_FIRST_MOVE_POINTS) {
            return Err(GameError::NotEnoughPoints);
        }

        self.table_points += played;
        let player = self.player_mut(seat)?;
        player.mark_first_move();
        if player.rack().is_empty() {
            self.history.clear();
            self.phase = GamePhase::Finished;
            tracing::debug!(%seat, "rack emptied, game won");
        } else {
            self.advance_turn();
        }
        Ok(())
    }

    // -- single-tile moves ---------------------------------------------------

    /// Moves a board tile from `src` to `dst`, swapping with whatever is
    /// at `dst`. Recorded in the history.
    pub fn move_stone_on_table(&mut self, src: Coordinate, dst: Coordinate) -> Result<(), GameError> {
        self.ensure_started()?;
        check_bounds(&self.board, src)?;
        check_bounds(&self.board, dst)?;
        if !self.board.contains(src) {
            return Err(GameError::NoTileAt(src));
        }
        swap(&mut self.board, src, dst);
        self.history.push(Trace::new(TraceKind::MoveOnBoard, src, dst));
        Ok(())
    }

    /// Moves a tile within `seat`'s rack, swapping with whatever is at
    /// `dst`. Rack moves are not undoable.
    pub fn move_stone_on_hand(
        &mut self,
        seat: SeatId,
        src: Coordinate,
        dst: Coordinate,
    ) -> Result<(), GameError> {
        self.ensure_started()?;
        let rack = self.player_mut(seat)?.rack_mut();
        check_bounds(rack, src)?;
        check_bounds(rack, dst)?;
        if !rack.contains(src) {
            return Err(GameError::NoTileAt(src));
        }
        swap(rack, src, dst);
        Ok(())
    }

    /// Puts a tile from the current player's rack onto an empty board
    /// cell. Recorded in the history.
    ///
    /// # Errors
    /// [`GameError::SpotTaken`] if `dst` is occupied.
    pub fn put_stone(&mut self, src: Coordinate, dst: Coordinate) -> Result<(), GameError> {
        self.ensure_started()?;
        check_bounds(&self.board, dst)?;
        if self.board.contains(dst) {
            return Err(GameError::SpotTaken);
        }
        let current = self.current;
        let rack = self.player_mut(current)?.rack_mut();
        check_bounds(rack, src)?;
        let tile = rack.remove(src).ok_or(GameError::NoTileAt(src))?;
        self.board.set(dst, Some(tile));
        self.history.push(Trace::new(TraceKind::MoveFromRack, src, dst));
        Ok(())
    }

    // -- set moves -----------------------------------------------------------

    /// Moves the board run containing `src` so that the grabbed tile lands
    /// at `dst`. Returns `false` without touching the board if the run
    /// does not fit there.
    pub fn move_set_on_table(&mut self, src: Coordinate, dst: Coordinate) -> Result<bool, GameError> {
        self.ensure_started()?;
        let Some(plan) = plan_set_move(&self.board, &self.board, true, src, dst) else {
            return Ok(false);
        };
        for (from, to) in plan {
            self.move_stone_on_table(from, to)?;
        }
        Ok(true)
    }

    /// Puts the run containing `src` on the current player's rack onto the
    /// board. Returns `false` without side effects if it does not fit.
    pub fn put_set(&mut self, src: Coordinate, dst: Coordinate) -> Result<bool, GameError> {
        self.ensure_started()?;
        let rack = self.player(self.current)?.rack();
        let Some(plan) = plan_set_move(rack, &self.board, false, src, dst) else {
            return Ok(false);
        };
        for (from, to) in plan {
            self.put_stone(from, to)?;
        }
        Ok(true)
    }

    /// Moves the run containing `src` within `seat`'s rack. Returns
    /// `false` without side effects if it does not fit.
    pub fn move_set_on_hand(
        &mut self,
        seat: SeatId,
        src: Coordinate,
        dst: Coordinate,
    ) -> Result<bool, GameError> {
        self.ensure_started()?;
        let rack = self.player(seat)?.rack();
        let Some(plan) = plan_set_move(rack, rack, true, src, dst) else {
            return Ok(false);
        };
        for (from, to) in plan {
            self.move_stone_on_hand(seat, from, to)?;
        }
        Ok(true)
    }

    // -- history -------------------------------------------------------------

    /// Reverts the most recent move of this turn. No-op on empty history.
    pub fn undo(&mut self) {
        let Some(trace) = self.history.pop() else {
            return;
        };
        match trace.kind {
            TraceKind::MoveOnBoard => swap(&mut self.board, trace.target, trace.source),
            TraceKind::MoveFromRack => {
                let Some(tile) = self.board.remove(trace.target) else {
                    return;
                };
                self.return_to_rack(tile);
            }
        }
    }

    /// Reverts every move of this turn, restoring the board as it was
    /// when the turn began.
    pub fn reset(&mut self) {
        while !self.history.is_empty() {
            self.undo();
        }
    }

    // -- rack sorting --------------------------------------------------------

    /// Orders `seat`'s rack by rank, then color.
    pub fn sort_hand_by_group(&mut self, seat: SeatId) -> Result<(), GameError> {
        self.player_mut(seat)?.sort_rack_by_group();
        Ok(())
    }

    /// Orders `seat`'s rack by color, then rank.
    pub fn sort_hand_by_run(&mut self, seat: SeatId) -> Result<(), GameError> {
        self.player_mut(seat)?.sort_rack_by_run();
        Ok(())
    }

    // -- queries -------------------------------------------------------------

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_game_on(&self) -> bool {
        self.phase.is_started()
    }

    pub fn current_seat(&self) -> SeatId {
        self.current
    }

    pub fn board(&self) -> &Grid {
        &self.board
    }

    pub fn rack(&self, seat: SeatId) -> Option<&Grid> {
        self.players.get(&seat).map(Player::rack)
    }

    pub fn player_by_seat(&self, seat: SeatId) -> Option<&Player> {
        self.players.get(&seat)
    }

    pub fn bag_size(&self) -> usize {
        self.pile.len()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Occupied seats in ascending order.
    pub fn seats(&self) -> Vec<SeatId> {
        self.players.keys().copied().collect()
    }

    /// Rack sizes in seat order.
    pub fn hand_sizes(&self) -> Vec<usize> {
        self.players.values().map(Player::hand_size).collect()
    }

    /// Player names in seat order.
    pub fn player_names(&self) -> Vec<String> {
        self.players.values().map(|p| p.name().to_owned()).collect()
    }

    /// Moves recorded since the current turn began, oldest first.
    pub fn history(&self) -> &[Trace] {
        &self.history
    }

    /// `true` if the current player has no tiles left.
    pub fn has_winner(&self) -> bool {
        self.players
            .get(&self.current)
            .is_some_and(|p| p.rack().is_empty())
    }

    /// Names and scores, best first. Equal scores keep seat order.
    pub fn final_rank(&self) -> Vec<(String, i32)> {
        let mut rank: Vec<(String, i32)> = self
            .players
            .values()
            .map(|p| (p.name().to_owned(), p.score()))
            .collect();
        rank.sort_by(|a, b| b.1.cmp(&a.1));
        rank
    }

    /// Tiles currently held anywhere: pile, racks and board.
    pub fn total_tiles(&self) -> usize {
        self.pile.len() + self.hand_sizes().iter().sum::<usize>() + self.board.len()
    }

    // -- internals -----------------------------------------------------------

    fn ensure_started(&self) -> Result<(), GameError> {
        if self.phase.is_started() {
            Ok(())
        } else {
            Err(GameError::NotStarted)
        }
    }

    fn player(&self, seat: SeatId) -> Result<&Player, GameError> {
        self.players.get(&seat).ok_or(GameError::UnknownPlayer(seat))
    }

    fn player_mut(&mut self, seat: SeatId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(&seat)
            .ok_or(GameError::UnknownPlayer(seat))
    }

    /// Moves one tile from the pile into `seat`'s rack.
    fn give_tile(&mut self, seat: SeatId) -> Result<(), GameError> {
        let player = self
            .players
            .get_mut(&seat)
            .ok_or(GameError::UnknownPlayer(seat))?;
        if player.rack().is_full() {
            return Err(GameError::HandFull);
        }
        let tile = self.pile.draw()?;
        player.push_tile(tile).map_err(|tile| {
            self.pile.add_tiles([tile]);
            GameError::HandFull
        })
    }

    /// Puts a tile taken back from the board onto the current rack. A
    /// full rack sends it to the pile so the tile is never lost.
    fn return_to_rack(&mut self, tile: Tile) {
        match self.players.get_mut(&self.current) {
            Some(player) => {
                if let Err(tile) = player.push_tile(tile) {
                    self.pile.add_tiles([tile]);
                }
            }
            None => self.pile.add_tiles([tile]),
        }
    }

    /// Passes the turn to the next occupied seat and forgets the history.
    fn advance_turn(&mut self) {
        self.history.clear();
        let next = self
            .players
            .range(SeatId(self.current.0.saturating_add(1))..)
            .next()
            .or_else(|| self.players.iter().next())
            .map(|(seat, _)| *seat);
        if let Some(seat) = next {
            self.current = seat;
        }
    }
}

fn check_bounds(grid: &Grid, coord: Coordinate) -> Result<(), GameError> {
    if grid.in_bounds(coord) {
        Ok(())
    } else {
        Err(GameError::OutOfBounds(coord))
    }
}

/// Exchanges the contents of two cells; either may be empty.
fn swap(grid: &mut Grid, a: Coordinate, b: Coordinate) {
    let from_a = grid.remove(a);
    let from_b = grid.remove(b);
    grid.set(a, from_b);
    grid.set(b, from_a);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    fn two_player_game() -> Game {
        let mut game = Game::with_seed(3);
        game.join(SeatId(0), "Ada", 40).unwrap();
        game.join(SeatId(1), "Bo", 30).unwrap();
        game.start().unwrap();
        game
    }

    fn current_rack_tile(game: &Game) -> Coordinate {
        game.rack(game.current_seat()).unwrap().occupied()[0]
    }

    #[test]
    fn test_moves_rejected_before_start() {
        let mut game = Game::with_seed(1);
        let a = Coordinate::new(0, 0);
        assert_eq!(game.move_stone_on_table(a, a), Err(GameError::NotStarted));
        assert_eq!(game.put_set(a, a), Err(GameError::NotStarted));
        assert_eq!(game.draw(SeatId(0)), Err(GameError::NotStarted));
    }

    #[test]
    fn test_join_rejected_once_started() {
        let mut game = two_player_game();
        assert_eq!(game.join(SeatId(2), "Cy", 20), Err(GameError::AlreadyStarted));
    }

    #[test]
    fn test_start_requires_two_or_three_players() {
        let mut game = Game::with_seed(1);
        game.join(SeatId(0), "Ada", 40).unwrap();
        assert_eq!(game.start(), Err(GameError::NotEnoughPlayers));
        for seat in 1..4 {
            game.join(SeatId(seat), "X", 20).unwrap();
        }
        assert_eq!(game.start(), Err(GameError::GameFull));
        assert_eq!(game.join(SeatId(3), "Y", 21), Ok(()));
    }

    #[test]
    fn test_fifth_player_cannot_join() {
        let mut game = Game::with_seed(1);
        for seat in 0..4 {
            game.join(SeatId(seat), "X", 20).unwrap();
        }
        assert_eq!(game.join(SeatId(4), "Z", 20), Err(GameError::GameFull));
    }

    #[test]
    fn test_equal_ages_start_with_lower_seat() {
        let mut game = Game::with_seed(1);
        game.join(SeatId(2), "Cy", 30).unwrap();
        game.join(SeatId(1), "Bo", 30).unwrap();
        game.start().unwrap();
        assert_eq!(game.current_seat(), SeatId(1));
    }

    #[test]
    fn test_put_stone_onto_taken_spot() {
        let mut game = two_player_game();
        let first = current_rack_tile(&game);
        game.put_stone(first, Coordinate::new(0, 0)).unwrap();
        let second = current_rack_tile(&game);
        assert_eq!(
            game.put_stone(second, Coordinate::new(0, 0)),
            Err(GameError::SpotTaken)
        );
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn test_out_of_bounds_is_placement_conflict() {
        let mut game = two_player_game();
        let src = current_rack_tile(&game);
        let err = game.put_stone(src, Coordinate::new(26, 0)).unwrap_err();
        assert_eq!(err, GameError::OutOfBounds(Coordinate::new(26, 0)));
        assert_eq!(err.kind(), crate::ErrorKind::PlacementConflict);
    }

    #[test]
    fn test_undo_returns_tile_to_rack() {
        let mut game = two_player_game();
        let seat = game.current_seat();
        let src = current_rack_tile(&game);
        game.put_stone(src, Coordinate::new(4, 4)).unwrap();
        assert_eq!(game.rack(seat).unwrap().len(), 13);
        game.undo();
        assert_eq!(game.rack(seat).unwrap().len(), 14);
        assert!(game.board().is_empty());
        game.undo();
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_board_swap_keeps_both_tiles() {
        let mut game = two_player_game();
        let a = Coordinate::new(0, 0);
        let b = Coordinate::new(1, 0);
        game.put_stone(current_rack_tile(&game), a).unwrap();
        game.put_stone(current_rack_tile(&game), b).unwrap();
        let (ta, tb) = (game.board().get(a), game.board().get(b));
        game.move_stone_on_table(a, b).unwrap();
        assert_eq!(game.board().get(a), tb);
        assert_eq!(game.board().get(b), ta);
    }

    #[test]
    fn test_move_from_empty_cell_fails() {
        let mut game = two_player_game();
        let a = Coordinate::new(3, 3);
        assert_eq!(
            game.move_stone_on_table(a, Coordinate::new(4, 3)),
            Err(GameError::NoTileAt(a))
        );
    }

    #[test]
    fn test_confirm_with_nothing_played() {
        let mut game = two_player_game();
        let seat = game.current_seat();
        assert_eq!(game.confirm_move(seat), Err(GameError::NotEnoughPoints));
    }

    #[test]
    fn test_confirm_by_other_player() {
        let mut game = two_player_game();
        let other = game.seats().into_iter().find(|s| *s != game.current_seat()).unwrap();
        assert_eq!(game.confirm_move(other), Err(GameError::NotYourTurn));
    }

    #[test]
    fn test_draw_by_other_player_resets_pending_moves() {
        let mut game = two_player_game();
        let current = game.current_seat();
        let other = game.seats().into_iter().find(|s| *s != current).unwrap();
        game.put_stone(current_rack_tile(&game), Coordinate::new(2, 2)).unwrap();
        assert_eq!(game.draw(other), Err(GameError::NotYourTurn));
        assert!(game.board().is_empty());
        assert_eq!(game.rack(current).unwrap().len(), 14);
        assert_eq!(game.current_seat(), current);
    }

    #[test]
    fn test_time_out_with_empty_bag_still_passes_turn() {
        let mut game = two_player_game();
        while game.bag_size() > 0 {
            game.pile.draw().unwrap();
        }
        let before = game.current_seat();
        game.time_out(before).unwrap();
        assert_ne!(game.current_seat(), before);
    }

    #[test]
    fn test_time_out_before_start_is_noop() {
        let mut game = Game::with_seed(1);
        assert_eq!(game.time_out(SeatId(0)), Ok(()));
    }

    #[test]
    fn test_removing_last_opponent_finishes_game() {
        let mut game = two_player_game();
        game.remove_player(SeatId(0));
        assert_eq!(game.phase(), GamePhase::Finished);
        assert_eq!(game.bag_size(), 106 - 14);
    }

    #[test]
    fn test_final_rank_orders_best_first() {
        let mut game = Game::with_seed(1);
        game.join(SeatId(0), "Ada", 40).unwrap();
        game.join(SeatId(1), "Bo", 30).unwrap();
        game.players
            .get_mut(&SeatId(0))
            .unwrap()
            .push_tile(Tile::new(Color::Red, 9))
            .unwrap();
        game.players
            .get_mut(&SeatId(1))
            .unwrap()
            .push_tile(Tile::new(Color::Red, 2))
            .unwrap();
        assert_eq!(
            game.final_rank(),
            vec![("Bo".to_owned(), -2), ("Ada".to_owned(), -9)]
        );
    }

    /// Replaces the rack of `seat` with exactly `tiles`.
    fn rig_rack(game: &mut Game, seat: SeatId, tiles: &[Tile]) {
        let player = game.players.get_mut(&seat).unwrap();
        player.rack_mut().clear();
        for tile in tiles {
            player.push_tile(*tile).unwrap();
        }
    }

    fn put_row(game: &mut Game, row: i32, count: usize) {
        for col in 0..count as i32 {
            let src = current_rack_tile(game);
            game.put_stone(src, Coordinate::new(col, row)).unwrap();
        }
    }

    #[test]
    fn test_confirm_eight_run_scores_thirty_six() {
        let mut game = two_player_game();
        let seat = game.current_seat();
        let mut tiles: Vec<Tile> = (1..=8).map(|r| Tile::new(Color::Red, r)).collect();
        tiles.push(Tile::new(Color::Blue, 13));
        rig_rack(&mut game, seat, &tiles);

        put_row(&mut game, 0, 8);
        game.confirm_move(seat).unwrap();

        assert_eq!(game.table_points, 36);
        assert_ne!(game.current_seat(), seat);
        assert!(game.history().is_empty());
        assert!(game.player_by_seat(seat).unwrap().has_played_first_move());
    }

    #[test]
    fn test_first_move_threshold() {
        let mut game = two_player_game();
        let seat = game.current_seat();
        let low: Vec<Tile> = (1..=3)
            .map(|r| Tile::new(Color::Black, r))
            .chain([Tile::new(Color::Blue, 13)])
            .collect();
        rig_rack(&mut game, seat, &low);
        put_row(&mut game, 0, 3);
        assert_eq!(game.confirm_move(seat), Err(GameError::NotEnoughPoints));

        // The same play is fine once the opening move is behind them.
        game.players.get_mut(&seat).unwrap().mark_first_move();
        game.confirm_move(seat).unwrap();
        assert_eq!(game.table_points, 6);
    }

    #[test]
    fn test_inconsistent_board_blocks_confirm() {
        let mut game = two_player_game();
        let seat = game.current_seat();
        let tiles = [
            Tile::new(Color::Red, 10),
            Tile::new(Color::Red, 12),
            Tile::new(Color::Red, 13),
            Tile::new(Color::Blue, 1),
        ];
        rig_rack(&mut game, seat, &tiles);
        put_row(&mut game, 0, 3);
        assert_eq!(game.confirm_move(seat), Err(GameError::TableInconsistent));
        assert_eq!(game.current_seat(), seat);
    }

    #[test]
    fn test_emptying_rack_wins() {
        let mut game = two_player_game();
        let seat = game.current_seat();
        let tiles = [
            Tile::new(Color::Yellow, 11),
            Tile::new(Color::Yellow, 12),
            Tile::new(Color::Yellow, 13),
        ];
        rig_rack(&mut game, seat, &tiles);
        put_row(&mut game, 2, 3);
        game.confirm_move(seat).unwrap();
        assert_eq!(game.phase(), GamePhase::Finished);
        assert!(game.has_winner());
        assert_eq!(game.final_rank()[0].1, 0);
    }

    #[test]
    fn test_put_set_moves_whole_rack_run() {
        let mut game = two_player_game();
        let seat = game.current_seat();
        let tiles = [
            Tile::new(Color::Blue, 4),
            Tile::new(Color::Blue, 5),
            Tile::new(Color::Blue, 6),
        ];
        rig_rack(&mut game, seat, &tiles);
        let moved = game
            .put_set(Coordinate::new(1, 0), Coordinate::new(10, 5))
            .unwrap();
        assert!(moved);
        assert_eq!(game.board().len(), 3);
        assert_eq!(game.board().get(Coordinate::new(9, 5)), Some(tiles[0]));
        assert_eq!(game.history().len(), 3);
        game.reset();
        assert!(game.board().is_empty());
        assert_eq!(game.rack(seat).unwrap().len(), 3);
    }

    #[test]
    fn test_put_set_onto_blocked_cells_changes_nothing() {
        let mut game = two_player_game();
        let seat = game.current_seat();
        let tiles = [
            Tile::new(Color::Blue, 4),
            Tile::new(Color::Blue, 5),
            Tile::new(Color::Blue, 6),
            Tile::joker(),
        ];
        rig_rack(&mut game, seat, &tiles);
        game.put_stone(Coordinate::new(3, 0), Coordinate::new(1, 0)).unwrap();
        let before = game.board().clone();
        let moved = game
            .put_set(Coordinate::new(0, 0), Coordinate::new(0, 0))
            .unwrap();
        assert!(!moved);
        assert_eq!(game.board(), &before);
        assert_eq!(game.rack(seat).unwrap().len(), 3);
    }

    #[test]
    fn test_sort_unknown_seat() {
        let mut game = Game::with_seed(1);
        assert_eq!(
            game.sort_hand_by_run(SeatId(2)),
            Err(GameError::UnknownPlayer(SeatId(2)))
        );
    }
}
