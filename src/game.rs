//! A game: the position at the end of a move sequence, plus enough history
//! to detect repetition and to undo back to any earlier point.

use crate::{movegen::Move, position::Position};

struct State {
    key: u64,
    position: Position,
}

/// A position reached by a sequence of moves from some starting position,
/// tracking the full history needed for [`Game::repetition_count`].
pub struct Game {
    history: Vec<State>,
}

impl Game {
    #[must_use]
    pub fn new(position: Position) -> Self {
        let key = position.key();
        Self {
            history: vec![State { key, position }],
        }
    }

    #[must_use]
    pub fn from_startpos() -> Self {
        Self::new(Position::startpos())
    }

    /// Applies `mv` to the current position and pushes the result onto the
    /// history stack.
    pub fn do_move(&mut self, mv: Move) {
        let mut position = self.position().clone();
        position.do_move(mv);
        let key = position.key();
        self.history.push(State { key, position });
    }

    /// Pops the most recent position off the history stack, restoring the
    /// one before it.
    ///
    /// # Panics
    ///
    /// Panics if called on a game with no moves played.
    pub fn undo_move(&mut self) {
        assert!(self.history.len() > 1, "cannot undo the starting position");
        self.history.pop();
    }

    /// Passes the move to the opponent without making a real move; used
    /// only by null-move pruning. Does not count toward repetition history.
    pub fn do_null_move(&mut self) -> crate::position::NullMoveUndo {
        let state = self.history.last_mut().expect("history is never empty");
        let undo = state.position.do_null_move();
        state.key = state.position.key();
        undo
    }

    pub fn undo_null_move(&mut self, undo: &crate::position::NullMoveUndo) {
        let state = self.history.last_mut().expect("history is never empty");
        state.position.undo_null_move(undo);
        state.key = state.position.key();
    }

    #[must_use]
    pub fn position(&self) -> &Position {
        &self.history.last().expect("history is never empty").position
    }

    /// How many times the current position's key has occurred in this
    /// game, including the current occurrence itself. A threefold
    /// repetition is `repetition_count() >= 3`.
    ///
    /// Scans backward from the position two plies ago (a key can only
    /// repeat an even number of plies back) and stops at the last
    /// irreversible move, since the halfmove clock reset there means
    /// nothing further back could reach the current position.
    #[must_use]
    pub fn repetition_count(&self) -> usize {
        let mut repetitions = 1;
        let current_key = self.position().key();
        let halfmove_clock = self.position().halfmove_clock() as usize;

        if self.history.len() < 3 {
            return repetitions;
        }

        let start = self.history.len() - 3;
        let limit = (self.history.len() - 1).saturating_sub(halfmove_clock);
        let mut i = start;
        loop {
            if self.history[i].key == current_key {
                repetitions += 1;
            }
            if i <= limit {
                break;
            }
            i -= 1;
        }
        repetitions
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::from_startpos()
    }
}

/// A RAII guard that applies a move to a [`Position`] on construction and
/// undoes it when dropped.
pub struct ScopedMove<'position> {
    position: &'position mut Position,
    mv: Move,
    undo: crate::position::UndoInfo,
}

impl<'position> ScopedMove<'position> {
    pub fn new(mv: Move, position: &'position mut Position) -> Self {
        let undo = position.do_move(mv);
        Self { position, mv, undo }
    }

    #[must_use]
    pub fn position(&self) -> &Position {
        self.position
    }

    pub fn position_mut(&mut self) -> &mut Position {
        self.position
    }
}

impl Drop for ScopedMove<'_> {
    fn drop(&mut self) {
        self.position.undo_move(self.mv, &self.undo);
    }
}

/// A RAII guard that applies a move to a [`Game`] on construction and undoes
/// it when dropped.
pub struct ScopedGameMove<'game> {
    game: &'game mut Game,
}

impl<'game> ScopedGameMove<'game> {
    pub fn new(mv: Move, game: &'game mut Game) -> Self {
        game.do_move(mv);
        Self { game }
    }

    #[must_use]
    pub fn game(&self) -> &Game {
        self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        self.game
    }
}

impl Drop for ScopedGameMove<'_> {
    fn drop(&mut self) {
        self.game.undo_move();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::Flag;

    #[test]
    fn do_undo_round_trips_position() {
        let mut game = Game::from_startpos();
        let fen_before = game.position().to_fen();
        let mv = Move::new("e2".parse().unwrap(), "e4".parse().unwrap(), Flag::DOUBLE_PAWN_PUSH);
        game.do_move(mv);
        assert_ne!(game.position().to_fen(), fen_before);
        game.undo_move();
        assert_eq!(game.position().to_fen(), fen_before);
    }

    #[test]
    fn scoped_move_restores_on_drop() {
        let mut position = Position::startpos();
        let fen_before = position.to_fen();
        let mv = Move::new("e2".parse().unwrap(), "e4".parse().unwrap(), Flag::DOUBLE_PAWN_PUSH);
        {
            let scoped = ScopedMove::new(mv, &mut position);
            assert_ne!(scoped.position().to_fen(), fen_before);
        }
        assert_eq!(position.to_fen(), fen_before);
    }

    #[test]
    fn repetition_count_starts_at_one() {
        let game = Game::from_startpos();
        assert_eq!(game.repetition_count(), 1);
    }

    #[test]
    fn repetition_count_detects_threefold() {
        let mut game = Game::from_startpos();
        let knight_out = [
            Move::new("g1".parse().unwrap(), "f3".parse().unwrap(), Flag::NONE),
            Move::new("g8".parse().unwrap(), "f6".parse().unwrap(), Flag::NONE),
            Move::new("f3".parse().unwrap(), "g1".parse().unwrap(), Flag::NONE),
            Move::new("f6".parse().unwrap(), "g8".parse().unwrap(), Flag::NONE),
        ];
        // Startpos recurs after each full shuffle-out-and-back cycle.
        for _ in 0..2 {
            for mv in knight_out {
                game.do_move(mv);
            }
        }
        assert_eq!(game.repetition_count(), 3);
    }
}
