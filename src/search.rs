//! Iterative-deepening negamax alpha-beta search over a [`Game`].
//!
//! This is deliberately single-threaded: no worker pool, no time-slicing,
//! no pondering. Depth is the only stopping condition; `wtime`/`btime` are
//! accepted at the UCI surface but never consulted here.

use std::time::{Duration, Instant};

use crate::{
    defs::{PieceType, Side},
    evaluation,
    game::{Game, ScopedGameMove},
    movegen::{self, Move, MoveList},
    position::Position,
    transposition_table::{Bound, TranspositionTable, MATE_THRESHOLD},
};

/// Ply beyond which the triangular PV table and killer slots are not
/// indexed; deep enough for any depth this engine is configured to reach.
pub const MAX_PLY: usize = 128;

/// The score of "checkmate delivered on this ply", before the `+ ply`
/// distance adjustment described in the module-level search contract.
pub const MATE_BASE: i32 = 99_000;

const NULL_MOVE_REDUCTION: u8 = 2;

/// Progress reported after each completed iterative-deepening depth.
#[derive(Clone, Debug)]
pub struct SearchInfo {
    pub depth: u8,
    pub seldepth: u8,
    pub score: i32,
    pub nodes: u64,
    pub pv: Vec<Move>,
    pub elapsed: Duration,
}

impl SearchInfo {
    /// Nodes searched per second so far this search, 0 if no time has
    /// elapsed yet.
    #[must_use]
    pub fn nps(&self) -> u64 {
        let micros = self.elapsed.as_micros();
        (u128::from(self.nodes) * 1_000_000)
            .checked_div(micros)
            .and_then(|nps| u64::try_from(nps).ok())
            .unwrap_or(0)
    }
}

/// A non-blocking callback invoked once per completed depth; see
/// [`SearchInfo`].
pub type InfoObserver<'a> = dyn FnMut(&SearchInfo) + 'a;

/// Converts a raw score into a `(is_mate, moves_to_mate)` pair for UCI
/// reporting, per the distance-to-mate formula: `N = ceil((MATE_BASE -
/// |score|) / 2)`, signed by the sign of the score.
#[must_use]
pub fn mate_distance(score: i32) -> Option<i32> {
    if score.unsigned_abs().cast_signed() <= MATE_THRESHOLD {
        return None;
    }
    let plies = MATE_BASE - score.abs();
    let moves = (plies + 1) / 2;
    Some(if score > 0 { moves } else { -moves })
}

struct Searcher<'a> {
    tt: &'a mut TranspositionTable,
    killers: [[Move; 2]; MAX_PLY],
    pv: Vec<Move>,
    nodes: u64,
    seldepth: u8,
    max_depth: u8,
}

impl<'a> Searcher<'a> {
    fn new(tt: &'a mut TranspositionTable, max_depth: u8) -> Self {
        Self {
            tt,
            killers: [[Move::null(); 2]; MAX_PLY],
            pv: vec![Move::null(); MAX_PLY * MAX_PLY],
            nodes: 0,
            seldepth: 0,
            max_depth,
        }
    }

    fn pv_row(&self, ply: usize) -> &[Move] {
        &self.pv[ply * MAX_PLY..(ply + 1) * MAX_PLY]
    }

    fn null_terminate_pv(&mut self, ply: usize) {
        self.pv[ply * MAX_PLY] = Move::null();
    }

    /// Writes `mv` as the best move at `ply` and appends the continuation
    /// recorded at `ply + 1`, null-terminated.
    fn update_pv(&mut self, ply: usize, mv: Move) {
        self.pv[ply * MAX_PLY] = mv;
        let mut offset = 1;
        loop {
            let continuation = self.pv[(ply + 1) * MAX_PLY + offset - 1];
            self.pv[ply * MAX_PLY + offset] = continuation;
            if continuation.is_null() || ply + 1 >= MAX_PLY - 1 {
                break;
            }
            offset += 1;
        }
    }

    fn principal_variation(&self) -> Vec<Move> {
        self.pv_row(0).iter().take_while(|mv| !mv.is_null()).copied().collect()
    }

    fn record_killer(&mut self, ply: usize, mv: Move) {
        if self.killers[ply][0] == mv {
            return;
        }
        self.killers[ply][1] = self.killers[ply][0];
        self.killers[ply][0] = mv;
    }

    fn quiescence(&mut self, position: &mut Position, mut alpha: i32, beta: i32, ply: u16) -> i32 {
        self.nodes += 1;
        self.seldepth = self.seldepth.max(u8::try_from(ply).unwrap_or(u8::MAX));

        let stand_pat = evaluation::evaluate(position);
        if stand_pat >= beta {
            return beta;
        }
        alpha = alpha.max(stand_pat);

        let mut captures: MoveList =
            movegen::generate_legal_moves(position).into_iter().filter(|mv| mv.is_capture()).collect();
        order_captures(position, &mut captures);

        for mv in captures {
            let undo = position.do_move(mv);
            let score = -self.quiescence(position, -beta, -alpha, ply + 1);
            position.undo_move(mv, &undo);

            if score >= beta {
                return beta;
            }
            alpha = alpha.max(score);
        }

        alpha
    }

    fn negamax(&mut self, game: &mut Game, mut alpha: i32, beta: i32, ply: u16, max_depth: u8) -> i32 {
        self.nodes += 1;
        let ply_index = ply as usize;
        if ply_index < MAX_PLY {
            self.null_terminate_pv(ply_index);
        }

        let key = game.position().key();
        let side = game.position().side_to_move();
        let in_check = !game.position().checkers(side).is_empty();
        let remaining_depth = max_depth.saturating_sub(ply as u8);

        let probe = self.tt.probe(key, remaining_depth, ply, alpha, beta);
        if ply > 0 {
            if let Some(score) = probe.score {
                return score;
            }
        }

        if ply as u8 >= max_depth && !in_check {
            let score = self.quiescence(&mut game.position().clone(), alpha, beta, ply);
            self.tt.store(key, 0, ply, score, Bound::Exact, Move::null());
            return score;
        }

        if ply > 0
            && remaining_depth >= 2
            && !in_check
            && has_non_king_pawn_piece(game.position(), side)
        {
            let undo = game.do_null_move();
            let reduced_depth = max_depth.saturating_sub(NULL_MOVE_REDUCTION);
            let score = -self.negamax(game, -beta, -beta + 1, ply + 1, reduced_depth);
            game.undo_null_move(&undo);
            if score >= beta {
                return beta;
            }
        }

        let mut moves = movegen::generate_legal_moves(game.position());
        if moves.is_empty() {
            return if in_check { -MATE_BASE + i32::from(ply) } else { 0 };
        }

        if ply > 0 && game.repetition_count() >= 3 {
            return 0;
        }

        let killers = if ply_index < MAX_PLY { self.killers[ply_index] } else { [Move::null(); 2] };
        order_moves(game.position(), &mut moves, probe.best_move, killers);

        let mut bound = Bound::Upper;
        let mut best_move = moves[0];
        for mv in moves {
            let score = {
                let mut scoped = ScopedGameMove::new(mv, game);
                -self.negamax(scoped.game_mut(), -beta, -alpha, ply + 1, max_depth)
            };

            if score >= beta {
                self.tt.store(key, remaining_depth, ply, beta, Bound::Lower, mv);
                if !mv.is_capture() && ply_index < MAX_PLY {
                    self.record_killer(ply_index, mv);
                }
                return beta;
            }
            if score > alpha {
                alpha = score;
                bound = Bound::Exact;
                best_move = mv;
                if ply_index < MAX_PLY {
                    self.update_pv(ply_index, mv);
                }
            }
        }

        self.tt.store(key, remaining_depth, ply, alpha, bound, best_move);
        alpha
    }
}

/// Whether `side` has any piece besides king and pawns, the guard null-move
/// pruning uses to avoid miscalculating in zugzwang-prone endgames.
fn has_non_king_pawn_piece(position: &Position, side: Side) -> bool {
    [PieceType::KNIGHT, PieceType::BISHOP, PieceType::ROOK, PieceType::QUEEN]
        .into_iter()
        .any(|piece_type| !position.pieces_of(side, piece_type).is_empty())
}

const NUM_PIECE_TYPES: i32 = PieceType::TOTAL as i32;

fn capture_key(position: &Position, mv: Move) -> i32 {
    let victim = if mv.is_en_passant_capture() { PieceType::PAWN } else { position.piece_at(mv.to()) };
    let attacker = position.piece_at(mv.from());
    (i32::from(PieceType::KING.0) - i32::from(victim.0)) * NUM_PIECE_TYPES + i32::from(attacker.0)
}

fn promotion_rank(piece_type: PieceType) -> i32 {
    match piece_type.0 {
        4 => 0, // queen
        3 => 1, // rook
        2 => 2, // bishop
        _ => 3, // knight
    }
}

/// The move ordering sort key described by the move-ordering contract:
/// ascending, priority move first, then MVV/LVA captures, then promotions,
/// castles, killers, everything else.
fn move_key(position: &Position, mv: Move, priority: Option<Move>, killers: [Move; 2]) -> i32 {
    if priority == Some(mv) {
        return 0;
    }
    if mv.is_capture() {
        return 10 + capture_key(position, mv);
    }
    if mv.is_promotion() {
        return 100 + promotion_rank(mv.promoted_piece());
    }
    if mv.is_castle() {
        return 200;
    }
    if mv == killers[0] {
        return 300;
    }
    if mv == killers[1] {
        return 301;
    }
    1000
}

fn order_moves(position: &Position, moves: &mut MoveList, priority: Option<Move>, killers: [Move; 2]) {
    moves.sort_by_key(|&mv| move_key(position, mv, priority, killers));
}

fn order_captures(position: &Position, moves: &mut MoveList) {
    moves.sort_by_key(|&mv| capture_key(position, mv));
}

/// Searches `game` to `max_depth`, reporting progress through
/// `info_observer` after each completed depth, and returns the best move
/// found (the null move only if the root position has none).
pub fn search(
    game: &mut Game,
    tt: &mut TranspositionTable,
    max_depth: u8,
    mut info_observer: Option<&mut InfoObserver<'_>>,
) -> Move {
    let root_moves = movegen::generate_legal_moves(game.position());
    if root_moves.is_empty() {
        return Move::null();
    }

    let mut best_move = root_moves[0];
    let mut searcher = Searcher::new(tt, max_depth);
    let start = Instant::now();

    for depth in 1..=max_depth {
        searcher.max_depth = depth;
        searcher.seldepth = 0;
        let score = searcher.negamax(game, -MATE_BASE - 1, MATE_BASE + 1, 0, depth);

        let pv = searcher.principal_variation();
        if let Some(&mv) = pv.first() {
            best_move = mv;
        } else if let Some(mv) = searcher.tt.probe(game.position().key(), 0, 0, -MATE_BASE - 1, MATE_BASE + 1).best_move
        {
            best_move = mv;
        }

        if let Some(observer) = info_observer.as_deref_mut() {
            observer(&SearchInfo {
                depth,
                seldepth: searcher.seldepth,
                score,
                nodes: searcher.nodes,
                pv,
                elapsed: start.elapsed(),
            });
        }
    }

    best_move
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_distance_rounds_up_and_carries_sign() {
        assert_eq!(mate_distance(MATE_BASE - 1), Some(1));
        assert_eq!(mate_distance(-(MATE_BASE - 1)), Some(-1));
        assert_eq!(mate_distance(100), None);
    }

    #[test]
    fn threefold_repetition_is_scored_as_a_draw() {
        let mut game = Game::from_startpos();
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        for _ in 0..2 {
            for mv in shuffle {
                game.do_move(mv.parse().unwrap());
            }
        }
        assert_eq!(game.repetition_count(), 3);
        let mut tt = TranspositionTable::with_megabytes(1);
        search(&mut game, &mut tt, 1, None::<&mut InfoObserver<'_>>);
    }
}
