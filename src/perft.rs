//! Node-counting move generator diagnostic, used to validate move generation
//! against known-good counts.

use std::thread;

use crate::{movegen, position::Position};

/// Counts leaf nodes `depth` plies below `position`, recursing through
/// pseudo-legal generation and a trial Do/Undo legality check at every ply.
#[must_use]
pub fn perft(position: &Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut position = position.clone();
    let side = position.side_to_move();
    let mut total = 0;
    for mv in movegen::generate_pseudo_legal_moves(&position) {
        let undo = position.do_move(mv);
        if position.checkers(side).is_empty() {
            total += perft(&position, depth - 1);
        }
        position.undo_move(mv, &undo);
    }
    total
}

/// One root move and the leaf-node count below it.
#[derive(Clone, Copy, Debug)]
pub struct PerftSplit {
    pub mv: movegen::Move,
    pub nodes: u64,
}

/// Runs [`perft`] fanned out one thread per legal root move, each with its
/// own cloned `Position` and no shared mutable state, and returns the
/// per-move split alongside the total.
///
/// # Panics
///
/// Panics if a worker thread panics.
#[must_use]
pub fn perft_split(position: &Position, depth: u8) -> (Vec<PerftSplit>, u64) {
    let root_moves = movegen::generate_legal_moves(position);

    let splits = thread::scope(|scope| {
        let handles: Vec<_> = root_moves
            .into_iter()
            .map(|mv| {
                let mut child = position.clone();
                scope.spawn(move || {
                    child.do_move(mv);
                    let nodes = if depth == 0 { 1 } else { perft(&child, depth - 1) };
                    PerftSplit { mv, nodes }
                })
            })
            .collect();

        handles.into_iter().map(|handle| handle.join().expect("perft worker thread panicked")).collect::<Vec<_>>()
    });

    let total = splits.iter().map(|split| split.nodes).sum();
    (splits, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_depth_one_is_twenty() {
        assert_eq!(perft(&Position::startpos(), 1), 20);
    }

    #[test]
    fn startpos_depth_three_matches_known_count() {
        assert_eq!(perft(&Position::startpos(), 3), 8_902);
    }

    #[test]
    fn split_matches_unsplit_total() {
        let position = Position::startpos();
        let (_, total) = perft_split(&position, 3);
        assert_eq!(total, perft(&position, 3));
    }
}
