//! A bucketed transposition table: a hash map from Zobrist key to cached
//! search results, sized to a fixed byte budget.
//!
//! This engine's search is single-threaded, so unlike a concurrent engine's
//! table there is no need for atomics or a lock-free replace trick here;
//! each bucket is two plain entries, one always-replace and one
//! depth-preferred.

use crate::movegen::Move;

/// Scores with absolute value above this are mate scores and need
/// ply-distance normalization when stored or probed.
pub const MATE_THRESHOLD: i32 = 80_000;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Bound {
    /// `score <= alpha`: the true score is at most this.
    Upper,
    /// `alpha < score < beta`: the true score.
    Exact,
    /// `score >= beta`: the true score is at least this.
    Lower,
}

#[derive(Clone, Copy)]
struct Entry {
    key: u64,
    best_move: Move,
    depth: u8,
    score: i32,
    bound: Bound,
}

impl Entry {
    const EMPTY: Self = Self {
        key: 0,
        best_move: Move::null(),
        depth: 0,
        score: 0,
        bound: Bound::Upper,
    };
}

/// What a [`TranspositionTable::probe`] found for a position.
#[derive(Clone, Copy, Debug, Default)]
pub struct Probe {
    /// The stored best move, usable for ordering even when the depth was
    /// too shallow to trust the score.
    pub best_move: Option<Move>,
    /// The stored score, present only when the stored depth was sufficient
    /// and the bound permits a cutoff at the given window.
    pub score: Option<i32>,
}

pub struct TranspositionTable {
    buckets: Vec<[Entry; 2]>,
    mask: u64,
}

/// Bytes used by one bucket (two entries); used to size the table to a
/// megabyte budget.
const BUCKET_BYTES: usize = std::mem::size_of::<[Entry; 2]>();

impl TranspositionTable {
    #[must_use]
    pub fn with_megabytes(megabytes: usize) -> Self {
        let mut table = Self { buckets: Vec::new(), mask: 0 };
        table.resize(megabytes);
        table
    }

    /// Resizes and clears the table to the largest power-of-two bucket
    /// count that fits in `megabytes`, with a floor of one bucket (so a
    /// budget of 0, or one smaller than a single bucket, still works).
    pub fn resize(&mut self, megabytes: usize) {
        let budget_bytes = megabytes * 1024 * 1024;
        let wanted_buckets = (budget_bytes / BUCKET_BYTES).max(1);
        // The largest power of two that still fits the byte budget.
        let bucket_count = 1usize << wanted_buckets.ilog2();

        self.buckets = vec![[Entry::EMPTY; 2]; bucket_count];
        self.mask = (bucket_count - 1) as u64;
    }

    pub fn clear(&mut self) {
        self.buckets.fill([Entry::EMPTY; 2]);
    }

    fn index(&self, key: u64) -> usize {
        (key & self.mask) as usize
    }

    /// Looks up `key`. `alpha`/`beta` and `depth` determine whether the
    /// stored score is usable at this node; the stored best move is
    /// returned for ordering purposes regardless.
    #[must_use]
    pub fn probe(&self, key: u64, depth: u8, ply: u16, alpha: i32, beta: i32) -> Probe {
        let Some(entry) = self.buckets[self.index(key)].iter().find(|entry| entry.key == key) else {
            return Probe::default();
        };

        let best_move = (!entry.best_move.is_null()).then_some(entry.best_move);

        if entry.depth < depth {
            return Probe { best_move, score: None };
        }

        let score = score_from_tt(entry.score, ply);
        let usable = match entry.bound {
            Bound::Exact => true,
            Bound::Lower => score >= beta,
            Bound::Upper => score <= alpha,
        };

        Probe {
            best_move,
            score: usable.then_some(score),
        }
    }

    /// Stores an entry. The always-replace slot is unconditionally
    /// overwritten; the depth-preferred slot is kept unless the new entry
    /// was searched at least as deep.
    pub fn store(&mut self, key: u64, depth: u8, ply: u16, score: i32, bound: Bound, best_move: Move) {
        let entry = Entry {
            key,
            best_move,
            depth,
            score: score_to_tt(score, ply),
            bound,
        };

        let index = self.index(key);
        let bucket = &mut self.buckets[index];
        bucket[0] = entry;
        if depth >= bucket[1].depth || bucket[1].key == key {
            bucket[1] = entry;
        }
    }
}

/// Converts a search-relative (distance-from-current-node) mate score into
/// a position-relative (distance-from-this-position) one for storage.
fn score_to_tt(score: i32, ply: u16) -> i32 {
    if score > MATE_THRESHOLD {
        score + i32::from(ply)
    } else if score < -MATE_THRESHOLD {
        score - i32::from(ply)
    } else {
        score
    }
}

/// Reverses [`score_to_tt`] when reading a stored score back at `ply`.
fn score_from_tt(score: i32, ply: u16) -> i32 {
    if score > MATE_THRESHOLD {
        score - i32::from(ply)
    } else if score < -MATE_THRESHOLD {
        score + i32::from(ply)
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::Flag;

    fn mv() -> Move {
        Move::new("e2".parse().unwrap(), "e4".parse().unwrap(), Flag::DOUBLE_PAWN_PUSH)
    }

    #[test]
    fn round_trips_an_exact_entry() {
        let mut table = TranspositionTable::with_megabytes(1);
        table.store(0x1234, 5, 0, 42, Bound::Exact, mv());
        let probe = table.probe(0x1234, 5, 0, -100, 100);
        assert_eq!(probe.best_move, Some(mv()));
        assert_eq!(probe.score, Some(42));
    }

    #[test]
    fn shallower_probe_withholds_score_but_keeps_move() {
        let mut table = TranspositionTable::with_megabytes(1);
        table.store(0x1234, 3, 0, 42, Bound::Exact, mv());
        let probe = table.probe(0x1234, 5, 0, -100, 100);
        assert_eq!(probe.best_move, Some(mv()));
        assert_eq!(probe.score, None);
    }

    #[test]
    fn key_collision_on_index_is_rejected() {
        let mut table = TranspositionTable::with_megabytes(1);
        table.store(1, 5, 0, 42, Bound::Exact, mv());
        let probe = table.probe(2, 5, 0, -100, 100);
        assert_eq!(probe.score, None);
        assert_eq!(probe.best_move, None);
    }

    #[test]
    fn mate_scores_are_normalized_across_plies() {
        let mut table = TranspositionTable::with_megabytes(1);
        // A mate-in-1-from-here score found at ply 3.
        let mate_score = 99_000 - 4;
        table.store(7, 1, 3, mate_score, Bound::Exact, mv());
        // Probed again from ply 3, it should read back unchanged.
        let probe = table.probe(7, 1, 3, -100_000, 100_000);
        assert_eq!(probe.score, Some(mate_score));
    }

    #[test]
    fn zero_megabytes_still_gives_a_usable_table() {
        let mut table = TranspositionTable::with_megabytes(0);
        table.store(5, 1, 0, 10, Bound::Exact, mv());
        assert_eq!(table.probe(5, 1, 0, -100, 100).score, Some(10));
    }

    #[test]
    fn non_power_of_two_budget_rounds_down() {
        let table = TranspositionTable::with_megabytes(3);
        assert!((table.buckets.len() & (table.buckets.len() - 1)) == 0);
    }
}
