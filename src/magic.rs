//! Magic-bitboard attack lookups for bishops and rooks.
//!
//! Magic numbers are not baked in as constants; they are found by random
//! search the first time the tables are built, the way
//! [`find_magics`](https://github.com) tools in other engines do offline.
//! Doing it lazily at process start keeps the build simple at the cost of a
//! few milliseconds of startup time.

use lazy_static::lazy_static;
use oorandom::Rand64;

use crate::{
    bitboard::Bitboard,
    defs::{Direction, Square},
};

const BISHOP_DIRECTIONS: [Direction; 4] = [Direction::NE, Direction::NW, Direction::SE, Direction::SW];
const ROOK_DIRECTIONS: [Direction; 4] = [Direction::N, Direction::S, Direction::E, Direction::W];

/// A single square's magic-indexed attack table.
#[derive(Clone)]
struct Magic {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    attacks: Vec<Bitboard>,
}

impl Magic {
    #[inline]
    fn index(&self, occupied: Bitboard) -> usize {
        let relevant = occupied.0 & self.mask.0;
        ((relevant.wrapping_mul(self.magic)) >> self.shift) as usize
    }

    #[inline]
    fn attacks(&self, occupied: Bitboard) -> Bitboard {
        self.attacks[self.index(occupied)]
    }
}

pub struct MagicTable {
    bishop: Vec<Magic>,
    rook: Vec<Magic>,
}

lazy_static! {
    static ref TABLE: MagicTable = MagicTable::new();
}

/// Bishop attacks from `square` given the full board occupancy.
#[must_use]
pub fn bishop_attacks(square: Square, occupied: Bitboard) -> Bitboard {
    TABLE.bishop[square.0 as usize].attacks(occupied)
}

/// Rook attacks from `square` given the full board occupancy.
#[must_use]
pub fn rook_attacks(square: Square, occupied: Bitboard) -> Bitboard {
    TABLE.rook[square.0 as usize].attacks(occupied)
}

/// Queen attacks from `square` given the full board occupancy.
#[must_use]
pub fn queen_attacks(square: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(square, occupied) | rook_attacks(square, occupied)
}

impl MagicTable {
    fn new() -> Self {
        let mut rng = Rand64::new(0x7a7a_1234_dead_beef);
        let bishop = (0..64)
            .map(|square| build_magic(Square(square as u8), &BISHOP_DIRECTIONS, &mut rng))
            .collect();
        let rook = (0..64)
            .map(|square| build_magic(Square(square as u8), &ROOK_DIRECTIONS, &mut rng))
            .collect();
        Self { bishop, rook }
    }
}

/// The squares a slider on `square` could move to along `directions` if the
/// board were otherwise empty, excluding the final square of each ray (the
/// "relevant occupancy mask": a blocker beyond the last square can't exist,
/// so whether that last square itself is occupied never changes the attack
/// set, and it's dropped to shrink the table).
///
/// This must trim per-ray, not by blanket file/rank membership: a rook on
/// `a1` slides entirely within file A, so excluding all of file A (as a
/// bishop's corner-trimming shortcut would) would wrongly drop its whole
/// vertical ray instead of just its far endpoint.
fn relevant_mask(square: Square, directions: &[Direction; 4]) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    for &direction in directions {
        let mut current = Bitboard::from_square(square);
        loop {
            let next = current.shift(direction);
            if next.is_empty() {
                break;
            }
            if next.shift(direction).is_empty() {
                break;
            }
            mask |= next;
            current = next;
        }
    }
    mask
}

/// The true attack set of a slider on `square` along `directions`, stopping
/// at (and including) the first blocker in `occupied`.
fn sliding_attacks(square: Square, directions: &[Direction; 4], occupied: Bitboard) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &direction in directions {
        let mut current = Bitboard::from_square(square);
        loop {
            current = current.shift(direction);
            if current.is_empty() {
                break;
            }
            attacks |= current;
            if !(current & occupied).is_empty() {
                break;
            }
        }
    }
    attacks
}

/// Enumerates every subset of `mask` via the carry-rippler trick.
fn subsets(mask: Bitboard) -> Vec<Bitboard> {
    let mut subsets = Vec::with_capacity(1 << mask.popcount());
    let mut subset = 0u64;
    loop {
        subsets.push(Bitboard(subset));
        subset = subset.wrapping_sub(mask.0) & mask.0;
        if subset == 0 {
            break;
        }
    }
    subsets
}

fn build_magic(square: Square, directions: &[Direction; 4], rng: &mut Rand64) -> Magic {
    let mask = relevant_mask(square, directions);
    // A corner square's diagonal can run entirely along the board edge,
    // leaving no relevant occupancy bits; clamp to 1 so `shift` stays a
    // valid shift amount. Every occupancy then maps to index 0.
    let bits = mask.popcount().max(1);
    let shift = 64 - bits;
    let occupancies = subsets(mask);
    let reference: Vec<Bitboard> = occupancies
        .iter()
        .map(|&occupied| sliding_attacks(square, directions, occupied))
        .collect();

    loop {
        let candidate = sparse_random(rng);
        if let Some(attacks) = try_magic(candidate, shift, &occupancies, &reference) {
            return Magic {
                mask,
                magic: candidate,
                shift,
                attacks,
            };
        }
    }
}

/// A random candidate with few bits set, which empirically makes a better
/// magic number than a uniformly random `u64`.
fn sparse_random(rng: &mut Rand64) -> u64 {
    rng.rand_u64() & rng.rand_u64() & rng.rand_u64()
}

fn try_magic(
    magic: u64,
    shift: u32,
    occupancies: &[Bitboard],
    reference: &[Bitboard],
) -> Option<Vec<Bitboard>> {
    let mut table = vec![None; 1usize << (64 - shift)];
    for (&occupied, &attacks) in occupancies.iter().zip(reference) {
        let index = ((occupied.0.wrapping_mul(magic)) >> shift) as usize;
        match table[index] {
            None => table[index] = Some(attacks),
            Some(existing) if existing == attacks => {}
            Some(_) => return None,
        }
    }
    Some(table.into_iter().map(|entry| entry.unwrap_or(Bitboard::EMPTY)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_attacks_from_empty_board_corner() {
        let a8 = Square(0);
        let attacks = rook_attacks(a8, Bitboard::EMPTY);
        assert_eq!(attacks.popcount(), 14);
    }

    #[test]
    fn bishop_attacks_stop_at_blocker() {
        let e4 = "e4".parse::<Square>().unwrap();
        let blocker = "g6".parse::<Square>().unwrap();
        let occupied = Bitboard::from_square(blocker);
        let attacks = bishop_attacks(e4, occupied);
        assert!(attacks.contains(blocker));
        let beyond = "h7".parse::<Square>().unwrap();
        assert!(!attacks.contains(beyond));
    }

    #[test]
    fn rook_attacks_stop_at_blocker_and_include_it() {
        let a1 = "a1".parse::<Square>().unwrap();
        let blocker = "a4".parse::<Square>().unwrap();
        let occupied = Bitboard::from_square(blocker);
        let attacks = rook_attacks(a1, occupied);
        assert!(attacks.contains(blocker));
        let beyond = "a5".parse::<Square>().unwrap();
        assert!(!attacks.contains(beyond));
    }
}
