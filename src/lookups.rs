//! One-time-initialized lookup tables: rays, leaper attacks, the
//! line-between table and passed-pawn masks.

use lazy_static::lazy_static;

use crate::{
    bitboard::Bitboard,
    defs::{Direction, File, Rank, Side, Square},
};

/// All eight compass directions, in a fixed order used to build ray tables.
const DIRECTIONS: [Direction; 8] = [
    Direction::N,
    Direction::S,
    Direction::E,
    Direction::W,
    Direction::NE,
    Direction::NW,
    Direction::SE,
    Direction::SW,
];

/// The line-between table generated by `build.rs`: for squares sharing a
/// rank, file or diagonal, the squares strictly between them; empty
/// otherwise.
static LINE_BETWEEN_BYTES: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/line_between.bin"));

lazy_static! {
    static ref LINE_BETWEEN: [[Bitboard; 64]; 64] = {
        let mut table = [[Bitboard::EMPTY; 64]; 64];
        for from in 0..64 {
            for to in 0..64 {
                let offset = (from * 64 + to) * 8;
                let bytes: [u8; 8] = LINE_BETWEEN_BYTES[offset..offset + 8]
                    .try_into()
                    .expect("build.rs emits 8-byte little-endian words");
                table[from][to] = Bitboard(u64::from_le_bytes(bytes));
            }
        }
        table
    };

    /// Rays from each square in each of the 8 directions, up to but
    /// excluding the board edge.
    static ref RAYS: [[Bitboard; 8]; 64] = {
        let mut table = [[Bitboard::EMPTY; 8]; 64];
        for square in 0..64u8 {
            for (dir_index, &direction) in DIRECTIONS.iter().enumerate() {
                let mut ray = Bitboard::EMPTY;
                let mut current = Bitboard::from_square(Square(square));
                loop {
                    current = current.shift(direction);
                    if current.is_empty() {
                        break;
                    }
                    ray |= current;
                }
                table[square as usize][dir_index] = ray;
            }
        }
        table
    };

    static ref PAWN_ATTACKS: [[Bitboard; 64]; 2] = {
        let mut table = [[Bitboard::EMPTY; 64]; 2];
        for square in 0..64u8 {
            let bb = Bitboard::from_square(Square(square));
            table[Side::WHITE.to_index()][square as usize] =
                bb.shift(Direction::NE) | bb.shift(Direction::NW);
            table[Side::BLACK.to_index()][square as usize] =
                bb.shift(Direction::SE) | bb.shift(Direction::SW);
        }
        table
    };

    static ref KNIGHT_ATTACKS: [Bitboard; 64] = {
        let mut table = [Bitboard::EMPTY; 64];
        for square in 0..64u8 {
            let rank = i32::from(square / 8);
            let file = i32::from(square % 8);
            let mut attacks = Bitboard::EMPTY;
            for (dr, df) in KNIGHT_STEPS {
                let (nr, nf) = (rank + dr, file + df);
                if (0..8).contains(&nr) && (0..8).contains(&nf) {
                    attacks |= Bitboard::from_square(Square((nr * 8 + nf) as u8));
                }
            }
            table[square as usize] = attacks;
        }
        table
    };

    static ref KING_ATTACKS: [Bitboard; 64] = {
        let mut table = [Bitboard::EMPTY; 64];
        for square in 0..64u8 {
            let bb = Bitboard::from_square(Square(square));
            let mut attacks = Bitboard::EMPTY;
            for &direction in &DIRECTIONS {
                attacks |= bb.shift(direction);
            }
            table[square as usize] = attacks;
        }
        table
    };

    /// Per side, per square: the squares on the same and adjacent files
    /// strictly ahead of the square in that side's forward direction.
    static ref PASSED_PAWN_MASKS: [[Bitboard; 64]; 2] = {
        let mut table = [[Bitboard::EMPTY; 64]; 2];
        for &side in &[Side::WHITE, Side::BLACK] {
            for square in 0..64u8 {
                let file = File(square % 8);
                let mut files = Bitboard::file_mask(file);
                files |= files.shift(Direction::E);
                files |= files.shift(Direction::W);

                let rank = square / 8;
                let ahead = if side.0 == Side::WHITE.0 {
                    // strictly smaller rank index = further from rank 1
                    (0..rank).fold(Bitboard::EMPTY, |acc, r| acc | Bitboard::rank_mask(Rank(r)))
                } else {
                    (rank + 1..8).fold(Bitboard::EMPTY, |acc, r| acc | Bitboard::rank_mask(Rank(r)))
                };

                table[side.to_index()][square as usize] = files & ahead;
            }
        }
        table
    };
}

const KNIGHT_STEPS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// The bitboard ray from `square` in `direction`, up to but excluding the
/// board edge.
#[must_use]
pub fn ray(square: Square, direction: Direction) -> Bitboard {
    let dir_index = DIRECTIONS.iter().position(|&d| d == direction).expect("valid direction");
    RAYS[square.0 as usize][dir_index]
}

/// The squares strictly between `from` and `to`, if they share a rank, file
/// or diagonal; empty otherwise.
#[must_use]
pub fn line_between(from: Square, to: Square) -> Bitboard {
    LINE_BETWEEN[from.0 as usize][to.0 as usize]
}

/// The pawn attack squares for a pawn of `side` on `square`.
#[must_use]
pub fn pawn_attacks(side: Side, square: Square) -> Bitboard {
    PAWN_ATTACKS[side.to_index()][square.0 as usize]
}

/// The knight attack squares from `square`.
#[must_use]
pub fn knight_attacks(square: Square) -> Bitboard {
    KNIGHT_ATTACKS[square.0 as usize]
}

/// The king attack squares from `square`.
#[must_use]
pub fn king_attacks(square: Square) -> Bitboard {
    KING_ATTACKS[square.0 as usize]
}

/// The passed-pawn mask for a pawn of `side` on `square`.
#[must_use]
pub fn passed_pawn_mask(side: Side, square: Square) -> Bitboard {
    PASSED_PAWN_MASKS[side.to_index()][square.0 as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_between_rook_move_is_empty_adjacent() {
        let a1 = Square(63 - 7);
        let b1 = Square(63 - 6);
        assert_eq!(line_between(a1, b1), Bitboard::EMPTY);
    }

    #[test]
    fn line_between_corner_diagonal() {
        let a8 = Square(0);
        let h1 = Square(63);
        let between = line_between(a8, h1);
        assert_eq!(between.popcount(), 6);
    }

    #[test]
    fn line_between_non_aligned_is_empty() {
        assert_eq!(line_between(Square(0), Square(1 + 8)), Bitboard::EMPTY);
    }

    #[test]
    fn knight_attacks_from_corner() {
        assert_eq!(knight_attacks(Square(0)).popcount(), 2);
    }

    #[test]
    fn king_attacks_from_corner() {
        assert_eq!(king_attacks(Square(0)).popcount(), 3);
    }

    #[test]
    fn pawn_attacks_white_vs_black_are_mirrored_directions() {
        let e4 = "e4".parse::<Square>().unwrap();
        assert_eq!(pawn_attacks(Side::WHITE, e4).popcount(), 2);
        assert_eq!(pawn_attacks(Side::BLACK, e4).popcount(), 2);
        assert_ne!(pawn_attacks(Side::WHITE, e4), pawn_attacks(Side::BLACK, e4));
    }

    #[test]
    fn passed_pawn_mask_excludes_behind_and_same_rank() {
        let e4 = "e4".parse::<Square>().unwrap();
        let mask = passed_pawn_mask(Side::WHITE, e4);
        assert!(!mask.contains(e4));
        let e5 = "e5".parse::<Square>().unwrap();
        assert!(mask.contains(e5));
        let e3 = "e3".parse::<Square>().unwrap();
        assert!(!mask.contains(e3));
    }
}
