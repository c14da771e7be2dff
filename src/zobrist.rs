//! Zobrist hash keys and the incremental key maintained per [`Position`](crate::position::Position).

use lazy_static::lazy_static;
use oorandom::Rand64;

use crate::defs::{Piece, Square};

/// Fixed seed so that hash keys (and therefore transposition-table
/// contents) are reproducible across runs.
const ZOBRIST_SEED: u128 = 0x5eed_babe_c0ffee;

pub struct ZobristKeys {
    pieces: [[u64; Square::TOTAL]; Piece::TOTAL],
    en_passant_file: [u64; 8],
    castling: [u64; 16],
    side_to_move: u64,
}

lazy_static! {
    static ref KEYS: ZobristKeys = ZobristKeys::new();
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = Rand64::new(ZOBRIST_SEED);

        let mut pieces = [[0u64; Square::TOTAL]; Piece::TOTAL];
        for piece_table in &mut pieces {
            for key in piece_table.iter_mut() {
                *key = rng.rand_u64();
            }
        }

        let mut en_passant_file = [0u64; 8];
        for key in &mut en_passant_file {
            *key = rng.rand_u64();
        }

        let mut castling = [0u64; 16];
        for key in &mut castling {
            *key = rng.rand_u64();
        }

        Self {
            pieces,
            en_passant_file,
            castling,
            side_to_move: rng.rand_u64(),
        }
    }
}

/// The key contribution of `piece` standing on `square`.
#[must_use]
pub fn piece_key(piece: Piece, square: Square) -> u64 {
    KEYS.pieces[piece.0 as usize][square.0 as usize]
}

/// The key contribution of an en-passant target on `file`.
#[must_use]
pub fn en_passant_key(file: u8) -> u64 {
    KEYS.en_passant_file[file as usize]
}

/// The key contribution of a 4-bit castling-rights mask.
#[must_use]
pub fn castling_key(rights: u8) -> u64 {
    KEYS.castling[rights as usize]
}

/// The key contribution toggled whenever the side to move changes.
#[must_use]
pub fn side_to_move_key() -> u64 {
    KEYS.side_to_move
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::{PieceType, Side};

    #[test]
    fn keys_are_deterministic_across_calls() {
        let a = piece_key(Piece::new(PieceType::PAWN, Side::WHITE), Square(10));
        let b = piece_key(Piece::new(PieceType::PAWN, Side::WHITE), Square(10));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_squares_give_distinct_keys() {
        let white_pawn = Piece::new(PieceType::PAWN, Side::WHITE);
        assert_ne!(piece_key(white_pawn, Square(10)), piece_key(white_pawn, Square(11)));
    }

    #[test]
    fn distinct_pieces_give_distinct_keys() {
        assert_ne!(
            piece_key(Piece::new(PieceType::PAWN, Side::WHITE), Square(10)),
            piece_key(Piece::new(PieceType::KNIGHT, Side::WHITE), Square(10))
        );
    }
}
