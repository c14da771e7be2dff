//! Static position evaluation: a pure, allocation-free function of a
//! [`Position`], tapered between middlegame and endgame piece-square tables
//! by a material-derived phase.
//!
//! Unlike an incremental accumulator threaded through `do_move`/`undo_move`,
//! every term here is recomputed from scratch on each call; quiescence
//! search calls this at every leaf, so it must stay cheap and must never
//! allocate.

use std::ops::{Add, Neg};

use crate::{
    bitboard::Bitboard,
    defs::{PieceType, Side, Square},
    lookups, magic,
    position::Position,
};

/// 0 at the start of the game, 256 once only kings remain.
pub const START_PHASE: i32 = 0;
pub const END_PHASE: i32 = 256;

const KNIGHT_PHASE_WEIGHT: i32 = 1;
const BISHOP_PHASE_WEIGHT: i32 = 1;
const ROOK_PHASE_WEIGHT: i32 = 2;
const QUEEN_PHASE_WEIGHT: i32 = 4;
const START_MATERIAL_SCORE: i32 =
    4 * KNIGHT_PHASE_WEIGHT + 4 * BISHOP_PHASE_WEIGHT + 4 * ROOK_PHASE_WEIGHT + 2 * QUEEN_PHASE_WEIGHT;

/// A middlegame/endgame score pair, summed independently and interpolated
/// only once by [`interpolate`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct Score {
    middle: i32,
    end: i32,
}

impl Score {
    const ZERO: Self = Self { middle: 0, end: 0 };

    const fn flat(value: i32) -> Self {
        Self { middle: value, end: value }
    }
}

impl Add for Score {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            middle: self.middle + rhs.middle,
            end: self.end + rhs.end,
        }
    }
}

impl Neg for Score {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self { middle: -self.middle, end: -self.end }
    }
}

/// Material value in centipawns, used both as the scalar material term and
/// (via smaller weights) for [`phase`].
const fn material_value(piece_type: PieceType) -> i32 {
    match piece_type.0 {
        0 => 100,    // pawn
        1 => 300,    // knight
        2 => 300,    // bishop
        3 => 500,    // rook
        4 => 900,    // queen
        5 => 20_000, // king
        _ => 0,
    }
}

/// Piece-square tables, white's perspective, indexed by [`Square`] (a8=0,
/// h1=63 as throughout this crate). Source:
/// <https://www.chessprogramming.org/Simplified_Evaluation_Function>.
#[rustfmt::skip]
const PAWN_TABLE: [i32; 64] = [
     0,  0,  0,   0,   0,   0,   0,  0,
    50, 50, 50,  50,  50,  50,  50, 50,
    10, 10, 20,  30,  30,  20,  10, 10,
     5,  5, 10,  25,  25,  10,   5,  5,
     0,  0,  0,  20,  20,   0,   0,  0,
     5, -5,-10,   0,   0, -10,  -5,  5,
     5, 10, 10, -20, -20,  10,  10,  5,
     0,  0,  0,   0,   0,   0,   0,  0,
];

#[rustfmt::skip]
const KNIGHT_TABLE: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_TABLE: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_TABLE: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_TABLE: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_TABLE_MIDDLE: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_TABLE_END: [i32; 64] = [
    -50,-40,-30,-20,-20,-30,-40,-50,
    -30,-20,-10,  0,  0,-10,-20,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-30,  0,  0,  0,  0,-30,-30,
    -50,-30,-30,-30,-30,-30,-30,-50,
];

const MIDDLE_GAME_PASSED_PAWN_BONUS: [i32; 8] = [0, 0, 10, 30, 50, 75, 100, 150];
const END_GAME_PASSED_PAWN_BONUS: [i32; 8] = [0, 0, 20, 40, 80, 120, 160, 250];

/// Mirrors `square` for black if `side` is black, otherwise leaves it
/// unchanged, so every piece-square table can be written white-relative.
fn relative_square(side: Side, square: Square) -> Square {
    if side.0 == Side::WHITE.0 {
        square
    } else {
        square.mirror()
    }
}

fn placement_score(position: &Position, side: Side) -> Score {
    let mut score = Score::ZERO;
    for (piece_type, table) in [
        (PieceType::PAWN, &PAWN_TABLE),
        (PieceType::KNIGHT, &KNIGHT_TABLE),
        (PieceType::BISHOP, &BISHOP_TABLE),
        (PieceType::ROOK, &ROOK_TABLE),
        (PieceType::QUEEN, &QUEEN_TABLE),
    ] {
        let mut pieces = position.pieces_of(side, piece_type);
        while !pieces.is_empty() {
            let square = relative_square(side, pieces.pop_lsb());
            score = score + Score::flat(table[square.0 as usize]);
        }
    }

    let mut kings = position.pieces_of(side, PieceType::KING);
    while !kings.is_empty() {
        let square = relative_square(side, kings.pop_lsb());
        score = score
            + Score {
                middle: KING_TABLE_MIDDLE[square.0 as usize],
                end: KING_TABLE_END[square.0 as usize],
            };
    }

    score
}

fn material_score(position: &Position, side: Side) -> i32 {
    [
        PieceType::PAWN,
        PieceType::KNIGHT,
        PieceType::BISHOP,
        PieceType::ROOK,
        PieceType::QUEEN,
        PieceType::KING,
    ]
    .into_iter()
    .map(|piece_type| position.pieces_of(side, piece_type).popcount() as i32 * material_value(piece_type))
    .sum()
}

fn doubled_pawns(position: &Position, side: Side) -> i32 {
    let pawns = position.pieces_of(side, PieceType::PAWN);
    (0..8)
        .map(|file| {
            let on_file = (pawns & Bitboard::file_mask(crate::defs::File(file))).popcount() as i32;
            (on_file - 1).max(0)
        })
        .sum()
}

fn blocked_pawns(position: &Position, side: Side) -> i32 {
    let pawns = position.pieces_of(side, PieceType::PAWN);
    (pawns.shift(side.forward()) & position.pieces()).popcount() as i32
}

fn passed_pawn_score(position: &Position, side: Side) -> Score {
    let mut score = Score::ZERO;
    let mut pawns = position.pieces_of(side, PieceType::PAWN);
    let enemy_pawns = position.pieces_of(side.flip(), PieceType::PAWN);

    while !pawns.is_empty() {
        let square = pawns.pop_lsb();
        if !(lookups::passed_pawn_mask(side, square) & enemy_pawns).is_empty() {
            continue;
        }
        let rank = square.rank().0;
        let rank_from_own_side = if side.0 == Side::WHITE.0 { 7 - rank } else { rank };
        score = score
            + Score {
                middle: MIDDLE_GAME_PASSED_PAWN_BONUS[rank_from_own_side as usize],
                end: END_GAME_PASSED_PAWN_BONUS[rank_from_own_side as usize],
            };
    }

    score
}

fn count_moves(position: &Position, side: Side, piece_type: PieceType) -> i32 {
    let occupied = position.pieces();
    let own = position.pieces_for_side(side);
    let mut pieces = position.pieces_of(side, piece_type);
    let mut mobility = 0;
    while !pieces.is_empty() {
        let square = pieces.pop_lsb();
        let attacks = match piece_type.0 {
            2 => magic::bishop_attacks(square, occupied),
            4 => magic::queen_attacks(square, occupied),
            _ => unreachable!("count_moves is only called for bishops and queens"),
        };
        mobility += (attacks & !own).popcount() as i32;
    }
    mobility
}

fn bishop_mobility_score(position: &Position, side: Side) -> Score {
    let mobility = count_moves(position, side, PieceType::BISHOP) * 5;
    Score::flat(mobility)
}

fn queen_mobility_score(position: &Position, side: Side) -> Score {
    let mobility = count_moves(position, side, PieceType::QUEEN);
    Score { middle: mobility, end: mobility * 2 }
}

fn open_file_rooks(position: &Position, side: Side, blockers: Bitboard) -> i32 {
    let mut rooks = position.pieces_of(side, PieceType::ROOK);
    let mut count = 0;
    while !rooks.is_empty() {
        let square = rooks.pop_lsb();
        if (Bitboard::file_mask(square.file()) & blockers).is_empty() {
            count += 1;
        }
    }
    count
}

fn semi_open_file_rooks_count(position: &Position, side: Side) -> i32 {
    open_file_rooks(position, side, position.pieces_of(side, PieceType::PAWN))
}

fn open_file_rooks_count(position: &Position, side: Side) -> i32 {
    open_file_rooks(
        position,
        side,
        position.pieces_of(Side::WHITE, PieceType::PAWN) | position.pieces_of(Side::BLACK, PieceType::PAWN),
    )
}

/// The e1/d1 (or e8/d8) squares a king sits on before castling.
fn center_zone(side: Side) -> Bitboard {
    if side.0 == Side::WHITE.0 {
        Bitboard::from_square(Square(60)) | Bitboard::from_square(Square(59))
    } else {
        Bitboard::from_square(Square(4)) | Bitboard::from_square(Square(3))
    }
}

fn king_side_zone(side: Side) -> Bitboard {
    if side.0 == Side::WHITE.0 {
        Bitboard::from_square(Square(62)) | Bitboard::from_square(Square(63))
    } else {
        Bitboard::from_square(Square(6)) | Bitboard::from_square(Square(7))
    }
}

fn queen_side_zone(side: Side) -> Bitboard {
    if side.0 == Side::WHITE.0 {
        Bitboard::from_square(Square(57)) | Bitboard::from_square(Square(58))
    } else {
        Bitboard::from_square(Square(1)) | Bitboard::from_square(Square(2))
    }
}

fn king_safety_score(position: &Position, side: Side) -> Score {
    let king = position.pieces_of(side, PieceType::KING);
    let pawns = position.pieces_of(side, PieceType::PAWN);
    let rights = position.castling_rights();
    let can_castle = rights.has_king_side(side) || rights.has_queen_side(side);

    if !(king & center_zone(side)).is_empty() {
        let value = if can_castle { -25 } else { -60 };
        return Score { middle: value, end: 0 };
    }

    if !(king & king_side_zone(side)).is_empty() {
        let (g_pawn, h_pawn) = if side.0 == Side::WHITE.0 {
            (Square(54), Square(55))
        } else {
            (Square(14), Square(15))
        };
        let value = if pawns.contains(g_pawn) && pawns.contains(h_pawn) {
            40
        } else if pawns.contains(g_pawn) {
            20
        } else {
            -20
        };
        return Score { middle: value, end: 0 };
    }

    if !(king & queen_side_zone(side)).is_empty() {
        let (b_pawn, c_pawn) = if side.0 == Side::WHITE.0 {
            (Square(49), Square(50))
        } else {
            (Square(9), Square(10))
        };
        let value = if pawns.contains(b_pawn) && pawns.contains(c_pawn) {
            40
        } else if pawns.contains(c_pawn) {
            20
        } else {
            -20
        };
        return Score { middle: value, end: 0 };
    }

    debug_assert!(!can_castle, "a king away from every castling zone has lost both rights");
    Score { middle: -60, end: 0 }
}

/// The game phase: 0 at the start of the game, 256 with only kings left.
#[must_use]
pub fn phase(position: &Position) -> i32 {
    let mut score = START_MATERIAL_SCORE;
    score -= position.pieces_of_type(PieceType::KNIGHT).popcount() as i32 * KNIGHT_PHASE_WEIGHT;
    score -= position.pieces_of_type(PieceType::BISHOP).popcount() as i32 * BISHOP_PHASE_WEIGHT;
    score -= position.pieces_of_type(PieceType::ROOK).popcount() as i32 * ROOK_PHASE_WEIGHT;
    score -= position.pieces_of_type(PieceType::QUEEN).popcount() as i32 * QUEEN_PHASE_WEIGHT;

    (score * END_PHASE + START_MATERIAL_SCORE / 2) / START_MATERIAL_SCORE
}

fn interpolate(score: Score, phase: i32) -> i32 {
    (score.middle * (END_PHASE - phase) + score.end * phase) / END_PHASE
}

fn evaluate_for_side(position: &Position, phase: i32, side: Side) -> i32 {
    let tapered = placement_score(position, side)
        + king_safety_score(position, side)
        + passed_pawn_score(position, side)
        + bishop_mobility_score(position, side)
        + queen_mobility_score(position, side);

    interpolate(tapered, phase) + material_score(position, side) - 50 * doubled_pawns(position, side)
        - 50 * blocked_pawns(position, side)
        + 10 * semi_open_file_rooks_count(position, side)
        + 15 * open_file_rooks_count(position, side)
}

/// The static evaluation of `position` from the side-to-move's perspective:
/// positive means the side to move stands better.
#[must_use]
pub fn evaluate(position: &Position) -> i32 {
    let phase = phase(position);
    let white = evaluate_for_side(position, phase, Side::WHITE);
    let black = evaluate_for_side(position, phase, Side::BLACK);
    let white_relative = white - black;
    if position.side_to_move().0 == Side::WHITE.0 {
        white_relative
    } else {
        -white_relative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_phase_is_zero() {
        assert_eq!(phase(&Position::startpos()), 0);
    }

    #[test]
    fn kings_only_phase_is_max() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(phase(&position), END_PHASE);
    }

    #[test]
    fn startpos_is_symmetric() {
        assert_eq!(evaluate(&Position::startpos()), 0);
    }

    #[test]
    fn extra_queen_is_a_large_advantage() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        assert!(evaluate(&position) > 800);
    }

    #[test]
    fn evaluation_flips_sign_for_black_to_move() {
        let white_to_move = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        let black_to_move = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();
        assert_eq!(evaluate(&white_to_move), -evaluate(&black_to_move));
    }

    #[test]
    fn doubled_pawns_are_penalized() {
        let clean = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let doubled = Position::from_fen("4k3/8/8/4P3/8/8/4P3/4K3 w - - 0 1").unwrap();
        // Doubled has one more pawn in absolute material, so compare the
        // per-pawn contribution rather than the raw totals.
        assert!(evaluate(&doubled) - 100 < evaluate(&clean) + 100);
    }

    #[test]
    fn evaluate_never_reaches_mate_threshold() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        assert!(evaluate(&position).unsigned_abs() < 80_000);
    }
}
