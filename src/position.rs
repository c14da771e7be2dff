//! The board: piece placement, castling/en-passant/move-clock state, and
//! the `Do`/`Undo` mutation pair used by search and move generation.

use std::fmt::{self, Display, Formatter};

use crate::{
    bitboard::Bitboard,
    defs::{PieceType, Side, Square},
    error::FenError,
    lookups, magic,
    movegen::Move,
    zobrist,
};

/// The starting position's FEN, also used by [`Position::startpos`].
pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The four castling rights, packed one bit each.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CastlingRights(pub u8);

impl CastlingRights {
    pub const WHITE_KING: u8 = 0b0001;
    pub const WHITE_QUEEN: u8 = 0b0010;
    pub const BLACK_KING: u8 = 0b0100;
    pub const BLACK_QUEEN: u8 = 0b1000;
    pub const ALL: u8 = 0b1111;
    pub const NONE: Self = Self(0);

    #[must_use]
    pub const fn has_king_side(self, side: Side) -> bool {
        let flag = if side.0 == Side::WHITE.0 { Self::WHITE_KING } else { Self::BLACK_KING };
        self.0 & flag != 0
    }

    #[must_use]
    pub const fn has_queen_side(self, side: Side) -> bool {
        let flag = if side.0 == Side::WHITE.0 { Self::WHITE_QUEEN } else { Self::BLACK_QUEEN };
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    /// Clears any right that moving to or from `square` revokes (a king or
    /// rook leaving its home square), leaving other rights untouched.
    pub fn invalidate_on_move(&mut self, square: Square) {
        let mask = match square.0 {
            56 => !Self::WHITE_QUEEN,
            60 => !(Self::WHITE_KING | Self::WHITE_QUEEN),
            63 => !Self::WHITE_KING,
            0 => !Self::BLACK_QUEEN,
            4 => !(Self::BLACK_KING | Self::BLACK_QUEEN),
            7 => !Self::BLACK_KING,
            _ => Self::ALL,
        };
        self.0 &= mask;
    }
}

impl Display for CastlingRights {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }
        if self.0 & Self::WHITE_KING != 0 {
            write!(f, "K")?;
        }
        if self.0 & Self::WHITE_QUEEN != 0 {
            write!(f, "Q")?;
        }
        if self.0 & Self::BLACK_KING != 0 {
            write!(f, "k")?;
        }
        if self.0 & Self::BLACK_QUEEN != 0 {
            write!(f, "q")?;
        }
        Ok(())
    }
}

/// Enough state to exactly reverse a [`Position::do_move`] call.
#[derive(Clone, Copy, Debug)]
pub struct UndoInfo {
    pub en_passant_target: Option<Square>,
    pub captured_piece: PieceType,
    pub halfmove_clock: u8,
    pub castling_rights: CastlingRights,
}

/// Enough state to exactly reverse a [`Position::do_null_move`] call.
#[derive(Clone, Copy, Debug)]
pub struct NullMoveUndo {
    en_passant_target: Option<Square>,
}

#[derive(Clone, Debug)]
pub struct Position {
    pieces: [Bitboard; PieceType::TOTAL],
    sides: [Bitboard; Side::TOTAL],
    side_to_move: Side,
    castling_rights: CastlingRights,
    en_passant_target: Option<Square>,
    halfmove_clock: u8,
    fullmove_number: u32,
    zobrist_key: u64,
}

impl Position {
    #[must_use]
    pub fn startpos() -> Self {
        Self::from_fen(STARTPOS_FEN).expect("startpos FEN is well-formed")
    }

    #[must_use]
    pub fn piece_at(&self, square: Square) -> PieceType {
        for piece_type in [
            PieceType::PAWN,
            PieceType::KNIGHT,
            PieceType::BISHOP,
            PieceType::ROOK,
            PieceType::QUEEN,
            PieceType::KING,
        ] {
            if self.pieces[piece_type.to_index()].contains(square) {
                return piece_type;
            }
        }
        PieceType::NONE
    }

    #[must_use]
    pub fn side_at(&self, square: Square) -> Side {
        if self.sides[Side::WHITE.to_index()].contains(square) {
            Side::WHITE
        } else if self.sides[Side::BLACK.to_index()].contains(square) {
            Side::BLACK
        } else {
            Side::NONE
        }
    }

    #[must_use]
    pub fn pieces(&self) -> Bitboard {
        self.sides[Side::WHITE.to_index()] | self.sides[Side::BLACK.to_index()]
    }

    #[must_use]
    pub fn pieces_for_side(&self, side: Side) -> Bitboard {
        self.sides[side.to_index()]
    }

    #[must_use]
    pub fn pieces_of_type(&self, piece_type: PieceType) -> Bitboard {
        self.pieces[piece_type.to_index()]
    }

    #[must_use]
    pub fn pieces_of(&self, side: Side, piece_type: PieceType) -> Bitboard {
        self.sides[side.to_index()] & self.pieces[piece_type.to_index()]
    }

    #[must_use]
    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    #[must_use]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[must_use]
    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    #[must_use]
    pub fn halfmove_clock(&self) -> u8 {
        self.halfmove_clock
    }

    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[must_use]
    pub fn key(&self) -> u64 {
        self.zobrist_key
    }

    #[must_use]
    pub fn king_square(&self, side: Side) -> Square {
        self.pieces_of(side, PieceType::KING).lsb()
    }

    /// The pieces of `by_side` that attack `to`.
    #[must_use]
    pub fn attackers(&self, to: Square, by_side: Side) -> Bitboard {
        let occupied = self.pieces();
        let victim_side = by_side.flip();
        let mut attackers = lookups::pawn_attacks(victim_side, to) & self.pieces_of(by_side, PieceType::PAWN);
        attackers |= lookups::knight_attacks(to) & self.pieces_of(by_side, PieceType::KNIGHT);
        attackers |= lookups::king_attacks(to) & self.pieces_of(by_side, PieceType::KING);
        attackers |= magic::rook_attacks(to, occupied)
            & (self.pieces_of(by_side, PieceType::ROOK) | self.pieces_of(by_side, PieceType::QUEEN));
        attackers |= magic::bishop_attacks(to, occupied)
            & (self.pieces_of(by_side, PieceType::BISHOP) | self.pieces_of(by_side, PieceType::QUEEN));
        attackers
    }

    /// The pieces attacking `side`'s king.
    #[must_use]
    pub fn checkers(&self, side: Side) -> Bitboard {
        self.attackers(self.king_square(side), side.flip())
    }

    #[must_use]
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::WrongFieldCount(fields.len()));
        }
        Self::from_fen_fields(&fields)
    }

    fn from_fen_fields(fields: &[&str]) -> Result<Self, FenError> {
        let [placement, side_to_move, castling, en_passant, halfmoves, fullmoves] = fields else {
            unreachable!("caller checks fields.len() == 6");
        };

        let mut pieces = [Bitboard::EMPTY; PieceType::TOTAL];
        let mut sides = [Bitboard::EMPTY; Side::TOTAL];
        let mut square_index: u16 = 0;
        for c in placement.chars() {
            if square_index > 63 && c != '/' {
                return Err(FenError::InvalidPlacement((*placement).to_owned()));
            }
            if c == '/' {
                continue;
            }
            if let Some(empty) = c.to_digit(10) {
                square_index += empty as u16;
                continue;
            }
            if square_index > 63 {
                return Err(FenError::InvalidPlacement((*placement).to_owned()));
            }
            let square = Square(square_index as u8);
            let side = if c.is_ascii_uppercase() { Side::WHITE } else { Side::BLACK };
            let piece_type = PieceType::from_char(c).ok_or(FenError::UnrecognizedPiece(c))?;
            sides[side.to_index()] |= Bitboard::from_square(square);
            pieces[piece_type.to_index()] |= Bitboard::from_square(square);
            square_index += 1;
        }
        if square_index != 64 {
            return Err(FenError::InvalidPlacement((*placement).to_owned()));
        }

        let side_to_move = match *side_to_move {
            "w" => Side::WHITE,
            "b" => Side::BLACK,
            other => return Err(FenError::InvalidSideToMove(other.to_owned())),
        };

        let mut castling_rights = CastlingRights::NONE;
        if *castling != "-" {
            if castling.chars().any(|c| !"KQkq".contains(c)) {
                return Err(FenError::InvalidCastlingRights((*castling).to_owned()));
            }
            if castling.contains('K') {
                castling_rights.set(CastlingRights::WHITE_KING);
            }
            if castling.contains('Q') {
                castling_rights.set(CastlingRights::WHITE_QUEEN);
            }
            if castling.contains('k') {
                castling_rights.set(CastlingRights::BLACK_KING);
            }
            if castling.contains('q') {
                castling_rights.set(CastlingRights::BLACK_QUEEN);
            }
        }

        let en_passant_target = if *en_passant == "-" {
            None
        } else {
            Some(
                en_passant
                    .parse::<Square>()
                    .map_err(|_| FenError::InvalidEnPassantTarget((*en_passant).to_owned()))?,
            )
        };

        let halfmove_clock: u8 = halfmoves
            .parse()
            .map_err(|_| FenError::InvalidHalfmoveClock((*halfmoves).to_owned()))?;
        let fullmove_number: u32 = fullmoves
            .parse()
            .map_err(|_| FenError::InvalidFullmoveNumber((*fullmoves).to_owned()))?;

        let mut position = Self {
            pieces,
            sides,
            side_to_move,
            castling_rights,
            en_passant_target,
            halfmove_clock,
            fullmove_number,
            zobrist_key: 0,
        };
        position.zobrist_key = position.compute_key();
        Ok(position)
    }

    fn compute_key(&self) -> u64 {
        let mut key = 0u64;
        for square_index in 0..64u8 {
            let square = Square(square_index);
            let piece_type = self.piece_at(square);
            if piece_type == PieceType::NONE {
                continue;
            }
            let side = self.side_at(square);
            key ^= zobrist::piece_key(crate::defs::Piece::new(piece_type, side), square);
        }
        if self.side_to_move.0 == Side::BLACK.0 {
            key ^= zobrist::side_to_move_key();
        }
        if let Some(ep) = self.en_passant_target {
            key ^= zobrist::en_passant_key(ep.file().0);
        }
        key ^= zobrist::castling_key(self.castling_rights.0);
        key
    }

    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank in 0..8u8 {
            let mut empty_run = 0;
            for file in 0..8u8 {
                let square = Square(rank * 8 + file);
                let piece_type = self.piece_at(square);
                if piece_type == PieceType::NONE {
                    empty_run += 1;
                    continue;
                }
                if empty_run > 0 {
                    placement.push_str(&empty_run.to_string());
                    empty_run = 0;
                }
                let side = self.side_at(square);
                placement.push(crate::defs::Piece::new(piece_type, side).to_char());
            }
            if empty_run > 0 {
                placement.push_str(&empty_run.to_string());
            }
            if rank != 7 {
                placement.push('/');
            }
        }

        let side = if self.side_to_move.0 == Side::WHITE.0 { "w" } else { "b" };
        let ep = self.en_passant_target.map_or_else(|| "-".to_owned(), |sq| sq.to_string());

        format!(
            "{placement} {side} {} {ep} {} {}",
            self.castling_rights, self.halfmove_clock, self.fullmove_number
        )
    }

    fn toggle_en_passant(&mut self, ep: Option<Square>) {
        if let Some(square) = ep {
            self.zobrist_key ^= zobrist::en_passant_key(square.file().0);
        }
    }

    /// Applies `mv`, updating every piece of state including the
    /// incremental Zobrist key, and returns enough information to reverse
    /// it via [`Self::undo_move`].
    pub fn do_move(&mut self, mv: Move) -> UndoInfo {
        let victim = self.piece_at(mv.to());
        let undo = UndoInfo {
            en_passant_target: self.en_passant_target,
            captured_piece: victim,
            halfmove_clock: self.halfmove_clock,
            castling_rights: self.castling_rights,
        };

        let mover = self.side_to_move;
        let enemy = mover.flip();

        if victim == PieceType::NONE {
            self.halfmove_clock += 1;
        } else {
            let clear = !Bitboard::from_square(mv.to());
            self.pieces[victim.to_index()] &= clear;
            self.sides[enemy.to_index()] &= clear;
            self.halfmove_clock = 0;
            self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(victim, enemy), mv.to());
        }

        let piece = self.piece_at(mv.from());
        if piece == PieceType::PAWN {
            self.halfmove_clock = 0;
        }

        self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(piece, mover), mv.from());
        self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(piece, mover), mv.to());

        if mv.is_en_passant_capture() {
            let victim_square = mv.en_passant_victim();
            let clear = !Bitboard::from_square(victim_square);
            self.pieces[PieceType::PAWN.to_index()] &= clear;
            self.sides[enemy.to_index()] &= clear;
            self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(PieceType::PAWN, enemy), victim_square);
            self.halfmove_clock = 0;
        }

        let from_to = Bitboard::from_square(mv.from()) | Bitboard::from_square(mv.to());
        self.pieces[piece.to_index()] ^= from_to;
        self.sides[mover.to_index()] ^= from_to;

        if mv.is_promotion() {
            let promoted = mv.promoted_piece();
            self.pieces[PieceType::PAWN.to_index()] &= !Bitboard::from_square(mv.to());
            self.pieces[promoted.to_index()] |= Bitboard::from_square(mv.to());
            self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(PieceType::PAWN, mover), mv.to());
            self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(promoted, mover), mv.to());
        }

        let rook_mask = castling_rook_mask(mv, mover);
        if !rook_mask.is_empty() {
            self.pieces[PieceType::ROOK.to_index()] ^= rook_mask;
            self.sides[mover.to_index()] ^= rook_mask;
            let mut squares = rook_mask;
            while !squares.is_empty() {
                let square = squares.pop_lsb();
                self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(PieceType::ROOK, mover), square);
            }
        }

        self.zobrist_key ^= zobrist::castling_key(self.castling_rights.0);
        self.castling_rights.invalidate_on_move(mv.from());
        self.castling_rights.invalidate_on_move(mv.to());
        self.zobrist_key ^= zobrist::castling_key(self.castling_rights.0);

        if mover.0 == Side::BLACK.0 {
            self.fullmove_number += 1;
        }
        self.side_to_move = enemy;

        self.toggle_en_passant(self.en_passant_target);
        if mv.is_double_pawn_push() {
            self.en_passant_target = Some(mv.en_passant_target());
        } else {
            self.en_passant_target = None;
        }
        self.toggle_en_passant(self.en_passant_target);

        self.zobrist_key ^= zobrist::side_to_move_key();
        undo
    }

    /// Reverses a previously applied [`Self::do_move`] call; `mv` and
    /// `undo` must be exactly the arguments and return value of that call.
    pub fn undo_move(&mut self, mv: Move, undo: &UndoInfo) {
        self.toggle_en_passant(self.en_passant_target);
        self.en_passant_target = undo.en_passant_target;
        self.toggle_en_passant(self.en_passant_target);

        self.zobrist_key ^= zobrist::castling_key(self.castling_rights.0);
        self.castling_rights = undo.castling_rights;
        self.zobrist_key ^= zobrist::castling_key(self.castling_rights.0);

        self.side_to_move = self.side_to_move.flip();
        let mover = self.side_to_move;

        if mv.is_promotion() {
            let promoted = mv.promoted_piece();
            self.pieces[promoted.to_index()] &= !Bitboard::from_square(mv.to());
            self.pieces[PieceType::PAWN.to_index()] |= Bitboard::from_square(mv.to());
            self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(PieceType::PAWN, mover), mv.to());
            self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(promoted, mover), mv.to());
        }

        let from_to = Bitboard::from_square(mv.from()) | Bitboard::from_square(mv.to());
        let piece = self.piece_at(mv.to());
        self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(piece, mover), mv.from());
        self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(piece, mover), mv.to());
        self.pieces[piece.to_index()] ^= from_to;
        self.sides[mover.to_index()] ^= from_to;

        if mv.is_en_passant_capture() {
            let victim_square = mv.en_passant_victim();
            let enemy = mover.flip();
            self.pieces[PieceType::PAWN.to_index()] |= Bitboard::from_square(victim_square);
            self.sides[enemy.to_index()] |= Bitboard::from_square(victim_square);
            self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(PieceType::PAWN, enemy), victim_square);
        }

        if undo.captured_piece != PieceType::NONE {
            let enemy = mover.flip();
            self.pieces[undo.captured_piece.to_index()] |= Bitboard::from_square(mv.to());
            self.sides[enemy.to_index()] |= Bitboard::from_square(mv.to());
            self.zobrist_key ^=
                zobrist::piece_key(crate::defs::Piece::new(undo.captured_piece, enemy), mv.to());
        }

        let rook_mask = castling_rook_mask(mv, mover);
        if !rook_mask.is_empty() {
            self.pieces[PieceType::ROOK.to_index()] ^= rook_mask;
            self.sides[mover.to_index()] ^= rook_mask;
            let mut squares = rook_mask;
            while !squares.is_empty() {
                let square = squares.pop_lsb();
                self.zobrist_key ^= zobrist::piece_key(crate::defs::Piece::new(PieceType::ROOK, mover), square);
            }
        }

        if mover.0 == Side::BLACK.0 {
            self.fullmove_number -= 1;
        }
        self.halfmove_clock = undo.halfmove_clock;
        self.zobrist_key ^= zobrist::side_to_move_key();
    }

    /// Passes the move to the opponent without moving a piece: flips the
    /// side to move and clears any en-passant target. Used only by null-move
    /// pruning in search, never a legal move in its own right.
    pub fn do_null_move(&mut self) -> NullMoveUndo {
        let undo = NullMoveUndo { en_passant_target: self.en_passant_target };
        self.toggle_en_passant(self.en_passant_target);
        self.en_passant_target = None;
        self.side_to_move = self.side_to_move.flip();
        self.zobrist_key ^= zobrist::side_to_move_key();
        undo
    }

    /// Reverses a previously applied [`Self::do_null_move`] call.
    pub fn undo_null_move(&mut self, undo: &NullMoveUndo) {
        self.side_to_move = self.side_to_move.flip();
        self.zobrist_key ^= zobrist::side_to_move_key();
        self.en_passant_target = undo.en_passant_target;
        self.toggle_en_passant(self.en_passant_target);
    }
}

/// Non-empty if and only if `mv` is a castling move: the rook's `from` and
/// `to` squares for `side`.
fn castling_rook_mask(mv: Move, side: Side) -> Bitboard {
    if mv.is_king_side_castle() {
        if side.0 == Side::WHITE.0 {
            Bitboard::from_square(Square(63)) | Bitboard::from_square(Square(61))
        } else {
            Bitboard::from_square(Square(7)) | Bitboard::from_square(Square(5))
        }
    } else if mv.is_queen_side_castle() {
        if side.0 == Side::WHITE.0 {
            Bitboard::from_square(Square(56)) | Bitboard::from_square(Square(59))
        } else {
            Bitboard::from_square(Square(0)) | Bitboard::from_square(Square(3))
        }
    } else {
        Bitboard::EMPTY
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for rank in 0..8u8 {
            write!(f, "{}:", 8 - rank)?;
            for file in 0..8u8 {
                let square = Square(rank * 8 + file);
                let piece_type = self.piece_at(square);
                let c = if piece_type == PieceType::NONE {
                    '.'
                } else {
                    crate::defs::Piece::new(piece_type, self.side_at(square)).to_char()
                };
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for file in 0..8u8 {
            write!(f, " {}", (b'a' + file) as char)?;
        }
        writeln!(f)?;
        write!(f, "   {}", self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::Flag;

    #[test]
    fn startpos_fen_round_trips() {
        let position = Position::startpos();
        assert_eq!(position.to_fen(), STARTPOS_FEN);
    }

    #[test]
    fn do_undo_restores_key_and_fen() {
        let mut position = Position::startpos();
        let key_before = position.key();
        let fen_before = position.to_fen();

        let mv = Move::new("e2".parse().unwrap(), "e4".parse().unwrap(), Flag::DOUBLE_PAWN_PUSH);
        let undo = position.do_move(mv);
        assert_ne!(position.key(), key_before);
        position.undo_move(mv, &undo);

        assert_eq!(position.key(), key_before);
        assert_eq!(position.to_fen(), fen_before);
    }

    #[test]
    fn capture_updates_halfmove_clock_and_key() {
        let mut position =
            Position::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2").unwrap();
        let mv = Move::new("e4".parse().unwrap(), "d5".parse().unwrap(), Flag::CAPTURE);
        let key_before = position.key();
        let undo = position.do_move(mv);
        assert_eq!(position.halfmove_clock(), 0);
        position.undo_move(mv, &undo);
        assert_eq!(position.key(), key_before);
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").unwrap_err();
        assert_eq!(err, FenError::WrongFieldCount(4));
    }

    #[test]
    fn castling_invalidates_on_rook_and_king_move() {
        let mut position = Position::startpos();
        let mv = Move::new("h1".parse().unwrap(), "g1".parse().unwrap(), Flag::NONE);
        position.do_move(mv);
        assert!(!position.castling_rights().has_king_side(Side::WHITE));
        assert!(position.castling_rights().has_queen_side(Side::WHITE));
    }
}
