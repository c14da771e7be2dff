//! Core scalar types: squares, sides, pieces and directions.
//!
//! Squares use little-endian rank-file mapping rotated so that a8 is square
//! 0 and h1 is square 63: `north` is therefore a *decrease* in square index.

use std::fmt::{self, Display, Formatter};

use crate::error::ParseError;

/// A square on the board, 0 (a8) to 63 (h1).
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Square(pub u8);

/// A file: a = 0 to h = 7.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct File(pub u8);

/// A rank: rank 8 = 0 to rank 1 = 7 (matching the square numbering).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Rank(pub u8);

/// A compass direction, expressed as a signed delta in square index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Direction(pub i8);

/// A side to move, or [`Side::NONE`] as an empty-square sentinel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Side(pub u8);

/// The type of a piece, or [`PieceType::NONE`] as an empty-square sentinel.
///
/// Ordering (pawn, knight, bishop, rook, queen, king) matters for MVV/LVA.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct PieceType(pub u8);

/// A piece: a [`PieceType`] tagged with a [`Side`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Piece(pub u8);

impl Square {
    pub const TOTAL: usize = 64;
    pub const NONE: Self = Self(64);

    #[inline]
    #[must_use]
    pub const fn rank(self) -> Rank {
        Rank(self.0 / 8)
    }

    #[inline]
    #[must_use]
    pub const fn file(self) -> File {
        File(self.0 % 8)
    }

    #[inline]
    #[must_use]
    pub const fn from_rank_file(rank: Rank, file: File) -> Self {
        Self(rank.0 * 8 + file.0)
    }

    /// Mirrors the square across the board's horizontal midline (flips
    /// rank, keeps file); used to reflect white piece-square tables for
    /// black.
    #[inline]
    #[must_use]
    pub const fn mirror(self) -> Self {
        Self::from_rank_file(Rank(7 - self.rank().0), self.file())
    }

    #[inline]
    #[must_use]
    pub const fn shift(self, direction: Direction) -> i16 {
        self.0 as i16 + direction.0 as i16
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            return write!(f, "-");
        }
        let file = (b'a' + self.file().0) as char;
        let rank = b'8' - self.rank().0;
        write!(f, "{file}{}", rank as char)
    }
}

impl std::str::FromStr for Square {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ParseError::InvalidSquare(s.to_owned()));
        }
        let file = bytes[0];
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(ParseError::InvalidSquare(s.to_owned()));
        }
        let file = file - b'a';
        let rank = b'8' - rank;
        Ok(Self::from_rank_file(Rank(rank), File(file)))
    }
}

#[allow(non_upper_case_globals)]
impl Direction {
    pub const N: Self = Self(-8);
    pub const S: Self = Self(8);
    pub const E: Self = Self(1);
    pub const W: Self = Self(-1);
    pub const NE: Self = Self(-7);
    pub const NW: Self = Self(-9);
    pub const SE: Self = Self(9);
    pub const SW: Self = Self(7);
}

impl Side {
    pub const WHITE: Self = Self(0);
    pub const BLACK: Self = Self(1);
    pub const NONE: Self = Self(2);
    pub const TOTAL: usize = 2;

    #[inline]
    #[must_use]
    pub const fn flip(self) -> Self {
        Self(self.0 ^ 1)
    }

    #[inline]
    #[must_use]
    pub const fn to_index(self) -> usize {
        self.0 as usize
    }

    /// The direction a pawn of this side moves to advance.
    #[inline]
    #[must_use]
    pub const fn forward(self) -> Direction {
        if self.0 == Self::WHITE.0 {
            Direction::N
        } else {
            Direction::S
        }
    }
}

#[allow(non_upper_case_globals)]
impl PieceType {
    pub const PAWN: Self = Self(0);
    pub const KNIGHT: Self = Self(1);
    pub const BISHOP: Self = Self(2);
    pub const ROOK: Self = Self(3);
    pub const QUEEN: Self = Self(4);
    pub const KING: Self = Self(5);
    pub const NONE: Self = Self(6);
    pub const TOTAL: usize = 6;

    #[inline]
    #[must_use]
    pub const fn to_index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        Some(match c.to_ascii_lowercase() {
            'p' => Self::PAWN,
            'n' => Self::KNIGHT,
            'b' => Self::BISHOP,
            'r' => Self::ROOK,
            'q' => Self::QUEEN,
            'k' => Self::KING,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Self::PAWN => 'p',
            Self::KNIGHT => 'n',
            Self::BISHOP => 'b',
            Self::ROOK => 'r',
            Self::QUEEN => 'q',
            Self::KING => 'k',
            _ => '?',
        }
    }
}

impl Piece {
    pub const NONE: Self = Self(PieceType::TOTAL as u8 * 2);
    pub const TOTAL: usize = PieceType::TOTAL * 2;

    #[inline]
    #[must_use]
    pub const fn new(piece_type: PieceType, side: Side) -> Self {
        Self(piece_type.0 * 2 + side.0)
    }

    #[inline]
    #[must_use]
    pub const fn piece_type(self) -> PieceType {
        PieceType(self.0 / 2)
    }

    #[inline]
    #[must_use]
    pub const fn side(self) -> Side {
        if self.0 == Self::NONE.0 {
            Side::NONE
        } else {
            Side(self.0 % 2)
        }
    }

    #[must_use]
    pub const fn to_char(self) -> char {
        if self.0 == Self::NONE.0 {
            return '.';
        }
        let c = self.piece_type().to_char();
        if self.side().0 == Side::WHITE.0 {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        let side = if c.is_ascii_uppercase() {
            Side::WHITE
        } else {
            Side::BLACK
        };
        match PieceType::from_char(c) {
            Some(piece_type) => Some(Self::new(piece_type, side)),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_numbering_matches_spec() {
        assert_eq!("a8".parse::<Square>().unwrap(), Square(0));
        assert_eq!("h1".parse::<Square>().unwrap(), Square(63));
        assert_eq!("e4".parse::<Square>().unwrap().to_string(), "e4");
    }

    #[test]
    fn north_decreases_index() {
        let e4 = "e4".parse::<Square>().unwrap();
        assert_eq!(e4.shift(Direction::N), e4.0 as i16 - 8);
    }

    #[test]
    fn piece_char_round_trip() {
        for c in ['P', 'n', 'B', 'r', 'Q', 'k'] {
            let piece = Piece::from_char(c).unwrap();
            assert_eq!(piece.to_char(), c);
        }
    }

    #[test]
    fn mirror_flips_rank_only() {
        let e2 = "e2".parse::<Square>().unwrap();
        assert_eq!(e2.mirror(), "e7".parse::<Square>().unwrap());
    }
}
