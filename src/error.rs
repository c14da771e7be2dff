//! Typed error variants for every parse/validation boundary in the engine.

use thiserror::Error;

/// A low-level token-parsing failure, used inside [`FenError`] and
/// [`UciMoveError`].
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ParseError {
    /// A square string was not two characters in `a1`..`h8`.
    #[error("invalid square '{0}'")]
    InvalidSquare(String),
}

/// An error parsing a FEN string.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum FenError {
    /// The FEN did not have exactly six whitespace-separated fields.
    #[error("expected 6 fields in FEN, found {0}")]
    WrongFieldCount(usize),
    /// The placement field did not describe exactly 8 ranks of 8 files.
    #[error("invalid piece placement '{0}'")]
    InvalidPlacement(String),
    /// An unrecognized character appeared in the placement field.
    #[error("unrecognized character '{0}' in piece placement")]
    UnrecognizedPiece(char),
    /// The side-to-move field was not `w` or `b`.
    #[error("invalid side to move '{0}', expected 'w' or 'b'")]
    InvalidSideToMove(String),
    /// The castling-rights field contained a character outside `KQkq-`.
    #[error("invalid castling rights '{0}'")]
    InvalidCastlingRights(String),
    /// The en-passant field was not `-` or a valid square.
    #[error("invalid en passant target '{0}'")]
    InvalidEnPassantTarget(String),
    /// The half-move clock field was not a valid non-negative integer.
    #[error("invalid half-move clock '{0}'")]
    InvalidHalfmoveClock(String),
    /// The full-move number field was not a valid positive integer.
    #[error("invalid full-move number '{0}'")]
    InvalidFullmoveNumber(String),
}

/// An error parsing a UCI long-algebraic move string.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum UciMoveError {
    /// The string was not 4 or 5 characters (plus a recognized extended
    /// suffix).
    #[error("invalid move string length '{0}'")]
    InvalidLength(String),
    /// The origin or destination square could not be parsed.
    #[error("invalid square in move '{0}': {1}")]
    InvalidSquare(String, ParseError),
    /// The promotion letter was not one of `n`, `b`, `r`, `q`.
    #[error("unrecognized promotion piece '{0}'")]
    UnrecognizedPromotion(char),
    /// The `#`-prefixed extended-notation suffix was not recognized.
    #[error("unrecognized move suffix '{0}'")]
    UnrecognizedSuffix(String),
}

/// A move from a `position ... moves ...` command that is not legal in the
/// position it was applied to.
#[derive(Debug, Error, Eq, PartialEq)]
#[error("illegal move '{0}'")]
pub struct IllegalMoveError(pub String);

/// An error in a `setoption` command or other engine-option access.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum OptionError {
    /// The option name is not one this engine declares.
    #[error("unrecognized option '{0}'")]
    UnrecognizedName(String),
    /// The option's value could not be parsed as the type the option
    /// expects.
    #[error("invalid value '{0}' for option '{1}'")]
    InvalidValue(String, String),
}
