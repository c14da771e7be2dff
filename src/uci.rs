//! The UCI command surface: parses protocol lines into a plain command enum,
//! and an [`Engine`] that executes them against one [`Game`] and one
//! [`TranspositionTable`].

use std::io::BufRead;

use crate::{
    error::{IllegalMoveError, OptionError},
    evaluation,
    game::Game,
    movegen::{self, Move},
    position::Position,
    search::{self, SearchInfo},
    transposition_table::TranspositionTable,
};

const ID_NAME: &str = "Harrier";
const ID_AUTHOR: &str = "the harrier contributors";
const ID_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_HASH_MB: usize = 256;
const HASH_RANGE_MB: std::ops::RangeInclusive<usize> = 1..=65_536;

/// Depth used for `go` commands that name no explicit depth (`go infinite`,
/// `go wtime ... btime ...` with no `depth`); this engine does not manage
/// time, so it falls back to a fixed, reasonably deep search.
const DEFAULT_GO_DEPTH: u8 = 8;

/// Which starting position a `position` command names.
#[derive(Clone, Debug)]
enum PositionSpec {
    Startpos,
    Fen(String),
}

/// The parameters of a `go` command this engine actually consults; `wtime`/
/// `btime`/`winc`/`binc`/`movestogo`/`infinite` are accepted (so the
/// protocol handshake never errors on them) but otherwise ignored, per the
/// documented non-goal on time management.
#[derive(Clone, Copy, Debug, Default)]
struct GoOptions {
    depth: Option<u8>,
}

/// A parsed UCI protocol line.
#[derive(Clone, Debug)]
enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position { spec: PositionSpec, moves: Vec<String> },
    Go(GoOptions),
    SetOption { name: String, value: Option<String> },
    Display,
    Perft(u8),
    Quit,
    Unknown(String),
    Empty,
}

fn parse_command(line: &str) -> UciCommand {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("uci") => UciCommand::Uci,
        Some("isready") => UciCommand::IsReady,
        Some("ucinewgame") => UciCommand::UciNewGame,
        Some("position") => parse_position(tokens),
        Some("go") => UciCommand::Go(parse_go(tokens)),
        Some("setoption") => parse_setoption(tokens),
        Some("d") => UciCommand::Display,
        Some("perft") => match tokens.next().and_then(|depth| depth.parse().ok()) {
            Some(depth) => UciCommand::Perft(depth),
            None => UciCommand::Unknown(line.to_owned()),
        },
        Some("quit") => UciCommand::Quit,
        Some(other) => UciCommand::Unknown(other.to_owned()),
        None => UciCommand::Empty,
    }
}

fn parse_position<'a>(mut tokens: impl Iterator<Item = &'a str>) -> UciCommand {
    let spec = match tokens.next() {
        Some("startpos") => PositionSpec::Startpos,
        Some("fen") => {
            let fields: Vec<&str> = tokens.by_ref().take(6).collect();
            PositionSpec::Fen(fields.join(" "))
        }
        _ => return UciCommand::Unknown("position".to_owned()),
    };

    let mut moves = Vec::new();
    if tokens.next() == Some("moves") {
        moves.extend(tokens.map(str::to_owned));
    }

    UciCommand::Position { spec, moves }
}

fn parse_go<'a>(mut tokens: impl Iterator<Item = &'a str>) -> GoOptions {
    let mut options = GoOptions::default();
    while let Some(token) = tokens.next() {
        if token == "depth" {
            options.depth = tokens.next().and_then(|value| value.parse().ok());
        }
        // wtime/btime/winc/binc/movestogo/movetime/infinite/nodes: accepted,
        // not consulted.
    }
    options
}

fn parse_setoption<'a>(mut tokens: impl Iterator<Item = &'a str>) -> UciCommand {
    if tokens.next() != Some("name") {
        return UciCommand::Unknown("setoption".to_owned());
    }

    let mut name_parts = Vec::new();
    let mut value = None;
    for token in tokens {
        if token == "value" {
            value = Some(String::new());
            continue;
        }
        match &mut value {
            Some(v) => {
                if !v.is_empty() {
                    v.push(' ');
                }
                v.push_str(token);
            }
            None => name_parts.push(token),
        }
    }

    UciCommand::SetOption { name: name_parts.join(" "), value }
}

/// Owns the one [`Game`] and one [`TranspositionTable`] a UCI session
/// mutates, and executes parsed commands against them.
pub struct Engine {
    game: Game,
    tt: TranspositionTable,
    hash_mb: usize,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            game: Game::from_startpos(),
            tt: TranspositionTable::with_megabytes(DEFAULT_HASH_MB),
            hash_mb: DEFAULT_HASH_MB,
        }
    }

    /// Reads UCI commands from `input` until `quit` or end of input.
    pub fn run(&mut self, input: impl BufRead) {
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    log::error!("failed to read a line from stdin: {err}");
                    break;
                }
            };

            match parse_command(&line) {
                UciCommand::Quit => break,
                command => self.execute(command),
            }
        }
    }

    fn execute(&mut self, command: UciCommand) {
        match command {
            UciCommand::Uci => self.handle_uci(),
            UciCommand::IsReady => println!("readyok"),
            UciCommand::UciNewGame => {
                self.game = Game::from_startpos();
                self.tt.clear();
            }
            UciCommand::Position { spec, moves } => self.handle_position(&spec, &moves),
            UciCommand::Go(options) => self.handle_go(options),
            UciCommand::SetOption { name, value } => self.handle_setoption(&name, value.as_deref()),
            UciCommand::Display => {
                println!("{}", self.game.position());
                println!("Eval: {} cp", evaluation::evaluate(self.game.position()));
            }
            UciCommand::Perft(depth) => self.handle_perft(depth),
            UciCommand::Unknown(token) => log::warn!("unrecognized command '{token}'"),
            UciCommand::Quit | UciCommand::Empty => {}
        }
    }

    fn handle_uci(&self) {
        println!("id name {ID_NAME} {ID_VERSION}");
        println!("id author {ID_AUTHOR}");
        println!(
            "option name Hash type spin default {DEFAULT_HASH_MB} min {} max {}",
            HASH_RANGE_MB.start(),
            HASH_RANGE_MB.end()
        );
        println!("uciok");
    }

    /// Applies a `position` command. The whole move list is validated
    /// before any mutation, so a rejected move leaves the current game
    /// untouched.
    fn handle_position(&mut self, spec: &PositionSpec, moves: &[String]) {
        let starting_position = match spec {
            PositionSpec::Startpos => Position::startpos(),
            PositionSpec::Fen(fen) => match Position::from_fen(fen) {
                Ok(position) => position,
                Err(err) => {
                    log::warn!("invalid FEN in position command: {err}");
                    return;
                }
            },
        };

        let mut game = Game::new(starting_position);
        for mv in moves {
            match apply_uci_move(&mut game, mv) {
                Ok(()) => {}
                Err(err) => {
                    log::warn!("{err}");
                    return;
                }
            }
        }

        self.game = game;
    }

    fn handle_go(&mut self, options: GoOptions) {
        let max_depth = options.depth.unwrap_or(DEFAULT_GO_DEPTH);
        let best_move = search::search(
            &mut self.game,
            &mut self.tt,
            max_depth,
            Some(&mut |info: &SearchInfo| print_info(info)),
        );
        println!("bestmove {best_move}");
    }

    fn handle_setoption(&mut self, name: &str, value: Option<&str>) {
        match name {
            "Hash" => match value.and_then(|v| v.parse::<usize>().ok()) {
                Some(mb) if HASH_RANGE_MB.contains(&mb) => {
                    self.hash_mb = mb;
                    self.tt.resize(mb);
                }
                _ => log::warn!(
                    "{}",
                    OptionError::InvalidValue(value.unwrap_or_default().to_owned(), name.to_owned())
                ),
            },
            _ => log::warn!("{}", OptionError::UnrecognizedName(name.to_owned())),
        }
    }

    fn handle_perft(&self, depth: u8) {
        let (splits, total) = crate::perft::perft_split(self.game.position(), depth);
        for split in splits {
            println!("{}: {}", split.mv, split.nodes);
        }
        println!("Total: {total}");
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses and applies `mv` (in long algebraic notation) to `game`, rejecting
/// it if it is not among the current position's legal moves.
///
/// A bare UCI move string carries no capture/en-passant/castle flags, so it
/// is matched against the legal list by `from`/`to`/promotion rather than by
/// `Move` equality, and the fully-flagged legal move is the one applied.
fn apply_uci_move(game: &mut Game, mv: &str) -> Result<(), IllegalMoveError> {
    let parsed: Move = mv.parse().map_err(|_| IllegalMoveError(mv.to_owned()))?;
    let legal = movegen::generate_legal_moves(game.position());
    let matched = legal.into_iter().find(|&candidate| {
        candidate.from() == parsed.from()
            && candidate.to() == parsed.to()
            && candidate.is_promotion() == parsed.is_promotion()
            && (!parsed.is_promotion() || candidate.promoted_piece() == parsed.promoted_piece())
    });
    let Some(matched) = matched else {
        return Err(IllegalMoveError(mv.to_owned()));
    };
    game.do_move(matched);
    Ok(())
}

fn print_info(info: &SearchInfo) {
    let score = match search::mate_distance(info.score) {
        Some(moves) => format!("mate {moves}"),
        None => format!("cp {}", info.score),
    };
    let pv = info.pv.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
    println!(
        "info depth {} seldepth {} score {score} nodes {} nps {} tbhits 0 pv {pv}",
        info.depth,
        info.seldepth,
        info.nodes,
        info.nps(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_position_startpos_with_moves() {
        let command = parse_command("position startpos moves e2e4 e7e5");
        let UciCommand::Position { spec, moves } = command else { panic!("expected Position") };
        assert!(matches!(spec, PositionSpec::Startpos));
        assert_eq!(moves, vec!["e2e4", "e7e5"]);
    }

    #[test]
    fn parses_position_fen() {
        let command = parse_command(
            "position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 moves e2e4",
        );
        let UciCommand::Position { spec, moves } = command else { panic!("expected Position") };
        let PositionSpec::Fen(fen) = spec else { panic!("expected Fen") };
        assert_eq!(fen, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(moves, vec!["e2e4"]);
    }

    #[test]
    fn parses_go_depth() {
        let UciCommand::Go(options) = parse_command("go depth 6") else { panic!("expected Go") };
        assert_eq!(options.depth, Some(6));
    }

    #[test]
    fn go_without_depth_is_accepted() {
        let UciCommand::Go(options) = parse_command("go wtime 60000 btime 60000") else {
            panic!("expected Go")
        };
        assert_eq!(options.depth, None);
    }

    #[test]
    fn parses_setoption_hash() {
        let UciCommand::SetOption { name, value } = parse_command("setoption name Hash value 64") else {
            panic!("expected SetOption")
        };
        assert_eq!(name, "Hash");
        assert_eq!(value.as_deref(), Some("64"));
    }

    #[test]
    fn position_command_rejects_illegal_moves_without_mutating_game() {
        let mut engine = Engine::new();
        let fen_before = engine.game.position().to_fen();
        engine.handle_position(&PositionSpec::Startpos, &["e2e5".to_owned()]);
        assert_eq!(engine.game.position().to_fen(), fen_before);
    }

    #[test]
    fn position_command_applies_legal_moves() {
        let mut engine = Engine::new();
        engine.handle_position(&PositionSpec::Startpos, &["e2e4".to_owned(), "e7e5".to_owned()]);
        assert_ne!(engine.game.position().to_fen(), Position::startpos().to_fen());
    }

    #[test]
    fn setoption_hash_resizes_table() {
        let mut engine = Engine::new();
        engine.handle_setoption("Hash", Some("8"));
        assert_eq!(engine.hash_mb, 8);
    }

    #[test]
    fn display_reports_evaluation_consistent_position() {
        let engine = Engine::new();
        assert!(evaluation::evaluate(engine.game.position()).abs() < 1000);
    }
}
