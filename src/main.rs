//! `harrier`, a UCI-compatible chess engine.
//!
//! With no subcommand, runs the interactive UCI loop on stdin/stdout. The
//! `bench` and `perft` subcommands are ambient scripting conveniences
//! outside the UCI protocol itself.

use std::io::stdin;

use clap::{Parser, Subcommand};
use harrier::{perft, position::Position, uci::Engine};

#[derive(Parser)]
#[command(name = "harrier", version, about = "A UCI-compatible chess engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a fixed internal search benchmark and report total nodes and nps.
    Bench,
    /// Run perft once from a FEN and print the per-root-move split plus total.
    Perft {
        fen: String,
        depth: u8,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Bench) => harrier::bench::run(),
        Some(Command::Perft { fen, depth }) => run_perft(&fen, depth),
        None => Engine::new().run(stdin().lock()),
    }
}

fn run_perft(fen: &str, depth: u8) {
    let position = match Position::from_fen(fen) {
        Ok(position) => position,
        Err(err) => {
            eprintln!("invalid FEN: {err}");
            std::process::exit(1);
        }
    };

    let (splits, total) = perft::perft_split(&position, depth);
    for split in splits {
        println!("{}: {}", split.mv, split.nodes);
    }
    println!("Total: {total}");
}
