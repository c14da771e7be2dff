//! The fixed internal benchmark the `bench` CLI subcommand runs: a handful
//! of positions searched to a fixed depth, reporting total nodes and nps.

use std::time::Instant;

use crate::{game::Game, position::Position, search, transposition_table::TranspositionTable};

const BENCH_DEPTH: u8 = 6;
const BENCH_HASH_MB: usize = 16;

const BENCH_POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
];

/// Runs the fixed benchmark suite and prints total nodes and nps, the way
/// `<binary> bench` is expected to on every invocation.
pub fn run() {
    let start = Instant::now();
    let mut total_nodes = 0u64;

    for fen in BENCH_POSITIONS {
        let position = Position::from_fen(fen).expect("bench positions are well-formed FEN");
        let mut game = Game::new(position);
        let mut tt = TranspositionTable::with_megabytes(BENCH_HASH_MB);
        let mut nodes_this_position = 0u64;
        search::search(
            &mut game,
            &mut tt,
            BENCH_DEPTH,
            Some(&mut |info: &search::SearchInfo| nodes_this_position = info.nodes),
        );
        total_nodes += nodes_this_position;
    }

    let elapsed = start.elapsed();
    let nps = if elapsed.as_micros() == 0 {
        0
    } else {
        (u128::from(total_nodes) * 1_000_000 / elapsed.as_micros()) as u64
    };

    println!("{total_nodes} nodes {nps} nps");
}
