//! Move-generation correctness via perft against the canonical node counts.

use harrier::{perft::perft, position::Position};

fn perft_at(fen: &str, depth: u8) -> u64 {
    let position = Position::from_fen(fen).expect("canonical perft FEN is well-formed");
    perft(&position, depth)
}

#[test]
fn starting_position_depth_three() {
    assert_eq!(
        perft_at(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            3
        ),
        8_902
    );
}

#[test]
#[ignore = "several million nodes, run explicitly with --ignored"]
fn starting_position_depth_five() {
    assert_eq!(
        perft_at(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            5
        ),
        4_865_609
    );
}

#[test]
#[ignore = "several million nodes, run explicitly with --ignored"]
fn kiwipete_depth_four() {
    assert_eq!(
        perft_at(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            4
        ),
        4_085_603
    );
}

#[test]
#[ignore = "several million nodes, run explicitly with --ignored"]
fn endgame_depth_six() {
    assert_eq!(perft_at("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 6), 11_030_083);
}

#[test]
#[ignore = "several million nodes, run explicitly with --ignored"]
fn mirrored_edge_depth_five() {
    assert_eq!(
        perft_at(
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            5
        ),
        15_833_292
    );
}

#[test]
#[ignore = "several million nodes, run explicitly with --ignored"]
fn promotion_hell_depth_four() {
    assert_eq!(
        perft_at("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8", 4),
        2_103_487
    );
}

#[test]
#[ignore = "several million nodes, run explicitly with --ignored"]
fn endgame_two_depth_four() {
    assert_eq!(
        perft_at(
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
            4
        ),
        3_894_594
    );
}
