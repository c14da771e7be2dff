//! Search behavior scenarios against known positions.

use harrier::{
    game::Game,
    movegen::{self, Move},
    position::Position,
    search,
    transposition_table::{TranspositionTable, MATE_THRESHOLD},
};

fn apply_move(game: &mut Game, uci: &str) {
    let parsed: Move = uci.parse().expect("well-formed UCI move string");
    let legal = movegen::generate_legal_moves(game.position());
    let matched = legal
        .into_iter()
        .find(|candidate| {
            candidate.from() == parsed.from()
                && candidate.to() == parsed.to()
                && candidate.is_promotion() == parsed.is_promotion()
        })
        .unwrap_or_else(|| panic!("{uci} is not legal in this position"));
    game.do_move(matched);
}

fn search_best_move(game: &mut Game, depth: u8) -> (Move, i32) {
    let mut tt = TranspositionTable::with_megabytes(4);
    let mut score = 0;
    let best = search::search(
        game,
        &mut tt,
        depth,
        Some(&mut |info| score = info.score),
    );
    (best, score)
}

#[test]
fn startpos_depth_five_plays_a_central_pawn_push() {
    let mut game = Game::from_startpos();
    let (mv, score) = search_best_move(&mut game, 5);
    assert!(["e2e4", "d2d4"].contains(&mv.to_string().as_str()));
    assert!(score.abs() < MATE_THRESHOLD);
}

#[test]
fn finds_queen_mate_after_weakening_moves() {
    let mut game = Game::from_startpos();
    apply_move(&mut game, "f2f3");
    apply_move(&mut game, "e7e5");
    apply_move(&mut game, "g2g4");

    let (mv, score) = search_best_move(&mut game, 1);
    assert_eq!(mv.to_string(), "d8h4");
    assert_eq!(search::mate_distance(score), Some(1));
}

#[test]
fn finds_capturing_mate() {
    let position =
        Position::from_fen("r1bqk1nr/pppp1ppp/2n5/2b1p3/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 4 4")
            .unwrap();
    let mut game = Game::new(position);

    let (mv, score) = search_best_move(&mut game, 1);
    assert_eq!(mv.from().to_string(), "f3");
    assert_eq!(mv.to().to_string(), "f7");
    assert!(mv.is_capture());
    assert_eq!(search::mate_distance(score), Some(1));
}

#[test]
fn fourfold_repetition_builds_up_through_the_original_engines_move_sequence() {
    let mut game = Game::from_startpos();
    for mv in [
        "g1f3", "e7e6", "e2e4", "b8c6", "b1c3", "d7d6", "a2a3", "g8e7", "b2b4", "c8d7", "c1b2",
        "h8g8", "g2g3", "a8c8", "f1g2", "e6e5", "d2d4", "e5d4", "c3d5", "d7g4", "e1g1", "c6e5",
        "f1e1", "d8d7", "a3a4", "c7c5", "b4c5", "g4f3", "g2f3", "d6c5", "f3g2", "c8c6", "c2c3",
        "d4c3", "b2a3", "e8d8", "g2h3", "d7h3", "d5c3", "d8c7", "a3b2", "e5g4", "d1g4", "h3g4",
        "c3b5", "c7b8", "a1d1", "g4f3", "b2e5", "b8a8", "h2h4", "c6c8", "d1d7", "e7g6", "b5c7",
        "a8b8", "e1b1", "g6e5",
    ] {
        apply_move(&mut game, mv);
    }
    assert_eq!(game.repetition_count(), 1);

    for _ in 0..2 {
        apply_move(&mut game, "c7a6");
        apply_move(&mut game, "b8a8");
        apply_move(&mut game, "a6c7");
        apply_move(&mut game, "a8b8");
    }
    assert_eq!(game.repetition_count(), 3);

    apply_move(&mut game, "c7a6");
    apply_move(&mut game, "b8a8");
    apply_move(&mut game, "a6c7");
    apply_move(&mut game, "a8b8");
    assert_eq!(game.repetition_count(), 4);
}

#[test]
fn null_move_pruning_is_disabled_without_non_pawn_material() {
    // A king-and-pawns ending: side to move has no knight/bishop/rook/queen,
    // so the zugzwang guard must keep null-move pruning off entirely here.
    let position = Position::from_fen("8/8/8/3k4/8/3K4/3P4/8 w - - 0 1").unwrap();
    let mut game = Game::new(position);
    let (mv, _) = search_best_move(&mut game, 6);
    assert!(!mv.is_null());
}
