use std::time::Duration;

use patience_common::card::Deck;
use patience_common::game::{Game, Rules};
use patience_solver::{Solver, solve};

/// A nine-column deal arranged so that every reveal is the next foundation
/// card: the tableau cascades out completely, then the seven stock cards
/// finish the game. Winnable in 50 moves.
const CASCADE_DECK: &str = "KSKHKDAC2C3C4CKC3H3S2D2H2SADAHASQC5D5H5S4D4H4S3DJC7D7H7S6D6H6STC9H9S8D8H8S9CTDTHTS9D8CJDJHJS7CQHQS6CQD5C";

#[test]
fn test_cascade_deck_wins_quickly() {
    let deck = Deck::parse(CASCADE_DECK).unwrap();
    let rules = Rules {
        draw_count: 1,
        tableau_size: 9,
    };
    let game = Game::new(rules, &deck);

    let solution = solve(game.clone(), Duration::from_secs(30));
    assert!(!solution.timed_out);
    let moves = solution.moves.expect("cascade deck should be winnable");
    assert!(moves.len() <= 52, "expected a short win, got {}", moves.len());

    // Soundness: the line replays legally on a fresh game and wins it.
    let mut replay = Game::new(rules, &deck);
    for (index, &mv) in moves.iter().enumerate() {
        assert!(replay.is_valid(mv), "move {index} ({mv:?}) is not legal");
        replay.apply(mv);
    }
    assert!(replay.is_won());
}

#[test]
fn test_tiny_cache_still_solves() {
    // A one-entry transposition cache loses almost all pruning power but
    // must not affect correctness.
    let deck = Deck::parse(CASCADE_DECK).unwrap();
    let rules = Rules {
        draw_count: 1,
        tableau_size: 9,
    };
    let game = Game::new(rules, &deck);

    let mut solver = Solver::with_cache_size(game.clone(), 1);
    let solution = solver.solve(Duration::from_secs(30));
    assert!(solution.moves.is_some());
    // The caller's game is untouched; the solver searched clones.
    assert_eq!(game, Game::new(rules, &deck));
}

#[test]
fn test_standard_deal_times_out_gracefully() {
    let deck = Deck::standard();
    let game = Game::new(Rules::default(), &deck);
    let solution = solve(game, Duration::from_millis(50));
    // Whatever the outcome, the counters are coherent.
    assert!(solution.calls >= 1);
    if solution.moves.is_none() {
        assert!(solution.timed_out || solution.calls > 1);
    }
}
