use anyhow::{Result, bail};
use patience_common::card::Deck;
use patience_common::game::{Game, Rules};
use patience_common::moves::{Move, describe_move, format_moves};
use serde::Serialize;

use std::time::Duration;

const VERSION: &str = concat!("patience ", env!("CARGO_PKG_VERSION"));

/// The per-deck result envelope, one JSON object per line of stdout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub deck: Vec<String>,
    pub status: Status,
    pub winning_moves: Option<Vec<MoveRecord>>,
    pub moves_considered: u64,
    pub elapsed_seconds: f64,
    pub timeout_seconds: f64,
    pub version: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Win,
    Lose,
    Timeout,
}

#[derive(Debug, Serialize)]
pub struct MoveRecord {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub extras: Vec<u8>,
}

pub fn run_deck(deck: &Deck, rules: Rules, timeout: Duration, snapshots: bool) -> Envelope {
    let game = Game::new(rules, deck);
    let solution = patience_solver::solve(game, timeout);

    let mut status = if solution.timed_out {
        Status::Timeout
    } else if solution.moves.is_some() {
        Status::Win
    } else {
        Status::Lose
    };

    let winning_moves = match &solution.moves {
        Some(moves) => match verify_line(deck, rules, moves, snapshots) {
            Ok(()) => {
                if snapshots {
                    println!("{}", format_moves(moves));
                }
                Some(moves.iter().map(record_move).collect())
            }
            Err(err) => {
                // A produced line that does not replay is a solver bug, not
                // a result.
                eprintln!("discarding unsound winning line: {err:#}");
                status = Status::Lose;
                None
            }
        },
        None => None,
    };

    Envelope {
        deck: deck.cards().iter().map(|c| c.code()).collect(),
        status,
        winning_moves,
        moves_considered: solution.calls,
        elapsed_seconds: solution.elapsed.as_secs_f64(),
        timeout_seconds: timeout.as_secs_f64(),
        version: VERSION,
    }
}

fn record_move(mv: &Move) -> MoveRecord {
    MoveRecord {
        kind: mv.kind_tag(),
        extras: mv.extras(),
    }
}

/// Replay a winning line on a fresh deal, checking every move and the final
/// position. Optionally prints the per-move snapshots to stdout.
fn verify_line(deck: &Deck, rules: Rules, moves: &[Move], snapshots: bool) -> Result<()> {
    let mut game = Game::new(rules, deck);
    for (index, &mv) in moves.iter().enumerate() {
        if !game.is_valid(mv) {
            bail!(
                "move {} ({:?}) is not legal in\n{}",
                index + 1,
                mv,
                game.pretty_print()
            );
        }
        if snapshots {
            println!("{:3}: {}", index + 1, describe_move(&game, &mv));
        }
        game.apply(mv);
        if snapshots {
            println!("{}", game.pretty_print());
        }
    }
    if !game.is_won() {
        bail!("line replays legally but does not win:\n{}", game.pretty_print());
    }
    Ok(())
}
