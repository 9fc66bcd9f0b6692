mod report;

use crate::report::run_deck;

use anyhow::{Context, Result, bail};
use clap::Parser;
use patience_common::card::Deck;
use patience_common::game::Rules;

use std::{
    io::{BufRead, stdin},
    time::Duration,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Per-deck time budget in seconds
    #[arg(default_value_t = 30.0, value_name = "SECONDS")]
    timeout_seconds: f64,
    /// Cards moved to the waste per draw
    #[arg(long, default_value_t = 3, value_name = "NUM")]
    draw: usize,
    /// Number of tableau columns
    #[arg(long, default_value_t = 7, value_name = "NUM")]
    tableau: usize,
    /// Print a board snapshot for every move of a winning line
    #[arg(long)]
    snapshots: bool,
}

fn main() -> Result<()> {
    let Cli {
        timeout_seconds,
        draw,
        tableau,
        snapshots,
    } = Cli::parse();

    let rules = Rules {
        draw_count: draw,
        tableau_size: tableau,
    };
    rules.validate()?;
    if !(timeout_seconds > 0.0) {
        bail!("Timeout must be positive.");
    }
    let timeout = Duration::from_secs_f64(timeout_seconds);

    let mut rejected = 0usize;
    for (number, line) in stdin().lock().lines().enumerate() {
        let line = line.context("Failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let deck = match Deck::parse(&line) {
            Ok(deck) => deck,
            Err(err) => {
                eprintln!("deck {}: rejected: {err:#}", number + 1);
                rejected += 1;
                continue;
            }
        };
        let envelope = run_deck(&deck, rules, timeout, snapshots);
        println!("{}", serde_json::to_string(&envelope)?);
    }

    if rejected > 0 {
        bail!("{rejected} deck line(s) could not be parsed.");
    }
    Ok(())
}
