use std::time::{Duration, Instant};

use ahash::AHashSet;
use patience_common::game::Game;
use patience_common::moves::Move;
use smallvec::SmallVec;

use crate::cache::{DEFAULT_CACHE_SIZE, TranspositionCache};
use crate::enumerate::MoveEnumerator;

const DIAGNOSTIC_INTERVAL: u64 = 5000;

/// Solve a single game with the default cache size.
pub fn solve(game: Game, timeout: Duration) -> Solution {
    Solver::new(game).solve(timeout)
}

/// Outcome of one solve. `moves` is a replayable winning line from the
/// initial position, or `None` on loss or timeout.
#[derive(Debug, Clone)]
pub struct Solution {
    pub moves: Option<Vec<Move>>,
    pub timed_out: bool,
    /// Search nodes entered.
    pub calls: u64,
    pub elapsed: Duration,
}

/// Exhaustive depth-first backtracker.
///
/// Four things keep the tree tractable: the transposition cache over
/// canonical ids, the draw-cycle guard (no two deck flips without a waste
/// play between them), the stack-loop guard (a face-up stack pattern may
/// not reappear on the current path), and the move ordering of the
/// enumerator. The input game is never modified; the search works on
/// clones and unwinds its path-local state on every failure return.
#[derive(Debug)]
pub struct Solver {
    game: Game,
    cache: TranspositionCache,
    enumerator: MoveEnumerator,
    seen_card_stacks: AHashSet<String>,
    calls: u64,
    transposition_hits: u64,
    started: Instant,
    timeout: Duration,
    timed_out: bool,
}

impl Solver {
    pub fn new(game: Game) -> Self {
        Self::with_cache_size(game, DEFAULT_CACHE_SIZE)
    }

    pub fn with_cache_size(game: Game, max_cached_states: usize) -> Self {
        Solver {
            game,
            cache: TranspositionCache::new(max_cached_states),
            enumerator: MoveEnumerator::new(),
            seen_card_stacks: AHashSet::new(),
            calls: 0,
            transposition_hits: 0,
            started: Instant::now(),
            timeout: Duration::ZERO,
            timed_out: false,
        }
    }

    pub fn solve(&mut self, timeout: Duration) -> Solution {
        self.started = Instant::now();
        self.timeout = timeout;
        self.timed_out = false;
        self.calls = 0;
        self.seen_card_stacks.clear();

        let root = self.game.clone();
        let moves = self.search(&root, false, 0).map(|mut line| {
            line.reverse();
            line
        });

        Solution {
            moves,
            timed_out: self.timed_out,
            calls: self.calls,
            elapsed: self.started.elapsed(),
        }
    }

    /// One node expansion. Returns the winning line from `game` in reverse
    /// order (deepest move first), or `None`.
    fn search(&mut self, game: &Game, can_flip_deck: bool, depth: usize) -> Option<Vec<Move>> {
        self.calls += 1;
        if self.calls % DIAGNOSTIC_INTERVAL == 0 {
            self.report_progress(depth);
        }
        if self.started.elapsed() >= self.timeout {
            self.timed_out = true;
            return None;
        }
        if game.is_won() {
            return Some(Vec::new());
        }

        let key = game.canonical_id(can_flip_deck);
        if self.cache.has(&key) {
            self.transposition_hits += 1;
            return None;
        }
        self.cache.add(key);

        for mv in self.enumerator.enumerate(game) {
            if self.timed_out {
                return None;
            }

            let mut child_flip = can_flip_deck;
            match mv {
                Move::Draw if game.stock.is_empty() => {
                    if can_flip_deck {
                        // This draw spends the one permitted deck flip.
                        child_flip = false;
                    } else {
                        continue;
                    }
                }
                Move::WasteToFoundation | Move::WasteToTableau(_) => {
                    child_flip = true;
                }
                _ => {}
            }

            let mut next = game.clone();
            next.apply(mv);

            // A moved stack may not recreate a face-up pattern already on
            // this path; that would be the first step of an oscillation.
            let mut added: SmallVec<[String; 2]> = SmallVec::new();
            if let Move::TableauToTableau { src, dst, .. } = mv {
                let src_stack = next.tableaus[src as usize].face_up_code();
                let dst_stack = next.tableaus[dst as usize].face_up_code();
                if self.seen_card_stacks.contains(&src_stack)
                    && self.seen_card_stacks.contains(&dst_stack)
                {
                    continue;
                }
                if self.seen_card_stacks.insert(src_stack.clone()) {
                    added.push(src_stack);
                }
                if self.seen_card_stacks.insert(dst_stack.clone()) {
                    added.push(dst_stack);
                }
            }

            if let Some(mut line) = self.search(&next, child_flip, depth + 1) {
                line.push(mv);
                return Some(line);
            }

            for stack in added {
                self.seen_card_stacks.remove(&stack);
            }
        }

        None
    }

    fn report_progress(&self, depth: usize) {
        eprintln!(
            "searched {} positions, cached {}, depth {}, elapsed {:.2}s, transposition hits {}, move cache hit ratio {:.2}",
            self.calls,
            self.cache.len(),
            depth,
            self.started.elapsed().as_secs_f64(),
            self.transposition_hits,
            self.enumerator.hit_ratio(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: Duration = Duration::from_secs(30);

    #[test]
    fn test_stuck_face_up_position_loses() {
        // Hidden cards trapped under immovable king stacks: the only legal
        // moves shuttle a jack between queens, which the loop guards cut
        // off.
        let game = Game::parse(
            "Tableau0: 5H|KSQDJS
             Tableau1: 6H|KDQSJD
             Tableau2: 7H|KHQC
             DrawCount: 1",
        )
        .unwrap();
        let solution = solve(game, LONG);
        assert!(solution.moves.is_none());
        assert!(!solution.timed_out);
        assert!(solution.calls > 1);
    }

    #[test]
    fn test_draw_cycle_guard_blocks_initial_flip() {
        // Stock empty and nothing playable: the only candidate is a deck
        // flip, which the guard rejects without a prior waste play, so the
        // root is never expanded further.
        let game = Game::parse(
            "Waste: 8S
             Tableau0: 2H|KSQD
             DrawCount: 1",
        )
        .unwrap();
        let solution = solve(game, LONG);
        assert!(solution.moves.is_none());
        assert_eq!(solution.calls, 1);
    }

    #[test]
    fn test_waste_play_re_enables_single_flip() {
        // Playing the ace re-enables one deck flip; the flip recirculates
        // 9D but a second flip is banned, so the search still terminates as
        // a loss instead of cycling.
        let game = Game::parse(
            "Waste: AS9D
             Tableau0: 2H|KSQD
             DrawCount: 1",
        )
        .unwrap();
        let solution = solve(game, LONG);
        assert!(solution.moves.is_none());
        assert!(!solution.timed_out);
        assert!(solution.calls > 2);
    }

    #[test]
    fn test_zero_timeout_reports_timeout() {
        let game = Game::parse(
            "Stock: AS2S
             Tableau0: |KD
             DrawCount: 1",
        )
        .unwrap();
        let solution = solve(game, Duration::ZERO);
        assert!(solution.timed_out);
        assert!(solution.moves.is_none());
        assert_eq!(solution.calls, 1);
    }

    #[test]
    fn test_trivial_endgame_wins() {
        // One hidden card and one stock card left.
        let game = Game::parse(
            "Stock: 3S
             Foundations: 2S KH KD KC
             Tableau0: 4S|5H4C
             Tableau1: |6S
             DrawCount: 1",
        )
        .unwrap();
        let solution = solve(game.clone(), LONG);
        let moves = solution.moves.expect("endgame should be winnable");

        let mut replay = game;
        for &mv in &moves {
            assert!(replay.is_valid(mv));
            replay.apply(mv);
        }
        assert!(replay.is_won());
    }
}
