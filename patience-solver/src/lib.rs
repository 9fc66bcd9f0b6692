//! Exhaustive depth-first Klondike search with aggressive pruning:
//! canonical position ids deduplicated through a bounded LRU set, a
//! draw-cycle guard, per-path stack-reappearance detection and priority
//! move ordering.

mod cache;
mod enumerate;
mod solver;

pub use crate::cache::{DEFAULT_CACHE_SIZE, TranspositionCache};
pub use crate::enumerate::{MoveEnumerator, MoveList};
pub use crate::solver::{Solution, Solver, solve};
