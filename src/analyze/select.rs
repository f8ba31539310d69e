// src/analyze/select.rs
use super::scoring::{rank, ScoredCandidate};

/// Digest size used when nothing else is configured.
pub const DEFAULT_TOP_N: usize = 5;

/// Global top-`n` across every account's candidates, best first.
/// Fewer than `n` candidates are returned as-is (no padding); none is a valid outcome.
pub fn select_top(mut scored: Vec<ScoredCandidate<'_>>, n: usize) -> Vec<ScoredCandidate<'_>> {
    rank(&mut scored);
    scored.truncate(n);
    scored
}
