// src/analyze/mod.rs
//! Ranking pipeline core: correlate posts with their video, score, select the top N.

pub mod correlate;
pub mod scoring;
pub mod select;

pub use crate::analyze::correlate::{correlate, Candidate};
pub use crate::analyze::scoring::{adjusted_score, rank, score_all, ScorePolicy, ScoredCandidate};
pub use crate::analyze::select::{select_top, DEFAULT_TOP_N};

use chrono::{DateTime, Utc};
use metrics::counter;

use crate::ingest::Batch;

/// Correlate, score and select over everything accumulated for the run.
pub fn top_candidates(
    batch: &Batch,
    policy: ScorePolicy,
    top_n: usize,
    now: DateTime<Utc>,
) -> Vec<ScoredCandidate<'_>> {
    let candidates = correlate(&batch.posts, &batch.media);
    counter!("digest_candidates_total").increment(candidates.len() as u64);

    let scored = score_all(&candidates, policy, &batch.profiles, now);
    let top = select_top(scored, top_n);
    tracing::info!(
        candidates = candidates.len(),
        selected = top.len(),
        policy = ?policy,
        "ranked video posts"
    );
    top
}
