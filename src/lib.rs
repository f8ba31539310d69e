// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod config;
pub mod digest;
pub mod ingest;
pub mod notify;
pub mod pipeline;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{ScorePolicy, ScoredCandidate};
pub use crate::config::DigestConfig;
pub use crate::digest::{Digest, DigestTemplate, LinkPolicy};
pub use crate::ingest::types::{AccountProfile, FetchError, Media, MediaKind, Post, PostBatch};
pub use crate::notify::{deliver, DeliveryReport, DigestSender};
pub use crate::pipeline::{run_digest, RunContext, RunOutcome};
