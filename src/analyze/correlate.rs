// src/analyze/correlate.rs
//! Correlator: join each video media object to the post that references it.
//!
//! - Only `video` media are considered; other kinds (and media without a type) never match.
//! - A post links through its **first** referenced media key only.
//! - When several posts carry the same first key, the first in fetch order wins.
//! - Media with no matching post are dropped silently.
//! - Reposts (text starting with `RT`) are excluded after the join.
//!
//! Inputs are small (a few hundred posts per run), so the join is a plain nested scan.

use std::collections::HashSet;

use crate::ingest::types::{Media, Post};

/// A correlated (post, video) pair. Borrowed from the run's batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    pub post: &'a Post,
    pub media: &'a Media,
}

fn linked_post<'a>(posts: &'a [Post], media_key: &str) -> Option<&'a Post> {
    posts
        .iter()
        .find(|p| p.first_media_key() == Some(media_key))
}

/// Produce the candidate set. Output order follows media order but callers must not rely on it.
pub fn correlate<'a>(posts: &'a [Post], media: &'a [Media]) -> Vec<Candidate<'a>> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut out = Vec::new();

    for m in media.iter().filter(|m| m.is_video()) {
        let Some(post) = linked_post(posts, &m.media_key) else {
            tracing::trace!(media_key = %m.media_key, "orphan video media dropped");
            continue;
        };
        if post.is_repost() {
            tracing::debug!(post_id = %post.id, "repost excluded");
            continue;
        }
        if !seen.insert((post.id.as_str(), m.media_key.as_str())) {
            continue;
        }
        out.push(Candidate { post, media: m });
    }

    out
}
