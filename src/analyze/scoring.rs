//! Ranking score for correlated candidates.
//!
//! Two policies:
//! - `Views`    : score = media view count.
//! - `Adjusted` : score = (views / (age_secs / 2)) / followers.
//!
//! Scores only order candidates within one run. Under `Adjusted`, a candidate whose
//! author has no profile gets no score and ranks after every scored candidate.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::correlate::Candidate;
use crate::ingest::types::AccountProfile;

/// Smallest age (seconds) used as a divisor.
pub const MIN_AGE_SECS: f64 = 1.0;
/// Smallest follower count used as a divisor.
pub const MIN_FOLLOWERS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorePolicy {
    /// Raw popularity.
    #[default]
    #[serde(alias = "raw")]
    Views,
    /// Popularity per half-age, per follower.
    Adjusted,
}

impl ScorePolicy {
    pub fn needs_profiles(self) -> bool {
        matches!(self, Self::Adjusted)
    }
}

impl std::str::FromStr for ScorePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "views" | "raw" => Ok(Self::Views),
            "adjusted" => Ok(Self::Adjusted),
            other => anyhow::bail!("unknown score policy: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub candidate: Candidate<'a>,
    /// `None` when the score could not be computed (missing author profile).
    pub score: Option<f64>,
}

/// Adjusted score with both divisors clamped away from zero.
pub fn adjusted_score(views: u64, age_secs: f64, followers: u64) -> f64 {
    let half_age = age_secs.max(MIN_AGE_SECS) / 2.0;
    let followers = (followers as f64).max(MIN_FOLLOWERS);
    (views as f64 / half_age) / followers
}

fn score_one(
    c: &Candidate<'_>,
    policy: ScorePolicy,
    profiles: &[AccountProfile],
    now: DateTime<Utc>,
) -> Option<f64> {
    match policy {
        ScorePolicy::Views => Some(c.media.view_count as f64),
        ScorePolicy::Adjusted => {
            let profile = profiles.iter().find(|p| p.id == c.post.author_id)?;
            // Posts stamped in the future count as age 0 (then clamped).
            let age_secs = (now - c.post.created_at).num_seconds().max(0) as f64;
            Some(adjusted_score(c.media.view_count, age_secs, profile.followers))
        }
    }
}

/// Attach a score to every candidate, preserving input order.
pub fn score_all<'a>(
    candidates: &[Candidate<'a>],
    policy: ScorePolicy,
    profiles: &[AccountProfile],
    now: DateTime<Utc>,
) -> Vec<ScoredCandidate<'a>> {
    candidates
        .iter()
        .map(|c| {
            let score = score_one(c, policy, profiles, now);
            if score.is_none() {
                tracing::debug!(post_id = %c.post.id, author_id = %c.post.author_id, "no profile; ranked last");
            }
            ScoredCandidate {
                candidate: *c,
                score,
            }
        })
        .collect()
}

/// Descending by score; unscored last.
fn by_score_desc(a: &ScoredCandidate<'_>, b: &ScoredCandidate<'_>) -> Ordering {
    match (a.score, b.score) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort: ties keep their input order.
pub fn rank(scored: &mut [ScoredCandidate<'_>]) {
    scored.sort_by(by_score_desc);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{Media, MediaKind, Post};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap()
    }

    fn post(id: &str, author: &str, age_secs: i64) -> Post {
        Post {
            id: id.into(),
            author_id: author.into(),
            text: "t".into(),
            created_at: now() - Duration::seconds(age_secs),
            media_keys: vec![format!("m{id}")],
        }
    }

    fn video(key: &str, views: u64) -> Media {
        Media {
            media_key: key.into(),
            kind: MediaKind::Video,
            preview_image_url: None,
            view_count: views,
            duration_ms: None,
        }
    }

    fn profile(id: &str, followers: u64) -> AccountProfile {
        AccountProfile {
            id: id.into(),
            handle: id.into(),
            name: None,
            followers,
        }
    }

    #[test]
    fn adjusted_formula_matches_definition() {
        // 1000 views, 200s old, 10 followers => (1000 / 100) / 10 = 1.0
        assert!((adjusted_score(1000, 200.0, 10) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_age_and_zero_followers_stay_finite() {
        let s = adjusted_score(500, 0.0, 0);
        assert!(s.is_finite());
        assert_eq!(s, 1000.0);
    }

    #[test]
    fn future_post_is_clamped_not_negative() {
        let p = post("1", "a", -3600);
        let m = video("m1", 10);
        let c = [Candidate { post: &p, media: &m }];
        let s = score_all(&c, ScorePolicy::Adjusted, &[profile("a", 5)], now());
        assert!(s[0].score.unwrap() > 0.0);
    }

    #[test]
    fn views_policy_ignores_profiles() {
        let p = post("1", "nobody", 60);
        let m = video("m1", 42);
        let c = [Candidate { post: &p, media: &m }];
        let s = score_all(&c, ScorePolicy::Views, &[], now());
        assert_eq!(s[0].score, Some(42.0));
    }

    #[test]
    fn missing_profile_ranks_last() {
        let p1 = post("1", "known", 3600);
        let p2 = post("2", "ghost", 3600);
        let m1 = video("m1", 1);
        let m2 = video("m2", 1_000_000);
        let c = [
            Candidate { post: &p2, media: &m2 },
            Candidate { post: &p1, media: &m1 },
        ];
        let mut s = score_all(&c, ScorePolicy::Adjusted, &[profile("known", 1_000)], now());
        rank(&mut s);
        assert_eq!(s[0].candidate.post.id, "1");
        assert_eq!(s[1].score, None);
    }

    #[test]
    fn ties_keep_input_order() {
        let p1 = post("1", "a", 10);
        let p2 = post("2", "a", 10);
        let m1 = video("m1", 7);
        let m2 = video("m2", 7);
        let c = [
            Candidate { post: &p1, media: &m1 },
            Candidate { post: &p2, media: &m2 },
        ];
        let mut s = score_all(&c, ScorePolicy::Views, &[], now());
        rank(&mut s);
        assert_eq!(s[0].candidate.post.id, "1");
        assert_eq!(s[1].candidate.post.id, "2");
    }

    #[test]
    fn policy_parses_from_str_and_serde() {
        assert_eq!("Adjusted".parse::<ScorePolicy>().unwrap(), ScorePolicy::Adjusted);
        assert_eq!("raw".parse::<ScorePolicy>().unwrap(), ScorePolicy::Views);
        assert!("likes".parse::<ScorePolicy>().is_err());
        let p: ScorePolicy = serde_json::from_str("\"views\"").unwrap();
        assert_eq!(p, ScorePolicy::Views);
    }
}
