// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{AccountProfile, Media, Post, PostSource, ProfileSource};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on any installed recorder).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "digest_posts_fetched_total",
            "Posts returned by the fetch adapter."
        );
        describe_counter!(
            "digest_media_fetched_total",
            "Media objects returned by the fetch adapter."
        );
        describe_counter!(
            "digest_fetch_errors_total",
            "Per-account fetch failures (posts or profile)."
        );
        describe_counter!(
            "digest_candidates_total",
            "Correlated (post, video) pairs before selection."
        );
        describe_counter!(
            "digest_render_skipped_total",
            "Candidates dropped at render time (no trailing short link)."
        );
        describe_counter!(
            "digest_delivery_failures_total",
            "Recipients the digest could not be delivered to."
        );
        describe_counter!(
            "digest_http_errors_total",
            "Non-success or failed HTTP calls to the posts API, by endpoint."
        );
        describe_histogram!("digest_decode_ms", "Payload decode time in milliseconds.");
        describe_gauge!("digest_last_run_ts", "Unix ts when the digest pipeline last ran.");
    });
}

/// Everything gathered for one run, across all accounts, in fetch order.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub posts: Vec<Post>,
    pub media: Vec<Media>,
    pub profiles: Vec<AccountProfile>,
    /// Handles whose posts could not be fetched this run.
    pub failed_accounts: Vec<String>,
}

/// Fetch every account sequentially and accumulate. A failing account contributes
/// nothing; the remaining accounts are still fetched.
///
/// Profiles are only requested when `with_profiles` is set (the adjusted score needs them).
pub async fn run_once(
    posts_src: &dyn PostSource,
    profiles_src: &dyn ProfileSource,
    handles: &[String],
    window_start: DateTime<Utc>,
    with_profiles: bool,
) -> Batch {
    ensure_metrics_described();

    let mut batch = Batch::default();
    for handle in handles {
        match posts_src.fetch_posts(handle, window_start).await {
            Ok(mut b) => {
                tracing::info!(
                    account = %handle,
                    provider = posts_src.name(),
                    posts = b.posts.len(),
                    media = b.media.len(),
                    "fetched account"
                );
                counter!("digest_posts_fetched_total").increment(b.posts.len() as u64);
                counter!("digest_media_fetched_total").increment(b.media.len() as u64);
                batch.posts.append(&mut b.posts);
                batch.media.append(&mut b.media);
            }
            Err(e) => {
                tracing::warn!(
                    account = %handle,
                    provider = posts_src.name(),
                    status = e.status(),
                    error = %e,
                    "fetch failed; skipping account"
                );
                counter!("digest_fetch_errors_total", "kind" => "posts").increment(1);
                batch.failed_accounts.push(handle.clone());
                continue;
            }
        }

        if with_profiles {
            match profiles_src.fetch_profile(handle).await {
                Ok(p) => batch.profiles.push(p),
                Err(e) => {
                    // Candidates from this account rank last under the adjusted policy.
                    tracing::warn!(account = %handle, error = %e, "profile lookup failed");
                    counter!("digest_fetch_errors_total", "kind" => "profile").increment(1);
                }
            }
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{FetchError, PostBatch};
    use chrono::TimeZone;

    struct Flaky;

    #[async_trait::async_trait]
    impl PostSource for Flaky {
        async fn fetch_posts(
            &self,
            handle: &str,
            _window_start: DateTime<Utc>,
        ) -> Result<PostBatch, FetchError> {
            if handle == "broken" {
                return Err(FetchError::Status {
                    status: 503,
                    body: "over capacity".into(),
                });
            }
            Ok(PostBatch {
                posts: vec![Post {
                    id: format!("{handle}-1"),
                    author_id: format!("{handle}-id"),
                    text: "hello".into(),
                    created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
                    media_keys: vec![],
                }],
                media: vec![],
            })
        }
        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[async_trait::async_trait]
    impl ProfileSource for Flaky {
        async fn fetch_profile(&self, handle: &str) -> Result<AccountProfile, FetchError> {
            Ok(AccountProfile {
                id: format!("{handle}-id"),
                handle: handle.to_string(),
                name: None,
                followers: 10,
            })
        }
    }

    #[tokio::test]
    async fn failing_account_is_skipped_not_fatal() {
        let handles = vec!["a".to_string(), "broken".to_string(), "b".to_string()];
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap();
        let batch = run_once(&Flaky, &Flaky, &handles, start, true).await;
        assert_eq!(batch.posts.len(), 2);
        assert_eq!(batch.failed_accounts, vec!["broken".to_string()]);
        assert_eq!(batch.profiles.len(), 2);
        assert!(batch.profiles.iter().any(|p| p.id == "b-id"));
    }

    #[tokio::test]
    async fn profiles_skipped_when_not_needed() {
        let handles = vec!["a".to_string()];
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap();
        let batch = run_once(&Flaky, &Flaky, &handles, start, false).await;
        assert!(batch.profiles.is_empty());
    }
}
