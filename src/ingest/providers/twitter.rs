// src/ingest/providers/twitter.rs
//! X/Twitter API v2 adapter: recent search (posts + expanded media) and user lookup.
//!
//! Payloads are decoded into typed records and fail closed: a post missing a
//! required field turns the whole account response into `FetchError::Decode`
//! instead of leaking a half-populated record into correlation or rendering.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::ingest::types::{
    AccountProfile, FetchError, Media, MediaKind, Post, PostBatch, PostSource, ProfileSource,
};

pub const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com";

const TWEET_FIELDS: &str = "public_metrics,created_at,attachments,author_id";
const EXPANSIONS: &str = "attachments.media_keys";
const MEDIA_FIELDS: &str = "preview_image_url,type,duration_ms,width,public_metrics";
const USER_FIELDS: &str = "public_metrics";

// --- wire types (search) ---

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<Vec<RawTweet>>,
    #[serde(default)]
    includes: Option<RawIncludes>,
    #[serde(default)]
    errors: Option<Vec<RawApiError>>,
}

#[derive(Debug, Deserialize)]
struct RawTweet {
    id: Option<String>,
    text: Option<String>,
    author_id: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    attachments: Option<RawAttachments>,
}

#[derive(Debug, Deserialize, Default)]
struct RawAttachments {
    #[serde(default)]
    media_keys: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct RawIncludes {
    #[serde(default)]
    media: Option<Vec<RawMedia>>,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    media_key: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    preview_image_url: Option<String>,
    #[serde(default)]
    duration_ms: Option<u64>,
    #[serde(default)]
    public_metrics: Option<RawMediaMetrics>,
}

#[derive(Debug, Deserialize, Default)]
struct RawMediaMetrics {
    #[serde(default)]
    view_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawApiError {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

// --- wire types (user lookup) ---

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    data: Option<RawUser>,
    #[serde(default)]
    errors: Option<Vec<RawApiError>>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
    username: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    public_metrics: Option<RawUserMetrics>,
}

#[derive(Debug, Deserialize)]
struct RawUserMetrics {
    followers_count: u64,
}

fn api_errors_message(errors: &[RawApiError]) -> String {
    errors
        .iter()
        .map(|e| {
            e.detail
                .as_deref()
                .or(e.title.as_deref())
                .unwrap_or("unknown error")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn required(field: Option<String>, what: &str, post_idx: usize) -> Result<String, FetchError> {
    field.ok_or_else(|| FetchError::Decode(format!("post #{post_idx} missing `{what}`")))
}

/// Decode a recent-search body into a typed batch.
pub fn decode_search(body: &str) -> Result<PostBatch, FetchError> {
    let t0 = std::time::Instant::now();
    let resp: SearchResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let raw_posts = match resp.data {
        Some(d) => d,
        None => match resp.errors.as_deref() {
            Some(errs) if !errs.is_empty() => {
                return Err(FetchError::Api(api_errors_message(errs)));
            }
            // `meta.result_count == 0`: nothing posted in the window
            _ => Vec::new(),
        },
    };

    let mut posts = Vec::with_capacity(raw_posts.len());
    for (idx, t) in raw_posts.into_iter().enumerate() {
        let created_raw = required(t.created_at, "created_at", idx)?;
        let created_at = DateTime::parse_from_rfc3339(&created_raw)
            .map_err(|e| FetchError::Decode(format!("post #{idx} bad created_at: {e}")))?
            .with_timezone(&Utc);
        posts.push(Post {
            id: required(t.id, "id", idx)?,
            author_id: required(t.author_id, "author_id", idx)?,
            text: required(t.text, "text", idx)?,
            created_at,
            media_keys: t
                .attachments
                .and_then(|a| a.media_keys)
                .unwrap_or_default(),
        });
    }

    let raw_media = resp.includes.and_then(|i| i.media).unwrap_or_default();
    let mut media = Vec::with_capacity(raw_media.len());
    for (idx, m) in raw_media.into_iter().enumerate() {
        let media_key = m
            .media_key
            .ok_or_else(|| FetchError::Decode(format!("media #{idx} missing `media_key`")))?;
        media.push(Media {
            media_key,
            kind: MediaKind::parse(m.kind.as_deref()),
            preview_image_url: m.preview_image_url,
            view_count: m
                .public_metrics
                .and_then(|pm| pm.view_count)
                .unwrap_or(0),
            duration_ms: m.duration_ms,
        });
    }

    histogram!("digest_decode_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(PostBatch { posts, media })
}

/// Decode a user-lookup body into a profile.
pub fn decode_user(body: &str) -> Result<AccountProfile, FetchError> {
    let resp: UserResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let Some(u) = resp.data else {
        let msg = resp
            .errors
            .as_deref()
            .map(api_errors_message)
            .unwrap_or_else(|| "user lookup returned no data".to_string());
        return Err(FetchError::Api(msg));
    };
    let followers = u
        .public_metrics
        .map(|pm| pm.followers_count)
        .ok_or_else(|| FetchError::Decode(format!("user {} missing public_metrics", u.id)))?;
    Ok(AccountProfile {
        id: u.id,
        handle: u.username,
        name: u.name,
        followers,
    })
}

pub struct TwitterProvider {
    mode: Mode,
}

enum Mode {
    /// Canned bodies; every handle gets the same response.
    Fixture { search: String, user: String },
    Http {
        client: reqwest::Client,
        base_url: String,
        bearer: String,
        max_results: u32,
    },
}

impl TwitterProvider {
    pub fn from_fixture_str(search: &str, user: &str) -> Self {
        Self {
            mode: Mode::Fixture {
                search: search.to_string(),
                user: user.to_string(),
            },
        }
    }

    pub fn from_bearer(bearer: String, base_url: &str, max_results: u32) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("video-digest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .context("building http client")?;
        Ok(Self {
            mode: Mode::Http {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                bearer,
                max_results: max_results.clamp(10, 100),
            },
        })
    }

    async fn get_body(
        client: &reqwest::Client,
        bearer: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, FetchError> {
        let resp = client
            .get(url)
            .bearer_auth(bearer)
            .query(query)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl PostSource for TwitterProvider {
    async fn fetch_posts(
        &self,
        handle: &str,
        window_start: DateTime<Utc>,
    ) -> Result<PostBatch, FetchError> {
        match &self.mode {
            Mode::Fixture { search, .. } => decode_search(search),
            Mode::Http {
                client,
                base_url,
                bearer,
                max_results,
            } => {
                let url = format!("{base_url}/2/tweets/search/recent");
                let query = [
                    ("query", format!("from:{handle}")),
                    (
                        "start_time",
                        window_start.to_rfc3339_opts(SecondsFormat::Secs, true),
                    ),
                    ("max_results", max_results.to_string()),
                    ("tweet.fields", TWEET_FIELDS.to_string()),
                    ("expansions", EXPANSIONS.to_string()),
                    ("media.fields", MEDIA_FIELDS.to_string()),
                ];
                let body = Self::get_body(client, bearer, &url, &query)
                    .await
                    .inspect_err(|_| {
                        counter!("digest_http_errors_total", "endpoint" => "search").increment(1);
                    })?;
                decode_search(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "twitter"
    }
}

#[async_trait]
impl ProfileSource for TwitterProvider {
    async fn fetch_profile(&self, handle: &str) -> Result<AccountProfile, FetchError> {
        match &self.mode {
            Mode::Fixture { user, .. } => decode_user(user),
            Mode::Http {
                client,
                base_url,
                bearer,
                ..
            } => {
                let url = format!("{base_url}/2/users/by/username/{handle}");
                let query = [("user.fields", USER_FIELDS.to_string())];
                let body = Self::get_body(client, bearer, &url, &query)
                    .await
                    .inspect_err(|_| {
                        counter!("digest_http_errors_total", "endpoint" => "user").increment(1);
                    })?;
                decode_user(&body)
            }
        }
    }
}
