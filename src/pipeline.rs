//! # Digest Pipeline
//! One stateless run: fetch every account, then correlate, score, select and
//! render over the accumulated set. Ranking is global across accounts.
//!
//! All run inputs (clock, window, policy, template) live in a `RunContext`
//! built once at startup and passed down explicitly.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use metrics::gauge;

use crate::analyze::{self, ScorePolicy};
use crate::config::DigestConfig;
use crate::digest::{self, Digest, DigestTemplate};
use crate::ingest::{
    self,
    types::{PostSource, ProfileSource},
};

#[derive(Debug, Clone)]
pub struct RunContext {
    pub now: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub accounts: Vec<String>,
    pub policy: ScorePolicy,
    pub top_n: usize,
    pub template: DigestTemplate,
}

impl RunContext {
    pub fn new(cfg: &DigestConfig, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            now,
            window_start: window_start(now, cfg.window_start_hour_utc)?,
            accounts: cfg.accounts.clone(),
            policy: cfg.score_policy,
            top_n: cfg.top_n,
            template: cfg.template()?,
        })
    }
}

/// Today at `hour`:00Z, or yesterday's cut-off when that is still ahead of `now`.
pub fn window_start(now: DateTime<Utc>, hour: u32) -> Result<DateTime<Utc>> {
    let cutoff = NaiveTime::from_hms_opt(hour, 0, 0)
        .with_context(|| format!("window start hour out of range: {hour}"))?;
    let today = now.date_naive().and_time(cutoff).and_utc();
    Ok(if today > now {
        today - Duration::days(1)
    } else {
        today
    })
}

/// What a run produced, for logging and exit status.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub digest: Digest,
    pub posts: usize,
    pub media: usize,
    pub failed_accounts: Vec<String>,
}

pub async fn run_digest(
    ctx: &RunContext,
    posts_src: &dyn PostSource,
    profiles_src: &dyn ProfileSource,
) -> Result<RunOutcome> {
    tracing::info!(
        accounts = ctx.accounts.len(),
        window_start = %ctx.window_start.to_rfc3339(),
        policy = ?ctx.policy,
        "digest run started"
    );

    let batch = ingest::run_once(
        posts_src,
        profiles_src,
        &ctx.accounts,
        ctx.window_start,
        ctx.policy.needs_profiles(),
    )
    .await;

    let top = analyze::top_candidates(&batch, ctx.policy, ctx.top_n, ctx.now);
    let digest = digest::render(&top, &ctx.template).context("rendering digest")?;

    gauge!("digest_last_run_ts").set(ctx.now.timestamp() as f64);
    tracing::info!(
        entries = digest.entries,
        skipped = digest.skipped.len(),
        failed_accounts = batch.failed_accounts.len(),
        "digest rendered"
    );

    Ok(RunOutcome {
        digest,
        posts: batch.posts.len(),
        media: batch.media.len(),
        failed_accounts: batch.failed_accounts,
    })
}
