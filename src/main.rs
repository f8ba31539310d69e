//! Video Digest — Binary Entrypoint
//! One-shot run: fetch the configured accounts, rank their video posts, mail the digest.
//!
//! Env: TWITTER_API_BEARER_TOKEN, SENDER_EMAIL, EMAIL_PASSWORD (unless DIGEST_DRY_RUN=1),
//! optional DIGEST_CONFIG_PATH / RECIPIENTS / DIGEST_* overrides, RUST_LOG, DIGEST_LOG_JSON.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use video_digest::config::{self, DigestConfig, SmtpSettings};
use video_digest::ingest::providers::twitter::TwitterProvider;
use video_digest::notify::{email::EmailSender, log::LogSender, DigestSender};
use video_digest::{deliver, run_digest, RunContext};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("video_digest=info,warn"));

    let json = std::env::var("DIGEST_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

fn dry_run() -> bool {
    std::env::var("DIGEST_DRY_RUN")
        .ok()
        .is_some_and(|v| v == "1")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = DigestConfig::load_default().context("loading digest config")?;
    let ctx = RunContext::new(&cfg, Utc::now())?;

    let bearer = config::bearer_token_from_env()?;
    let twitter = TwitterProvider::from_bearer(bearer, &cfg.api_base_url, cfg.max_results)?;

    let sender: Box<dyn DigestSender> = if dry_run() {
        Box::new(LogSender)
    } else {
        let smtp = SmtpSettings::from_env(&cfg)?;
        Box::new(EmailSender::new(&smtp)?)
    };

    let outcome = run_digest(&ctx, &twitter, &twitter).await?;
    if !outcome.failed_accounts.is_empty() {
        tracing::warn!(accounts = ?outcome.failed_accounts, "some accounts contributed nothing");
    }

    if cfg.recipients.is_empty() {
        tracing::warn!("no recipients configured; digest rendered but not sent");
        return Ok(());
    }

    let report = deliver(sender.as_ref(), &cfg.recipients, &outcome.digest).await;
    tracing::info!(
        sent = report.sent.len(),
        failed = report.failed.len(),
        "delivery finished"
    );
    if report.all_failed() {
        anyhow::bail!("digest delivery failed for every recipient");
    }
    Ok(())
}
