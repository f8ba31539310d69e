// src/notify/log.rs
use anyhow::Result;

use super::DigestSender;
use crate::digest::Digest;

/// Dry-run sender: logs what would have been mailed.
#[derive(Debug, Clone, Default)]
pub struct LogSender;

#[async_trait::async_trait]
impl DigestSender for LogSender {
    async fn send(&self, recipient: &str, digest: &Digest) -> Result<()> {
        tracing::info!(
            recipient = %recipient,
            subject = %digest.subject,
            entries = digest.entries,
            "dry run: digest not mailed"
        );
        tracing::debug!(body = %digest.plain, "dry run plain body");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
