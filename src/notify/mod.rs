// src/notify/mod.rs
//! Delivery: one rendered digest, sent to every recipient independently.

pub mod email;
pub mod log;

use anyhow::Result;
use metrics::counter;

use crate::digest::Digest;

#[async_trait::async_trait]
pub trait DigestSender: Send + Sync {
    /// Deliver the digest to one recipient.
    async fn send(&self, recipient: &str, digest: &Digest) -> Result<()>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: Vec<String>,
    /// `(recipient, error)` pairs.
    pub failed: Vec<(String, String)>,
}

impl DeliveryReport {
    pub fn all_failed(&self) -> bool {
        self.sent.is_empty() && !self.failed.is_empty()
    }
}

/// Single attempt per recipient; a failure never stops the remaining sends.
pub async fn deliver(
    sender: &dyn DigestSender,
    recipients: &[String],
    digest: &Digest,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for rcpt in recipients {
        match sender.send(rcpt, digest).await {
            Ok(()) => {
                tracing::info!(recipient = %rcpt, channel = sender.name(), "digest sent");
                report.sent.push(rcpt.clone());
            }
            Err(e) => {
                tracing::warn!(recipient = %rcpt, channel = sender.name(), error = %format!("{e:#}"), "delivery failed");
                counter!("digest_delivery_failures_total").increment(1);
                report.failed.push((rcpt.clone(), format!("{e:#}")));
            }
        }
    }
    report
}
