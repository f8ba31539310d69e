use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::DigestSender;
use crate::config::SmtpSettings;
use crate::digest::Digest;

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailSender {
    /// Implicit-TLS relay (port 465) with login credentials.
    pub fn new(smtp: &SmtpSettings) -> Result<Self> {
        let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
            .with_context(|| format!("invalid SMTP host {}", smtp.host))?
            .credentials(creds)
            .build();
        let from = smtp
            .from
            .parse()
            .with_context(|| format!("invalid sender address {}", smtp.from))?;
        Ok(Self { mailer, from })
    }
}

/// multipart/alternative: plain first, HTML preferred by capable clients.
pub fn build_message(from: Mailbox, to: Mailbox, digest: &Digest) -> Result<Message> {
    Message::builder()
        .from(from)
        .to(to)
        .subject(digest.subject.clone())
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_PLAIN)
                        .body(digest.plain.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_HTML)
                        .body(digest.html.clone()),
                ),
        )
        .context("build email")
}

#[async_trait::async_trait]
impl DigestSender for EmailSender {
    async fn send(&self, recipient: &str, digest: &Digest) -> Result<()> {
        let to: Mailbox = recipient
            .parse()
            .with_context(|| format!("invalid recipient {recipient}"))?;
        let msg = build_message(self.from.clone(), to, digest)?;
        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
