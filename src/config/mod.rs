// src/config/mod.rs
//! Run configuration: the digest file/env settings plus secrets read from the environment.

pub mod digest;

pub use digest::DigestConfig;

use anyhow::{anyhow, Result};

pub const ENV_BEARER_TOKEN: &str = "TWITTER_API_BEARER_TOKEN";
pub const ENV_SENDER_EMAIL: &str = "SENDER_EMAIL";
pub const ENV_EMAIL_PASSWORD: &str = "EMAIL_PASSWORD";
pub const ENV_SMTP_HOST: &str = "SMTP_HOST";

/// SMTP login for the sending account.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub username: String,
    pub password: String,
    /// Sender address; also the SMTP login.
    pub from: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password_len", &self.password.len())
            .finish()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("Missing {key} env var"))
}

pub fn bearer_token_from_env() -> Result<String> {
    require_env(ENV_BEARER_TOKEN)
}

impl SmtpSettings {
    /// `SMTP_HOST` overrides the configured host.
    pub fn from_env(cfg: &DigestConfig) -> Result<Self> {
        let from = require_env(ENV_SENDER_EMAIL)?;
        let password = require_env(ENV_EMAIL_PASSWORD)?;
        let host = std::env::var(ENV_SMTP_HOST)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| cfg.smtp_host.clone());
        Ok(Self {
            host,
            username: from.clone(),
            password,
            from,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[serial_test::serial]
    #[test]
    fn smtp_settings_require_sender_and_password() {
        env::remove_var(ENV_SENDER_EMAIL);
        env::remove_var(ENV_EMAIL_PASSWORD);
        env::remove_var(ENV_SMTP_HOST);
        assert!(SmtpSettings::from_env(&DigestConfig::default()).is_err());

        env::set_var(ENV_SENDER_EMAIL, "bot@example.com");
        env::set_var(ENV_EMAIL_PASSWORD, "hunter2");
        let s = SmtpSettings::from_env(&DigestConfig::default()).unwrap();
        assert_eq!(s.host, "smtp.gmail.com");
        assert_eq!(s.username, "bot@example.com");
        assert!(!format!("{s:?}").contains("hunter2"));

        // Blank override keeps the configured host
        env::set_var(ENV_SMTP_HOST, "  ");
        let s = SmtpSettings::from_env(&DigestConfig::default()).unwrap();
        assert_eq!(s.host, "smtp.gmail.com");
        env::set_var(ENV_SMTP_HOST, "mail.example.com");
        let s = SmtpSettings::from_env(&DigestConfig::default()).unwrap();
        assert_eq!(s.host, "mail.example.com");
        env::remove_var(ENV_SMTP_HOST);

        env::remove_var(ENV_SENDER_EMAIL);
        env::remove_var(ENV_EMAIL_PASSWORD);
    }
}
