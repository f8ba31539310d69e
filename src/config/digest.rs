// src/config/digest.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyze::{ScorePolicy, DEFAULT_TOP_N};
use crate::digest::{
    DigestTemplate, LinkExtractor, LinkPolicy, DEFAULT_HEADER, DEFAULT_PLACEHOLDER,
    DEFAULT_SHORT_LINK_HOST,
};
use crate::ingest::providers::twitter::DEFAULT_API_BASE_URL;

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const ENV_ACCOUNTS: &str = "DIGEST_ACCOUNTS";
pub const ENV_TOP_N: &str = "DIGEST_TOP_N";
pub const ENV_SCORE_POLICY: &str = "DIGEST_SCORE_POLICY";
pub const ENV_RECIPIENTS: &str = "RECIPIENTS";

fn default_accounts() -> Vec<String> {
    vec!["espn".to_string()]
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
fn default_window_hour() -> u32 {
    7
}
fn default_subject() -> String {
    "Daily Sports Brief".to_string()
}
fn default_header() -> String {
    DEFAULT_HEADER.to_string()
}
fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}
fn default_short_link_host() -> String {
    DEFAULT_SHORT_LINK_HOST.to_string()
}
fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}
fn default_max_results() -> u32 {
    100
}
fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigestConfig {
    /// Account handles, fetched in this order.
    #[serde(default = "default_accounts")]
    pub accounts: Vec<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub score_policy: ScorePolicy,
    #[serde(default)]
    pub link_policy: LinkPolicy,
    /// Window starts today at this hour (UTC).
    #[serde(default = "default_window_hour")]
    pub window_start_hour_utc: u32,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_header")]
    pub header: String,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    #[serde(default = "default_short_link_host")]
    pub short_link_host: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            accounts: default_accounts(),
            top_n: default_top_n(),
            score_policy: ScorePolicy::default(),
            link_policy: LinkPolicy::default(),
            window_start_hour_utc: default_window_hour(),
            subject: default_subject(),
            header: default_header(),
            placeholder: default_placeholder(),
            short_link_host: default_short_link_host(),
            recipients: Vec::new(),
            api_base_url: default_api_base_url(),
            max_results: default_max_results(),
            smtp_host: default_smtp_host(),
        }
    }
}

impl DigestConfig {
    /// Load from an explicit path (TOML or JSON by extension), then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading digest config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, &ext)?;
        cfg.with_env_overrides()
    }

    /// Resolve using env var + fallbacks:
    /// 1) $DIGEST_CONFIG_PATH
    /// 2) config/digest.toml
    /// 3) config/digest.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for candidate in ["config/digest.toml", "config/digest.json"] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(v) = std::env::var(ENV_ACCOUNTS) {
            self.accounts = split_list(&v);
        }
        if let Ok(v) = std::env::var(ENV_TOP_N) {
            self.top_n = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TOP_N} must be a positive integer"))?;
        }
        if let Ok(v) = std::env::var(ENV_SCORE_POLICY) {
            self.score_policy = v.parse()?;
        }
        if let Ok(v) = std::env::var(ENV_RECIPIENTS) {
            self.recipients = split_list(&v);
        }
        Ok(self.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.accounts = clean_list(std::mem::take(&mut self.accounts));
        self.recipients = clean_list(std::mem::take(&mut self.recipients));
        if self.top_n == 0 {
            self.top_n = default_top_n();
        }
        if self.window_start_hour_utc > 23 {
            self.window_start_hour_utc = default_window_hour();
        }
        self.max_results = self.max_results.clamp(10, 100);
        if self.short_link_host.trim().is_empty() {
            self.short_link_host = default_short_link_host();
        }
        self
    }

    pub fn template(&self) -> Result<DigestTemplate> {
        let links = LinkExtractor::for_host(&self.short_link_host)
            .with_context(|| format!("bad short link host {}", self.short_link_host))?;
        Ok(DigestTemplate {
            subject: self.subject.clone(),
            header: self.header.clone(),
            placeholder: self.placeholder.clone(),
            link_policy: self.link_policy,
            links,
        })
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<DigestConfig> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("parsing digest config json");
    }
    toml::from_str(s).context("parsing digest config toml")
}

/// Comma-separated list; the legacy `...` separator is accepted too.
fn split_list(raw: &str) -> Vec<String> {
    raw.split("...")
        .flat_map(|chunk| chunk.split(','))
        .map(str::to_string)
        .collect()
}

/// Trim, drop empties, de-duplicate keeping first occurrence.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}
