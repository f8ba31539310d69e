//! # Digest Renderer
//! Turns the ranked candidates into a plain-text and an HTML body.
//!
//! Every entry's text is the post text up to its trailing short link, with line
//! breaks collapsed to spaces. The short link itself becomes the "Watch video"
//! button target in the HTML body. Rendering is a pure function of its inputs.

use std::fmt::Write as _;

use metrics::counter;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analyze::ScoredCandidate;

pub const DEFAULT_SHORT_LINK_HOST: &str = "t.co";
pub const DEFAULT_HEADER: &str = "Today's Top 5 ESPN Video Tweets";
pub const DEFAULT_PLACEHOLDER: &str = "No new video posts today.";

const BUTTON_START: &str = r#"<div style="margin: 20px 0 ; color: #f5f8fc; width: 100%; text-align: center; height: 50px; border-radius: 4px; background-color: #3468ad; line-height: 50px; font-weight: 600;">"#;
const BUTTON_END: &str = "</div>";
const BUTTON_LABEL: &str = "Watch video &#8599;";

/// What to do with a candidate whose text has no trailing short link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPolicy {
    /// Drop that one entry and keep rendering.
    #[default]
    Skip,
    /// Abort the render.
    Fail,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("post {post_id} has no trailing short link")]
    MissingShortLink { post_id: String },
}

/// Finds the trailing share link (`https://<host>/<token>` at the end of the text).
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    re: Regex,
}

impl LinkExtractor {
    pub fn for_host(host: &str) -> Result<Self, regex::Error> {
        let pattern = format!(r"https://{}/\S+\s*$", regex::escape(host.trim()));
        Ok(Self {
            re: Regex::new(&pattern)?,
        })
    }

    /// Returns `(cleaned_text, link)`, or `None` when the text does not end in a short link.
    pub fn split(&self, text: &str) -> Option<(String, String)> {
        let m = self.re.find(text)?;
        let link = m.as_str().trim_end().to_string();
        let cleaned = text[..m.start()]
            .replace("\r\n", " ")
            .replace('\n', " ")
            .trim_end()
            .to_string();
        Some((cleaned, link))
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        static RE: once_cell::sync::OnceCell<Regex> = once_cell::sync::OnceCell::new();
        let re = RE
            .get_or_init(|| Regex::new(r"https://t\.co/\S+\s*$").unwrap())
            .clone();
        Self { re }
    }
}

#[derive(Debug, Clone)]
pub struct DigestTemplate {
    pub subject: String,
    pub header: String,
    pub placeholder: String,
    pub link_policy: LinkPolicy,
    pub links: LinkExtractor,
}

impl Default for DigestTemplate {
    fn default() -> Self {
        Self {
            subject: "Daily Sports Brief".to_string(),
            header: DEFAULT_HEADER.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            link_policy: LinkPolicy::default(),
            links: LinkExtractor::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub plain: String,
    pub html: String,
    /// Number of rendered entries.
    pub entries: usize,
    /// Post ids dropped for lacking a trailing short link.
    pub skipped: Vec<String>,
}

impl Digest {
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

struct Entry<'a> {
    text: String,
    link: String,
    preview: Option<&'a str>,
}

fn html_entry(out: &mut String, ordinal: usize, e: &Entry<'_>) {
    let _ = write!(out, "<h2>{ordinal}.</h2>");
    let _ = write!(out, "<p>{}</p>", html_escape::encode_text(&e.text));
    if let Some(src) = e.preview {
        let _ = write!(
            out,
            r#"<img src="{}">"#,
            html_escape::encode_double_quoted_attribute(src)
        );
    }
    let _ = write!(
        out,
        r#"<a style="text-decoration: none;" href="{}">{BUTTON_START}{BUTTON_LABEL}{BUTTON_END}</a>"#,
        html_escape::encode_double_quoted_attribute(&e.link)
    );
    out.push_str("<hr />");
}

/// Render the ordered candidates. The order given is the order shown.
pub fn render(
    top: &[ScoredCandidate<'_>],
    tpl: &DigestTemplate,
) -> Result<Digest, RenderError> {
    let mut entries = Vec::with_capacity(top.len());
    let mut skipped = Vec::new();

    for sc in top {
        let post = sc.candidate.post;
        match tpl.links.split(&post.text) {
            Some((text, link)) => entries.push(Entry {
                text,
                link,
                preview: sc.candidate.media.preview_image_url.as_deref(),
            }),
            None => match tpl.link_policy {
                LinkPolicy::Fail => {
                    return Err(RenderError::MissingShortLink {
                        post_id: post.id.clone(),
                    })
                }
                LinkPolicy::Skip => {
                    tracing::warn!(post_id = %post.id, "no trailing short link; entry skipped");
                    counter!("digest_render_skipped_total").increment(1);
                    skipped.push(post.id.clone());
                }
            },
        }
    }

    let mut plain = format!("{}\n\n", tpl.header);
    for e in &entries {
        let _ = write!(plain, "{}\n\n", e.text);
    }

    let mut html = String::new();
    html.push_str(r#"<html><body style="color: #333;">"#);
    let _ = write!(
        html,
        r#"<h1 style="line-height: 40px;">{}</h1>"#,
        html_escape::encode_text(&tpl.header)
    );
    if entries.is_empty() {
        let _ = write!(html, "<p>{}</p>", html_escape::encode_text(&tpl.placeholder));
    } else {
        for (i, e) in entries.iter().enumerate() {
            html_entry(&mut html, i + 1, e);
        }
    }
    html.push_str("</body></html>");

    Ok(Digest {
        subject: tpl.subject.clone(),
        plain,
        html,
        entries: entries.len(),
        skipped,
    })
}
