// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Fan-out reachability probes
//!
//! A probe batch is a static table of target URLs. Each target gets its own
//! tokio task that writes a pending line, issues one request with a fixed
//! timeout and writes the classified outcome. Results land on the panel in
//! completion order. Probes are never retried and never aggregated.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::form_urlencoded;

use crate::config::ProbeConfig;
use crate::lookups::LookupContext;
use crate::panel::{ResultsPanel, Tag};

/// One site to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub name: String,
    pub url: String,
}

impl ProbeTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// How a batch probes and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStyle {
    /// GET a search results page, five-way status classification
    Search,
    /// HEAD a profile URL following redirects
    Profile,
}

/// Coarse classification of a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBucket {
    Success,
    Redirect,
    NotFound,
    Forbidden,
    Other,
}

pub fn bucket(status: StatusCode) -> StatusBucket {
    match status.as_u16() {
        200..=299 => StatusBucket::Success,
        300..=399 => StatusBucket::Redirect,
        404 => StatusBucket::NotFound,
        403 => StatusBucket::Forbidden,
        _ => StatusBucket::Other,
    }
}

/// What happened to a single probe
#[derive(Debug)]
pub enum ProbeOutcome {
    Status(StatusCode),
    Timeout,
    Connection(String),
    Failed(String),
}

/// Rendered outcome line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub text: String,
    pub tag: Tag,
    /// Whether the line links to the probed URL
    pub linked: bool,
}

impl ProbeReport {
    fn new(text: String, tag: Tag, linked: bool) -> Self {
        Self { text, tag, linked }
    }
}

impl ProbeStyle {
    pub fn timeout(&self, config: &ProbeConfig) -> Duration {
        match self {
            ProbeStyle::Search => config.search_timeout(),
            ProbeStyle::Profile => config.profile_timeout(),
        }
    }

    fn stagger(&self, config: &ProbeConfig) -> Option<Duration> {
        match self {
            ProbeStyle::Search if config.stagger_ms > 0 => Some(config.stagger()),
            _ => None,
        }
    }

    pub fn pending_text(&self, name: &str) -> String {
        match self {
            ProbeStyle::Search => format!("-> [{}] Querying...", name),
            ProbeStyle::Profile => format!("-> [{}] Checking profile...", name),
        }
    }

    pub fn report(&self, target: &ProbeTarget, outcome: &ProbeOutcome) -> ProbeReport {
        let name = &target.name;
        match self {
            ProbeStyle::Search => match outcome {
                ProbeOutcome::Status(status) => {
                    let code = status.as_u16();
                    match bucket(*status) {
                        StatusBucket::Success => ProbeReport::new(
                            format!("-> ✅ {}: Accessible. (click to view results)", name),
                            Tag::Success,
                            true,
                        ),
                        StatusBucket::Redirect => ProbeReport::new(
                            format!("-> ➡️ {}: Redirect ({}). (click)", name, code),
                            Tag::Info,
                            true,
                        ),
                        StatusBucket::NotFound => ProbeReport::new(
                            format!("-> ❌ {}: Not found (404). Possibly no results.", name),
                            Tag::NotFound,
                            false,
                        ),
                        StatusBucket::Forbidden => ProbeReport::new(
                            format!(
                                "-> 🚫 {}: Access denied (403). Bot protection or login may be required.",
                                name
                            ),
                            Tag::Error,
                            false,
                        ),
                        StatusBucket::Other => ProbeReport::new(
                            format!("-> ❗ {}: HTTP error {}. (click to debug)", name, code),
                            Tag::Error,
                            true,
                        ),
                    }
                }
                ProbeOutcome::Timeout => ProbeReport::new(
                    format!("-> ⏱️ {}: Timed out. (URL: {})", name, target.url),
                    Tag::Error,
                    false,
                ),
                ProbeOutcome::Connection(_) => ProbeReport::new(
                    format!("-> 🔌 {}: Connection error. (URL: {})", name, target.url),
                    Tag::Error,
                    false,
                ),
                ProbeOutcome::Failed(e) => ProbeReport::new(
                    format!("-> 🚨 {}: Unexpected error: {}. (URL: {})", name, e, target.url),
                    Tag::Error,
                    false,
                ),
            },
            ProbeStyle::Profile => match outcome {
                ProbeOutcome::Status(status) if *status == StatusCode::OK => ProbeReport::new(
                    format!("-> ✅ {}: Profile accessible.", name),
                    Tag::Success,
                    true,
                ),
                ProbeOutcome::Status(status) if *status == StatusCode::NOT_FOUND => {
                    ProbeReport::new(
                        format!("-> ❌ {}: Profile not found (404).", name),
                        Tag::NotFound,
                        false,
                    )
                }
                ProbeOutcome::Status(status) => ProbeReport::new(
                    format!("-> ❗ {}: Status {}. (click to review)", name, status.as_u16()),
                    Tag::Info,
                    true,
                ),
                ProbeOutcome::Timeout => ProbeReport::new(
                    format!("-> 🔌 {}: Connection error or timeout: request timed out", name),
                    Tag::Error,
                    false,
                ),
                ProbeOutcome::Connection(e) | ProbeOutcome::Failed(e) => ProbeReport::new(
                    format!("-> 🔌 {}: Connection error or timeout: {}", name, e),
                    Tag::Error,
                    false,
                ),
            },
        }
    }
}

/// Issue a single probe request
pub async fn probe_once(client: &Client, style: ProbeStyle, url: &str, timeout: Duration) -> ProbeOutcome {
    let request = match style {
        ProbeStyle::Search => client.get(url),
        ProbeStyle::Profile => client.head(url),
    };

    match request.timeout(timeout).send().await {
        Ok(response) => ProbeOutcome::Status(response.status()),
        Err(e) if e.is_timeout() => ProbeOutcome::Timeout,
        Err(e) if e.is_connect() => ProbeOutcome::Connection(e.to_string()),
        Err(e) => ProbeOutcome::Failed(e.to_string()),
    }
}

/// Write a report to the panel, linking the target when the report asks for it
pub fn publish(panel: &ResultsPanel, target: &ProbeTarget, report: ProbeReport) {
    if report.linked {
        panel.write_link(report.text, report.tag, &target.url);
    } else {
        panel.write(report.text, report.tag);
    }
}

/// Spawn one task per target and return once all are launched
///
/// Search batches are staggered so the engines are not hit in the same
/// instant. The spawned tasks are tracked on the context; callers that need
/// every result call [`LookupContext::wait_pending`].
pub async fn launch(ctx: &LookupContext, targets: Vec<ProbeTarget>, style: ProbeStyle) -> usize {
    let timeout = style.timeout(&ctx.config.probes);
    let stagger = style.stagger(&ctx.config.probes);
    let count = targets.len();

    for (i, target) in targets.into_iter().enumerate() {
        if i > 0 {
            if let Some(delay) = stagger {
                tokio::time::sleep(delay).await;
            }
        }

        let client = ctx.http.clone();
        let panel = ctx.panel.clone();
        let handle = tokio::spawn(async move {
            panel.write(style.pending_text(&target.name), Tag::Pending);
            let outcome = probe_once(&client, style, &target.url, timeout).await;
            debug!("Probe {} -> {:?}", target.name, outcome);
            let report = style.report(&target, &outcome);
            publish(&panel, &target, report);
        });
        ctx.track(handle);
    }

    count
}

/// Form-encode a query as an exact phrase (spaces become `+`)
pub fn exact_phrase(query: &str) -> String {
    form_urlencoded::byte_serialize(format!("\"{}\"", query).as_bytes()).collect()
}

/// Search engines, social networks and dorks for a person query
pub fn person_targets(query: &str) -> Vec<ProbeTarget> {
    let q = exact_phrase(query);
    let google_site = |site: &str| format!("https://www.google.com/search?q=site:{}+{}", site, q);

    vec![
        // General engines
        ProbeTarget::new("Google (General)", format!("https://www.google.com/search?q={}", q)),
        ProbeTarget::new(
            "Google (PDFs/Docs)",
            format!(
                "https://www.google.com/search?q=filetype:pdf+OR+filetype:doc+OR+filetype:docx+OR+filetype:xls+OR+filetype:xlsx+{}",
                q
            ),
        ),
        ProbeTarget::new("DuckDuckGo", format!("https://duckduckgo.com/?q={}", q)),
        ProbeTarget::new("Bing", format!("https://www.bing.com/search?q={}", q)),
        // Social networks
        ProbeTarget::new(
            "LinkedIn",
            format!("https://www.linkedin.com/search/results/all/?keywords={}", q),
        ),
        ProbeTarget::new("Facebook", format!("https://www.facebook.com/search/top/?q={}", q)),
        ProbeTarget::new(
            "Twitter / X",
            format!("https://twitter.com/search?q={}&src=typed_query", q),
        ),
        ProbeTarget::new("Instagram (Google Dork)", google_site("instagram.com")),
        ProbeTarget::new("Reddit (Google Dork)", google_site("reddit.com")),
        ProbeTarget::new("TikTok (Google Dork)", google_site("tiktok.com")),
        ProbeTarget::new("YouTube (Google Dork)", google_site("youtube.com")),
        // Official gazette and news (Spain)
        ProbeTarget::new(
            "BOE (Official Gazette)",
            format!(
                "https://www.boe.es/buscar/boe.php?campo%5B1%5D=DOC&operador%5B1%5D=and&texto%5B1%5D={}",
                q
            ),
        ),
        ProbeTarget::new(
            "News (Google News)",
            format!("https://news.google.com/search?q={}&hl=es&gl=ES&ceid=ES:es", q),
        ),
        // Other sources
        ProbeTarget::new("Pastebin (Google Dork)", google_site("pastebin.com")),
        ProbeTarget::new("GitHub (Google Dork)", google_site("github.com")),
        ProbeTarget::new("Stack Overflow (Google Dork)", google_site("stackoverflow.com")),
        ProbeTarget::new(
            "Spanish Forums (Google Dork)",
            format!("https://www.google.com/search?q=site:.es+foro+{}", q),
        ),
        ProbeTarget::new(
            "Personal Blogs (Google Dork)",
            format!("https://www.google.com/search?q=blog+personal+{}", q),
        ),
    ]
}

/// Profile URLs for a username
pub fn username_targets(username: &str) -> Vec<ProbeTarget> {
    [
        ("Twitter (X)", "https://twitter.com/"),
        ("GitHub", "https://github.com/"),
        ("Reddit", "https://www.reddit.com/user/"),
        ("Instagram", "https://www.instagram.com/"),
        ("Facebook", "https://www.facebook.com/"),
        ("TikTok", "https://www.tiktok.com/@"),
    ]
    .into_iter()
    .map(|(name, prefix)| ProbeTarget::new(name, format!("{}{}", prefix, username)))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;
    use crate::test_support::{context, serve_stub};
    use crate::AppConfig;
    use axum::{http::StatusCode as AxumStatus, routing::get, Router};

    fn stub_router() -> Router {
        Router::new()
            .route("/ok", get(|| async { "results" }))
            .route("/missing", get(|| async { AxumStatus::NOT_FOUND }))
            .route("/forbidden", get(|| async { AxumStatus::FORBIDDEN }))
            .route("/boom", get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }))
            .route("/teapot", get(|| async { AxumStatus::IM_A_TEAPOT }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    "late"
                }),
            )
    }

    fn fast_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.probes.stagger_ms = 0;
        config
    }

    #[test]
    fn status_buckets() {
        assert_eq!(bucket(StatusCode::OK), StatusBucket::Success);
        assert_eq!(bucket(StatusCode::NO_CONTENT), StatusBucket::Success);
        assert_eq!(bucket(StatusCode::MOVED_PERMANENTLY), StatusBucket::Redirect);
        assert_eq!(bucket(StatusCode::NOT_FOUND), StatusBucket::NotFound);
        assert_eq!(bucket(StatusCode::FORBIDDEN), StatusBucket::Forbidden);
        assert_eq!(bucket(StatusCode::TOO_MANY_REQUESTS), StatusBucket::Other);
        assert_eq!(bucket(StatusCode::BAD_GATEWAY), StatusBucket::Other);
    }

    #[test]
    fn search_reports() {
        let target = ProbeTarget::new("Bing", "https://www.bing.com/search?q=x");

        let ok = ProbeStyle::Search.report(&target, &ProbeOutcome::Status(StatusCode::OK));
        assert_eq!(ok.tag, Tag::Success);
        assert!(ok.linked);

        let moved = ProbeStyle::Search.report(&target, &ProbeOutcome::Status(StatusCode::FOUND));
        assert_eq!(moved.text, "-> ➡️ Bing: Redirect (302). (click)");
        assert_eq!(moved.tag, Tag::Info);

        let forbidden = ProbeStyle::Search.report(&target, &ProbeOutcome::Status(StatusCode::FORBIDDEN));
        assert_eq!(forbidden.tag, Tag::Error);
        assert!(!forbidden.linked);

        let timeout = ProbeStyle::Search.report(&target, &ProbeOutcome::Timeout);
        assert!(timeout.text.contains("(URL: https://www.bing.com/search?q=x)"));
    }

    #[test]
    fn profile_reports() {
        let target = ProbeTarget::new("GitHub", "https://github.com/octocat");

        let ok = ProbeStyle::Profile.report(&target, &ProbeOutcome::Status(StatusCode::OK));
        assert_eq!(ok.text, "-> ✅ GitHub: Profile accessible.");
        assert!(ok.linked);

        let missing = ProbeStyle::Profile.report(&target, &ProbeOutcome::Status(StatusCode::NOT_FOUND));
        assert_eq!(missing.tag, Tag::NotFound);
        assert!(!missing.linked);

        // Anything else is worth a manual look
        let other = ProbeStyle::Profile.report(&target, &ProbeOutcome::Status(StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(other.text, "-> ❗ GitHub: Status 429. (click to review)");
        assert_eq!(other.tag, Tag::Info);
        assert!(other.linked);
    }

    #[test]
    fn person_query_is_quoted_and_encoded() {
        let targets = person_targets("Ana García");
        assert_eq!(targets.len(), 18);
        assert_eq!(
            targets[0].url,
            "https://www.google.com/search?q=%22Ana+Garc%C3%ADa%22"
        );
        assert!(targets
            .iter()
            .any(|t| t.url == "https://www.google.com/search?q=site:github.com+%22Ana+Garc%C3%ADa%22"));
    }

    #[test]
    fn username_profiles() {
        let targets = username_targets("octocat");
        assert_eq!(targets.len(), 6);
        assert!(targets.contains(&ProbeTarget::new("TikTok", "https://www.tiktok.com/@octocat")));
    }

    #[tokio::test]
    async fn probe_once_classifies_live_responses() {
        let base = serve_stub(stub_router()).await;
        let client = Client::new();
        let timeout = Duration::from_secs(5);

        let ok = probe_once(&client, ProbeStyle::Search, &format!("{}/ok", base), timeout).await;
        assert!(matches!(ok, ProbeOutcome::Status(s) if s == StatusCode::OK));

        let missing = probe_once(&client, ProbeStyle::Profile, &format!("{}/missing", base), timeout).await;
        assert!(matches!(missing, ProbeOutcome::Status(s) if s == StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn probe_once_times_out() {
        let base = serve_stub(stub_router()).await;
        let outcome = probe_once(
            &Client::new(),
            ProbeStyle::Search,
            &format!("{}/slow", base),
            Duration::from_millis(200),
        )
        .await;
        assert!(matches!(outcome, ProbeOutcome::Timeout));
    }

    #[tokio::test]
    async fn probe_once_reports_refused_connection() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = probe_once(
            &Client::new(),
            ProbeStyle::Search,
            &format!("http://{}/", addr),
            Duration::from_secs(2),
        )
        .await;
        assert!(matches!(outcome, ProbeOutcome::Connection(_)));
    }

    #[tokio::test]
    async fn launch_writes_pending_and_outcome_per_target() {
        let base = serve_stub(stub_router()).await;
        let ctx = context(fast_config(), CredentialStore::default());

        let targets = vec![
            ProbeTarget::new("Ok", format!("{}/ok", base)),
            ProbeTarget::new("Missing", format!("{}/missing", base)),
            ProbeTarget::new("Forbidden", format!("{}/forbidden", base)),
            ProbeTarget::new("Boom", format!("{}/boom", base)),
            ProbeTarget::new("Teapot", format!("{}/teapot", base)),
        ];

        let launched = launch(&ctx, targets, ProbeStyle::Search).await;
        assert_eq!(launched, 5);
        ctx.wait_pending().await;

        let lines = ctx.panel.snapshot();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines.iter().filter(|l| l.tag == Some(Tag::Pending)).count(), 5);

        let text_for = |name: &str| {
            lines
                .iter()
                .find(|l| l.tag != Some(Tag::Pending) && l.text.contains(&format!(" {}:", name)))
                .cloned()
                .unwrap()
        };

        let ok = text_for("Ok");
        assert_eq!(ok.tag, Some(Tag::Success));
        let link = ok.link.expect("success lines are clickable");
        assert_eq!(ctx.panel.resolve(&link), Some(format!("{}/ok", base)));

        assert_eq!(text_for("Missing").tag, Some(Tag::NotFound));
        assert_eq!(text_for("Forbidden").tag, Some(Tag::Error));
        assert!(text_for("Boom").text.contains("HTTP error 500"));
        assert!(text_for("Teapot").text.contains("HTTP error 418"));

        // Ok plus the two "click to debug" lines
        assert_eq!(ctx.panel.link_count(), 3);
    }
}
