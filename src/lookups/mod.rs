// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Lookup handlers for each kind of identifier
//!
//! Every handler reads its credential, makes one network or subprocess call,
//! turns the response into a canned message and writes it to the results
//! panel. Handlers never depend on each other's output.

pub mod domain;
pub mod email;
pub mod image;
pub mod ip;
pub mod person;
pub mod phone;
pub mod username;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::credentials::CredentialStore;
use crate::panel::{ResultsPanel, Tag};
use crate::{AppConfig, Result, WicError};

/// Placeholder for fields a provider did not return
pub const NA: &str = "N/A";

/// Kind of identifier a lookup accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Person,
    Ip,
    Domain,
    Email,
    Username,
    Image,
    Phone,
}

impl InputKind {
    pub const ALL: [InputKind; 7] = [
        InputKind::Person,
        InputKind::Ip,
        InputKind::Domain,
        InputKind::Email,
        InputKind::Username,
        InputKind::Image,
        InputKind::Phone,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            InputKind::Person => "Person (name / ID)",
            InputKind::Ip => "IP",
            InputKind::Domain => "Domain (WHOIS)",
            InputKind::Email => "Email",
            InputKind::Username => "Username (social)",
            InputKind::Image => "Image",
            InputKind::Phone => "Phone",
        }
    }
}

/// Everything a handler needs for one run
#[derive(Clone)]
pub struct LookupContext {
    pub http: Client,
    pub config: Arc<AppConfig>,
    pub credentials: Arc<CredentialStore>,
    pub panel: ResultsPanel,
    /// Open result URLs in the system browser as well as printing them
    pub open_links: bool,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl LookupContext {
    pub fn new(
        config: Arc<AppConfig>,
        credentials: Arc<CredentialStore>,
        panel: ResultsPanel,
    ) -> Result<Self> {
        let http = build_client(&config)?;
        Ok(Self {
            http,
            config,
            credentials,
            panel,
            open_links: false,
            pending: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn with_open_links(mut self, open: bool) -> Self {
        self.open_links = open;
        self
    }

    /// Same client and panel, fresh credential snapshot and its own pending probes
    pub fn with_credentials(&self, credentials: Arc<CredentialStore>) -> Self {
        Self {
            credentials,
            pending: Arc::new(Mutex::new(Vec::new())),
            ..self.clone()
        }
    }

    /// Fetch a credential or fail with the service's display name
    pub fn credential(&self, key: &str, service: &str) -> Result<String> {
        self.credentials
            .get(key)
            .map(String::from)
            .ok_or_else(|| WicError::MissingCredential {
                service: service.to_string(),
            })
    }

    /// Keep hold of a spawned probe so callers can wait for it
    pub fn track(&self, handle: JoinHandle<()>) {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(handle);
    }

    /// Wait for every probe spawned through this context
    pub async fn wait_pending(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut pending = self
                    .pending
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                pending.drain(..).collect()
            };
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("Probe task failed: {}", e);
                }
            }
        }
    }
}

/// Build the shared HTTP client
pub fn build_client(config: &AppConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(config.http.user_agent.clone())
        .timeout(config.http.timeout())
        .build()?;
    Ok(client)
}

/// Trait for lookup handlers
#[async_trait]
pub trait Lookup: Send + Sync {
    /// Stable identifier used by the CLI and the web form
    fn id(&self) -> &'static str;

    /// Human-readable service name
    fn label(&self) -> &'static str;

    fn kind(&self) -> InputKind;

    /// Whether the handler needs a non-empty identifier
    fn needs_input(&self) -> bool {
        true
    }

    /// Run the lookup, writing results to the panel
    async fn run(&self, ctx: &LookupContext, input: &str) -> Result<()>;
}

/// Serializable description of a registered lookup
#[derive(Debug, Clone, Serialize)]
pub struct LookupInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: InputKind,
    pub needs_input: bool,
}

/// Registry of all lookup handlers
pub struct LookupRegistry {
    lookups: Vec<Box<dyn Lookup>>,
}

impl LookupRegistry {
    /// Create a registry with every built-in handler
    pub fn new() -> Self {
        let mut registry = Self {
            lookups: Vec::new(),
        };

        registry.register(Box::new(person::PersonSearch));
        registry.register(Box::new(ip::IpInfoLookup));
        registry.register(Box::new(ip::AbstractIpLookup));
        registry.register(Box::new(ip::ShodanLookup));
        registry.register(Box::new(ip::CensysLookup));
        registry.register(Box::new(domain::WhoisLookup));
        registry.register(Box::new(email::DehashedLookup));
        registry.register(Box::new(email::AbstractEmailLookup));
        registry.register(Box::new(username::UsernamePresence));
        registry.register(Box::new(image::ExifLookup));
        registry.register(Box::new(image::ReverseImageLookup));
        registry.register(Box::new(phone::VeriphoneLookup));
        registry.register(Box::new(phone::AbstractPhoneLookup));

        registry
    }

    pub fn register(&mut self, lookup: Box<dyn Lookup>) {
        self.lookups.push(lookup);
    }

    pub fn find(&self, id: &str) -> Option<&dyn Lookup> {
        self.lookups
            .iter()
            .find(|l| l.id() == id)
            .map(|l| l.as_ref())
    }

    pub fn for_kind(&self, kind: InputKind) -> Vec<&dyn Lookup> {
        self.lookups
            .iter()
            .filter(|l| l.kind() == kind)
            .map(|l| l.as_ref())
            .collect()
    }

    pub fn describe(&self) -> Vec<LookupInfo> {
        self.lookups
            .iter()
            .map(|l| LookupInfo {
                id: l.id(),
                label: l.label(),
                kind: l.kind(),
                needs_input: l.needs_input(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }

    /// Check that a lookup exists and the input is acceptable
    pub fn validate<'a>(&self, id: &str, input: &'a str) -> Result<(&dyn Lookup, &'a str)> {
        let lookup = self
            .find(id)
            .ok_or_else(|| WicError::UnknownLookup(id.to_string()))?;
        let input = input.trim();
        if lookup.needs_input() && input.is_empty() {
            return Err(WicError::EmptyInput);
        }
        Ok((lookup, input))
    }

    /// Run one lookup; handler failures become panel messages
    pub async fn dispatch(&self, ctx: &LookupContext, id: &str, input: &str) -> Result<()> {
        let (lookup, input) = self.validate(id, input)?;

        info!("Running lookup: {}", lookup.id());
        if let Err(e) = lookup.run(ctx, input).await {
            warn!("Lookup {} failed: {}", lookup.id(), e);
            report_failure(&ctx.panel, e);
        }
        Ok(())
    }
}

impl Default for LookupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a handler error into its user-facing message
pub fn report_failure(panel: &ResultsPanel, error: WicError) {
    let message = match error {
        WicError::MissingCredential { service } => format!(
            "⚠️ No API key configured for {}. Set it under 'API keys'.",
            service
        ),
        // Request URLs may carry API keys in the query string
        WicError::Http(e) => format!("❌ Connection error: {}", e.without_url()),
        WicError::Tool { message, .. } => format!("❌ {}", message),
        other => format!("❌ Unexpected error: {}", other),
    };
    panel.write(message, Tag::Error);
}

/// Read a response as status plus body text
pub(crate) async fn read_body(response: Response) -> Result<(StatusCode, String)> {
    let status = response.status();
    debug!("Response status {} from {}", status, redact_url(response.url()));
    let body = response.text().await?;
    Ok((status, body))
}

/// URL without its query string, for logs
pub(crate) fn redact_url(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Nested field as display text, `N/A` when absent
pub(crate) fn field(data: &Value, path: &[&str]) -> String {
    let mut current = data;
    for key in path {
        match current.get(key) {
            Some(v) => current = v,
            None => return NA.to_string(),
        }
    }
    render(current)
}

/// First of several candidate paths that is present
pub(crate) fn first_field(data: &Value, paths: &[&[&str]]) -> String {
    paths
        .iter()
        .map(|path| field(data, path))
        .find(|v| v != NA)
        .unwrap_or_else(|| NA.to_string())
}

pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::Null => NA.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.is_empty() => NA.to_string(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Pull a provider error message out of a JSON body, falling back to the raw text
pub(crate) fn error_detail(body: &str, path: &[&str], fallback: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => {
            let detail = field(&json, path);
            if detail == NA {
                fallback.to_string()
            } else {
                detail
            }
        }
        Err(_) => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;
    use serde_json::json;

    #[tokio::test]
    async fn derived_context_waits_only_for_its_own_probes() {
        let base = context(AppConfig::default(), CredentialStore::default());
        let stuck = tokio::spawn(std::future::pending::<()>());
        let abort = stuck.abort_handle();
        base.track(stuck);

        let derived = base.with_credentials(Arc::new(CredentialStore::default()));
        derived.track(tokio::spawn(async {}));
        tokio::time::timeout(std::time::Duration::from_secs(1), derived.wait_pending())
            .await
            .expect("derived context waited on a probe it never spawned");

        abort.abort();
        base.wait_pending().await;
    }

    #[test]
    fn registry_covers_every_input_kind() {
        let registry = LookupRegistry::new();
        assert_eq!(registry.len(), 13);
        for kind in InputKind::ALL {
            assert!(!registry.for_kind(kind).is_empty(), "no lookup for {:?}", kind);
        }
        assert_eq!(registry.for_kind(InputKind::Ip).len(), 4);
    }

    #[test]
    fn validate_rejects_unknown_and_empty() {
        let registry = LookupRegistry::new();
        assert!(matches!(
            registry.validate("ip-nowhere", "1.1.1.1"),
            Err(WicError::UnknownLookup(_))
        ));
        assert!(matches!(
            registry.validate("ip-ipinfo", "   "),
            Err(WicError::EmptyInput)
        ));
        let (_, input) = registry.validate("ip-ipinfo", "  8.8.8.8 ").unwrap();
        assert_eq!(input, "8.8.8.8");
        assert!(registry.validate("image-reverse", "").is_ok());
    }

    #[tokio::test]
    async fn missing_credential_becomes_panel_warning() {
        let ctx = context(AppConfig::default(), CredentialStore::default());
        LookupRegistry::new()
            .dispatch(&ctx, "ip-shodan", "8.8.8.8")
            .await
            .unwrap();

        let last = ctx.panel.snapshot().pop().unwrap();
        assert_eq!(last.tag, Some(Tag::Error));
        assert_eq!(
            last.text,
            "⚠️ No API key configured for Shodan. Set it under 'API keys'."
        );
    }

    #[test]
    fn field_rendering() {
        let data = json!({
            "ip": "8.8.8.8",
            "asn": { "asn": "AS15169" },
            "ports": [53, 443],
            "hostnames": [],
            "valid": true,
            "nothing": null
        });
        assert_eq!(field(&data, &["ip"]), "8.8.8.8");
        assert_eq!(field(&data, &["asn", "asn"]), "AS15169");
        assert_eq!(field(&data, &["ports"]), "53, 443");
        assert_eq!(field(&data, &["hostnames"]), NA);
        assert_eq!(field(&data, &["valid"]), "true");
        assert_eq!(field(&data, &["nothing"]), NA);
        assert_eq!(field(&data, &["ip", "deeper"]), NA);
        assert_eq!(first_field(&data, &[&["missing"], &["ip"]]), "8.8.8.8");
    }

    #[test]
    fn error_detail_falls_back_to_body() {
        assert_eq!(error_detail(r#"{"error":"No information"}"#, &["error"], "raw"), "No information");
        assert_eq!(error_detail("<html>", &["error"], "<html>"), "<html>");
        assert_eq!(error_detail("{}", &["error", "message"], "Error"), "Error");
    }
}
