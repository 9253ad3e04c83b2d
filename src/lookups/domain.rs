// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! WHOIS lookup through the local `whois` client

use async_trait::async_trait;

use super::{InputKind, Lookup, LookupContext};
use crate::panel::Tag;
use crate::tools::{self, ToolFailure};
use crate::{Result, WicError};

pub struct WhoisLookup;

#[async_trait]
impl Lookup for WhoisLookup {
    fn id(&self) -> &'static str {
        "domain-whois"
    }

    fn label(&self) -> &'static str {
        "WHOIS"
    }

    fn kind(&self) -> InputKind {
        InputKind::Domain
    }

    async fn run(&self, ctx: &LookupContext, domain: &str) -> Result<()> {
        // whois takes flags before the operand and has no `--` separator
        if domain.starts_with('-') {
            return Err(WicError::Tool {
                tool: ctx.config.tools.whois.clone(),
                message: format!("Invalid domain: {}", domain),
            });
        }

        ctx.panel.plain(format!("\n[Domain] Querying WHOIS for {}...", domain));

        let whois = &ctx.config.tools.whois;
        match tools::capture(whois, &[domain], ctx.config.tools.timeout()).await {
            Ok(output) if output.is_empty() => {
                ctx.panel.write("❌ No WHOIS results found.", Tag::NotFound);
            }
            Ok(output) => {
                ctx.panel.write(output, Tag::Success);
            }
            Err(failure) => {
                ctx.panel.write(failure_message(whois, failure), Tag::Error);
            }
        }
        Ok(())
    }
}

fn failure_message(whois: &str, failure: ToolFailure) -> String {
    match failure {
        ToolFailure::NotFound => format!(
            "❌ Error: '{}' not found. Make sure it is installed.",
            whois
        ),
        ToolFailure::TimedOut(after) => format!(
            "❌ WHOIS query timed out after {}s.",
            after.as_secs()
        ),
        ToolFailure::Io(e) => format!("❌ Unexpected error running {}: {}", whois, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;
    use crate::lookups::LookupRegistry;
    use crate::test_support::context;
    use crate::AppConfig;

    fn with_whois(program: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.tools.whois = program.to_string();
        config
    }

    #[tokio::test]
    async fn missing_client_is_explained() {
        let ctx = context(with_whois("wicosintx-no-whois"), CredentialStore::default());
        LookupRegistry::new()
            .dispatch(&ctx, "domain-whois", "example.com")
            .await
            .unwrap();

        let lines = ctx.panel.snapshot();
        assert_eq!(lines[0].text, "\n[Domain] Querying WHOIS for example.com...");
        assert_eq!(lines[1].tag, Some(Tag::Error));
        assert_eq!(
            lines[1].text,
            "❌ Error: 'wicosintx-no-whois' not found. Make sure it is installed."
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn output_is_written_verbatim() {
        // `echo` stands in for whois and prints the operand back
        let ctx = context(with_whois("echo"), CredentialStore::default());
        LookupRegistry::new()
            .dispatch(&ctx, "domain-whois", "example.com")
            .await
            .unwrap();

        let last = ctx.panel.snapshot().pop().unwrap();
        assert_eq!(last.tag, Some(Tag::Success));
        assert_eq!(last.text, "example.com");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn empty_output_is_not_found() {
        let ctx = context(with_whois("true"), CredentialStore::default());
        LookupRegistry::new()
            .dispatch(&ctx, "domain-whois", "example.com")
            .await
            .unwrap();

        let last = ctx.panel.snapshot().pop().unwrap();
        assert_eq!(last.tag, Some(Tag::NotFound));
        assert_eq!(last.text, "❌ No WHOIS results found.");
    }

    #[tokio::test]
    async fn option_like_domain_is_refused() {
        let ctx = context(AppConfig::default(), CredentialStore::default());
        LookupRegistry::new()
            .dispatch(&ctx, "domain-whois", "-h evil")
            .await
            .unwrap();

        let lines = ctx.panel.snapshot();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "❌ Invalid domain: -h evil");
    }
}
