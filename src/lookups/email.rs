// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Email lookups: Dehashed breach search and AbstractAPI validation

use async_trait::async_trait;
use serde_json::Value;

use super::{error_detail, field, read_body, InputKind, Lookup, LookupContext};
use crate::panel::Tag;
use crate::Result;

/// Entries listed from a Dehashed hit
const DEHASHED_PREVIEW: usize = 5;

/// Dehashed leak search
pub struct DehashedLookup;

#[async_trait]
impl Lookup for DehashedLookup {
    fn id(&self) -> &'static str {
        "email-dehashed"
    }

    fn label(&self) -> &'static str {
        "Dehashed"
    }

    fn kind(&self) -> InputKind {
        InputKind::Email
    }

    async fn run(&self, ctx: &LookupContext, email: &str) -> Result<()> {
        let service = "Dehashed (user/password)";
        let user = ctx.credential("dehashed_user", service)?;
        let pass = ctx.credential("dehashed_pass", service)?;
        ctx.panel.plain(format!("\n[Dehashed] Searching leaks for {}...", email));

        let url = format!("{}/search", ctx.config.endpoints.dehashed.trim_end_matches('/'));
        let response = ctx
            .http
            .get(&url)
            .query(&[("query", format!("email:{}", email))])
            .header(reqwest::header::ACCEPT, "application/json")
            .basic_auth(user, Some(pass))
            .send()
            .await?;
        let (status, body) = read_body(response).await?;

        if !status.is_success() {
            ctx.panel.write(format!("❌ HTTP error {}: {}", status.as_u16(), body), Tag::Error);
            return Ok(());
        }

        let data: Value = serde_json::from_str(&body)?;
        let (text, tag) = format_dehashed(&data);
        ctx.panel.write(text, tag);
        Ok(())
    }
}

pub fn format_dehashed(data: &Value) -> (String, Tag) {
    let total = data.get("total").and_then(Value::as_u64).unwrap_or(0);
    if total == 0 {
        return (
            "✅ No leaks found for this address.".to_string(),
            Tag::NotFound,
        );
    }

    let mut text = format!("❗ Found {} records on Dehashed:", total);
    let entries = data
        .get("entries")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for entry in entries.iter().take(DEHASHED_PREVIEW) {
        text.push_str(&format!(
            "\n- User: {}, Email: {}, Hash: {}",
            field(entry, &["username"]),
            field(entry, &["email"]),
            field(entry, &["hashed_password"]),
        ));
    }
    (text, Tag::Success)
}

/// AbstractAPI email validation
pub struct AbstractEmailLookup;

#[async_trait]
impl Lookup for AbstractEmailLookup {
    fn id(&self) -> &'static str {
        "email-abstractapi"
    }

    fn label(&self) -> &'static str {
        "AbstractAPI (Email)"
    }

    fn kind(&self) -> InputKind {
        InputKind::Email
    }

    async fn run(&self, ctx: &LookupContext, email: &str) -> Result<()> {
        let api_key = ctx.credential("abstractapi_email", "AbstractAPI (Email)")?;
        ctx.panel.plain(format!("\n[AbstractAPI] Validating address: {}...", email));

        let response = ctx
            .http
            .get(&ctx.config.endpoints.abstractapi_email)
            .query(&[("api_key", api_key.as_str()), ("email", email)])
            .send()
            .await?;
        let (status, body) = read_body(response).await?;

        if !status.is_success() {
            let detail = error_detail(&body, &["error", "message"], "Error");
            ctx.panel.write(
                format!("❌ AbstractAPI (Email) HTTP error {}: {}", status.as_u16(), detail),
                Tag::Error,
            );
            return Ok(());
        }

        let data: Value = serde_json::from_str(&body)?;
        ctx.panel.write(format_abstract_email(&data), Tag::Success);
        Ok(())
    }
}

pub fn format_abstract_email(data: &Value) -> String {
    format!(
        "✔️ Address: {}\nValid format: {}\nSMTP valid: {}\nDisposable: {}",
        field(data, &["email"]),
        field(data, &["is_valid_format", "value"]),
        field(data, &["is_smtp_valid", "value"]),
        field(data, &["is_disposable_email", "value"]),
    )
}
