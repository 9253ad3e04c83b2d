// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Phone number validation: Veriphone and AbstractAPI

use async_trait::async_trait;
use serde_json::Value;

use super::{field, first_field, read_body, InputKind, Lookup, LookupContext};
use crate::panel::Tag;
use crate::Result;

/// Veriphone number verification
pub struct VeriphoneLookup;

#[async_trait]
impl Lookup for VeriphoneLookup {
    fn id(&self) -> &'static str {
        "phone-veriphone"
    }

    fn label(&self) -> &'static str {
        "Veriphone"
    }

    fn kind(&self) -> InputKind {
        InputKind::Phone
    }

    async fn run(&self, ctx: &LookupContext, phone: &str) -> Result<()> {
        let api_key = ctx.credential("veriphone", "Veriphone")?;
        ctx.panel.plain(format!("\n[Veriphone] Validating number: {}...", phone));

        let response = ctx
            .http
            .get(&ctx.config.endpoints.veriphone)
            .query(&[("phone", phone), ("key", api_key.as_str())])
            .send()
            .await?;
        // Veriphone reports problems in the body, whatever the status
        let (_, body) = read_body(response).await?;
        let data: Value = serde_json::from_str(&body)?;

        let (text, tag) = format_veriphone(&data);
        ctx.panel.write(text, tag);
        Ok(())
    }
}

pub fn format_veriphone(data: &Value) -> (String, Tag) {
    let valid = data.get("phone_valid").and_then(Value::as_bool).unwrap_or(false);
    if !valid {
        return (
            format!("❌ Invalid number. Message: {}", field(data, &["error"])),
            Tag::NotFound,
        );
    }

    (
        format!(
            "✔️ Valid number: {}\nCountry: {}\nCarrier: {}\nLine type: {}",
            field(data, &["international_number"]),
            field(data, &["country"]),
            field(data, &["carrier"]),
            field(data, &["phone_type"]),
        ),
        Tag::Success,
    )
}

/// AbstractAPI phone validation
pub struct AbstractPhoneLookup;

#[async_trait]
impl Lookup for AbstractPhoneLookup {
    fn id(&self) -> &'static str {
        "phone-abstractapi"
    }

    fn label(&self) -> &'static str {
        "AbstractAPI (Phone)"
    }

    fn kind(&self) -> InputKind {
        InputKind::Phone
    }

    async fn run(&self, ctx: &LookupContext, phone: &str) -> Result<()> {
        let api_key = ctx.credential("abstractapi", "AbstractAPI (Phone)")?;
        ctx.panel.plain(format!("\n[AbstractAPI] Validating number: {}...", phone));

        let response = ctx
            .http
            .get(&ctx.config.endpoints.abstractapi_phone)
            .query(&[("api_key", api_key.as_str()), ("phone", phone)])
            .send()
            .await?;
        let (_, body) = read_body(response).await?;
        let data: Value = serde_json::from_str(&body)?;

        let (text, tag) = format_abstract_phone(&data);
        ctx.panel.write(text, tag);
        Ok(())
    }
}

pub fn format_abstract_phone(data: &Value) -> (String, Tag) {
    let valid = data.get("valid").and_then(Value::as_bool).unwrap_or(false);
    if !valid {
        return (
            format!("❌ Invalid number. Message: {}", field(data, &["error", "message"])),
            Tag::NotFound,
        );
    }

    (
        format!(
            "✔️ Valid number: {}\nCountry: {}\nCarrier: {}",
            first_field(data, &[&["international_format"], &["format", "international"]]),
            field(data, &["country", "name"]),
            field(data, &["carrier"]),
        ),
        Tag::Success,
    )
}
