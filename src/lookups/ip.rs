// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! IP address lookups: ipinfo.io, AbstractAPI, Shodan, Censys

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::{error_detail, field, read_body, InputKind, Lookup, LookupContext, NA};
use crate::panel::Tag;
use crate::Result;

/// Free ipinfo.io lookup, no key required
pub struct IpInfoLookup;

#[async_trait]
impl Lookup for IpInfoLookup {
    fn id(&self) -> &'static str {
        "ip-ipinfo"
    }

    fn label(&self) -> &'static str {
        "ipinfo.io"
    }

    fn kind(&self) -> InputKind {
        InputKind::Ip
    }

    async fn run(&self, ctx: &LookupContext, ip: &str) -> Result<()> {
        ctx.panel.plain(format!("\n[ipinfo.io] Looking up {}...", ip));

        let url = format!("{}/{}/json", ctx.config.endpoints.ipinfo.trim_end_matches('/'), ip);
        let (status, body) = read_body(ctx.http.get(&url).send().await?).await?;

        if !status.is_success() {
            ctx.panel.write(format!("❌ HTTP error {}: {}", status.as_u16(), body), Tag::Error);
            return Ok(());
        }

        let data: Value = serde_json::from_str(&body)?;
        ctx.panel.write(format_ipinfo(&data), Tag::Success);
        Ok(())
    }
}

pub fn format_ipinfo(data: &Value) -> String {
    format!(
        "IP: {}\nHostname: {}\nCity: {}\nRegion: {}\nCountry: {}\nLocation: {}\nOrganization: {}\nASN: {}",
        field(data, &["ip"]),
        field(data, &["hostname"]),
        field(data, &["city"]),
        field(data, &["region"]),
        field(data, &["country"]),
        field(data, &["loc"]),
        field(data, &["org"]),
        field(data, &["asn", "asn"]),
    )
}

/// AbstractAPI IP geolocation
pub struct AbstractIpLookup;

#[async_trait]
impl Lookup for AbstractIpLookup {
    fn id(&self) -> &'static str {
        "ip-abstractapi"
    }

    fn label(&self) -> &'static str {
        "AbstractAPI (IP)"
    }

    fn kind(&self) -> InputKind {
        InputKind::Ip
    }

    async fn run(&self, ctx: &LookupContext, ip: &str) -> Result<()> {
        let api_key = ctx.credential("abstractapi_ip", "AbstractAPI (IP)")?;
        ctx.panel.plain(format!("\n[AbstractAPI] Geolocating IP: {}...", ip));

        let response = ctx
            .http
            .get(&ctx.config.endpoints.abstractapi_ip)
            .query(&[("api_key", api_key.as_str()), ("ip_address", ip)])
            .send()
            .await?;
        let (status, body) = read_body(response).await?;

        if !status.is_success() {
            ctx.panel.write(format!("❌ HTTP error {}: {}", status.as_u16(), body), Tag::Error);
            return Ok(());
        }

        let data: Value = serde_json::from_str(&body)?;
        ctx.panel.write(format_abstract_ip(&data), Tag::Success);
        Ok(())
    }
}

pub fn format_abstract_ip(data: &Value) -> String {
    format!(
        "IP: {}\nCountry: {} ({})\nRegion: {}, City: {}\nLocation: {}, {}\nISP: {}",
        field(data, &["ip_address"]),
        field(data, &["country"]),
        field(data, &["country_code"]),
        field(data, &["region"]),
        field(data, &["city"]),
        field(data, &["latitude"]),
        field(data, &["longitude"]),
        field(data, &["connection", "isp_name"]),
    )
}

/// Shodan host information
pub struct ShodanLookup;

#[async_trait]
impl Lookup for ShodanLookup {
    fn id(&self) -> &'static str {
        "ip-shodan"
    }

    fn label(&self) -> &'static str {
        "Shodan"
    }

    fn kind(&self) -> InputKind {
        InputKind::Ip
    }

    async fn run(&self, ctx: &LookupContext, ip: &str) -> Result<()> {
        let api_key = ctx.credential("shodan", "Shodan")?;
        ctx.panel.plain(format!("\n[Shodan] Looking up {}...", ip));

        let url = format!(
            "{}/shodan/host/{}",
            ctx.config.endpoints.shodan.trim_end_matches('/'),
            ip
        );
        let response = ctx
            .http
            .get(&url)
            .query(&[("key", api_key.as_str())])
            .timeout(ctx.config.http.shodan_timeout())
            .send()
            .await?;
        let (status, body) = read_body(response).await?;

        if !status.is_success() {
            let detail = error_detail(&body, &["error"], &body);
            ctx.panel.write(
                format!("❌ Shodan HTTP error {}: {}", status.as_u16(), detail),
                Tag::Error,
            );
            return Ok(());
        }

        let data: Value = serde_json::from_str(&body)?;
        ctx.panel.write(format_shodan(&data), Tag::Success);
        Ok(())
    }
}

pub fn format_shodan(data: &Value) -> String {
    format!(
        "IP: {}\nOrganization: {}\nISP: {}\nCountry: {}\nHostnames: {}\nOpen ports: {}",
        field(data, &["ip_str"]),
        field(data, &["org"]),
        field(data, &["isp"]),
        field(data, &["country_name"]),
        field(data, &["hostnames"]),
        field(data, &["ports"]),
    )
}

/// Censys host view (v2 API, UID/secret basic auth)
pub struct CensysLookup;

#[async_trait]
impl Lookup for CensysLookup {
    fn id(&self) -> &'static str {
        "ip-censys"
    }

    fn label(&self) -> &'static str {
        "Censys"
    }

    fn kind(&self) -> InputKind {
        InputKind::Ip
    }

    async fn run(&self, ctx: &LookupContext, ip: &str) -> Result<()> {
        let uid = ctx.credential("censys_uid", "Censys (UID/secret)")?;
        let secret = ctx.credential("censys_secret", "Censys (UID/secret)")?;
        ctx.panel.plain(format!("\n[Censys] Looking up {}...", ip));

        let url = format!(
            "{}/v2/hosts/{}",
            ctx.config.endpoints.censys.trim_end_matches('/'),
            ip
        );
        let response = ctx
            .http
            .get(&url)
            .basic_auth(uid, Some(secret))
            .send()
            .await?;
        let (status, body) = read_body(response).await?;

        if !status.is_success() {
            let detail = error_detail(&body, &["error"], &body);
            ctx.panel.write(
                format!("❌ Censys HTTP error {}: {}", status.as_u16(), detail),
                Tag::Error,
            );
            return Ok(());
        }

        let data: Value = serde_json::from_str(&body)?;
        let result = data.get("result").unwrap_or(&Value::Null);
        let services = result.get("services").and_then(Value::as_array).map_or(0, Vec::len);
        info!("Censys returned {} services", services);
        ctx.panel.write(format_censys(result), Tag::Success);
        Ok(())
    }
}

pub fn format_censys(result: &Value) -> String {
    let services = result
        .get("services")
        .and_then(Value::as_array)
        .map(|services| {
            services
                .iter()
                .map(|s| format!("{}/{}", field(s, &["port"]), field(s, &["service_name"])))
                .collect::<Vec<_>>()
        })
        .filter(|s| !s.is_empty())
        .map(|s| s.join(", "))
        .unwrap_or_else(|| NA.to_string());

    format!(
        "IP: {}\nCountry: {}\nCity: {}\nAS: {} (AS{})\nServices: {}\nLast updated: {}",
        field(result, &["ip"]),
        field(result, &["location", "country"]),
        field(result, &["location", "city"]),
        field(result, &["autonomous_system", "name"]),
        field(result, &["autonomous_system", "asn"]),
        services,
        field(result, &["last_updated_at"]),
    )
}
