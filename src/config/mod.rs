// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for WicOsintX

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Flat key-value file holding API credentials
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Fan-out probe settings
    #[serde(default)]
    pub probes: ProbeConfig,

    /// Local executables
    #[serde(default)]
    pub tools: ToolConfig,

    /// Third-party service base URLs
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Web UI settings
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_shodan_timeout")]
    pub shodan_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProbeConfig {
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,
    #[serde(default = "default_profile_timeout")]
    pub profile_timeout_secs: u64,
    /// Delay between launching consecutive search probes
    #[serde(default = "default_stagger")]
    pub stagger_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ToolConfig {
    #[serde(default = "default_whois")]
    pub whois: String,
    #[serde(default = "default_exiftool")]
    pub exiftool: String,
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
    /// Program that opens URLs; the platform default when unset
    #[serde(default)]
    pub browser: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EndpointConfig {
    #[serde(default = "default_ipinfo")]
    pub ipinfo: String,
    #[serde(default = "default_abstract_ip")]
    pub abstractapi_ip: String,
    #[serde(default = "default_shodan")]
    pub shodan: String,
    #[serde(default = "default_censys")]
    pub censys: String,
    #[serde(default = "default_dehashed")]
    pub dehashed: String,
    #[serde(default = "default_abstract_email")]
    pub abstractapi_email: String,
    #[serde(default = "default_veriphone")]
    pub veriphone: String,
    #[serde(default = "default_abstract_phone")]
    pub abstractapi_phone: String,
    #[serde(default = "default_reverse_image")]
    pub reverse_image: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

// Default value functions
fn default_credentials_path() -> String { "apis.json".to_string() }
fn default_timeout() -> u64 { 10 }
fn default_shodan_timeout() -> u64 { 15 }
fn default_user_agent() -> String { format!("wicosintx/{}", env!("CARGO_PKG_VERSION")) }
fn default_search_timeout() -> u64 { 10 }
fn default_profile_timeout() -> u64 { 7 }
fn default_stagger() -> u64 { 100 }
fn default_whois() -> String { "whois".to_string() }
fn default_exiftool() -> String { "exiftool".to_string() }
fn default_tool_timeout() -> u64 { 30 }
fn default_ipinfo() -> String { "https://ipinfo.io".to_string() }
fn default_abstract_ip() -> String { "https://ipgeolocation.abstractapi.com/v1/".to_string() }
fn default_shodan() -> String { "https://api.shodan.io".to_string() }
fn default_censys() -> String { "https://search.censys.io/api".to_string() }
fn default_dehashed() -> String { "https://api.dehashed.com".to_string() }
fn default_abstract_email() -> String { "https://emailvalidation.abstractapi.com/v1/".to_string() }
fn default_veriphone() -> String { "https://api.veriphone.io/v2/verify".to_string() }
fn default_abstract_phone() -> String { "https://phonevalidation.abstractapi.com/v1/".to_string() }
fn default_reverse_image() -> String { "https://images.google.com/".to_string() }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8080 }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            http: HttpConfig::default(),
            probes: ProbeConfig::default(),
            tools: ToolConfig::default(),
            endpoints: EndpointConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            shodan_timeout_secs: default_shodan_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: default_search_timeout(),
            profile_timeout_secs: default_profile_timeout(),
            stagger_ms: default_stagger(),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            whois: default_whois(),
            exiftool: default_exiftool(),
            timeout_secs: default_tool_timeout(),
            browser: None,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            ipinfo: default_ipinfo(),
            abstractapi_ip: default_abstract_ip(),
            shodan: default_shodan(),
            censys: default_censys(),
            dehashed: default_dehashed(),
            abstractapi_email: default_abstract_email(),
            veriphone: default_veriphone(),
            abstractapi_phone: default_abstract_phone(),
            reverse_image: default_reverse_image(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn shodan_timeout(&self) -> Duration {
        Duration::from_secs(self.shodan_timeout_secs)
    }
}

impl ProbeConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn profile_timeout(&self) -> Duration {
        Duration::from_secs(self.profile_timeout_secs)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

impl ToolConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::WicError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Address the web UI binds to
    pub fn web_addr(&self) -> String {
        format!("{}:{}", self.web.host, self.web.port)
    }
}
