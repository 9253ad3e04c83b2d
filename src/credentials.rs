// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Flat key-value credential file
//!
//! Credentials live in a plain JSON object mapping a service key to its
//! secret. There is no versioning and no validation: whatever the user
//! types in the API keys form is stored as-is.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Result, WicError};

/// Keys offered by the API keys form, in display order
pub const KNOWN_KEYS: &[&str] = &[
    "veriphone",
    "abstractapi",
    "shodan",
    "dehashed_user",
    "dehashed_pass",
    "abstractapi_email",
    "abstractapi_ip",
    "censys_uid",
    "censys_secret",
];

/// Credential store backed by a JSON file
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl CredentialStore {
    /// Load the store, creating an empty `{}` file when none exists
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, "{}")?;
            tracing::info!("Created empty credentials file at {:?}", path);
        }

        let content = fs::read_to_string(&path)?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&content).map_err(|e| {
            WicError::Config(format!("Failed to parse credentials file {:?}: {}", path, e))
        })?;

        Ok(Self { path, entries })
    }

    /// In-memory store that is never written (for tests and one-off runs)
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            path: PathBuf::new(),
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Write the store back with four-space indentation
    pub fn save(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(WicError::Config(
                "Credential store has no backing file".to_string(),
            ));
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.entries.serialize(&mut ser)?;
        fs::write(&self.path, buf)?;

        tracing::debug!("Saved {} credentials to {:?}", self.entries.len(), self.path);
        Ok(())
    }

    /// Look up a credential; an empty value counts as missing
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    /// Remove a credential, returning whether it was present
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Every stored key, known or not
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored value with everything but the last four characters hidden
    pub fn masked(&self, key: &str) -> Option<String> {
        self.get(key).map(mask)
    }
}

/// Hide a secret for display
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
