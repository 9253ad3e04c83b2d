// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for WicOsintX

use thiserror::Error;

/// Result type alias for WicOsintX operations
pub type Result<T> = std::result::Result<T, WicError>;

/// WicOsintX error types
#[derive(Error, Debug)]
pub enum WicError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No API key configured for {service}")]
    MissingCredential { service: String },

    #[error("Input is empty")]
    EmptyInput,

    #[error("Unknown lookup: {0}")]
    UnknownLookup(String),

    #[error("{tool}: {message}")]
    Tool { tool: String, message: String },

    #[error("Web server error: {0}")]
    Web(String),
}
