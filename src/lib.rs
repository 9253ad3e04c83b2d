// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! WicOsintX: OSINT lookup dispatcher
//!
//! Sends a person name, IP, domain, email, username, phone number or image
//! to a fixed set of web services and local tools, and collects one status
//! line per service in a shared results panel with clickable links.

pub mod browser;
pub mod config;
pub mod credentials;
pub mod error;
pub mod lookups;
pub mod panel;
pub mod probe;
pub mod tools;
pub mod web;

pub use config::AppConfig;
pub use error::{Result, WicError};
