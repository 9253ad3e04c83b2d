// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Image lookups: EXIF extraction and reverse image search

use async_trait::async_trait;
use tracing::warn;

use super::{InputKind, Lookup, LookupContext};
use crate::browser::open_url;
use crate::panel::Tag;
use crate::tools::{self, ToolFailure};
use crate::Result;

/// Metadata extraction through the local `exiftool`
pub struct ExifLookup;

#[async_trait]
impl Lookup for ExifLookup {
    fn id(&self) -> &'static str {
        "image-exif"
    }

    fn label(&self) -> &'static str {
        "EXIF metadata"
    }

    fn kind(&self) -> InputKind {
        InputKind::Image
    }

    async fn run(&self, ctx: &LookupContext, path: &str) -> Result<()> {
        ctx.panel.plain(format!("\n[EXIF] Analyzing file: {}", path));

        let exiftool = &ctx.config.tools.exiftool;
        let operand = tools::guard_operand(path);
        match tools::capture(exiftool, &[operand.as_str()], ctx.config.tools.timeout()).await {
            Ok(output) if output.is_empty() => {
                ctx.panel.write("❌ Could not extract metadata.", Tag::NotFound);
            }
            Ok(output) => {
                ctx.panel.write(output, Tag::Success);
            }
            Err(ToolFailure::NotFound) => {
                ctx.panel.write(
                    format!(
                        "❌ Error: '{}' not found. Install it to read image metadata.",
                        exiftool
                    ),
                    Tag::Error,
                );
            }
            Err(ToolFailure::TimedOut(after)) => {
                ctx.panel.write(
                    format!("❌ Metadata extraction timed out after {}s.", after.as_secs()),
                    Tag::Error,
                );
            }
            Err(ToolFailure::Io(e)) => {
                ctx.panel.write(format!("❌ Unexpected error: {}", e), Tag::Error);
            }
        }
        Ok(())
    }
}

/// Hands the user over to Google Images
pub struct ReverseImageLookup;

#[async_trait]
impl Lookup for ReverseImageLookup {
    fn id(&self) -> &'static str {
        "image-reverse"
    }

    fn label(&self) -> &'static str {
        "Reverse image search"
    }

    fn kind(&self) -> InputKind {
        InputKind::Image
    }

    fn needs_input(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &LookupContext, _input: &str) -> Result<()> {
        let url = &ctx.config.endpoints.reverse_image;
        ctx.panel.plain("\n[Reverse search] Opening Google Images...");

        if ctx.open_links {
            if let Err(e) = open_url(ctx.config.tools.browser.as_deref(), url) {
                warn!("Could not open browser: {}", e);
                ctx.panel
                    .write(format!("❌ Could not open browser: {}", e), Tag::Error);
            }
        }

        ctx.panel.write_link(
            "🔍 Google Images is ready. Drag an image into the search box.",
            Tag::Info,
            url,
        );
        Ok(())
    }
}
