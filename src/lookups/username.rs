// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Username presence on social networks

use async_trait::async_trait;
use tracing::info;

use super::{InputKind, Lookup, LookupContext};
use crate::probe::{self, ProbeStyle};
use crate::Result;

pub struct UsernamePresence;

#[async_trait]
impl Lookup for UsernamePresence {
    fn id(&self) -> &'static str {
        "username-presence"
    }

    fn label(&self) -> &'static str {
        "Social profiles"
    }

    fn kind(&self) -> InputKind {
        InputKind::Username
    }

    async fn run(&self, ctx: &LookupContext, username: &str) -> Result<()> {
        ctx.panel
            .plain(format!("\n[Username] Searching online presence for: {}", username));

        let launched =
            probe::launch(ctx, probe::username_targets(username), ProbeStyle::Profile).await;
        info!("Checking {} profiles for {}", launched, username);
        Ok(())
    }
}
