// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Person search across engines, social networks and dorks

use async_trait::async_trait;
use tracing::info;

use super::{InputKind, Lookup, LookupContext};
use crate::panel::Tag;
use crate::probe::{self, ProbeStyle};
use crate::Result;

const RULE_WIDTH: usize = 50;

pub struct PersonSearch;

fn opening_banner(query: &str) -> String {
    format!(
        "\n[Person Search] Starting search for: \"{}\"\n{}",
        query,
        "=".repeat(RULE_WIDTH)
    )
}

fn closing_banner() -> String {
    format!(
        "\n{}\n✅ Searches launched. Click the links to review results; the status shows reachability only.",
        "=".repeat(RULE_WIDTH)
    )
}

#[async_trait]
impl Lookup for PersonSearch {
    fn id(&self) -> &'static str {
        "person-search"
    }

    fn label(&self) -> &'static str {
        "Web search"
    }

    fn kind(&self) -> InputKind {
        InputKind::Person
    }

    async fn run(&self, ctx: &LookupContext, query: &str) -> Result<()> {
        ctx.panel.write(opening_banner(query), Tag::Info);

        let launched = probe::launch(ctx, probe::person_targets(query), ProbeStyle::Search).await;
        info!("Launched {} person searches", launched);

        ctx.panel.write(closing_banner(), Tag::Info);
        Ok(())
    }
}
