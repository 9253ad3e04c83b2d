// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Shared results panel and link table
//!
//! Lookups append status lines here; presentation surfaces (web UI, CLI)
//! subscribe to the event stream. A line that carries a link registers a
//! `link-N` tag in the link table so the rendered line can be clicked later.
//! The table is only ever emptied as a whole, by [`ResultsPanel::clear`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const EVENT_CAPACITY: usize = 1024;

/// Display style of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Success,
    NotFound,
    Info,
    Error,
    Pending,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Success => "success",
            Tag::NotFound => "not_found",
            Tag::Info => "info",
            Tag::Error => "error",
            Tag::Pending => "pending",
        }
    }
}

/// A single printed line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub id: u64,
    pub text: String,
    pub tag: Option<Tag>,
    /// Link-table key when the line is clickable
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Change notifications for subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PanelEvent {
    Line(Line),
    Cleared,
}

#[derive(Default)]
struct PanelState {
    lines: Vec<Line>,
    links: HashMap<String, String>,
    next_line: u64,
    next_link: u64,
}

/// Append-only display buffer shared by every lookup (cheap to clone)
#[derive(Clone)]
pub struct ResultsPanel {
    state: Arc<Mutex<PanelState>>,
    events: broadcast::Sender<PanelEvent>,
}

impl ResultsPanel {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(PanelState::default())),
            events,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PanelState> {
        // A panic while holding the lock cannot leave the buffer half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, text: String, tag: Option<Tag>, url: Option<&str>) -> Line {
        let line = {
            let mut state = self.lock_state();

            let link = url.map(|url| {
                let key = format!("link-{}", state.next_link);
                state.next_link += 1;
                state.links.insert(key.clone(), url.to_string());
                key
            });

            let line = Line {
                id: state.next_line,
                text: text.trim_end_matches('\n').to_string(),
                tag,
                link,
                created_at: Utc::now(),
            };
            state.next_line += 1;
            state.lines.push(line.clone());
            line
        };

        // No subscribers is fine
        let _ = self.events.send(PanelEvent::Line(line.clone()));
        line
    }

    /// Append an untagged line
    pub fn plain(&self, text: impl Into<String>) -> Line {
        self.push(text.into(), None, None)
    }

    /// Append a styled line
    pub fn write(&self, text: impl Into<String>, tag: Tag) -> Line {
        self.push(text.into(), Some(tag), None)
    }

    /// Append a clickable line and return its link tag
    pub fn write_link(&self, text: impl Into<String>, tag: Tag, url: &str) -> String {
        let line = self.push(text.into(), Some(tag), Some(url));
        line.link.unwrap_or_default()
    }

    /// URL behind a link tag
    pub fn resolve(&self, link: &str) -> Option<String> {
        self.lock_state().links.get(link).cloned()
    }

    /// Drop every line and the whole link table
    pub fn clear(&self) {
        {
            let mut state = self.lock_state();
            state.lines.clear();
            state.links.clear();
        }
        let _ = self.events.send(PanelEvent::Cleared);
    }

    pub fn snapshot(&self) -> Vec<Line> {
        self.lock_state().lines.clone()
    }

    pub fn len(&self) -> usize {
        self.lock_state().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn link_count(&self) -> usize {
        self.lock_state().links.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.events.subscribe()
    }

    /// Current lines plus a feed of everything written after them
    pub fn follow(&self) -> (Vec<Line>, PanelFeed) {
        // A line written between these two calls lands in both; the feed skips it
        let events = self.subscribe();
        let lines = self.snapshot();
        let feed = PanelFeed::new(events, &lines);
        (lines, feed)
    }
}

/// Event stream that resumes after a snapshot
///
/// Line ids only grow (clearing does not reset them), so any line at or
/// below the last snapshot id has already been delivered.
pub struct PanelFeed {
    events: broadcast::Receiver<PanelEvent>,
    delivered_up_to: Option<u64>,
}

impl PanelFeed {
    fn new(events: broadcast::Receiver<PanelEvent>, snapshot: &[Line]) -> Self {
        Self {
            events,
            delivered_up_to: snapshot.iter().map(|line| line.id).max(),
        }
    }

    pub async fn recv(&mut self) -> Result<PanelEvent, RecvError> {
        loop {
            let event = self.events.recv().await?;
            if let PanelEvent::Line(line) = &event {
                if self.delivered_up_to.is_some_and(|last| line.id <= last) {
                    continue;
                }
            }
            return Ok(event);
        }
    }
}

impl Default for ResultsPanel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_keep_order_and_strip_trailing_newline() {
        let panel = ResultsPanel::new();
        panel.plain("\n[ipinfo.io] Looking up 1.1.1.1...\n");
        panel.write("IP: 1.1.1.1\n", Tag::Success);

        let lines = panel.snapshot();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "\n[ipinfo.io] Looking up 1.1.1.1...");
        assert_eq!(lines[0].tag, None);
        assert_eq!(lines[1].tag, Some(Tag::Success));
        assert!(lines[0].id < lines[1].id);
    }

    #[test]
    fn links_resolve_until_cleared() {
        let panel = ResultsPanel::new();
        let a = panel.write_link("GitHub", Tag::Success, "https://github.com/octocat");
        let b = panel.write_link("Reddit", Tag::Info, "https://www.reddit.com/user/octocat");

        assert_ne!(a, b);
        assert_eq!(panel.resolve(&a).as_deref(), Some("https://github.com/octocat"));
        assert_eq!(panel.link_count(), 2);

        panel.clear();
        assert!(panel.is_empty());
        assert_eq!(panel.resolve(&a), None);
        assert_eq!(panel.link_count(), 0);
    }

    #[test]
    fn link_tags_are_not_reused_after_clear() {
        let panel = ResultsPanel::new();
        let first = panel.write_link("one", Tag::Success, "https://a.example");
        panel.clear();
        let second = panel.write_link("two", Tag::Success, "https://b.example");

        assert_ne!(first, second);
        assert_eq!(panel.resolve(&first), None);
    }

    #[tokio::test]
    async fn subscribers_see_lines_and_clear() {
        let panel = ResultsPanel::new();
        let mut rx = panel.subscribe();

        panel.write("hello", Tag::Info);
        panel.clear();

        match rx.recv().await.unwrap() {
            PanelEvent::Line(line) => assert_eq!(line.text, "hello"),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(rx.recv().await.unwrap(), PanelEvent::Cleared));
    }

    #[tokio::test]
    async fn feed_skips_lines_already_in_snapshot() {
        let panel = ResultsPanel::new();

        // Reproduce the window between subscribing and snapshotting
        let events = panel.subscribe();
        panel.write("written in between", Tag::Pending);
        let lines = panel.snapshot();
        let mut feed = PanelFeed::new(events, &lines);
        assert_eq!(lines.len(), 1);

        panel.write("after", Tag::Success);
        match feed.recv().await.unwrap() {
            PanelEvent::Line(line) => assert_eq!(line.text, "after"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn feed_passes_clear_and_later_lines() {
        let panel = ResultsPanel::new();
        panel.write("old", Tag::Info);
        let (lines, mut feed) = panel.follow();
        assert_eq!(lines.len(), 1);

        panel.clear();
        panel.write("fresh", Tag::Info);

        assert!(matches!(feed.recv().await.unwrap(), PanelEvent::Cleared));
        match feed.recv().await.unwrap() {
            PanelEvent::Line(line) => assert_eq!(line.text, "fresh"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn follow_never_repeats_snapshot_lines_under_load() {
        let panel = ResultsPanel::new();
        let writer = {
            let panel = panel.clone();
            tokio::spawn(async move {
                for i in 0..5000 {
                    panel.plain(format!("line {}", i));
                    if i % 16 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        };

        for _ in 0..50 {
            let (lines, mut feed) = panel.follow();
            let in_snapshot: std::collections::HashSet<u64> = lines.iter().map(|l| l.id).collect();
            let marker = panel.plain("marker").id;

            loop {
                let next = tokio::time::timeout(std::time::Duration::from_secs(5), feed.recv()).await;
                match next {
                    Ok(Ok(PanelEvent::Line(line))) => {
                        assert!(!in_snapshot.contains(&line.id), "line {} delivered twice", line.id);
                        if line.id >= marker {
                            break;
                        }
                    }
                    Ok(Ok(PanelEvent::Cleared)) | Ok(Err(RecvError::Lagged(_))) => {}
                    Ok(Err(RecvError::Closed)) | Err(_) => break,
                }
            }
        }

        writer.await.unwrap();
    }

    #[test]
    fn event_json_shape() {
        let panel = ResultsPanel::new();
        let line = panel.write("x", Tag::NotFound);
        let json = serde_json::to_value(PanelEvent::Line(line)).unwrap();
        assert_eq!(json["event"], "line");
        assert_eq!(json["tag"], "not_found");
        assert_eq!(serde_json::to_value(PanelEvent::Cleared).unwrap()["event"], "cleared");
    }
}
