//! Publishes what the session renders so HTTP handlers can read it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use tagscope::aggregate::{TagList, TagListEntry};
use tagscope::controller::{Phase, QueryFailure, ViewSink};
use tagscope::models::{Marker, TagName};

/// Everything a map page needs to draw the current state
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub selected_tag: TagName,
    pub tags: Vec<TagListEntry>,
    pub markers: Vec<Marker>,
    /// Most recent failure; a new `seq` means a new notification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<QueryFailure>,
    pub updated_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(selected_tag: TagName) -> Self {
        Self {
            phase: Phase::Idle,
            selected_tag,
            tags: Vec::new(),
            markers: Vec::new(),
            last_failure: None,
            updated_at: Utc::now(),
        }
    }
}

/// [`ViewSink`] backed by a watch channel. The session task is the only
/// writer; handlers hold receivers.
pub struct WatchView {
    current: Snapshot,
    tx: watch::Sender<Snapshot>,
}

impl WatchView {
    pub fn new(selected_tag: TagName) -> (Self, watch::Receiver<Snapshot>) {
        let current = Snapshot::new(selected_tag);
        let (tx, rx) = watch::channel(current.clone());
        (Self { current, tx }, rx)
    }

    fn publish(&mut self) {
        self.current.updated_at = Utc::now();
        self.tx.send_replace(self.current.clone());
    }
}

impl ViewSink for WatchView {
    fn show_markers(&mut self, markers: &[Marker]) {
        self.current.markers = markers.to_vec();
        self.publish();
    }

    fn show_tag_list(&mut self, list: &TagList) {
        self.current.selected_tag = list.selected.clone();
        self.current.tags = list.entries.clone();
        self.publish();
    }

    fn highlight_tag(&mut self, tag: &TagName) {
        self.current.selected_tag = tag.clone();
        for entry in &mut self.current.tags {
            entry.selected = &entry.tag == tag;
        }
        self.publish();
    }

    fn notify_failure(&mut self, failure: &QueryFailure) {
        self.current.last_failure = Some(failure.clone());
        self.publish();
    }

    fn phase_changed(&mut self, phase: Phase) {
        self.current.phase = phase;
        self.publish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagscope::controller::QuerySeq;

    fn entry(tag: &str, count: usize, selected: bool) -> TagListEntry {
        TagListEntry {
            tag: TagName::new(tag).unwrap(),
            count,
            selected,
            bar_fraction: 1.0,
        }
    }

    #[test]
    fn test_highlight_restyles_entries() {
        let (mut view, rx) = WatchView::new(TagName::default());
        view.show_tag_list(&TagList {
            selected: TagName::default(),
            entries: vec![entry("name", 3, true), entry("cuisine", 1, false)],
        });

        view.highlight_tag(&TagName::new("cuisine").unwrap());

        let snap = rx.borrow();
        assert_eq!(snap.selected_tag.as_str(), "cuisine");
        assert!(!snap.tags[0].selected);
        assert!(snap.tags[1].selected);
    }

    #[test]
    fn test_failure_published() {
        let (mut view, rx) = WatchView::new(TagName::default());
        view.notify_failure(&QueryFailure {
            seq: QuerySeq(4),
            message: "transport failure: timeout".to_string(),
        });
        assert_eq!(
            rx.borrow().last_failure.as_ref().map(|f| f.seq),
            Some(QuerySeq(4))
        );
    }
}
