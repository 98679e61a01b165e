//! Viewport-driven query/aggregate/filter state machine.
//!
//! The controller owns all session state (feature set, tag frequency,
//! selection) and is the only writer of it. It performs no I/O: a viewport
//! change yields a [`QueryTicket`] that the caller executes, and the result
//! comes back as [`Event::QueryCompleted`] carrying the ticket's sequence
//! number. Only the most recently issued sequence number is ever accepted.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, TagFrequency, TagList};
use crate::error::QueryError;
use crate::filter::markers_for;
use crate::models::{BoundingBox, FeatureSet, Marker, TagName, Viewport};
use crate::selection::SelectionState;

/// Monotonic query sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct QuerySeq(pub u64);

impl std::fmt::Display for QuerySeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Querying,
    Ready,
    QueryFailed,
}

/// Inputs to the controller.
#[derive(Debug, Clone)]
pub enum Event {
    /// The map finished a pan/zoom; bounds as reported by the widget
    ViewportChanged(Viewport),
    /// The user picked a tag in the tag list
    TagSelected(TagName),
    QueryCompleted {
        seq: QuerySeq,
        result: Result<FeatureSet, QueryError>,
    },
}

/// A query the caller must run against the feature source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryTicket {
    pub seq: QuerySeq,
    pub bbox: BoundingBox,
}

/// A failed query as reported to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFailure {
    pub seq: QuerySeq,
    pub message: String,
}

/// Rendering side of the map: marker layer, tag list and notifications.
pub trait ViewSink {
    /// Replace every marker on the map.
    fn show_markers(&mut self, markers: &[Marker]);

    /// Rebuild the tag list.
    fn show_tag_list(&mut self, list: &TagList);

    /// Restyle the tag list for a new selection without rebuilding it.
    fn highlight_tag(&mut self, tag: &TagName);

    /// Tell the user a query failed. Called once per failed query.
    fn notify_failure(&mut self, failure: &QueryFailure);

    fn phase_changed(&mut self, _phase: Phase) {}
}

pub struct ViewportController<V> {
    view: V,
    phase: Phase,
    /// Phase to fall back to if the pending query turns out to be a no-op
    settled: Phase,
    selection: SelectionState,
    features: FeatureSet,
    frequency: TagFrequency,
    /// Whether any query has been accepted yet
    loaded: bool,
    last_issued: u64,
    /// Latest issued query that has not resolved
    pending: Option<QuerySeq>,
}

impl<V: ViewSink> ViewportController<V> {
    pub fn new(view: V, initial_tag: TagName) -> Self {
        Self {
            view,
            phase: Phase::Idle,
            settled: Phase::Idle,
            selection: SelectionState::new(initial_tag),
            features: FeatureSet::default(),
            frequency: TagFrequency::default(),
            loaded: false,
            last_issued: 0,
            pending: None,
        }
    }

    /// Apply one event. Returns the query to issue, if any.
    pub fn dispatch(&mut self, event: Event) -> Option<QueryTicket> {
        match event {
            Event::ViewportChanged(viewport) => self.on_viewport_changed(&viewport),
            Event::TagSelected(tag) => {
                self.on_tag_selected(tag);
                None
            }
            Event::QueryCompleted { seq, result } => {
                self.on_query_completed(seq, result);
                None
            }
        }
    }

    fn on_viewport_changed(&mut self, viewport: &Viewport) -> Option<QueryTicket> {
        let bbox = match BoundingBox::from_viewport(viewport) {
            Ok(bbox) => bbox,
            Err(e) => {
                warn!("Ignoring malformed viewport {:?}: {}", viewport, e);
                return None;
            }
        };
        if bbox.is_degenerate() {
            debug!("Viewport {} has no area, not querying", bbox);
            // The user has left the view the in-flight query was for
            if let Some(superseded) = self.pending.take() {
                debug!("Query {} superseded by an empty viewport", superseded);
                self.set_phase(self.settled);
            }
            return None;
        }

        self.last_issued += 1;
        let seq = QuerySeq(self.last_issued);
        if let Some(superseded) = self.pending.replace(seq) {
            debug!("Query {} superseded by {}", superseded, seq);
        }

        info!("Issuing query {} for {}", seq, bbox);
        self.set_phase(Phase::Querying);
        Some(QueryTicket { seq, bbox })
    }

    fn on_query_completed(&mut self, seq: QuerySeq, result: Result<FeatureSet, QueryError>) {
        if self.pending != Some(seq) {
            debug!(
                "Discarding response to query {} (latest is #{})",
                seq, self.last_issued
            );
            return;
        }
        self.pending = None;

        match result {
            Ok(features) => {
                info!("Query {} returned {} features", seq, features.len());
                self.features = features;
                self.frequency = aggregate(&self.features);
                self.loaded = true;
                self.view
                    .show_tag_list(&self.frequency.to_tag_list(self.selection.get()));
                self.render_markers();
                self.settled = Phase::Ready;
                self.set_phase(Phase::Ready);
            }
            Err(QueryError::EmptyViewport) => {
                debug!("Query {} had nothing to fetch", seq);
                self.set_phase(self.settled);
            }
            Err(e) => {
                warn!("Query {} failed: {}", seq, e);
                self.view.notify_failure(&QueryFailure {
                    seq,
                    message: e.to_string(),
                });
                self.settled = Phase::QueryFailed;
                self.set_phase(Phase::QueryFailed);
            }
        }
    }

    fn on_tag_selected(&mut self, tag: TagName) {
        info!("Tag '{}' selected", tag);
        self.selection.select(tag);
        self.view.highlight_tag(self.selection.get());
        // Before the first accepted query there is nothing to filter
        if self.loaded {
            self.render_markers();
        }
    }

    fn render_markers(&mut self) {
        let markers = markers_for(&self.features, self.selection.get());
        debug!(
            "Showing {} markers for '{}'",
            markers.len(),
            self.selection.get()
        );
        self.view.show_markers(&markers);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            self.phase = phase;
            self.view.phase_changed(phase);
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selected(&self) -> &TagName {
        self.selection.get()
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn frequency(&self) -> &TagFrequency {
        &self.frequency
    }

    /// Markers for the current feature set and selection.
    pub fn markers(&self) -> Vec<Marker> {
        markers_for(&self.features, self.selection.get())
    }

    /// Sequence number of the query still awaited, if any.
    pub fn pending(&self) -> Option<QuerySeq> {
        self.pending
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }
}
