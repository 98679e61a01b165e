//! Single-task event loop driving a [`ViewportController`].

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::controller::{Event, QueryTicket, ViewSink, ViewportController};
use crate::overpass::FeatureSource;

/// Run one session until `events` is closed and every in-flight query has
/// resolved, then hand back the controller.
///
/// UI events and query completions are applied one at a time from this
/// task. Queries run concurrently; a superseded query is left to finish and
/// its result is dropped by the controller.
pub async fn run_session<S, V>(
    source: S,
    mut controller: ViewportController<V>,
    mut events: mpsc::Receiver<Event>,
) -> ViewportController<V>
where
    S: FeatureSource,
    V: ViewSink,
{
    let source = &source;
    let mut in_flight = FuturesUnordered::new();
    let mut open = true;

    let issue = move |ticket: QueryTicket| async move {
        let result = source.fetch_features(&ticket.bbox).await;
        (ticket.seq, result)
    };

    info!("Session started");
    loop {
        tokio::select! {
            event = events.recv(), if open => match event {
                Some(event) => {
                    if let Some(ticket) = controller.dispatch(event) {
                        in_flight.push(issue(ticket));
                    }
                }
                None => {
                    debug!("Event channel closed, {} queries in flight", in_flight.len());
                    open = false;
                }
            },
            Some((seq, result)) = in_flight.next(), if !in_flight.is_empty() => {
                controller.dispatch(Event::QueryCompleted { seq, result });
            }
            else => break,
        }
    }

    info!("Session ended");
    controller
}
