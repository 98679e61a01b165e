//! Explorer server.
//!
//! Runs one tag-exploration session and exposes it over HTTP so a browser
//! map page can report view changes and tag clicks and poll for the
//! markers and tag list to draw.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tagscope::config::Config;
use tagscope::controller::{Event, ViewportController};
use tagscope::models::{BoundingBox, TagName, Viewport};
use tagscope::overpass::OverpassClient;
use tagscope::session::run_session;

mod snapshot;
use snapshot::{Snapshot, WatchView};

#[derive(Parser, Debug)]
#[command(name = "explorer")]
#[command(about = "Explore OpenStreetMap tags in the visible map area")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides the config file)
    #[arg(short, long)]
    listen: Option<String>,
}

/// Application state shared across handlers
struct AppState {
    events: mpsc::Sender<Event>,
    snapshot: watch::Receiver<Snapshot>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }

    info!("Tagscope Explorer");

    let client = OverpassClient::new(&config.overpass)?;
    let default_tag = config.default_tag()?;
    let (view, snapshot) = WatchView::new(default_tag.clone());
    let controller = ViewportController::new(view, default_tag);

    let (events_tx, events_rx) = mpsc::channel(config.session.event_buffer);

    if let Some(initial) = &config.session.initial_view {
        info!(
            "Initial view ({}, {}) at zoom {}",
            initial.center_lat, initial.center_lon, initial.zoom
        );
        events_tx
            .send(Event::ViewportChanged(initial.viewport()))
            .await
            .context("Session closed before initial load")?;
    }

    let session = tokio::spawn(run_session(client, controller, events_rx));

    let state = Arc::new(AppState {
        events: events_tx,
        snapshot,
    });

    let app = router(state);

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the router closed the event channel; let queries drain
    let controller = session.await.context("Session task panicked")?;
    info!(
        "Session finished in phase {:?} with {} features",
        controller.phase(),
        controller.features().len()
    );

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/state", get(state_handler))
        .route("/v1/view", post(view_handler))
        .route("/v1/tag", post(tag_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let session = !state.events.is_closed();
    Json(HealthResponse {
        status: if session { "ok" } else { "degraded" },
        session,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    session: bool,
}

/// Current markers, tag list and phase
async fn state_handler(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.snapshot.borrow().clone())
}

/// The map finished panning or zooming
async fn view_handler(
    State(state): State<Arc<AppState>>,
    Json(viewport): Json<Viewport>,
) -> Result<StatusCode, (StatusCode, String)> {
    // Reject here so the client learns about it; the controller would only log
    BoundingBox::from_viewport(&viewport)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    submit(&state, Event::ViewportChanged(viewport)).await
}

#[derive(Deserialize)]
struct TagSelection {
    tag: String,
}

/// A tag was clicked in the tag list
async fn tag_handler(
    State(state): State<Arc<AppState>>,
    Json(selection): Json<TagSelection>,
) -> Result<StatusCode, (StatusCode, String)> {
    let tag =
        TagName::new(selection.tag).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    submit(&state, Event::TagSelected(tag)).await
}

async fn submit(state: &AppState, event: Event) -> Result<StatusCode, (StatusCode, String)> {
    state.events.send(event).await.map_err(|_| {
        tracing::error!("Session is no longer running");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "session is no longer running".to_string(),
        )
    })?;
    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::CONTENT_TYPE;

    struct TestServer {
        base: String,
        client: reqwest::Client,
    }

    impl TestServer {
        async fn post(&self, path: &str, body: &str) -> StatusCode {
            let response = self
                .client
                .post(format!("{}{}", self.base, path))
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string())
                .send()
                .await
                .unwrap();
            StatusCode::from_u16(response.status().as_u16()).unwrap()
        }
    }

    fn app_state() -> (Arc<AppState>, mpsc::Receiver<Event>) {
        let (events, rx) = mpsc::channel(8);
        let (_view, snapshot) = WatchView::new(TagName::default());
        (Arc::new(AppState { events, snapshot }), rx)
    }

    async fn serve(state: Arc<AppState>) -> TestServer {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        TestServer {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
        }
    }

    #[tokio::test]
    async fn test_inverted_view_rejected() {
        let (state, mut rx) = app_state();
        let server = serve(state).await;

        let status = server
            .post(
                "/v1/view",
                r#"{"south": 34.5, "west": -119.8, "north": 34.4, "east": -119.7}"#,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_non_finite_view_rejected() {
        // JSON has no NaN, so call the handler directly
        let (state, mut rx) = app_state();
        let viewport = Viewport::new(f64::NAN, -119.8, 34.4, -119.7);

        let err = view_handler(State(state), Json(viewport)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_bad_tags_rejected() {
        let (state, mut rx) = app_state();
        let server = serve(state).await;

        assert_eq!(
            server.post("/v1/tag", r#"{"tag": ""}"#).await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            server.post("/v1/tag", r#"{"tag": "amenity\n"}"#).await,
            StatusCode::BAD_REQUEST
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_view_accepted_once() {
        let (state, mut rx) = app_state();
        let server = serve(state).await;

        let status = server
            .post(
                "/v1/view",
                r#"{"south": 34.4, "west": -119.8, "north": 34.5, "east": -119.7}"#,
            )
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        match rx.try_recv() {
            Ok(Event::ViewportChanged(v)) => {
                assert_eq!(v, Viewport::new(34.4, -119.8, 34.5, -119.7))
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_tag_accepted_once() {
        let (state, mut rx) = app_state();
        let server = serve(state).await;

        assert_eq!(
            server.post("/v1/tag", r#"{"tag": "cuisine"}"#).await,
            StatusCode::ACCEPTED
        );
        match rx.try_recv() {
            Ok(Event::TagSelected(tag)) => assert_eq!(tag.as_str(), "cuisine"),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_session_is_unavailable() {
        let (state, rx) = app_state();
        drop(rx);
        let server = serve(state).await;

        assert_eq!(
            server.post("/v1/tag", r#"{"tag": "cuisine"}"#).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            server
                .post(
                    "/v1/view",
                    r#"{"south": 34.4, "west": -119.8, "north": 34.5, "east": -119.7}"#,
                )
                .await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
