//! Explorer configuration, loaded from TOML.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use url::Url;

use crate::models::{TagName, Viewport, DEFAULT_TAG};

/// Deepest zoom slippy-map tile servers generally offer.
const MAX_ZOOM: u8 = 22;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub overpass: OverpassConfig,
    pub session: SessionConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OverpassConfig {
    /// Interpreter URL
    pub endpoint: String,
    /// `[timeout:N]` sent to the server with every query
    pub server_timeout_secs: u32,
    /// Client-side limit for the whole request
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://overpass-api.de/api/interpreter".to_string(),
            server_timeout_secs: 25,
            request_timeout_secs: 60,
            user_agent: concat!("tagscope/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// Tag selected when the session starts
    pub default_tag: String,
    /// Capacity of the UI event channel
    pub event_buffer: usize,
    /// View queried as the initial load, if any
    pub initial_view: Option<InitialView>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_tag: DEFAULT_TAG.to_string(),
            event_buffer: 64,
            initial_view: Some(InitialView::default()),
        }
    }
}

/// Map position the session opens on.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InitialView {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
    pub width_px: u32,
    pub height_px: u32,
}

impl Default for InitialView {
    /// Downtown Santa Barbara at street level
    fn default() -> Self {
        Self {
            center_lat: 34.4258,
            center_lon: -119.7142,
            zoom: 16,
            width_px: 1280,
            height_px: 800,
        }
    }
}

impl InitialView {
    pub fn viewport(&self) -> Viewport {
        Viewport::around(
            self.center_lat,
            self.center_lon,
            self.zoom,
            self.width_px,
            self.height_px,
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.overpass.endpoint).context("Invalid overpass.endpoint")?;
        self.default_tag()?;

        if self.session.event_buffer == 0 {
            anyhow::bail!("session.event_buffer must be at least 1");
        }
        if let Some(view) = &self.session.initial_view {
            if view.zoom > MAX_ZOOM {
                anyhow::bail!(
                    "session.initial_view.zoom {} exceeds {}",
                    view.zoom,
                    MAX_ZOOM
                );
            }
            if !(-85.0..=85.0).contains(&view.center_lat)
                || !(-180.0..=180.0).contains(&view.center_lon)
            {
                anyhow::bail!(
                    "session.initial_view center ({}, {}) is off the map",
                    view.center_lat,
                    view.center_lon
                );
            }
        }
        Ok(())
    }

    pub fn default_tag(&self) -> Result<TagName> {
        TagName::new(self.session.default_tag.as_str()).context("Invalid session.default_tag")
    }
}
