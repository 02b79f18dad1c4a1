//! Browser page integration: required elements and URL parameters

use anyhow::{anyhow, Result};
use leverarm_core::ViewerConfig;

use crate::app::{self, CANVAS_SELECTOR};

/// Check the page, apply URL overrides, and run the viewer
pub fn launch() -> Result<()> {
    let window = web_sys::window().ok_or_else(|| anyhow!("No window"))?;
    let document = window.document().ok_or_else(|| anyhow!("No document"))?;

    let canvas = document
        .query_selector(CANVAS_SELECTOR)
        .map_err(|e| anyhow!("Invalid canvas selector: {:?}", e))?;
    if canvas.is_none() {
        return Err(anyhow!("Missing required element {}", CANVAS_SELECTOR));
    }

    let mut config = ViewerConfig::default();
    if let Some(vehicle) = url_parameter(&window, "vehicle") {
        tracing::info!("Vehicle from URL parameter: {}", vehicle);
        config.vehicle.default = vehicle;
    }

    app::run(config)
}

/// Read `?name=` from the page URL
fn url_parameter(window: &web_sys::Window, name: &str) -> Option<String> {
    let href = window.location().href().ok()?;
    let url = web_sys::Url::new(&href).ok()?;
    url.search_params().get(name).filter(|v| !v.is_empty())
}
