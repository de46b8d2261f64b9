use std::path::Path;

use anyhow::{Context, bail};
use arena_sight::{DrawEvent, PipelineConfig};
use glam::DVec2;

/// Decodes one trace line. Blank lines and `#` comments yield `None`; so do
/// malformed lines, which are logged and skipped.
pub fn parse_line(line: &str, line_number: usize) -> Option<DrawEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(event) => Some(event),
        Err(err) => {
            log::warn!("line {line_number}: skipping malformed event: {err}");
            None
        }
    }
}

/// Reads a JSON pipeline config. Missing fields fall back to their defaults.
pub async fn load_config(path: &Path) -> anyhow::Result<PipelineConfig> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

/// Parses `WIDTHxHEIGHT` into the centre point of the rendering surface.
pub fn parse_surface(text: &str) -> anyhow::Result<DVec2> {
    let Some((width, height)) = text.split_once(['x', 'X']) else {
        bail!("surface `{text}` is not WIDTHxHEIGHT");
    };
    let width: f64 = width.trim().parse().context("surface width")?;
    let height: f64 = height.trim().parse().context("surface height")?;
    if !(width > 0.0 && height > 0.0) {
        bail!("surface `{text}` must have a positive size");
    }
    Ok(DVec2::new(width, height) / 2.0)
}
