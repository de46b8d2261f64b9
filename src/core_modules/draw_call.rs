// THEORY:
// The `draw_call` module describes what the interception layer hands to the engine.
// There are two shapes of input:
//
// - Completed polygon draws, delivered once per fill with the full vertex list
//   (already in surface coordinates) and the fill style active at the time.
// - Individual canvas method calls (`beginPath`, `arc`, `fill`, ...) observed just
//   before they run, which the circle detector stitches into a sighting.
//
// `DrawEvent` is the serialisable union of both plus the frame boundaries and
// camera samples, and doubles as the line format of captured traces.

use crate::core_modules::paint::paint::{Rgba8, parse_hex, to_hex};
use crate::error::PaintParseError;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A canvas method invocation relevant to circle detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasCall {
    BeginPath,
    Arc { center: DVec2, radius: f64 },
    Fill { color: Rgba8 },
    /// Any other method on the rendering surface.
    Other,
}

/// A fill style as it appears in a trace: `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Paint(pub Rgba8);

impl TryFrom<String> for Paint {
    type Error = PaintParseError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        parse_hex(&text).map(Paint)
    }
}

impl From<Paint> for String {
    fn from(paint: Paint) -> Self {
        to_hex(paint.0)
    }
}

/// One line of a captured draw-call trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawEvent {
    FrameStart,
    FrameEnd,
    Polygon { vertices: Vec<DVec2>, fill: Paint },
    BeginPath,
    Arc { center: DVec2, radius: f64 },
    Fill { color: Paint },
    Other { method: String },
    /// A fresh camera sample for the coordinate converter.
    Camera { focus: DVec2, scale: f64 },
}

impl DrawEvent {
    /// The canvas call this event represents, if it is one.
    pub fn as_canvas_call(&self) -> Option<CanvasCall> {
        match self {
            DrawEvent::BeginPath => Some(CanvasCall::BeginPath),
            DrawEvent::Arc { center, radius } => Some(CanvasCall::Arc {
                center: *center,
                radius: *radius,
            }),
            DrawEvent::Fill { color } => Some(CanvasCall::Fill { color: color.0 }),
            DrawEvent::Other { .. } => Some(CanvasCall::Other),
            _ => None,
        }
    }
}
