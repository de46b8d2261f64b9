// THEORY:
// A `Detection` is one classified observation of one drawn primitive within a
// single frame. It is a "dumb" data container: the classifiers fill it in and the
// identity resolver consumes it. It has no memory of previous frames and carries
// no identity of its own.

use crate::core_modules::entity::EntityKind;
use crate::core_modules::paint::paint::PaintColor;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Which classifier produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    Triangle,
    Square,
    Pentagon,
    Hexagon,
    Circle,
}

impl DetectionSource {
    /// The classifier responsible for polygons of `arity` sides.
    pub fn for_arity(arity: usize) -> Option<Self> {
        match arity {
            3 => Some(DetectionSource::Triangle),
            4 => Some(DetectionSource::Square),
            5 => Some(DetectionSource::Pentagon),
            6 => Some(DetectionSource::Hexagon),
            _ => None,
        }
    }
}

/// The metadata a detection contributes to its entity. Absent fields leave the
/// entity's previous values in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Traits {
    pub color: Option<PaintColor>,
    pub radius: Option<f64>,
    pub radius_raw: Option<f64>,
    pub source: Option<DetectionSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// The provisional kind. Only used if this detection founds a new entity.
    pub kind: EntityKind,
    /// Centre in arena coordinates.
    pub position: DVec2,
    pub traits: Traits,
}

impl Detection {
    pub fn new(kind: EntityKind, position: DVec2, traits: Traits) -> Self {
        Self {
            kind,
            position,
            traits,
        }
    }
}
