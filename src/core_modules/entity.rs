// THEORY:
// An `Entity` is a game object that persists across frames. Where a `Detection` is
// a snapshot of one draw call in one frame, an `Entity` is the identity that the
// resolver threads through consecutive matching detections.
//
// Key architectural principles:
// 1.  **Immutable kind**: the `EntityKind` is fixed at birth. Later detections can
//     only refresh `Extras` and the motion tracker; there is no setter for the kind.
// 2.  **Weak parent**: `parent` is an `EntityId`, never a reference. The parent can
//     vanish a frame before the child, so it is looked up on demand.
// 3.  **Auditable radii**: `Extras` keeps the normalised and the as-measured radius
//     side by side.
// 4.  **No independent storage**: entities live only in the resolver's buffers and
//     are dropped the first frame nothing matches them.

use crate::core_modules::detection::{DetectionSource, Traits};
use crate::core_modules::motion::MotionTracker;
use crate::core_modules::paint::paint::PaintColor;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic type of a tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Bullet,
    Drone,
    Trap,
    Square,
    Triangle,
    Pentagon,
    Hexagon,
    AlphaPentagon,
    Crasher,
    Unknown,
}

/// A process-local identifier, unique for the lifetime of one resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-entity metadata refreshed by every matching detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extras {
    pub color: Option<PaintColor>,
    /// Normalised radius in canonical arena units.
    pub radius: Option<f64>,
    /// Radius as measured, before normalisation.
    pub radius_raw: Option<f64>,
    pub source: Option<DetectionSource>,
    pub creation_id: EntityId,
    pub created_at_ms: u64,
}

impl Extras {
    fn new(creation_id: EntityId, created_at_ms: u64) -> Self {
        Self {
            color: None,
            radius: None,
            radius_raw: None,
            source: None,
            creation_id,
            created_at_ms,
        }
    }

    /// Overwrites only the fields present in `traits`.
    pub fn apply(&mut self, traits: &Traits) {
        if let Some(color) = traits.color {
            self.color = Some(color);
        }
        if let Some(radius) = traits.radius {
            self.radius = Some(radius);
        }
        if let Some(radius_raw) = traits.radius_raw {
            self.radius_raw = Some(radius_raw);
        }
        if let Some(source) = traits.source {
            self.source = Some(source);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    kind: EntityKind,
    motion: MotionTracker,
    parent: Option<EntityId>,
    extras: Extras,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        kind: EntityKind,
        position: DVec2,
        traits: &Traits,
        created_at_ms: u64,
    ) -> Self {
        let mut extras = Extras::new(id, created_at_ms);
        extras.apply(traits);
        Self {
            kind,
            motion: MotionTracker::new(position),
            parent: None,
            extras,
        }
    }

    /// Folds a matching detection into this entity. The kind is left untouched.
    pub(crate) fn observe(&mut self, position: DVec2, traits: &Traits) {
        self.motion.update(position);
        self.extras.apply(traits);
    }

    pub(crate) fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }

    pub fn id(&self) -> EntityId {
        self.extras.creation_id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn position(&self) -> DVec2 {
        self.motion.position()
    }

    pub fn velocity(&self) -> DVec2 {
        self.motion.velocity()
    }

    pub fn motion(&self) -> &MotionTracker {
        &self.motion
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn extras(&self) -> &Extras {
        &self.extras
    }

    /// Normalised radius, or zero if none was ever observed.
    pub fn radius(&self) -> f64 {
        self.extras.radius.unwrap_or(0.0)
    }

    pub fn distance_to(&self, point: DVec2) -> f64 {
        self.position().distance(point)
    }
}
