// THEORY:
// The engine is deliberately blind to two things it cannot derive from a single
// draw call: where the rendering surface sits in the arena, and what time it is.
// Both are owned elsewhere (a camera model that is recalibrated continuously, and
// the host's frame loop) and are injected as the `CoordinateConverter` and
// `FrameClock` traits.
//
// The concrete types here are the reference implementations: an affine camera
// model used by the trace replayer and by tests, a wall clock, and a manual clock
// for deterministic tests.

use glam::DVec2;
use std::cell::Cell;
use std::time::Instant;

/// Maps rendering-surface space into arena space.
pub trait CoordinateConverter {
    /// Converts a surface point into an arena position.
    fn to_arena_position(&self, surface_point: DVec2) -> DVec2;
    /// Converts a surface length into arena units.
    fn to_arena_units(&self, surface_magnitude: f64) -> f64;
    /// The arena point the camera is currently centred on.
    fn camera_focus(&self) -> DVec2;
    /// Accepts a fresh camera sample. Converters that calibrate themselves ignore it.
    fn observe_camera(&mut self, _focus: DVec2, _scale: f64) {}
}

/// Supplies creation timestamps for new entities.
pub trait FrameClock {
    fn now_millis(&self) -> u64;
}

/// A camera that looks at `focus` with `scale` surface pixels per arena unit,
/// projecting `focus` onto `surface_center`.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConverter {
    surface_center: DVec2,
    focus: DVec2,
    scale: f64,
}

impl CameraConverter {
    pub fn new(surface_center: DVec2, focus: DVec2, scale: f64) -> Self {
        let mut camera = Self {
            surface_center,
            focus,
            scale: 1.0,
        };
        camera.recalibrate(focus, scale);
        camera
    }

    /// A converter where surface and arena coordinates coincide.
    pub fn identity() -> Self {
        Self::new(DVec2::ZERO, DVec2::ZERO, 1.0)
    }

    /// Moves the camera. A non-finite or non-positive scale keeps the old one.
    pub fn recalibrate(&mut self, focus: DVec2, scale: f64) {
        if focus.is_finite() {
            self.focus = focus;
        }
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        } else {
            log::debug!("ignoring camera scale {scale}");
        }
    }

    pub fn set_surface_center(&mut self, surface_center: DVec2) {
        self.surface_center = surface_center;
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Default for CameraConverter {
    fn default() -> Self {
        Self::identity()
    }
}

impl CoordinateConverter for CameraConverter {
    fn to_arena_position(&self, surface_point: DVec2) -> DVec2 {
        self.focus + (surface_point - self.surface_center) / self.scale
    }

    fn to_arena_units(&self, surface_magnitude: f64) -> f64 {
        surface_magnitude / self.scale
    }

    fn camera_focus(&self) -> DVec2 {
        self.focus
    }

    fn observe_camera(&mut self, focus: DVec2, scale: f64) {
        self.recalibrate(focus, scale);
    }
}

/// Milliseconds elapsed since construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: Cell<u64>,
}

impl ManualClock {
    pub fn starting_at(millis: u64) -> Self {
        Self {
            millis: Cell::new(millis),
        }
    }

    pub fn set(&self, millis: u64) {
        self.millis.set(millis);
    }

    pub fn advance(&self, millis: u64) {
        self.millis.set(self.millis.get().saturating_add(millis));
    }
}

impl FrameClock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.get()
    }
}
