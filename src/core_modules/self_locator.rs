// THEORY:
// The `SelfLocator` answers "which of these circles is me?". Colour cannot answer it
// (team colour changes between games) and neither can an absolute size (the camera
// scale drifts). What does hold is that the camera follows the controlled tank, and
// that the tank's own body is the largest circle close to the camera focus.
//
// Hysteresis: once an entity has been chosen, it keeps the title for as long as it
// stays within a generous radius of the focus, even if a larger circle briefly shows
// up nearby. Only when the cached entity vanishes or wanders off does the locator
// rescan, using a tighter radius. A scan that finds nothing leaves the cache alone,
// so asking before the frame's circles are drawn does not forget who we are.

use crate::core_modules::detection::DetectionSource;
use crate::core_modules::entity::{Entity, EntityId};
use glam::DVec2;

pub const DEFAULT_CACHE_RADIUS: f64 = 160.0;
pub const DEFAULT_SCAN_RADIUS: f64 = 128.0;

#[derive(Debug, Clone)]
pub struct SelfLocator {
    cached: Option<EntityId>,
    /// How far from the focus the cached self may be and still be trusted.
    cache_radius: f64,
    /// How far from the focus a fresh candidate may be.
    scan_radius: f64,
}

impl SelfLocator {
    pub fn new(cache_radius: f64, scan_radius: f64) -> Self {
        Self {
            cached: None,
            cache_radius,
            scan_radius,
        }
    }

    /// Picks the controlled player out of `entities` given the camera focus.
    pub fn locate<'a>(&mut self, entities: &'a [Entity], focus: DVec2) -> Option<&'a Entity> {
        if let Some(cached) = self.cached_within_reach(entities, focus) {
            return Some(cached);
        }

        let candidate = entities
            .iter()
            .filter(|entity| entity.extras().source == Some(DetectionSource::Circle))
            .filter(|entity| entity.distance_to(focus) <= self.scan_radius)
            .max_by(|a, b| a.radius().total_cmp(&b.radius()));

        if let Some(chosen) = candidate.map(Entity::id) {
            if Some(chosen) != self.cached {
                log::debug!("self changed from {:?} to {chosen}", self.cached);
            }
            self.cached = Some(chosen);
        }
        candidate
    }

    pub fn cached(&self) -> Option<EntityId> {
        self.cached
    }

    pub fn forget(&mut self) {
        self.cached = None;
    }

    fn cached_within_reach<'a>(&self, entities: &'a [Entity], focus: DVec2) -> Option<&'a Entity> {
        let id = self.cached?;
        entities
            .iter()
            .find(|entity| entity.id() == id)
            .filter(|entity| entity.distance_to(focus) <= self.cache_radius)
    }
}

impl Default for SelfLocator {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_RADIUS, DEFAULT_SCAN_RADIUS)
    }
}
