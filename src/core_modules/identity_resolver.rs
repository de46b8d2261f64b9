// THEORY:
// The `IdentityResolver` gives the engine object permanence. Each frame it receives a
// stream of stateless `Detection`s and decides, one at a time, whether each is an
// entity it already knows or a new one.
//
// This module solves the data association problem with the simplest rule that
// holds up against rendering noise: nearest position wins.
//
// Key architectural principles:
// 1.  **Position over appearance**: matching ignores kind and colour. A single object's
//     measured colour or shape can flicker between frames, but two distinct objects
//     almost never occupy the same spot at the same time.
// 2.  **Two buffers**: `previous` holds last frame's entities, `current` is rebuilt from
//     scratch out of this frame's detections. A matched entity is moved from
//     `previous` into `current` and remembered as claimed for the rest of the frame.
// 3.  **Nearest claim wins**: draw order is arbitrary (a bullet can be drawn before the
//     tank that fired it), so a claim is provisional. A later detection that is
//     strictly nearer to a claimed entity's last-frame position takes it back; the
//     displaced detection then founds a new entity of its own.
// 4.  **Birth**: a detection with no previous entity inside the match tolerance founds
//     a new entity with a fresh identifier. Bullets additionally look for the nearest
//     player within a much wider radius and record it as their parent.
// 5.  **Death**: there is none to implement. `rotate` discards whatever was left in
//     `previous`, so an entity disappears the first frame nothing matches it.

use crate::core_modules::detection::Detection;
use crate::core_modules::entity::{Entity, EntityId, EntityKind};
use glam::DVec2;

pub const DEFAULT_MATCH_TOLERANCE: f64 = 42.0;
pub const DEFAULT_PARENT_TOLERANCE: f64 = 300.0;

/// A previous-frame entity matched during the current frame.
#[derive(Debug)]
struct Claim {
    /// The entity as it was before this frame's detection was folded in.
    original: Entity,
    /// Index of the claimed entity in `current`.
    slot: usize,
    distance: f64,
    detection: Detection,
    now_ms: u64,
}

#[derive(Debug)]
pub struct IdentityResolver {
    current: Vec<Entity>,
    previous: Vec<Entity>,
    claims: Vec<Claim>,
    next_id: u64,
    /// Max arena distance for a detection to continue an existing entity.
    match_tolerance: f64,
    /// Max arena distance between a new bullet and its presumed shooter.
    parent_tolerance: f64,
}

impl IdentityResolver {
    pub fn new(match_tolerance: f64, parent_tolerance: f64) -> Self {
        Self {
            current: Vec::new(),
            previous: Vec::new(),
            claims: Vec::new(),
            next_id: 0,
            match_tolerance,
            parent_tolerance,
        }
    }

    /// Merges one detection into the current frame and returns the id of the entity
    /// it was attributed to.
    ///
    /// The attribution holds for the rest of the frame unless a later, nearer
    /// detection reclaims the entity, in which case this detection is moved onto a
    /// newly founded entity.
    pub fn add(&mut self, detection: Detection, now_ms: u64) -> EntityId {
        let position = detection.position;
        let unclaimed = self.nearest_previous(position);
        let reclaimed = self.nearest_claim(position);

        match (unclaimed, reclaimed) {
            (Some((index, distance)), Some((_, claim_distance))) if distance <= claim_distance => {
                self.claim(index, distance, detection, now_ms)
            }
            (_, Some((claim, distance))) => self.reclaim(claim, distance, detection, now_ms),
            (Some((index, distance)), None) => self.claim(index, distance, detection, now_ms),
            (None, None) => self.birth(detection, now_ms),
        }
    }

    /// Ends the frame: this frame's entities become the matching pool for the next,
    /// and anything left unmatched is dropped.
    pub fn rotate(&mut self) {
        let dropped = self.previous.len();
        if dropped > 0 {
            log::trace!("dropping {dropped} unmatched entities");
        }
        self.previous = std::mem::take(&mut self.current);
        self.claims.clear();
    }

    /// Entities detected so far this frame, in insertion order.
    pub fn current(&self) -> &[Entity] {
        &self.current
    }

    /// Last frame's entities that have not been matched yet this frame.
    pub fn previous(&self) -> &[Entity] {
        &self.previous
    }

    /// Looks an entity up in the current frame.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.current.iter().find(|entity| entity.id() == id)
    }

    /// Resolves an entity's weak parent link against the current frame.
    pub fn parent_of(&self, entity: &Entity) -> Option<&Entity> {
        entity.parent().and_then(|parent| self.get(parent))
    }

    // --- 1. Matching ---
    fn claim(&mut self, index: usize, distance: f64, detection: Detection, now_ms: u64) -> EntityId {
        let original = self.previous.swap_remove(index);
        let mut entity = original.clone();
        entity.observe(detection.position, &detection.traits);
        log::trace!(
            "{} ({:?}) matched at {}, detected as {:?}",
            entity.id(),
            entity.kind(),
            detection.position,
            detection.kind
        );
        let id = entity.id();
        self.claims.push(Claim {
            original,
            slot: self.current.len(),
            distance,
            detection,
            now_ms,
        });
        self.current.push(entity);
        id
    }

    // --- 2. Conflict ---
    fn reclaim(&mut self, claim: usize, distance: f64, detection: Detection, now_ms: u64) -> EntityId {
        let claim = &mut self.claims[claim];
        let mut entity = claim.original.clone();
        entity.observe(detection.position, &detection.traits);
        let id = entity.id();
        self.current[claim.slot] = entity;

        claim.distance = distance;
        let displaced = std::mem::replace(&mut claim.detection, detection);
        let displaced_at = std::mem::replace(&mut claim.now_ms, now_ms);
        log::debug!(
            "{id} reclaimed from a {:?} at {} by a nearer detection",
            displaced.kind,
            displaced.position
        );
        self.birth(displaced, displaced_at);
        id
    }

    // --- 3. Birth ---
    fn birth(&mut self, detection: Detection, now_ms: u64) -> EntityId {
        let Detection {
            kind,
            position,
            traits,
        } = detection;
        let id = EntityId(self.next_id);
        self.next_id += 1;
        let mut entity = Entity::new(id, kind, position, &traits, now_ms);
        if kind == EntityKind::Bullet {
            entity.set_parent(self.nearest_player(position));
        }
        log::debug!(
            "new {kind:?} {id} at {position} (parent {:?})",
            entity.parent()
        );
        self.current.push(entity);
        id
    }

    fn nearest_previous(&self, position: DVec2) -> Option<(usize, f64)> {
        nearest_within(
            self.previous.iter().enumerate(),
            position,
            self.match_tolerance,
        )
    }

    /// The claimed entity this position is strictly nearer to than its claimant.
    fn nearest_claim(&self, position: DVec2) -> Option<(usize, f64)> {
        let contested = self
            .claims
            .iter()
            .enumerate()
            .filter(|(_, claim)| claim.original.distance_to(position) < claim.distance)
            .map(|(index, claim)| (index, &claim.original));
        nearest_within(contested, position, self.match_tolerance)
    }

    fn nearest_player(&self, position: DVec2) -> Option<EntityId> {
        let players = self
            .current
            .iter()
            .chain(self.previous.iter())
            .filter(|entity| entity.kind() == EntityKind::Player)
            .map(|entity| (entity.id(), entity));
        nearest_within(players, position, self.parent_tolerance).map(|(id, _)| id)
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_TOLERANCE, DEFAULT_PARENT_TOLERANCE)
    }
}

/// The key and distance of the candidate closest to `position`, if any lies
/// within `tolerance`.
fn nearest_within<'a, K>(
    candidates: impl Iterator<Item = (K, &'a Entity)>,
    position: DVec2,
    tolerance: f64,
) -> Option<(K, f64)> {
    let mut best: Option<(K, f64)> = None;
    for (key, entity) in candidates {
        let distance = entity.distance_to(position);
        if distance > tolerance {
            continue;
        }
        if best.as_ref().is_none_or(|(_, best_distance)| distance < *best_distance) {
            best = Some((key, distance));
        }
    }
    best
}
