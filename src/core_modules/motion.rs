// THEORY:
// `MotionTracker` gives an entity a sense of movement. It keeps a short ring buffer
// of the positions at which the entity was matched and derives velocity as a
// weighted average of the deltas between them, newest weighted highest. The decay
// keeps the estimate responsive to a change of direction while smoothing the
// one-pixel jitter that comes from re-measuring a rotated polygon every frame.
//
// The tracker has no notion of time: velocity is in arena units per frame.

use glam::DVec2;
use std::collections::VecDeque;

const POSITION_HISTORY_SIZE: usize = 10;
const DELTA_WEIGHT_DECAY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct MotionTracker {
    /// Most recent position at the back.
    position_history: VecDeque<DVec2>,
    velocity: DVec2,
}

impl MotionTracker {
    pub fn new(position: DVec2) -> Self {
        let mut position_history = VecDeque::with_capacity(POSITION_HISTORY_SIZE);
        position_history.push_back(position);
        Self {
            position_history,
            velocity: DVec2::ZERO,
        }
    }

    /// Records a new sighting and refreshes the velocity estimate.
    pub fn update(&mut self, position: DVec2) {
        self.position_history.push_back(position);
        if self.position_history.len() > POSITION_HISTORY_SIZE {
            self.position_history.pop_front();
        }
        self.velocity = self.weighted_velocity();
    }

    pub fn position(&self) -> DVec2 {
        self.position_history.back().copied().unwrap_or(DVec2::ZERO)
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    /// Where the entity should be one frame from now.
    pub fn predict(&self) -> DVec2 {
        self.position() + self.velocity
    }

    pub fn samples(&self) -> usize {
        self.position_history.len()
    }

    fn weighted_velocity(&self) -> DVec2 {
        let mut weight = 1.0;
        let mut weighted_sum = DVec2::ZERO;
        let mut total_weight = 0.0;

        // Walk deltas from newest to oldest.
        let newest_first = self.position_history.iter().rev();
        for (newer, older) in newest_first.clone().zip(newest_first.skip(1)) {
            weighted_sum += (*newer - *older) * weight;
            total_weight += weight;
            weight *= DELTA_WEIGHT_DECAY;
        }

        if total_weight == 0.0 {
            DVec2::ZERO
        } else {
            weighted_sum / total_weight
        }
    }
}
