// THEORY:
// The `RadiusNormalizer` is the engine's self-calibrating ruler. The renderer's
// effective scale drifts continuously (zoom, field of view, window size), so any
// fixed conversion from measured to canonical radius is wrong most of the time.
// Instead, every shape whose true size is known with confidence becomes an
// "anchor": a (measured, canonical) pair that votes on the correction factor.
//
// Key architectural principles:
// 1.  **Bounded memory**: anchors become ratio samples in a sliding window; the
//     oldest sample is evicted once the window is full.
// 2.  **Robust centre**: the window's median is the target, so a partially occluded
//     or mid-animation shape cannot drag the estimate on its own.
// 3.  **Damped response**: the factor moves a fixed fraction of the way towards the
//     median on each anchor, so even a run of bad frames produces no visible jump.
// 4.  **Gated feedback**: `anchor_if_close` only accepts an anchor the current factor
//     already roughly agrees with, which keeps misclassified shapes from feeding a
//     runaway drift.

use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;
pub const DEFAULT_BLEND: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct RadiusNormalizer {
    /// Recent `canonical / measured` ratios, oldest at the front.
    samples: VecDeque<f64>,
    capacity: usize,
    /// Weight of the median in each update; the old factor keeps `1 - blend`.
    blend: f64,
    factor: f64,
}

impl RadiusNormalizer {
    pub fn new(capacity: usize, blend: f64) -> Self {
        let capacity = capacity.max(1);
        let blend = if blend.is_finite() {
            blend.clamp(f64::EPSILON, 1.0)
        } else {
            DEFAULT_BLEND
        };
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            blend,
            factor: 1.0,
        }
    }

    /// Corrects a measured radius into canonical units.
    pub fn apply(&self, raw_radius: f64) -> f64 {
        raw_radius * self.factor
    }

    /// Records an anchor unconditionally. Returns whether it was accepted.
    pub fn add_anchor(&mut self, observed_raw: f64, expected_canonical: f64) -> bool {
        if !is_usable(observed_raw) || !is_usable(expected_canonical) {
            return false;
        }

        self.samples.push_back(expected_canonical / observed_raw);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }

        if let Some(median) = self.median() {
            self.factor = (1.0 - self.blend) * self.factor + self.blend * median;
        }
        log::trace!(
            "anchor {observed_raw:.2} -> {expected_canonical:.2}, factor now {:.4}",
            self.factor
        );
        true
    }

    /// Records the anchor only if the current factor already maps `raw` to within
    /// `tolerance` of `canonical`.
    pub fn anchor_if_close(&mut self, raw: f64, canonical: f64, tolerance: f64) -> bool {
        if !is_usable(raw) || !is_usable(canonical) || !tolerance.is_finite() {
            return false;
        }
        if (self.apply(raw) - canonical).abs() > tolerance {
            return false;
        }
        self.add_anchor(raw, canonical)
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn median(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }
}

impl Default for RadiusNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY, DEFAULT_BLEND)
    }
}

fn is_usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
