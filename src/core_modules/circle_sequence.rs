// THEORY:
// Circles (tanks and bullets) are not delivered as finished primitives. The renderer
// draws each one as a fixed run of canvas calls:
//
//     begin_path -> arc -> fill -> arc -> fill -> arc
//
// The first arc/fill pair is the dark outline, the second arc/fill pair is the body
// in the entity's own colour, and the trailing arc opens the next path segment. The
// `CircleSequence` state machine follows that run call by call and, when it completes,
// yields a `CircleSighting` built from the outline geometry and the body colour.
//
// Any call that does not fit the expected next step resets the machine, so
// geometry from unrelated draws is never stitched together. A `begin_path` in the
// middle of a run restarts it rather than discarding it outright.

use crate::core_modules::draw_call::CanvasCall;
use crate::core_modules::paint::paint::Rgba8;
use glam::DVec2;

/// A completed circle draw, still in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleSighting {
    pub center: DVec2,
    pub radius: f64,
    pub fill: Rgba8,
}

/// Geometry of one `arc` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSegment {
    pub center: DVec2,
    pub radius: f64,
}

/// Named states of the circle call sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SequenceState {
    #[default]
    Idle,
    PathBegun,
    OutlineArc { outline: ArcSegment },
    OutlineFilled { outline: ArcSegment },
    BodyArc { outline: ArcSegment },
    BodyFilled { outline: ArcSegment, fill: Rgba8 },
}

/// Result of feeding one call into the machine.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Transition {
    Advance(SequenceState),
    Complete(CircleSighting),
    Reset,
}

#[derive(Debug, Default)]
pub struct CircleSequence {
    state: SequenceState,
}

impl CircleSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    /// Feeds the next observed canvas call. Returns a sighting when the run completes.
    pub fn feed(&mut self, call: CanvasCall) -> Option<CircleSighting> {
        match transition(self.state, call) {
            Transition::Advance(next) => {
                self.state = next;
                None
            }
            Transition::Complete(sighting) => {
                self.state = SequenceState::Idle;
                Some(sighting)
            }
            Transition::Reset => {
                if self.state != SequenceState::Idle {
                    log::trace!("circle sequence reset from {:?} by {call:?}", self.state);
                }
                self.state = SequenceState::Idle;
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = SequenceState::Idle;
    }
}

/// The transition table.
fn transition(state: SequenceState, call: CanvasCall) -> Transition {
    use SequenceState::*;

    match (state, call) {
        (_, CanvasCall::BeginPath) => Transition::Advance(PathBegun),
        (PathBegun, CanvasCall::Arc { center, radius }) => {
            arc(center, radius).map_or(Transition::Reset, |outline| {
                Transition::Advance(OutlineArc { outline })
            })
        }
        (OutlineArc { outline }, CanvasCall::Fill { .. }) => {
            Transition::Advance(OutlineFilled { outline })
        }
        (OutlineFilled { outline }, CanvasCall::Arc { .. }) => {
            Transition::Advance(BodyArc { outline })
        }
        (BodyArc { outline }, CanvasCall::Fill { color }) => {
            Transition::Advance(BodyFilled { outline, fill: color })
        }
        (BodyFilled { outline, fill }, CanvasCall::Arc { .. }) => {
            Transition::Complete(CircleSighting {
                center: outline.center,
                radius: outline.radius,
                fill,
            })
        }
        _ => Transition::Reset,
    }
}

fn arc(center: DVec2, radius: f64) -> Option<ArcSegment> {
    (center.is_finite() && radius.is_finite() && radius > 0.0).then_some(ArcSegment { center, radius })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const OUTLINE: Rgba8 = Rgba([0x55, 0x55, 0x55, 0xFF]);
    const BODY: Rgba8 = Rgba([0x00, 0xB2, 0xE1, 0xFF]);

    fn arc_call(x: f64, y: f64, radius: f64) -> CanvasCall {
        CanvasCall::Arc {
            center: DVec2::new(x, y),
            radius,
        }
    }

    fn full_run(x: f64, y: f64, radius: f64) -> Vec<CanvasCall> {
        vec![
            CanvasCall::BeginPath,
            arc_call(x, y, radius),
            CanvasCall::Fill { color: OUTLINE },
            arc_call(x, y, radius - 3.0),
            CanvasCall::Fill { color: BODY },
            arc_call(x, y, radius),
        ]
    }

    fn run(sequence: &mut CircleSequence, calls: &[CanvasCall]) -> Vec<CircleSighting> {
        calls.iter().filter_map(|call| sequence.feed(*call)).collect()
    }

    #[test]
    fn full_run_yields_outline_geometry_and_body_color() {
        let mut sequence = CircleSequence::new();
        let sightings = run(&mut sequence, &full_run(10.0, 20.0, 30.0));
        assert_eq!(
            sightings,
            vec![CircleSighting {
                center: DVec2::new(10.0, 20.0),
                radius: 30.0,
                fill: BODY,
            }]
        );
        assert_eq!(sequence.state(), SequenceState::Idle);
    }

    #[test]
    fn interleaved_call_resets() {
        let mut sequence = CircleSequence::new();
        let mut calls = full_run(0.0, 0.0, 20.0);
        calls.insert(3, CanvasCall::Other);
        assert!(run(&mut sequence, &calls).is_empty());
    }

    #[test]
    fn begin_path_mid_run_restarts() {
        let mut sequence = CircleSequence::new();
        let mut calls = vec![CanvasCall::BeginPath, arc_call(1.0, 1.0, 5.0)];
        calls.extend(full_run(50.0, 60.0, 25.0));
        let sightings = run(&mut sequence, &calls);
        assert_eq!(sightings.len(), 1);
        assert_eq!(sightings[0].center, DVec2::new(50.0, 60.0));
    }

    #[test]
    fn arc_without_begin_path_is_ignored() {
        let mut sequence = CircleSequence::new();
        let calls = &full_run(0.0, 0.0, 20.0)[1..];
        assert!(run(&mut sequence, calls).is_empty());
    }

    #[test]
    fn degenerate_outline_resets() {
        let mut sequence = CircleSequence::new();
        sequence.feed(CanvasCall::BeginPath);
        sequence.feed(arc_call(0.0, 0.0, f64::NAN));
        assert_eq!(sequence.state(), SequenceState::Idle);
    }

    #[test]
    fn consecutive_runs_each_complete() {
        let mut sequence = CircleSequence::new();
        let mut calls = full_run(0.0, 0.0, 60.0);
        calls.extend(full_run(500.0, 500.0, 20.0));
        assert_eq!(run(&mut sequence, &calls).len(), 2);
    }
}
