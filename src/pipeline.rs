// THEORY:
// The `pipeline` module is the top-level API of the detection engine. It wires the
// layered components into one object with injected collaborators, so a host (a
// browser hook, a trace replayer, a test) only ever talks to `DetectionPipeline`.
//
// Data flow for one frame:
//   draw calls -> ShapeClassifier (+ RadiusNormalizer) -> IdentityResolver
//   frame end  -> SelfLocator + FrameReport snapshot -> FrameCycle rotation
//
// Everything runs synchronously inside the host's per-frame callbacks; nothing
// blocks and nothing is shared across threads.

use crate::core_modules::circle_sequence::CircleSequence;
use crate::core_modules::collaborators::{CoordinateConverter, FrameClock};
use crate::core_modules::detection::Detection;
use crate::core_modules::draw_call::{CanvasCall, DrawEvent};
use crate::core_modules::entity::{Entity, EntityId, EntityKind, Extras};
use crate::core_modules::frame_cycle::FrameCycle;
use crate::core_modules::identity_resolver::{
    DEFAULT_MATCH_TOLERANCE, DEFAULT_PARENT_TOLERANCE, IdentityResolver,
};
use crate::core_modules::paint::paint::Rgba8;
use crate::core_modules::radius_normalizer::{
    DEFAULT_BLEND, DEFAULT_HISTORY_CAPACITY, RadiusNormalizer,
};
use crate::core_modules::self_locator::{DEFAULT_CACHE_RADIUS, DEFAULT_SCAN_RADIUS, SelfLocator};
use crate::core_modules::shape_classifier::{ShapeBands, ShapeClassifier};
use crate::error::PipelineError;
use glam::DVec2;
use serde::{Deserialize, Serialize};

// Re-export key data structures for the public API.
pub use crate::core_modules::detection::DetectionSource;
pub use crate::core_modules::paint::paint::PaintColor;

/// Polygon arities the interception layer should report.
pub const OBSERVED_ARITIES: [usize; 4] = [3, 4, 5, 6];

/// Tunable parameters of the pipeline. Every distance is in arena units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub match_tolerance: f64,
    pub parent_tolerance: f64,
    /// Radius around the camera focus inside which the cached self is kept.
    pub self_cache_radius: f64,
    /// Radius around the camera focus searched for a new self.
    pub self_scan_radius: f64,
    pub normalizer_capacity: usize,
    pub normalizer_blend: f64,
    pub bands: ShapeBands,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            match_tolerance: DEFAULT_MATCH_TOLERANCE,
            parent_tolerance: DEFAULT_PARENT_TOLERANCE,
            self_cache_radius: DEFAULT_CACHE_RADIUS,
            self_scan_radius: DEFAULT_SCAN_RADIUS,
            normalizer_capacity: DEFAULT_HISTORY_CAPACITY,
            normalizer_blend: DEFAULT_BLEND,
            bands: ShapeBands::default(),
        }
    }
}

/// A frozen copy of one entity, as handed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: DVec2,
    pub velocity: DVec2,
    pub parent: Option<EntityId>,
    pub extras: Extras,
}

impl From<&Entity> for EntitySnapshot {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id(),
            kind: entity.kind(),
            position: entity.position(),
            velocity: entity.velocity(),
            parent: entity.parent(),
            extras: entity.extras().clone(),
        }
    }
}

/// The state of the arena at the end of one frame, captured before rotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame_index: u64,
    pub entities: Vec<EntitySnapshot>,
    pub player: Option<EntityId>,
    pub radius_factor: f64,
}

impl FrameReport {
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|entity| entity.kind == kind).count()
    }

    pub fn player(&self) -> Option<&EntitySnapshot> {
        let id = self.player?;
        self.entities.iter().find(|entity| entity.id == id)
    }
}

/// The main, top-level struct for the detection engine.
pub struct DetectionPipeline<C, K> {
    converter: C,
    clock: K,
    config: PipelineConfig,
    normalizer: RadiusNormalizer,
    classifier: ShapeClassifier,
    circles: CircleSequence,
    resolver: IdentityResolver,
    cycle: FrameCycle,
    locator: SelfLocator,
}

impl<C: CoordinateConverter, K: FrameClock> DetectionPipeline<C, K> {
    pub fn new(config: PipelineConfig, converter: C, clock: K) -> Self {
        Self {
            normalizer: RadiusNormalizer::new(config.normalizer_capacity, config.normalizer_blend),
            classifier: ShapeClassifier::new(config.bands.clone()),
            circles: CircleSequence::new(),
            resolver: IdentityResolver::new(config.match_tolerance, config.parent_tolerance),
            cycle: FrameCycle::new(),
            locator: SelfLocator::new(config.self_cache_radius, config.self_scan_radius),
            converter,
            clock,
            config,
        }
    }

    pub fn builder() -> PipelineBuilder<C, K> {
        PipelineBuilder::new()
    }

    /// Polygon arities this pipeline classifies.
    pub fn observed_arities(&self) -> &'static [usize] {
        &OBSERVED_ARITIES
    }

    /// A completed polygon draw, in surface coordinates.
    pub fn on_polygon(&mut self, vertices: &[DVec2], fill: Rgba8) -> Option<EntityId> {
        let detection = self.classifier.classify_polygon(
            vertices,
            fill,
            &self.converter,
            &mut self.normalizer,
        )?;
        Some(self.accept(detection))
    }

    /// A canvas method about to run. Feeds the circle detector.
    pub fn on_canvas_call(&mut self, call: CanvasCall) -> Option<EntityId> {
        let sighting = self.circles.feed(call)?;
        let detection =
            self.classifier
                .classify_circle(&sighting, &self.converter, &self.normalizer)?;
        Some(self.accept(detection))
    }

    pub fn frame_start(&mut self) {
        self.cycle.begin();
    }

    /// Closes the frame: locates the player, snapshots the entity set, then rotates.
    pub fn frame_end(&mut self) -> FrameReport {
        let player = self.get_player().map(Entity::id);
        let entities = self.resolver.current().iter().map(EntitySnapshot::from).collect();
        let radius_factor = self.normalizer.factor();

        // A circle run never spans a frame boundary.
        self.circles.reset();
        let frame_index = self.cycle.end(&mut self.resolver);

        FrameReport {
            frame_index,
            entities,
            player,
            radius_factor,
        }
    }

    /// Closes the frame in progress, if any. Used when the draw stream stops
    /// without a final frame end.
    pub fn close_open_frame(&mut self) -> Option<FrameReport> {
        self.cycle.is_open().then(|| self.frame_end())
    }

    /// Dispatches one trace event. Returns a report when the event closes a frame.
    pub fn handle(&mut self, event: &DrawEvent) -> Option<FrameReport> {
        match event {
            DrawEvent::FrameStart => self.frame_start(),
            DrawEvent::FrameEnd => return Some(self.frame_end()),
            DrawEvent::Polygon { vertices, fill } => {
                self.on_polygon(vertices, fill.0);
            }
            DrawEvent::Camera { focus, scale } => self.converter.observe_camera(*focus, *scale),
            other => {
                if let Some(call) = other.as_canvas_call() {
                    self.on_canvas_call(call);
                }
            }
        }
        None
    }

    /// Entities detected so far in the current frame, in insertion order.
    pub fn entities(&self) -> &[Entity] {
        self.resolver.current()
    }

    /// The entity most likely to be the controlled player.
    pub fn get_player(&mut self) -> Option<&Entity> {
        let focus = self.converter.camera_focus();
        self.locator.locate(self.resolver.current(), focus)
    }

    pub fn parent_of(&self, entity: &Entity) -> Option<&Entity> {
        self.resolver.parent_of(entity)
    }

    pub fn radius_factor(&self) -> f64 {
        self.normalizer.factor()
    }

    pub fn frame_index(&self) -> u64 {
        self.cycle.frame_index()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn converter_mut(&mut self) -> &mut C {
        &mut self.converter
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    fn accept(&mut self, detection: Detection) -> EntityId {
        self.cycle.note_detection();
        self.resolver.add(detection, self.clock.now_millis())
    }
}

/// Assembles a `DetectionPipeline`, refusing to build without its collaborators.
pub struct PipelineBuilder<C, K> {
    config: PipelineConfig,
    converter: Option<C>,
    clock: Option<K>,
}

impl<C: CoordinateConverter, K: FrameClock> PipelineBuilder<C, K> {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            converter: None,
            clock: None,
        }
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn converter(mut self, converter: C) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn clock(mut self, clock: K) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<DetectionPipeline<C, K>, PipelineError> {
        let converter = self
            .converter
            .ok_or(PipelineError::MissingCollaborator("coordinate converter"))?;
        let clock = self
            .clock
            .ok_or(PipelineError::MissingCollaborator("frame clock"))?;
        Ok(DetectionPipeline::new(self.config, converter, clock))
    }
}

impl<C: CoordinateConverter, K: FrameClock> Default for PipelineBuilder<C, K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::collaborators::{CameraConverter, ManualClock};
    use crate::core_modules::draw_call::Paint;
    use image::Rgba;

    type TestPipeline = DetectionPipeline<CameraConverter, ManualClock>;

    fn pipeline() -> TestPipeline {
        DetectionPipeline::new(
            PipelineConfig::default(),
            CameraConverter::identity(),
            ManualClock::default(),
        )
    }

    fn square_at(x: f64, y: f64) -> Vec<DVec2> {
        let half = 55.0 / 2f64.sqrt();
        vec![
            DVec2::new(x - half, y - half),
            DVec2::new(x + half, y - half),
            DVec2::new(x + half, y + half),
            DVec2::new(x - half, y + half),
        ]
    }

    #[test]
    fn builder_requires_converter() {
        let result = PipelineBuilder::<CameraConverter, ManualClock>::new()
            .clock(ManualClock::default())
            .build();
        assert_eq!(
            result.err(),
            Some(PipelineError::MissingCollaborator("coordinate converter"))
        );
    }

    #[test]
    fn builder_requires_clock() {
        let result = TestPipeline::builder()
            .converter(CameraConverter::identity())
            .build();
        assert_eq!(
            result.err(),
            Some(PipelineError::MissingCollaborator("frame clock"))
        );
    }

    #[test]
    fn builder_with_everything_builds() {
        let pipeline = TestPipeline::builder()
            .converter(CameraConverter::identity())
            .clock(ManualClock::default())
            .build()
            .unwrap();
        assert_eq!(pipeline.observed_arities(), &[3, 4, 5, 6]);
    }

    #[test]
    fn report_is_taken_before_rotation() {
        let mut pipeline = pipeline();
        pipeline.frame_start();
        pipeline.on_polygon(&square_at(0.0, 0.0), PaintColor::Square.to_rgba());
        let report = pipeline.frame_end();

        assert_eq!(report.frame_index, 0);
        assert_eq!(report.count(EntityKind::Square), 1);
        assert!(pipeline.entities().is_empty());
    }

    #[test]
    fn creation_time_comes_from_clock() {
        let mut pipeline = pipeline();
        pipeline.clock().set(500);
        let id = pipeline
            .on_polygon(&square_at(0.0, 0.0), PaintColor::Square.to_rgba())
            .unwrap();
        let entity = pipeline.entities().iter().find(|e| e.id() == id).unwrap();
        assert_eq!(entity.extras().created_at_ms, 500);
    }

    #[test]
    fn handle_routes_trace_events() {
        let mut pipeline = pipeline();
        let body = Paint(Rgba([0x00, 0xB2, 0xE1, 0xFF]));
        let outline = Paint(Rgba([0x55, 0x55, 0x55, 0xFF]));
        let events = vec![
            DrawEvent::FrameStart,
            DrawEvent::Camera {
                focus: DVec2::ZERO,
                scale: 1.0,
            },
            DrawEvent::BeginPath,
            DrawEvent::Arc {
                center: DVec2::ZERO,
                radius: 60.0,
            },
            DrawEvent::Fill { color: outline },
            DrawEvent::Arc {
                center: DVec2::ZERO,
                radius: 57.0,
            },
            DrawEvent::Fill { color: body },
            DrawEvent::Arc {
                center: DVec2::ZERO,
                radius: 60.0,
            },
        ];
        for event in &events {
            assert!(pipeline.handle(event).is_none());
        }
        let report = pipeline.handle(&DrawEvent::FrameEnd).unwrap();
        let player = report.player().unwrap();
        assert_eq!(player.kind, EntityKind::Player);
        assert_eq!(player.extras.color, Some(PaintColor::TeamBlue));
    }

    #[test]
    fn open_frame_is_closed_even_without_entities() {
        let mut pipeline = pipeline();
        assert!(pipeline.close_open_frame().is_none());

        pipeline.frame_start();
        let arrow = [
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(5.0, 8.660254037844386),
        ];
        assert!(pipeline.on_polygon(&arrow, PaintColor::Black.to_rgba()).is_none());
        assert!(pipeline.entities().is_empty());

        let report = pipeline.close_open_frame().unwrap();
        assert_eq!(report.frame_index, 0);
        assert!(report.entities.is_empty());
        assert!(pipeline.close_open_frame().is_none());
    }

    #[test]
    fn closed_trace_has_nothing_left_to_close() {
        let mut pipeline = pipeline();
        pipeline.handle(&DrawEvent::FrameStart);
        pipeline.handle(&DrawEvent::FrameEnd);
        assert!(pipeline.close_open_frame().is_none());
        assert_eq!(pipeline.frame_index(), 1);
    }

    #[test]
    fn camera_events_recalibrate_converter() {
        let mut pipeline = pipeline();
        pipeline.handle(&DrawEvent::Camera {
            focus: DVec2::new(100.0, 200.0),
            scale: 2.0,
        });
        assert_eq!(pipeline.converter().camera_focus(), DVec2::new(100.0, 200.0));
        assert_eq!(pipeline.converter().scale(), 2.0);
    }

    #[test]
    fn square_anchors_move_the_factor() {
        let mut pipeline = pipeline();
        let half = 10.0 / 2f64.sqrt();
        let small_square = [
            DVec2::new(-half, -half),
            DVec2::new(half, -half),
            DVec2::new(half, half),
            DVec2::new(-half, half),
        ];
        for _ in 0..60 {
            pipeline.on_polygon(&small_square, PaintColor::Square.to_rgba());
            pipeline.frame_end();
        }
        assert!((pipeline.radius_factor() - 5.5).abs() < 0.01);
    }
}
