use approx::assert_abs_diff_eq;
use arena_sight::core_modules::paint::paint::PaintColor;
use arena_sight::core_modules::radius_normalizer::RadiusNormalizer;
use arena_sight::{
    CameraConverter, CanvasCall, CoordinateConverter, DetectionPipeline, DrawEvent, EntityKind,
    FrameReport, ManualClock, PipelineConfig,
};
use glam::DVec2;
use image::Rgba;
use rstest::rstest;
use std::f64::consts::TAU;

/// Surface and arena coincide; only the focus moves.
#[derive(Debug, Default)]
struct FixedCamera {
    focus: DVec2,
}

impl CoordinateConverter for FixedCamera {
    fn to_arena_position(&self, surface_point: DVec2) -> DVec2 {
        surface_point
    }

    fn to_arena_units(&self, surface_magnitude: f64) -> f64 {
        surface_magnitude
    }

    fn camera_focus(&self) -> DVec2 {
        self.focus
    }

    fn observe_camera(&mut self, focus: DVec2, _scale: f64) {
        self.focus = focus;
    }
}

type Pipeline = DetectionPipeline<FixedCamera, ManualClock>;

fn pipeline() -> Pipeline {
    DetectionPipeline::new(
        PipelineConfig::default(),
        FixedCamera::default(),
        ManualClock::default(),
    )
}

fn regular(sides: usize, center: DVec2, radius: f64) -> Vec<DVec2> {
    (0..sides)
        .map(|i| {
            let angle = 0.3 + TAU * i as f64 / sides as f64;
            center + DVec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Replays the canvas calls the renderer issues for one outlined circle.
fn draw_circle(pipeline: &mut Pipeline, center: DVec2, radius: f64, color: PaintColor) {
    let outline = Rgba([0x55, 0x55, 0x55, 0xFF]);
    let calls = [
        CanvasCall::BeginPath,
        CanvasCall::Arc { center, radius },
        CanvasCall::Fill { color: outline },
        CanvasCall::Arc {
            center,
            radius: radius - 3.0,
        },
        CanvasCall::Fill {
            color: color.to_rgba(),
        },
        CanvasCall::Arc { center, radius },
    ];
    for call in calls {
        pipeline.on_canvas_call(call);
    }
}

fn draw_polygon(pipeline: &mut Pipeline, sides: usize, center: DVec2, radius: f64, color: PaintColor) {
    pipeline.on_polygon(&regular(sides, center, radius), color.to_rgba());
}

fn frame(pipeline: &mut Pipeline, draw: impl FnOnce(&mut Pipeline)) -> FrameReport {
    pipeline.frame_start();
    draw(pipeline);
    pipeline.clock().advance(16);
    pipeline.frame_end()
}

#[test]
fn large_circle_is_a_player_small_circle_a_bullet() {
    let mut pipeline = pipeline();
    let report = frame(&mut pipeline, |p| {
        draw_circle(p, DVec2::ZERO, 60.0, PaintColor::TeamBlue);
        draw_circle(p, DVec2::new(500.0, 500.0), 20.0, PaintColor::TeamRed);
    });

    assert_eq!(report.entities.len(), 2);
    let player = &report.entities[0];
    assert_eq!(player.kind, EntityKind::Player);
    assert!(player.position.distance(DVec2::ZERO) < 1.0);
    let bullet = &report.entities[1];
    assert_eq!(bullet.kind, EntityKind::Bullet);
    assert!(bullet.position.distance(DVec2::new(500.0, 500.0)) < 1.0);
}

#[test]
fn oversized_pentagon_is_an_alpha() {
    let mut pipeline = pipeline();
    let report = frame(&mut pipeline, |p| {
        draw_polygon(p, 5, DVec2::new(300.0, 300.0), 202.0, PaintColor::Pentagon);
    });
    assert_eq!(report.count(EntityKind::AlphaPentagon), 1);
    assert_eq!(report.count(EntityKind::Pentagon), 0);
}

#[test]
fn slow_movers_keep_their_identity() {
    let mut pipeline = pipeline();
    let first = frame(&mut pipeline, |p| {
        draw_circle(p, DVec2::ZERO, 60.0, PaintColor::TeamGreen);
    });
    let second = frame(&mut pipeline, |p| {
        draw_circle(p, DVec2::new(25.0, 20.0), 60.0, PaintColor::TeamGreen);
    });

    assert!(first.player.is_some());
    assert_eq!(first.player, second.player);
    assert_eq!(first.entities[0].id, second.entities[0].id);
    assert_eq!(second.entities[0].velocity, DVec2::new(25.0, 20.0));
}

#[rstest]
#[case(12.0, true)]
#[case(40.0, true)]
#[case(44.0, false)]
#[case(120.0, false)]
fn identity_follows_match_tolerance(#[case] step: f64, #[case] same: bool) {
    let mut pipeline = pipeline();
    let first = frame(&mut pipeline, |p| {
        draw_polygon(p, 4, DVec2::ZERO, 55.0, PaintColor::Square);
    });
    let second = frame(&mut pipeline, |p| {
        draw_polygon(p, 4, DVec2::new(step, 0.0), 55.0, PaintColor::Square);
    });
    assert_eq!(first.entities[0].id == second.entities[0].id, same);
}

#[test]
fn kind_is_fixed_at_birth() {
    let mut pipeline = pipeline();
    let first = frame(&mut pipeline, |p| {
        draw_polygon(p, 4, DVec2::ZERO, 55.0, PaintColor::Square);
    });
    let second = frame(&mut pipeline, |p| {
        draw_polygon(p, 4, DVec2::new(4.0, 0.0), 58.0, PaintColor::TeamBlue);
    });

    let square = &second.entities[0];
    assert_eq!(square.id, first.entities[0].id);
    assert_eq!(square.kind, EntityKind::Square);
    assert_eq!(square.extras.color, Some(PaintColor::TeamBlue));
    assert_ne!(square.extras.radius, first.entities[0].extras.radius);
}

#[test]
fn entities_vanish_the_frame_they_are_not_drawn() {
    let mut pipeline = pipeline();
    let first = frame(&mut pipeline, |p| {
        draw_polygon(p, 6, DVec2::ZERO, 100.0, PaintColor::Hexagon);
    });
    assert_eq!(first.count(EntityKind::Hexagon), 1);

    let second = frame(&mut pipeline, |_| {});
    assert!(second.entities.is_empty());
    assert!(pipeline.entities().is_empty());
}

#[test]
fn cached_self_outlasts_a_larger_neighbour() {
    let mut pipeline = pipeline();
    pipeline.converter_mut().observe_camera(DVec2::new(0.0, 150.0), 1.0);
    let first = frame(&mut pipeline, |p| {
        draw_circle(p, DVec2::new(0.0, 150.0), 56.0, PaintColor::TeamBlue);
    });
    let me = first.player.unwrap();

    // The camera swings onto a larger tank while the cached one stays in reach.
    pipeline.converter_mut().observe_camera(DVec2::ZERO, 1.0);
    let second = frame(&mut pipeline, |p| {
        draw_circle(p, DVec2::new(0.0, 150.0), 56.0, PaintColor::TeamBlue);
        draw_circle(p, DVec2::ZERO, 90.0, PaintColor::TeamRed);
    });
    assert_eq!(second.player, Some(me));
}

#[test]
fn player_is_none_when_nothing_is_near_focus() {
    let mut pipeline = pipeline();
    let report = frame(&mut pipeline, |p| {
        draw_circle(p, DVec2::new(900.0, 900.0), 60.0, PaintColor::TeamBlue);
    });
    assert_eq!(report.player, None);
    assert!(pipeline.get_player().is_none());
}

#[test]
fn new_bullets_point_at_their_shooter() {
    let mut pipeline = pipeline();
    pipeline.frame_start();
    draw_circle(&mut pipeline, DVec2::ZERO, 60.0, PaintColor::TeamBlue);
    draw_circle(&mut pipeline, DVec2::new(110.0, 0.0), 12.0, PaintColor::TeamBlue);

    let entities = pipeline.entities();
    let player = &entities[0];
    let bullet = &entities[1];
    assert_eq!(bullet.kind(), EntityKind::Bullet);
    assert_eq!(bullet.parent(), Some(player.id()));
    assert_eq!(pipeline.parent_of(bullet).map(|p| p.id()), Some(player.id()));
}

#[test]
fn bullet_drawn_before_its_tank_does_not_steal_the_tank() {
    let mut pipeline = pipeline();
    let first = frame(&mut pipeline, |p| {
        draw_circle(p, DVec2::ZERO, 60.0, PaintColor::TeamBlue);
    });
    let tank = first.player.unwrap();

    let second = frame(&mut pipeline, |p| {
        draw_circle(p, DVec2::new(40.0, 0.0), 12.0, PaintColor::TeamBlue);
        draw_circle(p, DVec2::ZERO, 60.0, PaintColor::TeamBlue);
    });
    assert_eq!(second.player, Some(tank));
    assert_eq!(second.count(EntityKind::Player), 1);
    assert_eq!(second.count(EntityKind::Bullet), 1);
    let bullet = second
        .entities
        .iter()
        .find(|entity| entity.kind == EntityKind::Bullet)
        .unwrap();
    assert_ne!(bullet.id, tank);
    assert_eq!(bullet.parent, Some(tank));
}

#[test]
fn normalizer_converges_and_holds_against_outliers() {
    let mut normalizer = RadiusNormalizer::default();
    let mut calls = 0;
    while (normalizer.apply(10.0) - 55.0).abs() > 0.05 {
        normalizer.add_anchor(10.0, 55.0);
        calls += 1;
        assert!(calls < 100, "normalizer failed to converge");
    }

    for round in 0..200 {
        if round % 3 == 0 {
            normalizer.add_anchor(10.0, 500.0);
        } else {
            normalizer.add_anchor(10.0, 55.0);
        }
    }
    assert_abs_diff_eq!(normalizer.apply(10.0), 55.0, epsilon = 0.05);
}

#[test]
fn zoomed_camera_is_calibrated_by_squares() {
    let mut pipeline = DetectionPipeline::new(
        PipelineConfig::default(),
        CameraConverter::identity(),
        ManualClock::default(),
    );
    // Two surface pixels per arena unit: a square measures 27.5 units before normalisation.
    pipeline.converter_mut().recalibrate(DVec2::ZERO, 2.0);
    let square = regular(4, DVec2::ZERO, 55.0);
    for _ in 0..60 {
        pipeline.frame_start();
        pipeline.on_polygon(&square, PaintColor::Square.to_rgba());
        pipeline.frame_end();
    }
    assert_abs_diff_eq!(pipeline.radius_factor(), 2.0, epsilon = 1e-3);

    let report = {
        pipeline.frame_start();
        pipeline.on_polygon(&regular(6, DVec2::new(400.0, 0.0), 100.0), PaintColor::Hexagon.to_rgba());
        pipeline.frame_end()
    };
    assert_eq!(report.count(EntityKind::Hexagon), 1);
}

#[test]
fn captured_trace_replays_into_reports() {
    let trace = r##"
{"kind":"frame_start"}
{"kind":"camera","focus":[0,0],"scale":1}
{"kind":"polygon","vertices":[[38.89,38.89],[-38.89,38.89],[-38.89,-38.89],[38.89,-38.89]],"fill":"#FFE869"}
{"kind":"begin_path"}
{"kind":"arc","center":[10,10],"radius":60}
{"kind":"fill","color":"#555555"}
{"kind":"arc","center":[10,10],"radius":57}
{"kind":"fill","color":"#00B2E1"}
{"kind":"arc","center":[10,10],"radius":60}
{"kind":"other","method":"stroke"}
{"kind":"frame_end"}
"##;
    let mut pipeline = pipeline();
    let reports: Vec<FrameReport> = trace
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str::<DrawEvent>(line).unwrap())
        .filter_map(|event| pipeline.handle(&event))
        .collect();

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.count(EntityKind::Square), 1);
    assert_eq!(report.count(EntityKind::Player), 1);
    assert_eq!(report.player().map(|p| p.kind), Some(EntityKind::Player));
}
