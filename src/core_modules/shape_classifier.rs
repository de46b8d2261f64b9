// THEORY:
// The `ShapeClassifier` is the engine of the detection layer. It turns a single
// intercepted draw into a single `Detection`: a provisional kind, an arena
// position, and the traits (colour, radii, source) that describe it.
//
// Pipeline, identical for every primitive:
// 1.  **Measure**: centroid and radius from the raw geometry (mean vertex distance
//     for polygons, the outline arc for circles).
// 2.  **Convert**: both values move from surface space into arena space through the
//     injected `CoordinateConverter`.
// 3.  **Normalise**: the radius is corrected by the `RadiusNormalizer`, producing the
//     canonical radius the classification bands are expressed in.
// 4.  **Classify**: one handler per arity switches on the `PaintColor` and checks the
//     normalised radius against that colour's bands.
// 5.  **Calibrate**: shapes whose canonical size is certain feed an anchor back into
//     the normaliser. Circles never do; tank and bullet sizes vary too much.
//
// Geometry that fails a structural check (non-equilateral triangles, the black arrow
// indicator, non-finite measurements) is dropped here and never reaches the
// resolver. Geometry that is well-formed but matches no band is kept as `Unknown`.

use crate::core_modules::circle_sequence::CircleSighting;
use crate::core_modules::collaborators::CoordinateConverter;
use crate::core_modules::detection::{Detection, DetectionSource, Traits};
use crate::core_modules::entity::EntityKind;
use crate::core_modules::geometry::geometry;
use crate::core_modules::paint::paint::{PaintColor, Rgba8};
use crate::core_modules::radius_normalizer::RadiusNormalizer;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A canonical radius and the window around it that still counts as a match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub canonical: f64,
    pub tolerance: f64,
}

impl Band {
    pub const fn new(canonical: f64, tolerance: f64) -> Self {
        Self {
            canonical,
            tolerance,
        }
    }

    pub fn contains(&self, radius: f64) -> bool {
        (radius - self.canonical).abs() <= self.tolerance
    }
}

/// Classification bands, in canonical arena units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeBands {
    /// Team-coloured triangles: the three drone sizes.
    pub drone_triangles: [Band; 3],
    pub small_crasher: Band,
    pub large_crasher: Band,
    pub triangle: Band,
    /// Square shapes; team or necromancer squares in this band are drones.
    pub square: Band,
    pub pentagon: f64,
    pub alpha_pentagon: f64,
    pub hexagon: Band,
    /// Circles strictly larger than this are players, the rest bullets.
    pub player_radius_threshold: f64,
}

impl Default for ShapeBands {
    fn default() -> Self {
        Self {
            drone_triangles: [Band::new(23.0, 5.0), Band::new(30.0, 5.0), Band::new(45.0, 5.0)],
            small_crasher: Band::new(35.0, 6.0),
            large_crasher: Band::new(55.0, 8.0),
            triangle: Band::new(55.0, 8.0),
            square: Band::new(55.0, 8.0),
            pentagon: 75.0,
            alpha_pentagon: 200.0,
            hexagon: Band::new(100.0, 10.0),
            player_radius_threshold: 53.0,
        }
    }
}

/// Arena-space summary of one primitive, before classification.
#[derive(Debug, Clone, Copy)]
struct Measurement {
    position: DVec2,
    radius_raw: f64,
    radius: f64,
    color: PaintColor,
}

impl Measurement {
    fn into_detection(self, kind: EntityKind, source: DetectionSource) -> Detection {
        Detection::new(
            kind,
            self.position,
            Traits {
                color: Some(self.color),
                radius: Some(self.radius),
                radius_raw: Some(self.radius_raw),
                source: Some(source),
            },
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShapeClassifier {
    bands: ShapeBands,
}

impl ShapeClassifier {
    pub fn new(bands: ShapeBands) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &ShapeBands {
        &self.bands
    }

    /// Classifies a completed polygon draw. Returns `None` for arities the engine
    /// does not track and for geometry rejected outright.
    pub fn classify_polygon(
        &self,
        vertices: &[DVec2],
        fill: Rgba8,
        converter: &impl CoordinateConverter,
        normalizer: &mut RadiusNormalizer,
    ) -> Option<Detection> {
        let source = DetectionSource::for_arity(vertices.len())?;
        let measurement = measure_polygon(vertices, fill, converter, normalizer)?;

        let kind = match source {
            DetectionSource::Triangle => self.triangle(vertices, &measurement, normalizer)?,
            DetectionSource::Square => self.square(&measurement, normalizer),
            DetectionSource::Pentagon => self.pentagon(&measurement, normalizer),
            DetectionSource::Hexagon => self.hexagon(&measurement, normalizer),
            DetectionSource::Circle => return None,
        };
        Some(measurement.into_detection(kind, source))
    }

    /// Classifies a completed circle run as a player or a bullet.
    pub fn classify_circle(
        &self,
        sighting: &CircleSighting,
        converter: &impl CoordinateConverter,
        normalizer: &RadiusNormalizer,
    ) -> Option<Detection> {
        let measurement = measure(
            sighting.center,
            sighting.radius,
            sighting.fill,
            converter,
            normalizer,
        )?;
        let kind = if measurement.radius > self.bands.player_radius_threshold {
            EntityKind::Player
        } else {
            EntityKind::Bullet
        };
        Some(measurement.into_detection(kind, DetectionSource::Circle))
    }

    fn triangle(
        &self,
        vertices: &[DVec2],
        measurement: &Measurement,
        normalizer: &mut RadiusNormalizer,
    ) -> Option<EntityKind> {
        if measurement.color == PaintColor::Black {
            return None;
        }
        if !geometry::is_equilateral(vertices) {
            log::trace!("dropping non-equilateral triangle at {}", measurement.position);
            return None;
        }

        let radius = measurement.radius;
        let kind = match measurement.color {
            PaintColor::Crasher
                if self.bands.small_crasher.contains(radius)
                    || self.bands.large_crasher.contains(radius) =>
            {
                EntityKind::Crasher
            }
            PaintColor::Triangle if self.bands.triangle.contains(radius) => {
                normalizer.anchor_if_close(
                    measurement.radius_raw,
                    self.bands.triangle.canonical,
                    self.bands.triangle.tolerance,
                );
                EntityKind::Triangle
            }
            color
                if color.is_team()
                    && self.bands.drone_triangles.iter().any(|band| band.contains(radius)) =>
            {
                EntityKind::Drone
            }
            _ => EntityKind::Unknown,
        };
        Some(kind)
    }

    fn square(&self, measurement: &Measurement, normalizer: &mut RadiusNormalizer) -> EntityKind {
        match measurement.color {
            PaintColor::Square => {
                normalizer.add_anchor(measurement.radius_raw, self.bands.square.canonical);
                EntityKind::Square
            }
            color
                if (color.is_team() || color == PaintColor::NecromancerDrone)
                    && self.bands.square.contains(measurement.radius) =>
            {
                EntityKind::Drone
            }
            _ => EntityKind::Unknown,
        }
    }

    fn pentagon(&self, measurement: &Measurement, normalizer: &mut RadiusNormalizer) -> EntityKind {
        if measurement.color != PaintColor::Pentagon {
            return EntityKind::Unknown;
        }

        let to_pentagon = (measurement.radius - self.bands.pentagon).abs();
        let to_alpha = (measurement.radius - self.bands.alpha_pentagon).abs();
        let (canonical, kind) = if to_alpha < to_pentagon {
            (self.bands.alpha_pentagon, EntityKind::AlphaPentagon)
        } else {
            (self.bands.pentagon, EntityKind::Pentagon)
        };
        normalizer.add_anchor(measurement.radius_raw, canonical);
        kind
    }

    fn hexagon(&self, measurement: &Measurement, normalizer: &mut RadiusNormalizer) -> EntityKind {
        let band = self.bands.hexagon;
        if measurement.color == PaintColor::Hexagon && band.contains(measurement.radius) {
            normalizer.anchor_if_close(measurement.radius_raw, band.canonical, band.tolerance);
            EntityKind::Hexagon
        } else {
            EntityKind::Unknown
        }
    }
}

fn measure_polygon(
    vertices: &[DVec2],
    fill: Rgba8,
    converter: &impl CoordinateConverter,
    normalizer: &RadiusNormalizer,
) -> Option<Measurement> {
    let center = geometry::centroid(vertices)?;
    let radius = geometry::mean_radius(vertices, center);
    measure(center, radius, fill, converter, normalizer)
}

fn measure(
    surface_center: DVec2,
    surface_radius: f64,
    fill: Rgba8,
    converter: &impl CoordinateConverter,
    normalizer: &RadiusNormalizer,
) -> Option<Measurement> {
    let position = converter.to_arena_position(surface_center);
    let radius_raw = converter.to_arena_units(surface_radius);
    if !position.is_finite() || !radius_raw.is_finite() || radius_raw <= 0.0 {
        return None;
    }
    Some(Measurement {
        position,
        radius_raw,
        radius: normalizer.apply(radius_raw),
        color: PaintColor::from_rgba(fill),
    })
}
