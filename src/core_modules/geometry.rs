// THEORY:
// The `geometry` module turns the raw vertex lists of intercepted polygon draws into
// the two numbers every classifier needs: where the shape is (its centroid) and how
// big it is (its radius). It plays the same role for polygons that `Chunk` plays for
// pixels in an image pipeline: pool many noisy samples into one stable summary.
//
// Radius estimator: the mean distance of each vertex from the centroid. For a
// regular n-gon this equals the circumradius, and averaging keeps a single
// perturbed vertex from dominating the estimate.
//
// Like the other leaf modules these are stateless functions of their input.

pub mod geometry {
    use glam::DVec2;

    /// Arithmetic mean of the vertices, or `None` for an empty list.
    pub fn centroid(vertices: &[DVec2]) -> Option<DVec2> {
        if vertices.is_empty() {
            return None;
        }
        let sum: DVec2 = vertices.iter().copied().sum();
        Some(sum / vertices.len() as f64)
    }

    /// Mean vertex distance from `center`.
    pub fn mean_radius(vertices: &[DVec2], center: DVec2) -> f64 {
        if vertices.is_empty() {
            return 0.0;
        }
        let total: f64 = vertices.iter().map(|v| v.distance(center)).sum();
        total / vertices.len() as f64
    }

    /// Lengths of the closed polygon's sides, in vertex order.
    pub fn side_lengths(vertices: &[DVec2]) -> Vec<f64> {
        let n = vertices.len();
        (0..n)
            .map(|i| vertices[i].distance(vertices[(i + 1) % n]))
            .collect()
    }

    /// True when every side length rounds to the same whole number.
    pub fn is_equilateral(vertices: &[DVec2]) -> bool {
        let mut rounded = side_lengths(vertices).into_iter().map(f64::round);
        match rounded.next() {
            Some(first) => first > 0.0 && rounded.all(|side| side == first),
            None => false,
        }
    }
}
