//! # utils
//! Contains utility functions shared by the RRT variants
//!
use crate::common::Point;
use geo::{coord, Coord, Rect};
use nalgebra::Vector2;
use rand::Rng;
use rand_chacha::ChaChaRng;

pub fn distance(a: &Point, b: &Point) -> f64 {
    (b - a).norm()
}

/// Point `step` units from `source` along the straight line towards `destination`.
/// The caller must make sure the two points are distinct.
pub fn move_towards(source: &Point, destination: &Point, step: f64) -> Point {
    let dist = distance(source, destination);
    source + (step / dist) * (destination - source)
}

pub fn bbox_from_corner_points(
    p1: &Point,
    p2: &Point,
    buffer_x: f64,
    buffer_y: f64,
) -> Rect<f64> {
    let p_min = Vector2::new(p1[0].min(p2[0]) - buffer_x, p1[1].min(p2[1]) - buffer_y);
    let p_max = Vector2::new(p1[0].max(p2[0]) + buffer_x, p1[1].max(p2[1]) + buffer_y);
    Rect::new(
        coord! { x: p_min[0], y: p_min[1]},
        coord! { x: p_max[0], y: p_max[1]},
    )
}

/// Uniform sample in the half-open box `[min.x, max.x) x [min.y, max.y)`
pub fn sample_from_bbox(bbox: &Rect<f64>, rng: &mut ChaChaRng) -> Point {
    let x = rng.gen_range(bbox.min().x..bbox.max().x);
    let y = rng.gen_range(bbox.min().y..bbox.max().y);
    Vector2::new(x, y)
}

pub fn compute_path_length(points: &[Point]) -> f64 {
    points
        .iter()
        .zip(points.iter().skip(1))
        .map(|(p1, p2)| distance(p1, p2))
        .sum()
}

pub fn to_coord(p: &Point) -> Coord<f64> {
    coord! { x: p[0], y: p[1] }
}

pub fn to_point(c: Coord<f64>) -> Point {
    Vector2::new(c.x, c.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    #[test]
    fn test_move_towards() {
        let p = move_towards(&Vector2::new(0.0, 0.0), &Vector2::new(10.0, 0.0), 5.0);
        assert_eq!(p, Vector2::new(5.0, 0.0));

        let p = move_towards(&Vector2::new(1.0, 1.0), &Vector2::new(4.0, 5.0), 2.5);
        assert_relative_eq!(distance(&Vector2::new(1.0, 1.0), &p), 2.5, epsilon = 1e-12);
        assert_relative_eq!(p[0], 2.5, epsilon = 1e-12);
        assert_relative_eq!(p[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bbox_from_corner_points() {
        let bbox =
            bbox_from_corner_points(&Vector2::new(10.0, 2.0), &Vector2::new(0.0, 8.0), 1.0, 2.0);
        assert_eq!(bbox.min(), coord! {x: -1.0, y: 0.0});
        assert_eq!(bbox.max(), coord! {x: 11.0, y: 10.0});
    }

    #[test]
    fn test_sample_from_bbox() {
        let bbox = Rect::new(coord! {x: 0.0, y: 0.0}, coord! {x: 100.0, y: 50.0});
        let mut rng = ChaChaRng::seed_from_u64(0);
        for _ in 0..1000 {
            let p = sample_from_bbox(&bbox, &mut rng);
            assert!(p[0] >= 0.0 && p[0] < 100.0);
            assert!(p[1] >= 0.0 && p[1] < 50.0);
        }
    }

    #[test]
    fn test_compute_path_length() {
        let path = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(3.0, 4.0),
            Vector2::new(3.0, 10.0),
        ];
        assert_relative_eq!(compute_path_length(&path), 11.0);
        assert_eq!(compute_path_length(&path[..1]), 0.0);
        assert_eq!(compute_path_length(&[]), 0.0);
    }
}
