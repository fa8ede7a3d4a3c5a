// src/spread.rs
//! Centroid-relative scaling of shape contours ("spread").
//!
//! Widens the visible gap between hole shapes and the solids around them.
//! The outer contour of a solid never moves; a hole shape shrinks towards
//! its own centroid by `1 - amount/100`; the interior holes of any shape
//! grow around their own centroids by `1 + amount/200`.

use glam::Vec2;

use crate::svg::shapes::{centroid, Shape};

/// Scale applied to the outer contour of a hole shape.
#[inline]
pub fn hole_scale(amount_percent: f32) -> f32 {
    1.0 - amount_percent / 100.0
}

/// Scale applied to interior hole contours.
#[inline]
pub fn interior_hole_scale(amount_percent: f32) -> f32 {
    1.0 + amount_percent / 200.0
}

/// Applies spread to `shape`. Zero amount, and shapes with fewer than three
/// outer points, come back unchanged.
pub fn apply_spread(shape: Shape, is_hole: bool, amount_percent: f32) -> Shape {
    if amount_percent == 0.0 || !amount_percent.is_finite() || shape.outer.len() < 3 {
        return shape;
    }

    let outer = if is_hole {
        scale_about_centroid(shape.outer, hole_scale(amount_percent))
    } else {
        shape.outer
    };

    let inner = interior_hole_scale(amount_percent);
    let holes = shape
        .holes
        .into_iter()
        .map(|hole| {
            if hole.len() < 3 {
                hole
            } else {
                scale_about_centroid(hole, inner)
            }
        })
        .collect();

    Shape { outer, holes }
}

fn scale_about_centroid(mut points: Vec<Vec2>, factor: f32) -> Vec<Vec2> {
    if factor == 1.0 {
        return points;
    }
    if let Some(c) = centroid(&points) {
        for p in &mut points {
            *p = c + (*p - c) * factor;
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> Shape {
        Shape::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(10.0, 0.0),
                Vec2::new(10.0, 10.0),
                Vec2::new(0.0, 10.0),
            ],
            vec![vec![
                Vec2::new(3.0, 7.0),
                Vec2::new(7.0, 7.0),
                Vec2::new(7.0, 3.0),
                Vec2::new(3.0, 3.0),
            ]],
        )
    }

    fn mean_radius(points: &[Vec2]) -> f32 {
        let c = centroid(points).unwrap();
        points.iter().map(|p| p.distance(c)).sum::<f32>() / points.len() as f32
    }

    #[test]
    fn test_zero_amount_is_identity() {
        for is_hole in [false, true] {
            assert_eq!(apply_spread(ring(), is_hole, 0.0), ring());
        }
    }

    #[test]
    fn test_degenerate_shape_passthrough() {
        let line = Shape::new(vec![Vec2::ZERO, Vec2::new(4.0, 1.0)], vec![]);
        for amount in [0.0, 25.0, 100.0] {
            assert_eq!(apply_spread(line.clone(), true, amount), line);
        }
    }

    #[test]
    fn test_solid_outer_is_never_scaled() {
        let spread = apply_spread(ring(), false, 40.0);
        assert_eq!(spread.outer, ring().outer);
        // Interior hole grows by 1 + 40/200.
        let before = mean_radius(&ring().holes[0]);
        let after = mean_radius(&spread.holes[0]);
        assert!((after / before - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_hole_shrink_is_monotonic() {
        let mut last = f32::INFINITY;
        for step in 0..=10 {
            let amount = step as f32 * 10.0;
            let r = mean_radius(&apply_spread(ring(), true, amount).outer);
            if step > 0 {
                assert!(r < last, "radius {r} at {amount}% not below {last}");
            }
            last = r;
        }
    }

    #[test]
    fn test_hole_scales_around_own_centroid() {
        let spread = apply_spread(ring(), true, 50.0);
        assert_eq!(centroid(&spread.outer), Some(Vec2::new(5.0, 5.0)));
        assert_eq!(spread.outer[0], Vec2::new(2.5, 2.5));
    }
}
