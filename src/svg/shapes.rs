// src/svg/shapes.rs
//! Polygon cleanup and hole assignment.

use glam::Vec2;

use super::parser::FillRule;

/// Polygons smaller than this (in document units²) are degenerate.
pub const MIN_AREA: f32 = 1e-9;

/// A closed outer contour with zero or more holes.
///
/// Outer contours are counter-clockwise (positive signed area); holes wind
/// the other way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub outer: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
}

impl Shape {
    pub fn new(outer: Vec<Vec2>, holes: Vec<Vec<Vec2>>) -> Self {
        Self { outer, holes }
    }

    pub fn point_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }

    /// Bounds of the outer contour (holes are inside it).
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        bounds(&self.outer)
    }

    pub fn area(&self) -> f32 {
        signed_area(&self.outer).abs() - self.holes.iter().map(|h| signed_area(h).abs()).sum::<f32>()
    }

    /// Is `p` inside the filled region (inside outer, outside every hole)?
    pub fn contains_point(&self, p: Vec2) -> bool {
        point_in_polygon(p, &self.outer) && !self.holes.iter().any(|h| point_in_polygon(p, h))
    }

    /// True if every outer point of `other` lies in this shape's outer contour.
    pub fn encloses(&self, other: &Shape) -> bool {
        !other.outer.is_empty() && other.outer.iter().all(|p| point_in_polygon(*p, &self.outer))
    }

    pub fn with_orientation_fixed(mut self) -> Self {
        orient(&mut self.outer, true);
        for hole in &mut self.holes {
            orient(hole, false);
        }
        self
    }
}

/// Shoelace area; positive for counter-clockwise in a y-up frame.
pub fn signed_area(poly: &[Vec2]) -> f32 {
    if poly.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Even-odd ray cast.
pub fn point_in_polygon(p: Vec2, poly: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = poly.len().wrapping_sub(1);
    for i in 0..poly.len() {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn bounds(points: &[Vec2]) -> Option<(Vec2, Vec2)> {
    let first = *points.first()?;
    Some(points.iter().fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))))
}

/// Mean of the points (the "centroid" used for spread).
pub fn centroid(points: &[Vec2]) -> Option<Vec2> {
    if points.is_empty() {
        return None;
    }
    Some(points.iter().copied().sum::<Vec2>() / points.len() as f32)
}

fn orient(poly: &mut [Vec2], ccw: bool) {
    if (signed_area(poly) > 0.0) != ccw {
        poly.reverse();
    }
}

/// Drops repeated and non-finite points; `None` if what remains is degenerate.
pub fn clean_polygon(points: &[Vec2]) -> Option<Vec<Vec2>> {
    let mut out: Vec<Vec2> = Vec::with_capacity(points.len());
    for p in points {
        if !p.is_finite() {
            continue;
        }
        if out.last().map_or(true, |last| last.distance_squared(*p) > f32::EPSILON) {
            out.push(*p);
        }
    }
    while out.len() > 1 && out[0].distance_squared(out[out.len() - 1]) <= f32::EPSILON {
        out.pop();
    }
    (out.len() >= 3 && signed_area(&out).abs() >= MIN_AREA).then_some(out)
}

/// Groups a path's flattened sub-polygons into shapes.
///
/// `EvenOdd`: a polygon nested inside an odd number of others is a hole of
/// its innermost container. `NonZero`: a polygon winding against the path's
/// dominant direction, inside a dominant-direction polygon, is a hole of the
/// smallest such container. Everything else is an outer contour.
pub fn build_shapes(polygons: Vec<Vec<Vec2>>, rule: FillRule) -> Vec<Shape> {
    let total = polygons.len();
    let polys: Vec<Vec<Vec2>> = polygons.iter().filter_map(|p| clean_polygon(p)).collect();
    if polys.len() < total {
        log::warn!("Dropped {} degenerate sub-polygon(s)", total - polys.len());
    }
    if polys.is_empty() {
        return Vec::new();
    }

    let areas: Vec<f32> = polys.iter().map(|p| signed_area(p)).collect();

    // containers[i]: polygons strictly containing i, smallest first.
    let containers: Vec<Vec<usize>> = (0..polys.len())
        .map(|i| {
            let mut inside: Vec<usize> = (0..polys.len())
                .filter(|&j| {
                    j != i
                        && areas[j].abs() > areas[i].abs()
                        && polys[i].iter().all(|p| point_in_polygon(*p, &polys[j]))
                })
                .collect();
            inside.sort_by(|a, b| areas[*a].abs().total_cmp(&areas[*b].abs()));
            inside
        })
        .collect();

    // parent[i] = Some(outer) when i is a hole.
    let parent: Vec<Option<usize>> = match rule {
        FillRule::EvenOdd => (0..polys.len())
            .map(|i| (containers[i].len() % 2 == 1).then(|| containers[i][0]))
            .collect(),
        FillRule::NonZero => {
            let dominant = areas
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .map_or(1.0, f32::signum);
            (0..polys.len())
                .map(|i| {
                    if areas[i].signum() == dominant {
                        return None;
                    }
                    containers[i]
                        .iter()
                        .copied()
                        .find(|&j| areas[j].signum() == dominant)
                })
                .collect()
        }
    };

    let mut shapes: Vec<Option<Shape>> = polys
        .iter()
        .enumerate()
        .map(|(i, poly)| parent[i].is_none().then(|| Shape::new(poly.clone(), Vec::new())))
        .collect();

    for (i, poly) in polys.into_iter().enumerate() {
        if let Some(outer) = parent[i] {
            if let Some(shape) = shapes[outer].as_mut() {
                shape.holes.push(poly);
            }
        }
    }

    shapes
        .into_iter()
        .flatten()
        .map(Shape::with_orientation_fixed)
        .collect()
}
