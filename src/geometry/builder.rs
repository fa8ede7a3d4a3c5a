// src/geometry/builder.rs
//! Composite model assembly.
//!
//! Shapes are collected from the parsed document, spread, extruded one by
//! one and placed so the whole model is centered on the origin. Centering
//! uses the flat outlines (a cheap proxy) rather than the extruded meshes.

use glam::{Vec2, Vec3};
use std::sync::Arc;

use super::extrude::{extrude_shape, ExtrudeSpec};
use crate::color::Rgb;
use crate::error::Error;
use crate::scene::Geometry;
use crate::spread::apply_spread;
use crate::svg::shapes::{bounds, Shape};
use crate::svg::ParsedSvg;

/// Largest planar dimension of every built model.
pub const REFERENCE_SIZE: f32 = 100.0;

/// A shape ready for extrusion.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeInput {
    pub shape: Shape,
    pub color: Rgb,
    pub is_hole: bool,
    pub path_index: usize,
}

/// Turns parsed paths into shape inputs, in document order.
///
/// With `hole_detection`, every interior hole is also emitted as its own
/// hole shape, and a path lying entirely on an earlier path's solid area is
/// flagged as a hole.
pub fn collect_shapes(parsed: &ParsedSvg, curve_segments: u32, hole_detection: bool) -> Vec<ShapeInput> {
    let mut inputs: Vec<ShapeInput> = Vec::new();

    for path in &parsed.paths {
        let shapes = path.to_shapes(curve_segments);
        if shapes.is_empty() {
            log::warn!("Path {} produced no closed shapes; skipped", path.index);
            continue;
        }

        let path_is_hole = hole_detection
            && shapes.iter().all(|shape| {
                inputs
                    .iter()
                    .filter(|earlier| !earlier.is_hole)
                    .any(|earlier| {
                        earlier.shape.encloses(shape)
                            && earlier.shape.contains_point(shape.outer[0])
                    })
            });

        for shape in shapes {
            if hole_detection && !path_is_hole {
                for hole in &shape.holes {
                    inputs.push(ShapeInput {
                        shape: Shape::new(hole.clone(), Vec::new()).with_orientation_fixed(),
                        color: path.color,
                        is_hole: true,
                        path_index: path.index,
                    });
                }
            }
            inputs.push(ShapeInput {
                shape,
                color: path.color,
                is_hole: path_is_hole,
                path_index: path.index,
            });
        }
    }
    inputs
}

/// Applies spread to every input.
pub fn spread_shapes(inputs: Vec<ShapeInput>, amount_percent: f32) -> Vec<ShapeInput> {
    if amount_percent == 0.0 {
        return inputs;
    }
    inputs
        .into_iter()
        .map(|input| ShapeInput {
            shape: apply_spread(input.shape, input.is_hole, amount_percent),
            ..input
        })
        .collect()
}

/// One extruded, positioned shape.
#[derive(Debug, Clone)]
pub struct BuiltPart {
    pub geometry: Arc<Geometry>,
    pub color: Rgb,
    pub is_hole: bool,
    pub path_index: usize,
    pub position: Vec3,
    pub render_order: i32,
}

#[derive(Debug, Clone, Default)]
pub struct BuiltModel {
    pub parts: Vec<BuiltPart>,
    /// Uniform scale mapping the largest planar dimension to `REFERENCE_SIZE`.
    pub scale: f32,
    /// Proxy bounds (y-up) before centering.
    pub proxy_bounds: Option<(Vec2, Vec2)>,
    /// Shapes that failed to extrude.
    pub skipped: usize,
}

/// SVG y-down → 3D y-up.
fn flip_y(shape: &Shape) -> Shape {
    let flip = |pts: &Vec<Vec2>| pts.iter().map(|p| Vec2::new(p.x, -p.y)).collect::<Vec<_>>();
    Shape::new(flip(&shape.outer), shape.holes.iter().map(flip).collect())
}

/// Extrudes every input and positions the results. Failing shapes are
/// logged and skipped.
pub fn build_model(inputs: &[ShapeInput], spec: &ExtrudeSpec) -> BuiltModel {
    let flipped: Vec<Shape> = inputs.iter().map(|i| flip_y(&i.shape)).collect();

    let all_points: Vec<Vec2> = flipped.iter().flat_map(|s| s.outer.iter().copied()).collect();
    let Some((min, max)) = bounds(&all_points) else {
        return BuiltModel {
            scale: 1.0,
            ..BuiltModel::default()
        };
    };
    let center = (min + max) * 0.5;
    let extent = (max - min).max_element();
    let scale = if extent > f32::EPSILON {
        REFERENCE_SIZE / extent
    } else {
        1.0
    };

    let hole_spec = spec.for_hole();
    let mut parts = Vec::with_capacity(inputs.len());
    let mut skipped = 0;

    for (n, (input, shape)) in inputs.iter().zip(&flipped).enumerate() {
        let spec = if input.is_hole { &hole_spec } else { spec };
        let data = match extrude_shape(shape, spec) {
            Ok(data) => data,
            Err(err) => {
                let err = Error::ShapeBuild {
                    index: input.path_index,
                    reason: err.to_string(),
                };
                log::warn!("{}; skipped", err);
                skipped += 1;
                continue;
            }
        };

        let z = if input.is_hole {
            -spec.depth / 4.0
        } else {
            -spec.depth / 2.0
        };
        let label = format!("path{}_shape{}{}", input.path_index, n, if input.is_hole { "_hole" } else { "" });
        parts.push(BuiltPart {
            geometry: Arc::new(Geometry::new(label, data)),
            color: input.color,
            is_hole: input.is_hole,
            path_index: input.path_index,
            position: Vec3::new(-center.x, -center.y, z),
            render_order: render_order(input.path_index, input.is_hole),
        });
    }

    log::debug!(
        "Built {} mesh(es), {} skipped, scale {:.4}",
        parts.len(),
        skipped,
        scale
    );

    BuiltModel {
        parts,
        scale,
        proxy_bounds: Some((min, max)),
        skipped,
    }
}

/// Ascending by path; within a path, solids draw before holes.
#[inline]
pub fn render_order(path_index: usize, is_hole: bool) -> i32 {
    (path_index as i32) * 2 + is_hole as i32
}
