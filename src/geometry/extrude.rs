// src/geometry/extrude.rs
//! Single-shape extrusion: caps, walls and a quarter-sine bevel.
//!
//! The solid spans `z = -bevel_thickness ..= depth + bevel_thickness`; the
//! straight body is `0..=depth`. Each bevel layer pushes the contour outward
//! (away from the solid) by `bevel_size * sin(t·π/2)` while z follows
//! `bevel_thickness * cos(t·π/2)`.

use glam::{Vec2, Vec3};
use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, VertexBuffers,
};
use std::f32::consts::FRAC_PI_2;

use crate::config::GeometryParams;
use crate::error::{Error, Result};
use crate::scene::MeshData;
use crate::svg::shapes::{signed_area, Shape, MIN_AREA};

pub const MIN_BEVEL_SEGMENTS: u32 = 4;
pub const MIN_CURVE_SEGMENTS: u32 = 8;
pub const MAX_BEVEL_SEGMENTS: u32 = 64;
/// Hole shapes get a slightly larger bevel so their surfaces never coincide
/// with the surrounding solid.
pub const HOLE_BEVEL_SCALE: f32 = 1.05;
/// Caps sharp-corner miters.
const MAX_MITER: f32 = 4.0;
const CAP_TOLERANCE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrudeSpec {
    pub depth: f32,
    pub bevel_enabled: bool,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_segments: u32,
    pub curve_segments: u32,
}

impl ExtrudeSpec {
    /// Applies the segment floors: bevel ≥ 4, curve = max(8, 2n). Requests
    /// above `MAX_BEVEL_SEGMENTS` are capped.
    pub fn new(depth: f32, bevel_enabled: bool, bevel_thickness: f32, bevel_size: f32, segments: u32) -> Self {
        let segments = segments.min(MAX_BEVEL_SEGMENTS);
        Self {
            depth,
            bevel_enabled,
            bevel_thickness,
            bevel_size,
            bevel_segments: segments.max(MIN_BEVEL_SEGMENTS),
            curve_segments: (segments * 2).max(MIN_CURVE_SEGMENTS),
        }
    }

    pub fn from_params(params: &GeometryParams) -> Self {
        Self::new(
            params.depth,
            params.bevel_enabled,
            params.bevel_thickness,
            params.bevel_size,
            params.bevel_segments,
        )
    }

    pub fn for_hole(&self) -> Self {
        Self {
            bevel_thickness: self.bevel_thickness * HOLE_BEVEL_SCALE,
            bevel_size: self.bevel_size * HOLE_BEVEL_SCALE,
            ..*self
        }
    }

    fn has_bevel(&self) -> bool {
        self.bevel_enabled && (self.bevel_thickness > 0.0 || self.bevel_size > 0.0)
    }

    /// Ring layers from front (min z) to back (max z) as `(z, outward offset)`.
    pub fn layers(&self) -> Vec<(f32, f32)> {
        if !self.has_bevel() {
            return vec![(0.0, 0.0), (self.depth, 0.0)];
        }
        let n = self.bevel_segments;
        let ring = |b: u32| {
            let t = b as f32 / n as f32;
            (self.bevel_thickness * (t * FRAC_PI_2).cos(), self.bevel_size * (t * FRAC_PI_2).sin())
        };

        let mut layers = Vec::with_capacity(2 * n as usize + 2);
        layers.extend((0..n).map(|b| {
            let (z, off) = ring(b);
            (-z, off)
        }));
        layers.push((0.0, self.bevel_size));
        layers.push((self.depth, self.bevel_size));
        layers.extend((0..n).rev().map(|b| {
            let (z, off) = ring(b);
            (self.depth + z, off)
        }));
        layers
    }

    /// `(min z, max z)` of the extruded solid.
    pub fn z_extent(&self) -> (f32, f32) {
        if self.has_bevel() {
            (-self.bevel_thickness, self.depth + self.bevel_thickness)
        } else {
            (0.0, self.depth)
        }
    }
}

fn all_finite(contour: &[Vec2]) -> bool {
    contour.iter().all(|p| p.is_finite())
}

/// Extrudes one shape (y-up coordinates) into a flat-shaded solid.
/// Degenerate input is rejected with an error rather than a panic.
pub fn extrude_shape(shape: &Shape, spec: &ExtrudeSpec) -> Result<MeshData> {
    crate::ensure!(
        spec.depth.is_finite() && spec.depth > 0.0,
        "invalid extrusion depth {}",
        spec.depth
    );
    crate::ensure!(
        spec.bevel_thickness.is_finite() && spec.bevel_size.is_finite(),
        "invalid bevel dimensions"
    );
    crate::ensure!(shape.outer.len() >= 3, "outer contour has fewer than 3 points");
    crate::ensure!(all_finite(&shape.outer), "outer contour has non-finite points");
    crate::ensure!(
        signed_area(&shape.outer).abs() >= MIN_AREA,
        "outer contour has no area"
    );

    let shape = shape.clone().with_orientation_fixed();
    let mut contours: Vec<&[Vec2]> = vec![&shape.outer];
    for hole in &shape.holes {
        if hole.len() >= 3 && all_finite(hole) && signed_area(hole).abs() >= MIN_AREA {
            contours.push(hole);
        } else {
            log::warn!("Ignoring degenerate hole with {} points", hole.len());
        }
    }

    let layers = spec.layers();
    let mut mesh = MeshData::default();

    // Caps sit on the first and last layers, whose offset is always zero.
    let cap = triangulate(&contours)?;
    let (front_z, back_z) = spec.z_extent();
    let vertex = |i: u32| {
        cap.vertices
            .get(i as usize)
            .copied()
            .ok_or_else(|| Error::custom(format!("cap index {i} out of range")))
    };
    for tri in cap.indices.chunks_exact(3) {
        let [a, b, c] = [vertex(tri[0])?, vertex(tri[1])?, vertex(tri[2])?];
        let ccw = (b - a).perp_dot(c - a) > 0.0;
        let (fa, fb, fc) = if ccw { (a, c, b) } else { (a, b, c) };
        mesh.push_triangle(
            [fa.extend(front_z), fb.extend(front_z), fc.extend(front_z)],
            [fa, fb, fc],
            Vec3::NEG_Z,
        );
        let (ba, bb, bc) = if ccw { (a, b, c) } else { (a, c, b) };
        mesh.push_triangle(
            [ba.extend(back_z), bb.extend(back_z), bc.extend(back_z)],
            [ba, bb, bc],
            Vec3::Z,
        );
    }

    for contour in &contours {
        push_walls(&mut mesh, contour, &layers);
    }

    crate::ensure!(
        mesh.positions.iter().flatten().all(|v| v.is_finite()),
        "extrusion produced non-finite vertices"
    );
    crate::ensure!(!mesh.is_empty(), "extrusion produced no triangles");
    Ok(mesh)
}

/// Outward (away from the solid) normal of the edge `a → b` for correctly
/// oriented contours.
#[inline]
fn edge_normal(a: Vec2, b: Vec2) -> Vec2 {
    let d = (b - a).normalize_or_zero();
    Vec2::new(d.y, -d.x)
}

/// Per-vertex miter directions, scaled so each edge moves by one unit.
fn miter_directions(contour: &[Vec2]) -> Vec<Vec2> {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let prev = contour[(i + n - 1) % n];
            let cur = contour[i];
            let next = contour[(i + 1) % n];
            let n1 = edge_normal(prev, cur);
            let n2 = edge_normal(cur, next);
            let sum = n1 + n2;
            if sum.length_squared() < 1e-12 {
                return n1;
            }
            let m = sum.normalize();
            let cos = m.dot(n1);
            let len = if cos > 1e-6 { (1.0 / cos).min(MAX_MITER) } else { MAX_MITER };
            m * len
        })
        .collect()
}

fn push_walls(mesh: &mut MeshData, contour: &[Vec2], layers: &[(f32, f32)]) {
    let n = contour.len();
    let dirs = miter_directions(contour);
    let ring = |layer: usize, i: usize| -> Vec3 {
        let (z, off) = layers[layer];
        (contour[i] + dirs[i] * off).extend(z)
    };

    let mut run = Vec::with_capacity(n + 1);
    run.push(0.0f32);
    for i in 0..n {
        let len = contour[i].distance(contour[(i + 1) % n]);
        run.push(run[i] + len);
    }

    for l in 0..layers.len() - 1 {
        let (z0, z1) = (layers[l].0, layers[l + 1].0);
        for i in 0..n {
            let j = (i + 1) % n;
            let outward = edge_normal(contour[i], contour[j]).extend(0.0);
            let (a, b, c, d) = (ring(l, i), ring(l, j), ring(l + 1, j), ring(l + 1, i));
            let (ua, ub, uc, ud) = (
                Vec2::new(run[i], z0),
                Vec2::new(run[i + 1], z0),
                Vec2::new(run[i + 1], z1),
                Vec2::new(run[i], z1),
            );
            push_wall_triangle(mesh, [a, b, c], [ua, ub, uc], outward);
            push_wall_triangle(mesh, [a, c, d], [ua, uc, ud], outward);
        }
    }
}

fn push_wall_triangle(mesh: &mut MeshData, p: [Vec3; 3], uv: [Vec2; 3], outward: Vec3) {
    let normal = (p[1] - p[0]).cross(p[2] - p[0]);
    if normal.length_squared() < 1e-14 {
        return;
    }
    let normal = normal.normalize();
    if normal.dot(outward) >= 0.0 {
        mesh.push_triangle(p, uv, normal);
    } else {
        mesh.push_triangle([p[0], p[2], p[1]], [uv[0], uv[2], uv[1]], -normal);
    }
}

struct CapMesh {
    vertices: Vec<Vec2>,
    indices: Vec<u32>,
}

/// Even-odd fill of the outer contour minus its holes.
fn triangulate(contours: &[&[Vec2]]) -> Result<CapMesh> {
    let mut builder = Path::builder();
    for contour in contours {
        builder.begin(point(contour[0].x, contour[0].y));
        for p in &contour[1..] {
            builder.line_to(point(p.x, p.y));
        }
        builder.end(true);
    }
    let path = builder.build();

    let mut buffers: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    let options = FillOptions::default()
        .with_fill_rule(FillRule::EvenOdd)
        .with_tolerance(CAP_TOLERANCE);
    FillTessellator::new()
        .tessellate_path(
            &path,
            &options,
            &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| {
                let p = v.position();
                Vec2::new(p.x, p.y)
            }),
        )
        .map_err(|e| Error::custom(format!("cap tessellation failed: {e:?}")))?;

    crate::ensure!(!buffers.indices.is_empty(), "cap tessellation produced no triangles");
    Ok(CapMesh {
        vertices: buffers.vertices,
        indices: buffers.indices,
    })
}
