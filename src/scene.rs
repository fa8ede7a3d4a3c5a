// src/scene.rs
// Render tree handed to the compositor: a model group of extruded meshes.
// Meshes own their geometry and share materials; the group owns the meshes.

use glam::{Mat4, Vec2, Vec3};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::color::Rgb;
use crate::error::Result;
use crate::materials::Material;
use crate::renderer::GpuGeometry;
use crate::resource_manager::{
    Disposable, DisposeFlag, GpuResident, GpuSlot, ResourceKind,
};

/// Axis-aligned bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut b, p| {
            b.extend(p);
            b
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    #[inline]
    pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Box enclosing the 8 transformed corners.
    pub fn transformed(&self, m: &Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let (a, b) = (self.min, self.max);
        Aabb::from_points((0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { a.x } else { b.x },
                if i & 2 == 0 { a.y } else { b.y },
                if i & 4 == 0 { a.z } else { b.z },
            );
            m.transform_point3(corner)
        }))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// CPU-side triangle mesh (flat-shaded: vertices are not shared between faces).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().map(|p| Vec3::from_array(*p)))
    }

    /// Appends one triangle with a shared face normal.
    pub fn push_triangle(&mut self, p: [Vec3; 3], uv: [Vec2; 3], normal: Vec3) {
        let base = self.positions.len() as u32;
        for i in 0..3 {
            self.positions.push(p[i].to_array());
            self.normals.push(normal.to_array());
            self.uvs.push(uv[i].to_array());
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
}

/// Extruded geometry for one shape.
pub struct Geometry {
    label: String,
    data: MeshData,
    bounds: Aabb,
    gpu: GpuSlot<GpuGeometry>,
    disposed: DisposeFlag,
}

impl fmt::Debug for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Geometry")
            .field("label", &self.label)
            .field("vertices", &self.data.vertex_count())
            .field("bounds", &self.bounds)
            .field("disposed", &self.disposed.is_set())
            .finish()
    }
}

impl Geometry {
    pub fn new(label: impl Into<String>, data: MeshData) -> Self {
        let bounds = data.bounds();
        Self {
            label: label.into(),
            data,
            bounds,
            gpu: GpuSlot::new(),
            disposed: DisposeFlag::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn data(&self) -> &MeshData {
        &self.data
    }

    /// Local-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn is_resident(&self) -> bool {
        self.gpu.is_resident()
    }

    pub fn upload(&self, device: &wgpu::Device) -> Result<bool> {
        crate::ensure!(
            !self.disposed.is_set(),
            "geometry '{}' used after disposal",
            self.label
        );
        if self.gpu.is_resident() {
            return Ok(false);
        }
        self.gpu.set(GpuGeometry::new(device, &self.label, &self.data));
        Ok(true)
    }

    pub fn with_gpu<R>(&self, f: impl FnOnce(&GpuGeometry) -> R) -> Option<R> {
        self.gpu.with(f)
    }
}

impl Disposable for Geometry {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Geometry
    }

    fn dispose(&self) -> Result<()> {
        self.disposed.mark(&self.label)?;
        self.gpu.release();
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed.is_set()
    }
}

impl GpuResident for Geometry {
    fn release_gpu(&self) {
        self.gpu.release();
    }
}

/// One extruded shape with its material.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub geometry: Arc<Geometry>,
    pub material: Arc<Material>,
    /// Source fill color (before any override), used to re-synthesize materials.
    pub color: Rgb,
    pub is_hole: bool,
    pub path_index: usize,
    /// Offset inside the group (centering + depth placement).
    pub position: Vec3,
    pub render_order: i32,
}

impl Mesh {
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_translation(self.position)
    }
}

/// The composite model: uniformly scaled group of meshes in render order.
pub struct ModelGroup {
    meshes: Vec<Mesh>,
    scale: f32,
    natural_size: Vec2,
    disposed: DisposeFlag,
}

impl fmt::Debug for ModelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelGroup")
            .field("meshes", &self.meshes.len())
            .field("scale", &self.scale)
            .field("disposed", &self.disposed.is_set())
            .finish()
    }
}

impl ModelGroup {
    pub fn new(mut meshes: Vec<Mesh>, scale: f32, natural_size: Vec2) -> Self {
        meshes.sort_by_key(|m| m.render_order);
        Self {
            meshes,
            scale,
            natural_size,
            disposed: DisposeFlag::new(),
        }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Width/height the source document declared.
    pub fn natural_size(&self) -> Vec2 {
        self.natural_size
    }

    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(self.scale))
    }

    pub fn world_transform(&self, mesh: &Mesh) -> Mat4 {
        self.transform() * mesh.local_transform()
    }

    /// World-space bounds of every mesh.
    pub fn bounds(&self) -> Aabb {
        self.meshes.iter().fold(Aabb::EMPTY, |acc, m| {
            acc.union(&m.geometry.bounds().transformed(&self.world_transform(m)))
        })
    }

    /// Distinct materials, in first-use order.
    pub fn materials(&self) -> Vec<Arc<Material>> {
        let mut seen = HashSet::new();
        self.meshes
            .iter()
            .filter(|m| seen.insert(Arc::as_ptr(&m.material) as usize))
            .map(|m| Arc::clone(&m.material))
            .collect()
    }

    /// Same geometry and placement, new materials.
    pub fn with_materials(&self, mut material_for: impl FnMut(&Mesh) -> Arc<Material>) -> ModelGroup {
        let meshes = self
            .meshes
            .iter()
            .map(|m| Mesh {
                material: material_for(m),
                ..m.clone()
            })
            .collect();
        ModelGroup::new(meshes, self.scale, self.natural_size)
    }

    /// Frees geometry only; materials stay with their cache.
    pub fn dispose_geometry(&self) {
        for mesh in &self.meshes {
            if !mesh.geometry.is_disposed() {
                let _ = mesh.geometry.dispose();
            }
        }
    }
}

impl Disposable for ModelGroup {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Group
    }

    /// Disposes every mesh's geometry and material.
    fn dispose(&self) -> Result<()> {
        self.disposed.mark("model group")?;
        self.dispose_geometry();
        for material in self.materials() {
            if !material.is_disposed() {
                let _ = material.dispose();
            }
        }
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed.is_set()
    }
}
