// src/renderer.rs
// GPU residency for built models.
// Uploads geometry, textures and material bind groups for a `ModelGroup` and
// drops every GPU copy when the context is lost. Drawing belongs to the host
// compositor, which binds `GpuGeometry` buffers with `Vertex::layout()` and the
// material group from `pbr_materials::bind_group_layout`.

use bytemuck::{Pod, Zeroable};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use wgpu::util::DeviceExt;

use crate::context::OptionContext;
use crate::error::Result;
use crate::pbr_materials;
use crate::resource_manager::{ContextController, GpuRelease, GpuResident};
use crate::scene::{MeshData, ModelGroup};
use crate::texture::TextureData;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Interleaves the mesh streams.
pub fn interleave(data: &MeshData) -> Vec<Vertex> {
    data.positions
        .iter()
        .zip(&data.normals)
        .zip(&data.uvs)
        .map(|((&position, &normal), &uv)| Vertex { position, normal, uv })
        .collect()
}

pub struct GpuGeometry {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuGeometry {
    pub fn new(device: &wgpu::Device, label: &str, data: &MeshData) -> Self {
        let vertices = interleave(data);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }
}

impl GpuRelease for GpuGeometry {
    fn release(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// What one `prepare` call uploaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareStats {
    pub geometries: usize,
    pub materials: usize,
    pub indices: u64,
}

pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    material_layout: wgpu::BindGroupLayout,
    /// 1×1 white, bound to empty texture slots.
    fallback: Arc<TextureData>,
    lost: AtomicBool,
    resident: Mutex<Vec<Weak<dyn GpuResident>>>,
}

impl Renderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let material_layout = pbr_materials::bind_group_layout(&device);
        Self {
            device,
            queue,
            material_layout,
            fallback: Arc::new(TextureData::solid("fallback_white", [255, 255, 255, 255])),
            lost: AtomicBool::new(false),
            resident: Mutex::new(Vec::new()),
        }
    }

    /// Device without a surface, for offline preparation and tests.
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn headless() -> Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .context("no suitable GPU adapter")?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await
            .map_err(|e| crate::error::Error::format(format_args!("request_device failed: {e}")))?;
        Ok(Self::new(device, queue))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    pub fn is_context_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Uploads everything the group needs that is not resident yet.
    /// Does nothing while the context is lost.
    pub fn prepare(&self, group: &ModelGroup) -> Result<PrepareStats> {
        let mut stats = PrepareStats::default();
        if self.is_context_lost() {
            log::debug!("Context lost; skipping upload");
            return Ok(stats);
        }

        self.fallback.upload(&self.device, &self.queue, false)?;
        let fallback = self.fallback.gpu().context("fallback texture not resident")?;

        let mut resident = self.resident.lock();
        for mesh in group.meshes() {
            if mesh.geometry.upload(&self.device)? {
                stats.geometries += 1;
                let weak: Weak<dyn GpuResident> = Arc::downgrade(&mesh.geometry) as Weak<dyn GpuResident>;
                resident.push(weak);
            }
            if mesh.material.upload(&self.device, &self.queue, &self.material_layout, &fallback.view)? {
                stats.materials += 1;
                let weak: Weak<dyn GpuResident> = Arc::downgrade(&mesh.material) as Weak<dyn GpuResident>;
                resident.push(weak);
                for texture in [mesh.material.map(), mesh.material.normal_map(), mesh.material.roughness_map()]
                    .into_iter()
                    .flatten()
                {
                    let weak: Weak<dyn GpuResident> = Arc::downgrade(texture.data()) as Weak<dyn GpuResident>;
                    resident.push(weak);
                }
            }
            stats.indices += mesh.geometry.with_gpu(|g| g.index_count as u64).unwrap_or(0);
        }
        resident.retain(|w| w.strong_count() > 0);

        log::debug!(
            "Prepared {} geometry and {} material upload(s), {} indices",
            stats.geometries,
            stats.materials,
            stats.indices
        );
        Ok(stats)
    }
}

impl ContextController for Renderer {
    /// Drops every GPU copy; CPU data stays so `prepare` can rebuild.
    fn lose_context(&self) {
        self.lost.store(true, Ordering::Release);
        let resident = std::mem::take(&mut *self.resident.lock());
        let released = resident
            .iter()
            .filter_map(Weak::upgrade)
            .map(|r| r.release_gpu())
            .count();
        self.fallback.release_gpu();
        log::warn!("Rendering context lost ({} GPU object(s) released)", released);
    }

    fn restore_context(&self) {
        self.lost.store(false, Ordering::Release);
        log::info!("Rendering context restored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    #[test]
    fn test_vertex_layout_stride() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(Vertex::layout().array_stride, 32);
    }

    #[test]
    fn test_interleave() {
        let mut m = MeshData::default();
        m.push_triangle([Vec3::ZERO, Vec3::X, Vec3::Y], [Vec2::ZERO, Vec2::X, Vec2::Y], Vec3::Z);
        let v = interleave(&m);
        assert_eq!(v.len(), 3);
        assert_eq!(v[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(v[2].uv, [0.0, 1.0]);
        assert_eq!(v[0].normal, [0.0, 0.0, 1.0]);
    }
}
