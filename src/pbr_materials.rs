// src/pbr_materials.rs
// GPU side of a synthesized material.
// Dependencies: wgpu, wgpu::util, bytemuck
//
// Exports:
// - MaterialParams (Pod) matching the WGSL uniform layout
// - bind_group_layout() for the material group
// - GpuMaterial (params buffer + sampler + bind group)
//
// Usage summary:
// let layout = bind_group_layout(&device);
// let gpu = create_gpu_material(&device, &layout, &params, maps, &fallback_view, &sampling);
// render_pass.set_bind_group(MATERIAL_BIND_GROUP_INDEX, &gpu.bind_group, &[]);

use wgpu::util::DeviceExt;
use bytemuck::{Pod, Zeroable};

use crate::resource_manager::GpuRelease;
use crate::texture::SamplingParams;

pub const MATERIAL_BIND_GROUP_INDEX: u32 = 1;

/// Material feature flags (bitmask)
pub mod flags {
    pub const BASE_COLOR_TEX: u32 = 1 << 0;
    pub const NORMAL_TEX: u32 = 1 << 1;
    pub const ROUGHNESS_TEX: u32 = 1 << 2;
    pub const TRANSPARENT: u32 = 1 << 3;
    pub const TRANSMISSION: u32 = 1 << 4;
    pub const SHEEN: u32 = 1 << 5;
    pub const ANISOTROPY: u32 = 1 << 6;
    pub const HOLE: u32 = 1 << 7;
}

/// Matches the WGSL `MaterialParams` struct exactly (112 bytes).
///
/// The fourth lane of each color carries a scalar: opacity in
/// `base_color`, sheen strength in `sheen_color`, attenuation distance in
/// `attenuation_color`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialParams {
    pub base_color: [f32; 4],
    pub sheen_color: [f32; 4],
    pub attenuation_color: [f32; 4],
    pub uv_scale: [f32; 2],
    pub metallic: f32,
    pub roughness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub transmission: f32,
    pub ior: f32,
    pub thickness: f32,
    pub anisotropy: f32,
    pub sheen_roughness: f32,
    pub env_map_intensity: f32,
    pub flags: u32,
    pub _pad: [u32; 3],
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            sheen_color: [0.0; 4],
            attenuation_color: [1.0, 1.0, 1.0, f32::INFINITY],
            uv_scale: [1.0, 1.0],
            metallic: 0.0,
            roughness: 1.0,
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            transmission: 0.0,
            ior: 1.4,
            thickness: 0.0,
            anisotropy: 0.0,
            sheen_roughness: 0.0,
            env_map_intensity: 1.0,
            flags: 0,
            _pad: [0; 3],
        }
    }
}

impl MaterialParams {
    #[inline]
    pub fn opacity(&self) -> f32 {
        self.base_color[3]
    }

    #[inline]
    pub fn sheen(&self) -> f32 {
        self.sheen_color[3]
    }

    #[inline]
    pub fn attenuation_distance(&self) -> f32 {
        self.attenuation_color[3]
    }

    #[inline]
    pub fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// GPU resources for a single material.
pub struct GpuMaterial {
    pub params_buffer: wgpu::Buffer,
    pub sampler: wgpu::Sampler,
    pub bind_group: wgpu::BindGroup,
}

impl GpuRelease for GpuMaterial {
    fn release(self) {
        self.params_buffer.destroy();
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

/// Material group layout:
/// 0 params uniform, 1 base color, 2 normal map, 3 roughness map, 4 sampler.
pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("material_bind_group_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<MaterialParams>() as u64),
                },
                count: None,
            },
            texture_entry(1),
            texture_entry(2),
            texture_entry(3),
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// Texture views bound to a material; missing slots use the fallback view.
#[derive(Default)]
pub struct MaterialViews<'a> {
    pub base_color: Option<&'a wgpu::TextureView>,
    pub normal: Option<&'a wgpu::TextureView>,
    pub roughness: Option<&'a wgpu::TextureView>,
}

pub fn create_gpu_material(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    params: &MaterialParams,
    views: MaterialViews<'_>,
    fallback: &wgpu::TextureView,
    sampling: &SamplingParams,
) -> GpuMaterial {
    let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(params),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let sampler = device.create_sampler(&sampling.sampler_descriptor());

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("material_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: params_buffer.as_entire_binding() },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(views.base_color.unwrap_or(fallback)),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(views.normal.unwrap_or(fallback)),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(views.roughness.unwrap_or(fallback)),
            },
            wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::Sampler(&sampler) },
        ],
    });

    GpuMaterial { params_buffer, sampler, bind_group }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_layout_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<MaterialParams>(), 112);
        assert_eq!(std::mem::size_of::<MaterialParams>() % 16, 0);
    }

    #[test]
    fn test_packed_scalars() {
        let mut p = MaterialParams::default();
        p.base_color[3] = 0.5;
        p.flags = flags::HOLE | flags::TRANSPARENT;
        assert_eq!(p.opacity(), 0.5);
        assert!(p.has(flags::HOLE));
        assert!(!p.has(flags::SHEEN));
        assert_eq!(p.ior, 1.4);
    }
}
