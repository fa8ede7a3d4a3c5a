// src/texture.rs
use image::{ImageBuffer, Rgba};
use parking_lot::MappedMutexGuard;
use std::fmt;
use std::sync::Arc;

use crate::context::OptionContext;
use crate::error::Result;
use crate::resource_manager::{
    Disposable, DisposeFlag, GpuRelease, GpuResident, GpuSlot, ResourceKind,
};

// ─────────────────────────────────────────────────────────────────────────────
// Sampling parameters (owned per consumer)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    Clamp,
    Mirror,
}

impl WrapMode {
    pub fn address_mode(self) -> wgpu::AddressMode {
        match self {
            WrapMode::Repeat => wgpu::AddressMode::Repeat,
            WrapMode::Clamp => wgpu::AddressMode::ClampToEdge,
            WrapMode::Mirror => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

/// How one consumer samples shared pixels. Changing these never touches
/// the pixel data or its GPU copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub wrap: WrapMode,
    /// UV repeat factor (x, y).
    pub repeat: [f32; 2],
    /// Color data (sRGB) vs. linear data such as normal/roughness maps.
    pub srgb: bool,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            wrap: WrapMode::Repeat,
            repeat: [1.0, 1.0],
            srgb: true,
        }
    }
}

impl SamplingParams {
    pub fn linear() -> Self {
        Self {
            srgb: false,
            ..Self::default()
        }
    }

    pub fn with_repeat(mut self, x: f32, y: f32) -> Self {
        self.repeat = [x, y];
        self
    }

    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn sampler_descriptor(&self) -> wgpu::SamplerDescriptor<'static> {
        let mode = self.wrap.address_mode();
        wgpu::SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: mode,
            address_mode_v: mode,
            address_mode_w: mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            anisotropy_clamp: 4,
            ..Default::default()
        }
    }
}

/// Options for `TextureCache::load_texture`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextureLoadOptions {
    pub sampling: SamplingParams,
}

// ─────────────────────────────────────────────────────────────────────────────
// Size estimation
// ─────────────────────────────────────────────────────────────────────────────

/// Mip chain overhead factor.
pub const MIP_OVERHEAD: f64 = 1.33;

/// `width × height × 4 × 1.33`, or `fallback` when dimensions are unknown.
pub fn estimate_texture_bytes(dimensions: Option<(u32, u32)>, fallback: u64) -> u64 {
    match dimensions {
        Some((w, h)) if w > 0 && h > 0 => (w as f64 * h as f64 * 4.0 * MIP_OVERHEAD).ceil() as u64,
        _ => fallback,
    }
}

/// Byte length of a tightly packed RGBA8 image, `None` on overflow.
pub fn rgba_len(width: u32, height: u32) -> Option<usize> {
    (width as u64)
        .checked_mul(height as u64)?
        .checked_mul(4)?
        .try_into()
        .ok()
}

pub fn max_mip_levels(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    32 - largest.leading_zeros()
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared pixel data
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable decoded RGBA8 pixels plus their (lazily created) GPU copy.
pub struct TextureData {
    label: String,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    gpu: GpuSlot<GpuTexture>,
    disposed: DisposeFlag,
}

impl fmt::Debug for TextureData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureData")
            .field("label", &self.label)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("gpu", &self.gpu)
            .field("disposed", &self.disposed.is_set())
            .finish()
    }
}

impl TextureData {
    pub fn from_rgba(label: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = rgba_len(width, height).context("image dimensions overflow")?;
        crate::ensure!(
            width > 0 && height > 0 && pixels.len() == expected,
            "RGBA data mismatch: expected {} bytes for {}x{}, got {}",
            expected,
            width,
            height,
            pixels.len()
        );
        Ok(Self {
            label: label.into(),
            width,
            height,
            pixels,
            gpu: GpuSlot::new(),
            disposed: DisposeFlag::new(),
        })
    }

    /// Decodes PNG/JPEG bytes.
    pub fn decode(label: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(label, width, height, img.into_raw())
    }

    /// 1×1 solid-colour texture – used as the fallback binding.
    pub fn solid(label: impl Into<String>, color: [u8; 4]) -> Self {
        Self {
            label: label.into(),
            width: 1,
            height: 1,
            pixels: color.to_vec(),
            gpu: GpuSlot::new(),
            disposed: DisposeFlag::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn estimated_bytes(&self, fallback: u64) -> u64 {
        estimate_texture_bytes(Some((self.width, self.height)), fallback)
    }

    pub fn is_resident(&self) -> bool {
        self.gpu.is_resident()
    }

    /// Uploads to the GPU if not already resident. Returns `true` when an
    /// upload happened.
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue, srgb: bool) -> Result<bool> {
        crate::ensure!(
            !self.disposed.is_set(),
            "texture '{}' used after disposal",
            self.label
        );
        if self.gpu.with(|g| g.srgb == srgb).unwrap_or(false) {
            return Ok(false);
        }
        let gpu = GpuTexture::from_rgba(device, queue, &self.label, &self.pixels, self.width, self.height, srgb)?;
        self.gpu.set(gpu);
        Ok(true)
    }

    pub fn gpu(&self) -> Option<MappedMutexGuard<'_, GpuTexture>> {
        self.gpu.get()
    }
}

impl Disposable for TextureData {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Texture
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

impl GpuResident for TextureData {
    fn release_gpu(&self) {
        self.gpu.release();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-consumer handle
// ─────────────────────────────────────────────────────────────────────────────

/// Shared pixels plus this consumer's sampling parameters.
#[derive(Debug, Clone)]
pub struct Texture {
    data: Arc<TextureData>,
    pub sampling: SamplingParams,
}

impl Texture {
    pub fn new(data: Arc<TextureData>, sampling: SamplingParams) -> Self {
        Self { data, sampling }
    }

    pub fn data(&self) -> &Arc<TextureData> {
        &self.data
    }

    pub fn label(&self) -> &str {
        self.data.label()
    }

    pub fn with_sampling(&self, sampling: SamplingParams) -> Self {
        Self {
            data: Arc::clone(&self.data),
            sampling,
        }
    }

    /// Same underlying pixel allocation?
    pub fn shares_pixels_with(&self, other: &Texture) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GPU copy
// ─────────────────────────────────────────────────────────────────────────────

pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub srgb: bool,
    pub mip_level_count: u32,
}

impl GpuRelease for GpuTexture {
    fn release(self) {
        self.texture.destroy();
    }
}

impl GpuTexture {
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &[u8],
        width: u32,
        height: u32,
        srgb: bool,
    ) -> Result<Self> {
        let max_dim = device.limits().max_texture_dimension_2d;
        crate::ensure!(
            width <= max_dim && height <= max_dim,
            "texture {}x{} exceeds the device limit of {}",
            width,
            height,
            max_dim
        );
        let expected = rgba_len(width, height).context("image dimensions overflow")?;
        crate::ensure!(
            data.len() >= expected,
            "RGBA data too short: expected {} bytes, got {}",
            expected,
            data.len()
        );

        let mip_level_count = max_mip_levels(width, height);
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &data[..expected],
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        if mip_level_count > 1 {
            let rgba = ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, data[..expected].to_vec())
                .context("Failed to create image buffer from raw data")?;
            generate_mipmaps_cpu(queue, &texture, &rgba, width, height, mip_level_count);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            texture,
            view,
            srgb,
            mip_level_count,
        })
    }
}

fn generate_mipmaps_cpu(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    base: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    mut width: u32,
    mut height: u32,
    levels: u32,
) {
    let mut src = base.clone();

    for level in 1..levels {
        let new_w = (width / 2).max(1);
        let new_h = (height / 2).max(1);

        let dst = image::imageops::resize(&src, new_w, new_h, image::imageops::FilterType::Triangle);

        queue.write_texture(
            wgpu::ImageCopyTexture {
                aspect: wgpu::TextureAspect::All,
                texture,
                mip_level: level,
                origin: wgpu::Origin3d::ZERO,
            },
            &dst,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * new_w),
                rows_per_image: Some(new_h),
            },
            wgpu::Extent3d {
                width: new_w,
                height: new_h,
                depth_or_array_layers: 1,
            },
        );

        src = dst;
        width = new_w;
        height = new_h;
    }
}
