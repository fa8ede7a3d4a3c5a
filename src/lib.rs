// src/lib.rs
//! SVG to extruded 3D model core.
//!
//! `SvgModelPipeline` is the entry point: feed it sanitized SVG markup and a
//! `ModelParams`, get back a `ModelGroup` of extruded meshes with PBR
//! materials. `SharedResources` carries the texture cache and the resource
//! lifecycle manager shared by every view.

pub mod color;
pub mod config;
pub mod context;
pub mod error;
pub mod geometry;
pub mod materials;
pub mod memory;
pub mod pbr_materials;
pub mod pipeline;
pub mod renderer;
pub mod resource_manager;
pub mod scene;
pub mod spread;
pub mod svg;
pub mod texture;
pub mod texture_cache;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use color::Rgb;
pub use config::{GeometryParams, MaterialSettings, ModelParams, ResourceConfig, TextureCacheConfig, TextureSettings};
pub use error::{Error, Result};
pub use geometry::ExtrudeSpec;
pub use materials::{Material, MaterialSynthesizer};
pub use pipeline::{LoadObserver, NoopObserver, SharedResources, SvgModelPipeline, TextureRequest};
pub use resource_manager::{Disposable, ResourceManager};
pub use scene::{Aabb, Mesh, ModelGroup};
pub use svg::{parse_svg, ParsedSvg, Shape};
pub use texture_cache::{TextureCache, TextureCacheStats};
