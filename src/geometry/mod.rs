// src/geometry/mod.rs
//! Extrusion of flat shapes and assembly of the composite model.

pub mod builder;
pub mod extrude;

pub use builder::{build_model, collect_shapes, spread_shapes, BuiltModel, BuiltPart, ShapeInput, REFERENCE_SIZE};
pub use extrude::{extrude_shape, ExtrudeSpec};
