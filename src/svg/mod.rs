// src/svg/mod.rs
//! SVG input: glyph sanitizing, parsing and shape extraction.

pub mod parser;
pub mod sanitize;
pub mod shapes;

pub use parser::{parse_svg, FillRule, ParsedPath, ParsedSvg, Segment, SubPath};
pub use shapes::Shape;
