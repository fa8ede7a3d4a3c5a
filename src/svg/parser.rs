// src/svg/parser.rs
//! SVG markup → `ParsedSvg`.
//!
//! roxmltree does the structural checks (well-formedness, `<svg>` root,
//! natural size); usvg resolves styles, `<use>`, basic shapes and transforms
//! into absolute path data.

use glam::Vec2;
use lyon::geom::{CubicBezierSegment, QuadraticBezierSegment};
use lyon::math::point;
use usvg::tiny_skia_path::PathSegment;

use super::sanitize;
use super::shapes::{self, Shape};
use crate::color::Rgb;
use crate::error::{Error, Result};

/// Used when neither `viewBox` nor `width`/`height` are usable.
pub const DEFAULT_SIZE: f32 = 100.0;

const SVG_NS_ATTR: &str = r#" xmlns="http://www.w3.org/2000/svg""#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

impl From<usvg::FillRule> for FillRule {
    fn from(rule: usvg::FillRule) -> Self {
        match rule {
            usvg::FillRule::NonZero => FillRule::NonZero,
            usvg::FillRule::EvenOdd => FillRule::EvenOdd,
        }
    }
}

/// One drawing command, in absolute document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Vec2),
    Quad(Vec2, Vec2),
    Cubic(Vec2, Vec2, Vec2),
}

impl Segment {
    #[inline]
    pub fn end(&self) -> Vec2 {
        match *self {
            Segment::Line(to) | Segment::Quad(_, to) | Segment::Cubic(_, _, to) => to,
        }
    }
}

/// A contour started by a move-to.
#[derive(Debug, Clone, PartialEq)]
pub struct SubPath {
    pub start: Vec2,
    pub segments: Vec<Segment>,
    pub closed: bool,
}

impl SubPath {
    fn new(start: Vec2) -> Self {
        Self {
            start,
            segments: Vec::new(),
            closed: false,
        }
    }

    /// Polyline approximation; each curve contributes `divisions` points.
    /// The contour is implicitly closed, the start point is not repeated.
    pub fn flatten(&self, divisions: u32) -> Vec<Vec2> {
        let divisions = divisions.max(1);
        let mut points = Vec::with_capacity(1 + self.segments.len() * divisions as usize);
        points.push(self.start);
        let mut from = self.start;

        for segment in &self.segments {
            match *segment {
                Segment::Line(to) => points.push(to),
                Segment::Quad(ctrl, to) => {
                    let curve = QuadraticBezierSegment {
                        from: point(from.x, from.y),
                        ctrl: point(ctrl.x, ctrl.y),
                        to: point(to.x, to.y),
                    };
                    for i in 1..=divisions {
                        let p = curve.sample(i as f32 / divisions as f32);
                        points.push(Vec2::new(p.x, p.y));
                    }
                }
                Segment::Cubic(ctrl1, ctrl2, to) => {
                    let curve = CubicBezierSegment {
                        from: point(from.x, from.y),
                        ctrl1: point(ctrl1.x, ctrl1.y),
                        ctrl2: point(ctrl2.x, ctrl2.y),
                        to: point(to.x, to.y),
                    };
                    for i in 1..=divisions {
                        let p = curve.sample(i as f32 / divisions as f32);
                        points.push(Vec2::new(p.x, p.y));
                    }
                }
            }
            from = segment.end();
        }

        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        points
    }
}

/// A filled `<path>` (or basic shape) from the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPath {
    /// Document order; doubles as paint/z order.
    pub index: usize,
    pub subpaths: Vec<SubPath>,
    pub color: Rgb,
    pub fill_rule: FillRule,
}

impl ParsedPath {
    pub fn polygons(&self, curve_divisions: u32) -> Vec<Vec<Vec2>> {
        self.subpaths
            .iter()
            .map(|sp| sp.flatten(curve_divisions))
            .collect()
    }

    /// Closed shapes with holes assigned by this path's fill rule.
    pub fn to_shapes(&self, curve_divisions: u32) -> Vec<Shape> {
        shapes::build_shapes(self.polygons(curve_divisions), self.fill_rule)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSvg {
    pub paths: Vec<ParsedPath>,
    pub width: f32,
    pub height: f32,
}

/// Parses sanitized SVG markup.
pub fn parse_svg(markup: &str) -> Result<ParsedSvg> {
    let cleaned = sanitize::strip_special_glyphs(markup);

    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(&cleaned, options)?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(Error::parse(format!(
            "root element is <{}>, expected <svg>",
            root.tag_name().name()
        )));
    }
    let (width, height) = natural_size(root);

    // usvg only recognizes elements in the SVG namespace; hand-written
    // markup often omits it.
    let markup = if root.tag_name().namespace().is_none() {
        let at = root.range().start + "<svg".len();
        let mut patched = String::with_capacity(cleaned.len() + SVG_NS_ATTR.len());
        patched.push_str(&cleaned[..at]);
        patched.push_str(SVG_NS_ATTR);
        patched.push_str(&cleaned[at..]);
        std::borrow::Cow::Owned(patched)
    } else {
        std::borrow::Cow::Borrowed(cleaned.as_ref())
    };

    let tree = usvg::Tree::from_str(&markup, &usvg::Options::default())?;
    let mut paths = Vec::new();
    collect_paths(tree.root(), &mut paths);

    log::debug!(
        "Parsed SVG: {} filled paths, natural size {}x{}",
        paths.len(),
        width,
        height
    );

    Ok(ParsedSvg {
        paths,
        width,
        height,
    })
}

fn collect_paths(group: &usvg::Group, out: &mut Vec<ParsedPath>) {
    for node in group.children() {
        match node {
            usvg::Node::Group(child) => collect_paths(child, out),
            usvg::Node::Path(path) => {
                if let Some(parsed) = convert_path(path, out.len()) {
                    out.push(parsed);
                }
            }
            _ => {}
        }
    }
}

fn convert_path(path: &usvg::Path, index: usize) -> Option<ParsedPath> {
    // Stroke-only paths and `fill="none"` have no area to extrude.
    let fill = path.fill()?;
    let color = match fill.paint() {
        usvg::Paint::Color(c) => Rgb::new(c.red, c.green, c.blue),
        _ => Rgb::BLACK,
    };

    let ts = path.abs_transform();
    let map = |p: usvg::tiny_skia_path::Point| {
        Vec2::new(
            ts.sx * p.x + ts.kx * p.y + ts.tx,
            ts.ky * p.x + ts.sy * p.y + ts.ty,
        )
    };

    let mut subpaths: Vec<SubPath> = Vec::new();
    let mut current: Option<SubPath> = None;

    for seg in path.data().segments() {
        match seg {
            PathSegment::MoveTo(p) => {
                if let Some(done) = current.take() {
                    subpaths.push(done);
                }
                current = Some(SubPath::new(map(p)));
            }
            PathSegment::LineTo(p) => {
                current
                    .get_or_insert_with(|| SubPath::new(map(p)))
                    .segments
                    .push(Segment::Line(map(p)));
            }
            PathSegment::QuadTo(c, p) => {
                current
                    .get_or_insert_with(|| SubPath::new(map(c)))
                    .segments
                    .push(Segment::Quad(map(c), map(p)));
            }
            PathSegment::CubicTo(c1, c2, p) => {
                current
                    .get_or_insert_with(|| SubPath::new(map(c1)))
                    .segments
                    .push(Segment::Cubic(map(c1), map(c2), map(p)));
            }
            PathSegment::Close => {
                if let Some(mut done) = current.take() {
                    done.closed = true;
                    subpaths.push(done);
                }
            }
        }
    }
    if let Some(done) = current.take() {
        subpaths.push(done);
    }

    subpaths.retain(|sp| !sp.segments.is_empty());
    if subpaths.is_empty() {
        return None;
    }

    Some(ParsedPath {
        index,
        subpaths,
        color,
        fill_rule: fill.rule().into(),
    })
}

/// viewBox size, else explicit width/height, else 100 per axis.
fn natural_size(root: roxmltree::Node) -> (f32, f32) {
    if let Some([_, _, w, h]) = root.attribute("viewBox").and_then(parse_view_box) {
        if w > 0.0 && h > 0.0 {
            return (w, h);
        }
    }
    let dimension = |name: &str| {
        root.attribute(name)
            .and_then(parse_length)
            .filter(|v| *v > 0.0)
            .unwrap_or(DEFAULT_SIZE)
    };
    (dimension("width"), dimension("height"))
}

fn parse_view_box(value: &str) -> Option<[f32; 4]> {
    let mut parts = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f32>().ok());
    let vb = [parts.next()??, parts.next()??, parts.next()??, parts.next()??];
    vb.iter().all(|v| v.is_finite()).then_some(vb)
}

/// Numeric prefix of a length such as `120px` or `50%`.
fn parse_length(value: &str) -> Option<f32> {
    let number = value
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%');
    number.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}
