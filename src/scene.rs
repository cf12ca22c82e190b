//! Render-agnostic vector scene.
//!
//! Scene coordinates have y pointing up; [`Scene::to_svg`] flips them for
//! SVG's downward y axis.

use std::fmt::Write;

use error_stack::{Report, ResultExt};
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{FacetError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
    pub const fn gray(v: f32) -> Self {
        Self::rgb(v, v, v)
    }

    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const DARK_GREEN: Self = Self::rgb(0.0, 0.4, 0.0);
    pub const GOLDENROD: Self = Self::rgb(0.6, 0.45, 0.08);

    fn svg(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "rgb({},{},{})",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

impl From<Color> for bevy::prelude::Color {
    #[inline]
    fn from(c: Color) -> Self {
        bevy::prelude::Color::srgba(c.r, c.g, c.b, c.a)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Stroke {
    pub const fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

impl Default for Stroke {
    fn default() -> Self {
        Self::new(Color::BLACK, 1.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Polyline {
        points: Vec<DVec2>,
        stroke: Stroke,
    },
    Circle {
        center: DVec2,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Rect {
        min: DVec2,
        max: DVec2,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Text {
        at: DVec2,
        content: String,
        size: f64,
        color: Color,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    primitives: Vec<Primitive>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn line(&mut self, from: DVec2, to: DVec2, stroke: Stroke) {
        self.polyline(vec![from, to], stroke);
    }

    /// Adds a polyline; fewer than two points draw nothing and are dropped.
    pub fn polyline(&mut self, points: Vec<DVec2>, stroke: Stroke) {
        if points.len() >= 2 {
            self.push(Primitive::Polyline { points, stroke });
        }
    }

    /// Draws every unbroken run of `Some` points as its own polyline; `None`
    /// lifts the pen.
    pub fn runs(&mut self, points: impl IntoIterator<Item = Option<DVec2>>, stroke: Stroke) {
        let mut run = Vec::new();
        for point in points {
            match point {
                Some(p) => run.push(p),
                None => self.polyline(std::mem::take(&mut run), stroke),
            }
        }
        self.polyline(run, stroke);
    }

    pub fn circle(
        &mut self,
        center: DVec2,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) {
        self.push(Primitive::Circle {
            center,
            radius,
            fill,
            stroke,
        });
    }

    pub fn rect(&mut self, min: DVec2, max: DVec2, fill: Option<Color>, stroke: Option<Stroke>) {
        self.push(Primitive::Rect {
            min,
            max,
            fill,
            stroke,
        });
    }

    pub fn text(&mut self, at: DVec2, content: impl Into<String>, size: f64, color: Color) {
        self.push(Primitive::Text {
            at,
            content: content.into(),
            size,
            color,
        });
    }

    pub fn extend(&mut self, other: Scene) {
        self.primitives.extend(other.primitives);
    }

    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        let mut any = false;

        let mut include = |p: DVec2| {
            if p.is_finite() {
                min = min.min(p);
                max = max.max(p);
                any = true;
            }
        };

        for primitive in &self.primitives {
            match primitive {
                Primitive::Polyline { points, .. } => points.iter().copied().for_each(&mut include),
                Primitive::Circle { center, radius, .. } => {
                    include(*center - DVec2::splat(*radius));
                    include(*center + DVec2::splat(*radius));
                }
                Primitive::Rect { min, max, .. } => {
                    include(*min);
                    include(*max);
                }
                // rough glyph box: 0.6 em per character, one em tall
                Primitive::Text { at, content, size, .. } => {
                    include(*at);
                    include(*at + DVec2::new(content.chars().count() as f64 * size * 0.6, *size));
                }
            }
        }

        any.then_some((min, max))
    }

    /// Serializes the scene as a standalone SVG document fitted to its content.
    pub fn to_svg(&self) -> Result<String> {
        let (min, max) = self.bounds().unwrap_or((DVec2::ZERO, DVec2::ONE));
        let size = (max - min).max(DVec2::ONE);
        // scene (x, y) → SVG (x - min.x, max.y - y)
        let map = |p: DVec2| DVec2::new(p.x - min.x, max.y - p.y);

        let mut out = String::new();
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.2}" height="{h:.2}" viewBox="0 0 {w:.2} {h:.2}">"#,
            w = size.x,
            h = size.y
        )
        .change_context(FacetError::Render)?;

        for primitive in &self.primitives {
            write_primitive(&mut out, primitive, &map)
                .change_context(FacetError::Render)
                .attach("failed to write SVG element")?;
        }

        out.push_str("</svg>\n");
        Ok(out)
    }
}

fn paint(fill: Option<Color>, stroke: Option<Stroke>) -> String {
    let fill = fill.map_or_else(|| "none".to_string(), |c| c.svg());
    match stroke {
        Some(s) => format!(
            r#"fill="{fill}" stroke="{}" stroke-width="{}""#,
            s.color.svg(),
            s.width
        ),
        None => format!(r#"fill="{fill}" stroke="none""#),
    }
}

fn write_primitive(
    out: &mut String,
    primitive: &Primitive,
    map: &impl Fn(DVec2) -> DVec2,
) -> std::result::Result<(), std::fmt::Error> {
    match primitive {
        Primitive::Polyline { points, stroke } => {
            let mut d = String::new();
            for (n, p) in points.iter().map(|p| map(*p)).enumerate() {
                let cmd = if n == 0 { 'M' } else { 'L' };
                write!(d, "{cmd}{:.2},{:.2} ", p.x, p.y)?;
            }
            writeln!(
                out,
                r#"<path d="{}" {}/>"#,
                d.trim_end(),
                paint(None, Some(*stroke))
            )
        }
        Primitive::Circle {
            center,
            radius,
            fill,
            stroke,
        } => {
            let c = map(*center);
            writeln!(
                out,
                r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" {}/>"#,
                c.x,
                c.y,
                radius,
                paint(*fill, *stroke)
            )
        }
        Primitive::Rect {
            min,
            max,
            fill,
            stroke,
        } => {
            let (a, b) = (map(*min), map(*max));
            let (lo, hi) = (a.min(b), a.max(b));
            writeln!(
                out,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" {}/>"#,
                lo.x,
                lo.y,
                hi.x - lo.x,
                hi.y - lo.y,
                paint(*fill, *stroke)
            )
        }
        Primitive::Text {
            at,
            content,
            size,
            color,
        } => {
            let p = map(*at);
            writeln!(
                out,
                r#"<text x="{:.2}" y="{:.2}" font-size="{}" fill="{}">{}</text>"#,
                p.x,
                p.y,
                size,
                color.svg(),
                escape(content)
            )
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Pen that joins consecutive points into segments.
///
/// The first point of a stroke must be placed with [`Pen::begin`]; asking
/// for a segment before that is an error that aborts the render pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pen {
    current: Option<DVec2>,
}

impl Pen {
    pub fn begin(&mut self, at: DVec2) {
        self.current = Some(at);
    }

    /// Moves to `to` and returns the point the segment starts from.
    pub fn advance(&mut self, to: DVec2) -> Result<DVec2> {
        let from = self.current.ok_or_else(|| {
            Report::new(FacetError::MissingCurrentPoint)
                .attach(format!("segment end ({:.2}, {:.2})", to.x, to.y))
        })?;
        self.current = Some(to);
        Ok(from)
    }

    pub fn lift(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pen_requires_first_point() {
        let mut pen = Pen::default();
        let err = pen.advance(DVec2::ONE).unwrap_err();
        assert_eq!(*err.current_context(), FacetError::MissingCurrentPoint);

        pen.begin(DVec2::ZERO);
        assert_eq!(pen.advance(DVec2::ONE).unwrap(), DVec2::ZERO);
        assert_eq!(pen.advance(DVec2::X).unwrap(), DVec2::ONE);
        pen.lift();
        assert!(pen.advance(DVec2::Y).is_err());
    }

    #[test]
    fn short_polylines_are_dropped() {
        let mut scene = Scene::new();
        scene.polyline(vec![DVec2::ZERO], Stroke::default());
        assert!(scene.is_empty());
        scene.line(DVec2::ZERO, DVec2::ONE, Stroke::default());
        assert_eq!(scene.primitives().len(), 1);
    }

    #[test]
    fn runs_split_at_gaps() {
        let mut scene = Scene::new();
        let p = |x: f64| Some(DVec2::new(x, 0.0));
        scene.runs([p(0.0), p(1.0), None, p(2.0), None, p(3.0), p(4.0), p(5.0)], Stroke::default());
        let lengths: Vec<usize> = scene
            .primitives()
            .iter()
            .map(|prim| match prim {
                Primitive::Polyline { points, .. } => points.len(),
                _ => 0,
            })
            .collect();
        assert_eq!(lengths, vec![2, 3]);
    }

    #[test]
    fn bounds_cover_circles_and_lines() {
        let mut scene = Scene::new();
        scene.line(DVec2::new(-5.0, 0.0), DVec2::new(5.0, 2.0), Stroke::default());
        scene.circle(DVec2::new(0.0, 10.0), 1.0, Some(Color::RED), None);
        let (min, max) = scene.bounds().unwrap();
        assert_eq!(min, DVec2::new(-5.0, 0.0));
        assert_eq!(max, DVec2::new(5.0, 11.0));
        assert!(Scene::new().bounds().is_none());
    }

    #[test]
    fn svg_flips_y_and_escapes_text() {
        let mut scene = Scene::new();
        scene.line(DVec2::new(0.0, 0.0), DVec2::new(10.0, 10.0), Stroke::new(Color::RED, 0.25));
        scene.text(DVec2::new(0.0, 0.0), "a<b", 7.0, Color::BLACK);
        let svg = scene.to_svg().unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(r#"d="M0.00,10.00 L10.00,0.00""#));
        assert!(svg.contains(r#"stroke="rgb(255,0,0)" stroke-width="0.25""#));
        assert!(svg.contains("a&lt;b"));
    }
}
