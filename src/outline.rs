//! Planar outlines for plant parts.
//!
//! An [`Outline`] is a list of path commands in the style of a 2D canvas path.
//! Outlines are authored with their base at the origin and their tip along
//! `+Y`, which is the convention every deformation term relies on.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Points closer than this are merged while flattening.
const MERGE_EPSILON_SQ: f32 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadraticTo { ctrl: Vec2, to: Vec2 },
    CubicTo { ctrl1: Vec2, ctrl2: Vec2, to: Vec2 },
}

/// A closed planar boundary built from path commands.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub commands: Vec<PathCommand>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::MoveTo(Vec2::new(x, y)));
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::LineTo(Vec2::new(x, y)));
        self
    }

    pub fn quadratic_curve_to(mut self, cx: f32, cy: f32, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::QuadraticTo {
            ctrl: Vec2::new(cx, cy),
            to: Vec2::new(x, y),
        });
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn bezier_curve_to(
        mut self,
        c1x: f32,
        c1y: f32,
        c2x: f32,
        c2y: f32,
        x: f32,
        y: f32,
    ) -> Self {
        self.commands.push(PathCommand::CubicTo {
            ctrl1: Vec2::new(c1x, c1y),
            ctrl2: Vec2::new(c2x, c2y),
            to: Vec2::new(x, y),
        });
        self
    }

    /// Flattens the path into a contour.
    ///
    /// Each curve is sampled with `curve_segments` straight pieces (at least
    /// one). Consecutive duplicates and a closing point equal to the first
    /// point are dropped, so the result is an open ring.
    pub fn points(&self, curve_segments: u32) -> Vec<Vec2> {
        let segments = curve_segments.max(1);
        let mut points: Vec<Vec2> = Vec::new();
        let mut cursor = Vec2::ZERO;

        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) => {
                    push(&mut points, p);
                    cursor = p;
                }
                PathCommand::LineTo(p) => {
                    push(&mut points, cursor);
                    push(&mut points, p);
                    cursor = p;
                }
                PathCommand::QuadraticTo { ctrl, to } => {
                    push(&mut points, cursor);
                    for i in 1..=segments {
                        let t = i as f32 / segments as f32;
                        push(&mut points, quadratic(cursor, ctrl, to, t));
                    }
                    cursor = to;
                }
                PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                    push(&mut points, cursor);
                    for i in 1..=segments {
                        let t = i as f32 / segments as f32;
                        push(&mut points, cubic(cursor, ctrl1, ctrl2, to, t));
                    }
                    cursor = to;
                }
            }
        }

        if points.len() > 1
            && points[0].distance_squared(points[points.len() - 1]) <= MERGE_EPSILON_SQ
        {
            points.pop();
        }
        points
    }
}

fn push(points: &mut Vec<Vec2>, p: Vec2) {
    if points
        .last()
        .is_none_or(|last| last.distance_squared(p) > MERGE_EPSILON_SQ)
    {
        points.push(p);
    }
}

fn quadratic(p0: Vec2, p1: Vec2, p2: Vec2, t: f32) -> Vec2 {
    let k = 1.0 - t;
    p0 * (k * k) + p1 * (2.0 * k * t) + p2 * (t * t)
}

fn cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let k = 1.0 - t;
    p0 * (k * k * k) + p1 * (3.0 * k * k * t) + p2 * (3.0 * k * t * t) + p3 * (t * t * t)
}

/// Signed area of a closed contour; positive for counter-clockwise winding.
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

/// Named outline shapes, one per kind of plant part.
///
/// Control points are tuned by eye. They carry no meaning beyond the
/// silhouette they produce.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum OutlinePreset {
    /// Teardrop rose petal, 1.8 units tall.
    RosePetal,
    /// Fan-shaped ruffled petal.
    FanPetal { width: f32, length: f32 },
    /// Cinched petal flaring toward the tip.
    FlaredPetal { width: f32, length: f32 },
    /// Narrow pointed sepal.
    Sepal { width: f32, length: f32 },
    /// Asymmetric orchid lip.
    Lip { width: f32, length: f32 },
    /// Almond-shaped leaf.
    Leaf { width: f32, height: f32 },
    /// Lopsided closed bud.
    Bud { width: f32, height: f32 },
    /// Wide sweet-pea banner with a notched top.
    Banner,
    /// Kidney-shaped sweet-pea wing.
    Wing,
    /// Boat-shaped sweet-pea keel.
    Keel,
    /// Peace-lily spathe, 1.05 units tall.
    Spathe,
    /// Rounded fan petal drawn from quadratic curves.
    Frill { size: f32 },
    /// A heart, 3.5 units tall.
    Heart,
    /// Caller-authored outline.
    Custom(Outline),
}

impl OutlinePreset {
    pub fn to_outline(&self) -> Outline {
        match *self {
            Self::RosePetal => Outline::new()
                .move_to(0.0, 0.0)
                .bezier_curve_to(0.6, 0.1, 1.2, 0.8, 0.0, 1.8)
                .bezier_curve_to(-1.2, 0.8, -0.6, 0.1, 0.0, 0.0),
            Self::FanPetal { width: w, length: l } => Outline::new()
                .move_to(0.0, 0.0)
                .bezier_curve_to(w * 0.5, l * 0.2, w * 1.5, l * 0.6, 0.0, l)
                .bezier_curve_to(-w * 1.5, l * 0.6, -w * 0.5, l * 0.2, 0.0, 0.0),
            Self::FlaredPetal { width: w, length: l } => Outline::new()
                .move_to(0.0, 0.0)
                .bezier_curve_to(w * 0.25, l * 0.3, w * 1.5, l * 0.75, 0.0, l)
                .bezier_curve_to(-w * 1.5, l * 0.75, -w * 0.25, l * 0.3, 0.0, 0.0),
            Self::Sepal { width: w, length: l } => Outline::new()
                .move_to(0.0, 0.0)
                .bezier_curve_to(w * 0.4, l * 0.2, w * 0.8, l * 0.7, 0.0, l * 1.1)
                .bezier_curve_to(-w * 0.8, l * 0.7, -w * 0.4, l * 0.2, 0.0, 0.0),
            Self::Lip { width: w, length: l } => Outline::new()
                .move_to(0.0, 0.0)
                .bezier_curve_to(w, l * 0.5, w * 0.2, l, 0.0, l * 0.8)
                .bezier_curve_to(-w * 0.5, l, -w, l * 0.5, 0.0, 0.0),
            Self::Leaf { width: w, height: h } => Outline::new()
                .move_to(0.0, 0.0)
                .bezier_curve_to(-w * 0.6, h * 0.2, -w * 0.5, h * 0.7, 0.0, h)
                .bezier_curve_to(w * 0.5, h * 0.7, w * 0.6, h * 0.2, 0.0, 0.0),
            Self::Bud { width: w, height: h } => Outline::new()
                .move_to(0.0, 0.0)
                .quadratic_curve_to(-w / 2.0, h * 0.3, -w * 0.1, h)
                .quadratic_curve_to(w / 2.0, h * 0.3, 0.0, 0.0),
            Self::Banner => Outline::new()
                .move_to(0.0, 0.0)
                .bezier_curve_to(0.1, 0.2, 0.6, 0.5, 0.5, 1.0)
                .bezier_curve_to(0.2, 1.15, -0.2, 1.15, -0.5, 1.0)
                .bezier_curve_to(-0.6, 0.5, -0.1, 0.2, 0.0, 0.0),
            Self::Wing => Outline::new()
                .move_to(0.0, 0.0)
                .bezier_curve_to(0.1, 0.1, 0.4, 0.3, 0.35, 0.8)
                .bezier_curve_to(0.2, 1.0, -0.2, 0.9, -0.3, 0.6)
                .bezier_curve_to(-0.35, 0.3, -0.1, 0.05, 0.0, 0.0),
            Self::Keel => Outline::new()
                .move_to(0.0, 0.0)
                .quadratic_curve_to(0.2, 0.4, 0.1, 0.8)
                .quadratic_curve_to(0.0, 0.9, -0.1, 0.8)
                .quadratic_curve_to(-0.2, 0.4, 0.0, 0.0),
            Self::Spathe => Outline::new()
                .move_to(0.0, 0.0)
                .bezier_curve_to(0.25, 0.2, 0.3, 0.5, 0.25, 0.8)
                .bezier_curve_to(0.18, 0.95, 0.05, 1.0, 0.0, 1.05)
                .bezier_curve_to(-0.05, 1.0, -0.18, 0.95, -0.25, 0.8)
                .bezier_curve_to(-0.3, 0.5, -0.25, 0.2, 0.0, 0.0),
            Self::Frill { size } => {
                let w = size * 1.5;
                let h = size * 1.2;
                Outline::new()
                    .move_to(0.0, 0.0)
                    .quadratic_curve_to(w * 0.3, h * 0.1, w * 0.5, h * 0.5)
                    .quadratic_curve_to(w * 0.6, h * 0.9, 0.0, h)
                    .quadratic_curve_to(-w * 0.6, h * 0.9, -w * 0.5, h * 0.5)
                    .quadratic_curve_to(-w * 0.3, h * 0.1, 0.0, 0.0)
            }
            Self::Heart => Outline::new()
                .move_to(0.0, 0.0)
                .bezier_curve_to(0.0, 0.5, -1.0, 1.0, -1.0, 2.0)
                .bezier_curve_to(-1.0, 3.0, 0.0, 3.5, 0.0, 1.5)
                .bezier_curve_to(0.0, 3.5, 1.0, 3.0, 1.0, 2.0)
                .bezier_curve_to(1.0, 1.0, 0.0, 0.5, 0.0, 0.0),
            Self::Custom(ref outline) => outline.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_flattens_to_four_points() {
        let square = Outline::new()
            .move_to(0.0, 0.0)
            .line_to(1.0, 0.0)
            .line_to(1.0, 1.0)
            .line_to(0.0, 1.0)
            .line_to(0.0, 0.0);
        let points = square.points(12);
        assert_eq!(points.len(), 4);
        assert!((signed_area(&points) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_curve_sampling_density() {
        let outline = OutlinePreset::RosePetal.to_outline();
        // Two cubic curves; the closing point merges with the start.
        assert_eq!(outline.points(8).len(), 16);
        assert_eq!(outline.points(0).len(), 2);
    }

    #[test]
    fn test_curves_hit_endpoints() {
        let outline = Outline::new()
            .move_to(0.0, 0.0)
            .quadratic_curve_to(1.0, 1.0, 2.0, 0.0);
        let points = outline.points(4);
        assert_eq!(points.first().copied(), Some(Vec2::ZERO));
        let last = points[points.len() - 1];
        assert!((last - Vec2::new(2.0, 0.0)).length() < 1e-6);
        // Midpoint of the quadratic is at (1, 0.5).
        assert!((points[2] - Vec2::new(1.0, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_presets_have_area_and_base_at_origin() {
        let presets = [
            OutlinePreset::RosePetal,
            OutlinePreset::FanPetal { width: 1.0, length: 1.0 },
            OutlinePreset::Leaf { width: 0.6, height: 1.4 },
            OutlinePreset::Bud { width: 0.3, height: 0.8 },
            OutlinePreset::Keel,
            OutlinePreset::Spathe,
            OutlinePreset::Frill { size: 1.0 },
            OutlinePreset::Heart,
        ];
        for preset in presets {
            let points = preset.to_outline().points(12);
            assert!(signed_area(&points).abs() > 1e-3, "{preset:?}");
            assert_eq!(points[0], Vec2::ZERO, "{preset:?}");
            let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
            assert!(min_y > -0.05, "{preset:?} dips to {min_y}");
        }
    }

    #[test]
    fn test_preset_serde_tagging() {
        let preset: OutlinePreset =
            serde_json::from_str(r#"{ "shape": "fan_petal", "width": 0.8, "length": 1.2 }"#)
                .unwrap();
        assert_eq!(preset, OutlinePreset::FanPetal { width: 0.8, length: 1.2 });
    }
}
