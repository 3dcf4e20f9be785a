//! Procedural surface textures for petals and leaves.
//!
//! A [`PaintSpec`] describes a gradient, optional vein strokes and per-pixel
//! noise. Painting happens on an `f32` RGBA buffer and is quantized to RGBA8
//! at the end.
//!
//! ## Coordinate convention
//! [`PaintSpec`] coordinates are normalized: `(0, 0)` is the top-left pixel corner,
//! `(1, 1)` the bottom-right one, as on a 2D canvas.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A colour in HSL space. Hue in degrees, the rest in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsla {
    pub h: f32,
    pub s: f32,
    pub l: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Hsla {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l, a: 1.0 }
    }

    pub const fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    pub fn shift_hue(self, degrees: f32) -> Self {
        Self {
            h: self.h + degrees,
            ..self
        }
    }

    /// Linear `[r, g, b, a]` in `[0, 1]`.
    pub fn to_rgba(self) -> [f32; 4] {
        let s = self.s.clamp(0.0, 1.0);
        let l = self.l.clamp(0.0, 1.0);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h = self.h.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        [r + m, g + m, b + m, self.a.clamp(0.0, 1.0)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Hsla,
}

impl ColorStop {
    pub const fn new(offset: f32, color: Hsla) -> Self {
        Self { offset, color }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GradientShape {
    /// Colour varies along the line `from → to`.
    Linear { from: Vec2, to: Vec2 },
    /// Colour varies with distance from `center`, between two radii.
    Radial { center: Vec2, inner: f32, outer: f32 },
}

impl Default for GradientShape {
    /// Top to bottom.
    fn default() -> Self {
        Self::Linear {
            from: Vec2::ZERO,
            to: Vec2::Y,
        }
    }
}

impl GradientShape {
    /// Gradient parameter in `[0, 1]` at normalized point `p`.
    fn parameter(&self, p: Vec2) -> f32 {
        let t = match *self {
            Self::Linear { from, to } => {
                let axis = to - from;
                let len_sq = axis.length_squared();
                if len_sq <= f32::EPSILON {
                    0.0
                } else {
                    (p - from).dot(axis) / len_sq
                }
            }
            Self::Radial {
                center,
                inner,
                outer,
            } => {
                let span = outer - inner;
                if span.abs() <= f32::EPSILON {
                    0.0
                } else {
                    (p.distance(center) - inner) / span
                }
            }
        };
        t.clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    #[serde(default)]
    pub shape: GradientShape,
    pub stops: Vec<ColorStop>,
}

/// Fan of quadratic vein strokes.
///
/// Stroke `i` of `count` runs from `origin` to an end point at height `reach`
/// whose horizontal position fans across `spread`; its control point sits
/// halfway, pulled sideways by `bow` times the fan offset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VeinSpec {
    pub count: u32,
    pub origin: Vec2,
    pub reach: f32,
    pub spread: f32,
    pub bow: f32,
    /// Random horizontal displacement of each end point.
    pub jitter: f32,
    /// Stroke width in pixels.
    pub width: f32,
    pub color: Hsla,
}

/// Everything [`paint`] needs to produce a raster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintSpec {
    pub gradient: Gradient,
    pub veins: Option<VeinSpec>,
    /// Peak per-pixel noise as a fraction of the channel range.
    pub noise_amplitude: f32,
    /// Added to the hue of every gradient stop and vein colour.
    pub base_hue_offset: f32,
}

/// An RGBA8 image, row-major from the top-left.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Raster {
    /// Returns None if coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        Some(self.pixels[index])
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Tightly packed bytes, ready for a texture upload.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }
}

/// Paints a raster using the thread-local random source.
///
/// Vein jitter and noise differ between calls; use [`paint_with_rng`] with a
/// seeded generator for reproducible output.
pub fn paint(width: u32, height: u32, spec: &PaintSpec) -> Raster {
    paint_with_rng(width, height, spec, &mut rand::rng())
}

pub fn paint_with_rng<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    spec: &PaintSpec,
    rng: &mut R,
) -> Raster {
    let mut canvas = Canvas::new(width, height);
    if canvas.is_empty() {
        return Raster {
            width,
            height,
            pixels: Vec::new(),
        };
    }

    canvas.fill_gradient(&spec.gradient, spec.base_hue_offset);
    if spec.noise_amplitude > 0.0 {
        canvas.add_noise(spec.noise_amplitude, rng);
    }
    if let Some(veins) = &spec.veins {
        let color = veins.color.shift_hue(spec.base_hue_offset).to_rgba();
        for i in 0..veins.count {
            let fan = if veins.count > 1 {
                i as f32 / (veins.count - 1) as f32 - 0.5
            } else {
                0.0
            };
            let jitter = if veins.jitter > 0.0 {
                rng.random_range(-veins.jitter..=veins.jitter)
            } else {
                0.0
            };
            let end = Vec2::new(veins.origin.x + fan * veins.spread + jitter, veins.reach);
            let ctrl = Vec2::new(
                veins.origin.x + fan * veins.spread * veins.bow,
                (veins.origin.y + veins.reach) * 0.5,
            );
            canvas.stroke_quadratic(veins.origin, ctrl, end, veins.width, color);
        }
    }

    debug!(width, height, "painted surface texture");
    canvas.into_raster()
}

/// Working surface in linear `[0, 1]` floats.
struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; (width as usize) * (height as usize)],
        }
    }

    fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    fn fill_gradient(&mut self, gradient: &Gradient, hue_offset: f32) {
        let mut stops: Vec<(f32, [f32; 4])> = gradient
            .stops
            .iter()
            .map(|s| {
                let color = s.color.shift_hue(hue_offset).to_rgba();
                (s.offset.clamp(0.0, 1.0), color)
            })
            .collect();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (w, h) = (self.width as f32, self.height as f32);
        for y in 0..self.height {
            for x in 0..self.width {
                let p = Vec2::new((x as f32 + 0.5) / w, (y as f32 + 0.5) / h);
                let color = sample_stops(&stops, gradient.shape.parameter(p));
                let i = self.index(x, y);
                self.pixels[i] = color;
            }
        }
    }

    fn add_noise<R: Rng + ?Sized>(&mut self, amplitude: f32, rng: &mut R) {
        for px in &mut self.pixels {
            let n = (rng.random::<f32>() - 0.5) * 2.0 * amplitude;
            for c in &mut px[..3] {
                *c = (*c + n).clamp(0.0, 1.0);
            }
        }
    }

    /// Strokes a quadratic curve given in normalized coordinates.
    ///
    /// Coverage is collected first so overlapping stamps along the curve do
    /// not darken the stroke.
    fn stroke_quadratic(&mut self, p0: Vec2, p1: Vec2, p2: Vec2, width: f32, color: [f32; 4]) {
        let scale = Vec2::new(self.width as f32, self.height as f32);
        let (p0, p1, p2) = (p0 * scale, p1 * scale, p2 * scale);
        let radius = (width * 0.5).max(0.5);
        let length = p0.distance(p1) + p1.distance(p2);
        let samples = ((length / radius.min(1.0)).ceil() as usize).max(1);

        let mut covered = vec![false; self.pixels.len()];
        for s in 0..=samples {
            let t = s as f32 / samples as f32;
            let k = 1.0 - t;
            let c = p0 * (k * k) + p1 * (2.0 * k * t) + p2 * (t * t);
            self.mark_disc(&mut covered, c, radius);
        }

        for (px, hit) in self.pixels.iter_mut().zip(covered) {
            if hit {
                blend(px, color);
            }
        }
    }

    fn mark_disc(&self, covered: &mut [bool], center: Vec2, radius: f32) {
        let x0 = (center.x - radius).floor().max(0.0) as u32;
        let y0 = (center.y - radius).floor().max(0.0) as u32;
        let x1 = ((center.x + radius).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((center.y + radius).ceil().max(0.0) as u32).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let pixel_center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if pixel_center.distance_squared(center) <= radius * radius {
                    covered[self.index(x, y)] = true;
                }
            }
        }
    }

    fn into_raster(self) -> Raster {
        let pixels = self
            .pixels
            .into_iter()
            .map(|px| px.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect();
        Raster {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// Source-over alpha compositing.
fn blend(dst: &mut [f32; 4], src: [f32; 4]) {
    let a = src[3];
    let inv = 1.0 - a;
    dst[0] = src[0] * a + dst[0] * inv;
    dst[1] = src[1] * a + dst[1] * inv;
    dst[2] = src[2] * a + dst[2] * inv;
    dst[3] = a + dst[3] * inv;
}

fn sample_stops(stops: &[(f32, [f32; 4])], t: f32) -> [f32; 4] {
    let Some(&(first_offset, first)) = stops.first() else {
        return [0.0; 4];
    };
    if t <= first_offset {
        return first;
    }
    for pair in stops.windows(2) {
        let (o0, c0) = pair[0];
        let (o1, c1) = pair[1];
        if t <= o1 {
            let span = o1 - o0;
            let f = if span <= f32::EPSILON {
                1.0
            } else {
                (t - o0) / span
            };
            return std::array::from_fn(|i| c0[i] + (c1[i] - c0[i]) * f);
        }
    }
    stops[stops.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn two_stop(top: Hsla, bottom: Hsla) -> PaintSpec {
        PaintSpec {
            gradient: Gradient {
                shape: GradientShape::default(),
                stops: vec![ColorStop::new(0.0, top), ColorStop::new(1.0, bottom)],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_hsl_primaries() {
        let red = Hsla::new(0.0, 1.0, 0.5).to_rgba();
        assert_eq!(red, [1.0, 0.0, 0.0, 1.0]);
        let green = Hsla::new(120.0, 1.0, 0.5).to_rgba();
        assert!((green[1] - 1.0).abs() < 1e-6 && green[0].abs() < 1e-6);
        let white = Hsla::new(200.0, 0.3, 1.0).to_rgba();
        assert_eq!(white, [1.0, 1.0, 1.0, 1.0]);
        // Hue wraps.
        assert_eq!(Hsla::new(360.0, 1.0, 0.5).to_rgba(), red);
    }

    #[test]
    fn test_linear_gradient_runs_top_to_bottom() {
        let spec = two_stop(Hsla::new(0.0, 0.0, 0.0), Hsla::new(0.0, 0.0, 1.0));
        let raster = paint(4, 64, &spec);
        let top = raster.get_pixel(0, 0).unwrap();
        let bottom = raster.get_pixel(3, 63).unwrap();
        assert!(top[0] < 5, "top {top:?}");
        assert!(bottom[0] > 250, "bottom {bottom:?}");
        assert_eq!(top[3], 255);
        // Rows are uniform for a vertical gradient.
        assert_eq!(raster.get_pixel(0, 20), raster.get_pixel(3, 20));
    }

    #[test]
    fn test_radial_gradient_center_and_edge() {
        let mut spec = two_stop(Hsla::new(0.0, 0.0, 1.0), Hsla::new(0.0, 0.0, 0.0));
        spec.gradient.shape = GradientShape::Radial {
            center: Vec2::splat(0.5),
            inner: 0.0,
            outer: 0.5,
        };
        let raster = paint(33, 33, &spec);
        assert!(raster.get_pixel(16, 16).unwrap()[0] > 240);
        assert!(raster.get_pixel(0, 0).unwrap()[0] < 10);
    }

    #[test]
    fn test_zero_dimensions_give_empty_raster() {
        let spec = two_stop(Hsla::new(10.0, 1.0, 0.5), Hsla::new(40.0, 1.0, 0.5));
        let raster = paint(0, 16, &spec);
        assert!(raster.is_empty());
        assert_eq!(raster.get_pixel(0, 0), None);
    }

    #[test]
    fn test_noise_is_seeded_and_bounded() {
        let mut spec = two_stop(Hsla::new(0.0, 0.0, 0.5), Hsla::new(0.0, 0.0, 0.5));
        spec.noise_amplitude = 0.08;
        let a = paint_with_rng(16, 16, &spec, &mut StdRng::seed_from_u64(7));
        let b = paint_with_rng(16, 16, &spec, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        let mut flat = spec.clone();
        flat.noise_amplitude = 0.0;
        let plain = paint_with_rng(16, 16, &flat, &mut StdRng::seed_from_u64(7));
        assert_ne!(a, plain);
        for px in a.pixels() {
            let v = px[0] as i32;
            assert!((v - 128).abs() <= 22, "noise out of range: {v}");
        }
    }

    #[test]
    fn test_veins_mark_the_spine() {
        let mut spec = two_stop(Hsla::new(0.0, 0.0, 1.0), Hsla::new(0.0, 0.0, 1.0));
        spec.veins = Some(VeinSpec {
            count: 1,
            origin: Vec2::new(0.5, 0.0),
            reach: 1.0,
            spread: 0.0,
            bow: 0.5,
            jitter: 0.0,
            width: 2.0,
            color: Hsla::new(0.0, 0.0, 0.0),
        });
        let raster = paint(32, 32, &spec);
        assert_eq!(raster.get_pixel(16, 16).unwrap()[0], 0);
        assert_eq!(raster.get_pixel(2, 16).unwrap()[0], 255);
    }

    #[test]
    fn test_hue_offset_shifts_colors() {
        let mut spec = two_stop(Hsla::new(0.0, 1.0, 0.5), Hsla::new(0.0, 1.0, 0.5));
        spec.base_hue_offset = 120.0;
        let px = paint(2, 2, &spec).get_pixel(0, 0).unwrap();
        assert_eq!(px, [0, 255, 0, 255]);
    }

    #[test]
    fn test_rgba8_layout() {
        let spec = two_stop(Hsla::new(0.0, 1.0, 0.5), Hsla::new(0.0, 1.0, 0.5));
        let bytes = paint(3, 2, &spec).to_rgba8();
        assert_eq!(bytes.len(), 3 * 2 * 4);
        assert_eq!(&bytes[..4], &[255, 0, 0, 255]);
    }
}
