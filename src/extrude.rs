//! Extrusion of planar outlines into thin solids.
//!
//! The outline is swept along `+Z`. With bevelling enabled, a quarter-circle
//! profile of extra layers is added in front of and behind the straight
//! section: the caps keep the original contour while the side walls are pushed
//! outward by `bevel_size`.

use crate::mesh::Mesh;
use crate::outline::{Outline, signed_area};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use tracing::{debug, warn};

/// Limit on how far a sharp corner is pushed out relative to the bevel size.
const MAX_MITER_SCALE: f32 = 4.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrudeSettings {
    /// Thickness of the straight section along `+Z`.
    pub depth: f32,
    /// Number of layers the straight section is split into.
    pub steps: u32,
    pub bevel_enabled: bool,
    /// How far the bevel extends beyond the straight section on each side.
    pub bevel_thickness: f32,
    /// How far the side walls are pushed outward from the contour.
    pub bevel_size: f32,
    pub bevel_segments: u32,
    /// Straight pieces per curve when flattening the outline.
    pub curve_segments: u32,
}

impl Default for ExtrudeSettings {
    fn default() -> Self {
        Self {
            depth: 0.02,
            steps: 1,
            bevel_enabled: false,
            bevel_thickness: 0.01,
            bevel_size: 0.02,
            bevel_segments: 3,
            curve_segments: 12,
        }
    }
}

impl ExtrudeSettings {
    /// Unbevelled extrusion of the given depth.
    pub fn flat(depth: f32) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    /// Bevelled extrusion (builder pattern).
    pub fn with_bevel(mut self, thickness: f32, size: f32, segments: u32) -> Self {
        self.bevel_enabled = true;
        self.bevel_thickness = thickness;
        self.bevel_size = size;
        self.bevel_segments = segments;
        self
    }

    pub fn with_curve_segments(mut self, curve_segments: u32) -> Self {
        self.curve_segments = curve_segments;
        self
    }

    /// `(outward offset, z)` for every ring of the side wall, front to back.
    fn layers(&self) -> Vec<(f32, f32)> {
        let bevel = self.bevel_enabled && self.bevel_segments > 0;
        let steps = self.steps.max(1);
        let mut layers = Vec::new();

        if bevel {
            for b in 0..self.bevel_segments {
                let t = b as f32 / self.bevel_segments as f32;
                let (sin, cos) = (t * FRAC_PI_2).sin_cos();
                layers.push((self.bevel_size * sin, -self.bevel_thickness * cos));
            }
        }

        let side_offset = if bevel { self.bevel_size } else { 0.0 };
        for s in 0..=steps {
            layers.push((side_offset, self.depth * s as f32 / steps as f32));
        }

        if bevel {
            for b in (0..self.bevel_segments).rev() {
                let t = b as f32 / self.bevel_segments as f32;
                let (sin, cos) = (t * FRAC_PI_2).sin_cos();
                layers.push((
                    self.bevel_size * sin,
                    self.depth + self.bevel_thickness * cos,
                ));
            }
        }
        layers
    }
}

/// Extrudes `outline` into a closed solid.
///
/// Outlines that flatten to fewer than three points produce an empty mesh.
/// Normals are computed before returning.
pub fn extrude(outline: &Outline, settings: &ExtrudeSettings) -> Mesh {
    let mut contour = outline.points(settings.curve_segments);
    if contour.len() < 3 {
        debug!(points = contour.len(), "outline too small to extrude");
        return Mesh::new();
    }
    if signed_area(&contour) < 0.0 {
        contour.reverse();
    }

    let n = contour.len();
    let directions = miter_directions(&contour);
    let arc = arc_lengths(&contour);
    let perimeter = arc[n].max(f32::EPSILON);
    let layers = settings.layers();
    let last_layer = layers.len() - 1;

    let mut mesh = Mesh::new();

    // Side walls share ring vertices so the walls shade smoothly.
    for (k, &(offset, z)) in layers.iter().enumerate() {
        let v = k as f32 / last_layer as f32;
        for i in 0..n {
            let p = contour[i] + directions[i] * offset;
            mesh.push_vertex(p.extend(z), Vec2::new(arc[i] / perimeter, v));
        }
    }
    let ring = |k: usize, i: usize| (k * n + i % n) as u32;
    for k in 0..last_layer {
        for i in 0..n {
            let (a, b) = (ring(k, i), ring(k, i + 1));
            let (c, d) = (ring(k + 1, i + 1), ring(k + 1, i));
            mesh.push_triangle(a, b, c);
            mesh.push_triangle(a, c, d);
        }
    }

    let caps = triangulate(&contour);
    let front_z = layers[0].1;
    let back_z = layers[last_layer].1;
    let front = push_cap(&mut mesh, &contour, front_z);
    let back = push_cap(&mut mesh, &contour, back_z);
    for &[i0, i1, i2] in &caps {
        mesh.push_triangle(front + i0, front + i2, front + i1);
        mesh.push_triangle(back + i0, back + i1, back + i2);
    }

    mesh.compute_normals();
    debug!(
        contour = n,
        layers = layers.len(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "extruded outline"
    );
    mesh
}

fn push_cap(mesh: &mut Mesh, contour: &[Vec2], z: f32) -> u32 {
    let base = mesh.vertex_count() as u32;
    for &p in contour {
        mesh.push_vertex(p.extend(z), p);
    }
    base
}

/// Ear-clips the contour into counter-clockwise triangles.
///
/// Triangulation failures leave the solid without caps instead of failing
/// the whole build.
fn triangulate(contour: &[Vec2]) -> Vec<[u32; 3]> {
    let coords: Vec<f64> = contour
        .iter()
        .flat_map(|p| [p.x as f64, p.y as f64])
        .collect();
    let indices = match earcutr::earcut(&coords, &[], 2) {
        Ok(indices) => indices,
        Err(e) => {
            warn!(error = %e, "cap triangulation failed; leaving caps open");
            return Vec::new();
        }
    };
    indices
        .chunks_exact(3)
        .map(|t| {
            let (a, b, c) = (t[0], t[1], t[2]);
            let winding = (contour[b] - contour[a]).perp_dot(contour[c] - contour[a]);
            if winding < 0.0 {
                [a as u32, c as u32, b as u32]
            } else {
                [a as u32, b as u32, c as u32]
            }
        })
        .collect()
}

/// Outward offset direction per vertex of a counter-clockwise contour,
/// scaled so both adjacent edges move by one unit.
fn miter_directions(contour: &[Vec2]) -> Vec<Vec2> {
    let n = contour.len();
    let outward = |from: Vec2, to: Vec2| {
        let d = (to - from).normalize_or_zero();
        Vec2::new(d.y, -d.x)
    };
    (0..n)
        .map(|i| {
            let prev = contour[(i + n - 1) % n];
            let next = contour[(i + 1) % n];
            let n_in = outward(prev, contour[i]);
            let n_out = outward(contour[i], next);
            let dir = (n_in + n_out).normalize_or_zero();
            if dir == Vec2::ZERO {
                return n_out;
            }
            let cos_half = dir.dot(n_out).max(1.0 / MAX_MITER_SCALE);
            dir / cos_half
        })
        .collect()
}

/// Cumulative distance along the contour; the last entry is the perimeter.
fn arc_lengths(contour: &[Vec2]) -> Vec<f32> {
    let n = contour.len();
    let mut arc = Vec::with_capacity(n + 1);
    let mut total = 0.0;
    arc.push(0.0);
    for i in 0..n {
        total += contour[i].distance(contour[(i + 1) % n]);
        arc.push(total);
    }
    arc
}

/// Convenience for callers that already hold a flat contour.
pub fn extrude_points(points: &[Vec2], settings: &ExtrudeSettings) -> Mesh {
    let mut outline = Outline::new();
    if let Some((first, rest)) = points.split_first() {
        outline = outline.move_to(first.x, first.y);
        for p in rest {
            outline = outline.line_to(p.x, p.y);
        }
    }
    extrude(&outline, settings)
}
