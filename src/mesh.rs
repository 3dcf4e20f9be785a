//! Indexed triangle meshes.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// An indexed triangle list with per-vertex attributes.
///
/// `positions`, `normals` and `uvs` always have the same length. Indices are
/// in groups of three, counter-clockwise when seen from the front.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Appends a vertex and returns its index. The normal is filled in by
    /// [`compute_normals`](Self::compute_normals).
    pub fn push_vertex(&mut self, position: Vec3, uv: Vec2) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(Vec3::Z);
        self.uvs.push(uv);
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Recalculates smooth vertex normals from the current positions.
    ///
    /// Face normals are accumulated unnormalized, so larger triangles weigh
    /// more. Vertices with no usable face keep a `+Z` normal so every normal
    /// stays unit length.
    pub fn compute_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.positions.len()];
        for [a, b, c] in self.triangles() {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            let p0 = self.positions[a];
            let face = (self.positions[b] - p0).cross(self.positions[c] - p0);
            accumulated[a] += face;
            accumulated[b] += face;
            accumulated[c] += face;
        }
        self.normals = accumulated
            .into_iter()
            .map(|n| n.normalize_or(Vec3::Z))
            .collect();
    }

    /// Axis-aligned bounds of all positions, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), &p| (min.min(p), max.max(p))),
        )
    }

    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p += offset;
        }
    }

    /// Flattened `[x, y, z]` positions, the layout GPU vertex buffers expect.
    pub fn position_buffer(&self) -> Vec<[f32; 3]> {
        self.positions.iter().map(|p| p.to_array()).collect()
    }

    pub fn normal_buffer(&self) -> Vec<[f32; 3]> {
        self.normals.iter().map(|n| n.to_array()).collect()
    }
}
