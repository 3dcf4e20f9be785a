//! Closed-form vertex deformation that turns flat extrusions into organic
//! plant parts.
//!
//! Every term is a function of the vertex position before deformation and
//! its height ratio `r` (0 at the base, 1 at the tip). Terms are additive and
//! each one vanishes when its coefficient is zero, so [`DeformParams::default`]
//! leaves the extrusion untouched.
//!
//! The per-variant presets were tuned by eye. Treat their numbers as style,
//! not as physically meaningful quantities.

use crate::extrude::{ExtrudeSettings, extrude};
use crate::mesh::Mesh;
use crate::outline::Outline;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use tracing::debug;

/// Height ranges below this are treated as flat (every ratio is 0).
const MIN_HEIGHT_RANGE: f32 = 1e-6;

/// Lower bound for the arch and cup exponents. Zero or negative powers of a
/// zero base are not finite.
const MIN_EXPONENT: f32 = 1e-3;

/// The kind of plant part being built. Selects which variant-specific terms
/// apply: twist only for buds, veins only for leaves, ruffles for the rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartVariant {
    Petal,
    Leaf,
    Bud,
    Sepal,
    Lip,
    Keel,
    Banner,
    Wing,
    Spathe,
}

impl PartVariant {
    pub fn twists(self) -> bool {
        matches!(self, Self::Bud)
    }

    pub fn has_veins(self) -> bool {
        matches!(self, Self::Leaf)
    }

    pub fn ruffles(self) -> bool {
        !matches!(self, Self::Leaf | Self::Bud)
    }
}

/// Deformation coefficients. Zero strength disables a term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeformParams {
    /// Backward bend toward the tip: `z -= back_bend * r^arch_exponent`.
    /// Negative values curl forward.
    pub back_bend: f32,
    pub arch_exponent: f32,
    /// Lateral cupping: `z += cup * |x|^cup_exponent * (1 - cup_taper * r)`.
    pub cup: f32,
    pub cup_exponent: f32,
    pub cup_taper: f32,
    /// C-shaped belly along the length: `z -= belly * sin(pi * r)`.
    pub belly: f32,
    /// Edge undulation: `z += ruffle_amplitude * sin(x * ruffle_frequency) * r`.
    pub ruffle_amplitude: f32,
    pub ruffle_frequency: f32,
    /// Depth of the midrib groove on leaves.
    pub midrib_depth: f32,
    /// Height of the lateral vein ridges on leaves.
    pub vein_amplitude: f32,
    pub vein_frequency: f32,
    /// How steeply veins angle away from the midrib.
    pub vein_angle: f32,
    /// Sideways flare peaking mid-length: `x += flare * sin(pi * r) * sign(x)`.
    pub flare: f32,
    /// Sideways pull toward the spine at the base: `x -= pinch * (1 - r) * sign(x)`.
    pub pinch: f32,
    /// Shortens the part as it arches: `y -= sin(arch) * height * arch_compress`.
    pub arch_compress: f32,
    /// Spiral twist about the `Y` axis, in radians at the tip (buds only).
    pub twist: f32,
    /// Depth offset of the twist axis.
    pub twist_pivot: f32,
}

impl Default for DeformParams {
    fn default() -> Self {
        Self {
            back_bend: 0.0,
            arch_exponent: 2.0,
            cup: 0.0,
            cup_exponent: 2.0,
            cup_taper: 0.0,
            belly: 0.0,
            ruffle_amplitude: 0.0,
            ruffle_frequency: 0.0,
            midrib_depth: 0.0,
            vein_amplitude: 0.0,
            vein_frequency: 0.0,
            vein_angle: 0.0,
            flare: 0.0,
            pinch: 0.0,
            arch_compress: 0.0,
            twist: 0.0,
            twist_pivot: 0.0,
        }
    }
}

impl DeformParams {
    /// The look each variant was tuned for. `bend` scales the main bending
    /// term where the variant has one.
    pub fn for_variant(variant: PartVariant, bend: f32) -> Self {
        let base = Self::default();
        match variant {
            PartVariant::Petal => Self {
                back_bend: bend,
                arch_exponent: 2.5,
                cup: 0.4,
                ruffle_amplitude: 0.05,
                ruffle_frequency: 10.0,
                ..base
            },
            PartVariant::Leaf => Self {
                back_bend: bend,
                cup: 0.5,
                cup_exponent: 1.8,
                cup_taper: 0.5,
                midrib_depth: 0.03,
                vein_amplitude: 0.007,
                vein_frequency: 25.0,
                vein_angle: 2.5,
                arch_compress: 0.15,
                ..base
            },
            PartVariant::Bud => Self {
                back_bend: bend,
                cup: 0.8,
                cup_exponent: 1.8,
                cup_taper: 0.5,
                arch_compress: 0.15,
                twist: 7.0,
                twist_pivot: 0.05,
                ..base
            },
            PartVariant::Sepal => Self {
                back_bend: bend * 0.6,
                ..base
            },
            PartVariant::Lip => Self {
                back_bend: -bend,
                arch_exponent: 1.5,
                ..base
            },
            PartVariant::Keel => Self {
                back_bend: -0.25,
                arch_exponent: 0.8,
                pinch: 0.1,
                ..base
            },
            PartVariant::Banner => Self {
                back_bend: 0.4,
                ruffle_amplitude: 0.02,
                ruffle_frequency: 5.0,
                ..base
            },
            PartVariant::Wing => Self {
                back_bend: -0.15,
                arch_exponent: 1.5,
                flare: 0.05,
                ..base
            },
            PartVariant::Spathe => Self {
                back_bend: 0.12,
                arch_exponent: 5.0,
                belly: 0.07,
                ..base
            },
        }
    }

    /// Backward-bend strength (builder pattern).
    pub fn with_bend(mut self, back_bend: f32) -> Self {
        self.back_bend = back_bend;
        self
    }

    pub fn with_cup(mut self, cup: f32) -> Self {
        self.cup = cup;
        self
    }
}

/// Bounding box summary the per-vertex terms need.
#[derive(Clone, Copy, Debug)]
struct Frame {
    y_min: f32,
    height: f32,
    half_width: f32,
}

impl Frame {
    fn of(mesh: &Mesh) -> Self {
        match mesh.bounds() {
            Some((min, max)) => Self {
                y_min: min.y,
                height: max.y - min.y,
                half_width: (max.x - min.x) * 0.5,
            },
            None => Self {
                y_min: 0.0,
                height: 0.0,
                half_width: 0.0,
            },
        }
    }

    /// Normalized height of `y`, guarded against a zero range.
    fn ratio(&self, y: f32) -> f32 {
        if self.height < MIN_HEIGHT_RANGE {
            return 0.0;
        }
        ((y - self.y_min) / self.height).clamp(0.0, 1.0)
    }
}

/// Deforms one vertex. `frame` describes the undeformed mesh.
fn deform_vertex(p: Vec3, frame: &Frame, params: &DeformParams, variant: PartVariant) -> Vec3 {
    let Vec3 { mut x, mut y, mut z } = p;
    let r = frame.ratio(p.y);
    let side = if p.x > 0.0 {
        1.0
    } else if p.x < 0.0 {
        -1.0
    } else {
        0.0
    };

    if variant.has_veins() && frame.half_width > MIN_HEIGHT_RANGE {
        // Groove along the spine, then ridges angling out from it.
        // Past the midrib scale the falloff exceeds 1 and the groove turns into a lift.
        let falloff = (p.x.abs() / (frame.half_width / 1.1)).sqrt();
        z -= (1.0 - falloff) * params.midrib_depth * r;
        let wave = (p.y * params.vein_frequency - p.x.abs() * params.vein_angle).cos();
        z += wave * params.vein_amplitude * r * (1.0 - falloff);
    }
    if variant.ruffles() {
        z += params.ruffle_amplitude * (p.x * params.ruffle_frequency).sin() * r;
    }

    let arch = params.back_bend * r.powf(params.arch_exponent.max(MIN_EXPONENT));
    z -= arch;
    let cup_exponent = params.cup_exponent.max(MIN_EXPONENT);
    z += params.cup * p.x.abs().powf(cup_exponent) * (1.0 - params.cup_taper * r);
    z -= params.belly * (PI * r).sin();

    x += params.flare * (PI * r).sin() * side;
    x -= params.pinch * (1.0 - r) * side;

    if variant.twists() && params.twist != 0.0 {
        let (sin, cos) = (params.twist * r).sin_cos();
        let pz = z + params.twist_pivot;
        let tx = x * cos - pz * sin;
        let tz = x * sin + pz * cos;
        x = tx;
        z = tz - params.twist_pivot;
    }

    y -= arch.sin() * frame.height * params.arch_compress;
    Vec3::new(x, y, z)
}

/// Applies `params` to every vertex of `mesh` and recomputes normals.
pub fn deform(mesh: &mut Mesh, params: &DeformParams, variant: PartVariant) {
    let frame = Frame::of(mesh);
    for p in &mut mesh.positions {
        *p = deform_vertex(*p, &frame, params, variant);
    }
    mesh.compute_normals();
}

/// Extrudes `outline`, deforms it for `variant` and recomputes normals.
///
/// Pure: identical inputs always produce identical geometry. Degenerate
/// outlines yield degenerate (possibly empty) meshes with finite coordinates.
pub fn build_mesh(
    outline: &Outline,
    extrude_settings: &ExtrudeSettings,
    params: &DeformParams,
    variant: PartVariant,
) -> Mesh {
    let mut mesh = extrude(outline, extrude_settings);
    deform(&mut mesh, params, variant);
    debug!(
        ?variant,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "built part mesh"
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::OutlinePreset;

    fn frame() -> Frame {
        Frame {
            y_min: 0.0,
            height: 1.0,
            half_width: 0.5,
        }
    }

    #[test]
    fn test_identity_params_leave_vertices() {
        let p = Vec3::new(0.3, 0.7, 0.01);
        for variant in [PartVariant::Petal, PartVariant::Leaf, PartVariant::Bud] {
            assert_eq!(
                deform_vertex(p, &frame(), &DeformParams::default(), variant),
                p
            );
        }
    }

    #[test]
    fn test_arch_is_strongest_at_tip() {
        let params = DeformParams::default().with_bend(0.5);
        let base = deform_vertex(Vec3::ZERO, &frame(), &params, PartVariant::Sepal);
        let tip = deform_vertex(Vec3::Y, &frame(), &params, PartVariant::Sepal);
        assert_eq!(base.z, 0.0);
        assert!((tip.z + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_cup_lifts_edges_not_spine() {
        let params = DeformParams::default().with_cup(0.4);
        let petal = |p| deform_vertex(p, &frame(), &params, PartVariant::Petal);
        let spine = petal(Vec3::new(0.0, 0.5, 0.0));
        let edge = petal(Vec3::new(0.5, 0.5, 0.0));
        assert_eq!(spine.z, 0.0);
        assert!((edge.z - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_twist_only_applies_to_buds() {
        let params = DeformParams {
            twist: 1.0,
            ..Default::default()
        };
        let p = Vec3::new(0.2, 1.0, 0.0);
        assert_eq!(deform_vertex(p, &frame(), &params, PartVariant::Petal), p);
        let twisted = deform_vertex(p, &frame(), &params, PartVariant::Bud);
        assert!((twisted.x - 0.2 * 1f32.cos()).abs() < 1e-6);
        assert!((twisted.z - 0.2 * 1f32.sin()).abs() < 1e-6);
        // Twist is a rotation in the XZ plane.
        assert!((twisted.x.hypot(twisted.z) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_non_positive_exponents_stay_finite() {
        let params = DeformParams {
            back_bend: 0.3,
            arch_exponent: -0.5,
            cup: 0.2,
            cup_exponent: 0.0,
            ..Default::default()
        };
        let base = deform_vertex(Vec3::ZERO, &frame(), &params, PartVariant::Petal);
        assert!(base.is_finite(), "{base}");

        let outline = OutlinePreset::RosePetal.to_outline();
        let settings = ExtrudeSettings::flat(0.01);
        let mesh = build_mesh(&outline, &settings, &params, PartVariant::Petal);
        assert!(mesh.positions.iter().all(|p| p.is_finite()));
        assert!(mesh.normals.iter().all(|n| (n.length() - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_leaf_edges_past_midrib_scale_lift() {
        let params = DeformParams {
            midrib_depth: 0.03,
            ..Default::default()
        };
        let leaf = |p| deform_vertex(p, &frame(), &params, PartVariant::Leaf);
        let spine = leaf(Vec3::new(0.0, 1.0, 0.0));
        let edge = leaf(Vec3::new(0.5, 1.0, 0.0));
        assert!((spine.z + 0.03).abs() < 1e-6);
        // falloff = sqrt(0.5 / (0.5 / 1.1)) = sqrt(1.1)
        let expected = (1.1f32.sqrt() - 1.0) * 0.03;
        assert!((edge.z - expected).abs() < 1e-6, "{}", edge.z);
    }

    #[test]
    fn test_flat_height_range_is_guarded() {
        let flat = Frame {
            y_min: 0.3,
            height: 0.0,
            half_width: 1.0,
        };
        let params = DeformParams::for_variant(PartVariant::Leaf, 0.4);
        let p = deform_vertex(Vec3::new(0.1, 0.3, 0.0), &flat, &params, PartVariant::Leaf);
        assert!(p.is_finite());
    }

    #[test]
    fn test_build_mesh_is_deterministic() {
        let outline = OutlinePreset::FanPetal { width: 1.0, length: 1.0 }.to_outline();
        let settings = ExtrudeSettings::flat(0.005).with_bevel(0.002, 0.01, 3);
        let params = DeformParams::for_variant(PartVariant::Petal, 0.5);
        let a = build_mesh(&outline, &settings, &params, PartVariant::Petal);
        let b = build_mesh(&outline, &settings, &params, PartVariant::Petal);
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_variant_yields_unit_normals() {
        let variants = [
            (PartVariant::Petal, OutlinePreset::RosePetal),
            (PartVariant::Leaf, OutlinePreset::Leaf { width: 0.5, height: 1.2 }),
            (PartVariant::Bud, OutlinePreset::Bud { width: 0.3, height: 0.8 }),
            (PartVariant::Sepal, OutlinePreset::Sepal { width: 0.3, length: 1.0 }),
            (PartVariant::Lip, OutlinePreset::Lip { width: 0.4, length: 0.8 }),
            (PartVariant::Keel, OutlinePreset::Keel),
            (PartVariant::Banner, OutlinePreset::Banner),
            (PartVariant::Wing, OutlinePreset::Wing),
            (PartVariant::Spathe, OutlinePreset::Spathe),
        ];
        let settings = ExtrudeSettings::flat(0.01).with_bevel(0.005, 0.01, 3);
        for (variant, preset) in variants {
            let params = DeformParams::for_variant(variant, 0.4);
            let mesh = build_mesh(&preset.to_outline(), &settings, &params, variant);
            assert!(mesh.triangle_count() > 0, "{variant:?}");
            for n in &mesh.normals {
                assert!((n.length() - 1.0).abs() < 1e-4, "{variant:?}: {n}");
            }
            assert!(mesh.positions.iter().all(|p| p.is_finite()), "{variant:?}");
        }
    }
}
