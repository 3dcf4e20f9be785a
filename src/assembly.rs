//! Composes a stalk skeleton, part meshes and textures into one plant model.
//!
//! Geometry is built once per [`PartSpec`]; every copy placed on the plant is
//! a [`PartInstance`] referring back to it. Animating the plant only changes
//! instance transforms (see [`PartInstance::pose`]).

use crate::animation::FramePose;
use crate::catalog::{GeneratorParams, PartSpec};
use crate::deform::{PartVariant, build_mesh};
use crate::interpreter::{InterpreterConfig, SkeletonInterpreter};
use crate::mesh::Mesh;
use crate::skeleton::{Skeleton, StalkSegment};
use crate::texture::{Raster, paint_with_rng};
use glam::{Mat4, Quat, Vec3};
use rand::Rng;
use std::f32::consts::TAU;
use tracing::{debug, trace};

/// Built geometry and texture shared by every instance of one part spec.
#[derive(Clone, Debug)]
pub struct PartGeometry {
    pub variant: PartVariant,
    pub mesh: Mesh,
    pub texture: Raster,
}

/// A rigid transform with uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Placement {
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.rotation,
            self.translation,
        )
    }
}

/// One placed copy of a [`PartGeometry`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartInstance {
    /// Index into [`PlantModel::parts`].
    pub part: usize,
    pub position: Vec3,
    pub closed_rotation: Quat,
    pub open_rotation: Quat,
    pub scale: f32,
}

impl PartInstance {
    /// Blends from closed to open by the frame's openness, then applies sway.
    pub fn pose(&self, frame: &FramePose) -> Placement {
        let sway = frame.sway_rotation();
        let bloom = self
            .closed_rotation
            .slerp(self.open_rotation, frame.openness.clamp(0.0, 1.0));
        Placement {
            translation: sway * self.position,
            rotation: sway * bloom,
            scale: self.scale,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PlantModel {
    pub skeleton: Skeleton,
    pub stalk: Vec<StalkSegment>,
    pub parts: Vec<PartGeometry>,
    pub instances: Vec<PartInstance>,
}

impl PlantModel {
    /// Assembles a plant using the thread-local random source for textures.
    pub fn assemble(params: &GeneratorParams) -> Self {
        Self::assemble_with_rng(params, &mut rand::rng())
    }

    pub fn assemble_with_rng<R: Rng + ?Sized>(params: &GeneratorParams, rng: &mut R) -> Self {
        let mut model = Self::default();

        if let Some(stalk) = &params.stalk {
            let symbols = stalk.lsystem.expand();
            let interpreter = SkeletonInterpreter::standard(InterpreterConfig {
                angle_degrees: stalk.angle_degrees,
                segment_length: stalk.segment_length,
            });
            model.skeleton = interpreter.interpret(&symbols);
            model.stalk = model.skeleton.stalk_segments(stalk.radius);
        }

        let mut attachments: Vec<(Vec3, Quat)> = model
            .skeleton
            .tips()
            .into_iter()
            .map(|b| (b.end, b.orientation))
            .collect();
        if attachments.is_empty() {
            // A stalk that closes on itself has no free ends; use where it stopped.
            let fallback = model
                .skeleton
                .branches
                .last()
                .map_or((Vec3::ZERO, Quat::IDENTITY), |b| (b.end, b.orientation));
            attachments.push(fallback);
        }

        for spec in &params.parts {
            if spec.count == 0 {
                trace!(variant = ?spec.variant, "skipping part with zero count");
                continue;
            }
            let part = model.parts.len();
            model.parts.push(build_part(spec, rng));
            for &(position, orientation) in &attachments {
                place_instances(&mut model.instances, part, spec, position, orientation);
            }
        }

        debug!(
            branches = model.skeleton.len(),
            attachments = attachments.len(),
            parts = model.parts.len(),
            instances = model.instances.len(),
            "assembled plant"
        );
        model
    }

    /// Stalk transforms for one frame. Cylinders keep unit scale.
    pub fn stalk_poses(&self, frame: &FramePose) -> Vec<Placement> {
        let sway = frame.sway_rotation();
        self.stalk
            .iter()
            .map(|segment| Placement {
                translation: sway * segment.center,
                rotation: sway * segment.rotation,
                scale: 1.0,
            })
            .collect()
    }

    /// Part transforms for one frame, in instance order.
    pub fn part_poses(&self, frame: &FramePose) -> Vec<Placement> {
        self.instances.iter().map(|i| i.pose(frame)).collect()
    }

    pub fn instances_of(&self, part: usize) -> impl Iterator<Item = &PartInstance> {
        self.instances.iter().filter(move |i| i.part == part)
    }
}

fn build_part<R: Rng + ?Sized>(spec: &PartSpec, rng: &mut R) -> PartGeometry {
    let outline = spec.outline.to_outline();
    let mesh = build_mesh(&outline, &spec.extrude, &spec.deform, spec.variant);
    let texture = paint_with_rng(spec.texture_size, spec.texture_size, &spec.paint, rng);
    PartGeometry {
        variant: spec.variant,
        mesh,
        texture,
    }
}

/// Spreads `spec.count` copies evenly around the attachment heading.
///
/// Closed copies point along the heading; open ones lean out by the tilt.
fn place_instances(
    instances: &mut Vec<PartInstance>,
    part: usize,
    spec: &PartSpec,
    position: Vec3,
    orientation: Quat,
) {
    let tilt = spec.tilt_degrees.to_radians();
    for i in 0..spec.count {
        let around = orientation * Quat::from_rotation_y(i as f32 * TAU / spec.count as f32);
        instances.push(PartInstance {
            part,
            position,
            closed_rotation: around,
            open_rotation: around * Quat::from_rotation_x(tilt),
            scale: spec.scale,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StalkParams;
    use crate::outline::OutlinePreset;
    use crate::rewriter::{LSystem, RewriteRules};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn petals(count: u32) -> PartSpec {
        let mut spec = PartSpec::new(
            PartVariant::Petal,
            OutlinePreset::FanPetal {
                width: 0.2,
                length: 0.4,
            },
        )
        .with_count(count)
        .with_tilt(45.0);
        spec.texture_size = 8;
        spec
    }

    fn stalk(axiom: &str) -> StalkParams {
        StalkParams {
            lsystem: LSystem::new(axiom, RewriteRules::new(), 0),
            angle_degrees: 30.0,
            segment_length: 0.2,
            radius: 0.02,
        }
    }

    #[test]
    fn test_no_stalk_attaches_at_origin() {
        let params = GeneratorParams {
            stalk: None,
            parts: vec![petals(5)],
        };
        let model = PlantModel::assemble_with_rng(&params, &mut StdRng::seed_from_u64(1));
        assert!(model.stalk.is_empty());
        assert_eq!(model.parts.len(), 1);
        assert_eq!(model.instances.len(), 5);
        assert!(model.instances.iter().all(|i| i.position == Vec3::ZERO));
    }

    #[test]
    fn test_parts_attach_at_every_tip() {
        let params = GeneratorParams {
            stalk: Some(stalk("F[+F][-F]")),
            parts: vec![petals(3)],
        };
        let model = PlantModel::assemble_with_rng(&params, &mut StdRng::seed_from_u64(1));
        assert_eq!(model.stalk.len(), 3);
        assert_eq!(model.instances.len(), 2 * 3);
        // The trunk end carries branches, so nothing attaches there.
        let trunk_end = Vec3::new(0.0, 0.2, 0.0);
        for instance in &model.instances {
            assert!(instance.position.distance(trunk_end) > 1e-3);
        }
    }

    #[test]
    fn test_geometry_built_once_per_spec() {
        let params = GeneratorParams {
            stalk: Some(stalk("F[+F][-F][&F]")),
            parts: vec![petals(4), petals(0), petals(1)],
        };
        let model = PlantModel::assemble_with_rng(&params, &mut StdRng::seed_from_u64(3));
        assert_eq!(model.parts.len(), 2);
        assert_eq!(model.instances_of(0).count(), 3 * 4);
        assert_eq!(model.instances_of(1).count(), 3);
        assert!(model.parts.iter().all(|p| p.mesh.vertex_count() > 0));
    }

    #[test]
    fn test_pose_blends_closed_to_open() {
        let params = GeneratorParams {
            stalk: None,
            parts: vec![petals(1)],
        };
        let model = PlantModel::assemble_with_rng(&params, &mut StdRng::seed_from_u64(1));
        let instance = model.instances[0];

        let closed = FramePose {
            openness: 0.0,
            ..FramePose::OPEN
        };
        let closed_pose = instance.pose(&closed);
        let offset = closed_pose.rotation - instance.closed_rotation;
        assert!(offset.length() < 1e-5);

        let open_pose = instance.pose(&FramePose::OPEN);
        let offset = open_pose.rotation - instance.open_rotation;
        assert!(offset.length() < 1e-5);
        // The open petal leans 45 degrees away from the heading.
        let tip = open_pose.rotation * Vec3::Y;
        let lean = tip.angle_between(Vec3::Y);
        assert!((lean - 45f32.to_radians()).abs() < 1e-4);
    }

    #[test]
    fn test_sway_moves_the_whole_plant() {
        let params = GeneratorParams {
            stalk: Some(stalk("FF")),
            parts: vec![petals(1)],
        };
        let model = PlantModel::assemble_with_rng(&params, &mut StdRng::seed_from_u64(1));
        let frame = FramePose {
            sway_angle: 0.1,
            ..FramePose::OPEN
        };
        let part = model.part_poses(&frame)[0];
        let tip = Vec3::new(0.0, 0.4, 0.0);
        let swayed_tip = Quat::from_rotation_z(0.1) * tip;
        assert!((part.translation - swayed_tip).length() < 1e-5);
        assert_eq!(model.stalk_poses(&frame).len(), 2);

        let matrix = part.to_matrix();
        let origin = matrix.transform_point3(Vec3::ZERO);
        assert!((origin - part.translation).length() < 1e-6);
        let scaled = matrix.transform_vector3(Vec3::Y);
        assert!((scaled.length() - part.scale).abs() < 1e-6);
    }

    #[test]
    fn test_closed_loop_stalk_still_carries_parts() {
        let mut loop_stalk = stalk("F+F+F+F");
        loop_stalk.angle_degrees = 90.0;
        let params = GeneratorParams {
            stalk: Some(loop_stalk),
            parts: vec![petals(2)],
        };
        let model = PlantModel::assemble_with_rng(&params, &mut StdRng::seed_from_u64(4));
        assert_eq!(model.skeleton.len(), 4);
        assert!(model.skeleton.tips().is_empty());
        assert_eq!(model.instances.len(), 2);
        let last_end = model.skeleton.branches[3].end;
        assert!(model.instances.iter().all(|i| i.position == last_end));
    }

    #[test]
    fn test_seeded_assembly_is_reproducible() {
        let params = GeneratorParams {
            stalk: Some(stalk("F[+F]F")),
            parts: vec![petals(5)],
        };
        let a = PlantModel::assemble_with_rng(&params, &mut StdRng::seed_from_u64(9));
        let b = PlantModel::assemble_with_rng(&params, &mut StdRng::seed_from_u64(9));
        assert_eq!(a.instances, b.instances);
        assert_eq!(a.parts[0].mesh, b.parts[0].mesh);
        assert_eq!(a.parts[0].texture, b.parts[0].texture);
    }
}
