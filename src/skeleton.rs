use bevy_math::primitives::Cylinder;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Squared distance under which two points count as the same attachment point.
const COINCIDENT_EPSILON_SQ: f32 = 1e-10;

/// A single straight segment of a plant skeleton.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub start: Vec3,
    pub end: Vec3,

    /// Turtle orientation when the segment was drawn. Local `+Y` runs from
    /// `start` to `end`.
    pub orientation: Quat,
}

impl Branch {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Unit direction from start to end, or zero for a zero-length branch.
    pub fn direction(&self) -> Vec3 {
        (self.end - self.start).normalize_or_zero()
    }

    pub fn midpoint(&self) -> Vec3 {
        self.start.lerp(self.end, 0.5)
    }

    /// A cylinder of the given radius spanning this branch.
    pub fn to_stalk_segment(&self, radius: f32) -> StalkSegment {
        StalkSegment {
            shape: Cylinder::new(radius, self.length()),
            center: self.midpoint(),
            rotation: self.orientation,
        }
    }
}

/// A cylindrical stalk piece ready to be instanced by a renderer.
///
/// `bevy_math` cylinders are aligned along `Y`, which matches the turtle's
/// heading axis, so the branch orientation is used as-is.
#[derive(Clone, Copy, Debug)]
pub struct StalkSegment {
    pub shape: Cylinder,
    pub center: Vec3,
    pub rotation: Quat,
}

/// The ordered branch list produced by one interpretation run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    pub branches: Vec<Branch>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, branch: Branch) {
        self.branches.push(branch);
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn total_length(&self) -> f32 {
        self.branches.iter().map(Branch::length).sum()
    }

    /// Branches whose end point is not the start of any other branch.
    ///
    /// These are where flowers and leaves get attached. Returned in emission
    /// order; quadratic in the branch count, which stays small for stalks.
    pub fn tips(&self) -> Vec<&Branch> {
        let is_joint = |end: Vec3| {
            self.branches
                .iter()
                .any(|b| b.start.distance_squared(end) < COINCIDENT_EPSILON_SQ)
        };
        self.branches.iter().filter(|b| !is_joint(b.end)).collect()
    }

    /// Axis-aligned bounds over all branch end points, `None` when empty.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.branches.iter().flat_map(|b| [b.start, b.end]);
        let first = points.next()?;
        let bounds = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(bounds)
    }

    pub fn stalk_segments(&self, radius: f32) -> Vec<StalkSegment> {
        self.branches
            .iter()
            .map(|b| b.to_stalk_segment(radius))
            .collect()
    }
}

impl From<Vec<Branch>> for Skeleton {
    fn from(branches: Vec<Branch>) -> Self {
        Self { branches }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(start: Vec3, end: Vec3) -> Branch {
        Branch {
            start,
            end,
            orientation: Quat::IDENTITY,
        }
    }

    #[test]
    fn test_tips_skip_continued_branches() {
        let skeleton = Skeleton::from(vec![
            branch(Vec3::ZERO, Vec3::Y),
            branch(Vec3::Y, Vec3::new(0.0, 2.0, 0.0)),
            branch(Vec3::Y, Vec3::new(1.0, 1.5, 0.0)),
        ]);
        let tips: Vec<Vec3> = skeleton.tips().iter().map(|b| b.end).collect();
        let expected = vec![Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 1.5, 0.0)];
        assert_eq!(tips, expected);
    }

    #[test]
    fn test_bounds_and_length() {
        let skeleton = Skeleton::from(vec![
            branch(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0)),
            branch(Vec3::new(0.0, 2.0, 0.0), Vec3::new(-1.0, 2.0, 0.5)),
        ]);
        let expected = 2.0 + 1.25f32.sqrt();
        assert!((skeleton.total_length() - expected).abs() < 1e-6);
        let (min, max) = skeleton.bounds().unwrap();
        assert_eq!(min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(max, Vec3::new(0.0, 2.0, 0.5));
        assert!(Skeleton::new().bounds().is_none());
    }

    #[test]
    fn test_stalk_segment_spans_branch() {
        let b = branch(Vec3::ZERO, Vec3::new(0.0, 0.4, 0.0));
        let seg = b.to_stalk_segment(0.02);
        assert!((seg.shape.half_height - 0.2).abs() < 1e-6);
        assert_eq!(seg.shape.radius, 0.02);
        assert!((seg.center - Vec3::new(0.0, 0.2, 0.0)).length() < 1e-6);
    }
}
