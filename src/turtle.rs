//! Turtle state and operations for skeleton interpretation.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// The state of the skeleton turtle.
///
/// A plain value type: `[` pushes a copy, so saved states never alias the live
/// turtle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurtleState {
    /// Current world-space position of the "cursor".
    pub position: Vec3,

    /// Current world-space orientation. The heading is the local `+Y` axis.
    pub rotation: Quat,
}

impl Default for TurtleState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl TurtleState {
    /// Returns the direction of travel (local `+Y`) in world space.
    pub fn heading(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Returns the turtle's local `+X` (lateral) direction in world space.
    pub fn left(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Returns the turtle's local `+Z` direction in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Moves the turtle along its heading and returns the previous position.
    pub fn advance(&mut self, distance: f32) -> Vec3 {
        let from = self.position;
        self.position += self.heading() * distance;
        from
    }

    /// Rotates around the local Z axis by `angle` radians (Yaw).
    pub fn yaw(&mut self, angle: f32) {
        self.rotation *= Quat::from_axis_angle(Vec3::Z, angle);
    }

    /// Rotates around the local X axis by `angle` radians (Pitch).
    pub fn pitch(&mut self, angle: f32) {
        self.rotation *= Quat::from_axis_angle(Vec3::X, angle);
    }

    /// Rotates around the heading by `angle` radians (Roll).
    pub fn roll(&mut self, angle: f32) {
        self.rotation *= Quat::from_axis_angle(Vec3::Y, angle);
    }
}

/// Operations that can be performed by the skeleton turtle.
///
/// Rotation variants carry a sign multiplier applied to the configured angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurtleOp {
    /// Draw a branch and move forward (`F`).
    Forward,
    /// Move forward without drawing.
    Move,
    /// Rotate around local Z (`+`/`-`).
    Yaw(f32),
    /// Rotate around local X (`&`/`^`).
    Pitch(f32),
    /// Rotate around the heading (`\`/`/`).
    Roll(f32),
    /// Save the turtle state onto the stack (`[`).
    Push,
    /// Restore the most recently pushed turtle state (`]`).
    Pop,
    /// No-op; symbol has no registered meaning.
    Ignore,
}

/// The conventional bracketed-L-System alphabet.
pub const STANDARD_SYMBOLS: [(char, TurtleOp); 9] = [
    ('F', TurtleOp::Forward),
    ('+', TurtleOp::Yaw(1.0)),
    ('-', TurtleOp::Yaw(-1.0)),
    ('&', TurtleOp::Pitch(1.0)),
    ('^', TurtleOp::Pitch(-1.0)),
    ('\\', TurtleOp::Roll(1.0)),
    ('/', TurtleOp::Roll(-1.0)),
    ('[', TurtleOp::Push),
    (']', TurtleOp::Pop),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_default_heading_is_up() {
        let turtle = TurtleState::default();
        assert_eq!(turtle.heading(), Vec3::Y);
        assert_eq!(turtle.position, Vec3::ZERO);
    }

    #[test]
    fn test_yaw_turns_heading_in_xy_plane() {
        let mut turtle = TurtleState::default();
        turtle.yaw(FRAC_PI_2);
        let h = turtle.heading();
        assert!((h - Vec3::NEG_X).length() < 1e-6, "heading was {h}");
    }

    #[test]
    fn test_pitch_turns_heading_toward_z() {
        let mut turtle = TurtleState::default();
        turtle.pitch(FRAC_PI_2);
        let h = turtle.heading();
        assert!((h - Vec3::Z).length() < 1e-6, "heading was {h}");
        // The frame stays right-handed: local up tips back to -Y.
        assert!((turtle.up() - Vec3::NEG_Y).length() < 1e-6);
        assert!((turtle.left() - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_roll_keeps_heading() {
        let mut turtle = TurtleState::default();
        turtle.roll(1.234);
        assert!((turtle.heading() - Vec3::Y).length() < 1e-6);
        assert!((turtle.left() - Vec3::X).length() > 0.1);
    }

    #[test]
    fn test_advance_returns_previous_position() {
        let mut turtle = TurtleState::default();
        let from = turtle.advance(0.5);
        assert_eq!(from, Vec3::ZERO);
        assert!((turtle.position - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-6);
    }
}
