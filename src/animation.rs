//! Time-driven animation state.
//!
//! Nothing here integrates per frame: [`BloomClock::advance`] only adds to the
//! elapsed time, and every animated quantity is a pure function of it. Frame
//! rate therefore never changes how a bloom looks at a given moment.

use glam::Quat;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationParams {
    /// Seconds from fully closed to fully open.
    pub bloom_duration: f32,
    /// Radians per second fed into the sway sine.
    pub sway_speed: f32,
    /// Peak sway angle in radians.
    pub sway_amplitude: f32,
    /// Glow pulses per second.
    pub glow_frequency: f32,
    pub glow_min: f32,
    pub glow_max: f32,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            bloom_duration: 3.0,
            sway_speed: 0.8,
            sway_amplitude: 0.05,
            glow_frequency: 0.5,
            glow_min: 0.6,
            glow_max: 1.0,
        }
    }
}

impl AnimationParams {
    /// The pose at `elapsed` seconds after the bloom started.
    pub fn pose_at(&self, elapsed: f32) -> FramePose {
        let progress = if self.bloom_duration > 0.0 {
            (elapsed / self.bloom_duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let pulse = 0.5 + 0.5 * (elapsed * self.glow_frequency * TAU).sin();
        FramePose {
            elapsed,
            openness: smoothstep(progress),
            sway_angle: (elapsed * self.sway_speed).sin() * self.sway_amplitude,
            glow: self.glow_min + (self.glow_max - self.glow_min) * pulse,
        }
    }
}

/// Hermite ease from 0 to 1 with zero slope at both ends.
fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Everything a renderer needs to pose one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FramePose {
    pub elapsed: f32,
    /// 0 when closed, 1 when fully bloomed.
    pub openness: f32,
    /// Whole-plant lean about `Z`, in radians.
    pub sway_angle: f32,
    /// Emissive multiplier.
    pub glow: f32,
}

impl FramePose {
    /// A fully open, unswayed pose.
    pub const OPEN: Self = Self {
        elapsed: 0.0,
        openness: 1.0,
        sway_angle: 0.0,
        glow: 1.0,
    };

    pub fn sway_rotation(&self) -> Quat {
        Quat::from_rotation_z(self.sway_angle)
    }
}

/// Where the title sequence is at a given moment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntroPhase {
    /// Title fading in.
    Appearing,
    Holding,
    /// Title fading out while the sparkles spread.
    Dissipating,
    Finished,
}

impl IntroPhase {
    pub fn sparkles(self) -> SparkleStyle {
        match self {
            Self::Dissipating => SparkleStyle {
                count: 200,
                spread: 12.0,
                size: 6.0,
                speed: 3.0,
            },
            _ => SparkleStyle {
                count: 80,
                spread: 4.0,
                size: 2.0,
                speed: 0.6,
            },
        }
    }
}

/// Particle settings for the sparkle cloud around the title.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SparkleStyle {
    pub count: u32,
    /// Side of the cube the sparkles fill.
    pub spread: f32,
    pub size: f32,
    pub speed: f32,
}

/// Title sequence timing. Times are seconds from the start, rates are per second.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroTimeline {
    pub hold_at: f32,
    pub dissipate_at: f32,
    pub finish_at: f32,
    pub fade_in_rate: f32,
    pub fade_out_rate: f32,
    /// Sparkle scale gained per second while dissipating.
    pub sparkle_growth: f32,
    /// Sparkle spin about `Y` while dissipating, in radians per second.
    pub sparkle_spin_rate: f32,
}

impl Default for IntroTimeline {
    fn default() -> Self {
        Self {
            hold_at: 1.5,
            dissipate_at: 3.5,
            finish_at: 5.0,
            fade_in_rate: 0.8,
            fade_out_rate: 1.2,
            sparkle_growth: 3.0,
            sparkle_spin_rate: 2.0,
        }
    }
}

impl IntroTimeline {
    pub fn phase_at(&self, elapsed: f32) -> IntroPhase {
        if elapsed < self.hold_at {
            IntroPhase::Appearing
        } else if elapsed < self.dissipate_at {
            IntroPhase::Holding
        } else if elapsed < self.finish_at {
            IntroPhase::Dissipating
        } else {
            IntroPhase::Finished
        }
    }

    /// The title and sparkle state at `elapsed` seconds into the sequence.
    pub fn frame_at(&self, elapsed: f32) -> IntroFrame {
        let phase = self.phase_at(elapsed);
        // Fading out starts from whatever the fade-in reached.
        let peak = (self.fade_in_rate * self.hold_at).clamp(0.0, 1.0);
        let dissipating = (elapsed.min(self.finish_at) - self.dissipate_at).max(0.0);
        let title_opacity = match phase {
            IntroPhase::Appearing => (self.fade_in_rate * elapsed).clamp(0.0, 1.0),
            IntroPhase::Holding => peak,
            IntroPhase::Dissipating => (peak - self.fade_out_rate * dissipating).max(0.0),
            IntroPhase::Finished => 0.0,
        };
        IntroFrame {
            phase,
            title_opacity,
            sparkle_opacity: title_opacity * 0.8,
            sparkle_scale: 1.0 + self.sparkle_growth * dissipating,
            sparkle_spin: self.sparkle_spin_rate * dissipating,
            sparkles: phase.sparkles(),
        }
    }
}

/// One frame of the title sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntroFrame {
    pub phase: IntroPhase,
    pub title_opacity: f32,
    pub sparkle_opacity: f32,
    /// Uniform scale of the sparkle cloud.
    pub sparkle_scale: f32,
    /// Sparkle cloud rotation about `Y`, in radians.
    pub sparkle_spin: f32,
    pub sparkles: SparkleStyle,
}

impl IntroFrame {
    pub fn is_finished(&self) -> bool {
        self.phase == IntroPhase::Finished
    }
}

/// The default title sequence at `elapsed` seconds.
pub fn intro_at(elapsed: f32) -> IntroFrame {
    IntroTimeline::default().frame_at(elapsed)
}

/// Accumulates elapsed time for one bloom.
#[derive(Clone, Debug, Default)]
pub struct BloomClock {
    params: AnimationParams,
    elapsed: f32,
}

impl BloomClock {
    pub fn new(params: AnimationParams) -> Self {
        Self {
            params,
            elapsed: 0.0,
        }
    }

    /// Adds `dt` seconds and returns the pose for the new time.
    ///
    /// Negative or non-finite steps are ignored.
    pub fn advance(&mut self, dt: f32) -> FramePose {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        self.pose()
    }

    pub fn pose(&self) -> FramePose {
        self.params.pose_at(self.elapsed)
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn params(&self) -> &AnimationParams {
        &self.params
    }

    pub fn is_fully_open(&self) -> bool {
        self.elapsed >= self.params.bloom_duration
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openness_eases_in_and_out() {
        let params = AnimationParams::default();
        assert_eq!(params.pose_at(0.0).openness, 0.0);
        assert!((params.pose_at(1.5).openness - 0.5).abs() < 1e-6);
        assert_eq!(params.pose_at(3.0).openness, 1.0);
        assert_eq!(params.pose_at(100.0).openness, 1.0);
        // Slow start.
        assert!(params.pose_at(0.3).openness < 0.1);
    }

    #[test]
    fn test_pose_depends_only_on_elapsed_time() {
        let mut coarse = BloomClock::default();
        let mut fine = BloomClock::default();
        coarse.advance(0.5);
        coarse.advance(0.5);
        for _ in 0..100 {
            fine.advance(0.01);
        }
        let (a, b) = (coarse.pose(), fine.pose());
        assert!((a.elapsed - b.elapsed).abs() < 1e-4);
        assert!((a.openness - b.openness).abs() < 1e-4);
        assert!((a.sway_angle - b.sway_angle).abs() < 1e-4);
    }

    #[test]
    fn test_clock_reports_full_bloom() {
        let params = AnimationParams {
            bloom_duration: 2.0,
            ..Default::default()
        };
        let mut clock = BloomClock::new(params.clone());
        assert_eq!(clock.params(), &params);
        clock.advance(1.5);
        assert!(!clock.is_fully_open());
        let pose = clock.advance(0.5);
        assert!(clock.is_fully_open());
        assert_eq!(pose.openness, 1.0);
    }

    #[test]
    fn test_invalid_steps_are_ignored() {
        let mut clock = BloomClock::default();
        clock.advance(1.0);
        clock.advance(-5.0);
        clock.advance(f32::NAN);
        assert_eq!(clock.elapsed(), 1.0);
        clock.reset();
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_sway_and_glow_stay_in_range() {
        let params = AnimationParams::default();
        for i in 0..200 {
            let pose = params.pose_at(i as f32 * 0.37);
            assert!(pose.sway_angle.abs() <= params.sway_amplitude + 1e-6);
            let glow_range = params.glow_min - 1e-6..=params.glow_max + 1e-6;
            assert!(glow_range.contains(&pose.glow));
        }
    }

    #[test]
    fn test_zero_duration_opens_immediately() {
        let params = AnimationParams {
            bloom_duration: 0.0,
            ..Default::default()
        };
        assert_eq!(params.pose_at(0.0).openness, 1.0);
    }

    #[test]
    fn test_intro_phases_follow_the_timeline() {
        assert_eq!(intro_at(0.0).phase, IntroPhase::Appearing);
        assert_eq!(intro_at(1.49).phase, IntroPhase::Appearing);
        assert_eq!(intro_at(1.5).phase, IntroPhase::Holding);
        assert_eq!(intro_at(3.5).phase, IntroPhase::Dissipating);
        assert!(!intro_at(4.99).is_finished());
        assert!(intro_at(5.0).is_finished());
    }

    #[test]
    fn test_intro_title_fades_in_then_out() {
        assert_eq!(intro_at(0.0).title_opacity, 0.0);
        assert!((intro_at(0.5).title_opacity - 0.4).abs() < 1e-6);
        assert_eq!(intro_at(1.4).title_opacity, 1.0);
        assert_eq!(intro_at(2.5).title_opacity, 1.0);
        let fading = intro_at(4.0);
        assert!((fading.title_opacity - 0.4).abs() < 1e-5);
        assert!((fading.sparkle_opacity - 0.32).abs() < 1e-5);
        assert_eq!(intro_at(4.5).title_opacity, 0.0);
        assert_eq!(intro_at(8.0).title_opacity, 0.0);
    }

    #[test]
    fn test_slow_fade_in_carries_into_dissipation() {
        let timeline = IntroTimeline {
            fade_in_rate: 0.5,
            ..Default::default()
        };
        assert!((timeline.frame_at(2.0).title_opacity - 0.75).abs() < 1e-6);
        assert!((timeline.frame_at(4.0).title_opacity - 0.15).abs() < 1e-5);
    }

    #[test]
    fn test_sparkles_spread_only_while_dissipating() {
        let holding = intro_at(3.0);
        assert_eq!(holding.sparkle_scale, 1.0);
        assert_eq!(holding.sparkle_spin, 0.0);
        assert_eq!(holding.sparkles.count, 80);

        let spreading = intro_at(4.0);
        assert!((spreading.sparkle_scale - 2.5).abs() < 1e-5);
        assert!((spreading.sparkle_spin - 1.0).abs() < 1e-5);
        assert_eq!(spreading.sparkles.count, 200);
        assert_eq!(spreading.sparkles.spread, 12.0);

        // Growth stops once the sequence is over.
        assert!((intro_at(5.0).sparkle_scale - 5.5).abs() < 1e-5);
        assert!((intro_at(9.0).sparkle_scale - 5.5).abs() < 1e-5);
    }
}
