//! The visitor-facing flow: type a name, read the message, watch the bloom.
//!
//! [`Experience`] holds only the stage and timers. Rendering, text widgets
//! and audio playback belong to the host; audio is reached through the
//! [`AudioCue`] trait so a failing player never blocks the flow.

use crate::animation::{AnimationParams, BloomClock, FramePose};
use crate::catalog::{PlantCatalog, PlantEntry};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, warn};

/// Seconds the greeting stays up after the animation starts.
pub const GREETING_SECONDS: f32 = 4.0;
/// Seconds between fun facts.
pub const FACT_INTERVAL_SECONDS: f32 = 9.0;
/// Seconds each fun fact stays visible.
pub const FACT_VISIBLE_SECONDS: f32 = 4.0;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Playback blocked: {0}")]
    Blocked(String),
    #[error("No audio device available")]
    Unavailable,
}

/// Starts the background melody for plants that have one.
pub trait AudioCue {
    fn play(&mut self) -> Result<(), AudioError>;
}

/// An [`AudioCue`] that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl AudioCue for Silent {
    fn play(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Input,
    Message,
    Animation,
}

/// Regions a fact may appear in, as normalized `(top, left)` ranges. They
/// ring the centre of the screen where the plant is drawn.
const FACT_ZONES: [[(f32, f32); 2]; 8] = [
    [(0.10, 0.35), (0.10, 0.35)],
    [(0.10, 0.35), (0.65, 0.90)],
    [(0.65, 0.90), (0.10, 0.35)],
    [(0.65, 0.90), (0.65, 0.90)],
    [(0.10, 0.35), (0.35, 0.65)],
    [(0.65, 0.90), (0.35, 0.65)],
    [(0.35, 0.65), (0.10, 0.35)],
    [(0.35, 0.65), (0.65, 0.90)],
];

/// One fun-fact appearance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FactSlot {
    pub index: usize,
    /// Normalized screen position, `x` = left, `y` = top.
    pub position: Vec2,
}

/// Which fact is on screen at a given time.
///
/// The n-th appearance starts at `n * interval` (n ≥ 1) and lasts `visible`
/// seconds. Choices come from a generator seeded with `seed`, so the same
/// schedule always answers the same way for the same time.
#[derive(Clone, Debug, PartialEq)]
pub struct FactSchedule {
    pub interval: f32,
    pub visible: f32,
    pub seed: u64,
}

impl Default for FactSchedule {
    fn default() -> Self {
        Self {
            interval: FACT_INTERVAL_SECONDS,
            visible: FACT_VISIBLE_SECONDS,
            seed: 0,
        }
    }
}

impl FactSchedule {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// The fact visible `elapsed` seconds into the animation, if any.
    ///
    /// Consecutive appearances never repeat a fact unless only one exists.
    pub fn fact_at(&self, elapsed: f32, fact_count: usize) -> Option<FactSlot> {
        if fact_count == 0 || self.interval <= 0.0 || !elapsed.is_finite() {
            return None;
        }
        let cycle = (elapsed / self.interval).floor();
        if cycle < 1.0 || elapsed - cycle * self.interval >= self.visible {
            return None;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut slot = None;
        let mut previous: Option<usize> = None;
        for _ in 0..cycle as u64 {
            let index = match previous {
                Some(prev) if fact_count > 1 => {
                    let pick = rng.random_range(0..fact_count - 1);
                    if pick >= prev {
                        pick + 1
                    } else {
                        pick
                    }
                }
                _ => rng.random_range(0..fact_count),
            };
            let zone = rng.random_range(0..FACT_ZONES.len());
            let [(top_lo, top_hi), (left_lo, left_hi)] = FACT_ZONES[zone];
            let position = Vec2::new(
                rng.random_range(left_lo..left_hi),
                rng.random_range(top_lo..top_hi),
            );
            previous = Some(index);
            slot = Some(FactSlot { index, position });
        }
        slot
    }
}

/// What the host should draw over the plant this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlay<'a> {
    pub greeting_visible: bool,
    pub fact: Option<(&'a str, Vec2)>,
}

/// The three-stage visitor flow.
#[derive(Debug, Default)]
pub struct Experience {
    stage: Stage,
    visitor: String,
    plant: Option<PlantEntry>,
    clock: BloomClock,
    facts: FactSchedule,
}

impl Experience {
    pub fn new(animation: AnimationParams, facts: FactSchedule) -> Self {
        Self {
            clock: BloomClock::new(animation),
            facts,
            ..Default::default()
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The name as the visitor typed it, trimmed.
    pub fn visitor(&self) -> &str {
        &self.visitor
    }

    pub fn plant(&self) -> Option<&PlantEntry> {
        self.plant.as_ref()
    }

    /// Looks the name up and moves to [`Stage::Message`] when it is known.
    ///
    /// Unknown names, or calls outside [`Stage::Input`], change nothing and
    /// return `None`. Audio failures are logged and otherwise ignored.
    pub fn submit(
        &mut self,
        name: &str,
        catalog: &PlantCatalog,
        audio: &mut dyn AudioCue,
    ) -> Option<&PlantEntry> {
        if self.stage != Stage::Input {
            return None;
        }
        let Some(entry) = catalog.resolve(name) else {
            debug!(name, "no plant for visitor name");
            return None;
        };
        if entry.has_audio
            && let Err(e) = audio.play()
        {
            warn!(error = %e, "audio cue failed");
        }
        debug!(plant = %entry.id, "revealing plant");
        self.visitor = name.trim().to_string();
        self.plant = Some(entry.clone());
        self.stage = Stage::Message;
        self.plant.as_ref()
    }

    /// Moves from [`Stage::Message`] to [`Stage::Animation`] and restarts the
    /// bloom. Returns whether the stage changed.
    pub fn show_animation(&mut self) -> bool {
        if self.stage != Stage::Message {
            return false;
        }
        self.clock.reset();
        self.stage = Stage::Animation;
        true
    }

    /// Advances the bloom. Outside [`Stage::Animation`] time stands still.
    pub fn advance(&mut self, dt: f32) -> Option<FramePose> {
        (self.stage == Stage::Animation).then(|| self.clock.advance(dt))
    }

    pub fn elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    /// Overlay state at the current animation time.
    pub fn overlay(&self) -> Overlay<'_> {
        if self.stage != Stage::Animation {
            return Overlay {
                greeting_visible: false,
                fact: None,
            };
        }
        let t = self.clock.elapsed();
        let facts = self.plant.as_ref().map_or(&[][..], |p| &p.fun_facts[..]);
        Overlay {
            greeting_visible: t < GREETING_SECONDS,
            fact: self
                .facts
                .fact_at(t, facts.len())
                .map(|slot| (facts[slot.index].as_str(), slot.position)),
        }
    }

    /// Back to [`Stage::Input`] with nothing selected.
    pub fn reset(&mut self) {
        self.stage = Stage::Input;
        self.visitor.clear();
        self.plant = None;
        self.clock.reset();
    }
}
