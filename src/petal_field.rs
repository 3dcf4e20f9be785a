//! The cloud of drifting petals behind the name prompt.
//!
//! Every petal shares one teardrop mesh and the field shares one tint, picked
//! from the plant the visitor typed. As with the bloom, poses are a function
//! of elapsed time; the seed only fixes where each petal drifts. Once the
//! visitor's plant is revealed the field speeds up and bursts toward the
//! viewer.

use crate::assembly::Placement;
use crate::catalog::{PlantCatalog, normalize_name};
use crate::deform::{DeformParams, PartVariant, build_mesh};
use crate::extrude::ExtrudeSettings;
use crate::mesh::Mesh;
use crate::outline::Outline;
use glam::{EulerRot, Quat, Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Packed `0xRRGGBB` sRGB tint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PetalTint(pub u32);

impl PetalTint {
    pub const VALENTINE: Self = Self(0xff2d75);
    /// A recognized plant with no tint of its own.
    pub const PLAIN_PLANT: Self = Self(0x0f330f);
    /// Nothing matched the typed name.
    pub const UNKNOWN: Self = Self(0x1a4015);

    /// Opaque `[r, g, b, a]` in `[0, 1]`.
    pub fn to_rgba(self) -> [f32; 4] {
        let channel = |shift: u32| ((self.0 >> shift) & 0xff) as f32 / 255.0;
        [channel(16), channel(8), channel(0), 1.0]
    }
}

/// Field tints keyed by display name.
const DISPLAY_TINTS: [(&str, PetalTint); 6] = [
    ("Peace Lily", PetalTint(0xffffff)),
    ("Gladiolus", PetalTint(0xff8c00)),
    ("Pink Carnation", PetalTint(0xffb7c5)),
    ("Blue Orchid", PetalTint(0x3b82f6)),
    ("Sweet Pea", PetalTint(0xff69b4)),
    ("Lotus", PetalTint(0xffb6c1)),
];

/// Picks the field tint for free-form visitor input.
///
/// `valentine` always gets its own tint. Anything else goes through
/// [`PlantCatalog::resolve`], and the matched entry's display name picks
/// the tint.
pub fn petal_tint(catalog: &PlantCatalog, name: &str) -> PetalTint {
    if normalize_name(name) == "valentine" {
        return PetalTint::VALENTINE;
    }
    match catalog.resolve(name) {
        Some(entry) => DISPLAY_TINTS
            .iter()
            .find(|(display, _)| *display == entry.display_name)
            .map_or(PetalTint::PLAIN_PLANT, |&(_, tint)| tint),
        None => PetalTint::UNKNOWN,
    }
}

/// The teardrop shared by every field petal, softly cupped across and bent
/// back along its length.
pub fn petal_mesh() -> Mesh {
    let outline = Outline::new()
        .move_to(0.0, 0.0)
        .bezier_curve_to(0.4, 0.1, 0.8, 0.6, 0.0, 1.2)
        .bezier_curve_to(-0.8, 0.6, -0.4, 0.1, 0.0, 0.0);
    let settings = ExtrudeSettings {
        bevel_enabled: true,
        ..Default::default()
    };
    let deform = DeformParams {
        back_bend: 0.2,
        cup: 0.4,
        ..Default::default()
    };
    build_mesh(&outline, &settings, &deform, PartVariant::Petal)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetalFieldParams {
    pub count: usize,
    /// Half the visible extent. Petal anchors spread up to five of these
    /// either way.
    pub half_extent: Vec2,
    /// Drift speed multipliers before and after the reveal starts.
    pub calm_drift: f32,
    pub reveal_drift: f32,
    /// Whole-field spin about `Y`, in radians per second.
    pub calm_spin: f32,
    pub reveal_spin: f32,
    /// Field scale at the end of the burst.
    pub burst_scale: f32,
    /// Distance the field travels along `+Z` during the burst.
    pub burst_travel: f32,
    /// Seconds from reveal to the end of the burst.
    pub burst_duration: f32,
}

impl Default for PetalFieldParams {
    fn default() -> Self {
        Self {
            count: 150,
            half_extent: Vec2::new(8.0, 4.5),
            calm_drift: 0.4,
            reveal_drift: 8.0,
            calm_spin: 0.018,
            reveal_spin: 1.2,
            burst_scale: 12.0,
            burst_travel: 20.0,
            burst_duration: 2.5,
        }
    }
}

/// Per-petal drift, fixed when the field is seeded.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Drift {
    phase: f32,
    /// Radius of the drift circle.
    radius: f32,
    /// Radians per second at a drift multiplier of 1.
    speed: f32,
    /// Anchor in units of [`PetalFieldParams::half_extent`].
    anchor: Vec3,
    scale: f32,
}

impl Drift {
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            phase: rng.random_range(0.0..100.0),
            radius: rng.random_range(2.0..12.0),
            speed: rng.random_range(0.3..0.45),
            anchor: Vec3::new(
                rng.random_range(-5.0..5.0),
                rng.random_range(-5.0..5.0),
                rng.random_range(-5.0..5.0),
            ),
            scale: rng.random_range(0.6..1.6),
        }
    }

    fn placement(&self, drift_clock: f32, half_extent: Vec2) -> Placement {
        let t = self.phase + self.speed * drift_clock;
        let (sin, cos) = t.sin_cos();
        let tumble = cos * 3.0;
        Placement {
            translation: Vec3::new(
                half_extent.x * self.anchor.x + cos * self.radius,
                half_extent.y * self.anchor.y + sin * self.radius,
                half_extent.x * self.anchor.z + cos * self.radius,
            ),
            rotation: Quat::from_euler(EulerRot::XYZ, tumble, tumble, tumble),
            scale: self.scale,
        }
    }
}

/// `power2.inOut` easing.
fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (2.0 - 2.0 * t).powi(2) / 2.0
    }
}

/// One frame of the field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFrame {
    /// Transform of the whole field, applied on top of every petal.
    pub field: Placement,
    /// Petal transforms in field space.
    pub petals: Vec<Placement>,
    /// 0 until the reveal, 1 once the burst is over.
    pub burst_progress: f32,
}

impl FieldFrame {
    pub fn is_burst_complete(&self) -> bool {
        self.burst_progress >= 1.0
    }
}

#[derive(Clone, Debug)]
pub struct PetalField {
    params: PetalFieldParams,
    tint: PetalTint,
    drifts: Vec<Drift>,
}

impl PetalField {
    /// Seeds the field from the thread-local random source.
    pub fn new(params: PetalFieldParams, tint: PetalTint) -> Self {
        Self::with_rng(params, tint, &mut rand::rng())
    }

    pub fn with_seed(params: PetalFieldParams, tint: PetalTint, seed: u64) -> Self {
        Self::with_rng(params, tint, &mut StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<R: Rng + ?Sized>(
        params: PetalFieldParams,
        tint: PetalTint,
        rng: &mut R,
    ) -> Self {
        let drifts = (0..params.count)
            .map(|_| Drift::random(&mut *rng))
            .collect();
        debug!(count = params.count, tint = tint.0, "seeded petal field");
        Self {
            params,
            tint,
            drifts,
        }
    }

    pub fn params(&self) -> &PetalFieldParams {
        &self.params
    }

    pub fn tint(&self) -> PetalTint {
        self.tint
    }

    pub fn len(&self) -> usize {
        self.drifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drifts.is_empty()
    }

    /// The field at `elapsed` seconds. `reveal_started` is the elapsed time
    /// the reveal began at, if it has.
    ///
    /// Time before the reveal drifts at the calm rate and time after it at
    /// the reveal rate, so poses stay continuous across the switch.
    pub fn poses_at(&self, elapsed: f32, reveal_started: Option<f32>) -> FieldFrame {
        let elapsed = elapsed.max(0.0);
        let calm = reveal_started.map_or(elapsed, |start| elapsed.min(start.max(0.0)));
        let revealing = elapsed - calm;
        let p = &self.params;

        let drift_clock = p.calm_drift * calm + p.reveal_drift * revealing;
        let spin = p.calm_spin * calm + p.reveal_spin * revealing;
        let burst_progress = if p.burst_duration > 0.0 {
            (revealing / p.burst_duration).clamp(0.0, 1.0)
        } else if reveal_started.is_some_and(|start| elapsed >= start) {
            1.0
        } else {
            0.0
        };
        let eased = ease_in_out_quad(burst_progress);

        FieldFrame {
            field: Placement {
                translation: Vec3::Z * p.burst_travel * eased,
                rotation: Quat::from_rotation_y(spin),
                scale: 1.0 + (p.burst_scale - 1.0) * eased,
            },
            petals: self
                .drifts
                .iter()
                .map(|d| d.placement(drift_clock, p.half_extent))
                .collect(),
            burst_progress,
        }
    }
}
