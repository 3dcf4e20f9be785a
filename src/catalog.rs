//! The plant catalog: which plant a visitor's name unlocks and how to grow it.
//!
//! A [`PlantCatalog`] is an explicit registry passed to whoever needs it.
//! [`PlantCatalog::builtin`] ships a small demo set with placeholder text;
//! real deployments load their own with [`PlantCatalog::from_json`].

use crate::deform::{DeformParams, PartVariant};
use crate::extrude::ExtrudeSettings;
use crate::outline::OutlinePreset;
use crate::rewriter::{LSystem, RewriteRules};
use crate::texture::{ColorStop, Gradient, GradientShape, Hsla, PaintSpec, VeinSpec};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Malformed catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate plant id: {0}")]
    DuplicateId(String),
    #[error("Plant entry with an empty id")]
    EmptyId,
    #[error("Plant {0} has neither a stalk nor any parts")]
    EmptyParts(String),
}

/// The stalk grown from an L-System before parts are attached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StalkParams {
    pub lsystem: LSystem,
    pub angle_degrees: f32,
    pub segment_length: f32,
    pub radius: f32,
}

/// One kind of plant part and how many copies to place at each attachment point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartSpec {
    pub variant: PartVariant,
    pub outline: OutlinePreset,
    #[serde(default)]
    pub extrude: ExtrudeSettings,
    #[serde(default)]
    pub deform: DeformParams,
    #[serde(default)]
    pub paint: PaintSpec,
    #[serde(default = "default_count")]
    pub count: u32,
    /// Angle between the attachment heading and a fully open part.
    #[serde(default)]
    pub tilt_degrees: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Square texture edge length in pixels.
    #[serde(default = "default_texture_size")]
    pub texture_size: u32,
}

fn default_count() -> u32 {
    1
}

fn default_scale() -> f32 {
    1.0
}

fn default_texture_size() -> u32 {
    64
}

impl PartSpec {
    /// A single part with the variant's preset deformation and a flat extrusion.
    pub fn new(variant: PartVariant, outline: OutlinePreset) -> Self {
        Self {
            variant,
            outline,
            extrude: ExtrudeSettings::default(),
            deform: DeformParams::for_variant(variant, 0.3),
            paint: PaintSpec::default(),
            count: default_count(),
            tilt_degrees: 0.0,
            scale: default_scale(),
            texture_size: default_texture_size(),
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_tilt(mut self, tilt_degrees: f32) -> Self {
        self.tilt_degrees = tilt_degrees;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_deform(mut self, deform: DeformParams) -> Self {
        self.deform = deform;
        self
    }

    pub fn with_paint(mut self, paint: PaintSpec) -> Self {
        self.paint = paint;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    #[serde(default)]
    pub stalk: Option<StalkParams>,
    #[serde(default)]
    pub parts: Vec<PartSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlantEntry {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default)]
    pub fun_facts: Vec<String>,
    #[serde(default)]
    pub has_audio: bool,
    pub generator: GeneratorParams,
}

#[derive(Deserialize)]
struct CatalogDocument {
    plants: Vec<PlantEntry>,
}

/// Lowercased, trimmed, with inner whitespace runs collapsed to one space.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Ordered registry of plants keyed by normalized id.
#[derive(Clone, Debug, Default)]
pub struct PlantCatalog {
    entries: Vec<PlantEntry>,
    index: HashMap<String, usize>,
}

impl PlantCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from entries, rejecting invalid or duplicate ones.
    pub fn from_entries(
        entries: impl IntoIterator<Item = PlantEntry>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    /// Parses `{"plants": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        let catalog = Self::from_entries(document.plants)?;
        debug!(plants = catalog.len(), "loaded plant catalog");
        Ok(catalog)
    }

    /// Adds an entry. Its id is stored normalized.
    pub fn insert(&mut self, mut entry: PlantEntry) -> Result<(), CatalogError> {
        let id = normalize_name(&entry.id);
        if id.is_empty() {
            return Err(CatalogError::EmptyId);
        }
        if self.index.contains_key(&id) {
            return Err(CatalogError::DuplicateId(id));
        }
        if entry.generator.stalk.is_none() && entry.generator.parts.is_empty() {
            return Err(CatalogError::EmptyParts(id));
        }
        entry.id = id.clone();
        self.index.insert(id, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PlantEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Looks up free-form visitor input, first by id and then by display name.
    pub fn resolve(&self, name: &str) -> Option<&PlantEntry> {
        let key = normalize_name(name);
        if key.is_empty() {
            return None;
        }
        self.get(&key).or_else(|| {
            self.entries
                .iter()
                .find(|e| normalize_name(&e.display_name) == key)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlantEntry> {
        self.entries.iter()
    }

    /// A demo set covering every part variant.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for entry in builtin_entries() {
            // Builtin ids are distinct and every entry has parts.
            if let Err(e) = catalog.insert(entry) {
                error!(error = %e, "invalid builtin plant");
            }
        }
        catalog
    }
}

fn two_tone(shape: GradientShape, base: Hsla, tip: Hsla) -> PaintSpec {
    PaintSpec {
        gradient: Gradient {
            shape,
            stops: vec![ColorStop::new(0.0, base), ColorStop::new(1.0, tip)],
        },
        veins: None,
        noise_amplitude: 0.04,
        base_hue_offset: 0.0,
    }
}

fn fanned_veins(count: u32, color: Hsla) -> VeinSpec {
    VeinSpec {
        count,
        origin: Vec2::new(0.5, 1.0),
        reach: 0.05,
        spread: 0.7,
        bow: 0.5,
        jitter: 0.03,
        width: 1.0,
        color: color.with_alpha(0.35),
    }
}

fn straight_stalk(segments: usize, segment_length: f32) -> StalkParams {
    StalkParams {
        lsystem: LSystem::new("F".repeat(segments), RewriteRules::new(), 0),
        angle_degrees: 20.0,
        segment_length,
        radius: 0.03,
    }
}

fn entry(
    id: &str,
    display_name: &str,
    has_audio: bool,
    generator: GeneratorParams,
) -> PlantEntry {
    PlantEntry {
        id: id.to_string(),
        display_name: display_name.to_string(),
        description: vec![format!("Your plant identity is the {display_name}.")],
        fun_facts: Vec::new(),
        has_audio,
        generator,
    }
}

fn builtin_entries() -> Vec<PlantEntry> {
    let top_down = GradientShape::default();
    let from_base = GradientShape::Linear {
        from: Vec2::Y,
        to: Vec2::ZERO,
    };

    let peace_lily = GeneratorParams {
        stalk: Some(straight_stalk(5, 0.25)),
        parts: vec![
            PartSpec::new(PartVariant::Spathe, OutlinePreset::Spathe)
                .with_tilt(15.0)
                .with_paint(two_tone(
                    from_base,
                    Hsla::new(90.0, 0.3, 0.85),
                    Hsla::new(0.0, 0.0, 0.98),
                )),
            PartSpec::new(
                PartVariant::Bud,
                OutlinePreset::Bud {
                    width: 0.08,
                    height: 0.4,
                },
            )
            .with_paint(two_tone(
                top_down,
                Hsla::new(55.0, 0.6, 0.8),
                Hsla::new(50.0, 0.7, 0.6),
            )),
        ],
    };

    let mut gladiolus_paint = two_tone(
        from_base,
        Hsla::new(45.0, 0.9, 0.6),
        Hsla::new(25.0, 1.0, 0.5),
    );
    gladiolus_paint.veins = Some(fanned_veins(7, Hsla::new(15.0, 0.9, 0.35)));
    let gladiolus = GeneratorParams {
        stalk: Some(StalkParams {
            lsystem: LSystem::new(
                "FFA",
                RewriteRules::new().with_rule('A', "F[&F]/[&F]/[&F]A"),
                3,
            ),
            angle_degrees: 35.0,
            segment_length: 0.15,
            radius: 0.025,
        }),
        parts: vec![
            PartSpec::new(
                PartVariant::Petal,
                OutlinePreset::FlaredPetal {
                    width: 0.18,
                    length: 0.35,
                },
            )
            .with_count(6)
            .with_tilt(55.0)
            .with_paint(gladiolus_paint),
        ],
    };

    let mut rose_paint = two_tone(
        GradientShape::Radial {
            center: Vec2::new(0.5, 1.0),
            inner: 0.0,
            outer: 1.0,
        },
        Hsla::new(345.0, 0.8, 0.3),
        Hsla::new(350.0, 0.9, 0.55),
    );
    rose_paint.noise_amplitude = 0.06;
    let rose = GeneratorParams {
        stalk: Some(straight_stalk(4, 0.3)),
        parts: vec![
            PartSpec::new(PartVariant::Petal, OutlinePreset::RosePetal)
                .with_count(8)
                .with_tilt(40.0)
                .with_scale(0.15)
                .with_paint(rose_paint),
            PartSpec::new(
                PartVariant::Sepal,
                OutlinePreset::Sepal {
                    width: 0.06,
                    length: 0.2,
                },
            )
            .with_count(5)
            .with_tilt(100.0)
            .with_paint(two_tone(
                top_down,
                Hsla::new(110.0, 0.5, 0.35),
                Hsla::new(120.0, 0.5, 0.25),
            )),
        ],
    };

    let frilled = DeformParams::for_variant(PartVariant::Petal, 0.2).with_cup(0.2);
    let carnation = GeneratorParams {
        stalk: Some(straight_stalk(4, 0.25)),
        parts: vec![
            PartSpec::new(PartVariant::Petal, OutlinePreset::Frill { size: 0.2 })
                .with_count(12)
                .with_tilt(60.0)
                .with_deform(frilled)
                .with_paint(two_tone(
                    from_base,
                    Hsla::new(340.0, 0.6, 0.8),
                    Hsla::new(345.0, 0.8, 0.7),
                )),
        ],
    };

    let orchid = GeneratorParams {
        stalk: Some(StalkParams {
            lsystem: LSystem::new("FFF[+F][-F]", RewriteRules::new(), 0),
            angle_degrees: 30.0,
            segment_length: 0.2,
            radius: 0.02,
        }),
        parts: vec![
            PartSpec::new(
                PartVariant::Petal,
                OutlinePreset::FanPetal {
                    width: 0.2,
                    length: 0.3,
                },
            )
            .with_count(2)
            .with_tilt(70.0)
            .with_paint(two_tone(
                top_down,
                Hsla::new(220.0, 0.8, 0.75),
                Hsla::new(225.0, 0.9, 0.55),
            )),
            PartSpec::new(
                PartVariant::Sepal,
                OutlinePreset::Sepal {
                    width: 0.1,
                    length: 0.3,
                },
            )
            .with_count(3)
            .with_tilt(80.0),
            PartSpec::new(
                PartVariant::Lip,
                OutlinePreset::Lip {
                    width: 0.12,
                    length: 0.2,
                },
            )
            .with_tilt(30.0),
        ],
    };

    let sweet_pea = GeneratorParams {
        stalk: Some(straight_stalk(3, 0.2)),
        parts: vec![
            PartSpec::new(PartVariant::Banner, OutlinePreset::Banner)
                .with_tilt(20.0)
                .with_scale(0.3),
            PartSpec::new(PartVariant::Wing, OutlinePreset::Wing)
                .with_count(2)
                .with_tilt(35.0)
                .with_scale(0.3),
            PartSpec::new(PartVariant::Keel, OutlinePreset::Keel)
                .with_tilt(10.0)
                .with_scale(0.3),
        ],
    };

    let mut lotus_leaf = PartSpec::new(
        PartVariant::Leaf,
        OutlinePreset::Leaf {
            width: 0.5,
            height: 0.9,
        },
    )
    .with_count(3)
    .with_tilt(85.0);
    lotus_leaf.paint = two_tone(
        top_down,
        Hsla::new(110.0, 0.5, 0.4),
        Hsla::new(120.0, 0.6, 0.25),
    );
    lotus_leaf.paint.veins = Some(fanned_veins(9, Hsla::new(100.0, 0.4, 0.6)));
    let lotus = GeneratorParams {
        stalk: None,
        parts: vec![
            PartSpec::new(
                PartVariant::Petal,
                OutlinePreset::FanPetal {
                    width: 0.25,
                    length: 0.6,
                },
            )
            .with_count(10)
            .with_tilt(45.0)
            .with_paint(two_tone(
                from_base,
                Hsla::new(50.0, 0.7, 0.85),
                Hsla::new(340.0, 0.7, 0.75),
            )),
            lotus_leaf,
        ],
    };

    let valentine = GeneratorParams {
        stalk: None,
        parts: vec![
            PartSpec::new(PartVariant::Petal, OutlinePreset::Heart)
                .with_deform(DeformParams::default().with_cup(0.05))
                .with_paint(two_tone(
                    GradientShape::Radial {
                        center: Vec2::splat(0.5),
                        inner: 0.0,
                        outer: 0.7,
                    },
                    Hsla::new(340.0, 1.0, 0.6),
                    Hsla::new(335.0, 0.9, 0.4),
                )),
        ],
    };

    vec![
        entry("peace lily", "Peace Lily", true, peace_lily),
        entry("gladiolus", "Gladiolus", true, gladiolus),
        entry("rose", "Rose", false, rose),
        entry("carnation", "Pink Carnation", false, carnation),
        entry("orchid", "Blue Orchid", false, orchid),
        entry("sweet pea", "Sweet Pea", false, sweet_pea),
        entry("lotus", "Lotus", false, lotus),
        entry("valentine", "Heart", true, valentine),
    ]
}
