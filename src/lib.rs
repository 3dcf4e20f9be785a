//! # symbios-flora
//!
//! Engine-agnostic procedural flora for [Symbios](https://crates.io/crates/symbios).
//!
//! L-System strings become branch skeletons, 2D outlines become deformed,
//! textured petal and leaf meshes, and the two are assembled into a
//! `PlantModel` whose parts bloom over time. Everything is plain data built on
//! `glam`, ready to be ingested by a renderer (Bevy, three-d, wgpu) without
//! this crate knowing which one.
//!
//! The pipeline, bottom-up:
//! - [`rewriter`]: character L-System expansion.
//! - [`interpreter`] / [`turtle`] / [`skeleton`]: turtle walk to branch segments.
//! - [`outline`] / [`extrude`] / [`deform`] / [`mesh`]: part geometry.
//! - [`texture`]: gradient, vein and noise rasters.
//! - [`catalog`] / [`assembly`]: which plant to grow, and growing it.
//! - [`animation`] / [`experience`]: bloom and title timing, and the visitor flow.
//! - [`petal_field`]: the tinted petal cloud behind the name prompt.

pub mod animation;
pub mod assembly;
pub mod catalog;
pub mod deform;
pub mod experience;
pub mod extrude;
pub mod interpreter;
pub mod mesh;
pub mod outline;
pub mod petal_field;
pub mod rewriter;
pub mod skeleton;
pub mod texture;
pub mod turtle;

pub use animation::*;
pub use assembly::*;
pub use catalog::*;
pub use deform::*;
pub use experience::*;
pub use extrude::*;
pub use interpreter::*;
pub use mesh::*;
pub use outline::*;
pub use petal_field::*;
pub use rewriter::*;
pub use skeleton::*;
pub use texture::*;
pub use turtle::*;
