//! # crop-genome
//!
//! The engine-agnostic core of a genetic crop system.
//!
//! - [`StageCatalog`] holds the immutable growth-stage chains a crop advances
//!   through, validated once at startup so every chain ends in a mature,
//!   self-looping stage. [`GrowthSlot`] tells "nothing planted" apart from a
//!   plant at its first stage.
//! - [`Gene`], [`GenePair`] and [`Genome`] model an ordered genome of
//!   dominant/recessive allele pairs.
//! - [`layout_double_helix`] turns a genome and a selection cursor into the
//!   colored line segments of a double-helix visualization, ready for any
//!   renderer through the [`LineSink`] trait.
//!
//! Hosts (game engines, tooling) own persistence, ticking and GPU buffers; this
//! crate only answers questions and emits geometry.

pub mod catalog;
pub mod error;
pub mod gene;
pub mod helix;
pub mod stage;

pub use catalog::*;
pub use error::*;
pub use gene::*;
pub use helix::*;
pub use stage::*;
