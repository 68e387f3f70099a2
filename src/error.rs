//! Error types for catalog construction and configuration loading.
//!
//! Only startup paths return these. Stage queries and helix layout are total
//! and never fail.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors detected while building a stage catalog or gene registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// The catalog contains no stages.
    #[error("stage catalog is empty")]
    Empty,

    /// Two stages were registered under the same key.
    #[error("duplicate growth stage key: {0}")]
    DuplicateStage(String),

    /// Two genes were registered under the same id.
    #[error("duplicate gene id: {0}")]
    DuplicateGene(String),

    /// A stage names a successor that was never registered.
    #[error("stage {stage} has unknown next stage {next}")]
    UnknownNextStage {
        /// The stage holding the dangling reference.
        stage: String,
        /// The missing successor key.
        next: String,
    },

    /// Following successors from a stage never reaches a self-looping terminal.
    #[error("stage {stage} never reaches a terminal stage (cycle through {cycle:?})")]
    NoTerminal {
        /// The stage the walk started from.
        stage: String,
        /// Keys of the stages forming the cycle, in walk order.
        cycle: Vec<String>,
    },

    /// A self-looping stage is not flagged mature.
    #[error("terminal stage {0} is not mature")]
    ImmatureTerminal(String),

    /// A mature stage advances to a different stage.
    #[error("mature stage {stage} advances to {next}")]
    MatureWithSuccessor {
        /// The mature stage.
        stage: String,
        /// Its distinct successor.
        next: String,
    },

    /// Growth percentage is not a finite value in `[0, 1]`.
    #[error("stage {stage} has growth {growth} outside [0, 1]")]
    GrowthOutOfRange {
        /// The offending stage.
        stage: String,
        /// The rejected value.
        growth: f64,
    },

    /// Growth percentage drops from one stage to its successor.
    #[error("growth decreases from {stage} ({from}) to {next} ({to})")]
    GrowthDecreases {
        /// The earlier stage.
        stage: String,
        /// The earlier stage's growth.
        from: f64,
        /// The successor.
        next: String,
        /// The successor's growth.
        to: f64,
    },

    /// Growth of exactly 1.0 at an immature stage, or below 1.0 at a mature one.
    #[error("stage {stage} has growth {growth} inconsistent with maturity {mature}")]
    GrowthMaturityMismatch {
        /// The offending stage.
        stage: String,
        /// Its growth.
        growth: f64,
        /// Its maturity flag.
        mature: bool,
    },

    /// An incremental chain was requested with zero stages.
    #[error("incremental chain {0} needs at least one stage")]
    EmptyChain(String),

    /// More stages than a [`StageId`](crate::StageId) can address.
    #[error("too many growth stages: {0}")]
    TooManyStages(usize),
}

/// Errors raised while loading definitions from TOML.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML for the expected schema.
    #[error("invalid definition file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The definitions parsed but describe an invalid catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Result type for catalog construction.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

pub(crate) fn read_file(path: &std::path::Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
