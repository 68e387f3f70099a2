//! Immutable growth stage catalog and its validating builder.
//!
//! The entry point is [`StageCatalogBuilder`]. Register stage definitions with
//! [`register`](StageCatalogBuilder::register),
//! [`register_all`](StageCatalogBuilder::register_all) or
//! [`register_incremental_chain`](StageCatalogBuilder::register_incremental_chain),
//! then call [`build`](StageCatalogBuilder::build). Definitions can also be read
//! from TOML with [`StageCatalog::from_toml_str`] / [`StageCatalog::from_toml_file`].
//!
//! # Chain invariants
//!
//! A built catalog guarantees, for every stage:
//! 1. the successor is a registered stage;
//! 2. following successors reaches a self-looping terminal within `len()` steps;
//! 3. a stage is mature exactly when it is a terminal;
//! 4. growth is finite, in `[0, 1]`, never decreases along a chain and is 1.0
//!    exactly at mature stages.
//!
//! Any violation fails the build, so an invalid catalog never becomes active.

use crate::error::{CatalogError, CatalogResult, ConfigResult, read_file};
use crate::stage::{GrowthStage, Stage, StageId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

fn default_drops_seed() -> bool {
    true
}

/// An unresolved stage as registered by the host, successors named by key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub key: String,

    /// Successor key. `None` marks a terminal stage that advances to itself.
    #[serde(default)]
    pub next: Option<String>,

    /// Growth in `[0, 1]`.
    pub growth: f64,

    #[serde(default)]
    pub mature: bool,

    #[serde(default = "default_drops_seed")]
    pub drops_seed: bool,
}

impl StageDefinition {
    /// An immature stage advancing to `next`.
    pub fn new(key: impl Into<String>, growth: f64, next: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            next: Some(next.into()),
            growth,
            mature: false,
            drops_seed: true,
        }
    }

    /// A mature, self-looping stage at full growth.
    pub fn terminal(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            next: None,
            growth: 1.0,
            mature: true,
            drops_seed: true,
        }
    }

    pub fn with_drops_seed(mut self, drops_seed: bool) -> Self {
        self.drops_seed = drops_seed;
        self
    }
}

/// Shorthand for a linear crop of `stages` evenly spaced stages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainDefinition {
    pub prefix: String,
    pub stages: usize,
}

/// The on-disk layout of a stage catalog.
///
/// ```toml
/// [[chain]]
/// prefix = "wheat"
/// stages = 8
///
/// [[stage]]
/// key = "sprout"
/// next = "bloom"
/// growth = 0.5
///
/// [[stage]]
/// key = "bloom"
/// growth = 1.0
/// mature = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDefinition {
    #[serde(default, rename = "chain")]
    pub chains: Vec<ChainDefinition>,

    #[serde(default, rename = "stage")]
    pub stages: Vec<StageDefinition>,
}

/// Collects stage definitions and validates them into a [`StageCatalog`].
#[derive(Clone, Debug, Default)]
pub struct StageCatalogBuilder {
    defs: Vec<StageDefinition>,
    index: HashMap<String, usize>,
}

impl StageCatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one stage. Keys must be unique.
    pub fn register(&mut self, def: StageDefinition) -> CatalogResult<&mut Self> {
        if self.index.contains_key(&def.key) {
            return Err(CatalogError::DuplicateStage(def.key));
        }
        debug!(key = %def.key, growth = def.growth, "registering growth stage");
        self.index.insert(def.key.clone(), self.defs.len());
        self.defs.push(def);
        Ok(self)
    }

    pub fn register_all(
        &mut self,
        defs: impl IntoIterator<Item = StageDefinition>,
    ) -> CatalogResult<&mut Self> {
        for def in defs {
            self.register(def)?;
        }
        Ok(self)
    }

    /// Registers `prefix_0 .. prefix_{n-1}` with growth `(i + 1) / n`.
    ///
    /// The last stage is the mature terminal. Every stage drops its seed.
    pub fn register_incremental_chain(
        &mut self,
        prefix: &str,
        stages: usize,
    ) -> CatalogResult<&mut Self> {
        if stages == 0 {
            return Err(CatalogError::EmptyChain(prefix.to_string()));
        }
        let key = |i: usize| format!("{prefix}_{i}");
        for i in 0..stages {
            let def = if i + 1 == stages {
                StageDefinition::terminal(key(i))
            } else {
                StageDefinition::new(key(i), (i + 1) as f64 / stages as f64, key(i + 1))
            };
            self.register(def)?;
        }
        Ok(self)
    }

    /// Registers every chain and stage of a parsed definition file.
    pub fn register_definition(&mut self, def: CatalogDefinition) -> CatalogResult<&mut Self> {
        for chain in &def.chains {
            self.register_incremental_chain(&chain.prefix, chain.stages)?;
        }
        self.register_all(def.stages)
    }

    /// Resolves successors and checks the chain invariants.
    pub fn build(self) -> CatalogResult<StageCatalog> {
        let result = self.resolve();
        match &result {
            Ok(catalog) => info!(
                stages = catalog.len(),
                terminals = catalog.terminals().count(),
                "growth stage catalog built"
            ),
            Err(err) => warn!(%err, "rejected growth stage catalog"),
        }
        result
    }

    fn resolve(self) -> CatalogResult<StageCatalog> {
        let n = self.defs.len();
        if n == 0 {
            return Err(CatalogError::Empty);
        }
        if n > usize::from(u16::MAX) + 1 {
            return Err(CatalogError::TooManyStages(n));
        }

        let mut next = Vec::with_capacity(n);
        for (i, def) in self.defs.iter().enumerate() {
            if !def.growth.is_finite() || !(0.0..=1.0).contains(&def.growth) {
                return Err(CatalogError::GrowthOutOfRange {
                    stage: def.key.clone(),
                    growth: def.growth,
                });
            }
            let successor = match &def.next {
                None => i,
                Some(key) => {
                    *self
                        .index
                        .get(key)
                        .ok_or_else(|| CatalogError::UnknownNextStage {
                            stage: def.key.clone(),
                            next: key.clone(),
                        })?
                }
            };
            next.push(successor);
        }

        for (i, def) in self.defs.iter().enumerate() {
            let terminal = next[i] == i;
            if terminal && !def.mature {
                return Err(CatalogError::ImmatureTerminal(def.key.clone()));
            }
            if def.mature && !terminal {
                return Err(CatalogError::MatureWithSuccessor {
                    stage: def.key.clone(),
                    next: self.defs[next[i]].key.clone(),
                });
            }
            if def.mature != (def.growth == 1.0) {
                return Err(CatalogError::GrowthMaturityMismatch {
                    stage: def.key.clone(),
                    growth: def.growth,
                    mature: def.mature,
                });
            }
        }

        self.check_terminates(&next)?;

        for (i, def) in self.defs.iter().enumerate() {
            let succ = &self.defs[next[i]];
            if succ.growth < def.growth {
                return Err(CatalogError::GrowthDecreases {
                    stage: def.key.clone(),
                    from: def.growth,
                    next: succ.key.clone(),
                    to: succ.growth,
                });
            }
        }

        let stages = self
            .defs
            .into_iter()
            .zip(next)
            .map(|(def, succ)| GrowthStage {
                key: def.key,
                mature: def.mature,
                drops_seed: def.drops_seed,
                growth: def.growth,
                next: StageId(succ as u16),
            })
            .collect::<Vec<_>>();
        let keys = stages
            .iter()
            .enumerate()
            .map(|(i, s)| (s.key.clone(), StageId(i as u16)))
            .collect();

        Ok(StageCatalog { stages, keys })
    }

    /// Every walk must end in a self-loop; any other cycle is rejected.
    fn check_terminates(&self, next: &[usize]) -> CatalogResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Walk {
            Unseen,
            OnPath,
            Done,
        }

        let mut state = vec![Walk::Unseen; next.len()];
        let mut path: Vec<usize> = Vec::new();
        for start in 0..next.len() {
            path.clear();
            let mut cur = start;
            loop {
                match state[cur] {
                    Walk::Done => break,
                    Walk::OnPath => {
                        let from = path.iter().position(|&p| p == cur).unwrap_or(0);
                        return Err(CatalogError::NoTerminal {
                            stage: self.defs[start].key.clone(),
                            cycle: path[from..]
                                .iter()
                                .map(|&p| self.defs[p].key.clone())
                                .collect(),
                        });
                    }
                    Walk::Unseen if next[cur] == cur => {
                        state[cur] = Walk::Done;
                        break;
                    }
                    Walk::Unseen => {
                        state[cur] = Walk::OnPath;
                        path.push(cur);
                        cur = next[cur];
                    }
                }
            }
            for &p in &path {
                state[p] = Walk::Done;
            }
        }
        Ok(())
    }
}

/// A validated, read-only arena of growth stages.
///
/// Built once at startup and shared freely afterwards; all queries take `&self`.
#[derive(Clone, Debug)]
pub struct StageCatalog {
    stages: Vec<GrowthStage>,
    keys: HashMap<String, StageId>,
}

impl StageCatalog {
    pub fn builder() -> StageCatalogBuilder {
        StageCatalogBuilder::new()
    }

    /// Builds a catalog from an already parsed definition.
    pub fn from_definition(def: CatalogDefinition) -> CatalogResult<Self> {
        let mut builder = StageCatalogBuilder::new();
        builder.register_definition(def)?;
        builder.build()
    }

    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let def: CatalogDefinition = toml::from_str(source)?;
        Ok(Self::from_definition(def)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        Self::from_toml_str(&read_file(path.as_ref())?)
    }

    pub fn lookup(&self, key: &str) -> Option<Stage<'_>> {
        self.keys.get(key).map(|&id| Stage::new(self, id))
    }

    pub fn id_of(&self, key: &str) -> Option<StageId> {
        self.keys.get(key).copied()
    }

    /// The stage with the given id.
    ///
    /// # Panics
    ///
    /// If `id` was handed out by a different, smaller catalog.
    pub fn stage(&self, id: StageId) -> Stage<'_> {
        assert!(id.index() < self.stages.len(), "stage {id} is not in this catalog");
        Stage::new(self, id)
    }

    pub fn get(&self, id: StageId) -> Option<Stage<'_>> {
        (id.index() < self.stages.len()).then(|| Stage::new(self, id))
    }

    pub(crate) fn record(&self, id: StageId) -> &GrowthStage {
        &self.stages[id.index()]
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// All stages in registration order.
    pub fn iter(&self) -> impl Iterator<Item = Stage<'_>> + '_ {
        (0..self.stages.len()).map(|i| Stage::new(self, StageId(i as u16)))
    }

    /// All mature, self-looping stages.
    pub fn terminals(&self) -> impl Iterator<Item = Stage<'_>> + '_ {
        self.iter().filter(|s| s.is_mature())
    }
}
