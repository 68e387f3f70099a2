//! Growth stages and the planted/empty crop slot.

use crate::catalog::StageCatalog;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a growth stage inside a [`StageCatalog`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StageId(pub(crate) u16);

impl StageId {
    /// Position of the stage in its catalog.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resolved growth stage record, owned by the catalog.
///
/// Records are only created by [`StageCatalogBuilder::build`](crate::StageCatalogBuilder::build),
/// which guarantees the chain invariants. Read it through [`Stage`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GrowthStage {
    pub(crate) key: String,
    pub(crate) mature: bool,
    pub(crate) drops_seed: bool,
    pub(crate) growth: f64,
    pub(crate) next: StageId,
}

/// A borrowed view of one stage together with the catalog it lives in.
#[derive(Clone, Copy)]
pub struct Stage<'a> {
    catalog: &'a StageCatalog,
    id: StageId,
}

impl<'a> Stage<'a> {
    pub(crate) fn new(catalog: &'a StageCatalog, id: StageId) -> Self {
        Self { catalog, id }
    }

    fn record(&self) -> &'a GrowthStage {
        self.catalog.record(self.id)
    }

    pub fn id(&self) -> StageId {
        self.id
    }

    pub fn key(&self) -> &'a str {
        &self.record().key
    }

    /// True if this stage has no further distinct successor.
    pub fn is_mature(&self) -> bool {
        self.record().mature
    }

    /// True if a plant at this stage drops its seed when broken.
    pub fn can_drop_seed(&self) -> bool {
        self.record().drops_seed
    }

    /// The stage reached after one successful growth tick.
    ///
    /// Returns this same stage once the plant is mature.
    pub fn next_stage(&self) -> Stage<'a> {
        Stage::new(self.catalog, self.record().next)
    }

    /// Growth in `[0, 1]`, where 1 means mature.
    pub fn growth_percentage(&self) -> f64 {
        self.record().growth
    }

    /// Always true: a real stage. Use [`GrowthSlot::Empty`] for "nothing planted".
    pub fn is_growth_stage(&self) -> bool {
        true
    }

    /// Number of growth ticks needed to reach the mature stage.
    pub fn steps_to_maturity(&self) -> usize {
        self.chain().count() - 1
    }

    /// Walks from this stage to the terminal, yielding each stage once.
    pub fn chain(&self) -> StageChain<'a> {
        StageChain {
            catalog: self.catalog,
            current: Some(self.id),
        }
    }
}

impl PartialEq for Stage<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.catalog, other.catalog) && self.id == other.id
    }
}

impl Eq for Stage<'_> {}

impl fmt::Debug for Stage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("id", &self.id)
            .field("key", &self.key())
            .field("growth", &self.growth_percentage())
            .field("mature", &self.is_mature())
            .finish()
    }
}

/// Iterator over a stage and its successors, ending with the terminal stage.
pub struct StageChain<'a> {
    catalog: &'a StageCatalog,
    current: Option<StageId>,
}

impl<'a> Iterator for StageChain<'a> {
    type Item = Stage<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let next = self.catalog.record(id).next;
        // The catalog guarantees every chain ends in a self-loop.
        self.current = (next != id).then_some(next);
        Some(Stage::new(self.catalog, id))
    }
}

/// What a crop slot currently holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrowthSlot {
    /// A plant at the given stage.
    Planted(StageId),
    /// Nothing planted.
    #[default]
    Empty,
}

impl GrowthSlot {
    /// False for [`GrowthSlot::Empty`], so "nothing planted" is never confused
    /// with a plant at its first stage.
    pub fn is_growth_stage(&self) -> bool {
        matches!(self, Self::Planted(_))
    }

    /// The planted stage, or `None` when empty.
    ///
    /// A slot holding an id the catalog does not know (stale saved data)
    /// reads as empty.
    pub fn stage<'a>(&self, catalog: &'a StageCatalog) -> Option<Stage<'a>> {
        match *self {
            Self::Planted(id) => catalog.get(id),
            Self::Empty => None,
        }
    }

    /// The slot after one growth tick. An empty slot is never advanced, and
    /// a slot with an unknown id becomes empty.
    pub fn advance(self, catalog: &StageCatalog) -> Self {
        match self.stage(catalog) {
            Some(stage) => Self::Planted(stage.next_stage().id()),
            None => Self::Empty,
        }
    }

    pub fn is_mature(&self, catalog: &StageCatalog) -> bool {
        self.stage(catalog).is_some_and(|s| s.is_mature())
    }

    pub fn can_drop_seed(&self, catalog: &StageCatalog) -> bool {
        self.stage(catalog).is_some_and(|s| s.can_drop_seed())
    }

    /// Growth of the planted stage, or 0 when empty.
    pub fn growth_percentage(&self, catalog: &StageCatalog) -> f64 {
        self.stage(catalog).map_or(0.0, |s| s.growth_percentage())
    }
}
