//! Genes, gene pairs and ordered genomes.

use crate::error::{CatalogError, CatalogResult, ConfigResult, read_file};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Which of the two alleles of a gene pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allele {
    Dominant,
    Recessive,
}

/// A gene definition as written in a registry file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneDefinition {
    pub id: String,
    /// RGB color of the dominant allele.
    pub dominant: Vec3,
    /// RGB color of the recessive allele.
    pub recessive: Vec3,
}

/// A catalog-scoped gene. Its colors are used only for visualization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "GeneDefinition", into = "GeneDefinition")]
pub struct Gene {
    id: String,
    dominant_color: Vec3,
    recessive_color: Vec3,
}

impl Gene {
    /// Creates a gene, clamping both colors into `[0, 1]`.
    pub fn new(id: impl Into<String>, dominant_color: Vec3, recessive_color: Vec3) -> Self {
        Self {
            id: id.into(),
            dominant_color: dominant_color.clamp(Vec3::ZERO, Vec3::ONE),
            recessive_color: recessive_color.clamp(Vec3::ZERO, Vec3::ONE),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dominant_color(&self) -> Vec3 {
        self.dominant_color
    }

    pub fn recessive_color(&self) -> Vec3 {
        self.recessive_color
    }

    pub fn color(&self, allele: Allele) -> Vec3 {
        match allele {
            Allele::Dominant => self.dominant_color,
            Allele::Recessive => self.recessive_color,
        }
    }
}

impl From<GeneDefinition> for Gene {
    fn from(def: GeneDefinition) -> Self {
        Gene::new(def.id, def.dominant, def.recessive)
    }
}

impl From<Gene> for GeneDefinition {
    fn from(gene: Gene) -> Self {
        GeneDefinition {
            id: gene.id,
            dominant: gene.dominant_color,
            recessive: gene.recessive_color,
        }
    }
}

/// One gene slot of a genome: the gene and its two allele values.
#[derive(Clone, Debug, PartialEq)]
pub struct GenePair<A> {
    gene: Arc<Gene>,
    dominant: A,
    recessive: A,
}

impl<A> GenePair<A> {
    pub fn new(gene: Arc<Gene>, dominant: A, recessive: A) -> Self {
        Self {
            gene,
            dominant,
            recessive,
        }
    }

    pub fn gene(&self) -> &Gene {
        &self.gene
    }

    pub fn dominant(&self) -> &A {
        &self.dominant
    }

    pub fn recessive(&self) -> &A {
        &self.recessive
    }

    pub fn allele(&self, allele: Allele) -> &A {
        match allele {
            Allele::Dominant => &self.dominant,
            Allele::Recessive => &self.recessive,
        }
    }

    /// Visualization color of one allele, taken from the gene.
    pub fn color(&self, allele: Allele) -> Vec3 {
        self.gene.color(allele)
    }
}

/// An ordered sequence of gene pairs.
///
/// Order is significant: it fixes each gene's place on the helix and which
/// genes are neighbors.
#[derive(Clone, Debug, PartialEq)]
pub struct Genome<A> {
    pairs: Vec<GenePair<A>>,
}

impl<A> Genome<A> {
    pub fn new(pairs: Vec<GenePair<A>>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[GenePair<A>] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GenePair<A>> {
        self.pairs.get(index)
    }

    /// Position and pair of the first slot carrying gene `id`.
    pub fn find(&self, id: &str) -> Option<(usize, &GenePair<A>)> {
        self.pairs.iter().enumerate().find(|(_, p)| p.gene.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GenePair<A>> {
        self.pairs.iter()
    }
}

impl<A> FromIterator<GenePair<A>> for Genome<A> {
    fn from_iter<I: IntoIterator<Item = GenePair<A>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, A> IntoIterator for &'a Genome<A> {
    type Item = &'a GenePair<A>;
    type IntoIter = std::slice::Iter<'a, GenePair<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RegistryDefinition {
    #[serde(default)]
    gene: Vec<Gene>,
}

/// Registry of shared genes, keyed by id, in registration order.
#[derive(Clone, Debug, Default)]
pub struct GeneRegistry {
    genes: Vec<Arc<Gene>>,
    index: HashMap<String, usize>,
}

impl GeneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `[[gene]]` tables with `id`, `dominant = [r, g, b]` and `recessive = [r, g, b]`.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let def: RegistryDefinition = toml::from_str(source)?;
        let mut registry = Self::new();
        for gene in def.gene {
            registry.register(gene)?;
        }
        Ok(registry)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        Self::from_toml_str(&read_file(path.as_ref())?)
    }

    pub fn register(&mut self, gene: Gene) -> CatalogResult<Arc<Gene>> {
        if self.index.contains_key(&gene.id) {
            return Err(CatalogError::DuplicateGene(gene.id));
        }
        debug!(id = %gene.id, "registering gene");
        let gene = Arc::new(gene);
        self.index.insert(gene.id.clone(), self.genes.len());
        self.genes.push(Arc::clone(&gene));
        Ok(gene)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Gene>> {
        self.index.get(id).map(|&i| &self.genes[i])
    }

    /// A pair for the registered gene `id`, or `None` if it is unknown.
    pub fn pair<A>(&self, id: &str, dominant: A, recessive: A) -> Option<GenePair<A>> {
        self.get(id)
            .map(|gene| GenePair::new(Arc::clone(gene), dominant, recessive))
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Gene>> {
        self.genes.iter()
    }
}
