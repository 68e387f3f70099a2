//! Double-helix layout of a genome.
//!
//! [`layout_double_helix`] turns an ordered slice of gene pairs into colored line
//! segments: a right-handed double helix with the dominant alleles on one strand,
//! the recessive alleles on the other, and one spoke per gene joining them.
//! The whole helix is rotated about +Y so that the selected gene faces the
//! viewer, and a fractional `transition` rotates it smoothly toward the
//! neighboring gene.
//!
//! The selected gene is drawn in its allele colors; every other gene is greyed
//! out with [`COLOR_INACTIVE`]. Strand colors blend linearly into the neighboring
//! gene's color so there is no hard step at gene boundaries.
//!
//! Geometry is handed to a [`LineSink`]; nothing here touches a GPU.

use crate::error::ConfigResult;
use crate::gene::{Allele, GenePair};
use bevy_math::primitives::Cylinder;
use glam::{Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::ops::{Add, Mul, Sub};
use tracing::debug;

/// Helix rotation per gene.
pub const RADIANS_PER_GENE: f32 = 30.0 * PI / 180.0;

/// Helix sample points per gene.
pub const POINTS_PER_GENE: usize = 10;

/// Color of inactive genes.
pub const COLOR_INACTIVE: Vec3 = Vec3::new(0.15, 0.15, 0.15);

/// Size and transparency of the rendered helix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelixConfig {
    pub radius: f32,
    /// Total height. The full helix is always drawn, so more genes means a tighter helix.
    pub height: f32,
    /// Transparency in `[0, 1]`, applied to every vertex.
    pub alpha: f32,
}

impl Default for HelixConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 1.0,
            alpha: 1.0,
        }
    }
}

impl HelixConfig {
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// True when the helix would collapse to nothing.
    pub fn is_degenerate(&self) -> bool {
        !(self.radius.is_finite() && self.radius > 0.0)
            || !(self.height.is_finite() && self.height > 0.0)
    }

    fn clamped_alpha(&self) -> f32 {
        if self.alpha.is_nan() {
            1.0
        } else {
            self.alpha.clamp(0.0, 1.0)
        }
    }
}

/// The selected gene and the progress toward its neighbor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HelixCursor {
    pub index: usize,
    /// Progress toward the previous (`< 0`) or next (`> 0`) gene, nominally in `[-1, 1]`.
    pub transition: f32,
}

impl HelixCursor {
    pub fn new(index: usize, transition: f32) -> Self {
        Self { index, transition }
    }

    /// Index clamped into `[0, count)` and a finite transition.
    ///
    /// `count` must be non-zero.
    fn resolve(self, count: usize) -> Self {
        let mut cursor = self;
        if cursor.index >= count {
            debug!(index = cursor.index, count, "clamping helix cursor index");
            cursor.index = count - 1;
        }
        if !cursor.transition.is_finite() {
            cursor.transition = 0.0;
        }
        cursor
    }
}

/// Rotation about +Y, in radians, that brings the cursor position to the front.
pub fn helix_rotation(cursor: HelixCursor) -> f32 {
    (cursor.index as f32 + cursor.transition) * RADIANS_PER_GENE
}

/// Which part of the helix a line belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HelixPart {
    Strand(Allele),
    Spoke,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HelixVertex {
    pub position: Vec3,
    /// RGBA.
    pub color: Vec4,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: HelixVertex,
    pub end: HelixVertex,
}

/// Consumer of emitted line segments.
pub trait LineSink {
    fn line(&mut self, part: HelixPart, start: HelixVertex, end: HelixVertex);
}

/// A flat line list: two vertices per segment.
impl LineSink for Vec<HelixVertex> {
    fn line(&mut self, _part: HelixPart, start: HelixVertex, end: HelixVertex) {
        self.push(start);
        self.push(end);
    }
}

impl<S: LineSink + ?Sized> LineSink for &mut S {
    fn line(&mut self, part: HelixPart, start: HelixVertex, end: HelixVertex) {
        (**self).line(part, start, end);
    }
}

/// `a + f * (b - a)`.
fn lerp<T>(f: f32, a: T, b: T) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>,
{
    a + (b - a) * f
}

/// Emits the dominant strand, the recessive strand and the spokes, in that order.
///
/// Emits nothing for an empty genome or a degenerate [`HelixConfig`].
/// A cursor index past the end selects the last gene.
pub fn layout_double_helix<A, S>(
    pairs: &[GenePair<A>],
    cursor: HelixCursor,
    config: &HelixConfig,
    sink: &mut S,
) where
    S: LineSink + ?Sized,
{
    let count = pairs.len();
    if count == 0 || config.is_degenerate() {
        return;
    }
    let cursor = cursor.resolve(count);
    let points = POINTS_PER_GENE * count;

    let layout = Layout {
        pairs,
        active: cursor.index,
        points,
        radius: config.radius,
        height_step: config.height / points as f32,
        angle_step: -RADIANS_PER_GENE / POINTS_PER_GENE as f32,
        rotation: Quat::from_rotation_y(helix_rotation(cursor)),
        alpha: config.clamped_alpha(),
    };

    let offset = RADIANS_PER_GENE / 2.0;
    layout.strand(Allele::Dominant, offset, sink);
    layout.strand(Allele::Recessive, PI + offset, sink);
    layout.spokes(offset, PI + offset, sink);
}

struct Layout<'a, A> {
    pairs: &'a [GenePair<A>],
    active: usize,
    points: usize,
    radius: f32,
    height_step: f32,
    angle_step: f32,
    rotation: Quat,
    alpha: f32,
}

impl<A> Layout<'_, A> {
    /// Sample point `k` of a strand with the given phase, before rotation.
    /// Point 0 is at the top, point `points` at the bottom.
    fn point(&self, k: usize, phase: f32) -> Vec3 {
        let angle = -(k as f32 * self.angle_step + phase);
        Vec3::new(
            self.radius * angle.cos(),
            self.height_step * (self.points - k) as f32,
            self.radius * angle.sin(),
        )
    }

    fn vertex(&self, position: Vec3, color: Vec3) -> HelixVertex {
        HelixVertex {
            position: self.rotation * position,
            color: color.extend(self.alpha),
        }
    }

    fn gene_color(&self, gene: usize, allele: Allele) -> Vec3 {
        if gene == self.active {
            self.pairs[gene].color(allele)
        } else {
            COLOR_INACTIVE
        }
    }

    /// Color of strand segment `i`, blended toward the neighboring gene.
    fn segment_color(&self, i: usize, allele: Allele) -> Vec3 {
        let gene = i / POINTS_PER_GENE;
        let partial = i % POINTS_PER_GENE;
        let per_gene = POINTS_PER_GENE as f32;
        let base = self.gene_color(gene, allele);
        if partial < POINTS_PER_GENE / 2 {
            let prev = gene.saturating_sub(1);
            let f = (partial as f32 + per_gene / 2.0) / per_gene;
            lerp(f, self.gene_color(prev, allele), base)
        } else if partial > POINTS_PER_GENE / 2 {
            let next = (gene + 1).min(self.pairs.len() - 1);
            let f = (partial as f32 - per_gene / 2.0) / per_gene;
            lerp(f, base, self.gene_color(next, allele))
        } else {
            base
        }
    }

    fn strand<S: LineSink + ?Sized>(&self, allele: Allele, phase: f32, sink: &mut S) {
        let mut from = self.point(0, phase);
        for i in 0..self.points {
            let to = self.point(i + 1, phase);
            let color = self.segment_color(i, allele);
            sink.line(
                HelixPart::Strand(allele),
                self.vertex(from, color),
                self.vertex(to, color),
            );
            from = to;
        }
    }

    fn spokes<S: LineSink + ?Sized>(
        &self,
        dominant_phase: f32,
        recessive_phase: f32,
        sink: &mut S,
    ) {
        for gene in 0..self.pairs.len() {
            let k = gene * POINTS_PER_GENE + POINTS_PER_GENE / 2;
            let start = self.point(k, dominant_phase);
            let end = self.point(k, recessive_phase);
            let dominant = self.gene_color(gene, Allele::Dominant);
            let recessive = self.gene_color(gene, Allele::Recessive);

            let at = |j: usize| {
                if j == 0 {
                    self.vertex(start, dominant)
                } else if j == POINTS_PER_GENE {
                    self.vertex(end, recessive)
                } else {
                    let f = j as f32 / POINTS_PER_GENE as f32;
                    self.vertex(lerp(f, start, end), lerp(f, dominant, recessive))
                }
            };
            for j in 0..POINTS_PER_GENE {
                sink.line(HelixPart::Spoke, at(j), at(j + 1));
            }
        }
    }
}

/// Collected helix geometry, split by part.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HelixMesh {
    pub dominant: Vec<LineSegment>,
    pub recessive: Vec<LineSegment>,
    pub spokes: Vec<LineSegment>,
}

impl HelixMesh {
    /// Lays out `pairs` into a new mesh.
    pub fn build<A>(pairs: &[GenePair<A>], cursor: HelixCursor, config: &HelixConfig) -> Self {
        let mut mesh = Self::default();
        layout_double_helix(pairs, cursor, config, &mut mesh);
        mesh
    }

    pub fn strand(&self, allele: Allele) -> &[LineSegment] {
        match allele {
            Allele::Dominant => &self.dominant,
            Allele::Recessive => &self.recessive,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.dominant.len() + self.recessive.len() + self.spokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segment_count() == 0
    }

    /// All segments as a flat line list, strands first.
    pub fn vertices(&self) -> impl Iterator<Item = HelixVertex> + '_ {
        self.dominant
            .iter()
            .chain(&self.recessive)
            .chain(&self.spokes)
            .flat_map(|s| [s.start, s.end])
    }

    /// Smallest upright cylinder around the Y axis holding every vertex, with its center.
    ///
    /// `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Cylinder, Vec3)> {
        let mut vertices = self.vertices().map(|v| v.position);
        let first = vertices.next()?;
        let (mut radius, mut min_y, mut max_y) = (first.x.hypot(first.z), first.y, first.y);
        for p in vertices {
            radius = radius.max(p.x.hypot(p.z));
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        Some((
            Cylinder::new(radius, max_y - min_y),
            Vec3::new(0.0, (min_y + max_y) / 2.0, 0.0),
        ))
    }
}

impl LineSink for HelixMesh {
    fn line(&mut self, part: HelixPart, start: HelixVertex, end: HelixVertex) {
        let segment = LineSegment { start, end };
        match part {
            HelixPart::Strand(Allele::Dominant) => self.dominant.push(segment),
            HelixPart::Strand(Allele::Recessive) => self.recessive.push(segment),
            HelixPart::Spoke => self.spokes.push(segment),
        }
    }
}
