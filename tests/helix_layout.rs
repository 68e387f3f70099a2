// tests/helix_layout.rs
use crop_genome::{
    Allele, COLOR_INACTIVE, Gene, GenePair, GeneRegistry, Genome, HelixConfig, HelixCursor,
    HelixMesh, HelixVertex, POINTS_PER_GENE, RADIANS_PER_GENE, helix_rotation,
    layout_double_helix,
};
use glam::{Vec3, Vec4};

const EPS: f32 = 1e-5;

fn genome(n: usize) -> Genome<u8> {
    let mut registry = GeneRegistry::new();
    (0..n)
        .map(|i| {
            let c = (i + 1) as f32 / n as f32;
            registry
                .register(Gene::new(
                    format!("gene_{i}"),
                    Vec3::new(c, 1.0 - c, 0.0),
                    Vec3::new(0.0, c, 1.0 - c),
                ))
                .unwrap();
            registry.pair(&format!("gene_{i}"), i as u8, 0).unwrap()
        })
        .collect()
}

fn config() -> HelixConfig {
    HelixConfig {
        radius: 0.5,
        height: 2.0,
        alpha: 0.8,
    }
}

fn color(c: Vec3, alpha: f32) -> Vec4 {
    c.extend(alpha)
}

#[test]
fn test_degenerate_inputs_emit_nothing() {
    let empty: Vec<GenePair<u8>> = Vec::new();
    let mut sink: Vec<HelixVertex> = Vec::new();
    layout_double_helix(&empty, HelixCursor::default(), &config(), &mut sink);
    assert!(sink.is_empty());

    let genome = genome(3);
    let flat = HelixConfig {
        radius: 0.0,
        ..config()
    };
    assert!(HelixMesh::build(genome.pairs(), HelixCursor::default(), &flat).is_empty());

    let squashed = HelixConfig {
        height: 0.0,
        ..config()
    };
    let mesh = HelixMesh::build(genome.pairs(), HelixCursor::default(), &squashed);
    assert_eq!(mesh.segment_count(), 0);
    assert!(mesh.bounds().is_none());
}

#[test]
fn test_segment_counts() {
    for count in [1, 2, 5] {
        let genome = genome(count);
        let mesh = HelixMesh::build(genome.pairs(), HelixCursor::default(), &config());
        assert_eq!(mesh.dominant.len(), POINTS_PER_GENE * count);
        assert_eq!(mesh.recessive.len(), POINTS_PER_GENE * count);
        assert_eq!(
            mesh.dominant.len() + mesh.recessive.len(),
            2 * POINTS_PER_GENE * count
        );
        assert_eq!(mesh.spokes.len(), POINTS_PER_GENE * count);

        let mut flat: Vec<HelixVertex> = Vec::new();
        layout_double_helix(genome.pairs(), HelixCursor::default(), &config(), &mut flat);
        assert_eq!(flat.len(), 2 * mesh.segment_count());
        assert!(flat.iter().copied().eq(mesh.vertices()));
    }
}

#[test]
fn test_single_gene_keeps_full_colors() {
    let genome = genome(1);
    let pair = genome.get(0).unwrap();
    let mesh = HelixMesh::build(genome.pairs(), HelixCursor::new(0, 0.0), &config());

    for allele in [Allele::Dominant, Allele::Recessive] {
        let expected = color(pair.color(allele), 0.8);
        for segment in mesh.strand(allele) {
            assert_eq!(segment.start.color, expected);
            assert_eq!(segment.end.color, expected);
        }
    }
}

#[test]
fn test_gene_boundary_is_even_blend() {
    let genome = genome(3);
    let mesh = HelixMesh::build(genome.pairs(), HelixCursor::new(1, 0.0), &config());

    for allele in [Allele::Dominant, Allele::Recessive] {
        let strand = mesh.strand(allele);
        let active = genome.get(1).unwrap().color(allele);

        // Between gene 0 (inactive) and gene 1 (active).
        let expected = (COLOR_INACTIVE + active) * 0.5;
        let got = strand[POINTS_PER_GENE].start.color.truncate();
        assert!(got.abs_diff_eq(expected, EPS), "{got} != {expected}");

        // Between gene 1 (active) and gene 2 (inactive).
        let got = strand[2 * POINTS_PER_GENE].start.color.truncate();
        assert!(got.abs_diff_eq(expected, EPS), "{got} != {expected}");

        // Gene centers hold their own color.
        let center = POINTS_PER_GENE + POINTS_PER_GENE / 2;
        assert_eq!(strand[center].start.color, color(active, 0.8));
        assert_eq!(strand[POINTS_PER_GENE / 2].start.color, color(COLOR_INACTIVE, 0.8));
    }
}

#[test]
fn test_inactive_neighbors_blend_to_gray() {
    let genome = genome(3);
    let mesh = HelixMesh::build(genome.pairs(), HelixCursor::new(0, 0.0), &config());
    let got = mesh.dominant[2 * POINTS_PER_GENE].start.color.truncate();
    assert!(got.abs_diff_eq(COLOR_INACTIVE, EPS));

    // The first and last genes blend toward themselves.
    let first = genome.get(0).unwrap().color(Allele::Dominant);
    assert_eq!(mesh.dominant[0].start.color, color(first, 0.8));
    let last = mesh.dominant.last().unwrap();
    assert_eq!(last.start.color, color(COLOR_INACTIVE, 0.8));
}

#[test]
fn test_strands_are_continuous_and_span_height() {
    let genome = genome(4);
    let config = config();
    let mesh = HelixMesh::build(genome.pairs(), HelixCursor::new(1, 0.3), &config);

    for allele in [Allele::Dominant, Allele::Recessive] {
        let strand = mesh.strand(allele);
        for pair in strand.windows(2) {
            assert_eq!(pair[0].end.position, pair[1].start.position);
            assert_eq!(pair[0].start.color, pair[0].end.color);
        }
        let top = strand.first().unwrap().start.position;
        let bottom = strand.last().unwrap().end.position;
        assert!((top.y - config.height).abs() < EPS);
        assert!(bottom.y.abs() < EPS);
        for segment in strand {
            let p = segment.start.position;
            assert!((p.x.hypot(p.z) - config.radius).abs() < EPS);
        }
    }
}

#[test]
fn test_spokes_join_strands_and_blend_alleles() {
    let genome = genome(3);
    let mesh = HelixMesh::build(genome.pairs(), HelixCursor::new(2, 0.0), &config());

    for gene in 0..3 {
        let spoke = &mesh.spokes[gene * POINTS_PER_GENE..(gene + 1) * POINTS_PER_GENE];
        let k = gene * POINTS_PER_GENE + POINTS_PER_GENE / 2;

        assert_eq!(spoke[0].start.position, mesh.dominant[k].start.position);
        assert_eq!(spoke[POINTS_PER_GENE - 1].end.position, mesh.recessive[k].start.position);
        for pair in spoke.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        // Flat spokes.
        assert!(spoke.iter().all(|s| (s.start.position.y - spoke[0].start.position.y).abs() < EPS));
    }

    let active = genome.get(2).unwrap();
    let spoke = &mesh.spokes[2 * POINTS_PER_GENE..];
    let dominant = active.color(Allele::Dominant);
    let recessive = active.color(Allele::Recessive);
    assert_eq!(spoke[0].start.color, color(dominant, 0.8));
    assert_eq!(spoke[POINTS_PER_GENE - 1].end.color, color(recessive, 0.8));
    let middle = spoke[POINTS_PER_GENE / 2].start.color.truncate();
    assert!(middle.abs_diff_eq((dominant + recessive) * 0.5, EPS));

    let inactive = &mesh.spokes[..POINTS_PER_GENE];
    assert!(inactive.iter().all(|s| s.start.color.truncate() == COLOR_INACTIVE));
}

#[test]
fn test_selected_spoke_faces_positive_x() {
    let genome = genome(5);
    let config = config();
    for index in 0..5 {
        let mesh = HelixMesh::build(genome.pairs(), HelixCursor::new(index, 0.0), &config);
        let spoke = &mesh.spokes[index * POINTS_PER_GENE..(index + 1) * POINTS_PER_GENE];
        let start = spoke[0].start.position;
        let end = spoke[POINTS_PER_GENE - 1].end.position;
        assert!(start.abs_diff_eq(Vec3::new(config.radius, start.y, 0.0), EPS), "{start}");
        assert!(end.abs_diff_eq(Vec3::new(-config.radius, end.y, 0.0), EPS), "{end}");
    }
}

#[test]
fn test_rotation_depends_only_on_cursor_position() {
    let a = HelixCursor::new(2, 0.5);
    let b = HelixCursor::new(0, 2.5);
    assert_eq!(helix_rotation(a), helix_rotation(b));
    assert_eq!(helix_rotation(a), 2.5 * RADIANS_PER_GENE);

    let genome = genome(4);
    let mesh_a = HelixMesh::build(genome.pairs(), a, &config());
    let mesh_b = HelixMesh::build(genome.pairs(), b, &config());
    assert!(
        mesh_a
            .vertices()
            .map(|v| v.position)
            .eq(mesh_b.vertices().map(|v| v.position))
    );
    // Only the highlighted gene differs.
    assert_ne!(mesh_a, mesh_b);
}

#[test]
fn test_transition_rotates_smoothly() {
    let genome = genome(3);
    let config = config();
    let still = HelixMesh::build(genome.pairs(), HelixCursor::new(1, 0.0), &config);
    let moving = HelixMesh::build(genome.pairs(), HelixCursor::new(1, 0.1), &config);

    let p0 = still.dominant[0].start.position;
    let p1 = moving.dominant[0].start.position;
    assert!((p0.y - p1.y).abs() < EPS);
    let turned = p0.x.atan2(p0.z) - p1.x.atan2(p1.z);
    assert!((turned.abs() - 0.1 * RADIANS_PER_GENE).abs() < 1e-4, "{turned}");
}

#[test]
fn test_out_of_range_index_selects_last_gene() {
    let genome = genome(3);
    let clamped = HelixMesh::build(genome.pairs(), HelixCursor::new(9, 0.0), &config());
    let last = HelixMesh::build(genome.pairs(), HelixCursor::new(2, 0.0), &config());
    assert_eq!(clamped, last);
}

#[test]
fn test_alpha_is_uniform_and_clamped() {
    let genome = genome(2);
    let mesh = HelixMesh::build(genome.pairs(), HelixCursor::default(), &config());
    assert!(mesh.vertices().all(|v| v.color.w == 0.8));

    let opaque = HelixConfig {
        alpha: 3.0,
        ..config()
    };
    let mesh = HelixMesh::build(genome.pairs(), HelixCursor::default(), &opaque);
    assert!(mesh.vertices().all(|v| v.color.w == 1.0));
}

#[test]
fn test_bounds_enclose_helix() {
    let genome = genome(3);
    let config = config();
    let mesh = HelixMesh::build(genome.pairs(), HelixCursor::new(1, -0.4), &config);
    let (cylinder, center) = mesh.bounds().unwrap();
    assert!((cylinder.radius - config.radius).abs() < EPS);
    assert!((cylinder.half_height - config.height / 2.0).abs() < EPS);
    assert!(center.abs_diff_eq(Vec3::new(0.0, config.height / 2.0, 0.0), EPS));
}

#[test]
fn test_layout_is_independent_per_genome() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Genome<u8>>();
    assert_send_sync::<HelixMesh>();

    let genomes: Vec<_> = (1..5).map(genome).collect();
    let expected: Vec<_> = genomes
        .iter()
        .map(|g| HelixMesh::build(g.pairs(), HelixCursor::default(), &config()))
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = genomes
            .iter()
            .map(|g| {
                scope.spawn(move || HelixMesh::build(g.pairs(), HelixCursor::default(), &config()))
            })
            .collect();
        for (handle, expected) in handles.into_iter().zip(&expected) {
            assert_eq!(&handle.join().unwrap(), expected);
        }
    });
}
