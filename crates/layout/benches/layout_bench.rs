//! Benchmarks for pattern layout.
//!
//! Measures single-sheet placement, full runs and the geometry helpers
//! at various scales.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pattern_nest_layout::{geometry, Generator, LayoutConfig, LayoutPiece, Sheet};
use std::sync::atomic::AtomicBool;

fn mixed_pieces(n: usize) -> Vec<LayoutPiece> {
    (0..n)
        .map(|i| {
            let w = 20.0 + (i as f64 * 3.0) % 30.0;
            let h = 15.0 + (i as f64 * 7.0) % 25.0;
            if i % 3 == 0 {
                LayoutPiece::l_shape(format!("L{}", i), w, h, w / 2.0, h / 2.0)
            } else {
                LayoutPiece::rectangle(format!("R{}", i), w, h)
            }
        })
        .collect()
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    group.sample_size(10);

    for &n in &[5, 10, 20] {
        let pieces = mixed_pieces(n);
        let generator = Generator::new(
            LayoutConfig::new()
                .with_paper(200.0, 200.0)
                .with_layout_gap(1.0)
                .with_rotation_increment(90),
        );

        group.bench_with_input(
            BenchmarkId::new("mixed", n),
            &(pieces, generator),
            |b, (p, g)| b.iter(|| black_box(g.generate(black_box(p)))),
        );
    }
    group.finish();
}

fn bench_arrange_piece(c: &mut Criterion) {
    let stop = AtomicBool::new(false);
    let mut pieces = mixed_pieces(8);
    for piece in &mut pieces {
        piece.prepare_layout(0.0);
    }

    c.bench_function("sheet_arrange_8", |b| {
        b.iter(|| {
            let mut sheet = Sheet::new(300.0, 300.0).with_rotation_increment(90);
            for piece in &pieces {
                sheet.arrange_piece(black_box(piece), &stop);
            }
            black_box(sheet.count())
        })
    });
}

fn bench_geometry(c: &mut Criterion) {
    let square: Vec<(f64, f64)> = vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)];
    let shifted: Vec<(f64, f64)> = square.iter().map(|&(x, y)| (x + 100.0, y + 50.0)).collect();

    c.bench_function("geometry_union", |b| {
        b.iter(|| black_box(geometry::union(black_box(&square), black_box(&shifted))))
    });
    c.bench_function("geometry_offset", |b| {
        b.iter(|| black_box(geometry::offset_outward(black_box(&square), 2.5)))
    });
}

criterion_group!(benches, bench_generate, bench_arrange_piece, bench_geometry);
criterion_main!(benches);
