//! Benchmarks for the flickering grid update and render passes.
//!
//! Performance budgets (default 4px cells, 16px gap):
//! - Update pass, 1920x1080 (96x54 cells): < 100μs
//! - Software render pass, 1280x720 at DPR 1: < 5ms
//!
//! Run with: cargo bench -p flickergrid-core --bench flicker_bench

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use flickergrid_core::{
    FlickerConfig, FlickeringGrid, GridGeometry, GridState, ManualFrames, PackedRgba,
    PixelSurface, Renderer, SurfaceSize, Updater,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;

// =============================================================================
// Surface Size Configurations
// =============================================================================

const SIZES: &[(f32, f32, &str)] = &[
    (640.0, 360.0, "640x360"),
    (1280.0, 720.0, "1280x720"),
    (1920.0, 1080.0, "1920x1080"),
];

/// A grid that has been running long enough for a realistic lit fraction.
fn warmed_grid(w: f32, h: f32, rng: &mut SmallRng) -> GridState {
    let updater = Updater::new(0.8);
    let mut grid = GridState::new(GridGeometry::compute(w, h, 4.0, 16.0, 1.0), rng);
    let mut now = 0.0;
    for _ in 0..120 {
        now += 16.0;
        updater.step(&mut grid, now, rng);
    }
    grid
}

// =============================================================================
// Update
// =============================================================================

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("flickergrid/update");
    for &(w, h, name) in SIZES {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut grid = warmed_grid(w, h, &mut rng);
        group.throughput(Throughput::Elements(grid.len() as u64));
        let updater = Updater::new(0.8);
        let mut now = 2000.0;
        group.bench_function(BenchmarkId::new("step", name), |b| {
            b.iter(|| {
                now += 16.0;
                black_box(updater.step(&mut grid, now, &mut rng));
            });
        });
    }
    group.finish();
}

// =============================================================================
// Render
// =============================================================================

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("flickergrid/render");
    for &(w, h, name) in SIZES {
        let mut rng = SmallRng::seed_from_u64(2);
        let grid = warmed_grid(w, h, &mut rng);
        let mut surface = PixelSurface::with_size(SurfaceSize::new(w, h, 1.0));
        group.throughput(Throughput::Elements(surface.pixels().len() as u64));

        group.bench_function(BenchmarkId::new("glow", name), |b| {
            let renderer = Renderer::default();
            b.iter(|| black_box(renderer.draw(&grid, &mut surface)));
        });
        group.bench_function(BenchmarkId::new("no_glow", name), |b| {
            let renderer = Renderer::new(PackedRgba::WHITE, 0.0);
            b.iter(|| black_box(renderer.draw(&grid, &mut surface)));
        });
    }
    group.finish();
}

// =============================================================================
// Full dispatch loop
// =============================================================================

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("flickergrid/tick");
    group.bench_function("1280x720", |b| {
        let mut frames = ManualFrames::new();
        let mut grid =
            FlickeringGrid::new(FlickerConfig::default().with_seed(3), Some(PixelSurface::new()))
                .expect("default config is valid");
        grid.resize(1280.0, 720.0, 1.0, &mut frames);
        grid.set_visible(true, &mut frames);
        let mut now = 0.0;
        b.iter(|| {
            now += 16.0;
            frames.fire();
            black_box(grid.tick(now, &mut frames));
        });
    });
    group.finish();
}

criterion_group!(benches, bench_update, bench_render, bench_tick);
criterion_main!(benches);
