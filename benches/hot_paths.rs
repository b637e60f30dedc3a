use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use risk_map::map::{MapSurface, ViewState, Viewport};
use risk_map::risk::{DensityLayerBuilder, GeoDataset, RiskObservation};

/// Deterministic scatter of points around New Delhi
fn scatter(n: usize) -> GeoDataset {
    let observations = (0..n)
        .map(|i| {
            let t = i as f64;
            let lon = 77.2 + ((t * 0.618_034).fract() - 0.5) * 0.4;
            let lat = 28.6 + ((t * 0.414_214).fract() - 0.5) * 0.4;
            RiskObservation::new(lon, lat, (i % 7) as f64, format!("point {i}"))
        })
        .collect();
    GeoDataset::new(observations).expect("generated points are in range")
}

fn bench_rasterize(c: &mut Criterion) {
    let dataset = scatter(5_000);
    let layer = DensityLayerBuilder::new().build(&dataset);
    let viewport = Viewport::new(ViewState::new(77.2, 28.6, 11.0), 400, 200);

    c.bench_function("rasterize_5k_200x50", |b| {
        b.iter(|| black_box(layer.rasterize(black_box(&viewport), 200, 50)))
    });
}

fn bench_hit_test(c: &mut Criterion) {
    let surface = MapSurface::new(Arc::new(scatter(5_000)), ViewState::new(77.2, 28.6, 11.0));
    let scene = surface.compose(200, 50);

    c.bench_function("hit_test_scene", |b| {
        b.iter(|| black_box(scene.hit_test(black_box(201.0), black_box(102.0))))
    });
}

criterion_group!(benches, bench_rasterize, bench_hit_test);
criterion_main!(benches);
