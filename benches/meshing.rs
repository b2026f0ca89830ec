use criterion::{criterion_group, criterion_main, Criterion, black_box};

use glam::Vec2;

use terrastream::mesh::{MeshBuilder, MeshSettings};
use terrastream::streaming::DetailLevels;
use terrastream::terrain::{HeightGrid, HeightMapSettings, NoiseSettings};

fn bench_height_grid_48(c: &mut Criterion) {
    let settings = NoiseSettings::default();
    let mesh = MeshSettings::with_resolution(48, 1.0).unwrap();
    let n = mesh.vertices_per_line();

    c.bench_function("height_grid_48", |b| {
        b.iter(|| HeightGrid::generate(n, n, black_box(&settings), black_box(Vec2::new(96.0, -48.0))));
    });
}

fn bench_height_grid_240(c: &mut Criterion) {
    let settings = NoiseSettings::default();
    let mesh = MeshSettings::default();
    let n = mesh.vertices_per_line();

    c.bench_function("height_grid_240", |b| {
        b.iter(|| HeightGrid::generate(n, n, black_box(&settings), black_box(Vec2::ZERO)));
    });
}

fn bench_mesh_lods_240(c: &mut Criterion) {
    let mesh = MeshSettings::default();
    let height_map = HeightMapSettings::default();
    let n = mesh.vertices_per_line();
    let grid = HeightGrid::generate(n, n, &height_map.noise, Vec2::ZERO);

    for level in DetailLevels::default().levels() {
        let builder = MeshBuilder::new(&mesh, level.lod);
        c.bench_function(&format!("mesh_240_skip_{}", level.lod), |b| {
            b.iter(|| builder.build_with_heights(black_box(&grid), |raw| height_map.height_from_sample(raw)));
        });
    }
}

fn bench_flat_mesh(c: &mut Criterion) {
    let builder = MeshBuilder::new(&MeshSettings::default(), 1);

    c.bench_function("flat_mesh_240", |b| {
        b.iter(|| builder.build_flat());
    });
}

criterion_group!(
    benches,
    bench_height_grid_48,
    bench_height_grid_240,
    bench_mesh_lods_240,
    bench_flat_mesh,
);
criterion_main!(benches);
