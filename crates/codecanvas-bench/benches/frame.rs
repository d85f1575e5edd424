use codecanvas_bench::grid_store;
use codecanvas_core::Vec2;
use codecanvas_renderer::{CanvasSettings, Renderer, visible_nodes};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_culling_2000_nodes(c: &mut Criterion) {
    let (mut store, _) = grid_store(2000, 50);
    store.set_camera(Vec2::new(5000.0, 3000.0), 0.5);

    c.bench_function("visible_nodes_2000", |b| {
        b.iter(|| black_box(visible_nodes(store.scene(), store.camera(), 100.0)))
    });
}

fn bench_draw_list_2000_nodes(c: &mut Criterion) {
    let (mut store, ids) = grid_store(2000, 50);
    store.set_camera(Vec2::new(5000.0, 3000.0), 0.5);
    for id in ids.iter().step_by(7) {
        store.select(*id, true);
    }
    let renderer = Renderer::new(CanvasSettings::default());

    c.bench_function("draw_list_2000", |b| {
        b.iter(|| black_box(renderer.frame(&store)))
    });
}

fn bench_undo_redo_moves(c: &mut Criterion) {
    c.bench_function("undo_redo_100_moves", |b| {
        b.iter_batched(
            || {
                let (mut store, ids) = grid_store(100, 10);
                for (step, id) in ids.iter().enumerate() {
                    let _ = store.move_node(*id, Vec2::new(step as f64, -(step as f64)));
                    store.commit();
                }
                store
            },
            |mut store| {
                while store.undo() {}
                while store.redo() {}
                black_box(store.scene().node_count())
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_culling_2000_nodes,
    bench_draw_list_2000_nodes,
    bench_undo_redo_moves
);
criterion_main!(benches);
