use chrono::Utc;
use codecanvas_core::Vec2;
use codecanvas_storage::{CanvasWorkspace, EditorLayout, Storage, WorkspaceLayout};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::path::PathBuf;
use uuid::Uuid;

fn layout(editors: usize) -> WorkspaceLayout {
    WorkspaceLayout {
        editors: (0..editors)
            .map(|i| EditorLayout {
                group_id: i as u64,
                path: PathBuf::from(format!("/src/module_{i}.rs")),
                x: i as f64 * 460.0,
                y: 0.0,
                width: 400.0,
                height: 300.0,
                pinned: false,
                range: None,
            })
            .collect(),
        ..WorkspaceLayout::default()
    }
}

fn workspace(editors: usize) -> CanvasWorkspace {
    let layout = layout(editors);
    CanvasWorkspace {
        name: "bench".to_string(),
        unique_id: Uuid::new_v4(),
        camera_position: Vec2::new(120.0, -80.0),
        canvas_scale: 0.8,
        serialized_state: layout.to_json().expect("layout serializes"),
        group_id_set: layout.group_ids(),
        updated_at: Utc::now(),
    }
}

fn bench_save_and_load(c: &mut Criterion) {
    let storage = Storage::new_in_memory().expect("in-memory storage");
    let saved = workspace(200);

    c.bench_function("workspace_save_load_200_editors", |b| {
        b.iter(|| {
            storage.save_workspace(black_box(&saved)).expect("save");
            let loaded = storage.get_workspace(saved.unique_id).expect("load");
            black_box(loaded)
        })
    });
}

fn bench_layout_parse(c: &mut Criterion) {
    let text = layout(500).to_json().expect("layout serializes");
    c.bench_function("layout_parse_500_editors", |b| {
        b.iter(|| black_box(WorkspaceLayout::from_json(black_box(&text))))
    });
}

criterion_group!(benches, bench_save_and_load, bench_layout_parse);
criterion_main!(benches);
