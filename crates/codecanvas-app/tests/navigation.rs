mod common;

use anyhow::Result;
use codecanvas_core::Vec2;
use codecanvas_graph::TraversalDirection;
use common::{FakeHost, context};
use std::path::Path;
use std::time::Instant;

#[tokio::test]
async fn test_focus_next_glides_to_offscreen_node() -> Result<()> {
    let host = FakeHost::with_files(&["/src/a.rs", "/src/b.rs", "/src/c.rs"]);
    let mut ctx = context(host);
    let a = ctx.open_document(Path::new("/src/a.rs")).await?;
    let b = ctx.open_document(Path::new("/src/b.rs")).await?;
    let c = ctx.open_document(Path::new("/src/c.rs")).await?;
    ctx.store_mut().move_node(b, Vec2::new(700.0, -240.0))?;
    ctx.store_mut().move_node(c, Vec2::new(1400.0, -240.0))?;
    assert_eq!(ctx.store_mut().sorted_nodes(), vec![a, b, c]);

    assert_eq!(ctx.focus_next(TraversalDirection::Next, Instant::now()), Some(a));
    assert_eq!(ctx.store().camera().position(), Vec2::ZERO);

    assert_eq!(ctx.focus_next(TraversalDirection::Next, Instant::now()), Some(b));
    let store = ctx.store();
    let rect = store.scene().node(b).map(|n| n.rect).expect("b");
    assert!(store.camera().viewport_rect().contains_rect(&rect));
    assert_eq!(store.focused(), Some(b));
    assert_eq!(store.selection().iter().copied().collect::<Vec<_>>(), vec![b]);
    Ok(())
}

#[tokio::test]
async fn test_viewport_slot_selects_visible_node() -> Result<()> {
    let host = FakeHost::with_files(&["/src/a.rs", "/src/b.rs"]);
    let mut ctx = context(host);
    let a = ctx.open_document(Path::new("/src/a.rs")).await?;
    let b = ctx.open_document(Path::new("/src/b.rs")).await?;
    ctx.store_mut().move_node(b, Vec2::new(4000.0, 0.0))?;

    assert_eq!(ctx.focus_viewport_slot(1, Instant::now()), Some(a));
    assert_eq!(ctx.store().focused(), Some(a));
    assert_eq!(ctx.focus_viewport_slot(2, Instant::now()), None);
    assert_eq!(ctx.store_mut().enumeration_in_viewport(b), None);
    Ok(())
}
