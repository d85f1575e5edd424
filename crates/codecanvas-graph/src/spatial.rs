//! Reading order over the canvas, used for keyboard traversal and numbered
//! shortcuts.
//!
//! Nodes are grouped into rows (overlapping vertical extents), rows and
//! loose nodes into columns (overlapping horizontal extents), and each group
//! is visited nearest-to-origin first by `x + y`. The order is rebuilt
//! lazily after any node is added, removed, moved or resized.

use crate::action::SceneDelta;
use crate::camera::Camera;
use crate::pipeline::{Applied, MutationStage};
use crate::scene::SceneGraph;
use codecanvas_core::{NodeId, Rect, Vec2};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalDirection {
    Next,
    Previous,
}

/// Shortcut slots per viewport; the tenth is addressed as 0.
pub const VIEWPORT_SLOTS: usize = 10;

#[derive(Debug)]
enum SortItem {
    Node { id: NodeId, rect: Rect },
    Group { children: Vec<SortItem>, bounds: Rect },
}

impl SortItem {
    fn bounds(&self) -> Rect {
        match self {
            SortItem::Node { rect, .. } => *rect,
            SortItem::Group { bounds, .. } => *bounds,
        }
    }

    fn key(&self) -> f64 {
        let position = self.bounds().position;
        position.x + position.y
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Row,
    Column,
}

impl Axis {
    fn start(self, rect: &Rect) -> f64 {
        match self {
            Axis::Row => rect.position.y,
            Axis::Column => rect.position.x,
        }
    }

    fn end(self, rect: &Rect) -> f64 {
        match self {
            Axis::Row => rect.max().y,
            Axis::Column => rect.max().x,
        }
    }
}

/// One pass of grouping along `axis`. A group of one collapses to its item.
fn group_by(mut items: Vec<SortItem>, axis: Axis) -> Vec<SortItem> {
    items.sort_by(|a, b| axis.start(&a.bounds()).total_cmp(&axis.start(&b.bounds())));

    let mut grouped = Vec::new();
    let mut current: Vec<SortItem> = Vec::new();
    let mut bounds = Rect::default();
    for item in items {
        let rect = item.bounds();
        if !current.is_empty() && axis.start(&rect) <= axis.end(&bounds) {
            bounds = bounds.union(&rect);
            current.push(item);
            continue;
        }
        flush(&mut grouped, std::mem::take(&mut current), bounds);
        bounds = rect;
        current.push(item);
    }
    flush(&mut grouped, current, bounds);
    grouped
}

fn flush(grouped: &mut Vec<SortItem>, mut children: Vec<SortItem>, bounds: Rect) {
    match children.len() {
        0 => {}
        1 => grouped.extend(children.pop()),
        _ => grouped.push(SortItem::Group { children, bounds }),
    }
}

/// Farthest first, so popping a stack yields nearest first.
fn sort_for_stack(items: &mut [SortItem]) {
    items.sort_by(|a, b| b.key().total_cmp(&a.key()));
}

/// Spatial reading order of every node in `scene`.
pub fn spatial_order(scene: &SceneGraph) -> Vec<NodeId> {
    let items = scene
        .nodes()
        .map(|node| SortItem::Node {
            id: node.id,
            rect: node.rect,
        })
        .collect();
    let mut stack = group_by(group_by(items, Axis::Row), Axis::Column);
    sort_for_stack(&mut stack);

    let mut order = Vec::with_capacity(scene.node_count());
    while let Some(item) = stack.pop() {
        match item {
            SortItem::Node { id, .. } => order.push(id),
            SortItem::Group { mut children, .. } => {
                sort_for_stack(&mut children);
                stack.extend(children);
            }
        }
    }
    order
}

fn nearest_to(candidates: &[(usize, Rect)], point: Vec2) -> Option<usize> {
    let distance = |rect: &Rect| {
        let d = rect.center() - point;
        d.x * d.x + d.y * d.y
    };
    candidates
        .iter()
        .min_by(|a, b| distance(&a.1).total_cmp(&distance(&b.1)))
        .map(|(index, _)| *index)
}

/// Pipeline stage that keeps the spatial order and the traversal cursor.
#[derive(Debug, Default)]
pub struct SpatialSortStage {
    sorted: Vec<NodeId>,
    cursor: Option<usize>,
    stale: bool,
}

impl SpatialSortStage {
    fn refresh(&mut self, scene: &SceneGraph) {
        if self.stale || self.sorted.len() != scene.node_count() {
            self.sorted = spatial_order(scene);
            self.cursor = None;
            self.stale = false;
        }
    }

    pub fn sorted(&mut self, scene: &SceneGraph) -> &[NodeId] {
        self.refresh(scene);
        &self.sorted
    }

    /// Forgets the traversal position. The next step starts again from the
    /// selection or the view.
    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    /// Steps through the order, wrapping at both ends. The first step starts
    /// beside a single selected node, otherwise at the node nearest the
    /// view centre, preferring nodes fully inside the view.
    pub fn next(
        &mut self,
        scene: &SceneGraph,
        direction: TraversalDirection,
        selection: &BTreeSet<NodeId>,
        camera: &Camera,
    ) -> Option<NodeId> {
        self.refresh(scene);
        let len = self.sorted.len();
        if len == 0 {
            return None;
        }
        let step = |index: usize| match direction {
            TraversalDirection::Next => (index + 1) % len,
            TraversalDirection::Previous => (index + len - 1) % len,
        };
        let index = match self.cursor {
            Some(index) => step(index),
            None => match self.selected_index(selection) {
                Some(index) => step(index),
                None => self.nearest_index(scene, camera)?,
            },
        };
        self.cursor = Some(index);
        self.sorted.get(index).copied()
    }

    fn selected_index(&self, selection: &BTreeSet<NodeId>) -> Option<usize> {
        if selection.len() != 1 {
            return None;
        }
        let only = selection.first()?;
        self.sorted.iter().position(|id| id == only)
    }

    fn nearest_index(&self, scene: &SceneGraph, camera: &Camera) -> Option<usize> {
        let view = camera.viewport_rect();
        let center = camera.position();
        let candidates: Vec<(usize, Rect)> = self
            .sorted
            .iter()
            .enumerate()
            .filter_map(|(index, id)| scene.node(*id).map(|node| (index, node.rect)))
            .collect();
        let inside: Vec<(usize, Rect)> = candidates
            .iter()
            .copied()
            .filter(|(_, rect)| view.contains_rect(rect))
            .collect();
        nearest_to(&inside, center).or_else(|| nearest_to(&candidates, center))
    }

    /// Nodes touching the view, in spatial order.
    fn in_view(&mut self, scene: &SceneGraph, camera: &Camera) -> Vec<NodeId> {
        let view = camera.viewport_rect();
        self.refresh(scene);
        self.sorted
            .iter()
            .copied()
            .filter(|id| scene.node(*id).is_some_and(|node| view.intersects(&node.rect)))
            .collect()
    }

    /// The node on shortcut `slot` (1 through 9, then 0 for the tenth).
    pub fn nth_in_view(&mut self, scene: &SceneGraph, camera: &Camera, slot: usize) -> Option<NodeId> {
        let position = if slot == 0 { VIEWPORT_SLOTS } else { slot };
        self.in_view(scene, camera).get(position.checked_sub(1)?).copied()
    }

    /// Inverse of [`Self::nth_in_view`]. Nodes past the tenth keep counting.
    pub fn slot_in_view(&mut self, scene: &SceneGraph, camera: &Camera, id: NodeId) -> Option<usize> {
        let position = self.in_view(scene, camera).iter().position(|n| *n == id)? + 1;
        Some(if position == VIEWPORT_SLOTS { 0 } else { position })
    }
}

impl MutationStage for SpatialSortStage {
    fn name(&self) -> &'static str {
        "spatial-sort"
    }

    fn observe(&mut self, applied: &Applied<'_>, _scene: &SceneGraph) {
        if matches!(
            applied.delta,
            SceneDelta::NodeAdded { .. } | SceneDelta::NodeRemoved { .. } | SceneDelta::RectChanged { .. }
        ) {
            self.stale = true;
        }
    }
}
