use codecanvas_core::{EdgeKind, NodeId, Rect, Vec2};
use codecanvas_graph::{Camera, SceneGraph};
use std::collections::BTreeSet;

/// Nodes whose rectangle intersects the viewport grown by `margin` canvas
/// units, in paint order.
pub fn visible_nodes(scene: &SceneGraph, camera: &Camera, margin: f64) -> Vec<NodeId> {
    let view = camera.viewport_rect().expand(margin.max(0.0));
    scene.nodes_in(&view)
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// `rect` is in screen space.
    Node {
        id: NodeId,
        rect: Rect,
        title: String,
        selected: bool,
        focused: bool,
        pinned: bool,
    },
    Edge {
        from: Vec2,
        to: Vec2,
        kind: EdgeKind,
    },
    SelectionBox(Rect),
}

/// Everything painted in one frame, back to front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub scale: f64,
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Node { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Edge { .. }))
            .count()
    }
}

/// The host's painter.
pub trait RenderSurface {
    fn present(&mut self, frame: &DrawList);
}

pub(crate) struct FrameInputs<'a> {
    pub scene: &'a SceneGraph,
    pub camera: &'a Camera,
    pub selection: &'a BTreeSet<NodeId>,
    pub focused: Option<NodeId>,
    pub selection_box: Option<Rect>,
    pub cull_margin: f64,
}

pub(crate) fn build_draw_list(inputs: &FrameInputs<'_>) -> DrawList {
    let camera = inputs.camera;
    let visible: BTreeSet<NodeId> = visible_nodes(inputs.scene, camera, inputs.cull_margin)
        .into_iter()
        .collect();
    let mut commands = Vec::new();

    // Edges under nodes. An edge is drawn when either end is on screen.
    for edge in inputs.scene.edges() {
        if !visible.contains(&edge.from) && !visible.contains(&edge.to) {
            continue;
        }
        let (Some(from), Some(to)) = (inputs.scene.node(edge.from), inputs.scene.node(edge.to))
        else {
            continue;
        };
        let (start, end) = edge_anchors(&from.rect, &to.rect);
        commands.push(DrawCommand::Edge {
            from: camera.canvas_to_screen(start),
            to: camera.canvas_to_screen(end),
            kind: edge.kind,
        });
    }

    for node in inputs.scene.nodes().filter(|n| visible.contains(&n.id)) {
        commands.push(DrawCommand::Node {
            id: node.id,
            rect: to_screen(camera, &node.rect),
            title: node.document.file_name(),
            selected: inputs.selection.contains(&node.id),
            focused: inputs.focused == Some(node.id),
            pinned: node.pinned,
        });
    }

    if let Some(area) = inputs.selection_box {
        commands.push(DrawCommand::SelectionBox(to_screen(camera, &area)));
    }

    DrawList {
        scale: camera.scale(),
        commands,
    }
}

fn to_screen(camera: &Camera, rect: &Rect) -> Rect {
    Rect::from_corners(
        camera.canvas_to_screen(rect.min()),
        camera.canvas_to_screen(rect.max()),
    )
}

/// Connects the facing sides of two node rectangles.
fn edge_anchors(from: &Rect, to: &Rect) -> (Vec2, Vec2) {
    let (a, b) = (from.center(), to.center());
    if b.x >= a.x {
        (Vec2::new(from.max().x, a.y), Vec2::new(to.min().x, b.y))
    } else {
        (Vec2::new(from.min().x, a.y), Vec2::new(to.max().x, b.y))
    }
}
