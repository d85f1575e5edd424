//! Scene graph, camera and the mutation pipeline behind the code canvas.

pub mod action;
pub mod camera;
pub mod focus;
pub mod history;
pub mod host;
pub mod pipeline;
pub mod scene;
pub mod spatial;
pub mod store;

use codecanvas_core::NodeId;
use thiserror::Error;

pub use action::{Mutation, MutationOrigin, SceneAction, SceneDelta};
pub use camera::Camera;
pub use focus::FocusHistory;
pub use host::{CloseDecision, DocumentHost};
pub use pipeline::{MutationPipeline, PipelineConfig, WorkspaceBaseline};
pub use scene::{CanvasEdge, CanvasNode, MIN_NODE_SIZE, SceneGraph};
pub use spatial::{SpatialSortStage, TraversalDirection, VIEWPORT_SLOTS, spatial_order};
pub use store::{CanvasStore, RemoveOutcome};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),
    #[error("Unknown edge: {0} -> {1}")]
    UnknownEdge(NodeId, NodeId),
    #[error("Mutation vetoed: {0}")]
    Vetoed(&'static str),
    #[error("Host error: {0}")]
    Host(String),
}
