use codecanvas_core::{DependencyDirection, EdgeKind, NodeId, Vec2};
use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // ========================================================================
    // Scene
    // ========================================================================
    NodeOpened {
        id: NodeId,
        path: PathBuf,
    },
    NodeClosed {
        id: NodeId,
    },
    /// Closing was cancelled at the save prompt.
    NodeCloseCancelled {
        id: NodeId,
    },
    EdgeAdded {
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
    },
    SelectionChanged {
        ids: Vec<NodeId>,
    },
    FocusChanged {
        id: Option<NodeId>,
    },

    // ========================================================================
    // History
    // ========================================================================
    UndoStackChanged {
        can_undo: bool,
        can_redo: bool,
        undo_depth: usize,
    },

    // ========================================================================
    // Camera / renderer
    // ========================================================================
    CameraChanged {
        position: Vec2,
        scale: f64,
    },
    CanvasVisibilityChanged {
        visible: bool,
    },

    // ========================================================================
    // Dependencies
    // ========================================================================
    DependenciesResolved {
        direction: DependencyDirection,
        count: usize,
    },
    /// No root at the position, or the provider did not answer in time.
    DependenciesUnavailable {
        direction: DependencyDirection,
    },

    // ========================================================================
    // Workspaces
    // ========================================================================
    WorkspaceSaved {
        id: Uuid,
        name: String,
    },
    WorkspaceLoaded {
        id: Uuid,
        name: String,
        restored: usize,
        skipped: usize,
    },
    WorkspaceDeleted {
        id: Uuid,
    },
    WorkspaceDirtyChanged {
        id: Uuid,
        dirty: bool,
    },
    RestoreWarning {
        path: PathBuf,
        reason: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Drains every pending event without dispatching it.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }

    /// Dispatch all pending events to a listener.
    /// The frame loop calls this once per running frame.
    pub fn dispatch_to<L: EventListener + ?Sized>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }
}

/// Trait for components that respond to events.
/// Implement this to receive events from the EventBus.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_publish_receive() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let receiver = bus.receiver();

        sender
            .send(Event::NodeOpened {
                id: NodeId(7),
                path: PathBuf::from("/src/main.rs"),
            })
            .unwrap();

        match receiver.recv().unwrap() {
            Event::NodeOpened { id, path } => {
                assert_eq!(id, NodeId(7));
                assert_eq!(path, PathBuf::from("/src/main.rs"));
            }
            _ => panic!("Expected NodeOpened event"),
        }
    }

    #[test]
    fn test_dispatch_to_listener_drains_in_order() {
        struct Recorder(Vec<String>);
        impl EventListener for Recorder {
            fn handle_event(&mut self, event: &Event) {
                if let Event::RestoreWarning { path, .. } = event {
                    self.0.push(path.display().to_string());
                }
            }
        }

        let bus = EventBus::new();
        for name in ["a.rs", "b.rs"] {
            bus.publish(Event::RestoreWarning {
                path: PathBuf::from(name),
                reason: "missing".into(),
            });
        }

        let mut recorder = Recorder(Vec::new());
        bus.dispatch_to(&mut recorder);
        assert_eq!(recorder.0, vec!["a.rs", "b.rs"]);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::UndoStackChanged {
            can_undo: true,
            can_redo: false,
            undo_depth: 2,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            back,
            Event::UndoStackChanged {
                can_undo: true,
                undo_depth: 2,
                ..
            }
        ));
    }
}
