//! Raw input as delivered by the host, and the listener registry that routes
//! it to handlers.

use crate::Renderer;
use codecanvas_core::Vec2;
use codecanvas_graph::CanvasStore;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Pointer position is in screen space, relative to the canvas viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Vec2,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub position: Vec2,
    pub delta: Vec2,
    pub modifiers: Modifiers,
    /// Trackpad pinch, reported by hosts as a wheel event with Ctrl held.
    pub pinch: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Escape,
    Character(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    PointerDown,
    PointerUp,
    PointerMove,
    MouseDown,
    MouseUp,
    MouseMove,
    KeyDown,
    KeyUp,
    Wheel,
    ContextMenu,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown(PointerEvent),
    PointerUp(PointerEvent),
    PointerMove(PointerEvent),
    MouseDown(PointerEvent),
    MouseUp(PointerEvent),
    MouseMove(PointerEvent),
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    Wheel(WheelEvent),
    ContextMenu(PointerEvent),
}

impl InputEvent {
    pub fn kind(&self) -> ListenerKind {
        match self {
            InputEvent::PointerDown(_) => ListenerKind::PointerDown,
            InputEvent::PointerUp(_) => ListenerKind::PointerUp,
            InputEvent::PointerMove(_) => ListenerKind::PointerMove,
            InputEvent::MouseDown(_) => ListenerKind::MouseDown,
            InputEvent::MouseUp(_) => ListenerKind::MouseUp,
            InputEvent::MouseMove(_) => ListenerKind::MouseMove,
            InputEvent::KeyDown(_) => ListenerKind::KeyDown,
            InputEvent::KeyUp(_) => ListenerKind::KeyUp,
            InputEvent::Wheel(_) => ListenerKind::Wheel,
            InputEvent::ContextMenu(_) => ListenerKind::ContextMenu,
        }
    }

    pub fn pointer(&self) -> Option<&PointerEvent> {
        match self {
            InputEvent::PointerDown(p)
            | InputEvent::PointerUp(p)
            | InputEvent::PointerMove(p)
            | InputEvent::MouseDown(p)
            | InputEvent::MouseUp(p)
            | InputEvent::MouseMove(p)
            | InputEvent::ContextMenu(p) => Some(p),
            _ => None,
        }
    }
}

/// Whether a handler consumed the event. Unhandled events are handed back
/// to the host, e.g. so a wheel over an editor scrolls the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Handled,
    Unhandled,
}

pub type InputHandler = fn(&mut Renderer, &mut CanvasStore, &InputEvent) -> Propagation;

/// One handler per listener kind. Registering again replaces the previous
/// handler.
#[derive(Default, Clone)]
pub struct ListenerRegistry {
    handlers: HashMap<ListenerKind, InputHandler>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handler that was replaced, if any.
    pub fn register(&mut self, kind: ListenerKind, handler: InputHandler) -> Option<InputHandler> {
        let previous = self.handlers.insert(kind, handler);
        if previous.is_some() {
            tracing::debug!("Replaced {:?} listener", kind);
        }
        previous
    }

    pub fn unregister(&mut self, kind: ListenerKind) -> Option<InputHandler> {
        self.handlers.remove(&kind)
    }

    pub fn get(&self, kind: ListenerKind) -> Option<InputHandler> {
        self.handlers.get(&kind).copied()
    }

    pub fn is_registered(&self, kind: ListenerKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
