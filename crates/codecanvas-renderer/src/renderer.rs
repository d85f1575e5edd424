use crate::draw::{DrawList, FrameInputs, RenderSurface, build_draw_list};
use crate::glide::{Glide, NavigationType, glide_target};
use crate::input::{
    InputEvent, Key, KeyEvent, ListenerKind, ListenerRegistry, PointerButton,
    PointerEvent, Propagation, WheelEvent,
};
use crate::settings::CanvasSettings;
use codecanvas_core::{NodeId, Rect, Vec2};
use codecanvas_events::Event;
use codecanvas_graph::CanvasStore;
use std::collections::VecDeque;
use std::time::Instant;

/// Height of a node's title bar, in canvas units.
pub const HEADER_HEIGHT: f64 = 32.0;
/// Side of the square grab area in a node's bottom-right corner.
pub const RESIZE_HANDLE: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    #[default]
    Stopped,
    Running,
    /// Canvas hidden: input is dropped and nothing is painted.
    Paused,
}

/// Something the renderer cannot finish on its own, left for the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasIntent {
    /// Middle click on a node header. Closing may prompt to save.
    CloseNode(NodeId),
    ContextMenu {
        position: Vec2,
        node: Option<NodeId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Resize { id: NodeId, origin: Rect, down: Vec2 },
    Move { id: NodeId, origin: Rect, down: Vec2 },
    Hand { camera_at_down: Vec2, down: Vec2 },
    Select { down: Vec2, only_add: bool },
}

pub struct Renderer {
    state: FrameState,
    settings: CanvasSettings,
    listeners: ListenerRegistry,
    queue: VecDeque<InputEvent>,
    gesture: Option<Gesture>,
    selection_box: Option<Rect>,
    scroll_until: Option<Instant>,
    glide: Option<Glide>,
    intents: Vec<CanvasIntent>,
    unhandled: Vec<InputEvent>,
    now: Instant,
    frames: u64,
}

impl Renderer {
    pub fn new(settings: CanvasSettings) -> Self {
        // Hosts deliver either pointer or mouse events; both route to the
        // same gesture handlers.
        let mut listeners = ListenerRegistry::new();
        listeners.register(ListenerKind::PointerDown, on_pointer_down);
        listeners.register(ListenerKind::PointerMove, on_pointer_move);
        listeners.register(ListenerKind::PointerUp, on_pointer_up);
        listeners.register(ListenerKind::MouseDown, on_pointer_down);
        listeners.register(ListenerKind::MouseMove, on_pointer_move);
        listeners.register(ListenerKind::MouseUp, on_pointer_up);
        listeners.register(ListenerKind::KeyDown, on_key_down);
        listeners.register(ListenerKind::KeyUp, on_key_up);
        listeners.register(ListenerKind::Wheel, on_wheel);
        listeners.register(ListenerKind::ContextMenu, on_context_menu);
        Self {
            state: FrameState::Stopped,
            settings,
            listeners,
            queue: VecDeque::new(),
            gesture: None,
            selection_box: None,
            scroll_until: None,
            glide: None,
            intents: Vec::new(),
            unhandled: Vec::new(),
            now: Instant::now(),
            frames: 0,
        }
    }

    pub fn settings(&self) -> &CanvasSettings {
        &self.settings
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn listeners_mut(&mut self) -> &mut ListenerRegistry {
        &mut self.listeners
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    // ========================================================================
    // Frame state
    // ========================================================================

    pub fn start(&mut self) {
        if self.state == FrameState::Stopped {
            tracing::debug!("Canvas frame loop started");
            self.state = FrameState::Running;
        }
    }

    pub fn stop(&mut self) {
        self.state = FrameState::Stopped;
        self.queue.clear();
        self.glide = None;
    }

    /// Showing resumes a paused loop; hiding pauses it and abandons any
    /// gesture in progress.
    pub fn set_visible(&mut self, store: &mut CanvasStore, visible: bool) {
        let next = match (self.state, visible) {
            (FrameState::Paused, true) => FrameState::Running,
            (FrameState::Running, false) => {
                self.cancel_gesture(store);
                self.queue.clear();
                FrameState::Paused
            }
            _ => return,
        };
        tracing::debug!("Canvas frame loop {:?} -> {:?}", self.state, next);
        self.state = next;
        store
            .events()
            .publish(Event::CanvasVisibilityChanged { visible });
    }

    /// Queues an event for the next frame. Dropped unless running.
    pub fn push_event(&mut self, event: InputEvent) -> bool {
        if self.state != FrameState::Running {
            return false;
        }
        self.queue.push_back(event);
        true
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn take_intents(&mut self) -> Vec<CanvasIntent> {
        std::mem::take(&mut self.intents)
    }

    /// Events no handler consumed, for the host to process normally.
    pub fn take_unhandled(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.unhandled)
    }

    /// Runs one frame: drains queued input, advances any glide, culls and
    /// paints. Returns false when the loop is not running.
    pub fn tick(&mut self, store: &mut CanvasStore, surface: &mut dyn RenderSurface, now: Instant) -> bool {
        if self.state != FrameState::Running {
            return false;
        }
        self.now = now;

        while let Some(event) = self.queue.pop_front() {
            let outcome = match self.listeners.get(event.kind()) {
                Some(handler) => handler(self, store, &event),
                None => Propagation::Unhandled,
            };
            if outcome == Propagation::Unhandled {
                self.unhandled.push(event);
            }
        }

        self.step_glide(store, now);
        let frame = self.frame(store);
        surface.present(&frame);
        self.frames += 1;
        true
    }

    pub fn frame(&self, store: &CanvasStore) -> DrawList {
        build_draw_list(&FrameInputs {
            scene: store.scene(),
            camera: store.camera(),
            selection: store.selection(),
            focused: store.focused(),
            selection_box: self.selection_box,
            cull_margin: self.settings.cull_margin,
        })
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Glides the camera until `target` (canvas space) is in view. Returns
    /// false when it already was.
    pub fn navigate_to(
        &mut self,
        store: &mut CanvasStore,
        target: Rect,
        navigation: NavigationType,
        now: Instant,
    ) -> bool {
        let Some((position, scale)) = glide_target(
            store.camera(),
            target,
            navigation,
            self.settings.viewport_padding,
            self.settings.scale_range(),
        ) else {
            return false;
        };
        let glide = Glide::new(store.camera(), position, scale, now, self.settings.glide_duration());
        self.glide = Some(glide);
        self.step_glide(store, now);
        true
    }

    pub fn is_gliding(&self) -> bool {
        self.glide.is_some()
    }

    fn step_glide(&mut self, store: &mut CanvasStore, now: Instant) {
        let Some(glide) = self.glide else {
            return;
        };
        let (position, scale, done) = glide.sample(now);
        store.set_camera(position, scale);
        if done {
            self.glide = None;
        }
    }

    pub fn is_scrolling(&self) -> bool {
        self.scroll_until.is_some_and(|until| self.now < until)
    }

    // ========================================================================
    // Wheel and keys
    // ========================================================================

    fn wheel(&mut self, store: &mut CanvasStore, wheel: &WheelEvent) -> Propagation {
        let camera = *store.camera();
        let zoom = wheel.modifiers.command() || wheel.pinch;
        let over_node = store
            .scene()
            .node_at(camera.screen_to_canvas(wheel.position))
            .is_some();
        if over_node && !zoom && !self.is_scrolling() {
            return Propagation::Unhandled;
        }

        self.scroll_until = Some(self.now + self.settings.wheel_debounce());
        self.glide = None;

        if zoom {
            let sensitivity = if wheel.pinch {
                self.settings.pinch_zoom_sensitivity
            } else {
                self.settings.zoom_sensitivity
            };
            let scale = self
                .settings
                .clamp_scale(camera.scale() - wheel.delta.y * sensitivity);
            store.zoom_at(wheel.position, scale);
        } else if wheel.modifiers.shift && wheel.delta.x == 0.0 {
            let pan = Vec2::new(wheel.delta.y, 0.0) / camera.scale();
            store.set_camera(camera.position() + pan, camera.scale());
        } else {
            store.set_camera(camera.position() + wheel.delta / camera.scale(), camera.scale());
        }
        Propagation::Handled
    }

    fn key_down(&mut self, store: &mut CanvasStore, key: &KeyEvent) -> Propagation {
        let step = if key.modifiers.shift {
            self.settings.keyboard_nudge_fast
        } else {
            self.settings.keyboard_nudge
        };
        let direction = match key.key {
            Key::ArrowLeft => Vec2::new(-1.0, 0.0),
            Key::ArrowRight => Vec2::new(1.0, 0.0),
            Key::ArrowUp => Vec2::new(0.0, -1.0),
            Key::ArrowDown => Vec2::new(0.0, 1.0),
            Key::Escape if self.gesture.is_some() => {
                self.cancel_gesture(store);
                return Propagation::Handled;
            }
            _ => return Propagation::Unhandled,
        };
        let camera = *store.camera();
        self.glide = None;
        store.set_camera(
            camera.position() + direction * (step / camera.scale()),
            camera.scale(),
        );
        Propagation::Handled
    }

    // ========================================================================
    // Pointer gestures
    // ========================================================================

    /// Resolves the handler for a press, highest priority first: resize,
    /// close, move, hand, box select.
    fn pointer_down(&mut self, store: &mut CanvasStore, pointer: &PointerEvent) -> Propagation {
        let camera = *store.camera();
        let at = camera.screen_to_canvas(pointer.position);
        let hit = store.scene().node_at(at).map(|node| (node.id, node.rect));
        let modifiers = pointer.modifiers;
        let primary = pointer.button == PointerButton::Primary;

        if let Some((id, rect)) = hit {
            if primary && !modifiers.alt && in_resize_corner(&rect, at) {
                store.focus(id);
                self.gesture = Some(Gesture::Resize { id, origin: rect, down: at });
                return Propagation::Handled;
            }
            if pointer.button == PointerButton::Middle && in_header(&rect, at) {
                self.intents.push(CanvasIntent::CloseNode(id));
                return Propagation::Handled;
            }
            if primary && !modifiers.alt && in_header(&rect, at) {
                store.select(id, modifiers.shift);
                store.focus(id);
                self.gesture = Some(Gesture::Move { id, origin: rect, down: at });
                return Propagation::Handled;
            }
        }

        let hand = (primary && modifiers.alt)
            || matches!(pointer.button, PointerButton::Middle | PointerButton::Secondary);
        if hand {
            self.glide = None;
            self.gesture = Some(Gesture::Hand {
                camera_at_down: camera.position(),
                down: pointer.position,
            });
            return Propagation::Handled;
        }

        match hit {
            Some((id, _)) => {
                // Body clicks belong to the editor.
                store.focus(id);
                Propagation::Unhandled
            }
            None => {
                if !modifiers.shift {
                    store.clear_selection();
                }
                self.gesture = Some(Gesture::Select {
                    down: at,
                    only_add: modifiers.shift,
                });
                self.selection_box = Some(Rect::from_corners(at, at));
                Propagation::Handled
            }
        }
    }

    fn pointer_move(&mut self, store: &mut CanvasStore, pointer: &PointerEvent) -> Propagation {
        let Some(gesture) = self.gesture else {
            return Propagation::Unhandled;
        };
        let camera = *store.camera();
        let at = camera.screen_to_canvas(pointer.position);
        let result = match gesture {
            Gesture::Resize { id, origin, down } => store.preview_resize(id, origin.size + (at - down)),
            Gesture::Move { id, origin, down } => store.preview_move(id, origin.position + (at - down)),
            Gesture::Hand {
                camera_at_down,
                down,
            } => {
                let position = camera_at_down + (down - pointer.position) / camera.scale();
                store.set_camera(position, camera.scale());
                Ok(())
            }
            Gesture::Select { down, .. } => {
                self.selection_box = Some(Rect::from_corners(down, at));
                Ok(())
            }
        };
        if let Err(err) = result {
            tracing::debug!("Dropping gesture: {}", err);
            self.gesture = None;
        }
        Propagation::Handled
    }

    fn pointer_up(&mut self, store: &mut CanvasStore, pointer: &PointerEvent) -> Propagation {
        let Some(gesture) = self.gesture.take() else {
            return Propagation::Unhandled;
        };
        match gesture {
            Gesture::Move { id, origin, .. } | Gesture::Resize { id, origin, .. } => {
                if let Err(err) = commit_drag(store, id, origin) {
                    tracing::warn!("Could not finish drag of {}: {}", id, err);
                }
            }
            Gesture::Hand { .. } => {}
            Gesture::Select { down, only_add } => {
                let at = store.camera().screen_to_canvas(pointer.position);
                let area = Rect::from_corners(down, at);
                self.selection_box = None;
                if area.size.x > 0.0 || area.size.y > 0.0 {
                    store.box_select(area, only_add);
                }
            }
        }
        Propagation::Handled
    }

    /// Reverts the previews of an unfinished gesture.
    fn cancel_gesture(&mut self, store: &mut CanvasStore) {
        self.selection_box = None;
        let result = match self.gesture.take() {
            Some(Gesture::Move { id, origin, .. }) => store.preview_move(id, origin.position),
            Some(Gesture::Resize { id, origin, .. }) => store.preview_resize(id, origin.size),
            _ => Ok(()),
        };
        if let Err(err) = result {
            tracing::debug!("Gesture target vanished: {}", err);
        }
    }
}

/// Replays a previewed drag as one tracked change: the node goes back to
/// where it started without recording, then moves to the drop point.
fn commit_drag(store: &mut CanvasStore, id: NodeId, origin: Rect) -> Result<(), codecanvas_graph::SceneError> {
    let Some(dropped) = store.scene().node(id).map(|node| node.rect) else {
        return Ok(());
    };
    if dropped == origin {
        return Ok(());
    }
    store.preview_move(id, origin.position)?;
    store.preview_resize(id, origin.size)?;
    if dropped.position != origin.position {
        store.move_node(id, dropped.position)?;
    }
    if dropped.size != origin.size {
        store.resize_node(id, dropped.size)?;
    }
    store.commit();
    Ok(())
}

fn in_header(rect: &Rect, at: Vec2) -> bool {
    rect.contains_point(at) && at.y - rect.position.y <= HEADER_HEIGHT
}

fn in_resize_corner(rect: &Rect, at: Vec2) -> bool {
    let max = rect.max();
    rect.contains_point(at) && max.x - at.x <= RESIZE_HANDLE && max.y - at.y <= RESIZE_HANDLE
}

fn on_pointer_down(renderer: &mut Renderer, store: &mut CanvasStore, event: &InputEvent) -> Propagation {
    match event {
        InputEvent::PointerDown(p) | InputEvent::MouseDown(p) => renderer.pointer_down(store, p),
        _ => Propagation::Unhandled,
    }
}

fn on_pointer_move(renderer: &mut Renderer, store: &mut CanvasStore, event: &InputEvent) -> Propagation {
    match event {
        InputEvent::PointerMove(p) | InputEvent::MouseMove(p) => renderer.pointer_move(store, p),
        _ => Propagation::Unhandled,
    }
}

fn on_pointer_up(renderer: &mut Renderer, store: &mut CanvasStore, event: &InputEvent) -> Propagation {
    match event {
        InputEvent::PointerUp(p) | InputEvent::MouseUp(p) => renderer.pointer_up(store, p),
        _ => Propagation::Unhandled,
    }
}

fn on_key_down(renderer: &mut Renderer, store: &mut CanvasStore, event: &InputEvent) -> Propagation {
    match event {
        InputEvent::KeyDown(key) => renderer.key_down(store, key),
        _ => Propagation::Unhandled,
    }
}

fn on_key_up(_renderer: &mut Renderer, _store: &mut CanvasStore, _event: &InputEvent) -> Propagation {
    Propagation::Unhandled
}

fn on_wheel(renderer: &mut Renderer, store: &mut CanvasStore, event: &InputEvent) -> Propagation {
    match event {
        InputEvent::Wheel(wheel) => renderer.wheel(store, wheel),
        _ => Propagation::Unhandled,
    }
}

fn on_context_menu(renderer: &mut Renderer, store: &mut CanvasStore, event: &InputEvent) -> Propagation {
    let Some(pointer) = event.pointer() else {
        return Propagation::Unhandled;
    };
    let position = store.camera().screen_to_canvas(pointer.position);
    let node = store.scene().node_at(position).map(|node| node.id);
    renderer.intents.push(CanvasIntent::ContextMenu { position, node });
    Propagation::Handled
}
