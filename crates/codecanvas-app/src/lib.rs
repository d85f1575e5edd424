use anyhow::{Context, Result, anyhow, bail};
use codecanvas_core::{DependencyDirection, DocumentRef, NodeId, SymbolDependency, TextPosition, Vec2};
use codecanvas_events::{EventBus, EventListener};
use codecanvas_graph::{CanvasStore, DocumentHost, RemoveOutcome, TraversalDirection};
use codecanvas_renderer::{CanvasIntent, CanvasSettings, NavigationType, RenderSurface, Renderer};
use codecanvas_resolver::{
    CallHierarchyProvider, DependencyConverter, DependencyHandle, DependencyResolver,
    ResolveError, SymbolProvider, TextModelSource,
};
use codecanvas_storage::{CanvasWorkspace, Storage};
use std::sync::Arc;
use std::time::Instant;

mod workspace;

pub use workspace::RestoreReport;

/// Size given to a node opened on its own, with no origin to copy.
pub const DEFAULT_NODE_SIZE: Vec2 = Vec2 { x: 640.0, y: 480.0 };

/// Host-side collaborators the canvas is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub documents: Arc<dyn DocumentHost>,
    pub call_hierarchy: Arc<dyn CallHierarchyProvider>,
    pub symbols: Arc<dyn SymbolProvider>,
    pub models: Arc<dyn TextModelSource>,
}

/// Owns one canvas: scene store, frame loop, dependency resolution and
/// workspace persistence. Each window constructs its own.
pub struct CanvasContext {
    store: CanvasStore,
    renderer: Renderer,
    resolver: DependencyResolver,
    converter: DependencyConverter,
    storage: Storage,
    settings: CanvasSettings,
    current: Option<CanvasWorkspace>,
    events: EventBus,
    listener: Option<Box<dyn EventListener + Send>>,
}

impl CanvasContext {
    pub fn new(collaborators: Collaborators, storage: Storage, settings: CanvasSettings) -> Self {
        let events = EventBus::new();
        let store = CanvasStore::new(
            collaborators.documents,
            events.clone(),
            settings.pipeline_config(),
        );
        let resolver = DependencyResolver::new(collaborators.call_hierarchy)
            .with_timeout(settings.resolve_timeout())
            .with_events(events.clone());
        let converter = DependencyConverter::new(collaborators.models, collaborators.symbols);
        Self {
            store,
            renderer: Renderer::new(settings.clone()),
            resolver,
            converter,
            storage,
            settings,
            current: None,
            events,
            listener: None,
        }
    }

    pub fn store(&self) -> &CanvasStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CanvasStore {
        &mut self.store
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn settings(&self) -> &CanvasSettings {
        &self.settings
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ========================================================================
    // Frame loop
    // ========================================================================

    /// Routes bus events to `listener` on every tick. Without a listener
    /// they are discarded at the end of the tick.
    pub fn set_event_listener(&mut self, listener: Box<dyn EventListener + Send>) {
        self.listener = Some(listener);
    }

    pub fn tick(&mut self, surface: &mut dyn RenderSurface, now: Instant) -> bool {
        let painted = self.renderer.tick(&mut self.store, surface, now);
        match self.listener.as_mut() {
            Some(listener) => self.events.dispatch_to(listener.as_mut()),
            None => {
                self.events.drain();
            }
        }
        painted
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.renderer.set_visible(&mut self.store, visible);
    }

    /// Carries out the renderer's close requests. Returns the intents only
    /// the host can handle, such as context menus.
    pub async fn process_intents(&mut self) -> Result<Vec<CanvasIntent>> {
        let mut remaining = Vec::new();
        for intent in self.renderer.take_intents() {
            match intent {
                CanvasIntent::CloseNode(id) => {
                    if !self.store.scene().contains(id) {
                        continue;
                    }
                    let outcome = self
                        .store
                        .remove_node(id)
                        .await
                        .with_context(|| format!("Failed to close node {id}"))?;
                    if outcome == RemoveOutcome::Removed {
                        self.store.commit();
                    }
                }
                other => remaining.push(other),
            }
        }
        Ok(remaining)
    }

    // ========================================================================
    // Dependencies
    // ========================================================================

    pub fn resolve(&self, document: DocumentRef, position: TextPosition) -> DependencyHandle {
        self.resolver.resolve(document, position)
    }

    pub async fn dependencies(
        &self,
        handle: &DependencyHandle,
        direction: DependencyDirection,
    ) -> Result<Vec<SymbolDependency>, ResolveError> {
        handle.dependencies(direction, &self.converter).await
    }

    /// Opens `dependency` next to `origin`, connects the two and brings the
    /// new node into view. A node already showing the same symbol of the
    /// same file is reused; another symbol in an open file gets its own node.
    pub async fn open_dependency(
        &mut self,
        origin: NodeId,
        dependency: &SymbolDependency,
        direction: DependencyDirection,
        now: Instant,
    ) -> Result<NodeId> {
        let kind = direction
            .edge_kind()
            .ok_or_else(|| anyhow!("No dependency direction to open"))?;
        let origin_rect = self
            .store
            .scene()
            .node(origin)
            .map(|node| node.rect)
            .ok_or_else(|| anyhow!("Origin node {origin} is not on the canvas"))?;

        let existing = self
            .store
            .scene()
            .nodes()
            .find(|node| {
                node.document.path == dependency.file_path && node.symbol == dependency.range
            })
            .map(|node| node.id);
        let target = match existing {
            Some(id) if id == origin => bail!("{} is already the origin node", dependency.identifier),
            Some(id) => id,
            None => {
                let document = self
                    .store
                    .host()
                    .open_document(&dependency.file_path)
                    .await
                    .with_context(|| format!("Failed to open {}", dependency.file_path.display()))?;
                let position = Vec2::new(
                    origin_rect.max().x + self.settings.open_dependency_gap,
                    origin_rect.position.y,
                );
                self.store
                    .add_symbol_node(document, dependency.range, position, origin_rect.size)
            }
        };

        self.store.add_edge(origin, target, kind);
        self.store.commit();
        self.store.focus(target);
        self.bring_into_view(target, now);
        tracing::debug!("Opened {} as node {}", dependency.identifier, target);
        Ok(target)
    }

    // ========================================================================
    // Keyboard navigation
    // ========================================================================

    /// Moves selection and focus to the next node in reading order and
    /// glides to it.
    pub fn focus_next(&mut self, direction: TraversalDirection, now: Instant) -> Option<NodeId> {
        let id = self.store.focus_next(direction)?;
        self.bring_into_view(id, now);
        Some(id)
    }

    /// Selects and focuses the node on viewport shortcut `slot`.
    pub fn focus_viewport_slot(&mut self, slot: usize, now: Instant) -> Option<NodeId> {
        let id = self.store.nth_in_viewport(slot)?;
        self.store.select(id, false);
        self.store.focus(id);
        self.bring_into_view(id, now);
        Some(id)
    }

    fn bring_into_view(&mut self, id: NodeId, now: Instant) {
        if let Some(rect) = self.store.scene().node(id).map(|node| node.rect) {
            self.renderer
                .navigate_to(&mut self.store, rect, NavigationType::JustEnough, now);
        }
    }

    /// Places a document on the canvas at the centre of the view.
    pub async fn open_document(&mut self, path: &std::path::Path) -> Result<NodeId> {
        let document = self
            .store
            .host()
            .open_document(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let center = self.store.camera().position();
        let id = self
            .store
            .add_node(document, center - DEFAULT_NODE_SIZE / 2.0, DEFAULT_NODE_SIZE);
        self.store.commit();
        Ok(id)
    }
}
