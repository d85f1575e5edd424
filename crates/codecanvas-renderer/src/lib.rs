//! Frame loop for the code canvas: input routing, camera gestures, glides,
//! culling and the per-frame draw list.

pub mod draw;
pub mod glide;
pub mod input;
pub mod renderer;
pub mod settings;

pub use draw::{DrawCommand, DrawList, RenderSurface, visible_nodes};
pub use glide::{Glide, NavigationType, glide_target};
pub use input::{
    InputEvent, InputHandler, Key, KeyEvent, ListenerKind, ListenerRegistry, Modifiers,
    PointerButton, PointerEvent, Propagation, WheelEvent,
};
pub use renderer::{CanvasIntent, FrameState, HEADER_HEIGHT, RESIZE_HANDLE, Renderer};
pub use settings::{CanvasSettings, SettingsError};
