use codecanvas_core::{Rect, Vec2, clamp_scale};
use serde::{Deserialize, Serialize};

/// The camera looks at `position`, the canvas point drawn at the centre of
/// the viewport, magnified by `scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    position: Vec2,
    scale: f64,
    /// Viewport size in screen pixels.
    viewport: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: 1.0,
            viewport: Vec2::new(1280.0, 800.0),
        }
    }
}

impl Camera {
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// The single write path for position and scale. Scale is clamped;
    /// non-finite coordinates keep their previous value.
    pub(crate) fn set(&mut self, position: Vec2, scale: f64) {
        self.position = Vec2::new(
            if position.x.is_finite() { position.x } else { self.position.x },
            if position.y.is_finite() { position.y } else { self.position.y },
        );
        self.scale = clamp_scale(scale);
    }

    pub(crate) fn set_viewport(&mut self, size: Vec2) {
        if size.is_finite() && size.x > 0.0 && size.y > 0.0 {
            self.viewport = size;
        }
    }

    pub fn screen_to_canvas(&self, screen: Vec2) -> Vec2 {
        self.position + (screen - self.viewport / 2.0) / self.scale
    }

    pub fn canvas_to_screen(&self, canvas: Vec2) -> Vec2 {
        (canvas - self.position) * self.scale + self.viewport / 2.0
    }

    /// Visible canvas area.
    pub fn viewport_rect(&self) -> Rect {
        let half = self.viewport / self.scale / 2.0;
        Rect::from_corners(self.position - half, self.position + half)
    }

    /// Position and scale that keep the canvas point under `anchor` fixed on
    /// screen while zooming to `scale`. The scale is clamped first.
    pub fn zoomed_at(&self, anchor: Vec2, scale: f64) -> (Vec2, f64) {
        let scale = clamp_scale(scale);
        let pinned = self.screen_to_canvas(anchor);
        let position = pinned - (anchor - self.viewport / 2.0) / scale;
        (position, scale)
    }
}
