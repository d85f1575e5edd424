use codecanvas_core::{Rect, Vec2};
use codecanvas_graph::Camera;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationType {
    /// Pan only as far as needed to bring the target into view.
    #[default]
    JustEnough,
    /// Centre the target.
    Center,
}

/// Camera position and scale that bring `target` into view. `None` when it
/// is already fully visible.
pub fn glide_target(
    camera: &Camera,
    target: Rect,
    navigation: NavigationType,
    padding: f64,
    scale_range: (f64, f64),
) -> Option<(Vec2, f64)> {
    if camera.viewport_rect().contains_rect(&target) {
        return None;
    }

    let margin = padding * 2.0;
    let viewport = camera.viewport();
    let mut scale = camera.scale();
    if target.size.x * scale > viewport.x || target.size.y * scale > viewport.y {
        let fit_x = viewport.x / (target.size.x + margin * 2.0);
        let fit_y = viewport.y / (target.size.y + margin * 2.0);
        scale = scale.min(fit_x).min(fit_y);
    }
    let scale = scale.clamp(scale_range.0, scale_range.1);

    let position = match navigation {
        NavigationType::Center => target.center(),
        NavigationType::JustEnough => {
            let half = viewport / scale / 2.0;
            let (view_min, view_max) = (camera.position() - half, camera.position() + half);
            let (min, max) = (target.min(), target.max());
            let axis = |lo: f64, hi: f64, view_lo: f64, view_hi: f64| {
                if lo < view_lo {
                    lo - view_lo - margin
                } else if hi > view_hi {
                    hi - view_hi + margin
                } else {
                    0.0
                }
            };
            camera.position()
                + Vec2::new(
                    axis(min.x, max.x, view_min.x, view_max.x),
                    axis(min.y, max.y, view_min.y, view_max.y),
                )
        }
    };
    Some((position, scale))
}

/// An in-flight eased camera move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glide {
    from: Vec2,
    from_scale: f64,
    to: Vec2,
    to_scale: f64,
    start: Instant,
    duration: Duration,
}

impl Glide {
    pub fn new(camera: &Camera, to: Vec2, to_scale: f64, start: Instant, duration: Duration) -> Self {
        Self {
            from: camera.position(),
            from_scale: camera.scale(),
            to,
            to_scale,
            start,
            duration,
        }
    }

    pub fn target(&self) -> (Vec2, f64) {
        (self.to, self.to_scale)
    }

    /// Camera at `now`, and whether the glide has finished.
    pub fn sample(&self, now: Instant) -> (Vec2, f64, bool) {
        let elapsed = now.saturating_duration_since(self.start);
        if self.duration.is_zero() || elapsed >= self.duration {
            return (self.to, self.to_scale, true);
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let eased = 1.0 - (1.0 - t).powi(3);
        let position = self.from + (self.to - self.from) * eased;
        let scale = self.from_scale + (self.to_scale - self.from_scale) * eased;
        (position, scale, false)
    }
}
