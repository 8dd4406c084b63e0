use serde::{Deserialize, Serialize};

use crate::sim::Vec2;

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.3;
pub const CAMERA_ZOOM_MAX: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.width as f32 * 0.5,
            y: self.height as f32 * 0.5,
        }
    }
}

/// `position` is the world point at the viewport centre. Screen y grows
/// downward, world y grows upward with floor level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: CAMERA_ZOOM_DEFAULT,
        }
    }
}

impl Camera2D {
    pub fn effective_zoom(&self) -> f32 {
        clamp_camera_zoom(self.zoom)
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
    }

    pub fn apply_pinch_scale(&mut self, scale: f32) {
        if !scale.is_finite() || scale <= 0.0 {
            return;
        }
        self.set_zoom_clamped(self.zoom * scale);
    }

    /// Drags the view with the fingers: content follows the screen delta.
    pub fn pan_by_screen_delta(&mut self, delta: Vec2) {
        let zoom = self.effective_zoom();
        self.position.x -= delta.x / zoom;
        self.position.y += delta.y / zoom;
    }

    pub fn screen_to_world(&self, viewport: Viewport, screen: Vec2) -> Vec2 {
        let zoom = self.effective_zoom();
        let center = viewport.center();
        Vec2 {
            x: self.position.x + (screen.x - center.x) / zoom,
            y: self.position.y + (center.y - screen.y) / zoom,
        }
    }

    pub fn follow(&mut self, target: Vec2) {
        self.position = target;
    }
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}
