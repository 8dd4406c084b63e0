mod camera;
mod gesture;
mod intents;

pub use camera::{Camera2D, Viewport, CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_MAX, CAMERA_ZOOM_MIN};
pub use gesture::{
    GestureClassifier, GestureConfig, GestureFrame, TouchEvent, TouchPhase, TouchZone,
};
pub use intents::{IntentCollector, IntentSnapshot, KeyAction};
