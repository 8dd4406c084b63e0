use serde::{Deserialize, Serialize};
use tracing::debug;

use super::camera::Viewport;
use crate::sim::{Facing, Vec2};

pub const LEFT_ZONE_FRACTION: f32 = 1.0 / 3.0;
pub const RIGHT_ZONE_FRACTION: f32 = 2.0 / 3.0;
pub const JOYSTICK_DEADZONE: f32 = 15.0;
pub const JOYSTICK_RADIUS: f32 = 25.0;
pub const SWIPE_THRESHOLD: f32 = 100.0;
pub const TAP_MOVE_THRESHOLD: f32 = 10.0;
pub const TAP_MAX_DURATION_MS: u64 = 250;
pub const PINCH_MIN_DISTANCE_DELTA: f32 = 1.0;
pub const PAN_MIN_MIDPOINT_DELTA: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub left_zone_fraction: f32,
    pub right_zone_fraction: f32,
    pub joystick_deadzone: f32,
    pub joystick_radius: f32,
    pub swipe_threshold: f32,
    pub tap_move_threshold: f32,
    pub tap_max_duration_ms: u64,
    pub pinch_min_distance_delta: f32,
    pub pan_min_midpoint_delta: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            left_zone_fraction: LEFT_ZONE_FRACTION,
            right_zone_fraction: RIGHT_ZONE_FRACTION,
            joystick_deadzone: JOYSTICK_DEADZONE,
            joystick_radius: JOYSTICK_RADIUS,
            swipe_threshold: SWIPE_THRESHOLD,
            tap_move_threshold: TAP_MOVE_THRESHOLD,
            tap_max_duration_ms: TAP_MAX_DURATION_MS,
            pinch_min_distance_delta: PINCH_MIN_DISTANCE_DELTA,
            pan_min_midpoint_delta: PAN_MIN_MIDPOINT_DELTA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchZone {
    Left,
    Mid,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Began,
    Moved,
    Ended,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub id: u64,
    pub phase: TouchPhase,
    pub position: Vec2,
    pub time_ms: u64,
}

/// Everything the classifier recognised since the last `take_frame`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureFrame {
    pub joystick: Option<Facing>,
    pub possess: bool,
    pub unpossess: bool,
    /// Screen position where the tap began.
    pub tap: Option<Vec2>,
    /// Multiplicative zoom change; 1.0 when no pinch happened.
    pub zoom_scale: f32,
    pub pan: Vec2,
}

impl Default for GestureFrame {
    fn default() -> Self {
        Self {
            joystick: None,
            possess: false,
            unpossess: false,
            tap: None,
            zoom_scale: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TrackedTouch {
    id: u64,
    zone: TouchZone,
    start: Vec2,
    start_ms: u64,
    current: Vec2,
    max_travel: f32,
    swipe_fired: bool,
    in_pinch: bool,
}

#[derive(Debug, Clone, Copy)]
struct Joystick {
    touch: u64,
    anchor: Vec2,
    direction: Option<Facing>,
}

#[derive(Debug, Clone, Copy)]
struct Pinch {
    first: u64,
    second: u64,
    last_distance: f32,
    last_midpoint: Vec2,
}

impl Pinch {
    fn involves(&self, id: u64) -> bool {
        self.first == id || self.second == id
    }
}

#[derive(Debug, Clone)]
pub struct GestureClassifier {
    config: GestureConfig,
    viewport: Viewport,
    touches: Vec<TrackedTouch>,
    joystick: Option<Joystick>,
    pinch: Option<Pinch>,
    pending: GestureFrame,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig, viewport: Viewport) -> Self {
        Self {
            config,
            viewport,
            touches: Vec::new(),
            joystick: None,
            pinch: None,
            pending: GestureFrame::default(),
        }
    }

    pub fn zone_for(&self, position: Vec2) -> TouchZone {
        let width = self.viewport.width.max(1) as f32;
        let fraction = position.x / width;
        if fraction < self.config.left_zone_fraction {
            TouchZone::Left
        } else if fraction >= self.config.right_zone_fraction {
            TouchZone::Right
        } else {
            TouchZone::Mid
        }
    }

    pub fn handle(&mut self, event: TouchEvent) {
        match event.phase {
            TouchPhase::Began => self.touch_began(event),
            TouchPhase::Moved => self.touch_moved(event),
            TouchPhase::Ended => self.touch_finished(event, true),
            TouchPhase::Cancelled => self.touch_finished(event, false),
        }
    }

    /// Returns this frame's gestures and clears the one-shot parts. The
    /// joystick direction persists while its finger stays down.
    pub fn take_frame(&mut self) -> GestureFrame {
        let mut frame = std::mem::take(&mut self.pending);
        frame.joystick = self.joystick.and_then(|joystick| joystick.direction);
        frame
    }

    fn touch_began(&mut self, event: TouchEvent) {
        if self.touches.iter().any(|touch| touch.id == event.id) {
            debug!(touch_id = event.id, "duplicate_touch_begin_ignored");
            return;
        }
        let zone = self.zone_for(event.position);
        self.touches.push(TrackedTouch {
            id: event.id,
            zone,
            start: event.position,
            start_ms: event.time_ms,
            current: event.position,
            max_travel: 0.0,
            swipe_fired: false,
            in_pinch: false,
        });

        if zone == TouchZone::Left && self.joystick.is_none() {
            self.joystick = Some(Joystick {
                touch: event.id,
                anchor: event.position,
                direction: None,
            });
            return;
        }
        if self.pinch.is_none() {
            self.try_start_pinch();
        }
    }

    /// Pinch and pan live in the right zone, so the joystick finger and
    /// mid-screen taps never join one.
    fn try_start_pinch(&mut self) {
        let mut candidates = self
            .touches
            .iter()
            .filter(|touch| touch.zone == TouchZone::Right && !touch.in_pinch);
        let (Some(first), Some(second)) = (candidates.next().copied(), candidates.next().copied())
        else {
            return;
        };
        self.pinch = Some(Pinch {
            first: first.id,
            second: second.id,
            last_distance: first.current.distance(second.current),
            last_midpoint: first.current.midpoint(second.current),
        });
        for touch in &mut self.touches {
            if touch.id == first.id || touch.id == second.id {
                touch.in_pinch = true;
            }
        }
        debug!(first = first.id, second = second.id, "pinch_started");
    }

    fn touch_moved(&mut self, event: TouchEvent) {
        let Some(touch) = self.touches.iter_mut().find(|touch| touch.id == event.id) else {
            return;
        };
        touch.current = event.position;
        touch.max_travel = touch.max_travel.max(touch.start.distance(event.position));
        let touch = *touch;

        if self.joystick.is_some_and(|joystick| joystick.touch == event.id) {
            self.update_joystick(event.position);
        } else if self.pinch.is_some_and(|pinch| pinch.involves(event.id)) {
            self.update_pinch();
        } else {
            self.check_swipe(touch.id);
        }
    }

    fn touch_finished(&mut self, event: TouchEvent, completed: bool) {
        let Some(index) = self.touches.iter().position(|touch| touch.id == event.id) else {
            return;
        };
        if completed {
            let touch = &mut self.touches[index];
            touch.current = event.position;
            touch.max_travel = touch.max_travel.max(touch.start.distance(event.position));
            self.check_swipe(event.id);
        }
        let touch = self.touches.remove(index);

        if completed && self.is_tap(&touch, event.time_ms) {
            self.pending.tap = Some(touch.start);
        }
        if self.joystick.is_some_and(|joystick| joystick.touch == touch.id) {
            self.joystick = None;
        }
        if self.pinch.is_some_and(|pinch| pinch.involves(touch.id)) {
            self.pinch = None;
        }
    }

    fn is_tap(&self, touch: &TrackedTouch, end_ms: u64) -> bool {
        !touch.in_pinch
            && !touch.swipe_fired
            && touch.max_travel <= self.config.tap_move_threshold
            && end_ms.saturating_sub(touch.start_ms) <= self.config.tap_max_duration_ms
    }

    fn update_joystick(&mut self, position: Vec2) {
        let radius = self.config.joystick_radius;
        let deadzone = self.config.joystick_deadzone;
        let Some(joystick) = self.joystick.as_mut() else {
            return;
        };
        let mut delta = position.sub(joystick.anchor);
        let magnitude = delta.length();
        if magnitude > radius {
            let pull = radius / magnitude;
            joystick.anchor = Vec2 {
                x: position.x - delta.x * pull,
                y: position.y - delta.y * pull,
            };
            delta = position.sub(joystick.anchor);
        }
        joystick.direction = if delta.length() > deadzone {
            if delta.x > 0.0 {
                Some(Facing::Right)
            } else if delta.x < 0.0 {
                Some(Facing::Left)
            } else {
                None
            }
        } else {
            None
        };
    }

    fn update_pinch(&mut self) {
        let Some(mut pinch) = self.pinch else {
            return;
        };
        let position_of = |id: u64| {
            self.touches
                .iter()
                .find(|touch| touch.id == id)
                .map(|touch| touch.current)
        };
        let (Some(first), Some(second)) = (position_of(pinch.first), position_of(pinch.second))
        else {
            return;
        };

        let distance = first.distance(second);
        if (distance - pinch.last_distance).abs() > self.config.pinch_min_distance_delta
            && pinch.last_distance > 0.0
        {
            self.pending.zoom_scale *= distance / pinch.last_distance;
            pinch.last_distance = distance;
        }

        let midpoint = first.midpoint(second);
        let shift = midpoint.sub(pinch.last_midpoint);
        if shift.length() > self.config.pan_min_midpoint_delta {
            self.pending.pan.x += shift.x;
            self.pending.pan.y += shift.y;
            pinch.last_midpoint = midpoint;
        }
        self.pinch = Some(pinch);
    }

    fn check_swipe(&mut self, id: u64) {
        let threshold = self.config.swipe_threshold;
        let Some(touch) = self.touches.iter_mut().find(|touch| touch.id == id) else {
            return;
        };
        if touch.zone != TouchZone::Right || touch.swipe_fired || touch.in_pinch {
            return;
        }
        let rise = touch.start.y - touch.current.y;
        if rise > threshold {
            touch.swipe_fired = true;
            self.pending.possess = true;
            debug!(touch_id = id, rise, "swipe_up_possess");
        } else if rise < -threshold {
            touch.swipe_fired = true;
            self.pending.unpossess = true;
            debug!(touch_id = id, rise, "swipe_down_unpossess");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 900,
        height: 600,
    };

    fn classifier() -> GestureClassifier {
        GestureClassifier::new(GestureConfig::default(), VIEWPORT)
    }

    fn touch(id: u64, phase: TouchPhase, x: f32, y: f32, time_ms: u64) -> TouchEvent {
        TouchEvent {
            id,
            phase,
            position: Vec2::new(x, y),
            time_ms,
        }
    }

    #[test]
    fn zones_split_by_width_fraction() {
        let gestures = classifier();
        assert_eq!(gestures.zone_for(Vec2::new(100.0, 0.0)), TouchZone::Left);
        assert_eq!(gestures.zone_for(Vec2::new(450.0, 0.0)), TouchZone::Mid);
        assert_eq!(gestures.zone_for(Vec2::new(600.0, 0.0)), TouchZone::Right);
    }

    #[test]
    fn short_stationary_touch_is_tap_at_begin_position() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 450.0, 300.0, 0));
        gestures.handle(touch(1, TouchPhase::Moved, 454.0, 303.0, 60));
        gestures.handle(touch(1, TouchPhase::Ended, 456.0, 305.0, 120));

        let frame = gestures.take_frame();
        assert_eq!(frame.tap, Some(Vec2::new(450.0, 300.0)));
        assert_eq!(gestures.take_frame().tap, None);
    }

    #[test]
    fn moved_or_slow_touches_are_not_taps() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 450.0, 300.0, 0));
        gestures.handle(touch(1, TouchPhase::Ended, 470.0, 300.0, 100));
        assert_eq!(gestures.take_frame().tap, None);

        gestures.handle(touch(2, TouchPhase::Began, 450.0, 300.0, 1000));
        gestures.handle(touch(2, TouchPhase::Ended, 450.0, 300.0, 1600));
        assert_eq!(gestures.take_frame().tap, None);
    }

    #[test]
    fn cancelled_touch_is_not_a_tap() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 450.0, 300.0, 0));
        gestures.handle(touch(1, TouchPhase::Cancelled, 450.0, 300.0, 50));
        assert_eq!(gestures.take_frame().tap, None);
    }

    #[test]
    fn right_zone_swipe_up_possesses_once() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 800.0, 500.0, 0));
        gestures.handle(touch(1, TouchPhase::Moved, 800.0, 420.0, 30));
        assert!(!gestures.take_frame().possess);

        gestures.handle(touch(1, TouchPhase::Moved, 800.0, 380.0, 60));
        gestures.handle(touch(1, TouchPhase::Moved, 800.0, 200.0, 90));
        let frame = gestures.take_frame();
        assert!(frame.possess);
        assert!(!frame.unpossess);

        gestures.handle(touch(1, TouchPhase::Ended, 800.0, 150.0, 120));
        let after = gestures.take_frame();
        assert!(!after.possess);
        assert_eq!(after.tap, None);
    }

    #[test]
    fn right_zone_swipe_down_unpossesses() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 800.0, 100.0, 0));
        gestures.handle(touch(1, TouchPhase::Ended, 800.0, 250.0, 80));
        let frame = gestures.take_frame();
        assert!(frame.unpossess);
        assert!(!frame.possess);
    }

    #[test]
    fn vertical_swipe_outside_right_zone_does_nothing() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 450.0, 500.0, 0));
        gestures.handle(touch(1, TouchPhase::Ended, 450.0, 200.0, 80));
        let frame = gestures.take_frame();
        assert!(!frame.possess);
        assert!(!frame.unpossess);
    }

    #[test]
    fn joystick_respects_deadzone() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 100.0, 400.0, 0));
        gestures.handle(touch(1, TouchPhase::Moved, 110.0, 400.0, 16));
        assert_eq!(gestures.take_frame().joystick, None);

        gestures.handle(touch(1, TouchPhase::Moved, 120.0, 400.0, 32));
        assert_eq!(gestures.take_frame().joystick, Some(Facing::Right));
        assert_eq!(gestures.take_frame().joystick, Some(Facing::Right));

        gestures.handle(touch(1, TouchPhase::Ended, 120.0, 400.0, 48));
        assert_eq!(gestures.take_frame().joystick, None);
    }

    #[test]
    fn joystick_anchor_recenters_beyond_radius() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 100.0, 400.0, 0));
        gestures.handle(touch(1, TouchPhase::Moved, 200.0, 400.0, 16));
        assert_eq!(gestures.take_frame().joystick, Some(Facing::Right));

        // Anchor trails at 175; moving back 30 units reverses immediately.
        gestures.handle(touch(1, TouchPhase::Moved, 170.0, 400.0, 32));
        assert_eq!(gestures.take_frame().joystick, None);
        gestures.handle(touch(1, TouchPhase::Moved, 150.0, 400.0, 48));
        assert_eq!(gestures.take_frame().joystick, Some(Facing::Left));
    }

    #[test]
    fn pinch_scales_and_ignores_jitter() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 700.0, 300.0, 0));
        gestures.handle(touch(2, TouchPhase::Began, 800.0, 300.0, 5));

        gestures.handle(touch(2, TouchPhase::Moved, 800.5, 300.0, 10));
        let jitter = gestures.take_frame();
        assert_eq!(jitter.zoom_scale, 1.0);
        assert_eq!(jitter.pan, Vec2::ZERO);

        gestures.handle(touch(2, TouchPhase::Moved, 850.0, 300.0, 20));
        let frame = gestures.take_frame();
        assert!((frame.zoom_scale - 1.5).abs() < 1e-4);
        assert!(frame.pan.x > 0.0);
        assert!(!frame.possess);
    }

    #[test]
    fn pinch_fingers_never_tap_or_swipe() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 700.0, 300.0, 0));
        gestures.handle(touch(2, TouchPhase::Began, 800.0, 300.0, 5));
        gestures.handle(touch(2, TouchPhase::Moved, 800.0, 100.0, 20));
        gestures.handle(touch(1, TouchPhase::Ended, 700.0, 300.0, 40));
        gestures.handle(touch(2, TouchPhase::Ended, 800.0, 100.0, 60));

        let frame = gestures.take_frame();
        assert_eq!(frame.tap, None);
        assert!(!frame.possess);
        assert!(!frame.unpossess);
    }

    #[test]
    fn joystick_finger_does_not_join_pinch() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 100.0, 300.0, 0));
        gestures.handle(touch(2, TouchPhase::Began, 800.0, 500.0, 5));
        gestures.handle(touch(2, TouchPhase::Moved, 800.0, 350.0, 30));

        let frame = gestures.take_frame();
        assert!(frame.possess);
        assert_eq!(frame.zoom_scale, 1.0);
    }

    #[test]
    fn mid_zone_fingers_tap_instead_of_pinching() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 400.0, 300.0, 0));
        gestures.handle(touch(2, TouchPhase::Began, 500.0, 300.0, 5));
        gestures.handle(touch(2, TouchPhase::Moved, 504.0, 300.0, 20));
        let moving = gestures.take_frame();
        assert_eq!(moving.zoom_scale, 1.0);
        assert_eq!(moving.pan, Vec2::ZERO);

        gestures.handle(touch(1, TouchPhase::Ended, 400.0, 300.0, 60));
        assert_eq!(gestures.take_frame().tap, Some(Vec2::new(400.0, 300.0)));
        gestures.handle(touch(2, TouchPhase::Ended, 504.0, 300.0, 80));
        assert_eq!(gestures.take_frame().tap, Some(Vec2::new(500.0, 300.0)));
    }

    #[test]
    fn mid_and_right_fingers_do_not_pair_into_a_pinch() {
        let mut gestures = classifier();
        gestures.handle(touch(1, TouchPhase::Began, 450.0, 300.0, 0));
        gestures.handle(touch(2, TouchPhase::Began, 800.0, 300.0, 5));
        gestures.handle(touch(2, TouchPhase::Moved, 850.0, 300.0, 20));
        assert_eq!(gestures.take_frame().zoom_scale, 1.0);

        gestures.handle(touch(3, TouchPhase::Began, 700.0, 300.0, 30));
        gestures.handle(touch(3, TouchPhase::Moved, 650.0, 300.0, 40));
        assert!(gestures.take_frame().zoom_scale > 1.0);
    }
}
