use serde::{Deserialize, Serialize};

use super::camera::{Camera2D, Viewport};
use super::gesture::GestureFrame;
use crate::sim::{Facing, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    MoveLeft,
    MoveRight,
    Possess,
    Unpossess,
    Reset,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: KeyAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: KeyAction) -> bool {
        self.down[action.index()]
    }
}

impl KeyAction {
    const fn index(self) -> usize {
        match self {
            KeyAction::MoveLeft => 0,
            KeyAction::MoveRight => 1,
            KeyAction::Possess => 2,
            KeyAction::Unpossess => 3,
            KeyAction::Reset => 4,
        }
    }
}

/// What the session sees for one tick. Presses are edges: they are true for
/// exactly one snapshot per physical press or gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntentSnapshot {
    move_direction: Option<Facing>,
    possess_pressed: bool,
    unpossess_pressed: bool,
    reset_pressed: bool,
    tap_world: Option<Vec2>,
}

impl IntentSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn move_direction(&self) -> Option<Facing> {
        self.move_direction
    }

    pub fn possess_pressed(&self) -> bool {
        self.possess_pressed
    }

    pub fn unpossess_pressed(&self) -> bool {
        self.unpossess_pressed
    }

    pub fn reset_pressed(&self) -> bool {
        self.reset_pressed
    }

    pub fn tap_world(&self) -> Option<Vec2> {
        self.tap_world
    }

    pub fn with_move(mut self, direction: Option<Facing>) -> Self {
        self.move_direction = direction;
        self
    }

    pub fn with_possess_pressed(mut self, pressed: bool) -> Self {
        self.possess_pressed = pressed;
        self
    }

    pub fn with_unpossess_pressed(mut self, pressed: bool) -> Self {
        self.unpossess_pressed = pressed;
        self
    }

    pub fn with_reset_pressed(mut self, pressed: bool) -> Self {
        self.reset_pressed = pressed;
        self
    }

    pub fn with_tap_world(mut self, tap_world: Option<Vec2>) -> Self {
        self.tap_world = tap_world;
        self
    }
}

/// Merges keyboard state and classified gestures into per-tick intents.
#[derive(Debug, Clone, Default)]
pub struct IntentCollector {
    action_states: ActionStates,
    possess_pressed_edge: bool,
    unpossess_pressed_edge: bool,
    reset_pressed_edge: bool,
    joystick: Option<Facing>,
    tap_world: Option<Vec2>,
}

impl IntentCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, action: KeyAction, pressed: bool) {
        let was_down = self.action_states.is_down(action);
        self.action_states.set(action, pressed);
        if !pressed || was_down {
            return;
        }
        match action {
            KeyAction::Possess => self.possess_pressed_edge = true,
            KeyAction::Unpossess => self.unpossess_pressed_edge = true,
            KeyAction::Reset => self.reset_pressed_edge = true,
            KeyAction::MoveLeft | KeyAction::MoveRight => {}
        }
    }

    /// Applies pinch and pan to the camera, then maps any tap into world
    /// space through the updated view.
    pub fn absorb_gestures(
        &mut self,
        frame: &GestureFrame,
        camera: &mut Camera2D,
        viewport: Viewport,
    ) {
        self.joystick = frame.joystick;
        self.possess_pressed_edge |= frame.possess;
        self.unpossess_pressed_edge |= frame.unpossess;
        if frame.zoom_scale != 1.0 {
            camera.apply_pinch_scale(frame.zoom_scale);
        }
        if frame.pan != Vec2::ZERO {
            camera.pan_by_screen_delta(frame.pan);
        }
        if let Some(screen) = frame.tap {
            self.tap_world = Some(camera.screen_to_world(viewport, screen));
        }
    }

    pub fn snapshot_for_tick(&mut self) -> IntentSnapshot {
        let snapshot = IntentSnapshot {
            move_direction: self.move_direction(),
            possess_pressed: self.possess_pressed_edge,
            unpossess_pressed: self.unpossess_pressed_edge,
            reset_pressed: self.reset_pressed_edge,
            tap_world: self.tap_world,
        };
        self.possess_pressed_edge = false;
        self.unpossess_pressed_edge = false;
        self.reset_pressed_edge = false;
        self.tap_world = None;
        snapshot
    }

    fn move_direction(&self) -> Option<Facing> {
        let left = self.action_states.is_down(KeyAction::MoveLeft);
        let right = self.action_states.is_down(KeyAction::MoveRight);
        match (left, right) {
            (true, false) => Some(Facing::Left),
            (false, true) => Some(Facing::Right),
            (true, true) => None,
            (false, false) => self.joystick,
        }
    }
}
