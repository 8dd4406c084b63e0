use std::path::Path;

use engine::{
    GestureClassifier, IntentCollector, KeyAction, TouchEvent, TouchPhase, Vec2, Viewport,
};
use serde::Deserialize;
use tracing::{debug, info};

use super::error::{parse_json, read_text, HostError};

/// Recorded input for a headless run: touches in screen pixels and key
/// transitions, each stamped with the run time they happen at.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct InputScript {
    #[serde(default)]
    pub(crate) viewport: Option<Viewport>,
    #[serde(default)]
    pub(crate) frames: Vec<ScriptFrame>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ScriptFrame {
    pub(crate) at_ms: u64,
    #[serde(default)]
    pub(crate) touches: Vec<ScriptTouch>,
    #[serde(default)]
    pub(crate) keys: Vec<ScriptKey>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct ScriptTouch {
    pub(crate) id: u64,
    pub(crate) phase: TouchPhase,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

fn pressed_default() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct ScriptKey {
    pub(crate) action: KeyAction,
    #[serde(default = "pressed_default")]
    pub(crate) pressed: bool,
}

impl InputScript {
    pub(crate) fn from_json(raw: &str) -> Result<Self, HostError> {
        let mut script: Self = parse_json("input script", raw)?;
        script.frames.sort_by_key(|frame| frame.at_ms);
        Ok(script)
    }

    pub(crate) fn load(path: &Path) -> Result<Self, HostError> {
        let script = Self::from_json(&read_text("input script", path)?)?;
        info!(
            path = %path.display(),
            frames = script.frames.len(),
            last_at_ms = ?script.last_at_ms(),
            "input_script_loaded"
        );
        Ok(script)
    }

    pub(crate) fn last_at_ms(&self) -> Option<u64> {
        self.frames.last().map(|frame| frame.at_ms)
    }
}

/// Feeds script frames into the input stack as run time advances.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptPlayer {
    frames: Vec<ScriptFrame>,
    cursor: usize,
}

impl ScriptPlayer {
    pub(crate) fn new(script: InputScript) -> Self {
        Self {
            frames: script.frames,
            cursor: 0,
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.cursor >= self.frames.len()
    }

    /// Delivers every frame due at or before `now_ms`. Returns how many
    /// were delivered.
    pub(crate) fn feed_until(
        &mut self,
        now_ms: u64,
        gestures: &mut GestureClassifier,
        intents: &mut IntentCollector,
    ) -> usize {
        let start = self.cursor;
        while let Some(frame) = self.frames.get(self.cursor) {
            if frame.at_ms > now_ms {
                break;
            }
            for touch in &frame.touches {
                gestures.handle(TouchEvent {
                    id: touch.id,
                    phase: touch.phase,
                    position: Vec2::new(touch.x, touch.y),
                    time_ms: frame.at_ms,
                });
            }
            for key in &frame.keys {
                intents.handle_key(key.action, key.pressed);
            }
            debug!(
                at_ms = frame.at_ms,
                touches = frame.touches.len(),
                keys = frame.keys.len(),
                "script_frame_fed"
            );
            self.cursor += 1;
        }
        self.cursor - start
    }
}

#[cfg(test)]
mod tests {
    use engine::{Camera2D, Facing, GestureConfig};

    use super::*;

    #[test]
    fn frames_are_sorted_and_keys_default_to_pressed() {
        let script = InputScript::from_json(
            r#"{
                "frames": [
                    { "at_ms": 200, "keys": [ { "action": "possess" } ] },
                    { "at_ms": 0, "keys": [ { "action": "move_right", "pressed": true } ] }
                ]
            }"#,
        )
        .expect("script");
        assert_eq!(script.frames[0].at_ms, 0);
        assert_eq!(script.last_at_ms(), Some(200));
        assert!(script.frames[1].keys[0].pressed);
        assert_eq!(script.frames[1].keys[0].action, KeyAction::Possess);
    }

    #[test]
    fn unknown_phase_reports_json_path() {
        let error = InputScript::from_json(
            r#"{ "frames": [ { "at_ms": 0, "touches": [ { "id": 1, "phase": "hover", "x": 0, "y": 0 } ] } ] }"#,
        )
        .expect_err("bad phase");
        assert!(error.to_string().contains("frames[0].touches[0].phase"), "{error}");
    }

    #[test]
    fn player_feeds_only_due_frames() {
        let script = InputScript::from_json(
            r#"{
                "frames": [
                    { "at_ms": 0, "keys": [ { "action": "move_left" } ] },
                    { "at_ms": 100, "keys": [ { "action": "move_left", "pressed": false } ] }
                ]
            }"#,
        )
        .expect("script");
        let mut player = ScriptPlayer::new(script);
        let mut gestures = GestureClassifier::new(GestureConfig::default(), Viewport::new(900, 600));
        let mut intents = IntentCollector::new();

        assert_eq!(player.feed_until(50, &mut gestures, &mut intents), 1);
        assert_eq!(
            intents.snapshot_for_tick().move_direction(),
            Some(Facing::Left)
        );
        assert!(!player.is_finished());

        assert_eq!(player.feed_until(150, &mut gestures, &mut intents), 1);
        assert_eq!(intents.snapshot_for_tick().move_direction(), None);
        assert!(player.is_finished());
    }

    #[test]
    fn scripted_tap_reaches_the_collector() {
        let script = InputScript::from_json(
            r#"{
                "frames": [
                    { "at_ms": 0, "touches": [ { "id": 7, "phase": "began", "x": 500, "y": 290 } ] },
                    { "at_ms": 50, "touches": [ { "id": 7, "phase": "ended", "x": 502, "y": 291 } ] }
                ]
            }"#,
        )
        .expect("script");
        let viewport = Viewport::new(900, 600);
        let mut player = ScriptPlayer::new(script);
        let mut gestures = GestureClassifier::new(GestureConfig::default(), viewport);
        let mut intents = IntentCollector::new();
        let mut camera = Camera2D::default();

        player.feed_until(50, &mut gestures, &mut intents);
        intents.absorb_gestures(&gestures.take_frame(), &mut camera, viewport);
        assert_eq!(
            intents.snapshot_for_tick().tap_world(),
            Some(Vec2::new(50.0, 10.0))
        );
    }
}
