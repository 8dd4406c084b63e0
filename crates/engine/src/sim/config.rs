use serde::{Deserialize, Serialize};

pub const POSSESS_RANGE: f32 = 150.0;
pub const DEFAULT_VISION_RANGE: f32 = 300.0;
pub const ENEMY_PATROL_SPEED: f32 = 60.0;
pub const CAT_MOVE_SPEED: f32 = 140.0;
pub const POSSESSED_MOVE_SPEED: f32 = 90.0;
pub const INTERACTION_RANGE: f32 = 80.0;
pub const INTERACTABLE_HALF_WIDTH: f32 = 40.0;
pub const FLOOR_HEIGHT: f32 = 200.0;
pub const POSSESS_DELAY_MS: u64 = 600;
pub const UNPOSSESS_DELAY_MS: u64 = 500;
pub const PASSAGE_DELAY_MS: u64 = 400;
pub const DOOR_TOGGLE_DELAY_MS: u64 = 250;

/// Tunables for the level simulation. Missing fields in an override file
/// fall back to the defaults above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub possess_range: f32,
    pub default_vision_range: f32,
    pub enemy_patrol_speed: f32,
    pub cat_move_speed: f32,
    pub possessed_move_speed: f32,
    pub interaction_range: f32,
    pub interactable_half_width: f32,
    pub floor_height: f32,
    pub possess_delay_ms: u64,
    pub unpossess_delay_ms: u64,
    pub passage_delay_ms: u64,
    pub door_toggle_delay_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            possess_range: POSSESS_RANGE,
            default_vision_range: DEFAULT_VISION_RANGE,
            enemy_patrol_speed: ENEMY_PATROL_SPEED,
            cat_move_speed: CAT_MOVE_SPEED,
            possessed_move_speed: POSSESSED_MOVE_SPEED,
            interaction_range: INTERACTION_RANGE,
            interactable_half_width: INTERACTABLE_HALF_WIDTH,
            floor_height: FLOOR_HEIGHT,
            possess_delay_ms: POSSESS_DELAY_MS,
            unpossess_delay_ms: UNPOSSESS_DELAY_MS,
            passage_delay_ms: PASSAGE_DELAY_MS,
            door_toggle_delay_ms: DOOR_TOGGLE_DELAY_MS,
        }
    }
}
