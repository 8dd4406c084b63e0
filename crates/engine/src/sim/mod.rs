mod config;
mod detection;
mod enemies;
mod enemy;
mod entity;
mod events;
mod objects;
mod player;
mod possession;
mod session;
mod timers;

pub use config::{
    SimConfig, DEFAULT_VISION_RANGE, FLOOR_HEIGHT, INTERACTION_RANGE, POSSESS_RANGE,
};
pub use detection::{detects, first_detector, DetectionTarget};
pub use enemies::EnemyController;
pub use enemy::{Enemy, StepOutcome};
pub use entity::{Color, EntityId, Facing, Placement, Vec2};
pub use events::{
    AudioSink, FrameEvent, FrameEventCounts, FrameEvents, RecordingAudio, SilentAudio, SoundCue,
};
pub use objects::{key_rule_passes, DoorState, KeySet, ObjectKind, ObjectSet, Passage, PlacedObject};
pub use player::Player;
pub use possession::{
    try_possess, try_unpossess, DropReason, PossessionMachine, PossessionState, Resume, Transition,
};
pub use session::{LevelSession, LevelStatus};
pub use timers::{Fired, TimerId, TimerQueue};
