mod atomic_io;
mod discovery;
mod json;
mod level;
mod progress;

pub use discovery::{discover_levels, level_index_from_file_name, LevelFile};
pub use json::{deserialize_json, JsonParseFailure};
pub use level::{
    level_from_json, level_to_json, load_level, parse_level_json, save_level, validate_level,
    DoorDef, EnemyDef, LevelDefinition, LevelError, MarkerDef, PlayerDef, StaircaseDoorDef,
};
pub use progress::{level_key, record_level_completion, CompletedLevels, ProgressError};
