use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::atomic_io::write_text_atomic;
use super::json::deserialize_json;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write level '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse level json{location}: {message}")]
    Parse { location: String, message: String },
    #[error("validation failed at {path}: {message}")]
    Validation { path: String, message: String },
    #[error("encode level json: {0}")]
    Encode(#[source] serde_json::Error),
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_true(value: &bool) -> bool {
    *value
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDef {
    pub x_pos: f32,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub num_possessions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyDef {
    pub x_pos: f32,
    #[serde(default)]
    pub level: u32,
    pub patrol_start: f32,
    pub patrol_end: f32,
    #[serde(rename = "keyInt", default)]
    pub key_int: Vec<u32>,
    #[serde(default)]
    pub possessed: bool,
    #[serde(
        rename = "facingRight",
        default = "default_true",
        skip_serializing_if = "is_true"
    )]
    pub facing_right: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_range: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaircaseDoorDef {
    pub x_pos: f32,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub connection: u32,
    #[serde(rename = "isDen", default)]
    pub is_den: bool,
    #[serde(rename = "keyInt", default, skip_serializing_if = "Vec::is_empty")]
    pub key_int: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorDef {
    pub x_pos: f32,
    #[serde(default)]
    pub level: u32,
    #[serde(rename = "keyInt", default)]
    pub key_int: Vec<u32>,
    #[serde(rename = "isOpen", default)]
    pub is_open: bool,
    #[serde(rename = "isUnlocked", default, skip_serializing_if = "is_false")]
    pub is_unlocked: bool,
}

/// Position-only element: caged animals in `decorations`, and walls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDef {
    pub x_pos: f32,
    #[serde(default)]
    pub level: u32,
}

/// On-disk level document. Saves use the same shape, so a save is a
/// mirror of the live level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub player: PlayerDef,
    #[serde(default)]
    pub enemy: Vec<EnemyDef>,
    #[serde(rename = "staircase-door", default)]
    pub staircase_door: Vec<StaircaseDoorDef>,
    #[serde(default)]
    pub door: Vec<DoorDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wall: Vec<MarkerDef>,
    #[serde(default)]
    pub decorations: Vec<MarkerDef>,
    pub floor: u32,
    #[serde(default)]
    pub level: u32,
}

pub fn parse_level_json(raw: &str) -> Result<LevelDefinition, LevelError> {
    deserialize_json(raw).map_err(|failure| LevelError::Parse {
        location: failure.location,
        message: failure.message,
    })
}

fn validation_err(path: impl Into<String>, message: impl Into<String>) -> LevelError {
    LevelError::Validation {
        path: path.into(),
        message: message.into(),
    }
}

fn expected_actual(path: impl Into<String>, expected: impl Display, actual: impl Display) -> LevelError {
    validation_err(path, format!("expected {expected}, got {actual}"))
}

fn check_finite(path: String, value: f32) -> Result<(), LevelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(expected_actual(path, "finite number", value))
    }
}

fn check_level(path: String, level: u32, floor: u32) -> Result<(), LevelError> {
    if level < floor {
        Ok(())
    } else {
        Err(expected_actual(path, format!("level below floor count {floor}"), level))
    }
}

pub fn validate_level(def: &LevelDefinition) -> Result<(), LevelError> {
    if def.floor == 0 {
        return Err(expected_actual("floor", "at least 1", def.floor));
    }
    check_finite("player.x_pos".to_string(), def.player.x_pos)?;
    check_level("player.level".to_string(), def.player.level, def.floor)?;

    let mut possessed_index: Option<usize> = None;
    for (index, enemy) in def.enemy.iter().enumerate() {
        check_finite(format!("enemy[{index}].x_pos"), enemy.x_pos)?;
        check_finite(format!("enemy[{index}].patrol_start"), enemy.patrol_start)?;
        check_finite(format!("enemy[{index}].patrol_end"), enemy.patrol_end)?;
        check_level(format!("enemy[{index}].level"), enemy.level, def.floor)?;
        // A possessed body may have been walked anywhere before the save.
        let low = enemy.patrol_start.min(enemy.patrol_end);
        let high = enemy.patrol_start.max(enemy.patrol_end);
        if !enemy.possessed && !(low..=high).contains(&enemy.x_pos) {
            return Err(expected_actual(
                format!("enemy[{index}].x_pos"),
                format!("position within patrol range [{low}, {high}]"),
                enemy.x_pos,
            ));
        }
        if let Some(vision) = enemy.vision_range {
            if !vision.is_finite() || vision < 0.0 {
                return Err(expected_actual(
                    format!("enemy[{index}].vision_range"),
                    "finite non-negative number",
                    vision,
                ));
            }
        }
        if enemy.possessed {
            if let Some(first) = possessed_index {
                return Err(validation_err(
                    format!("enemy[{index}].possessed"),
                    format!("only one enemy may be possessed (first at enemy[{first}])"),
                ));
            }
            possessed_index = Some(index);
        }
    }

    let mut connections: HashMap<(bool, u32), usize> = HashMap::new();
    for (index, passage) in def.staircase_door.iter().enumerate() {
        check_finite(format!("staircase-door[{index}].x_pos"), passage.x_pos)?;
        check_level(format!("staircase-door[{index}].level"), passage.level, def.floor)?;
        *connections
            .entry((passage.is_den, passage.connection))
            .or_default() += 1;
    }
    for ((is_den, connection), count) in connections {
        if count != 2 {
            warn!(connection, is_den, count, "passage_connection_unpaired");
        }
    }

    for (index, door) in def.door.iter().enumerate() {
        check_finite(format!("door[{index}].x_pos"), door.x_pos)?;
        check_level(format!("door[{index}].level"), door.level, def.floor)?;
    }
    for (index, wall) in def.wall.iter().enumerate() {
        check_finite(format!("wall[{index}].x_pos"), wall.x_pos)?;
        check_level(format!("wall[{index}].level"), wall.level, def.floor)?;
    }
    for (index, decoration) in def.decorations.iter().enumerate() {
        check_finite(format!("decorations[{index}].x_pos"), decoration.x_pos)?;
        check_level(format!("decorations[{index}].level"), decoration.level, def.floor)?;
    }
    Ok(())
}

/// Parses and validates in one step.
pub fn level_from_json(raw: &str) -> Result<LevelDefinition, LevelError> {
    let def = parse_level_json(raw)?;
    validate_level(&def)?;
    Ok(def)
}

pub fn level_to_json(def: &LevelDefinition) -> Result<String, LevelError> {
    serde_json::to_string_pretty(def).map_err(LevelError::Encode)
}

pub fn load_level(path: &Path) -> Result<LevelDefinition, LevelError> {
    let raw = fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let def = level_from_json(&raw)?;
    info!(
        path = %path.display(),
        level = def.level,
        floors = def.floor,
        enemies = def.enemy.len(),
        doors = def.door.len(),
        "level_loaded"
    );
    Ok(def)
}

pub fn save_level(path: &Path, def: &LevelDefinition) -> Result<(), LevelError> {
    let json = level_to_json(def)?;
    write_text_atomic(path, &json).map_err(|source| LevelError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), level = def.level, "level_saved");
    Ok(())
}
