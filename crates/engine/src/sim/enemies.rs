use tracing::debug;

use super::enemy::Enemy;
use super::entity::EntityId;

/// Owns every enemy in the level and the possession singleton.
#[derive(Debug, Clone, Default)]
pub struct EnemyController {
    enemies: Vec<Enemy>,
    closest: Option<EntityId>,
    possessed: Option<EntityId>,
}

impl EnemyController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, enemy: Enemy) {
        if enemy.possessed {
            let id = enemy.id;
            self.enemies.push(enemy);
            self.set_possessed(id);
        } else {
            self.enemies.push(enemy);
        }
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.enemies.iter_mut()
    }

    pub fn get(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|enemy| enemy.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|enemy| enemy.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn closest(&self) -> Option<EntityId> {
        self.closest
    }

    pub fn possessed(&self) -> Option<EntityId> {
        self.possessed
    }

    /// Nearest active, unpossessed enemy on `level` within `range` of `x`.
    /// Ties go to the enemy inserted first.
    pub fn closest_in_range(&self, x: f32, level: u32, range: f32) -> Option<EntityId> {
        let mut best: Option<(f32, EntityId)> = None;
        for enemy in &self.enemies {
            if !enemy.active || enemy.possessed || enemy.level() != level {
                continue;
            }
            let distance = (enemy.x() - x).abs();
            if distance > range {
                continue;
            }
            if best.map_or(true, |(best_distance, _)| distance < best_distance) {
                best = Some((distance, enemy.id));
            }
        }
        best.map(|(_, id)| id)
    }

    pub fn refresh_closest(&mut self, x: f32, level: u32, range: f32) -> Option<EntityId> {
        self.closest = self.closest_in_range(x, level, range);
        self.closest
    }

    /// Marks `id` as the only possessed enemy.
    pub fn set_possessed(&mut self, id: EntityId) -> bool {
        if !self.contains(id) {
            return false;
        }
        for enemy in &mut self.enemies {
            let is_target = enemy.id == id;
            if is_target || enemy.possessed {
                enemy.set_possessed(is_target);
            }
        }
        self.possessed = Some(id);
        if self.closest == Some(id) {
            self.closest = None;
        }
        true
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Enemy> {
        let index = self.enemies.iter().position(|enemy| enemy.id == id)?;
        let enemy = self.enemies.remove(index);
        if self.possessed == Some(id) {
            self.possessed = None;
        }
        if self.closest == Some(id) {
            self.closest = None;
        }
        debug!(enemy_id = id.0, remaining = self.enemies.len(), "enemy_removed");
        Some(enemy)
    }

    pub fn possessed_count(&self) -> usize {
        self.enemies.iter().filter(|enemy| enemy.possessed).count()
    }
}
