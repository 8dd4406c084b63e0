use super::entity::{Color, EntityId, Facing, Placement};
use super::objects::{KeySet, ObjectSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Flipped,
    Blocked,
    Idle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: EntityId,
    pub placement: Placement,
    pub patrol_start: f32,
    pub patrol_end: f32,
    pub facing: Facing,
    pub vision_range: f32,
    pub stuck: bool,
    pub possessed: bool,
    pub active: bool,
    pub keys: KeySet,
}

impl Enemy {
    pub fn new(
        id: EntityId,
        placement: Placement,
        patrol_start: f32,
        patrol_end: f32,
        vision_range: f32,
        keys: KeySet,
    ) -> Self {
        let mut placement = placement;
        placement.face(Facing::Right);
        Self {
            id,
            placement,
            patrol_start,
            patrol_end,
            facing: Facing::Right,
            vision_range,
            stuck: false,
            possessed: false,
            active: true,
            keys,
        }
    }

    pub fn x(&self) -> f32 {
        self.placement.x
    }

    pub fn level(&self) -> u32 {
        self.placement.level
    }

    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
        self.placement.face(facing);
    }

    pub fn set_possessed(&mut self, possessed: bool) {
        self.possessed = possessed;
        self.placement.color = if possessed {
            Color::POSSESSED
        } else {
            Color::default()
        };
        if possessed {
            self.stuck = false;
            self.placement.velocity = 0.0;
        }
    }

    /// Advances one patrol step. A blocked step leaves the enemy in place
    /// and keeps its facing; a step that reaches a bound clamps and flips.
    /// An enemy outside its range turns toward it and walks back in at
    /// patrol speed.
    pub fn patrol_step(&mut self, dt_seconds: f32, speed: f32, objects: &ObjectSet) -> StepOutcome {
        if !self.active || self.possessed {
            self.placement.velocity = 0.0;
            return StepOutcome::Idle;
        }

        let from = self.placement.x;
        let mut outcome = StepOutcome::Moved;
        let homeward = match self.facing {
            Facing::Right if from > self.patrol_end => Some(Facing::Left),
            Facing::Left if from < self.patrol_start => Some(Facing::Right),
            _ => None,
        };
        if let Some(facing) = homeward {
            self.set_facing(facing);
            outcome = StepOutcome::Flipped;
        }

        let mut to = from + self.facing.sign() * speed * dt_seconds;
        if objects.step_blocked(self.level(), from, to) {
            self.stuck = true;
            self.placement.velocity = 0.0;
            return StepOutcome::Blocked;
        }
        self.stuck = false;

        match self.facing {
            Facing::Right if from <= self.patrol_end && to >= self.patrol_end => {
                to = self.patrol_end;
                self.set_facing(Facing::Left);
                outcome = StepOutcome::Flipped;
            }
            Facing::Left if from >= self.patrol_start && to <= self.patrol_start => {
                to = self.patrol_start;
                self.set_facing(Facing::Right);
                outcome = StepOutcome::Flipped;
            }
            _ => {}
        }
        self.placement.velocity = if dt_seconds > 0.0 {
            (to - from) / dt_seconds
        } else {
            0.0
        };
        self.placement.x = to;
        outcome
    }

    /// Player-driven movement while possessed. Ignores patrol bounds.
    pub fn controlled_step(
        &mut self,
        direction: Option<Facing>,
        dt_seconds: f32,
        speed: f32,
        objects: &ObjectSet,
    ) -> StepOutcome {
        let Some(direction) = direction else {
            self.placement.velocity = 0.0;
            return StepOutcome::Idle;
        };
        self.set_facing(direction);
        let from = self.placement.x;
        let to = from + direction.sign() * speed * dt_seconds;
        if objects.step_blocked(self.level(), from, to) {
            self.placement.velocity = 0.0;
            return StepOutcome::Blocked;
        }
        self.placement.velocity = direction.sign() * speed;
        self.placement.x = to;
        StepOutcome::Moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::objects::{DoorState, ObjectKind, PlacedObject};

    fn patroller(x: f32, start: f32, end: f32) -> Enemy {
        Enemy::new(
            EntityId(1),
            Placement::at(x, 0),
            start,
            end,
            300.0,
            KeySet::new(),
        )
    }

    fn closed_door(x: f32) -> ObjectSet {
        let mut objects = ObjectSet::new();
        objects.push(PlacedObject {
            id: EntityId(50),
            placement: Placement::at(x, 0),
            kind: ObjectKind::Door(DoorState::new(false, KeySet::new())),
        });
        objects
    }

    #[test]
    fn flips_exactly_at_patrol_end() {
        let mut enemy = patroller(240.0, 150.0, 250.0);
        let objects = ObjectSet::new();

        assert_eq!(enemy.patrol_step(0.1, 60.0, &objects), StepOutcome::Moved);
        assert_eq!(enemy.facing, Facing::Right);
        assert_eq!(enemy.patrol_step(0.1, 60.0, &objects), StepOutcome::Flipped);
        assert_eq!(enemy.x(), 250.0);
        assert_eq!(enemy.facing, Facing::Left);
    }

    #[test]
    fn flips_at_patrol_start() {
        let mut enemy = patroller(155.0, 150.0, 250.0);
        enemy.set_facing(Facing::Left);
        let objects = ObjectSet::new();

        assert_eq!(enemy.patrol_step(0.5, 60.0, &objects), StepOutcome::Flipped);
        assert_eq!(enemy.x(), 150.0);
        assert_eq!(enemy.facing, Facing::Right);
    }

    #[test]
    fn never_reverses_mid_patrol() {
        let mut enemy = patroller(150.0, 150.0, 250.0);
        let objects = ObjectSet::new();
        let mut flips = Vec::new();
        for _ in 0..200 {
            let before = enemy.facing;
            enemy.patrol_step(1.0 / 60.0, 60.0, &objects);
            if enemy.facing != before {
                flips.push(enemy.x());
            }
        }

        assert!(!flips.is_empty());
        for x in flips {
            assert!(x == 150.0 || x == 250.0, "flip at {x}");
        }
    }

    #[test]
    fn closed_door_marks_stuck_without_flipping() {
        let mut enemy = patroller(195.0, 150.0, 250.0);
        let objects = closed_door(200.0);

        assert_eq!(enemy.patrol_step(0.1, 60.0, &objects), StepOutcome::Blocked);
        assert!(enemy.stuck);
        assert_eq!(enemy.x(), 195.0);
        assert_eq!(enemy.facing, Facing::Right);
    }

    #[test]
    fn enemy_outside_its_range_walks_back_at_patrol_speed() {
        let mut enemy = patroller(400.0, 150.0, 250.0);
        let objects = ObjectSet::new();

        assert_eq!(
            enemy.patrol_step(1.0 / 60.0, 60.0, &objects),
            StepOutcome::Flipped
        );
        assert!((enemy.x() - 399.0).abs() < 1e-3, "x = {}", enemy.x());
        assert_eq!(enemy.facing, Facing::Left);

        assert_eq!(
            enemy.patrol_step(1.0 / 60.0, 60.0, &objects),
            StepOutcome::Moved
        );
        assert!((enemy.x() - 398.0).abs() < 1e-3, "x = {}", enemy.x());
    }

    #[test]
    fn enemy_outside_its_range_cannot_pass_a_closed_door() {
        let mut enemy = patroller(400.0, 150.0, 250.0);
        enemy.set_facing(Facing::Left);
        let objects = closed_door(300.0);

        for _ in 0..600 {
            enemy.patrol_step(1.0 / 60.0, 60.0, &objects);
        }
        assert!(enemy.x() > 300.0, "x = {}", enemy.x());
        assert!(enemy.stuck);
        assert_eq!(enemy.facing, Facing::Left);
    }

    #[test]
    fn possessed_enemy_does_not_patrol() {
        let mut enemy = patroller(200.0, 150.0, 250.0);
        enemy.set_possessed(true);
        assert_eq!(
            enemy.patrol_step(0.1, 60.0, &ObjectSet::new()),
            StepOutcome::Idle
        );
        assert_eq!(enemy.x(), 200.0);
    }

    #[test]
    fn controlled_step_ignores_patrol_bounds() {
        let mut enemy = patroller(250.0, 150.0, 250.0);
        enemy.set_possessed(true);
        let outcome = enemy.controlled_step(Some(Facing::Right), 1.0, 90.0, &ObjectSet::new());
        assert_eq!(outcome, StepOutcome::Moved);
        assert_eq!(enemy.x(), 340.0);
    }
}
