use super::enemies::EnemyController;
use super::enemy::Enemy;
use super::entity::{EntityId, Placement};
use super::objects::ObjectSet;

/// Whoever the enemies are hunting this tick: the cat, or the enemy body
/// the player is currently driving.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionTarget {
    pub x: f32,
    pub level: u32,
    pub body: Option<EntityId>,
}

impl DetectionTarget {
    pub fn from_placement(placement: &Placement, body: Option<EntityId>) -> Self {
        Self {
            x: placement.x,
            level: placement.level,
            body,
        }
    }
}

/// Forward-only sight: same floor, in front of the enemy (or level with
/// it), within `vision_range`, and no closed door strictly between.
pub fn detects(enemy: &Enemy, target: &DetectionTarget, objects: &ObjectSet) -> bool {
    if !enemy.active || enemy.possessed || target.body == Some(enemy.id) {
        return false;
    }
    if enemy.level() != target.level {
        return false;
    }
    let ahead = (target.x - enemy.x()) * enemy.facing.sign();
    if ahead < 0.0 || ahead > enemy.vision_range {
        return false;
    }
    !objects.closed_door_strictly_between(enemy.level(), enemy.x(), target.x)
}

pub fn first_detector(
    enemies: &EnemyController,
    target: &DetectionTarget,
    objects: &ObjectSet,
) -> Option<EntityId> {
    enemies
        .iter()
        .find(|enemy| detects(enemy, target, objects))
        .map(|enemy| enemy.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Facing;
    use crate::sim::objects::{DoorState, KeySet, ObjectKind, PlacedObject};

    fn watcher(x: f32, level: u32, vision: f32) -> Enemy {
        Enemy::new(
            EntityId(1),
            Placement::at(x, level),
            x - 10.0,
            x + 10.0,
            vision,
            KeySet::new(),
        )
    }

    fn watcher_facing_left(x: f32, vision: f32) -> Enemy {
        let mut enemy = watcher(x, 0, vision);
        enemy.set_facing(Facing::Left);
        enemy
    }

    fn target(x: f32, level: u32) -> DetectionTarget {
        DetectionTarget {
            x,
            level,
            body: None,
        }
    }

    fn doors(doors: &[(f32, bool)]) -> ObjectSet {
        let mut objects = ObjectSet::new();
        for (index, (x, open)) in doors.iter().enumerate() {
            objects.push(PlacedObject {
                id: EntityId(100 + index as u64),
                placement: Placement::at(*x, 0),
                kind: ObjectKind::Door(DoorState::new(*open, KeySet::new())),
            });
        }
        objects
    }

    #[test]
    fn detection_requires_same_level() {
        let enemy = watcher(200.0, 0, 300.0);
        assert!(detects(&enemy, &target(300.0, 0), &ObjectSet::new()));
        assert!(!detects(&enemy, &target(300.0, 1), &ObjectSet::new()));
    }

    #[test]
    fn vision_range_is_inclusive() {
        let right = watcher(200.0, 0, 100.0);
        assert!(detects(&right, &target(300.0, 0), &ObjectSet::new()));
        assert!(!detects(&right, &target(301.0, 0), &ObjectSet::new()));

        let left = watcher_facing_left(200.0, 100.0);
        assert!(detects(&left, &target(100.0, 0), &ObjectSet::new()));
        assert!(!detects(&left, &target(99.0, 0), &ObjectSet::new()));
    }

    #[test]
    fn enemies_do_not_see_behind_themselves() {
        let right = watcher(200.0, 0, 300.0);
        assert!(!detects(&right, &target(100.0, 0), &ObjectSet::new()));
        assert!(!detects(&right, &target(199.0, 0), &ObjectSet::new()));
        assert!(detects(&right, &target(200.0, 0), &ObjectSet::new()));

        let left = watcher_facing_left(200.0, 300.0);
        assert!(!detects(&left, &target(300.0, 0), &ObjectSet::new()));
        assert!(detects(&left, &target(100.0, 0), &ObjectSet::new()));
    }

    #[test]
    fn door_combinations_between_enemy_and_target() {
        let enemy = watcher_facing_left(300.0, 300.0);
        let player = target(100.0, 0);
        let cases: [(&[(f32, bool)], bool); 7] = [
            (&[], true),
            (&[(200.0, true)], true),
            (&[(200.0, false)], false),
            (&[(150.0, true), (250.0, true)], true),
            (&[(150.0, true), (250.0, false)], false),
            (&[(150.0, false), (250.0, false)], false),
            (&[(50.0, false), (350.0, false)], true),
        ];
        for (layout, expected) in cases {
            assert_eq!(
                detects(&enemy, &player, &doors(layout)),
                expected,
                "layout {layout:?}"
            );
        }
    }

    #[test]
    fn door_at_endpoint_does_not_occlude() {
        let enemy = watcher_facing_left(300.0, 300.0);
        assert!(detects(&enemy, &target(100.0, 0), &doors(&[(100.0, false)])));
        assert!(detects(&enemy, &target(100.0, 0), &doors(&[(300.0, false)])));
    }

    #[test]
    fn possessed_enemy_never_detects_and_is_not_its_own_detector() {
        let mut enemy = watcher(200.0, 0, 300.0);
        let own_body = DetectionTarget {
            x: 200.0,
            level: 0,
            body: Some(EntityId(1)),
        };
        assert!(!detects(&enemy, &own_body, &ObjectSet::new()));

        assert!(detects(&enemy, &target(250.0, 0), &ObjectSet::new()));
        enemy.set_possessed(true);
        assert!(!detects(&enemy, &target(250.0, 0), &ObjectSet::new()));
    }

    #[test]
    fn first_detector_follows_controller_order() {
        let mut controller = EnemyController::new();
        let mut far = watcher_facing_left(600.0, 300.0);
        far.id = EntityId(7);
        let mut near = watcher(150.0, 0, 300.0);
        near.id = EntityId(8);
        controller.insert(far);
        controller.insert(near);

        assert_eq!(
            first_detector(&controller, &target(400.0, 0), &ObjectSet::new()),
            Some(EntityId(7))
        );
        assert_eq!(
            first_detector(&controller, &target(1000.0, 0), &ObjectSet::new()),
            None
        );
    }
}
