use std::collections::BTreeSet;

use super::entity::{EntityId, Placement};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet(BTreeSet<u32>);

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: u32) -> bool {
        self.0.contains(&key)
    }

    pub fn insert(&mut self, key: u32) -> bool {
        self.0.insert(key)
    }

    pub fn intersects(&self, other: &KeySet) -> bool {
        self.0.iter().any(|key| other.0.contains(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.0.iter().copied().collect()
    }
}

impl FromIterator<u32> for KeySet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Lock rule shared by doors and passages: no keys required, a matching key
/// carried, or already unlocked earlier this level.
pub fn key_rule_passes(required: &KeySet, carried: &KeySet, unlocked: bool) -> bool {
    unlocked || required.is_empty() || required.intersects(carried)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorState {
    pub open: bool,
    pub required_keys: KeySet,
    pub unlocked: bool,
}

impl DoorState {
    pub fn new(open: bool, required_keys: KeySet) -> Self {
        Self {
            open,
            required_keys,
            unlocked: false,
        }
    }

    pub fn can_open_with(&self, carried: &KeySet) -> bool {
        key_rule_passes(&self.required_keys, carried, self.unlocked)
    }

    /// Opens the door if the key rule passes. Unlocking is permanent for
    /// the rest of the level session.
    pub fn try_open(&mut self, carried: &KeySet) -> bool {
        if !self.can_open_with(carried) {
            return false;
        }
        self.open = true;
        self.unlocked = true;
        true
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self, carried: &KeySet) -> bool {
        if self.open {
            self.close();
            true
        } else {
            self.try_open(carried)
        }
    }
}

/// Teleport endpoint shared by staircase doors and cat dens, paired with
/// the other endpoint carrying the same `connection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub connection: u32,
    pub required_keys: KeySet,
    pub unlocked: bool,
}

impl Passage {
    pub fn new(connection: u32) -> Self {
        Self {
            connection,
            required_keys: KeySet::new(),
            unlocked: false,
        }
    }

    pub fn try_unlock(&mut self, carried: &KeySet) -> bool {
        if !key_rule_passes(&self.required_keys, carried, self.unlocked) {
            return false;
        }
        self.unlocked = true;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Wall,
    Floor,
    Door(DoorState),
    StaircaseDoor(Passage),
    CatDen(Passage),
    DoorFrame,
    CagedAnimal,
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Floor => "floor",
            Self::Door(_) => "door",
            Self::StaircaseDoor(_) => "staircase_door",
            Self::CatDen(_) => "cat_den",
            Self::DoorFrame => "door_frame",
            Self::CagedAnimal => "caged_animal",
        }
    }

    pub fn is_interactable(&self) -> bool {
        matches!(
            self,
            Self::Door(_) | Self::StaircaseDoor(_) | Self::CatDen(_) | Self::CagedAnimal
        )
    }

    pub fn blocks_movement(&self) -> bool {
        match self {
            Self::Wall => true,
            Self::Door(door) => !door.open,
            _ => false,
        }
    }

    fn blocks_sight(&self) -> bool {
        matches!(self, Self::Door(door) if !door.open)
    }

    fn passage(&self) -> Option<&Passage> {
        match self {
            Self::StaircaseDoor(passage) | Self::CatDen(passage) => Some(passage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub id: EntityId,
    pub placement: Placement,
    pub kind: ObjectKind,
}

impl PlacedObject {
    pub fn door(&self) -> Option<&DoorState> {
        match &self.kind {
            ObjectKind::Door(door) => Some(door),
            _ => None,
        }
    }
}

/// Static construction elements of a level, in load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSet {
    objects: Vec<PlacedObject>,
}

impl ObjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, object: PlacedObject) {
        self.objects.push(object);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&PlacedObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut PlacedObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    /// True when a closed door on `level` sits strictly between `a` and `b`.
    pub fn closed_door_strictly_between(&self, level: u32, a: f32, b: f32) -> bool {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.objects.iter().any(|object| {
            object.placement.level == level
                && object.kind.blocks_sight()
                && object.placement.x > lo
                && object.placement.x < hi
        })
    }

    /// True when moving from `from` to `to` on `level` would cross or land on
    /// a movement blocker. A blocker exactly at `from` does not hold the mover.
    pub fn step_blocked(&self, level: u32, from: f32, to: f32) -> bool {
        if from == to {
            return false;
        }
        self.objects.iter().any(|object| {
            if object.placement.level != level || !object.kind.blocks_movement() {
                return false;
            }
            let x = object.placement.x;
            if from < to {
                x > from && x <= to
            } else {
                x < from && x >= to
            }
        })
    }

    /// Other endpoint of a staircase or den passage.
    pub fn paired_passage(&self, id: EntityId) -> Option<EntityId> {
        let origin = self.get(id)?;
        let connection = origin.kind.passage()?.connection;
        let same_kind = |other: &ObjectKind| {
            std::mem::discriminant(other) == std::mem::discriminant(&origin.kind)
        };
        self.objects
            .iter()
            .find(|other| {
                other.id != id
                    && same_kind(&other.kind)
                    && other
                        .kind
                        .passage()
                        .is_some_and(|passage| passage.connection == connection)
            })
            .map(|other| other.id)
    }

    /// Interactable whose hit box contains the world point.
    pub fn interactable_at(
        &self,
        world_x: f32,
        world_y: f32,
        half_width: f32,
        floor_height: f32,
    ) -> Option<EntityId> {
        self.objects
            .iter()
            .filter(|object| object.kind.is_interactable())
            .filter(|object| {
                let base_y = object.placement.y(floor_height);
                (object.placement.x - world_x).abs() <= half_width
                    && world_y >= base_y
                    && world_y < base_y + floor_height
            })
            .min_by(|a, b| {
                let da = (a.placement.x - world_x).abs();
                let db = (b.placement.x - world_x).abs();
                da.total_cmp(&db)
            })
            .map(|object| object.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door_at(id: u64, x: f32, level: u32, open: bool) -> PlacedObject {
        PlacedObject {
            id: EntityId(id),
            placement: Placement::at(x, level),
            kind: ObjectKind::Door(DoorState::new(open, KeySet::new())),
        }
    }

    fn staircase(id: u64, x: f32, level: u32, connection: u32) -> PlacedObject {
        PlacedObject {
            id: EntityId(id),
            placement: Placement::at(x, level),
            kind: ObjectKind::StaircaseDoor(Passage::new(connection)),
        }
    }

    #[test]
    fn door_without_keys_always_opens() {
        let mut door = DoorState::new(false, KeySet::new());
        assert!(door.try_open(&KeySet::new()));
        assert!(door.open);
    }

    #[test]
    fn door_opens_only_with_intersecting_keys() {
        let mut door = DoorState::new(false, [1, 2].into_iter().collect());
        assert!(!door.try_open(&[3].into_iter().collect()));
        assert!(!door.open);
        assert!(door.try_open(&[2, 9].into_iter().collect()));
        assert!(door.open);
    }

    #[test]
    fn unlock_is_permanent_after_reclose() {
        let mut door = DoorState::new(false, [7].into_iter().collect());
        assert!(door.try_open(&[7].into_iter().collect()));
        door.close();
        assert!(!door.open);

        assert!(door.try_open(&KeySet::new()));
        assert!(door.open);
    }

    #[test]
    fn toggle_closes_without_key_check() {
        let mut door = DoorState::new(true, [5].into_iter().collect());
        assert!(door.toggle(&KeySet::new()));
        assert!(!door.open);
        assert!(!door.toggle(&KeySet::new()));
    }

    #[test]
    fn closed_door_between_is_strict() {
        let mut objects = ObjectSet::new();
        objects.push(door_at(1, 100.0, 0, false));

        assert!(objects.closed_door_strictly_between(0, 50.0, 150.0));
        assert!(objects.closed_door_strictly_between(0, 150.0, 50.0));
        assert!(!objects.closed_door_strictly_between(0, 100.0, 150.0));
        assert!(!objects.closed_door_strictly_between(1, 50.0, 150.0));
    }

    #[test]
    fn open_doors_do_not_block() {
        let mut objects = ObjectSet::new();
        objects.push(door_at(1, 100.0, 0, true));
        assert!(!objects.closed_door_strictly_between(0, 50.0, 150.0));
        assert!(!objects.step_blocked(0, 95.0, 105.0));
    }

    #[test]
    fn step_blocked_includes_landing_point_but_not_origin() {
        let mut objects = ObjectSet::new();
        objects.push(door_at(1, 100.0, 0, false));

        assert!(objects.step_blocked(0, 95.0, 100.0));
        assert!(objects.step_blocked(0, 105.0, 99.0));
        assert!(!objects.step_blocked(0, 100.0, 105.0));
        assert!(!objects.step_blocked(0, 80.0, 90.0));
    }

    #[test]
    fn passages_pair_by_connection_and_kind() {
        let mut objects = ObjectSet::new();
        objects.push(staircase(1, 10.0, 0, 4));
        objects.push(staircase(2, 300.0, 1, 4));
        objects.push(staircase(3, 500.0, 1, 9));
        objects.push(PlacedObject {
            id: EntityId(4),
            placement: Placement::at(20.0, 1),
            kind: ObjectKind::CatDen(Passage::new(9)),
        });

        assert_eq!(objects.paired_passage(EntityId(1)), Some(EntityId(2)));
        assert_eq!(objects.paired_passage(EntityId(2)), Some(EntityId(1)));
        assert_eq!(objects.paired_passage(EntityId(3)), None);
    }

    #[test]
    fn interactable_hit_box_respects_floor_band() {
        let mut objects = ObjectSet::new();
        objects.push(door_at(1, 100.0, 1, false));

        assert_eq!(
            objects.interactable_at(110.0, 250.0, 40.0, 200.0),
            Some(EntityId(1))
        );
        assert_eq!(objects.interactable_at(110.0, 50.0, 40.0, 200.0), None);
        assert_eq!(objects.interactable_at(160.0, 250.0, 40.0, 200.0), None);
    }
}
